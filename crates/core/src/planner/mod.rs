pub mod catalog;
pub mod estimator;
pub mod installments;
pub mod recommendation;
pub mod validation;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::answers::PlannerAnswers;
use crate::domain::estimate::EstimateBreakdown;

use self::{
    catalog::Catalog,
    estimator::{DeterministicEstimator, PlannerEstimator},
    installments::{installment_plan, InstallmentPlan, InstallmentTerm},
    validation::{validate_planner, PlannerValidation},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerEvaluation {
    pub validation: PlannerValidation,
    pub estimate: Option<EstimateBreakdown>,
    pub installments: Option<InstallmentPlan>,
}

impl PlannerEvaluation {
    pub fn is_valid(&self) -> bool {
        self.validation.is_valid()
    }
}

/// Validate-then-estimate pipeline shared by the HTTP handler and the CLI.
///
/// Estimation only runs once validation passes. An installment plan is attached
/// when the client asked to pay over 6 or 12 months.
pub trait PlannerRuntime: Send + Sync {
    fn evaluate(&self, answers: &PlannerAnswers, now: DateTime<Utc>) -> PlannerEvaluation;

    fn catalog(&self) -> &Catalog;
}

pub struct DeterministicPlannerRuntime<E> {
    catalog: Catalog,
    estimator: E,
}

impl<E> DeterministicPlannerRuntime<E> {
    pub fn new(catalog: Catalog, estimator: E) -> Self {
        Self { catalog, estimator }
    }
}

impl Default for DeterministicPlannerRuntime<DeterministicEstimator> {
    fn default() -> Self {
        Self::new(Catalog::standard(), DeterministicEstimator)
    }
}

impl<E> PlannerRuntime for DeterministicPlannerRuntime<E>
where
    E: PlannerEstimator,
{
    fn evaluate(&self, answers: &PlannerAnswers, now: DateTime<Utc>) -> PlannerEvaluation {
        let validation = validate_planner(answers);
        if !validation.is_valid() {
            return PlannerEvaluation { validation, estimate: None, installments: None };
        }

        let estimate = self.estimator.estimate(&self.catalog, answers, now);
        let installments = answers
            .timing
            .payment
            .and_then(InstallmentTerm::from_preference)
            .and_then(|term| match installment_plan(estimate.total, term) {
                Ok(plan) => Some(plan),
                Err(error) => {
                    warn!(
                        event_name = "planner.installments.skipped",
                        error = %error,
                        "installment plan could not be computed"
                    );
                    None
                }
            });

        PlannerEvaluation { validation, estimate: Some(estimate), installments }
    }

    fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    use crate::{
        domain::{
            answers::{
                BudgetBand, BusinessBasics, ContactInfo, Flexibility, PageKind, PageSelection,
                PaymentPreference, PlannerAnswers, PrimaryGoal, TimingBudget,
            },
            estimate::{DayRange, EstimateBreakdown, MoneyRange},
            tier::Tier,
        },
        planner::{
            catalog::Catalog, estimator::PlannerEstimator, DeterministicPlannerRuntime,
            PlannerRuntime,
        },
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).single().expect("valid timestamp")
    }

    fn valid_answers() -> PlannerAnswers {
        PlannerAnswers {
            basics: BusinessBasics {
                company_name: "Batik Studio".to_string(),
                industry: "Fashion".to_string(),
                audience: "Collectors".to_string(),
                website_status: "outdated".to_string(),
            },
            goal: Some(PrimaryGoal::Credibility),
            pages: PageSelection {
                selected: [PageKind::Home, PageKind::About, PageKind::Contact]
                    .into_iter()
                    .collect(),
                other_count: 0,
            },
            timing: TimingBudget {
                launch_date: NaiveDate::from_ymd_opt(2026, 5, 4),
                flexibility: Some(Flexibility::SomeFlex),
                budget: Some(BudgetBand::From3kTo6k),
                payment: Some(PaymentPreference::Installments6),
            },
            contact: ContactInfo {
                full_name: "Mei Ling".to_string(),
                email: "mei@batik.example".to_string(),
                phone: None,
                consent: true,
            },
            ..PlannerAnswers::default()
        }
    }

    #[test]
    fn invalid_answers_skip_estimation() {
        let runtime = DeterministicPlannerRuntime::default();
        let evaluation = runtime.evaluate(&PlannerAnswers::default(), now());

        assert!(!evaluation.is_valid());
        assert!(evaluation.estimate.is_none());
        assert!(evaluation.installments.is_none());
    }

    #[test]
    fn valid_answers_produce_estimate_and_requested_installments() {
        let runtime = DeterministicPlannerRuntime::default();
        let evaluation = runtime.evaluate(&valid_answers(), now());

        assert!(evaluation.is_valid());
        let estimate = evaluation.estimate.expect("estimate");
        assert_eq!(estimate.tier, Tier::Business);
        assert!(estimate.is_consistent());

        let plan = evaluation.installments.expect("installment plan");
        assert_eq!(plan.months, 6);
        assert_eq!(plan.monthly, plan.base_monthly + plan.monthly_fee);
    }

    #[test]
    fn runtime_supports_explicit_estimator_implementations() {
        struct FlatEstimator;

        impl PlannerEstimator for FlatEstimator {
            fn estimate(
                &self,
                _catalog: &Catalog,
                _answers: &PlannerAnswers,
                _now: DateTime<Utc>,
            ) -> EstimateBreakdown {
                let total = Decimal::from(1_200);
                EstimateBreakdown {
                    tier: Tier::Landing,
                    platform: None,
                    currency: "MYR".to_string(),
                    base_price: total,
                    modifiers: Vec::new(),
                    subtotal: total,
                    surge_rate: Decimal::ZERO,
                    surge: Decimal::ZERO,
                    credits: Decimal::ZERO,
                    total,
                    range: MoneyRange::new(Decimal::from(900), Decimal::from(1_500)),
                    timeline_days: DayRange { min: 3, max: 5 },
                    rationale: String::new(),
                }
            }
        }

        let mut answers = valid_answers();
        answers.timing.payment = Some(PaymentPreference::FullUpfront);
        let runtime = DeterministicPlannerRuntime::new(Catalog::standard(), FlatEstimator);
        let evaluation = runtime.evaluate(&answers, now());

        assert_eq!(evaluation.estimate.map(|estimate| estimate.total), Some(Decimal::from(1_200)));
        assert!(evaluation.installments.is_none());
    }
}
