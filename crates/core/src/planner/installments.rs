use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::answers::PaymentPreference;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallmentTerm {
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "12")]
    Twelve,
}

impl InstallmentTerm {
    pub fn months(self) -> u32 {
        match self {
            Self::Six => 6,
            Self::Twelve => 12,
        }
    }

    /// Monthly fee as a fraction of the base monthly amount.
    pub fn fee_rate(self) -> Decimal {
        match self {
            Self::Six => Decimal::new(6, 2),
            Self::Twelve => Decimal::new(12, 2),
        }
    }

    pub fn from_months(months: u32) -> Result<Self, DomainError> {
        match months {
            6 => Ok(Self::Six),
            12 => Ok(Self::Twelve),
            other => Err(DomainError::UnknownIdentifier {
                kind: "installment term",
                value: other.to_string(),
            }),
        }
    }

    pub fn from_preference(preference: PaymentPreference) -> Option<Self> {
        match preference {
            PaymentPreference::Installments6 => Some(Self::Six),
            PaymentPreference::Installments12 => Some(Self::Twelve),
            PaymentPreference::FullUpfront | PaymentPreference::Milestones => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    pub months: u32,
    pub fee_rate: Decimal,
    pub base_monthly: Decimal,
    pub monthly_fee: Decimal,
    pub monthly: Decimal,
    pub total_payable: Decimal,
}

fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Fails when the total is too large for the monthly schedule to stay representable.
pub fn installment_plan(
    total: Decimal,
    term: InstallmentTerm,
) -> Result<InstallmentPlan, DomainError> {
    let out_of_range =
        || DomainError::InvariantViolation(format!("installment total `{total}` is out of range"));
    let months = Decimal::from(term.months());
    let base_monthly = round_cents(total.checked_div(months).ok_or_else(out_of_range)?);
    let monthly_fee =
        round_cents(base_monthly.checked_mul(term.fee_rate()).ok_or_else(out_of_range)?);
    let monthly = base_monthly.checked_add(monthly_fee).ok_or_else(out_of_range)?;
    let total_payable = monthly.checked_mul(months).ok_or_else(out_of_range)?;

    Ok(InstallmentPlan {
        months: term.months(),
        fee_rate: term.fee_rate(),
        base_monthly,
        monthly_fee,
        monthly,
        total_payable,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{installment_plan, InstallmentTerm};
    use crate::domain::answers::PaymentPreference;
    use crate::errors::DomainError;

    #[test]
    fn six_month_plan_adds_six_percent_per_month() {
        let plan = installment_plan(Decimal::from(4_500), InstallmentTerm::Six).expect("plan");

        assert_eq!(plan.months, 6);
        assert_eq!(plan.base_monthly, Decimal::new(75_000, 2));
        assert_eq!(plan.monthly_fee, Decimal::new(4_500, 2));
        assert_eq!(plan.monthly, Decimal::new(79_500, 2));
        assert_eq!(plan.total_payable, Decimal::new(477_000, 2));
    }

    #[test]
    fn twelve_month_plan_rounds_to_cents() {
        let plan = installment_plan(Decimal::from(2_990), InstallmentTerm::Twelve).expect("plan");

        assert_eq!(plan.base_monthly, Decimal::new(24_917, 2));
        assert_eq!(plan.monthly_fee, Decimal::new(2_990, 2));
        assert_eq!(plan.monthly, plan.base_monthly + plan.monthly_fee);

        let reconstructed = plan.base_monthly * Decimal::from(plan.months);
        let drift = (reconstructed - Decimal::from(2_990)).abs();
        assert!(drift <= Decimal::new(6, 2), "drift {drift}");
    }

    #[test]
    fn totals_beyond_decimal_range_are_rejected() {
        let error = installment_plan(Decimal::MAX, InstallmentTerm::Twelve)
            .expect_err("oversized total should not produce a plan");
        assert!(matches!(error, DomainError::InvariantViolation(_)), "unexpected error: {error}");
    }

    #[test]
    fn terms_parse_from_months_and_preferences() {
        assert_eq!(InstallmentTerm::from_months(6).ok(), Some(InstallmentTerm::Six));
        assert!(InstallmentTerm::from_months(9).is_err());
        assert_eq!(
            InstallmentTerm::from_preference(PaymentPreference::Installments12),
            Some(InstallmentTerm::Twelve)
        );
        assert_eq!(InstallmentTerm::from_preference(PaymentPreference::Milestones), None);
    }
}
