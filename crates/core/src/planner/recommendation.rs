//! Tier recommendation shared by the planner and the lead-capture form.
//!
//! Both entry points reduce their input to goal fits plus forced upgrades and
//! fold them through [`rank_tier`], so the two paths cannot drift apart.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::answers::{FeatureSelection, PrimaryGoal};
use crate::domain::tier::Tier;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalFit {
    pub fits_landing: bool,
    pub fits_business: bool,
    pub requires_advanced: bool,
}

impl GoalFit {
    pub const LANDING: GoalFit =
        GoalFit { fits_landing: true, fits_business: false, requires_advanced: false };
    pub const BUSINESS: GoalFit =
        GoalFit { fits_landing: false, fits_business: true, requires_advanced: false };
    pub const LANDING_OR_BUSINESS: GoalFit =
        GoalFit { fits_landing: true, fits_business: true, requires_advanced: false };
    pub const ADVANCED: GoalFit =
        GoalFit { fits_landing: false, fits_business: false, requires_advanced: true };

    /// Lowest tier that satisfies the goal. Landing wins a landing/business tie.
    pub fn minimum_tier(self) -> Option<Tier> {
        if self.requires_advanced {
            Some(Tier::Custom)
        } else if self.fits_landing {
            Some(Tier::Landing)
        } else if self.fits_business {
            Some(Tier::Business)
        } else {
            None
        }
    }
}

/// Highest goal-derived tier, then raised by every forced upgrade.
/// With nothing to go on the answer is landing.
pub fn rank_tier<F, U>(fits: F, upgrades: U) -> Tier
where
    F: IntoIterator<Item = GoalFit>,
    U: IntoIterator<Item = Tier>,
{
    fits.into_iter()
        .filter_map(GoalFit::minimum_tier)
        .chain(upgrades)
        .fold(Tier::Landing, Tier::max)
}

/// Planner path: advanced modules force custom, a one-page inquiry site stays
/// landing, anything with pages is business.
pub fn recommend_tier(
    goal: Option<PrimaryGoal>,
    features: &FeatureSelection,
    page_count: u32,
) -> Tier {
    let lean = goal == Some(PrimaryGoal::Inquiries)
        && page_count <= 1
        && !features.wants_blog_or_cms();

    let fit = if lean {
        GoalFit::LANDING
    } else if page_count >= 1 {
        GoalFit::BUSINESS
    } else {
        GoalFit::LANDING
    };

    let upgrades = features.advanced().into_iter().map(|_| Tier::Custom);
    rank_tier([fit], upgrades)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionGoal {
    pub label: String,
    pub fit: GoalFit,
}

#[derive(Clone, Debug)]
pub struct KeywordRule {
    pattern: Regex,
    pub tier: Tier,
    pub reason: String,
}

impl KeywordRule {
    pub fn new(pattern: &str, tier: Tier, reason: &str) -> Result<Self, DomainError> {
        let pattern = Regex::new(pattern).map_err(|error| {
            DomainError::InvariantViolation(format!("invalid keyword pattern: {error}"))
        })?;
        Ok(Self { pattern, tier, reason: reason.to_string() })
    }

    pub fn matches(&self, feature_id: &str) -> bool {
        self.pattern.is_match(feature_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecommendation {
    pub tier: Tier,
    pub matched_goals: Vec<String>,
    pub unmatched_goals: Vec<String>,
    pub upgrade_reasons: Vec<String>,
}

/// Goal → fit table plus keyword upgrade rules used by the lead form.
#[derive(Clone, Debug)]
pub struct SolutionsMatrix {
    goals: Vec<SolutionGoal>,
    keyword_rules: Vec<KeywordRule>,
}

impl SolutionsMatrix {
    pub fn new(goals: Vec<SolutionGoal>, keyword_rules: Vec<KeywordRule>) -> Self {
        Self { goals, keyword_rules }
    }

    pub fn standard() -> Result<Self, DomainError> {
        let goals = [
            ("Get more inquiries", GoalFit::LANDING_OR_BUSINESS),
            ("Launch a campaign or event", GoalFit::LANDING),
            ("Look credible and professional", GoalFit::LANDING_OR_BUSINESS),
            ("Showcase our portfolio", GoalFit::BUSINESS),
            ("Publish articles or news", GoalFit::BUSINESS),
            ("Rank better on Google", GoalFit::BUSINESS),
            ("Sell products online", GoalFit::ADVANCED),
            ("Take bookings or appointments", GoalFit::ADVANCED),
            ("Offer member-only content", GoalFit::ADVANCED),
            ("Run online courses", GoalFit::ADVANCED),
        ]
        .into_iter()
        .map(|(label, fit)| SolutionGoal { label: label.to_string(), fit })
        .collect();

        let keyword_rules = vec![
            KeywordRule::new(
                r"(?i)(shop|store|cart|checkout|e-?commerce|payment)",
                Tier::Custom,
                "Selling or taking payments online needs a custom build",
            )?,
            KeywordRule::new(
                r"(?i)(booking|appointment|member|login|portal|dashboard|course)",
                Tier::Custom,
                "Accounts, bookings or dashboards need a custom build",
            )?,
            KeywordRule::new(
                r"(?i)(blog|cms|news|multi-?page|multilingual|gallery)",
                Tier::Business,
                "Content management needs at least a business website",
            )?,
        ];

        Ok(Self::new(goals, keyword_rules))
    }

    pub fn goals(&self) -> &[SolutionGoal] {
        &self.goals
    }

    pub fn goal(&self, label: &str) -> Option<&SolutionGoal> {
        let wanted = label.trim();
        self.goals.iter().find(|goal| goal.label.eq_ignore_ascii_case(wanted))
    }

    /// Lead path: fold the selected goals, then let feature keywords force upgrades.
    pub fn recommend<G, F>(&self, goals: G, feature_ids: F) -> LeadRecommendation
    where
        G: IntoIterator,
        G::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        let mut matched_goals = Vec::new();
        let mut unmatched_goals = Vec::new();
        let mut fits = Vec::new();

        for label in goals {
            let label = label.as_ref();
            match self.goal(label) {
                Some(goal) => {
                    matched_goals.push(goal.label.clone());
                    fits.push(goal.fit);
                }
                None => unmatched_goals.push(label.trim().to_string()),
            }
        }

        let mut upgrades = Vec::new();
        let mut upgrade_reasons = Vec::new();
        for feature_id in feature_ids {
            let feature_id = feature_id.as_ref();
            for rule in self.keyword_rules.iter().filter(|rule| rule.matches(feature_id)) {
                upgrades.push(rule.tier);
                if !upgrade_reasons.contains(&rule.reason) {
                    upgrade_reasons.push(rule.reason.clone());
                }
            }
        }

        LeadRecommendation {
            tier: rank_tier(fits, upgrades),
            matched_goals,
            unmatched_goals,
            upgrade_reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{rank_tier, recommend_tier, GoalFit, SolutionsMatrix};
    use crate::domain::answers::{FeatureSelection, PrimaryGoal};
    use crate::domain::tier::Tier;

    fn matrix() -> SolutionsMatrix {
        SolutionsMatrix::standard().expect("standard matrix compiles")
    }

    #[test]
    fn single_page_inquiry_site_is_landing() {
        let tier = recommend_tier(Some(PrimaryGoal::Inquiries), &FeatureSelection::default(), 1);
        assert_eq!(tier, Tier::Landing);
    }

    #[test]
    fn any_advanced_flag_forces_custom() {
        for features in [
            FeatureSelection { online_store: true, ..FeatureSelection::default() },
            FeatureSelection { booking: true, ..FeatureSelection::default() },
            FeatureSelection { membership: true, ..FeatureSelection::default() },
            FeatureSelection { dashboard: true, ..FeatureSelection::default() },
        ] {
            assert_eq!(recommend_tier(Some(PrimaryGoal::Inquiries), &features, 1), Tier::Custom);
            assert_eq!(recommend_tier(None, &features, 0), Tier::Custom);
        }
    }

    #[test]
    fn blog_or_extra_pages_move_inquiry_sites_to_business() {
        let blog = FeatureSelection { blog: true, ..FeatureSelection::default() };
        assert_eq!(recommend_tier(Some(PrimaryGoal::Inquiries), &blog, 1), Tier::Business);
        assert_eq!(
            recommend_tier(Some(PrimaryGoal::Inquiries), &FeatureSelection::default(), 3),
            Tier::Business
        );
        assert_eq!(
            recommend_tier(Some(PrimaryGoal::Credibility), &FeatureSelection::default(), 1),
            Tier::Business
        );
    }

    #[test]
    fn zero_pages_without_inquiry_goal_falls_back_to_landing() {
        let tier = recommend_tier(Some(PrimaryGoal::Sales), &FeatureSelection::default(), 0);
        assert_eq!(tier, Tier::Landing);
        assert_eq!(recommend_tier(None, &FeatureSelection::default(), 0), Tier::Landing);
    }

    #[test]
    fn recommendation_ignores_flag_order() {
        let first = FeatureSelection { dashboard: true, booking: true, ..Default::default() };
        let second = FeatureSelection { booking: true, dashboard: true, ..Default::default() };
        assert_eq!(
            recommend_tier(Some(PrimaryGoal::Bookings), &first, 4),
            recommend_tier(Some(PrimaryGoal::Bookings), &second, 4)
        );
    }

    const NO_FITS: [GoalFit; 0] = [];
    const NO_UPGRADES: [Tier; 0] = [];

    #[test]
    fn rank_keeps_the_highest_tier_and_defaults_to_landing() {
        assert_eq!(rank_tier(NO_FITS, NO_UPGRADES), Tier::Landing);
        assert_eq!(rank_tier([GoalFit::LANDING_OR_BUSINESS], NO_UPGRADES), Tier::Landing);
        assert_eq!(rank_tier([GoalFit::LANDING, GoalFit::BUSINESS], NO_UPGRADES), Tier::Business);
        assert_eq!(rank_tier([GoalFit::BUSINESS], [Tier::Landing]), Tier::Business);
        assert_eq!(rank_tier([GoalFit::LANDING], [Tier::Custom]), Tier::Custom);
        assert_eq!(rank_tier([GoalFit::default()], NO_UPGRADES), Tier::Landing);
    }

    #[test]
    fn lead_goals_prefer_landing_when_both_fit() {
        let result = matrix().recommend(["get more inquiries"], Vec::<String>::new());
        assert_eq!(result.tier, Tier::Landing);
        assert_eq!(result.matched_goals, vec!["Get more inquiries".to_string()]);
    }

    #[test]
    fn lead_goals_take_the_highest_rank() {
        let result = matrix().recommend(
            ["Launch a campaign or event", "Showcase our portfolio", "Something else"],
            ["contact-form"],
        );
        assert_eq!(result.tier, Tier::Business);
        assert_eq!(result.unmatched_goals, vec!["Something else".to_string()]);
        assert!(result.upgrade_reasons.is_empty());
    }

    #[test]
    fn feature_keywords_force_upgrades_regardless_of_goals() {
        let result = matrix().recommend(["Launch a campaign or event"], ["blog"]);
        assert_eq!(result.tier, Tier::Business);
        assert_eq!(result.upgrade_reasons.len(), 1);

        let result = matrix().recommend(["Get more inquiries"], ["online-store", "blog"]);
        assert_eq!(result.tier, Tier::Custom);
        assert_eq!(result.upgrade_reasons.len(), 2);
    }

    #[test]
    fn lead_and_planner_paths_agree_on_equivalent_inputs() {
        let matrix = matrix();

        let planner = recommend_tier(Some(PrimaryGoal::Inquiries), &FeatureSelection::default(), 1);
        let lead = matrix.recommend(["Get more inquiries"], Vec::<String>::new());
        assert_eq!(planner, lead.tier);

        let store = FeatureSelection { online_store: true, ..FeatureSelection::default() };
        let planner = recommend_tier(Some(PrimaryGoal::Sales), &store, 4);
        let lead = matrix.recommend(["Sell products online"], ["online-store"]);
        assert_eq!(planner, lead.tier);

        let blog = FeatureSelection { blog: true, ..FeatureSelection::default() };
        let planner = recommend_tier(Some(PrimaryGoal::Inquiries), &blog, 1);
        let lead = matrix.recommend(["Get more inquiries"], ["blog"]);
        assert_eq!(planner, lead.tier);
    }
}
