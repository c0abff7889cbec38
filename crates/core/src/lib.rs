pub mod config;
pub mod domain;
pub mod errors;
pub mod planner;
pub mod region;
pub mod token;

pub use domain::answers::PlannerAnswers;
pub use domain::estimate::{DayRange, EstimateBreakdown, ModifierItem, MoneyRange};
pub use domain::lead::LeadForm;
pub use domain::submission::{
    StoredSubmission, SubmissionDocument, SubmissionId, SubmissionKind, SubmissionStatus,
};
pub use domain::tier::{PlatformArchetype, Tier};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use planner::catalog::Catalog;
pub use planner::estimator::{DeterministicEstimator, PlannerEstimator};
pub use planner::installments::{installment_plan, InstallmentPlan, InstallmentTerm};
pub use planner::recommendation::{LeadRecommendation, SolutionsMatrix};
pub use planner::validation::{validate_lead, validate_planner, PlannerValidation};
pub use planner::{DeterministicPlannerRuntime, PlannerEvaluation, PlannerRuntime};
pub use region::Region;
pub use token::AcceptanceTokens;
