use serde::{Deserialize, Serialize};

use crate::domain::answers::ContactInfo;

/// Short lead-capture form: goal labels and feature ids picked from the
/// solutions matrix rather than the full planner questionnaire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadForm {
    pub company_name: String,
    pub goals: Vec<String>,
    pub features: Vec<String>,
    pub message: Option<String>,
    pub contact: ContactInfo,
}
