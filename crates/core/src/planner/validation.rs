//! Per-section presence checks for planner and lead submissions.
//!
//! Validators never fail; they return human-readable messages and an empty
//! list means the section is complete. Email format is left to the form layer.

use serde::{Deserialize, Serialize};

use crate::domain::answers::{
    BusinessBasics, ContactInfo, PageSelection, PlannerAnswers, PrimaryGoal, TimingBudget,
};
use crate::domain::lead::LeadForm;

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn validate_basics(basics: &BusinessBasics) -> Vec<String> {
    let mut errors = Vec::new();
    if blank(&basics.company_name) {
        errors.push("Company name is required".to_string());
    }
    if blank(&basics.industry) {
        errors.push("Industry is required".to_string());
    }
    if blank(&basics.website_status) {
        errors.push("Tell us whether you already have a website".to_string());
    }
    errors
}

pub fn validate_goal(goal: Option<PrimaryGoal>) -> Vec<String> {
    match goal {
        Some(_) => Vec::new(),
        None => vec!["Select a primary goal".to_string()],
    }
}

/// Upper bound on free-form extra pages a single planner submission may request.
pub const MAX_OTHER_PAGES: u32 = 100;

pub fn validate_pages(pages: &PageSelection) -> Vec<String> {
    if pages.other_count > MAX_OTHER_PAGES {
        return vec![format!("Other pages must be {MAX_OTHER_PAGES} or fewer")];
    }
    if pages.page_count() == 0 {
        return vec!["Select at least one page".to_string()];
    }
    Vec::new()
}

pub fn validate_timing(timing: &TimingBudget) -> Vec<String> {
    let mut errors = Vec::new();
    if timing.launch_date.is_none() {
        errors.push("Launch date is required".to_string());
    }
    if timing.flexibility.is_none() {
        errors.push("Select how flexible the launch date is".to_string());
    }
    if timing.budget.is_none() {
        errors.push("Select a budget range".to_string());
    }
    errors
}

pub fn validate_contact(contact: &ContactInfo) -> Vec<String> {
    let mut errors = Vec::new();
    if blank(&contact.full_name) {
        errors.push("Full name is required".to_string());
    }
    if blank(&contact.email) {
        errors.push("Email is required".to_string());
    }
    if !contact.consent {
        errors.push("Consent is required to send your estimate".to_string());
    }
    errors
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerSection {
    Basics,
    Goal,
    Pages,
    Timing,
    Contact,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerValidation {
    pub sections: Vec<(PlannerSection, Vec<String>)>,
}

impl PlannerValidation {
    pub fn is_valid(&self) -> bool {
        self.sections.iter().all(|(_, errors)| errors.is_empty())
    }

    pub fn errors(&self) -> Vec<String> {
        self.sections.iter().flat_map(|(_, errors)| errors.iter().cloned()).collect()
    }

    pub fn section(&self, section: PlannerSection) -> &[String] {
        self.sections
            .iter()
            .find(|(candidate, _)| *candidate == section)
            .map(|(_, errors)| errors.as_slice())
            .unwrap_or(&[])
    }
}

pub fn validate_planner(answers: &PlannerAnswers) -> PlannerValidation {
    PlannerValidation {
        sections: vec![
            (PlannerSection::Basics, validate_basics(&answers.basics)),
            (PlannerSection::Goal, validate_goal(answers.goal)),
            (PlannerSection::Pages, validate_pages(&answers.pages)),
            (PlannerSection::Timing, validate_timing(&answers.timing)),
            (PlannerSection::Contact, validate_contact(&answers.contact)),
        ],
    }
}

pub fn validate_lead(lead: &LeadForm) -> Vec<String> {
    let mut errors = Vec::new();
    if lead.goals.iter().all(|goal| blank(goal)) {
        errors.push("Select at least one goal".to_string());
    }
    errors.extend(validate_contact(&lead.contact));
    errors
}
