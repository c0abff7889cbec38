use serde_json::json;
use studioplan_core::config::{AppConfig, LoadOptions};
use studioplan_core::domain::submission::SubmissionId;
use studioplan_core::token::AcceptanceTokens;

use crate::commands::CommandResult;

/// Re-issues the acceptance link for a stored submission, e.g. when a client lost the email.
pub fn run(submission_id: &str) -> CommandResult {
    let submission_id = submission_id.trim();
    if submission_id.is_empty() {
        return CommandResult::failure("token", "input", "submission id is required", 2);
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "token",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let tokens = match AcceptanceTokens::from_config(config.security.acceptance_secret.as_ref()) {
        Ok(tokens) => tokens,
        Err(error) => return CommandResult::failure("token", "configuration", error.to_string(), 3),
    };

    let id = SubmissionId(submission_id.to_string());
    let token = tokens.issue(&id);
    let url = tokens.acceptance_url(&config.site.base_url, &id);

    CommandResult::success_with_data(
        "token",
        url.clone(),
        json!({ "submission_id": id, "token": token, "acceptance_url": url }),
    )
}
