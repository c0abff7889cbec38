use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::json;
use studioplan_core::domain::answers::PlannerAnswers;
use studioplan_core::planner::estimator::DeterministicEstimator;
use studioplan_core::planner::{DeterministicPlannerRuntime, PlannerRuntime};
use studioplan_core::region::{convert_from_myr, convert_range, format_range, Region};

use crate::commands::CommandResult;

pub fn run(answers_path: &Path, now: Option<&str>, region: Option<&str>) -> CommandResult {
    let answers = match load_answers(answers_path) {
        Ok(answers) => answers,
        Err(error) => {
            return CommandResult::failure("estimate", "input", format!("{error:#}"), 2);
        }
    };
    let now = match parse_now(now) {
        Ok(now) => now,
        Err(error) => return CommandResult::failure("estimate", "input", format!("{error:#}"), 2),
    };
    let region = match region.map(Region::from_str).transpose() {
        Ok(region) => region.unwrap_or_default(),
        Err(error) => return CommandResult::failure("estimate", "input", error.to_string(), 2),
    };

    let runtime = DeterministicPlannerRuntime::<DeterministicEstimator>::default();
    let evaluation = runtime.evaluate(&answers, now);
    let Some(estimate) = evaluation.estimate else {
        return CommandResult::failure(
            "estimate",
            "validation",
            evaluation.validation.errors().join("; "),
            3,
        );
    };

    let package_name = runtime.catalog().tier(estimate.tier).name.clone();
    let display_range = convert_range(estimate.range, region);
    let message = format!("{package_name}: {}", format_range(display_range, region));

    CommandResult::success_with_data(
        "estimate",
        message,
        json!({
            "package_name": package_name,
            "display": {
                "region": region,
                "currency": region.currency_code(),
                "total": convert_from_myr(estimate.total, region),
                "range": display_range,
            },
            "installments": evaluation.installments,
            "estimate": estimate,
        }),
    )
}

fn load_answers(path: &Path) -> Result<PlannerAnswers> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read answers file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("answers file `{}` is not valid planner JSON", path.display()))
}

fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        None => Ok(Utc::now()),
        Some(raw) => DateTime::parse_from_rfc3339(raw.trim())
            .map(|parsed| parsed.with_timezone(&Utc))
            .with_context(|| format!("`{raw}` is not an RFC 3339 timestamp")),
    }
}
