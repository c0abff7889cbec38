use serde_json::json;
use studioplan_core::planner::catalog::Catalog;
use studioplan_core::planner::recommendation::SolutionsMatrix;
use studioplan_core::region::{format_range, Region};

use crate::commands::CommandResult;

/// Lead-form recommendation for free-text goals and feature ids.
pub fn run(goals: &[String], features: &[String]) -> CommandResult {
    if goals.iter().all(|goal| goal.trim().is_empty()) {
        return CommandResult::failure("recommend", "input", "pass at least one --goal", 2);
    }

    let matrix = match SolutionsMatrix::standard() {
        Ok(matrix) => matrix,
        Err(error) => return CommandResult::failure("recommend", "catalog", error.to_string(), 4),
    };
    let recommendation = matrix.recommend(goals, features);

    let catalog = Catalog::standard();
    let tier = catalog.tier(recommendation.tier);
    let price_range = tier.price_range.map(|range| format_range(range, Region::My));
    let message = match &price_range {
        Some(range) => format!("{} ({range})", tier.name),
        None => tier.name.clone(),
    };

    CommandResult::success_with_data(
        "recommend",
        message,
        json!({
            "package_name": tier.name,
            "price_range": price_range,
            "timeline": tier.timeline,
            "recommendation": recommendation,
        }),
    )
}
