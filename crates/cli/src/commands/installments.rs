use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::json;
use studioplan_core::planner::installments::{installment_plan, InstallmentTerm};
use studioplan_core::region::{format_amount, Region};

use crate::commands::CommandResult;

pub fn run(total: &str, months: u32) -> CommandResult {
    let total = match Decimal::from_str(total.trim()) {
        Ok(total) if total > Decimal::ZERO => total,
        _ => {
            return CommandResult::failure(
                "installments",
                "input",
                format!("`{total}` is not a positive amount"),
                2,
            );
        }
    };
    let term = match InstallmentTerm::from_months(months) {
        Ok(term) => term,
        Err(error) => return CommandResult::failure("installments", "input", error.to_string(), 2),
    };

    let plan = match installment_plan(total, term) {
        Ok(plan) => plan,
        Err(error) => return CommandResult::failure("installments", "input", error.to_string(), 2),
    };
    let message = format!(
        "{} x {} per month ({} total)",
        plan.months,
        format_amount(plan.monthly, Region::My),
        format_amount(plan.total_payable, Region::My)
    );

    CommandResult::success_with_data("installments", message, json!({ "plan": plan }))
}
