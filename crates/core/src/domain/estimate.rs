use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::tier::{PlatformArchetype, Tier};

/// A named surcharge or charge. Amounts are never negative; reductions live in
/// [`EstimateBreakdown::credits`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierItem {
    pub label: String,
    pub amount: Decimal,
}

impl ModifierItem {
    pub fn new(label: impl Into<String>, amount: Decimal) -> Self {
        Self { label: label.into(), amount }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl MoneyRange {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, amount: Decimal) -> bool {
        self.min <= amount && amount <= self.max
    }

    pub fn midpoint(&self) -> Decimal {
        (self.min + self.max) / Decimal::TWO
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateBreakdown {
    pub tier: Tier,
    pub platform: Option<PlatformArchetype>,
    pub currency: String,
    pub base_price: Decimal,
    /// Application order, not sorted.
    pub modifiers: Vec<ModifierItem>,
    pub subtotal: Decimal,
    pub surge_rate: Decimal,
    pub surge: Decimal,
    /// Zero or negative.
    pub credits: Decimal,
    pub total: Decimal,
    pub range: MoneyRange,
    pub timeline_days: DayRange,
    pub rationale: String,
}

impl EstimateBreakdown {
    pub fn modifiers_total(&self) -> Decimal {
        self.modifiers.iter().map(|item| item.amount).sum()
    }

    pub fn has_surge(&self) -> bool {
        self.surge > Decimal::ZERO
    }

    pub fn has_credit(&self) -> bool {
        self.credits < Decimal::ZERO
    }

    /// Arithmetic invariants every breakdown must satisfy.
    pub fn is_consistent(&self) -> bool {
        let ten = Decimal::TEN;
        self.subtotal == self.base_price + self.modifiers_total()
            && self.total == self.subtotal + self.surge + self.credits
            && self.credits <= Decimal::ZERO
            && self.modifiers.iter().all(|item| item.amount >= Decimal::ZERO)
            && self.range.contains(self.total)
            && (self.range.min % ten).is_zero()
            && (self.range.max % ten).is_zero()
            && self.timeline_days.min <= self.timeline_days.max
    }
}
