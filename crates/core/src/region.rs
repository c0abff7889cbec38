//! Approximate regional pricing for prices quoted in MYR.
//!
//! Multipliers are a fixed table, not a live FX rate.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::estimate::MoneyRange;
use crate::errors::DomainError;
use crate::planner::estimator::round_to_ten;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    My,
    Sg,
    Int,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::My, Region::Sg, Region::Int];

    /// Maps an ISO 3166 alpha-2 code; anything outside MY and SG is international.
    pub fn from_country_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "MY" => Self::My,
            "SG" => Self::Sg,
            _ => Self::Int,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::My => "my",
            Self::Sg => "sg",
            Self::Int => "int",
        }
    }

    pub fn currency_code(self) -> &'static str {
        match self {
            Self::My => "MYR",
            Self::Sg => "SGD",
            Self::Int => "USD",
        }
    }

    pub fn currency_symbol(self) -> &'static str {
        match self {
            Self::My => "RM",
            Self::Sg => "S$",
            Self::Int => "US$",
        }
    }

    pub fn multiplier(self) -> Decimal {
        match self {
            Self::My => Decimal::ONE,
            Self::Sg => Decimal::new(63, 2),
            Self::Int => Decimal::new(25, 2),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "my" => Ok(Self::My),
            "sg" => Ok(Self::Sg),
            "int" => Ok(Self::Int),
            other => {
                Err(DomainError::UnknownIdentifier { kind: "region", value: other.to_string() })
            }
        }
    }
}

pub fn convert_from_myr(amount: Decimal, region: Region) -> Decimal {
    match region {
        Region::My => amount,
        other => round_to_ten(amount * other.multiplier()),
    }
}

pub fn convert_range(range: MoneyRange, region: Region) -> MoneyRange {
    MoneyRange::new(convert_from_myr(range.min, region), convert_from_myr(range.max, region))
}

/// `RM 4,500`; two decimals only when the amount has minor units.
pub fn format_amount(amount: Decimal, region: Region) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let magnitude = rounded.abs();
    let whole = magnitude.trunc();
    let fraction = magnitude - whole;

    let mut rendered = group_thousands(&whole.to_string());
    if !fraction.is_zero() {
        let cents = (fraction * Decimal::ONE_HUNDRED).trunc();
        rendered.push_str(&format!(".{:0>2}", cents.to_string()));
    }

    format!("{sign}{} {rendered}", region.currency_symbol())
}

pub fn format_range(range: MoneyRange, region: Region) -> String {
    format!("{} - {}", format_amount(range.min, region), format_amount(range.max, region))
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{convert_from_myr, format_amount, format_range, Region};
    use crate::domain::estimate::MoneyRange;

    #[test]
    fn unknown_country_codes_fall_back_to_international() {
        assert_eq!(Region::from_country_code("my"), Region::My);
        assert_eq!(Region::from_country_code(" SG "), Region::Sg);
        assert_eq!(Region::from_country_code("ID"), Region::Int);
        assert_eq!(Region::from_country_code(""), Region::Int);
    }

    #[test]
    fn conversion_applies_multiplier_and_rounds_to_ten() {
        assert_eq!(convert_from_myr(Decimal::from(4_500), Region::My), Decimal::from(4_500));
        assert_eq!(convert_from_myr(Decimal::from(4_500), Region::Sg), Decimal::from(2_840));
        assert_eq!(convert_from_myr(Decimal::from(4_500), Region::Int), Decimal::from(1_130));
    }

    #[test]
    fn amounts_render_with_symbol_and_separators() {
        assert_eq!(format_amount(Decimal::from(4_500), Region::My), "RM 4,500");
        assert_eq!(format_amount(Decimal::from(125_000), Region::Sg), "S$ 125,000");
        assert_eq!(format_amount(Decimal::from(950), Region::Int), "US$ 950");
        assert_eq!(format_amount(Decimal::new(79_500, 2), Region::My), "RM 795");
        assert_eq!(format_amount(Decimal::new(24_917, 2), Region::My), "RM 249.17");
        assert_eq!(format_amount(Decimal::new(-30_000, 2), Region::My), "-RM 300");
    }

    #[test]
    fn ranges_join_both_bounds() {
        let range = MoneyRange::new(Decimal::from(4_140), Decimal::from(4_860));
        assert_eq!(format_range(range, Region::My), "RM 4,140 - RM 4,860");
    }

    #[test]
    fn regions_parse_case_insensitively() {
        assert_eq!("SG".parse::<Region>().ok(), Some(Region::Sg));
        assert!("eu".parse::<Region>().is_err());
    }
}
