use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

use crate::domain::answers::{
    AdvancedFeature, CopyReadiness, FeatureSelection, ImageReadiness, PlannerAnswers,
};
use crate::domain::estimate::{DayRange, EstimateBreakdown, ModifierItem, MoneyRange};
use crate::domain::tier::{PlatformArchetype, Tier};
use crate::planner::catalog::{addon_ids, Catalog, PricingRules};
use crate::planner::recommendation::recommend_tier;

pub const CURRENCY: &str = "MYR";

pub trait PlannerEstimator: Send + Sync {
    fn estimate(
        &self,
        catalog: &Catalog,
        answers: &PlannerAnswers,
        now: DateTime<Utc>,
    ) -> EstimateBreakdown;
}

#[derive(Default)]
pub struct DeterministicEstimator;

impl PlannerEstimator for DeterministicEstimator {
    fn estimate(
        &self,
        catalog: &Catalog,
        answers: &PlannerAnswers,
        now: DateTime<Utc>,
    ) -> EstimateBreakdown {
        estimate(catalog, answers, now)
    }
}

/// Whole days from `now` until the start of the launch date (UTC), rounded up.
/// Past dates come back zero or negative.
pub fn days_until_launch(launch_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    const DAY: i64 = 86_400;
    let launch_at = launch_date.and_time(NaiveTime::MIN).and_utc();
    let seconds = (launch_at - now).num_seconds();

    if seconds >= 0 {
        (seconds + DAY - 1) / DAY
    } else {
        -(-seconds / DAY)
    }
}

pub fn round_to_ten(amount: Decimal) -> Decimal {
    (amount / Decimal::TEN).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        * Decimal::TEN
}

fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Display range: total padded by a fraction of itself, never less than the floor.
pub fn display_range(total: Decimal, rules: &PricingRules) -> MoneyRange {
    let pad = (total * rules.range_pad_rate).max(rules.range_pad_floor);
    MoneyRange::new(round_to_ten(total - pad), round_to_ten(total + pad))
}

pub fn platform_for(features: &FeatureSelection) -> Option<PlatformArchetype> {
    if features.online_store {
        Some(PlatformArchetype::Ecommerce)
    } else if features.membership {
        Some(PlatformArchetype::Membership)
    } else {
        None
    }
}

pub fn estimate(
    catalog: &Catalog,
    answers: &PlannerAnswers,
    now: DateTime<Utc>,
) -> EstimateBreakdown {
    let page_count = answers.pages.page_count();
    let tier = recommend_tier(answers.goal, &answers.features, page_count);
    let tier_config = catalog.tier(tier);
    let rules = catalog.rules();

    let mut lines = ModifierLines { catalog, items: Vec::new() };
    let mut timeline = tier_config.timeline_days;
    let platform = if tier == Tier::Custom { platform_for(&answers.features) } else { None };

    match tier {
        Tier::Landing => {
            lines.copy(answers.content.copy);
            lines.images(answers.content.images);
        }
        Tier::Business => {
            let extra_pages = page_count.saturating_sub(rules.extra_page_baseline);
            if extra_pages > 0 {
                let uncapped = lines.price(addon_ids::EXTRA_PAGE) * Decimal::from(extra_pages);
                let amount = uncapped.min(rules.extra_page_cap);
                let label = if amount < uncapped {
                    format!("Extra pages x{extra_pages} (capped)")
                } else {
                    format!("Extra pages x{extra_pages}")
                };
                lines.push(label, amount);
            }
            if answers.features.wants_blog_or_cms() {
                lines.push_addon(addon_ids::BLOG_CMS_SETUP);
            }
            lines.copy(answers.content.copy);
            lines.images(answers.content.images);
            lines.migration(answers.content.migration_items, rules);
        }
        Tier::Custom => {
            let advanced = answers.features.advanced();
            let count = advanced.len() as u32;
            timeline = DayRange {
                min: timeline.min + count * rules.custom_feature_min_days,
                max: timeline.max + count * rules.custom_feature_max_days,
            };
            for feature in &advanced {
                let amount = lines.price(addon_ids::FEATURE_MODULE);
                lines.push(format!("{} module", feature.label()), amount);
            }
            if answers.integrations.wants_payments() {
                lines.push_addon(addon_ids::PAYMENTS_SETUP);
            }
            let languages = answers.features.multilingual_languages;
            if languages > 0 {
                let amount = lines.price(addon_ids::MULTILINGUAL) * Decimal::from(languages);
                lines.push(format!("Multilingual x{languages}"), amount);
            }
            lines.copy(answers.content.copy);
        }
    }

    let modifiers = lines.items;
    let base_price = tier_config.base_price;
    let subtotal = base_price + modifiers.iter().map(|item| item.amount).sum::<Decimal>();

    let days = answers.timing.launch_date.map(|launch_date| days_until_launch(launch_date, now));
    if let Some(days) = days.filter(|days| *days <= 0) {
        warn!(
            event_name = "planner.estimate.launch_in_past",
            days_until_launch = days,
            tier = tier.as_str(),
            "launch date is not in the future; urgency surcharge applies"
        );
    }

    let surge_rate = match (tier, days) {
        (Tier::Landing, Some(days)) if days <= rules.landing_urgency_days => {
            rules.landing_urgency_rate
        }
        (Tier::Business | Tier::Custom, Some(days)) if days < rules.standard_urgency_days => {
            rules.standard_urgency_rate
        }
        _ => Decimal::ZERO,
    };
    let surge = round_currency(subtotal * surge_rate);

    let credits = if answers.content.qualifies_for_credit() {
        -rules.readiness_credit
    } else {
        Decimal::ZERO
    };

    let total = subtotal + surge + credits;
    let range = display_range(total, rules);
    let rationale = rationale(tier, &tier_config.name, answers, page_count);

    debug!(
        event_name = "planner.estimate.computed",
        tier = tier.as_str(),
        subtotal = %subtotal,
        surge = %surge,
        credits = %credits,
        total = %total,
        "planner estimate computed"
    );

    EstimateBreakdown {
        tier,
        platform,
        currency: CURRENCY.to_string(),
        base_price,
        modifiers,
        subtotal,
        surge_rate,
        surge,
        credits,
        total,
        range,
        timeline_days: timeline,
        rationale,
    }
}

struct ModifierLines<'a> {
    catalog: &'a Catalog,
    items: Vec<ModifierItem>,
}

impl ModifierLines<'_> {
    fn price(&self, id: &str) -> Decimal {
        self.catalog.addon_price(id).unwrap_or_else(|| {
            warn!(event_name = "planner.estimate.addon_missing", addon_id = id, "add-on unpriced");
            Decimal::ZERO
        })
    }

    fn push(&mut self, label: impl Into<String>, amount: Decimal) {
        if amount > Decimal::ZERO {
            self.items.push(ModifierItem::new(label, amount));
        }
    }

    fn push_addon(&mut self, id: &str) {
        let label = self
            .catalog
            .addon(id)
            .map(|addon| addon.label.clone())
            .unwrap_or_else(|| id.to_string());
        let amount = self.price(id);
        self.push(label, amount);
    }

    fn copy(&mut self, readiness: CopyReadiness) {
        match readiness {
            CopyReadiness::Ready => {}
            CopyReadiness::NeedsPolish => self.push_addon(addon_ids::COPY_POLISH),
            CopyReadiness::FromScratch => self.push_addon(addon_ids::COPYWRITING),
        }
    }

    fn images(&mut self, readiness: ImageReadiness) {
        match readiness {
            ImageReadiness::Ready => {}
            ImageReadiness::Curate => self.push_addon(addon_ids::IMAGE_CURATION),
            ImageReadiness::NeedStock => self.push_addon(addon_ids::STOCK_IMAGERY),
        }
    }

    fn migration(&mut self, items: u32, rules: &PricingRules) {
        if items == 0 {
            return;
        }

        if items <= rules.migration_light_max {
            let amount = self.price(addon_ids::MIGRATION_LIGHT);
            self.push(format!("Content migration, light ({items} items)"), amount);
        } else if items <= rules.migration_standard_max {
            let amount = self.price(addon_ids::MIGRATION_STANDARD);
            self.push(format!("Content migration, standard ({items} items)"), amount);
        } else {
            let block = rules.migration_heavy_block.max(1);
            let extra_blocks = (items - rules.migration_standard_max - 1) / block;
            let amount = self.price(addon_ids::MIGRATION_HEAVY)
                + self.price(addon_ids::MIGRATION_HEAVY_BLOCK) * Decimal::from(extra_blocks);
            self.push(format!("Content migration, heavy ({items} items)"), amount);
        }
    }
}

fn rationale(tier: Tier, name: &str, answers: &PlannerAnswers, page_count: u32) -> String {
    match tier {
        Tier::Custom => {
            let modules: Vec<&str> =
                answers.features.advanced().into_iter().map(AdvancedFeature::label).collect();
            format!("{name} recommended because you need: {}.", modules.join(", ").to_lowercase())
        }
        Tier::Business if answers.features.wants_blog_or_cms() => {
            format!("{name} recommended for a {page_count}-page site with editable content.")
        }
        Tier::Business => format!("{name} recommended for a {page_count}-page site."),
        Tier::Landing => match answers.goal {
            Some(goal) => format!(
                "{name} recommended: one focused page is enough to {}.",
                goal.label().to_lowercase()
            ),
            None => format!("{name} recommended as a lean starting point."),
        },
    }
}
