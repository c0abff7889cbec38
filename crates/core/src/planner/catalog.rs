//! Static pricing tables: tiers, add-ons, platform archetypes and the numeric
//! rules the estimator applies. Built once at startup and shared by reference.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::estimate::{DayRange, MoneyRange};
use crate::domain::tier::{PlatformArchetype, Tier};
use crate::errors::DomainError;

pub mod addon_ids {
    pub const COPY_POLISH: &str = "copy-polish";
    pub const COPYWRITING: &str = "copywriting";
    pub const IMAGE_CURATION: &str = "image-curation";
    pub const STOCK_IMAGERY: &str = "stock-imagery";
    pub const EXTRA_PAGE: &str = "extra-page";
    pub const BLOG_CMS_SETUP: &str = "blog-cms-setup";
    pub const MIGRATION_LIGHT: &str = "migration-light";
    pub const MIGRATION_STANDARD: &str = "migration-standard";
    pub const MIGRATION_HEAVY: &str = "migration-heavy";
    pub const MIGRATION_HEAVY_BLOCK: &str = "migration-heavy-block";
    pub const FEATURE_MODULE: &str = "feature-module";
    pub const PAYMENTS_SETUP: &str = "payments-setup";
    pub const MULTILINGUAL: &str = "multilingual";
    pub const SEO_STARTER: &str = "seo-starter";
    pub const LOGO_DESIGN: &str = "logo-design";
    pub const CARE_PLAN: &str = "care-plan";
    pub const INVENTORY_SYNC: &str = "inventory-sync";
    pub const COURSE_BUILDER: &str = "course-builder";
    pub const VENDOR_ONBOARDING: &str = "vendor-onboarding";

    /// Add-ons the estimator prices from; a catalog without them is rejected.
    pub const REQUIRED_BY_ESTIMATOR: [&str; 13] = [
        COPY_POLISH,
        COPYWRITING,
        IMAGE_CURATION,
        STOCK_IMAGERY,
        EXTRA_PAGE,
        BLOG_CMS_SETUP,
        MIGRATION_LIGHT,
        MIGRATION_STANDARD,
        MIGRATION_HEAVY,
        MIGRATION_HEAVY_BLOCK,
        FEATURE_MODULE,
        PAYMENTS_SETUP,
        MULTILINGUAL,
    ];
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddOnId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    pub tier: Tier,
    pub name: String,
    pub base_price: Decimal,
    pub price_range: Option<MoneyRange>,
    pub timeline: Option<String>,
    pub timeline_days: DayRange,
    pub features: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub archetype: PlatformArchetype,
    pub name: String,
    pub starting_range: MoneyRange,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOn {
    pub id: AddOnId,
    pub label: String,
    pub price: Option<Decimal>,
    pub price_range: Option<MoneyRange>,
    pub tiers: Vec<Tier>,
    /// Restricts a custom-tier add-on to specific platform shapes.
    pub platforms: Option<Vec<PlatformArchetype>>,
    pub description: String,
}

impl AddOn {
    /// Fixed price when set, otherwise the midpoint of the range.
    pub fn representative_price(&self) -> Option<Decimal> {
        self.price.or_else(|| self.price_range.map(|range| range.midpoint()))
    }

    pub fn applies_to(&self, tier: Tier, platform: Option<PlatformArchetype>) -> bool {
        if !self.tiers.contains(&tier) {
            return false;
        }

        match (&self.platforms, tier) {
            (Some(platforms), Tier::Custom) => {
                platform.map(|platform| platforms.contains(&platform)).unwrap_or(false)
            }
            _ => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRules {
    pub extra_page_baseline: u32,
    pub extra_page_cap: Decimal,
    pub migration_light_max: u32,
    pub migration_standard_max: u32,
    pub migration_heavy_block: u32,
    pub landing_urgency_days: i64,
    pub landing_urgency_rate: Decimal,
    pub standard_urgency_days: i64,
    pub standard_urgency_rate: Decimal,
    pub readiness_credit: Decimal,
    pub range_pad_rate: Decimal,
    pub range_pad_floor: Decimal,
    pub custom_feature_min_days: u32,
    pub custom_feature_max_days: u32,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            extra_page_baseline: 5,
            extra_page_cap: Decimal::from(2_000),
            migration_light_max: 10,
            migration_standard_max: 50,
            migration_heavy_block: 50,
            landing_urgency_days: 5,
            landing_urgency_rate: Decimal::new(15, 2),
            standard_urgency_days: 10,
            standard_urgency_rate: Decimal::new(20, 2),
            readiness_credit: Decimal::from(300),
            range_pad_rate: Decimal::new(8, 2),
            range_pad_floor: Decimal::from(300),
            custom_feature_min_days: 7,
            custom_feature_max_days: 14,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    pub landing: TierConfig,
    pub business: TierConfig,
    pub custom: TierConfig,
}

impl TierTable {
    pub fn get(&self, tier: Tier) -> &TierConfig {
        match tier {
            Tier::Landing => &self.landing,
            Tier::Business => &self.business,
            Tier::Custom => &self.custom,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    tiers: TierTable,
    addons: Vec<AddOn>,
    platforms: Vec<PlatformConfig>,
    rules: PricingRules,
}

impl Catalog {
    pub fn new(
        tiers: TierTable,
        addons: Vec<AddOn>,
        platforms: Vec<PlatformConfig>,
        rules: PricingRules,
    ) -> Result<Self, DomainError> {
        for tier in Tier::ALL {
            if tiers.get(tier).tier != tier {
                return Err(DomainError::InvariantViolation(format!(
                    "tier table slot `{tier}` holds `{}`",
                    tiers.get(tier).tier
                )));
            }
        }

        for required in addon_ids::REQUIRED_BY_ESTIMATOR {
            let priced = addons
                .iter()
                .find(|addon| addon.id.0 == required)
                .and_then(AddOn::representative_price)
                .is_some();
            if !priced {
                return Err(DomainError::InvariantViolation(format!(
                    "catalog is missing a priced `{required}` add-on"
                )));
            }
        }

        Ok(Self { tiers, addons, platforms, rules })
    }

    /// The studio's published price list.
    pub fn standard() -> Self {
        Self {
            tiers: standard_tiers(),
            addons: standard_addons(),
            platforms: standard_platforms(),
            rules: PricingRules::default(),
        }
    }

    pub fn tier(&self, tier: Tier) -> &TierConfig {
        self.tiers.get(tier)
    }

    pub fn rules(&self) -> &PricingRules {
        &self.rules
    }

    pub fn addon(&self, id: &str) -> Option<&AddOn> {
        self.addons.iter().find(|addon| addon.id.0 == id)
    }

    pub fn addon_price(&self, id: &str) -> Option<Decimal> {
        self.addon(id).and_then(AddOn::representative_price)
    }

    pub fn addons(&self) -> &[AddOn] {
        &self.addons
    }

    pub fn addons_for(&self, tier: Tier, platform: Option<PlatformArchetype>) -> Vec<&AddOn> {
        self.addons.iter().filter(|addon| addon.applies_to(tier, platform)).collect()
    }

    pub fn platform(&self, archetype: PlatformArchetype) -> Option<&PlatformConfig> {
        self.platforms.iter().find(|platform| platform.archetype == archetype)
    }

    pub fn platforms(&self) -> &[PlatformConfig] {
        &self.platforms
    }
}

fn money(units: i64) -> Decimal {
    Decimal::from(units)
}

fn range(min: i64, max: i64) -> Option<MoneyRange> {
    Some(MoneyRange::new(money(min), money(max)))
}

fn features(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn standard_tiers() -> TierTable {
    TierTable {
        landing: TierConfig {
            tier: Tier::Landing,
            name: "Landing Page".to_string(),
            base_price: money(1_800),
            price_range: range(1_500, 2_500),
            timeline: Some("5–7 working days".to_string()),
            timeline_days: DayRange { min: 5, max: 7 },
            features: features(&[
                "Single conversion-focused page",
                "Mobile-first responsive layout",
                "Contact or inquiry form",
                "Basic on-page SEO",
            ]),
        },
        business: TierConfig {
            tier: Tier::Business,
            name: "Business Website".to_string(),
            base_price: money(4_500),
            price_range: range(3_500, 6_500),
            timeline: Some("2–4 weeks".to_string()),
            timeline_days: DayRange { min: 14, max: 28 },
            features: features(&[
                "Up to 5 pages",
                "Custom design system",
                "Contact forms and maps",
                "Analytics setup",
                "On-page SEO for every page",
            ]),
        },
        custom: TierConfig {
            tier: Tier::Custom,
            name: "Custom Platform".to_string(),
            base_price: money(9_000),
            price_range: range(8_000, 25_000),
            timeline: Some("6–12 weeks".to_string()),
            timeline_days: DayRange { min: 42, max: 84 },
            features: features(&[
                "Discovery and technical planning",
                "Custom feature modules",
                "User accounts and roles",
                "Admin dashboard",
                "Launch support",
            ]),
        },
    }
}

fn standard_platforms() -> Vec<PlatformConfig> {
    vec![
        PlatformConfig {
            archetype: PlatformArchetype::Ecommerce,
            name: "E-commerce store".to_string(),
            starting_range: MoneyRange::new(money(12_000), money(30_000)),
        },
        PlatformConfig {
            archetype: PlatformArchetype::Membership,
            name: "Membership site".to_string(),
            starting_range: MoneyRange::new(money(10_000), money(25_000)),
        },
        PlatformConfig {
            archetype: PlatformArchetype::Elearning,
            name: "E-learning platform".to_string(),
            starting_range: MoneyRange::new(money(15_000), money(35_000)),
        },
        PlatformConfig {
            archetype: PlatformArchetype::Marketplace,
            name: "Marketplace".to_string(),
            starting_range: MoneyRange::new(money(25_000), money(60_000)),
        },
    ]
}

type AddOnRow = (&'static str, &'static str, i64, &'static [Tier], &'static str);

const ALL_TIERS: &[Tier] = &[Tier::Landing, Tier::Business, Tier::Custom];
const CONTENT_TIERS: &[Tier] = &[Tier::Landing, Tier::Business];
const GROWTH_TIERS: &[Tier] = &[Tier::Business, Tier::Custom];

const FIXED_PRICE_ADDONS: &[AddOnRow] = &[
    (addon_ids::COPY_POLISH, "Copy polish", 350, ALL_TIERS, "Edit client-supplied copy"),
    (addon_ids::COPYWRITING, "Copywriting from scratch", 800, ALL_TIERS, "Interview-led copy"),
    (addon_ids::IMAGE_CURATION, "Image curation", 200, CONTENT_TIERS, "Select and optimise photos"),
    (addon_ids::STOCK_IMAGERY, "Stock image sourcing", 450, CONTENT_TIERS, "Licensed stock photos"),
    (addon_ids::EXTRA_PAGE, "Extra page", 250, &[Tier::Business], "Each page beyond the five"),
    (addon_ids::BLOG_CMS_SETUP, "Blog / CMS setup", 900, &[Tier::Business], "Editable collections"),
    (addon_ids::MIGRATION_LIGHT, "Migration (light)", 300, &[Tier::Business], "Up to 10 items"),
    (addon_ids::MIGRATION_STANDARD, "Migration (standard)", 800, &[Tier::Business], "11-50 items"),
    (addon_ids::MIGRATION_HEAVY, "Migration (heavy)", 1_500, &[Tier::Business], "51 to 100 items"),
    (addon_ids::MIGRATION_HEAVY_BLOCK, "Migration block", 600, &[Tier::Business], "Each 50 beyond"),
    (addon_ids::FEATURE_MODULE, "Feature module", 2_500, &[Tier::Custom], "Store, booking, etc."),
    (addon_ids::PAYMENTS_SETUP, "Payments setup", 1_200, &[Tier::Custom], "Gateway integration"),
    (addon_ids::MULTILINGUAL, "Additional language", 900, GROWTH_TIERS, "Per language"),
    (addon_ids::CARE_PLAN, "Care plan (monthly)", 150, ALL_TIERS, "Updates, backups, monitoring"),
];

fn ranged_addon(
    id: &str,
    label: &str,
    (min, max): (i64, i64),
    tiers: &[Tier],
    platforms: Option<Vec<PlatformArchetype>>,
    description: &str,
) -> AddOn {
    AddOn {
        id: AddOnId(id.to_string()),
        label: label.to_string(),
        price: None,
        price_range: range(min, max),
        tiers: tiers.to_vec(),
        platforms,
        description: description.to_string(),
    }
}

fn standard_addons() -> Vec<AddOn> {
    use PlatformArchetype::{Ecommerce, Elearning, Marketplace};

    let mut addons: Vec<AddOn> = FIXED_PRICE_ADDONS
        .iter()
        .map(|&(id, label, price, tiers, description)| AddOn {
            id: AddOnId(id.to_string()),
            label: label.to_string(),
            price: Some(money(price)),
            price_range: None,
            tiers: tiers.to_vec(),
            platforms: None,
            description: description.to_string(),
        })
        .collect();

    addons.extend([
        ranged_addon(
            addon_ids::SEO_STARTER,
            "SEO starter pack",
            (500, 900),
            ALL_TIERS,
            None,
            "Keyword research and search console setup",
        ),
        ranged_addon(
            addon_ids::LOGO_DESIGN,
            "Logo design",
            (600, 1_200),
            ALL_TIERS,
            None,
            "Logo, colour palette and type pairing",
        ),
        ranged_addon(
            addon_ids::INVENTORY_SYNC,
            "Inventory sync",
            (1_500, 3_000),
            &[Tier::Custom],
            Some(vec![Ecommerce, Marketplace]),
            "Sync stock levels with POS or ERP",
        ),
        ranged_addon(
            addon_ids::COURSE_BUILDER,
            "Course builder",
            (2_000, 4_000),
            &[Tier::Custom],
            Some(vec![Elearning]),
            "Lessons, quizzes and progress tracking",
        ),
        ranged_addon(
            addon_ids::VENDOR_ONBOARDING,
            "Vendor onboarding",
            (2_500, 5_000),
            &[Tier::Custom],
            Some(vec![Marketplace]),
            "Seller sign-up, approval and payouts",
        ),
    ]);

    addons
}
