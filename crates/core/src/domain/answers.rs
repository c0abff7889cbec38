//! Planner questionnaire as submitted by the client.
//!
//! Every section defaults so a partially filled form still deserializes and
//! can be run through validation; the estimator only ever sees validated input.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerAnswers {
    pub basics: BusinessBasics,
    pub goal: Option<PrimaryGoal>,
    pub pages: PageSelection,
    pub features: FeatureSelection,
    pub content: ContentReadiness,
    pub integrations: Integrations,
    pub timing: TimingBudget,
    pub contact: ContactInfo,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessBasics {
    pub company_name: String,
    pub industry: String,
    pub audience: String,
    pub website_status: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryGoal {
    Inquiries,
    Bookings,
    Sales,
    Credibility,
    Community,
}

impl PrimaryGoal {
    pub fn label(self) -> &'static str {
        match self {
            Self::Inquiries => "Generate inquiries",
            Self::Bookings => "Take bookings",
            Self::Sales => "Sell online",
            Self::Credibility => "Build credibility",
            Self::Community => "Grow a community",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Home,
    About,
    Services,
    Portfolio,
    Pricing,
    Testimonials,
    Faq,
    Contact,
    Careers,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSelection {
    pub selected: BTreeSet<PageKind>,
    pub other_count: u32,
}

impl PageSelection {
    pub fn page_count(&self) -> u32 {
        (self.selected.len() as u32).saturating_add(self.other_count)
    }
}

/// Feature modules that push a project into the custom tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancedFeature {
    OnlineStore,
    Booking,
    Membership,
    Dashboard,
}

impl AdvancedFeature {
    pub fn label(self) -> &'static str {
        match self {
            Self::OnlineStore => "Online store",
            Self::Booking => "Booking system",
            Self::Membership => "Membership area",
            Self::Dashboard => "Client dashboard",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSelection {
    pub blog: bool,
    pub cms: bool,
    pub online_store: bool,
    pub booking: bool,
    pub membership: bool,
    pub dashboard: bool,
    pub contact_form: bool,
    pub newsletter_signup: bool,
    /// Languages requested on top of the primary one.
    pub multilingual_languages: u32,
}

impl FeatureSelection {
    /// Advanced flags in a fixed order, independent of how the form set them.
    pub fn advanced(&self) -> Vec<AdvancedFeature> {
        [
            (self.online_store, AdvancedFeature::OnlineStore),
            (self.booking, AdvancedFeature::Booking),
            (self.membership, AdvancedFeature::Membership),
            (self.dashboard, AdvancedFeature::Dashboard),
        ]
        .into_iter()
        .filter_map(|(enabled, feature)| enabled.then_some(feature))
        .collect()
    }

    pub fn wants_blog_or_cms(&self) -> bool {
        self.blog || self.cms
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoReadiness {
    Ready,
    NeedsRefresh,
    #[default]
    Missing,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyReadiness {
    Ready,
    NeedsPolish,
    #[default]
    FromScratch,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageReadiness {
    Ready,
    Curate,
    #[default]
    NeedStock,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentReadiness {
    pub logo: LogoReadiness,
    pub copy: CopyReadiness,
    pub images: ImageReadiness,
    pub privacy_policy: bool,
    pub terms_of_service: bool,
    pub migration_items: u32,
}

impl ContentReadiness {
    /// Brand and content assets are far enough along to earn the readiness credit.
    pub fn qualifies_for_credit(&self) -> bool {
        self.logo == LogoReadiness::Ready
            && self.copy != CopyReadiness::FromScratch
            && matches!(self.images, ImageReadiness::Ready | ImageReadiness::Curate)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Integrations {
    pub stripe: bool,
    pub paypal: bool,
    pub local_gateway: bool,
    pub crm: bool,
    pub email_marketing: bool,
    pub analytics: bool,
}

impl Integrations {
    pub fn wants_payments(&self) -> bool {
        self.stripe || self.paypal || self.local_gateway
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flexibility {
    Fixed,
    SomeFlex,
    Flexible,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetBand {
    #[serde(rename = "under_3k")]
    Under3k,
    #[serde(rename = "3k_6k")]
    From3kTo6k,
    #[serde(rename = "6k_12k")]
    From6kTo12k,
    #[serde(rename = "12k_plus")]
    Above12k,
    #[serde(rename = "not_sure")]
    NotSure,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPreference {
    FullUpfront,
    Milestones,
    Installments6,
    Installments12,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingBudget {
    pub launch_date: Option<NaiveDate>,
    pub flexibility: Option<Flexibility>,
    pub budget: Option<BudgetBand>,
    pub payment: Option<PaymentPreference>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub consent: bool,
}

#[cfg(test)]
mod tests {
    use super::{
        AdvancedFeature, ContentReadiness, CopyReadiness, FeatureSelection, ImageReadiness,
        LogoReadiness, PageKind, PageSelection, PlannerAnswers,
    };

    #[test]
    fn partial_payload_deserializes_with_defaults() {
        let answers: PlannerAnswers = serde_json::from_str(
            r#"{"basics":{"company_name":"Kopi Lab"},"goal":"inquiries","pages":{"selected":["home","contact"]}}"#,
        )
        .expect("partial payload should deserialize");

        assert_eq!(answers.basics.company_name, "Kopi Lab");
        assert!(answers.basics.industry.is_empty());
        assert_eq!(answers.pages.page_count(), 2);
        assert!(answers.pages.selected.contains(&PageKind::Contact));
        assert_eq!(answers.content.copy, CopyReadiness::FromScratch);
        assert!(answers.timing.launch_date.is_none());
    }

    #[test]
    fn advanced_flags_come_back_in_fixed_order() {
        let features = FeatureSelection {
            dashboard: true,
            online_store: true,
            ..FeatureSelection::default()
        };

        assert_eq!(
            features.advanced(),
            vec![AdvancedFeature::OnlineStore, AdvancedFeature::Dashboard]
        );
        assert!(FeatureSelection::default().advanced().is_empty());
    }

    #[test]
    fn page_count_saturates_instead_of_overflowing() {
        let pages = PageSelection {
            selected: [PageKind::Home, PageKind::About].into_iter().collect(),
            other_count: u32::MAX,
        };
        assert_eq!(pages.page_count(), u32::MAX);
    }

    #[test]
    fn readiness_credit_requires_logo_copy_and_images() {
        let mut content = ContentReadiness {
            logo: LogoReadiness::Ready,
            copy: CopyReadiness::NeedsPolish,
            images: ImageReadiness::Curate,
            ..ContentReadiness::default()
        };
        assert!(content.qualifies_for_credit());

        content.copy = CopyReadiness::FromScratch;
        assert!(!content.qualifies_for_credit());

        content.copy = CopyReadiness::Ready;
        content.images = ImageReadiness::NeedStock;
        assert!(!content.qualifies_for_credit());

        content.images = ImageReadiness::Ready;
        content.logo = LogoReadiness::NeedsRefresh;
        assert!(!content.qualifies_for_credit());
    }
}
