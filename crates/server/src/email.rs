//! Outbound email for planner estimates and lead notifications.
//!
//! Templates are embedded at build time. Sending is always best effort from the
//! caller's point of view: handlers log failures and keep their response.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use tracing::info;

use studioplan_core::config::{EmailConfig, SiteConfig};
use studioplan_core::domain::answers::ContactInfo;
use studioplan_core::domain::estimate::EstimateBreakdown;
use studioplan_core::domain::lead::LeadForm;
use studioplan_core::domain::submission::SubmissionId;
use studioplan_core::planner::recommendation::LeadRecommendation;
use studioplan_core::region::{format_amount, format_range, Region};

pub const DISCLAIMER: &str = "This estimate is indicative and non-binding. Final scope and \
pricing are confirmed after a short discovery call.";

const TEMPLATES: [(&str, &str); 6] = [
    ("client_estimate.txt", include_str!("../../../templates/email/client_estimate.txt.tera")),
    ("client_estimate.html", include_str!("../../../templates/email/client_estimate.html.tera")),
    (
        "studio_notification.txt",
        include_str!("../../../templates/email/studio_notification.txt.tera"),
    ),
    (
        "studio_notification.html",
        include_str!("../../../templates/email/studio_notification.html.tera"),
    ),
    ("lead_notification.txt", include_str!("../../../templates/email/lead_notification.txt.tera")),
    (
        "lead_notification.html",
        include_str!("../../../templates/email/lead_notification.html.tera"),
    ),
];

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("template error: {0}")]
    Template(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// Posts the message as JSON to a transactional email provider.
pub struct HttpMailer {
    client: Client,
    endpoint: String,
    api_key: SecretString,
}

impl HttpMailer {
    pub fn new(endpoint: impl Into<String>, api_key: SecretString) -> Result<Self, EmailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|error| EmailError::Transport(error.to_string()))?;
        Ok(Self { client, endpoint: endpoint.into(), api_key })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(message)
            .send()
            .await
            .map_err(|error| EmailError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected { status: status.as_u16(), body });
        }

        info!(
            event_name = "email.sent",
            recipients = message.to.len(),
            subject = %message.subject,
            "email handed to provider"
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        info!(
            event_name = "email.disabled",
            recipients = message.to.len(),
            subject = %message.subject,
            "email disabled, message dropped"
        );
        Ok(())
    }
}

pub fn mailer_from_config(config: &EmailConfig) -> Result<Arc<dyn Mailer>, EmailError> {
    if !config.enabled {
        return Ok(Arc::new(DisabledMailer));
    }

    match (&config.provider_url, &config.api_key) {
        (Some(url), Some(api_key)) => Ok(Arc::new(HttpMailer::new(url.clone(), api_key.clone())?)),
        _ => Err(EmailError::Transport(
            "email is enabled without provider_url and api_key".to_string(),
        )),
    }
}

#[derive(Clone, Debug)]
pub struct EmailSettings {
    pub studio_name: String,
    pub base_url: String,
    pub from: String,
    pub studio_inbox: String,
    pub reply_to: Option<String>,
}

impl EmailSettings {
    pub fn from_config(site: &SiteConfig, email: &EmailConfig) -> Self {
        Self {
            studio_name: site.studio_name.clone(),
            base_url: site.base_url.trim_end_matches('/').to_string(),
            from: email.from.clone(),
            studio_inbox: email.studio_inbox.clone(),
            reply_to: email.reply_to.clone(),
        }
    }

    pub fn view_url(&self, id: &SubmissionId) -> String {
        format!("{}/planner/estimate?id={id}", self.base_url)
    }
}

/// Everything the estimate emails need; amounts are rendered in MYR.
pub struct EstimateEmail<'a> {
    pub reference_id: Option<&'a SubmissionId>,
    pub company: &'a str,
    pub contact: &'a ContactInfo,
    pub package_name: &'a str,
    pub estimate: &'a EstimateBreakdown,
    pub acceptance_url: Option<String>,
}

#[derive(Serialize)]
struct LineContext {
    label: String,
    amount: String,
}

pub struct EmailComposer {
    tera: Tera,
    settings: EmailSettings,
}

impl EmailComposer {
    pub fn new(settings: EmailSettings) -> Result<Self, EmailError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)
            .map_err(|error| EmailError::Template(error.to_string()))?;
        Ok(Self { tera, settings })
    }

    pub fn client_estimate(&self, email: &EstimateEmail<'_>) -> Result<EmailMessage, EmailError> {
        let context = self.estimate_context(email);
        Ok(EmailMessage {
            from: self.settings.from.clone(),
            to: vec![email.contact.email.trim().to_string()],
            subject: format!(
                "Your {} estimate from {}",
                email.package_name, self.settings.studio_name
            ),
            text: self.render("client_estimate.txt", &context)?,
            html: self.render("client_estimate.html", &context)?,
            reply_to: self.settings.reply_to.clone(),
        })
    }

    pub fn studio_notification(
        &self,
        email: &EstimateEmail<'_>,
    ) -> Result<EmailMessage, EmailError> {
        let context = self.estimate_context(email);
        Ok(EmailMessage {
            from: self.settings.from.clone(),
            to: vec![self.settings.studio_inbox.clone()],
            subject: format!(
                "New planner estimate: {} ({})",
                non_blank(email.company, &email.contact.full_name),
                format_amount(email.estimate.total, Region::My)
            ),
            text: self.render("studio_notification.txt", &context)?,
            html: self.render("studio_notification.html", &context)?,
            reply_to: Some(email.contact.email.trim().to_string()),
        })
    }

    pub fn lead_notification(
        &self,
        lead: &LeadForm,
        recommendation: &LeadRecommendation,
        package_name: &str,
        price_range: &str,
        reference_id: Option<&SubmissionId>,
    ) -> Result<EmailMessage, EmailError> {
        let mut context = Context::new();
        context.insert("reference_id", &reference_id.map(ToString::to_string));
        context.insert("contact_name", lead.contact.full_name.trim());
        context.insert("contact_email", lead.contact.email.trim());
        context.insert("contact_phone", &lead.contact.phone);
        context.insert("company", non_blank(&lead.company_name, "Not provided"));
        context.insert("package_name", package_name);
        context.insert("range", price_range);
        context.insert("goals", &recommendation.matched_goals);
        context.insert("features", &lead.features);
        context.insert("upgrade_reasons", &recommendation.upgrade_reasons);
        context.insert("message", &lead.message);

        Ok(EmailMessage {
            from: self.settings.from.clone(),
            to: vec![self.settings.studio_inbox.clone()],
            subject: format!(
                "New lead: {} ({package_name})",
                non_blank(&lead.company_name, &lead.contact.full_name)
            ),
            text: self.render("lead_notification.txt", &context)?,
            html: self.render("lead_notification.html", &context)?,
            reply_to: Some(lead.contact.email.trim().to_string()),
        })
    }

    fn estimate_context(&self, email: &EstimateEmail<'_>) -> Context {
        let estimate = email.estimate;
        let modifiers: Vec<LineContext> = estimate
            .modifiers
            .iter()
            .map(|item| LineContext {
                label: item.label.clone(),
                amount: format_amount(item.amount, Region::My),
            })
            .collect();

        let mut context = Context::new();
        context.insert("studio_name", &self.settings.studio_name);
        context.insert("reference_id", &email.reference_id.map(ToString::to_string));
        context.insert("contact_name", email.contact.full_name.trim());
        context.insert("contact_email", email.contact.email.trim());
        context.insert("contact_phone", &email.contact.phone);
        context.insert("company", non_blank(email.company, "Not provided"));
        context.insert("package_name", email.package_name);
        context.insert("range", &format_range(estimate.range, Region::My));
        context.insert("total", &format_amount(estimate.total, Region::My));
        context.insert("base_price", &format_amount(estimate.base_price, Region::My));
        context.insert("modifiers", &modifiers);
        context.insert(
            "timeline",
            &format!("{}-{} days", estimate.timeline_days.min, estimate.timeline_days.max),
        );
        context.insert(
            "surge",
            &estimate.has_surge().then(|| format_amount(estimate.surge, Region::My)),
        );
        context.insert(
            "surge_percent",
            &(estimate.surge_rate * Decimal::ONE_HUNDRED).normalize().to_string(),
        );
        context.insert(
            "credit",
            &estimate.has_credit().then(|| format_amount(estimate.credits, Region::My)),
        );
        context.insert("rationale", &estimate.rationale);
        context.insert("view_url", &email.reference_id.map(|id| self.settings.view_url(id)));
        context.insert("accept_url", &email.acceptance_url);
        context.insert("disclaimer", DISCLAIMER);
        context
    }

    fn render(&self, template: &str, context: &Context) -> Result<String, EmailError> {
        self.tera
            .render(template, context)
            .map_err(|error| EmailError::Template(format!("{template}: {error}")))
    }
}

fn non_blank<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback.trim()
    } else {
        value.trim()
    }
}

#[cfg(test)]
pub mod testing {
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::{EmailError, EmailMessage, Mailer};

    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<EmailMessage>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
            self.sent.lock().await.push(message.clone());
            Ok(())
        }
    }

    pub struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _message: &EmailMessage) -> Result<(), EmailError> {
            Err(EmailError::Transport("provider unreachable".to_string()))
        }
    }
}
