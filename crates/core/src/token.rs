//! Quote-acceptance links.
//!
//! A token is the first 16 hex characters of `sha256(submission_id || secret)`.
//! It has no expiry and acts as a capability URL, not an authentication scheme.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use crate::domain::submission::SubmissionId;
use crate::errors::ApplicationError;

pub const TOKEN_LEN: usize = 16;

#[derive(Clone)]
pub struct AcceptanceTokens {
    secret: SecretString,
}

impl std::fmt::Debug for AcceptanceTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcceptanceTokens").field("secret", &"[redacted]").finish()
    }
}

impl AcceptanceTokens {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Fails when no secret is configured so links are never issued unkeyed.
    pub fn from_config(secret: Option<&SecretString>) -> Result<Self, ApplicationError> {
        match secret {
            Some(secret) if !secret.expose_secret().trim().is_empty() => {
                Ok(Self::new(secret.clone()))
            }
            _ => Err(ApplicationError::Configuration(
                "security.acceptance_secret must be set to issue acceptance links".to_string(),
            )),
        }
    }

    pub fn issue(&self, id: &SubmissionId) -> String {
        let mut hasher = Sha256::new();
        hasher.update(id.0.as_bytes());
        hasher.update(self.secret.expose_secret().as_bytes());
        let digest = hasher.finalize();

        let mut token = String::with_capacity(TOKEN_LEN);
        for byte in digest.iter().take(TOKEN_LEN / 2) {
            token.push_str(&format!("{byte:02x}"));
        }
        token
    }

    pub fn verify(&self, id: &SubmissionId, token: &str) -> bool {
        let expected = self.issue(id);
        let candidate = token.trim().to_ascii_lowercase();
        expected.len() == candidate.len()
            && expected.bytes().zip(candidate.bytes()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
    }

    pub fn acceptance_url(&self, base_url: &str, id: &SubmissionId) -> String {
        format!(
            "{}/api/quote/accept?id={}&token={}",
            base_url.trim_end_matches('/'),
            id,
            self.issue(id)
        )
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{AcceptanceTokens, TOKEN_LEN};
    use crate::domain::submission::SubmissionId;
    use crate::errors::ApplicationError;

    fn tokens(secret: &str) -> AcceptanceTokens {
        AcceptanceTokens::new(SecretString::from(secret.to_string()))
    }

    fn id() -> SubmissionId {
        SubmissionId("sub_4f1c2a9e7b6d4c3a9e8f7a6b5c4d3e2f".to_string())
    }

    #[test]
    fn issued_tokens_are_sixteen_lowercase_hex_chars() {
        let token = tokens("studio-secret").issue(&id());
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn issue_is_stable_and_keyed() {
        let first = tokens("studio-secret");
        assert_eq!(first.issue(&id()), first.issue(&id()));
        assert_ne!(first.issue(&id()), tokens("another-secret").issue(&id()));
        assert_ne!(
            first.issue(&id()),
            first.issue(&SubmissionId("sub_00000000000000000000000000000000".to_string()))
        );
    }

    #[test]
    fn verify_accepts_issued_token_and_rejects_others() {
        let tokens = tokens("studio-secret");
        let token = tokens.issue(&id());

        assert!(tokens.verify(&id(), &token));
        assert!(tokens.verify(&id(), &token.to_ascii_uppercase()));
        assert!(!tokens.verify(&id(), "0000000000000000"));
        assert!(!tokens.verify(&id(), &token[..8]));
    }

    #[test]
    fn acceptance_url_carries_id_and_token() {
        let tokens = tokens("studio-secret");
        let url = tokens.acceptance_url("https://studio.example/", &id());
        assert_eq!(
            url,
            format!(
                "https://studio.example/api/quote/accept?id={}&token={}",
                id(),
                tokens.issue(&id())
            )
        );
    }

    #[test]
    fn missing_or_blank_secret_is_a_configuration_error() {
        assert!(matches!(
            AcceptanceTokens::from_config(None),
            Err(ApplicationError::Configuration(_))
        ));
        let blank = SecretString::from("   ".to_string());
        assert!(matches!(
            AcceptanceTokens::from_config(Some(&blank)),
            Err(ApplicationError::Configuration(_))
        ));
        let secret = SecretString::from("s3cret".to_string());
        assert!(AcceptanceTokens::from_config(Some(&secret)).is_ok());
    }
}
