//! Sign-in providers
//!
//! Each configured provider implements [`SignInProvider`]; the
//! [`ProviderRegistry`] holds the ones that have complete credentials.
//! Twitter and LinkedIn v1 speak OAuth 1.0a, the rest OAuth 2.0.

pub mod oauth1;
pub mod oauth2;
pub mod signing;

pub use oauth1::OAuth1Provider;
pub use oauth2::OAuth2Provider;
pub use signing::{OAuth1Signer, SigningError};

use crate::identity::ProviderSignIn;
use crate::settings::{OAuthProtocol, WinnerSettings};
use crate::utils::logging::LoggingHelper;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Query (or form) parameters a provider sends back to the callback
#[derive(Deserialize, Debug, Default, Clone)]
pub struct OAuthCallback {
    // OAuth 2.0
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    // OAuth 1.0a
    pub oauth_token: Option<String>,
    pub oauth_verifier: Option<String>,
    pub denied: Option<String>,
}

/// Flow state kept in the short-lived encrypted state cookie
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OAuthState {
    /// CSRF token (OAuth 2.0) or request token (OAuth 1.0a)
    pub state: String,
    pub provider: String,
    pub callback_url: String,
    #[serde(default)]
    pub request_token: Option<String>,
    #[serde(default)]
    pub request_token_secret: Option<String>,
}

/// Where to send the browser to start a sign-in, plus the state to remember
#[derive(Debug, Clone)]
pub struct SignInStart {
    pub authorization_url: String,
    pub state: OAuthState,
}

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("sign-in was cancelled or denied: {0}")]
    Denied(String),
    #[error("OAuth state mismatch")]
    StateMismatch,
    #[error("missing callback parameter: {0}")]
    MissingParameter(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Signing(#[from] SigningError),
}

/// A third-party identity provider
#[async_trait]
pub trait SignInProvider: Send + Sync {
    /// Provider key used in routes and auth ids, e.g. `twitter`
    fn name(&self) -> &str;

    /// Human readable label for sign-in links
    fn display_name(&self) -> &str;

    /// Start a sign-in that will come back to `callback_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached or answers badly
    async fn begin(&self, callback_url: &str) -> Result<SignInStart, OAuthError>;

    /// Finish a sign-in from the callback parameters and the remembered state
    ///
    /// # Errors
    ///
    /// Returns an error if the user denied access, the state does not match,
    /// or the token exchange or profile fetch fails.
    async fn complete(
        &self,
        callback: &OAuthCallback,
        state: &OAuthState,
    ) -> Result<ProviderSignIn, OAuthError>;
}

/// Provider name and label as shown in page navigation
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ProviderSummary {
    pub name: String,
    pub label: String,
}

/// The set of usable sign-in providers
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn SignInProvider>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build providers from settings, skipping any without credentials or endpoints
    #[must_use]
    pub fn from_settings(settings: &WinnerSettings, http_client: &reqwest::Client) -> Self {
        LoggingHelper::log_provider_initialization();
        let mut registry = Self::new();

        for provider_settings in &settings.providers {
            let label = provider_settings.label().to_string();
            if !provider_settings.enabled {
                LoggingHelper::log_provider_disabled(&provider_settings.name);
                continue;
            }

            let Some(endpoints) = provider_settings.resolve_endpoints() else {
                LoggingHelper::log_provider_not_configured(&label, "missing endpoints");
                continue;
            };
            let (Some(client_id), Some(client_secret)) = (
                provider_settings.get_client_id(),
                provider_settings.get_client_secret(),
            ) else {
                LoggingHelper::log_provider_not_configured(&label, "missing client id or secret");
                continue;
            };

            let provider: Arc<dyn SignInProvider> = match endpoints.protocol {
                OAuthProtocol::OAuth1 => Arc::new(OAuth1Provider::new(
                    provider_settings,
                    &endpoints,
                    &client_id,
                    &client_secret,
                    http_client.clone(),
                )),
                OAuthProtocol::OAuth2 => Arc::new(OAuth2Provider::new(
                    provider_settings,
                    &endpoints,
                    &client_id,
                    &client_secret,
                    http_client.clone(),
                )),
            };
            let protocol = match endpoints.protocol {
                OAuthProtocol::OAuth1 => "OAuth1",
                OAuthProtocol::OAuth2 => "OAuth2",
            };
            LoggingHelper::log_provider_configured(&label, &provider_settings.name, protocol);
            registry.register(provider);
        }

        if registry.is_empty() {
            log::warn!("No sign-in providers are configured; only public pages will work");
        } else {
            LoggingHelper::log_providers_summary(&registry.names());
        }
        registry
    }

    /// Add a provider, replacing any existing one with the same name
    pub fn register(&mut self, provider: Arc<dyn SignInProvider>) {
        self.providers.retain(|p| p.name() != provider.name());
        self.providers.push(provider);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn SignInProvider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    #[must_use]
    pub fn summaries(&self) -> Vec<ProviderSummary> {
        self.providers
            .iter()
            .map(|p| ProviderSummary {
                name: p.name().to_string(),
                label: p.display_name().to_string(),
            })
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Check that the provider echoed the CSRF token we issued
///
/// # Errors
///
/// Returns [`OAuthError::StateMismatch`] if the value is missing or differs
pub fn verify_state(received: Option<&str>, stored: &OAuthState) -> Result<(), OAuthError> {
    match received {
        Some(received) if received == stored.state => Ok(()),
        _ => Err(OAuthError::StateMismatch),
    }
}

/// Read a successful response body, turning other statuses into errors
async fn read_success(response: reqwest::Response) -> Result<String, OAuthError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(OAuthError::Upstream {
            status: status.as_u16(),
            body,
        })
    }
}

/// Parse an `application/x-www-form-urlencoded` body
fn parse_form(body: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(body.trim().as_bytes())
        .into_owned()
        .collect()
}

fn take_param(params: &mut HashMap<String, String>, key: &str) -> Result<String, OAuthError> {
    params
        .remove(key)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| OAuthError::InvalidResponse(format!("missing {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ProviderSettings;

    fn state() -> OAuthState {
        OAuthState {
            state: "csrf".to_string(),
            provider: "google".to_string(),
            callback_url: "http://localhost/auth/google/callback".to_string(),
            request_token: None,
            request_token_secret: None,
        }
    }

    #[test]
    fn test_verify_state() {
        assert!(verify_state(Some("csrf"), &state()).is_ok());
        assert!(matches!(
            verify_state(Some("other"), &state()),
            Err(OAuthError::StateMismatch)
        ));
        assert!(verify_state(None, &state()).is_err());
    }

    #[test]
    fn test_parse_form() {
        let params = parse_form("oauth_token=abc&oauth_token_secret=d%2Be&oauth_callback_confirmed=true\n");
        assert_eq!(params.get("oauth_token").map(String::as_str), Some("abc"));
        assert_eq!(params.get("oauth_token_secret").map(String::as_str), Some("d+e"));
    }

    #[test]
    fn test_registry_skips_incomplete_providers() {
        let mut settings = WinnerSettings::default();
        settings.providers = vec![
            ProviderSettings {
                name: "twitter".to_string(),
                client_id: Some("key".to_string()),
                client_secret: Some("secret".to_string()),
                ..Default::default()
            },
            ProviderSettings {
                name: "google".to_string(),
                client_id: Some("id".to_string()),
                ..Default::default()
            },
            ProviderSettings {
                name: "facebook".to_string(),
                client_id: Some("id".to_string()),
                client_secret: Some("secret".to_string()),
                enabled: false,
                ..Default::default()
            },
            ProviderSettings {
                name: "custom".to_string(),
                client_id: Some("id".to_string()),
                client_secret: Some("secret".to_string()),
                ..Default::default()
            },
        ];

        let registry = ProviderRegistry::from_settings(&settings, &reqwest::Client::new());
        assert_eq!(registry.names(), vec!["twitter".to_string()]);
        assert!(registry.get("twitter").is_some());
        assert!(registry.get("google").is_none());
        assert_eq!(
            registry.summaries(),
            vec![ProviderSummary {
                name: "twitter".to_string(),
                label: "twitter".to_string()
            }]
        );
    }
}
