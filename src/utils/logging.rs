// Centralized logging utilities to keep handler and service code terse
use crate::models::AuthId;
use log::{debug, error, info, warn};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log sign-in provider initialization start
    pub fn log_provider_initialization() {
        info!("🔧 Initializing sign-in providers from configuration...");
    }

    /// Log that a provider is disabled
    pub fn log_provider_disabled(provider_name: &str) {
        info!("⏭️  Provider {provider_name} is disabled, skipping");
    }

    /// Log that a provider is configured
    pub fn log_provider_configured(display_name: &str, provider_name: &str, protocol: &str) {
        info!("✅ {display_name} {protocol} configured ({provider_name})");
    }

    /// Log that a provider is missing credentials or endpoints
    pub fn log_provider_not_configured(display_name: &str, reason: &str) {
        info!("❌ {display_name} not configured - {reason}");
    }

    /// Log summary of configured providers
    pub fn log_providers_summary(provider_names: &[String]) {
        info!("🎯 Configured sign-in providers: {provider_names:?}");
    }

    /// Log authorization URL building
    pub fn log_authorization_url_built(provider: &str, url: &str) {
        debug!("🔍 Built {provider} authorization URL: {url}");
    }

    /// Log token exchange start
    pub fn log_token_exchange_start(provider: &str) {
        info!("🔄 Exchanging callback credentials for tokens with {provider}");
    }

    /// Log which fields a token response carried, never their values
    pub fn log_token_response_fields(provider: &str, response_text: &str) {
        debug!(
            "{provider} token response fields: {:?}",
            token_response_fields(response_text)
        );
    }

    pub fn log_user_lookup(auth_id: &AuthId) {
        info!("Looking for a user with id {auth_id}");
    }

    pub fn log_existing_user(user_id: &str) {
        info!("Found existing user {user_id}");
    }

    pub fn log_new_user(auth_id: &AuthId) {
        info!("Creating a brand new user for {auth_id}");
    }

    pub fn log_linking_user(auth_id: &AuthId, user_id: &str) {
        info!("Linking {auth_id} to currently logged in user {user_id}");
    }

    pub fn log_stale_session(user_id: &str) {
        warn!("Session refers to unknown user {user_id}; treating sign-in as new");
    }

    /// Log session creation success
    pub fn log_session_created(user_id: &str, provider: &str) {
        info!("Successfully built session for user: {user_id} (provider: {provider})");
    }

    /// Log an upstream failure that cut a paginated fetch short
    pub fn log_partial_fetch(collection: &str, pages: usize, items: usize, err: &dyn std::fmt::Display) {
        error!("Fetching {collection} failed after {pages} page(s) and {items} item(s): {err}");
    }

    /// Log the rate limit snapshot fetched after a failure
    pub fn log_rate_limit_status(status: &serde_json::Value) {
        info!("Rate limit status: {status}");
    }

    pub fn log_rate_limit_unavailable(err: &dyn std::fmt::Display) {
        warn!("Could not fetch rate limit status: {err}");
    }

    /// Log which parameters an OAuth callback carried
    pub fn log_callback_debug(req: &actix_web::HttpRequest, callback_data: &crate::oauth::OAuthCallback) {
        let present: Vec<&str> = [
            ("code", &callback_data.code),
            ("state", &callback_data.state),
            ("error", &callback_data.error),
            ("error_description", &callback_data.error_description),
            ("oauth_token", &callback_data.oauth_token),
            ("oauth_verifier", &callback_data.oauth_verifier),
            ("denied", &callback_data.denied),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_some())
        .map(|(name, _)| name)
        .collect();
        debug!("OAuth callback received via {} with {present:?}", req.method());
        debug!("Callback request connection info: {:?}", req.connection_info());
    }
}

/// Field names of a JSON or form-encoded token response
fn token_response_fields(body: &str) -> Vec<String> {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(fields)) => fields.keys().cloned().collect(),
        _ => url::form_urlencoded::parse(body.trim().as_bytes())
            .map(|(name, _)| name.into_owned())
            .collect(),
    }
}
