//! OAuth 2.0 authorization-code sign-in

use super::{
    parse_form, read_success, verify_state, OAuthCallback, OAuthError, OAuthState,
    SignInProvider, SignInStart,
};
use crate::identity::ProviderSignIn;
use crate::settings::{ProviderSettings, ResolvedEndpoints};
use crate::utils::crypto::generate_csrf_token;
use crate::utils::logging::LoggingHelper;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::collections::HashMap;

pub struct OAuth2Provider {
    name: String,
    display_name: String,
    client_id: String,
    client_secret: String,
    authorization_url: String,
    token_url: String,
    user_info_url: String,
    scopes: Vec<String>,
    extra_auth_params: HashMap<String, String>,
    http: reqwest::Client,
}

impl OAuth2Provider {
    #[must_use]
    pub fn new(
        settings: &ProviderSettings,
        endpoints: &ResolvedEndpoints,
        client_id: &str,
        client_secret: &str,
        http: reqwest::Client,
    ) -> Self {
        Self {
            name: settings.name.clone(),
            display_name: settings.label().to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            authorization_url: endpoints.authorization.clone(),
            token_url: endpoints.token.clone().unwrap_or_default(),
            user_info_url: endpoints.user_info.clone(),
            scopes: endpoints.scopes.clone(),
            extra_auth_params: settings.extra_auth_params.clone(),
            http,
        }
    }

    /// Build the authorization URL for a given CSRF token
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization endpoint is not a URL
    pub fn authorization_url(&self, callback_url: &str, csrf: &str) -> Result<String, OAuthError> {
        let mut url = url::Url::parse(&self.authorization_url)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", callback_url)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", csrf);

        for (key, value) in &self.extra_auth_params {
            url.query_pairs_mut().append_pair(key, value);
        }

        LoggingHelper::log_authorization_url_built(&self.name, url.as_str());
        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str, callback_url: &str) -> Result<String, OAuthError> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("redirect_uri", callback_url);
        params.insert("client_id", self.client_id.as_str());
        params.insert("client_secret", self.client_secret.as_str());

        LoggingHelper::log_token_exchange_start(&self.name);
        let response = self
            .http
            .post(&self.token_url)
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?;
        let body = read_success(response).await?;
        LoggingHelper::log_token_response_fields(&self.name, &body);

        access_token_from(&body)
            .ok_or_else(|| OAuthError::InvalidResponse("no access_token in token response".to_string()))
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Value, OAuthError> {
        let mut url = url::Url::parse(&self.user_info_url)?;
        // Foursquare only accepts the token as a query parameter
        if self.name == "foursquare" {
            url.query_pairs_mut().append_pair("oauth_token", access_token);
        }
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let body = read_success(response).await?;
        serde_json::from_str(&body).map_err(|e| OAuthError::InvalidResponse(e.to_string()))
    }
}

/// Token responses are JSON, except for a few providers that answer with a form body
fn access_token_from(body: &str) -> Option<String> {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        return json
            .get("access_token")
            .and_then(Value::as_str)
            .map(ToString::to_string);
    }
    parse_form(body)
        .remove("access_token")
        .filter(|token| !token.is_empty())
}

/// Unwrap provider envelopes and find the user id
fn profile_and_id(provider: &str, payload: Value) -> Option<(String, Value)> {
    let profile = match provider {
        "foursquare" => payload.pointer("/response/user").cloned()?,
        _ => payload,
    };
    let id = ["id", "sub", "id_str"]
        .iter()
        .find_map(|key| match profile.get(*key) {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        })?;
    Some((id, profile))
}

#[async_trait]
impl SignInProvider for OAuth2Provider {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn begin(&self, callback_url: &str) -> Result<SignInStart, OAuthError> {
        let csrf = generate_csrf_token();
        let authorization_url = self.authorization_url(callback_url, &csrf)?;
        Ok(SignInStart {
            authorization_url,
            state: OAuthState {
                state: csrf,
                provider: self.name.clone(),
                callback_url: callback_url.to_string(),
                request_token: None,
                request_token_secret: None,
            },
        })
    }

    async fn complete(
        &self,
        callback: &OAuthCallback,
        state: &OAuthState,
    ) -> Result<ProviderSignIn, OAuthError> {
        if let Some(error) = &callback.error {
            let detail = callback
                .error_description
                .as_ref()
                .map_or_else(|| error.clone(), |description| format!("{error}: {description}"));
            return Err(OAuthError::Denied(detail));
        }
        verify_state(callback.state.as_deref(), state)?;
        let code = callback
            .code
            .as_deref()
            .ok_or(OAuthError::MissingParameter("code"))?;

        let access_token = self.exchange_code(code, &state.callback_url).await?;
        let payload = self.fetch_profile(&access_token).await?;
        let (provider_user_id, profile) = profile_and_id(&self.name, payload)
            .ok_or_else(|| OAuthError::InvalidResponse("profile has no id".to_string()))?;

        Ok(ProviderSignIn {
            provider: self.name.clone(),
            provider_user_id,
            profile,
            // Only the OAuth 1.0a social provider yields API credentials
            credential: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::well_known_endpoints;
    use serde_json::json;

    fn provider() -> OAuth2Provider {
        let mut settings = ProviderSettings {
            name: "google".to_string(),
            display_name: Some("Google".to_string()),
            ..Default::default()
        };
        settings
            .extra_auth_params
            .insert("prompt".to_string(), "select_account".to_string());
        let endpoints = well_known_endpoints("google").unwrap();
        OAuth2Provider::new(&settings, &endpoints, "client", "secret", reqwest::Client::new())
    }

    #[test]
    fn test_authorization_url_parameters() {
        let url = provider()
            .authorization_url("http://localhost:8080/auth/google/callback", "csrf123")
            .unwrap();
        let parsed = url::Url::parse(&url).unwrap();
        let pairs: HashMap<String, String> = parsed.query_pairs().into_owned().collect();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert_eq!(pairs["client_id"], "client");
        assert_eq!(pairs["redirect_uri"], "http://localhost:8080/auth/google/callback");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["scope"], "openid email profile");
        assert_eq!(pairs["state"], "csrf123");
        assert_eq!(pairs["prompt"], "select_account");
    }

    #[actix_web::test]
    async fn test_begin_issues_fresh_state() {
        let provider = provider();
        let first = provider.begin("http://cb").await.unwrap();
        let second = provider.begin("http://cb").await.unwrap();
        assert_ne!(first.state.state, second.state.state);
        assert_eq!(first.state.provider, "google");
        assert_eq!(first.state.callback_url, "http://cb");
        assert!(first.authorization_url.contains(&first.state.state));
    }

    #[actix_web::test]
    async fn test_complete_rejects_wrong_state() {
        let provider = provider();
        let start = provider.begin("http://cb").await.unwrap();
        let callback = OAuthCallback {
            code: Some("code".to_string()),
            state: Some("forged".to_string()),
            ..Default::default()
        };
        let err = provider.complete(&callback, &start.state).await.unwrap_err();
        assert!(matches!(err, OAuthError::StateMismatch));
    }

    #[actix_web::test]
    async fn test_complete_reports_provider_error() {
        let provider = provider();
        let start = provider.begin("http://cb").await.unwrap();
        let callback = OAuthCallback {
            error: Some("access_denied".to_string()),
            ..Default::default()
        };
        let err = provider.complete(&callback, &start.state).await.unwrap_err();
        assert!(matches!(err, OAuthError::Denied(ref msg) if msg == "access_denied"));
    }

    #[test]
    fn test_access_token_from_json_or_form() {
        assert_eq!(
            access_token_from(r#"{"access_token":"abc","token_type":"Bearer"}"#).as_deref(),
            Some("abc")
        );
        assert_eq!(
            access_token_from("access_token=xyz&expires=5183999").as_deref(),
            Some("xyz")
        );
        assert!(access_token_from(r#"{"error":"bad"}"#).is_none());
    }

    #[test]
    fn test_profile_and_id() {
        let (id, _) = profile_and_id("google", json!({"sub": "g-1", "name": "Ada"})).unwrap();
        assert_eq!(id, "g-1");

        let (id, profile) = profile_and_id(
            "foursquare",
            json!({"meta": {}, "response": {"user": {"id": "4sq", "firstName": "Den"}}}),
        )
        .unwrap();
        assert_eq!(id, "4sq");
        assert_eq!(profile["firstName"], "Den");

        assert!(profile_and_id("facebook", json!({"name": "x"})).is_none());
    }
}
