//! OAuth 1.0a three-legged sign-in (Twitter, LinkedIn v1)

use super::{
    parse_form, read_success, take_param, OAuthCallback, OAuthError, OAuthState, SignInProvider,
    SignInStart,
};
use crate::identity::ProviderSignIn;
use crate::models::AccessCredential;
use crate::oauth::signing::OAuth1Signer;
use crate::settings::{ProviderSettings, ResolvedEndpoints};
use crate::utils::logging::LoggingHelper;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;

pub struct OAuth1Provider {
    name: String,
    display_name: String,
    consumer_key: String,
    consumer_secret: String,
    request_token_url: String,
    authorization_url: String,
    access_token_url: String,
    user_info_url: String,
    http: reqwest::Client,
}

impl OAuth1Provider {
    #[must_use]
    pub fn new(
        settings: &ProviderSettings,
        endpoints: &ResolvedEndpoints,
        consumer_key: &str,
        consumer_secret: &str,
        http: reqwest::Client,
    ) -> Self {
        Self {
            name: settings.name.clone(),
            display_name: settings.label().to_string(),
            consumer_key: consumer_key.to_string(),
            consumer_secret: consumer_secret.to_string(),
            request_token_url: endpoints.request_token.clone().unwrap_or_default(),
            authorization_url: endpoints.authorization.clone(),
            access_token_url: endpoints.access_token.clone().unwrap_or_default(),
            user_info_url: endpoints.user_info.clone(),
            http,
        }
    }

    fn signer(&self) -> OAuth1Signer {
        OAuth1Signer::new(&self.consumer_key, &self.consumer_secret)
    }

    /// Signed POST to a token endpoint, returning the form-encoded answer
    async fn token_request(
        &self,
        url: &str,
        signer: &OAuth1Signer,
        oauth_params: &[(&str, &str)],
    ) -> Result<std::collections::HashMap<String, String>, OAuthError> {
        let header = signer.authorization_header("POST", url, &[], oauth_params)?;
        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, header)
            .send()
            .await?;
        let body = read_success(response).await?;
        LoggingHelper::log_token_response_fields(&self.name, &body);
        Ok(parse_form(&body))
    }

    async fn fetch_profile(&self, token: &str, token_secret: &str) -> Result<Value, OAuthError> {
        let header = self
            .signer()
            .with_token(token, token_secret)
            .authorization_header("GET", &self.user_info_url, &[], &[])?;
        let response = self
            .http
            .get(&self.user_info_url)
            .header(AUTHORIZATION, header)
            .send()
            .await?;
        let body = read_success(response).await?;
        serde_json::from_str(&body).map_err(|e| OAuthError::InvalidResponse(e.to_string()))
    }
}

/// Provider user id from the profile, falling back to the token response
fn provider_user_id(profile: &Value, token_user_id: Option<&str>) -> Option<String> {
    profile
        .get("id_str")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .or_else(|| match profile.get("id") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        })
        .or_else(|| token_user_id.map(ToString::to_string))
}

#[async_trait]
impl SignInProvider for OAuth1Provider {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn begin(&self, callback_url: &str) -> Result<SignInStart, OAuthError> {
        let mut params = self
            .token_request(
                &self.request_token_url,
                &self.signer(),
                &[("oauth_callback", callback_url)],
            )
            .await?;
        let request_token = take_param(&mut params, "oauth_token")?;
        let request_token_secret = take_param(&mut params, "oauth_token_secret")?;

        let mut url = url::Url::parse(&self.authorization_url)?;
        url.query_pairs_mut()
            .append_pair("oauth_token", &request_token);
        LoggingHelper::log_authorization_url_built(&self.name, url.as_str());

        Ok(SignInStart {
            authorization_url: url.to_string(),
            state: OAuthState {
                state: request_token.clone(),
                provider: self.name.clone(),
                callback_url: callback_url.to_string(),
                request_token: Some(request_token),
                request_token_secret: Some(request_token_secret),
            },
        })
    }

    async fn complete(
        &self,
        callback: &OAuthCallback,
        state: &OAuthState,
    ) -> Result<ProviderSignIn, OAuthError> {
        if let Some(denied) = &callback.denied {
            return Err(OAuthError::Denied(denied.clone()));
        }
        let token = callback
            .oauth_token
            .as_deref()
            .ok_or(OAuthError::MissingParameter("oauth_token"))?;
        let verifier = callback
            .oauth_verifier
            .as_deref()
            .ok_or(OAuthError::MissingParameter("oauth_verifier"))?;
        let (Some(request_token), Some(request_token_secret)) =
            (&state.request_token, &state.request_token_secret)
        else {
            return Err(OAuthError::StateMismatch);
        };
        if token != request_token {
            return Err(OAuthError::StateMismatch);
        }

        LoggingHelper::log_token_exchange_start(&self.name);
        let signer = self.signer().with_token(request_token, request_token_secret);
        let mut params = self
            .token_request(
                &self.access_token_url,
                &signer,
                &[("oauth_verifier", verifier)],
            )
            .await?;
        let access_token = take_param(&mut params, "oauth_token")?;
        let access_token_secret = take_param(&mut params, "oauth_token_secret")?;

        let profile = self
            .fetch_profile(&access_token, &access_token_secret)
            .await?;
        let provider_user_id =
            provider_user_id(&profile, params.get("user_id").map(String::as_str))
                .ok_or_else(|| OAuthError::InvalidResponse("profile has no id".to_string()))?;

        Ok(ProviderSignIn {
            provider: self.name.clone(),
            provider_user_id,
            profile,
            credential: Some(AccessCredential {
                provider: self.name.clone(),
                token: access_token,
                secret: access_token_secret,
            }),
        })
    }
}
