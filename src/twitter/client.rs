//! reqwest based Twitter v1.1 client signed with the user's access token

use crate::models::AccessCredential;
use crate::oauth::OAuth1Signer;
use crate::settings::WinnerSettings;
use crate::twitter::api::{ApiError, SocialApi, SocialApiFactory};
use crate::twitter::models::{IdsPage, SavedSearch, SearchResults, Tweet, TwitterUser, UsersPage};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub struct TwitterClient {
    http: reqwest::Client,
    base_url: String,
    signer: OAuth1Signer,
}

impl TwitterClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: &str, signer: OAuth1Signer) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            signer,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        let owned: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        let header = self.signer.authorization_header("GET", &url, &owned, &[])?;

        debug!("GET {url} {owned:?}");
        let response = self
            .http
            .get(&url)
            .query(&owned)
            .header(AUTHORIZATION, header)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited);
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SocialApi for TwitterClient {
    async fn followers_page(&self, cursor: i64, count: u32) -> Result<UsersPage, ApiError> {
        self.get(
            "followers/list.json",
            &[
                ("cursor", cursor.to_string()),
                ("count", count.to_string()),
                ("skip_status", "true".to_string()),
            ],
        )
        .await
    }

    async fn retweets_of_me(&self, count: u32) -> Result<Vec<Tweet>, ApiError> {
        self.get(
            "statuses/retweets_of_me.json",
            &[("count", count.to_string())],
        )
        .await
    }

    async fn status(&self, id: &str) -> Result<Tweet, ApiError> {
        self.get("statuses/show.json", &[("id", id.to_string())])
            .await
    }

    async fn retweeter_ids_page(
        &self,
        id: &str,
        cursor: i64,
        count: u32,
    ) -> Result<IdsPage, ApiError> {
        self.get(
            "statuses/retweeters/ids.json",
            &[
                ("id", id.to_string()),
                ("cursor", cursor.to_string()),
                ("count", count.to_string()),
            ],
        )
        .await
    }

    async fn user(&self, id: &str) -> Result<TwitterUser, ApiError> {
        self.get("users/show.json", &[("user_id", id.to_string())])
            .await
    }

    async fn saved_searches(&self) -> Result<Vec<SavedSearch>, ApiError> {
        self.get("saved_searches/list.json", &[]).await
    }

    async fn saved_search(&self, id: &str) -> Result<SavedSearch, ApiError> {
        self.get(&format!("saved_searches/show/{id}.json"), &[])
            .await
    }

    async fn search(&self, query: &str, count: u32) -> Result<SearchResults, ApiError> {
        self.get(
            "search/tweets.json",
            &[("q", query.to_string()), ("count", count.to_string())],
        )
        .await
    }

    async fn rate_limit_status(&self, resources: &str) -> Result<Value, ApiError> {
        self.get(
            "application/rate_limit_status.json",
            &[("resources", resources.to_string())],
        )
        .await
    }
}

/// Creates a [`TwitterClient`] per request from the app's consumer key pair
#[derive(Clone)]
pub struct TwitterClientFactory {
    http: reqwest::Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
}

impl TwitterClientFactory {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        consumer_key: &str,
        consumer_secret: &str,
    ) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            consumer_key: consumer_key.to_string(),
            consumer_secret: consumer_secret.to_string(),
        }
    }

    /// Use the consumer key pair of the configured social sign-in provider
    #[must_use]
    pub fn from_settings(settings: &WinnerSettings, http: reqwest::Client) -> Self {
        let provider = settings.get_provider(&settings.twitter.social_provider);
        let consumer_key = provider.and_then(crate::settings::ProviderSettings::get_client_id);
        let consumer_secret =
            provider.and_then(crate::settings::ProviderSettings::get_client_secret);

        if consumer_key.is_none() || consumer_secret.is_none() {
            warn!(
                "No consumer key pair for social provider '{}'; API calls will be rejected",
                settings.twitter.social_provider
            );
        }

        Self::new(
            http,
            &settings.twitter.api_base_url,
            &consumer_key.unwrap_or_default(),
            &consumer_secret.unwrap_or_default(),
        )
    }
}

impl SocialApiFactory for TwitterClientFactory {
    fn client(&self, credential: &AccessCredential) -> Box<dyn SocialApi> {
        let signer = OAuth1Signer::new(&self.consumer_key, &self.consumer_secret)
            .with_token(&credential.token, &credential.secret);
        Box::new(TwitterClient::new(self.http.clone(), &self.base_url, signer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = TwitterClient::new(
            reqwest::Client::new(),
            "https://api.twitter.com/1.1/",
            OAuth1Signer::new("k", "s"),
        );
        assert_eq!(
            client.endpoint("followers/list.json"),
            "https://api.twitter.com/1.1/followers/list.json"
        );
    }

    #[test]
    fn test_factory_reads_social_provider_keys() {
        let settings = WinnerSettings::from_toml(
            r#"
            [twitter]
            api_base_url = "http://127.0.0.1:9/1.1"
            social_provider = "twitter"

            [[providers]]
            name = "twitter"
            client_id = "ck"
            client_secret = "cs"
            "#,
        )
        .unwrap();
        let factory = TwitterClientFactory::from_settings(&settings, reqwest::Client::new());
        assert_eq!(factory.consumer_key, "ck");
        assert_eq!(factory.consumer_secret, "cs");
        assert_eq!(factory.base_url, "http://127.0.0.1:9/1.1");
    }
}
