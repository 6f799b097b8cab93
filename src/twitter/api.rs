use crate::models::AccessCredential;
use crate::oauth::SigningError;
use crate::twitter::models::{IdsPage, SavedSearch, SearchResults, Tweet, TwitterUser, UsersPage};
use async_trait::async_trait;
use serde_json::Value;

/// Page sizes used for each endpoint (the API maximums)
pub const FOLLOWERS_PAGE_SIZE: u32 = 200;
pub const RETWEETERS_PAGE_SIZE: u32 = 100;
pub const SEARCH_PAGE_SIZE: u32 = 100;
pub const RETWEETS_OF_ME_COUNT: u32 = 100;

/// Cursor value that requests the first page
pub const FIRST_CURSOR: i64 = -1;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not decode API response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Signing(#[from] SigningError),
}

/// Authenticated access to the social network on behalf of one user
#[async_trait]
pub trait SocialApi: Send + Sync {
    /// One page of the user's followers
    async fn followers_page(&self, cursor: i64, count: u32) -> Result<UsersPage, ApiError>;

    /// The user's own tweets that others retweeted
    async fn retweets_of_me(&self, count: u32) -> Result<Vec<Tweet>, ApiError>;

    async fn status(&self, id: &str) -> Result<Tweet, ApiError>;

    /// One page of ids of users who retweeted tweet `id`
    async fn retweeter_ids_page(
        &self,
        id: &str,
        cursor: i64,
        count: u32,
    ) -> Result<IdsPage, ApiError>;

    async fn user(&self, id: &str) -> Result<TwitterUser, ApiError>;

    async fn saved_searches(&self) -> Result<Vec<SavedSearch>, ApiError>;

    async fn saved_search(&self, id: &str) -> Result<SavedSearch, ApiError>;

    async fn search(&self, query: &str, count: u32) -> Result<SearchResults, ApiError>;

    /// Raw rate limit report for the comma separated `resources`
    async fn rate_limit_status(&self, resources: &str) -> Result<Value, ApiError>;
}

/// Builds a [`SocialApi`] bound to a user's stored credential
pub trait SocialApiFactory: Send + Sync {
    fn client(&self, credential: &AccessCredential) -> Box<dyn SocialApi>;
}
