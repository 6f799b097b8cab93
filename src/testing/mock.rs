//! Fake implementations of the external collaborators
//!
//! Stubs record what they were asked so tests can check that a request did,
//! or did not, reach the social API.

use crate::identity::ProviderSignIn;
use crate::models::AccessCredential;
use crate::oauth::{verify_state, OAuthCallback, OAuthError, OAuthState, SignInProvider, SignInStart};
use crate::twitter::{
    ApiError, IdsPage, SavedSearch, SearchResults, SocialApi, SocialApiFactory, Tweet,
    TwitterUser, UsersPage, FIRST_CURSOR,
};
use crate::winner::WinnerPicker;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// =============================================================================
// Winner picker
// =============================================================================

/// Always picks `index`, clamped to the collection
pub struct FixedPicker {
    index: usize,
}

impl FixedPicker {
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}

impl WinnerPicker for FixedPicker {
    fn pick(&self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.index.min(len - 1))
    }
}

// =============================================================================
// Social API
// =============================================================================

#[derive(Default)]
struct StubState {
    followers: Vec<Vec<TwitterUser>>,
    fail_followers_at: Option<usize>,
    retweets_of_me: Vec<Tweet>,
    fail_retweets_of_me: bool,
    statuses: HashMap<String, Tweet>,
    retweeters: HashMap<String, Vec<Vec<u64>>>,
    fail_retweeters_at: Option<usize>,
    users: HashMap<String, TwitterUser>,
    saved_searches: Vec<SavedSearch>,
    fail_saved_searches: bool,
    search_results: HashMap<String, Vec<Tweet>>,
    fail_search: bool,
    calls: Vec<String>,
    user_lookups: Vec<String>,
    rate_limit_calls: usize,
}

/// In-memory social API; clones share their state
#[derive(Clone, Default)]
pub struct StubSocialApi {
    state: Arc<Mutex<StubState>>,
}

impl StubSocialApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: &str) {
        self.state().calls.push(call.to_string());
    }

    /// Follower pages, served one per cursor
    #[must_use]
    pub fn with_followers(self, pages: Vec<Vec<TwitterUser>>) -> Self {
        self.state().followers = pages;
        self
    }

    /// Make the follower page at `page_index` fail with a rate limit error
    #[must_use]
    pub fn fail_followers_at(self, page_index: usize) -> Self {
        self.state().fail_followers_at = Some(page_index);
        self
    }

    #[must_use]
    pub fn with_retweets_of_me(self, tweets: Vec<Tweet>) -> Self {
        self.state().retweets_of_me = tweets;
        self
    }

    #[must_use]
    pub fn fail_retweets_of_me(self) -> Self {
        self.state().fail_retweets_of_me = true;
        self
    }

    #[must_use]
    pub fn with_status(self, tweet: Tweet) -> Self {
        self.state().statuses.insert(tweet.id.to_string(), tweet);
        self
    }

    /// Retweeter id pages of tweet `id`
    #[must_use]
    pub fn with_retweeters(self, id: &str, pages: Vec<Vec<u64>>) -> Self {
        self.state().retweeters.insert(id.to_string(), pages);
        self
    }

    /// Make the retweeter id page at `page_index` fail with a rate limit error
    #[must_use]
    pub fn fail_retweeters_at(self, page_index: usize) -> Self {
        self.state().fail_retweeters_at = Some(page_index);
        self
    }

    #[must_use]
    pub fn with_user(self, user: TwitterUser) -> Self {
        self.state().users.insert(user.id.to_string(), user);
        self
    }

    #[must_use]
    pub fn with_saved_search(self, search: SavedSearch) -> Self {
        self.state().saved_searches.push(search);
        self
    }

    #[must_use]
    pub fn fail_saved_searches(self) -> Self {
        self.state().fail_saved_searches = true;
        self
    }

    #[must_use]
    pub fn with_search_results(self, query: &str, tweets: Vec<Tweet>) -> Self {
        self.state()
            .search_results
            .insert(query.to_string(), tweets);
        self
    }

    #[must_use]
    pub fn fail_search(self) -> Self {
        self.state().fail_search = true;
        self
    }

    /// Every API method called so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Ids passed to `user()`
    #[must_use]
    pub fn user_lookups(&self) -> Vec<String> {
        self.state().user_lookups.clone()
    }

    #[must_use]
    pub fn rate_limit_calls(&self) -> usize {
        self.state().rate_limit_calls
    }
}

fn not_found(what: &str, id: &str) -> ApiError {
    ApiError::Status {
        status: 404,
        body: format!("no {what} {id}"),
    }
}

/// Index of the page `cursor` points at; cursors are page indices here
fn page_index(cursor: i64) -> usize {
    if cursor == FIRST_CURSOR {
        0
    } else {
        usize::try_from(cursor).unwrap_or(0)
    }
}

fn next_cursor(index: usize, pages: usize) -> i64 {
    if index + 1 < pages {
        i64::try_from(index + 1).unwrap_or(0)
    } else {
        0
    }
}

#[async_trait]
impl SocialApi for StubSocialApi {
    async fn followers_page(&self, cursor: i64, _count: u32) -> Result<UsersPage, ApiError> {
        self.record("followers_page");
        let state = self.state();
        let index = page_index(cursor);
        if state.fail_followers_at == Some(index) {
            return Err(ApiError::RateLimited);
        }
        Ok(UsersPage {
            users: state.followers.get(index).cloned().unwrap_or_default(),
            next_cursor: next_cursor(index, state.followers.len()),
        })
    }

    async fn retweets_of_me(&self, _count: u32) -> Result<Vec<Tweet>, ApiError> {
        self.record("retweets_of_me");
        let state = self.state();
        if state.fail_retweets_of_me {
            return Err(ApiError::RateLimited);
        }
        Ok(state.retweets_of_me.clone())
    }

    async fn status(&self, id: &str) -> Result<Tweet, ApiError> {
        self.record("status");
        self.state()
            .statuses
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("status", id))
    }

    async fn retweeter_ids_page(
        &self,
        id: &str,
        cursor: i64,
        _count: u32,
    ) -> Result<IdsPage, ApiError> {
        self.record("retweeter_ids_page");
        let state = self.state();
        let index = page_index(cursor);
        if state.fail_retweeters_at == Some(index) {
            return Err(ApiError::RateLimited);
        }
        let pages = state.retweeters.get(id).map_or(&[][..], Vec::as_slice);
        Ok(IdsPage {
            ids: pages.get(index).cloned().unwrap_or_default(),
            next_cursor: next_cursor(index, pages.len()),
        })
    }

    async fn user(&self, id: &str) -> Result<TwitterUser, ApiError> {
        self.record("user");
        let mut state = self.state();
        state.user_lookups.push(id.to_string());
        let user = state.users.get(id).cloned();
        user.ok_or_else(|| not_found("user", id))
    }

    async fn saved_searches(&self) -> Result<Vec<SavedSearch>, ApiError> {
        self.record("saved_searches");
        let state = self.state();
        if state.fail_saved_searches {
            return Err(ApiError::RateLimited);
        }
        Ok(state.saved_searches.clone())
    }

    async fn saved_search(&self, id: &str) -> Result<SavedSearch, ApiError> {
        self.record("saved_search");
        self.state()
            .saved_searches
            .iter()
            .find(|search| search.id.to_string() == id)
            .cloned()
            .ok_or_else(|| not_found("saved search", id))
    }

    async fn search(&self, query: &str, count: u32) -> Result<SearchResults, ApiError> {
        self.record("search");
        let state = self.state();
        if state.fail_search {
            return Err(ApiError::RateLimited);
        }
        let mut statuses = state.search_results.get(query).cloned().unwrap_or_default();
        statuses.truncate(usize::try_from(count).unwrap_or(usize::MAX));
        Ok(SearchResults { statuses })
    }

    async fn rate_limit_status(&self, resources: &str) -> Result<Value, ApiError> {
        self.record("rate_limit_status");
        self.state().rate_limit_calls += 1;
        Ok(json!({ "resources": { resources: {} } }))
    }
}

/// Hands out clients of one shared [`StubSocialApi`] and records credentials
#[derive(Default)]
pub struct StubSocialApiFactory {
    api: StubSocialApi,
    credentials: Mutex<Vec<AccessCredential>>,
}

impl StubSocialApiFactory {
    #[must_use]
    pub fn new(api: StubSocialApi) -> Self {
        Self {
            api,
            credentials: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn api(&self) -> &StubSocialApi {
        &self.api
    }

    /// Credentials clients were built with, one per request
    #[must_use]
    pub fn credentials(&self) -> Vec<AccessCredential> {
        self.credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SocialApiFactory for StubSocialApiFactory {
    fn client(&self, credential: &AccessCredential) -> Box<dyn SocialApi> {
        self.credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(credential.clone());
        Box::new(self.api.clone())
    }
}

// =============================================================================
// Sign-in provider
// =============================================================================

/// CSRF state the stub always issues
pub const STUB_STATE: &str = "stub-state";

/// Provider that signs in whoever the callback's `code` names
///
/// `GET /auth/{name}/callback?code=42&state=stub-state` completes a sign-in
/// as provider user `42`. Denials come through `error` or `denied`.
pub struct StubSignInProvider {
    name: String,
    display_name: String,
    issues_credential: bool,
}

impl StubSignInProvider {
    /// A provider whose sign-ins carry a social API credential
    #[must_use]
    pub fn social(name: &str, display_name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            issues_credential: true,
        }
    }

    /// A provider that only proves identity
    #[must_use]
    pub fn identity_only(name: &str, display_name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            issues_credential: false,
        }
    }

    /// Profile payload carrying the keys every attribute table looks for
    #[must_use]
    pub fn profile(provider_user_id: &str) -> Value {
        let handle = format!("user{provider_user_id}");
        json!({
            "id": provider_user_id,
            "id_str": provider_user_id,
            "sub": provider_user_id,
            "screen_name": handle,
            "name": handle,
            "profile_image_url": format!("https://img.example/{handle}.png"),
            "picture": format!("https://img.example/{handle}.png"),
            "profile": format!("https://profiles.example/{handle}"),
        })
    }
}

#[async_trait]
impl SignInProvider for StubSignInProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn begin(&self, callback_url: &str) -> Result<SignInStart, OAuthError> {
        Ok(SignInStart {
            authorization_url: format!(
                "https://{}.example/authorize?state={STUB_STATE}&redirect_uri={}",
                self.name,
                urlencoding::encode(callback_url)
            ),
            state: OAuthState {
                state: STUB_STATE.to_string(),
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
        if let Some(error) = callback.error.as_ref().or(callback.denied.as_ref()) {
            return Err(OAuthError::Denied(error.clone()));
        }
        verify_state(callback.state.as_deref(), state)?;
        let provider_user_id = callback
            .code
            .clone()
            .ok_or(OAuthError::MissingParameter("code"))?;

        let credential = self.issues_credential.then(|| AccessCredential {
            provider: self.name.clone(),
            token: format!("token-{provider_user_id}"),
            secret: format!("token-{provider_user_id}-secret"),
        });

        Ok(ProviderSignIn {
            provider: self.name.clone(),
            profile: Self::profile(&provider_user_id),
            provider_user_id,
            credential,
        })
    }
}
