//! Shared test support
//!
//! - [`fixtures`] - Pre-built test data (users, tweets, settings)
//! - [`mock`] - Fake social API, sign-in providers and winner picker
//! - [`requests`] - Request builder for driving the routes
//! - [`assertions`] - Response checks and cookie helpers
//! - [`app`] - A fully wired application over the fakes
//!
//! ```rust,ignore
//! use twitter_winner::testing::{app::TestApp, fixtures::twitter_account};
//!
//! let app = TestApp::new();
//! let user = app.add_user(twitter_account("42", "alice"));
//! let cookie = app.session_cookie_for(&user);
//! ```

pub mod app;
pub mod assertions;
pub mod fixtures;
pub mod mock;
pub mod requests;

pub use app::TestApp;
pub use requests::RequestBuilder;

/// Common test constants
pub mod constants {
    /// Session secret shared by test settings and [`super::TestApp`]
    pub const TEST_SESSION_SECRET: &str = "test-session-secret-that-is-long-enough-for-aes256";

    /// Provider whose credentials reach the social API
    pub const TEST_SOCIAL_PROVIDER: &str = "twitter";

    /// Identity-only provider registered next to the social one
    pub const TEST_OTHER_PROVIDER: &str = "google";
}
