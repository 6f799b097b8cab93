//! A fully wired application over in-memory fakes

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::test::TestRequest;

use crate::app::AppServices;
use crate::identity::{MemoryUserStore, UserStore};
use crate::models::{AppSession, User};
use crate::oauth::ProviderRegistry;
use crate::session::SessionManager;
use crate::templates::HtmlTemplates;
use crate::winner::WinnerPicker;

use super::constants::{TEST_OTHER_PROVIDER, TEST_SOCIAL_PROVIDER};
use super::fixtures::test_settings;
use super::mock::{FixedPicker, StubSignInProvider, StubSocialApi, StubSocialApiFactory};

/// Application services plus handles on the fakes behind them
///
/// ```rust,ignore
/// let app = TestApp::new();
/// let service = test::init_service(
///     App::new().configure(|cfg| app.services.configure(cfg)),
/// )
/// .await;
/// ```
pub struct TestApp {
    pub services: AppServices,
    pub store: Arc<MemoryUserStore>,
    pub social: Arc<StubSocialApiFactory>,
    pub sessions: SessionManager,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// Empty social API, first candidate always wins
    #[must_use]
    pub fn new() -> Self {
        Self::with_api(StubSocialApi::new())
    }

    #[must_use]
    pub fn with_api(api: StubSocialApi) -> Self {
        Self::with_picker(api, Arc::new(FixedPicker::new(0)))
    }

    #[must_use]
    pub fn with_picker(api: StubSocialApi, picker: Arc<dyn WinnerPicker>) -> Self {
        let settings = test_settings();
        let sessions = SessionManager::from_settings(&settings);

        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(StubSignInProvider::social(
            TEST_SOCIAL_PROVIDER,
            "Twitter",
        )));
        registry.register(Arc::new(StubSignInProvider::identity_only(
            TEST_OTHER_PROVIDER,
            "Google",
        )));

        let store = Arc::new(MemoryUserStore::new());
        let social = Arc::new(StubSocialApiFactory::new(api));

        let services = AppServices::new(
            settings,
            registry,
            store.clone(),
            social.clone(),
            picker,
            Arc::new(HtmlTemplates::new()),
        );

        Self {
            services,
            store,
            social,
            sessions,
        }
    }

    /// The stub behind every social API client
    #[must_use]
    pub fn api(&self) -> &StubSocialApi {
        self.social.api()
    }

    /// Store `user` and hand it back
    ///
    /// # Panics
    ///
    /// Panics if one of the user's auth ids is already taken.
    #[must_use]
    pub fn add_user(&self, user: User) -> User {
        self.store
            .insert(user.clone())
            .expect("test user should be unique");
        user
    }

    /// Stored copy of user `id`
    #[must_use]
    pub fn stored_user(&self, id: &str) -> Option<User> {
        self.store.get(id).ok().flatten()
    }

    /// Session cookie of `user`, signed in through their first auth id
    ///
    /// # Panics
    ///
    /// Panics if the user has no auth id.
    #[must_use]
    pub fn session_cookie_for(&self, user: &User) -> Cookie<'static> {
        let auth_id = user
            .auth_ids
            .first()
            .cloned()
            .expect("test user should have an auth id");
        let mut session = AppSession::default();
        self.sessions.sign_in(&mut session, user, auth_id);
        self.session_cookie(&session)
    }

    /// Encrypted cookie carrying `session`
    ///
    /// # Panics
    ///
    /// Panics if encryption fails.
    #[must_use]
    pub fn session_cookie(&self, session: &AppSession) -> Cookie<'static> {
        self.sessions
            .session_cookie(session)
            .expect("session should encrypt")
    }

    /// Decrypt the session carried by `cookie`
    #[must_use]
    pub fn read_session(&self, cookie: Cookie<'static>) -> AppSession {
        let req = TestRequest::default()
            .cookie(cookie)
            .to_http_request();
        self.sessions.load(&req)
    }
}
