//! Application wiring
//!
//! Every collaborator a handler extracts is built here once and shared with
//! each worker through `web::Data`.

use crate::handlers::{configure_routes, PageRenderer};
use crate::identity::{IdentityResolver, JsonFileUserStore, MemoryUserStore, UserStore};
use crate::oauth::ProviderRegistry;
use crate::session::SessionManager;
use crate::settings::WinnerSettings;
use crate::templates::{HtmlTemplates, TemplateRenderer};
use crate::twitter::{SocialApiFactory, TwitterClientFactory};
use crate::winner::{UniformPicker, WinnerPicker, WinnerService};
use actix_web::web;
use log::info;
use std::sync::Arc;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AppServices {
    pub settings: web::Data<WinnerSettings>,
    pub registry: web::Data<ProviderRegistry>,
    pub identity: web::Data<IdentityResolver>,
    pub social: web::Data<dyn SocialApiFactory>,
    pub winners: web::Data<WinnerService>,
    pub pages: web::Data<PageRenderer>,
}

impl AppServices {
    #[must_use]
    pub fn new(
        settings: WinnerSettings,
        registry: ProviderRegistry,
        store: Arc<dyn UserStore>,
        social: Arc<dyn SocialApiFactory>,
        picker: Arc<dyn WinnerPicker>,
        templates: Arc<dyn TemplateRenderer>,
    ) -> Self {
        let social_provider = settings.twitter.social_provider.clone();
        let pages = PageRenderer::new(
            templates,
            SessionManager::from_settings(&settings),
            &registry,
            &social_provider,
        );

        Self {
            identity: web::Data::new(IdentityResolver::new(store, &social_provider)),
            registry: web::Data::new(registry),
            social: web::Data::from(social),
            winners: web::Data::new(WinnerService::new(picker)),
            pages: web::Data::new(pages),
            settings: web::Data::new(settings),
        }
    }

    /// Production collaborators: real providers, the Twitter API and the
    /// configured user store
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the users file
    /// cannot be loaded.
    pub fn from_settings(settings: WinnerSettings) -> Result<Self, Box<dyn std::error::Error>> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("twitter-winner/", env!("CARGO_PKG_VERSION")))
            .timeout(HTTP_TIMEOUT)
            .build()?;

        let store: Arc<dyn UserStore> = match &settings.storage.users_file {
            Some(path) => {
                info!("Storing users in {path}");
                Arc::new(JsonFileUserStore::open(path)?)
            }
            None => {
                info!("Storing users in memory; they are lost on restart");
                Arc::new(MemoryUserStore::new())
            }
        };

        let registry = ProviderRegistry::from_settings(&settings, &http);
        let social = Arc::new(TwitterClientFactory::from_settings(&settings, http));

        Ok(Self::new(
            settings,
            registry,
            store,
            social,
            Arc::new(UniformPicker),
            Arc::new(HtmlTemplates::new()),
        ))
    }

    /// Register the shared collaborators and all routes
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.settings.clone())
            .app_data(self.registry.clone())
            .app_data(self.identity.clone())
            .app_data(self.social.clone())
            .app_data(self.winners.clone())
            .app_data(self.pages.clone());
        configure_routes(cfg);
    }
}
