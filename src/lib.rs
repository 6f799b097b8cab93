#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the twitter-winner application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod app;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod oauth;
pub mod session;
pub mod settings;
pub mod templates;
pub mod twitter;
pub mod utils;
pub mod winner;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use app::AppServices;
pub use handlers::configure_routes;
pub use identity::{IdentityResolver, UserStore};
pub use models::{AppSession, User};
pub use session::SessionManager;
pub use settings::WinnerSettings;
pub use winner::WinnerService;
