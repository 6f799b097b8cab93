//! Encrypted cookie sessions and flash messages

pub mod cookie;
pub mod manager;

pub use cookie::{CookieFactory, CookieOptions, OAUTH_STATE_COOKIE, SESSION_COOKIE};
pub use manager::{SessionError, SessionManager};
