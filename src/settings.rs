use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;

/// Longest session a deployment may configure, one leap year
pub const MAX_SESSION_DURATION_HOURS: u64 = 24 * 366;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WinnerSettings {
    #[serde(default)]
    pub application: ApplicationSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub cookies: CookieSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub static_files: StaticFilesSettings,
    #[serde(default)]
    pub twitter: TwitterSettings,
    #[serde(default)]
    pub providers: Vec<ProviderSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub redirect_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    pub session_secret: String,
    /// Lifetime of a signed-in session (and of its cookie) in hours
    pub session_duration_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageSettings {
    /// JSON file holding user records. Users live in memory only when unset.
    pub users_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticFilesSettings {
    pub assets_folder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterSettings {
    pub api_base_url: String,
    /// Sign-in provider whose access token is used for API calls
    pub social_provider: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProtocol {
    OAuth1,
    OAuth2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub name: String,
    pub display_name: Option<String>,
    pub protocol: Option<OAuthProtocol>,

    // OAuth 1.0a
    pub request_token_endpoint: Option<String>,
    pub access_token_endpoint: Option<String>,

    // Shared by both protocols
    pub authorization_endpoint: Option<String>,
    pub user_info_endpoint: Option<String>,

    // OAuth 2.0
    pub token_endpoint: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,

    // Direct values (can be overridden by environment variables)
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    // Environment variable names for overrides
    pub client_id_env: Option<String>,
    pub client_secret_env: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub extra_auth_params: HashMap<String, String>,
}

fn default_true() -> bool {
    true
}

/// Endpoints of a provider with every well-known default applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoints {
    pub protocol: OAuthProtocol,
    pub request_token: Option<String>,
    pub authorization: String,
    pub access_token: Option<String>,
    pub token: Option<String>,
    pub user_info: String,
    pub scopes: Vec<String>,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            redirect_base_url: "http://localhost:8080".to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_secret: String::new(), // Will be generated if empty
            session_duration_hours: 24,
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self { secure: true }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for StaticFilesSettings {
    fn default() -> Self {
        Self {
            assets_folder: "static".to_string(),
        }
    }
}

impl Default for TwitterSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.twitter.com/1.1".to_string(),
            social_provider: "twitter".to_string(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            display_name: None,
            protocol: None,
            request_token_endpoint: None,
            access_token_endpoint: None,
            authorization_endpoint: None,
            user_info_endpoint: None,
            token_endpoint: None,
            scopes: Vec::new(),
            client_id: None,
            client_secret: None,
            client_id_env: None,
            client_secret_env: None,
            enabled: true,
            extra_auth_params: HashMap::new(),
        }
    }
}

impl WinnerSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Logger initialization fails
    /// - Settings file cannot be read or parsed
    /// - A value is out of its accepted range
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::initialize_environment()?;

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);
        settings.validate()?;

        Ok(settings)
    }

    /// Reject values the server cannot run with
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid value
    pub fn validate(&self) -> Result<(), String> {
        let hours = self.session.session_duration_hours;
        if !(1..=MAX_SESSION_DURATION_HOURS).contains(&hours) {
            return Err(format!(
                "session_duration_hours must be between 1 and {MAX_SESSION_DURATION_HOURS}, got {hours}"
            ));
        }
        Ok(())
    }

    /// Load `.env` and start the logger
    ///
    /// # Errors
    ///
    /// Returns an error if logger initialization fails
    fn initialize_environment() -> Result<(), Box<dyn std::error::Error>> {
        Self::load_env_file();
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init()?;
        Ok(())
    }

    /// Load base settings from TOML file(s) or use defaults
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `WINNER_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_toml(&fs::read_to_string(&default_config_path)?)?;
            log::info!("Loaded base settings from {}", default_config_path.display());
        }

        if let Ok(secrets_dir) = std::env::var("WINNER_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_toml(&fs::read_to_string(&secrets_path)?)?;
                log::info!("Overriding settings from {}", secrets_path.display());
            } else {
                log::info!(
                    "WINNER_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse settings from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or has the wrong shape
    pub fn from_toml(content: &str) -> Result<Self, basic_toml::Error> {
        basic_toml::from_str(content)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_cookie_env_overrides(&mut settings.cookies);
        Self::apply_logging_env_overrides(&mut settings.logging);
        Self::apply_storage_env_overrides(&mut settings.storage);
        Self::apply_static_files_env_overrides(&mut settings.static_files);
        Self::apply_twitter_env_overrides(&mut settings.twitter);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(redirect_base_url) = std::env::var("REDIRECT_BASE_URL") {
            app_settings.redirect_base_url = redirect_base_url;
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(value) = std::env::var("SESSION_DURATION_HOURS") {
            if let Ok(hours) = value.parse::<u64>() {
                session_settings.session_duration_hours = hours;
            }
        }

        let env_secret_set = std::env::var("SESSION_SECRET").is_ok_and(|secret| {
            if secret.is_empty() {
                false
            } else {
                session_settings.session_secret = secret;
                true
            }
        });

        if !env_secret_set && session_settings.session_secret.is_empty() {
            session_settings.session_secret = Self::generate_random_session_secret();
            log::warn!(
                "Using auto-generated session secret; sessions will not survive a restart. \
                 Set SESSION_SECRET or session_secret in Settings.toml"
            );
        }
    }

    /// 32 random bytes, base64 encoded
    fn generate_random_session_secret() -> String {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        general_purpose::STANDARD.encode(secret)
    }

    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        if let Ok(cookie_secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(cookie_secure) = cookie_secure_str.parse::<bool>() {
                cookie_settings.secure = cookie_secure;
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    fn apply_storage_env_overrides(storage_settings: &mut StorageSettings) {
        if let Ok(users_file) = std::env::var("USERS_FILE") {
            storage_settings.users_file = (!users_file.is_empty()).then_some(users_file);
        }
    }

    fn apply_static_files_env_overrides(static_settings: &mut StaticFilesSettings) {
        if let Ok(assets_folder) = std::env::var("STATIC_FOLDER_PATH") {
            static_settings.assets_folder = assets_folder;
        }
    }

    fn apply_twitter_env_overrides(twitter_settings: &mut TwitterSettings) {
        if let Ok(api_base_url) = std::env::var("TWITTER_API_BASE_URL") {
            twitter_settings.api_base_url = api_base_url;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    #[must_use]
    pub fn get_provider(&self, name: &str) -> Option<&ProviderSettings> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Absolute callback URL registered with `provider`
    #[must_use]
    pub fn callback_url(&self, provider: &str) -> String {
        format!(
            "{}/auth/{provider}/callback",
            self.application.redirect_base_url.trim_end_matches('/')
        )
    }
}

impl ProviderSettings {
    /// Get the client ID, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_client_id(&self) -> Option<String> {
        if let Some(env_var) = &self.client_id_env {
            if let Ok(value) = std::env::var(env_var) {
                return Some(value);
            }
        }
        self.client_id.clone()
    }

    /// Get the client secret, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_client_secret(&self) -> Option<String> {
        if let Some(env_var) = &self.client_secret_env {
            if let Ok(value) = std::env::var(env_var) {
                return Some(value);
            }
        }
        self.client_secret.clone()
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Resolve endpoints, filling gaps from the well-known provider defaults
    ///
    /// Returns `None` when a required endpoint is neither configured nor known.
    #[must_use]
    pub fn resolve_endpoints(&self) -> Option<ResolvedEndpoints> {
        let defaults = well_known_endpoints(&self.name);
        let protocol = self
            .protocol
            .or_else(|| defaults.as_ref().map(|d| d.protocol))?;

        let pick = |configured: &Option<String>, default: Option<&String>| {
            configured.clone().or_else(|| default.cloned())
        };

        let authorization = pick(
            &self.authorization_endpoint,
            defaults.as_ref().map(|d| &d.authorization),
        )?;
        let user_info = pick(
            &self.user_info_endpoint,
            defaults.as_ref().map(|d| &d.user_info),
        )?;
        let request_token = pick(
            &self.request_token_endpoint,
            defaults.as_ref().and_then(|d| d.request_token.as_ref()),
        );
        let access_token = pick(
            &self.access_token_endpoint,
            defaults.as_ref().and_then(|d| d.access_token.as_ref()),
        );
        let token = pick(
            &self.token_endpoint,
            defaults.as_ref().and_then(|d| d.token.as_ref()),
        );
        let scopes = if self.scopes.is_empty() {
            defaults.map(|d| d.scopes).unwrap_or_default()
        } else {
            self.scopes.clone()
        };

        match protocol {
            OAuthProtocol::OAuth1 if request_token.is_none() || access_token.is_none() => None,
            OAuthProtocol::OAuth2 if token.is_none() => None,
            _ => Some(ResolvedEndpoints {
                protocol,
                request_token,
                authorization,
                access_token,
                token,
                user_info,
                scopes,
            }),
        }
    }
}

fn endpoints(
    protocol: OAuthProtocol,
    authorization: &str,
    exchange: &str,
    request_token: Option<&str>,
    user_info: &str,
    scopes: &[&str],
) -> ResolvedEndpoints {
    let (access_token, token) = match protocol {
        OAuthProtocol::OAuth1 => (Some(exchange.to_string()), None),
        OAuthProtocol::OAuth2 => (None, Some(exchange.to_string())),
    };
    ResolvedEndpoints {
        protocol,
        request_token: request_token.map(ToString::to_string),
        authorization: authorization.to_string(),
        access_token,
        token,
        user_info: user_info.to_string(),
        scopes: scopes.iter().map(ToString::to_string).collect(),
    }
}

/// Default endpoints for the providers the attribute table knows about
#[must_use]
pub fn well_known_endpoints(name: &str) -> Option<ResolvedEndpoints> {
    let resolved = match name {
        "twitter" => endpoints(
            OAuthProtocol::OAuth1,
            "https://api.twitter.com/oauth/authenticate",
            "https://api.twitter.com/oauth/access_token",
            Some("https://api.twitter.com/oauth/request_token"),
            "https://api.twitter.com/1.1/account/verify_credentials.json",
            &[],
        ),
        "google" => endpoints(
            OAuthProtocol::OAuth2,
            "https://accounts.google.com/o/oauth2/v2/auth",
            "https://oauth2.googleapis.com/token",
            None,
            "https://openidconnect.googleapis.com/v1/userinfo",
            &["openid", "email", "profile"],
        ),
        "facebook" => endpoints(
            OAuthProtocol::OAuth2,
            "https://www.facebook.com/dialog/oauth",
            "https://graph.facebook.com/oauth/access_token",
            None,
            "https://graph.facebook.com/me?fields=id,name,link",
            &["public_profile"],
        ),
        "windows_live" => endpoints(
            OAuthProtocol::OAuth2,
            "https://login.live.com/oauth20_authorize.srf",
            "https://login.live.com/oauth20_token.srf",
            None,
            "https://apis.live.net/v5.0/me",
            &["wl.signin"],
        ),
        "linkedin2" => endpoints(
            OAuthProtocol::OAuth2,
            "https://www.linkedin.com/oauth/v2/authorization",
            "https://www.linkedin.com/oauth/v2/accessToken",
            None,
            "https://api.linkedin.com/v1/people/~:(id,first-name,picture-url,public-profile-url)?format=json",
            &["r_basicprofile"],
        ),
        "foursquare" => endpoints(
            OAuthProtocol::OAuth2,
            "https://foursquare.com/oauth2/authenticate",
            "https://foursquare.com/oauth2/access_token",
            None,
            "https://api.foursquare.com/v2/users/self?v=20140101",
            &[],
        ),
        _ => return None,
    };
    Some(resolved)
}
