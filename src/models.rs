use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

// =============================================================================
// Identity
// =============================================================================

/// External authentication identifier in the form `provider:provider_user_id`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AuthId {
    provider: String,
    provider_user_id: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid auth id '{0}': expected provider:id")]
pub struct AuthIdParseError(String);

impl AuthId {
    #[must_use]
    pub fn new(provider: &str, provider_user_id: &str) -> Self {
        Self {
            provider: provider.to_string(),
            provider_user_id: provider_user_id.to_string(),
        }
    }

    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    #[must_use]
    pub fn provider_user_id(&self) -> &str {
        &self.provider_user_id
    }
}

impl fmt::Display for AuthId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.provider_user_id)
    }
}

impl FromStr for AuthId {
    type Err = AuthIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((provider, id)) if !provider.is_empty() && !id.is_empty() => {
                Ok(Self::new(provider, id))
            }
            _ => Err(AuthIdParseError(s.to_string())),
        }
    }
}

impl TryFrom<String> for AuthId {
    type Error = AuthIdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AuthId> for String {
    fn from(value: AuthId) -> Self {
        value.to_string()
    }
}

/// OAuth 1.0a access token pair for the social API
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCredential {
    pub provider: String,
    pub token: String,
    pub secret: String,
}

impl fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessCredential")
            .field("provider", &self.provider)
            .field("token", &"[redacted]")
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// Canonical profile fields a provider payload can be mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    AvatarUrl,
    Link,
    Email,
    FirstName,
    LastName,
}

/// Canonical profile attributes mapped from a provider payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttributes {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub link: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserAttributes {
    fn slot(&mut self, field: ProfileField) -> &mut Option<String> {
        match field {
            ProfileField::Name => &mut self.name,
            ProfileField::AvatarUrl => &mut self.avatar_url,
            ProfileField::Link => &mut self.link,
            ProfileField::Email => &mut self.email,
            ProfileField::FirstName => &mut self.first_name,
            ProfileField::LastName => &mut self.last_name,
        }
    }

    /// Set `field` unless an earlier rule already filled it
    pub fn set_default(&mut self, field: ProfileField, value: String) {
        let slot = self.slot(field);
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    #[must_use]
    pub fn get(&self, field: ProfileField) -> Option<&str> {
        match field {
            ProfileField::Name => self.name.as_deref(),
            ProfileField::AvatarUrl => self.avatar_url.as_deref(),
            ProfileField::Link => self.link.as_deref(),
            ProfileField::Email => self.email.as_deref(),
            ProfileField::FirstName => self.first_name.as_deref(),
            ProfileField::LastName => self.last_name.as_deref(),
        }
    }

    /// Overwrite every field of `self` that `newer` supplies
    pub fn overlay(&mut self, newer: &Self) {
        for field in [
            ProfileField::Name,
            ProfileField::AvatarUrl,
            ProfileField::Link,
            ProfileField::Email,
            ProfileField::FirstName,
            ProfileField::LastName,
        ] {
            if let Some(value) = newer.get(field) {
                *self.slot(field) = Some(value.to_string());
            }
        }
    }
}

/// Local user record, one per person regardless of how many providers are linked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub auth_ids: Vec<AuthId>,
    #[serde(default)]
    pub profile: UserAttributes,
    #[serde(default)]
    pub credential: Option<AccessCredential>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a brand new user owning a single auth id
    #[must_use]
    pub fn new(auth_id: AuthId, profile: UserAttributes) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            auth_ids: vec![auth_id],
            profile,
            credential: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn has_auth_id(&self, auth_id: &AuthId) -> bool {
        self.auth_ids.contains(auth_id)
    }

    /// Link another provider identity; returns false if it was already linked
    pub fn add_auth_id(&mut self, auth_id: AuthId) -> bool {
        if self.has_auth_id(&auth_id) {
            return false;
        }
        self.auth_ids.push(auth_id);
        true
    }

    /// Best available display name
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.profile.name {
            return name.clone();
        }
        match (&self.profile.first_name, &self.profile.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self
                .auth_ids
                .first()
                .map_or_else(|| self.id.clone(), ToString::to_string),
        }
    }

    /// Stored social credential, if one was issued by `provider`
    #[must_use]
    pub fn credential_for(&self, provider: &str) -> Option<&AccessCredential> {
        self.credential
            .as_ref()
            .filter(|credential| credential.provider == provider)
    }
}

// =============================================================================
// Session
// =============================================================================

/// Identity of the signed-in user as carried in the session cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: String,
    pub auth_id: AuthId,
    pub signed_in_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionUser {
    #[must_use]
    pub fn provider(&self) -> &str {
        self.auth_id.provider()
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Info,
    Success,
    Error,
}

/// One-shot message shown on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// Contents of the encrypted session cookie
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSession {
    #[serde(default)]
    pub user: Option<SessionUser>,
    #[serde(default)]
    pub flashes: Vec<Flash>,
}

impl AppSession {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn add_flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.flashes.push(Flash {
            level,
            message: message.into(),
        });
    }

    /// Remove and return pending flashes
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }
}
