use crate::identity::attributes::map_attributes;
use crate::identity::store::{StoreError, UserStore};
use crate::models::{AccessCredential, AuthId, SessionUser, User};
use crate::utils::logging::LoggingHelper;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

/// Identity and profile returned by a completed provider sign-in
#[derive(Debug, Clone)]
pub struct ProviderSignIn {
    pub provider: String,
    pub provider_user_id: String,
    /// Raw profile payload as returned by the provider
    pub profile: Value,
    pub credential: Option<AccessCredential>,
}

impl ProviderSignIn {
    #[must_use]
    pub fn auth_id(&self) -> AuthId {
        AuthId::new(&self.provider, &self.provider_user_id)
    }
}

/// Which branch of the sign-in merge was taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    /// The auth id was known; the owning user was refreshed
    Existing(User),
    /// Nobody owned the auth id and nobody was signed in
    Created(User),
    /// The auth id was attached to the currently signed-in user
    Linked(User),
}

impl SignInOutcome {
    #[must_use]
    pub fn user(&self) -> &User {
        match self {
            Self::Existing(user) | Self::Created(user) | Self::Linked(user) => user,
        }
    }

    /// Whether the session should be (re)bound to the resulting user
    #[must_use]
    pub fn establishes_session(&self) -> bool {
        !matches!(self, Self::Linked(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("no attribute mapping for provider '{0}'")]
    UnknownProvider(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolves provider sign-ins to local users ("link or create")
pub struct IdentityResolver {
    store: Arc<dyn UserStore>,
    social_provider: String,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, social_provider: &str) -> Self {
        Self {
            store,
            social_provider: social_provider.to_string(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    /// Produce or update exactly one user for `sign_in`
    ///
    /// `current` is the signed-in session user, if any. It is only used when
    /// the auth id is unknown, to link the new identity to that user. A
    /// session pointing to a user that no longer exists is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider has no attribute mapping or the
    /// store rejects the change.
    pub fn sign_in(
        &self,
        sign_in: ProviderSignIn,
        current: Option<&SessionUser>,
    ) -> Result<SignInOutcome, IdentityError> {
        let attributes = map_attributes(&sign_in.provider, &sign_in.profile)
            .ok_or_else(|| IdentityError::UnknownProvider(sign_in.provider.clone()))?;
        let auth_id = sign_in.auth_id();

        LoggingHelper::log_user_lookup(&auth_id);

        if let Some(mut user) = self.store.get_by_auth_id(&auth_id)? {
            LoggingHelper::log_existing_user(&user.id);
            user.profile.overlay(&attributes);
            self.store_credential(&mut user, &sign_in);
            user.updated_at = Utc::now();
            self.store.update(user.clone())?;
            return Ok(SignInOutcome::Existing(user));
        }

        if let Some(current) = current {
            if let Some(mut user) = self.store.get(&current.user_id)? {
                LoggingHelper::log_linking_user(&auth_id, &user.id);
                user.add_auth_id(auth_id);
                user.profile.overlay(&attributes);
                self.store_credential(&mut user, &sign_in);
                user.updated_at = Utc::now();
                self.store.update(user.clone())?;
                return Ok(SignInOutcome::Linked(user));
            }
            LoggingHelper::log_stale_session(&current.user_id);
        }

        LoggingHelper::log_new_user(&auth_id);
        let mut user = User::new(auth_id, attributes);
        self.store_credential(&mut user, &sign_in);
        self.store.insert(user.clone())?;
        Ok(SignInOutcome::Created(user))
    }

    /// Keep the latest social API credential; other providers never clear it
    fn store_credential(&self, user: &mut User, sign_in: &ProviderSignIn) {
        if sign_in.provider != self.social_provider {
            return;
        }
        if let Some(credential) = &sign_in.credential {
            user.credential = Some(credential.clone());
        }
    }
}
