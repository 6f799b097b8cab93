//! User record storage
//!
//! Records are keyed by their local id with a secondary index from every
//! linked [`AuthId`] to the owning user.

use crate::models::{AuthId, User};
use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("auth id {0} already belongs to another user")]
    DuplicateAuthId(AuthId),
    #[error("user {0} not found")]
    NotFound(String),
    #[error("user store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("user store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("user store lock poisoned")]
    Poisoned,
}

/// Persistence seam for user records
pub trait UserStore: Send + Sync {
    /// Fetch a user by local id
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read
    fn get(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    /// Fetch the user owning `auth_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read
    fn get_by_auth_id(&self, auth_id: &AuthId) -> Result<Option<User>, StoreError>;

    /// Add a new user
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateAuthId`] if one of the user's auth ids is
    /// already owned by another record, or a persistence error.
    fn insert(&self, user: User) -> Result<(), StoreError>;

    /// Replace an existing user record
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown ids,
    /// [`StoreError::DuplicateAuthId`] if a newly linked auth id belongs to
    /// someone else, or a persistence error.
    fn update(&self, user: User) -> Result<(), StoreError>;
}

/// Users plus the auth id index, kept consistent by every mutation
#[derive(Debug, Clone, Default)]
struct UserIndex {
    users: HashMap<String, User>,
    by_auth_id: HashMap<AuthId, String>,
}

impl UserIndex {
    fn from_users(users: Vec<User>) -> Result<Self, StoreError> {
        let mut index = Self::default();
        for user in users {
            index.insert(user)?;
        }
        Ok(index)
    }

    fn check_auth_ids(&self, user: &User) -> Result<(), StoreError> {
        for auth_id in &user.auth_ids {
            if let Some(owner) = self.by_auth_id.get(auth_id) {
                if owner != &user.id {
                    return Err(StoreError::DuplicateAuthId(auth_id.clone()));
                }
            }
        }
        Ok(())
    }

    fn get_by_auth_id(&self, auth_id: &AuthId) -> Option<User> {
        self.by_auth_id
            .get(auth_id)
            .and_then(|user_id| self.users.get(user_id))
            .cloned()
    }

    fn insert(&mut self, user: User) -> Result<(), StoreError> {
        self.check_auth_ids(&user)?;
        for auth_id in &user.auth_ids {
            self.by_auth_id.insert(auth_id.clone(), user.id.clone());
        }
        self.users.insert(user.id.clone(), user);
        Ok(())
    }

    fn update(&mut self, user: User) -> Result<(), StoreError> {
        let Some(previous) = self.users.get(&user.id) else {
            return Err(StoreError::NotFound(user.id));
        };
        self.check_auth_ids(&user)?;

        let dropped: Vec<AuthId> = previous
            .auth_ids
            .iter()
            .filter(|auth_id| !user.has_auth_id(auth_id))
            .cloned()
            .collect();
        for auth_id in dropped {
            self.by_auth_id.remove(&auth_id);
        }
        for auth_id in &user.auth_ids {
            self.by_auth_id.insert(auth_id.clone(), user.id.clone());
        }
        self.users.insert(user.id.clone(), user);
        Ok(())
    }

    /// Users ordered by creation time, for stable file output
    fn snapshot(&self) -> Vec<&User> {
        let mut users: Vec<&User> = self.users.values().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        users
    }
}

/// Volatile store, used when no users file is configured and in tests
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    index: RwLock<UserIndex>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.read().map_or(0, |index| index.users.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserStore for MemoryUserStore {
    fn get(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let index = self.index.read().map_err(|_| StoreError::Poisoned)?;
        Ok(index.users.get(user_id).cloned())
    }

    fn get_by_auth_id(&self, auth_id: &AuthId) -> Result<Option<User>, StoreError> {
        let index = self.index.read().map_err(|_| StoreError::Poisoned)?;
        Ok(index.get_by_auth_id(auth_id))
    }

    fn insert(&self, user: User) -> Result<(), StoreError> {
        let mut index = self.index.write().map_err(|_| StoreError::Poisoned)?;
        index.insert(user)
    }

    fn update(&self, user: User) -> Result<(), StoreError> {
        let mut index = self.index.write().map_err(|_| StoreError::Poisoned)?;
        index.update(user)
    }
}

/// Store that mirrors every mutation to a JSON file
#[derive(Debug)]
pub struct JsonFileUserStore {
    path: PathBuf,
    index: RwLock<UserIndex>,
}

impl JsonFileUserStore {
    /// Open the store at `path`, loading existing users if the file exists
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if it assigns one auth id to two users.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let users: Vec<User> = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Vec::new()
        };

        info!("Loaded {} user(s) from {}", users.len(), path.display());
        Ok(Self {
            index: RwLock::new(UserIndex::from_users(users)?),
            path,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write all users to a sibling temp file, then rename it over the target
    fn persist(&self, index: &UserIndex) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(&index.snapshot())?;

        let mut tmp_name = self.path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&json)?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;

        debug!("Persisted {} user(s) to {}", index.users.len(), self.path.display());
        Ok(())
    }

    /// Apply `change` to a copy of the index and only keep it once persisted
    fn mutate(
        &self,
        change: impl FnOnce(&mut UserIndex) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut index = self.index.write().map_err(|_| StoreError::Poisoned)?;
        let mut next = index.clone();
        change(&mut next)?;
        self.persist(&next)?;
        *index = next;
        Ok(())
    }
}

impl UserStore for JsonFileUserStore {
    fn get(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let index = self.index.read().map_err(|_| StoreError::Poisoned)?;
        Ok(index.users.get(user_id).cloned())
    }

    fn get_by_auth_id(&self, auth_id: &AuthId) -> Result<Option<User>, StoreError> {
        let index = self.index.read().map_err(|_| StoreError::Poisoned)?;
        Ok(index.get_by_auth_id(auth_id))
    }

    fn insert(&self, user: User) -> Result<(), StoreError> {
        self.mutate(|index| index.insert(user))
    }

    fn update(&self, user: User) -> Result<(), StoreError> {
        self.mutate(|index| index.update(user))
    }
}
