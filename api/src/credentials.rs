use crate::{errors::ApiError, models::User};
use bcrypt::{hash, verify};
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use uuid::Uuid;

/// Users and their bcrypt hashes.
///
/// Usernames are trimmed and lowercased before they are stored or looked up.
pub struct CredentialStore {
    users: DashMap<Uuid, User>,
    username_index: DashMap<String, Uuid>, // Quick Lookup by username
    bcrypt_cost: u32,
}

pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

impl CredentialStore {
    pub fn new(bcrypt_cost: u32) -> Self {
        Self {
            users: DashMap::new(),
            username_index: DashMap::new(),
            bcrypt_cost,
        }
    }

    pub async fn create_user(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let username = normalize_username(username);
        if self.username_index.contains_key(&username) {
            return Err(ApiError::UserAlreadyExists);
        }

        let hashed_password = hash_password(password.to_string(), self.bcrypt_cost).await?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username,
            hashed_password,
            created_at: now,
            updated_at: now,
        };

        // Re-check under the entry lock, a concurrent signup may have won
        match self.username_index.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(ApiError::UserAlreadyExists),
            Entry::Vacant(slot) => {
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    pub async fn verify_password(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let user = self
            .username_index
            .get(&normalize_username(username))
            .and_then(|id| self.users.get(&*id).map(|user| user.clone()))
            .ok_or(ApiError::InvalidCredentials)?;

        let password = password.to_string();
        let hashed = user.hashed_password.clone();
        let valid = tokio::task::spawn_blocking(move || verify(password, &hashed))
            .await
            .map_err(|e| ApiError::InternalError(format!("Password verification panicked: {}", e)))?
            .map_err(|e| ApiError::InternalError(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(ApiError::InvalidCredentials);
        }

        Ok(user)
    }

    pub fn find_user(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).map(|user| user.clone())
    }
}

async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| ApiError::InternalError(format!("Password hashing panicked: {}", e)))?
        .map_err(|e| ApiError::InternalError(format!("Password hashing failed: {}", e)))
}
