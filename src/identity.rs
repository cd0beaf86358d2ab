//! Registration and login.
//!
//! Secrets are stored as salted Argon2id PHC strings. The ledger itself only ever sees the
//! `OwnerId` that a successful login produces.

use crate::db::Db;
use crate::model::OwnerId;
use crate::Result;
use anyhow::{anyhow, ensure};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::debug;

/// The outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created(OwnerId),
    AlreadyExists,
}

#[derive(Debug, Clone)]
pub struct Identity {
    db: Db,
}

impl Identity {
    pub(crate) fn new(db: Db) -> Self {
        Self { db }
    }

    /// Registers `username`. Nothing is stored when the name is already taken.
    pub async fn register(&self, username: &str, secret: &str) -> Result<Registration> {
        ensure!(!username.trim().is_empty(), "A username is required");
        let hash = hash_secret(secret)?;
        let registration = match self.db.insert_user(username, &hash).await? {
            Some(owner) => Registration::Created(owner),
            None => Registration::AlreadyExists,
        };
        debug!("Registration for '{username}': {registration:?}");
        Ok(registration)
    }

    /// Returns the owner for `username` if `secret` matches. Unknown users and wrong secrets are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, username: &str, secret: &str) -> Result<Option<OwnerId>> {
        let Some((owner, hash)) = self.db.find_user(username).await? else {
            debug!("No user named '{username}'");
            return Ok(None);
        };
        if verify_secret(secret, &hash)? {
            Ok(Some(owner))
        } else {
            debug!("Wrong secret for '{username}'");
            Ok(None)
        }
    }
}

fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| anyhow!("Unable to hash secret: {e}"))?;
    Ok(hash.to_string())
}

fn verify_secret(secret: &str, stored: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(stored).map_err(|e| anyhow!("Stored password hash is invalid: {e}"))?;
    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}
