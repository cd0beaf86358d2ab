//! Registration and login for the commands that act on a user's ledger.

use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::identity::Registration;
use crate::model::OwnerId;
use crate::{Config, Result};
use anyhow::anyhow;
use std::fmt::{Debug, Formatter};
use tracing::debug;

/// A username and password as typed by the user.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    secret: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"***")
            .finish()
    }
}

/// Registers a new user.
///
/// # Errors
/// - An `Identity` error if the username is already taken.
/// - A `Validation` error if the username is empty.
pub async fn register(config: &Config, credentials: &Credentials) -> Result<Out<OwnerId>> {
    let username = credentials.username();
    if username.trim().is_empty() {
        return Err(anyhow!("A username is required")).pub_result(ErrorType::Validation);
    }
    let registration = config
        .identity()
        .register(username, credentials.secret())
        .await
        .pub_result(ErrorType::Database)?;
    match registration {
        Registration::Created(owner) => {
            Ok(Out::new(format!("Registered '{username}'"), owner))
        }
        Registration::AlreadyExists => {
            Err(anyhow!("Username '{username}' already exists")).pub_result(ErrorType::Identity)
        }
    }
}

/// Resolves `credentials` to the owner every ledger operation is scoped to.
pub(crate) async fn login(config: &Config, credentials: &Credentials) -> Result<OwnerId> {
    let owner = config
        .identity()
        .authenticate(credentials.username(), credentials.secret())
        .await
        .pub_result(ErrorType::Database)?
        .ok_or_else(|| anyhow!("Invalid credentials"))
        .pub_result(ErrorType::Identity)?;
    debug!("Logged in as '{}' ({owner})", credentials.username());
    Ok(owner)
}
