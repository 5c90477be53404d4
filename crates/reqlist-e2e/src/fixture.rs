//! Fixture loading.
//!
//! Fixtures are JSON documents named after the file stem (`userInfo` is
//! `userInfo.json`). A [`FixtureStore`] reads them either from a configured
//! directory or from the copies bundled with the crate, never a mix: a
//! directory that lacks a fixture is an error.

use crate::result::{E2eError, E2eResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the shopper fixture
pub const USER_INFO: &str = "userInfo";

const BUNDLED_USER_INFO: &str = include_str!("../fixtures/userInfo.json");

/// Credentials for the sign-up form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpInfo {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

impl SignUpInfo {
    /// Copy with `+tag` inserted before the `@` so every run signs up a
    /// fresh account
    #[must_use]
    pub fn with_unique_email(&self) -> Self {
        let tag = uuid::Uuid::new_v4().simple().to_string();
        let tag = &tag[..8];
        let email = match self.email.split_once('@') {
            Some((local, domain)) => {
                let local = local.split('+').next().unwrap_or(local);
                format!("{local}+{tag}@{domain}")
            }
            None => format!("{}+{tag}", self.email),
        };
        Self {
            email,
            ..self.clone()
        }
    }
}

/// The `userInfo` fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Sign-up block
    pub sign_up: SignUpInfo,
}

/// Loads named JSON fixtures
#[derive(Debug, Clone, Default)]
pub struct FixtureStore {
    dir: Option<PathBuf>,
}

impl FixtureStore {
    /// Store backed only by the bundled fixtures
    #[must_use]
    pub const fn bundled() -> Self {
        Self { dir: None }
    }

    /// Store reading only from `dir`
    #[must_use]
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Configured directory, if any
    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Load and parse fixture `name`
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> E2eResult<T> {
        let text = self.read(name)?;
        serde_json::from_str(&text).map_err(|e| E2eError::FixtureError {
            message: format!("{name}.json: {e}"),
        })
    }

    /// Load the `userInfo` fixture
    pub fn user_info(&self) -> E2eResult<UserInfo> {
        self.load(USER_INFO)
    }

    fn read(&self, name: &str) -> E2eResult<String> {
        if let Some(dir) = &self.dir {
            let path = dir.join(format!("{name}.json"));
            tracing::debug!(path = %path.display(), "loading fixture");
            return std::fs::read_to_string(&path).map_err(|e| E2eError::FixtureError {
                message: format!("{}: {e}", path.display()),
            });
        }
        match name {
            USER_INFO => Ok(BUNDLED_USER_INFO.to_string()),
            other => Err(E2eError::FixtureError {
                message: format!("no fixture named '{other}'"),
            }),
        }
    }
}
