// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline secrets (§3, §4.C/D).

use crate::container::Container;
use crate::error::SecretError;

/// Where a secret's value is looked up. Deserialized through
/// [`SecretEngine::parse`] rather than a derived `#[serde(rename_all)]`
/// mapping, so a pipeline secret ingested with an unrecognized `engine`
/// string fails the way §4.C requires — with
/// [`SecretError::UnrecognizedSecretEngine`] — right at the point the
/// secret enters the engine, rather than a generic deserialization error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretEngine {
    Native,
    Vault,
}

impl SecretEngine {
    pub fn parse(s: &str) -> Result<Self, SecretError> {
        match s {
            "native" => Ok(Self::Native),
            "vault" => Ok(Self::Vault),
            other => Err(SecretError::UnrecognizedSecretEngine(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Vault => "vault",
        }
    }
}

impl<'de> serde::Deserialize<'de> for SecretEngine {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// The scope a secret is fetched from. Deserialized through
/// [`SecretType::parse`] for the same reason as [`SecretEngine`]: an
/// unrecognized `type` string must surface as
/// [`SecretError::UnrecognizedSecretType`] when the secret is ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretType {
    Org,
    Repo,
    Shared,
}

impl SecretType {
    pub fn parse(s: &str) -> Result<Self, SecretError> {
        match s {
            "org" => Ok(Self::Org),
            "repo" => Ok(Self::Repo),
            "shared" => Ok(Self::Shared),
            other => Err(SecretError::UnrecognizedSecretType(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Org => "org",
            Self::Repo => "repo",
            Self::Shared => "shared",
        }
    }
}

impl<'de> serde::Deserialize<'de> for SecretType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A pipeline secret. `origin: Some(container)` marks a plugin-secret
/// (materialized by running a container); `None` marks a resolver-fetched
/// secret (§4.C's "origin is empty" rule, encoded as an `Option` instead of
/// a sentinel string).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Secret {
    pub name: String,
    pub engine: SecretEngine,
    #[serde(rename = "type")]
    pub kind: SecretType,
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Container>,
}

impl Secret {
    pub fn is_plugin(&self) -> bool {
        self.origin.is_some()
    }

    /// Whether this secret may be placed into a container with the given
    /// image and `BUILD_EVENT` (§8 property 5). Empty ACL lists allow all.
    pub fn matches(&self, image: &str, event: &str) -> bool {
        let image_ok = self.images.is_empty() || self.images.iter().any(|i| i == image);
        let event_ok = self.events.is_empty() || self.events.iter().any(|e| e == event);
        image_ok && event_ok
    }
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;
