//! Service-to-service access control.
//!
//! Other platform services authenticate with static capability tokens.
//! The capability map is read once from a TOML file:
//!
//! ```toml
//! [tokens]
//! "service-token-1" = ["account.email", "email.send_all"]
//! "service-token-2" = ["account.suspend"]
//! ```
//!
//! The map is immutable after load and shared read-only between requests.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::{LifError, Result};

#[derive(Debug, Default, Deserialize)]
struct AccessControlFile {
    #[serde(default)]
    tokens: HashMap<String, Vec<String>>,
}

/// Static map of service token to granted permission nodes.
#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    tokens: HashMap<String, HashSet<String>>,
}

impl AccessControl {
    /// Load the capability map from a TOML file.
    ///
    /// A missing file yields an empty map, so every service token is
    /// rejected.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "access control file not found, no service tokens accepted");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let access_control = Self::parse(&content)?;
        info!(
            path = %path.display(),
            tokens = access_control.len(),
            "loaded service access control"
        );
        Ok(access_control)
    }

    /// Parse the capability map from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let file: AccessControlFile = toml::from_str(content)
            .map_err(|e| LifError::Config(format!("invalid access control file: {e}")))?;
        Ok(Self::from_map(file.tokens))
    }

    /// Build the map from token/node pairs.
    pub fn from_map<I, N>(tokens: I) -> Self
    where
        I: IntoIterator<Item = (String, N)>,
        N: IntoIterator<Item = String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|(token, nodes)| (token, nodes.into_iter().collect()))
                .collect(),
        }
    }

    /// Number of known service tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no service token is known.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether the token is a known service token.
    pub fn verify_token(&self, token: &str) -> bool {
        self.tokens.contains_key(token)
    }

    /// Whether the token is known and holds the node.
    ///
    /// Unknown tokens hold nothing.
    pub fn has_permission(&self, token: &str, node: &str) -> bool {
        self.tokens
            .get(token)
            .is_some_and(|nodes| nodes.contains(node))
    }

    /// Require the token to be known and hold the node.
    pub fn authorize(&self, token: &str, node: &str) -> Result<()> {
        let nodes = self.tokens.get(token).ok_or(LifError::UnknownServiceToken)?;
        if !nodes.contains(node) {
            return Err(LifError::NoPermission(node.to_string()));
        }
        Ok(())
    }
}
