//! Registry credentials
//!
//! Credentials arrive as `username:password@hostname` strings and are
//! forwarded to the engine on push and to registry APIs on lookup.

use crate::error::{BuildError, BuildResult};
use bollard::auth::DockerCredentials;
use std::fmt;
use std::str::FromStr;

/// Parsed `username:password@hostname`.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
    pub registry: String,
}

impl RegistryCredentials {
    /// Parse a credential string.
    ///
    /// The username ends at the first `:` and the hostname starts after the
    /// last `@`, so passwords may contain either character.
    pub fn parse(input: &str) -> BuildResult<Self> {
        let invalid = |reason: &str| BuildError::InvalidCredentials {
            input: redact(input),
            reason: reason.to_string(),
        };

        let (username, rest) = input.split_once(':').ok_or_else(|| invalid("missing ':'"))?;
        let (password, registry) = rest.rsplit_once('@').ok_or_else(|| invalid("missing '@'"))?;

        if username.is_empty() {
            return Err(invalid("empty username"));
        }
        if registry.is_empty() {
            return Err(invalid("empty hostname"));
        }

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
            registry: registry.to_string(),
        })
    }

    /// Credentials in the form the Docker engine expects on push.
    pub fn docker_credentials(&self) -> DockerCredentials {
        DockerCredentials {
            username: Some(self.username.clone()),
            password: Some(self.password.clone()),
            serveraddress: Some(self.registry.clone()),
            ..Default::default()
        }
    }
}

impl FromStr for RegistryCredentials {
    type Err = BuildError;

    fn from_str(s: &str) -> BuildResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("registry", &self.registry)
            .finish()
    }
}

/// Hide the password part of a credential string for error messages.
fn redact(input: &str) -> String {
    match (input.split_once(':'), input.rsplit_once('@')) {
        (Some((user, _)), Some((_, host))) => format!("{}:***@{}", user, host),
        (Some((user, _)), None) => format!("{}:***", user),
        _ => input.to_string(),
    }
}
