//! Deployment regime selecting observe-only or enforcing protection.

use std::fmt;

use serde::Serialize;

/// How strictly request protection is enforced.
///
/// The regime is resolved once at startup and passed explicitly to the
/// components that depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentRegime {
    /// Development: generous limits, denials are only logged.
    Permissive,
    /// Production: tight limits, denials block the request.
    Strict,
}

impl DeploymentRegime {
    /// Map an environment label onto a regime.
    ///
    /// # Examples
    /// ```
    /// use warden::domain::DeploymentRegime;
    ///
    /// assert_eq!(DeploymentRegime::from_label("development"), Some(DeploymentRegime::Permissive));
    /// assert_eq!(DeploymentRegime::from_label("PRODUCTION"), Some(DeploymentRegime::Strict));
    /// assert_eq!(DeploymentRegime::from_label("qa"), None);
    /// ```
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" | "test" => Some(Self::Permissive),
            "production" | "prod" | "live" | "staging" => Some(Self::Strict),
            _ => None,
        }
    }

    /// Environment name reported by the health endpoint.
    #[must_use]
    pub const fn environment(self) -> &'static str {
        match self {
            Self::Permissive => "development",
            Self::Strict => "production",
        }
    }

    /// Whether denials short-circuit the request.
    #[must_use]
    pub const fn is_enforcing(self) -> bool {
        matches!(self, Self::Strict)
    }
}

impl fmt::Display for DeploymentRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Permissive => "permissive",
            Self::Strict => "strict",
        })
    }
}
