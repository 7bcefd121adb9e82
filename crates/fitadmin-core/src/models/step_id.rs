//! Step identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const LOCAL_PREFIX: &str = "local-";

/// Identifier of a content step.
///
/// A step id is either issued by the backend (`Server`) or generated on the
/// client as a placeholder (`Local`). Local ids never reach the wire: a step
/// carrying one still has to be created remotely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum StepId {
    Server(String),
    Local(Uuid),
}

impl StepId {
    /// Create a fresh placeholder id using UUID v7 (time-sortable)
    #[must_use]
    pub fn local() -> Self {
        Self::Local(Uuid::now_v7())
    }

    /// Wrap a backend-issued id
    #[must_use]
    pub fn server(id: impl Into<String>) -> Self {
        Self::Server(id.into())
    }

    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// The backend id, if this step has one
    #[must_use]
    pub fn server_id(&self) -> Option<&str> {
        match self {
            Self::Server(id) => Some(id),
            Self::Local(_) => None,
        }
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::local()
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(id) => f.write_str(id),
            Self::Local(uuid) => write!(f, "{LOCAL_PREFIX}{uuid}"),
        }
    }
}

impl FromStr for StepId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl From<String> for StepId {
    fn from(value: String) -> Self {
        value
            .strip_prefix(LOCAL_PREFIX)
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .map_or(Self::Server(value.clone()), Self::Local)
    }
}

impl From<StepId> for String {
    fn from(value: StepId) -> Self {
        value.to_string()
    }
}
