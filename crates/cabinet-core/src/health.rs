//! Typed liveness of a backing store.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Connected,
    Disconnected,
}

impl HealthStatus {
    pub fn is_connected(self) -> bool {
        matches!(self, HealthStatus::Connected)
    }
}

impl<T, E> From<&Result<T, E>> for HealthStatus {
    fn from(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            HealthStatus::Connected
        } else {
            HealthStatus::Disconnected
        }
    }
}

impl Display for HealthStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            HealthStatus::Connected => write!(f, "connected"),
            HealthStatus::Disconnected => write!(f, "disconnected"),
        }
    }
}
