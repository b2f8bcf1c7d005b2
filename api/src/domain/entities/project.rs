//! Project identifier
//!
//! Projects live in the platform's own database; Insights only stores the
//! identifier to scope dashboards, widgets and reports.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant identifier every dashboard, report and source query is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub Uuid);

impl From<Uuid> for ProjectId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ProjectId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| format!("Invalid project id: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_display() {
        let id = ProjectId(Uuid::nil());
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn project_id_from_str() {
        let id: ProjectId = "0b5a2a8e-4f7e-4c3e-9d7e-1a2b3c4d5e6f".parse().unwrap();
        assert_eq!(id.to_string(), "0b5a2a8e-4f7e-4c3e-9d7e-1a2b3c4d5e6f");
        assert!("not-a-uuid".parse::<ProjectId>().is_err());
    }
}
