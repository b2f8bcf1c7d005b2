//! Dashboard domain entity
//!
//! A dashboard is a named grid of widgets belonging to one project. Each
//! project has at most one default dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::project::ProjectId;

/// Most empty funnel widgets a dashboard can be created with
pub const MAX_FUNNEL_AMOUNT: u8 = 3;

/// Unique identifier for a dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DashboardId(pub Uuid);

impl DashboardId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DashboardId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for DashboardId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for DashboardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Layout grid of a dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub columns: i32,
    pub rows: i32,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            columns: 12,
            rows: 3,
        }
    }
}

impl Grid {
    pub fn is_valid(&self) -> bool {
        self.columns > 0 && self.rows > 0
    }
}

/// A dashboard owned by a project
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub id: DashboardId,
    pub project_id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub is_editable: bool,
    pub grid: Grid,
    pub config: Value,
    pub created_at: DateTime<Utc>,
}

impl Dashboard {
    /// Why this dashboard cannot be deleted, if it can't
    pub fn deletion_blocker(&self) -> Option<&'static str> {
        if !self.is_editable {
            Some("dashboard is not editable")
        } else if self.is_default {
            Some("the default dashboard cannot be deleted")
        } else {
            None
        }
    }
}

/// Data needed to create a new dashboard
#[derive(Debug, Clone)]
pub struct NewDashboard {
    pub project_id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub is_editable: bool,
    pub grid: Grid,
    pub config: Value,
}

/// Partial update of a dashboard; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub grid: Option<Grid>,
    pub config: Option<Value>,
}

impl DashboardUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.grid.is_none()
            && self.config.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_dashboard(is_default: bool, is_editable: bool) -> Dashboard {
        Dashboard {
            id: DashboardId::new(),
            project_id: ProjectId(Uuid::new_v4()),
            name: "Human service".to_string(),
            description: None,
            is_default,
            is_editable,
            grid: Grid::default(),
            config: json!({}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn regular_dashboard_is_deletable() {
        assert_eq!(make_dashboard(false, true).deletion_blocker(), None);
    }

    #[test]
    fn default_dashboard_is_not_deletable() {
        assert!(make_dashboard(true, true).deletion_blocker().is_some());
    }

    #[test]
    fn locked_dashboard_is_not_deletable() {
        assert!(make_dashboard(false, false).deletion_blocker().is_some());
    }

    #[test]
    fn grid_validation() {
        assert!(Grid::default().is_valid());
        assert!(!Grid {
            columns: 0,
            rows: 3
        }
        .is_valid());
    }

    #[test]
    fn empty_update() {
        assert!(DashboardUpdate::default().is_empty());
        let update = DashboardUpdate {
            name: Some("Sales".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
