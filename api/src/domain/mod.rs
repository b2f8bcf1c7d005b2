//! Domain layer
//!
//! Contains pure business logic with no external dependencies.
//! - `entities`: Dashboards, widgets and reports
//! - `ports`: Trait definitions for persistence, data sources and mail delivery

pub mod entities;
pub mod ports;
