use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};

use crate::app::ReportSettings;

#[derive(Clone, Debug)]
pub struct Config {
    /// Dashboards, widgets and reports
    pub database_url: String,
    /// Rooms, agents, queues and tags sources
    pub chats_database_url: String,
    /// Flows source
    pub flows_database_url: String,
    pub elasticsearch_url: String,
    pub flowruns_index: String,
    pub mailer_url: String,
    pub mailer_token: String,
    pub mailer_from: String,
    pub report_max_concurrent: u64,
    pub report_timeout_minutes: i64,
    pub report_poll_seconds: u64,
    pub report_sweep_seconds: u64,
    pub report_page_size: u64,
    pub report_max_rows: u64,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;

        Ok(Self {
            chats_database_url: lookup("CHATS_DATABASE_URL").unwrap_or_else(|| database_url.clone()),
            flows_database_url: lookup("FLOWS_DATABASE_URL").unwrap_or_else(|| database_url.clone()),
            database_url,
            elasticsearch_url: lookup("ELASTICSEARCH_URL")
                .unwrap_or_else(|| "http://localhost:9200".to_string()),
            flowruns_index: lookup("FLOWRUNS_INDEX").unwrap_or_else(|| "flowruns-*".to_string()),
            mailer_url: lookup("MAILER_URL")
                .unwrap_or_else(|| "http://localhost:8025/api/send".to_string()),
            mailer_token: lookup("MAILER_TOKEN").unwrap_or_default(),
            mailer_from: lookup("MAILER_FROM")
                .unwrap_or_else(|| "insights@localhost".to_string()),
            report_max_concurrent: parse_var(&lookup, "REPORT_MAX_CONCURRENT", 1)?,
            report_timeout_minutes: parse_var(&lookup, "REPORT_TIMEOUT_MINUTES", 60)?,
            report_poll_seconds: parse_var(&lookup, "REPORT_POLL_SECONDS", 30)?,
            report_sweep_seconds: parse_var(&lookup, "REPORT_SWEEP_SECONDS", 300)?,
            report_page_size: parse_var(&lookup, "REPORT_PAGE_SIZE", 1000)?,
            report_max_rows: parse_var(&lookup, "REPORT_MAX_ROWS", 100_000)?,
            port: parse_var(&lookup, "PORT", 8080)?,
        })
    }

    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            max_concurrent: self.report_max_concurrent.max(1),
            timeout: chrono::Duration::minutes(self.report_timeout_minutes),
            page_size: self.report_page_size.max(1),
            max_rows: self.report_max_rows,
        }
    }

    pub fn report_poll_interval(&self) -> Duration {
        Duration::from_secs(self.report_poll_seconds.max(1))
    }

    pub fn report_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.report_sweep_seconds.max(1))
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number, got '{}'", key, raw)),
        None => Ok(default),
    }
}
