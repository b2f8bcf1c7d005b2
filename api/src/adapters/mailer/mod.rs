//! Mail service adapter

pub mod client;

pub use client::HttpReportMailer;
