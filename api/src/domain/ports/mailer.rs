//! Mail delivery port
//!
//! Generated reports are delivered by email with the export attached.

use async_trait::async_trait;

use crate::error::MailerError;

/// File attached to an email
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// A report delivery email
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Attachment,
}

/// Outbound mail service
#[async_trait]
pub trait ReportMailer: Send + Sync {
    async fn send(&self, email: &ReportEmail) -> Result<(), MailerError>;
}
