//! HTTP mail service client
//!
//! Sends JSON to the platform's mail service; attachments travel base64-encoded.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Serialize;

use crate::domain::ports::{ReportEmail, ReportMailer};
use crate::error::MailerError;

/// Mail service client
pub struct HttpReportMailer {
    http: Client,
    url: String,
    token: String,
    from: String,
}

impl HttpReportMailer {
    pub fn new(url: String, token: String, from: String) -> Self {
        Self {
            http: Client::new(),
            url,
            token,
            from,
        }
    }
}

#[derive(Serialize)]
struct SendMailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    text: &'a str,
    attachments: Vec<AttachmentPayload<'a>>,
}

#[derive(Serialize)]
struct AttachmentPayload<'a> {
    filename: &'a str,
    content_type: &'a str,
    content: String,
}

fn build_request<'a>(from: &'a str, email: &'a ReportEmail) -> SendMailRequest<'a> {
    SendMailRequest {
        from,
        to: vec![email.to.as_str()],
        subject: &email.subject,
        text: &email.body,
        attachments: vec![AttachmentPayload {
            filename: &email.attachment.filename,
            content_type: &email.attachment.content_type,
            content: base64::engine::general_purpose::STANDARD.encode(&email.attachment.content),
        }],
    }
}

#[async_trait]
impl ReportMailer for HttpReportMailer {
    async fn send(&self, email: &ReportEmail) -> Result<(), MailerError> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&build_request(&self.from, email))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(to = %email.to, file = %email.attachment.filename, "Report email sent");
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(MailerError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
