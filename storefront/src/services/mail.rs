// storefront/src/services/mail.rs

//! Outbound mail transports. `LogMailTransport` only records and logs what
//! it would send; `HttpMailTransport` posts to a hosted template-mail API.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::MailApiSettings;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MailError {
  #[error("mail transport is not configured")]
  NotConfigured,

  #[error("mail API rejected the message ({status}): {body}")]
  Rejected { status: u16, body: String },

  #[error("mail transport failed: {0}")]
  Transport(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMail {
  pub to: String,
  pub from: String,
  pub reply_to: Option<String>,
  pub subject: String,
  pub html_body: String,
  /// Structured values for template-based transports.
  pub template_params: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
  pub message_id: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
  async fn send(&self, mail: &OutgoingMail) -> Result<SentMail, MailError>;
}

/// Logs each message instead of delivering it and keeps a copy.
#[derive(Debug, Default)]
pub struct LogMailTransport {
  sent: Mutex<Vec<OutgoingMail>>,
}

impl LogMailTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn sent(&self) -> Vec<OutgoingMail> {
    self.sent.lock().clone()
  }
}

#[async_trait]
impl MailTransport for LogMailTransport {
  async fn send(&self, mail: &OutgoingMail) -> Result<SentMail, MailError> {
    let message_id = format!("log_{}", uuid::Uuid::new_v4());
    let body_preview: String = mail.html_body.chars().take(50).collect();
    info!(
      to = %mail.to,
      from = %mail.from,
      subject = %mail.subject,
      %body_preview,
      %message_id,
      "Mail logged instead of sent."
    );
    self.sent.lock().push(mail.clone());
    Ok(SentMail { message_id })
  }
}

/// Template-mail REST API (`{service_id, template_id, user_id, template_params}`).
pub struct HttpMailTransport {
  client: reqwest::Client,
  settings: MailApiSettings,
}

impl HttpMailTransport {
  pub fn new(settings: MailApiSettings) -> Self {
    Self {
      client: reqwest::Client::new(),
      settings,
    }
  }
}

#[derive(Serialize)]
struct TemplateRequest<'a> {
  service_id: &'a str,
  template_id: &'a str,
  user_id: &'a str,
  template_params: Map<String, Value>,
}

#[async_trait]
impl MailTransport for HttpMailTransport {
  #[instrument(name = "HttpMailTransport::send", skip_all, fields(subject = %mail.subject))]
  async fn send(&self, mail: &OutgoingMail) -> Result<SentMail, MailError> {
    let mut params = mail.template_params.clone();
    params.insert("to_email".into(), Value::String(mail.to.clone()));
    params.insert("from_email".into(), Value::String(mail.from.clone()));
    params.insert("subject".into(), Value::String(mail.subject.clone()));
    params.insert("html_body".into(), Value::String(mail.html_body.clone()));
    if let Some(reply_to) = &mail.reply_to {
      params.insert("reply_to".into(), Value::String(reply_to.clone()));
    }

    let request = TemplateRequest {
      service_id: &self.settings.service_id,
      template_id: &self.settings.template_id,
      user_id: &self.settings.public_key,
      template_params: params,
    };

    let response = self
      .client
      .post(&self.settings.api_url)
      .json(&request)
      .send()
      .await
      .map_err(|e| MailError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      warn!(status = status.as_u16(), "Mail API rejected the message.");
      return Err(MailError::Rejected {
        status: status.as_u16(),
        body,
      });
    }

    let message_id = response
      .headers()
      .get("x-message-id")
      .and_then(|v| v.to_str().ok())
      .map(str::to_string)
      .unwrap_or_else(|| format!("api_{}", uuid::Uuid::new_v4()));
    info!(%message_id, "Mail accepted by API.");
    Ok(SentMail { message_id })
  }
}

/// Escapes text for interpolation into HTML bodies.
pub fn escape_html(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for ch in raw.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      other => out.push(other),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn escapes_markup() {
    assert_eq!(
      escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
      "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
    );
    assert_eq!(escape_html("plain text"), "plain text");
  }

  #[tokio::test]
  async fn log_transport_records_messages() {
    let transport = LogMailTransport::new();
    let mail = OutgoingMail {
      to: "ops@example.com".into(),
      from: "noreply@example.com".into(),
      reply_to: None,
      subject: "Hello".into(),
      html_body: "<p>Hi</p>".into(),
      template_params: Map::new(),
    };
    let sent = transport.send(&mail).await.unwrap();
    assert!(sent.message_id.starts_with("log_"));
    assert_eq!(transport.sent(), vec![mail]);
  }
}
