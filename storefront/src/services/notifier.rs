// storefront/src/services/notifier.rs

//! Order confirmation email. Sending is best-effort: `send` reports the
//! outcome as a value and never fails past its own boundary.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::mail::{escape_html, MailTransport, OutgoingMail};
use crate::models::{CartLineItem, Customer, Order};

/// Color label used when a line has none.
pub const NO_COLOR_LABEL: &str = "Not specified";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifyOutcome {
  pub success: bool,
  pub error: Option<String>,
  pub message_id: Option<String>,
}

impl NotifyOutcome {
  fn sent(message_id: String) -> Self {
    Self {
      success: true,
      error: None,
      message_id: Some(message_id),
    }
  }

  fn failed(error: impl Into<String>) -> Self {
    Self {
      success: false,
      error: Some(error.into()),
      message_id: None,
    }
  }
}

/// One ordered line as it appears in the email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifiedItem {
  pub name: String,
  pub units: u32,
  pub color: String,
  pub image_url: String,
}

impl From<&CartLineItem> for NotifiedItem {
  fn from(line: &CartLineItem) -> Self {
    Self {
      name: line.title.clone(),
      units: line.qty,
      color: if line.color.trim().is_empty() {
        NO_COLOR_LABEL.to_string()
      } else {
        line.color.clone()
      },
      image_url: line.primary_image_url().to_string(),
    }
  }
}

pub struct OrderNotifier {
  transport: Option<Arc<dyn MailTransport>>,
  operator_email: String,
  sender: String,
  company_name: String,
}

impl OrderNotifier {
  pub fn new(
    transport: Option<Arc<dyn MailTransport>>,
    operator_email: impl Into<String>,
    sender: impl Into<String>,
    company_name: impl Into<String>,
  ) -> Self {
    Self {
      transport,
      operator_email: operator_email.into(),
      sender: sender.into(),
      company_name: company_name.into(),
    }
  }

  pub fn is_configured(&self) -> bool {
    self.transport.is_some()
  }

  pub fn template_params(&self, order: &Order, customer: &Customer, items: &[NotifiedItem]) -> Map<String, Value> {
    let params = json!({
      "customer_name": customer.name,
      "email": customer.email,
      "order_id": order.id.to_string(),
      "orders": items,
      "customer_phone": customer.phone.clone().unwrap_or_default(),
      "customer_address": customer.address.clone().unwrap_or_default(),
      "order_date": order.placed_at.format("%d %b %Y, %H:%M").to_string(),
      "company_name": self.company_name,
    });
    match params {
      Value::Object(map) => map,
      _ => Map::new(),
    }
  }

  pub fn render_html(&self, order: &Order, customer: &Customer, items: &[NotifiedItem]) -> String {
    let rows: String = items
      .iter()
      .map(|item| {
        let image = if item.image_url.is_empty() {
          String::new()
        } else {
          format!(
            r#"<img src="{}" alt="{}" width="60">"#,
            escape_html(&item.image_url),
            escape_html(&item.name)
          )
        };
        format!(
          "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
          image,
          escape_html(&item.name),
          item.units,
          escape_html(&item.color)
        )
      })
      .collect();

    format!(
      concat!(
        "<h2>New order from {name}</h2>",
        "<p><strong>Order ID:</strong> {order_id}<br>",
        "<strong>Date:</strong> {date}<br>",
        "<strong>Email:</strong> {email}<br>",
        "<strong>Phone:</strong> {phone}<br>",
        "<strong>Address:</strong> {address}</p>",
        "<table><thead><tr><th>Image</th><th>Product</th><th>Units</th><th>Color</th></tr></thead>",
        "<tbody>{rows}</tbody></table>",
        "<p>{company}</p>"
      ),
      name = escape_html(&customer.name),
      order_id = order.id,
      date = order.placed_at.format("%d %b %Y, %H:%M"),
      email = escape_html(&customer.email),
      phone = escape_html(customer.phone.as_deref().unwrap_or("")),
      address = escape_html(customer.address.as_deref().unwrap_or("")),
      rows = rows,
      company = escape_html(&self.company_name),
    )
  }

  #[instrument(name = "OrderNotifier::send", skip_all, fields(order_id = %order.id, lines = lines.len()))]
  pub async fn send(&self, order: &Order, customer: &Customer, lines: &[CartLineItem]) -> NotifyOutcome {
    let Some(transport) = &self.transport else {
      warn!("Order confirmation skipped: mail transport is not configured.");
      return NotifyOutcome::failed("email service is not configured");
    };

    let items: Vec<NotifiedItem> = lines.iter().map(NotifiedItem::from).collect();
    let mail = OutgoingMail {
      to: self.operator_email.clone(),
      from: self.sender.clone(),
      reply_to: Some(customer.email.clone()),
      subject: format!("New Order from {}", customer.name),
      html_body: self.render_html(order, customer, &items),
      template_params: self.template_params(order, customer, &items),
    };

    match transport.send(&mail).await {
      Ok(sent) => {
        info!(message_id = %sent.message_id, "Order confirmation sent.");
        NotifyOutcome::sent(sent.message_id)
      }
      Err(e) => {
        warn!(error = %e, "Order confirmation failed.");
        NotifyOutcome::failed(e.to_string())
      }
    }
  }
}
