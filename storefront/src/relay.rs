// storefront/src/relay.rs

//! The contact/order mail relay: one `POST /send-email` endpoint that turns a
//! form submission into an email to the operator address.

use actix_cors::Cors;
use actix_web::{http::header, web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::services::mail::{escape_html, MailTransport, OutgoingMail};

#[derive(Clone)]
pub struct RelayState {
  pub transport: Arc<dyn MailTransport>,
  pub operator_email: String,
  pub sender: String,
}

/// Loosely typed on purpose: `cart` is checked by hand so a non-array gets
/// its own error message.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RelayRequest {
  pub name: Option<String>,
  pub email: Option<String>,
  pub message: Option<String>,
  pub phone: Option<String>,
  pub address: Option<String>,
  pub cart: Option<Value>,
  pub subject: Option<String>,
  #[serde(rename = "type")]
  pub kind: Option<String>,
}

fn text(value: &Option<String>) -> String {
  escape_html(value.as_deref().unwrap_or(""))
}

fn bad_request(message: &str) -> HttpResponse {
  HttpResponse::BadRequest().json(json!({ "success": false, "message": message }))
}

pub fn contact_html(request: &RelayRequest) -> String {
  let message = text(&request.message).replace('\n', "<br>");
  format!(
    concat!(
      "<h2>New contact form message</h2>",
      "<p><strong>Name:</strong> {}</p>",
      "<p><strong>Email:</strong> {}</p>",
      "<p><strong>Phone:</strong> {}</p>",
      "<p><strong>Subject:</strong> {}</p>",
      "<p><strong>Message:</strong><br>{}</p>"
    ),
    text(&request.name),
    text(&request.email),
    text(&request.phone),
    text(&request.subject),
    message
  )
}

fn cart_field<'a>(item: &'a Value, key: &str) -> Option<&'a Value> {
  item.get(key).filter(|v| !v.is_null())
}

fn cart_text(item: &Value, key: &str, fallback: &str) -> String {
  match cart_field(item, key) {
    Some(Value::String(s)) if !s.is_empty() => escape_html(s),
    Some(Value::String(_)) | None => escape_html(fallback),
    Some(other) => escape_html(&other.to_string()),
  }
}

/// Lowest-ordered image of a cart item, if any.
fn cart_image(item: &Value) -> Option<String> {
  let images = cart_field(item, "product_images")?.as_array()?;
  images
    .iter()
    .filter_map(|img| {
      let url = img.get("image_url")?.as_str()?;
      let order = img.get("order").and_then(Value::as_i64).unwrap_or(i64::MAX);
      Some((order, url))
    })
    .min_by_key(|(order, _)| *order)
    .map(|(_, url)| url.to_string())
}

pub fn order_html(request: &RelayRequest, cart: &[Value]) -> String {
  let rows: String = cart
    .iter()
    .map(|item| {
      let image = cart_image(item)
        .map(|url| format!(r#"<img src="{}" alt="" width="60">"#, escape_html(&url)))
        .unwrap_or_default();
      let qty = cart_field(item, "qty")
        .and_then(Value::as_u64)
        .filter(|q| *q > 0)
        .unwrap_or(1);
      format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        image,
        cart_text(item, "title", "Unknown Product"),
        qty,
        cart_text(item, "color", "N/A"),
      )
    })
    .collect();

  format!(
    concat!(
      "<h2>New order from {}</h2>",
      "<p><strong>Email:</strong> {}<br>",
      "<strong>Phone:</strong> {}<br>",
      "<strong>Address:</strong> {}</p>",
      "<table><thead><tr><th>Image</th><th>Product</th><th>Quantity</th><th>Color</th></tr></thead>",
      "<tbody>{}</tbody></table>"
    ),
    text(&request.name),
    text(&request.email),
    text(&request.phone),
    text(&request.address),
    rows
  )
}

#[instrument(name = "relay::send_email", skip_all, fields(kind = ?request.kind))]
pub async fn send_email_handler(state: web::Data<RelayState>, request: web::Json<RelayRequest>) -> HttpResponse {
  let request = request.into_inner();

  let cart = match &request.cart {
    None | Some(Value::Null) => None,
    Some(Value::Array(items)) => Some(items.as_slice()),
    Some(_) => return bad_request("Invalid cart data format. Cart must be an array."),
  };

  let (subject, html_body) = if request.kind.as_deref() == Some("contact") {
    (
      format!("New Contact Form Message: {}", request.subject.as_deref().unwrap_or("")),
      contact_html(&request),
    )
  } else if let Some(items) = cart {
    if items.is_empty() {
      warn!("Order email requested with an empty cart.");
    }
    (
      format!("New Order from {}", request.name.as_deref().unwrap_or("")),
      order_html(&request, items),
    )
  } else {
    return bad_request("Invalid request. Missing required fields.");
  };

  let mut template_params = Map::new();
  if let Some(name) = &request.name {
    template_params.insert("from_name".into(), Value::String(name.clone()));
  }
  let mail = OutgoingMail {
    to: state.operator_email.clone(),
    from: state.sender.clone(),
    reply_to: request.email.clone(),
    subject,
    html_body,
    template_params,
  };

  match state.transport.send(&mail).await {
    Ok(sent) => {
      info!(message_id = %sent.message_id, "Relay email sent.");
      HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Email sent successfully!",
        "messageId": sent.message_id,
      }))
    }
    Err(e) => {
      error!(error = %e, "Relay email failed.");
      HttpResponse::InternalServerError().json(json!({
        "success": false,
        "message": format!("Failed to send email: {e}"),
        "error": e.to_string(),
      }))
    }
  }
}

pub async fn test_api_handler() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "success": true, "message": "Test API is working!" }))
}

/// The relay is called straight from storefront pages on other origins, so
/// any origin may POST JSON to it.
pub fn relay_cors() -> Cors {
  Cors::default()
    .allow_any_origin()
    .allowed_methods(["GET", "POST"])
    .allowed_headers([header::CONTENT_TYPE, header::ACCEPT])
    .max_age(3600)
}

pub fn configure_relay_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/send-email", web::post().to(send_email_handler))
    .route("/test-api", web::get().to(test_api_handler));
}
