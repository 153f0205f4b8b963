// tests/notifier_tests.rs

mod common;
use common::*;

use chrono::Utc;
use rust_decimal_macros::dec;
use serial_test::serial;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use uuid::Uuid;

use storefront::models::{CartLineItem, Customer, Order, OrderStatus};
use storefront::services::notifier::{NotifiedItem, NO_COLOR_LABEL};
use storefront::services::{LogMailTransport, MailTransport, OrderNotifier};

fn customer(name: &str) -> Customer {
  Customer {
    id: Uuid::new_v4(),
    name: name.to_string(),
    email: "asha@example.com".to_string(),
    phone: Some("+91 98765 43210".to_string()),
    address: Some("12, MG Road, Ludhiana".to_string()),
    created_at: Utc::now(),
  }
}

fn order_for(customer: &Customer) -> Order {
  Order {
    id: Uuid::new_v4(),
    customer_id: customer.id,
    status: OrderStatus::Pending,
    placed_at: Utc::now(),
    total_amount: Some(dec!(1500)),
    idempotency_key: Some(Uuid::new_v4()),
  }
}

fn line(title: &str, qty: u32, color: &str, images: Vec<(&str, i32)>) -> CartLineItem {
  CartLineItem {
    product_id: Uuid::new_v4(),
    title: title.to_string(),
    qty,
    color: color.to_string(),
    price: dec!(500),
    product_images: images.into_iter().map(|(url, order)| image(url, order)).collect(),
  }
}

fn notifier(transport: Option<Arc<dyn MailTransport>>) -> OrderNotifier {
  OrderNotifier::new(transport, "orders@example.com", "noreply@example.com", "Ganeshdeep Knitwear")
}

#[test]
fn items_get_a_color_label_and_their_first_image() {
  setup_tracing();
  let with_images = line("Cable Knit", 2, "Red", vec![("third.jpg", 3), ("first.jpg", 1)]);
  let plain = line("Muffler", 1, "", vec![]);

  let a = NotifiedItem::from(&with_images);
  let b = NotifiedItem::from(&plain);

  assert_eq!(a.color, "Red");
  assert_eq!(a.units, 2);
  assert_eq!(a.image_url, "first.jpg");
  assert_eq!(b.color, NO_COLOR_LABEL);
  assert_eq!(b.image_url, "");
}

#[tokio::test]
#[serial]
async fn confirmation_goes_to_the_operator_with_customer_reply_to() {
  setup_tracing();
  let mail = Arc::new(LogMailTransport::new());
  let notifier = notifier(Some(mail.clone() as Arc<dyn MailTransport>));
  let buyer = customer("Asha");
  let order = order_for(&buyer);
  let lines = vec![line("Cable Knit", 2, "Red", vec![("red.jpg", 1)]), line("Muffler", 1, "", vec![])];

  let outcome = notifier.send(&order, &buyer, &lines).await;

  assert!(outcome.success);
  assert!(outcome.error.is_none());
  assert!(outcome.message_id.as_deref().is_some_and(|id| id.starts_with("log_")));

  let sent = mail.sent();
  assert_eq!(sent.len(), 1);
  let message = &sent[0];
  assert_eq!(message.to, "orders@example.com");
  assert_eq!(message.reply_to.as_deref(), Some("asha@example.com"));
  assert_eq!(message.subject, "New Order from Asha");
  assert!(message.html_body.contains(&order.id.to_string()));
  assert!(message.html_body.contains(NO_COLOR_LABEL));
  assert!(message.html_body.contains("red.jpg"));

  let params = &message.template_params;
  assert_eq!(params["customer_name"], "Asha");
  assert_eq!(params["order_id"], order.id.to_string());
  assert_eq!(params["company_name"], "Ganeshdeep Knitwear");
  assert_eq!(params["orders"].as_array().map(Vec::len), Some(2));
  assert_eq!(params["orders"][1]["color"], NO_COLOR_LABEL);
}

#[tokio::test]
#[serial]
async fn customer_text_is_escaped_in_the_body() {
  setup_tracing();
  let mail = Arc::new(LogMailTransport::new());
  let notifier = notifier(Some(mail.clone() as Arc<dyn MailTransport>));
  let buyer = customer("<script>alert(1)</script>");
  let order = order_for(&buyer);

  notifier
    .send(&order, &buyer, &[line("Cap & Scarf", 1, "Black", vec![])])
    .await;

  let body = &mail.sent()[0].html_body;
  assert!(!body.contains("<script>"));
  assert!(body.contains("&lt;script&gt;"));
  assert!(body.contains("Cap &amp; Scarf"));
}

#[tokio::test]
#[serial]
async fn unconfigured_transport_reports_failure_without_sending() {
  setup_tracing();
  let notifier = notifier(None);
  let buyer = customer("Asha");
  let order = order_for(&buyer);

  assert!(!notifier.is_configured());
  let outcome = notifier.send(&order, &buyer, &[line("Cap", 1, "", vec![])]).await;

  assert!(!outcome.success);
  assert_eq!(outcome.error.as_deref(), Some("email service is not configured"));
  assert!(outcome.message_id.is_none());
}

#[tokio::test]
#[serial]
async fn transport_errors_become_an_outcome() {
  setup_tracing();
  let failing = Arc::new(FailingMailTransport::default());
  let notifier = notifier(Some(failing.clone() as Arc<dyn MailTransport>));
  let buyer = customer("Asha");
  let order = order_for(&buyer);

  let outcome = notifier.send(&order, &buyer, &[line("Cap", 1, "", vec![])]).await;

  assert!(!outcome.success);
  assert!(outcome.error.as_deref().is_some_and(|e| e.contains("connection refused")));
  assert_eq!(failing.attempts.load(Ordering::SeqCst), 1);
}
