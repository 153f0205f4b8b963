// tests/admin_view_tests.rs

mod common;
use common::*;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serial_test::serial;
use uuid::Uuid;

use storefront::admin::{flatten_orders, load_order_rows, orders_csv, OrderRow, CSV_HEADER};
use storefront::models::{
  CustomerOrders, CustomerUpsert, NewOrder, NewOrderItem, Order, OrderItem, OrderItemWithProduct, OrderStatus,
  OrderWithItems,
};
use storefront::store::{CustomerStore, FailureKind, MemoryStore, OrderStore, StoreError, Table};

async fn add_customer(store: &MemoryStore, name: &str, email: &str, address: Option<&str>) -> Uuid {
  store
    .upsert_customer(CustomerUpsert {
      name: name.to_string(),
      email: email.to_string(),
      phone: None,
      address: address.map(str::to_string),
    })
    .await
    .unwrap()
    .id
}

async fn add_order(store: &MemoryStore, customer_id: Uuid, total: Option<Decimal>) -> Uuid {
  store
    .insert_order(NewOrder {
      customer_id,
      status: OrderStatus::Pending,
      total_amount: total,
      idempotency_key: None,
    })
    .await
    .unwrap()
    .id
}

fn rows_for<'a>(rows: &'a [OrderRow], email: &str) -> Vec<&'a OrderRow> {
  rows.iter().filter(|r| r.customer_email == email).collect()
}

#[tokio::test]
#[serial]
async fn one_row_per_customer_order_and_item() {
  setup_tracing();
  let store = MemoryStore::new();
  let sweater = product("Cable Knit", dec!(500), 1);
  let cap = product("Cap", dec!(250), 2);
  store.add_product(sweater.clone());
  store.add_product(cap.clone());

  let asha = add_customer(&store, "Asha", "asha@example.com", None).await;
  add_customer(&store, "Ravi", "ravi@example.com", None).await;
  let meera = add_customer(&store, "Meera", "meera@example.com", None).await;

  let asha_order = add_order(&store, asha, Some(Decimal::ZERO)).await;
  store
    .insert_order_items(vec![
      NewOrderItem {
        order_id: asha_order,
        product_id: sweater.id,
        quantity: 2,
        product_color: "Red".to_string(),
      },
      NewOrderItem {
        order_id: asha_order,
        product_id: cap.id,
        quantity: 1,
        product_color: String::new(),
      },
    ])
    .await
    .unwrap();
  let meera_order = add_order(&store, meera, Some(dec!(999))).await;

  let rows = load_order_rows(&store).await.unwrap();
  assert_eq!(rows.len(), 4);

  let asha_rows = rows_for(&rows, "asha@example.com");
  assert_eq!(asha_rows.len(), 2);
  assert!(asha_rows.iter().all(|r| r.order_id == Some(asha_order)));
  // Stored total is zero, so it is derived from the items.
  assert!(asha_rows.iter().all(|r| r.order_total_amount == Some(dec!(1250))));
  let red = asha_rows
    .iter()
    .find(|r| r.item_name.as_deref() == Some("Cable Knit"))
    .unwrap();
  assert_eq!(red.item_quantity, Some(2));
  assert_eq!(red.item_color.as_deref(), Some("Red"));
  assert_eq!(red.item_price, Some(dec!(500)));

  let ravi_rows = rows_for(&rows, "ravi@example.com");
  assert_eq!(ravi_rows.len(), 1);
  assert_eq!(ravi_rows[0].order_id, None);
  assert_eq!(ravi_rows[0].item_name, None);

  let meera_rows = rows_for(&rows, "meera@example.com");
  assert_eq!(meera_rows.len(), 1);
  assert_eq!(meera_rows[0].order_id, Some(meera_order));
  assert_eq!(meera_rows[0].order_total_amount, Some(dec!(999)));
  assert_eq!(meera_rows[0].item_name, None);
}

#[test]
fn items_of_deleted_products_show_as_unknown() {
  setup_tracing();
  let customer_id = Uuid::new_v4();
  let order = Order {
    id: Uuid::new_v4(),
    customer_id,
    status: OrderStatus::Shipped,
    placed_at: Utc::now(),
    total_amount: None,
    idempotency_key: None,
  };
  let tree = vec![CustomerOrders {
    customer: storefront::models::Customer {
      id: customer_id,
      name: "Asha".to_string(),
      email: "asha@example.com".to_string(),
      phone: None,
      address: None,
      created_at: Utc::now(),
    },
    orders: vec![OrderWithItems {
      items: vec![OrderItemWithProduct {
        item: OrderItem {
          id: Uuid::new_v4(),
          order_id: order.id,
          product_id: Uuid::new_v4(),
          quantity: 3,
          product_color: "Blue".to_string(),
        },
        product: None,
      }],
      order,
    }],
  }];

  let rows = flatten_orders(&tree);

  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].item_name.as_deref(), Some("Unknown Product"));
  assert_eq!(rows[0].item_price, Some(Decimal::ZERO));
  assert_eq!(rows[0].order_total_amount, Some(Decimal::ZERO));
  assert_eq!(rows[0].order_status, Some(OrderStatus::Shipped));
}

#[tokio::test]
#[serial]
async fn csv_has_header_and_quotes_awkward_fields() {
  setup_tracing();
  let store = MemoryStore::new();
  let cap = product("Cap", dec!(250), 1);
  store.add_product(cap.clone());
  let customer = add_customer(&store, "Asha \"Ash\"", "asha@example.com", Some("12, MG Road")).await;
  let order = add_order(&store, customer, Some(dec!(250))).await;
  store
    .insert_order_items(vec![NewOrderItem {
      order_id: order,
      product_id: cap.id,
      quantity: 1,
      product_color: "Black".to_string(),
    }])
    .await
    .unwrap();

  let csv = orders_csv(&load_order_rows(&store).await.unwrap());
  let lines: Vec<&str> = csv.lines().collect();

  assert_eq!(lines.len(), 2);
  assert_eq!(lines[0], CSV_HEADER);
  assert!(lines[1].starts_with(r#""Asha ""Ash""",asha@example.com,,"12, MG Road","#));
  assert!(lines[1].contains(&order.to_string()));
  assert!(lines[1].ends_with(",Cap,1,Black,250"));
}

#[tokio::test]
#[serial]
async fn empty_store_gives_header_only() {
  setup_tracing();
  let store = MemoryStore::new();
  let rows = load_order_rows(&store).await.unwrap();

  assert!(rows.is_empty());
  assert_eq!(orders_csv(&rows), format!("{CSV_HEADER}\n"));
}

#[tokio::test]
#[serial]
async fn store_failures_are_reported() {
  setup_tracing();
  let store = MemoryStore::new();
  store.fail_on(Table::Customers, FailureKind::MissingRelation);

  let err = load_order_rows(&store).await.unwrap_err();
  assert!(matches!(err, StoreError::MissingRelation { .. }));
}
