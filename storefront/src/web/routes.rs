// storefront/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{admin_handlers, cart_handlers, catalog_handlers, checkout_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .service(
      web::scope("/api/v1")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/products")
            .route("", web::get().to(catalog_handlers::list_products_handler))
            .route("/{product_id}", web::get().to(catalog_handlers::get_product_handler))
            .route(
              "/{product_id}/colors",
              web::get().to(catalog_handlers::product_colors_handler),
            )
            .route(
              "/{product_id}/gallery",
              web::get().to(catalog_handlers::product_gallery_handler),
            ),
        )
        .route("/colors", web::get().to(catalog_handlers::list_colors_handler))
        .service(
          web::scope("/cart")
            .route("", web::get().to(cart_handlers::get_cart_handler))
            .route("", web::post().to(cart_handlers::add_to_cart_handler))
            .route("", web::delete().to(cart_handlers::clear_cart_handler))
            .route("/{index}", web::delete().to(cart_handlers::remove_cart_line_handler)),
        )
        .route("/currency", web::put().to(cart_handlers::set_currency_handler))
        .route("/checkout", web::post().to(checkout_handlers::checkout_handler)),
    )
    .service(
      web::scope("/admin")
        .route("/orders", web::get().to(admin_handlers::admin_orders_handler))
        .route("/orders.csv", web::get().to(admin_handlers::admin_orders_csv_handler))
        .route(
          "/products/{product_id}/tags",
          web::put().to(admin_handlers::set_product_tags_handler),
        ),
    );
}
