use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use catalog_api_rust::handlers::{attributes, auth, categories, health, media, pricing, products};
use catalog_api_rust::middleware::identity_auth_middleware;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, AUTH_SERVICE_URL, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = catalog_api_rust::config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("Starting Catalog API in {:?} mode", config.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("CATALOG_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3200);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Catalog API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        // Public auth routes (token acquisition)
        .merge(auth_public_routes())
        // Protected API (bearer token verified against the identity service)
        .merge(protected_api_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    use axum::routing::post;

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
}

fn protected_api_routes() -> Router {
    Router::new()
        .route("/api/auth/profile", get(auth::profile))
        .merge(category_routes())
        .merge(product_routes())
        .merge(pricing_routes())
        .merge(attribute_routes())
        .merge(media_routes())
        .route_layer(axum::middleware::from_fn(identity_auth_middleware))
}

fn category_routes() -> Router {
    Router::new()
        .route("/api/categories/tree", get(categories::tree))
        .route(
            "/api/categories",
            get(categories::find_all).post(categories::create),
        )
        .route(
            "/api/categories/:id",
            get(categories::find_one)
                .put(categories::update)
                .delete(categories::remove),
        )
}

fn product_routes() -> Router {
    use axum::routing::{delete, put};

    Router::new()
        .route(
            "/api/products",
            get(products::find_all).post(products::create),
        )
        .route("/api/products/sku/:sku", get(products::find_by_sku))
        .route(
            "/api/products/:id",
            get(products::find_one)
                .put(products::update)
                .delete(products::remove),
        )
        .route("/api/products/:id/hard", delete(products::hard_remove))
        .route(
            "/api/products/:id/categories",
            put(products::assign_categories),
        )
}

fn pricing_routes() -> Router {
    use axum::routing::{delete, post};

    Router::new()
        .route("/api/pricing", post(pricing::upsert))
        .route(
            "/api/pricing/product/:product_id",
            get(pricing::find_by_product),
        )
        .route(
            "/api/pricing/product/:product_id/current",
            get(pricing::current),
        )
        .route("/api/pricing/:id", delete(pricing::remove))
}

fn attribute_routes() -> Router {
    use axum::routing::put;

    Router::new()
        .route(
            "/api/attributes",
            get(attributes::find_all).post(attributes::create),
        )
        .route(
            "/api/attributes/product/:product_id",
            get(attributes::product_attributes),
        )
        .route(
            "/api/attributes/product/:product_id/:attribute_id",
            put(attributes::set_product_attribute),
        )
        .route(
            "/api/attributes/:id",
            get(attributes::find_one).put(attributes::update),
        )
}

fn media_routes() -> Router {
    use axum::routing::{post, put};

    Router::new()
        .route("/api/media", post(media::create))
        .route("/api/media/product/:product_id", get(media::find_by_product))
        .route("/api/media/:id", put(media::update).delete(media::remove))
        .route("/api/media/:id/primary", put(media::set_primary))
}
