use axum::extract::DefaultBodyLimit;
use axum::{middleware as axum_middleware, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod auth;
mod config;
mod database;
mod error;
mod handlers;
mod middleware;
mod services;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = crate::config::config();
    tracing::info!("Starting AjiViet API in {:?} mode", config.environment);

    // The server still starts without a reachable database; /health reports it
    if let Err(e) = crate::database::DatabaseManager::migrate().await {
        tracing::warn!("Skipping migrations: {}", e);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("AjiViet API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected API behind JWT auth
        .merge(protected_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router {
    use axum::routing::post;
    use handlers::{auth, catalog, dishes, profile, view_history};

    Router::new()
        // Account lifecycle
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/forgot-password", post(auth::forgot_password))
        .route("/api/auth/reset-password", post(auth::reset_password))
        // Approved catalog
        .route("/api/dishes", get(dishes::list_dishes))
        .route("/api/dishes/:id", get(dishes::get_dish))
        .route("/api/categories", get(catalog::list_categories))
        .route("/api/regions", get(catalog::list_regions))
        // Public profile and activity
        .route("/api/users/profile/:id", get(profile::get_profile))
        .route(
            "/api/view-history/:user_id/recent",
            get(view_history::recent_views),
        )
}

fn protected_routes() -> Router {
    use axum::routing::{delete, patch, post};
    use handlers::{auth, dishes, favorites, profile, templates, upload, users, view_history};

    Router::new()
        // Session
        .route("/api/auth/logout", post(auth::logout))
        // Account
        .route("/api/users/statistics", get(users::statistics))
        .route("/api/users/change-password", patch(users::change_password))
        .route("/api/users/profile", post(profile::edit_profile))
        // Dish submission and review. The static /submissions routes must be
        // registered alongside /:id routes; axum matches the literal first.
        .route("/api/dishes", post(dishes::create_dish))
        .route("/api/dishes/submissions", get(dishes::all_submissions))
        .route("/api/dishes/submissions/mine", get(dishes::my_submissions))
        .route(
            "/api/dishes/:id",
            patch(dishes::update_dish).delete(dishes::delete_dish),
        )
        // Favorites
        .route(
            "/api/favorites",
            get(favorites::list_favorites).post(favorites::add_favorite),
        )
        .route("/api/favorites/:dish_id", delete(favorites::remove_favorite))
        .route("/api/favorites/check/:dish_id", get(favorites::check_favorite))
        .route("/api/favorites/statistics", get(favorites::favorite_statistics))
        // View history
        .route(
            "/api/view-history",
            post(view_history::save_view).delete(view_history::clear_history),
        )
        // AI introductions
        .route(
            "/api/templates/generate-introduction",
            post(templates::generate_introduction),
        )
        .route(
            "/api/templates/saved-templates",
            get(templates::list_templates).post(templates::save_template),
        )
        .route(
            "/api/templates/saved-templates/:id",
            delete(templates::delete_template),
        )
        // Image upload
        .route(
            "/api/upload/dish-image",
            post(upload::upload_dish_image)
                .layer(DefaultBodyLimit::max(config::config().api.max_upload_bytes)),
        )
        .route_layer(axum_middleware::from_fn(middleware::jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "AjiViet API",
        "version": version,
        "description": "Vietnamese dish catalog for Japanese speakers",
        "endpoints": {
            "auth": "/api/auth/* (register, login, logout, password reset)",
            "dishes": "/api/dishes[/:id] (public browse), /api/dishes/submissions (review)",
            "catalog": "/api/categories, /api/regions (public)",
            "favorites": "/api/favorites (protected)",
            "view_history": "/api/view-history (protected)",
            "templates": "/api/templates/* (protected)",
            "upload": "/api/upload/dish-image (protected)",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
