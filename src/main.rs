use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;

use auth::identity::IdentityResolver;
use config::Config;
use handlers::ws::ChannelRegistry;
use services::quotes::QuoteService;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub identity: IdentityResolver,
    pub quotes: Arc<QuoteService>,
    pub channels: ChannelRegistry,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "duet_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    // Database
    let db = db::create_pool(&config.database_url).await;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    let identity = IdentityResolver::from_config(&config);

    // The fixed dev identity must exist as a row so owner FKs hold.
    if let IdentityResolver::Fixed(user) = &identity {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, gender)
            VALUES ($1, $2, 'Dev', 'female')
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user.id)
        .bind(user.email.as_deref().unwrap_or("dev@localhost"))
        .execute(&db)
        .await
        .expect("Failed to ensure dev user");
    }

    let quotes = Arc::new(QuoteService::new(
        config.quotes_file.clone(),
        Duration::from_secs(config.quotes_cache_ttl_secs),
    ));

    let state = AppState {
        db,
        config: config.clone(),
        identity,
        quotes,
        channels: ChannelRegistry::new(),
    };

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/ws", get(handlers::ws::ws_handler))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh-token", post(handlers::auth::refresh_token));

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/profile", get(handlers::auth::profile))
        // Moods
        .route("/api/moods", get(handlers::moods::list_moods))
        .route("/api/moods", post(handlers::moods::create_mood))
        .route("/api/moods/:id", put(handlers::moods::update_mood))
        .route("/api/moods/:id", delete(handlers::moods::delete_mood))
        // Songs
        .route("/api/songs", get(handlers::songs::list_songs))
        .route("/api/songs", post(handlers::songs::create_song))
        .route("/api/songs/:id", put(handlers::songs::update_song))
        .route("/api/songs/:id", delete(handlers::songs::delete_song))
        // Surprises
        .route("/api/surprises", get(handlers::surprises::list_surprises))
        .route("/api/surprises", post(handlers::surprises::create_surprise))
        .route("/api/surprises/:id", put(handlers::surprises::update_surprise))
        .route("/api/surprises/:id", delete(handlers::surprises::delete_surprise))
        // Tasks
        .route("/api/tasks", get(handlers::tasks::list_tasks))
        .route("/api/tasks", post(handlers::tasks::create_task))
        .route("/api/tasks/:id", put(handlers::tasks::update_task))
        .route("/api/tasks/:id", delete(handlers::tasks::delete_task))
        // Events
        .route("/api/events", get(handlers::events::list_events))
        .route("/api/events", post(handlers::events::create_event))
        .route("/api/events/:id", put(handlers::events::update_event))
        .route("/api/events/:id", delete(handlers::events::delete_event))
        // Wishlist (shared, not owner-scoped)
        .route("/api/wishlist", get(handlers::wishlist::list_wishlist))
        .route("/api/wishlist", post(handlers::wishlist::create_wishlist_item))
        .route("/api/wishlist/:id", put(handlers::wishlist::update_wishlist_item))
        .route("/api/wishlist/:id", delete(handlers::wishlist::delete_wishlist_item))
        // Movie likes (shared, not owner-scoped)
        .route("/api/movie-likes", get(handlers::movie_likes::list_movie_likes))
        .route("/api/movie-likes", post(handlers::movie_likes::create_movie_like))
        .route("/api/movie-likes/:id", put(handlers::movie_likes::update_movie_like))
        .route("/api/movie-likes/unlike", post(handlers::movie_likes::unlike_movie))
        // Quotes proxy
        .route("/api/quotes", get(handlers::quotes::get_quotes))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::identity::require_auth,
        ));

    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = vec![config
            .frontend_url
            .parse::<axum::http::HeaderValue>()
            .expect("FRONTEND_URL must be a valid origin")];
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true);

    // The video proxy is consumed by bare <video> tags, which cannot send
    // credentialed CORS requests, so these two routes are wide open.
    let video_routes = Router::new()
        .route("/api/video/stream", get(handlers::video::stream))
        .route("/api/video/info", get(handlers::video::info))
        .layer(CorsLayer::permissive());

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .merge(video_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app).await.expect("Server error");
}
