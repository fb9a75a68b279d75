use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;

use auth::rate_limit::RateLimitState;
use config::Config;
use db::memory::MemoryStore;
use db::postgres::PgStore;
use db::{Repository, Store};
use services::ai::{AiStatusSnapshot, ChatCompletionClient, TextGenerator};

#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub config: Arc<Config>,
    /// `None` when AI features are disabled.
    pub ai: Option<Arc<dyn TextGenerator>>,
    pub ai_status: Arc<Mutex<Option<AiStatusSnapshot>>>,
    pub rate_limiter: RateLimitState,
}

/// Connects, migrates and seeds PostgreSQL. Any failure leaves the service on static data.
async fn connect_database(config: &Config) -> Option<Arc<dyn Store>> {
    let url = config.database_url.as_deref()?;

    let pool = match db::pool::create_pool(url, config.db_timeout()).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(error = %e, "Database unavailable, serving static data");
            return None;
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::warn!(error = %e, "Database migrations failed, serving static data");
        return None;
    }
    tracing::info!("Database migrations applied");

    if let Err(e) = db::seed::seed_if_empty(&pool).await {
        tracing::warn!(error = %e, "Seeding demo data failed");
    }

    Some(Arc::new(PgStore::new(pool)))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let mut origins: Vec<axum::http::HeaderValue> = Vec::new();
    match config.frontend_url.parse::<axum::http::HeaderValue>() {
        Ok(hv) => origins.push(hv),
        Err(_) => tracing::warn!(url = %config.frontend_url, "Ignoring invalid FRONTEND_URL"),
    }
    // Comma-separated extra origins, e.g. a dashboard served from another host
    if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
        for o in extra.split(',') {
            if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                origins.push(hv);
            }
        }
    }

    CorsLayer::new()
        .allow_origin(origins)
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
        .allow_credentials(true)
}

pub fn router(state: AppState) -> Router {
    // Login and register are rate limited per IP + path
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let wellbeing_routes = Router::new()
        .route("/api/wellbeing", get(handlers::wellbeing::get_wellbeing))
        .route("/api/wellbeing/metrics", get(handlers::wellbeing::get_metrics))
        .route("/api/wellbeing/mood", post(handlers::wellbeing::record_mood))
        .route(
            "/api/wellbeing/mood/:user_id",
            get(handlers::wellbeing::mood_history),
        )
        .route(
            "/api/wellbeing/recommendations",
            get(handlers::wellbeing::recommendations),
        )
        .route("/api/wellbeing/catalog", get(handlers::wellbeing::catalog));

    let ai_routes = Router::new()
        .route("/api/ai/analyze/:mood_id", get(handlers::ai::analyze_mood))
        .route(
            "/api/ai/recommendation/:user_id",
            get(handlers::ai::coach_recommendation),
        )
        .route("/api/ai/status", get(handlers::ai::ai_status))
        .route("/api/chat/message", post(handlers::chat::send_message))
        .route("/api/chat/status", get(handlers::chat::chat_status));

    let admin_routes = Router::new()
        .route(
            "/api/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/api/users/count", get(handlers::users::count_users))
        .route(
            "/api/users/:id",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/api/dashboard/stats", get(handlers::dashboard::stats));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .merge(auth_routes)
        .merge(wellbeing_routes)
        .merge(ai_routes)
        .merge(admin_routes)
        .layer(cors_layer(&state.config))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wellbeing_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    // Database, with the in-memory store as fallback
    let primary = connect_database(&config).await;
    let fallback: Arc<dyn Store> = Arc::new(MemoryStore::seeded()?);
    let repo = Repository::new(
        primary,
        fallback,
        config.db_timeout(),
        config.database_url.is_some(),
    );
    if !repo.database_configured() {
        tracing::info!("DATABASE_URL not set, serving static data");
    }

    let ai: Option<Arc<dyn TextGenerator>> = if config.ai_enabled {
        Some(Arc::new(ChatCompletionClient::new(&config)?))
    } else {
        None
    };
    tracing::info!(ai_enabled = config.ai_enabled, model = %config.ai_model, "AI client configured");

    let rate_limiter = RateLimitState::new();
    auth::rate_limit::spawn_cleanup_worker(rate_limiter.clone());

    let state = AppState {
        repo,
        config: config.clone(),
        ai,
        ai_status: Arc::new(Mutex::new(None)),
        rate_limiter,
    };

    let app = router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    // The auth rate limiter keys on the peer address
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState {
            repo: Repository::static_only(Arc::new(MemoryStore::seeded().unwrap())),
            config: Arc::new(Config::for_tests()),
            ai: None,
            ai_status: Arc::new(Mutex::new(None)),
            rate_limiter: RateLimitState::new(),
        }
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(test_state());
        let (status, body) = send(&app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_readyz_reports_static_mode() {
        let app = router(test_state());
        let (status, body) = send(&app, "GET", "/readyz", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["database"], "not_configured");
    }

    #[tokio::test]
    async fn test_record_mood_clamps_and_is_listed() {
        let app = router(test_state());

        let (status, body) = send(
            &app,
            "POST",
            "/api/wellbeing/mood",
            Some(json!({ "userId": 2, "score": 9, "notes": "Big win today" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["score"], 5);
        assert_eq!(body["userId"], 2);

        let (_, history) = send(&app, "GET", "/api/wellbeing/mood/2", None).await;
        assert_eq!(history.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_wellbeing_metrics_for_default_user() {
        let app = router(test_state());
        let (status, body) = send(&app, "GET", "/api/wellbeing", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["moodEntriesCount"], 7);
        assert_eq!(body["moodTrends"].as_array().unwrap().len(), 7);

        let (_, global) = send(&app, "GET", "/api/wellbeing/metrics", None).await;
        assert_eq!(global["totalEntries"], 10);
        assert_eq!(global["dataSource"], "Static Data (Database Not Configured)");
    }

    #[tokio::test]
    async fn test_recommendations_start_with_overview() {
        let app = router(test_state());
        let (status, body) = send(&app, "GET", "/api/wellbeing/recommendations?userId=1", None).await;

        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert!(!items.is_empty() && items.len() <= 8);
        assert_eq!(items[0]["category"], "Overview");
        assert_eq!(items[0]["id"], 0);
    }

    #[tokio::test]
    async fn test_recommendations_for_user_without_history() {
        let app = router(test_state());
        let (_, body) = send(&app, "GET", "/api/wellbeing/recommendations?userId=42", None).await;

        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[0]["title"], "Take a short walk");
    }

    #[tokio::test]
    async fn test_analyze_unknown_mood_is_404() {
        let app = router(test_state());
        let (status, body) = send(&app, "GET", "/api/ai/analyze/999", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], 404);
        assert_eq!(body["error"]["message"], "Mood entry with ID 999 not found");
    }

    #[tokio::test]
    async fn test_analyze_mood_rule_based() {
        let app = router(test_state());
        // Seed entry 3: score 2, "Stressed with deadlines"
        let (status, body) = send(&app, "GET", "/api/ai/analyze/3", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sentiment"], "negative");
        let themes = body["mainThemes"].as_array().unwrap();
        assert!(themes.contains(&json!("stress management")));
        assert_eq!(body["suggestedActivities"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_ai_disabled_endpoints() {
        let app = router(test_state());

        let (_, status) = send(&app, "GET", "/api/ai/status", None).await;
        assert_eq!(status["status"], "disabled");
        assert_eq!(status["isAvailable"], false);

        let (_, coach) = send(&app, "GET", "/api/ai/recommendation/1", None).await;
        assert_eq!(coach["recommendation"], services::coach::AI_DISABLED_TIP);
    }

    #[tokio::test]
    async fn test_chat_greeting() {
        let app = router(test_state());
        let (status, body) = send(
            &app,
            "POST",
            "/api/chat/message",
            Some(json!({ "message": "hello there", "history": [] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let reply = body["message"].as_str().unwrap();
        assert!(services::chat::ReplyCategory::Greeting
            .replies()
            .contains(&reply));

        let (_, status) = send(&app, "GET", "/api/chat/status", None).await;
        assert_eq!(status["status"], "online");
    }

    #[tokio::test]
    async fn test_empty_chat_message_is_rejected() {
        let app = router(test_state());
        let (status, _) = send(&app, "POST", "/api/chat/message", Some(json!({ "message": "  " }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_login_success_and_failure() {
        let app = router(test_state());

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "admin", "password": "Password@123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "Administrator");
        assert!(body.get("passwordHash").is_none());

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "admin", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "Username or password is incorrect");
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let app = router(test_state());

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            Some(json!({
                "name": "Sam Lee",
                "email": "sam@example.com",
                "username": "sam",
                "password": "secret1"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "Employee");
        assert_eq!(body["department"], "General");

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "sam", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_auth_routes_are_rate_limited() {
        let app = router(test_state());
        let body = json!({ "username": "nobody", "password": "x" });

        for _ in 0..5 {
            let (status, _) = send(&app, "POST", "/api/auth/login", Some(body.clone())).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
        let (status, _) = send(&app, "POST", "/api/auth/login", Some(body)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_create_user_defaults_and_duplicates() {
        let app = router(test_state());

        let (status, body) = send(&app, "POST", "/api/users", Some(json!({ "name": "Ada Byron" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["username"], "ada.byron");
        assert_eq!(body["email"], "ada.byron@company.com");
        assert_eq!(body["department"], "General");

        let (status, body) = send(&app, "POST", "/api/users", Some(json!({ "username": "john" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["message"], "Username already exists");

        let (_, count) = send(&app, "GET", "/api/users/count", None).await;
        assert_eq!(count["count"], 4);
    }

    #[tokio::test]
    async fn test_update_and_delete_user() {
        let app = router(test_state());

        let (status, body) = send(
            &app,
            "PUT",
            "/api/users/2",
            Some(json!({ "department": "Sales", "isAdmin": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["department"], "Sales");
        assert_eq!(body["role"], "Administrator");

        let (status, _) = send(&app, "DELETE", "/api/users/2", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "DELETE", "/api/users/2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/api/users/2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_users_hides_password_hashes() {
        let app = router(test_state());
        let (_, body) = send(&app, "GET", "/api/users", None).await;

        let users = body["users"].as_array().unwrap();
        assert_eq!(users.len(), 3);
        assert!(users.iter().all(|u| u.get("passwordHash").is_none()));
        assert_eq!(body["dataSource"], "Static Data (Database Not Configured)");
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let app = router(test_state());
        let (status, body) = send(&app, "GET", "/api/dashboard/stats", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalUsers"], 3);
        assert_eq!(body["activeUsers"], 3);
        assert_eq!(body["totalMoodEntries"], 10);
        assert_eq!(body["totalRecommendations"], 25);
        assert_eq!(body["databaseStatus"], "Disconnected");
    }

    #[tokio::test]
    async fn test_username_taken_between_check_and_insert_is_conflict() {
        let mut state = test_state();
        state.repo = Repository::new(
            Some(Arc::new(db::tests::ConstrainedStore::seeded())),
            Arc::new(MemoryStore::seeded().unwrap()),
            std::time::Duration::from_millis(200),
            true,
        );
        let app = router(state);

        let (status, body) = send(&app, "POST", "/api/users", Some(json!({ "username": "newbie" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["message"], "Username already exists");

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/register",
            Some(json!({
                "name": "New Bie",
                "email": "newbie@example.com",
                "username": "newbie",
                "password": "secret1"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, count) = send(&app, "GET", "/api/users/count", None).await;
        assert_eq!(count["count"], 3);
    }

    #[tokio::test]
    async fn test_register_rejects_blank_username() {
        let app = router(test_state());
        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/register",
            Some(json!({
                "name": "Blank",
                "email": "blank@example.com",
                "username": "   ",
                "password": "secret1"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
