//! HTTP gateway for the DU bot.
//!
//! Three routes mirror the bot facade: `GET /` lists the supported query
//! texts, `GET /question?id=` names one query's requirements, `POST /answer`
//! computes the answer. Answers and error notices come back as plain text in
//! the bot's own voice; the index and requirement lists come back as JSON.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use dubot_adapters::standard_registry;
use dubot_core::{seed_default_queries, Bot, BotConfig, ParamMap, QueryStore};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!(
            "[dubot-gateway] .env not loaded: {} (using system environment)",
            e
        );
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match BotConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("config load failed: {e}");
            std::process::exit(1);
        }
    };

    let store = match QueryStore::open_path(config.query_store_path()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("query store open failed: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = seed_default_queries(&store) {
        tracing::warn!("starter query seeding failed: {e}");
    }

    let registry = match standard_registry(&config) {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!("source client setup failed: {e}");
            std::process::exit(1);
        }
    };

    let port = config.port;
    let app_name = config.app_name.clone();
    let app = build_app(Arc::new(Bot::new(store, registry)));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("{} listening on {}", app_name, addr);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("bind to {addr} failed: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}

fn build_app(bot: Arc<Bot>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/question", get(question))
        .route("/answer", post(answer))
        .route("/api/v1/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(bot)
}

/// GET / – display texts of every supported query, ascending by id.
async fn index(State(bot): State<Arc<Bot>>) -> Json<Vec<String>> {
    let texts = bot.supported_query_texts().unwrap_or_else(|e| {
        tracing::warn!("supported-query listing failed: {e}");
        Vec::new()
    });
    Json(texts)
}

#[derive(Deserialize)]
struct QuestionParams {
    #[serde(default)]
    id: String,
}

/// GET /question?id= – requirement names for one query, or the unsupported
/// notice when the id resolves to nothing.
async fn question(
    State(bot): State<Arc<Bot>>,
    Query(params): Query<QuestionParams>,
) -> Json<serde_json::Value> {
    match bot.specify_requirements(&params.id) {
        Ok(requirements) => Json(serde_json::json!(requirements)),
        Err(err) => Json(serde_json::Value::String(err.requirements_message())),
    }
}

/// POST /answer – answer for the query named by the body's `id` key, with
/// the rest of the body as parameter values.
async fn answer(State(bot): State<Arc<Bot>>, Json(body): Json<serde_json::Value>) -> String {
    let params = match ParamMap::from_json(&body) {
        Ok(params) => params,
        Err(err) => return err.user_message(),
    };
    match bot.answer(&params).await {
        Ok(text) => text,
        Err(err) => err.user_message(),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
