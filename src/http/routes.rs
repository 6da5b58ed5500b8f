//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/health", get(health_handler))
        .route("/playerList", get(player_list_handler))
        .route("/ws", get(ws_handler))
        .fallback_service(static_files)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.client_origin))
        .with_state(state)
}

/// CORS configuration - `*` or a comma-separated origin list
fn cors_layer(client_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if client_origin.trim() == "*" {
        return cors.allow_origin(Any);
    }

    let allowed_origins: Vec<HeaderValue> = client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    cors.allow_origin(allowed_origins)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    sessions: usize,
    cached_players: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        sessions: state.registry.len(),
        cached_players: state.player_names.len(),
    })
}

// ============================================================================
// Player list endpoint
// ============================================================================

#[derive(Serialize)]
struct PlayerListResponse {
    players: Vec<String>,
}

async fn player_list_handler(State(state): State<AppState>) -> Json<PlayerListResponse> {
    Json(PlayerListResponse {
        players: state.player_names.snapshot(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::session::Transport;
    use tokio::net::TcpListener;

    async fn serve(state: AppState) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = build_router(state);
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn player_list_serves_the_cache() {
        let state = AppState::new(Config::default()).unwrap();
        state.player_names.replace(vec!["steve".into(), "alex".into()]);
        let base = serve(state).await;

        let body: serde_json::Value = reqwest::get(format!("{}/playerList", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, serde_json::json!({"players": ["steve", "alex"]}));
    }

    #[tokio::test]
    async fn health_reports_session_count() {
        let state = AppState::new(Config::default()).unwrap();
        state.registry.register("steve", Transport::channel(4).0).unwrap();
        let base = serve(state).await;

        let body: serde_json::Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sessions"], 1);
        assert_eq!(body["cached_players"], 0);
    }

    #[tokio::test]
    async fn unknown_static_path_is_not_found() {
        let config = Config {
            static_dir: std::env::temp_dir().join("proximity-relay-missing-static"),
            ..Config::default()
        };
        let base = serve(AppState::new(config).unwrap()).await;

        let response = reqwest::get(format!("{}/nothing-here.js", base)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
