//! HTTP route definitions

use axum::{
    extract::State,
    http::Method,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // Browser clients connect from wherever the game page is hosted
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    connected_players: usize,
    max_players: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        connected_players: state.game.player_count(),
        max_players: state.config.game.max_players,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::game::GameSettings;

    #[tokio::test]
    async fn health_reports_player_count() {
        let config = Config {
            server_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "info".to_string(),
            game: GameSettings::default(),
            seed: Some(1),
        };
        let (state, _manager) = AppState::new(config);
        state
            .game
            .player_count
            .store(3, std::sync::atomic::Ordering::Relaxed);

        let Json(health) = health_handler(State(state.clone())).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.connected_players, 3);
        assert_eq!(health.max_players, GameSettings::default().max_players);
    }
}
