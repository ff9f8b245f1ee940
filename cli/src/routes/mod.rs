//! Route assembly (§6): one `Router<AppState>` merged from five logical
//! groups, mirroring the corpus's `Router::new().route(...).merge(...)`
//! idiom rather than a single flat route list.

mod actions;
mod clock;
mod economy;
mod network;
mod npcs;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

pub fn build() -> Router<AppState> {
    let clock_routes = Router::new()
        .route("/clock/status", get(clock::status))
        .route("/clock/presets", get(clock::presets))
        .route("/clock/pending-actions", get(clock::pending_actions))
        .route("/clock/preset", post(clock::set_preset))
        .route("/clock/interval", post(clock::set_interval))
        .route("/clock/mode", post(clock::set_mode))
        .route("/clock/start", post(clock::start))
        .route("/clock/stop", post(clock::stop))
        .route("/clock/pause", post(clock::pause))
        .route("/clock/resume", post(clock::resume))
        .route("/clock/force-tick", post(clock::force_tick))
        .route("/clock/queue-action", post(clock::queue_action))
        .route("/clock/queue-action/:id", delete(clock::remove_action))
        .route("/clock/queue-actions", delete(clock::clear_actions))
        .route("/stream", get(clock::stream));

    let network_routes = Router::new()
        .route("/state", get(network::state))
        .route("/properties", get(network::properties))
        .route("/properties/:id", get(network::property))
        .route("/participants", get(network::participants))
        .route("/participants/:id", get(network::participant))
        .route("/history/snapshots", get(network::history_snapshots))
        .route("/history/events", get(network::history_events))
        .route("/history/metrics", get(network::history_metrics))
        .route("/feed", get(network::feed));

    let npc_routes = Router::new()
        .route("/npcs", get(npcs::list))
        .route("/npcs/:id", get(npcs::get))
        .route("/npcs/initialize", post(npcs::initialize));

    let economy_routes = Router::new()
        .route("/economy", get(economy::economy))
        .route("/events/generate", post(economy::generate_events))
        .route("/news/:month", get(economy::news));

    let action_routes = Router::new()
        .route("/actions/execute", post(actions::execute))
        .route("/actions/buy-tokens", post(actions::buy_tokens))
        .route("/actions/sell-tokens", post(actions::sell_tokens))
        .route("/actions/pay-rent", post(actions::pay_rent));

    Router::new()
        .merge(clock_routes)
        .merge(network_routes)
        .merge(npc_routes)
        .merge(economy_routes)
        .merge(action_routes)
}
