//! Shared application state handed to every axum handler (§6).

use std::sync::Arc;

use osf_sim_core::{NetworkClock, StateStore, TickPipeline};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StateStore>,
    pub pipeline: Arc<TickPipeline>,
    pub clock: NetworkClock,
}
