//! NPC routes (§6): the fixed catalogue and each NPC's live participant
//! record. NPC seeding itself happens once at startup (see `main.rs`); this
//! route exists for clients that want to trigger (re-)seeding explicitly,
//! e.g. after wiping the store.

use axum::extract::{Path, State};
use axum::Json;
use osf_sim_core::npc::catalogue;
use serde_json::json;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Json<serde_json::Value> {
    let entries: Vec<_> = catalogue()
        .iter()
        .map(|profile| {
            let participant = state.store.get_participant(profile.id).ok();
            json!({
                "id": profile.id,
                "display_name": profile.display_name,
                "role": profile.role,
                "participant": participant,
            })
        })
        .collect();
    Json(json!({ "npcs": entries }))
}

pub async fn get(State(state): State<AppState>, Path(npc_id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    let participant = state.store.get_participant(&npc_id)?;
    let holdings = state.store.list_holdings(&npc_id);
    Ok(Json(json!({ "participant": participant, "holdings": holdings })))
}

pub async fn initialize(State(state): State<AppState>) -> Json<serde_json::Value> {
    osf_sim_core::NpcEngine::new().ensure_seeded(&*state.store);
    Json(json!({ "ok": true, "count": catalogue().len() }))
}
