//! Action routes (§6): immediate execution through the Action Processor.
//! Distinct from the clock's `queue-action`, which defers to the next
//! tick — these execute synchronously against the current committed state.

use axum::extract::State;
use axum::Json;
use osf_sim_core::{ActionPayload, ActionProcessor, TickContext};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct ExecuteActionBody {
    pub participant_id: String,
    #[serde(flatten)]
    pub payload: ActionPayload,
}

fn run(state: &AppState, participant_id: &str, payload: ActionPayload) -> Json<serde_json::Value> {
    let processor = ActionProcessor::new(state.store.clone());
    let mut ctx = TickContext::new(state.store.current_month());
    let action_id = Uuid::new_v4().to_string();
    let result = processor.execute(&action_id, participant_id, &payload, &mut ctx);
    Json(json!(result))
}

pub async fn execute(State(state): State<AppState>, Json(body): Json<ExecuteActionBody>) -> Json<serde_json::Value> {
    run(&state, &body.participant_id, body.payload)
}

#[derive(Deserialize)]
pub struct BuyTokensBody {
    pub participant_id: String,
    pub property_id: String,
    pub token_amount: f64,
    pub max_price: f64,
}

pub async fn buy_tokens(State(state): State<AppState>, Json(body): Json<BuyTokensBody>) -> Json<serde_json::Value> {
    run(
        &state,
        &body.participant_id,
        ActionPayload::BuyTokens {
            property_id: body.property_id,
            token_amount: body.token_amount,
            max_price: body.max_price,
        },
    )
}

#[derive(Deserialize)]
pub struct SellTokensBody {
    pub participant_id: String,
    pub property_id: String,
    pub token_amount: f64,
    pub min_price: f64,
}

pub async fn sell_tokens(State(state): State<AppState>, Json(body): Json<SellTokensBody>) -> Json<serde_json::Value> {
    run(
        &state,
        &body.participant_id,
        ActionPayload::SellTokens {
            property_id: body.property_id,
            token_amount: body.token_amount,
            min_price: body.min_price,
        },
    )
}

#[derive(Deserialize)]
pub struct PayRentBody {
    pub participant_id: String,
    pub property_id: String,
    pub weeks: u32,
}

pub async fn pay_rent(State(state): State<AppState>, Json(body): Json<PayRentBody>) -> Json<serde_json::Value> {
    run(
        &state,
        &body.participant_id,
        ActionPayload::PayRent {
            property_id: body.property_id,
            weeks: body.weeks,
        },
    )
}
