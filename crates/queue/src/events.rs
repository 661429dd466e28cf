//! Every event name, room name and payload shape lives here so the
//! handlers cannot drift apart. The realtime transport itself is an
//! external collaborator behind [`EventBus`].

use serde_json::{json, Value};
use sqlx::types::Uuid;
use tokio::sync::mpsc;

use gambit_common::get_current_timestamp_ms;

use crate::intent::IntentStatus;

pub const QUEUED: &str = "transaction:queued";
pub const PROCESSING: &str = "transaction:processing";
pub const RESULT: &str = "transaction:result";
pub const MINT_TASK_QUEUED: &str = "mint-task-queued";
pub const ERROR: &str = "error";

pub fn player_room(actor: &str) -> String {
    format!("player:{}", actor)
}

pub trait EventBus: Send + Sync + 'static {
    fn emit(&self, room: &str, event: &str, payload: Value);
}

#[derive(Debug, Clone)]
pub struct OutboundEvent {
    pub room: String,
    pub event: String,
    pub payload: Value,
}

/// Production bus: forwards events over a channel the realtime layer
/// drains, the same bridge shape the service uses for other background
/// consumers.
#[derive(Clone)]
pub struct ChannelEventBus {
    tx: mpsc::UnboundedSender<OutboundEvent>,
}

impl ChannelEventBus {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventBus for ChannelEventBus {
    fn emit(&self, room: &str, event: &str, payload: Value) {
        let outbound = OutboundEvent {
            room: room.to_string(),
            event: event.to_string(),
            payload,
        };
        if self.tx.send(outbound).is_err() {
            tracing::warn!("[ChannelEventBus::emit] event receiver dropped, {} lost", event);
        }
    }
}

pub fn queued_payload(id: &str, status: IntentStatus) -> Value {
    // Rows waiting on a parent id announce that; everything else is queued.
    let wire_status = match status {
        IntentStatus::WaitingForObjectId => "waiting_for_object_id",
        _ => "queued",
    };
    json!({
        "id": id,
        "status": wire_status,
        "ts": get_current_timestamp_ms(),
    })
}

pub fn processing_payload(id: &str) -> Value {
    json!({
        "id": id,
        "status": "processing",
        "ts": get_current_timestamp_ms(),
    })
}

pub fn result_success_payload(id: &str, digest: &str, object_id: Option<&str>) -> Value {
    let mut payload = json!({
        "id": id,
        "status": "success",
        "digest": digest,
        "ts": get_current_timestamp_ms(),
    });
    if let Some(object_id) = object_id {
        payload["object_id"] = json!(object_id);
    }
    payload
}

pub fn result_success_mint_payload(
    id: &str,
    digest: &str,
    object_id: Option<&str>,
    reward_name: &str,
    badge_type: &str,
) -> Value {
    let mut payload = result_success_payload(id, digest, object_id);
    payload["reward_name"] = json!(reward_name);
    payload["badge_type"] = json!(badge_type);
    payload
}

pub fn result_error_payload(id: &str, error: &str) -> Value {
    json!({
        "id": id,
        "status": "error",
        "error": error,
        "ts": get_current_timestamp_ms(),
    })
}

pub fn mint_task_queued_payload(
    task_id: &str,
    reward_type: &str,
    player_id: Uuid,
    player_sui_address: &str,
) -> Value {
    json!({
        "task_id": task_id,
        "reward_type": reward_type,
        "player_id": player_id,
        "player_sui_address": player_sui_address,
    })
}

pub fn error_payload(error: &str, transaction_id: Option<&str>) -> Value {
    let mut payload = json!({ "error": error });
    if let Some(id) = transaction_id {
        payload["transaction_id"] = json!(id);
    }
    payload
}
