#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use serde_json::Value;
use sqlx::types::Uuid;

use gambit_chain::{ChainGateway, MoveCall};
use gambit_common::get_current_timestamp_ms;
use gambit_queue::{EventBus, Intent, IntentStatus, OutboundEvent, Store};

/// In-memory stand-in for the Postgres store, with enough bookkeeping to
/// observe ordering and single-flight invariants.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Intent>>,
    games: Mutex<HashMap<Uuid, String>>,
    rewards: Mutex<HashMap<(Uuid, String), String>>,
    players: Mutex<HashMap<String, Uuid>>,
    no_first_game: Mutex<HashSet<Uuid>>,
    no_first_game_created: Mutex<HashSet<Uuid>>,
    victories: Mutex<HashMap<Uuid, i64>>,
    completed_order: Mutex<Vec<String>>,
    serialization_violated: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_player(&self, actor: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.players.lock().unwrap().insert(actor.to_string(), id);
        id
    }

    pub fn set_victories(&self, player: Uuid, total: i64) {
        self.victories.lock().unwrap().insert(player, total);
    }

    pub fn mark_no_first_game(&self, player: Uuid) {
        self.no_first_game.lock().unwrap().insert(player);
    }

    pub fn mark_no_first_game_created(&self, player: Uuid) {
        self.no_first_game_created.lock().unwrap().insert(player);
    }

    pub fn grant_reward(&self, player: Uuid, badge_type: &str) {
        self.rewards
            .lock()
            .unwrap()
            .insert((player, badge_type.to_string()), "0xgranted".to_string());
    }

    pub fn rows(&self) -> Vec<Intent> {
        self.rows.lock().unwrap().clone()
    }

    pub fn row(&self, id: &str) -> Option<Intent> {
        self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned()
    }

    pub fn completed_order(&self) -> Vec<String> {
        self.completed_order.lock().unwrap().clone()
    }

    pub fn game_object_id(&self, game_ref: Uuid) -> Option<String> {
        self.games.lock().unwrap().get(&game_ref).cloned()
    }

    pub fn reward_object_id(&self, player: Uuid, badge_type: &str) -> Option<String> {
        self.rewards
            .lock()
            .unwrap()
            .get(&(player, badge_type.to_string()))
            .cloned()
    }

    pub fn serialization_violated(&self) -> bool {
        self.serialization_violated.load(Ordering::SeqCst)
    }

    pub fn force_created_at(&self, id: &str, created_at: i64) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.created_at = created_at;
        }
    }

    fn update_row(&self, id: &str, f: impl FnOnce(&mut Intent)) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| anyhow!("no row {}", id))?;
        f(row);
        Ok(())
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn enqueue(&self, intent: &Intent) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|r| r.id == intent.id) {
            bail!("duplicate intent id {}", intent.id);
        }
        rows.push(intent.clone());
        Ok(())
    }

    async fn claim_next(&self, actor: &str) -> Result<Option<Intent>> {
        let mut rows = self.rows.lock().unwrap();

        let candidate = rows
            .iter()
            .filter(|r| r.status == IntentStatus::Pending && r.actor.as_deref() == Some(actor))
            .min_by_key(|r| r.created_at)
            .map(|r| r.id.clone());

        let Some(id) = candidate else {
            return Ok(None);
        };

        let already_processing = rows
            .iter()
            .any(|r| r.status == IntentStatus::Processing && r.actor.as_deref() == Some(actor));
        if already_processing {
            self.serialization_violated.store(true, Ordering::SeqCst);
        }

        let row = rows.iter_mut().find(|r| r.id == id).unwrap();
        row.status = IntentStatus::Processing;
        row.updated_at = get_current_timestamp_ms();
        Ok(Some(row.clone()))
    }

    async fn list_active_actors(&self, limit: i64) -> Result<Vec<String>> {
        let rows = self.rows.lock().unwrap();
        let mut oldest: HashMap<String, i64> = HashMap::new();
        for row in rows.iter() {
            if row.status != IntentStatus::Pending {
                continue;
            }
            let Some(actor) = &row.actor else { continue };
            let entry = oldest.entry(actor.clone()).or_insert(row.created_at);
            if row.created_at < *entry {
                *entry = row.created_at;
            }
        }
        let mut actors: Vec<(String, i64)> = oldest.into_iter().collect();
        actors.sort_by_key(|(_, created_at)| *created_at);
        Ok(actors
            .into_iter()
            .take(limit as usize)
            .map(|(actor, _)| actor)
            .collect())
    }

    async fn mark_completed(&self, id: &str) -> Result<()> {
        self.update_row(id, |row| {
            row.status = IntentStatus::Completed;
            row.processed_at = Some(get_current_timestamp_ms());
        })?;
        self.completed_order.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn mark_failed(&self, id: &str, error: &str) -> Result<()> {
        self.update_row(id, |row| {
            row.status = IntentStatus::Failed;
            row.error = Some(error.to_string());
            row.processed_at = Some(get_current_timestamp_ms());
        })
    }

    async fn requeue_pending(&self, id: &str, error: &str) -> Result<()> {
        self.update_row(id, |row| {
            row.status = IntentStatus::Pending;
            row.error = Some(error.to_string());
            row.updated_at = get_current_timestamp_ms();
        })
    }

    async fn increment_retries(&self, id: &str) -> Result<()> {
        self.update_row(id, |row| {
            row.retries += 1;
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.rows.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }

    async fn set_game_object_id(&self, game_ref: Uuid, object_id: &str) -> Result<()> {
        self.games
            .lock()
            .unwrap()
            .insert(game_ref, object_id.to_string());
        Ok(())
    }

    async fn upsert_reward(&self, player_ref: Uuid, badge_type: &str, object_id: &str) -> Result<()> {
        self.rewards
            .lock()
            .unwrap()
            .insert((player_ref, badge_type.to_string()), object_id.to_string());
        Ok(())
    }

    async fn list_waiting_for_game(&self, game_ref: Uuid) -> Result<Vec<Intent>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| {
                r.status == IntentStatus::WaitingForObjectId && r.game_ref == Some(game_ref)
            })
            .cloned()
            .collect())
    }

    async fn unblock_waiting(&self, id: &str, object_id: &str) -> Result<()> {
        self.update_row(id, |row| {
            row.status = IntentStatus::Pending;
            row.payload["game_object_id"] = Value::String(object_id.to_string());
            row.updated_at = get_current_timestamp_ms();
        })
    }

    async fn gc_old(&self) -> Result<u64> {
        let cutoff = get_current_timestamp_ms() - 24 * 60 * 60 * 1000;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| {
            !(matches!(r.status, IntentStatus::Completed | IntentStatus::Failed)
                && r.created_at < cutoff)
        });
        Ok((before - rows.len()) as u64)
    }

    async fn reward_intent_exists(
        &self,
        actor: &str,
        player_ref: Uuid,
        badge_type: &str,
    ) -> Result<bool> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().any(|r| {
            r.actor.as_deref() == Some(actor)
                && r.player_ref == Some(player_ref)
                && r.payload.get("badge_type").and_then(Value::as_str) == Some(badge_type)
                && matches!(
                    r.status,
                    IntentStatus::Pending | IntentStatus::Processing | IntentStatus::Completed
                )
        }))
    }

    async fn reward_exists(&self, player_ref: Uuid, badge_type: &str) -> Result<bool> {
        Ok(self
            .rewards
            .lock()
            .unwrap()
            .contains_key(&(player_ref, badge_type.to_string())))
    }

    async fn resolve_player(&self, actor: &str) -> Result<Option<Uuid>> {
        Ok(self.players.lock().unwrap().get(actor).copied())
    }

    async fn no_first_game(&self, player_ref: Uuid) -> Result<bool> {
        Ok(self.no_first_game.lock().unwrap().contains(&player_ref))
    }

    async fn no_first_game_created(&self, player_ref: Uuid) -> Result<bool> {
        Ok(self
            .no_first_game_created
            .lock()
            .unwrap()
            .contains(&player_ref))
    }

    async fn victories_total(&self, player_ref: Uuid) -> Result<i64> {
        Ok(self
            .victories
            .lock()
            .unwrap()
            .get(&player_ref)
            .copied()
            .unwrap_or(0))
    }
}

/// Scripted chain gateway: optional one-shot failures, then deterministic
/// digests; extraction answers come from a per-pattern table.
#[derive(Default)]
pub struct MockChain {
    submit_delay_ms: u64,
    scripted_failures: Mutex<VecDeque<String>>,
    fail_always: Mutex<Option<String>>,
    extracts: Mutex<HashMap<String, String>>,
    pub submitted: Mutex<Vec<MoveCall>>,
    digest_counter: AtomicU64,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submit_delay_ms(mut self, delay: u64) -> Self {
        self.submit_delay_ms = delay;
        self
    }

    /// The next `count` submits fail with `message`, later ones succeed.
    pub fn fail_times(self, count: usize, message: &str) -> Self {
        {
            let mut failures = self.scripted_failures.lock().unwrap();
            for _ in 0..count {
                failures.push_back(message.to_string());
            }
        }
        self
    }

    pub fn fail_always(self, message: &str) -> Self {
        *self.fail_always.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Extraction answer for patterns mentioning `family` ("game"/"badge").
    pub fn with_extract(self, family: &str, object_id: &str) -> Self {
        self.extracts
            .lock()
            .unwrap()
            .insert(family.to_string(), object_id.to_string());
        self
    }

    pub fn submitted_calls(&self) -> Vec<MoveCall> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChainGateway for MockChain {
    async fn submit(&self, call: &MoveCall) -> Result<String> {
        if self.submit_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.submit_delay_ms)).await;
        }
        if let Some(message) = self.fail_always.lock().unwrap().clone() {
            bail!("{}", message);
        }
        if let Some(message) = self.scripted_failures.lock().unwrap().pop_front() {
            bail!("{}", message);
        }

        self.submitted.lock().unwrap().push(call.clone());
        let n = self.digest_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("d{}", n))
    }

    async fn wait_and_extract(&self, _digest: &str, type_pattern: &str) -> Result<Option<String>> {
        let pattern = type_pattern.to_lowercase();
        let extracts = self.extracts.lock().unwrap();
        for (family, object_id) in extracts.iter() {
            if pattern.contains(family) {
                return Ok(Some(object_id.clone()));
            }
        }
        Ok(None)
    }
}

/// Event sink that records everything for assertions.
#[derive(Default)]
pub struct RecordingBus {
    events: Mutex<Vec<OutboundEvent>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<OutboundEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn of_kind(&self, event: &str) -> Vec<OutboundEvent> {
        self.all().into_iter().filter(|e| e.event == event).collect()
    }

    pub fn results_with_status(&self, status: &str) -> Vec<OutboundEvent> {
        self.of_kind(gambit_queue::RESULT)
            .into_iter()
            .filter(|e| e.payload.get("status").and_then(Value::as_str) == Some(status))
            .collect()
    }
}

impl EventBus for RecordingBus {
    fn emit(&self, room: &str, event: &str, payload: Value) {
        self.events.lock().unwrap().push(OutboundEvent {
            room: room.to_string(),
            event: event.to_string(),
            payload,
        });
    }
}
