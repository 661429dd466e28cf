use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use serde::Deserialize;
use serde_json::Value;
use sqlx::types::Uuid;

use crate::catalog::RewardKind;
use crate::eligibility::decide;
use crate::events::{self, EventBus};
use crate::intent::{
    CreateGamePayload, EndGamePayload, Intent, IntentKind, IntentPayload, IntentStatus,
    MakeMovePayload, MintBadgePayload,
};
use crate::store::Store;

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub transaction_id: String,
    pub game_id: Uuid,
    pub player_address: String,
    pub data: CreateGamePayload,
}

#[derive(Debug, Deserialize)]
pub struct MakeMoveRequest {
    pub transaction_id: String,
    pub player_address: String,
    /// "waiting_for_object_id" when the parent game is not on-chain yet.
    #[serde(default)]
    pub status: Option<String>,
    pub data: MakeMovePayload,
}

#[derive(Debug, Deserialize)]
pub struct EndGameRequest {
    pub transaction_id: String,
    pub player_address: String,
    pub data: EndGamePayload,
}

#[derive(Debug, Deserialize)]
pub struct MintBadgeRequest {
    pub transaction_id: String,
    pub player_address: String,
    pub player_id: Uuid,
    pub data: MintBadgePayload,
}

/// The `nftMint` server-side reward path.
#[derive(Debug, Deserialize)]
pub struct RewardRequest {
    pub player_id: Uuid,
    pub player_sui_address: String,
    pub reward_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub intent_id: String,
    pub status: IntentStatus,
}

/// Validates, deduplicates and persists client intents, and answers with
/// queue events. Everything enters the store through here.
pub struct Intake<S, B> {
    store: Arc<S>,
    bus: Arc<B>,
}

impl<S, B> Intake<S, B>
where
    S: Store,
    B: EventBus,
{
    pub fn new(store: Arc<S>, bus: Arc<B>) -> Self {
        Self { store, bus }
    }

    /// Accepts one raw client intent. `Ok(None)` means a duplicate reward
    /// was silently dropped; a validation failure is answered with an
    /// `error` event and returned to the caller.
    pub async fn accept(&self, kind: IntentKind, raw: Value) -> Result<Option<Accepted>> {
        match self.try_accept(kind, &raw).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if let Some(actor) = raw.get("player_address").and_then(Value::as_str) {
                    let transaction_id = raw.get("transaction_id").and_then(Value::as_str);
                    self.bus.emit(
                        &events::player_room(actor),
                        events::ERROR,
                        events::error_payload(&e.to_string(), transaction_id),
                    );
                }
                Err(e)
            }
        }
    }

    async fn try_accept(&self, kind: IntentKind, raw: &Value) -> Result<Option<Accepted>> {
        match kind {
            IntentKind::CreateGame => {
                let request: CreateGameRequest = parse(raw)?;
                let intent = Intent::new(
                    request.transaction_id,
                    Some(request.player_address),
                    Some(request.game_id),
                    None,
                    IntentStatus::Pending,
                    &IntentPayload::CreateGame(request.data),
                )?;
                self.insert_and_announce(intent).await.map(Some)
            }
            IntentKind::MakeMove => {
                let request: MakeMoveRequest = parse(raw)?;
                let waiting = request.status.as_deref() == Some("waiting_for_object_id");

                // Inserted directly in the terminal intended status; the
                // old insert-then-update dance left a claimable window.
                let status = if waiting {
                    if request.data.game_id.is_none() {
                        bail!("a waiting move must reference its game");
                    }
                    IntentStatus::WaitingForObjectId
                } else {
                    if request.data.game_object_id.is_empty() {
                        bail!("game_object_id is required for a move on a live game");
                    }
                    IntentStatus::Pending
                };

                let game_ref = request.data.game_id;
                let intent = Intent::new(
                    request.transaction_id,
                    Some(request.player_address),
                    game_ref,
                    None,
                    status,
                    &IntentPayload::MakeMove(request.data),
                )?;
                self.insert_and_announce(intent).await.map(Some)
            }
            IntentKind::EndGame => {
                let request: EndGameRequest = parse(raw)?;
                if request.data.game_object_id.is_empty() {
                    bail!("game_object_id is required to end a game");
                }
                let intent = Intent::new(
                    request.transaction_id,
                    Some(request.player_address),
                    None,
                    None,
                    IntentStatus::Pending,
                    &IntentPayload::EndGame(request.data),
                )?;
                self.insert_and_announce(intent).await.map(Some)
            }
            IntentKind::MintNft => {
                let request: MintBadgeRequest = parse(raw)?;
                url::Url::parse(&request.data.source_url)
                    .map_err(|_| anyhow!("source_url is not a valid URL"))?;

                let duplicate = self
                    .store
                    .reward_intent_exists(
                        &request.player_address,
                        request.player_id,
                        &request.data.badge_type,
                    )
                    .await?;
                if duplicate {
                    tracing::info!(
                        "[Intake::accept] duplicate {} mint for {} dropped",
                        request.data.badge_type,
                        request.player_address
                    );
                    return Ok(None);
                }

                let intent = Intent::new(
                    request.transaction_id,
                    Some(request.player_address),
                    None,
                    Some(request.player_id),
                    IntentStatus::Pending,
                    &IntentPayload::MintBadge(request.data),
                )?;
                self.insert_and_announce(intent).await.map(Some)
            }
        }
    }

    async fn insert_and_announce(&self, intent: Intent) -> Result<Accepted> {
        self.store.enqueue(&intent).await?;

        if let Some(actor) = &intent.actor {
            self.bus.emit(
                &events::player_room(actor),
                events::QUEUED,
                events::queued_payload(&intent.id, intent.status),
            );
        }

        Ok(Accepted {
            intent_id: intent.id,
            status: intent.status,
        })
    }

    /// Server-side reward path: verify the player, let eligibility choose
    /// the badge, check the queue, then synthesize the mint intent from
    /// the catalog row. `Ok(None)` when nothing is owed.
    pub async fn request_reward(&self, request: RewardRequest) -> Result<Option<Accepted>> {
        let actor = &request.player_sui_address;

        let Some(player_ref) = self.store.resolve_player(actor).await? else {
            bail!("no player found for address {}", actor);
        };

        let kind: RewardKind = request.reward_type.parse()?;
        let Some(spec) = decide(self.store.as_ref(), actor, kind).await? else {
            tracing::debug!(
                "[Intake::request_reward] {} not eligible for {}",
                actor,
                request.reward_type
            );
            return Ok(None);
        };

        if self
            .store
            .reward_intent_exists(actor, player_ref, spec.badge_type)
            .await?
        {
            tracing::info!(
                "[Intake::request_reward] {} mint already queued for {}",
                spec.badge_type,
                actor
            );
            return Ok(None);
        }

        let payload = MintBadgePayload {
            recipient_address: actor.clone(),
            badge_type: spec.badge_type.to_string(),
            name: spec.name.to_string(),
            description: spec.description.to_string(),
            source_url: spec.source_url.to_string(),
            registry_object_id: None,
        };
        let intent = Intent::new(
            format!("mint_{}", Uuid::new_v4()),
            Some(actor.clone()),
            None,
            Some(player_ref),
            IntentStatus::Pending,
            &IntentPayload::MintBadge(payload),
        )?;
        self.store.enqueue(&intent).await?;

        self.bus.emit(
            &events::player_room(actor),
            events::MINT_TASK_QUEUED,
            events::mint_task_queued_payload(&intent.id, spec.badge_type, player_ref, actor),
        );

        Ok(Some(Accepted {
            intent_id: intent.id,
            status: IntentStatus::Pending,
        }))
    }
}

fn parse<'a, T: Deserialize<'a>>(raw: &'a Value) -> Result<T> {
    T::deserialize(raw).map_err(|e| anyhow!("invalid intent payload: {}", e))
}
