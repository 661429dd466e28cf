use std::sync::Arc;

use anyhow::{bail, Result};

use gambit_chain::{
    create_game_call, end_game_call, make_move_call, mint_badge_call, ChainGateway,
};

use crate::catalog::catalog_entry;
use crate::events::{self, EventBus};
use crate::intent::{Intent, IntentPayload, MintBadgePayload};
use crate::store::Store;

const GAME_TYPE_PATTERN: &str = "::game::Game";
const BADGE_TYPE_PATTERN: &str = "badge::Badge";

/// Runs a single claimed intent through submit / extract / reconcile and
/// emits the success event. Failures bubble up to the dispatcher, which
/// owns retry and user-facing error policy.
pub struct IntentProcessor<S, C, B> {
    store: Arc<S>,
    chain: Arc<C>,
    bus: Arc<B>,
    package_id: String,
    registry_id: String,
}

impl<S, C, B> IntentProcessor<S, C, B>
where
    S: Store,
    C: ChainGateway,
    B: EventBus,
{
    pub fn new(
        store: Arc<S>,
        chain: Arc<C>,
        bus: Arc<B>,
        package_id: String,
        registry_id: String,
    ) -> Self {
        Self {
            store,
            chain,
            bus,
            package_id,
            registry_id,
        }
    }

    pub async fn run(&self, intent: &Intent) -> Result<()> {
        match intent.parsed_payload()? {
            IntentPayload::CreateGame(payload) => {
                let call = create_game_call(
                    &self.package_id,
                    payload.mode.into(),
                    payload.difficulty.into(),
                );
                let digest = self.chain.submit(&call).await?;
                let object_id = self.chain.wait_and_extract(&digest, GAME_TYPE_PATTERN).await?;

                if let (Some(object_id), Some(game_ref)) = (&object_id, intent.game_ref) {
                    self.reconcile_created_game(game_ref, object_id).await;
                }

                self.emit_success(intent, &digest, object_id.as_deref());
            }
            IntentPayload::MakeMove(payload) => {
                if payload.game_object_id.is_empty() {
                    bail!("move for intent {} has no game object id", intent.id);
                }
                let call = make_move_call(
                    &self.package_id,
                    &payload.game_object_id,
                    payload.is_computer,
                    &payload.san,
                    &payload.fen,
                    &payload.move_hash,
                );
                let digest = self.chain.submit(&call).await?;
                self.emit_success(intent, &digest, None);
            }
            IntentPayload::EndGame(payload) => {
                let call = end_game_call(
                    &self.package_id,
                    &payload.game_object_id,
                    payload.winner.as_deref(),
                    payload.result.as_str(),
                    &payload.final_fen,
                );
                let digest = self.chain.submit(&call).await?;
                self.emit_success(intent, &digest, None);
            }
            IntentPayload::MintBadge(payload) => {
                let registry = payload
                    .registry_object_id
                    .as_deref()
                    .unwrap_or(&self.registry_id);
                let call = mint_badge_call(
                    &self.package_id,
                    registry,
                    &payload.recipient_address,
                    &payload.badge_type,
                    &payload.name,
                    &payload.description,
                    &payload.source_url,
                );
                let digest = self.chain.submit(&call).await?;
                let object_id = self
                    .chain
                    .wait_and_extract(&digest, BADGE_TYPE_PATTERN)
                    .await?;

                if let (Some(object_id), Some(player_ref)) = (&object_id, intent.player_ref) {
                    // The mint already landed on-chain; a reconciliation
                    // failure must not fail the intent.
                    if let Err(e) = self
                        .store
                        .upsert_reward(player_ref, &payload.badge_type, object_id)
                        .await
                    {
                        tracing::error!(
                            "[IntentProcessor::run] reward upsert failed for {}: {:?}",
                            intent.id,
                            e
                        );
                    }
                }

                self.emit_mint_success(intent, &payload, &digest, object_id.as_deref());
            }
        }

        Ok(())
    }

    /// Writes the extracted object id back to the game row and releases
    /// every intent parked on it. Both writes are post-submit
    /// reconciliation: log and continue on failure.
    async fn reconcile_created_game(&self, game_ref: sqlx::types::Uuid, object_id: &str) {
        if let Err(e) = self.store.set_game_object_id(game_ref, object_id).await {
            tracing::error!(
                "[IntentProcessor::reconcile_created_game] object id write failed for game {}: {:?}",
                game_ref,
                e
            );
        }

        match self.store.list_waiting_for_game(game_ref).await {
            Ok(waiting) => {
                for parked in waiting {
                    if let Err(e) = self.store.unblock_waiting(&parked.id, object_id).await {
                        tracing::error!(
                            "[IntentProcessor::reconcile_created_game] unblock failed for {}: {:?}",
                            parked.id,
                            e
                        );
                    }
                }
            }
            Err(e) => {
                tracing::error!(
                    "[IntentProcessor::reconcile_created_game] waiting scan failed for game {}: {:?}",
                    game_ref,
                    e
                );
            }
        }
    }

    fn emit_success(&self, intent: &Intent, digest: &str, object_id: Option<&str>) {
        if let Some(actor) = &intent.actor {
            self.bus.emit(
                &events::player_room(actor),
                events::RESULT,
                events::result_success_payload(&intent.id, digest, object_id),
            );
        }
    }

    fn emit_mint_success(
        &self,
        intent: &Intent,
        payload: &MintBadgePayload,
        digest: &str,
        object_id: Option<&str>,
    ) {
        let reward_name = catalog_entry(&payload.badge_type)
            .map(|spec| spec.name)
            .unwrap_or(payload.name.as_str());

        if let Some(actor) = &intent.actor {
            self.bus.emit(
                &events::player_room(actor),
                events::RESULT,
                events::result_success_mint_payload(
                    &intent.id,
                    digest,
                    object_id,
                    reward_name,
                    &payload.badge_type,
                ),
            );
        }
    }
}
