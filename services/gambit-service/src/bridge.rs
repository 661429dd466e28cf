use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use gambit_queue::{ChannelEventBus, Intake, IntentKind, OutboundEvent, PgStore, RewardRequest};

/// What the realtime transport forwards into the queue: one event per
/// client intent kind, plus the server-side reward path.
pub enum InboundIntent {
    Transaction { kind: IntentKind, raw: Value },
    Reward(RewardRequest),
}

/// The seam for the realtime layer. It owns both directions: client
/// events come in through the returned sender, and everything the queue
/// emits leaves through the outbound receiver into the actors' rooms.
pub fn spawn_transport_bridge(
    intake: Arc<Intake<PgStore, ChannelEventBus>>,
    mut outbound_rx: mpsc::UnboundedReceiver<OutboundEvent>,
) -> mpsc::UnboundedSender<InboundIntent> {
    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                inbound = inbound_rx.recv() => {
                    let Some(inbound) = inbound else { break };
                    match inbound {
                        InboundIntent::Transaction { kind, raw } => {
                            if let Err(e) = intake.accept(kind, raw).await {
                                tracing::warn!("[TransportBridge] intent rejected: {:?}", e);
                            }
                        }
                        InboundIntent::Reward(request) => {
                            if let Err(e) = intake.request_reward(request).await {
                                tracing::warn!("[TransportBridge] reward request failed: {:?}", e);
                            }
                        }
                    }
                }
                outbound = outbound_rx.recv() => {
                    let Some(outbound) = outbound else { break };
                    tracing::debug!(
                        "[TransportBridge] {} -> {}: {}",
                        outbound.event,
                        outbound.room,
                        outbound.payload
                    );
                }
            }
        }
    });

    inbound_tx
}
