use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use gambit_chain::ChainGateway;

use crate::classify::{backoff_delay_ms, classify, suppressed, ErrorClass};
use crate::events::{self, EventBus};
use crate::intent::{Intent, IntentKind};
use crate::processor::IntentProcessor;
use crate::store::Store;

/// Actors considered per scan, oldest pending work first.
const SCAN_LIMIT: i64 = 100;
const GC_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub processing_interval_ms: u64,
    pub max_retries: i32,
    pub retry_base_delay_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            processing_interval_ms: 1000,
            max_retries: 3,
            retry_base_delay_ms: 5000,
        }
    }
}

/// Scans for actors with pending work and drains each with at most one
/// concurrent worker. Per-actor single-flight is enforced twice: the
/// process-local in-flight set here, and the skip-locked claim in the
/// store for other dispatcher processes.
pub struct Dispatcher<S, C, B> {
    store: Arc<S>,
    processor: Arc<IntentProcessor<S, C, B>>,
    bus: Arc<B>,
    config: DispatcherConfig,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl<S, C, B> Clone for Dispatcher<S, C, B> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            processor: self.processor.clone(),
            bus: self.bus.clone(),
            config: self.config.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

/// Removes the actor from the in-flight set when the worker exits, on the
/// error path included.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<String>>>,
    actor: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        // Poisoning carries no invariant for a marker set; recover so a
        // panicked worker still frees its actor.
        self.set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.actor);
    }
}

impl<S, C, B> Dispatcher<S, C, B>
where
    S: Store,
    C: ChainGateway,
    B: EventBus,
{
    pub fn new(
        store: Arc<S>,
        processor: Arc<IntentProcessor<S, C, B>>,
        bus: Arc<B>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            store,
            processor,
            bus,
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Main loop: runs until the shutdown signal flips, then waits for
    /// in-flight workers to finish their current intent.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut scan = tokio::time::interval(Duration::from_millis(
            self.config.processing_interval_ms,
        ));
        let mut gc = tokio::time::interval(GC_INTERVAL);

        loop {
            tokio::select! {
                _ = scan.tick() => {
                    if let Err(e) = self.scan_once().await {
                        tracing::error!("[Dispatcher::run] scan failed: {:?}", e);
                    }
                }
                _ = gc.tick() => {
                    match self.store.gc_old().await {
                        Ok(deleted) if deleted > 0 => {
                            tracing::info!("[Dispatcher::run] gc removed {} old rows", deleted);
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!("[Dispatcher::run] gc failed: {:?}", e),
                    }
                }
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown too.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("[Dispatcher::run] shutting down, draining in-flight workers");
        while !self
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
        {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// One scheduling pass: spawn a worker for every active actor not
    /// already being drained.
    pub async fn scan_once(&self) -> anyhow::Result<()> {
        let actors = self.store.list_active_actors(SCAN_LIMIT).await?;

        for actor in actors {
            {
                let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
                if !in_flight.insert(actor.clone()) {
                    continue;
                }
            }

            let dispatcher = self.clone();
            tokio::spawn(async move {
                let _guard = InFlightGuard {
                    set: dispatcher.in_flight.clone(),
                    actor: actor.clone(),
                };
                dispatcher.drain_actor(&actor).await;
            });
        }

        Ok(())
    }

    /// Processes the actor's queue strictly in order until it is empty.
    pub async fn drain_actor(&self, actor: &str) {
        loop {
            let intent = match self.store.claim_next(actor).await {
                Ok(Some(intent)) => intent,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("[Dispatcher::drain_actor] claim failed for {}: {:?}", actor, e);
                    break;
                }
            };

            self.bus.emit(
                &events::player_room(actor),
                events::PROCESSING,
                events::processing_payload(&intent.id),
            );

            match self.processor.run(&intent).await {
                Ok(()) => {
                    if let Err(e) = self.store.mark_completed(&intent.id).await {
                        tracing::error!(
                            "[Dispatcher::drain_actor] completion write failed for {}: {:?}",
                            intent.id,
                            e
                        );
                    }
                    // Completed rows are not retained.
                    if let Err(e) = self.store.delete(&intent.id).await {
                        tracing::error!(
                            "[Dispatcher::drain_actor] delete failed for {}: {:?}",
                            intent.id,
                            e
                        );
                    }
                }
                Err(e) => self.handle_failure(actor, &intent, &e).await,
            }
        }
    }

    async fn handle_failure(&self, actor: &str, intent: &Intent, error: &anyhow::Error) {
        let message = error.to_string();
        let class = classify(intent.kind, &message);

        if class == ErrorClass::Authorization {
            tracing::error!(
                "[Dispatcher::handle_failure] mint {} aborted with code 1: the sponsor address \
                 is not the registry's authorized minter; run the set_minter utility",
                intent.id
            );
        }

        if let Err(e) = self.store.increment_retries(&intent.id).await {
            tracing::error!(
                "[Dispatcher::handle_failure] retry increment failed for {}: {:?}",
                intent.id,
                e
            );
        }

        let attempt = intent.retries + 1;
        if attempt >= self.config.max_retries {
            tracing::warn!(
                "[Dispatcher::handle_failure] {} failed after {} attempts: {}",
                intent.id,
                attempt,
                message
            );
            if let Err(e) = self.store.mark_failed(&intent.id, &message).await {
                tracing::error!(
                    "[Dispatcher::handle_failure] failure write failed for {}: {:?}",
                    intent.id,
                    e
                );
            }

            if !suppressed(intent.kind, class) {
                self.bus.emit(
                    &events::player_room(actor),
                    events::RESULT,
                    events::result_error_payload(&intent.id, &message),
                );
            }

            // Failed MintBadge rows stay behind as a paper trail.
            if intent.kind != IntentKind::MintNft {
                if let Err(e) = self.store.delete(&intent.id).await {
                    tracing::error!(
                        "[Dispatcher::handle_failure] delete failed for {}: {:?}",
                        intent.id,
                        e
                    );
                }
            }
        } else {
            if let Err(e) = self.store.requeue_pending(&intent.id, &message).await {
                tracing::error!(
                    "[Dispatcher::handle_failure] requeue failed for {}: {:?}",
                    intent.id,
                    e
                );
            }

            let delay = backoff_delay_ms(
                intent.kind,
                class,
                attempt as u32,
                self.config.retry_base_delay_ms,
            );
            tracing::debug!(
                "[Dispatcher::handle_failure] {} attempt {} backing off {}ms: {}",
                intent.id,
                attempt,
                delay,
                message
            );
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}
