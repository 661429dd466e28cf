use anyhow::Result;

use crate::catalog::{RewardCheck, RewardKind, RewardSpec, REWARD_CATALOG};
use crate::store::Store;

/// Decides whether `actor` should be issued a badge of the requested kind,
/// and which one. Read-only: deduplication against the queue is intake's
/// job.
pub async fn decide<S: Store + ?Sized>(
    store: &S,
    actor: &str,
    kind: RewardKind,
) -> Result<Option<&'static RewardSpec>> {
    let Some(player_ref) = store.resolve_player(actor).await? else {
        return Ok(None);
    };

    match kind {
        RewardKind::FirstGame => {
            let Some(spec) = catalog_row(RewardCheck::FirstGame) else {
                return Ok(None);
            };
            if !store.no_first_game(player_ref).await? {
                return Ok(None);
            }
            if store.reward_exists(player_ref, spec.badge_type).await? {
                return Ok(None);
            }
            Ok(Some(spec))
        }
        RewardKind::FirstGameCreated => {
            let Some(spec) = catalog_row(RewardCheck::FirstGameCreated) else {
                return Ok(None);
            };
            if !store.no_first_game_created(player_ref).await? {
                return Ok(None);
            }
            if store.reward_exists(player_ref, spec.badge_type).await? {
                return Ok(None);
            }
            Ok(Some(spec))
        }
        RewardKind::Wins => {
            let victories = store.victories_total(player_ref).await?;
            // The first unearned tier in catalog order decides; a win count
            // clearing a later threshold does not skip ahead.
            for spec in REWARD_CATALOG.iter().filter(|s| s.check == RewardCheck::Wins) {
                if store.reward_exists(player_ref, spec.badge_type).await? {
                    continue;
                }
                if victories >= spec.threshold {
                    return Ok(Some(spec));
                }
                return Ok(None);
            }
            Ok(None)
        }
    }
}

fn catalog_row(check: RewardCheck) -> Option<&'static RewardSpec> {
    REWARD_CATALOG.iter().find(|s| s.check == check)
}
