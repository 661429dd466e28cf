mod common;

use common::MemoryStore;
use gambit_queue::{decide, RewardKind};

const ACTOR: &str = "0xA";

#[tokio::test]
async fn unknown_actor_gets_nothing() {
    let store = MemoryStore::new();
    let spec = decide(&store, ACTOR, RewardKind::FirstGame).await.unwrap();
    assert!(spec.is_none());
}

#[tokio::test]
async fn first_game_requires_the_view_and_no_prior_grant() {
    let store = MemoryStore::new();
    let player = store.add_player(ACTOR);

    // Not in the view: already played before the badge program existed.
    assert!(decide(&store, ACTOR, RewardKind::FirstGame).await.unwrap().is_none());

    store.mark_no_first_game(player);
    let spec = decide(&store, ACTOR, RewardKind::FirstGame).await.unwrap().unwrap();
    assert_eq!(spec.badge_type, "first_game");

    store.grant_reward(player, "first_game");
    assert!(decide(&store, ACTOR, RewardKind::FirstGame).await.unwrap().is_none());
}

#[tokio::test]
async fn first_game_created_is_independent_of_first_game() {
    let store = MemoryStore::new();
    let player = store.add_player(ACTOR);
    store.mark_no_first_game_created(player);

    let spec = decide(&store, ACTOR, RewardKind::FirstGameCreated)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(spec.badge_type, "first_game_created");
}

#[tokio::test]
async fn wins_walks_tiers_in_catalog_order() {
    let store = MemoryStore::new();
    let player = store.add_player(ACTOR);

    store.set_victories(player, 0);
    assert!(decide(&store, ACTOR, RewardKind::Wins).await.unwrap().is_none());

    store.set_victories(player, 1);
    let spec = decide(&store, ACTOR, RewardKind::Wins).await.unwrap().unwrap();
    assert_eq!(spec.badge_type, "first_win");

    // Tier one granted: the next unearned tier decides.
    store.grant_reward(player, "first_win");
    store.set_victories(player, 10);
    let spec = decide(&store, ACTOR, RewardKind::Wins).await.unwrap().unwrap();
    assert_eq!(spec.badge_type, "ten_wins");

    // Under its threshold, nothing is owed even though tier one is long past.
    store.set_victories(player, 5);
    assert!(decide(&store, ACTOR, RewardKind::Wins).await.unwrap().is_none());
}

#[tokio::test]
async fn wins_never_skips_an_unearned_tier() {
    let store = MemoryStore::new();
    let player = store.add_player(ACTOR);

    // A hundred victories with no badges still starts at the bottom tier.
    store.set_victories(player, 100);
    let spec = decide(&store, ACTOR, RewardKind::Wins).await.unwrap().unwrap();
    assert_eq!(spec.badge_type, "first_win");
}

#[tokio::test]
async fn wins_exhausted_catalog_yields_nothing() {
    let store = MemoryStore::new();
    let player = store.add_player(ACTOR);
    store.set_victories(player, 1000);
    for badge in ["first_win", "ten_wins", "fifty_wins", "hundred_wins"] {
        store.grant_reward(player, badge);
    }

    assert!(decide(&store, ACTOR, RewardKind::Wins).await.unwrap().is_none());
}
