use anyhow::{anyhow, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardCheck {
    /// Played at least one game.
    FirstGame,
    /// Created at least one game.
    FirstGameCreated,
    /// Total victories reached the tier threshold.
    Wins,
}

/// The reward kind a client may request; the tiered `wins` family shares
/// one logical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardKind {
    FirstGame,
    FirstGameCreated,
    Wins,
}

impl std::str::FromStr for RewardKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "first_game" => Ok(RewardKind::FirstGame),
            "first_game_created" => Ok(RewardKind::FirstGameCreated),
            "wins" => Ok(RewardKind::Wins),
            other => Err(anyhow!("unknown reward kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RewardSpec {
    pub check: RewardCheck,
    pub threshold: i64,
    pub badge_type: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub source_url: &'static str,
}

/// Build-time reward catalog. Tier order within the `wins` family matters:
/// eligibility picks the first unearned row in this order.
pub const REWARD_CATALOG: &[RewardSpec] = &[
    RewardSpec {
        check: RewardCheck::FirstGame,
        threshold: 1,
        badge_type: "first_game",
        name: "First Game",
        description: "Played a first game on-chain",
        source_url: "https://badges.gambit.gg/first_game.png",
    },
    RewardSpec {
        check: RewardCheck::FirstGameCreated,
        threshold: 1,
        badge_type: "first_game_created",
        name: "Game Creator",
        description: "Created a first game on-chain",
        source_url: "https://badges.gambit.gg/first_game_created.png",
    },
    RewardSpec {
        check: RewardCheck::Wins,
        threshold: 1,
        badge_type: "first_win",
        name: "First Win",
        description: "Won a first game",
        source_url: "https://badges.gambit.gg/first_win.png",
    },
    RewardSpec {
        check: RewardCheck::Wins,
        threshold: 10,
        badge_type: "ten_wins",
        name: "Ten Wins",
        description: "Won ten games",
        source_url: "https://badges.gambit.gg/ten_wins.png",
    },
    RewardSpec {
        check: RewardCheck::Wins,
        threshold: 50,
        badge_type: "fifty_wins",
        name: "Fifty Wins",
        description: "Won fifty games",
        source_url: "https://badges.gambit.gg/fifty_wins.png",
    },
    RewardSpec {
        check: RewardCheck::Wins,
        threshold: 100,
        badge_type: "hundred_wins",
        name: "Century",
        description: "Won one hundred games",
        source_url: "https://badges.gambit.gg/hundred_wins.png",
    },
];

pub fn catalog_entry(badge_type: &str) -> Option<&'static RewardSpec> {
    REWARD_CATALOG.iter().find(|s| s.badge_type == badge_type)
}
