use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Uuid;

use gambit_common::get_current_timestamp_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    CreateGame,
    MakeMove,
    EndGame,
    MintNft,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::CreateGame => "create_game",
            IntentKind::MakeMove => "make_move",
            IntentKind::EndGame => "end_game",
            IntentKind::MintNft => "mint_nft",
        }
    }
}

impl std::str::FromStr for IntentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create_game" => Ok(IntentKind::CreateGame),
            "make_move" => Ok(IntentKind::MakeMove),
            "end_game" => Ok(IntentKind::EndGame),
            "mint_nft" => Ok(IntentKind::MintNft),
            other => Err(anyhow!("unknown intent kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    WaitingForObjectId,
}

impl IntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentStatus::Pending => "pending",
            IntentStatus::Processing => "processing",
            IntentStatus::Completed => "completed",
            IntentStatus::Failed => "failed",
            IntentStatus::WaitingForObjectId => "waiting_for_object_id",
        }
    }
}

impl std::str::FromStr for IntentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(IntentStatus::Pending),
            "processing" => Ok(IntentStatus::Processing),
            "completed" => Ok(IntentStatus::Completed),
            "failed" => Ok(IntentStatus::Failed),
            "waiting_for_object_id" => Ok(IntentStatus::WaitingForObjectId),
            other => Err(anyhow!("unknown intent status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GameMode {
    PlayerVsPlayer,
    PlayerVsComputer,
}

impl TryFrom<u8> for GameMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GameMode::PlayerVsPlayer),
            1 => Ok(GameMode::PlayerVsComputer),
            other => Err(format!("mode must be 0 or 1, got {}", other)),
        }
    }
}

impl From<GameMode> for u8 {
    fn from(mode: GameMode) -> u8 {
        match mode {
            GameMode::PlayerVsPlayer => 0,
            GameMode::PlayerVsComputer => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl TryFrom<u8> for Difficulty {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Difficulty::Easy),
            1 => Ok(Difficulty::Medium),
            2 => Ok(Difficulty::Hard),
            other => Err(format!("difficulty must be 0, 1 or 2, got {}", other)),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(difficulty: Difficulty) -> u8 {
        match difficulty {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    #[serde(rename = "1-0")]
    WhiteWins,
    #[serde(rename = "0-1")]
    BlackWins,
    #[serde(rename = "1/2-1/2")]
    Draw,
}

impl GameResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "1/2-1/2",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGamePayload {
    pub mode: GameMode,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeMovePayload {
    /// Empty until the parent game's on-chain id is known.
    #[serde(default)]
    pub game_object_id: String,
    pub is_computer: bool,
    pub san: String,
    pub fen: String,
    pub move_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndGamePayload {
    pub game_object_id: String,
    pub winner: Option<String>,
    pub result: GameResult,
    pub final_fen: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintBadgePayload {
    pub recipient_address: String,
    pub badge_type: String,
    pub name: String,
    pub description: String,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_object_id: Option<String>,
}

/// Kind-specific payload, persisted as JSONB and validated on read.
#[derive(Debug, Clone)]
pub enum IntentPayload {
    CreateGame(CreateGamePayload),
    MakeMove(MakeMovePayload),
    EndGame(EndGamePayload),
    MintBadge(MintBadgePayload),
}

impl IntentPayload {
    pub fn kind(&self) -> IntentKind {
        match self {
            IntentPayload::CreateGame(_) => IntentKind::CreateGame,
            IntentPayload::MakeMove(_) => IntentKind::MakeMove,
            IntentPayload::EndGame(_) => IntentKind::EndGame,
            IntentPayload::MintBadge(_) => IntentKind::MintNft,
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        let value = match self {
            IntentPayload::CreateGame(p) => serde_json::to_value(p)?,
            IntentPayload::MakeMove(p) => serde_json::to_value(p)?,
            IntentPayload::EndGame(p) => serde_json::to_value(p)?,
            IntentPayload::MintBadge(p) => serde_json::to_value(p)?,
        };
        Ok(value)
    }
}

/// One durable queue row.
#[derive(Debug, Clone)]
pub struct Intent {
    pub id: String,
    pub kind: IntentKind,
    /// May only be absent for system-generated intents.
    pub actor: Option<String>,
    pub game_ref: Option<Uuid>,
    pub player_ref: Option<Uuid>,
    pub status: IntentStatus,
    pub payload: Value,
    pub error: Option<String>,
    pub retries: i32,
    pub created_at: i64,
    pub updated_at: i64,
    pub processed_at: Option<i64>,
}

impl Intent {
    pub fn new(
        id: String,
        actor: Option<String>,
        game_ref: Option<Uuid>,
        player_ref: Option<Uuid>,
        status: IntentStatus,
        payload: &IntentPayload,
    ) -> Result<Self> {
        let now = get_current_timestamp_ms();
        Ok(Self {
            id,
            kind: payload.kind(),
            actor,
            game_ref,
            player_ref,
            status,
            payload: payload.to_value()?,
            error: None,
            retries: 0,
            created_at: now,
            updated_at: now,
            processed_at: None,
        })
    }

    /// Parses the stored JSON back into the kind's typed payload.
    pub fn parsed_payload(&self) -> Result<IntentPayload> {
        let payload = match self.kind {
            IntentKind::CreateGame => {
                IntentPayload::CreateGame(serde_json::from_value(self.payload.clone())?)
            }
            IntentKind::MakeMove => {
                IntentPayload::MakeMove(serde_json::from_value(self.payload.clone())?)
            }
            IntentKind::EndGame => {
                IntentPayload::EndGame(serde_json::from_value(self.payload.clone())?)
            }
            IntentKind::MintNft => {
                IntentPayload::MintBadge(serde_json::from_value(self.payload.clone())?)
            }
        };
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_and_status_roundtrip() {
        for kind in [
            IntentKind::CreateGame,
            IntentKind::MakeMove,
            IntentKind::EndGame,
            IntentKind::MintNft,
        ] {
            assert_eq!(kind.as_str().parse::<IntentKind>().unwrap(), kind);
        }
        for status in [
            IntentStatus::Pending,
            IntentStatus::Processing,
            IntentStatus::Completed,
            IntentStatus::Failed,
            IntentStatus::WaitingForObjectId,
        ] {
            assert_eq!(status.as_str().parse::<IntentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn game_mode_bounds() {
        assert!(serde_json::from_value::<GameMode>(json!(1)).is_ok());
        assert!(serde_json::from_value::<GameMode>(json!(2)).is_err());
        assert!(serde_json::from_value::<Difficulty>(json!(2)).is_ok());
        assert!(serde_json::from_value::<Difficulty>(json!(3)).is_err());
    }

    #[test]
    fn game_result_wire_format() {
        let result: GameResult = serde_json::from_value(json!("1/2-1/2")).unwrap();
        assert_eq!(result, GameResult::Draw);
        assert!(serde_json::from_value::<GameResult>(json!("2-0")).is_err());
    }

    #[test]
    fn payload_roundtrip_by_kind() {
        let payload = IntentPayload::MakeMove(MakeMovePayload {
            game_object_id: String::new(),
            is_computer: false,
            san: "e4".to_string(),
            fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1".to_string(),
            move_hash: "abc".to_string(),
            game_id: None,
        });
        let intent = Intent::new(
            "t1".to_string(),
            Some("0xA".to_string()),
            None,
            None,
            IntentStatus::Pending,
            &payload,
        )
        .unwrap();

        match intent.parsed_payload().unwrap() {
            IntentPayload::MakeMove(p) => {
                assert_eq!(p.san, "e4");
                assert!(p.game_object_id.is_empty());
            }
            other => panic!("wrong payload parsed: {:?}", other),
        }
    }
}
