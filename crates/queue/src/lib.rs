mod catalog;
mod classify;
mod dispatcher;
mod eligibility;
mod env;
mod events;
mod intake;
mod intent;
mod processor;
mod store;

pub use catalog::{catalog_entry, RewardCheck, RewardKind, RewardSpec, REWARD_CATALOG};
pub use classify::{backoff_delay_ms, classify, suppressed, ErrorClass};
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use eligibility::decide;
pub use env::QueueEnv;
pub use events::{
    ChannelEventBus, EventBus, OutboundEvent, ERROR, MINT_TASK_QUEUED, PROCESSING, QUEUED, RESULT,
};
pub use intake::{
    Accepted, CreateGameRequest, EndGameRequest, Intake, MakeMoveRequest, MintBadgeRequest,
    RewardRequest,
};
pub use intent::{
    CreateGamePayload, Difficulty, EndGamePayload, GameMode, GameResult, Intent, IntentKind,
    IntentPayload, IntentStatus, MakeMovePayload, MintBadgePayload,
};
pub use processor::IntentProcessor;
pub use store::{PgStore, Store};

pub use events::{
    error_payload, mint_task_queued_payload, player_room, processing_payload, queued_payload,
    result_error_payload, result_success_mint_payload, result_success_payload,
};
