mod env;
mod gateway;
mod rpc;
mod wallet;

pub use env::SuiEnv;
pub use gateway::{
    create_game_call, end_game_call, make_move_call, mint_badge_call, set_authorized_minter_call,
    ChainGateway, MoveCall, SuiGateway,
};
pub use rpc::SuiRpcClient;
pub use wallet::SponsorWallet;
