mod env;
mod global_state;
mod response;
mod routes;
mod utils;

pub use env::ServerEnv;
pub use global_state::GlobalState;
pub use response::{AppError, AppSuccess, GenericResponse};
pub use routes::misc_routes;
pub use utils::setup_tracing;
