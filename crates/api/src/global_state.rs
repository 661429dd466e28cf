use anyhow::Result;

use gambit_clients::PostgresClient;
use gambit_common::ModuleClient;

#[derive(Clone)]
pub struct GlobalState {
    pub db: PostgresClient,
}

impl GlobalState {
    pub async fn new() -> Result<Self> {
        let db = PostgresClient::setup_connection().await?;
        Ok(Self { db })
    }
}
