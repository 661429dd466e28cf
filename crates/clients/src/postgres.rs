use std::sync::Arc;

use gambit_common::define_module_client;
use sqlx::PgPool;

static POOL: tokio::sync::OnceCell<PgPool> = tokio::sync::OnceCell::const_new();

pub async fn connect() -> &'static PgPool {
    POOL.get_or_init(|| async {
        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL environment variable not set");

        PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to default database")
    })
    .await
}

define_module_client! {
    (struct PostgresClient, "postgres")
    client_type: Arc<&'static PgPool>,
    env: ["DATABASE_URL"],
    setup: async {
        Arc::new(connect().await)
    }
}
