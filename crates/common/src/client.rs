use anyhow::Result;

/// A process-wide client for one external module (database, caches, ...).
/// Construction validates the module's environment up front and fails with
/// an error instead of panicking, so callers decide how startup failures
/// surface.
#[async_trait::async_trait]
pub trait ModuleClient: Clone + Send + Sync + 'static {
    const NAME: &'static str;
    type Client;

    async fn setup_connection() -> Result<Self>;

    fn get_client(&self) -> &Self::Client;
}

#[macro_export]
macro_rules! define_module_client {
    {
        (struct $struct_name:ident, $client_name:expr)
        client_type: $client_type:ty,
        env: [ $( $env_var:literal ),* ],
        setup: $setup_logic:expr
    } => {
        #[derive(Clone)]
        pub struct $struct_name {
            client: std::sync::Arc<$client_type>,
        }

        #[async_trait::async_trait]
        impl ::gambit_common::ModuleClient for $struct_name {
            const NAME: &'static str = $client_name;
            type Client = std::sync::Arc<$client_type>;

            async fn setup_connection() -> ::anyhow::Result<Self> {
                const ENV_VARS: &[&str] = &[ $( $env_var ),* ];
                let missing: Vec<&str> = ENV_VARS
                    .iter()
                    .copied()
                    .filter(|var| std::env::var(var).is_err())
                    .collect();
                if !missing.is_empty() {
                    ::anyhow::bail!(
                        "[Client: {}] required environment variables are not set: [{}]",
                        $client_name,
                        missing.join(", ")
                    );
                }

                let client_instance = $setup_logic.await;
                Ok(Self {
                    client: std::sync::Arc::new(client_instance),
                })
            }

            fn get_client(&self) -> &Self::Client {
                &self.client
            }
        }
    }
}
