use std::env;

use gambit_common::EnvVars;

pub const DEFAULT_GAS_BUDGET: u64 = 100_000_000;

pub struct SuiEnv {
    pub network: String,
    pub rpc_url_override: Option<String>,
    pub package_id: String,
    pub registry_id: String,
    pub sponsor_secret: String,
    pub sponsor_address: Option<String>,
    pub gas_budget: u64,
}

impl EnvVars for SuiEnv {
    fn load() -> Self {
        Self {
            network: env::var("SUI_NETWORK").unwrap_or_else(|_| "testnet".to_string()),
            rpc_url_override: env::var("SUI_RPC_URL").ok(),
            package_id: env::var("SUI_PACKAGE_ID").unwrap(),
            registry_id: env::var("SUI_REGISTRY_ID").unwrap(),
            sponsor_secret: env::var("SPONSOR_SECRET").unwrap(),
            sponsor_address: env::var("SPONSOR_ADDRESS").ok(),
            gas_budget: env::var("SUI_GAS_BUDGET")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_GAS_BUDGET),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "SUI_NETWORK" => self.network.clone(),
            "SUI_PACKAGE_ID" => self.package_id.clone(),
            "SUI_REGISTRY_ID" => self.registry_id.clone(),
            "SPONSOR_SECRET" => self.sponsor_secret.clone(),
            _ => panic!("Invalid environment variable: {}", key),
        }
    }
}

impl SuiEnv {
    pub fn rpc_url(&self) -> String {
        if let Some(url) = &self.rpc_url_override {
            return url.clone();
        }
        match self.network.as_str() {
            "mainnet" => "https://fullnode.mainnet.sui.io:443".to_string(),
            "testnet" => "https://fullnode.testnet.sui.io:443".to_string(),
            "devnet" => "https://fullnode.devnet.sui.io:443".to_string(),
            "localnet" => "http://127.0.0.1:9000".to_string(),
            other => panic!("Unknown SUI_NETWORK: {}", other),
        }
    }
}
