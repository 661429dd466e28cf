use anyhow::{anyhow, bail, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};

use gambit_common::EnvVars;

use crate::env::SuiEnv;
use crate::rpc::SuiRpcClient;
use crate::wallet::{check_sponsor_address, SponsorWallet};

const EXTRACT_ATTEMPTS: u32 = 15;
const EXTRACT_INTERVAL_MS: u64 = 1000;

/// Shared clock object, an argument to every game entry function.
const CLOCK_OBJECT_ID: &str = "0x6";

/// A fully resolved Move call, ready to be turned into transaction bytes.
#[derive(Debug, Clone)]
pub struct MoveCall {
    pub package: String,
    pub module: String,
    pub function: String,
    pub type_args: Vec<String>,
    pub args: Vec<Value>,
}

pub fn create_game_call(package_id: &str, mode: u8, difficulty: u8) -> MoveCall {
    MoveCall {
        package: package_id.to_string(),
        module: "game".to_string(),
        function: "create_game".to_string(),
        type_args: vec![],
        args: vec![json!(mode), json!(difficulty), json!(CLOCK_OBJECT_ID)],
    }
}

pub fn make_move_call(
    package_id: &str,
    game_object_id: &str,
    is_computer: bool,
    san: &str,
    fen: &str,
    move_hash: &str,
) -> MoveCall {
    MoveCall {
        package: package_id.to_string(),
        module: "game".to_string(),
        function: "make_move".to_string(),
        type_args: vec![],
        args: vec![
            json!(game_object_id),
            json!(is_computer),
            json!(san),
            json!(fen),
            json!(move_hash),
            json!(CLOCK_OBJECT_ID),
        ],
    }
}

pub fn end_game_call(
    package_id: &str,
    game_object_id: &str,
    winner: Option<&str>,
    result: &str,
    final_fen: &str,
) -> MoveCall {
    // Option<address> travels as a zero- or one-element vector.
    let winner_arg = match winner {
        Some(address) => json!([address]),
        None => json!([]),
    };
    MoveCall {
        package: package_id.to_string(),
        module: "game".to_string(),
        function: "end_game".to_string(),
        type_args: vec![],
        args: vec![
            json!(game_object_id),
            winner_arg,
            json!(result),
            json!(final_fen),
            json!(CLOCK_OBJECT_ID),
        ],
    }
}

#[allow(clippy::too_many_arguments)]
pub fn mint_badge_call(
    package_id: &str,
    registry_object_id: &str,
    recipient: &str,
    badge_type: &str,
    name: &str,
    description: &str,
    source_url: &str,
) -> MoveCall {
    MoveCall {
        package: package_id.to_string(),
        module: "badge".to_string(),
        function: "mint_badge".to_string(),
        type_args: vec![],
        args: vec![
            json!(registry_object_id),
            json!(recipient),
            json!(badge_type),
            json!(name),
            json!(description),
            json!(source_url),
        ],
    }
}

/// Administrative call used only by the out-of-band repair utility.
pub fn set_authorized_minter_call(
    package_id: &str,
    registry_object_id: &str,
    new_minter: &str,
) -> MoveCall {
    MoveCall {
        package: package_id.to_string(),
        module: "badge".to_string(),
        function: "set_authorized_minter".to_string(),
        type_args: vec![],
        args: vec![json!(registry_object_id), json!(new_minter)],
    }
}

/// The named interface the intent processor talks to. Production code uses
/// [`SuiGateway`]; tests substitute their own implementation.
#[async_trait::async_trait]
pub trait ChainGateway: Send + Sync + 'static {
    /// Signs, pays for and broadcasts the call. Returns the digest.
    async fn submit(&self, call: &MoveCall) -> Result<String>;

    /// Polls until the transaction's effects are readable and extracts the
    /// id of the newly created object matching `type_pattern`.
    async fn wait_and_extract(&self, digest: &str, type_pattern: &str) -> Result<Option<String>>;
}

pub struct SuiGateway {
    rpc: SuiRpcClient,
    wallet: SponsorWallet,
    sponsor_address: String,
    gas_budget: u64,
}

impl SuiGateway {
    pub fn new(env: &SuiEnv) -> Result<Self> {
        let wallet = SponsorWallet::from_secret(&env.sponsor_secret)?;
        if let Some(configured) = &env.sponsor_address {
            check_sponsor_address(&wallet, configured)?;
        }
        let sponsor_address = wallet.address();
        tracing::info!("[SuiGateway::new] sponsor address {}", sponsor_address);

        Ok(Self {
            rpc: SuiRpcClient::new(env.rpc_url()),
            wallet,
            sponsor_address,
            gas_budget: env.gas_budget,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(&SuiEnv::load())
    }

    pub fn sponsor_address(&self) -> &str {
        &self.sponsor_address
    }
}

#[async_trait::async_trait]
impl ChainGateway for SuiGateway {
    async fn submit(&self, call: &MoveCall) -> Result<String> {
        let coins = self.rpc.get_gas_coins(&self.sponsor_address).await?;
        let gas_object = coins
            .first()
            .ok_or_else(|| anyhow!("sponsor {} has no gas coins", self.sponsor_address))?;

        let tx_bytes = self
            .rpc
            .build_move_call(
                &self.sponsor_address,
                &call.package,
                &call.module,
                &call.function,
                &call.type_args,
                &call.args,
                gas_object,
                self.gas_budget,
            )
            .await?;

        let raw_tx = BASE64
            .decode(&tx_bytes)
            .map_err(|e| anyhow!("node returned invalid tx bytes: {}", e))?;
        let signature = self.wallet.sign_tx(&raw_tx);

        let response = self.rpc.execute(&tx_bytes, &signature).await?;

        let status = response["effects"]["status"]["status"]
            .as_str()
            .unwrap_or("unknown");
        if status != "success" {
            let error = response["effects"]["status"]["error"]
                .as_str()
                .unwrap_or("execution failed with no error message");
            bail!("{}", error);
        }

        let digest = response["digest"]
            .as_str()
            .ok_or_else(|| anyhow!("execution response carried no digest"))?
            .to_string();

        tracing::debug!(
            "[SuiGateway::submit] {}::{} -> {}",
            call.module,
            call.function,
            digest
        );
        Ok(digest)
    }

    async fn wait_and_extract(&self, digest: &str, type_pattern: &str) -> Result<Option<String>> {
        for attempt in 0..EXTRACT_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(EXTRACT_INTERVAL_MS)).await;
            }

            match self.rpc.get_transaction(digest).await {
                Ok(Some(tx)) => {
                    if let Some(object_id) = extract_created_object(&tx, type_pattern) {
                        return Ok(Some(object_id));
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        "[SuiGateway::wait_and_extract] poll {} for {} failed: {}",
                        attempt + 1,
                        digest,
                        e
                    );
                }
            }
        }

        tracing::warn!(
            "[SuiGateway::wait_and_extract] no object matching {} in effects of {}",
            type_pattern,
            digest
        );
        Ok(None)
    }
}

/// Locates the id of a created object whose type matches `type_pattern`,
/// falling back to the module's creation events.
pub fn extract_created_object(tx: &Value, type_pattern: &str) -> Option<String> {
    let pattern = type_pattern.to_lowercase();

    if let Some(changes) = tx.get("objectChanges").and_then(Value::as_array) {
        for change in changes {
            if change.get("type").and_then(Value::as_str) != Some("created") {
                continue;
            }
            let Some(object_type) = change.get("objectType").and_then(Value::as_str) else {
                continue;
            };
            let object_type_lower = object_type.to_lowercase();

            let matched = object_type_lower.contains(&pattern)
                || object_type_lower.ends_with(&pattern)
                || (pattern.contains("game") && object_type_lower.contains("game"))
                || (pattern.contains("badge") && object_type_lower.contains("badge"));

            if matched {
                if let Some(object_id) = change.get("objectId").and_then(Value::as_str) {
                    return Some(object_id.to_string());
                }
            }
        }
    }

    let events = tx.get("events").and_then(Value::as_array);
    if let Some(events) = events {
        if pattern.contains("game") {
            for event in events {
                let is_created = event
                    .get("type")
                    .and_then(Value::as_str)
                    .is_some_and(|t| t.ends_with("GameCreated"));
                if is_created {
                    if let Some(game_id) = event["parsedJson"]["game_id"].as_str() {
                        return Some(game_id.to_string());
                    }
                }
            }
        }
        if pattern.contains("badge") {
            for event in events {
                let is_minted = event
                    .get("type")
                    .and_then(Value::as_str)
                    .is_some_and(|t| t.ends_with("BadgeMinted"));
                if is_minted {
                    if let Some(badge_id) = event["parsedJson"]["badge_id"].as_str() {
                        return Some(badge_id.to_string());
                    }
                }
            }
        }
    }

    None
}
