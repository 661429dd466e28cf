use anyhow::{anyhow, Result};
use serde_json::{json, Value};

/// Thin JSON-RPC client for the Sui fullnode. Only the handful of methods
/// the gateway needs; everything else stays behind the node.
#[derive(Clone)]
pub struct SuiRpcClient {
    http: reqwest::Client,
    url: String,
}

impl SuiRpcClient {
    pub fn new(url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("rpc transport error for {}: {}", method, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("rpc {} failed with status {}: {}", method, status, text));
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| anyhow!("rpc {} returned invalid json: {}", method, e))?;

        if let Some(error) = envelope.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown rpc error");
            return Err(anyhow!("{}", message));
        }

        envelope
            .get("result")
            .cloned()
            .ok_or_else(|| anyhow!("rpc {} returned no result", method))
    }

    /// Object ids of the sponsor's SUI gas coins.
    pub async fn get_gas_coins(&self, owner: &str) -> Result<Vec<String>> {
        let result = self
            .call(
                "suix_getCoins",
                json!([owner, "0x2::sui::SUI", null, 50]),
            )
            .await?;

        let coins = result
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("suix_getCoins returned no coin data"))?
            .iter()
            .filter_map(|coin| coin.get("coinObjectId").and_then(Value::as_str))
            .map(str::to_string)
            .collect();

        Ok(coins)
    }

    /// Builds transaction bytes for a Move call on the node side, with an
    /// explicit gas payment object and budget. Returns base64 tx bytes.
    #[allow(clippy::too_many_arguments)]
    pub async fn build_move_call(
        &self,
        signer: &str,
        package: &str,
        module: &str,
        function: &str,
        type_args: &[String],
        args: &[Value],
        gas_object: &str,
        gas_budget: u64,
    ) -> Result<String> {
        let result = self
            .call(
                "unsafe_moveCall",
                json!([
                    signer,
                    package,
                    module,
                    function,
                    type_args,
                    args,
                    gas_object,
                    gas_budget.to_string(),
                ]),
            )
            .await?;

        result
            .get("txBytes")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("unsafe_moveCall returned no txBytes"))
    }

    /// Broadcasts signed transaction bytes and returns the full response
    /// with effects, events and object changes populated.
    pub async fn execute(&self, tx_bytes: &str, signature: &str) -> Result<Value> {
        self.call(
            "sui_executeTransactionBlock",
            json!([
                tx_bytes,
                [signature],
                {
                    "showEffects": true,
                    "showEvents": true,
                    "showObjectChanges": true,
                },
                "WaitForLocalExecution",
            ]),
        )
        .await
    }

    /// Fetches a transaction block by digest. `Ok(None)` while the node has
    /// not indexed it yet.
    pub async fn get_transaction(&self, digest: &str) -> Result<Option<Value>> {
        let result = self
            .call(
                "sui_getTransactionBlock",
                json!([
                    digest,
                    {
                        "showEffects": true,
                        "showEvents": true,
                        "showObjectChanges": true,
                    },
                ]),
            )
            .await;

        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.to_string().contains("Could not find") => Ok(None),
            Err(e) => Err(e),
        }
    }
}
