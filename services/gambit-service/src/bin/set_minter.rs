//! Out-of-band repair utility: points the badge registry's authorized
//! minter at a (usually rotated) sponsor address.

use anyhow::{anyhow, Result};

use gambit_chain::{set_authorized_minter_call, ChainGateway, SuiEnv, SuiGateway};
use gambit_common::EnvVars;

#[tokio::main]
async fn main() -> Result<()> {
    let new_minter = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: set_minter <new-minter-address>"))?;

    let env = SuiEnv::load();
    let gateway = SuiGateway::new(&env)?;

    println!("sponsor:  {}", gateway.sponsor_address());
    println!("registry: {}", env.registry_id);
    println!("minter:   {}", new_minter);

    let call = set_authorized_minter_call(&env.package_id, &env.registry_id, &new_minter);
    let digest = gateway.submit(&call).await?;

    println!("authorized minter updated: {}", digest);
    Ok(())
}
