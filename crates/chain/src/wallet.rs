use anyhow::{anyhow, bail, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ed25519_dalek::{Signer, SigningKey};
use hmac::{Hmac, Mac};
use sha2::Sha512;

type Blake2b256 = Blake2b<U32>;
type HmacSha512 = Hmac<Sha512>;

const ED25519_SCHEME_FLAG: u8 = 0x00;
const SUI_DERIVATION_PATH: [u32; 5] = [44, 784, 0, 0, 0];

/// The server-owned keypair that signs and pays for every submission.
#[derive(Debug)]
pub struct SponsorWallet {
    signing_key: SigningKey,
}

impl SponsorWallet {
    /// Accepts a 12/24-word mnemonic, a bech32 `suiprivkey` string, or a
    /// 64-hex-character raw secret with an optional `0x` prefix.
    pub fn from_secret(secret: &str) -> Result<Self> {
        let secret = secret.trim();

        let key_bytes = if secret.starts_with("suiprivkey") {
            decode_bech32_secret(secret)?
        } else if secret.contains(char::is_whitespace) {
            derive_from_mnemonic(secret)?
        } else {
            decode_hex_secret(secret)?
        };

        Ok(Self {
            signing_key: SigningKey::from_bytes(&key_bytes),
        })
    }

    /// Hex address with `0x` prefix, derived from the public key.
    pub fn address(&self) -> String {
        let mut hasher = Blake2b256::new();
        hasher.update([ED25519_SCHEME_FLAG]);
        hasher.update(self.signing_key.verifying_key().as_bytes());
        format!("0x{}", hex::encode(hasher.finalize()))
    }

    /// Signs raw transaction bytes and returns the serialized signature
    /// (scheme flag, signature, public key) in base64, the form the
    /// fullnode expects alongside the tx bytes.
    pub fn sign_tx(&self, tx_bytes: &[u8]) -> String {
        // Intent message: scope TransactionData, version 0, app id 0.
        let mut hasher = Blake2b256::new();
        hasher.update([0u8, 0, 0]);
        hasher.update(tx_bytes);
        let digest = hasher.finalize();

        let signature = self.signing_key.sign(&digest);

        let mut serialized = Vec::with_capacity(1 + 64 + 32);
        serialized.push(ED25519_SCHEME_FLAG);
        serialized.extend_from_slice(&signature.to_bytes());
        serialized.extend_from_slice(self.signing_key.verifying_key().as_bytes());
        BASE64.encode(serialized)
    }
}

fn malformed_secret_error() -> anyhow::Error {
    anyhow!(
        "unrecognized sponsor secret: expected a 12/24-word mnemonic, \
         a bech32 string starting with 'suiprivkey', \
         or 64 hex characters (optionally 0x-prefixed)"
    )
}

fn decode_bech32_secret(secret: &str) -> Result<[u8; 32]> {
    let (hrp, data) = bech32::decode(secret).map_err(|_| malformed_secret_error())?;
    if hrp.as_str() != "suiprivkey" {
        return Err(malformed_secret_error());
    }
    // One scheme flag byte followed by the 32-byte secret key.
    if data.len() != 33 || data[0] != ED25519_SCHEME_FLAG {
        return Err(malformed_secret_error());
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&data[1..]);
    Ok(key)
}

fn decode_hex_secret(secret: &str) -> Result<[u8; 32]> {
    let stripped = secret.strip_prefix("0x").unwrap_or(secret);
    if stripped.len() != 64 {
        return Err(malformed_secret_error());
    }
    let bytes = hex::decode(stripped).map_err(|_| malformed_secret_error())?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}

fn derive_from_mnemonic(phrase: &str) -> Result<[u8; 32]> {
    let mnemonic = bip39::Mnemonic::parse(phrase).map_err(|_| malformed_secret_error())?;
    let words = mnemonic.word_count();
    if words != 12 && words != 24 {
        return Err(malformed_secret_error());
    }
    let seed = mnemonic.to_seed("");
    derive_ed25519(&seed, &SUI_DERIVATION_PATH)
}

/// SLIP-0010 ed25519 derivation; every path segment is hardened.
fn derive_ed25519(seed: &[u8], path: &[u32]) -> Result<[u8; 32]> {
    let mut mac = HmacSha512::new_from_slice(b"ed25519 seed")
        .map_err(|e| anyhow!("hmac init: {}", e))?;
    mac.update(seed);
    let intermediate = mac.finalize().into_bytes();

    let mut key = [0u8; 32];
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&intermediate[..32]);
    chain_code.copy_from_slice(&intermediate[32..]);

    for segment in path {
        let hardened = segment
            .checked_add(0x8000_0000)
            .ok_or_else(|| anyhow!("derivation index overflow"))?;

        let mut mac = HmacSha512::new_from_slice(&chain_code)
            .map_err(|e| anyhow!("hmac init: {}", e))?;
        mac.update(&[0u8]);
        mac.update(&key);
        mac.update(&hardened.to_be_bytes());
        let intermediate = mac.finalize().into_bytes();

        key.copy_from_slice(&intermediate[..32]);
        chain_code.copy_from_slice(&intermediate[32..]);
    }

    Ok(key)
}

/// Validates a configured sponsor address against the derived one.
pub fn check_sponsor_address(wallet: &SponsorWallet, configured: &str) -> Result<()> {
    let derived = wallet.address();
    if !configured.eq_ignore_ascii_case(&derived) {
        bail!(
            "SPONSOR_ADDRESS {} does not match the address derived from the secret ({})",
            configured,
            derived
        );
    }
    Ok(())
}
