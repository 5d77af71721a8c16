// Identifier generation for blocks, transactions, validators and addresses.
// Hashes are SHA-256 digests over the record data plus random salt; nothing
// ever verifies them, they only need to look and behave like chain ids.

use chrono::{DateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

pub const ADDRESS_PREFIX: &str = "aenz_";
pub const NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
pub const STAKING_POOL_ADDRESS: &str = "aenz_staking_pool";

/// Parent hash recorded by the genesis block.
pub fn zero_hash() -> String {
    format!("0x{}", "0".repeat(64))
}

fn digest_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// `0x` followed by 64 lowercase hex characters.
pub fn transaction_hash<R: Rng + ?Sized>(
    rng: &mut R,
    from: &str,
    to: &str,
    amount: f64,
    timestamp: DateTime<Utc>,
) -> String {
    let salt: u64 = rng.gen();
    let data = format!(
        "{}{}{:.9}{}{}",
        from,
        to,
        amount,
        timestamp.timestamp_millis(),
        salt
    );
    format!("0x{}", digest_hex(data.as_bytes()))
}

/// Block hash over the header fields and the transaction hashes.
pub fn block_hash<R: Rng + ?Sized>(
    rng: &mut R,
    height: u64,
    parent_hash: &str,
    timestamp: DateTime<Utc>,
    transaction_hashes: &[&str],
) -> String {
    let salt: u64 = rng.gen();
    let mut hasher = Sha256::new();
    hasher.update(height.to_be_bytes());
    hasher.update(parent_hash.as_bytes());
    hasher.update(timestamp.timestamp_millis().to_be_bytes());
    for hash in transaction_hashes {
        hasher.update(hash.as_bytes());
    }
    hasher.update(salt.to_be_bytes());
    format!("0x{}", hex::encode(hasher.finalize()))
}

/// `0x` followed by 40 lowercase hex characters.
pub fn validator_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let bytes: [u8; 20] = rng.gen();
    format!("0x{}", hex::encode(bytes))
}

/// `aenz_` followed by 40 lowercase hex characters.
pub fn address<R: Rng + ?Sized>(rng: &mut R) -> String {
    let bytes: [u8; 20] = rng.gen();
    format!("{}{}", ADDRESS_PREFIX, hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn is_lower_hex(s: &str) -> bool {
        s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }

    #[test]
    fn identifier_formats() {
        let mut rng = StdRng::seed_from_u64(1);
        let now = Utc::now();

        let tx = transaction_hash(&mut rng, "a", "b", 1.5, now);
        assert_eq!(tx.len(), 66);
        assert!(tx.starts_with("0x") && is_lower_hex(&tx[2..]));

        let block = block_hash(&mut rng, 3, &zero_hash(), now, &[tx.as_str()]);
        assert_eq!(block.len(), 66);
        assert!(is_lower_hex(&block[2..]));

        let validator = validator_id(&mut rng);
        assert_eq!(validator.len(), 42);

        let addr = address(&mut rng);
        assert!(addr.starts_with(ADDRESS_PREFIX));
        assert_eq!(addr.len(), ADDRESS_PREFIX.len() + 40);
    }

    #[test]
    fn same_record_gets_distinct_hashes() {
        let mut rng = StdRng::seed_from_u64(2);
        let now = Utc::now();
        let first = transaction_hash(&mut rng, "a", "b", 1.0, now);
        let second = transaction_hash(&mut rng, "a", "b", 1.0, now);
        assert_ne!(first, second);
    }
}
