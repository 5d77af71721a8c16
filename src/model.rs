//! Ledger data types shared by the simulator, the advisor and the binaries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What a transaction did, beyond moving an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Transfer,
    ContractCreation,
    TokenMint,
    Stake,
    Unstake,
    ClaimRewards,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Transfer => "Transfer",
            TransactionKind::ContractCreation => "Contract Creation",
            TransactionKind::TokenMint => "Token Mint",
            TransactionKind::Stake => "Stake",
            TransactionKind::Unstake => "Unstake",
            TransactionKind::ClaimRewards => "Claim Rewards",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub fee: Option<f64>,
    pub kind: TransactionKind,
}

impl Transaction {
    /// Whether `address` is the sender or the recipient, ignoring case.
    pub fn involves(&self, address: &str) -> bool {
        self.from.eq_ignore_ascii_case(address) || self.to.eq_ignore_ascii_case(address)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub height: u64,
    pub hash: String,
    pub parent_hash: String,
    pub timestamp: DateTime<Utc>,
    pub validator: String,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    /// Sum of all fees carried by the block's transactions.
    pub fn total_fees(&self) -> f64 {
        self.transactions.iter().filter_map(|tx| tx.fee).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wallet {
    pub address: String,
    pub balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssetKind {
    Token,
    #[serde(rename = "NFT")]
    Nft,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Token => f.write_str("Token"),
            AssetKind::Nft => f.write_str("NFT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub name: String,
    pub symbol: String,
    pub kind: AssetKind,
    pub address: String,
    /// Only tokens carry a supply.
    pub supply: Option<f64>,
}

/// Simulated per-transaction fee multiplier in gwei, always within
/// `[GasPrice::MIN, GasPrice::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct GasPrice(f64);

impl GasPrice {
    pub const MIN: f64 = 10.0;
    pub const MAX: f64 = 200.0;

    /// Clamp `gwei` into range. A non-finite price falls back to the default.
    pub fn new(gwei: f64) -> Self {
        if gwei.is_finite() {
            GasPrice(gwei.clamp(Self::MIN, Self::MAX))
        } else {
            GasPrice::default()
        }
    }

    pub fn gwei(self) -> f64 {
        self.0
    }

    pub fn raised_by(self, delta: f64) -> Self {
        GasPrice::new(self.0 + delta)
    }

    pub fn lowered_by(self, delta: f64) -> Self {
        GasPrice::new(self.0 - delta)
    }
}

impl Default for GasPrice {
    fn default() -> Self {
        GasPrice(20.0)
    }
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of looking up a block height or hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SearchHit {
    Block(Block),
    Transaction(Transaction),
}
