//! The simulated ledger: block history, transaction history, the user's
//! wallet and assets, and the shared gas price.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::SimulationConfig;
use crate::error::LedgerError;
use crate::events::{EventBus, SimEvent};
use crate::fees;
use crate::ids;
use crate::model::{
    Asset, AssetKind, Block, GasPrice, SearchHit, Transaction, TransactionKind, Wallet,
};

/// Upper bound (exclusive) of transactions generated per mined block.
const MAX_MOCK_TRANSACTIONS: usize = 5;
/// Transactions carried by each block of the initial history.
const SEED_BLOCK_TRANSACTIONS: usize = 2;
/// Number of blocks and transactions shown on the dashboard.
const DASHBOARD_ROWS: usize = 5;

/// Confirmation of a successful user action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    pub message: String,
    pub transaction: Transaction,
}

/// Read-only summary used by the dashboard views and the console output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub latest_height: Option<u64>,
    pub gas_price: GasPrice,
    pub wallet: Wallet,
    pub recent_blocks: Vec<Block>,
    pub recent_transactions: Vec<Transaction>,
    pub blocks_mined: u64,
    pub transactions_recorded: u64,
    pub asset_count: usize,
}

pub struct Ledger {
    blocks: VecDeque<Block>,
    transactions: VecDeque<Transaction>,
    wallet: Wallet,
    assets: Vec<Asset>,
    gas_price: GasPrice,
    next_height: u64,
    last_block_hash: String,
    history_limit: usize,
    block_interval: Duration,
    blocks_mined: u64,
    transactions_recorded: u64,
    rng: StdRng,
    bus: EventBus,
}

impl Ledger {
    pub fn new(config: &SimulationConfig, bus: EventBus) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ledger {
            blocks: VecDeque::with_capacity(config.history_limit),
            transactions: VecDeque::with_capacity(config.history_limit),
            wallet: Wallet {
                address: config.wallet_address.clone(),
                balance: config.initial_balance,
            },
            assets: Vec::new(),
            gas_price: GasPrice::new(config.initial_gas_price),
            next_height: 0,
            last_block_hash: ids::zero_hash(),
            history_limit: config.history_limit,
            block_interval: config.block_interval(),
            blocks_mined: 0,
            transactions_recorded: 0,
            rng,
            bus,
        }
    }

    /// Mine `count` blocks of two transactions each, spaced one block
    /// interval apart and ending at the current time.
    pub fn seed_initial_blocks(&mut self, count: usize) {
        let now = Utc::now();
        let spacing = chrono::Duration::milliseconds(self.block_interval.as_millis() as i64);
        for i in 0..count {
            let offset = (count - 1 - i) as i32;
            self.mine_block_at(now - spacing * offset, SEED_BLOCK_TRANSACTIONS);
        }
        info!("Seeded ledger with {} initial block(s)", count);
    }

    /// Mine a block at the current time with 0-4 mock transactions.
    pub fn mine_block(&mut self) -> &Block {
        let count = self.rng.gen_range(0..MAX_MOCK_TRANSACTIONS);
        self.mine_block_at(Utc::now(), count)
    }

    /// Mine a block at `timestamp` holding exactly `tx_count` mock transactions.
    pub fn mine_block_at(&mut self, timestamp: DateTime<Utc>, tx_count: usize) -> &Block {
        let transactions = self.generate_mock_transactions(tx_count, timestamp);
        let height = self.next_height;

        let tx_hashes: Vec<&str> = transactions.iter().map(|tx| tx.hash.as_str()).collect();
        let hash = ids::block_hash(&mut self.rng, height, &self.last_block_hash, timestamp, &tx_hashes);
        let block = Block {
            height,
            hash: hash.clone(),
            parent_hash: self.last_block_hash.clone(),
            timestamp,
            validator: ids::validator_id(&mut self.rng),
            transactions,
        };

        self.next_height += 1;
        self.blocks_mined += 1;
        self.last_block_hash = hash;

        // Keep the block's own ordering at the front of the history
        for tx in block.transactions.iter().rev() {
            self.push_transaction(tx.clone());
        }

        debug!(
            "Mined block #{} with {} transaction(s), fees {:.6}",
            block.height,
            block.transactions.len(),
            block.total_fees()
        );
        self.bus.publish(SimEvent::BlockMined {
            height: block.height,
            transactions: block.transactions.len(),
        });

        self.blocks.push_front(block);
        self.blocks.truncate(self.history_limit);
        &self.blocks[0]
    }

    fn generate_mock_transactions(&mut self, count: usize, now: DateTime<Utc>) -> Vec<Transaction> {
        let interval_ms = (self.block_interval.as_millis() as i64).max(1);
        (0..count)
            .map(|_| {
                let fee = fees::transfer(self.gas_price) * self.rng.gen_range(0.5..1.5);
                let amount = round4(self.rng.gen_range(0.0..100.0));
                let from = ids::address(&mut self.rng);
                let to = ids::address(&mut self.rng);
                let timestamp = now - chrono::Duration::milliseconds(self.rng.gen_range(0..interval_ms));
                let hash = ids::transaction_hash(&mut self.rng, &from, &to, amount, timestamp);
                Transaction {
                    hash,
                    from,
                    to,
                    amount,
                    timestamp,
                    fee: Some(fee),
                    kind: TransactionKind::Transfer,
                }
            })
            .collect()
    }

    fn push_transaction(&mut self, tx: Transaction) {
        let hash = tx.hash.clone();
        self.transactions.push_front(tx);
        self.transactions.truncate(self.history_limit);
        self.transactions_recorded += 1;
        self.bus.publish(SimEvent::TransactionRecorded { hash });
    }

    fn record_user_transaction(
        &mut self,
        to: &str,
        amount: f64,
        fee: f64,
        kind: TransactionKind,
    ) -> Transaction {
        let timestamp = Utc::now();
        let from = self.wallet.address.clone();
        let hash = ids::transaction_hash(&mut self.rng, &from, to, amount, timestamp);
        let tx = Transaction {
            hash,
            from,
            to: to.to_string(),
            amount,
            timestamp,
            fee: Some(fee),
            kind,
        };
        self.push_transaction(tx.clone());
        tx
    }

    fn ensure_funds(&self, purpose: &'static str, required: f64) -> Result<(), LedgerError> {
        if self.wallet.balance < required {
            warn!(
                "Rejected {}: balance {:.4} below required {:.4}",
                purpose, self.wallet.balance, required
            );
            return Err(LedgerError::InsufficientFunds {
                purpose,
                available: self.wallet.balance,
                required,
            });
        }
        Ok(())
    }

    fn adjust_balance(&mut self, delta: f64) {
        // Callers check funds first; the floor only absorbs float rounding
        self.wallet.balance = (self.wallet.balance + delta).max(0.0);
        self.bus.publish(SimEvent::WalletUpdated {
            address: self.wallet.address.clone(),
            balance: self.wallet.balance,
        });
    }

    /// Send `amount` from the wallet to `to`, paying the transfer fee on top.
    pub fn send_transaction(&mut self, to: &str, amount: f64) -> Result<Receipt, LedgerError> {
        validate_amount("transfer amount", amount)?;
        let fee = fees::transfer(self.gas_price);
        self.ensure_funds("transfer", amount + fee)?;

        self.adjust_balance(-(amount + fee));
        let transaction = self.record_user_transaction(to, amount, fee, TransactionKind::Transfer);
        info!("Sent {} AENZ to {} (fee {:.6})", amount, to, fee);
        Ok(Receipt {
            message: format!("Sent {} AENZ to {}.", amount, to),
            transaction,
        })
    }

    /// Replace the wallet with a fresh, empty one.
    pub fn generate_new_wallet(&mut self) -> &Wallet {
        self.wallet = Wallet {
            address: ids::address(&mut self.rng),
            balance: 0.0,
        };
        info!("Generated new wallet {}", self.wallet.address);
        self.bus.publish(SimEvent::WalletUpdated {
            address: self.wallet.address.clone(),
            balance: self.wallet.balance,
        });
        &self.wallet
    }

    /// Create a token or NFT collection, paying `cost` as deployment fee.
    /// NFT collections never carry a supply.
    pub fn create_asset(
        &mut self,
        name: &str,
        symbol: &str,
        kind: AssetKind,
        supply: Option<f64>,
        cost: f64,
    ) -> Result<Receipt, LedgerError> {
        validate_cost(cost)?;
        if let Some(supply) = supply {
            if !supply.is_finite() || supply < 0.0 {
                return Err(LedgerError::InvalidAmount(format!(
                    "supply must be a non-negative number, got {}",
                    supply
                )));
            }
        }
        self.ensure_funds("deployment fee", cost)?;

        let asset = Asset {
            name: name.to_string(),
            symbol: symbol.to_string(),
            kind,
            address: ids::address(&mut self.rng),
            supply: match kind {
                AssetKind::Token => supply,
                AssetKind::Nft => None,
            },
        };
        let asset_address = asset.address.clone();

        self.adjust_balance(-cost);
        self.assets.push(asset);
        self.bus.publish(SimEvent::AssetsUpdated {
            count: self.assets.len(),
        });
        let transaction =
            self.record_user_transaction(&asset_address, 0.0, cost, TransactionKind::ContractCreation);

        info!("Created {} {} ({}) at {}", kind, name, symbol, asset_address);
        Ok(Receipt {
            message: "Asset created successfully!".to_string(),
            transaction,
        })
    }

    /// Deploy a generic contract to the null address.
    pub fn deploy_contract(&mut self, cost: f64) -> Result<Receipt, LedgerError> {
        validate_cost(cost)?;
        self.ensure_funds("deployment fee", cost)?;

        self.adjust_balance(-cost);
        let transaction =
            self.record_user_transaction(ids::NULL_ADDRESS, 0.0, cost, TransactionKind::ContractCreation);

        info!("Deployed mock contract for {:.6} AENZ", cost);
        Ok(Receipt {
            message: "Mock contract deployed successfully!".to_string(),
            transaction,
        })
    }

    /// Add `amount` to the supply of the token at `asset_address`.
    pub fn mint_tokens(
        &mut self,
        asset_address: &str,
        amount: f64,
        cost: f64,
    ) -> Result<Receipt, LedgerError> {
        validate_amount("mint amount", amount)?;
        validate_cost(cost)?;
        self.ensure_funds("minting fee", cost)?;

        let token = self
            .assets
            .iter_mut()
            .find(|asset| asset.address == asset_address && asset.kind == AssetKind::Token)
            .ok_or_else(|| LedgerError::NotFound("Token".to_string()))?;
        let supply = token.supply.unwrap_or(0.0) + amount;
        token.supply = Some(supply);
        self.bus.publish(SimEvent::AssetsUpdated {
            count: self.assets.len(),
        });

        self.adjust_balance(-cost);
        let transaction = self.record_user_transaction(asset_address, 0.0, cost, TransactionKind::TokenMint);

        info!("Minted {} tokens at {}, supply now {}", amount, asset_address, supply);
        Ok(Receipt {
            message: format!("{} tokens minted successfully!", amount),
            transaction,
        })
    }

    /// Settle a staking desk action against the wallet. Stakes move
    /// `amount` out of the wallet; unstakes and reward claims move it back.
    /// The fee is always paid from the wallet.
    pub fn execute_staking_transaction(
        &mut self,
        kind: TransactionKind,
        amount: f64,
        fee: f64,
    ) -> Result<Transaction, LedgerError> {
        validate_cost(fee)?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(LedgerError::InvalidAmount(format!(
                "staking amount must be a non-negative number, got {}",
                amount
            )));
        }

        let (purpose, required, delta, from, to) = match kind {
            TransactionKind::Stake => (
                "stake",
                amount + fee,
                -(amount + fee),
                self.wallet.address.clone(),
                ids::STAKING_POOL_ADDRESS.to_string(),
            ),
            TransactionKind::Unstake | TransactionKind::ClaimRewards => (
                "staking fee",
                fee,
                amount - fee,
                ids::STAKING_POOL_ADDRESS.to_string(),
                self.wallet.address.clone(),
            ),
            other => {
                return Err(LedgerError::InvalidAmount(format!(
                    "{} is not a staking transaction",
                    other
                )))
            }
        };
        self.ensure_funds(purpose, required)?;

        self.adjust_balance(delta);
        let timestamp = Utc::now();
        let hash = ids::transaction_hash(&mut self.rng, &from, &to, amount, timestamp);
        let tx = Transaction {
            hash,
            from,
            to,
            amount,
            timestamp,
            fee: Some(fee),
            kind,
        };
        self.push_transaction(tx.clone());
        Ok(tx)
    }

    /// Look up a block by height, then a block by hash, then a transaction by hash.
    /// Hash comparison ignores case.
    pub fn search(&self, query: &str) -> Option<SearchHit> {
        let query = query.trim();

        if let Ok(height) = query.parse::<u64>() {
            if let Some(block) = self.blocks.iter().find(|b| b.height == height) {
                return Some(SearchHit::Block(block.clone()));
            }
        }

        if let Some(block) = self.blocks.iter().find(|b| b.hash.eq_ignore_ascii_case(query)) {
            return Some(SearchHit::Block(block.clone()));
        }

        self.transactions
            .iter()
            .find(|tx| tx.hash.eq_ignore_ascii_case(query))
            .map(|tx| SearchHit::Transaction(tx.clone()))
    }

    /// Replace the gas price, returning the previous one.
    pub fn set_gas_price(&mut self, gas: GasPrice) -> GasPrice {
        let previous = self.gas_price;
        self.gas_price = gas;
        if previous != gas {
            self.bus.publish(SimEvent::GasPriceChanged {
                previous: previous.gwei(),
                current: gas.gwei(),
            });
        }
        previous
    }

    pub fn gas_price(&self) -> GasPrice {
        self.gas_price
    }

    /// Blocks, newest first.
    pub fn blocks(&self) -> &VecDeque<Block> {
        &self.blocks
    }

    /// Transactions, newest first.
    pub fn transactions(&self) -> &VecDeque<Transaction> {
        &self.transactions
    }

    pub fn latest_block(&self) -> Option<&Block> {
        self.blocks.front()
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn asset_by_address(&self, address: &str) -> Option<&Asset> {
        self.assets.iter().find(|asset| asset.address == address)
    }

    pub fn transactions_for_asset(&self, address: &str) -> Vec<&Transaction> {
        self.transactions.iter().filter(|tx| tx.involves(address)).collect()
    }

    pub fn wallet_transactions(&self) -> Vec<&Transaction> {
        self.transactions_for_asset(&self.wallet.address)
    }

    pub fn blocks_mined(&self) -> u64 {
        self.blocks_mined
    }

    pub fn dashboard(&self) -> DashboardView {
        DashboardView {
            latest_height: self.latest_block().map(|b| b.height),
            gas_price: self.gas_price,
            wallet: self.wallet.clone(),
            recent_blocks: self.blocks.iter().take(DASHBOARD_ROWS).cloned().collect(),
            recent_transactions: self.transactions.iter().take(DASHBOARD_ROWS).cloned().collect(),
            blocks_mined: self.blocks_mined,
            transactions_recorded: self.transactions_recorded,
            asset_count: self.assets.len(),
        }
    }
}

// Truncates so amounts drawn from [0, 100) stay below 100
fn round4(value: f64) -> f64 {
    (value * 10_000.0).floor() / 10_000.0
}

fn validate_amount(what: &str, amount: f64) -> Result<(), LedgerError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::InvalidAmount(format!(
            "{} must be positive, got {}",
            what, amount
        )));
    }
    Ok(())
}

fn validate_cost(cost: f64) -> Result<(), LedgerError> {
    if !cost.is_finite() || cost < 0.0 {
        return Err(LedgerError::InvalidAmount(format!(
            "fee must be a non-negative number, got {}",
            cost
        )));
    }
    Ok(())
}
