//! Fee quotes, all derived from the current gas price in gwei.

use crate::model::GasPrice;

pub const TRANSFER_FEE_RATE: f64 = 0.0001;
pub const STAKING_FEE_RATE: f64 = 0.00005;

pub fn transfer(gas: GasPrice) -> f64 {
    gas.gwei() * TRANSFER_FEE_RATE
}

pub fn staking(gas: GasPrice) -> f64 {
    gas.gwei() * STAKING_FEE_RATE
}

pub fn token_creation(gas: GasPrice) -> f64 {
    0.5 + gas.gwei() * 0.001
}

pub fn nft_creation(gas: GasPrice) -> f64 {
    0.1 + gas.gwei() * 0.0005
}

pub fn contract_deployment(gas: GasPrice) -> f64 {
    0.25 + gas.gwei() * 0.0008
}

pub fn mint(gas: GasPrice) -> f64 {
    0.05 + gas.gwei() * 0.0002
}
