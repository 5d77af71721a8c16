use std::time::Duration;

use log::info;

use crate::error::LedgerError;
use crate::fees;
use crate::ledger::{Ledger, Receipt};
use crate::model::TransactionKind;

const SECONDS_PER_YEAR: f64 = 31_536_000.0;

/// Staked balance and accrued rewards of the simulation's wallet.
pub struct StakingDesk {
    staked: f64,
    rewards: f64,
    apy: f64,
}

impl StakingDesk {
    pub fn new(apy: f64) -> Self {
        StakingDesk {
            staked: 0.0,
            rewards: 0.0,
            apy,
        }
    }

    pub fn staked(&self) -> f64 {
        self.staked
    }

    pub fn rewards(&self) -> f64 {
        self.rewards
    }

    pub fn apy(&self) -> f64 {
        self.apy
    }

    /// Accrue simple interest on the staked balance for `elapsed`.
    pub fn accrue(&mut self, elapsed: Duration) {
        if self.staked > 0.0 {
            let per_second = self.staked * (self.apy / 100.0) / SECONDS_PER_YEAR;
            self.rewards += per_second * elapsed.as_secs_f64();
        }
    }

    pub fn stake(&mut self, ledger: &mut Ledger, amount: f64) -> Result<Receipt, LedgerError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LedgerError::InvalidAmount("Amount to stake must be positive.".to_string()));
        }
        let fee = fees::staking(ledger.gas_price());
        let transaction = ledger.execute_staking_transaction(TransactionKind::Stake, amount, fee)?;

        self.staked += amount;
        info!("Staked {} AENZ, total staked {}", amount, self.staked);
        Ok(Receipt {
            message: format!("{} AENZ staked successfully.", amount),
            transaction,
        })
    }

    pub fn unstake(&mut self, ledger: &mut Ledger, amount: f64) -> Result<Receipt, LedgerError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LedgerError::InvalidAmount("Amount to unstake must be positive.".to_string()));
        }
        if amount > self.staked {
            return Err(LedgerError::InvalidAmount(
                "Cannot unstake more than you have staked.".to_string(),
            ));
        }
        let fee = fees::staking(ledger.gas_price());
        let transaction = ledger.execute_staking_transaction(TransactionKind::Unstake, amount, fee)?;

        self.staked -= amount;
        info!("Unstaked {} AENZ, total staked {}", amount, self.staked);
        Ok(Receipt {
            message: format!("{} AENZ unstaked successfully.", amount),
            transaction,
        })
    }

    pub fn claim_rewards(&mut self, ledger: &mut Ledger) -> Result<Receipt, LedgerError> {
        let rewards = self.rewards;
        if rewards <= 0.0 {
            return Err(LedgerError::NotFound("Rewards to claim".to_string()));
        }
        let fee = fees::staking(ledger.gas_price());
        let transaction =
            ledger.execute_staking_transaction(TransactionKind::ClaimRewards, rewards, fee)?;

        self.rewards = 0.0;
        info!("Claimed {:.6} AENZ in staking rewards", rewards);
        Ok(Receipt {
            message: format!("Successfully claimed {:.6} AENZ.", rewards),
            transaction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::events::EventBus;

    fn setup() -> (Ledger, StakingDesk) {
        let config = SimulationConfig {
            seed: Some(3),
            ..SimulationConfig::default()
        };
        (Ledger::new(&config, EventBus::new()), StakingDesk::new(config.staking_apy))
    }

    #[test]
    fn stake_moves_funds_into_the_desk() {
        let (mut ledger, mut desk) = setup();
        let receipt = desk.stake(&mut ledger, 500.0).unwrap();

        assert_eq!(receipt.message, "500 AENZ staked successfully.");
        assert_eq!(desk.staked(), 500.0);
        assert!((ledger.wallet().balance - (500.0 - 0.001)).abs() < 1e-9);
    }

    #[test]
    fn stake_rejects_bad_amounts_and_overdrafts() {
        let (mut ledger, mut desk) = setup();
        assert!(matches!(desk.stake(&mut ledger, 0.0), Err(LedgerError::InvalidAmount(_))));

        let err = desk.stake(&mut ledger, 1_000.0).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(desk.staked(), 0.0);
        assert_eq!(ledger.wallet().balance, 1_000.0);
    }

    #[test]
    fn unstake_is_limited_to_the_staked_balance() {
        let (mut ledger, mut desk) = setup();
        desk.stake(&mut ledger, 100.0).unwrap();

        let err = desk.unstake(&mut ledger, 150.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid amount: Cannot unstake more than you have staked."
        );

        desk.unstake(&mut ledger, 60.0).unwrap();
        assert_eq!(desk.staked(), 40.0);
        assert!((ledger.wallet().balance - (1_000.0 - 40.0 - 0.002)).abs() < 1e-9);
    }

    #[test]
    fn rewards_accrue_and_are_claimed_once() {
        let (mut ledger, mut desk) = setup();
        assert!(desk.claim_rewards(&mut ledger).is_err());

        desk.stake(&mut ledger, 1_000.0 - 0.01).unwrap();
        desk.accrue(Duration::from_secs(31_536_000));
        let expected = (1_000.0 - 0.01) * 0.085;
        assert!((desk.rewards() - expected).abs() < 1e-6);

        let before = ledger.wallet().balance;
        desk.claim_rewards(&mut ledger).unwrap();
        assert_eq!(desk.rewards(), 0.0);
        assert!((ledger.wallet().balance - (before + expected - 0.001)).abs() < 1e-6);
        assert!(desk.claim_rewards(&mut ledger).is_err());
    }

    #[test]
    fn nothing_accrues_without_stake() {
        let (_, mut desk) = setup();
        desk.accrue(Duration::from_secs(3));
        assert_eq!(desk.rewards(), 0.0);
    }
}
