use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{info, warn};

use crate::advisor::NetworkAdvisor;
use crate::config::SimulationConfig;
use crate::error::{LedgerError, Result};
use crate::events::{EventBus, SimEvent};
use crate::fees;
use crate::ledger::{DashboardView, Ledger, Receipt};
use crate::lock;
use crate::model::{AssetKind, SearchHit};
use crate::scheduler::PeriodicTask;
use crate::staking::StakingDesk;

/// The simulation context: owns the shared ledger, the advisor, the
/// staking desk and the periodic tasks that drive them.
///
/// All ledger mutation goes through one mutex. When both are needed the
/// staking desk is locked before the ledger.
pub struct Simulation {
    config: SimulationConfig,
    bus: EventBus,
    ledger: Arc<Mutex<Ledger>>,
    advisor: Arc<NetworkAdvisor>,
    staking: Arc<Mutex<StakingDesk>>,
    tasks: Vec<PeriodicTask>,
}

impl Simulation {
    /// Build the context and seed the initial block history. Nothing runs until `start`.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let bus = EventBus::new();
        let mut ledger = Ledger::new(&config, bus.clone());
        ledger.seed_initial_blocks(config.initial_blocks);
        let ledger = Arc::new(Mutex::new(ledger));

        let advisor = Arc::new(NetworkAdvisor::new(&config, Arc::clone(&ledger), bus.clone()));
        let staking = Arc::new(Mutex::new(StakingDesk::new(config.staking_apy)));

        Ok(Simulation {
            config,
            bus,
            ledger,
            advisor,
            staking,
            tasks: Vec::new(),
        })
    }

    /// Spawn the block miner, the advisor scan loop and the reward accrual loop.
    pub fn start(&mut self) -> Result<()> {
        if !self.tasks.is_empty() {
            warn!("Simulation already running");
            return Ok(());
        }

        let ledger = Arc::clone(&self.ledger);
        self.tasks.push(PeriodicTask::spawn("block-miner", self.config.block_interval(), move || {
            lock(&ledger).mine_block();
        })?);

        let advisor = Arc::clone(&self.advisor);
        self.tasks.push(PeriodicTask::spawn("network-advisor", self.config.scan_interval(), move || {
            advisor.tick();
        })?);

        let staking = Arc::clone(&self.staking);
        let reward_interval = self.config.reward_interval();
        self.tasks.push(PeriodicTask::spawn("staking-rewards", reward_interval, move || {
            lock(&staking).accrue(reward_interval);
        })?);

        info!("Simulation started with {} periodic tasks", self.tasks.len());
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        for task in self.tasks.iter_mut() {
            task.stop();
        }
        self.tasks.clear();
        self.advisor.stop_monitoring();
        info!("Simulation stopped");
    }

    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(PeriodicTask::is_running)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn subscribe(&self) -> Receiver<SimEvent> {
        self.bus.subscribe()
    }

    /// Lock the ledger. Hold the guard briefly; the miner and the advisor wait on it.
    pub fn ledger(&self) -> MutexGuard<'_, Ledger> {
        lock(&self.ledger)
    }

    pub fn advisor(&self) -> &Arc<NetworkAdvisor> {
        &self.advisor
    }

    pub fn dashboard(&self) -> DashboardView {
        self.ledger().dashboard()
    }

    pub fn search(&self, query: &str) -> Option<SearchHit> {
        self.ledger().search(query)
    }

    pub fn send_transaction(&self, to: &str, amount: f64) -> std::result::Result<Receipt, LedgerError> {
        self.ledger().send_transaction(to, amount)
    }

    pub fn create_token(
        &self,
        name: &str,
        symbol: &str,
        supply: f64,
    ) -> std::result::Result<Receipt, LedgerError> {
        let mut ledger = self.ledger();
        let cost = fees::token_creation(ledger.gas_price());
        ledger.create_asset(name, symbol, AssetKind::Token, Some(supply), cost)
    }

    pub fn create_nft_collection(&self, name: &str, symbol: &str) -> std::result::Result<Receipt, LedgerError> {
        let mut ledger = self.ledger();
        let cost = fees::nft_creation(ledger.gas_price());
        ledger.create_asset(name, symbol, AssetKind::Nft, None, cost)
    }

    pub fn deploy_contract(&self) -> std::result::Result<Receipt, LedgerError> {
        let mut ledger = self.ledger();
        let cost = fees::contract_deployment(ledger.gas_price());
        ledger.deploy_contract(cost)
    }

    pub fn mint_tokens(&self, asset_address: &str, amount: f64) -> std::result::Result<Receipt, LedgerError> {
        let mut ledger = self.ledger();
        let cost = fees::mint(ledger.gas_price());
        ledger.mint_tokens(asset_address, amount, cost)
    }

    pub fn stake(&self, amount: f64) -> std::result::Result<Receipt, LedgerError> {
        let mut staking = lock(&self.staking);
        staking.stake(&mut self.ledger(), amount)
    }

    pub fn unstake(&self, amount: f64) -> std::result::Result<Receipt, LedgerError> {
        let mut staking = lock(&self.staking);
        staking.unstake(&mut self.ledger(), amount)
    }

    pub fn claim_rewards(&self) -> std::result::Result<Receipt, LedgerError> {
        let mut staking = lock(&self.staking);
        staking.claim_rewards(&mut self.ledger())
    }

    pub fn staked_balance(&self) -> f64 {
        lock(&self.staking).staked()
    }

    pub fn pending_rewards(&self) -> f64 {
        lock(&self.staking).rewards()
    }

    pub fn staking_apy(&self) -> f64 {
        lock(&self.staking).apy()
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.stop();
    }
}
