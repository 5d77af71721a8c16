//! The network advisor ("AI maintainer"): a fixed rule table that reads
//! recent block throughput and nudges the shared gas price.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::SimulationConfig;
use crate::events::{EventBus, SimEvent};
use crate::ledger::Ledger;
use crate::lock;
use crate::model::{Block, GasPrice};

/// Only this many of the newest transactions are checked for anomalies.
const ANOMALY_WINDOW: usize = 20;
const ANOMALY_AMOUNT: f64 = 95.0;
const ANOMALY_REPORT_PROBABILITY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NetworkStatus {
    Optimal,
    Stable,
    Congested,
    Critical,
}

impl NetworkStatus {
    pub fn from_throughput(tps: f64) -> Self {
        if tps > 2.5 {
            NetworkStatus::Critical
        } else if tps > 1.0 {
            NetworkStatus::Congested
        } else if tps > 0.5 {
            NetworkStatus::Stable
        } else {
            NetworkStatus::Optimal
        }
    }

    /// Gas price change in gwei applied when a scan lands on this status.
    pub fn gas_adjustment(self) -> f64 {
        match self {
            NetworkStatus::Critical => 15.0,
            NetworkStatus::Congested => 5.0,
            NetworkStatus::Stable => -1.0,
            NetworkStatus::Optimal => -3.0,
        }
    }

    pub fn apply(self, gas: GasPrice) -> GasPrice {
        let delta = self.gas_adjustment();
        if delta >= 0.0 {
            gas.raised_by(delta)
        } else {
            gas.lowered_by(-delta)
        }
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NetworkStatus::Optimal => "Optimal",
            NetworkStatus::Stable => "Stable",
            NetworkStatus::Congested => "Congested",
            NetworkStatus::Critical => "Critical",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Info,
    Warning,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiLog {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub severity: LogSeverity,
}

/// Transactions per second between the two newest blocks (`blocks` is
/// newest first). `None` until two blocks exist; zero when the timestamps
/// do not move forward.
pub fn estimate_throughput<'a, I>(blocks: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a Block>,
{
    let mut newest_first = blocks.into_iter();
    let latest = newest_first.next()?;
    let previous = newest_first.next()?;

    let delta_secs = (latest.timestamp - previous.timestamp).num_milliseconds() as f64 / 1_000.0;
    if delta_secs > 0.0 {
        Some(latest.transactions.len() as f64 / delta_secs)
    } else {
        Some(0.0)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub throughput: f64,
    pub status: NetworkStatus,
    pub previous_gas: GasPrice,
    pub gas_price: GasPrice,
    pub anomaly_reported: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Another scan held the busy flag.
    Busy,
    /// Fewer than two blocks; nothing was changed or logged.
    InsufficientHistory,
    Completed(ScanReport),
}

/// Result of a manual gas action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GasAdjustment {
    pub throughput: f64,
    pub previous: GasPrice,
    pub current: GasPrice,
}

struct AdvisorState {
    status: NetworkStatus,
    logs: VecDeque<AiLog>,
    transactions_per_second: f64,
    rng: StdRng,
}

/// Releases the busy flag when a scan ends, however it ends.
struct ScanGuard<'a>(&'a AtomicBool);

impl<'a> ScanGuard<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ScanGuard(flag))
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct NetworkAdvisor {
    ledger: Arc<Mutex<Ledger>>,
    bus: EventBus,
    state: Mutex<AdvisorState>,
    autonomous: AtomicBool,
    scanning: AtomicBool,
    scans_completed: AtomicU64,
    scan_delay: Duration,
    log_limit: usize,
}

impl NetworkAdvisor {
    pub fn new(config: &SimulationConfig, ledger: Arc<Mutex<Ledger>>, bus: EventBus) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };

        let advisor = NetworkAdvisor {
            ledger,
            bus,
            state: Mutex::new(AdvisorState {
                status: NetworkStatus::Stable,
                logs: VecDeque::with_capacity(config.log_limit),
                transactions_per_second: 0.0,
                rng,
            }),
            autonomous: AtomicBool::new(config.autonomous),
            scanning: AtomicBool::new(false),
            scans_completed: AtomicU64::new(0),
            scan_delay: config.scan_delay(),
            log_limit: config.log_limit,
        };
        let greeting = if config.autonomous {
            "AI Maintainer Initialized. Starting autonomous monitoring..."
        } else {
            "AI Maintainer Initialized. Autonomous mode is off."
        };
        advisor.log(greeting, LogSeverity::Success);
        advisor
    }

    /// Scheduled trigger: scans only while autonomous mode is on.
    pub fn tick(&self) -> Option<ScanOutcome> {
        if self.is_autonomous() {
            Some(self.run_scan())
        } else {
            debug!("Autonomous mode off, skipping scheduled scan");
            None
        }
    }

    /// Operator-requested scan. Ignores autonomous mode but not the busy flag.
    pub fn run_manual_scan(&self) -> ScanOutcome {
        self.log("Manual network diagnostic initiated...", LogSeverity::Info);
        self.run_scan()
    }

    /// Run a manual scan on its own thread so the caller is not held through
    /// the scan delay. Returns `None` while another scan holds the busy flag.
    pub fn spawn_manual_scan(self: &Arc<Self>) -> Option<JoinHandle<ScanOutcome>> {
        if self.is_scanning() {
            debug!("Scan already in progress, not spawning a manual scan");
            return None;
        }
        let advisor = Arc::clone(self);
        Some(thread::spawn(move || advisor.run_manual_scan()))
    }

    /// Note the end of scheduled monitoring. Silent when autonomous mode is off.
    pub fn stop_monitoring(&self) {
        if self.is_autonomous() {
            self.log("AI autonomous mode stopped.", LogSeverity::Warning);
        }
    }

    /// Flip autonomous mode, returning the new setting.
    pub fn toggle_autonomous(&self) -> bool {
        let enabled = !self.autonomous.fetch_xor(true, Ordering::AcqRel);
        if enabled {
            self.log("Autonomous mode ENABLED.", LogSeverity::Success);
        } else {
            self.log("Autonomous mode DISABLED.", LogSeverity::Warning);
        }
        enabled
    }

    pub fn run_scan(&self) -> ScanOutcome {
        let _guard = match ScanGuard::claim(&self.scanning) {
            Some(guard) => guard,
            None => {
                debug!("Scan already in progress, skipping");
                return ScanOutcome::Busy;
            }
        };

        if !self.scan_delay.is_zero() {
            thread::sleep(self.scan_delay);
        }

        let (throughput, status, previous_gas, gas_price, suspect) = {
            let mut ledger = lock(&self.ledger);
            let throughput = match estimate_throughput(ledger.blocks()) {
                Some(tps) => tps,
                None => return ScanOutcome::InsufficientHistory,
            };
            let status = NetworkStatus::from_throughput(throughput);
            let previous_gas = ledger.gas_price();
            let gas_price = status.apply(previous_gas);
            ledger.set_gas_price(gas_price);

            let suspect = ledger
                .transactions()
                .iter()
                .take(ANOMALY_WINDOW)
                .find(|tx| tx.amount > ANOMALY_AMOUNT)
                .map(|tx| (tx.amount, tx.hash.clone()));
            (throughput, status, previous_gas, gas_price, suspect)
        };

        self.record_status(status, throughput);
        match status {
            NetworkStatus::Critical => self.log(
                "High network congestion detected! Increasing gas price.",
                LogSeverity::Error,
            ),
            NetworkStatus::Congested => self.log(
                "Network is congested. Increasing gas price.",
                LogSeverity::Warning,
            ),
            NetworkStatus::Stable | NetworkStatus::Optimal => {}
        }

        let anomaly_reported = match suspect {
            Some((amount, hash)) if self.roll(ANOMALY_REPORT_PROBABILITY) => {
                let short: String = hash.chars().take(20).collect();
                self.log(
                    &format!(
                        "Anomaly: High value transaction ({} AENZ) detected. Hash: {}...",
                        amount, short
                    ),
                    LogSeverity::Warning,
                );
                true
            }
            _ => false,
        };

        self.log(
            &format!(
                "Scan complete. TPS: {}. Gas Price: {} gwei.",
                round2(throughput),
                gas_price
            ),
            LogSeverity::Info,
        );
        self.scans_completed.fetch_add(1, Ordering::AcqRel);

        ScanOutcome::Completed(ScanReport {
            throughput,
            status,
            previous_gas,
            gas_price,
            anomaly_reported,
        })
    }

    /// Lower the gas price right away if the network is quiet.
    pub fn optimize_gas_fees(&self) -> Option<GasAdjustment> {
        self.log("Manual gas fee optimization initiated...", LogSeverity::Info);
        let Some(adjustment) = self.adjust_now(|tps, gas| {
            if tps <= 0.5 {
                gas.lowered_by(3.0)
            } else if tps <= 1.0 {
                gas.lowered_by(1.0)
            } else {
                gas
            }
        }) else {
            self.log("Could not optimize: not enough block data.", LogSeverity::Warning);
            return None;
        };

        let tps = adjustment.throughput;
        if tps <= 0.5 {
            self.log(
                &format!(
                    "Network is optimal (TPS: {:.2}). Gas price reduced from {} to {}.",
                    tps, adjustment.previous, adjustment.current
                ),
                LogSeverity::Success,
            );
        } else if tps <= 1.0 {
            self.log(
                &format!(
                    "Network is stable (TPS: {:.2}). Gas price slightly reduced from {} to {}.",
                    tps, adjustment.previous, adjustment.current
                ),
                LogSeverity::Success,
            );
        } else {
            self.log(
                &format!(
                    "Network is busy (TPS: {:.2}). No reduction in gas price. Use 'Handle Congestion' for high traffic.",
                    tps
                ),
                LogSeverity::Info,
            );
        }
        Some(adjustment)
    }

    /// Raise the gas price right away if the network is congested.
    pub fn handle_congestion(&self) -> Option<GasAdjustment> {
        self.log("Manual congestion handling initiated...", LogSeverity::Info);
        let Some(adjustment) = self.adjust_now(|tps, gas| {
            if tps > 2.5 {
                gas.raised_by(15.0)
            } else if tps > 1.0 {
                gas.raised_by(5.0)
            } else {
                gas
            }
        }) else {
            self.log(
                "Could not handle congestion: not enough block data.",
                LogSeverity::Warning,
            );
            return None;
        };

        let tps = adjustment.throughput;
        if tps > 2.5 {
            self.log(
                &format!(
                    "CRITICAL CONGESTION (TPS: {:.2}). Gas price sharply increased from {} to {}.",
                    tps, adjustment.previous, adjustment.current
                ),
                LogSeverity::Error,
            );
        } else if tps > 1.0 {
            self.log(
                &format!(
                    "High congestion detected (TPS: {:.2}). Gas price increased from {} to {}.",
                    tps, adjustment.previous, adjustment.current
                ),
                LogSeverity::Warning,
            );
        } else {
            self.log(
                &format!(
                    "Network traffic is normal (TPS: {:.2}). No congestion handling needed.",
                    tps
                ),
                LogSeverity::Success,
            );
        }
        Some(adjustment)
    }

    fn adjust_now<F>(&self, policy: F) -> Option<GasAdjustment>
    where
        F: FnOnce(f64, GasPrice) -> GasPrice,
    {
        let adjustment = {
            let mut ledger = lock(&self.ledger);
            let throughput = estimate_throughput(ledger.blocks())?;
            let previous = ledger.gas_price();
            let current = policy(throughput, previous);
            ledger.set_gas_price(current);
            GasAdjustment {
                throughput,
                previous,
                current,
            }
        };
        lock(&self.state).transactions_per_second = round2(adjustment.throughput);
        Some(adjustment)
    }

    fn record_status(&self, status: NetworkStatus, throughput: f64) {
        let previous = {
            let mut state = lock(&self.state);
            state.transactions_per_second = round2(throughput);
            std::mem::replace(&mut state.status, status)
        };
        if previous != status {
            info!("Network status changed from {} to {}", previous, status);
            self.bus.publish(SimEvent::StatusChanged {
                previous,
                current: status,
            });
        }
    }

    fn roll(&self, probability: f64) -> bool {
        lock(&self.state).rng.gen_bool(probability)
    }

    fn log(&self, message: &str, severity: LogSeverity) {
        match severity {
            LogSeverity::Error => error!("[advisor] {}", message),
            LogSeverity::Warning => warn!("[advisor] {}", message),
            LogSeverity::Info | LogSeverity::Success => info!("[advisor] {}", message),
        }

        let entry = AiLog {
            timestamp: Utc::now(),
            message: message.to_string(),
            severity,
        };
        {
            let mut state = lock(&self.state);
            state.logs.push_front(entry.clone());
            state.logs.truncate(self.log_limit);
        }
        self.bus.publish(SimEvent::AdvisorLog(entry));
    }

    pub fn status(&self) -> NetworkStatus {
        lock(&self.state).status
    }

    /// Log entries, newest first.
    pub fn logs(&self) -> Vec<AiLog> {
        lock(&self.state).logs.iter().cloned().collect()
    }

    pub fn transactions_per_second(&self) -> f64 {
        lock(&self.state).transactions_per_second
    }

    pub fn is_autonomous(&self) -> bool {
        self.autonomous.load(Ordering::Acquire)
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }

    pub fn scans_completed(&self) -> u64 {
        self.scans_completed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(scan_delay_ms: u64) -> SimulationConfig {
        SimulationConfig {
            seed: Some(9),
            scan_delay_ms,
            ..SimulationConfig::default()
        }
    }

    fn setup(scan_delay_ms: u64) -> (Arc<Mutex<Ledger>>, NetworkAdvisor) {
        let config = config(scan_delay_ms);
        let bus = EventBus::new();
        let ledger = Arc::new(Mutex::new(Ledger::new(&config, bus.clone())));
        let advisor = NetworkAdvisor::new(&config, Arc::clone(&ledger), bus);
        (ledger, advisor)
    }

    /// Two blocks, `tx_count` transactions in the newer one, `delta_ms` apart.
    fn mine_pair(ledger: &Arc<Mutex<Ledger>>, tx_count: usize, delta_ms: i64) {
        let start = Utc::now();
        let mut ledger = lock(ledger);
        ledger.mine_block_at(start, 0);
        ledger.mine_block_at(start + chrono::Duration::milliseconds(delta_ms), tx_count);
    }

    #[test]
    fn status_table_thresholds() {
        assert_eq!(NetworkStatus::from_throughput(2.6), NetworkStatus::Critical);
        assert_eq!(NetworkStatus::from_throughput(2.5), NetworkStatus::Congested);
        assert_eq!(NetworkStatus::from_throughput(1.0), NetworkStatus::Stable);
        assert_eq!(NetworkStatus::from_throughput(0.5), NetworkStatus::Optimal);
        assert_eq!(NetworkStatus::from_throughput(0.0), NetworkStatus::Optimal);

        let gas = GasPrice::new(100.0);
        assert_eq!(NetworkStatus::Critical.apply(gas).gwei(), 115.0);
        assert_eq!(NetworkStatus::Congested.apply(gas).gwei(), 105.0);
        assert_eq!(NetworkStatus::Stable.apply(gas).gwei(), 99.0);
        assert_eq!(NetworkStatus::Optimal.apply(gas).gwei(), 97.0);
    }

    #[test]
    fn three_transactions_over_one_and_a_half_seconds_is_congested() {
        let (ledger, advisor) = setup(0);
        mine_pair(&ledger, 3, 1_500);

        let report = match advisor.run_scan() {
            ScanOutcome::Completed(report) => report,
            other => panic!("expected completed scan, got {:?}", other),
        };
        assert!((report.throughput - 2.0).abs() < 1e-9);
        assert_eq!(report.status, NetworkStatus::Congested);
        assert_eq!(report.previous_gas.gwei(), 20.0);
        assert_eq!(report.gas_price.gwei(), 25.0);
        assert_eq!(lock(&ledger).gas_price().gwei(), 25.0);
        assert_eq!(advisor.status(), NetworkStatus::Congested);
        assert_eq!(advisor.transactions_per_second(), 2.0);

        let logs = advisor.logs();
        assert_eq!(logs[0].message, "Scan complete. TPS: 2. Gas Price: 25 gwei.");
        assert!(logs
            .iter()
            .any(|l| l.severity == LogSeverity::Warning && l.message.contains("congested")));
    }

    #[test]
    fn congested_raise_is_clamped_at_the_ceiling() {
        let (ledger, advisor) = setup(0);
        lock(&ledger).set_gas_price(GasPrice::new(198.0));
        mine_pair(&ledger, 3, 1_500);

        advisor.run_scan();
        assert_eq!(lock(&ledger).gas_price().gwei(), GasPrice::MAX);
    }

    #[test]
    fn scan_aborts_silently_without_two_blocks() {
        let (ledger, advisor) = setup(0);
        lock(&ledger).mine_block_at(Utc::now(), 4);
        let logs_before = advisor.logs().len();

        assert_eq!(advisor.run_scan(), ScanOutcome::InsufficientHistory);
        assert_eq!(advisor.logs().len(), logs_before);
        assert_eq!(lock(&ledger).gas_price().gwei(), 20.0);
        assert_eq!(advisor.scans_completed(), 0);
        assert!(!advisor.is_scanning());
    }

    #[test]
    fn non_increasing_timestamps_read_as_zero_throughput() {
        let (ledger, advisor) = setup(0);
        mine_pair(&ledger, 4, 0);

        match advisor.run_scan() {
            ScanOutcome::Completed(report) => {
                assert_eq!(report.throughput, 0.0);
                assert_eq!(report.status, NetworkStatus::Optimal);
                assert_eq!(report.gas_price.gwei(), 17.0);
            }
            other => panic!("expected completed scan, got {:?}", other),
        }
    }

    #[test]
    fn gas_stays_in_bounds_across_many_scans() {
        let (ledger, advisor) = setup(0);
        let start = Utc::now();
        for i in 0..200i64 {
            // Alternate long runs of critical and idle blocks
            let tx_count = if (i / 40) % 2 == 0 { 4 } else { 0 };
            lock(&ledger).mine_block_at(start + chrono::Duration::milliseconds(i * 1_000), tx_count);
            advisor.run_scan();
            let gas = lock(&ledger).gas_price().gwei();
            assert!((GasPrice::MIN..=GasPrice::MAX).contains(&gas), "gas {} out of bounds", gas);
        }
    }

    #[test]
    fn manual_scan_during_a_scan_is_rejected() {
        let (ledger, advisor) = setup(300);
        mine_pair(&ledger, 3, 1_500);
        let advisor = Arc::new(advisor);

        let background = {
            let advisor = Arc::clone(&advisor);
            thread::spawn(move || advisor.run_scan())
        };
        thread::sleep(Duration::from_millis(50));

        assert!(advisor.is_scanning());
        assert_eq!(advisor.run_manual_scan(), ScanOutcome::Busy);
        assert!(matches!(background.join().unwrap(), ScanOutcome::Completed(_)));

        // Adjusted once, not twice
        assert_eq!(lock(&ledger).gas_price().gwei(), 25.0);
        assert_eq!(advisor.scans_completed(), 1);
        assert!(!advisor.is_scanning());
    }

    #[test]
    fn autonomous_toggle_gates_scheduled_scans_only() {
        let (ledger, advisor) = setup(0);
        mine_pair(&ledger, 1, 5_000);

        assert!(advisor.tick().is_some());
        assert!(!advisor.toggle_autonomous());
        assert!(advisor.tick().is_none());
        assert_eq!(advisor.scans_completed(), 1);

        // Manual scans bypass the toggle
        assert!(matches!(advisor.run_manual_scan(), ScanOutcome::Completed(_)));
        assert_eq!(advisor.scans_completed(), 2);

        assert!(advisor.toggle_autonomous());
        assert!(advisor.tick().is_some());
        assert_eq!(advisor.scans_completed(), 3);
        let logs = advisor.logs();
        assert!(logs.iter().any(|l| l.message == "Autonomous mode DISABLED."));
        assert!(logs.iter().any(|l| l.message == "Autonomous mode ENABLED."));
    }

    #[test]
    fn log_keeps_the_newest_entries() {
        let (ledger, advisor) = setup(0);
        mine_pair(&ledger, 1, 5_000);
        for _ in 0..40 {
            advisor.run_manual_scan();
        }
        let logs = advisor.logs();
        assert_eq!(logs.len(), 50);
        assert!(logs[0].message.starts_with("Scan complete."));
        assert!(logs.iter().all(|l| !l.message.starts_with("AI Maintainer Initialized")));
    }

    #[test]
    fn anomalies_only_flag_high_value_transactions() {
        let (ledger, advisor) = setup(0);
        {
            let mut ledger = lock(&ledger);
            let start = Utc::now();
            ledger.mine_block_at(start, 0);
            ledger.mine_block_at(start + chrono::Duration::seconds(5), 0);
            ledger.send_transaction("aenz_friend", 10.0).unwrap();
        }
        for _ in 0..30 {
            advisor.run_scan();
        }
        assert!(advisor.logs().iter().all(|l| !l.message.starts_with("Anomaly")));

        lock(&ledger).send_transaction("aenz_whale", 96.0).unwrap();
        let mut reported = 0;
        for _ in 0..60 {
            if let ScanOutcome::Completed(report) = advisor.run_scan() {
                reported += report.anomaly_reported as usize;
            }
        }
        assert!(reported > 0 && reported < 60);
        assert!(advisor
            .logs()
            .iter()
            .any(|l| l.message.starts_with("Anomaly: High value transaction (96 AENZ)")));
    }

    #[test]
    fn manual_gas_actions_only_move_in_their_direction() {
        let (ledger, advisor) = setup(0);
        assert!(advisor.optimize_gas_fees().is_none());

        mine_pair(&ledger, 4, 1_000);
        let congestion = advisor.handle_congestion().unwrap();
        assert_eq!(congestion.current.gwei(), 35.0);
        let optimized = advisor.optimize_gas_fees().unwrap();
        assert_eq!(optimized.current, optimized.previous);

        lock(&ledger).mine_block_at(Utc::now() + chrono::Duration::seconds(60), 0);
        let optimized = advisor.optimize_gas_fees().unwrap();
        assert_eq!(optimized.current.gwei(), 32.0);
        let congestion = advisor.handle_congestion().unwrap();
        assert_eq!(congestion.current.gwei(), 32.0);
        assert_eq!(advisor.logs()[0].severity, LogSeverity::Success);
    }

    #[test]
    fn stable_traffic_gets_a_slight_reduction_only() {
        let (ledger, advisor) = setup(0);
        mine_pair(&ledger, 1, 1_500);

        let optimized = advisor.optimize_gas_fees().unwrap();
        assert!((optimized.throughput - 1.0 / 1.5).abs() < 1e-9);
        assert_eq!(optimized.previous.gwei(), 20.0);
        assert_eq!(optimized.current.gwei(), 19.0);
        let log = &advisor.logs()[0];
        assert_eq!(log.severity, LogSeverity::Success);
        assert!(log.message.starts_with("Network is stable (TPS: 0.67)"));

        let congestion = advisor.handle_congestion().unwrap();
        assert_eq!(congestion.current.gwei(), 19.0);
        let log = &advisor.logs()[0];
        assert_eq!(log.severity, LogSeverity::Success);
        assert!(log.message.starts_with("Network traffic is normal"));
        assert_eq!(lock(&ledger).gas_price().gwei(), 19.0);
    }

    #[test]
    fn congested_traffic_gets_a_moderate_raise_only() {
        let (ledger, advisor) = setup(0);
        mine_pair(&ledger, 3, 1_500);

        let congestion = advisor.handle_congestion().unwrap();
        assert_eq!(congestion.previous.gwei(), 20.0);
        assert_eq!(congestion.current.gwei(), 25.0);
        let log = &advisor.logs()[0];
        assert_eq!(log.severity, LogSeverity::Warning);
        assert!(log.message.starts_with("High congestion detected (TPS: 2.00)"));

        let optimized = advisor.optimize_gas_fees().unwrap();
        assert_eq!(optimized.current.gwei(), 25.0);
        let log = &advisor.logs()[0];
        assert_eq!(log.severity, LogSeverity::Info);
        assert!(log.message.starts_with("Network is busy"));

        lock(&ledger).set_gas_price(GasPrice::new(198.0));
        let congestion = advisor.handle_congestion().unwrap();
        assert_eq!(congestion.current.gwei(), GasPrice::MAX);
        assert_eq!(lock(&ledger).gas_price().gwei(), GasPrice::MAX);
    }

    #[test]
    fn spawned_manual_scan_is_skipped_while_busy() {
        let (ledger, advisor) = setup(300);
        mine_pair(&ledger, 3, 1_500);
        let advisor = Arc::new(advisor);

        let first = advisor.spawn_manual_scan().unwrap();
        thread::sleep(Duration::from_millis(50));
        assert!(advisor.spawn_manual_scan().is_none());

        assert!(matches!(first.join().unwrap(), ScanOutcome::Completed(_)));
        assert_eq!(advisor.scans_completed(), 1);
        assert!(!advisor.is_scanning());
    }

    #[test]
    fn greeting_and_shutdown_follow_the_autonomous_flag() {
        let (_, advisor) = setup(0);
        assert!(advisor.logs()[0].message.ends_with("Starting autonomous monitoring..."));
        advisor.stop_monitoring();
        let log = &advisor.logs()[0];
        assert_eq!(log.message, "AI autonomous mode stopped.");
        assert_eq!(log.severity, LogSeverity::Warning);

        let config = SimulationConfig {
            autonomous: false,
            ..config(0)
        };
        let ledger = Arc::new(Mutex::new(Ledger::new(&config, EventBus::new())));
        let manual = NetworkAdvisor::new(&config, ledger, EventBus::new());
        assert_eq!(manual.logs()[0].message, "AI Maintainer Initialized. Autonomous mode is off.");
        manual.stop_monitoring();
        assert_eq!(manual.logs().len(), 1);
    }
}
