use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use colored::Colorize;
use log::{info, warn};
use simple_logger::SimpleLogger;

use aenz_chain_sim::advisor::{AiLog, LogSeverity};
use aenz_chain_sim::events::SimEvent;
use aenz_chain_sim::model::{Block, SearchHit};
use aenz_chain_sim::{Result, Simulation, SimulationConfig, SimulationError};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f UTC";

/// Print block information to console
fn print_block(block: &Block) {
    let label = if block.is_genesis() { "Genesis" } else { "Block" };
    println!(
        "\n________________________AENZ {} #{}_________________________________",
        label, block.height
    );
    println!("Block Hash       : {}", block.hash);
    println!("Parent Hash      : {}", block.parent_hash);
    println!("Timestamp        : {}", block.timestamp.format(TIME_FORMAT));
    println!("Validator        : {}", block.validator);
    println!("Transactions     : {} transaction(s)", block.transactions.len());
    for (i, tx) in block.transactions.iter().enumerate() {
        println!("  Transaction #{}", i + 1);
        println!("    Hash      : {}", tx.hash);
        println!("    From      : {}", tx.from);
        println!("    To        : {}", tx.to);
        println!("    Amount    : {} AENZ", tx.amount);
        if let Some(fee) = tx.fee {
            println!("    Fee       : {:.6} AENZ", fee);
        }
    }
    println!("____________________________________________________________________________");
}

fn print_advisor_log(entry: &AiLog) {
    let time = entry.timestamp.format("%H:%M:%S");
    let line = format!("[AI {}] {}", time, entry.message);
    let line = match entry.severity {
        LogSeverity::Info => line.cyan(),
        LogSeverity::Success => line.green(),
        LogSeverity::Warning => line.yellow(),
        LogSeverity::Error => line.red().bold(),
    };
    println!("{}", line);
}

/// Exercise the wallet, DApp and staking actions once so the ledger
/// carries user activity next to the mined traffic.
fn run_wallet_actions(sim: &Simulation) {
    let actions = [
        ("Create token", sim.create_token("Aenz Gold", "AGLD", 1_000_000.0)),
        ("Create NFT collection", sim.create_nft_collection("Aenz Pixels", "APX")),
        ("Deploy contract", sim.deploy_contract()),
        ("Send transaction", sim.send_transaction("aenz_0b5e6f7a8c9d0e1f2a3b4c5d6e7f8a9b0c1d2e3f", 25.0)),
        ("Stake", sim.stake(100.0)),
    ];

    let mut token_address = None;
    for (label, result) in actions {
        match result {
            Ok(receipt) => {
                println!("{} {}: {}", "✔".green(), label, receipt.message);
                if label == "Create token" {
                    token_address = Some(receipt.transaction.to);
                }
            }
            Err(e) => println!("{} {}: {}", "✘".red(), label, e),
        }
    }

    if let Some(address) = token_address {
        match sim.mint_tokens(&address, 5_000.0) {
            Ok(receipt) => println!("{} Mint: {}", "✔".green(), receipt.message),
            Err(e) => println!("{} Mint: {}", "✘".red(), e),
        }
    }
}

/// Claim any accrued rewards and withdraw the stake before the final report.
fn settle_staking(sim: &Simulation) -> Result<()> {
    if sim.pending_rewards() > 0.0 {
        let receipt = sim.claim_rewards()?;
        println!("{} Claim rewards: {}", "✔".green(), receipt.message);
    }
    let staked = sim.staked_balance();
    if staked > 0.0 {
        let receipt = sim.unstake(staked)?;
        println!("{} Unstake: {}", "✔".green(), receipt.message);
    }
    Ok(())
}

/// Run the chain simulation
fn run_simulation() -> Result<()> {
    let config = SimulationConfig::from_env()?;

    // Initialize logging
    SimpleLogger::new()
        .with_level(config.log_level_filter()?)
        .init()
        .map_err(|e| SimulationError::Logger(format!("Failed to initialize logger: {}", e)))?;

    info!("Initializing AENZ chain simulation...");
    info!("  - Block interval     : {:?}", config.block_interval());
    info!("  - Advisor scan every : {:?}", config.scan_interval());
    info!("  - Running for        : {}s", config.run_for_secs);

    let mut sim = Simulation::new(config)?;
    let events = sim.subscribe();

    if let Some(SearchHit::Block(genesis)) = sim.search("0") {
        print_block(&genesis);
    }
    run_wallet_actions(&sim);

    sim.start()?;

    let deadline = Instant::now() + Duration::from_secs(sim.config().run_for_secs);
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }

        match events.recv_timeout(remaining) {
            Ok(SimEvent::BlockMined { height, .. }) => {
                if let Some(SearchHit::Block(block)) = sim.search(&height.to_string()) {
                    print_block(&block);
                }
            }
            Ok(SimEvent::AdvisorLog(entry)) => print_advisor_log(&entry),
            Ok(SimEvent::GasPriceChanged { previous, current }) => {
                let arrow = if current > previous { "▲".red() } else { "▼".green() };
                println!("Gas price {} {} → {} gwei", arrow, previous, current);
            }
            Ok(SimEvent::StatusChanged { previous, current }) => {
                println!("Network status: {} → {}", previous, current.to_string().bold());
            }
            Ok(_) => {}
            Err(RecvTimeoutError::Timeout) => break,
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Event bus closed before the run finished");
                break;
            }
        }
    }

    sim.stop();
    settle_staking(&sim)?;

    let advisor = sim.advisor();
    info!("\nSimulation finished.");
    info!("  - Network status : {}", advisor.status());
    info!("  - Last TPS       : {}", advisor.transactions_per_second());
    info!("  - Scans completed: {}", advisor.scans_completed());
    info!("  - Staking APY    : {}%", sim.staking_apy());

    println!("{}", serde_json::to_string_pretty(&sim.dashboard())?);
    Ok(())
}

fn main() {
    // Run the simulation and handle any errors
    if let Err(e) = run_simulation() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
