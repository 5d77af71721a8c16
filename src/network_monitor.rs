// Network Monitor TUI
// Runs the simulation in-process and renders gas price, advisor status,
// recent blocks and the advisor log in the terminal.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use tui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph, Row, Table},
    Terminal,
};

use aenz_chain_sim::advisor::{LogSeverity, ScanOutcome};
use aenz_chain_sim::events::SimEvent;
use aenz_chain_sim::model::GasPrice;
use aenz_chain_sim::{NetworkStatus, Result, Simulation, SimulationConfig, SimulationError};

const GAS_HISTORY_POINTS: usize = 200;
const INPUT_POLL_MS: u64 = 200;
const LOG_ROWS: usize = 20;

fn status_color(status: NetworkStatus) -> Color {
    match status {
        NetworkStatus::Optimal => Color::Green,
        NetworkStatus::Stable => Color::Cyan,
        NetworkStatus::Congested => Color::Yellow,
        NetworkStatus::Critical => Color::Red,
    }
}

fn severity_color(severity: LogSeverity) -> Color {
    match severity {
        LogSeverity::Info => Color::Gray,
        LogSeverity::Success => Color::Green,
        LogSeverity::Warning => Color::Yellow,
        LogSeverity::Error => Color::Red,
    }
}

/// Raw mode and the alternate screen, restored on drop so an error
/// mid-draw still hands back a usable terminal.
struct TerminalGuard<W: Write> {
    out: W,
}

impl<W: Write> TerminalGuard<W> {
    fn enter(mut out: W) -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(out, EnterAlternateScreen, Hide)?;
        Ok(TerminalGuard { out })
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.out, LeaveAlternateScreen, Show);
    }
}

fn run_monitor(sim: &Simulation) -> Result<()> {
    let _screen = TerminalGuard::enter(io::stdout())?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    // Scans sleep through their analysis delay, so manual ones run off the UI thread
    let mut manual_scan: Option<JoinHandle<ScanOutcome>> = None;

    let events = sim.subscribe();
    let advisor = Arc::clone(sim.advisor());
    let mut gas_history: VecDeque<f64> = VecDeque::with_capacity(GAS_HISTORY_POINTS);
    gas_history.push_back(sim.ledger().gas_price().gwei());

    loop {
        for event in events.try_iter() {
            if let SimEvent::GasPriceChanged { current, .. } = event {
                gas_history.push_back(current);
                if gas_history.len() > GAS_HISTORY_POINTS {
                    gas_history.pop_front();
                }
            }
        }

        let view = sim.dashboard();
        let status = advisor.status();
        let tps = advisor.transactions_per_second();
        let autonomous = advisor.is_autonomous();
        let scanning = advisor.is_scanning();
        let logs: Vec<_> = advisor.logs().into_iter().take(LOG_ROWS).collect();
        let staked = sim.staked_balance();
        let rewards = sim.pending_rewards();
        let apy = sim.staking_apy();
        let chart_data: Vec<(f64, f64)> = gas_history
            .iter()
            .enumerate()
            .map(|(i, gas)| (i as f64, *gas))
            .collect();

        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3), // Title
                        Constraint::Length(7), // Stats
                        Constraint::Min(10),   // Chart + blocks
                        Constraint::Length(12), // Advisor log
                        Constraint::Length(1), // Footer
                    ]
                    .as_ref(),
                )
                .split(f.size());

            let title = Paragraph::new(format!(
                "Gas: {} gwei | Status: {} | TPS: {}",
                view.gas_price, status, tps
            ))
            .style(Style::default().fg(status_color(status)).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().title(" AENZ NETWORK MONITOR ").borders(Borders::ALL));
            f.render_widget(title, chunks[0]);

            let stats_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
                .split(chunks[1]);

            let chain_stats = Paragraph::new(
                [
                    format!("Latest height : {}", view.latest_height.map_or("-".to_string(), |h| h.to_string())),
                    format!("Blocks mined  : {}", view.blocks_mined),
                    format!("Transactions  : {}", view.transactions_recorded),
                    format!("User assets   : {}", view.asset_count),
                    format!(
                        "Advisor       : {}{}",
                        if autonomous { "autonomous" } else { "manual" },
                        if scanning { " (scanning...)" } else { "" }
                    ),
                ]
                .join("\n"),
            )
            .block(Block::default().title(" CHAIN ").borders(Borders::ALL));
            f.render_widget(chain_stats, stats_chunks[0]);

            let wallet_stats = Paragraph::new(
                [
                    format!("Address : {}", view.wallet.address),
                    format!("Balance : {:.4} AENZ", view.wallet.balance),
                    format!("Staked  : {:.4} AENZ", staked),
                    format!("Rewards : {:.8} AENZ", rewards),
                    format!("APY     : {}%", apy),
                ]
                .join("\n"),
            )
            .block(Block::default().title(" WALLET ").borders(Borders::ALL));
            f.render_widget(wallet_stats, stats_chunks[1]);

            let middle = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)].as_ref())
                .split(chunks[2]);

            let datasets = vec![Dataset::default()
                .name("gas (gwei)")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Cyan))
                .data(&chart_data)];
            let chart = Chart::new(datasets)
                .block(Block::default().title(" GAS PRICE ").borders(Borders::ALL))
                .x_axis(
                    Axis::default()
                        .title("Adjustments")
                        .style(Style::default().fg(Color::DarkGray))
                        .bounds([0.0, GAS_HISTORY_POINTS.max(chart_data.len()) as f64]),
                )
                .y_axis(
                    Axis::default()
                        .title("gwei")
                        .style(Style::default().fg(Color::DarkGray))
                        .bounds([GasPrice::MIN, GasPrice::MAX])
                        .labels(vec![
                            format!("{}", GasPrice::MIN).into(),
                            format!("{}", (GasPrice::MIN + GasPrice::MAX) / 2.0).into(),
                            format!("{}", GasPrice::MAX).into(),
                        ]),
                );
            f.render_widget(chart, middle[0]);

            let rows = view.recent_blocks.iter().map(|block| {
                Row::new(vec![
                    format!("#{}", block.height),
                    block.transactions.len().to_string(),
                    block.timestamp.format("%H:%M:%S").to_string(),
                    block.hash.chars().take(14).collect::<String>(),
                ])
            });
            let widths = [
                Constraint::Length(8),
                Constraint::Length(4),
                Constraint::Length(9),
                Constraint::Min(14),
            ];
            let blocks = Table::new(rows)
                .header(
                    Row::new(vec!["Height", "Txs", "Time", "Hash"])
                        .style(Style::default().add_modifier(Modifier::BOLD)),
                )
                .block(Block::default().title(" RECENT BLOCKS ").borders(Borders::ALL))
                .widths(&widths);
            f.render_widget(blocks, middle[1]);

            let items: Vec<ListItem> = logs
                .iter()
                .map(|entry| {
                    ListItem::new(format!("{} {}", entry.timestamp.format("%H:%M:%S"), entry.message))
                        .style(Style::default().fg(severity_color(entry.severity)))
                })
                .collect();
            let log_list = List::new(items).block(Block::default().title(" AI MAINTAINER ").borders(Borders::ALL));
            f.render_widget(log_list, chunks[3]);

            let footer = Paragraph::new(
                "'s' scan | 'a' autonomous on/off | 'o' optimize gas | 'c' handle congestion | 'q'/Esc quit",
            )
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
            f.render_widget(footer, chunks[4]);
        })?;

        if event::poll(Duration::from_millis(INPUT_POLL_MS))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char('s') => {
                        if manual_scan.as_ref().map_or(true, |h| h.is_finished()) {
                            join_scan(manual_scan.take());
                            manual_scan = advisor.spawn_manual_scan();
                        }
                    }
                    KeyCode::Char('a') => {
                        advisor.toggle_autonomous();
                    }
                    KeyCode::Char('o') => {
                        advisor.optimize_gas_fees();
                    }
                    KeyCode::Char('c') => {
                        advisor.handle_congestion();
                    }
                    _ => {}
                }
            }
        }
    }

    join_scan(manual_scan);
    Ok(())
}

fn join_scan(handle: Option<JoinHandle<ScanOutcome>>) {
    if let Some(handle) = handle {
        if handle.join().is_err() {
            log::error!("Manual scan thread panicked");
        }
    }
}

fn run() -> Result<()> {
    let mut config = SimulationConfig::from_env()?;
    // Log lines would tear through the alternate screen
    config.log_level = "off".to_string();
    simple_logger::SimpleLogger::new()
        .with_level(config.log_level_filter()?)
        .init()
        .map_err(|e| SimulationError::Logger(format!("Failed to initialize logger: {}", e)))?;

    let mut sim = Simulation::new(config)?;
    sim.start()?;
    let outcome = run_monitor(&sim);
    sim.stop();
    outcome
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
