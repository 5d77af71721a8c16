use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use log::debug;

use crate::advisor::{AiLog, NetworkStatus};
use crate::lock;

/// Change notifications published by the ledger and the advisor.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    BlockMined { height: u64, transactions: usize },
    TransactionRecorded { hash: String },
    WalletUpdated { address: String, balance: f64 },
    AssetsUpdated { count: usize },
    GasPriceChanged { previous: f64, current: f64 },
    StatusChanged { previous: NetworkStatus, current: NetworkStatus },
    AdvisorLog(AiLog),
}

/// Fan-out of [`SimEvent`]s to any number of `mpsc` subscribers. Clones
/// share the same subscriber list.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<SimEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<SimEvent> {
        let (tx, rx) = mpsc::channel();
        lock(&self.subscribers).push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber, dropping the ones whose receiver is gone.
    pub fn publish(&self, event: SimEvent) {
        let mut subscribers = lock(&self.subscribers);
        let before = subscribers.len();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        if subscribers.len() < before {
            debug!("Dropped {} disconnected subscriber(s)", before - subscribers.len());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }
}
