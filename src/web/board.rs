//! Display-side tab state.
//!
//! The board is initialised with the ordered endpoint names before any
//! payload arrives and keeps the latest html per tab. Payloads may arrive in
//! any order and more than once; a payload from an older cycle than the one
//! already shown is ignored.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use serde::Serialize;

use crate::poller::{CycleId, RenderPayload};

/// Latest content of one tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabContent {
    pub api: String,
    pub data: String,
    pub cycle: CycleId,
    pub updated_at: DateTime<Utc>,
}

/// Why a payload was not shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    UnknownTab,
    Stale { shown: CycleId },
}

#[derive(Debug, Default)]
pub struct TabBoard {
    names: Vec<String>,
    contents: HashMap<String, TabContent>,
}

pub type SharedBoard = Arc<Mutex<TabBoard>>;

impl TabBoard {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            contents: HashMap::new(),
        }
    }

    pub fn shared(names: Vec<String>) -> SharedBoard {
        Arc::new(Mutex::new(Self::new(names)))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Replace a tab's content with `payload` unless it is stale.
    pub fn render(&mut self, payload: RenderPayload) -> Result<(), Rejected> {
        if !self.names.iter().any(|n| *n == payload.endpoint_name) {
            return Err(Rejected::UnknownTab);
        }

        if let Some(shown) = self.contents.get(&payload.endpoint_name)
            && payload.cycle < shown.cycle
        {
            return Err(Rejected::Stale { shown: shown.cycle });
        }

        self.contents.insert(
            payload.endpoint_name.clone(),
            TabContent {
                api: payload.endpoint_name,
                data: payload.html,
                cycle: payload.cycle,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    pub fn content(&self, name: &str) -> Option<&TabContent> {
        self.contents.get(name)
    }

    /// Rendered tabs in tab order. Tabs with nothing delivered yet are
    /// skipped.
    pub fn snapshot(&self) -> Vec<TabContent> {
        self.names
            .iter()
            .filter_map(|n| self.contents.get(n).cloned())
            .collect()
    }

    /// Highest cycle id shown on any tab, 0 if none.
    pub fn latest_cycle(&self) -> CycleId {
        self.contents.values().map(|c| c.cycle).max().unwrap_or(0)
    }
}

/// Drain the render channel into the board until every sender is gone.
pub fn spawn_display(board: SharedBoard, renders: Receiver<RenderPayload>) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("apiview-display".to_string())
        .spawn(move || {
            for payload in renders.iter() {
                let _ = board.lock().render(payload);
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, html: &str, cycle: CycleId) -> RenderPayload {
        RenderPayload {
            endpoint_name: name.to_string(),
            html: html.to_string(),
            cycle,
        }
    }

    fn board() -> TabBoard {
        TabBoard::new(vec!["A".to_string(), "B".to_string()])
    }

    #[test]
    fn newer_cycle_replaces_content() {
        let mut b = board();
        b.render(payload("A", "one", 1)).unwrap();
        b.render(payload("A", "two", 2)).unwrap();
        assert_eq!(b.content("A").unwrap().data, "two");
    }

    #[test]
    fn duplicate_of_same_cycle_last_one_wins() {
        let mut b = board();
        b.render(payload("A", "first", 4)).unwrap();
        b.render(payload("A", "second", 4)).unwrap();
        assert_eq!(b.content("A").unwrap().data, "second");
    }

    #[test]
    fn stale_payload_is_ignored() {
        let mut b = board();
        b.render(payload("A", "new", 5)).unwrap();
        assert_eq!(
            b.render(payload("A", "old", 3)),
            Err(Rejected::Stale { shown: 5 })
        );
        assert_eq!(b.content("A").unwrap().data, "new");
    }

    #[test]
    fn unknown_tab_is_rejected() {
        let mut b = board();
        assert_eq!(b.render(payload("Z", "x", 1)), Err(Rejected::UnknownTab));
        assert!(b.snapshot().is_empty());
    }

    #[test]
    fn snapshot_follows_tab_order_regardless_of_arrival() {
        let mut b = board();
        b.render(payload("B", "b", 1)).unwrap();
        b.render(payload("A", "a", 1)).unwrap();
        let order: Vec<_> = b.snapshot().into_iter().map(|c| c.api).collect();
        assert_eq!(order, vec!["A", "B"]);
        assert_eq!(b.latest_cycle(), 1);
    }

    #[test]
    fn display_thread_drains_channel() {
        let shared = TabBoard::shared(vec!["A".to_string()]);
        let (tx, rx) = crossbeam::channel::unbounded();
        let handle = spawn_display(Arc::clone(&shared), rx).unwrap();
        tx.send(payload("A", "hello", 1)).unwrap();
        drop(tx);
        handle.join().unwrap();
        assert_eq!(shared.lock().content("A").unwrap().data, "hello");
    }
}
