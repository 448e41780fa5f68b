//! In-process ledger
//!
//! Answers the same tagged requests as the hosted process and replies in the
//! same envelope, so everything above the transport runs unchanged against
//! it. Used by the native binary and the tests.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use serde_json::json;

use super::client::Transport;
use super::wire::{self, LedgerRequest, LedgerResponse, WireEntry, WireStats, action, tag};
use crate::error::LedgerError;
use crate::bests::insertion_index;

#[derive(Debug, Clone)]
struct Submission {
    game_id: String,
    wallet: String,
    username: String,
    score: u64,
    timestamp: String,
}

impl Submission {
    fn to_wire(&self) -> WireEntry {
        WireEntry::new(&self.wallet, Some(&self.username), self.score, &self.timestamp)
    }
}

#[derive(Debug, Default)]
struct Tables {
    games: HashSet<String>,
    /// Oldest first
    submissions: Vec<Submission>,
}

#[derive(Debug, Default)]
pub struct MemoryLedger {
    tables: RefCell<Tables>,
    next_tx: Cell<u64>,
    offline: Cell<bool>,
    fail_next: RefCell<Option<LedgerError>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register directly, without going through a request
    pub fn register_game(&self, game_id: &str) {
        self.tables.borrow_mut().games.insert(game_id.to_owned());
    }

    /// While offline every request fails with a network error
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Fail only the next request with `err`
    pub fn fail_next(&self, err: LedgerError) {
        *self.fail_next.borrow_mut() = Some(err);
    }

    pub fn submission_count(&self) -> usize {
        self.tables.borrow().submissions.len()
    }

    fn transaction_id(&self) -> String {
        let n = self.next_tx.get() + 1;
        self.next_tx.set(n);
        format!("mem-{}", n)
    }

    fn handle(&self, request: &LedgerRequest) -> LedgerResponse {
        match request.action() {
            Some(action::REGISTER_GAME) => self.on_register(request),
            Some(action::SUBMIT_SCORE) => self.on_submit(request),
            Some(action::QUERY_TOP_PLAYERS) => self.on_top_players(request),
            Some(action::QUERY_LAST_PLAYERS) => self.on_recent(request),
            Some(action::QUERY_PLAYER_HISTORY) => self.on_history(request),
            Some(action::QUERY_GAME_STATS) => self.on_stats(request),
            Some(action::GET_TOTAL_PLAYERS) => self.on_total_players(request),
            Some(other) => LedgerResponse::failed(format!("Unknown action: {}", other)),
            None => LedgerResponse::failed("Missing Action"),
        }
    }

    fn on_register(&self, request: &LedgerRequest) -> LedgerResponse {
        let Some(game_id) = request.tag(tag::GAME_ID) else {
            return LedgerResponse::failed("Missing GameId");
        };
        self.register_game(game_id);
        LedgerResponse::written(self.transaction_id())
    }

    fn on_submit(&self, request: &LedgerRequest) -> LedgerResponse {
        let (Some(game_id), Some(wallet)) = (request.tag(tag::GAME_ID), request.tag(tag::WALLET_ADDRESS)) else {
            return LedgerResponse::failed("Missing GameId or WalletAddress");
        };
        let Some(score) = request.tag(tag::SCORE).and_then(|s| s.parse::<u64>().ok()) else {
            return LedgerResponse::failed("Invalid score");
        };

        let mut tables = self.tables.borrow_mut();
        if !tables.games.contains(game_id) {
            return LedgerResponse::failed("Game not registered");
        }
        tables.submissions.push(Submission {
            game_id: game_id.to_owned(),
            wallet: wallet.to_owned(),
            username: request.tag(tag::USERNAME).unwrap_or(wire::ANONYMOUS).to_owned(),
            score,
            timestamp: request.tag(tag::TIMESTAMP).unwrap_or_default().to_owned(),
        });
        drop(tables);
        LedgerResponse::written(self.transaction_id())
    }

    fn on_top_players(&self, request: &LedgerRequest) -> LedgerResponse {
        let game_id = request.tag(tag::GAME_ID).unwrap_or_default();
        let page = request.tag_u32(tag::PAGE, 1).max(1) as usize;
        let page_size = request.tag_u32(tag::PAGE_SIZE, 10) as usize;

        let tables = self.tables.borrow();
        // Best submission per wallet, kept sorted by descending score
        let mut best: Vec<&Submission> = Vec::new();
        for sub in tables.submissions.iter().filter(|s| s.game_id == game_id) {
            if let Some(i) = best.iter().position(|b| b.wallet == sub.wallet) {
                if sub.score <= best[i].score {
                    continue;
                }
                best.remove(i);
            }
            let at = insertion_index(&best, sub.score, |b| b.score);
            best.insert(at, sub);
        }

        let rows: Vec<WireEntry> = best
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .map(Submission::to_wire)
            .collect();
        reply(&rows)
    }

    fn on_recent(&self, request: &LedgerRequest) -> LedgerResponse {
        let game_id = request.tag(tag::GAME_ID).unwrap_or_default();
        let limit = request.tag_u32(tag::LIMIT, 10) as usize;
        let tables = self.tables.borrow();
        let rows: Vec<WireEntry> = tables
            .submissions
            .iter()
            .rev()
            .filter(|s| s.game_id == game_id)
            .take(limit)
            .map(Submission::to_wire)
            .collect();
        reply(&rows)
    }

    fn on_history(&self, request: &LedgerRequest) -> LedgerResponse {
        let Some(wallet) = request.tag(tag::WALLET_ADDRESS) else {
            return LedgerResponse::failed("Missing WalletAddress");
        };
        let game_id = request.tag(tag::GAME_ID);
        let page = request.tag_u32(tag::PAGE, 1).max(1) as usize;
        let page_size = request.tag_u32(tag::PAGE_SIZE, 10) as usize;

        let tables = self.tables.borrow();
        let mut mine: Vec<&Submission> = tables
            .submissions
            .iter()
            .filter(|s| s.wallet == wallet && game_id.is_none_or(|g| s.game_id == g))
            .collect();
        mine.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let rows: Vec<WireEntry> = mine
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .map(Submission::to_wire)
            .collect();
        reply(&rows)
    }

    fn on_stats(&self, request: &LedgerRequest) -> LedgerResponse {
        let game_id = request.tag(tag::GAME_ID).unwrap_or_default();
        let tables = self.tables.borrow();
        let subs: Vec<&Submission> = tables.submissions.iter().filter(|s| s.game_id == game_id).collect();
        let players: HashSet<&str> = subs.iter().map(|s| s.wallet.as_str()).collect();
        let stats = WireStats {
            total_score: subs.iter().map(|s| s.score).sum(),
            total_players: players.len() as u64,
            submission_count: subs.len() as u64,
        };
        reply(&stats)
    }

    fn on_total_players(&self, request: &LedgerRequest) -> LedgerResponse {
        let game_id = request.tag(tag::GAME_ID).unwrap_or_default();
        let tables = self.tables.borrow();
        let players: HashSet<&str> = tables
            .submissions
            .iter()
            .filter(|s| s.game_id == game_id)
            .map(|s| s.wallet.as_str())
            .collect();
        LedgerResponse::ok(json!({ "totalPlayers": players.len() }))
    }
}

fn reply<T: serde::Serialize>(data: &T) -> LedgerResponse {
    match serde_json::to_value(data) {
        Ok(value) => LedgerResponse::ok(value),
        Err(e) => LedgerResponse::failed(e.to_string()),
    }
}

impl Transport for MemoryLedger {
    async fn send(&self, request: &LedgerRequest) -> Result<LedgerResponse, LedgerError> {
        if self.offline.get() {
            return Err(LedgerError::Network("ledger unreachable".into()));
        }
        if let Some(err) = self.fail_next.borrow_mut().take() {
            return Err(err);
        }
        Ok(self.handle(request))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn submit(ledger: &MemoryLedger, wallet: &str, score: u64, ts: &str) -> LedgerResponse {
        ledger.handle(&LedgerRequest::submit_score("G", score, None, wallet, ts))
    }

    fn data(response: &LedgerResponse) -> Value {
        response.data().unwrap()
    }

    #[test]
    fn test_unregistered_game_rejected() {
        let ledger = MemoryLedger::new();
        let response = submit(&ledger, "w", 10, "t");
        assert_eq!(
            response.receipt().unwrap_err(),
            LedgerError::Rejected("Game not registered".into())
        );
        assert_eq!(ledger.submission_count(), 0);
    }

    #[test]
    fn test_transaction_ids_increase() {
        let ledger = MemoryLedger::new();
        ledger.register_game("G");
        assert_eq!(submit(&ledger, "w", 10, "t").id.as_deref(), Some("mem-1"));
        assert_eq!(submit(&ledger, "w", 20, "t").id.as_deref(), Some("mem-2"));
    }

    #[test]
    fn test_top_players_best_per_wallet_paginated() {
        let ledger = MemoryLedger::new();
        ledger.register_game("G");
        for (wallet, score) in [("a", 50), ("b", 70), ("a", 90), ("c", 70), ("d", 10)] {
            submit(&ledger, wallet, score, "t");
        }

        let page1 = data(&ledger.handle(&LedgerRequest::top_players("G", 1, 3)));
        let scores: Vec<&str> = page1
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["score"].as_str().unwrap())
            .collect();
        // Ties keep submission order
        assert_eq!(scores, vec!["90", "70", "70"]);
        assert_eq!(page1[1]["walletAddress"], "b");

        let page2 = data(&ledger.handle(&LedgerRequest::top_players("G", 2, 3)));
        assert_eq!(page2.as_array().unwrap().len(), 1);
        assert_eq!(page2[0]["walletAddress"], "d");
    }

    #[test]
    fn test_history_sorted_by_timestamp() {
        let ledger = MemoryLedger::new();
        ledger.register_game("G");
        submit(&ledger, "a", 30, "2024-01-02T00:00:00.000Z");
        submit(&ledger, "a", 20, "2024-01-01T00:00:00.000Z");
        submit(&ledger, "b", 99, "2024-01-01T00:00:00.000Z");

        let rows = data(&ledger.handle(&LedgerRequest::player_history("a", None, 1, 10)));
        let scores: Vec<&str> = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["score"].as_str().unwrap())
            .collect();
        assert_eq!(scores, vec!["20", "30"]);
    }

    #[test]
    fn test_unknown_action_fails() {
        let ledger = MemoryLedger::new();
        let mut request = LedgerRequest::game_stats("G");
        request.tags[0].value = "drop-tables".into();
        assert!(matches!(
            ledger.handle(&request).data(),
            Err(LedgerError::Rejected(_))
        ));
    }

    #[test]
    fn test_failure_injection() {
        let ledger = MemoryLedger::new();
        ledger.fail_next(LedgerError::Permission("denied".into()));
        let request = LedgerRequest::game_stats("G");
        assert_eq!(
            pollster::block_on(ledger.send(&request)).unwrap_err(),
            LedgerError::Permission("denied".into())
        );
        assert!(pollster::block_on(ledger.send(&request)).is_ok());

        ledger.set_offline(true);
        assert!(matches!(
            pollster::block_on(ledger.send(&request)),
            Err(LedgerError::Network(_))
        ));
    }
}
