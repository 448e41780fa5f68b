//! Score ledger and wallet collaborators
//!
//! The game only ever talks to the traits here. [`LedgerClient`] speaks the
//! tag-based wire format over any [`Transport`]: [`MemoryLedger`] in process,
//! or the browser fetch transport on the web.

mod client;
#[cfg(target_arch = "wasm32")]
pub mod fetch;
mod memory;
pub mod poll;
pub mod retry;
pub mod wallet;
pub mod wire;

use std::cell::RefCell;
use std::rc::Weak;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, WalletError};

pub use client::{LedgerClient, Transport, iso_timestamp};
pub use memory::MemoryLedger;
pub use poll::{LeaderboardPanel, poll_leaderboard};
pub use retry::{Backoff, Sleeper, retry};
pub use wallet::MemoryWallet;

/// Permissions requested when connecting a wallet
pub const WALLET_PERMISSIONS: [&str; 2] = ["ACCESS_ADDRESS", "SIGN_TRANSACTION"];

/// Proof that a write was accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Badge {
    Gold,
    Silver,
    Bronze,
}

impl Badge {
    /// Medal for a 1-indexed rank
    pub fn for_rank(rank: u32) -> Option<Badge> {
        match rank {
            1 => Some(Badge::Gold),
            2 => Some(Badge::Silver),
            3 => Some(Badge::Bronze),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Badge::Gold => "gold",
            Badge::Silver => "silver",
            Badge::Bronze => "bronze",
        }
    }
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-indexed for top lists, 0 where ranking doesn't apply
    pub rank: u32,
    pub wallet_address: String,
    pub username: String,
    pub score: u64,
    /// ISO-8601
    pub timestamp: String,
    pub badge: Option<Badge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: u64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerHistory {
    pub wallet_address: String,
    pub username: String,
    pub scores: Vec<ScoreRecord>,
    pub total_score: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub total_score: u64,
    pub total_players: u64,
    pub submission_count: u64,
}

/// Browser wallet holding the player's identity
#[allow(async_fn_in_trait)]
pub trait WalletProvider {
    /// Ask for [`WALLET_PERMISSIONS`] and return the active address
    async fn connect(&self) -> Result<String, WalletError>;
    async fn disconnect(&self) -> Result<(), WalletError>;
    async fn active_address(&self) -> Option<String>;
    async fn permissions(&self) -> Vec<String>;
}

#[allow(async_fn_in_trait)]
pub trait ScoreService {
    async fn submit_score(
        &self,
        identity: &str,
        game_id: &str,
        score: u64,
        display_name: Option<&str>,
    ) -> Result<Receipt, LedgerError>;
}

#[allow(async_fn_in_trait)]
pub trait LeaderboardService {
    async fn top_players(&self, game_id: &str, page: u32, page_size: u32) -> Result<Vec<LeaderboardEntry>, LedgerError>;
    async fn recent_players(&self, game_id: &str, limit: u32) -> Result<Vec<LeaderboardEntry>, LedgerError>;
    async fn player_history(&self, address: &str, game_id: Option<&str>) -> Result<PlayerHistory, LedgerError>;
    async fn game_stats(&self, game_id: &str) -> Result<GameStats, LedgerError>;
}

/// Submission progress shown next to the game-over panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionStatus {
    pub saving: bool,
    pub last_transaction: Option<String>,
    pub failed: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No wallet connected
    NoIdentity,
    /// Nothing worth recording
    NoScore,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(Receipt),
    Skipped(SkipReason),
    Failed(LedgerError),
}

fn update_status(status: &Weak<RefCell<SubmissionStatus>>, f: impl FnOnce(&mut SubmissionStatus)) {
    if let Some(status) = status.upgrade() {
        f(&mut status.borrow_mut());
    }
}

/// Submit a finished session's score.
///
/// Skipped without an identity or with a zero score. Errors are logged and
/// recorded on `status`; nothing is propagated to the game. If the status
/// owner is gone by the time the call completes, the result is dropped.
pub async fn report_final_score<S: ScoreService>(
    service: &S,
    identity: Option<&str>,
    game_id: &str,
    score: u64,
    display_name: Option<&str>,
    status: &Weak<RefCell<SubmissionStatus>>,
) -> SubmitOutcome {
    let Some(identity) = identity.filter(|id| !id.is_empty()) else {
        log::info!("No wallet connected; score {} not submitted", score);
        return SubmitOutcome::Skipped(SkipReason::NoIdentity);
    };
    if score == 0 {
        return SubmitOutcome::Skipped(SkipReason::NoScore);
    }

    update_status(status, |s| {
        s.saving = true;
        s.failed = false;
        s.last_error = None;
    });

    let result = service.submit_score(identity, game_id, score, display_name).await;

    match result {
        Ok(receipt) => {
            log::info!("Score {} submitted ({})", score, receipt.transaction_id);
            update_status(status, |s| {
                s.saving = false;
                s.last_transaction = Some(receipt.transaction_id.clone());
            });
            SubmitOutcome::Submitted(receipt)
        }
        Err(e) => {
            log::error!("Error submitting score: {}", e);
            update_status(status, |s| {
                s.saving = false;
                s.failed = true;
                s.last_error = Some(e.to_string());
            });
            SubmitOutcome::Failed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::GAME_ID;
    use crate::platform::ManualClock;

    fn client() -> LedgerClient<MemoryLedger, ManualClock> {
        let ledger = MemoryLedger::new();
        ledger.register_game(GAME_ID);
        LedgerClient::new(ledger, ManualClock::new(1_714_557_600_000.0))
    }

    #[test]
    fn test_badges() {
        assert_eq!(Badge::for_rank(1), Some(Badge::Gold));
        assert_eq!(Badge::for_rank(3).map(|b| b.as_str()), Some("bronze"));
        assert_eq!(Badge::for_rank(0), None);
        assert_eq!(Badge::for_rank(4), None);
    }

    #[test]
    fn test_report_without_identity_is_skipped() {
        let service = client();
        let status = Rc::new(RefCell::new(SubmissionStatus::default()));
        let outcome = pollster::block_on(report_final_score(
            &service,
            None,
            GAME_ID,
            500,
            None,
            &Rc::downgrade(&status),
        ));
        assert_eq!(outcome, SubmitOutcome::Skipped(SkipReason::NoIdentity));
        assert_eq!(*status.borrow(), SubmissionStatus::default());
        assert_eq!(service.transport().submission_count(), 0);
    }

    #[test]
    fn test_report_zero_score_is_skipped() {
        let service = client();
        let status = Rc::new(RefCell::new(SubmissionStatus::default()));
        let outcome = pollster::block_on(report_final_score(
            &service,
            Some("wallet-a"),
            GAME_ID,
            0,
            None,
            &Rc::downgrade(&status),
        ));
        assert_eq!(outcome, SubmitOutcome::Skipped(SkipReason::NoScore));
    }

    #[test]
    fn test_report_records_transaction() {
        let service = client();
        let status = Rc::new(RefCell::new(SubmissionStatus::default()));
        let outcome = pollster::block_on(report_final_score(
            &service,
            Some("wallet-a"),
            GAME_ID,
            1250,
            Some("Blobby"),
            &Rc::downgrade(&status),
        ));
        let SubmitOutcome::Submitted(receipt) = outcome else {
            panic!("expected a receipt");
        };
        let status = status.borrow();
        assert!(!status.saving);
        assert!(!status.failed);
        assert_eq!(status.last_transaction.as_deref(), Some(receipt.transaction_id.as_str()));

        let top = pollster::block_on(service.top_players(GAME_ID, 1, 10)).unwrap();
        assert_eq!(top[0].username, "Blobby");
        assert_eq!(top[0].score, 1250);
    }

    #[test]
    fn test_report_failure_sets_flag() {
        let service = client();
        service.transport().set_offline(true);
        let status = Rc::new(RefCell::new(SubmissionStatus::default()));
        let outcome = pollster::block_on(report_final_score(
            &service,
            Some("wallet-a"),
            GAME_ID,
            80,
            None,
            &Rc::downgrade(&status),
        ));
        assert!(matches!(outcome, SubmitOutcome::Failed(LedgerError::Network(_))));
        let status = status.borrow();
        assert!(status.failed);
        assert!(!status.saving);
        assert!(status.last_error.is_some());
    }

    #[test]
    fn test_late_completion_after_teardown_is_ignored() {
        let service = client();
        let status = Rc::new(RefCell::new(SubmissionStatus::default()));
        let weak = Rc::downgrade(&status);
        drop(status);

        let outcome = pollster::block_on(report_final_score(&service, Some("wallet-a"), GAME_ID, 300, None, &weak));
        assert!(matches!(outcome, SubmitOutcome::Submitted(_)));
        assert!(weak.upgrade().is_none());
    }
}
