//! Periodic leaderboard refresh
//!
//! The panel lives in an `Rc<RefCell<_>>` owned by the page; the poller only
//! holds a `Weak` and stops once the page lets go.

use std::cell::RefCell;
use std::rc::Weak;

use super::retry::{Backoff, Sleeper, retry};
use super::{GameStats, LeaderboardEntry, LeaderboardService};
use crate::error::LedgerError;
use crate::platform::Clock;

pub const POLL_INTERVAL_MS: f64 = 10_000.0;
pub const TOP_PAGE_SIZE: u32 = 10;
pub const RECENT_LIMIT: u32 = 10;

/// What the leaderboard view shows. Failed refreshes keep the last good data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaderboardPanel {
    pub top: Vec<LeaderboardEntry>,
    pub recent: Vec<LeaderboardEntry>,
    pub stats: GameStats,
    pub last_error: Option<String>,
    /// Clock reading of the last successful refresh
    pub last_updated: Option<f64>,
}

struct Snapshot {
    top: Vec<LeaderboardEntry>,
    recent: Vec<LeaderboardEntry>,
    stats: GameStats,
}

async fn fetch<L: LeaderboardService>(service: &L, game_id: &str) -> Result<Snapshot, LedgerError> {
    Ok(Snapshot {
        top: service.top_players(game_id, 1, TOP_PAGE_SIZE).await?,
        recent: service.recent_players(game_id, RECENT_LIMIT).await?,
        stats: service.game_stats(game_id).await?,
    })
}

/// Refresh once, retrying transient failures. Returns false if the panel
/// was dropped meanwhile.
pub async fn refresh_panel<L: LeaderboardService>(
    service: &L,
    game_id: &str,
    backoff: Backoff,
    sleeper: &impl Sleeper,
    clock: &impl Clock,
    panel: &Weak<RefCell<LeaderboardPanel>>,
) -> bool {
    let result = retry(backoff, sleeper, || fetch(service, game_id)).await;

    let Some(panel) = panel.upgrade() else {
        return false;
    };
    let mut panel = panel.borrow_mut();
    match result {
        Ok(snapshot) => {
            panel.top = snapshot.top;
            panel.recent = snapshot.recent;
            panel.stats = snapshot.stats;
            panel.last_error = None;
            panel.last_updated = Some(clock.now_ms());
        }
        Err(e) => {
            log::error!("Error fetching leaderboard: {}", e);
            panel.last_error = Some(e.to_string());
        }
    }
    true
}

/// Refresh now and then every `interval_ms` until the panel is dropped
pub async fn poll_leaderboard<L: LeaderboardService>(
    service: &L,
    game_id: &str,
    interval_ms: f64,
    sleeper: &impl Sleeper,
    clock: &impl Clock,
    panel: Weak<RefCell<LeaderboardPanel>>,
) {
    let backoff = Backoff::default();
    while refresh_panel(service, game_id, backoff, sleeper, clock, &panel).await {
        sleeper.sleep(interval_ms).await;
        if panel.strong_count() == 0 {
            break;
        }
    }
    log::debug!("Leaderboard polling stopped");
}
