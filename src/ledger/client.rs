//! Ledger services over a request/response transport

use chrono::{DateTime, SecondsFormat};

use super::wire::{self, LedgerRequest, LedgerResponse};
use super::{GameStats, LeaderboardEntry, LeaderboardService, PlayerHistory, Receipt, ScoreService};
use crate::error::LedgerError;
use crate::platform::Clock;

/// Default page used for player history queries
const HISTORY_PAGE_SIZE: u32 = 10;

/// Moves one request to the ledger and brings back its raw result
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: &LedgerRequest) -> Result<LedgerResponse, LedgerError>;
}

impl<T: Transport> Transport for std::rc::Rc<T> {
    async fn send(&self, request: &LedgerRequest) -> Result<LedgerResponse, LedgerError> {
        (**self).send(request).await
    }
}

/// [`ScoreService`] and [`LeaderboardService`] speaking the tag protocol
pub struct LedgerClient<T, C> {
    transport: T,
    clock: C,
}

impl<T: Transport, C: Clock> LedgerClient<T, C> {
    pub fn new(transport: T, clock: C) -> Self {
        Self { transport, clock }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Current time as an ISO-8601 UTC string with milliseconds
    fn timestamp(&self) -> String {
        iso_timestamp(self.clock.now_ms())
    }

    pub async fn register_game(&self, game_id: &str) -> Result<Receipt, LedgerError> {
        let response = self.transport.send(&LedgerRequest::register_game(game_id)).await?;
        response.receipt()
    }

    pub async fn total_players(&self, game_id: &str) -> Result<u64, LedgerError> {
        let response = self.transport.send(&LedgerRequest::total_players(game_id)).await?;
        wire::decode_total_players(&response)
    }
}

/// Format milliseconds since the Unix epoch, e.g. `2024-05-01T10:00:00.000Z`
pub fn iso_timestamp(ms: f64) -> String {
    DateTime::from_timestamp_millis(ms as i64)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl<T: Transport, C: Clock> ScoreService for LedgerClient<T, C> {
    async fn submit_score(
        &self,
        identity: &str,
        game_id: &str,
        score: u64,
        display_name: Option<&str>,
    ) -> Result<Receipt, LedgerError> {
        let request = LedgerRequest::submit_score(game_id, score, display_name, identity, &self.timestamp());
        log::debug!("Submitting score {} for {}", score, identity);
        let response = self.transport.send(&request).await?;
        response.receipt()
    }
}

impl<T: Transport, C: Clock> LeaderboardService for LedgerClient<T, C> {
    async fn top_players(&self, game_id: &str, page: u32, page_size: u32) -> Result<Vec<LeaderboardEntry>, LedgerError> {
        let response = self
            .transport
            .send(&LedgerRequest::top_players(game_id, page, page_size))
            .await?;
        wire::decode_top_players(&response)
    }

    async fn recent_players(&self, game_id: &str, limit: u32) -> Result<Vec<LeaderboardEntry>, LedgerError> {
        let response = self
            .transport
            .send(&LedgerRequest::recent_players(game_id, limit))
            .await?;
        wire::decode_recent_players(&response)
    }

    async fn player_history(&self, address: &str, game_id: Option<&str>) -> Result<PlayerHistory, LedgerError> {
        let response = self
            .transport
            .send(&LedgerRequest::player_history(address, game_id, 1, HISTORY_PAGE_SIZE))
            .await?;
        wire::decode_player_history(address, &response)
    }

    async fn game_stats(&self, game_id: &str) -> Result<GameStats, LedgerError> {
        let response = self.transport.send(&LedgerRequest::game_stats(game_id)).await?;
        wire::decode_game_stats(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GAME_ID;
    use crate::ledger::{Badge, MemoryLedger};
    use crate::platform::ManualClock;

    fn client() -> LedgerClient<MemoryLedger, ManualClock> {
        LedgerClient::new(MemoryLedger::new(), ManualClock::new(1_714_557_600_000.0))
    }

    #[test]
    fn test_iso_timestamp() {
        assert_eq!(iso_timestamp(1_714_557_600_000.0), "2024-05-01T10:00:00.000Z");
        assert_eq!(iso_timestamp(0.0), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_submit_requires_registration() {
        let client = client();
        let err = pollster::block_on(client.submit_score("w", GAME_ID, 10, None)).unwrap_err();
        assert_eq!(err, LedgerError::Rejected("Game not registered".into()));

        pollster::block_on(client.register_game(GAME_ID)).unwrap();
        assert!(pollster::block_on(client.submit_score("w", GAME_ID, 10, None)).is_ok());
    }

    #[test]
    fn test_queries_round_trip_through_wire_format() {
        let client = client();
        pollster::block_on(async {
            client.register_game(GAME_ID).await.unwrap();
            client.submit_score("a", GAME_ID, 300, Some("Ann")).await.unwrap();
            client.submit_score("b", GAME_ID, 900, None).await.unwrap();
            client.submit_score("a", GAME_ID, 500, Some("Ann")).await.unwrap();

            let top = client.top_players(GAME_ID, 1, 10).await.unwrap();
            let scores: Vec<u64> = top.iter().map(|e| e.score).collect();
            assert_eq!(scores, vec![900, 500]);
            assert_eq!(top[0].badge, Some(Badge::Gold));
            assert_eq!(top[0].username, "Anonymous");
            assert_eq!(top[1].timestamp, "2024-05-01T10:00:00.000Z");

            let recent = client.recent_players(GAME_ID, 2).await.unwrap();
            assert_eq!(recent.len(), 2);
            assert_eq!(recent[0].score, 500);
            assert!(recent.iter().all(|e| e.rank == 0));

            let history = client.player_history("a", Some(GAME_ID)).await.unwrap();
            assert_eq!(history.username, "Ann");
            assert_eq!(history.total_score, 800);

            let stats = client.game_stats(GAME_ID).await.unwrap();
            assert_eq!(
                stats,
                GameStats {
                    total_score: 1700,
                    total_players: 2,
                    submission_count: 3
                }
            );
            assert_eq!(client.total_players(GAME_ID).await.unwrap(), 2);
        });
    }
}
