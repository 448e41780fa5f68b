//! Ledger wire format
//!
//! Requests are a list of name/value tags plus a data string. Reads come back
//! as a result whose first message carries a JSON envelope
//! `{ "success": bool, "data": ..., "error": "..." }` in its `Data` field;
//! writes come back with the transaction id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Badge, GameStats, LeaderboardEntry, PlayerHistory, Receipt, ScoreRecord};
use crate::error::LedgerError;

/// Action tag values understood by the ledger process
pub mod action {
    pub const SUBMIT_SCORE: &str = "submit-score";
    pub const REGISTER_GAME: &str = "register-game";
    pub const QUERY_TOP_PLAYERS: &str = "query-top-players";
    pub const QUERY_LAST_PLAYERS: &str = "query-last-players";
    pub const QUERY_PLAYER_HISTORY: &str = "query-player-history";
    pub const QUERY_GAME_STATS: &str = "query-game-stats";
    pub const GET_TOTAL_PLAYERS: &str = "get-total-players";
}

/// Tag names
pub mod tag {
    pub const ACTION: &str = "Action";
    pub const GAME_ID: &str = "GameId";
    pub const SCORE: &str = "Score";
    pub const USERNAME: &str = "Username";
    pub const WALLET_ADDRESS: &str = "WalletAddress";
    pub const TIMESTAMP: &str = "Timestamp";
    pub const PAGE: &str = "Page";
    pub const PAGE_SIZE: &str = "PageSize";
    pub const LIMIT: &str = "Limit";
    pub const SORT_BY: &str = "SortBy";
}

/// Name shown for players who never set one
pub const ANONYMOUS: &str = "Anonymous";
/// Name used for a history with no entries
pub const UNKNOWN_PLAYER: &str = "Unknown Player";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

/// Whether the request mutates ledger state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Signed write
    Message,
    /// Read-only evaluation
    Dryrun,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRequest {
    pub mode: Mode,
    pub tags: Vec<Tag>,
    pub data: String,
}

impl LedgerRequest {
    fn new(mode: Mode, action: &str, data: &str) -> Self {
        Self {
            mode,
            tags: vec![Tag {
                name: tag::ACTION.into(),
                value: action.into(),
            }],
            data: data.into(),
        }
    }

    fn with(mut self, name: &str, value: impl ToString) -> Self {
        self.tags.push(Tag {
            name: name.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn submit_score(game_id: &str, score: u64, username: Option<&str>, wallet: &str, timestamp: &str) -> Self {
        Self::new(Mode::Message, action::SUBMIT_SCORE, "Submit score")
            .with(tag::SCORE, score)
            .with(tag::GAME_ID, game_id)
            .with(tag::USERNAME, username.unwrap_or(ANONYMOUS))
            .with(tag::WALLET_ADDRESS, wallet)
            .with(tag::TIMESTAMP, timestamp)
    }

    pub fn register_game(game_id: &str) -> Self {
        Self::new(Mode::Message, action::REGISTER_GAME, "Register game").with(tag::GAME_ID, game_id)
    }

    pub fn top_players(game_id: &str, page: u32, page_size: u32) -> Self {
        Self::new(Mode::Dryrun, action::QUERY_TOP_PLAYERS, "")
            .with(tag::GAME_ID, game_id)
            .with(tag::PAGE, page)
            .with(tag::PAGE_SIZE, page_size)
    }

    pub fn recent_players(game_id: &str, limit: u32) -> Self {
        Self::new(Mode::Dryrun, action::QUERY_LAST_PLAYERS, "")
            .with(tag::GAME_ID, game_id)
            .with(tag::LIMIT, limit)
    }

    pub fn player_history(wallet: &str, game_id: Option<&str>, page: u32, page_size: u32) -> Self {
        let mut req = Self::new(Mode::Dryrun, action::QUERY_PLAYER_HISTORY, "").with(tag::WALLET_ADDRESS, wallet);
        if let Some(game_id) = game_id {
            req = req.with(tag::GAME_ID, game_id);
        }
        req.with(tag::SORT_BY, "timestamp")
            .with(tag::PAGE, page)
            .with(tag::PAGE_SIZE, page_size)
    }

    pub fn game_stats(game_id: &str) -> Self {
        Self::new(Mode::Dryrun, action::QUERY_GAME_STATS, "").with(tag::GAME_ID, game_id)
    }

    pub fn total_players(game_id: &str) -> Self {
        Self::new(Mode::Dryrun, action::GET_TOTAL_PLAYERS, "").with(tag::GAME_ID, game_id)
    }

    /// First value of the named tag
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.value.as_str())
    }

    pub fn action(&self) -> Option<&str> {
        self.tag(tag::ACTION)
    }

    /// Numeric tag, falling back to `default` when missing or malformed
    pub fn tag_u32(&self, name: &str, default: u32) -> u32 {
        self.tag(name)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    #[serde(rename = "Data", default)]
    pub data: String,
}

/// Raw result of a ledger call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerResponse {
    /// Transaction id, set for writes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "Messages", default)]
    pub messages: Vec<ResultMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Option<String>,
}

impl LedgerResponse {
    /// A write acknowledged with a transaction id
    pub fn written(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            messages: Vec::new(),
        }
    }

    /// A successful read carrying `data`
    pub fn ok(data: Value) -> Self {
        Self::envelope(&Envelope {
            success: true,
            data,
            error: None,
        })
    }

    /// A request the ledger refused
    pub fn failed(error: impl Into<String>) -> Self {
        Self::envelope(&Envelope {
            success: false,
            data: Value::Null,
            error: Some(error.into()),
        })
    }

    fn envelope(env: &Envelope) -> Self {
        Self {
            id: None,
            messages: vec![ResultMessage {
                data: serde_json::to_string(env).unwrap_or_default(),
            }],
        }
    }

    /// Unwrap the envelope, returning its `data`
    pub fn data(&self) -> Result<Value, LedgerError> {
        let raw = self
            .messages
            .first()
            .map(|m| m.data.as_str())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| LedgerError::InvalidResponse("no message data".into()))?;
        let env: Envelope = serde_json::from_str(raw)?;
        if !env.success {
            return Err(LedgerError::Rejected(
                env.error.unwrap_or_else(|| "request failed".into()),
            ));
        }
        Ok(env.data)
    }

    /// Transaction receipt of a write. A write refused with an envelope
    /// surfaces as `Rejected`.
    pub fn receipt(&self) -> Result<Receipt, LedgerError> {
        match &self.id {
            Some(id) if !id.is_empty() => Ok(Receipt {
                transaction_id: id.clone(),
            }),
            _ => {
                self.data()?;
                Err(LedgerError::InvalidResponse("missing transaction id".into()))
            }
        }
    }
}

/// Scores arrive as numbers or numeric strings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ScoreValue {
    Number(f64),
    Text(String),
}

impl ScoreValue {
    fn get(&self) -> Result<u64, LedgerError> {
        let n = match self {
            ScoreValue::Number(n) => *n,
            ScoreValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| LedgerError::InvalidResponse(format!("bad score {s:?}")))?,
        };
        Ok(n.max(0.0).floor() as u64)
    }
}

/// One score row as the ledger stores it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEntry {
    #[serde(default)]
    pub wallet_address: String,
    #[serde(default)]
    pub username: Option<String>,
    score: ScoreValue,
    pub timestamp: String,
}

impl WireEntry {
    pub fn new(wallet_address: &str, username: Option<&str>, score: u64, timestamp: &str) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            username: username.map(str::to_owned),
            score: ScoreValue::Text(score.to_string()),
            timestamp: timestamp.into(),
        }
    }

    fn into_entry(self, rank: u32) -> Result<LeaderboardEntry, LedgerError> {
        Ok(LeaderboardEntry {
            rank,
            score: self.score.get()?,
            wallet_address: self.wallet_address,
            username: self.username.unwrap_or_else(|| ANONYMOUS.into()),
            timestamp: self.timestamp,
            badge: None,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStats {
    #[serde(default)]
    pub total_score: u64,
    #[serde(default, rename = "totalplayers", alias = "totalPlayers")]
    pub total_players: u64,
    #[serde(default)]
    pub submission_count: u64,
}

/// Arrays come through as-is; keyed tables are read in key order
fn rows(data: Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        _ => Vec::new(),
    }
}

fn parse_rows(data: Value) -> Result<Vec<WireEntry>, LedgerError> {
    rows(data)
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(LedgerError::from))
        .collect()
}

/// Ranked top players; the first three carry medals
pub fn decode_top_players(response: &LedgerResponse) -> Result<Vec<LeaderboardEntry>, LedgerError> {
    let data = response.data()?;
    if !data.is_array() {
        return Ok(Vec::new());
    }
    parse_rows(data)?
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let mut entry = row.into_entry(i as u32 + 1)?;
            entry.badge = Badge::for_rank(entry.rank);
            Ok(entry)
        })
        .collect()
}

/// Most recent submissions; rank is not meaningful and left at 0
pub fn decode_recent_players(response: &LedgerResponse) -> Result<Vec<LeaderboardEntry>, LedgerError> {
    parse_rows(response.data()?)?
        .into_iter()
        .map(|row| row.into_entry(0))
        .collect()
}

pub fn decode_player_history(wallet: &str, response: &LedgerResponse) -> Result<PlayerHistory, LedgerError> {
    let rows = parse_rows(response.data()?)?;
    let username = rows
        .first()
        .and_then(|r| r.username.clone())
        .unwrap_or_else(|| UNKNOWN_PLAYER.into());
    let scores = rows
        .into_iter()
        .map(|r| {
            Ok(ScoreRecord {
                score: r.score.get()?,
                timestamp: r.timestamp,
            })
        })
        .collect::<Result<Vec<_>, LedgerError>>()?;
    let total_score = scores.iter().map(|s| s.score).sum();
    Ok(PlayerHistory {
        wallet_address: wallet.into(),
        username,
        scores,
        total_score,
    })
}

pub fn decode_game_stats(response: &LedgerResponse) -> Result<GameStats, LedgerError> {
    let data = response.data()?;
    let stats: WireStats = if data.is_null() {
        WireStats::default()
    } else {
        serde_json::from_value(data)?
    };
    Ok(GameStats {
        total_score: stats.total_score,
        total_players: stats.total_players,
        submission_count: stats.submission_count,
    })
}

pub fn decode_total_players(response: &LedgerResponse) -> Result<u64, LedgerError> {
    let data = response.data()?;
    data.get("totalPlayers")
        .and_then(Value::as_u64)
        .ok_or_else(|| LedgerError::InvalidResponse("missing totalPlayers".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submit_request_tags() {
        let req = LedgerRequest::submit_score("BLOB", 1250, None, "addr-1", "2024-05-01T10:00:00.000Z");
        assert_eq!(req.mode, Mode::Message);
        assert_eq!(req.action(), Some(action::SUBMIT_SCORE));
        assert_eq!(req.tag(tag::SCORE), Some("1250"));
        assert_eq!(req.tag(tag::USERNAME), Some(ANONYMOUS));
        assert_eq!(req.tag(tag::WALLET_ADDRESS), Some("addr-1"));
        assert_eq!(req.tag(tag::TIMESTAMP), Some("2024-05-01T10:00:00.000Z"));
    }

    #[test]
    fn test_history_request_omits_missing_game() {
        let req = LedgerRequest::player_history("addr", None, 1, 10);
        assert_eq!(req.tag(tag::GAME_ID), None);
        assert_eq!(req.tag(tag::SORT_BY), Some("timestamp"));
        assert_eq!(req.tag_u32(tag::PAGE_SIZE, 0), 10);
        assert_eq!(req.tag_u32(tag::LIMIT, 5), 5);
    }

    #[test]
    fn test_top_players_get_badges() {
        let response = LedgerResponse::ok(json!([
            { "walletAddress": "a", "username": "Ann", "score": "900", "timestamp": "t1" },
            { "walletAddress": "b", "score": 800, "timestamp": "t2" },
            { "walletAddress": "c", "username": "Cy", "score": "700", "timestamp": "t3" },
            { "walletAddress": "d", "username": "Di", "score": 10.7, "timestamp": "t4" },
        ]));
        let entries = decode_top_players(&response).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].badge, Some(Badge::Gold));
        assert_eq!(entries[1].badge, Some(Badge::Silver));
        assert_eq!(entries[1].username, ANONYMOUS);
        assert_eq!(entries[2].badge, Some(Badge::Bronze));
        assert_eq!(entries[3].badge, None);
        assert_eq!(entries[3].rank, 4);
        assert_eq!(entries[3].score, 10);
    }

    #[test]
    fn test_non_array_top_players_is_empty() {
        let response = LedgerResponse::ok(json!({ "unexpected": true }));
        assert!(decode_top_players(&response).unwrap().is_empty());
    }

    #[test]
    fn test_failed_envelope_is_rejected() {
        let response = LedgerResponse::failed("Game not registered");
        assert_eq!(
            decode_recent_players(&response).unwrap_err(),
            LedgerError::Rejected("Game not registered".into())
        );
        assert_eq!(
            response.receipt().unwrap_err(),
            LedgerError::Rejected("Game not registered".into())
        );
    }

    #[test]
    fn test_missing_messages_is_invalid() {
        let err = decode_game_stats(&LedgerResponse::default()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidResponse(_)));
        assert!(err.is_transient());

        let garbage = LedgerResponse {
            id: None,
            messages: vec![ResultMessage { data: "{not json".into() }],
        };
        assert!(matches!(
            decode_game_stats(&garbage),
            Err(LedgerError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_history_from_keyed_table() {
        let response = LedgerResponse::ok(json!({
            "1": { "walletAddress": "w", "username": "Wes", "score": "40", "timestamp": "t1" },
            "2": { "walletAddress": "w", "username": "Wes", "score": 60, "timestamp": "t2" },
        }));
        let history = decode_player_history("w", &response).unwrap();
        assert_eq!(history.username, "Wes");
        assert_eq!(history.scores.len(), 2);
        assert_eq!(history.total_score, 100);

        let empty = decode_player_history("w", &LedgerResponse::ok(Value::Null)).unwrap();
        assert_eq!(empty.username, UNKNOWN_PLAYER);
        assert_eq!(empty.total_score, 0);
    }

    #[test]
    fn test_history_rejects_malformed_rows() {
        let response = LedgerResponse::ok(json!([{ "walletAddress": "w", "score": "lots", "timestamp": "t" }]));
        assert!(matches!(
            decode_player_history("w", &response),
            Err(LedgerError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_stats_accept_both_spellings() {
        let lower = LedgerResponse::ok(json!({ "totalScore": 50, "totalplayers": 3, "submissionCount": 7 }));
        let camel = LedgerResponse::ok(json!({ "totalScore": 50, "totalPlayers": 3 }));
        assert_eq!(decode_game_stats(&lower).unwrap().total_players, 3);
        assert_eq!(decode_game_stats(&lower).unwrap().submission_count, 7);
        assert_eq!(decode_game_stats(&camel).unwrap().total_players, 3);
        assert_eq!(decode_game_stats(&LedgerResponse::ok(Value::Null)).unwrap(), GameStats::default());
    }

    #[test]
    fn test_receipt_from_write() {
        assert_eq!(
            LedgerResponse::written("tx-9").receipt().unwrap().transaction_id,
            "tx-9"
        );
    }

    #[test]
    fn test_total_players() {
        let response = LedgerResponse::ok(json!({ "totalPlayers": 12 }));
        assert_eq!(decode_total_players(&response).unwrap(), 12);
    }
}
