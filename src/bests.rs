//! Personal bests on this device
//!
//! Scores under different eat policies are not comparable, so each rules
//! preset keeps its own short table. A run remembers the wallet it was
//! played with and, once the ledger acknowledges it, the transaction id.

use serde::{Deserialize, Serialize};

use crate::settings::RulesPreset;
use crate::storage;

/// Runs kept per preset
pub const RUNS_PER_PRESET: usize = 10;

/// One finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalRun {
    pub score: u64,
    /// Frames survived
    pub frames: u64,
    /// ISO-8601, also the key used to attach the ledger receipt
    pub played_at: String,
    #[serde(default)]
    pub wallet: Option<String>,
    /// Ledger transaction, once the submission went through
    #[serde(default)]
    pub transaction_id: Option<String>,
}

impl LocalRun {
    pub fn is_synced(&self) -> bool {
        self.transaction_id.is_some()
    }
}

/// Index at which `score` would be inserted into a list sorted by
/// descending score. Ties go after existing entries.
pub fn insertion_index<T>(entries: &[T], score: u64, score_of: impl Fn(&T) -> u64) -> usize {
    entries
        .iter()
        .position(|e| score > score_of(e))
        .unwrap_or(entries.len())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PresetTable {
    preset: RulesPreset,
    /// Best first
    runs: Vec<LocalRun>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalBests {
    tables: Vec<PresetTable>,
}

impl PersonalBests {
    const STORAGE_KEY: &'static str = "feast_famine_bests";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Self {
        storage::load(Self::STORAGE_KEY)
    }

    pub fn save(&self) {
        storage::save(Self::STORAGE_KEY, self);
    }

    /// Runs under `preset`, best first
    pub fn runs(&self, preset: RulesPreset) -> &[LocalRun] {
        self.table(preset).map(|t| t.runs.as_slice()).unwrap_or_default()
    }

    pub fn best(&self, preset: RulesPreset) -> Option<u64> {
        self.runs(preset).first().map(|r| r.score)
    }

    /// Keep a finished run if it makes its preset's table. Returns the rank
    /// (1-indexed). Zero scores are never kept.
    pub fn record(&mut self, preset: RulesPreset, run: LocalRun) -> Option<usize> {
        if run.score == 0 {
            return None;
        }
        let runs = self.runs_mut(preset);
        let index = insertion_index(runs.as_slice(), run.score, |r| r.score);
        if index >= RUNS_PER_PRESET {
            return None;
        }
        log::debug!("{} run {} at rank {}", preset.as_str(), run.score, index + 1);
        runs.insert(index, run);
        runs.truncate(RUNS_PER_PRESET);
        Some(index + 1)
    }

    /// Attach a ledger receipt to the run played at `played_at`.
    /// Returns false if that run has since dropped off the table.
    pub fn mark_synced(&mut self, preset: RulesPreset, played_at: &str, transaction_id: &str) -> bool {
        let Some(run) = self
            .tables
            .iter_mut()
            .filter(|t| t.preset == preset)
            .flat_map(|t| t.runs.iter_mut())
            .find(|r| r.played_at == played_at)
        else {
            return false;
        };
        run.transaction_id = Some(transaction_id.to_owned());
        true
    }

    fn table(&self, preset: RulesPreset) -> Option<&PresetTable> {
        self.tables.iter().find(|t| t.preset == preset)
    }

    fn runs_mut(&mut self, preset: RulesPreset) -> &mut Vec<LocalRun> {
        let at = match self.tables.iter().position(|t| t.preset == preset) {
            Some(at) => at,
            None => {
                self.tables.push(PresetTable {
                    preset,
                    runs: Vec::new(),
                });
                self.tables.len() - 1
            }
        };
        &mut self.tables[at].runs
    }
}
