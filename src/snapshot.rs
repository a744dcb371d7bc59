//! Plain JSON snapshot for an external persistence layer. No I/O here.

use blackjack_core::{now_millis, AccuracyTracker, CountPracticeStats};
use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::settings::Settings;
use crate::stats::SessionStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub settings: Settings,
    pub game_id: String,
    /// Milliseconds since the Unix epoch
    pub last_updated: u64,
    pub session_stats: SessionStats,
    pub strategy_accuracy: AccuracyTracker,
    pub counting_accuracy: CountPracticeStats,
}

impl Engine {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            settings: self.settings().clone(),
            game_id: self.game_id().to_string(),
            last_updated: now_millis(),
            session_stats: self.stats().clone(),
            strategy_accuracy: self.accuracy().clone(),
            counting_accuracy: self.counting().practice_stats(),
        }
    }

    pub fn export_state(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Restores settings and analytics between hands.
    pub fn import_state(&mut self, json: &str) -> Result<(), EngineError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        self.restore(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::EngineConfig;
    use serde_json::Value;

    #[test]
    fn test_export_shape() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let json: Value = serde_json::from_str(&engine.export_state().unwrap()).unwrap();
        for key in ["settings", "gameId", "lastUpdated", "sessionStats", "strategyAccuracy", "countingAccuracy"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["sessionStats"]["bankroll"], 1000);
    }

    #[test]
    fn test_import_rejects_garbage() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        assert!(matches!(engine.import_state("{\"settings\": 1}"), Err(EngineError::Snapshot(_))));
    }
}
