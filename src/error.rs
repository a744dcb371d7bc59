use blackjack_core::GamePhase;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Cannot {action} while the table is {}", .phase.as_str())]
    InvalidPhase { action: &'static str, phase: GamePhase },

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Cannot {action}: {reason}")]
    ActionUnavailable { action: &'static str, reason: String },

    #[error("Shoe exhausted, hand aborted")]
    ShoeExhausted,

    #[error("Nothing to undo: {0}")]
    UndoUnavailable(String),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error(transparent)]
    Game(blackjack_core::Error),
}

impl From<blackjack_core::Error> for EngineError {
    fn from(err: blackjack_core::Error) -> Self {
        match err {
            blackjack_core::Error::ShoeExhausted => EngineError::ShoeExhausted,
            other => EngineError::Game(other),
        }
    }
}
