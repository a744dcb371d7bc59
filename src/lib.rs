pub mod engine;
mod error;
pub mod msg;
pub mod settings;
pub mod snapshot;
pub mod stats;

pub use blackjack_core;
pub use engine::Engine;
pub use error::EngineError;
pub use msg::{Command, Event, QueryMsg, QueryResponse, Response, Seat, Severity};
pub use settings::{EngineConfig, GameSpeed, SettingUpdate, Settings};
pub use snapshot::Snapshot;
pub use stats::SessionStats;
