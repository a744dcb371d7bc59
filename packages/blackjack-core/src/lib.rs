mod card;
pub mod counting;
mod error;
mod game_state;
mod hand;
mod rules;
pub mod shoe;
pub mod strategy;

pub use card::{Card, Rank, Suit};
pub use counting::{
    hi_lo_value, risk_of_ruin, BettingRecommendation, CountFeedback, CountPracticeStats, CountSnapshot, CountingState,
    IndexAction, IndexPlay, RiskLevel, SideCounts,
};
pub use error::Error;
pub use game_state::{
    now_millis, ActionRecord, GamePhase, GameState, InsuranceState, PhaseChange, PlayerAction, Spot, DEFAULT_UNDO_LIMIT,
    MIN_UNDO_LIMIT,
};
pub use hand::{calculate_hand_value, can_split_cards, is_blackjack, is_busted, is_soft_hand, Hand, HandOutcome, StrategyKey};
pub use rules::{DoubleRestriction, GameRules, HandResult, PayoutRatio, ResultReason};
pub use shoe::Shoe;
pub use strategy::{AccuracyTracker, StrategyAction, StrategyAdvisor, StrategyHint};
