use thiserror::Error;

use crate::{Card, GamePhase};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition { from: GamePhase, to: GamePhase },
    #[error("Shoe exhausted after forced reshuffle")]
    ShoeExhausted,
    #[error("Invalid shoe: {0}")]
    InvalidShoe(String),
    #[error("Denominator cannot be zero")]
    InvalidPayoutRatio,
    #[error("Card {0} is not in the shoe")]
    CardNotInShoe(Card),
}
