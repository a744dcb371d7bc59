use crate::{GameRules, Hand, Error};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_UNDO_LIMIT: usize = 10;
pub const MIN_UNDO_LIMIT: usize = 5;

/// Current phase of the round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    Waiting,
    Betting,
    Dealing,
    Playing,
    Dealer,
    Finished,
}

impl GamePhase {
    pub fn can_transition_to(self, next: GamePhase) -> bool {
        use GamePhase::*;
        matches!(
            (self, next),
            (Waiting, Dealing | Waiting | Betting)
                | (Betting, Dealing | Waiting)
                | (Dealing, Playing | Finished)
                | (Playing, Dealer | Finished | Playing)
                | (Dealer, Finished)
                | (Finished, Waiting | Dealing)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Waiting => "waiting",
            GamePhase::Betting => "betting",
            GamePhase::Dealing => "dealing",
            GamePhase::Playing => "playing",
            GamePhase::Dealer => "dealer",
            GamePhase::Finished => "finished",
        }
    }
}

/// Player decisions. Closed set; every dispatch over it is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerAction {
    Hit,
    Stand,
    DoubleDown,
    Split,
    Insurance,
    DeclineInsurance,
    Surrender,
}

impl PlayerAction {
    pub const ALL: [PlayerAction; 7] = [
        PlayerAction::Hit,
        PlayerAction::Stand,
        PlayerAction::DoubleDown,
        PlayerAction::Split,
        PlayerAction::Insurance,
        PlayerAction::DeclineInsurance,
        PlayerAction::Surrender,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerAction::Hit => "hit",
            PlayerAction::Stand => "stand",
            PlayerAction::DoubleDown => "double_down",
            PlayerAction::Split => "split",
            PlayerAction::Insurance => "insurance",
            PlayerAction::DeclineInsurance => "decline_insurance",
            PlayerAction::Surrender => "surrender",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceState {
    /// Offer is open and blocks the dealer peek until answered
    pub offered: bool,
    pub taken: bool,
}

/// The player's seat (can have multiple hands if split)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spot {
    pub hands: Vec<Hand>,
    pub active_hand_index: usize,
}

impl Spot {
    pub fn new() -> Self {
        Self {
            hands: vec![Hand::new()],
            active_hand_index: 0,
        }
    }

    pub fn active_hand(&self) -> &Hand {
        &self.hands[self.active_hand_index]
    }

    pub fn active_hand_mut(&mut self) -> &mut Hand {
        &mut self.hands[self.active_hand_index]
    }

    pub fn has_next_hand(&self) -> bool {
        self.active_hand_index + 1 < self.hands.len()
    }

    pub fn move_to_next_hand(&mut self) -> bool {
        if self.has_next_hand() {
            self.active_hand_index += 1;
            true
        } else {
            false
        }
    }

    /// Moves to the next hand still needing decisions. The index is left on
    /// the last hand when none remain.
    pub fn advance(&mut self) -> Option<usize> {
        while self.move_to_next_hand() {
            if !self.active_hand().is_finished() {
                return Some(self.active_hand_index);
            }
        }
        None
    }

    pub fn can_split_active(&self, rules: &GameRules) -> bool {
        rules.can_split(self.active_hand(), self.hands.len())
    }

    /// Moves the active hand's second card into a new hand placed right after it.
    pub fn split_active(&mut self) -> Result<usize, &'static str> {
        let hand = self.active_hand_mut();
        if hand.cards.len() != 2 {
            return Err("Hand must have exactly 2 cards to split");
        }

        let second_card = hand.cards.pop().ok_or("No second card")?;
        hand.split = true;

        let mut new_hand = Hand::new();
        new_hand.add_card(second_card);
        new_hand.split = true;

        let new_index = self.active_hand_index + 1;
        self.hands.insert(new_index, new_hand);
        Ok(new_index)
    }

    pub fn num_doubled(&self) -> usize {
        self.hands.iter().filter(|h| h.doubled).count()
    }

    /// True when nothing is left for the dealer to beat.
    pub fn all_busted(&self) -> bool {
        self.hands.iter().all(|h| h.is_busted() || h.surrendered)
    }
}

impl Default for Spot {
    fn default() -> Self {
        Self::new()
    }
}

/// Undo unit, captured before every mutating player action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: PlayerAction,
    pub spot: Spot,
    pub dealer_hand: Hand,
    pub current_bet: u64,
    pub insurance_bet: u64,
    pub insurance: InsuranceState,
    pub bankroll: u64,
    pub phase: GamePhase,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChange {
    pub from: GamePhase,
    pub to: GamePhase,
}

/// Phase machine, bets and the bounded undo history of one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub phase: GamePhase,
    pub current_bet: u64,
    pub insurance_bet: u64,
    pub min_bet: u64,
    pub max_bet: u64,
    pub round_number: u64,
    pub last_action: Option<PlayerAction>,
    history: VecDeque<ActionRecord>,
    history_limit: usize,
}

impl GameState {
    pub fn new(rules: &GameRules, history_limit: usize) -> Self {
        Self {
            phase: GamePhase::Waiting,
            current_bet: rules.min_bet,
            insurance_bet: 0,
            min_bet: rules.min_bet,
            max_bet: rules.max_bet,
            round_number: 0,
            last_action: None,
            history: VecDeque::new(),
            history_limit: history_limit.clamp(MIN_UNDO_LIMIT, DEFAULT_UNDO_LIMIT),
        }
    }

    pub fn transition(&mut self, to: GamePhase) -> Result<PhaseChange, Error> {
        let from = self.phase;
        if !from.can_transition_to(to) {
            return Err(Error::InvalidTransition { from, to });
        }
        self.phase = to;
        log::debug!("phase {} -> {}", from.as_str(), to.as_str());
        Ok(PhaseChange { from, to })
    }

    /// Clamps to the table limits and returns the bet actually placed.
    pub fn set_bet_amount(&mut self, amount: u64) -> u64 {
        self.current_bet = amount.clamp(self.min_bet, self.max_bet.max(self.min_bet));
        self.current_bet
    }

    /// New table limits apply from the next `set_bet_amount`. The current bet
    /// is left alone: mid-round it is the total at risk across all hands.
    pub fn set_limits(&mut self, min_bet: u64, max_bet: u64) {
        self.min_bet = min_bet;
        self.max_bet = max_bet;
    }

    pub fn save_game_state(&mut self, record: ActionRecord) {
        self.last_action = Some(record.action);
        if self.history.len() == self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }

    pub fn remove_last_saved_state(&mut self) -> Option<ActionRecord> {
        self.history.pop_back()
    }

    pub fn can_undo_action(&self) -> bool {
        self.phase == GamePhase::Playing && !self.history.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn start_new_hand(&mut self) {
        self.round_number += 1;
        self.insurance_bet = 0;
        self.last_action = None;
        self.history.clear();
    }

    pub fn reset(&mut self) {
        self.phase = GamePhase::Waiting;
        self.current_bet = self.min_bet;
        self.insurance_bet = 0;
        self.round_number = 0;
        self.last_action = None;
        self.history.clear();
    }

    /// Leaves the table mid-round. Only used when the shoe cannot deal.
    pub fn abort_to_waiting(&mut self) {
        log::warn!("round {} aborted from {}", self.round_number, self.phase.as_str());
        self.phase = GamePhase::Waiting;
        self.insurance_bet = 0;
        self.history.clear();
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests;
