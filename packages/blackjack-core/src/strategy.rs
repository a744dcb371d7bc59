use crate::{Card, Hand, PlayerAction, StrategyKey};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyAction {
    Hit,
    Stand,
    Double,
    Split,
    Surrender,
}

impl StrategyAction {
    pub fn code(&self) -> char {
        match self {
            StrategyAction::Hit => 'H',
            StrategyAction::Stand => 'S',
            StrategyAction::Double => 'D',
            StrategyAction::Split => 'P',
            StrategyAction::Surrender => 'R',
        }
    }

    /// Whether the player's decision follows this recommendation.
    /// Insurance answers are not strategy decisions and yield `None`.
    pub fn matches(&self, action: PlayerAction) -> Option<bool> {
        let taken = match action {
            PlayerAction::Hit => StrategyAction::Hit,
            PlayerAction::Stand => StrategyAction::Stand,
            PlayerAction::DoubleDown => StrategyAction::Double,
            PlayerAction::Split => StrategyAction::Split,
            PlayerAction::Surrender => StrategyAction::Surrender,
            PlayerAction::Insurance | PlayerAction::DeclineInsurance => return None,
        };
        Some(taken == *self)
    }
}

impl fmt::Display for StrategyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyAction::Hit => "Hit",
            StrategyAction::Stand => "Stand",
            StrategyAction::Double => "Double",
            StrategyAction::Split => "Split",
            StrategyAction::Surrender => "Surrender",
        };
        f.write_str(name)
    }
}

use StrategyAction::{Double as D, Hit as H, Split as P, Stand as S, Surrender as R};

// Columns: dealer up-card value 2, 3, 4, 5, 6, 7, 8, 9, 10, A.
// Multi-deck, dealer stands on soft 17, double after split, late surrender.

/// Hard totals 5..=21
const HARD: [[StrategyAction; 10]; 17] = [
    [H, H, H, H, H, H, H, H, H, H], // 5
    [H, H, H, H, H, H, H, H, H, H], // 6
    [H, H, H, H, H, H, H, H, H, H], // 7
    [H, H, H, H, H, H, H, H, H, H], // 8
    [H, D, D, D, D, H, H, H, H, H], // 9
    [D, D, D, D, D, D, D, D, H, H], // 10
    [D, D, D, D, D, D, D, D, D, H], // 11
    [H, H, S, S, S, H, H, H, H, H], // 12
    [S, S, S, S, S, H, H, H, H, H], // 13
    [S, S, S, S, S, H, H, H, H, H], // 14
    [S, S, S, S, S, H, H, H, R, H], // 15
    [S, S, S, S, S, H, H, R, R, R], // 16
    [S, S, S, S, S, S, S, S, S, S], // 17
    [S, S, S, S, S, S, S, S, S, S], // 18
    [S, S, S, S, S, S, S, S, S, S], // 19
    [S, S, S, S, S, S, S, S, S, S], // 20
    [S, S, S, S, S, S, S, S, S, S], // 21
];

/// Soft totals 13..=21 (A,2 through A,10)
const SOFT: [[StrategyAction; 10]; 9] = [
    [H, H, H, D, D, H, H, H, H, H], // 13
    [H, H, H, D, D, H, H, H, H, H], // 14
    [H, H, D, D, D, H, H, H, H, H], // 15
    [H, H, D, D, D, H, H, H, H, H], // 16
    [H, D, D, D, D, H, H, H, H, H], // 17
    [S, D, D, D, D, S, S, H, H, H], // 18
    [S, S, S, S, S, S, S, S, S, S], // 19
    [S, S, S, S, S, S, S, S, S, S], // 20
    [S, S, S, S, S, S, S, S, S, S], // 21
];

/// Pairs by card value 2..=10, then aces
const PAIRS: [[StrategyAction; 10]; 10] = [
    [P, P, P, P, P, P, H, H, H, H], // 2,2
    [P, P, P, P, P, P, H, H, H, H], // 3,3
    [H, H, H, P, P, H, H, H, H, H], // 4,4
    [D, D, D, D, D, D, D, D, H, H], // 5,5
    [P, P, P, P, P, H, H, H, H, H], // 6,6
    [P, P, P, P, P, P, H, H, H, H], // 7,7
    [P, P, P, P, P, P, P, P, P, P], // 8,8
    [P, P, P, P, P, S, P, P, S, S], // 9,9
    [S, S, S, S, S, S, S, S, S, S], // 10,10
    [P, P, P, P, P, P, P, P, P, P], // A,A
];

fn column(dealer_up: &Card) -> usize {
    dealer_up.value().clamp(2, 11) as usize - 2
}

/// Raw table cell for a key, before availability is considered.
pub fn lookup(key: StrategyKey, dealer_up: &Card) -> StrategyAction {
    let col = column(dealer_up);
    match key {
        StrategyKey::Pair(rank) => {
            let row = (rank.value().clamp(2, 11) - 2) as usize;
            PAIRS[row][col]
        }
        // Soft 12 is only reachable as an unsplit A,A
        StrategyKey::Soft(rest) if rest < 2 => StrategyAction::Hit,
        StrategyKey::Soft(rest) => SOFT[(rest.min(10) - 2) as usize][col],
        StrategyKey::Hard(total) if total > 21 => StrategyAction::Stand,
        StrategyKey::Hard(total) => HARD[(total.max(5) - 5) as usize][col],
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyHint {
    pub action: StrategyAction,
    pub explanation: String,
    /// 0.0..=1.0
    pub confidence: f64,
    pub alternatives: Vec<StrategyAction>,
    pub key: String,
}

/// Stateless basic-strategy lookup
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyAdvisor;

impl StrategyAdvisor {
    pub fn new() -> Self {
        Self
    }

    pub fn recommend(
        &self,
        hand: &Hand,
        dealer_up: &Card,
        can_double: bool,
        can_split: bool,
        can_surrender: bool,
    ) -> StrategyHint {
        let up = dealer_up.to_display();
        let value = hand.value();
        let soft = hand.is_soft();

        let key = if hand.is_pair() && can_split {
            hand.strategy_key()
        } else if soft {
            StrategyKey::Soft(value - 11)
        } else {
            StrategyKey::Hard(value)
        };

        let table_action = lookup(key, dealer_up);
        let mut alternatives = Vec::new();
        let mut confidence = 0.95;

        let (action, explanation) = match table_action {
            StrategyAction::Double if !can_double => {
                let fallback = if soft && value >= 18 {
                    StrategyAction::Stand
                } else {
                    StrategyAction::Hit
                };
                confidence = 0.8;
                (
                    fallback,
                    format!("{key} vs {up}: double is best, but doubling is not allowed here, so {fallback}"),
                )
            }
            StrategyAction::Surrender if !can_surrender => {
                confidence = 0.8;
                (
                    StrategyAction::Hit,
                    format!("{key} vs {up}: surrender is best, but it is not available, so Hit"),
                )
            }
            StrategyAction::Double => {
                alternatives.push(if soft && value >= 18 {
                    StrategyAction::Stand
                } else {
                    StrategyAction::Hit
                });
                (D, format!("{key} vs {up}: double down while the dealer is weak"))
            }
            StrategyAction::Surrender => {
                alternatives.push(StrategyAction::Hit);
                (R, format!("{key} vs {up}: surrender and save half the bet"))
            }
            StrategyAction::Split => {
                let unsplit = lookup(StrategyKey::Hard(value), dealer_up);
                if unsplit != StrategyAction::Split && !(soft && unsplit == StrategyAction::Stand) {
                    alternatives.push(unsplit);
                }
                (P, format!("{key} vs {up}: split the pair"))
            }
            StrategyAction::Stand => (S, stand_reason(key, value, dealer_up)),
            StrategyAction::Hit => (H, hit_reason(key, value, dealer_up)),
        };

        if is_marginal(key, dealer_up) {
            confidence = f64::min(confidence, 0.65);
        }

        StrategyHint {
            action,
            explanation,
            confidence,
            alternatives,
            key: key.to_string(),
        }
    }
}

fn stand_reason(key: StrategyKey, value: u8, dealer_up: &Card) -> String {
    let up = dealer_up.to_display();
    if value >= 17 {
        format!("{key} vs {up}: stand on {value}")
    } else {
        format!("{key} vs {up}: stand and let the dealer risk busting")
    }
}

fn hit_reason(key: StrategyKey, value: u8, dealer_up: &Card) -> String {
    let up = dealer_up.to_display();
    if value <= 11 {
        format!("{key} vs {up}: hit, no card can bust {value}")
    } else {
        format!("{key} vs {up}: hit, the dealer's {up} is likely to make a hand")
    }
}

/// Close decisions where the expected values of the top two plays are near.
fn is_marginal(key: StrategyKey, dealer_up: &Card) -> bool {
    let up = dealer_up.value();
    matches!(
        (key, up),
        (StrategyKey::Hard(12), 2..=4) | (StrategyKey::Hard(16), 10) | (StrategyKey::Hard(15), 10) | (StrategyKey::Soft(7), 2)
    )
}

/// Scores player decisions against the last hint shown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyTracker {
    pub hints_issued: u32,
    pub correct_decisions: u32,
    #[serde(skip)]
    pending: Option<StrategyAction>,
}

impl AccuracyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hint(&mut self, hint: &StrategyHint) {
        self.hints_issued += 1;
        self.pending = Some(hint.action);
    }

    /// Compares a decision to the pending hint. Returns `None` when no hint
    /// was shown or the action is not a strategy decision.
    pub fn record_decision(&mut self, action: PlayerAction) -> Option<bool> {
        let hint = self.pending?;
        let correct = hint.matches(action)?;
        self.pending = None;
        if correct {
            self.correct_decisions += 1;
        }
        log::debug!("decision {} vs hint {hint}: {}", action.as_str(), if correct { "correct" } else { "incorrect" });
        Some(correct)
    }

    pub fn pending_hint(&self) -> Option<StrategyAction> {
        self.pending
    }

    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    pub fn percentage(&self) -> f64 {
        if self.hints_issued == 0 {
            return 0.0;
        }
        self.correct_decisions as f64 / self.hints_issued as f64 * 100.0
    }

    pub fn grade(&self) -> &'static str {
        let pct = self.percentage();
        if pct >= 95.0 {
            "A+"
        } else if pct >= 90.0 {
            "A"
        } else if pct >= 80.0 {
            "B"
        } else if pct >= 70.0 {
            "C"
        } else if pct >= 60.0 {
            "D"
        } else {
            "F"
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
