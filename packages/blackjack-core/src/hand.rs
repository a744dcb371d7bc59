use crate::{Card, Rank};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandOutcome {
    Win,
    Loss,
    Push,
    Surrender,
    Blackjack,
}

/// Calculate the value of a blackjack hand
pub fn calculate_hand_value(cards: &[Card]) -> u8 {
    let (total, _) = value_and_soft_aces(cards);
    total
}

/// Total plus the number of aces still counted as 11.
fn value_and_soft_aces(cards: &[Card]) -> (u8, u8) {
    let mut total: u16 = 0;
    let mut aces = 0u8;

    for card in cards {
        if card.is_ace() {
            aces += 1;
        }
        total += card.value() as u16;
    }

    // Adjust for aces
    while total > 21 && aces > 0 {
        total -= 10; // Count ace as 1 instead of 11
        aces -= 1;
    }

    (total.min(u8::MAX as u16) as u8, aces)
}

/// Check if a hand is soft (has an ace counted as 11)
pub fn is_soft_hand(cards: &[Card]) -> bool {
    let (total, soft_aces) = value_and_soft_aces(cards);
    soft_aces > 0 && total <= 21
}

/// Check if a hand is busted
pub fn is_busted(cards: &[Card]) -> bool {
    calculate_hand_value(cards) > 21
}

/// Check if a hand is blackjack (21 with 2 cards)
pub fn is_blackjack(cards: &[Card]) -> bool {
    cards.len() == 2 && calculate_hand_value(cards) == 21
}

/// Check if two cards can be split (same rank)
pub fn can_split_cards(card1: &Card, card2: &Card) -> bool {
    card1.rank == card2.rank
}

/// Row selector for the basic strategy tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKey {
    Pair(Rank),
    /// Total of the hand without the ace counted as 11.
    Soft(u8),
    Hard(u8),
}

impl fmt::Display for StrategyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKey::Pair(rank) => write!(f, "pair_{}", rank.symbol()),
            StrategyKey::Soft(rest) => write!(f, "soft_{rest}"),
            StrategyKey::Hard(total) => write!(f, "hard_{total}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    pub cards: Vec<Card>,
    pub doubled: bool,
    pub split: bool,
    pub stood: bool,
    pub surrendered: bool,
}

impl Hand {
    pub fn new() -> Self {
        Self {
            cards: Vec::new(),
            doubled: false,
            split: false,
            stood: false,
            surrendered: false,
        }
    }

    pub fn from_cards(cards: &[Card]) -> Self {
        Self {
            cards: cards.to_vec(),
            ..Self::new()
        }
    }

    pub fn value(&self) -> u8 {
        calculate_hand_value(&self.cards)
    }

    pub fn is_soft(&self) -> bool {
        is_soft_hand(&self.cards)
    }

    pub fn is_busted(&self) -> bool {
        is_busted(&self.cards)
    }

    pub fn is_blackjack(&self) -> bool {
        is_blackjack(&self.cards)
    }

    /// Blackjack dealt as the first two cards, not reached through a split.
    pub fn is_natural(&self) -> bool {
        !self.split && self.is_blackjack()
    }

    pub fn is_pair(&self) -> bool {
        self.cards.len() == 2 && can_split_cards(&self.cards[0], &self.cards[1])
    }

    /// No further player decisions on this hand.
    pub fn is_finished(&self) -> bool {
        self.stood || self.surrendered || self.value() >= 21
    }

    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn remove_card(&mut self, index: usize) -> Option<Card> {
        if index < self.cards.len() {
            Some(self.cards.remove(index))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn strategy_key(&self) -> StrategyKey {
        if self.is_pair() {
            return StrategyKey::Pair(self.cards[0].rank);
        }
        let value = self.value();
        if self.is_soft() {
            StrategyKey::Soft(value - 11)
        } else {
            StrategyKey::Hard(value)
        }
    }
}

impl Default for Hand {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cards: Vec<String> = self.cards.iter().map(Card::to_display).collect();
        write!(f, "[{}] = {}", cards.join(" "), self.value())?;
        if self.is_soft() {
            write!(f, " (soft)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Suit;

    fn c(rank: Rank) -> Card {
        Card::new(rank, Suit::Hearts)
    }

    #[test]
    fn test_calculate_hand_value_simple() {
        let cards = vec![c(Rank::Two), c(Rank::Three)];
        assert_eq!(calculate_hand_value(&cards), 5);
    }

    #[test]
    fn test_calculate_hand_value_with_face_cards() {
        let cards = vec![c(Rank::King), c(Rank::Queen)];
        assert_eq!(calculate_hand_value(&cards), 20);
    }

    #[test]
    fn test_soft_seventeen() {
        let cards = vec![c(Rank::Ace), c(Rank::Six)];
        assert_eq!(calculate_hand_value(&cards), 17);
        assert!(is_soft_hand(&cards));
    }

    #[test]
    fn test_ace_demoted_to_hard() {
        let cards = vec![c(Rank::Ace), c(Rank::Six), c(Rank::Ten)];
        assert_eq!(calculate_hand_value(&cards), 17);
        assert!(!is_soft_hand(&cards));
        assert!(!is_busted(&cards));
    }

    #[test]
    fn test_multiple_aces() {
        let cards = vec![c(Rank::Ace), c(Rank::Ace), c(Rank::Nine)];
        assert_eq!(calculate_hand_value(&cards), 21);
        assert!(is_soft_hand(&cards));

        let four_aces = vec![c(Rank::Ace), c(Rank::Ace), c(Rank::Ace), c(Rank::Ace)];
        assert_eq!(calculate_hand_value(&four_aces), 14);
    }

    #[test]
    fn test_value_never_busts_when_an_assignment_exists() {
        // every 3-card combination of ranks: if any ace assignment stays <= 21, value does too
        for a in Rank::ALL {
            for b in Rank::ALL {
                for d in Rank::ALL {
                    let cards = vec![c(a), c(b), c(d)];
                    let aces = cards.iter().filter(|x| x.is_ace()).count() as u16;
                    let hard_min: u16 = cards
                        .iter()
                        .map(|x| if x.is_ace() { 1 } else { x.value() as u16 })
                        .sum();
                    let value = calculate_hand_value(&cards) as u16;
                    if hard_min <= 21 {
                        assert!(value <= 21, "{cards:?}");
                    }
                    assert!(value >= hard_min && value <= hard_min + 10 * aces);
                }
            }
        }
    }

    #[test]
    fn test_is_blackjack() {
        assert!(is_blackjack(&[c(Rank::Ace), c(Rank::King)]));
        assert!(!is_blackjack(&[c(Rank::Seven), c(Rank::Seven), c(Rank::Seven)]));
        assert!(!is_blackjack(&[c(Rank::King), c(Rank::Queen)]));
    }

    #[test]
    fn test_split_hand_is_not_natural() {
        let mut hand = Hand::from_cards(&[c(Rank::Ace), c(Rank::Jack)]);
        assert!(hand.is_natural());
        hand.split = true;
        assert!(hand.is_blackjack());
        assert!(!hand.is_natural());
    }

    #[test]
    fn test_can_split_cards() {
        assert!(can_split_cards(&c(Rank::Eight), &Card::new(Rank::Eight, Suit::Spades)));
        assert!(!can_split_cards(&c(Rank::Eight), &c(Rank::Nine)));
        assert!(!can_split_cards(&c(Rank::King), &c(Rank::Queen)));
    }

    #[test]
    fn test_is_pair_needs_two_cards() {
        let mut hand = Hand::from_cards(&[c(Rank::Eight), c(Rank::Eight)]);
        assert!(hand.is_pair());
        hand.add_card(c(Rank::Two));
        assert!(!hand.is_pair());
    }

    #[test]
    fn test_remove_card() {
        let mut hand = Hand::from_cards(&[c(Rank::Eight), c(Rank::Nine)]);
        assert_eq!(hand.remove_card(1), Some(c(Rank::Nine)));
        assert_eq!(hand.remove_card(4), None);
        assert_eq!(hand.len(), 1);
    }

    #[test]
    fn test_strategy_keys() {
        assert_eq!(Hand::from_cards(&[c(Rank::Eight), c(Rank::Eight)]).strategy_key().to_string(), "pair_8");
        assert_eq!(Hand::from_cards(&[c(Rank::Ace), c(Rank::Six)]).strategy_key().to_string(), "soft_6");
        assert_eq!(Hand::from_cards(&[c(Rank::Ten), c(Rank::Seven)]).strategy_key().to_string(), "hard_17");
        assert_eq!(
            Hand::from_cards(&[c(Rank::Ace), c(Rank::Six), c(Rank::Ten)]).strategy_key(),
            StrategyKey::Hard(17)
        );
    }

    #[test]
    fn test_display() {
        let hand = Hand::from_cards(&[c(Rank::Ace), c(Rank::Six)]);
        assert_eq!(hand.to_string(), "[A♥ 6♥] = 17 (soft)");
    }
}
