use serde::{Deserialize, Serialize};

use crate::{Card, Error, Hand, HandOutcome};

/// Restrictions on when doubling down is allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoubleRestriction {
    /// Can double on any two cards
    Any,
    /// Can only double on hard 9, 10, or 11
    Hard9_10_11,
    /// Can only double on hard 10 or 11
    Hard10_11,
}

/// Payout multiplier as a ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRatio {
    pub numerator: u16,
    pub denominator: u16,
}

impl PayoutRatio {
    pub const THREE_TO_TWO: Self = Self {
        numerator: 3,
        denominator: 2,
    };
    pub const SIX_TO_FIVE: Self = Self {
        numerator: 6,
        denominator: 5,
    };
    pub const TWO_TO_ONE: Self = Self {
        numerator: 2,
        denominator: 1,
    };
    pub const ONE_TO_ONE: Self = Self {
        numerator: 1,
        denominator: 1,
    };

    pub fn new(numerator: u16, denominator: u16) -> Result<Self, Error> {
        if denominator == 0 {
            return Err(Error::InvalidPayoutRatio);
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Winnings for `bet`, rounded down.
    pub fn calculate_payout(&self, bet: u64) -> u64 {
        (bet as u128 * self.numerator as u128 / self.denominator as u128) as u64
    }

    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

/// Why a hand settled the way it did, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultReason {
    Surrendered,
    BothBlackjack,
    PlayerBlackjack,
    DealerBlackjack,
    PlayerBust,
    DealerBust,
    Charlie,
    HigherTotal,
    LowerTotal,
    EqualTotal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandResult {
    pub outcome: HandOutcome,
    pub reason: ResultReason,
}

impl HandResult {
    fn new(outcome: HandOutcome, reason: ResultReason) -> Self {
        Self { outcome, reason }
    }
}

/// Configurable blackjack game rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameRules {
    /// Dealer stands on soft 17
    pub dealer_stands_soft_17: bool,

    /// Blackjack payout multiplier (commonly 3:2 or 6:5)
    pub blackjack_payout: PayoutRatio,

    /// Insurance payout multiplier (2:1)
    pub insurance_payout: PayoutRatio,

    /// Allow doubling after split
    pub double_after_split: bool,

    /// Restriction on when doubling is allowed based on hand value
    pub double_restriction: DoubleRestriction,

    /// Can split aces again when another ace lands on a split ace
    pub resplit_aces: bool,

    /// Split aces may draw more than one card
    pub hit_split_aces: bool,

    /// Maximum number of hands a seat can hold after splitting
    pub max_split_hands: u8,

    /// Late surrender on the first two cards
    pub allow_surrender: bool,

    /// Fraction of the shoe dealt before the cut card
    pub penetration: f64,

    pub min_bet: u64,
    pub max_bet: u64,

    /// Number of decks in the shoe
    pub num_decks: u8,

    /// Automatic win on reaching this many cards without busting
    pub charlie: Option<u8>,
}

impl Default for GameRules {
    fn default() -> Self {
        Self::vegas()
    }
}

impl GameRules {
    pub const PRESETS: [&'static str; 4] = ["vegas", "european", "atlantic_city", "single_deck"];

    /// Standard Las Vegas Strip rules
    pub fn vegas() -> Self {
        Self {
            dealer_stands_soft_17: true,
            blackjack_payout: PayoutRatio::THREE_TO_TWO,
            insurance_payout: PayoutRatio::TWO_TO_ONE,
            double_after_split: true,
            double_restriction: DoubleRestriction::Any,
            resplit_aces: false,
            hit_split_aces: false,
            max_split_hands: 4,
            allow_surrender: true,
            penetration: 0.75,
            min_bet: 5,
            max_bet: 500,
            num_decks: 6,
            charlie: None,
        }
    }

    /// European rules (no double after split, no surrender)
    pub fn european() -> Self {
        Self {
            double_after_split: false,
            double_restriction: DoubleRestriction::Hard9_10_11,
            max_split_hands: 2,
            allow_surrender: false,
            penetration: 0.7,
            ..Self::vegas()
        }
    }

    /// Atlantic City rules
    pub fn atlantic_city() -> Self {
        Self {
            num_decks: 8,
            min_bet: 10,
            max_bet: 1000,
            ..Self::vegas()
        }
    }

    /// Single deck rules (dealer hits soft 17, 6:5 blackjack)
    pub fn single_deck() -> Self {
        Self {
            dealer_stands_soft_17: false,
            blackjack_payout: PayoutRatio::SIX_TO_FIVE,
            double_after_split: false,
            double_restriction: DoubleRestriction::Hard10_11,
            max_split_hands: 2,
            allow_surrender: false,
            penetration: 0.6,
            num_decks: 1,
            ..Self::vegas()
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "vegas" | "default" => Some(Self::vegas()),
            "european" => Some(Self::european()),
            "atlantic_city" => Some(Self::atlantic_city()),
            "single_deck" => Some(Self::single_deck()),
            _ => None,
        }
    }

    pub fn dealer_should_hit(&self, hand: &Hand) -> bool {
        let value = hand.value();
        value < 17 || (value == 17 && hand.is_soft() && !self.dealer_stands_soft_17)
    }

    pub fn can_double_down(&self, hand: &Hand) -> bool {
        if hand.cards.len() != 2 || hand.doubled {
            return false;
        }
        if hand.split && !self.double_after_split {
            return false;
        }

        let value = hand.value();
        let soft = hand.is_soft();
        match self.double_restriction {
            DoubleRestriction::Any => true,
            DoubleRestriction::Hard9_10_11 => !soft && (9..=11).contains(&value),
            DoubleRestriction::Hard10_11 => !soft && (10..=11).contains(&value),
        }
    }

    pub fn can_split(&self, hand: &Hand, current_hand_count: usize) -> bool {
        if !hand.is_pair() || current_hand_count >= self.max_split_hands as usize {
            return false;
        }
        // Check if splitting aces again and resplit_aces is disabled
        !(hand.cards[0].is_ace() && hand.split && !self.resplit_aces)
    }

    pub fn can_take_insurance(&self, dealer_up_card: &Card, hand: &Hand, already_taken: bool) -> bool {
        dealer_up_card.is_ace() && hand.cards.len() == 2 && !already_taken
    }

    pub fn can_surrender(&self, hand: &Hand, current_hand_count: usize) -> bool {
        self.allow_surrender
            && current_hand_count == 1
            && hand.cards.len() == 2
            && !hand.split
            && !hand.doubled
            && !hand.surrendered
    }

    pub fn determine_result(&self, player: &Hand, dealer: &Hand) -> HandResult {
        if player.surrendered {
            return HandResult::new(HandOutcome::Surrender, ResultReason::Surrendered);
        }

        let player_natural = player.is_natural();
        let dealer_natural = dealer.is_natural();
        match (player_natural, dealer_natural) {
            (true, true) => return HandResult::new(HandOutcome::Push, ResultReason::BothBlackjack),
            (true, false) => return HandResult::new(HandOutcome::Blackjack, ResultReason::PlayerBlackjack),
            (false, true) => return HandResult::new(HandOutcome::Loss, ResultReason::DealerBlackjack),
            (false, false) => {}
        }

        if player.is_busted() {
            return HandResult::new(HandOutcome::Loss, ResultReason::PlayerBust);
        }
        if dealer.is_busted() {
            return HandResult::new(HandOutcome::Win, ResultReason::DealerBust);
        }
        if let Some(cards) = self.charlie {
            if player.cards.len() >= cards as usize {
                return HandResult::new(HandOutcome::Win, ResultReason::Charlie);
            }
        }

        let (p, d) = (player.value(), dealer.value());
        if p > d {
            HandResult::new(HandOutcome::Win, ResultReason::HigherTotal)
        } else if p < d {
            HandResult::new(HandOutcome::Loss, ResultReason::LowerTotal)
        } else {
            HandResult::new(HandOutcome::Push, ResultReason::EqualTotal)
        }
    }

    pub fn calculate_blackjack_payout(&self, bet: u64) -> u64 {
        self.blackjack_payout.calculate_payout(bet)
    }

    /// Winnings on a successful insurance bet.
    pub fn calculate_insurance_payout(&self, insurance_bet: u64) -> u64 {
        self.insurance_payout.calculate_payout(insurance_bet)
    }

    /// Total returned to the player (stake included) for a settled share.
    pub fn payout_for(&self, outcome: HandOutcome, share: u64) -> u64 {
        match outcome {
            HandOutcome::Blackjack => share + self.calculate_blackjack_payout(share),
            HandOutcome::Win => share * 2,
            HandOutcome::Push => share,
            HandOutcome::Surrender => share / 2,
            HandOutcome::Loss => 0,
        }
    }

    pub fn clamp_bet(&self, amount: u64) -> u64 {
        amount.clamp(self.min_bet, self.max_bet.max(self.min_bet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Rank, Suit};

    fn hand(ranks: &[Rank]) -> Hand {
        let cards: Vec<Card> = ranks.iter().map(|r| Card::new(*r, Suit::Clubs)).collect();
        Hand::from_cards(&cards)
    }

    #[test]
    fn test_payout_ratio_three_to_two() {
        let ratio = PayoutRatio::THREE_TO_TWO;
        assert_eq!(ratio.calculate_payout(100), 150);
        assert_eq!(ratio.calculate_payout(25), 37);
    }

    #[test]
    fn test_payout_ratio_six_to_five() {
        let ratio = PayoutRatio::SIX_TO_FIVE;
        assert_eq!(ratio.calculate_payout(100), 120);
        assert_eq!(ratio.calculate_payout(10), 12);
    }

    #[test]
    fn test_payout_ratio_zero_denominator() {
        assert_eq!(PayoutRatio::new(3, 0), Err(Error::InvalidPayoutRatio));
        assert_eq!(PayoutRatio::new(2, 1).unwrap().calculate_payout(100), 200);
    }

    #[test]
    fn test_insurance_payout() {
        let rules = GameRules::default();
        assert_eq!(rules.calculate_insurance_payout(12), 24);
    }

    #[test]
    fn test_dealer_hit_boundaries() {
        let mut rules = GameRules::default();
        assert!(rules.dealer_should_hit(&hand(&[Rank::Ten, Rank::Six])));
        assert!(!rules.dealer_should_hit(&hand(&[Rank::Ten, Rank::Seven])));
        assert!(!rules.dealer_should_hit(&hand(&[Rank::Ace, Rank::Six])));

        rules.dealer_stands_soft_17 = false;
        assert!(rules.dealer_should_hit(&hand(&[Rank::Ace, Rank::Six])));
        assert!(!rules.dealer_should_hit(&hand(&[Rank::Ten, Rank::Seven])));
        assert!(!rules.dealer_should_hit(&hand(&[Rank::Ace, Rank::Seven])));
    }

    #[test]
    fn test_can_double_down() {
        let rules = GameRules::default();
        assert!(rules.can_double_down(&hand(&[Rank::Six, Rank::Five])));
        assert!(!rules.can_double_down(&hand(&[Rank::Six, Rank::Three, Rank::Two])));

        let mut split = hand(&[Rank::Eight, Rank::Three]);
        split.split = true;
        assert!(rules.can_double_down(&split));

        let european = GameRules::european();
        assert!(!european.can_double_down(&split));
        assert!(!european.can_double_down(&hand(&[Rank::Ace, Rank::Six])));
        assert!(european.can_double_down(&hand(&[Rank::Six, Rank::Four])));
    }

    #[test]
    fn test_can_split_respects_max_hands() {
        let rules = GameRules::default();
        let pair = hand(&[Rank::Eight, Rank::Eight]);
        assert!(rules.can_split(&pair, 1));
        assert!(rules.can_split(&pair, 3));
        assert!(!rules.can_split(&pair, 4));
        assert!(!rules.can_split(&hand(&[Rank::King, Rank::Queen]), 1));
    }

    #[test]
    fn test_resplit_aces() {
        let mut rules = GameRules::default();
        let mut aces = hand(&[Rank::Ace, Rank::Ace]);
        assert!(rules.can_split(&aces, 1));
        aces.split = true;
        assert!(!rules.can_split(&aces, 2));
        rules.resplit_aces = true;
        assert!(rules.can_split(&aces, 2));
    }

    #[test]
    fn test_can_take_insurance() {
        let rules = GameRules::default();
        let ace = Card::new(Rank::Ace, Suit::Spades);
        let ten = Card::new(Rank::Ten, Suit::Spades);
        let player = hand(&[Rank::Ten, Rank::Six]);
        assert!(rules.can_take_insurance(&ace, &player, false));
        assert!(!rules.can_take_insurance(&ace, &player, true));
        assert!(!rules.can_take_insurance(&ten, &player, false));
        assert!(!rules.can_take_insurance(&ace, &hand(&[Rank::Ten, Rank::Two, Rank::Two]), false));
    }

    #[test]
    fn test_determine_result_priority() {
        let rules = GameRules::default();
        let bj = hand(&[Rank::Ace, Rank::King]);
        let twenty = hand(&[Rank::King, Rank::Queen]);
        let bust = hand(&[Rank::King, Rank::Queen, Rank::Five]);

        assert_eq!(rules.determine_result(&bj, &bj).reason, ResultReason::BothBlackjack);
        assert_eq!(rules.determine_result(&bj, &twenty).outcome, HandOutcome::Blackjack);
        assert_eq!(rules.determine_result(&twenty, &bj).outcome, HandOutcome::Loss);
        assert_eq!(rules.determine_result(&bust, &bust).reason, ResultReason::PlayerBust);
        assert_eq!(rules.determine_result(&twenty, &bust).reason, ResultReason::DealerBust);
        assert_eq!(rules.determine_result(&twenty, &twenty).outcome, HandOutcome::Push);
        assert_eq!(
            rules.determine_result(&hand(&[Rank::Ten, Rank::Seven]), &twenty).reason,
            ResultReason::LowerTotal
        );
    }

    #[test]
    fn test_charlie_rule() {
        let rules = GameRules {
            charlie: Some(5),
            ..GameRules::default()
        };
        let five_cards = hand(&[Rank::Two, Rank::Two, Rank::Three, Rank::Two, Rank::Four]);
        let dealer = hand(&[Rank::King, Rank::Queen]);
        assert_eq!(rules.determine_result(&five_cards, &dealer).reason, ResultReason::Charlie);
        assert_eq!(
            GameRules::default().determine_result(&five_cards, &dealer).outcome,
            HandOutcome::Loss
        );
    }

    #[test]
    fn test_payout_for() {
        let rules = GameRules::default();
        assert_eq!(rules.payout_for(HandOutcome::Blackjack, 25), 62);
        assert_eq!(rules.payout_for(HandOutcome::Win, 25), 50);
        assert_eq!(rules.payout_for(HandOutcome::Push, 25), 25);
        assert_eq!(rules.payout_for(HandOutcome::Surrender, 25), 12);
        assert_eq!(rules.payout_for(HandOutcome::Loss, 25), 0);
    }

    #[test]
    fn test_presets() {
        assert_eq!(GameRules::preset("European"), Some(GameRules::european()));
        assert_eq!(GameRules::single_deck().blackjack_payout, PayoutRatio::SIX_TO_FIVE);
        assert!(GameRules::preset("macau").is_none());
        for name in GameRules::PRESETS {
            assert!(GameRules::preset(name).is_some());
        }
    }
}
