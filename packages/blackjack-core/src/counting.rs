//! Hi-Lo card counting: running and true count, side counts, bet sizing,
//! index plays and count-practice grading.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::shoe::CARDS_PER_DECK;
use crate::{Card, Hand, Rank};

pub const COUNT_HISTORY_LIMIT: usize = 104;
const MIN_DECKS_REMAINING: f64 = 0.5;
const KELLY_FRACTION: f64 = 0.25;

pub fn hi_lo_value(card: &Card) -> i32 {
    match card.value() {
        2..=6 => 1,
        7..=9 => 0,
        _ => -1,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideCounts {
    pub aces: u32,
    pub fives: u32,
    pub tens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEvent {
    pub card: Card,
    pub visible: bool,
    pub delta: i32,
    pub running_count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountSnapshot {
    pub running_count: i32,
    pub true_count: f64,
    pub decks_remaining: f64,
    pub penetration: f64,
    pub cards_dealt: u32,
    pub side_counts: SideCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Conservative,
    Aggressive,
}

impl RiskLevel {
    /// (minimum true count, bet multiple), highest threshold last
    fn spread(&self) -> &'static [(f64, u64)] {
        match self {
            RiskLevel::Conservative => &[(1.0, 2), (2.0, 3), (3.0, 4), (4.0, 6)],
            RiskLevel::Aggressive => &[(1.0, 2), (2.0, 4), (3.0, 6), (4.0, 8), (5.0, 12)],
        }
    }

    fn bankroll_cap(&self) -> f64 {
        match self {
            RiskLevel::Conservative => 0.05,
            RiskLevel::Aggressive => 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BettingRecommendation {
    pub recommended_bet: u64,
    pub multiplier: u64,
    pub true_count: f64,
    /// Player edge in percent
    pub advantage: f64,
    pub kelly_bet: u64,
    pub exceeds_kelly: bool,
    pub capped_by_bankroll: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexAction {
    Stand,
    Double,
    TakeInsurance,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexPlay {
    pub name: &'static str,
    pub action: IndexAction,
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Situation {
    HardVs(u8, u8),
    InsuranceOffer,
}

/// The Illustrious deviations this trainer drills, in priority order.
const INDEX_PLAYS: [(Situation, IndexPlay); 6] = [
    (Situation::HardVs(16, 10), IndexPlay { name: "16 vs 10", action: IndexAction::Stand, threshold: 0.0 }),
    (Situation::HardVs(15, 10), IndexPlay { name: "15 vs 10", action: IndexAction::Stand, threshold: 4.0 }),
    (Situation::HardVs(12, 2), IndexPlay { name: "12 vs 2", action: IndexAction::Stand, threshold: 3.0 }),
    (Situation::HardVs(12, 3), IndexPlay { name: "12 vs 3", action: IndexAction::Stand, threshold: 2.0 }),
    (Situation::HardVs(11, 11), IndexPlay { name: "11 vs A", action: IndexAction::Double, threshold: 1.0 }),
    (Situation::InsuranceOffer, IndexPlay { name: "Insurance", action: IndexAction::TakeInsurance, threshold: 3.0 }),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CountPracticeStats {
    pub estimates: u32,
    pub exact: u32,
    pub total_deviation: u64,
    pub total_score: u64,
}

impl CountPracticeStats {
    pub fn accuracy(&self) -> f64 {
        if self.estimates == 0 {
            return 0.0;
        }
        self.total_score as f64 / self.estimates as f64
    }

    pub fn average_deviation(&self) -> f64 {
        if self.estimates == 0 {
            return 0.0;
        }
        self.total_deviation as f64 / self.estimates as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountFeedback {
    pub estimate: i32,
    pub actual: i32,
    pub deviation: u32,
    pub score: u32,
    pub accuracy: f64,
}

fn estimate_score(deviation: u32) -> u32 {
    match deviation {
        0 => 100,
        1 => 75,
        2 => 50,
        3 => 25,
        _ => 0,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountingState {
    num_decks: u8,
    total_cards: u32,
    running_count: i32,
    cards_dealt: u32,
    side_counts: SideCounts,
    history: VecDeque<CountEvent>,
    practice: CountPracticeStats,
}

impl CountingState {
    pub fn new(num_decks: u8) -> Self {
        Self::with_total_cards(num_decks, num_decks as u32 * CARDS_PER_DECK as u32)
    }

    pub fn with_total_cards(num_decks: u8, total_cards: u32) -> Self {
        Self {
            num_decks,
            total_cards,
            running_count: 0,
            cards_dealt: 0,
            side_counts: SideCounts::default(),
            history: VecDeque::new(),
            practice: CountPracticeStats::default(),
        }
    }

    /// Every dealt card leaves the shoe; only face-up cards move the count.
    pub fn update_count(&mut self, card: &Card, visible: bool) {
        self.cards_dealt += 1;
        match card.rank {
            Rank::Ace => self.side_counts.aces += 1,
            Rank::Five => self.side_counts.fives += 1,
            r if r.is_ten_value() => self.side_counts.tens += 1,
            _ => {}
        }
        let delta = if visible { hi_lo_value(card) } else { 0 };
        self.running_count += delta;
        self.push_event(CountEvent {
            card: *card,
            visible,
            delta,
            running_count: self.running_count,
        });
    }

    /// Counts a card that was dealt face down and is now turned up.
    pub fn reveal(&mut self, card: &Card) {
        let delta = hi_lo_value(card);
        self.running_count += delta;
        self.push_event(CountEvent {
            card: *card,
            visible: true,
            delta,
            running_count: self.running_count,
        });
    }

    fn push_event(&mut self, event: CountEvent) {
        if self.history.len() == COUNT_HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(event);
    }

    /// Clears the count; practice statistics survive.
    pub fn reset(&mut self) {
        self.running_count = 0;
        self.cards_dealt = 0;
        self.side_counts = SideCounts::default();
        self.history.clear();
    }

    pub fn set_decks(&mut self, num_decks: u8, total_cards: u32) {
        self.num_decks = num_decks;
        self.total_cards = total_cards;
        self.reset();
    }

    /// Starts counting partway through a shoe: `cards_dealt` cards are gone
    /// unseen, so only the depth is known.
    pub fn resume_at(&mut self, cards_dealt: u32) {
        self.reset();
        self.cards_dealt = cards_dealt.min(self.total_cards);
    }

    pub fn running_count(&self) -> i32 {
        self.running_count
    }

    pub fn cards_dealt(&self) -> u32 {
        self.cards_dealt
    }

    pub fn num_decks(&self) -> u8 {
        self.num_decks
    }

    pub fn side_counts(&self) -> SideCounts {
        self.side_counts
    }

    pub fn history(&self) -> impl Iterator<Item = &CountEvent> {
        self.history.iter()
    }

    pub fn practice_stats(&self) -> CountPracticeStats {
        self.practice
    }

    pub fn set_practice_stats(&mut self, stats: CountPracticeStats) {
        self.practice = stats;
    }

    pub fn decks_remaining(&self) -> f64 {
        let left = self.total_cards.saturating_sub(self.cards_dealt) as f64 / CARDS_PER_DECK as f64;
        left.max(MIN_DECKS_REMAINING)
    }

    pub fn true_count(&self) -> f64 {
        true_count(self.running_count, self.decks_remaining())
    }

    /// Estimated player edge in percent.
    pub fn advantage(&self) -> f64 {
        advantage_for(self.true_count())
    }

    pub fn snapshot(&self, penetration: f64) -> CountSnapshot {
        CountSnapshot {
            running_count: self.running_count,
            true_count: self.true_count(),
            decks_remaining: self.decks_remaining(),
            penetration,
            cards_dealt: self.cards_dealt,
            side_counts: self.side_counts,
        }
    }

    pub fn betting_recommendation(&self, base_bet: u64, bankroll: u64, risk: RiskLevel) -> BettingRecommendation {
        let tc = self.true_count();
        let multiplier = risk
            .spread()
            .iter()
            .rev()
            .find(|(threshold, _)| tc >= *threshold)
            .map(|(_, m)| *m)
            .unwrap_or(1);

        let spread_bet = base_bet.saturating_mul(multiplier);
        let cap = (bankroll as f64 * risk.bankroll_cap()).floor() as u64;
        let capped_by_bankroll = spread_bet > cap;
        let recommended_bet = spread_bet.min(cap).max(base_bet);

        let advantage = advantage_for(tc);
        let kelly_bet = kelly_bet(bankroll, advantage);
        let exceeds_kelly = multiplier > 1 && recommended_bet > kelly_bet;

        let message = if multiplier == 1 {
            format!("True count {tc:+.1}: bet the minimum unit")
        } else if exceeds_kelly {
            format!("True count {tc:+.1}: raise to {multiplier}x, above quarter-Kelly ({kelly_bet})")
        } else {
            format!("True count {tc:+.1}: raise to {multiplier}x")
        };

        BettingRecommendation {
            recommended_bet,
            multiplier,
            true_count: tc,
            advantage,
            kelly_bet,
            exceeds_kelly,
            capped_by_bankroll,
            message,
        }
    }

    pub fn index_play_recommendation(&self, hand: &Hand, dealer_up_card: &Card) -> Option<IndexPlay> {
        let tc = self.true_count();
        let value = hand.value();
        let soft = hand.is_soft();
        let up = dealer_up_card.value();

        INDEX_PLAYS
            .iter()
            .find(|(situation, play)| {
                let matches = match situation {
                    Situation::HardVs(total, dealer) => !soft && value == *total && up == *dealer,
                    Situation::InsuranceOffer => dealer_up_card.is_ace() && hand.cards.len() == 2,
                };
                matches && tc >= play.threshold
            })
            .map(|(_, play)| *play)
    }

    pub fn record_count_estimate(&mut self, estimate: i32) -> CountFeedback {
        let actual = self.running_count;
        let deviation = estimate.abs_diff(actual);
        let score = estimate_score(deviation);

        self.practice.estimates += 1;
        self.practice.total_deviation += deviation as u64;
        self.practice.total_score += score as u64;
        if deviation == 0 {
            self.practice.exact += 1;
        }

        CountFeedback {
            estimate,
            actual,
            deviation,
            score,
            accuracy: self.practice.accuracy(),
        }
    }
}

pub fn true_count(running_count: i32, decks_remaining: f64) -> f64 {
    running_count as f64 / decks_remaining.max(MIN_DECKS_REMAINING)
}

/// Player edge in percent for a true count.
pub fn advantage_for(true_count: f64) -> f64 {
    -0.5 + 0.5 * true_count
}

pub fn kelly_bet(bankroll: u64, advantage_percent: f64) -> u64 {
    if advantage_percent <= 0.0 {
        return 0;
    }
    (bankroll as f64 * advantage_percent / 100.0 * KELLY_FRACTION).floor() as u64
}

/// Probability of losing `bankroll` betting `bet_size` flat with `advantage`
/// given as a fraction (0.01 = 1%).
pub fn risk_of_ruin(bankroll: u64, bet_size: u64, advantage: f64) -> f64 {
    if advantage <= 0.0 || bankroll == 0 {
        return 1.0;
    }
    if bet_size == 0 {
        return 0.0;
    }
    let units = bankroll as f64 / bet_size as f64;
    ((1.0 - advantage) / (1.0 + advantage)).powf(units).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Suit;

    fn c(rank: Rank) -> Card {
        Card::new(rank, Suit::Diamonds)
    }

    fn state_with_count(running: i32, cards_dealt: u32) -> CountingState {
        let mut state = CountingState::new(6);
        state.running_count = running;
        state.cards_dealt = cards_dealt;
        state
    }

    #[test]
    fn test_hi_lo_values() {
        for rank in [Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six] {
            assert_eq!(hi_lo_value(&c(rank)), 1);
        }
        for rank in [Rank::Seven, Rank::Eight, Rank::Nine] {
            assert_eq!(hi_lo_value(&c(rank)), 0);
        }
        for rank in [Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace] {
            assert_eq!(hi_lo_value(&c(rank)), -1);
        }
    }

    #[test]
    fn test_hidden_cards_skip_running_count() {
        let mut state = CountingState::new(6);
        state.update_count(&c(Rank::Five), true);
        state.update_count(&c(Rank::Two), false);
        state.update_count(&c(Rank::Ace), true);
        assert_eq!(state.running_count(), 0);
        assert_eq!(state.cards_dealt(), 3);
        assert_eq!(state.side_counts(), SideCounts { aces: 1, fives: 1, tens: 0 });

        state.reveal(&c(Rank::Two));
        assert_eq!(state.running_count(), 1);
        assert_eq!(state.cards_dealt(), 3);
    }

    #[test]
    fn test_decks_remaining_floor() {
        let state = state_with_count(4, 310);
        assert_eq!(state.decks_remaining(), 0.5);
        assert_eq!(state.true_count(), 8.0);
    }

    #[test]
    fn test_true_count_is_pure() {
        let cards = [Rank::Two, Rank::King, Rank::Five, Rank::Six, Rank::Nine, Rank::Three];
        let mut a = CountingState::new(2);
        let mut b = CountingState::new(2);
        for rank in cards {
            a.update_count(&c(rank), true);
            b.update_count(&c(rank), true);
            assert_eq!(a.true_count(), b.true_count());
            assert_eq!(a.true_count(), true_count(a.running_count(), a.decks_remaining()));
        }
    }

    #[test]
    fn test_reset() {
        let mut state = CountingState::new(6);
        state.update_count(&c(Rank::Four), true);
        state.record_count_estimate(1);
        state.reset();
        assert_eq!(state.running_count(), 0);
        assert_eq!(state.decks_remaining(), 6.0);
        assert_eq!(state.history().count(), 0);
        assert_eq!(state.practice_stats().estimates, 1);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut state = CountingState::new(8);
        for _ in 0..200 {
            state.update_count(&c(Rank::Seven), true);
        }
        assert_eq!(state.history().count(), COUNT_HISTORY_LIMIT);
    }

    #[test]
    fn test_betting_recommendation_spreads() {
        // 6 decks, nothing dealt: tc = running / 6
        let neutral = state_with_count(0, 0);
        let rec = neutral.betting_recommendation(10, 10_000, RiskLevel::Conservative);
        assert_eq!(rec.multiplier, 1);
        assert_eq!(rec.recommended_bet, 10);
        assert!(!rec.exceeds_kelly);

        let hot = state_with_count(18, 0);
        let conservative = hot.betting_recommendation(10, 10_000, RiskLevel::Conservative);
        assert_eq!(conservative.multiplier, 4);
        assert_eq!(conservative.recommended_bet, 40);
        assert_eq!(conservative.advantage, 1.0);
        assert_eq!(conservative.kelly_bet, 25);
        assert!(conservative.exceeds_kelly);

        let aggressive = hot.betting_recommendation(10, 10_000, RiskLevel::Aggressive);
        assert_eq!(aggressive.multiplier, 6);
        assert_eq!(aggressive.recommended_bet, 60);
    }

    #[test]
    fn test_betting_recommendation_bankroll_cap() {
        let hot = state_with_count(30, 0);
        let rec = hot.betting_recommendation(25, 1_000, RiskLevel::Conservative);
        assert_eq!(rec.multiplier, 6);
        assert!(rec.capped_by_bankroll);
        assert_eq!(rec.recommended_bet, 50);
    }

    #[test]
    fn test_bankroll_cap_never_below_base_bet() {
        // tc +4: the spread asks for 6x
        let hot = state_with_count(24, 0);
        let rec = hot.betting_recommendation(10, 100, RiskLevel::Conservative);
        assert_eq!(rec.multiplier, 6);
        assert!(rec.capped_by_bankroll);
        assert_eq!(rec.recommended_bet, 10);

        let aggressive = hot.betting_recommendation(10, 300, RiskLevel::Aggressive);
        assert_eq!(aggressive.recommended_bet, 30);
    }

    #[test]
    fn test_resume_mid_shoe() {
        let mut state = state_with_count(7, 20);
        state.resume_at(156);
        assert_eq!(state.running_count(), 0);
        assert_eq!(state.cards_dealt(), 156);
        assert_eq!(state.decks_remaining(), 3.0);

        state.resume_at(10_000);
        assert_eq!(state.decks_remaining(), 0.5);
    }

    #[test]
    fn test_index_plays_first_match() {
        let ten = c(Rank::King);
        let sixteen = Hand::from_cards(&[c(Rank::Ten), c(Rank::Six)]);
        let fifteen = Hand::from_cards(&[c(Rank::Ten), c(Rank::Five)]);

        let cold = state_with_count(-6, 0);
        assert_eq!(cold.index_play_recommendation(&sixteen, &ten), None);

        let neutral = state_with_count(0, 0);
        assert_eq!(
            neutral.index_play_recommendation(&sixteen, &ten).map(|p| p.action),
            Some(IndexAction::Stand)
        );
        assert_eq!(neutral.index_play_recommendation(&fifteen, &ten), None);

        let hot = state_with_count(24, 0);
        assert_eq!(hot.index_play_recommendation(&fifteen, &ten).map(|p| p.name), Some("15 vs 10"));
    }

    #[test]
    fn test_index_play_eleven_vs_ace_and_insurance() {
        let ace = c(Rank::Ace);
        let eleven = Hand::from_cards(&[c(Rank::Six), c(Rank::Five)]);
        let state = state_with_count(18, 0);
        assert_eq!(
            state.index_play_recommendation(&eleven, &ace).map(|p| p.action),
            Some(IndexAction::Double)
        );

        let twenty = Hand::from_cards(&[c(Rank::Ten), c(Rank::Queen)]);
        assert_eq!(
            state.index_play_recommendation(&twenty, &ace).map(|p| p.action),
            Some(IndexAction::TakeInsurance)
        );
        let lukewarm = state_with_count(6, 0);
        assert_eq!(lukewarm.index_play_recommendation(&twenty, &ace), None);
    }

    #[test]
    fn test_eights_have_no_deviation() {
        let state = state_with_count(18, 0);
        let eights = Hand::from_cards(&[c(Rank::Eight), Card::new(Rank::Eight, Suit::Hearts)]);
        assert_eq!(state.index_play_recommendation(&eights, &c(Rank::Six)), None);
    }

    #[test]
    fn test_risk_of_ruin() {
        assert_eq!(risk_of_ruin(1000, 10, 0.0), 1.0);
        assert_eq!(risk_of_ruin(1000, 10, -0.01), 1.0);
        let ror = risk_of_ruin(1000, 10, 0.01);
        assert!(ror > 0.0 && ror < 1.0);
        let expected = (0.99f64 / 1.01).powf(100.0);
        assert!((ror - expected).abs() < 1e-12);
        assert!(risk_of_ruin(10_000, 10, 0.01) < ror);
    }

    #[test]
    fn test_count_practice_grading() {
        let mut state = CountingState::new(6);
        state.update_count(&c(Rank::Two), true);
        state.update_count(&c(Rank::Three), true);

        let exact = state.record_count_estimate(2);
        assert_eq!(exact.score, 100);
        let off_by_one = state.record_count_estimate(1);
        assert_eq!(off_by_one.score, 75);
        let way_off = state.record_count_estimate(-5);
        assert_eq!(way_off.deviation, 7);
        assert_eq!(way_off.score, 0);

        let stats = state.practice_stats();
        assert_eq!(stats.estimates, 3);
        assert_eq!(stats.exact, 1);
        assert!((stats.accuracy() - 175.0 / 3.0).abs() < 1e-9);
    }
}
