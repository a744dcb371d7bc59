use blackjack_core::{BettingRecommendation, CountSnapshot, IndexPlay, RiskLevel, StrategyHint};

use super::Engine;
use crate::msg::{HandView, QueryMsg, QueryResponse, TableView};

impl Engine {
    pub fn query(&self, msg: QueryMsg) -> QueryResponse {
        match msg {
            QueryMsg::Table => QueryResponse::Table(self.table()),
            QueryMsg::AvailableActions => QueryResponse::AvailableActions(self.available_actions()),
            QueryMsg::Count => QueryResponse::Count(self.count_snapshot()),
            QueryMsg::BettingAdvice { risk } => QueryResponse::BettingAdvice(self.betting_advice(risk)),
            QueryMsg::IndexPlay => QueryResponse::IndexPlay(self.index_play()),
            QueryMsg::StrategyHint => QueryResponse::StrategyHint(self.current_hint()),
            QueryMsg::Stats => QueryResponse::Stats(self.stats.clone()),
            QueryMsg::Settings => QueryResponse::Settings(self.settings.clone()),
        }
    }

    pub fn table(&self) -> TableView {
        let hands = self
            .spot
            .hands
            .iter()
            .map(|h| HandView {
                cards: h.cards.clone(),
                value: h.value(),
                soft: h.is_soft(),
                doubled: h.doubled,
                split: h.split,
                stood: h.stood,
                surrendered: h.surrendered,
                busted: h.is_busted(),
            })
            .collect();

        let dealer_cards = self
            .dealer
            .cards
            .iter()
            .enumerate()
            .map(|(i, card)| if i == 0 && !self.hole_revealed { None } else { Some(*card) })
            .collect();
        let dealer_value = if self.hole_revealed {
            self.dealer.value()
        } else {
            self.dealer_up_card().map(|c| c.value()).unwrap_or(0)
        };

        TableView {
            phase: self.state.phase,
            round: self.state.round_number,
            hands,
            active_hand_index: self.spot.active_hand_index,
            dealer_cards,
            dealer_value,
            current_bet: self.state.current_bet,
            insurance_bet: self.state.insurance_bet,
            insurance_offered: self.insurance.offered,
            bankroll: self.bankroll,
            cards_remaining: self.shoe.remaining(),
            available_actions: self.available_actions(),
        }
    }

    pub fn count_snapshot(&self) -> CountSnapshot {
        self.counting.snapshot(self.shoe.penetration_progress())
    }

    pub fn betting_advice(&self, risk: RiskLevel) -> BettingRecommendation {
        self.counting.betting_recommendation(self.base_bet, self.bankroll, risk)
    }

    /// Count-based deviation for the active hand, if one applies.
    pub fn index_play(&self) -> Option<IndexPlay> {
        if !self.in_player_turn() {
            return None;
        }
        let up = self.dealer_up_card()?;
        self.counting.index_play_recommendation(self.spot.active_hand(), up)
    }

    /// Basic strategy for the active hand, without recording it as shown.
    pub fn current_hint(&self) -> Option<StrategyHint> {
        if !self.in_player_turn() {
            return None;
        }
        let up = self.dealer_up_card()?;
        let hand = self.spot.active_hand();
        if hand.is_finished() {
            return None;
        }
        let can_double = self.rules.can_double_down(hand) && self.bankroll >= self.state.current_bet + self.unit();
        let can_split = self.spot.can_split_active(&self.rules) && self.bankroll >= self.state.current_bet + self.unit();
        let can_surrender = self.rules.can_surrender(hand, self.spot.hands.len());
        Some(self.advisor.recommend(hand, up, can_double, can_split, can_surrender))
    }

    fn in_player_turn(&self) -> bool {
        self.state.phase == blackjack_core::GamePhase::Playing
    }
}
