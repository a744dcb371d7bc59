use blackjack_core::{now_millis, ActionRecord, GamePhase, IndexAction, PlayerAction, StrategyAction};

use super::Engine;
use crate::error::EngineError;
use crate::msg::{Command, Response, Seat, Severity};

impl Engine {
    pub(super) fn player_action(&mut self, action: PlayerAction, resp: &mut Response) -> Result<(), EngineError> {
        self.check_available(action)?;
        self.save_action(action);

        if let Some(correct) = self.accuracy.record_decision(action) {
            if correct {
                resp.message("Correct play", Severity::Success);
            } else if let Some(hint) = self.current_hint() {
                resp.message(format!("Basic strategy says {}", hint.action), Severity::Warning);
            }
        }

        match action {
            PlayerAction::Insurance => return self.execute_insurance(resp),
            PlayerAction::DeclineInsurance => {
                resp.message("Insurance declined", Severity::Info);
                self.close_insurance_offer(resp)?;
                return Ok(());
            }
            _ => {
                // any other decision withdraws the offer; a dealer blackjack ends the round here
                if self.close_insurance_offer(resp)? {
                    return Ok(());
                }
            }
        }

        match action {
            PlayerAction::Hit => self.execute_hit(resp),
            PlayerAction::Stand => self.execute_stand(resp),
            PlayerAction::DoubleDown => self.execute_double_down(resp),
            PlayerAction::Split => self.execute_split(resp),
            PlayerAction::Surrender => self.execute_surrender(resp),
            PlayerAction::Insurance | PlayerAction::DeclineInsurance => Ok(()),
        }
    }

    fn check_available(&self, action: PlayerAction) -> Result<(), EngineError> {
        let phase = self.state.phase;
        if phase != GamePhase::Playing {
            return Err(EngineError::InvalidPhase {
                action: action.as_str(),
                phase,
            });
        }
        if !self.available_actions().contains(&action) {
            return Err(EngineError::ActionUnavailable {
                action: action.as_str(),
                reason: self.unavailable_reason(action),
            });
        }
        Ok(())
    }

    /// Everything the player may do right now.
    pub fn available_actions(&self) -> Vec<PlayerAction> {
        if self.state.phase != GamePhase::Playing {
            return Vec::new();
        }
        PlayerAction::ALL
            .into_iter()
            .filter(|action| self.is_available(*action))
            .collect()
    }

    fn is_available(&self, action: PlayerAction) -> bool {
        let hand = self.spot.active_hand();
        let live = !hand.is_finished();
        match action {
            PlayerAction::Hit | PlayerAction::Stand => live,
            PlayerAction::DoubleDown => live && self.rules.can_double_down(hand) && self.can_afford(self.unit()),
            PlayerAction::Split => live && self.spot.can_split_active(&self.rules) && self.can_afford(self.unit()),
            PlayerAction::Surrender => live && self.rules.can_surrender(hand, self.spot.hands.len()),
            PlayerAction::Insurance => {
                let cost = self.state.current_bet / 2;
                self.insurance.offered
                    && cost > 0
                    && self.can_afford(cost)
                    && self
                        .dealer_up_card()
                        .is_some_and(|up| self.rules.can_take_insurance(up, hand, self.insurance.taken))
            }
            PlayerAction::DeclineInsurance => self.insurance.offered,
        }
    }

    fn can_afford(&self, extra: u64) -> bool {
        self.bankroll >= self.state.current_bet + extra
    }

    fn unavailable_reason(&self, action: PlayerAction) -> String {
        let hand = self.spot.active_hand();
        match action {
            _ if hand.is_finished() && !matches!(action, PlayerAction::Insurance | PlayerAction::DeclineInsurance) => {
                "hand is already finished".to_string()
            }
            PlayerAction::DoubleDown if self.rules.can_double_down(hand) => "not enough chips to double".to_string(),
            PlayerAction::DoubleDown => "doubling is not allowed on this hand".to_string(),
            PlayerAction::Split if self.spot.hands.len() >= self.rules.max_split_hands as usize => {
                format!("already at {} hands", self.rules.max_split_hands)
            }
            PlayerAction::Split if self.spot.can_split_active(&self.rules) => "not enough chips to split".to_string(),
            PlayerAction::Split => "hand is not a splittable pair".to_string(),
            PlayerAction::Surrender => "surrender is only allowed on the first two cards".to_string(),
            PlayerAction::Insurance | PlayerAction::DeclineInsurance if !self.insurance.offered => {
                "insurance is not on offer".to_string()
            }
            PlayerAction::Insurance => "not enough chips for insurance".to_string(),
            _ => "not available".to_string(),
        }
    }

    fn save_action(&mut self, action: PlayerAction) {
        self.state.save_game_state(ActionRecord {
            action,
            spot: self.spot.clone(),
            dealer_hand: self.dealer.clone(),
            current_bet: self.state.current_bet,
            insurance_bet: self.state.insurance_bet,
            insurance: self.insurance,
            bankroll: self.bankroll,
            phase: self.state.phase,
            timestamp: now_millis(),
        });
    }

    fn active_seat(&self) -> Seat {
        Seat::Player {
            hand: self.spot.active_hand_index,
        }
    }

    fn execute_hit(&mut self, resp: &mut Response) -> Result<(), EngineError> {
        let seat = self.active_seat();
        self.deal_card(seat, true, resp)?;
        self.push_total(seat, resp);

        let hand = self.spot.active_hand_mut();
        let value = hand.value();
        if hand.is_busted() {
            resp.message(format!("Bust with {value}"), Severity::Warning);
        } else if value == 21 {
            hand.stood = true;
        } else if let Some(limit) = self.rules.charlie {
            if hand.len() >= limit as usize {
                hand.stood = true;
                resp.message(format!("{limit}-card Charlie"), Severity::Success);
            }
        }
        self.advance_hand(resp)
    }

    fn execute_stand(&mut self, resp: &mut Response) -> Result<(), EngineError> {
        self.spot.active_hand_mut().stood = true;
        self.advance_hand(resp)
    }

    fn execute_double_down(&mut self, resp: &mut Response) -> Result<(), EngineError> {
        let unit = self.unit();
        self.state.current_bet += unit;
        self.spot.active_hand_mut().doubled = true;

        let seat = self.active_seat();
        self.deal_card(seat, true, resp)?;
        self.push_total(seat, resp);

        let hand = self.spot.active_hand_mut();
        hand.stood = true;
        if hand.is_busted() {
            let value = hand.value();
            resp.message(format!("Doubled and bust with {value}"), Severity::Warning);
        }
        self.advance_hand(resp)
    }

    fn execute_split(&mut self, resp: &mut Response) -> Result<(), EngineError> {
        let unit = self.unit();
        let index = self.spot.active_hand_index;
        let new_index = self.spot.split_active().map_err(|reason| EngineError::ActionUnavailable {
            action: PlayerAction::Split.as_str(),
            reason: reason.to_string(),
        })?;
        self.state.current_bet += unit;
        let aces = self.spot.hands[index].cards[0].is_ace();
        resp.message(format!("Split into {} hands", self.spot.hands.len()), Severity::Info);

        for hand in [index, new_index] {
            let seat = Seat::Player { hand };
            self.deal_card(seat, true, resp)?;
            self.push_total(seat, resp);
        }

        if aces && !self.rules.hit_split_aces {
            self.spot.hands[index].stood = true;
            self.spot.hands[new_index].stood = true;
        }
        for hand in [index, new_index] {
            if self.spot.hands[hand].value() == 21 {
                self.spot.hands[hand].stood = true;
            }
        }
        self.advance_hand(resp)
    }

    fn execute_surrender(&mut self, resp: &mut Response) -> Result<(), EngineError> {
        self.spot.active_hand_mut().surrendered = true;
        resp.message("Surrendered, half the bet returned", Severity::Info);
        self.advance_hand(resp)
    }

    /// Insurance is settled at once against the dealer's hole card.
    fn execute_insurance(&mut self, resp: &mut Response) -> Result<(), EngineError> {
        let bet = self.state.current_bet / 2;
        self.state.insurance_bet = bet;
        self.insurance.taken = true;

        let won = self.dealer.is_natural();
        let payout = if won {
            let payout = self.rules.calculate_insurance_payout(bet);
            self.bankroll += payout;
            payout
        } else {
            self.bankroll = self.bankroll.saturating_sub(bet);
            0
        };
        log::debug!("insurance {bet}: {}", if won { "won" } else { "lost" });
        resp.push(crate::msg::Event::InsuranceSettled { bet, won, payout });
        resp.message(
            if won {
                format!("Dealer has blackjack, insurance pays {payout}")
            } else {
                format!("No dealer blackjack, insurance bet of {bet} lost")
            },
            if won { Severity::Success } else { Severity::Warning },
        );

        // the hole card has been checked, taking the bet back would leak it
        self.state.clear_history();
        self.close_insurance_offer(resp)?;
        Ok(())
    }

    /// One discrete step of auto-play. Pausing is simply not calling this.
    pub(super) fn auto_play_step(&mut self) -> Result<Response, EngineError> {
        match self.state.phase {
            GamePhase::Waiting | GamePhase::Betting | GamePhase::Finished => {
                if self.settings.card_counting_mode {
                    let advice = self.betting_advice(blackjack_core::RiskLevel::Conservative);
                    self.base_bet = self.rules.clamp_bet(advice.recommended_bet);
                }
                self.execute(Command::DealNewHand)
            }
            GamePhase::Playing => {
                let action = self.auto_play_choice();
                log::debug!("auto-play chooses {}", action.as_str());
                self.execute(action.into())
            }
            phase => Err(EngineError::InvalidPhase {
                action: "auto_play_step",
                phase,
            }),
        }
    }

    fn auto_play_choice(&self) -> PlayerAction {
        if self.insurance.offered {
            let take = self.settings.card_counting_mode
                && self.index_play().is_some_and(|p| p.action == IndexAction::TakeInsurance)
                && self.is_available(PlayerAction::Insurance);
            return if take {
                PlayerAction::Insurance
            } else {
                PlayerAction::DeclineInsurance
            };
        }

        if self.settings.card_counting_mode {
            if let Some(play) = self.index_play() {
                let deviation = match play.action {
                    IndexAction::Stand => Some(PlayerAction::Stand),
                    IndexAction::Double => Some(PlayerAction::DoubleDown),
                    IndexAction::TakeInsurance => None,
                };
                if let Some(action) = deviation.filter(|a| self.is_available(*a)) {
                    return action;
                }
            }
        }

        let action = match self.current_hint().map(|h| h.action) {
            Some(StrategyAction::Hit) => PlayerAction::Hit,
            Some(StrategyAction::Stand) | None => PlayerAction::Stand,
            Some(StrategyAction::Double) => PlayerAction::DoubleDown,
            Some(StrategyAction::Split) => PlayerAction::Split,
            Some(StrategyAction::Surrender) => PlayerAction::Surrender,
        };
        if self.is_available(action) {
            action
        } else {
            PlayerAction::Stand
        }
    }
}
