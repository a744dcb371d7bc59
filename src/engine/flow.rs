use blackjack_core::{Card, GamePhase, HandOutcome};

use super::Engine;
use crate::error::EngineError;
use crate::msg::{Event, HandSummary, Response, Seat, Severity, SettlementSummary};

impl Engine {
    pub(super) fn deal_new_hand(&mut self, resp: &mut Response) -> Result<(), EngineError> {
        let phase = self.state.phase;
        if !matches!(phase, GamePhase::Waiting | GamePhase::Betting | GamePhase::Finished) {
            return Err(EngineError::InvalidPhase { action: "deal", phase });
        }
        let bet = self.rules.clamp_bet(self.base_bet);
        if bet > self.bankroll {
            return Err(EngineError::ActionUnavailable {
                action: "deal",
                reason: format!("bet {bet} exceeds bankroll {}", self.bankroll),
            });
        }

        if self.shoe.needs_reshuffle() {
            self.shoe.shuffle();
            if self.settings.card_counting_mode {
                self.reset_count();
            }
            log::info!("cut card reached, shoe reshuffled");
            resp.push(Event::Reshuffled {
                forced: false,
                generation: self.shoe.generation(),
            });
            resp.message("Shuffling the shoe", Severity::Info);
        }

        self.clear_table();
        self.state.start_new_hand();
        self.state.current_bet = bet;
        self.change_phase(GamePhase::Dealing, "deal", resp)?;
        log::debug!("round {} dealing, bet {bet}", self.state.round_number);

        let player = Seat::Player { hand: 0 };
        self.deal_card(player, true, resp)?;
        self.deal_card(Seat::Dealer, false, resp)?;
        self.deal_card(player, true, resp)?;
        self.deal_card(Seat::Dealer, true, resp)?;
        self.push_total(player, resp);

        self.check_immediate_results(resp)
    }

    /// Draws into `seat`. Shoe exhaustion aborts the whole round.
    pub(super) fn deal_card(&mut self, seat: Seat, face_up: bool, resp: &mut Response) -> Result<Card, EngineError> {
        let generation = self.shoe.generation();
        let card = match self.shoe.draw() {
            Ok(card) => card,
            Err(err) => {
                log::error!("cannot draw: {err}");
                self.abort_round(resp);
                return Err(err.into());
            }
        };
        if self.shoe.generation() != generation {
            if self.settings.card_counting_mode {
                self.reset_count();
            }
            resp.push(Event::Reshuffled {
                forced: true,
                generation: self.shoe.generation(),
            });
        }

        if self.settings.card_counting_mode {
            self.counting.update_count(&card, face_up);
        }
        match seat {
            Seat::Player { hand } => self.spot.hands[hand].add_card(card),
            Seat::Dealer => self.dealer.add_card(card),
        }
        resp.push(Event::CardDealt { card, seat, face_up });
        Ok(card)
    }

    pub(super) fn push_total(&self, seat: Seat, resp: &mut Response) {
        let hand = match seat {
            Seat::Player { hand } => &self.spot.hands[hand],
            Seat::Dealer => &self.dealer,
        };
        resp.push(Event::HandTotal {
            seat,
            value: hand.value(),
            soft: hand.is_soft(),
        });
    }

    fn check_immediate_results(&mut self, resp: &mut Response) -> Result<(), EngineError> {
        let up_is_ace = self.dealer_up_card().is_some_and(Card::is_ace);
        if up_is_ace && !self.spot.hands[0].is_natural() {
            self.change_phase(GamePhase::Playing, "insurance offered", resp)?;
            self.insurance.offered = true;
            let cost = self.state.current_bet / 2;
            resp.push(Event::InsuranceOffered { cost });
            resp.message(format!("Dealer shows an ace. Insurance costs {cost}"), Severity::Info);
            self.offer_hint(resp);
            return Ok(());
        }
        self.dealer_peek(resp)
    }

    /// Resolves naturals, otherwise hands the turn to the player.
    pub(super) fn dealer_peek(&mut self, resp: &mut Response) -> Result<(), EngineError> {
        let player_natural = self.spot.hands[0].is_natural();
        let dealer_natural = self.dealer.is_natural();

        if player_natural || dealer_natural {
            let reason = match (player_natural, dealer_natural) {
                (true, true) => "both blackjack",
                (true, false) => "player blackjack",
                _ => "dealer blackjack",
            };
            self.reveal_hole_card(resp);
            self.settle(reason, resp)?;
            return Ok(());
        }

        if self.state.phase == GamePhase::Dealing {
            self.change_phase(GamePhase::Playing, "player turn", resp)?;
            self.offer_hint(resp);
        }
        Ok(())
    }

    /// Closes an open insurance offer. Returns true when the round ended.
    pub(super) fn close_insurance_offer(&mut self, resp: &mut Response) -> Result<bool, EngineError> {
        if !self.insurance.offered {
            return Ok(false);
        }
        self.insurance.offered = false;
        self.dealer_peek(resp)?;
        Ok(self.state.phase == GamePhase::Finished)
    }

    /// Moves on from a finished hand: next unfinished hand, else the dealer.
    pub(super) fn advance_hand(&mut self, resp: &mut Response) -> Result<(), EngineError> {
        if !self.spot.active_hand().is_finished() {
            self.offer_hint(resp);
            return Ok(());
        }
        match self.spot.advance() {
            Some(index) => {
                self.change_phase(GamePhase::Playing, &format!("hand {}", index + 1), resp)?;
                self.offer_hint(resp);
                Ok(())
            }
            None => self.play_dealer(resp),
        }
    }

    fn play_dealer(&mut self, resp: &mut Response) -> Result<(), EngineError> {
        self.change_phase(GamePhase::Dealer, "dealer turn", resp)?;
        self.reveal_hole_card(resp);

        if self.spot.all_busted() {
            log::debug!("no live hands, dealer stands on {}", self.dealer.value());
        } else {
            while self.rules.dealer_should_hit(&self.dealer) {
                self.deal_card(Seat::Dealer, true, resp)?;
                self.push_total(Seat::Dealer, resp);
            }
        }
        self.settle("dealer done", resp)
    }

    fn reveal_hole_card(&mut self, resp: &mut Response) {
        if self.hole_revealed {
            return;
        }
        self.hole_revealed = true;
        if let Some(&card) = self.dealer.cards.first() {
            if self.settings.card_counting_mode {
                self.counting.reveal(&card);
            }
            resp.push(Event::HoleCardRevealed { card });
            self.push_total(Seat::Dealer, resp);
        }
    }

    /// Stake per unit: every hand carries one, a doubled hand two.
    pub(super) fn unit(&self) -> u64 {
        let units = self.spot.hands.len() + self.spot.num_doubled();
        self.state.current_bet / units.max(1) as u64
    }

    fn settle(&mut self, reason: &str, resp: &mut Response) -> Result<(), EngineError> {
        let unit = self.unit();
        let wagered = self.state.current_bet;
        let mut total_payout = 0;
        let mut summaries = Vec::with_capacity(self.spot.hands.len());

        for (index, hand) in self.spot.hands.iter().enumerate() {
            let share = if hand.doubled { unit * 2 } else { unit };
            let result = self.rules.determine_result(hand, &self.dealer);
            let payout = self.rules.payout_for(result.outcome, share);
            total_payout += payout;
            self.stats.record_outcome(result.outcome, hand.is_busted());
            summaries.push(HandSummary {
                hand_index: index,
                cards: hand.cards.clone(),
                value: hand.value(),
                outcome: result.outcome,
                reason: result.reason,
                bet: share,
                payout,
            });
        }

        self.bankroll = (self.bankroll + total_payout).saturating_sub(wagered);
        self.stats.doubles += self.spot.num_doubled() as u32;
        self.stats.splits += self.spot.hands.len().saturating_sub(1) as u32;
        if self.state.insurance_bet > 0 {
            let bet = self.state.insurance_bet;
            let won = self.dealer.is_natural();
            let net = if won {
                self.rules.calculate_insurance_payout(bet) as i64
            } else {
                -(bet as i64)
            };
            self.stats.record_insurance(won, net);
        }
        self.stats.record_round(wagered, total_payout, self.bankroll);
        self.accuracy.clear_pending();
        self.state.clear_history();
        self.change_phase(GamePhase::Finished, reason, resp)?;

        let net = total_payout as i64 - wagered as i64;
        log::info!(
            "round {} settled: wagered {wagered}, returned {total_payout}, bankroll {}",
            self.state.round_number,
            self.bankroll
        );
        resp.message(settlement_text(&summaries, net), severity_for(net));
        resp.push(Event::HandSettled(SettlementSummary {
            round: self.state.round_number,
            hands: summaries,
            dealer_cards: self.dealer.cards.clone(),
            dealer_value: self.dealer.value(),
            total_wagered: wagered,
            total_payout,
            net,
            bankroll: self.bankroll,
        }));

        if self.settings.card_counting_mode {
            let advice = self.counting.betting_recommendation(
                self.base_bet,
                self.bankroll,
                blackjack_core::RiskLevel::Conservative,
            );
            resp.push(Event::BettingAdvice(advice));
        }
        Ok(())
    }

    /// Drops the round without settling. Stakes stay with the player.
    pub(super) fn abort_round(&mut self, resp: &mut Response) {
        let from = self.state.phase;
        self.state.abort_to_waiting();
        self.state.current_bet = self.base_bet;
        self.clear_table();
        if self.shoe.remaining() == 0 && self.shoe.discarded() == 0 {
            log::warn!("shoe holds no cards");
        }
        resp.push(Event::PhaseChanged {
            from,
            to: GamePhase::Waiting,
            reason: "shoe exhausted".to_string(),
        });
        resp.message("The shoe ran out of cards, hand cancelled", Severity::Error);
    }

    /// Shows the basic strategy play for the active hand when hints are on.
    pub(super) fn offer_hint(&mut self, resp: &mut Response) {
        if !self.settings.show_basic_strategy_hints || self.state.phase != GamePhase::Playing {
            return;
        }
        let Some(hint) = self.current_hint() else {
            return;
        };
        // one decision, one hint: an answer to the insurance offer keeps it pending
        if self.accuracy.pending_hint().is_none() {
            self.accuracy.record_hint(&hint);
        }
        if self.settings.card_counting_mode {
            if let Some(play) = self.index_play() {
                resp.message(
                    format!("Index play {}: {:?} at true count {:+}", play.name, play.action, play.threshold),
                    Severity::Info,
                );
            }
        }
        resp.push(Event::StrategyHint(hint));
    }

    #[cfg(test)]
    pub(super) fn replace_shoe(&mut self, shoe: blackjack_core::Shoe) {
        self.shoe = shoe;
    }
}

fn settlement_text(hands: &[HandSummary], net: i64) -> String {
    let outcomes: Vec<&str> = hands
        .iter()
        .map(|h| match h.outcome {
            HandOutcome::Blackjack => "Blackjack!",
            HandOutcome::Win => "Win",
            HandOutcome::Loss => "Loss",
            HandOutcome::Push => "Push",
            HandOutcome::Surrender => "Surrendered",
        })
        .collect();
    format!("{} ({net:+})", outcomes.join(", "))
}

fn severity_for(net: i64) -> Severity {
    match net {
        n if n > 0 => Severity::Success,
        0 => Severity::Info,
        _ => Severity::Warning,
    }
}
