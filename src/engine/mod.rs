//! Hand lifecycle orchestration: one `Engine` owns the shoe, the seat, the
//! dealer hand and the analytics, and runs every command to completion.

mod execute;
mod flow;
mod query;
mod undo;

use blackjack_core::{
    AccuracyTracker, Card, CountFeedback, CountingState, GamePhase, GameRules, GameState, Hand, InsuranceState, Shoe,
    Spot, StrategyAdvisor,
};

use crate::error::EngineError;
use crate::msg::{Command, Event, Response, Severity};
use crate::settings::{EngineConfig, Settings};
use crate::stats::SessionStats;

pub struct Engine {
    base_rules: GameRules,
    rules: GameRules,
    settings: Settings,
    state: GameState,
    shoe: Shoe,
    spot: Spot,
    /// `cards[0]` is the hole card, `cards[1]` the up-card.
    dealer: Hand,
    hole_revealed: bool,
    insurance: InsuranceState,
    counting: CountingState,
    advisor: StrategyAdvisor,
    accuracy: AccuracyTracker,
    stats: SessionStats,
    bankroll: u64,
    starting_bankroll: u64,
    base_bet: u64,
    seed: Option<u64>,
    game_id: String,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.settings.validate()?;
        let rules = config.settings.rules_for(config.rules);
        let shoe = build_shoe(&rules, config.seed)?;
        let counting = CountingState::with_total_cards(rules.num_decks, shoe.total_cards() as u32);

        log::info!(
            "new engine: {} decks, bets {}-{}, bankroll {}",
            rules.num_decks,
            rules.min_bet,
            rules.max_bet,
            config.starting_bankroll
        );

        Ok(Self {
            base_rules: config.rules,
            rules,
            settings: config.settings,
            state: GameState::new(&rules, config.undo_limit),
            shoe,
            spot: Spot::new(),
            dealer: Hand::new(),
            hole_revealed: false,
            insurance: InsuranceState::default(),
            counting,
            advisor: StrategyAdvisor::new(),
            accuracy: AccuracyTracker::new(),
            stats: SessionStats::new(config.starting_bankroll),
            bankroll: config.starting_bankroll,
            starting_bankroll: config.starting_bankroll,
            base_bet: rules.min_bet,
            seed: config.seed,
            game_id: new_game_id(),
        })
    }

    /// Runs one command. Rejected commands leave the engine untouched.
    pub fn execute(&mut self, cmd: Command) -> Result<Response, EngineError> {
        log::debug!("execute {} in {}", cmd.as_str(), self.state.phase.as_str());
        let mut resp = Response::new();
        match cmd {
            Command::StartNewGame => self.start_new_game(&mut resp)?,
            Command::DealNewHand => self.deal_new_hand(&mut resp)?,
            Command::UndoLastAction => self.undo_last_action(&mut resp)?,
            Command::SetBetAmount { amount } => self.set_bet_amount(amount, &mut resp)?,
            Command::UpdateSetting(update) => self.update_setting(update, &mut resp)?,
            Command::AutoPlayStep => return self.auto_play_step(),
            Command::Hit
            | Command::Stand
            | Command::DoubleDown
            | Command::Split
            | Command::TakeInsurance
            | Command::DeclineInsurance
            | Command::Surrender => {
                if let Some(action) = cmd.player_action() {
                    self.player_action(action, &mut resp)?;
                }
            }
        }

        if self.settings.card_counting_mode && deals_cards(&cmd) {
            resp.push(Event::CountUpdated(self.count_snapshot()));
        }
        Ok(resp
            .add_attribute("action", cmd.as_str())
            .add_attribute("phase", self.state.phase.as_str())
            .add_attribute("bankroll", self.bankroll))
    }

    /// Like `execute`, but folds rejections into a message event for display.
    pub fn handle(&mut self, cmd: Command) -> Response {
        match self.execute(cmd) {
            Ok(resp) => resp,
            Err(err) => {
                let severity = match err {
                    EngineError::ShoeExhausted | EngineError::Game(_) | EngineError::Snapshot(_) => Severity::Error,
                    _ => Severity::Warning,
                };
                log::warn!("{} rejected: {err}", cmd.as_str());
                let mut resp = Response::new().add_attribute("action", cmd.as_str()).add_attribute("rejected", true);
                resp.message(err.to_string(), severity);
                resp
            }
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn bankroll(&self) -> u64 {
        self.bankroll
    }

    pub fn base_bet(&self) -> u64 {
        self.base_bet
    }

    pub fn current_bet(&self) -> u64 {
        self.state.current_bet
    }

    pub fn insurance_bet(&self) -> u64 {
        self.state.insurance_bet
    }

    pub fn insurance(&self) -> InsuranceState {
        self.insurance
    }

    pub fn spot(&self) -> &Spot {
        &self.spot
    }

    pub fn dealer_hand(&self) -> &Hand {
        &self.dealer
    }

    pub fn dealer_up_card(&self) -> Option<&Card> {
        self.dealer.cards.get(1)
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn accuracy(&self) -> &AccuracyTracker {
        &self.accuracy
    }

    pub fn counting(&self) -> &CountingState {
        &self.counting
    }

    pub fn shoe(&self) -> &Shoe {
        &self.shoe
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn can_undo(&self) -> bool {
        self.state.can_undo_action()
    }

    /// Puts `cards` on top of the shoe in draw order, for drills.
    pub fn stack_next(&mut self, cards: &[Card]) -> Result<(), EngineError> {
        self.shoe.stack_next(cards)?;
        Ok(())
    }

    /// Count-practice: grades the player's running count estimate.
    pub fn record_count_estimate(&mut self, estimate: i32) -> CountFeedback {
        self.counting.record_count_estimate(estimate)
    }

    pub(crate) fn restore(&mut self, snapshot: crate::snapshot::Snapshot) -> Result<(), EngineError> {
        if self.hand_in_progress() {
            return Err(EngineError::InvalidPhase {
                action: "import state",
                phase: self.state.phase,
            });
        }
        snapshot.settings.validate()?;
        self.apply_settings(snapshot.settings)?;
        self.bankroll = snapshot.session_stats.bankroll;
        self.stats = snapshot.session_stats;
        self.accuracy = snapshot.strategy_accuracy;
        self.counting.set_practice_stats(snapshot.counting_accuracy);
        self.game_id = snapshot.game_id;
        log::info!("restored game {}, bankroll {}", self.game_id, self.bankroll);
        Ok(())
    }

    fn start_new_game(&mut self, resp: &mut Response) -> Result<(), EngineError> {
        let from = self.state.phase;
        self.shoe = build_shoe(&self.rules, self.seed)?;
        self.reset_count();
        self.state.reset();
        self.clear_table();
        self.bankroll = self.starting_bankroll;
        self.base_bet = self.rules.min_bet;
        self.stats = SessionStats::new(self.bankroll);
        self.game_id = new_game_id();
        log::info!("new game {}", self.game_id);

        resp.push(Event::Reshuffled {
            forced: false,
            generation: self.shoe.generation(),
        });
        resp.push(Event::PhaseChanged {
            from,
            to: GamePhase::Waiting,
            reason: "new game".to_string(),
        });
        resp.message(format!("New game, bankroll {}", self.bankroll), Severity::Info);
        Ok(())
    }

    fn set_bet_amount(&mut self, amount: u64, resp: &mut Response) -> Result<(), EngineError> {
        match self.state.phase {
            GamePhase::Waiting | GamePhase::Betting => {}
            GamePhase::Finished => self.change_phase(GamePhase::Waiting, "next round", resp)?,
            phase => {
                return Err(EngineError::InvalidPhase {
                    action: "set_bet_amount",
                    phase,
                })
            }
        }
        if self.state.phase == GamePhase::Waiting {
            self.change_phase(GamePhase::Betting, "placing bet", resp)?;
        }

        let placed = self.state.set_bet_amount(amount);
        self.base_bet = placed;
        if placed != amount {
            resp.message(
                format!("Bet adjusted to {placed} (table limits {}-{})", self.rules.min_bet, self.rules.max_bet),
                Severity::Warning,
            );
        }
        resp.push_attribute("bet", placed);
        Ok(())
    }

    fn update_setting(&mut self, update: crate::settings::SettingUpdate, resp: &mut Response) -> Result<(), EngineError> {
        let next = self.settings.apply(&update)?;
        let decks_changed = next.deck_count != self.settings.deck_count;
        if decks_changed && self.hand_in_progress() {
            return Err(EngineError::InvalidPhase {
                action: "change deck count",
                phase: self.state.phase,
            });
        }

        let counting_enabled = next.card_counting_mode && !self.settings.card_counting_mode;
        self.apply_settings(next)?;
        if counting_enabled && !decks_changed {
            // cards already out of this shoe were not counted
            self.counting.resume_at(self.shoe.cards_dealt() as u32);
        }
        log::info!("setting {} updated", update.key());
        resp.message(format!("{} updated", update.key()), Severity::Info);
        Ok(())
    }

    /// Swaps in a validated settings value and rebuilds what depends on it.
    fn apply_settings(&mut self, next: Settings) -> Result<(), EngineError> {
        let decks_changed = next.deck_count != self.rules.num_decks;
        self.rules = next.rules_for(self.base_rules);
        self.state.set_limits(self.rules.min_bet, self.rules.max_bet);
        self.base_bet = self.rules.clamp_bet(self.base_bet);
        if decks_changed {
            self.shoe = build_shoe(&self.rules, self.seed)?;
            self.reset_count();
        }
        self.settings = next;
        Ok(())
    }

    fn hand_in_progress(&self) -> bool {
        matches!(
            self.state.phase,
            GamePhase::Dealing | GamePhase::Playing | GamePhase::Dealer
        )
    }

    fn change_phase(&mut self, to: GamePhase, reason: &str, resp: &mut Response) -> Result<(), EngineError> {
        let change = self.state.transition(to)?;
        resp.push(Event::PhaseChanged {
            from: change.from,
            to: change.to,
            reason: reason.to_string(),
        });
        Ok(())
    }

    fn clear_table(&mut self) {
        self.spot = Spot::new();
        self.dealer = Hand::new();
        self.hole_revealed = false;
        self.insurance = InsuranceState::default();
        self.accuracy.clear_pending();
    }

    fn reset_count(&mut self) {
        self.counting.set_decks(self.rules.num_decks, self.shoe.total_cards() as u32);
    }
}

fn build_shoe(rules: &GameRules, seed: Option<u64>) -> Result<Shoe, EngineError> {
    let shoe = match seed {
        Some(seed) => Shoe::with_seed(rules.num_decks, rules.penetration, seed)?,
        None => Shoe::new(rules.num_decks, rules.penetration)?,
    };
    Ok(shoe)
}

fn new_game_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}

fn deals_cards(cmd: &Command) -> bool {
    !matches!(
        cmd,
        Command::SetBetAmount { .. } | Command::UpdateSetting(_) | Command::UndoLastAction
    )
}
