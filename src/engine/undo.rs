use blackjack_core::GamePhase;

use super::Engine;
use crate::error::EngineError;
use crate::msg::{Response, Severity};

impl Engine {
    /// Rewinds the last player decision. Cards already drawn stay out of the
    /// shoe and stay counted.
    pub(super) fn undo_last_action(&mut self, resp: &mut Response) -> Result<(), EngineError> {
        if self.state.phase != GamePhase::Playing {
            return Err(EngineError::UndoUnavailable(format!(
                "the table is {}",
                self.state.phase.as_str()
            )));
        }
        let Some(record) = self.state.remove_last_saved_state() else {
            return Err(EngineError::UndoUnavailable("no actions this hand".to_string()));
        };

        log::debug!("undo {} from round {}", record.action.as_str(), self.state.round_number);
        self.spot = record.spot;
        self.dealer = record.dealer_hand;
        self.state.current_bet = record.current_bet;
        self.state.insurance_bet = record.insurance_bet;
        self.insurance = record.insurance;
        self.bankroll = record.bankroll;
        self.state.last_action = None;
        self.accuracy.clear_pending();

        resp.push_attribute("undone", record.action.as_str());
        resp.message(format!("Undid {}", record.action.as_str()), Severity::Info);
        Ok(())
    }
}
