use blackjack_core::HandOutcome;
use serde::{Deserialize, Serialize};

/// Running totals for one session. Hand outcomes count every hand a seat
/// played, so a split round adds several.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub hands_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub blackjacks: u32,
    pub busts: u32,
    pub doubles: u32,
    pub splits: u32,
    pub surrenders: u32,
    pub insurance_taken: u32,
    pub insurance_won: u32,
    pub total_wagered: u64,
    pub net_result: i64,
    pub biggest_win: u64,
    pub biggest_loss: u64,
    pub bankroll: u64,
}

impl SessionStats {
    pub fn new(bankroll: u64) -> Self {
        Self {
            bankroll,
            ..Self::default()
        }
    }

    pub fn record_outcome(&mut self, outcome: HandOutcome, busted: bool) {
        match outcome {
            HandOutcome::Win => self.wins += 1,
            HandOutcome::Blackjack => self.blackjacks += 1,
            HandOutcome::Loss => self.losses += 1,
            HandOutcome::Push => self.pushes += 1,
            HandOutcome::Surrender => self.surrenders += 1,
        }
        if busted {
            self.busts += 1;
        }
    }

    /// Closes a round. `returned` includes stakes handed back.
    pub fn record_round(&mut self, wagered: u64, returned: u64, bankroll: u64) {
        self.hands_played += 1;
        self.total_wagered += wagered;
        let net = returned as i64 - wagered as i64;
        self.net_result += net;
        if net > 0 {
            self.biggest_win = self.biggest_win.max(net as u64);
        } else if net < 0 {
            self.biggest_loss = self.biggest_loss.max(net.unsigned_abs());
        }
        self.bankroll = bankroll;
    }

    /// Insurance is a side bet, its result counts toward net but not wagered.
    pub fn record_insurance(&mut self, won: bool, net: i64) {
        self.insurance_taken += 1;
        if won {
            self.insurance_won += 1;
        }
        self.net_result += net;
    }

    pub fn decided_hands(&self) -> u32 {
        self.wins + self.blackjacks + self.losses + self.pushes + self.surrenders
    }

    /// Percent of settled hands won, blackjacks included.
    pub fn win_rate(&self) -> f64 {
        let decided = self.decided_hands();
        if decided == 0 {
            return 0.0;
        }
        (self.wins + self.blackjacks) as f64 / decided as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_rate() {
        let mut stats = SessionStats::new(1000);
        assert_eq!(stats.win_rate(), 0.0);
        stats.record_outcome(HandOutcome::Win, false);
        stats.record_outcome(HandOutcome::Blackjack, false);
        stats.record_outcome(HandOutcome::Loss, true);
        stats.record_outcome(HandOutcome::Push, false);
        assert_eq!(stats.win_rate(), 50.0);
        assert_eq!(stats.busts, 1);
    }

    #[test]
    fn test_record_round_tracks_extremes() {
        let mut stats = SessionStats::new(1000);
        stats.record_round(25, 62, 1037);
        stats.record_round(50, 0, 987);
        stats.record_round(10, 10, 987);
        assert_eq!(stats.hands_played, 3);
        assert_eq!(stats.total_wagered, 85);
        assert_eq!(stats.net_result, -13);
        assert_eq!(stats.biggest_win, 37);
        assert_eq!(stats.biggest_loss, 50);
        assert_eq!(stats.bankroll, 987);
    }
}
