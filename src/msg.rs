use blackjack_core::{
    BettingRecommendation, Card, CountSnapshot, GamePhase, HandOutcome, IndexPlay, PlayerAction, ResultReason, RiskLevel,
    StrategyHint,
};
use serde::{Deserialize, Serialize};

use crate::settings::{SettingUpdate, Settings};
use crate::stats::SessionStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    StartNewGame,
    DealNewHand,
    Hit,
    Stand,
    DoubleDown,
    Split,
    TakeInsurance,
    DeclineInsurance,
    Surrender,
    UndoLastAction,
    SetBetAmount { amount: u64 },
    UpdateSetting(SettingUpdate),
    AutoPlayStep,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::StartNewGame => "start_new_game",
            Command::DealNewHand => "deal_new_hand",
            Command::Hit => "hit",
            Command::Stand => "stand",
            Command::DoubleDown => "double_down",
            Command::Split => "split",
            Command::TakeInsurance => "insurance",
            Command::DeclineInsurance => "decline_insurance",
            Command::Surrender => "surrender",
            Command::UndoLastAction => "undo",
            Command::SetBetAmount { .. } => "set_bet_amount",
            Command::UpdateSetting(_) => "update_setting",
            Command::AutoPlayStep => "auto_play_step",
        }
    }

    pub fn player_action(&self) -> Option<PlayerAction> {
        match self {
            Command::Hit => Some(PlayerAction::Hit),
            Command::Stand => Some(PlayerAction::Stand),
            Command::DoubleDown => Some(PlayerAction::DoubleDown),
            Command::Split => Some(PlayerAction::Split),
            Command::TakeInsurance => Some(PlayerAction::Insurance),
            Command::DeclineInsurance => Some(PlayerAction::DeclineInsurance),
            Command::Surrender => Some(PlayerAction::Surrender),
            _ => None,
        }
    }
}

impl From<PlayerAction> for Command {
    fn from(action: PlayerAction) -> Self {
        match action {
            PlayerAction::Hit => Command::Hit,
            PlayerAction::Stand => Command::Stand,
            PlayerAction::DoubleDown => Command::DoubleDown,
            PlayerAction::Split => Command::Split,
            PlayerAction::Insurance => Command::TakeInsurance,
            PlayerAction::DeclineInsurance => Command::DeclineInsurance,
            PlayerAction::Surrender => Command::Surrender,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    Player { hand: usize },
    Dealer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandSummary {
    pub hand_index: usize,
    pub cards: Vec<Card>,
    pub value: u8,
    pub outcome: HandOutcome,
    pub reason: ResultReason,
    pub bet: u64,
    pub payout: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementSummary {
    pub round: u64,
    pub hands: Vec<HandSummary>,
    pub dealer_cards: Vec<Card>,
    pub dealer_value: u8,
    pub total_wagered: u64,
    pub total_payout: u64,
    pub net: i64,
    pub bankroll: u64,
}

/// What happened during a command, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    CardDealt { card: Card, seat: Seat, face_up: bool },
    HoleCardRevealed { card: Card },
    HandTotal { seat: Seat, value: u8, soft: bool },
    PhaseChanged { from: GamePhase, to: GamePhase, reason: String },
    Message { text: String, severity: Severity },
    InsuranceOffered { cost: u64 },
    InsuranceSettled { bet: u64, won: bool, payout: u64 },
    Reshuffled { forced: bool, generation: u64 },
    HandSettled(SettlementSummary),
    CountUpdated(CountSnapshot),
    BettingAdvice(BettingRecommendation),
    StrategyHint(StrategyHint),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    pub attributes: Vec<Attribute>,
    pub events: Vec<Event>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_attribute(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push(Attribute {
            key: key.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn push_attribute(&mut self, key: impl Into<String>, value: impl ToString) {
        self.attributes.push(Attribute {
            key: key.into(),
            value: value.to_string(),
        });
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn message(&mut self, text: impl Into<String>, severity: Severity) {
        self.events.push(Event::Message {
            text: text.into(),
            severity,
        });
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.iter().find(|a| a.key == key).map(|a| a.value.as_str())
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            Event::Message { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn settlement(&self) -> Option<&SettlementSummary> {
        self.events.iter().find_map(|e| match e {
            Event::HandSettled(summary) => Some(summary),
            _ => None,
        })
    }

    pub fn hint(&self) -> Option<&StrategyHint> {
        self.events.iter().rev().find_map(|e| match e {
            Event::StrategyHint(hint) => Some(hint),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryMsg {
    Table,
    AvailableActions,
    Count,
    BettingAdvice { risk: RiskLevel },
    IndexPlay,
    StrategyHint,
    Stats,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandView {
    pub cards: Vec<Card>,
    pub value: u8,
    pub soft: bool,
    pub doubled: bool,
    pub split: bool,
    pub stood: bool,
    pub surrendered: bool,
    pub busted: bool,
}

/// Table as the player sees it. The hole card is `None` until revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub phase: GamePhase,
    pub round: u64,
    pub hands: Vec<HandView>,
    pub active_hand_index: usize,
    pub dealer_cards: Vec<Option<Card>>,
    pub dealer_value: u8,
    pub current_bet: u64,
    pub insurance_bet: u64,
    pub insurance_offered: bool,
    pub bankroll: u64,
    pub cards_remaining: usize,
    pub available_actions: Vec<PlayerAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum QueryResponse {
    Table(TableView),
    AvailableActions(Vec<PlayerAction>),
    Count(CountSnapshot),
    BettingAdvice(BettingRecommendation),
    IndexPlay(Option<IndexPlay>),
    StrategyHint(Option<StrategyHint>),
    Stats(SessionStats),
    Settings(Settings),
}
