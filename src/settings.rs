use blackjack_core::shoe::MAX_DECKS;
use blackjack_core::{GameRules, DEFAULT_UNDO_LIMIT};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;

/// Presentation pacing. The engine never sleeps; callers read the delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameSpeed {
    Slow,
    Normal,
    Fast,
    Instant,
}

impl GameSpeed {
    pub fn card_delay_ms(&self) -> u64 {
        match self {
            GameSpeed::Slow => 900,
            GameSpeed::Normal => 500,
            GameSpeed::Fast => 200,
            GameSpeed::Instant => 0,
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "slow" => Some(GameSpeed::Slow),
            "normal" => Some(GameSpeed::Normal),
            "fast" => Some(GameSpeed::Fast),
            "instant" => Some(GameSpeed::Instant),
            _ => None,
        }
    }
}

/// User-facing settings. Replaced as a whole value on every update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub deck_count: u8,
    pub show_basic_strategy_hints: bool,
    pub card_counting_mode: bool,
    pub minimum_bet: u64,
    pub maximum_bet: u64,
    pub game_speed: GameSpeed,
    pub auto_play: bool,
    pub sound_effects: bool,
    pub animations_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_rules(&GameRules::default())
    }
}

impl Settings {
    pub fn from_rules(rules: &GameRules) -> Self {
        Self {
            deck_count: rules.num_decks,
            show_basic_strategy_hints: false,
            card_counting_mode: false,
            minimum_bet: rules.min_bet,
            maximum_bet: rules.max_bet,
            game_speed: GameSpeed::Normal,
            auto_play: false,
            sound_effects: true,
            animations_enabled: true,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.deck_count == 0 || self.deck_count > MAX_DECKS {
            return Err(EngineError::InvalidSetting(format!(
                "deckCount must be between 1 and {MAX_DECKS}, got {}",
                self.deck_count
            )));
        }
        if self.minimum_bet == 0 {
            return Err(EngineError::InvalidSetting("minimumBet must be positive".to_string()));
        }
        if self.maximum_bet < self.minimum_bet {
            return Err(EngineError::InvalidSetting(format!(
                "maximumBet {} is below minimumBet {}",
                self.maximum_bet, self.minimum_bet
            )));
        }
        Ok(())
    }

    /// Returns the updated settings, leaving `self` untouched.
    pub fn apply(&self, update: &SettingUpdate) -> Result<Settings, EngineError> {
        let mut next = self.clone();
        match *update {
            SettingUpdate::DeckCount(n) => next.deck_count = n,
            SettingUpdate::ShowBasicStrategyHints(on) => next.show_basic_strategy_hints = on,
            SettingUpdate::CardCountingMode(on) => next.card_counting_mode = on,
            SettingUpdate::MinimumBet(amount) => next.minimum_bet = amount,
            SettingUpdate::MaximumBet(amount) => next.maximum_bet = amount,
            SettingUpdate::GameSpeed(speed) => next.game_speed = speed,
            SettingUpdate::AutoPlay(on) => next.auto_play = on,
            SettingUpdate::SoundEffects(on) => next.sound_effects = on,
            SettingUpdate::AnimationsEnabled(on) => next.animations_enabled = on,
        }
        next.validate()?;
        Ok(next)
    }

    /// Overlays deck count and table limits onto a rule preset.
    pub fn rules_for(&self, base: GameRules) -> GameRules {
        GameRules {
            num_decks: self.deck_count,
            min_bet: self.minimum_bet,
            max_bet: self.maximum_bet,
            ..base
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingUpdate {
    DeckCount(u8),
    ShowBasicStrategyHints(bool),
    CardCountingMode(bool),
    MinimumBet(u64),
    MaximumBet(u64),
    GameSpeed(GameSpeed),
    AutoPlay(bool),
    SoundEffects(bool),
    AnimationsEnabled(bool),
}

impl SettingUpdate {
    pub const KEYS: [&'static str; 9] = [
        "deckCount",
        "showBasicStrategyHints",
        "cardCountingMode",
        "minimumBet",
        "maximumBet",
        "gameSpeed",
        "autoPlay",
        "soundEffects",
        "animationsEnabled",
    ];

    /// Builds an update from the presentation layer's key/value pair.
    pub fn parse(key: &str, value: &Value) -> Result<Self, EngineError> {
        let update = match key {
            "deckCount" => {
                let n = as_u64(key, value)?;
                let n = u8::try_from(n).map_err(|_| invalid(key, value))?;
                SettingUpdate::DeckCount(n)
            }
            "showBasicStrategyHints" => SettingUpdate::ShowBasicStrategyHints(as_bool(key, value)?),
            "cardCountingMode" => SettingUpdate::CardCountingMode(as_bool(key, value)?),
            "minimumBet" => SettingUpdate::MinimumBet(as_u64(key, value)?),
            "maximumBet" => SettingUpdate::MaximumBet(as_u64(key, value)?),
            "gameSpeed" => {
                let speed = value.as_str().and_then(GameSpeed::parse).ok_or_else(|| invalid(key, value))?;
                SettingUpdate::GameSpeed(speed)
            }
            "autoPlay" => SettingUpdate::AutoPlay(as_bool(key, value)?),
            "soundEffects" => SettingUpdate::SoundEffects(as_bool(key, value)?),
            "animationsEnabled" => SettingUpdate::AnimationsEnabled(as_bool(key, value)?),
            _ => return Err(EngineError::InvalidSetting(format!("unknown setting '{key}'"))),
        };
        Ok(update)
    }

    pub fn key(&self) -> &'static str {
        match self {
            SettingUpdate::DeckCount(_) => "deckCount",
            SettingUpdate::ShowBasicStrategyHints(_) => "showBasicStrategyHints",
            SettingUpdate::CardCountingMode(_) => "cardCountingMode",
            SettingUpdate::MinimumBet(_) => "minimumBet",
            SettingUpdate::MaximumBet(_) => "maximumBet",
            SettingUpdate::GameSpeed(_) => "gameSpeed",
            SettingUpdate::AutoPlay(_) => "autoPlay",
            SettingUpdate::SoundEffects(_) => "soundEffects",
            SettingUpdate::AnimationsEnabled(_) => "animationsEnabled",
        }
    }
}

fn invalid(key: &str, value: &Value) -> EngineError {
    EngineError::InvalidSetting(format!("bad value for '{key}': {value}"))
}

fn as_bool(key: &str, value: &Value) -> Result<bool, EngineError> {
    value.as_bool().ok_or_else(|| invalid(key, value))
}

fn as_u64(key: &str, value: &Value) -> Result<u64, EngineError> {
    value.as_u64().ok_or_else(|| invalid(key, value))
}

/// Everything needed to build an engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub rules: GameRules,
    pub settings: Settings,
    pub starting_bankroll: u64,
    /// Fixed shoe seed for reproducible sessions
    pub seed: Option<u64>,
    pub undo_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let rules = GameRules::default();
        Self {
            rules,
            settings: Settings::from_rules(&rules),
            starting_bankroll: 1000,
            seed: None,
            undo_limit: DEFAULT_UNDO_LIMIT,
        }
    }
}

impl EngineConfig {
    pub fn with_preset(name: &str) -> Option<Self> {
        let rules = GameRules::preset(name)?;
        Some(Self {
            rules,
            settings: Settings::from_rules(&rules),
            ..Self::default()
        })
    }
}
