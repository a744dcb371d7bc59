use super::*;
use crate::{Card, Rank, Suit};

fn card(rank: Rank) -> Card {
    Card::new(rank, Suit::Hearts)
}

fn record(action: PlayerAction, bet: u64) -> ActionRecord {
    ActionRecord {
        action,
        spot: Spot::new(),
        dealer_hand: Hand::new(),
        current_bet: bet,
        insurance_bet: 0,
        insurance: InsuranceState::default(),
        bankroll: 1000,
        phase: GamePhase::Playing,
        timestamp: 0,
    }
}

#[test]
fn test_game_state_new() {
    let rules = GameRules::default();
    let state = GameState::new(&rules, DEFAULT_UNDO_LIMIT);
    assert_eq!(state.phase, GamePhase::Waiting);
    assert_eq!(state.current_bet, rules.min_bet);
    assert_eq!(state.round_number, 0);
    assert!(!state.can_undo_action());
}

#[test]
fn test_round_loop_transitions() {
    let mut state = GameState::new(&GameRules::default(), DEFAULT_UNDO_LIMIT);
    for next in [
        GamePhase::Dealing,
        GamePhase::Playing,
        GamePhase::Playing,
        GamePhase::Dealer,
        GamePhase::Finished,
        GamePhase::Waiting,
        GamePhase::Betting,
        GamePhase::Dealing,
        GamePhase::Finished,
        GamePhase::Dealing,
    ] {
        assert!(state.transition(next).is_ok(), "{:?} -> {next:?}", state.phase);
    }
}

#[test]
fn test_illegal_transition_leaves_phase() {
    let mut state = GameState::new(&GameRules::default(), DEFAULT_UNDO_LIMIT);
    let err = state.transition(GamePhase::Dealer).unwrap_err();
    assert_eq!(
        err,
        Error::InvalidTransition {
            from: GamePhase::Waiting,
            to: GamePhase::Dealer
        }
    );
    assert_eq!(state.phase, GamePhase::Waiting);

    state.transition(GamePhase::Dealing).unwrap();
    state.transition(GamePhase::Playing).unwrap();
    state.transition(GamePhase::Dealer).unwrap();
    assert!(state.transition(GamePhase::Playing).is_err());
    assert!(state.transition(GamePhase::Waiting).is_err());
}

#[test]
fn test_set_bet_amount_clamps() {
    let rules = GameRules::default();
    let mut state = GameState::new(&rules, DEFAULT_UNDO_LIMIT);
    assert_eq!(state.set_bet_amount(1), rules.min_bet);
    assert_eq!(state.set_bet_amount(100_000), rules.max_bet);
    assert_eq!(state.set_bet_amount(25), 25);
    assert_eq!(state.current_bet, 25);
}

#[test]
fn test_set_limits_keeps_round_stake() {
    let mut state = GameState::new(&GameRules::default(), DEFAULT_UNDO_LIMIT);
    state.set_bet_amount(500);
    // a split at the table maximum puts twice the limit at risk
    state.current_bet = 1000;
    state.set_limits(5, 100);
    assert_eq!(state.current_bet, 1000);
    assert_eq!(state.set_bet_amount(500), 100);
}

#[test]
fn test_undo_history_is_bounded() {
    let mut state = GameState::new(&GameRules::default(), 5);
    state.transition(GamePhase::Dealing).unwrap();
    state.transition(GamePhase::Playing).unwrap();
    for bet in 0..8 {
        state.save_game_state(record(PlayerAction::Hit, bet));
    }
    assert_eq!(state.history_len(), 5);
    assert!(state.can_undo_action());
    // newest first, oldest three dropped
    assert_eq!(state.remove_last_saved_state().unwrap().current_bet, 7);
    assert_eq!(state.remove_last_saved_state().unwrap().current_bet, 6);
}

#[test]
fn test_undo_limit_clamped() {
    assert_eq!(GameState::new(&GameRules::default(), 1).history_limit(), MIN_UNDO_LIMIT);
    assert_eq!(GameState::new(&GameRules::default(), 50).history_limit(), DEFAULT_UNDO_LIMIT);
}

#[test]
fn test_undo_requires_playing_phase() {
    let mut state = GameState::new(&GameRules::default(), DEFAULT_UNDO_LIMIT);
    state.save_game_state(record(PlayerAction::Stand, 10));
    assert!(!state.can_undo_action());
    assert_eq!(state.last_action, Some(PlayerAction::Stand));
}

#[test]
fn test_start_new_hand_clears_round_data() {
    let mut state = GameState::new(&GameRules::default(), DEFAULT_UNDO_LIMIT);
    state.insurance_bet = 12;
    state.save_game_state(record(PlayerAction::Hit, 10));
    state.start_new_hand();
    assert_eq!(state.round_number, 1);
    assert_eq!(state.insurance_bet, 0);
    assert_eq!(state.history_len(), 0);
    assert_eq!(state.last_action, None);
}

#[test]
fn test_abort_to_waiting_bypasses_table() {
    let mut state = GameState::new(&GameRules::default(), DEFAULT_UNDO_LIMIT);
    state.transition(GamePhase::Dealing).unwrap();
    state.transition(GamePhase::Playing).unwrap();
    state.abort_to_waiting();
    assert_eq!(state.phase, GamePhase::Waiting);
}

#[test]
fn test_spot_split_inserts_after_active() {
    let mut spot = Spot::new();
    spot.active_hand_mut().add_card(card(Rank::Eight));
    spot.active_hand_mut().add_card(Card::new(Rank::Eight, Suit::Spades));

    assert_eq!(spot.split_active(), Ok(1));
    assert_eq!(spot.hands.len(), 2);
    assert_eq!(spot.hands[0].cards, vec![card(Rank::Eight)]);
    assert_eq!(spot.hands[1].cards, vec![Card::new(Rank::Eight, Suit::Spades)]);
    assert!(spot.hands[0].split && spot.hands[1].split);

    // resplit the first hand: new hand lands between the two existing ones
    spot.hands[0].add_card(Card::new(Rank::Eight, Suit::Clubs));
    spot.hands[1].add_card(card(Rank::Two));
    assert_eq!(spot.split_active(), Ok(1));
    assert_eq!(spot.hands.len(), 3);
    assert_eq!(spot.hands[1].cards, vec![Card::new(Rank::Eight, Suit::Clubs)]);
    assert_eq!(spot.hands[2].cards.len(), 2);
}

#[test]
fn test_spot_split_needs_two_cards() {
    let mut spot = Spot::new();
    spot.active_hand_mut().add_card(card(Rank::Eight));
    assert!(spot.split_active().is_err());
}

#[test]
fn test_spot_cannot_split_max_hands_reached() {
    let rules = GameRules {
        max_split_hands: 2,
        ..GameRules::default()
    };
    let mut spot = Spot::new();
    spot.active_hand_mut().add_card(card(Rank::Eight));
    spot.active_hand_mut().add_card(Card::new(Rank::Eight, Suit::Spades));
    assert!(spot.can_split_active(&rules));
    spot.split_active().unwrap();

    spot.hands[0].add_card(Card::new(Rank::Eight, Suit::Clubs));
    assert!(!spot.can_split_active(&rules));
}

#[test]
fn test_spot_advance_skips_finished_hands() {
    let mut spot = Spot::new();
    spot.hands = vec![
        Hand::from_cards(&[card(Rank::Ten), card(Rank::Seven)]),
        Hand::from_cards(&[card(Rank::Ace), card(Rank::King)]),
        Hand::from_cards(&[card(Rank::Nine), card(Rank::Two)]),
    ];
    assert_eq!(spot.advance(), Some(2));
    assert_eq!(spot.advance(), None);
    assert_eq!(spot.active_hand_index, 2);
}

#[test]
fn test_spot_all_busted() {
    let mut spot = Spot::new();
    spot.hands = vec![
        Hand::from_cards(&[card(Rank::Ten), card(Rank::Seven), card(Rank::Nine)]),
        Hand::from_cards(&[card(Rank::Ten), card(Rank::Six)]),
    ];
    assert!(!spot.all_busted());
    spot.hands[1].surrendered = true;
    assert!(spot.all_busted());
}

#[test]
fn test_transition_table_is_closed() {
    use GamePhase::*;
    let all = [Waiting, Betting, Dealing, Playing, Dealer, Finished];
    let allowed: usize = all
        .iter()
        .map(|from| all.iter().filter(|to| from.can_transition_to(**to)).count())
        .sum();
    assert_eq!(allowed, 3 + 2 + 2 + 3 + 1 + 2);
}
