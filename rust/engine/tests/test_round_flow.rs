mod common;

use blackjack_engine::cards::Rank;
use blackjack_engine::engine::Command;
use blackjack_engine::events::RoundEvent;
use blackjack_engine::game::{AvailableAction, Phase};
use blackjack_engine::player::RoundOutcome;
use blackjack_engine::GameError;
use common::*;

#[test]
fn bet_validation_rejects_zero_and_overdraw() {
    let mut eng = engine_with(&[]);
    assert_eq!(
        eng.place_bet(0),
        Err(GameError::InvalidBetAmount {
            amount: 0,
            chips: 1_000
        })
    );
    assert!(matches!(
        eng.place_bet(1_001),
        Err(GameError::InvalidBetAmount { .. })
    ));
    assert_eq!(eng.player().bet(), 0);
    assert_eq!(eng.player().chips(), 1_000);

    eng.place_bet(1_000).expect("all-in is allowed");
    assert_eq!(eng.player().bet(), 1_000);
}

#[test]
fn chips_accumulate_and_clear() {
    let mut eng = engine_with(&[]);
    eng.add_to_bet(25).unwrap();
    eng.add_to_bet(100).unwrap();
    assert_eq!(eng.player().bet(), 125);
    eng.clear_bet().unwrap();
    assert_eq!(eng.player().bet(), 0);
    assert!(!eng.available_actions().contains(&AvailableAction::Deal));
}

#[test]
fn deal_without_bet_is_rejected() {
    let mut eng = engine_with(&[]);
    assert_eq!(eng.deal(), Err(GameError::NoBetPlaced));
    assert_eq!(eng.phase(), Phase::Betting);
}

#[test]
fn commands_outside_their_phase_are_rejected() {
    let mut eng = engine_with(&STAND_18_LOSES_TO_20);
    assert!(matches!(
        eng.hit(),
        Err(GameError::InvalidCommand {
            command: "hit",
            phase: Phase::Betting
        })
    ));
    assert!(matches!(eng.new_round(), Err(GameError::InvalidCommand { .. })));

    eng.place_bet(10).unwrap();
    eng.deal().unwrap();
    assert_eq!(eng.phase(), Phase::Playing);
    assert!(matches!(
        eng.place_bet(10),
        Err(GameError::InvalidCommand { .. })
    ));
    assert!(matches!(eng.deal(), Err(GameError::InvalidCommand { .. })));
}

#[test]
fn natural_pays_three_to_two() {
    let mut eng = engine_with(&NATURAL_WIN);
    eng.place_bet(100).unwrap();
    let events = eng.deal().unwrap();

    assert_eq!(eng.phase(), Phase::GameOver);
    assert_eq!(eng.player().chips(), 1_150);
    let result = eng.last_result().expect("settled");
    assert_eq!(result.outcome, RoundOutcome::Win);
    assert_eq!(result.payout, 250);
    assert_eq!(result.message, "Blackjack! You win!");
    assert_eq!(eng.stats().blackjacks, 1);
    assert_eq!(eng.stats().total_winnings, 250);
    assert!(events
        .iter()
        .any(|e| matches!(e, RoundEvent::HoleCardRevealed { .. })));
}

#[test]
fn natural_payout_floors_odd_bets() {
    let mut eng = engine_with(&NATURAL_WIN);
    eng.place_bet(25).unwrap();
    eng.deal().unwrap();
    assert_eq!(eng.last_result().unwrap().payout, 62);
    assert_eq!(eng.player().chips(), 975 + 62);
}

#[test]
fn dealer_natural_beats_player() {
    let mut eng = engine_with(&[Rank::Nine, Rank::Ace, Rank::Eight, Rank::King]);
    eng.place_bet(50).unwrap();
    eng.deal().unwrap();
    let result = eng.last_result().unwrap();
    assert_eq!(result.outcome, RoundOutcome::Lose);
    assert_eq!(result.message, "Dealer has Blackjack!");
    assert_eq!(eng.player().chips(), 950);
    assert!(!eng.dealer().is_hole_hidden());
}

#[test]
fn both_naturals_push() {
    let mut eng = engine_with(&[Rank::Ace, Rank::Ace, Rank::King, Rank::Queen]);
    eng.place_bet(50).unwrap();
    eng.deal().unwrap();
    let result = eng.last_result().unwrap();
    assert_eq!(result.outcome, RoundOutcome::Tie);
    assert_eq!(result.payout, 50);
    assert_eq!(eng.player().chips(), 1_000);
    assert_eq!(eng.stats().blackjacks, 1);
}

#[test]
fn stand_on_18_loses_to_dealer_drawing_to_20() {
    let mut eng = engine_with(&STAND_18_LOSES_TO_20);
    eng.place_bet(100).unwrap();
    eng.deal().unwrap();
    assert_eq!(eng.dealer().visible_score(), Some(6));
    eng.stand().unwrap();

    assert_eq!(eng.dealer().hand().len(), 3);
    assert_eq!(eng.dealer().score(), 20);
    let result = eng.last_result().unwrap();
    assert_eq!(result.outcome, RoundOutcome::Lose);
    assert_eq!(result.message, "Dealer wins with a higher score!");
    assert_eq!(eng.player().chips(), 900);
    assert_eq!(eng.stats().total_winnings, -100);
    assert_eq!(eng.stats().current_streak, -1);
}

#[test]
fn equal_scores_push_and_return_bet() {
    let mut eng = engine_with(&PUSH_20);
    eng.place_bet(100).unwrap();
    eng.deal().unwrap();
    eng.stand().unwrap();
    let result = eng.last_result().unwrap();
    assert_eq!(result.outcome, RoundOutcome::Tie);
    assert_eq!(result.message, "Push! Same score.");
    assert_eq!(eng.player().chips(), 1_000);
    assert_eq!(eng.stats().games_tied, 1);
    assert_eq!(eng.stats().total_winnings, 0);
}

#[test]
fn dealer_bust_pays_even_money() {
    let mut eng = engine_with(&[Rank::Ten, Rank::Ten, Rank::Nine, Rank::Six, Rank::King]);
    eng.place_bet(100).unwrap();
    eng.deal().unwrap();
    eng.stand().unwrap();
    let result = eng.last_result().unwrap();
    assert_eq!(result.message, "Dealer busts! You win!");
    assert_eq!(result.payout, 200);
    assert_eq!(eng.player().chips(), 1_100);
    assert_eq!(eng.stats().total_winnings, 200);
}

#[test]
fn player_bust_ends_round_with_hole_card_down() {
    let mut eng = engine_with(&[Rank::Ten, Rank::Nine, Rank::Six, Rank::Seven, Rank::King]);
    eng.place_bet(100).unwrap();
    eng.deal().unwrap();
    eng.hit().unwrap();

    assert_eq!(eng.phase(), Phase::GameOver);
    assert_eq!(eng.last_result().unwrap().message, "Bust! You went over 21!");
    assert!(eng.dealer().is_hole_hidden());
    assert_eq!(eng.dealer().hand().len(), 2);
    assert_eq!(eng.stats().busts, 1);
    assert_eq!(eng.player().chips(), 900);
}

#[test]
fn hitting_to_21_stands_automatically() {
    let mut eng = engine_with(&[Rank::Five, Rank::Nine, Rank::Six, Rank::Eight, Rank::Ten]);
    eng.place_bet(10).unwrap();
    eng.deal().unwrap();
    eng.hit().unwrap();
    assert_eq!(eng.phase(), Phase::GameOver);
    assert_eq!(eng.player().hand().score(), 21);
    assert_eq!(eng.last_result().unwrap().outcome, RoundOutcome::Win);
}

#[test]
fn double_down_doubles_bet_and_takes_one_card() {
    let mut eng = engine_with(&[
        Rank::Five,
        Rank::Nine,
        Rank::Six,
        Rank::Seven,
        Rank::Ten,
        Rank::Ten,
    ]);
    eng.place_bet(200).unwrap();
    eng.deal().unwrap();
    let events = eng.double_down().unwrap();
    assert!(matches!(
        events.first(),
        Some(RoundEvent::DoubledDown {
            bet: 400,
            chips: 600
        })
    ));

    assert_eq!(eng.player().hand().len(), 3);
    let result = eng.last_result().unwrap();
    assert_eq!(result.bet, 400);
    assert_eq!(result.payout, 800);
    assert_eq!(eng.player().chips(), 1_400);
}

#[test]
fn double_down_refused_after_hit() {
    let mut eng = engine_with(&[Rank::Two, Rank::Nine, Rank::Three, Rank::Seven, Rank::Two]);
    eng.place_bet(100).unwrap();
    eng.deal().unwrap();
    eng.hit().unwrap();
    assert_eq!(eng.double_down(), Err(GameError::CannotDoubleDown));
    assert_eq!(eng.player().bet(), 100);
    assert_eq!(eng.player().chips(), 900);
}

#[test]
fn double_down_refused_without_chips_to_cover() {
    let mut eng = engine_with(&[Rank::Five, Rank::Nine, Rank::Six, Rank::Seven]);
    eng.place_bet(600).unwrap();
    eng.deal().unwrap();
    assert!(!eng.available_actions().contains(&AvailableAction::DoubleDown));
    assert_eq!(eng.double_down(), Err(GameError::CannotDoubleDown));
    assert_eq!(eng.player().bet(), 600);
    assert_eq!(eng.player().chips(), 400);
    assert_eq!(eng.phase(), Phase::Playing);
}

#[test]
fn new_round_keeps_chips_and_clears_table() {
    let mut eng = engine_with(&STAND_18_LOSES_TO_20);
    play_round(&mut eng, 100);
    eng.new_round().unwrap();
    assert_eq!(eng.phase(), Phase::Betting);
    assert_eq!(eng.player().chips(), 900);
    assert_eq!(eng.player().bet(), 0);
    assert!(eng.player().hand().is_empty());
    assert!(eng.dealer().hand().is_empty());
    assert!(eng.last_result().is_none());
}

#[test]
fn broke_player_cannot_start_new_round() {
    let mut eng = engine_with(&STAND_18_LOSES_TO_20);
    play_round(&mut eng, 1_000);
    assert_eq!(eng.player().chips(), 0);
    assert!(eng.available_actions().is_empty());
    assert_eq!(eng.new_round(), Err(GameError::OutOfChips));
    assert_eq!(eng.phase(), Phase::GameOver);

    eng.grant_chips(500).unwrap();
    eng.new_round().expect("chips restored");
    assert_eq!(eng.player().chips(), 500);
}

#[test]
fn grant_chips_rules() {
    let mut eng = engine_with(&STAND_18_LOSES_TO_20);
    assert_eq!(eng.grant_chips(0), Err(GameError::InvalidGrant));
    eng.place_bet(10).unwrap();
    eng.deal().unwrap();
    assert!(matches!(
        eng.grant_chips(100),
        Err(GameError::InvalidCommand { .. })
    ));
}

#[test]
fn win_near_the_chip_ceiling_is_paid_in_full() {
    let mut eng = engine_with(&[Rank::Ten, Rank::Ten, Rank::King, Rank::Seven]);
    eng.grant_chips(1_999_999_000).unwrap();
    assert_eq!(eng.player().chips(), 2_000_000_000);

    assert!(matches!(
        eng.place_bet(2_000_000_000),
        Err(GameError::InvalidBetAmount { .. })
    ));
    eng.place_bet(1_500_000_000).unwrap();
    assert_eq!(
        eng.grant_chips(u32::MAX - 2_000_000_000),
        Err(GameError::ChipLimit {
            amount: u32::MAX - 2_000_000_000,
            chips: 2_000_000_000
        })
    );

    eng.deal().unwrap();
    assert_eq!(eng.phase(), Phase::Playing);
    eng.stand().unwrap();

    let result = eng.last_result().expect("settled");
    assert_eq!(result.outcome, RoundOutcome::Win);
    assert_eq!(result.payout, 3_000_000_000);
    assert_eq!(eng.player().chips(), 3_500_000_000);
    assert_eq!(eng.stats().total_winnings, 3_000_000_000);
}

#[test]
fn grant_past_the_chip_ceiling_is_refused() {
    let mut eng = engine_with(&[]);
    assert_eq!(
        eng.grant_chips(u32::MAX),
        Err(GameError::ChipLimit {
            amount: u32::MAX,
            chips: 1_000
        })
    );
    assert_eq!(eng.player().chips(), 1_000);
}

#[test]
fn streaks_track_runs_and_reset_on_tie() {
    let mut ranks = Vec::new();
    ranks.extend_from_slice(&NATURAL_WIN);
    ranks.extend_from_slice(&NATURAL_WIN);
    ranks.extend_from_slice(&STAND_18_LOSES_TO_20);
    ranks.extend_from_slice(&STAND_18_LOSES_TO_20);
    ranks.extend_from_slice(&STAND_18_LOSES_TO_20);
    ranks.extend_from_slice(&NATURAL_WIN);
    ranks.extend_from_slice(&STAND_18_LOSES_TO_20);
    ranks.extend_from_slice(&PUSH_20);
    let mut eng = engine_with(&ranks);

    let mut streaks = Vec::new();
    for round in 0..8 {
        if round > 0 {
            eng.new_round().unwrap();
        }
        play_round(&mut eng, 10);
        streaks.push(eng.stats().current_streak);
    }

    // a win straight after a losing run starts over at 1, and vice versa
    assert_eq!(streaks, vec![1, 2, -1, -2, -3, 1, -1, 0]);
    let stats = eng.stats();
    assert_eq!(stats.longest_win_streak, 2);
    assert_eq!(stats.longest_lose_streak, 3);
    assert_eq!(stats.games_played, 8);
    assert_eq!(
        stats.games_won + stats.games_lost + stats.games_tied,
        stats.games_played
    );
}

#[test]
fn reset_progress_abandons_round() {
    let mut eng = engine_with(&STAND_18_LOSES_TO_20);
    eng.place_bet(300).unwrap();
    eng.deal().unwrap();
    let events = eng.reset_progress();
    assert!(matches!(
        events.first(),
        Some(RoundEvent::PhaseChanged {
            from: Phase::Playing,
            to: Phase::Betting
        })
    ));
    assert_eq!(eng.phase(), Phase::Betting);
    assert_eq!(eng.player().chips(), 1_000);
    assert_eq!(eng.player().bet(), 0);
    assert_eq!(eng.stats().games_played, 0);
}

#[test]
fn apply_dispatches_wire_commands() {
    let mut eng = engine_with(&PUSH_20);
    let bet: Command = serde_json::from_str(r#"{"command":"bet","amount":40}"#).unwrap();
    eng.apply(bet).unwrap();
    eng.apply(Command::Deal).unwrap();
    eng.apply(Command::Stand).unwrap();
    assert_eq!(eng.phase(), Phase::GameOver);
    assert_eq!(
        serde_json::to_value(Command::DoubleDown).unwrap()["command"],
        "double_down"
    );
}

#[test]
fn phase_events_follow_the_state_machine() {
    let mut eng = engine_with(&STAND_18_LOSES_TO_20);
    play_round(&mut eng, 10);
    let phases: Vec<(Phase, Phase)> = eng
        .round_events()
        .iter()
        .filter_map(|e| match e {
            RoundEvent::PhaseChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            (Phase::Betting, Phase::Dealing),
            (Phase::Dealing, Phase::Playing),
            (Phase::Playing, Phase::DealerTurn),
            (Phase::DealerTurn, Phase::GameOver),
        ]
    );
    assert!(phases.iter().all(|(a, b)| a.can_transition_to(*b)));
}
