//! # Play Command
//!
//! Interactive blackjack at the terminal. Each round asks for a bet, deals,
//! then asks for hit / stand / double until the hand is settled. Progress is
//! saved to the profile file by the engine after every settlement.
//!
//! Typing `q` (or closing stdin) at any prompt ends the session. A hand that
//! was dealt but not settled is abandoned: nothing about it is saved, so the
//! stake stays on the profile.

use super::{open_profile, profile_path};
use crate::config;
use crate::error::CliError;
use crate::formatters::{format_card, format_dealer, format_hand, format_result};
use crate::io_utils::{ensure_parent_dir, read_stdin_line};
use crate::ui;
use crate::validation::{ParseResult, parse_bet_input, parse_round_action};
use blackjack_engine::engine::RoundEngine;
use blackjack_engine::errors::GameError;
use blackjack_engine::events::{RoundEvent, Seat};
use blackjack_engine::game::{AvailableAction, Phase};
use blackjack_engine::shoe::Shoe;
use blackjack_engine::store::StatsRepository;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// How a play session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Rounds that reached settlement
    pub rounds_played: u32,
    /// The player asked to stop (or stdin closed) before the session's end
    pub quit: bool,
}

enum Step {
    Continue,
    Quit,
}

/// Handle the play command.
///
/// `seed` and `profile` fall back to the resolved configuration; with no
/// seed anywhere a random one is drawn and printed so the shoe can be
/// replayed.
pub fn handle_play_command(
    rounds: Option<u32>,
    seed: Option<u64>,
    profile: Option<PathBuf>,
    out: &mut dyn Write,
    err: &mut dyn Write,
    stdin: &mut dyn BufRead,
) -> Result<(), CliError> {
    if rounds == Some(0) {
        return Err(CliError::InvalidInput("rounds must be >= 1".to_string()));
    }

    let config = config::load()?;
    let seed = seed.or(config.seed).unwrap_or_else(rand::random);
    let path = profile_path(profile, &config);
    ensure_parent_dir(&path).map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    let repository = open_profile(&path)?;

    let limit = rounds.map_or_else(|| "unlimited".to_string(), |n| n.to_string());
    writeln!(
        out,
        "play: rounds={} seed={} profile={}",
        limit,
        seed,
        path.display()
    )?;

    let mut engine = RoundEngine::with_player_name(
        repository,
        Shoe::new_with_seed(seed),
        config.player_name,
    );
    writeln!(out, "Welcome, {}!", engine.player().name())?;

    let summary = play_session(&mut engine, rounds, out, err, stdin)?;

    writeln!(out)?;
    writeln!(
        out,
        "Rounds played: {}{}",
        summary.rounds_played,
        if summary.quit { "" } else { " (completed)" }
    )?;
    writeln!(out, "Chips: {}", engine.player().chips())?;
    if engine.persistence_failures() > 0 {
        ui::display_warning(
            err,
            &format!(
                "progress could not be saved to {} ({} failed writes)",
                path.display(),
                engine.persistence_failures()
            ),
        )?;
    }
    Ok(())
}

/// Runs rounds on `engine` until `rounds` have settled, the player quits, or
/// the chips run out.
pub fn play_session<R: StatsRepository>(
    engine: &mut RoundEngine<R>,
    rounds: Option<u32>,
    out: &mut dyn Write,
    err: &mut dyn Write,
    stdin: &mut dyn BufRead,
) -> Result<SessionSummary, CliError> {
    let mut summary = SessionSummary {
        rounds_played: 0,
        quit: false,
    };

    loop {
        if engine.player().chips() == 0 {
            writeln!(out, "{}", GameError::OutOfChips)?;
            writeln!(out, "Run `blackjack reset` to start over.")?;
            break;
        }

        writeln!(out)?;
        writeln!(out, "Round {}", summary.rounds_played + 1)?;
        writeln!(out, "Chips: {}", engine.player().chips())?;

        if let Step::Quit = take_bet(engine, out, err, stdin)? {
            summary.quit = true;
            break;
        }

        engine.deal()?;
        writeln!(out, "Dealer: {}", format_dealer(engine.dealer()))?;
        writeln!(out, "You:    {}", format_hand(engine.player().hand()))?;

        if let Step::Quit = play_hand(engine, out, err, stdin)? {
            writeln!(out, "Round abandoned.")?;
            summary.quit = true;
            break;
        }

        report_settlement(engine, out)?;
        summary.rounds_played += 1;

        if rounds.is_some_and(|limit| summary.rounds_played >= limit) {
            break;
        }
        match engine.new_round() {
            Ok(_) => {}
            Err(GameError::OutOfChips) => {
                writeln!(out, "{}", GameError::OutOfChips)?;
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(summary)
}

/// Prompts until the table accepts a bet.
fn take_bet<R: StatsRepository>(
    engine: &mut RoundEngine<R>,
    out: &mut dyn Write,
    err: &mut dyn Write,
    stdin: &mut dyn BufRead,
) -> Result<Step, CliError> {
    loop {
        ui::prompt(
            out,
            &format!("Bet amount (1-{}, q to quit): ", engine.player().chips()),
        )?;
        let Some(input) = read_stdin_line(stdin) else {
            writeln!(out)?;
            return Ok(Step::Quit);
        };
        match parse_bet_input(&input) {
            ParseResult::Value(amount) => match engine.place_bet(amount) {
                Ok(_) => return Ok(Step::Continue),
                Err(e) => ui::write_error(err, &e.to_string())?,
            },
            ParseResult::Quit => return Ok(Step::Quit),
            ParseResult::Invalid(msg) => ui::write_error(err, &msg)?,
        }
    }
}

/// Prompts for decisions while the hand is live.
fn play_hand<R: StatsRepository>(
    engine: &mut RoundEngine<R>,
    out: &mut dyn Write,
    err: &mut dyn Write,
    stdin: &mut dyn BufRead,
) -> Result<Step, CliError> {
    while engine.phase() == Phase::Playing {
        let can_double = engine
            .available_actions()
            .contains(&AvailableAction::DoubleDown);
        let choices = if can_double {
            "Action (h=hit, s=stand, d=double, q=quit): "
        } else {
            "Action (h=hit, s=stand, q=quit): "
        };
        ui::prompt(out, choices)?;

        let Some(input) = read_stdin_line(stdin) else {
            writeln!(out)?;
            return Ok(Step::Quit);
        };
        match parse_round_action(&input) {
            ParseResult::Value(command) => match engine.apply(command) {
                Ok(events) => narrate(&events, out)?,
                Err(e) => ui::write_error(err, &e.to_string())?,
            },
            ParseResult::Quit => return Ok(Step::Quit),
            ParseResult::Invalid(msg) => ui::write_error(err, &msg)?,
        }
    }
    Ok(Step::Continue)
}

fn narrate(events: &[RoundEvent], out: &mut dyn Write) -> Result<(), CliError> {
    for event in events {
        match event {
            RoundEvent::DoubledDown { bet, .. } => writeln!(out, "Doubled down, bet is now {}", bet)?,
            RoundEvent::CardDealt {
                seat: Seat::Player,
                card: Some(card),
                ..
            } => writeln!(out, "You draw {}", format_card(card))?,
            RoundEvent::HoleCardRevealed { card, .. } => {
                writeln!(out, "Dealer reveals {}", format_card(card))?
            }
            RoundEvent::CardDealt {
                seat: Seat::Dealer,
                card: Some(card),
                ..
            } => writeln!(out, "Dealer draws {}", format_card(card))?,
            _ => {}
        }
    }
    Ok(())
}

fn report_settlement<R: StatsRepository>(
    engine: &RoundEngine<R>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let Some(result) = engine.last_result() else {
        return Ok(());
    };
    writeln!(out, "Dealer: {}", format_dealer(engine.dealer()))?;
    writeln!(out, "You:    {}", format_hand(engine.player().hand()))?;
    writeln!(out, "{}", format_result(result))?;
    writeln!(out, "Chips: {}", engine.player().chips())?;
    for achievement in &result.unlocked {
        writeln!(
            out,
            "Achievement unlocked: {} - {}",
            achievement.title, achievement.description
        )?;
    }
    Ok(())
}
