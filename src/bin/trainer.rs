use std::io::{self, BufRead, Write};
use std::time::Duration;

use blackjack_core::{GamePhase, RiskLevel};
use blackjack_trainer::{Command, Engine, EngineConfig, Event, QueryMsg, QueryResponse, Response, Seat, SettingUpdate};
use clap::Parser;

#[derive(Parser)]
#[command(name = "trainer", about = "Blackjack practice table: basic strategy hints and card counting drills")]
struct Args {
    /// Use a preset: vegas, european, atlantic_city, single_deck
    #[arg(long, default_value = "vegas")]
    preset: String,

    /// Number of decks in the shoe (1-8)
    #[arg(long)]
    decks: Option<u8>,

    /// Starting bankroll
    #[arg(long, default_value = "1000")]
    bankroll: u64,

    /// Opening bet
    #[arg(long)]
    bet: Option<u64>,

    /// Shoe seed for a reproducible session
    #[arg(long)]
    seed: Option<u64>,

    /// Show basic strategy hints
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    hints: bool,

    /// Card counting mode (running/true count, bet advice, index plays)
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    counting: bool,

    /// Auto-play this many rounds and print the session stats
    #[arg(long)]
    auto: Option<u32>,

    /// Pace of auto-play: slow, normal, fast, instant
    #[arg(long, default_value = "instant")]
    speed: String,
}

const HELP: &str = "commands: h(it) s(tand) d(ouble) p (split) r (surrender) i (insurance) n (no insurance)
          deal | u(ndo) | b <amount> | c <running count guess> | count | advice | stats
          set <key> <json value> | export | new | q(uit)";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let Some(mut config) = EngineConfig::with_preset(&args.preset) else {
        eprintln!(
            "Unknown preset '{}'. Available: {}",
            args.preset,
            blackjack_core::GameRules::PRESETS.join(", ")
        );
        std::process::exit(1);
    };
    if let Some(decks) = args.decks {
        config.settings.deck_count = decks;
    }
    config.settings.show_basic_strategy_hints = args.hints;
    config.settings.card_counting_mode = args.counting;
    config.starting_bankroll = args.bankroll;
    config.seed = args.seed;

    let mut engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Cannot start: {e}");
            std::process::exit(1);
        }
    };
    if let Some(bet) = args.bet {
        print_response(&engine.handle(Command::SetBetAmount { amount: bet }));
    }

    match args.auto {
        Some(rounds) => {
            if let Err(e) = apply_speed(&mut engine, &args.speed) {
                eprintln!("{e}");
                std::process::exit(1);
            }
            auto_play(&mut engine, rounds);
        }
        None => {
            if let Err(e) = interactive(&mut engine) {
                log::error!("input error: {e}");
                std::process::exit(1);
            }
        }
    }
}

fn apply_speed(engine: &mut Engine, speed: &str) -> Result<(), String> {
    let update = SettingUpdate::parse("gameSpeed", &serde_json::Value::String(speed.to_string()))
        .map_err(|e| e.to_string())?;
    engine.execute(Command::UpdateSetting(update)).map_err(|e| e.to_string())?;
    Ok(())
}

fn auto_play(engine: &mut Engine, rounds: u32) {
    let delay = Duration::from_millis(engine.settings().game_speed.card_delay_ms());
    let quiet = delay.is_zero();
    let target = engine.stats().hands_played + rounds;

    while engine.stats().hands_played < target {
        match engine.execute(Command::AutoPlayStep) {
            Ok(resp) => {
                if !quiet {
                    print_response(&resp);
                    std::thread::sleep(delay);
                }
            }
            Err(e) => {
                println!("Auto-play stopped: {e}");
                break;
            }
        }
    }
    print_stats(engine);
}

fn interactive(engine: &mut Engine) -> io::Result<()> {
    println!("{HELP}");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{}> ", prompt(engine));
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            continue;
        };

        let cmd = match word {
            "h" | "hit" => Command::Hit,
            "s" | "stand" => Command::Stand,
            "d" | "double" => Command::DoubleDown,
            "p" | "split" => Command::Split,
            "r" | "surrender" => Command::Surrender,
            "i" | "insurance" => Command::TakeInsurance,
            "n" | "no" => Command::DeclineInsurance,
            "deal" => Command::DealNewHand,
            "u" | "undo" => Command::UndoLastAction,
            "new" => Command::StartNewGame,
            "b" | "bet" => match words.next().map(str::parse::<u64>) {
                Some(Ok(amount)) => Command::SetBetAmount { amount },
                _ => {
                    println!("usage: b <amount>");
                    continue;
                }
            },
            "set" => {
                let (Some(key), Some(raw)) = (words.next(), words.next()) else {
                    println!("usage: set <key> <json value>, keys: {}", SettingUpdate::KEYS.join(", "));
                    continue;
                };
                let value = serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
                match SettingUpdate::parse(key, &value) {
                    Ok(update) => Command::UpdateSetting(update),
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                }
            }
            "c" => {
                match words.next().map(str::parse::<i32>) {
                    Some(Ok(estimate)) => {
                        let feedback = engine.record_count_estimate(estimate);
                        println!(
                            "You said {}, the count is {} (score {}, average {:.0}%)",
                            feedback.estimate, feedback.actual, feedback.score, feedback.accuracy
                        );
                    }
                    _ => println!("usage: c <running count>"),
                }
                continue;
            }
            "count" => {
                if let QueryResponse::Count(count) = engine.query(QueryMsg::Count) {
                    println!(
                        "running {:+}  true {:+.1}  decks left {:.1}  dealt {}",
                        count.running_count, count.true_count, count.decks_remaining, count.cards_dealt
                    );
                }
                continue;
            }
            "advice" => {
                let advice = engine.betting_advice(RiskLevel::Conservative);
                println!("{} (bet {})", advice.message, advice.recommended_bet);
                if let Some(play) = engine.index_play() {
                    println!("index play {}: {:?}", play.name, play.action);
                }
                continue;
            }
            "stats" => {
                print_stats(engine);
                continue;
            }
            "export" => {
                match engine.export_state() {
                    Ok(json) => println!("{json}"),
                    Err(e) => println!("{e}"),
                }
                continue;
            }
            "q" | "quit" => break,
            _ => {
                println!("{HELP}");
                continue;
            }
        };
        print_response(&engine.handle(cmd));
    }
    print_stats(engine);
    Ok(())
}

fn prompt(engine: &Engine) -> String {
    match engine.phase() {
        GamePhase::Playing => {
            let actions: Vec<&str> = engine.available_actions().iter().map(|a| a.as_str()).collect();
            format!("[{}]", actions.join(" "))
        }
        phase => format!("{} bet {} bank {}", phase.as_str(), engine.base_bet(), engine.bankroll()),
    }
}

fn print_response(resp: &Response) {
    for event in &resp.events {
        match event {
            Event::CardDealt { card, seat, face_up } => {
                let shown = if *face_up { card.to_display() } else { "??".to_string() };
                println!("  {} <- {shown}", seat_name(*seat));
            }
            Event::HoleCardRevealed { card } => println!("  dealer turns over {}", card.to_display()),
            Event::HandTotal { seat, value, soft } => {
                println!("  {}: {}{value}", seat_name(*seat), if *soft { "soft " } else { "" })
            }
            Event::Message { text, .. } => println!("{text}"),
            Event::HandSettled(summary) => println!("  bankroll {}", summary.bankroll),
            Event::CountUpdated(count) => {
                println!("  [RC {:+} TC {:+.1}]", count.running_count, count.true_count)
            }
            Event::BettingAdvice(advice) => println!("  {}", advice.message),
            Event::StrategyHint(hint) => println!("  hint [{}] {} ({})", hint.action.code(), hint.action, hint.explanation),
            Event::PhaseChanged { .. }
            | Event::InsuranceOffered { .. }
            | Event::InsuranceSettled { .. }
            | Event::Reshuffled { .. } => {}
        }
    }
}

fn seat_name(seat: Seat) -> String {
    match seat {
        Seat::Player { hand } => format!("hand {}", hand + 1),
        Seat::Dealer => "dealer".to_string(),
    }
}

fn print_stats(engine: &Engine) {
    let stats = engine.stats();
    let accuracy = engine.accuracy();
    println!("\n=== Session ===");
    println!("Hands:     {}", stats.hands_played);
    println!(
        "Record:    {} won, {} blackjacks, {} lost, {} pushed, {} surrendered",
        stats.wins, stats.blackjacks, stats.losses, stats.pushes, stats.surrenders
    );
    println!("Win rate:  {:.1}%", stats.win_rate());
    println!("Wagered:   {}", stats.total_wagered);
    println!("Net:       {:+}", stats.net_result);
    println!("Bankroll:  {}", engine.bankroll());
    if accuracy.hints_issued > 0 {
        println!(
            "Strategy:  {}/{} ({:.1}%, grade {})",
            accuracy.correct_decisions,
            accuracy.hints_issued,
            accuracy.percentage(),
            accuracy.grade()
        );
    }
}
