//! Chessroom - terminal client
//!
//! Create or join a game on the authority server, then play it from a
//! line-oriented room loop while pushed events keep the view current.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use chessroom::{
    ClientConfig, Color, DropVerdict, GameResult, GameSession, GameStatus, PromotionPiece,
    Square,
};
use clap::Parser;
use cli::{Cli, Command};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Keep the interactive loop quiet unless asked otherwise.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    if cli.player_id.is_empty() {
        anyhow::bail!("--player-id is required");
    }
    let config = resolve_config(&cli)?;

    let game_id = match &cli.command {
        Command::Create => {
            let game_id = chessroom::create_game(config.server_url(), &cli.player_id).await?;
            println!("Game created: {game_id}");
            println!("Share this id with your opponent.");
            game_id
        }
        Command::Join { game_id } => {
            chessroom::join_game(config.server_url(), game_id, &cli.player_id).await?;
            println!("Joined game {game_id}");
            game_id.clone()
        }
        Command::Room { game_id } => game_id.clone(),
    };

    run_room(&config, &game_id, &cli.player_id).await
}

/// Resolves configuration: file if given, else environment, with the
/// command-line URL winning over both.
fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::from_env(),
    };
    Ok(match &cli.server_url {
        Some(url) => ClientConfig::new(url),
        None => config,
    })
}

/// The room loop: surface notices as they arrive, execute commands as
/// they are typed, tear down cleanly on quit, EOF, or Ctrl-C.
async fn run_room(config: &ClientConfig, game_id: &str, player_id: &str) -> Result<()> {
    let (notice_tx, mut notices) = mpsc::unbounded_channel();
    let mut session = GameSession::open(config, game_id, player_id, notice_tx).await?;
    info!(game_id, player_id, "Session open");

    println!("Entered game {game_id} as {player_id}");
    print_position(&session);
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            notice = notices.recv() => match notice {
                Some(notice) => {
                    println!("* {notice}");
                }
                None => break,
            },
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !handle_command(&mut session, line.trim()).await {
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    session.close().await;
    println!("Left the game.");
    Ok(())
}

/// Executes one room command. Returns `false` when the user quits.
async fn handle_command(session: &mut GameSession, line: &str) -> bool {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return true;
    };
    match command {
        "move" | "m" => {
            let (Some(from), Some(to)) = (words.next(), words.next()) else {
                println!("usage: move <from> <to>   e.g. move e2 e4");
                return true;
            };
            let (from, to) = match (from.parse::<Square>(), to.parse::<Square>()) {
                (Ok(from), Ok(to)) => (from, to),
                _ => {
                    println!("squares look like e2, h8");
                    return true;
                }
            };
            match session.moves().drop_piece(from, to).await {
                Ok(DropVerdict::Accepted) => print_position(session),
                Ok(DropVerdict::PromotionPending) => {
                    println!("Promotion! Choose a piece with: promote <q|r|b|n>")
                }
                Err(err) => println!("! {err}"),
            }
        }
        "promote" => {
            let piece = words.next().and_then(|w| w.parse::<PromotionPiece>().ok());
            let Some(piece) = piece else {
                println!("usage: promote <q|r|b|n>");
                return true;
            };
            match session.moves().choose_promotion(piece).await {
                Ok(()) => print_position(session),
                Err(err) => println!("! {err}"),
            }
        }
        "draw" => match session.draw().offer().await {
            Ok(()) => println!("Draw offer sent"),
            Err(err) => println!("! {err}"),
        },
        "accept" => match session.draw().respond(true).await {
            Ok(()) => print_position(session),
            Err(err) => println!("! {err}"),
        },
        "decline" => match session.draw().respond(false).await {
            Ok(()) => println!("Draw offer declined"),
            Err(err) => println!("! {err}"),
        },
        "resign" => match session.resign().await {
            Ok(()) => print_position(session),
            Err(err) => println!("! {err}"),
        },
        "show" | "s" => print_position(session),
        "help" | "?" => print_help(),
        "quit" | "exit" | "q" => return false,
        other => println!("unknown command '{other}' (try 'help')"),
    }
    true
}

fn print_position(session: &GameSession) {
    let Some(game) = session.snapshot() else {
        println!("(game not loaded)");
        return;
    };
    for color in [Color::White, Color::Black] {
        match game.seat(color) {
            Some(player) => println!(
                "{color}: {}",
                player.username().as_deref().unwrap_or(player.id())
            ),
            None => println!("{color}: (waiting)"),
        }
    }
    match game.status() {
        GameStatus::Pending => println!("Waiting for both players to join..."),
        GameStatus::Active => match game.side_to_move() {
            Some(color) => println!("{color} to move"),
            None => println!("(side to move unknown)"),
        },
        GameStatus::Completed => match game.result() {
            Some(GameResult::Draw) => println!("Game Over - Draw!"),
            Some(GameResult::White) => println!("Game Over - White wins!"),
            Some(GameResult::Black) => println!("Game Over - Black wins!"),
            None => println!("Game Over"),
        },
    }
    println!("position: {}", game.fen());
    if !game.move_history().is_empty() {
        println!("moves: {}", game.move_history().join(" "));
    }
    if let Some(offer) = game.draw_offer() {
        println!("draw offered by {}", offer.offered_by());
    }
}

fn print_help() {
    println!("commands:");
    println!("  move <from> <to>    drag a piece, e.g. move e2 e4");
    println!("  promote <q|r|b|n>   finish a suspended promotion");
    println!("  draw                offer a draw");
    println!("  accept / decline    answer the outstanding draw offer");
    println!("  resign              resign the game");
    println!("  show                print the current position");
    println!("  quit                leave the room");
}
