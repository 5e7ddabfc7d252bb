//! Command-line interface for chessroom.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chessroom - terminal client for server-authoritative online chess
#[derive(Parser, Debug)]
#[command(name = "chessroom")]
#[command(about = "Play online chess from the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Your participant id on the server
    #[arg(long, global = true, default_value = "")]
    pub player_id: String,

    /// Authority server URL (overrides config file and environment)
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new game, then enter its room
    Create,

    /// Join an existing game, then enter its room
    Join {
        /// Game id to join
        game_id: String,
    },

    /// Enter the room of a game you already sit in
    Room {
        /// Game id to open
        game_id: String,
    },
}
