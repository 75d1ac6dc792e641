//! # CLI Interface
//!
//! Defines the command-line argument structure for `jka-node` using
//! `clap` derive. Supports three subcommands: `keygen`, `simulate`
//! and `version`.

use clap::{Parser, Subcommand, ValueEnum};

use jka_protocol::config::DEFAULT_RECEIVE_TIMEOUT_MS;
use jka_protocol::handshake::Variant;

use crate::logging::LogFormat;

/// Julia Key Agreement driver.
///
/// Generates static keypairs and runs in-process handshakes between two
/// simulated parties for any of the four variants.
#[derive(Parser, Debug)]
#[command(
    name = "jka-node",
    about = "Julia Key Agreement handshake driver",
    version,
    propagate_version = true
)]
pub struct JkaNodeCli {
    /// Default log filter when `RUST_LOG` is not set.
    #[arg(long, global = true, env = "JKA_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the JKA node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a fresh static keypair and print it as hex.
    Keygen(KeygenArgs),
    /// Run concurrent in-memory handshakes and report whether they agree.
    Simulate(SimulateArgs),
    /// Print version information and exit.
    Version,
}

/// The group a command operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupChoice {
    Curve25519,
    Ristretto255,
}

/// Arguments for the `keygen` subcommand.
#[derive(Parser, Debug)]
pub struct KeygenArgs {
    #[arg(long, value_enum, default_value_t = GroupChoice::Curve25519)]
    pub group: GroupChoice,

    /// Print a JSON object instead of plain lines.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `simulate` subcommand.
#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Variant to run: a, b, c, d or the long names
    /// (static_only, triple_dh, joint_tweak, jka).
    #[arg(long, short = 'v', default_value = "jka")]
    pub variant: Variant,

    #[arg(long, value_enum, default_value_t = GroupChoice::Curve25519)]
    pub group: GroupChoice,

    /// Number of concurrent sessions between the same two static keys.
    #[arg(long, short = 'n', default_value_t = 1)]
    pub sessions: usize,

    /// Milliseconds each role waits for the peer's next message.
    #[arg(long, env = "JKA_RECEIVE_TIMEOUT_MS", default_value_t = DEFAULT_RECEIVE_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Flip one byte of the Initiator's final message in transit.
    #[arg(long)]
    pub tamper: bool,

    /// Print one JSON object per session instead of a summary table.
    #[arg(long)]
    pub json: bool,
}
