// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # JKA Node
//!
//! Entry point for the `jka-node` binary. Parses CLI arguments,
//! initializes logging, and dispatches to one of three subcommands:
//!
//! - `keygen`   — generate a static keypair
//! - `simulate` — run concurrent in-memory handshakes
//! - `version`  — print build version information

mod cli;
mod logging;
mod simulate;

use anyhow::Result;
use clap::Parser;
use serde_json::json;

use jka_protocol::config::HandshakeConfig;
use jka_protocol::crypto::Keypair;
use jka_protocol::group::{Curve25519, Group, Ristretto255};

use cli::{Commands, GroupChoice, JkaNodeCli, KeygenArgs, SimulateArgs};
use simulate::{SessionReport, Summary};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = JkaNodeCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Keygen(args) => match args.group {
            GroupChoice::Curve25519 => keygen::<Curve25519>(&args),
            GroupChoice::Ristretto255 => keygen::<Ristretto255>(&args),
        },
        Commands::Simulate(args) => match args.group {
            GroupChoice::Curve25519 => run_simulation::<Curve25519>(&args).await,
            GroupChoice::Ristretto255 => run_simulation::<Ristretto255>(&args).await,
        },
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Generates a static keypair and prints both halves as hex.
///
/// The secret is printed in its clamped little-endian form, the same
/// bytes `SecretScalar::from_bytes` accepts back.
fn keygen<G: Group>(args: &KeygenArgs) -> Result<()> {
    let keypair = Keypair::<G>::generate()?;
    let public_key = keypair.public_key().to_hex();
    let secret_key = hex::encode(keypair.secret().as_bytes());
    tracing::info!(group = G::NAME, public_key = %public_key, "static keypair generated");

    if args.json {
        let out = json!({
            "group": G::NAME,
            "public_key": public_key,
            "secret_key": secret_key,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("group      : {}", G::NAME);
        println!("public key : {}", public_key);
        println!("secret key : {}", secret_key);
    }
    Ok(())
}

async fn run_simulation<G: Group>(args: &SimulateArgs) -> Result<()> {
    let config = HandshakeConfig {
        receive_timeout_ms: args.timeout_ms,
        ..HandshakeConfig::default()
    };
    let reports = simulate::simulate::<G>(args.variant, args.sessions, config, args.tamper).await?;
    let summary = Summary::from_reports(&reports);

    if args.json {
        for report in &reports {
            println!("{}", serde_json::to_string(report)?);
        }
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        for report in &reports {
            println!("{}", describe(report));
        }
        println!(
            "{} session(s): {} agreed, {} disagreed, {} aborted",
            summary.sessions, summary.agreed, summary.disagreed, summary.aborted
        );
    }

    tracing::info!(
        variant = %args.variant,
        agreed = summary.agreed,
        aborted = summary.aborted,
        "simulation finished"
    );
    Ok(())
}

fn describe(report: &SessionReport) -> String {
    let outcome = match (&report.initiator_error, &report.responder_error) {
        (None, None) if report.agreed => "agreed".to_string(),
        (None, None) => "DISAGREED".to_string(),
        (i, r) => format!(
            "aborted (initiator: {}, responder: {})",
            i.as_deref().unwrap_or("ok"),
            r.as_deref().unwrap_or("ok")
        ),
    };
    format!(
        "{} {} {:>8}us  {}",
        report.session, report.variant, report.elapsed_us, outcome
    )
}

/// Prints version information to stdout.
fn print_version() {
    println!("jka-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol {}", jka_protocol::config::PROTOCOL_VERSION);
    println!(
        "wire     v{}",
        jka_protocol::config::WIRE_PROTOCOL_VERSION
    );
}
