// LedgerLink CLI - AI-assisted reconciliation of two ledgers

mod account;
mod auth;
mod doctor;
mod exit_codes;
mod reconcile;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ledgerlink_store::Store;

use exit_codes::{EXIT_ERROR, EXIT_STORE, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "ledgerlink")]
#[command(about = "Reconcile two ledgers with an AI matching oracle")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and log in
    #[command(after_help = "\
Examples:
  ledgerlink signup --email ada@example.com --name 'Ada Lovelace'
  printf 'pw\\npw\\n' | ledgerlink signup --email ada@example.com --name Ada")]
    Signup {
        #[arg(long)]
        email: String,

        /// Full name
        #[arg(long)]
        name: String,

        /// Password (prompted on stdin when omitted)
        #[arg(long, env = "LEDGERLINK_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Password confirmation (defaults to --password when that is given)
        #[arg(long)]
        confirm_password: Option<String>,

        /// Print the new account as JSON
        #[arg(long)]
        json: bool,
    },

    /// Log in and save the session token
    #[command(after_help = "\
Examples:
  ledgerlink login --email ada@example.com
  LEDGERLINK_PASSWORD=... ledgerlink login --email ada@example.com")]
    Login {
        #[arg(long)]
        email: String,

        /// Password (prompted on stdin when omitted)
        #[arg(long, env = "LEDGERLINK_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Revoke the current session and forget the saved token
    Logout,

    /// Show the logged-in account
    Whoami {
        #[arg(long)]
        json: bool,
    },

    /// Reconcile two files (exit 0 = done, 40 = no AI call succeeded)
    #[command(after_help = "\
Examples:
  ledgerlink reconcile bank.csv ledger.xlsx
  ledgerlink reconcile bank.csv ledger.csv --json > result.json
  ledgerlink reconcile bank.csv ledger.csv --window 10 --pool 2 --no-save
  ledgerlink reconcile a.xlsx b.xlsx --output report.json

Supported inputs: .csv .tsv .txt .xlsx .xlsm .xls .xlsb .ods
Exit codes: 3 unreadable input, 10/11 AI unavailable, 20 not logged in")]
    Reconcile {
        /// First file (A)
        file_a: PathBuf,

        /// Second file (B)
        file_b: PathBuf,

        /// Print the full report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Also write the JSON report to a file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Records of the bigger file per AI call (default from settings)
        #[arg(long)]
        window: Option<usize>,

        /// AI calls in flight at once (default from settings)
        #[arg(long)]
        pool: Option<usize>,

        /// Do not save the run to history
        #[arg(long)]
        no_save: bool,
    },

    /// List past reconciliations, newest first
    #[command(after_help = "\
Examples:
  ledgerlink history
  ledgerlink history --json
  ledgerlink history --show 6f1c2d3e-...")]
    History {
        #[arg(long)]
        json: bool,

        /// Show one saved reconciliation in full
        #[arg(long, value_name = "ID")]
        show: Option<String>,
    },

    /// AI provider configuration
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },
}

#[derive(Subcommand)]
enum AiCommands {
    /// Check AI configuration (exit 0 = ready, 10 = disabled, 11 = missing key)
    Doctor {
        /// Output as JSON for machine parsing
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("LEDGERLINK_COMMIT"), ")",
        "\nengine:  ledgerlink-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("LEDGERLINK_TARGET"),
    )
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Signup {
            email,
            name,
            password,
            confirm_password,
            json,
        } => account::cmd_signup(email, name, password, confirm_password, json),
        Commands::Login { email, password, json } => account::cmd_login(email, password, json),
        Commands::Logout => account::cmd_logout(),
        Commands::Whoami { json } => account::cmd_whoami(json),
        Commands::Reconcile {
            file_a,
            file_b,
            json,
            output,
            window,
            pool,
            no_save,
        } => reconcile::cmd_reconcile(reconcile::ReconcileArgs {
            file_a,
            file_b,
            json,
            output,
            window,
            pool,
            no_save,
        }),
        Commands::History { json, show } => reconcile::cmd_history(json, show),
        Commands::Ai { command } => match command {
            AiCommands::Doctor { json } => doctor::cmd_ai_doctor(json),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

pub fn open_store() -> Result<Store, CliError> {
    Store::open_default().map_err(|e| CliError {
        code: EXIT_STORE,
        message: e.to_string(),
        hint: Some(format!(
            "set {} to use another data directory",
            ledgerlink_config::paths::DATA_DIR_ENV
        )),
    })
}

/// Stdout carries exactly one JSON value under --json.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let out = serde_json::to_string_pretty(value).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: e.to_string(),
        hint: None,
    })?;
    println!("{}", out);
    Ok(())
}
