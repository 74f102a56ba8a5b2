//! Account commands: signup, login, logout, whoami.

use std::io::{self, BufRead, Write};

use ledgerlink_store::{Account, Store};

use crate::auth::{self, SavedSession};
use crate::exit_codes::*;
use crate::{open_store, print_json, CliError};

/// Read one line of secret input from stdin after printing `prompt` to stderr.
fn prompt_secret(lines: &mut impl Iterator<Item = io::Result<String>>, prompt: &str) -> Result<String, CliError> {
    eprint!("{}", prompt);
    io::stderr().flush().ok();

    match lines.next() {
        Some(Ok(line)) => Ok(line.trim_end_matches('\r').to_string()),
        Some(Err(e)) => Err(CliError {
            code: EXIT_ERROR,
            message: e.to_string(),
            hint: None,
        }),
        None => Err(CliError {
            code: EXIT_USAGE,
            message: "No password provided".into(),
            hint: Some("pass --password, set LEDGERLINK_PASSWORD, or pipe it on stdin".into()),
        }),
    }
}

/// The authenticated requester for this invocation.
pub fn require_account(store: &Store) -> Result<Account, CliError> {
    let token = auth::current_token().ok_or_else(|| CliError {
        code: EXIT_NOT_AUTH,
        message: "Not logged in".into(),
        hint: Some(format!("run `ledgerlink login` or set {}", auth::TOKEN_ENV)),
    })?;
    store.authenticate(&token).map_err(store_error)
}

fn start_session(store: &Store, email: &str, password: &str) -> Result<Account, CliError> {
    let session = store.login(email, password).map_err(store_error)?;

    auth::save(&SavedSession {
        token: session.token,
        email: Some(session.account.email.clone()),
        expires_at: Some(session.expires_at),
    })
    .map_err(|e| CliError {
        code: EXIT_ERROR,
        message: e,
        hint: None,
    })?;

    Ok(session.account)
}

pub fn cmd_signup(
    email: String,
    name: String,
    password: Option<String>,
    confirm_password: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    let (password, confirm) = match password {
        // Non-interactive: confirmation only when asked for explicitly
        Some(pw) => {
            let confirm = confirm_password.unwrap_or_else(|| pw.clone());
            (pw, confirm)
        }
        None => {
            let pw = prompt_secret(&mut lines, "Password: ")?;
            let confirm = match confirm_password {
                Some(c) => c,
                None => prompt_secret(&mut lines, "Confirm password: ")?,
            };
            (pw, confirm)
        }
    };

    let store = open_store()?;
    let account = store
        .signup(&email, &name, &password, &confirm)
        .map_err(store_error)?;
    start_session(&store, &account.email, &password)?;

    if json {
        print_json(&account)?;
    }
    eprintln!("Created account for {} and logged in", account.email);
    Ok(())
}

pub fn cmd_login(email: String, password: Option<String>, json: bool) -> Result<(), CliError> {
    let password = match password {
        Some(pw) => pw,
        None => {
            let stdin = io::stdin();
            let mut lines = stdin.lock().lines();
            prompt_secret(&mut lines, "Password: ")?
        }
    };

    let store = open_store()?;
    let account = start_session(&store, &email, &password)?;

    if json {
        print_json(&account)?;
    }
    eprintln!("Logged in as {} ({})", account.full_name, account.email);
    Ok(())
}

pub fn cmd_logout() -> Result<(), CliError> {
    if let Some(token) = auth::current_token() {
        let store = open_store()?;
        store.logout(&token).map_err(store_error)?;
    }

    auth::delete().map_err(|e| CliError {
        code: EXIT_ERROR,
        message: e,
        hint: None,
    })?;

    if std::env::var_os(auth::TOKEN_ENV).is_some() {
        eprintln!("Logged out (session from {} revoked)", auth::TOKEN_ENV);
    } else {
        eprintln!("Logged out");
    }
    Ok(())
}

pub fn cmd_whoami(json: bool) -> Result<(), CliError> {
    let store = open_store()?;
    let account = require_account(&store)?;

    if json {
        print_json(&account)?;
    } else {
        println!("{} <{}>", account.full_name, account.email);
        if let Some(saved) = auth::load().filter(|s| s.email.as_deref() == Some(account.email.as_str())) {
            if let Some(expires) = saved.expires_at {
                println!("session expires {}", expires);
            }
        }
    }
    Ok(())
}
