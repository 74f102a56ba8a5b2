// Accounts and sessions

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::error::StoreError;
use crate::password;
use crate::{timestamp, Store};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const SESSION_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub expires_at: String,
    pub account: Account,
}

fn normalize_email(email: &str) -> Result<String, StoreError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.') =>
        {
            Ok(email)
        }
        _ => Err(StoreError::InvalidEmail(email)),
    }
}

impl Store {
    pub fn signup(
        &self,
        email: &str,
        full_name: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Account, StoreError> {
        let email = normalize_email(email)?;
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(StoreError::MissingName);
        }
        if password != confirm_password {
            return Err(StoreError::PasswordMismatch);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(StoreError::PasswordTooShort { min: MIN_PASSWORD_LEN });
        }

        let taken: Option<String> = self
            .conn
            .query_row("SELECT id FROM users WHERE email = ?1", params![email], |row| row.get(0))
            .optional()?;
        if taken.is_some() {
            return Err(StoreError::EmailTaken(email));
        }

        let account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            full_name: full_name.to_string(),
            created_at: timestamp(Utc::now()),
        };

        self.conn.execute(
            "INSERT INTO users (id, email, full_name, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                account.id,
                account.email,
                account.full_name,
                password::hash(password)?,
                account.created_at,
            ],
        )?;

        log::info!("created account {}", account.email);
        Ok(account)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Session, StoreError> {
        self.login_at(email, password, Utc::now())
    }

    fn login_at(&self, email: &str, password: &str, now: DateTime<Utc>) -> Result<Session, StoreError> {
        // Malformed addresses get the same answer as unknown ones
        let email = normalize_email(email).map_err(|_| StoreError::InvalidCredentials)?;

        let row = self
            .conn
            .query_row(
                "SELECT id, email, full_name, created_at, password_hash
                 FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok((
                        Account {
                            id: row.get(0)?,
                            email: row.get(1)?,
                            full_name: row.get(2)?,
                            created_at: row.get(3)?,
                        },
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((account, stored_hash)) = row else {
            return Err(StoreError::InvalidCredentials);
        };
        if !password::verify(password, &stored_hash) {
            log::debug!("password mismatch for {}", account.email);
            return Err(StoreError::InvalidCredentials);
        }

        let session = Session {
            token: password::new_token(),
            expires_at: timestamp(now + Duration::days(SESSION_DAYS)),
            account,
        };
        self.conn.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![session.token, session.account.id, timestamp(now), session.expires_at],
        )?;

        Ok(session)
    }

    /// Forget the session. Unknown tokens are not an error.
    pub fn logout(&self, token: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(())
    }

    /// Resolve a session token to its account.
    pub fn authenticate(&self, token: &str) -> Result<Account, StoreError> {
        self.authenticate_at(token, Utc::now())
    }

    fn authenticate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Account, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT u.id, u.email, u.full_name, u.created_at, s.expires_at
                 FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?1",
                params![token],
                |row| {
                    Ok((
                        Account {
                            id: row.get(0)?,
                            email: row.get(1)?,
                            full_name: row.get(2)?,
                            created_at: row.get(3)?,
                        },
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((account, expires_at)) = row else {
            return Err(StoreError::SessionInvalid);
        };

        if expires_at <= timestamp(now) {
            self.conn
                .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
            return Err(StoreError::SessionInvalid);
        }

        Ok(account)
    }
}
