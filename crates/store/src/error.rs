use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    /// SQLite failure (open, schema, query).
    Database(String),
    Io(String),
    /// A stored report or dataset could not be encoded or decoded.
    Serialization(String),
    /// bcrypt refused to hash the password.
    PasswordHash(String),
    InvalidEmail(String),
    MissingName,
    PasswordMismatch,
    PasswordTooShort { min: usize },
    EmailTaken(String),
    InvalidCredentials,
    /// Token unknown, logged out, or past its expiry.
    SessionInvalid,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(msg) => write!(f, "database error: {}", msg),
            StoreError::Io(msg) => write!(f, "I/O error: {}", msg),
            StoreError::Serialization(msg) => write!(f, "stored data is corrupt: {}", msg),
            StoreError::PasswordHash(msg) => write!(f, "password hashing failed: {}", msg),
            StoreError::InvalidEmail(email) => write!(f, "'{}' is not a valid email address", email),
            StoreError::MissingName => write!(f, "full name is required"),
            StoreError::PasswordMismatch => write!(f, "passwords do not match"),
            StoreError::PasswordTooShort { min } => {
                write!(f, "password must be at least {} characters", min)
            }
            StoreError::EmailTaken(email) => write!(f, "an account for {} already exists", email),
            StoreError::InvalidCredentials => write!(f, "invalid email or password"),
            StoreError::SessionInvalid => write!(f, "session is invalid or has expired"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl StoreError {
    /// Account-level failure the user can fix (as opposed to a broken store).
    pub fn is_account_error(&self) -> bool {
        !matches!(
            self,
            StoreError::Database(_)
                | StoreError::Io(_)
                | StoreError::Serialization(_)
                | StoreError::PasswordHash(_)
        )
    }
}
