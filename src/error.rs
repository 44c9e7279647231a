use thiserror::Error;

use crate::profile::Difficulty;

/// Refusals from the exercise controller. None of them are fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrainerError {
    /// `start` was called without a connected wallet.
    #[error("connect a wallet before starting a session")]
    IdentityRequired,

    /// The schedule cannot change while a session is ticking.
    #[error("pause or reset before switching to {0}")]
    DifficultyLocked(Difficulty),
}

/// Failures while writing or reading training records.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("training database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The payload is missing data the store requires.
    #[error("invalid training record: {0}")]
    InvalidSession(String),

    /// The recorder could not be reached at all.
    #[error("recorder unavailable: {0}")]
    Unavailable(String),

    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A wallet address that cannot be used as a user identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("wallet address must be 32-44 characters, got {0}")]
    Length(usize),

    #[error("wallet address contains non-base58 character {0:?}")]
    InvalidCharacter(char),
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trainer_error_display() {
        assert_eq!(
            TrainerError::IdentityRequired.to_string(),
            "connect a wallet before starting a session"
        );
        assert_eq!(
            TrainerError::DifficultyLocked(Difficulty::Advanced).to_string(),
            "pause or reset before switching to advanced"
        );
    }

    #[test]
    fn test_record_error_from_sqlite() {
        let err: RecordError = rusqlite::Error::InvalidQuery.into();
        assert!(err.to_string().starts_with("training database error"));
    }

    #[test]
    fn test_identity_error_display() {
        let msg = IdentityError::InvalidCharacter('0').to_string();
        assert!(msg.contains("'0'"));
    }
}
