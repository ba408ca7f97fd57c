use chrono::NaiveDateTime;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CommitmapError>;

#[derive(Error, Debug)]
pub enum CommitmapError {
    #[error("invalid window: start date {since} is later than end date {until}")]
    InvalidWindow {
        since: NaiveDateTime,
        until: NaiveDateTime,
    },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("GitHub API returned {status}: {body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("malformed commit record: {0}")]
    MalformedCommit(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("render error: {0}")]
    Render(String),
}
