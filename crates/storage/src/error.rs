use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Policy(#[from] policy::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<Error> for host::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(what) => host::Error::NotFound(what),
            other => host::Error::backend(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
