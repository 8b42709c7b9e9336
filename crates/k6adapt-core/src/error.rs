use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdaptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("found {count} matching export clauses, refusing to rewrite")]
    AmbiguousMatch { count: usize },

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AdaptError>;
