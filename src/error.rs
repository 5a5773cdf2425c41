use thiserror::Error;

#[derive(Error, Debug)]
pub enum TodoError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for TodoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TodoError::Decode(err.to_string())
        } else {
            TodoError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, TodoError>;
