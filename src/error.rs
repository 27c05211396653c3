use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
