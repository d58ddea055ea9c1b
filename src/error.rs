use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} responded with {status}")]
    Status { url: String, status: StatusCode },

    #[error("malformed listing envelope: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("date arithmetic failed: {0}")]
    Date(#[from] jiff::Error),
}

impl AppError {
    /// True for failures of the fetch itself rather than of anything we did with the body.
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Http(_) | AppError::Status { .. })
    }
}

pub type AppResult<T> = Result<T, AppError>;
