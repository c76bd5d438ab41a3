use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum PerfdashError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Route pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The upstream rejected the stored credentials. The token has already
    /// been cleared; `redirect` names the authentication entry point.
    #[error("Unauthorized: sign in again at {redirect}")]
    Unauthorized { redirect: String },

    /// A non-success status other than 401 on a typed call.
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Handler error: {0}")]
    Handler(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Serialize for PerfdashError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
