/// Errors raised by the inventory service and its remote collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    /// The spreadsheet service answered `{success: false, error}`.
    #[error("{0}")]
    Remote(String),

    #[error("decode: {0}")]
    Decode(String),

    #[error("product not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("a scan is already in progress")]
    Busy,

    #[error("ai: {0}")]
    Ai(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("export: {0}")]
    Export(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
