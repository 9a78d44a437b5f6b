use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChooserError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("unknown group: {0}")]
    UnknownGroup(String),
    #[error("duplicate column id in metadata: {0}")]
    DuplicateColumn(String),
    #[error("malformed drag payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] toml::de::Error),
}
