#[derive(Debug, thiserror::Error)]
pub enum CrawlerError {
    #[error("Database error")]
    DatabaseError(#[from] sqlx::error::Error),

    #[error("HTTP request failed")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid url")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Page {page} returned HTTP {status}")]
    FetchStatus { page: u32, status: u16 },

    #[error("No listing container on page {page}")]
    ContainerNotFound { page: u32 },

    #[error("Record already exists: {link}")]
    StoreConflict { link: String },

    #[error("Notification delivery failed: {0}")]
    Notification(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Why an ad node did not become a candidate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("region mismatch ({region:?} / {sub_region:?})")]
    RegionMismatch { region: String, sub_region: String },

    #[error("missing title or link")]
    MissingTitleOrLink,
}
