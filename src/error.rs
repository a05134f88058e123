use thiserror::Error;

/// Everything that can go wrong between "we have a shared URL" and "we have
/// normalized records". One candidate URL failing with any of these moves the
/// pipeline on to the next candidate; `Exhausted` is what surfaces once there
/// are no candidates left.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("HTTP {status} from {url}: content-type={content_type}. {snippet}")]
    Fetch {
        url: String,
        status: u16,
        content_type: String,
        /// First 200 characters of the response body, for diagnostics only.
        snippet: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Payload is not data at all (an HTML error page) or an archive with
    /// nothing usable inside.
    #[error("{0}")]
    Format(String),

    #[error("workbook parse error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("all download candidates failed; last error: {0}")]
    Exhausted(#[source] Box<IngestError>),
}

impl IngestError {
    pub fn exhausted(last: IngestError) -> Self {
        IngestError::Exhausted(Box::new(last))
    }
}
