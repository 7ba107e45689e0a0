use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("docx parse error: {0}")]
    DocxParse(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("no catalog record with id {0}")]
    NotFound(i64),
}

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("missing provider credential: {0}")]
    MissingCredential(String),

    #[error("invalid provider url: {0}")]
    Url(#[from] url::ParseError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("provider returned no text")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid index root: {0}")]
    InvalidRoot(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
