pub mod catalog;
pub mod enrichment;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod traits;

pub use catalog::{SqliteCatalog, DEFAULT_CATALOG_PATH};
pub use enrichment::{
    active_labels, match_label, truncate_chars, EnrichmentConfig, OpenAiEnricher,
    CLASSIFY_INPUT_CHARS, DEFAULT_LABELS, SUMMARY_INPUT_CHARS,
};
pub use error::{CatalogError, EnrichmentError, ExtractError, IndexError};
pub use extractor::{ExtractorKind, FileExtractor, FormatExtractor};
pub use ingest::{discover_files, index_directory};
pub use models::{
    FileListing, FileRecord, IndexOptions, NewFile, PendingSummary, SearchHit, SummaryFailure,
    SummaryReport,
};
pub use orchestrator::{EnrichmentCoordinator, EnrichmentOptions};
pub use traits::{Enricher, FileCatalog};
