use crate::{
    CatalogError, EnrichmentError, FileListing, FileRecord, NewFile, PendingSummary, SearchHit,
};
use async_trait::async_trait;

pub trait FileCatalog {
    fn upsert_file(&self, file: &NewFile) -> Result<i64, CatalogError>;

    fn list_files(&self, limit: usize) -> Result<Vec<FileListing>, CatalogError>;

    fn search_files(&self, query: &str) -> Result<Vec<SearchHit>, CatalogError>;

    fn pending_summaries(&self, limit: usize) -> Result<Vec<PendingSummary>, CatalogError>;

    fn update_summary(
        &self,
        id: i64,
        summary: &str,
        category: Option<&str>,
    ) -> Result<(), CatalogError>;

    /// Marks a failed summary attempt so the record sorts behind untried ones.
    fn record_summary_failure(&self, id: i64) -> Result<(), CatalogError>;

    fn get_file(&self, id: i64) -> Result<Option<FileRecord>, CatalogError>;
}

/// Text-generation capability used to enrich catalog records.
#[async_trait]
pub trait Enricher {
    async fn summarize(&self, text: &str) -> Result<String, EnrichmentError>;

    /// Picks exactly one label. An empty `labels` slice means the default vocabulary.
    async fn classify(&self, text: &str, labels: &[String]) -> Result<String, EnrichmentError>;
}
