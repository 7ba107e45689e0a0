use crate::enrichment::{active_labels, match_label};
use crate::traits::{Enricher, FileCatalog};
use crate::{CatalogError, PendingSummary, SummaryFailure, SummaryReport};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct EnrichmentOptions {
    /// Also assign a category to every summarized record.
    pub classify: bool,
    /// Closed label vocabulary for classification; empty means the default set.
    pub labels: Vec<String>,
}

pub struct EnrichmentCoordinator<E>
where
    E: Enricher,
{
    enricher: E,
    options: EnrichmentOptions,
}

impl<E> EnrichmentCoordinator<E>
where
    E: Enricher + Send + Sync,
{
    pub fn new(enricher: E) -> Self {
        Self::with_options(enricher, EnrichmentOptions::default())
    }

    pub fn with_options(enricher: E, options: EnrichmentOptions) -> Self {
        Self { enricher, options }
    }

    pub fn enricher(&self) -> &E {
        &self.enricher
    }

    /// Summarizes up to `limit` records that have no summary yet.
    ///
    /// Records are processed one at a time. A provider failure is recorded in
    /// the report and against the record, which moves it behind records that
    /// have not failed yet; catalog failures end the batch.
    pub async fn summarize_pending<C>(
        &self,
        catalog: &C,
        limit: usize,
    ) -> Result<SummaryReport, CatalogError>
    where
        C: FileCatalog + ?Sized,
    {
        let pending = catalog.pending_summaries(limit)?;
        let mut report = SummaryReport {
            requested: pending.len(),
            ..SummaryReport::default()
        };

        if pending.is_empty() {
            info!("nothing to summarize");
            return Ok(report);
        }

        info!(pending = pending.len(), "summarizing pending files");

        for item in pending {
            let summary = match self.enricher.summarize(&item.content).await {
                Ok(summary) => summary,
                Err(error) => {
                    warn!(id = item.id, %error, "summary failed");
                    catalog.record_summary_failure(item.id)?;
                    report.failures.push(SummaryFailure {
                        id: item.id,
                        reason: error.to_string(),
                    });
                    continue;
                }
            };

            let category = self.category_for(&item, &mut report).await;
            catalog.update_summary(item.id, &summary, category.as_deref())?;

            report.summarized += 1;
            if category.is_some() {
                report.classified += 1;
            }
        }

        info!(
            summarized = report.summarized,
            failed = report.failures.len(),
            "summaries saved"
        );
        Ok(report)
    }

    async fn category_for(
        &self,
        item: &PendingSummary,
        report: &mut SummaryReport,
    ) -> Option<String> {
        if !self.options.classify {
            return None;
        }

        match self
            .enricher
            .classify(&item.content, &self.options.labels)
            .await
        {
            Ok(answer) => {
                let label = match_label(&answer, &self.options.labels).or_else(|| {
                    match_label("other", &self.options.labels)
                });
                if label.is_none() {
                    let allowed = active_labels(&self.options.labels).join(", ");
                    warn!(id = item.id, answer = %answer.trim(), "label outside vocabulary");
                    report.failures.push(SummaryFailure {
                        id: item.id,
                        reason: format!(
                            "classification: '{}' is not one of {allowed}",
                            answer.trim()
                        ),
                    });
                }
                label
            }
            Err(error) => {
                warn!(id = item.id, %error, "classification failed, keeping summary only");
                report.failures.push(SummaryFailure {
                    id: item.id,
                    reason: format!("classification: {error}"),
                });
                None
            }
        }
    }
}
