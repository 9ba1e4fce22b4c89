//! Paper generation pipeline
//!
//! query → search → prompt → generate → extract → validate → persist.
//! Single-shot and strictly linear: the first failing step aborts the run
//! with its own error and nothing downstream is invoked.

mod prompt;

pub use prompt::{build_prompt, build_query};

use crate::db::PaperStore;
use crate::errors::Result;
use crate::extract;
use crate::generation::GenerationProvider;
use crate::metrics;
use crate::paper::{GeneratedPaper, GenerationRequest};
use crate::search::SearchProvider;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Result of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    /// Id of the persisted paper record
    pub record_id: Uuid,

    #[serde(flatten)]
    pub paper: GeneratedPaper,
}

/// Orchestrates one generation per `run` call
pub struct PaperPipeline {
    search: Arc<dyn SearchProvider>,
    generator: Arc<dyn GenerationProvider>,
    store: Arc<dyn PaperStore>,
}

impl PaperPipeline {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        generator: Arc<dyn GenerationProvider>,
        store: Arc<dyn PaperStore>,
    ) -> Self {
        Self {
            search,
            generator,
            store,
        }
    }

    /// Run the whole pipeline for one request
    pub async fn run(&self, request: &GenerationRequest) -> Result<GenerationOutcome> {
        let span = tracing::info_span!(
            "generate_paper",
            owner_id = %request.owner_id(),
            topic = %request.topic(),
            model = %self.generator.model_name(),
        );

        let start = Instant::now();
        let result = self.run_steps(request).instrument(span).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(outcome) => {
                metrics::record_generation(elapsed, "success");
                tracing::info!(
                    record_id = %outcome.record_id,
                    sections = outcome.paper.sections.len(),
                    references = outcome.paper.references.len(),
                    elapsed_secs = elapsed,
                    "Paper generated"
                );
            }
            Err(e) => {
                let code = e.code();
                metrics::record_generation(elapsed, &format!("{:?}", code));
                tracing::warn!(error = %e, code = ?code, class = ?e.failure_class(), "Paper generation failed");
            }
        }

        result
    }

    async fn run_steps(&self, request: &GenerationRequest) -> Result<GenerationOutcome> {
        let query = build_query(request);
        let results = self.search.search(&query).await?;
        let context = results.to_context();
        tracing::debug!(hits = results.len(), context_chars = context.len(), "Search context built");

        let prompt = build_prompt(request, &context);
        let raw = self.generator.generate(&prompt).await?;

        let object = extract::extract(&raw)?;
        let paper = GeneratedPaper::from_json_object(&object)?;

        let record_id = self.store.create_paper(request.owner_id(), &paper).await?;

        Ok(GenerationOutcome { record_id, paper })
    }
}
