//! Pipeline facade.
//!
//! [`GenerationPipeline`] wires the collaborators together: curriculum lookup
//! with its cache, prompt construction, the orchestrated model call, concept
//! extraction, linking, and rendering. Host applications construct one
//! pipeline per provider and call it from their own request handlers.

use crate::config::GenerationConfig;
use crate::curriculum::{CurriculumCache, CurriculumKey, CurriculumSource};
use crate::error::PipelineError;
use crate::linker::DocumentLinker;
use crate::orchestrator::{resolve_request, GenerationOrchestrator};
use crate::prompt::PromptRegistry;
use crate::provider::CompletionClient;
use crate::store::DocumentStore;
use crate::table::{RenderedTable, TableRenderer};
use crate::types::{
    ConceptRecord, CurriculumEntry, DocumentId, DocumentType, GeneratedDocument,
    GenerationRequest, LessonDetail,
};
use crate::visual::{select_visual_concepts, ConceptScorer, SelectedConcept};
use std::sync::Arc;
use std::time::Duration;

pub struct GenerationPipeline {
    config: GenerationConfig,
    registry: PromptRegistry,
    orchestrator: GenerationOrchestrator,
    linker: DocumentLinker,
    curriculum: CurriculumCache,
    renderer: TableRenderer,
    client: Arc<dyn CompletionClient>,
    store: Arc<dyn DocumentStore>,
}

impl GenerationPipeline {
    pub fn new(
        config: GenerationConfig,
        client: Arc<dyn CompletionClient>,
        source: Arc<dyn CurriculumSource>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let orchestrator = GenerationOrchestrator::new(&config);
        let linker = DocumentLinker::new(config.min_concept_length);
        let curriculum =
            CurriculumCache::new(source, Duration::from_secs(config.cache_ttl_secs));
        Self {
            config,
            registry: PromptRegistry::with_defaults(),
            orchestrator,
            linker,
            curriculum,
            renderer: TableRenderer::new(),
            client,
            store,
        }
    }

    /// Generate and persist a standalone document of the given type.
    pub async fn generate(
        &self,
        doc_type: DocumentType,
        request: &GenerationRequest,
    ) -> Result<GeneratedDocument, PipelineError> {
        let entry = self.entry_for(request).await?;
        let resolved = resolve_request(request, &entry, &self.config)?;
        let builder = self
            .registry
            .get(doc_type)
            .ok_or_else(|| PipelineError::InvalidRequest(format!("no builder for {doc_type}")))?;

        let outcome = self
            .orchestrator
            .generate(self.client.as_ref(), builder, &resolved, &entry)
            .await;

        let document = GeneratedDocument {
            id: DocumentId::new("unassigned"),
            doc_type,
            term: resolved.term.clone(),
            grade: resolved.grade.clone(),
            subject: resolved.learning_area.clone(),
            strand: resolved.strand.clone(),
            substrand: resolved.substrand.clone(),
            content: outcome.content,
            parent_document: None,
            child_documents: Vec::new(),
            lesson_details: None,
            status: outcome.status,
            metadata: outcome.metadata,
            created_at: chrono::Utc::now(),
        };
        self.linker.persist_linked(self.store.as_ref(), document).await
    }

    /// Derive a document from a persisted concept breakdown: re-extract its
    /// concepts, pin them into the prompt, and link the result back.
    pub async fn derive(
        &self,
        source_id: &DocumentId,
        doc_type: DocumentType,
        request: &GenerationRequest,
    ) -> Result<GeneratedDocument, PipelineError> {
        if doc_type == DocumentType::ConceptBreakdown {
            return Err(PipelineError::InvalidRequest(
                "a concept breakdown cannot be derived from itself".to_string(),
            ));
        }

        let source = self.linker.load_source(self.store.as_ref(), source_id).await?;

        let derived_request = GenerationRequest {
            grade: source.grade.clone(),
            learning_area: source.subject.clone(),
            strand: source.strand.clone(),
            substrand: source.substrand.clone(),
            term: Some(source.term.clone()),
            concepts: None,
            ..request.clone()
        };

        let entry = self.entry_for(&derived_request).await?;
        let mut resolved = resolve_request(&derived_request, &entry, &self.config)?;

        // The resolved target row count is also the ceiling on extracted
        // concepts; a derived table then carries one row per concept.
        let concepts = self
            .linker
            .extract_concepts(&source, Some(resolved.target_rows as usize))?;
        resolved.target_rows = concepts.len() as u32;
        resolved.concepts = Some(concepts.clone());

        let builder = self
            .registry
            .get(doc_type)
            .ok_or_else(|| PipelineError::InvalidRequest(format!("no builder for {doc_type}")))?;

        let outcome = self
            .orchestrator
            .generate(self.client.as_ref(), builder, &resolved, &entry)
            .await;

        let document = GeneratedDocument {
            id: DocumentId::new("unassigned"),
            doc_type,
            term: resolved.term.clone(),
            grade: resolved.grade.clone(),
            subject: resolved.learning_area.clone(),
            strand: resolved.strand.clone(),
            substrand: resolved.substrand.clone(),
            content: outcome.content,
            parent_document: Some(source_id.clone()),
            child_documents: Vec::new(),
            lesson_details: Some(lesson_details(&concepts)),
            status: outcome.status,
            metadata: outcome.metadata,
            created_at: chrono::Utc::now(),
        };
        self.linker.persist_linked(self.store.as_ref(), document).await
    }

    /// Score and select up to `k` concepts from a breakdown for visual
    /// treatment.
    pub async fn select_visual_concepts(
        &self,
        source_id: &DocumentId,
        k: usize,
    ) -> Result<Vec<SelectedConcept>, PipelineError> {
        let (source, concepts) = self
            .linker
            .load_source_concepts(self.store.as_ref(), source_id)
            .await?;

        let key = CurriculumKey::new(
            &source.grade,
            &source.subject,
            &source.strand,
            &source.substrand,
        );
        let entry = self.curriculum.fetch(&key).await?;
        let scorer = ConceptScorer::new(&source.subject, entry.as_deref());
        Ok(select_visual_concepts(&concepts, k, &scorer))
    }

    /// Reconstruct the stored document as an HTML table.
    pub async fn render_html(&self, id: &DocumentId) -> Result<RenderedTable, PipelineError> {
        let document = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(id.clone()))?;
        Ok(self.renderer.render(document.doc_type, &document.content)?)
    }

    pub async fn get_document(
        &self,
        id: &DocumentId,
    ) -> Result<GeneratedDocument, PipelineError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(id.clone()))
    }

    /// Curriculum entry for the request, or a minimal entry synthesized from
    /// the request fields when the reference has no match. Generation always
    /// proceeds; the prompt sections fall back to generic defaults.
    async fn entry_for(
        &self,
        request: &GenerationRequest,
    ) -> Result<CurriculumEntry, PipelineError> {
        let key = CurriculumKey::new(
            &request.grade,
            &request.learning_area,
            &request.strand,
            &request.substrand,
        );
        match self.curriculum.fetch(&key).await? {
            Some(entry) => Ok((*entry).clone()),
            None => {
                tracing::warn!(
                    grade = %request.grade,
                    strand = %request.strand,
                    substrand = %request.substrand,
                    "no curriculum entry found, generating from request fields only"
                );
                Ok(CurriculumEntry {
                    grade: request.grade.clone(),
                    learning_area: request.learning_area.clone(),
                    strand: request.strand.clone(),
                    substrand: request.substrand.clone(),
                    specific_learning_outcomes: Vec::new(),
                    learning_experiences: Vec::new(),
                    key_inquiry_questions: Vec::new(),
                    resources: Vec::new(),
                    assessments: Vec::new(),
                    reflection_notes: None,
                    lesson_count: None,
                })
            }
        }
    }
}

/// Week/lesson numbering for derived documents: lessons count up within each
/// week, in extraction order.
fn lesson_details(concepts: &[ConceptRecord]) -> Vec<LessonDetail> {
    let mut details = Vec::with_capacity(concepts.len());
    let mut current_week = 0u32;
    let mut lesson_in_week = 0u32;

    for record in concepts {
        let week = record.week_ordinal().unwrap_or(current_week.max(1));
        if week != current_week {
            current_week = week;
            lesson_in_week = 0;
        }
        lesson_in_week += 1;
        details.push(LessonDetail {
            week,
            lesson: lesson_in_week,
            concept: record.concept.clone(),
        });
    }
    details
}
