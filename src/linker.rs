//! Parent/child document linking.
//!
//! Derivation starts from a persisted concept breakdown and ends with a new
//! document linked back to it. The link is written in two steps with no
//! transaction: the new document is inserted first, then the parent's child
//! list is patched. A failed second step never rolls back the first; the
//! document survives with a recorded link warning.

use crate::error::PipelineError;
use crate::store::DocumentStore;
use crate::table::{normalize, ConceptDefaults, ConceptExtractor};
use crate::types::{ConceptRecord, DocumentId, DocumentType, GeneratedDocument};

pub struct DocumentLinker {
    extractor: ConceptExtractor,
}

impl DocumentLinker {
    pub fn new(min_concept_length: usize) -> Self {
        Self {
            extractor: ConceptExtractor::new(min_concept_length),
        }
    }

    /// Load a stored document and verify it is a concept breakdown.
    pub async fn load_source(
        &self,
        store: &dyn DocumentStore,
        id: &DocumentId,
    ) -> Result<GeneratedDocument, PipelineError> {
        let document = store
            .get(id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(id.clone()))?;

        if document.doc_type != DocumentType::ConceptBreakdown {
            return Err(PipelineError::WrongSourceType {
                id: id.clone(),
                expected: DocumentType::ConceptBreakdown,
                actual: document.doc_type,
            });
        }
        Ok(document)
    }

    /// Re-extract concept records from a loaded source document.
    ///
    /// Stored content may carry rows the model wrapped across physical lines,
    /// so it is normalized before extraction. `max_records` caps the result
    /// at the declared lesson count when the caller knows it. Extraction runs
    /// against stored content every time rather than caching records at
    /// creation; content may have been patched since.
    pub fn extract_concepts(
        &self,
        document: &GeneratedDocument,
        max_records: Option<usize>,
    ) -> Result<Vec<ConceptRecord>, PipelineError> {
        let defaults = ConceptDefaults {
            term: document.term.clone(),
            strand: document.strand.clone(),
            substrand: document.substrand.clone(),
        };
        let normalized = normalize(
            &document.content,
            document.doc_type.expected_columns(),
        );
        let concepts = match max_records {
            Some(max) => self.extractor.extract_bounded(&normalized, &defaults, max),
            None => self.extractor.extract(&normalized, &defaults),
        };
        if concepts.is_empty() {
            return Err(PipelineError::NoConceptsFound(document.id.clone()));
        }

        tracing::debug!(
            source = %document.id,
            concepts = concepts.len(),
            "extracted concepts from source document"
        );
        Ok(concepts)
    }

    /// Convenience for callers with no row bound: load and extract in one
    /// step.
    pub async fn load_source_concepts(
        &self,
        store: &dyn DocumentStore,
        id: &DocumentId,
    ) -> Result<(GeneratedDocument, Vec<ConceptRecord>), PipelineError> {
        let document = self.load_source(store, id).await?;
        let concepts = self.extract_concepts(&document, None)?;
        Ok((document, concepts))
    }

    /// Persist a derived document and link it under its parent.
    ///
    /// Partial-success policy: if the parent patch fails after the insert,
    /// the error is logged and returned on the document's metadata as a link
    /// warning, never as a hard failure.
    pub async fn persist_linked(
        &self,
        store: &dyn DocumentStore,
        mut document: GeneratedDocument,
    ) -> Result<GeneratedDocument, PipelineError> {
        let parent = document.parent_document.clone();
        let id = store.insert(document.clone()).await?;
        document.id = id.clone();

        if let Some(parent_id) = parent {
            if let Err(e) = store.add_child_reference(&parent_id, &id).await {
                let e = PipelineError::LinkPersistence(e.to_string());
                tracing::error!(
                    document = %id,
                    parent = %parent_id,
                    error = %e,
                    "document persisted but parent link failed"
                );
                document.metadata.link_warning = Some(format!(
                    "document {id} saved but not linked under {parent_id}: {e}"
                ));
            }
        }

        Ok(document)
    }
}
