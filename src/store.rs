//! Document persistence seam.
//!
//! The pipeline never talks to a concrete database; it goes through
//! [`DocumentStore`], which the host application implements. The in-memory
//! store here backs tests and the CLI demo path.

use crate::error::PipelineError;
use crate::types::{DocumentId, GeneratedDocument};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Persistence operations the pipeline needs. Insert and get are whole-record;
/// the two mutators patch a stored record in place.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new document and return its assigned id.
    async fn insert(&self, document: GeneratedDocument) -> Result<DocumentId, PipelineError>;

    async fn get(&self, id: &DocumentId) -> Result<Option<GeneratedDocument>, PipelineError>;

    /// Append a child reference to an existing document.
    async fn add_child_reference(
        &self,
        parent: &DocumentId,
        child: &DocumentId,
    ) -> Result<(), PipelineError>;

    /// Replace the stored content of an existing document.
    async fn update_content(
        &self,
        id: &DocumentId,
        content: &str,
    ) -> Result<(), PipelineError>;
}

/// HashMap-backed store for tests and demos. Ids are monotonic within the
/// process.
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<DocumentId, GeneratedDocument>>,
    sequence: AtomicU64,
    /// When set, the next add_child_reference call fails. Lets tests exercise
    /// the partial-success linking path.
    pub fail_next_link: std::sync::atomic::AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
            fail_next_link: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    fn next_id(&self) -> DocumentId {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let millis = chrono::Utc::now().timestamp_millis();
        DocumentId::new(format!("doc-{millis}-{seq}"))
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, mut document: GeneratedDocument) -> Result<DocumentId, PipelineError> {
        let id = self.next_id();
        document.id = id.clone();
        self.documents.write().insert(id.clone(), document);
        Ok(id)
    }

    async fn get(&self, id: &DocumentId) -> Result<Option<GeneratedDocument>, PipelineError> {
        Ok(self.documents.read().get(id).cloned())
    }

    async fn add_child_reference(
        &self,
        parent: &DocumentId,
        child: &DocumentId,
    ) -> Result<(), PipelineError> {
        if self.fail_next_link.swap(false, Ordering::SeqCst) {
            return Err(PipelineError::StoreError(
                "simulated link write failure".to_string(),
            ));
        }
        let mut documents = self.documents.write();
        let record = documents
            .get_mut(parent)
            .ok_or_else(|| PipelineError::NotFound(parent.clone()))?;
        if !record.child_documents.contains(child) {
            record.child_documents.push(child.clone());
        }
        Ok(())
    }

    async fn update_content(
        &self,
        id: &DocumentId,
        content: &str,
    ) -> Result<(), PipelineError> {
        let mut documents = self.documents.write();
        let record = documents
            .get_mut(id)
            .ok_or_else(|| PipelineError::NotFound(id.clone()))?;
        record.content = content.to_string();
        Ok(())
    }
}
