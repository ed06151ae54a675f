//! Curriculum reference access.
//!
//! The reference-data collaborator is external; this module owns only the
//! lookup seam and a short-lived, bounded-TTL read-through cache. Reads hand
//! out `Arc` snapshots so concurrent callers never block each other on entry
//! data, and staleness inside the TTL window is tolerated.

use crate::error::PipelineError;
use crate::types::CurriculumEntry;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Normalized lookup key for curriculum entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurriculumKey {
    pub grade: String,
    pub subject: String,
    pub strand: String,
    pub substrand: String,
}

impl CurriculumKey {
    pub fn new(grade: &str, subject: &str, strand: &str, substrand: &str) -> Self {
        let norm = |s: &str| s.trim().to_lowercase();
        Self {
            grade: norm(grade),
            subject: norm(subject),
            strand: norm(strand),
            substrand: norm(substrand),
        }
    }
}

/// Term-shape settings served by the reference collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub lesson_duration_minutes: u32,
    pub lessons_per_week: u32,
    pub weeks_per_term: u32,
}

/// External curriculum reference collaborator.
#[async_trait]
pub trait CurriculumSource: Send + Sync {
    async fn lookup(
        &self,
        key: &CurriculumKey,
    ) -> Result<Option<CurriculumEntry>, PipelineError>;

    async fn generation_settings(&self) -> Result<GenerationSettings, PipelineError>;
}

/// Injectable clock so TTL behavior is testable without real waits.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock implementation used outside tests.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CacheSlot {
    entry: Arc<CurriculumEntry>,
    inserted_at: Instant,
}

/// Read-through cache over a [`CurriculumSource`].
///
/// Entries live for a bounded TTL. Expired slots are replaced on the next
/// read-through; `clear` drops everything eagerly.
pub struct CurriculumCache {
    source: Arc<dyn CurriculumSource>,
    slots: RwLock<HashMap<CurriculumKey, CacheSlot>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CurriculumCache {
    pub fn new(source: Arc<dyn CurriculumSource>, ttl: Duration) -> Self {
        Self::with_clock(source, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        source: Arc<dyn CurriculumSource>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            slots: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Fresh cached snapshot, if any.
    pub fn get(&self, key: &CurriculumKey) -> Option<Arc<CurriculumEntry>> {
        let slots = self.slots.read();
        let slot = slots.get(key)?;
        if self.clock.now().duration_since(slot.inserted_at) < self.ttl {
            Some(Arc::clone(&slot.entry))
        } else {
            None
        }
    }

    pub fn set(&self, key: CurriculumKey, entry: CurriculumEntry) {
        let mut slots = self.slots.write();
        slots.insert(
            key,
            CacheSlot {
                entry: Arc::new(entry),
                inserted_at: self.clock.now(),
            },
        );
    }

    pub fn clear(&self) {
        self.slots.write().clear();
    }

    /// Read-through lookup: serve a fresh cached snapshot or fall through to
    /// the source and cache the result.
    pub async fn fetch(
        &self,
        key: &CurriculumKey,
    ) -> Result<Option<Arc<CurriculumEntry>>, PipelineError> {
        if let Some(entry) = self.get(key) {
            tracing::debug!(grade = %key.grade, strand = %key.strand, "curriculum cache hit");
            return Ok(Some(entry));
        }

        let fetched = self.source.lookup(key).await?;
        match fetched {
            Some(entry) => {
                self.set(key.clone(), entry.clone());
                Ok(Some(Arc::new(entry)))
            }
            None => Ok(None),
        }
    }

    pub async fn generation_settings(&self) -> Result<GenerationSettings, PipelineError> {
        self.source.generation_settings().await
    }
}

/// In-memory curriculum source backing tests and the CLI demo path.
pub struct InMemoryCurriculumSource {
    entries: RwLock<HashMap<CurriculumKey, CurriculumEntry>>,
    settings: GenerationSettings,
    pub lookup_count: std::sync::atomic::AtomicU32,
}

impl InMemoryCurriculumSource {
    pub fn new(settings: GenerationSettings) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            settings,
            lookup_count: std::sync::atomic::AtomicU32::new(0),
        }
    }

    pub fn insert(&self, key: CurriculumKey, entry: CurriculumEntry) {
        self.entries.write().insert(key, entry);
    }

    pub fn lookups(&self) -> u32 {
        self.lookup_count.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl CurriculumSource for InMemoryCurriculumSource {
    async fn lookup(
        &self,
        key: &CurriculumKey,
    ) -> Result<Option<CurriculumEntry>, PipelineError> {
        self.lookup_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.entries.read().get(key).cloned())
    }

    async fn generation_settings(&self) -> Result<GenerationSettings, PipelineError> {
        Ok(self.settings.clone())
    }
}
