//! Generation orchestration: request resolution, the retry/timeout loop
//! around the model call, and the deterministic fallback that guarantees a
//! document exists even when the model never cooperates.

use crate::config::GenerationConfig;
use crate::error::PipelineError;
use crate::prompt::{column_names, PromptBuilder};
use crate::provider::{CompletionClient, CompletionOptions};
use crate::types::{
    CurriculumEntry, DocumentStatus, GenerationMetadata, GenerationRequest, ResolvedRequest,
};
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Retry knobs lifted out of [`GenerationConfig`] so tests can shrink them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// Injectable sleep so retry tests run without real delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Result of one orchestrated generation call. Always carries content; the
/// status and metadata say whether it came from the model or the fallback.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub content: String,
    pub status: DocumentStatus,
    pub metadata: GenerationMetadata,
}

/// Fill every optional request field from the curriculum entry or configured
/// defaults, and fix the canonical target row count.
///
/// Row count precedence: explicit weeks and lessons-per-week on the request,
/// then the entry's declared lesson count, then the configured term shape.
pub fn resolve_request(
    request: &GenerationRequest,
    entry: &CurriculumEntry,
    config: &GenerationConfig,
) -> Result<ResolvedRequest, PipelineError> {
    for (field, value) in [
        ("grade", &request.grade),
        ("learning_area", &request.learning_area),
        ("strand", &request.strand),
        ("substrand", &request.substrand),
    ] {
        if value.trim().is_empty() {
            return Err(PipelineError::InvalidRequest(format!(
                "{field} must not be empty"
            )));
        }
    }

    let weeks = request.weeks.filter(|w| *w > 0);
    let lessons_per_week = request.lessons_per_week.filter(|l| *l > 0);

    let target_rows = match (weeks, lessons_per_week) {
        (Some(w), Some(l)) => w * l,
        _ => entry
            .lesson_count
            .filter(|c| *c > 0)
            .unwrap_or(config.weeks_per_term * config.lessons_per_week),
    };

    Ok(ResolvedRequest {
        school: request
            .school
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "School".to_string()),
        teacher_name: request
            .teacher_name
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Teacher".to_string()),
        grade: request.grade.clone(),
        learning_area: request.learning_area.clone(),
        strand: request.strand.clone(),
        substrand: request.substrand.clone(),
        term: request
            .term
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Term 1".to_string()),
        weeks: weeks.unwrap_or(config.weeks_per_term),
        lessons_per_week: lessons_per_week.unwrap_or(config.lessons_per_week),
        target_rows,
        concepts: request.concepts.clone(),
    })
}

/// Drives the model call with a hard timeout, bounded retries, and a
/// templated fallback once attempts are exhausted.
pub struct GenerationOrchestrator {
    policy: RetryPolicy,
    timeout: Duration,
    min_response_length: usize,
    sleeper: Box<dyn Sleeper>,
}

impl GenerationOrchestrator {
    pub fn new(config: &GenerationConfig) -> Self {
        Self::with_sleeper(config, Box::new(TokioSleeper))
    }

    pub fn with_sleeper(config: &GenerationConfig, sleeper: Box<dyn Sleeper>) -> Self {
        Self {
            policy: RetryPolicy::from_config(config),
            timeout: Duration::from_secs(config.model_timeout_secs),
            min_response_length: config.min_response_length,
            sleeper,
        }
    }

    /// Run one generation. Never fails: if every attempt errors, times out,
    /// or returns junk, the outcome is the templated fallback document with
    /// status [`DocumentStatus::Partial`].
    pub async fn generate(
        &self,
        client: &dyn CompletionClient,
        builder: &dyn PromptBuilder,
        request: &ResolvedRequest,
        entry: &CurriculumEntry,
    ) -> GenerationOutcome {
        let system = builder.system_instruction();
        let prompt = builder.build(request, entry);
        let options = CompletionOptions::default();
        let started = Instant::now();

        let mut attempts = 0;
        while attempts < self.policy.max_attempts {
            attempts += 1;
            match self.attempt(client, system, &prompt, &options).await {
                Ok((content, model)) => {
                    let quality = quality_score(&content, request.target_rows);
                    tracing::info!(
                        doc_type = %builder.doc_type(),
                        attempts,
                        quality,
                        "generation succeeded"
                    );
                    return GenerationOutcome {
                        content,
                        status: DocumentStatus::Completed,
                        metadata: GenerationMetadata {
                            elapsed_ms: started.elapsed().as_millis() as u64,
                            attempts,
                            used_fallback: false,
                            quality_score: Some(quality),
                            model: Some(model),
                            link_warning: None,
                        },
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        doc_type = %builder.doc_type(),
                        attempt = attempts,
                        max = self.policy.max_attempts,
                        error = %e,
                        "generation attempt failed"
                    );
                    if attempts < self.policy.max_attempts {
                        self.sleeper.sleep(self.policy.delay).await;
                    }
                }
            }
        }

        tracing::error!(
            doc_type = %builder.doc_type(),
            attempts,
            "all generation attempts failed, emitting fallback content"
        );
        GenerationOutcome {
            content: fallback_content(builder.doc_type(), request, entry),
            status: DocumentStatus::Partial,
            metadata: GenerationMetadata {
                elapsed_ms: started.elapsed().as_millis() as u64,
                attempts,
                used_fallback: true,
                quality_score: None,
                model: Some(client.model_name().to_string()),
                link_warning: None,
            },
        }
    }

    async fn attempt(
        &self,
        client: &dyn CompletionClient,
        system: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<(String, String), PipelineError> {
        let response = tokio::time::timeout(self.timeout, client.complete(system, prompt, options))
            .await
            .map_err(|_| PipelineError::ModelTimeout {
                seconds: self.timeout.as_secs(),
            })??;

        if response.content.trim().len() < self.min_response_length {
            return Err(PipelineError::ModelEmptyResponse);
        }
        Ok((response.content, response.model))
    }
}

/// Fraction of the target rows the response actually delivered, capped at 1.
fn quality_score(content: &str, target_rows: u32) -> f32 {
    if target_rows == 0 {
        return 1.0;
    }
    let pipe_rows = content
        .lines()
        .filter(|line| line.contains('|') && !crate::table::is_separator_row(line))
        .count();
    // First pipe row is the header.
    let data_rows = pipe_rows.saturating_sub(1);
    (data_rows as f32 / target_rows as f32).min(1.0)
}

/// Deterministic placeholder table built from curriculum data alone. The
/// layout obeys the same column contract the model was asked for, so the
/// renderer handles fallback documents like any other.
fn fallback_content(
    doc_type: crate::types::DocumentType,
    request: &ResolvedRequest,
    entry: &CurriculumEntry,
) -> String {
    let columns = column_names(doc_type);
    let mut out = format!("| {} |\n", columns.join(" | "));
    out.push_str(&format!("|{}\n", "---|".repeat(columns.len())));

    let outcomes = if entry.specific_learning_outcomes.is_empty() {
        vec![format!("Cover {} ({})", request.substrand, request.strand)]
    } else {
        entry.specific_learning_outcomes.clone()
    };

    let mut row = 0u32;
    'outer: for week in 1..=request.weeks {
        for lesson in 1..=request.lessons_per_week {
            if row >= request.target_rows {
                break 'outer;
            }
            let outcome = &outcomes[row as usize % outcomes.len()];
            let cells: Vec<String> = columns
                .iter()
                .map(|name| match *name {
                    "Week" => format!("Week {week}"),
                    "Term" => request.term.clone(),
                    "Lesson" => lesson.to_string(),
                    "Strand" => request.strand.clone(),
                    "Sub-strand" => request.substrand.clone(),
                    "Concept" | "Specific Learning Outcomes" | "Notes" => outcome.clone(),
                    _ => "To be completed by the teacher".to_string(),
                })
                .collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
            row += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{test_support, SchemeOfWorkPrompt};
    use crate::provider::MockCompletionClient;
    use crate::types::DocumentType;

    struct NoopSleeper;

    #[async_trait]
    impl Sleeper for NoopSleeper {
        async fn sleep(&self, _duration: Duration) {}
    }

    fn orchestrator(max_attempts: u32) -> GenerationOrchestrator {
        let config = GenerationConfig {
            max_attempts,
            retry_delay_ms: 0,
            min_response_length: 20,
            ..Default::default()
        };
        GenerationOrchestrator::with_sleeper(&config, Box::new(NoopSleeper))
    }

    fn long_table() -> String {
        let mut out = String::from("| Week | Lesson | Strand | Sub-strand | Specific Learning Outcomes | Learning Experiences | Key Inquiry Questions | Learning Resources | Assessment | Reflection |\n");
        out.push_str(&format!("|{}\n", "---|".repeat(10)));
        for week in 1..=30 {
            out.push_str(&format!(
                "| Week {week} | 1 | Living Things | Plants | Identify parts of a plant | Garden walk | How do plants grow? | Seed samples | Observation | |\n"
            ));
        }
        out
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let client = MockCompletionClient::always(&long_table());
        let outcome = orchestrator(3)
            .generate(
                &client,
                &SchemeOfWorkPrompt,
                &test_support::sample_request(),
                &test_support::sample_entry(),
            )
            .await;

        assert_eq!(outcome.status, DocumentStatus::Completed);
        assert!(!outcome.metadata.used_fallback);
        assert_eq!(outcome.metadata.attempts, 1);
        assert_eq!(outcome.metadata.quality_score, Some(1.0));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let client = MockCompletionClient::new(vec![
            Err(PipelineError::ProviderRequestFailed("503".to_string())),
            Ok("short".to_string()),
            Ok(long_table()),
        ]);
        let outcome = orchestrator(3)
            .generate(
                &client,
                &SchemeOfWorkPrompt,
                &test_support::sample_request(),
                &test_support::sample_entry(),
            )
            .await;

        assert_eq!(outcome.status, DocumentStatus::Completed);
        assert_eq!(outcome.metadata.attempts, 3);
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_falls_back() {
        let client = MockCompletionClient::new(vec![Err(PipelineError::ModelEmptyResponse)]);
        let request = test_support::sample_request();
        let outcome = orchestrator(2)
            .generate(
                &client,
                &SchemeOfWorkPrompt,
                &request,
                &test_support::sample_entry(),
            )
            .await;

        assert_eq!(outcome.status, DocumentStatus::Partial);
        assert!(outcome.metadata.used_fallback);
        assert_eq!(outcome.metadata.attempts, 2);
        // Fallback content obeys the column contract and fills every row.
        assert!(outcome.content.starts_with("| Week | Lesson |"));
        let data_rows = outcome
            .content
            .lines()
            .skip(2)
            .filter(|l| l.contains('|'))
            .count();
        assert_eq!(data_rows as u32, request.target_rows);
    }

    #[test]
    fn test_resolve_request_precedence() {
        let config = GenerationConfig::default();
        let entry = test_support::sample_entry();

        let mut request = GenerationRequest {
            grade: "Grade 4".to_string(),
            learning_area: "Science".to_string(),
            strand: "Living Things".to_string(),
            substrand: "Plants".to_string(),
            weeks: Some(8),
            lessons_per_week: Some(4),
            ..Default::default()
        };

        // Explicit request shape wins.
        let resolved = resolve_request(&request, &entry, &config).unwrap();
        assert_eq!(resolved.target_rows, 32);

        // Entry lesson count next.
        request.weeks = None;
        let resolved = resolve_request(&request, &entry, &config).unwrap();
        assert_eq!(resolved.target_rows, 30);

        // Config term shape last.
        let mut entry_no_count = entry.clone();
        entry_no_count.lesson_count = None;
        let resolved = resolve_request(&request, &entry_no_count, &config).unwrap();
        assert_eq!(resolved.target_rows, 60);
    }

    #[test]
    fn test_resolve_request_fills_defaults() {
        let request = GenerationRequest {
            grade: "Grade 4".to_string(),
            learning_area: "Science".to_string(),
            strand: "Living Things".to_string(),
            substrand: "Plants".to_string(),
            ..Default::default()
        };
        let resolved = resolve_request(
            &request,
            &test_support::sample_entry(),
            &GenerationConfig::default(),
        )
        .unwrap();
        assert_eq!(resolved.term, "Term 1");
        assert_eq!(resolved.school, "School");
        assert_eq!(resolved.weeks, 12);
    }

    #[test]
    fn test_resolve_request_rejects_blank_fields() {
        let request = GenerationRequest {
            grade: "  ".to_string(),
            learning_area: "Science".to_string(),
            strand: "Living Things".to_string(),
            substrand: "Plants".to_string(),
            ..Default::default()
        };
        let err = resolve_request(
            &request,
            &test_support::sample_entry(),
            &GenerationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
    }

    #[test]
    fn test_fallback_content_renders() {
        let request = test_support::sample_request();
        let entry = test_support::sample_entry();
        let content = fallback_content(DocumentType::ConceptBreakdown, &request, &entry);
        let rendered = crate::table::TableRenderer::new()
            .render(DocumentType::ConceptBreakdown, &content)
            .unwrap();
        assert_eq!(rendered.row_count as u32, request.target_rows);
    }
}
