//! Concept scoring and selection for diagram treatment.
//!
//! Scores estimate how well a concept can be depicted visually, then a
//! three-pass selector picks a week-diverse subset. Selected concepts receive
//! a `VisualSpec` from the static template library when one exists, otherwise
//! one synthesized by pattern matching on the concept text.

use crate::types::{ConceptRecord, CurriculumEntry, DiagramArchetype, VisualSpec};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Strong visual indicators: structures, processes, spatial layouts.
const HIGH_POTENTIAL_KEYWORDS: &[&str] = &[
    "process",
    "cycle",
    "life cycle",
    "map",
    "parts",
    "structure",
    "classification",
    "diagram",
    "label",
    "stages",
    "layers",
    "system",
    "chart",
    "graph",
    "anatomy",
    "habitat",
    "food chain",
    "germination",
    "photosynthesis",
    "digestion",
    "skeleton",
    "water cycle",
    "weather",
    "shapes",
    "fractions",
    "symmetry",
    "angles",
    "rivers",
    "mountains",
    "compass",
    "butterfly",
];

/// Action verbs that usually imply something observable.
const MEDIUM_POTENTIAL_KEYWORDS: &[&str] = &[
    "describe",
    "identify",
    "explain",
    "demonstrate",
    "observe",
    "draw",
    "illustrate",
    "measure",
    "compare",
];

/// Abstract or discursive phrasing that resists depiction.
const LOW_POTENTIAL_KEYWORDS: &[&str] = &[
    "discuss",
    "opinion",
    "appreciate",
    "debate",
    "feelings",
    "attitudes",
    "values",
];

struct VisualTemplate {
    subject: &'static str,
    keyword: &'static str,
    archetype: DiagramArchetype,
    layout: &'static str,
    key_elements: &'static [&'static str],
    requires_local_context: bool,
}

/// Static library of predefined (subject, concept-keyword) visual treatments.
static TEMPLATE_LIBRARY: &[VisualTemplate] = &[
    VisualTemplate {
        subject: "science",
        keyword: "life cycle",
        archetype: DiagramArchetype::CyclicProcess,
        layout: "circular, clockwise, four to six stages",
        key_elements: &["stage labels", "directional arrows", "stage illustrations"],
        requires_local_context: false,
    },
    VisualTemplate {
        subject: "science",
        keyword: "parts of a plant",
        archetype: DiagramArchetype::LabeledParts,
        layout: "central figure with leader lines",
        key_elements: &["roots", "stem", "leaves", "flower", "labels"],
        requires_local_context: true,
    },
    VisualTemplate {
        subject: "science",
        keyword: "water cycle",
        archetype: DiagramArchetype::CyclicProcess,
        layout: "landscape cross-section with arrows",
        key_elements: &["evaporation", "condensation", "precipitation", "collection"],
        requires_local_context: false,
    },
    VisualTemplate {
        subject: "mathematics",
        keyword: "fractions",
        archetype: DiagramArchetype::ComparisonGrid,
        layout: "shaded shape pairs side by side",
        key_elements: &["whole shape", "shaded portion", "fraction notation"],
        requires_local_context: false,
    },
    VisualTemplate {
        subject: "social studies",
        keyword: "map",
        archetype: DiagramArchetype::GeographicMap,
        layout: "outline map with key",
        key_elements: &["boundaries", "compass rose", "legend", "labels"],
        requires_local_context: true,
    },
];

static BOTANICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(plant|flower|leaf|leaves|root|seed|germinat|crop)").unwrap());
static ZOOLOGICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(animal|insect|butterfly|bird|fish|mammal|livestock)").unwrap()
});
static CYCLIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(cycle|season|rotation|recurring)").unwrap());
static GEOGRAPHIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(map|river|mountain|lake|county|country|region|location)").unwrap()
});
static DATA_CHART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(graph|chart|data|tally|record|measure)").unwrap());
static CLASSIFICATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(classif|types of|groups of|categor|sort)").unwrap());
static SEQUENTIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(process|steps|stages|procedure|how to)").unwrap());
static LOCAL_CONTEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(local|community|home|school|farm|market|environment)").unwrap()
});

/// A concept chosen for visual treatment.
#[derive(Debug, Clone)]
pub struct SelectedConcept {
    pub record: ConceptRecord,
    pub score: u32,
    pub visual: VisualSpec,
}

/// Scores concepts for visual potential against a subject and its outcomes.
pub struct ConceptScorer {
    subject: String,
    outcomes: Vec<String>,
}

impl ConceptScorer {
    pub fn new(subject: &str, entry: Option<&CurriculumEntry>) -> Self {
        Self {
            subject: subject.trim().to_lowercase(),
            outcomes: entry
                .map(|e| e.specific_learning_outcomes.clone())
                .unwrap_or_default(),
        }
    }

    /// Visual-potential score, clamped to [0, 100], base 50.
    pub fn score(&self, concept: &str) -> u32 {
        let lowered = concept.to_lowercase();
        let mut score: i32 = 50;

        for keyword in HIGH_POTENTIAL_KEYWORDS {
            if lowered.contains(keyword) {
                score += 20;
            }
        }
        for keyword in MEDIUM_POTENTIAL_KEYWORDS {
            if lowered.contains(keyword) {
                score += 10;
            }
        }
        for keyword in LOW_POTENTIAL_KEYWORDS {
            if lowered.contains(keyword) {
                score -= 10;
            }
        }

        if library_match(&self.subject, &lowered).is_some() {
            score += 30;
        }

        score += 10 * self.related_outcomes(&lowered) as i32;

        score.clamp(0, 100) as u32
    }

    /// Count outcomes sharing at least two content words with the concept.
    fn related_outcomes(&self, lowered_concept: &str) -> usize {
        let concept_words = content_words(lowered_concept);
        self.outcomes
            .iter()
            .filter(|outcome| {
                let lowered = outcome.to_lowercase();
                let outcome_words = content_words(&lowered);
                concept_words.intersection(&outcome_words).count() >= 2
            })
            .count()
    }

    /// Build the visual spec for a concept: library template if present, else
    /// synthesized from text patterns.
    pub fn visual_spec(&self, concept: &str) -> VisualSpec {
        let lowered = concept.to_lowercase();
        if let Some(template) = library_match(&self.subject, &lowered) {
            return VisualSpec {
                archetype: template.archetype,
                layout: template.layout.to_string(),
                key_elements: template
                    .key_elements
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                requires_local_context: template.requires_local_context,
            };
        }
        synthesize_spec(&lowered)
    }
}

fn library_match(subject: &str, lowered_concept: &str) -> Option<&'static VisualTemplate> {
    TEMPLATE_LIBRARY
        .iter()
        .find(|t| subject.contains(t.subject) && lowered_concept.contains(t.keyword))
}

fn content_words(s: &str) -> HashSet<&str> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
        .collect()
}

/// Heuristic spec synthesis by pattern matching, most specific first.
fn synthesize_spec(lowered_concept: &str) -> VisualSpec {
    let requires_local_context = LOCAL_CONTEXT.is_match(lowered_concept);

    let (archetype, layout, key_elements) = if CYCLIC.is_match(lowered_concept) {
        (
            DiagramArchetype::CyclicProcess,
            "circular with directional arrows",
            vec!["stage labels", "arrows"],
        )
    } else if BOTANICAL.is_match(lowered_concept) {
        (
            DiagramArchetype::LabeledParts,
            "central specimen with leader lines",
            vec!["specimen outline", "part labels"],
        )
    } else if ZOOLOGICAL.is_match(lowered_concept) {
        (
            DiagramArchetype::LabeledParts,
            "side profile with leader lines",
            vec!["body outline", "part labels"],
        )
    } else if GEOGRAPHIC.is_match(lowered_concept) {
        (
            DiagramArchetype::GeographicMap,
            "outline map with key",
            vec!["boundaries", "legend", "compass rose"],
        )
    } else if DATA_CHART.is_match(lowered_concept) {
        (
            DiagramArchetype::DataChart,
            "labeled axes with sample data",
            vec!["axes", "bars or points", "title"],
        )
    } else if CLASSIFICATION.is_match(lowered_concept) {
        (
            DiagramArchetype::ClassificationTree,
            "top-down branching tree",
            vec!["root category", "branches", "examples"],
        )
    } else if SEQUENTIAL.is_match(lowered_concept) {
        (
            DiagramArchetype::FlowSequence,
            "left-to-right numbered steps",
            vec!["step boxes", "arrows", "step numbers"],
        )
    } else {
        (
            DiagramArchetype::SceneIllustration,
            "single annotated scene",
            vec!["scene", "annotations"],
        )
    };

    VisualSpec {
        archetype,
        layout: layout.to_string(),
        key_elements: key_elements.into_iter().map(String::from).collect(),
        requires_local_context,
    }
}

/// Select up to `k` concepts favoring high scores and week diversity.
///
/// Three ordered, non-overlapping passes over the score-sorted list:
/// 1. unused weeks only, score > 60;
/// 2. any remaining record with score > 50;
/// 3. fill remaining slots in score order.
pub fn select_visual_concepts(
    records: &[ConceptRecord],
    k: usize,
    scorer: &ConceptScorer,
) -> Vec<SelectedConcept> {
    let mut scored: Vec<(usize, u32)> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (i, scorer.score(&r.concept)))
        .collect();
    // Stable sort keeps source order among equal scores.
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    let mut chosen: Vec<usize> = Vec::new();
    let mut used = vec![false; records.len()];
    let mut used_weeks: HashSet<Option<u32>> = HashSet::new();

    // Pass 1: week-diverse high scorers.
    for &(i, score) in &scored {
        if chosen.len() >= k {
            break;
        }
        let week = records[i].week_ordinal();
        if score > 60 && !used_weeks.contains(&week) {
            used[i] = true;
            used_weeks.insert(week);
            chosen.push(i);
        }
    }

    // Pass 2: remaining decent scorers regardless of week reuse.
    for &(i, score) in &scored {
        if chosen.len() >= k {
            break;
        }
        if !used[i] && score > 50 {
            used[i] = true;
            chosen.push(i);
        }
    }

    // Pass 3: fill from whatever is left, in score order.
    for &(i, _) in &scored {
        if chosen.len() >= k {
            break;
        }
        if !used[i] {
            used[i] = true;
            chosen.push(i);
        }
    }

    chosen
        .into_iter()
        .map(|i| SelectedConcept {
            record: records[i].clone(),
            score: scorer.score(&records[i].concept),
            visual: scorer.visual_spec(&records[i].concept),
        })
        .collect()
}
