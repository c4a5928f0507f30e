// src/analytics/understanding.rs
//! Understanding levels derived from the attempt log on every read.
//!
//! Two banding formulas coexist:
//! [`concept_band3`] feeds the concept-understanding endpoint, and
//! [`session_band5`] feeds the teacher progress dashboard. Both take the same
//! wrong-attempt counts but use different thresholds.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{OakError, Result};
use crate::lesson::{KeyConcept, LessonStore};
use crate::session::{Attempt, AttemptStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnderstandingBand {
    Good,
    Moderate,
    Bad,
}

/// 0-1 wrong → good, 2-3 → moderate, 4+ → bad.
pub fn concept_band3(total_wrong: u32) -> UnderstandingBand {
    match total_wrong {
        0..=1 => UnderstandingBand::Good,
        2..=3 => UnderstandingBand::Moderate,
        _ => UnderstandingBand::Bad,
    }
}

/// 0 wrong → 5, 1 → 4, 2 → 3, 3-4 → 2, more → 1.
pub fn session_band5(wrong: u32) -> u8 {
    match wrong {
        0 => 5,
        1 => 4,
        2 => 3,
        3..=4 => 2,
        _ => 1,
    }
}

/// Rounded mean of the 5-band levels, `None` without concepts.
pub fn mean_band5(levels: &[u8]) -> Option<u8> {
    if levels.is_empty() {
        return None;
    }
    let sum: u32 = levels.iter().map(|&l| u32::from(l)).sum();
    Some((f64::from(sum) / levels.len() as f64).round() as u8)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptUnderstanding {
    pub student_id: String,
    pub concept: String,
    pub multiple_choice_wrong_count: u32,
    /// Attempts only log multiple-choice answers, so this stays 0.
    pub example_wrong_count: u32,
    pub total_wrong_count: u32,
    pub understanding_level: UnderstandingBand,
}

/// Per-concept wrong counts with both bandings, used by the dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptScore {
    pub concept: String,
    pub wrong_count: u32,
    pub band3: UnderstandingBand,
    pub band5: u8,
}

/// Wrong multiple-choice counts per concept, in the given concept order
/// followed by any other attempted concept in first-seen order.
pub fn wrong_counts(concepts: &[String], attempts: &[&Attempt]) -> Vec<(String, u32)> {
    let mut order: Vec<String> = concepts.to_vec();
    let mut counts: HashMap<String, u32> = concepts.iter().map(|c| (c.clone(), 0)).collect();

    for attempt in attempts {
        let count = counts.entry(attempt.concept.clone()).or_insert_with(|| {
            order.push(attempt.concept.clone());
            0
        });
        if !attempt.is_correct {
            *count += 1;
        }
    }

    order
        .into_iter()
        .map(|concept| {
            let count = counts.get(&concept).copied().unwrap_or(0);
            (concept, count)
        })
        .collect()
}

/// Per-(student, concept) understanding for a lesson. Only students with at
/// least one attempt appear.
pub fn compute_concept_understanding(
    concepts: &[KeyConcept],
    attempts: &[Attempt],
) -> Vec<ConceptUnderstanding> {
    let names: Vec<String> = concepts.iter().map(|c| c.concept.clone()).collect();

    let mut students: Vec<&str> = Vec::new();
    let mut by_student: HashMap<&str, Vec<&Attempt>> = HashMap::new();
    for attempt in attempts {
        let entry = by_student.entry(attempt.student_id.as_str()).or_insert_with(|| {
            students.push(attempt.student_id.as_str());
            Vec::new()
        });
        entry.push(attempt);
    }

    let mut result = Vec::new();
    for student_id in students {
        let student_attempts = &by_student[student_id];
        for (concept, wrong) in wrong_counts(&names, student_attempts) {
            let example_wrong = 0;
            let total = wrong + example_wrong;
            result.push(ConceptUnderstanding {
                student_id: student_id.to_string(),
                concept,
                multiple_choice_wrong_count: wrong,
                example_wrong_count: example_wrong,
                total_wrong_count: total,
                understanding_level: concept_band3(total),
            });
        }
    }
    result
}

/// Scores for one session's attempts against its concept list.
pub fn score_concepts(concepts: &[String], attempts: &[Attempt]) -> Vec<ConceptScore> {
    let refs: Vec<&Attempt> = attempts.iter().collect();
    wrong_counts(concepts, &refs)
        .into_iter()
        .map(|(concept, wrong_count)| ConceptScore {
            concept,
            wrong_count,
            band3: concept_band3(wrong_count),
            band5: session_band5(wrong_count),
        })
        .collect()
}

/// Share of concepts at band `good`, as a 0-100 percentage.
pub fn percent_good(scores: &[ConceptScore]) -> i64 {
    if scores.is_empty() {
        return 0;
    }
    let good = scores
        .iter()
        .filter(|s| s.band3 == UnderstandingBand::Good)
        .count();
    ((100.0 * good as f64) / scores.len() as f64).round() as i64
}

#[derive(Clone)]
pub struct UnderstandingService {
    lessons: LessonStore,
    attempts: AttemptStore,
}

impl UnderstandingService {
    pub fn new(lessons: LessonStore, attempts: AttemptStore) -> Self {
        Self { lessons, attempts }
    }

    pub async fn concept_understanding(
        &self,
        lesson_id: &str,
        student_id: Option<&str>,
    ) -> Result<Vec<ConceptUnderstanding>> {
        let lesson = self
            .lessons
            .get(lesson_id)
            .await?
            .ok_or_else(|| OakError::not_found("lesson"))?;

        let attempts = self.attempts.list_for_lesson(lesson_id, student_id).await?;
        Ok(compute_concept_understanding(lesson.concepts(), &attempts))
    }
}
