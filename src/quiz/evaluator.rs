// src/quiz/evaluator.rs
//! The phase transition engine.
//!
//! `multiple_choice` → (correct) → `example` → (correct) → next question's
//! `multiple_choice`, or completion after the last one. Wrong answers never
//! move the pointer. Every pointer move is a compare-and-swap write, so two
//! racing submissions cannot both advance the same question.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{question_message, QuizService};
use crate::analytics::understanding::{percent_good, score_concepts};
use crate::error::{OakError, Result};
use crate::session::{
    ChatSession, ConceptQuestion, ConceptStatus, MessageBody, NewAttempt, OptionKey, Phase,
    Progress, QuestionView, SessionState, Speaker,
};

const COMPLETION_MESSAGE: &str = "Congratulations! You've worked through every concept in this \
lesson. Great job sticking with it.";

const WRONG_CHOICE_FEEDBACK: &str = "Not quite. Take another look at the options and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerType {
    MultipleChoice,
    Example,
}

impl AnswerType {
    fn phase(self) -> Phase {
        match self {
            AnswerType::MultipleChoice => Phase::MultipleChoice,
            AnswerType::Example => Phase::Example,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub feedback: String,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// The question to retry after a wrong multiple-choice answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<QuestionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_question: Option<QuestionView>,
    pub is_complete: bool,
    pub progress: Progress,
    pub current_phase: Phase,
}

/// Hint after a wrong multiple-choice answer.
pub(crate) fn choice_hint(question: &ConceptQuestion) -> String {
    if question.concept_description.trim().is_empty() {
        format!(
            "Think carefully about what {} really means, then compare each option with it.",
            question.concept
        )
    } else {
        format!(
            "Not quite. Think about {}: {}",
            question.concept, question.concept_description
        )
    }
}

impl QuizService {
    pub async fn submit_answer(
        &self,
        session_id: &str,
        answer: &str,
        answer_type: AnswerType,
    ) -> Result<AnswerOutcome> {
        let session = self.load_session(session_id).await?;
        if !session.is_active() {
            return Err(OakError::SessionComplete);
        }
        let Some(state) = session.quiz_state().cloned() else {
            return Err(OakError::invalid("session has no questions yet, start it first"));
        };
        if state.is_complete() {
            return Err(OakError::SessionComplete);
        }
        if answer_type.phase() != state.current_phase {
            return Err(OakError::invalid(format!(
                "expected a {} answer",
                state.current_phase.as_str()
            )));
        }

        match answer_type {
            AnswerType::MultipleChoice => {
                let selected: OptionKey = answer.parse()?;
                self.answer_choice(&session, state, selected).await
            }
            AnswerType::Example => {
                let answer = answer.trim();
                if answer.is_empty() {
                    return Err(OakError::invalid("example answer is empty"));
                }
                self.answer_example(&session, state, answer).await
            }
        }
    }

    async fn answer_choice(
        &self,
        session: &ChatSession,
        mut state: SessionState,
        selected: OptionKey,
    ) -> Result<AnswerOutcome> {
        let index = state.current_question_index;
        let question = state.questions[index].clone();
        let is_correct = selected == question.correct_option;

        if is_correct {
            state.current_phase = Phase::Example;
            self.sessions.save_state(&session.id, &state, session.version).await?;
        }

        self.attempts
            .record(NewAttempt {
                session_id: &session.id,
                student_id: &session.student_id,
                lesson_id: &session.lesson_id,
                concept: &question.concept,
                question_index: index,
                selected,
                is_correct,
            })
            .await?;

        self.messages
            .append(
                &session.id,
                Speaker::Student,
                &MessageBody::MultipleChoiceAnswer {
                    selected,
                    question_index: index,
                },
                false,
            )
            .await?;

        if is_correct {
            debug!("Session {}: question {} answered correctly", session.id, index);
            self.progress
                .upsert_concept(&session.id, &question.concept, ConceptStatus::Example)
                .await?;
            self.messages
                .append(
                    &session.id,
                    Speaker::Grader,
                    &MessageBody::Feedback {
                        message: question.correct_explanation.clone(),
                        is_positive: true,
                        hint: None,
                    },
                    false,
                )
                .await?;
            self.messages
                .append(&session.id, Speaker::Tutor, &MessageBody::text(&question.example_prompt), false)
                .await?;

            return Ok(AnswerOutcome {
                feedback: question.correct_explanation.clone(),
                is_correct: true,
                example_prompt: Some(question.example_prompt.clone()),
                hint: Some(question.example_hint.clone()).filter(|h| !h.is_empty()),
                current_question: None,
                next_question: None,
                is_complete: false,
                progress: state.progress(),
                current_phase: Phase::Example,
            });
        }

        let hint = choice_hint(&question);
        self.progress
            .record_hint(&session.id, &question.concept, Phase::MultipleChoice, &hint)
            .await?;
        self.messages
            .append(
                &session.id,
                Speaker::Grader,
                &MessageBody::Feedback {
                    message: WRONG_CHOICE_FEEDBACK.to_string(),
                    is_positive: false,
                    hint: Some(hint.clone()),
                },
                false,
            )
            .await?;

        Ok(AnswerOutcome {
            feedback: WRONG_CHOICE_FEEDBACK.to_string(),
            is_correct: false,
            example_prompt: None,
            hint: Some(hint),
            current_question: state.current_view(),
            next_question: None,
            is_complete: false,
            progress: state.progress(),
            current_phase: Phase::MultipleChoice,
        })
    }

    async fn answer_example(
        &self,
        session: &ChatSession,
        state: SessionState,
        answer: &str,
    ) -> Result<AnswerOutcome> {
        let index = state.current_question_index;
        let question = state.questions[index].clone();
        let grade = self.grader.grade(&question, answer).await?;

        if !grade.is_correct {
            let hint = grade
                .hint
                .clone()
                .unwrap_or_else(|| question.example_hint.clone());
            self.messages
                .append(
                    &session.id,
                    Speaker::Student,
                    &MessageBody::ExampleSubmission {
                        content: answer.to_string(),
                        question_index: index,
                    },
                    false,
                )
                .await?;
            self.progress
                .record_hint(&session.id, &question.concept, Phase::Example, &hint)
                .await?;
            self.messages
                .append(
                    &session.id,
                    Speaker::Grader,
                    &MessageBody::Feedback {
                        message: grade.feedback.clone(),
                        is_positive: false,
                        hint: Some(hint.clone()),
                    },
                    false,
                )
                .await?;

            return Ok(AnswerOutcome {
                feedback: grade.feedback,
                is_correct: false,
                example_prompt: Some(question.example_prompt.clone()),
                hint: Some(hint).filter(|h| !h.is_empty()),
                current_question: None,
                next_question: None,
                is_complete: false,
                progress: state.progress(),
                current_phase: Phase::Example,
            });
        }

        let mut next = state;
        next.current_question_index = index + 1;
        next.current_phase = Phase::MultipleChoice;
        let is_complete = next.is_complete();

        if is_complete {
            let concepts: Vec<String> = next.questions.iter().map(|q| q.concept.clone()).collect();
            let attempts = self.attempts.list_for_session(&session.id).await?;
            let level = percent_good(&score_concepts(&concepts, &attempts));
            self.sessions
                .finish(&session.id, &next, session.version, level)
                .await?;
        } else {
            self.sessions.save_state(&session.id, &next, session.version).await?;
        }

        self.messages
            .append(
                &session.id,
                Speaker::Student,
                &MessageBody::ExampleSubmission {
                    content: answer.to_string(),
                    question_index: index,
                },
                false,
            )
            .await?;
        self.messages
            .append(
                &session.id,
                Speaker::Grader,
                &MessageBody::Feedback {
                    message: grade.feedback.clone(),
                    is_positive: true,
                    hint: None,
                },
                false,
            )
            .await?;
        self.progress
            .upsert_concept(&session.id, &question.concept, ConceptStatus::Completed)
            .await?;

        let next_question = match next.current_question() {
            Some(upcoming) => {
                self.progress
                    .upsert_concept(&session.id, &upcoming.concept, ConceptStatus::MultipleChoice)
                    .await?;
                self.messages
                    .append(
                        &session.id,
                        Speaker::Tutor,
                        &question_message(upcoming, next.current_question_index),
                        false,
                    )
                    .await?;
                next.current_view()
            }
            None => {
                self.messages
                    .append(&session.id, Speaker::Tutor, &MessageBody::text(COMPLETION_MESSAGE), true)
                    .await?;
                info!("Session {} completed all {} questions", session.id, next.questions.len());
                None
            }
        };

        Ok(AnswerOutcome {
            feedback: grade.feedback,
            is_correct: true,
            example_prompt: None,
            hint: None,
            current_question: None,
            next_question,
            is_complete,
            progress: next.progress(),
            current_phase: Phase::MultipleChoice,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::AnswerOptions;

    fn question(description: &str) -> ConceptQuestion {
        ConceptQuestion {
            concept: "Osmosis".into(),
            concept_description: description.into(),
            multiple_choice_question: "?".into(),
            options: AnswerOptions {
                a: "a".into(),
                b: "b".into(),
                c: "c".into(),
            },
            correct_option: OptionKey::A,
            correct_explanation: String::new(),
            example_prompt: String::new(),
            example_hint: String::new(),
        }
    }

    #[test]
    fn hint_uses_description_when_present() {
        let hint = choice_hint(&question("Water moving across a membrane"));
        assert_eq!(hint, "Not quite. Think about Osmosis: Water moving across a membrane");
    }

    #[test]
    fn hint_is_generic_without_description() {
        let hint = choice_hint(&question(""));
        assert!(hint.contains("Osmosis"));
        assert!(!hint.contains(':'));
    }

    #[test]
    fn answer_type_parses_snake_case() {
        let t: AnswerType = serde_json::from_str("\"multiple_choice\"").unwrap();
        assert_eq!(t, AnswerType::MultipleChoice);
        assert_eq!(AnswerType::Example.phase(), Phase::Example);
    }
}
