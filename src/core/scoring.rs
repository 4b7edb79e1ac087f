use crate::core::EngineError;
use crate::models::{Answer, AnswerMap, Question};

/// Importance a user can assign to a question
pub const MIN_IMPORTANCE: u8 = 1;
pub const MAX_IMPORTANCE: u8 = 3;

/// Calculate a compatibility score (0-100) between two answer sets
///
/// Only questions both users answered count. For each shared question the
/// pair weight is the sum of both importances; matching choice indices add
/// the pair weight to the match total. The score is the rounded percentage
/// of matched weight over total weight, or 0 when the users share no
/// answered questions.
///
/// Symmetric in its arguments and pure: no I/O, no clock, no randomness.
pub fn compatibility_score(a: &AnswerMap, b: &AnswerMap) -> u8 {
    let mut total_weight: u32 = 0;
    let mut match_weight: u32 = 0;

    for (question_id, answer_a) in a {
        if let Some(answer_b) = b.get(question_id) {
            let pair_weight = answer_a.importance as u32 + answer_b.importance as u32;
            total_weight += pair_weight;
            if answer_a.choice == answer_b.choice {
                match_weight += pair_weight;
            }
        }
    }

    if total_weight == 0 {
        return 0;
    }

    (100.0 * match_weight as f64 / total_weight as f64).round() as u8
}

/// Number of questions answered by both users
#[inline]
pub fn shared_question_count(a: &AnswerMap, b: &AnswerMap) -> usize {
    a.keys().filter(|id| b.contains_key(*id)).count()
}

/// Validate a single answer against its question
///
/// Rejects importance outside 1-3 and choice indices past the question's
/// choice list. Runs before scoring and before any answer write.
pub fn validate_answer(question: &Question, answer: &Answer) -> Result<(), EngineError> {
    if answer.importance < MIN_IMPORTANCE || answer.importance > MAX_IMPORTANCE {
        return Err(EngineError::Validation(format!(
            "importance {} for question {} is outside {}-{}",
            answer.importance, question.id, MIN_IMPORTANCE, MAX_IMPORTANCE
        )));
    }

    if answer.choice as usize >= question.choices.len() {
        return Err(EngineError::Validation(format!(
            "choice index {} for question {} exceeds {} choices",
            answer.choice,
            question.id,
            question.choices.len()
        )));
    }

    Ok(())
}

/// Validate a full answer sheet against the questionnaire
///
/// Every answer must reference a known question and pass `validate_answer`;
/// every required question must be answered.
pub fn validate_sheet(questions: &[Question], answers: &AnswerMap) -> Result<(), EngineError> {
    for (question_id, answer) in answers {
        let question = questions
            .iter()
            .find(|q| &q.id == question_id)
            .ok_or_else(|| {
                EngineError::Validation(format!("answer references unknown question {}", question_id))
            })?;
        validate_answer(question, answer)?;
    }

    for question in questions.iter().filter(|q| q.required) {
        if !answers.contains_key(&question.id) {
            return Err(EngineError::Validation(format!(
                "required question {} is unanswered",
                question.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sheet(entries: &[(&str, u8, u8)]) -> AnswerMap {
        entries
            .iter()
            .map(|(id, choice, importance)| {
                (
                    id.to_string(),
                    Answer {
                        choice: *choice,
                        importance: *importance,
                    },
                )
            })
            .collect()
    }

    fn question(id: &str, choices: usize, required: bool) -> Question {
        Question {
            id: id.to_string(),
            text: format!("Question {}", id),
            choices: (0..choices).map(|i| format!("choice {}", i)).collect(),
            base_weight: 2,
            required,
        }
    }

    #[test]
    fn test_score_is_symmetric() {
        let a = sheet(&[("q1", 0, 2), ("q2", 1, 3), ("q3", 2, 1)]);
        let b = sheet(&[("q1", 0, 1), ("q2", 0, 2), ("q4", 1, 3)]);

        assert_eq!(compatibility_score(&a, &b), compatibility_score(&b, &a));
    }

    #[test]
    fn test_disjoint_question_sets_score_zero() {
        let a = sheet(&[("q1", 0, 3), ("q2", 1, 3)]);
        let b = sheet(&[("q3", 0, 3), ("q4", 1, 3)]);

        assert_eq!(compatibility_score(&a, &b), 0);
        assert_eq!(shared_question_count(&a, &b), 0);
    }

    #[test]
    fn test_identical_choices_score_hundred() {
        // Weights differ on every question; only choices matter for a
        // perfect score
        let a = sheet(&[("q1", 0, 1), ("q2", 3, 3), ("q3", 2, 2)]);
        let b = sheet(&[("q1", 0, 3), ("q2", 3, 1), ("q3", 2, 2)]);

        assert_eq!(compatibility_score(&a, &b), 100);
    }

    #[test]
    fn test_weighted_partial_match() {
        // Q1 matches with pair weight 2+3=5, Q2 diverges with weight 2+1=3.
        // round(100 * 5 / 8) = 63
        let viewer = sheet(&[("q1", 0, 2), ("q2", 0, 2)]);
        let candidate = sheet(&[("q1", 0, 3), ("q2", 1, 1)]);

        assert_eq!(compatibility_score(&viewer, &candidate), 63);
    }

    #[test]
    fn test_empty_sheets_score_zero() {
        let empty: AnswerMap = HashMap::new();
        let b = sheet(&[("q1", 0, 2)]);

        assert_eq!(compatibility_score(&empty, &b), 0);
        assert_eq!(compatibility_score(&empty, &empty), 0);
    }

    #[test]
    fn test_validate_answer_rejects_bad_importance() {
        let q = question("q1", 3, false);

        assert!(validate_answer(&q, &Answer { choice: 0, importance: 0 }).is_err());
        assert!(validate_answer(&q, &Answer { choice: 0, importance: 4 }).is_err());
        assert!(validate_answer(&q, &Answer { choice: 0, importance: 2 }).is_ok());
    }

    #[test]
    fn test_validate_answer_rejects_out_of_range_choice() {
        let q = question("q1", 3, false);

        assert!(validate_answer(&q, &Answer { choice: 3, importance: 2 }).is_err());
        assert!(validate_answer(&q, &Answer { choice: 2, importance: 2 }).is_ok());
    }

    #[test]
    fn test_validate_sheet_requires_required_questions() {
        let questions = vec![question("q1", 3, true), question("q2", 3, false)];
        let missing_required = sheet(&[("q2", 0, 2)]);
        let complete = sheet(&[("q1", 0, 2)]);

        assert!(validate_sheet(&questions, &missing_required).is_err());
        assert!(validate_sheet(&questions, &complete).is_ok());
    }

    #[test]
    fn test_validate_sheet_rejects_unknown_question() {
        let questions = vec![question("q1", 3, false)];
        let answers = sheet(&[("q9", 0, 2)]);

        assert!(validate_sheet(&questions, &answers).is_err());
    }
}
