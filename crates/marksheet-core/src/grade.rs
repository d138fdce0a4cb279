//! Session-scoped grading against an answer key.
//!
//! [`GradingSession`] is the only stateful component of the pipeline. Key
//! setting and grading interleave freely: replacing the key does not clear
//! existing results, so a corrected key can be applied without re-scanning.
//! Results for already-graded pages are stale after a key change until the
//! caller re-grades them — the session does not detect this.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decode::AnswerValue;

/// Per-question comparison outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradedDetail {
    /// 1-based question number.
    pub question: u32,
    pub correct: AnswerValue,
    pub student: AnswerValue,
    /// True iff `student == correct` and the key position is an unambiguous
    /// mark. Blank and Multiple key positions match nothing, Multiple
    /// against Multiple included.
    pub is_correct: bool,
}

/// One graded page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentResult {
    pub page: u32,
    pub student_id: String,
    pub score: u32,
    /// Number of key positions holding a defined mark; always >= `score`.
    pub max_score: u32,
    pub details: Vec<GradedDetail>,
    pub timestamp: DateTime<Utc>,
}

/// Answer key plus accumulated per-page results.
///
/// Not safe for concurrent mutation; `&mut self` on all writers enforces
/// the single-writer discipline. Readers take `&self` and reflect the
/// state at call time.
#[derive(Debug, Default)]
pub struct GradingSession {
    pub(crate) correct_answers: Vec<AnswerValue>,
    pub(crate) results: BTreeMap<u32, StudentResult>,
}

impl GradingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the answer key wholesale.
    ///
    /// Already-graded pages are not revalidated; re-grade them to pick up
    /// the new key.
    pub fn set_answer_key(&mut self, answers: Vec<AnswerValue>) {
        tracing::info!("answer key set: {} questions", answers.len());
        self.correct_answers = answers;
    }

    /// The current answer key.
    pub fn answer_key(&self) -> &[AnswerValue] {
        &self.correct_answers
    }

    /// Grade one page and store the result under its page number.
    ///
    /// Question positions beyond the end of `answers` (a short scan) read
    /// as blank. Grading the same page again replaces the stored result,
    /// so a corrected re-grade never duplicates an entry.
    pub fn grade_student(
        &mut self,
        student_id: &str,
        answers: &[AnswerValue],
        page: u32,
    ) -> &StudentResult {
        let mut details = Vec::with_capacity(self.correct_answers.len());
        let mut score = 0u32;
        let mut max_score = 0u32;

        for (i, &correct) in self.correct_answers.iter().enumerate() {
            let student = answers.get(i).copied().unwrap_or(AnswerValue::Blank);
            let scorable = matches!(correct, AnswerValue::Mark(_));
            let is_correct = scorable && student == correct;

            if is_correct {
                score += 1;
            }
            if scorable {
                max_score += 1;
            }

            details.push(GradedDetail {
                question: (i + 1) as u32,
                correct,
                student,
                is_correct,
            });
        }

        tracing::info!(
            "graded page {}: id={} score={}/{}",
            page,
            student_id,
            score,
            max_score
        );

        let result = StudentResult {
            page,
            student_id: student_id.to_string(),
            score,
            max_score,
            details,
            timestamp: Utc::now(),
        };
        self.results.insert(page, result);
        &self.results[&page]
    }

    /// Stored result for a page, if graded.
    pub fn result_for_page(&self, page: u32) -> Option<&StudentResult> {
        self.results.get(&page)
    }

    /// All stored results in page order.
    pub fn results(&self) -> impl Iterator<Item = &StudentResult> {
        self.results.values()
    }

    /// Clear all results. The answer key survives, so a re-grade-all cycle
    /// needs no re-scan of the key page.
    pub fn reset(&mut self) {
        self.results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AnswerValue::{Blank, Mark, Multiple};

    fn session_with_key(key: &[AnswerValue]) -> GradingSession {
        let mut s = GradingSession::new();
        s.set_answer_key(key.to_vec());
        s
    }

    #[test]
    fn perfect_sheet_scores_all_defined_questions() {
        let key = [Mark(1), Blank, Mark(3), Mark(0)];
        let mut s = session_with_key(&key);
        let res = s.grade_student("1234567", &key, 2);

        // Only the three Mark positions are scorable.
        assert_eq!(res.max_score, 3);
        assert_eq!(res.score, 3);
    }

    #[test]
    fn multiple_key_position_is_unscorable() {
        // Key [1, null, MULTIPLE, 0], student [1, 5, 3, 0].
        let mut s = session_with_key(&[Mark(1), Blank, Multiple, Mark(0)]);
        let res = s.grade_student("42", &[Mark(1), Mark(5), Mark(3), Mark(0)], 2);

        let flags: Vec<bool> = res.details.iter().map(|d| d.is_correct).collect();
        assert_eq!(flags, vec![true, false, false, true]);
        assert_eq!(res.score, 2);
        // Multiple does not count toward max_score; see DESIGN.md.
        assert_eq!(res.max_score, 2);
    }

    #[test]
    fn multiple_never_equals_multiple() {
        let mut s = session_with_key(&[Multiple]);
        let res = s.grade_student("1", &[Multiple], 2);
        assert!(!res.details[0].is_correct);
        assert_eq!(res.score, 0);
        assert_eq!(res.max_score, 0);
    }

    #[test]
    fn short_scan_reads_as_blank() {
        let mut s = session_with_key(&[Mark(2), Mark(4), Mark(6)]);
        let res = s.grade_student("7", &[Mark(2)], 3);

        assert_eq!(res.details.len(), 3);
        assert_eq!(res.details[1].student, Blank);
        assert_eq!(res.details[2].student, Blank);
        assert_eq!(res.score, 1);
        assert_eq!(res.max_score, 3);
    }

    #[test]
    fn regrading_a_page_replaces_its_result() {
        let mut s = session_with_key(&[Mark(1), Mark(2)]);
        s.grade_student("1111111", &[Mark(9), Mark(9)], 2);
        s.grade_student("1111111", &[Mark(1), Mark(2)], 2);

        assert_eq!(s.results().count(), 1);
        let res = s.result_for_page(2).unwrap();
        assert_eq!(res.score, 2);
    }

    #[test]
    fn question_numbers_are_one_based() {
        let mut s = session_with_key(&[Mark(1), Mark(2)]);
        let res = s.grade_student("1", &[], 2);
        assert_eq!(res.details[0].question, 1);
        assert_eq!(res.details[1].question, 2);
    }

    #[test]
    fn reset_clears_results_but_keeps_key() {
        let mut s = session_with_key(&[Mark(1)]);
        s.grade_student("1", &[Mark(1)], 2);
        s.reset();

        assert_eq!(s.results().count(), 0);
        assert_eq!(s.answer_key(), &[Mark(1)]);
    }

    #[test]
    fn new_key_does_not_clear_results() {
        let mut s = session_with_key(&[Mark(1)]);
        s.grade_student("1", &[Mark(1)], 2);
        s.set_answer_key(vec![Mark(2)]);

        // The stale result is kept; re-grading is the caller's job.
        assert_eq!(s.results().count(), 1);
        assert_eq!(s.result_for_page(2).unwrap().score, 1);
    }

    #[test]
    fn results_iterate_in_page_order() {
        let mut s = session_with_key(&[Mark(1)]);
        s.grade_student("c", &[], 5);
        s.grade_student("a", &[], 2);
        s.grade_student("b", &[], 3);

        let pages: Vec<u32> = s.results().map(|r| r.page).collect();
        assert_eq!(pages, vec![2, 3, 5]);
    }
}
