//! Read-only projections for the export collaborator.
//!
//! Plain structured data only: the spreadsheet writer owns formulas, cell
//! typing, and formatting. Both projections clone out of the session at
//! call time, so they always reflect its current contents.

use serde::Serialize;

use crate::decode::AnswerValue;
use crate::grade::{GradingSession, StudentResult};

/// Verbatim session contents.
#[derive(Debug, Clone, Serialize)]
pub struct RawData {
    pub correct_answers: Vec<AnswerValue>,
    /// Graded pages in page order.
    pub results: Vec<StudentResult>,
}

/// One student row of the tabular layout.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    pub student_id: String,
    /// The student's answer per question, key-length aligned.
    pub answers: Vec<AnswerValue>,
    /// Per-question correctness, for writers that emit 1/0 grids.
    pub correct: Vec<bool>,
    pub score: u32,
    pub max_score: u32,
}

/// Tabular layout: header row, a zeroed points row for the teacher to fill
/// in, the key row, then one row per graded page.
#[derive(Debug, Clone, Serialize)]
pub struct SheetExport {
    /// "Student ID", "Q1".."Qn", "Total Score".
    pub headers: Vec<String>,
    /// One zero per question; the writer exposes these as editable points.
    pub points_row: Vec<u32>,
    pub key_row: Vec<AnswerValue>,
    pub data_rows: Vec<ExportRow>,
}

impl GradingSession {
    /// Current key and results, cloned.
    pub fn raw_data(&self) -> RawData {
        RawData {
            correct_answers: self.correct_answers.clone(),
            results: self.results.values().cloned().collect(),
        }
    }

    /// Tabular projection, or `None` when nothing has been graded.
    pub fn excel_data(&self) -> Option<SheetExport> {
        if self.results.is_empty() {
            return None;
        }

        let num_questions = self.correct_answers.len();

        let mut headers = Vec::with_capacity(num_questions + 2);
        headers.push("Student ID".to_string());
        for q in 1..=num_questions {
            headers.push(format!("Q{}", q));
        }
        headers.push("Total Score".to_string());

        let data_rows = self
            .results
            .values()
            .map(|r| ExportRow {
                student_id: r.student_id.clone(),
                answers: r.details.iter().map(|d| d.student).collect(),
                correct: r.details.iter().map(|d| d.is_correct).collect(),
                score: r.score,
                max_score: r.max_score,
            })
            .collect();

        Some(SheetExport {
            headers,
            points_row: vec![0; num_questions],
            key_row: self.correct_answers.clone(),
            data_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AnswerValue::{Blank, Mark};

    fn graded_session() -> GradingSession {
        let mut s = GradingSession::new();
        s.set_answer_key(vec![Mark(1), Blank, Mark(0)]);
        s.grade_student("2021001", &[Mark(1), Mark(2), Mark(3)], 2);
        s.grade_student("2021002", &[Mark(1), Blank, Mark(0)], 3);
        s
    }

    #[test]
    fn excel_data_is_none_before_grading() {
        let mut s = GradingSession::new();
        s.set_answer_key(vec![Mark(1)]);
        assert!(s.excel_data().is_none());
    }

    #[test]
    fn excel_layout_matches_key_length() {
        let s = graded_session();
        let export = s.excel_data().unwrap();

        assert_eq!(
            export.headers,
            vec!["Student ID", "Q1", "Q2", "Q3", "Total Score"]
        );
        assert_eq!(export.points_row, vec![0, 0, 0]);
        assert_eq!(export.key_row, vec![Mark(1), Blank, Mark(0)]);
        assert_eq!(export.data_rows.len(), 2);

        let first = &export.data_rows[0];
        assert_eq!(first.student_id, "2021001");
        assert_eq!(first.answers, vec![Mark(1), Mark(2), Mark(3)]);
        assert_eq!(first.correct, vec![true, false, false]);
        assert_eq!(first.score, 1);
        assert_eq!(first.max_score, 2);
    }

    #[test]
    fn raw_data_reflects_current_state() {
        let mut s = graded_session();
        let before = s.raw_data();
        assert_eq!(before.results.len(), 2);

        // A later re-grade shows up in a fresh projection, not the old one.
        s.grade_student("2021001", &[Mark(1), Blank, Mark(0)], 2);
        let after = s.raw_data();
        assert_eq!(before.results[0].score, 1);
        assert_eq!(after.results[0].score, 2);
    }

    #[test]
    fn projections_do_not_mutate_the_session() {
        let s = graded_session();
        let _ = s.raw_data();
        let _ = s.excel_data();
        assert_eq!(s.results().count(), 2);
        assert_eq!(s.answer_key().len(), 3);
    }
}
