//! Cell-matrix decoding.
//!
//! Two interpretations of the same [`Cell`] matrix shape:
//!
//! - **Vertical ID**: each column is one digit of the student ID, the row
//!   index is the digit value.
//! - **Horizontal answers**: each row is one question, columns are option
//!   positions printed in 1..9,0 order.
//!
//! Ambiguity is data here, never an error: an unmarked group decodes to
//! [`AnswerValue::Blank`], an over-marked group to [`AnswerValue::Multiple`].
//! Validity against a block's option count is a separate presentation-stage
//! check ([`mark_is_valid`]) that never feeds back into decoding.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::grid::Cell;

/// Placeholder emitted for an ID column with no marked row.
pub const ID_PLACEHOLDER: char = '?';

// ── Answer values ──────────────────────────────────────────────────────────

/// Decoded state of one logical answer group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerValue {
    /// No cell marked.
    Blank,
    /// More than one cell marked where exactly one was expected.
    Multiple,
    /// Exactly one cell marked, carrying the selected option 0–9.
    Mark(u8),
}

impl std::fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank => write!(f, "-"),
            Self::Multiple => write!(f, "MULTIPLE"),
            Self::Mark(v) => write!(f, "{}", v),
        }
    }
}

// Wire shape: a bare number, null for blank, or the string "MULTIPLE".
impl Serialize for AnswerValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Blank => serializer.serialize_none(),
            Self::Multiple => serializer.serialize_str("MULTIPLE"),
            Self::Mark(v) => serializer.serialize_u8(*v),
        }
    }
}

impl<'de> Deserialize<'de> for AnswerValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(u8),
            Text(String),
        }

        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(Self::Blank),
            Some(Repr::Num(v)) if v <= 9 => Ok(Self::Mark(v)),
            Some(Repr::Num(v)) => Err(D::Error::custom(format!("mark value {} out of 0-9", v))),
            Some(Repr::Text(s)) if s == "MULTIPLE" => Ok(Self::Multiple),
            Some(Repr::Text(s)) => Err(D::Error::custom(format!("unknown answer value '{}'", s))),
        }
    }
}

// ── Decoding ───────────────────────────────────────────────────────────────

/// Decode a vertically-encoded student ID.
///
/// Each column is scanned top to bottom; the first marked row is the digit
/// (row 0 → '0'). A column with no mark contributes [`ID_PLACEHOLDER`], so
/// the result length always equals the column count. A column with several
/// marks silently reports the topmost — a known ambiguity left to the
/// reviewing human, not corrected here.
pub fn decode_id(matrix: &[Vec<Cell>]) -> String {
    let Some(first_row) = matrix.first() else {
        return String::new();
    };

    let mut id = String::with_capacity(first_row.len());
    for c in 0..first_row.len() {
        let digit = matrix
            .iter()
            .position(|row| row.get(c).is_some_and(|cell| cell.marked))
            .and_then(|r| char::from_digit(r as u32, 10))
            .unwrap_or(ID_PLACEHOLDER);
        id.push(digit);
    }
    id
}

/// Map a physical column index to its printed option value.
///
/// Answer rows are printed 1,2,…,9,0: column 9 encodes value 0.
pub fn option_value(col: usize) -> u8 {
    if col == 9 {
        0
    } else {
        (col + 1) as u8
    }
}

/// Decode horizontally-encoded answers, one [`AnswerValue`] per matrix row.
pub fn decode_answers(matrix: &[Vec<Cell>]) -> Vec<AnswerValue> {
    matrix
        .iter()
        .map(|row| {
            let mut marked = row
                .iter()
                .enumerate()
                .filter(|(_, cell)| cell.marked)
                .map(|(c, _)| option_value(c));

            match (marked.next(), marked.next()) {
                (None, _) => AnswerValue::Blank,
                (Some(v), None) => AnswerValue::Mark(v),
                (Some(_), Some(_)) => AnswerValue::Multiple,
            }
        })
        .collect()
}

/// Presentation-stage validity of a decoded mark against a block's option
/// count. Value 0 sits in the tenth physical column and is always legal;
/// other values must not exceed `max_option`.
///
/// This never changes what [`decode_answers`] produced — an out-of-range
/// mark still decodes to its value and is merely flagged by callers.
pub fn mark_is_valid(value: u8, max_option: u8) -> bool {
    value == 0 || value <= max_option
}

/// Concatenate per-block answer sequences into one flat list indexed by
/// global question number (block-major, row-minor). Every block contributes
/// exactly `questions_per_block` entries; short blocks pad with blanks.
pub fn flatten_blocks(blocks: &[Vec<AnswerValue>], questions_per_block: u32) -> Vec<AnswerValue> {
    let per_block = questions_per_block as usize;
    let mut answers = Vec::with_capacity(blocks.len() * per_block);
    for block in blocks {
        for i in 0..per_block {
            answers.push(block.get(i).copied().unwrap_or(AnswerValue::Blank));
        }
    }
    answers
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a rows×cols matrix with the given (row, col) positions marked.
    fn matrix(rows: usize, cols: usize, marked: &[(usize, usize)]) -> Vec<Vec<Cell>> {
        (0..rows)
            .map(|r| {
                (0..cols)
                    .map(|c| {
                        let is_marked = marked.contains(&(r, c));
                        Cell {
                            x: c as i32 * 10,
                            y: r as i32 * 10,
                            w: 10,
                            h: 10,
                            ratio: if is_marked { 0.9 } else { 0.0 },
                            marked: is_marked,
                        }
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn id_reads_first_marked_row_per_column() {
        // Column digits: 3, 0, 7.
        let m = matrix(10, 3, &[(3, 0), (0, 1), (7, 2)]);
        assert_eq!(decode_id(&m), "307");
    }

    #[test]
    fn id_unmarked_column_yields_placeholder() {
        let m = matrix(10, 4, &[(1, 0), (2, 2), (9, 3)]);
        assert_eq!(decode_id(&m), "1?29");
    }

    #[test]
    fn id_multiple_marks_report_topmost() {
        let m = matrix(10, 1, &[(2, 0), (6, 0)]);
        assert_eq!(decode_id(&m), "2");
    }

    #[test]
    fn id_of_empty_matrix_is_empty() {
        assert_eq!(decode_id(&[]), "");
    }

    #[test]
    fn blank_region_decodes_to_all_blank() {
        let m = matrix(5, 10, &[]);
        assert_eq!(decode_answers(&m), vec![AnswerValue::Blank; 5]);
    }

    #[test]
    fn single_mark_decodes_to_its_option_value() {
        // Column 2 carries printed value 3.
        let m = matrix(3, 10, &[(1, 2)]);
        assert_eq!(
            decode_answers(&m),
            vec![AnswerValue::Blank, AnswerValue::Mark(3), AnswerValue::Blank]
        );
    }

    #[test]
    fn column_nine_maps_to_value_zero() {
        // A 1x10 grid with only column 9 inked reads as 0, not 9.
        let m = matrix(1, 10, &[(0, 9)]);
        assert_eq!(decode_answers(&m), vec![AnswerValue::Mark(0)]);
    }

    #[test]
    fn two_marks_in_one_row_yield_multiple_only_there() {
        let m = matrix(4, 10, &[(1, 0), (1, 5), (3, 7)]);
        assert_eq!(
            decode_answers(&m),
            vec![
                AnswerValue::Blank,
                AnswerValue::Multiple,
                AnswerValue::Blank,
                AnswerValue::Mark(8),
            ]
        );
    }

    #[test]
    fn validity_is_a_separate_check() {
        // A 4-option question on a 10-column grid: 5..=9 are out of range,
        // 0 (tenth column) is always legal.
        assert!(mark_is_valid(1, 4));
        assert!(mark_is_valid(4, 4));
        assert!(!mark_is_valid(5, 4));
        assert!(!mark_is_valid(9, 4));
        assert!(mark_is_valid(0, 4));
        // max_option 10 accepts everything.
        assert!(mark_is_valid(9, 10));
    }

    #[test]
    fn flatten_is_block_major_and_exact_length() {
        let blocks = vec![
            vec![AnswerValue::Mark(1), AnswerValue::Mark(2)],
            vec![AnswerValue::Mark(3)], // short block pads with Blank
        ];
        assert_eq!(
            flatten_blocks(&blocks, 2),
            vec![
                AnswerValue::Mark(1),
                AnswerValue::Mark(2),
                AnswerValue::Mark(3),
                AnswerValue::Blank,
            ]
        );
    }

    #[test]
    fn answer_value_serde_matches_wire_shape() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Row {
            values: Vec<AnswerValue>,
        }

        let row = Row {
            values: vec![AnswerValue::Mark(7), AnswerValue::Blank, AnswerValue::Multiple],
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"values":[7,null,"MULTIPLE"]}"#);
        assert_eq!(serde_json::from_str::<Row>(&json).unwrap(), row);
    }

    #[test]
    fn answer_value_rejects_out_of_range() {
        assert!(serde_json::from_str::<AnswerValue>("12").is_err());
        assert!(serde_json::from_str::<AnswerValue>(r#""SOMETHING""#).is_err());
    }
}
