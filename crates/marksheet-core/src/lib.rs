//! marksheet-core — mark-sheet (bubble sheet) reading and grading.
//!
//! Converts a rasterized answer-sheet page into structured answer data and
//! scores it against a key. The pipeline stages are:
//!
//! 1. **Binarize** – per-pixel ink/background classification with pink
//!    guide-line suppression.
//! 2. **Detect** – per-cell fill-ratio computation over a configured
//!    region/grid partition.
//! 3. **Decode** – cell matrix → student ID (vertical columns) or answer
//!    values (horizontal rows), with explicit blank/ambiguous states.
//! 4. **Grade** – comparison against the session answer key, one result per
//!    page.
//!
//! Stages 1–3 are pure transforms re-run per page; only [`GradingSession`]
//! carries session state. Page rasterization, overlay drawing, and
//! spreadsheet formula generation are collaborators outside this crate.

pub mod binarize;
pub mod config;
pub mod decode;
pub mod export;
pub mod grade;
pub mod grid;
pub mod reader;

pub use binarize::binarize;
pub use config::{AnswerBlock, ConfigError, SheetConfig};
pub use decode::{decode_answers, decode_id, flatten_blocks, mark_is_valid, AnswerValue};
pub use export::{ExportRow, RawData, SheetExport};
pub use grade::{GradedDetail, GradingSession, StudentResult};
pub use grid::{detect_marks, Cell, DetectionResult, Grid, GridError, Region};
pub use reader::{PageAnalysis, SheetReader};
