//! Sheet layout and tuning configuration.
//!
//! Config JSON follows a versioned schema (`marksheet.config.v1`). The
//! active block count is the length of `answer_blocks`, fixed and validated
//! when the config is built — nothing reads it per call.

use std::path::Path;

use crate::grid::{Grid, Region};

const CONFIG_SCHEMA_V1: &str = "marksheet.config.v1";

// Digit rows of the ID grid encode the digit value, so more than ten rows
// cannot be represented.
const MAX_ID_ROWS: u32 = 10;
const MAX_BLOCKS: usize = 4;

/// Every answer block exposes ten physical option columns (printed 1..9,0),
/// regardless of how many options its questions actually offer.
pub const ANSWER_GRID_COLS: u32 = 10;

// ── Error type ─────────────────────────────────────────────────────────────

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// JSON carries an unknown schema string.
    SchemaMismatch { found: String },
    /// Sensitivity outside [0, 1].
    SensitivityRange(f32),
    /// A named region has zero width or height.
    EmptyRegion { name: &'static str },
    /// The student-ID grid has zero rows or columns.
    EmptyIdGrid { rows: u32, cols: u32 },
    /// The student-ID grid has more rows than digits.
    IdGridTooTall { rows: u32 },
    /// Active block count outside 1..=4.
    BlockCount(usize),
    /// `questions_per_block` is zero.
    NoQuestions,
    /// A block's `max_option` outside 1..=10.
    MaxOptionRange { block: usize, value: u8 },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SchemaMismatch { found } => write!(
                f,
                "unsupported config schema '{}' (expected '{}')",
                found, CONFIG_SCHEMA_V1
            ),
            Self::SensitivityRange(v) => write!(f, "sensitivity {} outside [0, 1]", v),
            Self::EmptyRegion { name } => write!(f, "{} region has zero width or height", name),
            Self::EmptyIdGrid { rows, cols } => {
                write!(f, "student ID grid must be non-empty, got {}x{}", rows, cols)
            }
            Self::IdGridTooTall { rows } => write!(
                f,
                "student ID grid has {} rows; at most {} are decodable as digits",
                rows, MAX_ID_ROWS
            ),
            Self::BlockCount(n) => {
                write!(f, "expected 1 to {} answer blocks, got {}", MAX_BLOCKS, n)
            }
            Self::NoQuestions => write!(f, "questions_per_block must be non-zero"),
            Self::MaxOptionRange { block, value } => write!(
                f,
                "block {}: max_option {} outside 1..=10",
                block + 1,
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

// ── Types ──────────────────────────────────────────────────────────────────

/// One answer block: its page region and how many options its questions
/// actually offer (out-of-range marks are decoded anyway and only flagged).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnswerBlock {
    pub region: Region,
    /// Highest valid printed option, 1..=10. 10 accepts every column.
    pub max_option: u8,
}

/// Immutable per-session sheet configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SheetConfig {
    /// Binarization luma threshold, 0–255.
    pub threshold: u8,
    /// Fill-ratio threshold for a cell to count as marked, [0, 1].
    pub sensitivity: f32,
    pub student_id_region: Region,
    pub student_id_grid: Grid,
    /// Active blocks in reading order; length is the active block count.
    pub answer_blocks: Vec<AnswerBlock>,
    pub questions_per_block: u32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SheetConfigSpecV1 {
    schema: String,
    threshold: u8,
    sensitivity: f32,
    student_id_region: Region,
    student_id_grid: Grid,
    answer_blocks: Vec<AnswerBlock>,
    questions_per_block: u32,
}

impl SheetConfig {
    /// Validate all cross-field constraints.
    ///
    /// Called once at build time ([`crate::SheetReader::new`]); the reader
    /// then treats the config as trusted for the session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.sensitivity) {
            return Err(ConfigError::SensitivityRange(self.sensitivity));
        }
        if self.student_id_region.w == 0 || self.student_id_region.h == 0 {
            return Err(ConfigError::EmptyRegion { name: "student ID" });
        }
        if self.student_id_grid.rows == 0 || self.student_id_grid.cols == 0 {
            return Err(ConfigError::EmptyIdGrid {
                rows: self.student_id_grid.rows,
                cols: self.student_id_grid.cols,
            });
        }
        if self.student_id_grid.rows > MAX_ID_ROWS {
            return Err(ConfigError::IdGridTooTall {
                rows: self.student_id_grid.rows,
            });
        }
        if self.answer_blocks.is_empty() || self.answer_blocks.len() > MAX_BLOCKS {
            return Err(ConfigError::BlockCount(self.answer_blocks.len()));
        }
        if self.questions_per_block == 0 {
            return Err(ConfigError::NoQuestions);
        }
        for (i, block) in self.answer_blocks.iter().enumerate() {
            if block.region.w == 0 || block.region.h == 0 {
                return Err(ConfigError::EmptyRegion { name: "answer block" });
            }
            if !(1..=10).contains(&block.max_option) {
                return Err(ConfigError::MaxOptionRange {
                    block: i,
                    value: block.max_option,
                });
            }
        }
        Ok(())
    }

    /// Load a validated config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data).map_err(Into::into)
    }

    /// Parse and validate a config from JSON text.
    pub fn from_json_str(data: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let spec: SheetConfigSpecV1 = serde_json::from_str(data)?;
        if spec.schema != CONFIG_SCHEMA_V1 {
            return Err(ConfigError::SchemaMismatch { found: spec.schema }.into());
        }
        let config = Self {
            threshold: spec.threshold,
            sensitivity: spec.sensitivity,
            student_id_region: spec.student_id_region,
            student_id_grid: spec.student_id_grid,
            answer_blocks: spec.answer_blocks,
            questions_per_block: spec.questions_per_block,
        };
        config.validate()?;
        Ok(config)
    }

    /// Serialize with the schema tag, pretty-printed.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        let spec = SheetConfigSpecV1 {
            schema: CONFIG_SCHEMA_V1.to_string(),
            threshold: self.threshold,
            sensitivity: self.sensitivity,
            student_id_region: self.student_id_region,
            student_id_grid: self.student_id_grid,
            answer_blocks: self.answer_blocks.clone(),
            questions_per_block: self.questions_per_block,
        };
        serde_json::to_string_pretty(&spec)
    }
}

impl Default for SheetConfig {
    /// Layout of the reference A4 sheet at the fixed rasterizer scale:
    /// a 7-digit ID box and four 25-question blocks of 10 columns.
    fn default() -> Self {
        Self {
            threshold: 200,
            sensitivity: 0.2,
            student_id_region: Region {
                x: 100,
                y: 229,
                w: 177,
                h: 272,
            },
            student_id_grid: Grid { rows: 10, cols: 7 },
            answer_blocks: vec![
                AnswerBlock {
                    region: Region { x: 348, y: 174, w: 184, h: 677 },
                    max_option: 10,
                },
                AnswerBlock {
                    region: Region { x: 569, y: 176, w: 182, h: 675 },
                    max_option: 10,
                },
                AnswerBlock {
                    region: Region { x: 790, y: 177, w: 182, h: 674 },
                    max_option: 10,
                },
                AnswerBlock {
                    region: Region { x: 1011, y: 177, w: 180, h: 677 },
                    max_option: 10,
                },
            ],
            questions_per_block: 25,
        }
    }
}
