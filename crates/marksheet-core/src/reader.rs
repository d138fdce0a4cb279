//! Per-page pipeline composition.
//!
//! [`SheetReader`] is the entry point: it wraps a validated [`SheetConfig`]
//! and turns one rasterized page into a [`PageAnalysis`]. Create once, read
//! many pages. Each read is a pure transform; grading the output is the
//! caller's step (see [`crate::GradingSession`]).

use image::RgbaImage;
use serde::Serialize;

use crate::binarize::binarize;
use crate::config::{ConfigError, SheetConfig, ANSWER_GRID_COLS};
use crate::decode::{decode_answers, decode_id, flatten_blocks, AnswerValue};
use crate::grid::{detect_marks, DetectionResult, Grid, GridError};

/// Structured reading of one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageAnalysis {
    /// Decoded student ID; unreadable digits appear as
    /// [`crate::decode::ID_PLACEHOLDER`].
    pub student_id: String,
    /// All blocks' answers flattened in block-major order; length is always
    /// `answer_blocks.len() * questions_per_block`.
    pub answers: Vec<AnswerValue>,
    /// Cell-level detection for the ID region, for overlay drawing.
    pub id_detection: DetectionResult,
    /// Cell-level detection per answer block, same order as the config.
    pub block_detections: Vec<DetectionResult>,
}

/// Reads pages under a fixed sheet configuration.
pub struct SheetReader {
    config: SheetConfig,
}

impl SheetReader {
    /// Validate the config once and build a reader for the session.
    pub fn new(config: SheetConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    /// Run binarize → detect → decode over one page buffer.
    ///
    /// Never fails on page content — unreadable marks degrade to
    /// placeholder/blank/multiple values. The error path only fires for
    /// malformed region/grid geometry, which validation has already ruled
    /// out for configs that went through [`SheetReader::new`].
    pub fn read_page(&self, buffer: &RgbaImage) -> Result<PageAnalysis, GridError> {
        let binary = binarize(buffer, self.config.threshold);

        let id_detection = detect_marks(
            &binary,
            &self.config.student_id_region,
            &self.config.student_id_grid,
            self.config.sensitivity,
        )?;
        let student_id = decode_id(&id_detection.matrix);

        let block_grid = Grid {
            rows: self.config.questions_per_block,
            cols: ANSWER_GRID_COLS,
        };

        let mut block_detections = Vec::with_capacity(self.config.answer_blocks.len());
        let mut block_answers = Vec::with_capacity(self.config.answer_blocks.len());
        for block in &self.config.answer_blocks {
            let detection = detect_marks(&binary, &block.region, &block_grid, self.config.sensitivity)?;
            block_answers.push(decode_answers(&detection.matrix));
            block_detections.push(detection);
        }

        let answers = flatten_blocks(&block_answers, self.config.questions_per_block);

        tracing::info!(
            "page read: id={} answered={}/{}",
            student_id,
            answers
                .iter()
                .filter(|a| !matches!(a, AnswerValue::Blank))
                .count(),
            answers.len(),
        );

        Ok(PageAnalysis {
            student_id,
            answers,
            id_detection,
            block_detections,
        })
    }
}
