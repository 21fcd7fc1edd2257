use crate::color::PackedColor;
use crate::color::MAX_PACKED_COLOR;

pub const WIDTH: usize = 16;
pub const HEIGHT: usize = 16;
pub const NUM_PIXELS: usize = WIDTH * HEIGHT;

/// One full snapshot of the remote canvas, row-major, as published.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(transparent)]
pub struct CanvasFrame {
    rows: Vec<Vec<PackedColor>>,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("Frame has {} rows, expected {}", .0, HEIGHT)]
    RowCount(usize),

    #[error("Row {row} has {width} cells, expected {}", WIDTH)]
    RowWidth { row: usize, width: usize },

    #[error("Color {color:#x} at ({x}, {y}) exceeds 24 bits")]
    ColorOutOfRange {
        x: usize,
        y: usize,
        color: PackedColor,
    },
}

impl CanvasFrame {
    pub fn new(rows: Vec<Vec<PackedColor>>) -> Self {
        Self { rows }
    }

    pub fn validate(&self) -> Result<(), FrameError> {
        if self.rows.len() != HEIGHT {
            return Err(FrameError::RowCount(self.rows.len()));
        }

        for (y, row) in self.rows.iter().enumerate() {
            if row.len() != WIDTH {
                return Err(FrameError::RowWidth {
                    row: y,
                    width: row.len(),
                });
            }

            if let Some((x, &color)) = row
                .iter()
                .enumerate()
                .find(|(_, color)| **color > MAX_PACKED_COLOR)
            {
                return Err(FrameError::ColorOutOfRange { x, y, color });
            }
        }

        Ok(())
    }
}

/// Physical LED index of the logical cell `(x, y)`.
///
/// The matrix is wired as a serpentine: odd rows run right to left, and the strip starts at the
/// logical bottom-right corner, so the row-major sequence is flattened and then reversed.
#[inline]
pub const fn physical_index(x: usize, y: usize) -> usize {
    let x = if y % 2 == 1 { WIDTH - 1 - x } else { x };
    NUM_PIXELS - 1 - (y * WIDTH + x)
}

/// What the display should show next, in physical pixel order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetState {
    pixels: [PackedColor; NUM_PIXELS],
}

impl Default for TargetState {
    fn default() -> Self {
        Self {
            pixels: [0; NUM_PIXELS],
        }
    }
}

impl TargetState {
    pub fn from_frame(frame: &CanvasFrame) -> Result<Self, FrameError> {
        frame.validate()?;

        let mut pixels = [0; NUM_PIXELS];
        for (y, row) in frame.rows.iter().enumerate() {
            for (x, &color) in row.iter().enumerate() {
                pixels[physical_index(x, y)] = color;
            }
        }

        Ok(Self { pixels })
    }

    #[inline]
    pub fn get(&self, position: usize) -> Option<PackedColor> {
        self.pixels.get(position).copied()
    }

    pub fn pixels(&self) -> &[PackedColor; NUM_PIXELS] {
        &self.pixels
    }
}
