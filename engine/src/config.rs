use std::collections::BTreeSet;

use serde_derive::{Deserialize, Serialize};

use crate::block_color::{BlockColor, DEFAULT_PALETTE};
use crate::error::CascadeError;
use crate::shape_catalog::ShapeCatalog;

pub const DEFAULT_BOARD_SIZE: usize = 6;
pub const MIN_BOARD_SIZE: usize = 2;
pub const MAX_BOARD_SIZE: usize = 16;

/// World-space placement of the cell centers; row 0 is drawn at `start_y`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardLayout {
	pub start_x: f32,
	pub start_y: f32,
	pub offset: f32,
}

impl Default for BoardLayout {
	fn default() -> Self {
		BoardLayout {
			start_x: -5.25,
			start_y: 5.25,
			offset: 2.1,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
	pub board_size: usize,
	pub palette: Vec<BlockColor>,
	/// `None` means 4 * N * N, the number of quadrants the board can hold.
	pub max_cascade_passes: Option<usize>,
	pub seed: u64,
	pub layout: BoardLayout,
	pub shapes: ShapeCatalog,
}

impl Default for BoardConfig {
	fn default() -> Self {
		BoardConfig {
			board_size: DEFAULT_BOARD_SIZE,
			palette: DEFAULT_PALETTE.to_vec(),
			max_cascade_passes: None,
			seed: 0,
			layout: BoardLayout::default(),
			shapes: ShapeCatalog::default(),
		}
	}
}

impl BoardConfig {
	pub fn with_size(board_size: usize) -> Self {
		BoardConfig {
			board_size,
			..BoardConfig::default()
		}
	}

	pub fn from_ron(text: &str) -> Result<Self, CascadeError> {
		let config: BoardConfig = ron::from_str(text).map_err(|e| CascadeError::Config(e.to_string()))?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), CascadeError> {
		if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&self.board_size) {
			return Err(CascadeError::Config(format!("board_size {} is outside {}..={}", self.board_size, MIN_BOARD_SIZE, MAX_BOARD_SIZE)));
		}
		if self.palette.is_empty() {
			return Err(CascadeError::Config("palette is empty".to_owned()));
		}
		let unique: BTreeSet<_> = self.palette.iter().collect();
		if unique.len() != self.palette.len() {
			return Err(CascadeError::Config("palette lists a color twice".to_owned()));
		}
		if self.max_cascade_passes == Some(0) {
			return Err(CascadeError::Config("max_cascade_passes must be positive".to_owned()));
		}
		Ok(())
	}

	pub fn cascade_pass_limit(&self) -> usize {
		self.max_cascade_passes.unwrap_or(4 * self.board_size * self.board_size)
	}

	pub fn allows(&self, color: BlockColor) -> bool {
		self.palette.contains(&color)
	}
}
