use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
	pub col: i32,
	pub row: i32,
}

impl GridPosition {
	pub fn new(col: i32, row: i32) -> GridPosition {
		GridPosition {
			col,
			row,
		}
	}

	pub fn offset(&self, d_col: i32, d_row: i32) -> GridPosition {
		GridPosition::new(self.col + d_col, self.row + d_row)
	}
}
