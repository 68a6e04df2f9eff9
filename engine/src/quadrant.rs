use serde_derive::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Fixed scan order, also the expansion order.
pub const ALL_QUADRANTS: [Quadrant; 4] = [Quadrant::TopLeft, Quadrant::TopRight, Quadrant::BottomLeft, Quadrant::BottomRight];

#[repr(u8)]
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Copy, Clone, EnumIter, EnumString, Display, Serialize, Deserialize)]
pub enum Quadrant {
	TopLeft = 0,
	TopRight = 1,
	BottomLeft = 2,
	BottomRight = 3,
}

/// A quadrant of a neighboring unit that touches ours across the cell edge.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Mirror {
	pub d_col: i32,
	pub d_row: i32,
	pub quadrant: Quadrant,
}

impl Mirror {
	const fn new(d_col: i32, d_row: i32, quadrant: Quadrant) -> Mirror {
		Mirror { d_col, d_row, quadrant }
	}
}

impl Quadrant {
	pub fn index(&self) -> usize {
		*self as usize
	}

	pub fn is_top(&self) -> bool {
		matches!(self, Quadrant::TopLeft | Quadrant::TopRight)
	}

	pub fn is_left(&self) -> bool {
		matches!(self, Quadrant::TopLeft | Quadrant::BottomLeft)
	}

	///同じ列の上下
	pub fn vertical_partner(&self) -> Quadrant {
		match self {
			Quadrant::TopLeft => Quadrant::BottomLeft,
			Quadrant::TopRight => Quadrant::BottomRight,
			Quadrant::BottomLeft => Quadrant::TopLeft,
			Quadrant::BottomRight => Quadrant::TopRight,
		}
	}

	pub fn horizontal_partner(&self) -> Quadrant {
		match self {
			Quadrant::TopLeft => Quadrant::TopRight,
			Quadrant::TopRight => Quadrant::TopLeft,
			Quadrant::BottomLeft => Quadrant::BottomRight,
			Quadrant::BottomRight => Quadrant::BottomLeft,
		}
	}

	/// Shares an edge inside the unit; diagonals do not.
	pub fn is_adjacent(&self, other: Quadrant) -> bool {
		*self != other && (self.vertical_partner() == other || self.horizontal_partner() == other)
	}

	/// Row 0 is the top of the board, so "above" is `d_row == -1`.
	pub fn mirrors(&self) -> [Mirror; 2] {
		match self {
			Quadrant::TopLeft => [Mirror::new(-1, 0, Quadrant::TopRight), Mirror::new(0, -1, Quadrant::BottomLeft)],
			Quadrant::TopRight => [Mirror::new(1, 0, Quadrant::TopLeft), Mirror::new(0, -1, Quadrant::BottomRight)],
			Quadrant::BottomLeft => [Mirror::new(-1, 0, Quadrant::BottomRight), Mirror::new(0, 1, Quadrant::TopLeft)],
			Quadrant::BottomRight => [Mirror::new(1, 0, Quadrant::BottomLeft), Mirror::new(0, 1, Quadrant::TopRight)],
		}
	}
}
