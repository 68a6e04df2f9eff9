use serde_derive::{Deserialize, Serialize};

use crate::block_color::BlockColor;
use crate::block_unit::UnitId;
use crate::quadrant::Quadrant;

/// One colored piece. Its connection lives in the owning unit so both sides change together.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChildBlock {
	pub color: BlockColor,
	pub quadrant: Quadrant,
	pub big_square: bool,
}

impl ChildBlock {
	pub fn new(color: BlockColor, quadrant: Quadrant) -> ChildBlock {
		ChildBlock {
			color,
			quadrant,
			big_square: false,
		}
	}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChildRef {
	pub unit: UnitId,
	pub quadrant: Quadrant,
}

impl ChildRef {
	pub fn new(unit: UnitId, quadrant: Quadrant) -> ChildRef {
		ChildRef { unit, quadrant }
	}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildSpec {
	pub quadrant: Quadrant,
	pub color: BlockColor,
	pub connected_with: Option<Quadrant>,
}

impl ChildSpec {
	pub fn new(quadrant: Quadrant, color: BlockColor) -> ChildSpec {
		ChildSpec {
			quadrant,
			color,
			connected_with: None,
		}
	}

	pub fn connected(mut self, partner: Quadrant) -> ChildSpec {
		self.connected_with = Some(partner);
		self
	}
}

/// A unit as described by level data or the generator, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitTemplate {
	pub children: Vec<ChildSpec>,
	pub big_square: bool,
}

impl UnitTemplate {
	pub fn new(children: Vec<ChildSpec>) -> UnitTemplate {
		UnitTemplate {
			children,
			big_square: false,
		}
	}

	pub fn big_square(color: BlockColor) -> UnitTemplate {
		UnitTemplate {
			children: crate::quadrant::ALL_QUADRANTS.iter().map(|q| ChildSpec::new(*q, color)).collect(),
			big_square: true,
		}
	}

	/// Compact notation used by tests and the console: four cells in
	/// TopLeft, TopRight, BottomLeft, BottomRight order, `.` for empty,
	/// e.g. `"R.GG"`.
	pub fn from_codes(codes: &str) -> Option<UnitTemplate> {
		let chars: Vec<char> = codes.chars().collect();
		if chars.len() != 4 {
			return None;
		}

		let mut children = Vec::new();
		for (quadrant, code) in crate::quadrant::ALL_QUADRANTS.iter().zip(chars) {
			if code == '.' {
				continue;
			}
			children.push(ChildSpec::new(*quadrant, BlockColor::from_code(code)?));
		}

		Some(UnitTemplate::new(children))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn codes_build_templates() {
		let template = UnitTemplate::from_codes("R..G").unwrap();
		assert_eq!(template.children, vec![
			ChildSpec::new(Quadrant::TopLeft, BlockColor::Red),
			ChildSpec::new(Quadrant::BottomRight, BlockColor::Green),
		]);
		assert!(UnitTemplate::from_codes("R.G").is_none());
		assert!(UnitTemplate::from_codes("R.GZ").is_none());
	}
}
