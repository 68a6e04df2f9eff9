use serde_derive::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

pub const DEFAULT_PALETTE: [BlockColor; 8] = [
	BlockColor::Blue,
	BlockColor::DarkBlue,
	BlockColor::Green,
	BlockColor::Orange,
	BlockColor::Pink,
	BlockColor::Purple,
	BlockColor::Red,
	BlockColor::Yellow,
];

#[repr(u8)]
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Copy, Clone, EnumIter, EnumString, Display, Serialize, Deserialize)]
pub enum BlockColor {
	Blue = 1,
	DarkBlue = 2,
	Green = 3,
	Orange = 4,
	Pink = 5,
	Purple = 6,
	Red = 7,
	Yellow = 8,
}

impl BlockColor {
	/// One letter per color, used by the text board notation.
	pub fn to_code(&self) -> char {
		match self {
			BlockColor::Blue => 'B',
			BlockColor::DarkBlue => 'D',
			BlockColor::Green => 'G',
			BlockColor::Orange => 'O',
			BlockColor::Pink => 'K',
			BlockColor::Purple => 'P',
			BlockColor::Red => 'R',
			BlockColor::Yellow => 'Y',
		}
	}

	pub fn from_code(code: char) -> Option<BlockColor> {
		match code.to_ascii_uppercase() {
			'B' => Some(BlockColor::Blue),
			'D' => Some(BlockColor::DarkBlue),
			'G' => Some(BlockColor::Green),
			'O' => Some(BlockColor::Orange),
			'K' => Some(BlockColor::Pink),
			'P' => Some(BlockColor::Purple),
			'R' => Some(BlockColor::Red),
			'Y' => Some(BlockColor::Yellow),
			_ => None
		}
	}
}
