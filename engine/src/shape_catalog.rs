use std::collections::BTreeMap;

use serde_derive::{Deserialize, Serialize};

use crate::error::CascadeError;
use crate::quadrant::{Quadrant, ALL_QUADRANTS};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeData {
	pub local_pos: (f32, f32),
	pub local_scale: (f32, f32),
}

/// Offset and scale a quadrant takes while it is joined to a partner or part of a big square.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionData {
	pub position_offset: (f32, f32),
	pub scale_adjustment: (f32, f32),
}

/// Everything the presentation layer needs to animate a new child into its slot.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClonePlacement {
	pub quadrant: Quadrant,
	pub shape: ShapeData,
	pub connection: ConnectionData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeCatalog {
	pub shapes: BTreeMap<Quadrant, ShapeData>,
	pub connections: BTreeMap<Quadrant, ConnectionData>,
}

impl Default for ShapeCatalog {
	fn default() -> Self {
		let mut shapes = BTreeMap::new();
		let mut connections = BTreeMap::new();

		for quadrant in ALL_QUADRANTS {
			let x = if quadrant.is_left() { -0.5 } else { 0.5 };
			let y = if quadrant.is_top() { 0.5 } else { -0.5 };

			shapes.insert(quadrant, ShapeData {
				local_pos: (x, y),
				local_scale: (1.0, 1.0),
			});
			//中心に少し寄せて隙間を埋める
			connections.insert(quadrant, ConnectionData {
				position_offset: (-x * 0.05, -y * 0.05),
				scale_adjustment: (1.05, 1.05),
			});
		}

		ShapeCatalog {
			shapes,
			connections,
		}
	}
}

impl ShapeCatalog {
	pub fn without(mut self, quadrant: Quadrant) -> Self {
		self.shapes.remove(&quadrant);
		self.connections.remove(&quadrant);
		self
	}

	pub fn placement(&self, quadrant: Quadrant) -> Result<ClonePlacement, CascadeError> {
		let shape = self.shapes.get(&quadrant);
		let connection = self.connections.get(&quadrant);

		match (shape, connection) {
			(Some(shape), Some(connection)) => Ok(ClonePlacement {
				quadrant,
				shape: *shape,
				connection: *connection,
			}),
			_ => Err(CascadeError::MissingVisualMetadata { quadrant })
		}
	}
}
