use std::collections::VecDeque;
use std::str::FromStr;

use log::{debug, warn};
use serde_derive::{Deserialize, Serialize};

use crate::block_color::BlockColor;
use crate::board_context::BoardContext;
use crate::child_block::{ChildSpec, UnitTemplate};
use crate::error::CascadeError;
use crate::grid_position::GridPosition;
use crate::quadrant::Quadrant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildData {
	pub position: String,
	pub color: String,
	#[serde(default, rename = "connectedWith")]
	pub connected_with: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
	pub id: i32,
	#[serde(default, rename = "isSquare")]
	pub is_square: bool,
	#[serde(default)]
	pub children: Vec<ChildData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveData {
	#[serde(default)]
	pub blocks: Vec<BlockData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockGridData {
	pub id: i32,
	pub col: i32,
	pub row: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelData {
	pub id: i32,
	#[serde(default)]
	pub move_data: MoveData,
	#[serde(default)]
	pub blocks_grid_positions: Vec<BlockGridData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelContainer {
	pub levels: Vec<LevelData>,
}

/// A level resolved into typed templates: what starts on the board and what drops next.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
	pub id: i32,
	pub placements: Vec<(GridPosition, UnitTemplate)>,
	pub queue: VecDeque<UnitTemplate>,
}

impl LevelContainer {
	pub fn from_json(text: &str) -> Result<LevelContainer, CascadeError> {
		serde_json::from_str(text).map_err(|e| CascadeError::InvalidLevel(e.to_string()))
	}

	pub fn level(&self, id: i32) -> Result<Level, CascadeError> {
		let data = self.levels.iter()
			.find(|l| l.id == id)
			.ok_or_else(|| CascadeError::InvalidLevel(format!("level {} not found", id)))?;
		Level::from_data(data)
	}
}

fn parse_quadrant(block: i32, name: &str) -> Result<Quadrant, CascadeError> {
	Quadrant::from_str(name).map_err(|_| CascadeError::InvalidLevel(format!("block {}: unknown position {:?}", block, name)))
}

impl BlockData {
	pub fn to_template(&self) -> Result<UnitTemplate, CascadeError> {
		let mut children = Vec::with_capacity(self.children.len());

		for child in &self.children {
			let quadrant = parse_quadrant(self.id, &child.position)?;
			let color = BlockColor::from_str(&child.color)
				.map_err(|_| CascadeError::InvalidLevel(format!("block {}: unknown color {:?}", self.id, child.color)))?;
			let mut spec = ChildSpec::new(quadrant, color);
			if !child.connected_with.is_empty() {
				spec = spec.connected(parse_quadrant(self.id, &child.connected_with)?);
			}
			children.push(spec);
		}

		Ok(UnitTemplate {
			children,
			big_square: self.is_square,
		})
	}
}

impl Level {
	pub fn from_data(data: &LevelData) -> Result<Level, CascadeError> {
		let mut placements = Vec::new();
		let mut queue = VecDeque::new();

		for block in &data.move_data.blocks {
			if block.children.is_empty() {
				warn!("level {}: block {} has no children, skipped", data.id, block.id);
				continue;
			}
			let template = block.to_template()?;
			match data.blocks_grid_positions.iter().find(|g| g.id == block.id) {
				Some(grid) => placements.push((GridPosition::new(grid.col, grid.row), template)),
				None => queue.push_back(template),
			}
		}

		for grid in &data.blocks_grid_positions {
			if !data.move_data.blocks.iter().any(|b| b.id == grid.id) {
				warn!("level {}: grid position for unknown block {}", data.id, grid.id);
			}
		}

		Ok(Level {
			id: data.id,
			placements,
			queue,
		})
	}

	/// Puts every initial placement on the board. Child-level problems are
	/// returned as faults; a bad cell or color fails the whole load.
	pub fn apply(&self, ctx: &mut BoardContext) -> Result<Vec<CascadeError>, CascadeError> {
		let mut faults = Vec::new();
		for (position, template) in &self.placements {
			let (id, unit_faults) = ctx.place_unit(*position, template)?;
			debug!("level {}: unit {:?} at {:?}", self.id, id, position);
			faults.extend(unit_faults);
		}
		Ok(faults)
	}
}

#[cfg(test)]
mod tests {
	use crate::config::BoardConfig;

	use super::*;

	const LEVELS: &str = r#"{
		"levels": [
			{
				"id": 1,
				"moveData": {
					"blocks": [
						{ "id": 1, "isSquare": false, "children": [
							{ "position": "TopLeft", "color": "Blue", "connectedWith": "TopRight" },
							{ "position": "TopRight", "color": "Blue", "connectedWith": "TopLeft" }
						] },
						{ "id": 2, "isSquare": true, "children": [
							{ "position": "TopLeft", "color": "Green", "connectedWith": "" },
							{ "position": "TopRight", "color": "Green", "connectedWith": "" },
							{ "position": "BottomLeft", "color": "Green", "connectedWith": "" },
							{ "position": "BottomRight", "color": "Green", "connectedWith": "" }
						] },
						{ "id": 3, "children": [ { "position": "BottomLeft", "color": "Red" } ] }
					]
				},
				"blocksGridPositions": [ { "id": 1, "col": 0, "row": 5 }, { "id": 2, "col": 1, "row": 5 } ]
			},
			{
				"id": 2,
				"moveData": { "blocks": [ { "id": 1, "children": [ { "position": "Middle", "color": "Red" } ] } ] },
				"blocksGridPositions": []
			}
		]
	}"#;

	#[test]
	fn splits_placements_and_queue() {
		let container = LevelContainer::from_json(LEVELS).unwrap();
		let level = container.level(1).unwrap();

		assert_eq!(level.placements.len(), 2);
		assert_eq!(level.placements[0].0, GridPosition::new(0, 5));
		assert_eq!(level.placements[0].1.children[0].connected_with, Some(Quadrant::TopRight));
		assert!(level.placements[1].1.big_square);
		assert_eq!(level.queue.len(), 1);
		assert_eq!(level.queue[0].children, vec![ChildSpec::new(Quadrant::BottomLeft, BlockColor::Red)]);
	}

	#[test]
	fn applies_initial_board() {
		let level = LevelContainer::from_json(LEVELS).unwrap().level(1).unwrap();
		let mut ctx = BoardContext::new(BoardConfig::default());

		assert!(level.apply(&mut ctx).unwrap().is_empty());
		assert_eq!(ctx.units.len(), 2);
		let unit = ctx.unit_at_cell(0, 5).unwrap();
		assert_eq!(unit.connection_of(Quadrant::TopRight), Some(Quadrant::TopLeft));
		assert!(ctx.unit_at_cell(1, 5).unwrap().is_big_square());
	}

	#[test]
	fn childless_blocks_are_skipped() {
		let json = r#"{ "levels": [ { "id": 1,
			"moveData": { "blocks": [
				{ "id": 1, "children": [] },
				{ "id": 2, "isSquare": false }
			] },
			"blocksGridPositions": [ { "id": 1, "col": 0, "row": 5 } ] } ] }"#;
		let level = LevelContainer::from_json(json).unwrap().level(1).unwrap();
		assert!(level.placements.is_empty());
		assert!(level.queue.is_empty());

		let mut ctx = BoardContext::new(BoardConfig::default());
		assert!(level.apply(&mut ctx).unwrap().is_empty());
		assert!(ctx.is_board_empty());
	}

	#[test]
	fn unknown_names_are_rejected() {
		let container = LevelContainer::from_json(LEVELS).unwrap();
		assert!(matches!(container.level(2), Err(CascadeError::InvalidLevel(_))));
		assert!(matches!(container.level(9), Err(CascadeError::InvalidLevel(_))));
		assert!(LevelContainer::from_json("{ \"levels\": 3 }").is_err());
	}
}
