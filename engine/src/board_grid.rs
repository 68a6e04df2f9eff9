use log::{debug, error};
use serde_derive::{Deserialize, Serialize};

use crate::block_unit::UnitId;
use crate::config::BoardLayout;
use crate::error::CascadeError;
use crate::grid_position::GridPosition;
use crate::unit_store::UnitStore;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GravityMove {
	pub unit: UnitId,
	pub col: i32,
	pub from_row: i32,
	pub to_row: i32,
}

/// Which unit sits in which cell, plus the occupancy flags the spawner reserves
/// landing cells with. Row 0 is the top row.
#[derive(Debug, Clone)]
pub struct BoardGrid {
	size: usize,
	layout: BoardLayout,
	cells: Vec<Option<UnitId>>,
	occupied: Vec<bool>,
}

impl BoardGrid {
	pub fn new(size: usize, layout: BoardLayout) -> BoardGrid {
		BoardGrid {
			size,
			layout,
			cells: vec![None; size * size],
			occupied: vec![false; size * size],
		}
	}

	pub fn size(&self) -> usize {
		self.size
	}

	#[inline]
	pub fn is_valid(&self, col: i32, row: i32) -> bool {
		col >= 0 && row >= 0 && (col as usize) < self.size && (row as usize) < self.size
	}

	#[inline]
	fn index(&self, col: i32, row: i32) -> Option<usize> {
		self.is_valid(col, row).then(|| row as usize * self.size + col as usize)
	}

	fn checked_index(&self, col: i32, row: i32) -> Result<usize, CascadeError> {
		self.index(col, row).ok_or(CascadeError::InvalidCoordinate { col, row })
	}

	pub fn register(&mut self, col: i32, row: i32, unit: UnitId) -> Result<(), CascadeError> {
		let index = self.checked_index(col, row)?;
		self.cells[index] = Some(unit);
		Ok(())
	}

	pub fn unregister(&mut self, col: i32, row: i32) -> Result<Option<UnitId>, CascadeError> {
		let index = self.checked_index(col, row)?;
		Ok(self.cells[index].take())
	}

	pub fn unit_at(&self, col: i32, row: i32) -> Option<UnitId> {
		self.index(col, row).and_then(|i| self.cells[i])
	}

	pub fn set_occupied(&mut self, col: i32, row: i32) -> Result<(), CascadeError> {
		let index = self.checked_index(col, row)?;
		self.occupied[index] = true;
		Ok(())
	}

	pub fn set_empty(&mut self, col: i32, row: i32) -> Result<(), CascadeError> {
		let index = self.checked_index(col, row)?;
		self.occupied[index] = false;
		Ok(())
	}

	pub fn is_occupied(&self, col: i32, row: i32) -> bool {
		self.index(col, row).is_some_and(|i| self.occupied[i])
	}

	pub fn any_occupied(&self) -> bool {
		self.occupied.iter().any(|o| *o)
	}

	pub fn is_full(&self) -> bool {
		(0..self.size as i32).all(|col| self.first_empty_row(col).is_none())
	}

	///下から探して最初の空き
	pub fn first_empty_row(&self, col: i32) -> Option<i32> {
		if !self.is_valid(col, 0) {
			error!("invalid column: {}", col);
			return None;
		}

		(0..self.size as i32).rev().find(|row| !self.is_occupied(col, *row))
	}

	pub fn clear_all(&mut self) {
		self.cells.fill(None);
		self.occupied.fill(false);
	}

	/// Row-major snapshot of every registered unit.
	pub fn registered_units(&self) -> Vec<UnitId> {
		self.cells.iter().flatten().copied().collect()
	}

	/// Forgets everything and registers each live unit at the position it tracks.
	pub fn rebuild_from_live_units(&mut self, units: &UnitStore) -> Vec<CascadeError> {
		self.clear_all();

		let mut faults = Vec::new();
		for unit in units.iter() {
			let position = unit.position();
			match self.checked_index(position.col, position.row) {
				Ok(index) => {
					self.cells[index] = Some(unit.id());
					self.occupied[index] = true;
				}
				Err(e) => {
					error!("unit {:?} tracks an off-board position: {}", unit.id(), e);
					faults.push(e);
				}
			}
		}

		faults
	}

	/// Pulls units down into empty rows of one column, keeping their order.
	pub fn apply_gravity(&mut self, col: i32, units: &mut UnitStore) -> Vec<GravityMove> {
		let mut moves = Vec::new();
		if !self.is_valid(col, 0) {
			error!("invalid column: {}", col);
			return moves;
		}

		for row in (0..self.size as i32).rev() {
			if self.unit_at(col, row).is_some() {
				continue;
			}

			let Some(row_above) = (0..row).rev().find(|r| self.unit_at(col, *r).is_some()) else { continue };
			if let Some(grid_move) = self.move_unit_down(col, row_above, row, units) {
				moves.push(grid_move);
			}
		}

		moves
	}

	fn move_unit_down(&mut self, col: i32, row_above: i32, row_target: i32, units: &mut UnitStore) -> Option<GravityMove> {
		let source = self.index(col, row_above)?;
		let target = self.index(col, row_target)?;
		let unit = self.cells[source].take()?;

		self.occupied[source] = false;
		self.cells[target] = Some(unit);
		self.occupied[target] = true;

		if let Some(block) = units.get_mut(unit) {
			block.set_position(GridPosition::new(col, row_target));
		}

		debug!("moved unit {:?} from row={} down to row={}, col={}", unit, row_above, row_target, col);
		Some(GravityMove {
			unit,
			col,
			from_row: row_above,
			to_row: row_target,
		})
	}

	/// Center of a cell in world space.
	pub fn world_position(&self, col: i32, row: i32) -> Option<(f32, f32)> {
		if !self.is_valid(col, row) {
			error!("invalid position request: row={}, col={}", row, col);
			return None;
		}

		Some((
			self.layout.start_x + col as f32 * self.layout.offset,
			self.layout.start_y - row as f32 * self.layout.offset,
		))
	}
}
