use std::collections::BTreeSet;

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::block_unit::{BlockUnit, NeighborLookup, UnitId};
use crate::board_grid::{BoardGrid, GravityMove};
use crate::child_block::{ChildRef, UnitTemplate};
use crate::config::BoardConfig;
use crate::error::CascadeError;
use crate::grid_position::GridPosition;
use crate::shape_catalog::ShapeCatalog;
use crate::unit_store::UnitStore;

/// The explicit simulation context: registry, live units, palette, shapes
/// and the seeded rng. Passed by reference into every phase.
#[derive(Debug, Clone)]
pub struct BoardContext {
	pub config: BoardConfig,
	pub grid: BoardGrid,
	pub units: UnitStore,
	rng: StdRng,
}

impl NeighborLookup for BoardContext {
	fn unit_at(&self, position: GridPosition) -> Option<&BlockUnit> {
		let id = self.grid.unit_at(position.col, position.row)?;
		self.units.get(id)
	}
}

impl BoardContext {
	pub fn new(config: BoardConfig) -> BoardContext {
		BoardContext {
			grid: BoardGrid::new(config.board_size, config.layout),
			units: UnitStore::new(),
			rng: StdRng::seed_from_u64(config.seed),
			config,
		}
	}

	pub fn size(&self) -> usize {
		self.grid.size()
	}

	pub fn shapes(&self) -> &ShapeCatalog {
		&self.config.shapes
	}

	pub fn rng_mut(&mut self) -> &mut StdRng {
		&mut self.rng
	}

	pub fn unit(&self, id: UnitId) -> Option<&BlockUnit> {
		self.units.get(id)
	}

	pub fn unit_at_cell(&self, col: i32, row: i32) -> Option<&BlockUnit> {
		self.unit_at(GridPosition::new(col, row))
	}

	/// Creates a unit from `template` at `position`, registers it and marks the cell occupied.
	/// Children the template describes badly are skipped and returned as faults.
	/// A template that yields no children at all is refused and nothing is registered.
	pub fn place_unit(&mut self, position: GridPosition, template: &UnitTemplate) -> Result<(UnitId, Vec<CascadeError>), CascadeError> {
		if !self.grid.is_valid(position.col, position.row) {
			return Err(CascadeError::InvalidCoordinate { col: position.col, row: position.row });
		}

		if let Some(spec) = template.children.iter().find(|s| !self.config.allows(s.color)) {
			return Err(CascadeError::Config(format!("{} is not in the palette", spec.color)));
		}

		if let Some(existing) = self.grid.unit_at(position.col, position.row) {
			error!("cell col={}, row={} already holds unit {:?}", position.col, position.row, existing);
			return Err(CascadeError::InvalidCoordinate { col: position.col, row: position.row });
		}

		let id = self.units.create(position);
		let faults = match self.units.get_mut(id) {
			Some(unit) => unit.populate(template),
			None => return Err(CascadeError::UnknownUnit(id)),
		};
		if self.units.get(id).map_or(true, BlockUnit::is_empty) {
			self.units.remove(id);
			warn!("template for col={}, row={} produced no children", position.col, position.row);
			return Err(CascadeError::EmptyUnit { col: position.col, row: position.row });
		}
		self.grid.register(position.col, position.row, id)?;
		self.grid.set_occupied(position.col, position.row)?;

		debug!("placed unit {:?} at col={}, row={}", id, position.col, position.row);
		Ok((id, faults))
	}

	/// Union of every live unit's matches.
	pub fn collect_matches(&self) -> BTreeSet<ChildRef> {
		let mut matched = BTreeSet::new();
		for unit in self.units.iter() {
			matched.extend(unit.find_matches(self));
		}
		matched
	}

	/// Detaches every matched child in one batch. Returns the children actually removed.
	pub fn destroy(&mut self, matched: &BTreeSet<ChildRef>) -> Vec<ChildRef> {
		let mut removed = Vec::with_capacity(matched.len());
		for child in matched {
			let Some(unit) = self.units.get_mut(child.unit) else { continue };
			if unit.detach(child.quadrant).is_some() {
				removed.push(*child);
			}
		}
		removed
	}

	pub fn rebuild_registry(&mut self) -> Vec<CascadeError> {
		self.grid.rebuild_from_live_units(&self.units)
	}

	/// Tears the unit down if it has no children left: unregisters it, frees
	/// its cell, drops it and lets its column fall.
	pub fn check_if_empty(&mut self, id: UnitId) -> Option<(GridPosition, Vec<GravityMove>)> {
		let unit = self.units.get(id)?;
		if !unit.is_empty() {
			return None;
		}

		let position = unit.position();
		if self.grid.unit_at(position.col, position.row) == Some(id) {
			if let Err(e) = self.grid.unregister(position.col, position.row).and_then(|_| self.grid.set_empty(position.col, position.row)) {
				error!("freeing col={}, row={} for unit {:?}: {}", position.col, position.row, id, e);
			}
		}
		self.units.remove(id);
		info!("unit {:?} emptied at col={}, row={}", id, position.col, position.row);

		let moves = self.grid.apply_gravity(position.col, &mut self.units);
		Some((position, moves))
	}

	/// Gravity over every column, left to right.
	pub fn settle(&mut self) -> Vec<GravityMove> {
		let mut moves = Vec::new();
		for col in 0..self.size() as i32 {
			moves.extend(self.grid.apply_gravity(col, &mut self.units));
		}
		moves
	}

	pub fn is_board_empty(&self) -> bool {
		self.units.is_empty()
	}

	/// Checks that the registry mirrors the live units and every unit's
	/// connections are sound.
	pub fn verify(&self) -> Result<(), String> {
		for unit in self.units.iter() {
			let position = unit.position();
			if self.grid.unit_at(position.col, position.row) != Some(unit.id()) {
				return Err(format!("unit {:?} at {:?} is not registered there", unit.id(), position));
			}
			if !unit.connections_consistent() {
				return Err(format!("unit {:?} has a broken connection", unit.id()));
			}
		}

		let registered = self.grid.registered_units();
		if registered.len() != self.units.len() {
			return Err(format!("{} cells registered for {} live units", registered.len(), self.units.len()));
		}

		Ok(())
	}

	/// Text dump used by logs and tests: one line per row, four codes per cell
	/// (`.` empty quadrant, `____` empty cell), cells separated by `|`.
	pub fn to_text(&self) -> String {
		let mut text = String::new();
		for row in 0..self.size() as i32 {
			let cells: Vec<String> = (0..self.size() as i32).map(|col| match self.unit_at_cell(col, row) {
				Some(unit) => crate::quadrant::ALL_QUADRANTS.iter()
					.map(|q| unit.child(*q).map_or('.', |c| c.color.to_code()))
					.collect(),
				None => "____".to_owned(),
			}).collect();
			text += &cells.join("|");
			text += "\n";
		}
		text
	}
}

#[cfg(test)]
mod tests {
	use crate::block_color::BlockColor;
	use crate::child_block::ChildSpec;

	use super::*;

	fn context() -> BoardContext {
		BoardContext::new(BoardConfig::default())
	}

	#[test]
	fn place_unit_registers_and_occupies() {
		let mut ctx = context();
		let (id, faults) = ctx.place_unit(GridPosition::new(2, 5), &UnitTemplate::from_codes("RRG.").unwrap()).unwrap();
		assert!(faults.is_empty());
		assert_eq!(ctx.grid.unit_at(2, 5), Some(id));
		assert!(ctx.grid.is_occupied(2, 5));
		assert_eq!(ctx.grid.first_empty_row(2), Some(4));
		assert!(ctx.verify().is_ok());
	}

	#[test]
	fn place_unit_rejects_bad_cells_and_colors() {
		let mut config = BoardConfig::default();
		config.palette = vec![BlockColor::Red];
		let mut ctx = BoardContext::new(config);
		let template = UnitTemplate::from_codes("R...").unwrap();

		assert!(ctx.place_unit(GridPosition::new(6, 0), &template).is_err());
		ctx.place_unit(GridPosition::new(0, 5), &template).unwrap();
		assert!(ctx.place_unit(GridPosition::new(0, 5), &template).is_err());
		assert!(ctx.place_unit(GridPosition::new(1, 5), &UnitTemplate::new(vec![ChildSpec::new(crate::quadrant::Quadrant::TopLeft, BlockColor::Blue)])).is_err());
		assert_eq!(ctx.units.len(), 1);
		assert!(ctx.verify().is_ok());
	}

	#[test]
	fn place_unit_refuses_childless_template() {
		let mut ctx = context();
		assert_eq!(ctx.place_unit(GridPosition::new(0, 5), &UnitTemplate::new(vec![])), Err(CascadeError::EmptyUnit { col: 0, row: 5 }));
		assert!(ctx.units.is_empty());
		assert!(!ctx.grid.any_occupied());
		assert!(ctx.is_board_empty());
		assert!(ctx.verify().is_ok());
	}

	#[test]
	fn check_if_empty_discards_and_drops_column() {
		let mut ctx = context();
		let (bottom, _) = ctx.place_unit(GridPosition::new(0, 5), &UnitTemplate::from_codes("R...").unwrap()).unwrap();
		let (top, _) = ctx.place_unit(GridPosition::new(0, 4), &UnitTemplate::from_codes("B...").unwrap()).unwrap();

		assert!(ctx.check_if_empty(top).is_none());
		ctx.units.get_mut(bottom).unwrap().detach(crate::quadrant::Quadrant::TopLeft);

		let (position, moves) = ctx.check_if_empty(bottom).unwrap();
		assert_eq!(position, GridPosition::new(0, 5));
		assert_eq!(moves.len(), 1);
		assert!(!ctx.units.contains(bottom));
		assert_eq!(ctx.unit(top).unwrap().position(), GridPosition::new(0, 5));
		assert!(ctx.verify().is_ok());
	}

	#[test]
	fn text_dump_shows_quadrants() {
		let mut ctx = BoardContext::new(BoardConfig::with_size(2));
		ctx.place_unit(GridPosition::new(1, 1), &UnitTemplate::from_codes("R..G").unwrap()).unwrap();
		assert_eq!(ctx.to_text(), "____|____\n____|R..G\n");
	}
}
