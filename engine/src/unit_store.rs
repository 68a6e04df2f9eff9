use std::collections::BTreeMap;

use crate::block_unit::{BlockUnit, UnitId};
use crate::grid_position::GridPosition;

/// Owns every live unit. Handles are plain ids so phases can snapshot them
/// and keep iterating while units are discarded.
#[derive(Debug, Clone, Default)]
pub struct UnitStore {
	units: BTreeMap<UnitId, BlockUnit>,
	next_id: u32,
}

impl UnitStore {
	pub fn new() -> Self {
		UnitStore::default()
	}

	pub fn create(&mut self, position: GridPosition) -> UnitId {
		self.next_id += 1;
		let id = UnitId(self.next_id);
		self.units.insert(id, BlockUnit::new(id, position));
		id
	}

	pub fn get(&self, id: UnitId) -> Option<&BlockUnit> {
		self.units.get(&id)
	}

	pub fn get_mut(&mut self, id: UnitId) -> Option<&mut BlockUnit> {
		self.units.get_mut(&id)
	}

	pub fn remove(&mut self, id: UnitId) -> Option<BlockUnit> {
		self.units.remove(&id)
	}

	pub fn contains(&self, id: UnitId) -> bool {
		self.units.contains_key(&id)
	}

	pub fn iter(&self) -> impl Iterator<Item=&BlockUnit> {
		self.units.values()
	}

	pub fn len(&self) -> usize {
		self.units.len()
	}

	pub fn is_empty(&self) -> bool {
		self.units.is_empty()
	}

	pub fn child_count(&self) -> usize {
		self.units.values().map(|u| u.len()).sum()
	}
}
