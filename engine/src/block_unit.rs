use std::collections::BTreeSet;

use log::{debug, warn};
use serde_derive::{Deserialize, Serialize};

use crate::block_color::BlockColor;
use crate::child_block::{ChildBlock, ChildRef, UnitTemplate};
use crate::error::CascadeError;
use crate::grid_position::GridPosition;
use crate::quadrant::{Quadrant, ALL_QUADRANTS};
use crate::shape_catalog::{ClonePlacement, ShapeCatalog};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// Lets a unit read its neighbors without knowing how the board stores them.
pub trait NeighborLookup {
	fn unit_at(&self, position: GridPosition) -> Option<&BlockUnit>;
}

/// Symmetric partner table. Every mutation writes both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Connections([Option<Quadrant>; 4]);

impl Connections {
	fn partner(&self, quadrant: Quadrant) -> Option<Quadrant> {
		self.0[quadrant.index()]
	}

	fn link(&mut self, a: Quadrant, b: Quadrant) {
		self.unlink(a);
		self.unlink(b);
		self.0[a.index()] = Some(b);
		self.0[b.index()] = Some(a);
	}

	fn unlink(&mut self, quadrant: Quadrant) -> Option<Quadrant> {
		let partner = self.0[quadrant.index()].take()?;
		self.0[partner.index()] = None;
		Some(partner)
	}

	fn clear(&mut self) {
		self.0 = [None; 4];
	}

	fn is_empty(&self) -> bool {
		self.0.iter().all(|p| p.is_none())
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloneRecord {
	pub source: Quadrant,
	pub color: BlockColor,
	pub connected: bool,
	pub placement: ClonePlacement,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpandOutcome {
	pub clones: Vec<CloneRecord>,
	pub faults: Vec<CascadeError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromotionOutcome {
	/// Set when the unit changed state; `None` for ineligible or already complete units.
	pub promoted: Option<BlockColor>,
	pub filled: Vec<ClonePlacement>,
	pub faults: Vec<CascadeError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockUnit {
	id: UnitId,
	position: GridPosition,
	children: [Option<ChildBlock>; 4],
	connections: Connections,
}

impl BlockUnit {
	pub fn new(id: UnitId, position: GridPosition) -> BlockUnit {
		BlockUnit {
			id,
			position,
			children: [None; 4],
			connections: Connections::default(),
		}
	}

	pub fn id(&self) -> UnitId {
		self.id
	}

	pub fn position(&self) -> GridPosition {
		self.position
	}

	pub fn set_position(&mut self, position: GridPosition) {
		self.position = position;
	}

	/// Creates the children described by `template`. Entries that clash are
	/// skipped and reported; the rest of the unit is still built.
	pub fn populate(&mut self, template: &UnitTemplate) -> Vec<CascadeError> {
		let mut faults = Vec::new();

		for spec in &template.children {
			if let Err(e) = self.insert_child(spec.quadrant, spec.color) {
				faults.push(e);
			}
		}

		if template.big_square {
			for child in self.children.iter_mut().flatten() {
				child.big_square = true;
			}
			return faults;
		}

		for spec in &template.children {
			let Some(partner) = spec.connected_with else { continue };
			if self.connection_of(spec.quadrant) == Some(partner) {
				continue;
			}
			// どちらかが既に別の相手と繋がっている
			let taken = |q: Quadrant, other: Quadrant| self.connection_of(q).is_some_and(|c| c != other);
			if taken(spec.quadrant, partner) || taken(partner, spec.quadrant) {
				faults.push(CascadeError::InvalidConnection { from: spec.quadrant, to: partner });
				continue;
			}
			if let Err(e) = self.connect(spec.quadrant, partner) {
				faults.push(e);
			}
		}

		faults
	}

	pub fn insert_child(&mut self, quadrant: Quadrant, color: BlockColor) -> Result<(), CascadeError> {
		let slot = &mut self.children[quadrant.index()];
		if slot.is_some() {
			return Err(CascadeError::QuadrantOccupied { quadrant });
		}
		*slot = Some(ChildBlock::new(color, quadrant));
		Ok(())
	}

	pub fn child(&self, quadrant: Quadrant) -> Option<&ChildBlock> {
		self.children[quadrant.index()].as_ref()
	}

	pub fn child_ref(&self, quadrant: Quadrant) -> ChildRef {
		ChildRef::new(self.id, quadrant)
	}

	pub fn children(&self) -> impl Iterator<Item=(Quadrant, &ChildBlock)> + '_ {
		ALL_QUADRANTS.into_iter().filter_map(move |q| self.child(q).map(|c| (q, c)))
	}

	pub fn empty_quadrants(&self) -> Vec<Quadrant> {
		ALL_QUADRANTS.into_iter().filter(|q| self.child(*q).is_none()).collect()
	}

	pub fn len(&self) -> usize {
		self.children.iter().flatten().count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn is_full(&self) -> bool {
		self.len() == 4
	}

	pub fn connection_of(&self, quadrant: Quadrant) -> Option<Quadrant> {
		self.connections.partner(quadrant)
	}

	pub fn connect(&mut self, a: Quadrant, b: Quadrant) -> Result<(), CascadeError> {
		let valid = a != b && match (self.child(a), self.child(b)) {
			(Some(ca), Some(cb)) => !ca.big_square && !cb.big_square,
			_ => false
		};
		if !valid {
			return Err(CascadeError::InvalidConnection { from: a, to: b });
		}

		self.connections.link(a, b);
		Ok(())
	}

	pub fn disconnect(&mut self, quadrant: Quadrant) -> Option<Quadrant> {
		self.connections.unlink(quadrant)
	}

	/// Removes a child; its partner (if any) loses the connection in the same step.
	pub fn detach(&mut self, quadrant: Quadrant) -> Option<ChildBlock> {
		self.connections.unlink(quadrant);
		self.children[quadrant.index()].take()
	}

	/// The color every child shares, if there is exactly one.
	pub fn single_color(&self) -> Option<BlockColor> {
		let mut children = self.children();
		let (_, first) = children.next()?;
		children.all(|(_, c)| c.color == first.color).then_some(first.color)
	}

	pub fn is_big_square(&self) -> bool {
		self.is_full() && self.children().all(|(_, c)| c.big_square)
	}

	fn refs_with_color(&self, color: BlockColor) -> impl Iterator<Item=ChildRef> + '_ {
		self.children().filter(move |(_, c)| c.color == color).map(|(q, _)| self.child_ref(q))
	}

	fn partner_with_color(&self, quadrant: Quadrant, color: BlockColor) -> Option<ChildRef> {
		let partner = self.connection_of(quadrant)?;
		let child = self.child(partner)?;
		(child.color == color).then(|| self.child_ref(partner))
	}

	///隣のユニットで接している同色の象限
	fn matching_mirrors<'a, L: NeighborLookup>(&self, board: &'a L, quadrant: Quadrant, color: BlockColor) -> Vec<(&'a BlockUnit, Quadrant)> {
		let mut found = Vec::with_capacity(2);

		for mirror in quadrant.mirrors() {
			let Some(neighbor) = board.unit_at(self.position.offset(mirror.d_col, mirror.d_row)) else { continue };
			if neighbor.id == self.id {
				continue;
			}
			if let Some(child) = neighbor.child(mirror.quadrant) {
				if child.color == color {
					found.push((neighbor, mirror.quadrant));
				}
			}
		}

		found
	}

	/// Children of this unit (and of touching units) that this unit's quadrants pull into a match.
	pub fn find_matches<L: NeighborLookup>(&self, board: &L) -> BTreeSet<ChildRef> {
		let mut matched = BTreeSet::new();

		for (quadrant, child) in self.children() {
			let mirrors = self.matching_mirrors(board, quadrant, child.color);
			if mirrors.is_empty() {
				continue;
			}

			if child.big_square {
				matched.extend(self.refs_with_color(child.color));
				for (neighbor, _) in &mirrors {
					matched.extend(neighbor.refs_with_color(child.color));
				}
				continue;
			}

			for (neighbor, mirror_quadrant) in mirrors {
				matched.insert(self.child_ref(quadrant));
				matched.insert(neighbor.child_ref(mirror_quadrant));
				matched.extend(self.partner_with_color(quadrant, child.color));
				matched.extend(neighbor.partner_with_color(mirror_quadrant, child.color));
			}
		}

		matched
	}

	fn can_seed(&self, quadrant: Quadrant, seeded: &[bool; 4]) -> bool {
		self.child(quadrant).is_some() && self.connection_of(quadrant).is_none() && !seeded[quadrant.index()]
	}

	/// Refills empty quadrants from unconnected neighbors inside the unit,
	/// vertical partner first, then horizontal.
	pub fn expand(&mut self, catalog: &ShapeCatalog) -> ExpandOutcome {
		let mut outcome = ExpandOutcome::default();
		if self.is_empty() || self.is_full() {
			return outcome;
		}

		let mut seeded = [false; 4];

		for target in ALL_QUADRANTS {
			if self.child(target).is_some() {
				continue;
			}

			let source = [target.vertical_partner(), target.horizontal_partner()]
				.into_iter()
				.find(|q| self.can_seed(*q, &seeded));
			let Some(source) = source else { continue };

			let placement = match catalog.placement(target) {
				Ok(placement) => placement,
				Err(e) => {
					warn!("unit {:?}: clone {} -> {} aborted: {}", self.id, source, target, e);
					outcome.faults.push(e);
					continue;
				}
			};

			let Some(source_child) = self.child(source).copied() else { continue };
			let mut clone = ChildBlock::new(source_child.color, target);
			clone.big_square = source_child.big_square;
			self.children[target.index()] = Some(clone);

			//ビッグスクエアは接続を持たない
			let connected = !source_child.big_square;
			if connected {
				self.connections.link(source, target);
			}

			seeded[source.index()] = true;
			seeded[target.index()] = true;

			debug!("unit {:?}: cloned {} {} -> {}", self.id, source_child.color, source, target);
			outcome.clones.push(CloneRecord {
				source,
				color: source_child.color,
				connected,
				placement,
			});
		}

		outcome
	}

	/// Turns a single-colored unit of two or more children into a big square.
	pub fn try_make_big_square(&mut self, catalog: &ShapeCatalog) -> PromotionOutcome {
		let mut outcome = PromotionOutcome::default();
		if self.len() < 2 {
			return outcome;
		}
		let Some(color) = self.single_color() else { return outcome };
		if self.is_big_square() {
			return outcome;
		}

		for target in self.empty_quadrants() {
			match catalog.placement(target) {
				Ok(placement) => {
					self.children[target.index()] = Some(ChildBlock::new(color, target));
					outcome.filled.push(placement);
				}
				Err(e) => {
					warn!("unit {:?}: big square fill {} aborted: {}", self.id, target, e);
					outcome.faults.push(e);
				}
			}
		}

		let changed = !outcome.filled.is_empty()
			|| !self.connections.is_empty()
			|| self.children().any(|(_, c)| !c.big_square);

		self.connections.clear();
		for child in self.children.iter_mut().flatten() {
			child.big_square = true;
		}

		if changed {
			debug!("unit {:?}: promoted to {} big square", self.id, color);
			outcome.promoted = Some(color);
		}

		outcome
	}

	/// True when no child carries both a connection and the big-square flag
	/// and every connection is mirrored.
	pub fn connections_consistent(&self) -> bool {
		ALL_QUADRANTS.into_iter().all(|q| match self.connection_of(q) {
			None => true,
			Some(p) => {
				self.connection_of(p) == Some(q)
					&& self.child(q).is_some_and(|c| !c.big_square)
					&& self.child(p).is_some_and(|c| !c.big_square)
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeMap;

	use crate::child_block::ChildSpec;

	use super::*;

	struct Cells(BTreeMap<GridPosition, BlockUnit>);

	impl NeighborLookup for Cells {
		fn unit_at(&self, position: GridPosition) -> Option<&BlockUnit> {
			self.0.get(&position)
		}
	}

	fn unit(id: u32, col: i32, row: i32, codes: &str) -> BlockUnit {
		let mut unit = BlockUnit::new(UnitId(id), GridPosition::new(col, row));
		assert!(unit.populate(&UnitTemplate::from_codes(codes).unwrap()).is_empty());
		unit
	}

	fn cells(units: Vec<BlockUnit>) -> Cells {
		Cells(units.into_iter().map(|u| (u.position(), u)).collect())
	}

	#[test]
	fn connections_are_always_mirrored() {
		let mut unit = unit(1, 0, 0, "RRRR");
		unit.connect(Quadrant::TopLeft, Quadrant::TopRight).unwrap();
		assert_eq!(unit.connection_of(Quadrant::TopRight), Some(Quadrant::TopLeft));

		unit.connect(Quadrant::TopRight, Quadrant::BottomRight).unwrap();
		assert_eq!(unit.connection_of(Quadrant::TopLeft), None);
		assert_eq!(unit.connection_of(Quadrant::BottomRight), Some(Quadrant::TopRight));

		unit.detach(Quadrant::BottomRight);
		assert_eq!(unit.connection_of(Quadrant::TopRight), None);

		unit.connect(Quadrant::TopLeft, Quadrant::BottomLeft).unwrap();
		assert_eq!(unit.disconnect(Quadrant::BottomLeft), Some(Quadrant::TopLeft));
		assert_eq!(unit.connection_of(Quadrant::TopLeft), None);
		assert!(unit.connections_consistent());
	}

	#[test]
	fn connect_rejects_missing_and_self_links() {
		let mut unit = unit(1, 0, 0, "R...");
		assert!(unit.connect(Quadrant::TopLeft, Quadrant::TopLeft).is_err());
		assert!(unit.connect(Quadrant::TopLeft, Quadrant::TopRight).is_err());
	}

	#[test]
	fn populate_reports_duplicates_and_dangling_links() {
		let mut unit = BlockUnit::new(UnitId(1), GridPosition::new(0, 0));
		let template = UnitTemplate::new(vec![
			ChildSpec::new(Quadrant::TopLeft, BlockColor::Red).connected(Quadrant::BottomLeft),
			ChildSpec::new(Quadrant::TopLeft, BlockColor::Blue),
		]);
		let faults = unit.populate(&template);
		assert_eq!(faults.len(), 2);
		assert_eq!(unit.len(), 1);
		assert_eq!(unit.child(Quadrant::TopLeft).unwrap().color, BlockColor::Red);
	}

	#[test]
	fn populate_keeps_first_link_on_conflict() {
		let mut unit = BlockUnit::new(UnitId(1), GridPosition::new(0, 0));
		let template = UnitTemplate::new(vec![
			ChildSpec::new(Quadrant::TopLeft, BlockColor::Blue).connected(Quadrant::TopRight),
			ChildSpec::new(Quadrant::TopRight, BlockColor::Blue).connected(Quadrant::BottomRight),
			ChildSpec::new(Quadrant::BottomRight, BlockColor::Blue),
		]);
		let faults = unit.populate(&template);
		assert_eq!(faults, vec![CascadeError::InvalidConnection { from: Quadrant::TopRight, to: Quadrant::BottomRight }]);
		assert_eq!(unit.connection_of(Quadrant::TopLeft), Some(Quadrant::TopRight));
		assert_eq!(unit.connection_of(Quadrant::TopRight), Some(Quadrant::TopLeft));
		assert_eq!(unit.connection_of(Quadrant::BottomRight), None);
		assert!(unit.connections_consistent());
	}

	#[test]
	fn big_square_template_has_no_connections() {
		let mut unit = BlockUnit::new(UnitId(1), GridPosition::new(0, 0));
		let mut template = UnitTemplate::big_square(BlockColor::Green);
		template.children[0].connected_with = Some(Quadrant::TopRight);
		assert!(unit.populate(&template).is_empty());
		assert!(unit.is_big_square());
		assert_eq!(unit.connection_of(Quadrant::TopLeft), None);
	}

	#[test]
	fn regular_match_takes_both_sides() {
		let board = cells(vec![unit(1, 0, 0, "...R"), unit(2, 1, 0, "..R.")]);
		let matches = board.0[&GridPosition::new(0, 0)].find_matches(&board);
		assert_eq!(matches.into_iter().collect::<Vec<_>>(), vec![
			ChildRef::new(UnitId(1), Quadrant::BottomRight),
			ChildRef::new(UnitId(2), Quadrant::BottomLeft),
		]);
	}

	#[test]
	fn different_colors_do_not_match() {
		let board = cells(vec![unit(1, 0, 0, "...R"), unit(2, 1, 0, "..B."), unit(3, 0, 1, ".Y..")]);
		for unit in board.0.values() {
			assert!(unit.find_matches(&board).is_empty());
		}
	}

	#[test]
	fn connection_partner_is_followed_one_hop() {
		let mut a = unit(1, 0, 1, "BBB.");
		a.connect(Quadrant::TopLeft, Quadrant::TopRight).unwrap();
		let above = unit(2, 0, 0, "..B.");
		let board = cells(vec![a, above]);

		let matches = board.0[&GridPosition::new(0, 0)].find_matches(&board);
		assert_eq!(matches.len(), 3);
		assert!(matches.contains(&ChildRef::new(UnitId(1), Quadrant::TopRight)));
		assert!(!matches.contains(&ChildRef::new(UnitId(1), Quadrant::BottomLeft)));
	}

	#[test]
	fn big_square_infects_whole_neighbor_color() {
		let mut big = BlockUnit::new(UnitId(1), GridPosition::new(0, 0));
		big.populate(&UnitTemplate::big_square(BlockColor::Green));
		let neighbor = unit(2, 1, 0, "GRGG");
		let board = cells(vec![big, neighbor]);

		let matches = board.0[&GridPosition::new(0, 0)].find_matches(&board);
		assert_eq!(matches.len(), 7);
		assert!(!matches.contains(&ChildRef::new(UnitId(2), Quadrant::TopRight)));
	}

	#[test]
	fn expand_prefers_vertical_partner() {
		let mut unit = unit(1, 0, 0, "RB..");
		let outcome = unit.expand(&ShapeCatalog::default());
		assert_eq!(outcome.clones.len(), 2);
		assert_eq!(unit.child(Quadrant::BottomLeft).unwrap().color, BlockColor::Red);
		assert_eq!(unit.child(Quadrant::BottomRight).unwrap().color, BlockColor::Blue);
		assert_eq!(unit.connection_of(Quadrant::BottomLeft), Some(Quadrant::TopLeft));
		assert_eq!(unit.connection_of(Quadrant::TopRight), Some(Quadrant::BottomRight));
	}

	#[test]
	fn expand_falls_back_to_horizontal_partner_once() {
		let mut unit = unit(1, 0, 0, "..Y.");
		let outcome = unit.expand(&ShapeCatalog::default());
		assert_eq!(outcome.clones.len(), 1);
		assert_eq!(outcome.clones[0].source, Quadrant::BottomLeft);
		assert_eq!(outcome.clones[0].placement.quadrant, Quadrant::TopLeft);
		// BottomLeft is connected now, so BottomRight has nobody left to copy.
		assert!(unit.child(Quadrant::BottomRight).is_none());
		assert!(unit.child(Quadrant::TopRight).is_none());
	}

	#[test]
	fn connected_children_never_seed() {
		let mut unit = unit(1, 0, 0, "RR..");
		unit.connect(Quadrant::TopLeft, Quadrant::TopRight).unwrap();
		let before = unit.clone();
		assert_eq!(unit.expand(&ShapeCatalog::default()), ExpandOutcome::default());
		assert_eq!(unit, before);
	}

	#[test]
	fn expand_without_metadata_leaves_slot_empty() {
		let mut unit = unit(1, 0, 0, "R...");
		let outcome = unit.expand(&ShapeCatalog::default().without(Quadrant::TopRight));
		assert_eq!(outcome.faults, vec![CascadeError::MissingVisualMetadata { quadrant: Quadrant::TopRight }]);
		assert!(unit.child(Quadrant::TopRight).is_none());
		// The aborted clone did not use up TopLeft, so it still seeds BottomLeft.
		assert_eq!(unit.connection_of(Quadrant::TopLeft), Some(Quadrant::BottomLeft));
	}

	#[test]
	fn big_square_source_clones_without_connection() {
		let mut unit = BlockUnit::new(UnitId(1), GridPosition::new(0, 0));
		unit.populate(&UnitTemplate::big_square(BlockColor::Pink));
		unit.detach(Quadrant::BottomLeft);
		let outcome = unit.expand(&ShapeCatalog::default());
		assert_eq!(outcome.clones.len(), 1);
		assert!(!outcome.clones[0].connected);
		assert!(unit.is_big_square());
		assert!(unit.connections_consistent());
	}

	#[test]
	fn promotion_fills_and_clears_connections() {
		let mut unit = unit(1, 0, 0, "GG..");
		unit.connect(Quadrant::TopLeft, Quadrant::TopRight).unwrap();
		let outcome = unit.try_make_big_square(&ShapeCatalog::default());
		assert_eq!(outcome.promoted, Some(BlockColor::Green));
		assert_eq!(outcome.filled.len(), 2);
		assert!(unit.is_big_square());
		assert_eq!(unit.connection_of(Quadrant::TopLeft), None);
		assert!(unit.connections_consistent());
	}

	#[test]
	fn promotion_is_idempotent() {
		let mut unit = unit(1, 0, 0, "GGGG");
		assert_eq!(unit.try_make_big_square(&ShapeCatalog::default()).promoted, Some(BlockColor::Green));
		let before = unit.clone();
		assert_eq!(unit.try_make_big_square(&ShapeCatalog::default()), PromotionOutcome::default());
		assert_eq!(unit, before);
	}

	#[test]
	fn promotion_needs_two_children_of_one_color() {
		let mut single = unit(1, 0, 0, "G...");
		assert_eq!(single.try_make_big_square(&ShapeCatalog::default()), PromotionOutcome::default());
		let mut mixed = unit(2, 0, 0, "GR..");
		assert_eq!(mixed.try_make_big_square(&ShapeCatalog::default()), PromotionOutcome::default());
		assert_eq!(mixed.len(), 2);
	}
}
