use serde_derive::Serialize;

use crate::block_color::BlockColor;
use crate::block_unit::UnitId;
use crate::board_grid::GravityMove;
use crate::child_block::ChildRef;
use crate::grid_position::GridPosition;
use crate::quadrant::Quadrant;
use crate::shape_catalog::ClonePlacement;

/// How a finished cascade left the board.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum FlowOutcome {
	/// Matches are exhausted and units remain: the next unit may drop.
	FlowCompleted,
	BoardCleared,
}

/// Everything the host needs to animate and to drive the game, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FlowEvent {
	UnitPlaced { unit: UnitId, position: GridPosition },
	ChildrenRemoved { pass: usize, children: Vec<ChildRef> },
	ChildCloned { unit: UnitId, source: Quadrant, color: BlockColor, connected: bool, placement: ClonePlacement },
	BigSquareFormed { unit: UnitId, color: BlockColor, filled: Vec<ClonePlacement> },
	UnitDiscarded { unit: UnitId, position: GridPosition },
	UnitMoved(GravityMove),
	Fault(String),
	FlowCompleted { passes: usize },
	BoardCleared { passes: usize },
	CascadeAborted { passes: usize },
}
