use thiserror::Error;

use crate::block_unit::UnitId;
use crate::quadrant::Quadrant;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CascadeError {
	#[error("invalid coordinate col={col}, row={row}")]
	InvalidCoordinate { col: i32, row: i32 },

	#[error("no shape or connection metadata for {quadrant}")]
	MissingVisualMetadata { quadrant: Quadrant },

	#[error("a cascade is already resolving")]
	ReentrantResolution,

	#[error("expected {expected} signal, received {received}")]
	UnexpectedSignal { expected: String, received: String },

	#[error("cascade did not settle after {passes} passes")]
	CascadeLimitExceeded { passes: usize },

	#[error("unit {0:?} is not live")]
	UnknownUnit(UnitId),

	#[error("{quadrant} is already occupied")]
	QuadrantOccupied { quadrant: Quadrant },

	#[error("unit at col={col}, row={row} has no children")]
	EmptyUnit { col: i32, row: i32 },

	#[error("cannot connect {from} with {to}")]
	InvalidConnection { from: Quadrant, to: Quadrant },

	#[error("invalid level: {0}")]
	InvalidLevel(String),

	#[error("invalid config: {0}")]
	Config(String),
}
