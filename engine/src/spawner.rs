use std::collections::VecDeque;

use log::{info, warn};
use serde_derive::Serialize;

use crate::block_unit::UnitId;
use crate::board_context::BoardContext;
use crate::child_block::UnitTemplate;
use crate::error::CascadeError;
use crate::flow_event::FlowEvent;
use crate::generator;
use crate::grid_position::GridPosition;
use crate::level::Level;
use crate::orchestrator::Orchestrator;

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
	Placed { unit: UnitId, position: GridPosition, faults: Vec<CascadeError> },
	/// The template stays at the front of the queue.
	ColumnFull,
	QueueEmpty,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Verdict {
	InProgress,
	Won,
	Lost,
}

/// The queue of units still to drop, and the win/loss check that goes with it.
#[derive(Debug, Clone, Default)]
pub struct Spawner {
	queue: VecDeque<UnitTemplate>,
	started: bool,
}

impl Spawner {
	pub fn new(queue: VecDeque<UnitTemplate>) -> Spawner {
		Spawner {
			queue,
			started: false,
		}
	}

	/// Puts the level's initial units on the board and queues the rest.
	pub fn for_level(level: &Level, ctx: &mut BoardContext) -> Result<(Spawner, Vec<CascadeError>), CascadeError> {
		let faults = level.apply(ctx)?;
		let mut spawner = Spawner::new(level.queue.clone());
		spawner.started = !level.placements.is_empty();
		Ok((spawner, faults))
	}

	pub fn remaining(&self) -> usize {
		self.queue.len()
	}

	pub fn peek(&self) -> Option<&UnitTemplate> {
		self.queue.front()
	}

	/// Drops the next unit into `col` and starts a cascade.
	pub fn drop_next(&mut self, ctx: &mut BoardContext, orchestrator: &mut Orchestrator, col: i32) -> Result<DropOutcome, CascadeError> {
		if orchestrator.is_resolving() {
			warn!("drop into column {} refused while resolving", col);
			return Err(CascadeError::ReentrantResolution);
		}
		if !ctx.grid.is_valid(col, 0) {
			return Err(CascadeError::InvalidCoordinate { col, row: 0 });
		}

		let Some(template) = self.queue.front() else { return Ok(DropOutcome::QueueEmpty) };
		let Some(row) = ctx.grid.first_empty_row(col) else { return Ok(DropOutcome::ColumnFull) };

		let position = GridPosition::new(col, row);
		let (unit, faults) = match ctx.place_unit(position, template) {
			Ok(placed) => placed,
			Err(e @ CascadeError::EmptyUnit { .. }) => {
				warn!("discarding childless unit queued for column {}", col);
				self.queue.pop_front();
				return Err(e);
			}
			Err(e) => return Err(e),
		};
		self.queue.pop_front();
		self.started = true;

		orchestrator.push_event(FlowEvent::UnitPlaced { unit, position });
		for fault in &faults {
			orchestrator.push_event(FlowEvent::Fault(fault.to_string()));
		}
		orchestrator.begin()?;

		info!("dropped unit {:?} into col={}, row={} ({} left)", unit, col, row, self.queue.len());
		Ok(DropOutcome::Placed { unit, position, faults })
	}

	/// Leftmost column that can take the next unit.
	pub fn first_open_column(&self, ctx: &BoardContext) -> Option<i32> {
		(0..ctx.size() as i32).find(|col| ctx.grid.first_empty_row(*col).is_some())
	}

	pub fn verdict(&self, ctx: &BoardContext) -> Verdict {
		if ctx.is_board_empty() && (self.started || self.queue.is_empty()) {
			return Verdict::Won;
		}
		if self.queue.is_empty() && ctx.grid.any_occupied() {
			return Verdict::Lost;
		}
		if !self.queue.is_empty() && ctx.grid.is_full() {
			return Verdict::Lost;
		}
		Verdict::InProgress
	}

	/// Endless mode: queues `count` generated units.
	pub fn refill_random(&mut self, ctx: &mut BoardContext, count: usize) -> usize {
		let mut added = 0;
		for _ in 0..count {
			let Some(template) = generator::next_template(ctx) else { break };
			self.queue.push_back(template);
			added += 1;
		}
		added
	}
}

#[cfg(test)]
mod tests {
	use crate::config::BoardConfig;
	use crate::flow_event::FlowOutcome;

	use super::*;

	fn queue(codes: &[&str]) -> VecDeque<UnitTemplate> {
		codes.iter().map(|c| UnitTemplate::from_codes(c).unwrap()).collect()
	}

	#[test]
	fn drop_lands_on_lowest_free_row() {
		let mut ctx = BoardContext::new(BoardConfig::default());
		let mut orchestrator = Orchestrator::new();
		let mut spawner = Spawner::new(queue(&["R...", "B..."]));

		let DropOutcome::Placed { position, .. } = spawner.drop_next(&mut ctx, &mut orchestrator, 2).unwrap() else { panic!("not placed") };
		assert_eq!(position, GridPosition::new(2, 5));
		assert_eq!(spawner.drop_next(&mut ctx, &mut orchestrator, 2), Err(CascadeError::ReentrantResolution));
		assert_eq!(orchestrator.resolve(&mut ctx).unwrap(), FlowOutcome::FlowCompleted);

		let DropOutcome::Placed { position, .. } = spawner.drop_next(&mut ctx, &mut orchestrator, 2).unwrap() else { panic!("not placed") };
		assert_eq!(position, GridPosition::new(2, 4));
		assert!(matches!(orchestrator.drain_events()[0], FlowEvent::UnitPlaced { .. }));
	}

	#[test]
	fn full_column_keeps_template() {
		let mut ctx = BoardContext::new(BoardConfig::with_size(2));
		let mut orchestrator = Orchestrator::new();
		let mut spawner = Spawner::new(queue(&["R...", "B...", "Y..."]));

		for _ in 0..2 {
			spawner.drop_next(&mut ctx, &mut orchestrator, 0).unwrap();
			orchestrator.resolve(&mut ctx).unwrap();
		}
		assert_eq!(spawner.drop_next(&mut ctx, &mut orchestrator, 0).unwrap(), DropOutcome::ColumnFull);
		assert_eq!(spawner.remaining(), 1);
		assert_eq!(spawner.first_open_column(&ctx), Some(1));
		assert!(spawner.drop_next(&mut ctx, &mut orchestrator, 5).is_err());
	}

	#[test]
	fn verdicts() {
		let mut ctx = BoardContext::new(BoardConfig::default());
		let mut orchestrator = Orchestrator::new();
		let mut spawner = Spawner::new(queue(&["...R", "..R."]));
		assert_eq!(spawner.verdict(&ctx), Verdict::InProgress);

		spawner.drop_next(&mut ctx, &mut orchestrator, 0).unwrap();
		orchestrator.resolve(&mut ctx).unwrap();
		assert_eq!(spawner.verdict(&ctx), Verdict::InProgress);

		spawner.drop_next(&mut ctx, &mut orchestrator, 1).unwrap();
		assert_eq!(orchestrator.resolve(&mut ctx).unwrap(), FlowOutcome::BoardCleared);
		assert_eq!(spawner.verdict(&ctx), Verdict::Won);

		let mut ctx = BoardContext::new(BoardConfig::default());
		let mut spawner = Spawner::new(queue(&["R..."]));
		spawner.drop_next(&mut ctx, &mut orchestrator, 0).unwrap();
		orchestrator.resolve(&mut ctx).unwrap();
		assert_eq!(spawner.verdict(&ctx), Verdict::Lost);
	}

	#[test]
	fn childless_template_is_dropped_from_queue() {
		let mut ctx = BoardContext::new(BoardConfig::default());
		let mut orchestrator = Orchestrator::new();
		let mut spawner = Spawner::new(VecDeque::from(vec![UnitTemplate::new(vec![])]));

		assert_eq!(spawner.drop_next(&mut ctx, &mut orchestrator, 0), Err(CascadeError::EmptyUnit { col: 0, row: 5 }));
		assert_eq!(spawner.remaining(), 0);
		assert!(!orchestrator.is_resolving());
		assert_eq!(spawner.verdict(&ctx), Verdict::Won);
	}

	#[test]
	fn refill_uses_seeded_generator() {
		let mut ctx = BoardContext::new(BoardConfig::default());
		let mut spawner = Spawner::default();
		assert_eq!(spawner.refill_random(&mut ctx, 5), 5);
		assert_eq!(spawner.remaining(), 5);
		assert!(spawner.peek().is_some());
	}
}
