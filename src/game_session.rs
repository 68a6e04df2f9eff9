use log::{error, info};
use serde_derive::Serialize;

use console::console::Console;
use engine::board_context::BoardContext;
use engine::config::BoardConfig;
use engine::error::CascadeError;
use engine::flow_event::{FlowEvent, FlowOutcome};
use engine::level::Level;
use engine::orchestrator::{Orchestrator, Signal, Step};
use engine::spawner::{DropOutcome, Spawner, Verdict};

/// Units queued at a time in endless mode.
pub const ENDLESS_BATCH: usize = 8;

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
	pub verdict: Verdict,
	pub drops: usize,
	pub passes: usize,
	pub aborted: usize,
	pub remaining_units: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DropResult {
	Resolved(FlowOutcome),
	/// The cascade hit the pass cap; the board is consistent and play goes on.
	Aborted,
	NotDropped,
}

/// One board, its spawner and the cascade driving it.
pub struct GameSession {
	pub ctx: BoardContext,
	pub orchestrator: Orchestrator,
	pub spawner: Spawner,
	endless: bool,
	show: bool,
	step_through: bool,
	passes: usize,
	aborted: usize,
	events: Vec<FlowEvent>,
}

impl GameSession {
	pub fn new(config: BoardConfig, level: Option<&Level>, endless: bool) -> Result<GameSession, CascadeError> {
		let mut ctx = BoardContext::new(config);
		let mut orchestrator = Orchestrator::new();

		let spawner = match level {
			Some(level) => {
				let (spawner, faults) = Spawner::for_level(level, &mut ctx)?;
				for fault in faults {
					orchestrator.push_event(FlowEvent::Fault(fault.to_string()));
				}
				spawner
			}
			None => Spawner::default(),
		};

		Ok(GameSession {
			ctx,
			orchestrator,
			spawner,
			endless,
			show: false,
			step_through: false,
			passes: 0,
			aborted: 0,
			events: Vec::new(),
		})
	}

	/// Draws the board through the console at every barrier; with `step_through`
	/// each barrier also waits for a key.
	pub fn with_console(mut self, step_through: bool) -> Self {
		self.show = true;
		self.step_through = step_through;
		self
	}

	pub fn events(&self) -> &[FlowEvent] {
		&self.events
	}

	/// Lowest stack first, leftmost on ties.
	pub fn choose_column(&self) -> Option<i32> {
		(0..self.ctx.size() as i32)
			.filter_map(|col| self.ctx.grid.first_empty_row(col).map(|row| (col, row)))
			.max_by(|(a_col, a_row), (b_col, b_row)| a_row.cmp(b_row).then(b_col.cmp(a_col)))
			.map(|(col, _)| col)
	}

	/// Drops the next unit into `col` and resolves the cascade it starts.
	pub fn drop_into(&mut self, col: i32) -> anyhow::Result<DropResult> {
		if self.endless && self.spawner.remaining() == 0 {
			self.spawner.refill_random(&mut self.ctx, ENDLESS_BATCH);
		}

		match self.spawner.drop_next(&mut self.ctx, &mut self.orchestrator, col)? {
			DropOutcome::Placed { .. } => {}
			DropOutcome::ColumnFull | DropOutcome::QueueEmpty => return Ok(DropResult::NotDropped),
		}

		match self.run_cascade() {
			Ok(outcome) => Ok(DropResult::Resolved(outcome)),
			Err(e) => match e.downcast_ref::<CascadeError>() {
				Some(CascadeError::CascadeLimitExceeded { passes }) => {
					error!("cascade aborted after {} passes", passes);
					self.aborted += 1;
					self.collect_events()?;
					Ok(DropResult::Aborted)
				}
				_ => Err(e),
			},
		}
	}

	fn run_cascade(&mut self) -> anyhow::Result<FlowOutcome> {
		loop {
			let step = self.orchestrator.poll(&mut self.ctx)?;
			self.present()?;

			match step {
				Step::AwaitRemoval(_) => self.orchestrator.signal(Signal::RemovalComplete)?,
				Step::AwaitMovement(_) => self.orchestrator.signal(Signal::MovementComplete)?,
				Step::Finished(outcome) => {
					self.passes += self.orchestrator.passes();
					return Ok(outcome);
				}
			}
		}
	}

	fn present(&mut self) -> anyhow::Result<()> {
		let events = self.collect_events()?;
		if self.show {
			Console::print(&self.ctx, true)?;
			Console::print_events(&events)?;
			if self.step_through && Console::get_input()? == "quit" {
				anyhow::bail!("stopped at a barrier");
			}
		}
		Ok(())
	}

	fn collect_events(&mut self) -> anyhow::Result<Vec<FlowEvent>> {
		let events = self.orchestrator.drain_events();
		for event in &events {
			log::debug!("{}", serde_json::to_string(event)?);
		}
		self.events.extend(events.iter().cloned());
		Ok(events)
	}

	/// Plays until the level is decided or `max_drops` units have fallen.
	pub fn play(&mut self, max_drops: usize) -> anyhow::Result<SessionSummary> {
		let mut drops = 0;

		while drops < max_drops {
			if self.endless && self.spawner.remaining() == 0 {
				self.spawner.refill_random(&mut self.ctx, ENDLESS_BATCH);
			}

			let verdict = self.spawner.verdict(&self.ctx);
			if verdict != Verdict::InProgress && !(self.endless && verdict == Verdict::Won) {
				break;
			}
			let Some(col) = self.choose_column() else { break };

			if self.drop_into(col)? == DropResult::NotDropped {
				break;
			}
			drops += 1;
		}

		let summary = SessionSummary {
			verdict: self.spawner.verdict(&self.ctx),
			drops,
			passes: self.passes,
			aborted: self.aborted,
			remaining_units: self.ctx.units.len(),
		};
		info!("session finished: {}", serde_json::to_string(&summary)?);
		Ok(summary)
	}
}
