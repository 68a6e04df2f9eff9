use std::collections::VecDeque;

use log::{debug, error, info, warn};
use strum::Display;

use crate::board_context::BoardContext;
use crate::board_grid::GravityMove;
use crate::child_block::ChildRef;
use crate::error::CascadeError;
use crate::flow_event::{FlowEvent, FlowOutcome};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
pub enum Phase {
	Idle,
	Destroying,
	AwaitingRemoval,
	Rebuilding,
	Expanding,
	Settling,
	AwaitingMovement,
	Done(FlowOutcome),
}

/// Host acknowledgements for the two barriers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
pub enum Signal {
	RemovalComplete,
	MovementComplete,
}

/// What `poll` stopped at.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
	/// The batch is already gone from the game state; animate it, then signal `RemovalComplete`.
	AwaitRemoval(Vec<ChildRef>),
	/// Units already sit at their new rows; animate, then signal `MovementComplete`.
	AwaitMovement(Vec<GravityMove>),
	Finished(FlowOutcome),
}

/// Drives destroy, rebuild, expand and settle passes until the board stops matching.
#[derive(Debug, Clone)]
pub struct Orchestrator {
	phase: Phase,
	passes: usize,
	pending_moves: Vec<GravityMove>,
	events: VecDeque<FlowEvent>,
}

impl Default for Orchestrator {
	fn default() -> Self {
		Orchestrator::new()
	}
}

impl Orchestrator {
	pub fn new() -> Orchestrator {
		Orchestrator {
			phase: Phase::Idle,
			passes: 0,
			pending_moves: Vec::new(),
			events: VecDeque::new(),
		}
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn passes(&self) -> usize {
		self.passes
	}

	pub fn is_resolving(&self) -> bool {
		!matches!(self.phase, Phase::Idle | Phase::Done(_))
	}

	pub fn push_event(&mut self, event: FlowEvent) {
		self.events.push_back(event);
	}

	pub fn drain_events(&mut self) -> Vec<FlowEvent> {
		self.events.drain(..).collect()
	}

	pub fn begin(&mut self) -> Result<(), CascadeError> {
		if self.is_resolving() {
			warn!("cascade requested while {} is in flight", self.phase);
			return Err(CascadeError::ReentrantResolution);
		}

		self.phase = Phase::Destroying;
		self.passes = 0;
		self.pending_moves.clear();
		debug!("cascade started");
		Ok(())
	}

	pub fn signal(&mut self, signal: Signal) -> Result<(), CascadeError> {
		let next = match (self.phase, signal) {
			(Phase::AwaitingRemoval, Signal::RemovalComplete) => Phase::Rebuilding,
			(Phase::AwaitingMovement, Signal::MovementComplete) => Phase::Destroying,
			(phase, received) => {
				let expected = match phase {
					Phase::AwaitingRemoval => Signal::RemovalComplete.to_string(),
					Phase::AwaitingMovement => Signal::MovementComplete.to_string(),
					other => format!("no signal during {}", other),
				};
				warn!("unexpected {} signal during {}", received, phase);
				return Err(CascadeError::UnexpectedSignal { expected, received: received.to_string() });
			}
		};

		self.phase = next;
		Ok(())
	}

	/// Runs phases until a barrier or the end of the cascade.
	pub fn poll(&mut self, ctx: &mut BoardContext) -> Result<Step, CascadeError> {
		loop {
			match self.phase {
				Phase::Idle => return Err(CascadeError::UnexpectedSignal {
					expected: "begin".to_owned(),
					received: "poll".to_owned(),
				}),
				Phase::Done(outcome) => return Ok(Step::Finished(outcome)),
				Phase::AwaitingRemoval | Phase::AwaitingMovement => {
					return Err(CascadeError::UnexpectedSignal {
						expected: self.awaited_signal().to_string(),
						received: "poll".to_owned(),
					});
				}
				Phase::Destroying => {
					if let Some(step) = self.destroy(ctx)? {
						return Ok(step);
					}
				}
				Phase::Rebuilding => self.rebuild(ctx),
				Phase::Expanding => self.expand(ctx),
				Phase::Settling => {
					let moves = self.settle(ctx);
					return Ok(Step::AwaitMovement(moves));
				}
			}
		}
	}

	/// Headless run: every barrier is acknowledged as soon as it is reached.
	pub fn resolve(&mut self, ctx: &mut BoardContext) -> Result<FlowOutcome, CascadeError> {
		match self.phase {
			Phase::AwaitingRemoval => self.signal(Signal::RemovalComplete)?,
			Phase::AwaitingMovement => self.signal(Signal::MovementComplete)?,
			_ if !self.is_resolving() => self.begin()?,
			_ => {}
		}

		loop {
			match self.poll(ctx)? {
				Step::AwaitRemoval(_) => self.signal(Signal::RemovalComplete)?,
				Step::AwaitMovement(_) => self.signal(Signal::MovementComplete)?,
				Step::Finished(outcome) => return Ok(outcome),
			}
		}
	}

	fn awaited_signal(&self) -> Signal {
		match self.phase {
			Phase::AwaitingMovement => Signal::MovementComplete,
			_ => Signal::RemovalComplete,
		}
	}

	fn destroy(&mut self, ctx: &mut BoardContext) -> Result<Option<Step>, CascadeError> {
		let matched = ctx.collect_matches();

		if matched.is_empty() {
			let (outcome, event) = if ctx.is_board_empty() {
				(FlowOutcome::BoardCleared, FlowEvent::BoardCleared { passes: self.passes })
			} else {
				(FlowOutcome::FlowCompleted, FlowEvent::FlowCompleted { passes: self.passes })
			};
			info!("cascade finished after {} passes: {:?}", self.passes, outcome);
			self.events.push_back(event);
			self.phase = Phase::Done(outcome);
			return Ok(Some(Step::Finished(outcome)));
		}

		let limit = ctx.config.cascade_pass_limit();
		if self.passes >= limit {
			error!("cascade still matching after {} passes, aborting", self.passes);
			self.events.push_back(FlowEvent::CascadeAborted { passes: self.passes });
			self.phase = Phase::Idle;
			for fault in ctx.rebuild_registry() {
				self.events.push_back(FlowEvent::Fault(fault.to_string()));
			}
			return Err(CascadeError::CascadeLimitExceeded { passes: self.passes });
		}

		self.passes += 1;
		let removed = ctx.destroy(&matched);
		info!("pass {}: removed {} children", self.passes, removed.len());
		self.events.push_back(FlowEvent::ChildrenRemoved { pass: self.passes, children: removed.clone() });
		self.phase = Phase::AwaitingRemoval;
		Ok(Some(Step::AwaitRemoval(removed)))
	}

	fn rebuild(&mut self, ctx: &mut BoardContext) {
		for fault in ctx.rebuild_registry() {
			self.events.push_back(FlowEvent::Fault(fault.to_string()));
		}
		self.phase = Phase::Expanding;
	}

	fn expand(&mut self, ctx: &mut BoardContext) {
		//途中で消えるユニットがあるのでスナップショット
		let snapshot = ctx.grid.registered_units();
		let catalog = ctx.shapes().clone();

		for id in snapshot {
			let Some(unit) = ctx.units.get_mut(id) else { continue };

			let expanded = unit.expand(&catalog);
			for clone in expanded.clones {
				self.events.push_back(FlowEvent::ChildCloned {
					unit: id,
					source: clone.source,
					color: clone.color,
					connected: clone.connected,
					placement: clone.placement,
				});
			}

			let promotion = unit.try_make_big_square(&catalog);
			if let Some(color) = promotion.promoted {
				self.events.push_back(FlowEvent::BigSquareFormed { unit: id, color, filled: promotion.filled });
			}

			for fault in expanded.faults.into_iter().chain(promotion.faults) {
				self.events.push_back(FlowEvent::Fault(fault.to_string()));
			}

			if let Some((position, moves)) = ctx.check_if_empty(id) {
				self.events.push_back(FlowEvent::UnitDiscarded { unit: id, position });
				self.pending_moves.extend(moves);
			}
		}

		self.phase = Phase::Settling;
	}

	fn settle(&mut self, ctx: &mut BoardContext) -> Vec<GravityMove> {
		let mut moves: Vec<GravityMove> = self.pending_moves.drain(..).collect();
		moves.extend(ctx.settle());

		for grid_move in &moves {
			self.events.push_back(FlowEvent::UnitMoved(*grid_move));
		}

		self.phase = Phase::AwaitingMovement;
		moves
	}
}
