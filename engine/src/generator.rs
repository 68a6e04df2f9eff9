use log::debug;
use rand::prelude::SliceRandom;
use rand::Rng;

use crate::block_color::BlockColor;
use crate::board_context::BoardContext;
use crate::child_block::{ChildSpec, UnitTemplate};
use crate::error::CascadeError;
use crate::grid_position::GridPosition;
use crate::quadrant::ALL_QUADRANTS;

/// 1/4 of the units with two or more children come with a connected pair.
const CONNECTED_PAIR_RATE: f64 = 0.25;

/// A random unit of one to four children drawn from `palette`. `None` for an empty palette.
pub fn random_template<R: Rng>(rng: &mut R, palette: &[BlockColor]) -> Option<UnitTemplate> {
	if palette.is_empty() {
		return None;
	}

	let count = rng.gen_range(1..=4);
	let mut quadrants = ALL_QUADRANTS;
	quadrants.shuffle(rng);
	let quadrants = &quadrants[..count];

	let mut children = Vec::with_capacity(count);
	for quadrant in quadrants {
		children.push(ChildSpec::new(*quadrant, *palette.choose(rng)?));
	}

	if count >= 2 && rng.gen_bool(CONNECTED_PAIR_RATE) {
		let pair = quadrants.iter()
			.enumerate()
			.flat_map(|(i, a)| quadrants[i + 1..].iter().map(move |b| (*a, *b)))
			.find(|(a, b)| a.is_adjacent(*b));

		if let Some((a, b)) = pair {
			let color = *palette.choose(rng)?;
			for child in children.iter_mut() {
				if child.quadrant == a {
					*child = ChildSpec::new(a, color).connected(b);
				} else if child.quadrant == b {
					*child = ChildSpec::new(b, color).connected(a);
				}
			}
		}
	}

	Some(UnitTemplate::new(children))
}

/// Uses the context's seeded rng and palette.
pub fn next_template(ctx: &mut BoardContext) -> Option<UnitTemplate> {
	let palette = ctx.config.palette.clone();
	random_template(ctx.rng_mut(), &palette)
}

/// Stacks `count` random units into random columns that still have room.
/// Stops early when the board is full. Returns how many were placed.
pub fn fill_random(ctx: &mut BoardContext, count: usize) -> Result<usize, CascadeError> {
	let mut placed = 0;

	while placed < count {
		let open: Vec<i32> = (0..ctx.size() as i32).filter(|col| ctx.grid.first_empty_row(*col).is_some()).collect();
		let Some(col) = open.choose(ctx.rng_mut()).copied() else { break };
		let Some(row) = ctx.grid.first_empty_row(col) else { break };
		let Some(template) = next_template(ctx) else { break };

		ctx.place_unit(GridPosition::new(col, row), &template)?;
		placed += 1;
	}

	debug!("filled {} random units", placed);
	Ok(placed)
}
