use std::io::{stdout, Write};

use crossterm::{cursor, queue};
use crossterm::cursor::{DisableBlinking, Hide};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::style::{Color, Print, SetBackgroundColor};
use crossterm::terminal::{Clear, ClearType};

use engine::block_color::BlockColor;
use engine::board_context::BoardContext;
use engine::flow_event::FlowEvent;
use engine::quadrant::Quadrant;

/// Rows of text the board takes: two lines per cell plus a spacer line.
const CELL_HEIGHT: usize = 3;

pub struct Console {}

impl Console {
	/// Blocks until a key is pressed. Digits pick a column.
	pub fn get_input() -> std::io::Result<String> {
		loop {
			let input = match crossterm::event::read()? {
				Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) => match code {
					KeyCode::Char(c) if c.is_ascii_digit() => format!("col{}", c),
					KeyCode::Char('q') | KeyCode::Esc => "quit".to_owned(),
					KeyCode::Char(' ') | KeyCode::Enter => "next".to_owned(),
					_ => continue,
				},
				_ => continue,
			};
			return Ok(input);
		}
	}

	pub fn print(ctx: &BoardContext, clear: bool) -> std::io::Result<()> {
		let mut stdout = stdout();
		queue!(stdout, Hide, DisableBlinking, cursor::MoveTo(0, 0))?;
		if clear {
			queue!(stdout, Clear(ClearType::All))?;
		}

		let size = ctx.size() as i32;
		for row in 0..size {
			for half in [[Quadrant::TopLeft, Quadrant::TopRight], [Quadrant::BottomLeft, Quadrant::BottomRight]] {
				for col in 0..size {
					let unit = ctx.unit_at_cell(col, row);
					for quadrant in half {
						let color = unit.and_then(|u| u.child(quadrant)).map(|c| c.color);
						let mark = match unit.and_then(|u| u.child(quadrant)) {
							Some(child) if child.big_square => "[]",
							Some(_) if unit.and_then(|u| u.connection_of(quadrant)).is_some() => "==",
							_ => "  ",
						};
						queue!(stdout, SetBackgroundColor(Self::get_color(color)), Print(mark))?;
					}
					queue!(stdout, SetBackgroundColor(Color::Black), Print(" "))?;
				}
				queue!(stdout, Print("\n"))?;
			}
			queue!(stdout, Print("\n"))?;
		}

		queue!(stdout, SetBackgroundColor(Color::Black), cursor::MoveTo(0, (size as usize * CELL_HEIGHT) as u16))?;
		stdout.flush()
	}

	pub fn print_events(events: &[FlowEvent]) -> std::io::Result<()> {
		let mut stdout = stdout();
		for event in events {
			queue!(stdout, Clear(ClearType::CurrentLine), Print(Self::describe(event)), Print("\n"))?;
		}
		stdout.flush()
	}

	pub fn describe(event: &FlowEvent) -> String {
		match event {
			FlowEvent::UnitPlaced { unit, position } => format!("placed {:?} at {},{}", unit, position.col, position.row),
			FlowEvent::ChildrenRemoved { pass, children } => format!("pass {}: {} removed", pass, children.len()),
			FlowEvent::ChildCloned { unit, source, placement, .. } => format!("{:?}: {} -> {}", unit, source, placement.quadrant),
			FlowEvent::BigSquareFormed { unit, color, .. } => format!("{:?}: big square {}", unit, color),
			FlowEvent::UnitDiscarded { unit, .. } => format!("{:?} discarded", unit),
			FlowEvent::UnitMoved(m) => format!("{:?} fell {} -> {}", m.unit, m.from_row, m.to_row),
			FlowEvent::Fault(message) => format!("fault: {}", message),
			FlowEvent::FlowCompleted { passes } => format!("settled after {} passes", passes),
			FlowEvent::BoardCleared { passes } => format!("board cleared after {} passes", passes),
			FlowEvent::CascadeAborted { passes } => format!("aborted after {} passes", passes),
		}
	}

	fn get_color(color: Option<BlockColor>) -> Color {
		match color {
			None => Color::White,
			Some(BlockColor::Blue) => Color::Blue,
			Some(BlockColor::DarkBlue) => Color::DarkBlue,
			Some(BlockColor::Green) => Color::Green,
			Some(BlockColor::Orange) => Color::Rgb { r: 255, g: 140, b: 0 },
			Some(BlockColor::Pink) => Color::Magenta,
			Some(BlockColor::Purple) => Color::Rgb { r: 128, g: 0, b: 128 },
			Some(BlockColor::Red) => Color::Red,
			Some(BlockColor::Yellow) => Color::Yellow,
		}
	}
}
