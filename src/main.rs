use std::fs;
use std::path::PathBuf;

use ::log::{info, LevelFilter};
use anyhow::Context;
use clap::Parser;

use console::console::Console;
use engine::config::BoardConfig;
use engine::level::LevelContainer;

use crate::game_session::{DropResult, GameSession};
use crate::log::{Log, LogType};

mod log;
mod game_session;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
	/// Board config in RON; defaults apply to missing fields.
	#[arg(long)]
	config: Option<PathBuf>,
	/// levels.json to play.
	#[arg(long)]
	level: Option<PathBuf>,
	#[arg(long, default_value_t = 1)]
	level_id: i32,
	#[arg(long, default_value = "log.txt")]
	log: PathBuf,
	#[arg(long)]
	seed: Option<u64>,
	/// Keep generating units instead of playing a fixed queue.
	#[arg(long)]
	endless: bool,
	/// Pick columns with the number keys and acknowledge every barrier.
	#[arg(long)]
	interactive: bool,
	#[arg(long, default_value_t = 200)]
	max_drops: usize,
	/// Print the effective config as RON and exit.
	#[arg(long)]
	print_config: bool,
	#[arg(long)]
	verbose: bool,
}

fn load_config(cli: &Cli) -> anyhow::Result<BoardConfig> {
	let mut config = match &cli.config {
		Some(path) => {
			let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
			BoardConfig::from_ron(&text).with_context(|| format!("parsing {}", path.display()))?
		}
		None => BoardConfig::default(),
	};
	if let Some(seed) = cli.seed {
		config.seed = seed;
	}
	Ok(config)
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let config = load_config(&cli)?;

	if cli.print_config {
		println!("{}", ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default())?);
		return Ok(());
	}

	let level_filter = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
	let log = Log::open(&cli.log, level_filter)?;
	log.write(LogType::INFO, "session started")?;
	log.install()?;

	let level = match &cli.level {
		Some(path) => {
			let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
			let container = LevelContainer::from_json(&text)?;
			Some(container.level(cli.level_id)?)
		}
		None => None,
	};
	let endless = cli.endless || level.is_none();

	let mut session = GameSession::new(config, level.as_ref(), endless)?;
	if !cli.interactive {
		let summary = session.play(cli.max_drops)?;
		info!("{} flow events", session.events().len());
		println!("{}", serde_json::to_string_pretty(&summary)?);
		return Ok(());
	}

	session = session.with_console(true);
	Console::print(&session.ctx, true)?;
	loop {
		let input = Console::get_input()?;
		if input == "quit" {
			break;
		}
		let Some(col) = input.strip_prefix("col").and_then(|c| c.parse::<i32>().ok()) else { continue };
		match session.drop_into(col)? {
			DropResult::Resolved(outcome) => info!("drop into {} resolved: {:?}", col, outcome),
			DropResult::Aborted => info!("drop into {} aborted", col),
			DropResult::NotDropped => info!("column {} cannot take a unit", col),
		}
		let verdict = session.spawner.verdict(&session.ctx);
		println!("{:?}", verdict);
		if verdict != engine::spawner::Verdict::InProgress && !endless {
			break;
		}
	}

	Ok(())
}
