use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record};

#[derive(Debug, PartialEq, strum::EnumString, strum::Display)]
pub enum LogType {
	TRACE,
	DEBUG,
	INFO,
	WARN,
	ERROR,
}

impl From<Level> for LogType {
	fn from(level: Level) -> Self {
		match level {
			Level::Trace => LogType::TRACE,
			Level::Debug => LogType::DEBUG,
			Level::Info => LogType::INFO,
			Level::Warn => LogType::WARN,
			Level::Error => LogType::ERROR,
		}
	}
}

/// Appends `<timestamp> [TYPE]: message` lines to one file.
pub struct Log {
	file: Mutex<File>,
	level: LevelFilter,
}

impl Log {
	pub fn open(file_path: &Path, level: LevelFilter) -> anyhow::Result<Self> {
		let file = OpenOptions::new()
			.append(true)
			.create(true)
			.open(file_path)
			.with_context(|| format!("ログファイルを開けませんでした:{}", file_path.display()))?;

		Ok(Log { file: Mutex::new(file), level })
	}

	pub fn write(&self, log_type: LogType, message: &str) -> std::io::Result<()> {
		let line = format_line(&log_type, message);
		match self.file.lock() {
			Ok(mut file) => writeln!(file, "{}", line),
			Err(_) => Ok(()),
		}
	}

	/// Routes the `log` macros of every crate into this file.
	pub fn install(self) -> anyhow::Result<()> {
		let level = self.level;
		log::set_boxed_logger(Box::new(self)).context("logger already installed")?;
		log::set_max_level(level);
		Ok(())
	}
}

fn format_line(log_type: &LogType, message: &str) -> String {
	format!("{} [{}]: {}", Local::now(), log_type, message)
}

impl log::Log for Log {
	fn enabled(&self, metadata: &Metadata) -> bool {
		metadata.level() <= self.level
	}

	fn log(&self, record: &Record) {
		if !self.enabled(record.metadata()) {
			return;
		}
		let _ = self.write(record.level().into(), &record.args().to_string());
	}

	fn flush(&self) {
		if let Ok(mut file) = self.file.lock() {
			let _ = file.flush();
		}
	}
}
