//! Per-run log: `<logs>/<job>.log`, an optional line callback, and a
//! mirror of every line into `tracing`.
//!
//! External tool output is kept in a bounded tail buffer. In compact mode it
//! is only printed when a run fails (`show_tail`).

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

/// Where formatted lines go.
struct Sinks {
    file: Option<BufWriter<File>>,
    callback: Option<LogCallback>,
}

impl Sinks {
    fn emit(&mut self, line: &str) {
        if let Some(file) = self.file.as_mut() {
            // A full disk must not abort a render.
            let _ = writeln!(file, "{}", line);
        }
        if let Some(callback) = &self.callback {
            callback(line);
        }
    }
}

/// Logger owned by one composition run.
pub struct RunLogger {
    run_name: String,
    log_path: Option<PathBuf>,
    config: LogConfig,
    sinks: Mutex<Sinks>,
    tail: Mutex<VecDeque<String>>,
    /// Last progress bucket written in compact mode.
    progress_bucket: Mutex<Option<u32>>,
}

impl RunLogger {
    /// Log to `<log_dir>/<run_name>.log`, truncating an older log of the same run.
    pub fn new(
        run_name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> io::Result<Self> {
        let run_name = run_name.into();
        fs::create_dir_all(log_dir.as_ref())?;
        let log_path = log_dir
            .as_ref()
            .join(format!("{}.log", safe_file_stem(&run_name)));
        let file = BufWriter::new(File::create(&log_path)?);

        let mut logger = Self::in_memory(run_name, config);
        logger.log_path = Some(log_path);
        logger.sinks.get_mut().file = Some(file);
        logger.sinks.get_mut().callback = callback;
        Ok(logger)
    }

    /// Logger without a file; lines still reach `tracing`.
    pub fn in_memory(run_name: impl Into<String>, config: LogConfig) -> Self {
        Self {
            run_name: run_name.into(),
            log_path: None,
            tail: Mutex::new(VecDeque::with_capacity(config.error_tail.max(1))),
            config,
            sinks: Mutex::new(Sinks {
                file: None,
                callback: None,
            }),
            progress_bucket: Mutex::new(None),
        }
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        let run = self.run_name.as_str();
        match level {
            LogLevel::Trace => tracing::trace!(run, "{}", message),
            LogLevel::Debug => tracing::debug!(run, "{}", message),
            LogLevel::Info => tracing::info!(run, "{}", message),
            LogLevel::Warn => tracing::warn!(run, "{}", message),
            LogLevel::Error => tracing::error!(run, "{}", message),
        }
        if level >= self.config.level {
            self.write_line(message);
        }
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    /// `$ <command line>`
    pub fn command(&self, command: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Command.format(command));
    }

    /// `=== <step> ===`
    pub fn phase(&self, name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(name));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// `[TIMING] <label>: <seconds>s`, used for durations both measured and computed.
    pub fn timing(&self, label: &str, seconds: f64) {
        let text = format!("{}: {:.3}s", label, seconds);
        self.log(LogLevel::Info, &MessagePrefix::Timing.format(&text));
    }

    /// Log a progress percentage.
    ///
    /// In compact mode only the first value of each `progress_step` bucket
    /// (and 100) is written. Returns whether the line was written.
    pub fn progress(&self, percent: u32) -> bool {
        if self.config.compact && percent < 100 {
            let bucket = percent / self.config.progress_step.max(1);
            let mut last = self.progress_bucket.lock();
            if last.map_or(bucket == 0, |b| bucket <= b) {
                return false;
            }
            *last = Some(bucket);
        }
        self.info(&format!("Progress: {}%", percent));
        true
    }

    /// Keep one line of external tool output in the tail buffer.
    ///
    /// Outside compact mode the line is also logged immediately.
    pub fn output_line(&self, line: &str, is_stderr: bool) {
        {
            let mut tail = self.tail.lock();
            while tail.len() >= self.config.error_tail.max(1) {
                tail.pop_front();
            }
            tail.push_back(line.to_string());
        }
        if !self.config.compact {
            let marker = if is_stderr { "[stderr] " } else { "" };
            self.write_line(&format!("{}{}", marker, line));
        }
    }

    /// Write the tail buffer under a header line.
    pub fn show_tail(&self, header: &str) {
        let lines = self.tail();
        if lines.is_empty() {
            return;
        }
        self.write_line(&format!("[{}/tail]", header));
        for line in &lines {
            self.write_line(line);
        }
    }

    pub fn tail(&self) -> Vec<String> {
        self.tail.lock().iter().cloned().collect()
    }

    pub fn flush(&self) {
        if let Some(file) = self.sinks.lock().file.as_mut() {
            let _ = file.flush();
        }
    }

    /// Flush and release the log file. Later lines reach only the callback.
    pub fn close(&self) {
        let mut sinks = self.sinks.lock();
        if let Some(mut file) = sinks.file.take() {
            let _ = file.flush();
        }
    }

    fn write_line(&self, message: &str) {
        let line = if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        };
        self.sinks.lock().emit(&line);
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Job names come from output file names; keep them usable as file stems.
fn safe_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                '_'
            } else {
                c
            }
        })
        .collect()
}
