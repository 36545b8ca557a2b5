//! Progress bars for long ingestion runs, and a log writer that keeps them pinned.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();
static BARS_ENABLED: AtomicBool = AtomicBool::new(true);

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(|| {
        let mp = MultiProgress::new();
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        mp
    })
}

/// Turn progress bars off (machine-readable output) or back on
pub fn set_bars_enabled(enabled: bool) {
    BARS_ENABLED.store(enabled, Ordering::Relaxed);
}

fn bars_enabled() -> bool {
    BARS_ENABLED.load(Ordering::Relaxed) && io::stderr().is_terminal()
}

fn print_line(line: &str) {
    let line = line.trim_end_matches('\r');
    let _ = multi_progress().println(line);
}

/// An optional progress bar; every method is a no-op when bars are off
pub struct Progress {
    bar: Option<ProgressBar>,
}

impl Progress {
    pub fn start(len: usize, message: &str) -> Self {
        if len == 0 || !bars_enabled() {
            return Self::hidden();
        }

        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
        )
        .map(|s| s.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());

        let bar = multi_progress().add(ProgressBar::new(len as u64));
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar: Some(bar) }
    }

    pub fn hidden() -> Self {
        Self { bar: None }
    }

    pub fn inc(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub fn finish(self, message: &str) {
        if let Some(bar) = self.bar {
            bar.finish_with_message(message.to_string());
        }
    }
}

#[derive(Default, Clone)]
pub struct LogWriterFactory;

/// Buffers a log event and prints it line by line above any active bars
pub struct LogWriter {
    buffer: String,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.push_str(&String::from_utf8_lossy(buf));

        while let Some(idx) = self.buffer.find('\n') {
            print_line(&self.buffer[..idx]);
            self.buffer.drain(..idx + 1);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            print_line(self.buffer.trim_end_matches('\n'));
            self.buffer.clear();
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            buffer: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_progress_is_hidden() {
        let progress = Progress::start(0, "nothing");
        assert!(progress.bar.is_none());
        progress.inc();
        progress.finish("done");
    }

    #[test]
    fn test_disabled_bars_are_hidden() {
        set_bars_enabled(false);
        let progress = Progress::start(10, "ingesting");
        assert!(progress.bar.is_none());
        set_bars_enabled(true);
    }
}
