use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Read};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// How often the reporter samples the counter
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Rotating glyph; the trailing space is the finished frame
const SPINNER_CHARS: &str = "|/-\\ ";

/// Byte count shared between the transfer and the reporter.
/// Written by the transfer only; read without coordination for display.
#[derive(Debug, Default)]
pub struct TransferCounter(AtomicU64);

impl TransferCounter {
    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Reader that adds every byte it yields to a counter
pub struct CountingReader<'a, R: Read> {
    inner: R,
    counter: &'a TransferCounter,
}

impl<'a, R: Read> CountingReader<'a, R> {
    pub fn new(inner: R, counter: &'a TransferCounter) -> Self {
        Self { inner, counter }
    }
}

impl<R: Read> Read for CountingReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.counter.add(n as u64);
        Ok(n)
    }
}

/// Percentage for display. An empty total reads as complete.
pub fn percent(done: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        done as f64 / total as f64 * 100.0
    }
}

/// Background status line for one transfer
pub struct ProgressMonitor {
    bar: ProgressBar,
    total: u64,
    interval: Duration,
}

impl ProgressMonitor {
    /// `visible = false` keeps all accounting but draws nothing.
    /// Visible bars are drawn on stderr and stay silent when it is not a terminal.
    pub fn new(label: &str, total: u64, visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(Some(total), target);
        bar.set_style(running_style());
        bar.set_prefix(label.to_string());
        Self {
            bar,
            total,
            interval: REFRESH_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Last sampled counter value
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }

    /// Run `work` on the calling thread while a reporter thread samples its
    /// counter. The reporter is told to stop when `work` returns, fails, or
    /// panics, and is always joined before this returns.
    pub fn run<T>(&self, work: impl FnOnce(&TransferCounter) -> T) -> T {
        let counter = TransferCounter::default();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        thread::scope(|scope| {
            let counter_ref = &counter;
            let reporter =
                scope.spawn(move || report(&self.bar, counter_ref, self.total, self.interval, stop_rx));

            let out = work(&counter);

            // Disconnecting the channel is the stop signal
            drop(stop_tx);
            // Display is best effort: a reporter panic is not the transfer's problem
            let _ = reporter.join();
            out
        })
    }
}

/// Convenience wrapper: build a monitor and run `work` under it
pub fn with_progress<T>(
    label: &str,
    total: u64,
    visible: bool,
    work: impl FnOnce(&TransferCounter) -> T,
) -> T {
    ProgressMonitor::new(label, total, visible).run(work)
}

fn report(
    bar: &ProgressBar,
    counter: &TransferCounter,
    total: u64,
    interval: Duration,
    stop: Receiver<()>,
) {
    draw(bar, counter, total);
    loop {
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => draw(bar, counter, total),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    draw(bar, counter, total);
    bar.set_style(done_style());
    bar.finish();
}

fn draw(bar: &ProgressBar, counter: &TransferCounter, total: u64) {
    let done = counter.get();
    bar.set_position(done);
    bar.set_message(format!("{:.2}%", percent(done, total)));
    bar.tick();
}

fn running_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix}... {spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_CHARS)
}

fn done_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix}... done").unwrap_or_else(|_| ProgressStyle::default_spinner())
}
