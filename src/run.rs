use std::io::{self, Write};
use std::time::{Duration, Instant, SystemTime};

use crate::config::Config;
use crate::error::Result;
use crate::filter::IgnoreFilter;
use crate::process::{self, Outcome};
use crate::scan::{Change, Scanner};
use crate::signal::Interrupts;

/// What the watch loop calls into.
///
/// Returning an error from any method stops the loop and the error becomes
/// the result of [`watch`].
pub trait Handler {
    /// Called once, right after the baseline scan, whatever it found.
    fn on_first_run(&mut self) -> Result<()>;

    /// Called when a tick finds an entry newer than everything seen before.
    fn on_update(&mut self, change: &Change) -> Result<()>;

    /// Called on ticks that found nothing new.
    fn on_idle(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Runs the configured command and narrates it on `out`.
pub struct ExecHandler<W: Write> {
    cmd: Vec<String>,
    out: W,
}

impl<W: Write> ExecHandler<W> {
    pub fn new(cmd: Vec<String>, out: W) -> Self {
        Self { cmd, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn execute(&mut self, headline: &str) -> Result<()> {
        write!(
            self.out,
            "\x1b[2J\x1b[1;1H[\x1b[90m{}\x1b[m] {}\x1b[m\n\n",
            timestamp(),
            headline
        )?;
        self.out.flush()?;

        debug!("Launching child process");
        match process::run(&self.cmd) {
            Outcome::Fatal(err) => Err(err),
            Outcome::Exited(code) => {
                if code != 0 {
                    write!(self.out, "\nexited with code \x1b[33m{}\x1b[m\n", code)?;
                }

                writeln!(self.out)?;
                self.out.flush()?;
                Ok(())
            }
        }
    }
}

impl<W: Write> Handler for ExecHandler<W> {
    fn on_first_run(&mut self) -> Result<()> {
        self.execute("First execution")
    }

    fn on_update(&mut self, change: &Change) -> Result<()> {
        let headline = format!("{} has changed", change.path.display());
        self.execute(&headline)
    }

    fn on_idle(&mut self) -> Result<()> {
        write!(self.out, "[\x1b[90m{}\x1b[m]\r", timestamp())?;
        self.out.flush()?;
        Ok(())
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// The loop's memory between ticks: the newest modification time seen.
pub struct WatchState {
    scanner: Scanner,
    baseline: Option<SystemTime>,
}

impl WatchState {
    /// Takes the baseline scan.
    pub fn new(scanner: Scanner) -> Result<Self> {
        let baseline = scanner.scan()?.modified();
        debug!("Baseline: {:?}", baseline);

        Ok(Self { scanner, baseline })
    }

    pub const fn baseline(&self) -> Option<SystemTime> {
        self.baseline
    }

    /// Scans once. A change is returned only when it is strictly newer than
    /// the baseline, which moves forward to it before returning.
    pub fn poll(&mut self) -> Result<Option<Change>> {
        match self.scanner.scan()?.latest {
            Some(change) if Some(change.modified) > self.baseline => {
                self.baseline = Some(change.modified);
                Ok(Some(change))
            }
            _ => Ok(None),
        }
    }
}

/// Fixed-period deadlines. A tick missed while the loop was busy fires
/// once, immediately; the rest are dropped.
struct Ticker {
    interval: Duration,
    next: Instant,
}

impl Ticker {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now() + interval,
        }
    }

    /// Waits for the next tick; false if interrupted first.
    fn tick(&mut self, interrupts: &Interrupts) -> bool {
        let timeout = self.next.saturating_duration_since(Instant::now());
        if interrupts.wait_timeout(timeout) {
            return false;
        }

        let now = Instant::now();
        self.next += self.interval;
        while self.next + self.interval <= now {
            self.next += self.interval;
        }

        true
    }
}

/// Watches `config.paths` until `interrupts` fires or something fatal
/// happens.
pub fn watch<H: Handler>(config: &Config, handler: &mut H, interrupts: &Interrupts) -> Result<()> {
    let filter = IgnoreFilter::new(&config.ignores)?;
    let scanner = Scanner::new(config.paths.clone(), filter);
    for path in scanner.paths() {
        debug!("Watching {:?}", path);
    }

    let mut state = WatchState::new(scanner)?;
    info!("Polling for changes every {:?}", config.poll_interval);

    handler.on_first_run()?;

    let mut ticker = Ticker::new(config.poll_interval);
    while ticker.tick(interrupts) {
        match state.poll()? {
            Some(change) => {
                debug!("Path updated: {:?}", change.path);
                handler.on_update(&change)?;
            }
            None => handler.on_idle()?,
        }
    }

    debug!("Stopped watching");
    Ok(())
}

/// Runs the configured command on every change until interrupted.
pub fn run(config: Config) -> Result<()> {
    let interrupts = Interrupts::install()?;
    let mut handler = ExecHandler::new(config.cmd.clone(), io::stdout());

    watch(&config, &mut handler, &interrupts)
}
