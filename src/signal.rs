#![allow(unsafe_code)]

use crate::error::Result;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, SendError, Sender};
use std::sync::Mutex;
use std::time::Duration;

lazy_static! {
    static ref INTERRUPT_TX: Mutex<Option<Sender<()>>> = Mutex::new(None);
}

/// Relays interrupt and termination requests to the watch loop.
///
/// Created with [`Interrupts::install`], this hooks SIGINT and SIGTERM (or
/// console control events on Windows) for as long as it lives. Dropping it
/// removes the hooks.
pub struct Interrupts {
    rx: Receiver<()>,
    hooked: bool,
}

impl Interrupts {
    pub fn install() -> Result<Self> {
        let (tx, rx) = channel();
        if let Ok(mut guard) = INTERRUPT_TX.lock() {
            *guard = Some(tx);
        }

        if let Err(err) = imp::install() {
            clear_sender();
            return Err(err);
        }

        debug!("Listening for interrupts");
        Ok(Self { rx, hooked: true })
    }

    /// A listener fed only through the returned sender, with no OS hooks.
    pub fn manual() -> (Sender<()>, Self) {
        let (tx, rx) = channel();
        (tx, Self { rx, hooked: false })
    }

    /// Blocks for at most `timeout`; true if an interrupt arrived.
    ///
    /// A listener whose sending side is gone counts as interrupted.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(()) => {
                debug!("Interrupt received");
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Interrupt listener went away");
                true
            }
        }
    }
}

impl Drop for Interrupts {
    fn drop(&mut self) {
        if self.hooked {
            imp::uninstall();
            clear_sender();
        }
    }
}

fn send_interrupt() -> std::result::Result<(), SendError<()>> {
    match INTERRUPT_TX.lock() {
        Ok(guard) => match *guard {
            Some(ref tx) => tx.send(()),
            None => Err(SendError(())),
        },
        Err(_) => Err(SendError(())),
    }
}

fn clear_sender() {
    if let Ok(mut guard) = INTERRUPT_TX.lock() {
        *guard = None;
    }
}

/// SIGINT and SIGTERM are blocked on the calling thread and collected by a
/// dedicated thread with `sigwait`. Threads spawned afterwards inherit the
/// mask; child processes get a clean one from std.
#[cfg(unix)]
mod imp {
    use crate::error::{Error, Result};
    use nix::sys::signal::{SigSet, Signal};
    use std::thread;

    fn mask() -> SigSet {
        let mut mask = SigSet::empty();
        mask.add(Signal::SIGINT);
        mask.add(Signal::SIGTERM);
        mask
    }

    pub fn install() -> Result<()> {
        let mask = mask();
        mask.thread_block()
            .map_err(|err| Error::Signal(err.to_string()))?;

        thread::Builder::new()
            .name("interrupts".into())
            .spawn(move || loop {
                match mask.wait() {
                    Ok(signal) => {
                        debug!("Received {:?}", signal);
                        if super::send_interrupt().is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!("Unable to wait for signals: {}", err);
                        break;
                    }
                }
            })
            .map_err(|err| Error::Signal(err.to_string()))?;

        Ok(())
    }

    /// Unblocks the signals on the calling thread only. The relay thread is
    /// detached and stays parked in `sigwait`; it swallows at most one more
    /// signal, finds no sender and exits.
    pub fn uninstall() {
        let _ = mask().thread_unblock();
    }
}

#[cfg(windows)]
mod imp {
    use crate::error::{Error, Result};
    use std::io;
    use winapi::shared::minwindef::{BOOL, DWORD, FALSE, TRUE};
    use winapi::um::consoleapi::SetConsoleCtrlHandler;

    unsafe extern "system" fn ctrl_handler(_: DWORD) -> BOOL {
        // Handled: the loop exits on its own once the running command returns.
        match super::send_interrupt() {
            Ok(()) => TRUE,
            Err(_) => FALSE,
        }
    }

    pub fn install() -> Result<()> {
        if unsafe { SetConsoleCtrlHandler(Some(ctrl_handler), TRUE) } == 0 {
            return Err(Error::Signal(io::Error::last_os_error().to_string()));
        }

        Ok(())
    }

    pub fn uninstall() {
        unsafe {
            SetConsoleCtrlHandler(Some(ctrl_handler), FALSE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{send_interrupt, Interrupts};
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn manual_times_out_without_interrupt() {
        let (_tx, interrupts) = Interrupts::manual();
        let started = Instant::now();

        assert!(!interrupts.wait_timeout(Duration::from_millis(20)));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn manual_interrupt_wakes_waiter() {
        let (tx, interrupts) = Interrupts::manual();
        thread::spawn(move || tx.send(()).unwrap());

        assert!(interrupts.wait_timeout(Duration::from_secs(5)));
    }

    #[test]
    fn dropped_sender_counts_as_interrupt() {
        let (tx, interrupts) = Interrupts::manual();
        drop(tx);

        assert!(interrupts.wait_timeout(Duration::from_secs(5)));
    }

    #[test]
    fn installed_listener_relays_and_cleans_up() {
        let interrupts = Interrupts::install().unwrap();
        send_interrupt().unwrap();

        assert!(interrupts.wait_timeout(Duration::from_secs(5)));

        drop(interrupts);
        assert!(send_interrupt().is_err());
    }
}
