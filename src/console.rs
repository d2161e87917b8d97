#![allow(unsafe_code)]

use crate::error::Result;

/// Keeps ANSI escape processing enabled on stdout while alive.
///
/// Only Windows consoles need this; everywhere else it does nothing.
pub struct VirtualTerminal {
    _priv: (),
}

impl VirtualTerminal {
    pub fn enable() -> Result<Self> {
        imp::enable()?;
        Ok(Self { _priv: () })
    }
}

impl Drop for VirtualTerminal {
    fn drop(&mut self) {
        imp::disable();
    }
}

#[cfg(windows)]
mod imp {
    use crate::error::Result;
    use std::io;
    use winapi::shared::minwindef::DWORD;
    use winapi::um::consoleapi::{GetConsoleMode, SetConsoleMode};
    use winapi::um::handleapi::INVALID_HANDLE_VALUE;
    use winapi::um::processenv::GetStdHandle;
    use winapi::um::winbase::STD_OUTPUT_HANDLE;
    use winapi::um::wincon::ENABLE_VIRTUAL_TERMINAL_PROCESSING;

    fn update(change: impl FnOnce(DWORD) -> DWORD) -> io::Result<()> {
        unsafe {
            let handle = GetStdHandle(STD_OUTPUT_HANDLE);
            if handle == INVALID_HANDLE_VALUE {
                return Err(io::Error::last_os_error());
            }

            let mut mode: DWORD = 0;
            if GetConsoleMode(handle, &mut mode) == 0 {
                return Err(io::Error::last_os_error());
            }

            if SetConsoleMode(handle, change(mode)) == 0 {
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    pub fn enable() -> Result<()> {
        update(|mode| mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING)?;
        Ok(())
    }

    pub fn disable() {
        let _ = update(|mode| mode & !ENABLE_VIRTUAL_TERMINAL_PROCESSING);
    }
}

#[cfg(not(windows))]
mod imp {
    use crate::error::Result;

    pub fn enable() -> Result<()> {
        Ok(())
    }

    pub fn disable() {}
}
