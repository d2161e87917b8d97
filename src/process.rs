use crate::error::Error;
use std::process::Stdio;

/// How a command run ended, as far as the watch loop is concerned.
#[derive(Debug)]
pub enum Outcome {
    /// The command ran to completion. Signal-terminated commands report `-1`.
    Exited(i32),
    /// The command could not be run at all; the loop must stop.
    Fatal(Error),
}

impl Outcome {
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Outcome::Fatal(_))
    }
}

/// Runs `cmd` through the platform shell and blocks until it exits.
///
/// The child shares our stdin, stdout and stderr.
pub fn run(cmd: &[String]) -> Outcome {
    let mut command = match shell_command(cmd) {
        Ok(command) => command,
        Err(err) => return Outcome::Fatal(err),
    };

    command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    debug!("Assembled command {:?}", command);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => return Outcome::Fatal(Error::Spawn(cmd.join(" "), err)),
    };

    match child.wait() {
        Ok(status) => {
            debug!("Command exited with {}", status);
            Outcome::Exited(status.code().unwrap_or(-1))
        }
        Err(err) => Outcome::Fatal(Error::Io(err)),
    }
}

pub use self::imp::shell_command;

#[cfg(target_family = "unix")]
mod imp {
    use crate::error::Result;
    use std::process::Command;

    /// `/bin/sh -c` with the whole command line as one string, so pipes and
    /// redirects work.
    pub fn shell_command(cmd: &[String]) -> Result<Command> {
        let mut command = Command::new("/bin/sh");
        command.arg("-c").arg(cmd.join(" "));
        Ok(command)
    }
}

#[cfg(target_family = "windows")]
mod imp {
    use crate::error::Result;
    use std::process::Command;

    pub fn shell_command(cmd: &[String]) -> Result<Command> {
        let mut command = Command::new("cmd");
        command.arg("/c").args(cmd);
        Ok(command)
    }
}

#[cfg(not(any(target_family = "unix", target_family = "windows")))]
mod imp {
    use crate::error::{Error, Result};
    use std::process::Command;

    pub fn shell_command(_cmd: &[String]) -> Result<Command> {
        Err(Error::UnsupportedPlatform(std::env::consts::OS.to_string()))
    }
}

#[cfg(test)]
#[cfg(target_family = "unix")]
mod tests {
    use super::{run, shell_command, Outcome};
    use std::ffi::OsStr;

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn joins_command_for_sh() {
        let command = shell_command(&cmd(&["cargo", "test", "--", "--nocapture"])).unwrap();

        assert_eq!(command.get_program(), OsStr::new("/bin/sh"));
        assert_eq!(
            command.get_args().collect::<Vec<_>>(),
            vec![OsStr::new("-c"), OsStr::new("cargo test -- --nocapture")]
        );
    }

    #[test]
    fn reports_success() {
        match run(&cmd(&["true"])) {
            Outcome::Exited(0) => {}
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn nonzero_exit_is_not_fatal() {
        let outcome = run(&cmd(&["exit", "3"]));

        assert!(!outcome.is_fatal());
        match outcome {
            Outcome::Exited(3) => {}
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn missing_program_is_reported_by_the_shell() {
        match run(&cmd(&["definitely-not-a-real-program-4242"])) {
            Outcome::Exited(127) => {}
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn killed_by_signal() {
        match run(&cmd(&["kill", "-9", "$$"])) {
            Outcome::Exited(-1) => {}
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
