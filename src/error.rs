use globset;
use std::path::PathBuf;
use std::{error::Error as StdError, fmt, io};
use walkdir;

pub type Result<T> = ::std::result::Result<T, Error>;

pub enum Error {
    Canonicalization(String, io::Error),
    Config(ConfigError),
    Glob(globset::Error),
    Io(io::Error),
    Scan(PathBuf, io::Error),
    Signal(String),
    Spawn(String, io::Error),
    UnsupportedPlatform(String),
}

/// Problems with the arguments or the assembled configuration.
///
/// All of these are reported before the watch loop starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    NothingToWatch,
    NoExecFlag,
    UnknownFlag(String),
    ArgAfterTickSpeed,
    MalformedTickSpeed(String),
    TickSpeedNonPositive,
    TickSpeedAlreadySet,
    Invalid(String),
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Canonicalization(_, err)
            | Error::Io(err)
            | Error::Scan(_, err)
            | Error::Spawn(_, err) => Some(err),
            Error::Glob(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<globset::Error> for Error {
    fn from(err: globset::Error) -> Self {
        Error::Glob(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from).unwrap_or_default();
        Error::Scan(path, err.into())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::NothingToWatch => write!(f, "no file to watch over has been given"),
            ConfigError::NoExecFlag => write!(
                f,
                "no execution flag has been found or there is nothing after it"
            ),
            ConfigError::UnknownFlag(flag) => write!(f, "unknown flag: {}", flag),
            ConfigError::ArgAfterTickSpeed => write!(
                f,
                "only one argument should be passed after a tick speed flag"
            ),
            ConfigError::MalformedTickSpeed(value) => write!(
                f,
                "given milliseconds failed to be parsed as a number: {}",
                value
            ),
            ConfigError::TickSpeedNonPositive => write!(f, "tick speed must be positive"),
            ConfigError::TickSpeedAlreadySet => write!(f, "the tick speed has already been set"),
            ConfigError::Invalid(reason) => write!(f, "{}", reason),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} error: {}",
            match self {
                Error::Canonicalization(_, _) => "Path",
                Error::Config(_) => "Configuration",
                Error::Glob(_) => "Globset",
                Error::Io(_) => "I/O",
                Error::Scan(_, _) => "Scan",
                Error::Signal(_) => "Signal",
                Error::Spawn(_, _) => "Process",
                Error::UnsupportedPlatform(_) => "Platform",
            },
            match self {
                Error::Canonicalization(path, err) => {
                    format!("couldn't make '{}' absolute:\n{}", path, err)
                }
                Error::Config(err) => err.to_string(),
                Error::Glob(err) => err.to_string(),
                Error::Io(err) => err.to_string(),
                Error::Scan(path, err) => format!("couldn't read '{}': {}", path.display(), err),
                Error::Signal(reason) => format!("couldn't listen for interrupts: {}", reason),
                Error::Spawn(cmd, err) => format!("couldn't start `{}`: {}", cmd, err),
                Error::UnsupportedPlatform(os) => format!("unsupported OS: {}", os),
            }
        )
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, Error};
    use std::io;

    #[test]
    fn config_errors_read_as_configuration() {
        let err: Error = ConfigError::TickSpeedNonPositive.into();
        assert_eq!(
            err.to_string(),
            "Configuration error: tick speed must be positive"
        );
    }

    #[test]
    fn scan_errors_name_the_path() {
        let err = Error::Scan(
            "/srv/app/gone".into(),
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        assert_eq!(
            err.to_string(),
            "Scan error: couldn't read '/srv/app/gone': not found"
        );
    }

    #[test]
    fn debug_is_display() {
        let err = Error::UnsupportedPlatform("plan9".into());
        assert_eq!(format!("{:?}", err), "Platform error: unsupported OS: plan9");
    }
}
