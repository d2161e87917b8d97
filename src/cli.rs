use std::env;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use clap::{App, Arg, ArgMatches, ErrorKind};
use log::LevelFilter;

use crate::config::{round_to_granularity, Config, ConfigBuilder};
use crate::error::{ConfigError, Error, Result};

lazy_static! {
    static ref VERSION: String = format!("{} for {}", crate_version!(), env::consts::OS);
}

const EXEC_FLAGS: [&str; 2] = ["-e", "--exec"];

pub fn get_args() -> Result<(Config, LevelFilter)> {
    get_args_from(env::args_os())
}

/// Builds the configuration from a full argument list, program name first.
///
/// Everything after the first `-e`/`--exec` is the command and is taken
/// verbatim, so the command's own flags never reach the parser. `--help` and
/// `--version` print and exit the process.
pub fn get_args_from<I, T>(args: I) -> Result<(Config, LevelFilter)>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let cmd = split_command(&mut args);

    let matches = app().get_matches_from_safe(args).map_err(|err| match err.kind {
        ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => err.exit(),
        ErrorKind::UnknownArgument => ConfigError::UnknownFlag(
            err.info
                .as_ref()
                .and_then(|info| info.first().cloned())
                .unwrap_or_default(),
        ),
        // Only the tick speed is limited to a single value.
        ErrorKind::UnexpectedMultipleUsage
        | ErrorKind::TooManyValues
        | ErrorKind::WrongNumberOfValues => ConfigError::TickSpeedAlreadySet,
        _ => ConfigError::Invalid(err.message),
    })?;

    let poll_interval = tick_speed(&matches)?;

    let cmd = match cmd {
        Some(cmd) => cmd,
        None => matches
            .values_of_os("exec")
            .map(|values| values.map(OsStr::to_os_string).collect())
            .unwrap_or_default(),
    };
    if cmd.is_empty() {
        return Err(ConfigError::NoExecFlag.into());
    }

    let cmd = cmd
        .into_iter()
        .map(|arg| {
            arg.into_string().map_err(|arg| {
                ConfigError::Invalid(format!("command is not valid UTF-8: {:?}", arg))
            })
        })
        .collect::<std::result::Result<Vec<String>, _>>()?;

    let paths = watch_paths(&matches)?;
    if paths.is_empty() {
        return Err(ConfigError::NothingToWatch.into());
    }

    let ignores: Vec<String> = matches
        .values_of("ignore")
        .map(|values| values.map(String::from).collect())
        .unwrap_or_default();

    let mut builder = ConfigBuilder::default();
    builder.cmd(cmd).paths(paths).ignores(ignores);
    if let Some(interval) = poll_interval {
        builder.poll_interval(interval);
    }

    let config = builder.build().map_err(ConfigError::Invalid)?;
    let level = if matches.is_present("debug") {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    Ok((config, level))
}

fn app() -> App<'static, 'static> {
    App::new("pollexec")
        .version(VERSION.as_str())
        .version_short("v")
        .about("Polls files for changes and re-runs a command when they do")
        .arg(Arg::with_name("path")
                 .help("File or directory to watch")
                 .multiple(true))
        .arg(Arg::with_name("watch")
                 .help("Adds more paths to watch")
                 .short("w")
                 .long("watch")
                 .multiple(true)
                 .takes_value(true)
                 .value_name("path"))
        .arg(Arg::with_name("ignore")
                 .help("Skips paths ending with, or matching, the pattern")
                 .short("i")
                 .long("ignore")
                 .multiple(true)
                 .takes_value(true)
                 .value_name("pattern"))
        .arg(Arg::with_name("tick-speed")
                 .help("Time to wait between two scans, defaults to 100ms")
                 .short("t")
                 .long("tick-speed")
                 .takes_value(true)
                 .min_values(0)
                 .max_values(1)
                 .allow_hyphen_values(true)
                 .value_name("milliseconds"))
        .arg(Arg::with_name("debug")
                 .help("Print debugging messages to stderr")
                 .long("debug")
                 .multiple(true))
        .arg(Arg::with_name("exec")
                 .help("Command to run when changes are detected; everything after it is passed on")
                 .short("e")
                 .long("exec")
                 .multiple(true)
                 .takes_value(true)
                 .value_name("command"))
        .after_help("EXAMPLES:
    pollexec . --ignore .git node_modules -t 1000 --exec ./build.sh
        Scans the current directory every second, skipping .git and
        node_modules, and runs ./build.sh on every change.

    pollexec src --tick-speed 3000 -e cargo test -- --nocapture
        Scans src every three seconds and runs the tests on every change.")
}

/// Takes the command off the end of `args`, flag included.
fn split_command(args: &mut Vec<OsString>) -> Option<Vec<OsString>> {
    let position = args
        .iter()
        .skip(1)
        .position(|arg| EXEC_FLAGS.iter().any(|flag| arg.as_os_str() == OsStr::new(flag)))?
        + 1;

    let cmd = args.split_off(position + 1);
    args.truncate(position);
    Some(cmd)
}

/// `-t` given without a value leaves the default in place.
fn tick_speed(matches: &ArgMatches) -> Result<Option<std::time::Duration>> {
    let raw = match matches.value_of("tick-speed") {
        Some(raw) => raw,
        None => return Ok(None),
    };

    let millis: i64 = raw
        .parse()
        .map_err(|_| ConfigError::MalformedTickSpeed(raw.to_string()))?;
    if millis <= 0 {
        return Err(ConfigError::TickSpeedNonPositive.into());
    }

    // A bare value right after the tick speed would otherwise become a path.
    if let (Some(tick), Some(mut paths)) =
        (matches.index_of("tick-speed"), matches.indices_of("path"))
    {
        if paths.any(|index| index == tick + 1) {
            return Err(ConfigError::ArgAfterTickSpeed.into());
        }
    }

    Ok(Some(round_to_granularity(millis as u64)))
}

/// Positional paths and `--watch` values, in the order they were given,
/// made absolute.
fn watch_paths(matches: &ArgMatches) -> Result<Vec<PathBuf>> {
    let mut given: Vec<(usize, &OsStr)> = Vec::new();
    for &name in &["path", "watch"] {
        if let (Some(values), Some(indices)) = (matches.values_of_os(name), matches.indices_of(name)) {
            given.extend(indices.zip(values));
        }
    }
    given.sort_by_key(|(index, _)| *index);

    given
        .into_iter()
        .map(|(_, path)| absolute(PathBuf::from(path)))
        .collect()
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }

    env::current_dir()
        .map(|cwd| cwd.join(&path))
        .map_err(|err| Error::Canonicalization(path.display().to_string(), err))
}
