use std::io::Write;

use pollexec::{cli, console::VirtualTerminal, error, run};

fn init_logger(level: log::LevelFilter) {
    env_logger::Builder::new()
        .format(|buf, r| writeln!(buf, "*** {}", r.args()))
        .filter(None, level)
        .init();
}

fn main() -> error::Result<()> {
    let (config, level) = cli::get_args()?;
    init_logger(level);

    let _terminal = VirtualTerminal::enable()?;

    run(config)
}
