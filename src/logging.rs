//! `env_logger` setup for the driver: one line format, written to the
//! terminal and to a log file in the output directory.
use log::{debug, LevelFilter};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

const HEADER_WIDTH: usize = 80;

/// Writer duplicating everything to stderr and an optional file.
struct Tee {
    file: Option<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Last `::` segment of a log target.
fn short_target(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

/// Install the global logger. `RUST_LOG` overrides the level chosen by `debug`.
pub fn init(debug: bool, log_file: Option<&Path>) -> Result<(), String> {
    let file = match log_file {
        Some(path) => Some(
            File::create(path)
                .map_err(|e| format!("Failed to create log file {}: {e}", path.display()))?,
        ),
        None => None,
    };
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{:<12} {:<7}: {}",
                short_target(record.target()),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(Tee { file })))
        .try_init()
        .map_err(|e| format!("Failed to initialise logger: {e}"))
}

/// Separator line followed by the centred program name and version.
pub fn program_header(name: &str, version: &str) {
    debug!("{}", "-".repeat(HEADER_WIDTH));
    let head = format!("{name} - v. {version}");
    let pad = HEADER_WIDTH.saturating_sub(head.len()) / 2;
    debug!("{}{}", " ".repeat(pad), head);
}

pub fn dump_args<'a>(args: impl IntoIterator<Item = (&'a str, String)>) {
    debug!("Arguments:");
    for (key, value) in args {
        debug!("    {key:<20} = {value}");
    }
}
