//! Logger setup
//!
//! Inside a pipeline runner, warnings and errors become workflow annotations
//! (`::warning::`, `::error::`) and debug lines go to the runner's debug log.

use std::io::Write;

use log::{Level, LevelFilter};

/// Workflow command prefix for a log level, `None` for plain output
fn annotation(level: Level) -> Option<&'static str> {
    match level {
        Level::Error => Some("::error::"),
        Level::Warn => Some("::warning::"),
        Level::Info => None,
        Level::Debug | Level::Trace => Some("::debug::"),
    }
}

/// Workflow commands are line based; `%`, CR and LF must be escaped
fn escape_command_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Initialise `env_logger`; `RUST_LOG` overrides the `info` default
pub fn init_logger(pipeline: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info).parse_default_env();

    if pipeline {
        builder.format(|buf, record| match annotation(record.level()) {
            Some(prefix) => writeln!(
                buf,
                "{}{}",
                prefix,
                escape_command_data(&record.args().to_string())
            ),
            None => writeln!(buf, "{}", record.args()),
        });
    } else {
        builder.format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        });
    }

    // stdout carries step outputs when no output file is set
    builder.target(env_logger::Target::Stderr);
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_map_to_workflow_commands() {
        assert_eq!(annotation(Level::Warn), Some("::warning::"));
        assert_eq!(annotation(Level::Error), Some("::error::"));
        assert_eq!(annotation(Level::Debug), Some("::debug::"));
        assert_eq!(annotation(Level::Info), None);
    }

    #[test]
    fn multiline_messages_stay_on_one_command() {
        assert_eq!(
            escape_command_data("failed: 100%\ncaused by: x"),
            "failed: 100%25%0Acaused by: x"
        );
    }
}
