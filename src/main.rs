//! tracker-setup CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tracker_setup::cli::{Cli, CommandDispatcher};
use tracker_setup::ui::{create_ui, OutputMode};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("tracker_setup=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tracker_setup=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("tracker-setup starting with args: {:?}", cli);

    let output_mode = OutputMode::from_flags(cli.verbose, cli.quiet, cli.silent);

    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    // Trigger paths are resolved against the root, so it must be absolute
    let project_root = match cli.project.clone() {
        Some(dir) => std::path::absolute(&dir).unwrap_or(dir),
        None => std::env::current_dir().unwrap_or_default(),
    };

    let mut ui = create_ui(true, output_mode);

    let dispatcher = CommandDispatcher::new(project_root).with_config(cli.config.clone());

    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            if let Some(hint) = e.hint() {
                ui.show_hint(&hint);
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
