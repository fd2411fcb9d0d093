use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use tracing::{error, info, warn};

use mandeltouch_app::cli::{Action, CliOptions};
use mandeltouch_app::{Explorer, ViewState};
use mandeltouch_core::FractalMode;
use mandeltouch_render::{builtin_color_map, export_png, suggested_file_name, ExportMetadata};

const RENDER_TIMEOUT: Duration = Duration::from_secs(600);

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let opts = CliOptions::parse();

    info!("Starting MandelTouch");
    match run(opts) {
        Ok(path) => {
            info!(path = %path.display(), "Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(opts: CliOptions) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let state = ViewState::decode_or_default(opts.state.as_deref(), opts.aspect);
    let mut explorer = Explorer::new(state, opts.aspect, opts.resolution)?;

    let mut color_map_name = "custom".to_string();
    if let Some(name) = &opts.color_map {
        match builtin_color_map(name) {
            Some(config) => {
                explorer.set_color_map(config)?;
                color_map_name = name.to_lowercase();
            }
            None => warn!("Unknown color map '{name}'; keeping the current one"),
        }
    }
    if let Some(c) = opts.julia {
        explorer.set_mode(FractalMode::Julia { c });
    }

    for action in &opts.actions {
        let applied = match *action {
            Action::Touch(event) => explorer.handle_touch(event),
            Action::Wheel { x, y, delta_y } => explorer.wheel(x, y, delta_y),
            Action::CycleColors(step) => {
                explorer.cycle_colors(step);
                Ok(())
            }
            Action::Reset => {
                explorer.reset();
                Ok(())
            }
        };
        // A rejected input leaves the view as it was.
        if let Err(e) = applied {
            warn!(?action, "Input rejected: {e}");
        }
    }

    explorer.request_render();
    let frame = explorer
        .wait_for_frame(RENDER_TIMEOUT)
        .ok_or("render did not complete")?;

    let path = if opts.output.is_dir() {
        opts.output
            .join(suggested_file_name(explorer.viewport(), explorer.zoom_level()))
    } else {
        opts.output
    };
    let state = explorer.state();
    let metadata = ExportMetadata {
        mode: explorer.mode(),
        viewport: *explorer.viewport(),
        zoom_level: explorer.zoom_level(),
        color_map: color_map_name,
        state: Some(state.encode()),
    };
    export_png(&frame, &path, &metadata)?;

    println!("{}", state.encode());
    Ok(path)
}
