#![warn(clippy::all, rust_2018_idioms)]

use std::path::PathBuf;
use std::process::ExitCode;

use drawit_canvas::config::CanvasConfig;
use drawit_canvas::renderer::Compositor;
use drawit_canvas::serializer::{self, Painting};

const USAGE: &str = "usage: drawit-preview <painting.json> <out.png> [config.json]";

fn run(painting_path: PathBuf, out_path: PathBuf, config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => CanvasConfig::from_json_file(path)?,
        None => CanvasConfig::default(),
    };

    let json = std::fs::read_to_string(&painting_path)?;
    let painting: Painting = serde_json::from_str(&json)?;
    let canvas = serializer::from_persisted(&painting, &config)?;
    log::info!(
        "loaded painting {} ({} layers, {}x{})",
        painting.id,
        canvas.layers().len(),
        painting.width,
        painting.height
    );

    let png = Compositor::new(&config).export_png(canvas.layers())?;
    std::fs::write(&out_path, png)?;
    log::info!("wrote preview to {}", out_path.display());
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> ExitCode {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let (Some(painting), Some(out)) = (args.next(), args.next()) else {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    };
    let config = args.next();

    match run(painting, out, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("preview failed: {}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
