mod app;
mod config;

use crate::app::{App, WindowOptions};
use crate::config::ViewerConfig;
use abcview_runtime::Graphics;
use abcview_scene::Archive;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use winit::event_loop::EventLoop;

#[derive(Parser, Debug)]
#[command(name = "abcview", version, about = "Wireframe viewer for time-sampled scene archives")]
struct Cli {
    /// Archive to open; overrides `[archive] path` from the config.
    archive: Option<PathBuf>,

    /// Config file (defaults to ./abcview.toml when present).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the archive's node tree and exit.
    #[arg(long)]
    outline: bool,

    /// Write the default config to FILE and exit.
    #[arg(long, value_name = "FILE")]
    write_config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(path) = &cli.write_config {
        ViewerConfig::default()
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        return Ok(());
    }

    let mut config = ViewerConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.archive {
        config.archive.path = path;
    }

    let archive = Archive::open(&config.archive.path)
        .with_context(|| format!("opening {}", config.archive.path.display()))?;

    if cli.outline {
        print!("{}", archive.outline());
        return Ok(());
    }
    log::debug!("archive outline:\n{}", archive.outline());

    let settings = config.viewer_settings(Arc::new(archive));
    let window = WindowOptions {
        title: config.render.title.clone(),
        width: config.render.width,
        height: config.render.height,
    };

    let event_loop = EventLoop::<Graphics>::with_user_event().build()?;
    let mut app = App::new(&event_loop, window, settings);
    event_loop.run_app(&mut app)?;
    app.into_result()
}
