use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;

use convedit::config::EditorConfig;
use convedit::geometry::Size;
use convedit::state::EditorState;
use convedit::store;

#[derive(Parser, Debug)]
#[command(author, version, about = "Edit branching-dialogue conversation graphs", long_about = None)]
struct Cli {
    /// Conversation JSON file. Defaults to ./conversation.json when present.
    #[arg(value_name = "FILE")]
    file: Option<Utf8PathBuf>,

    /// Editor configuration (JSON).
    #[arg(long, value_name = "PATH")]
    config: Option<Utf8PathBuf>,

    /// Initial zoom level.
    #[arg(long)]
    zoom: Option<f64>,

    #[arg(long)]
    min_zoom: Option<f64>,

    #[arg(long)]
    max_zoom: Option<f64>,

    /// Print the document with computed positions and exit.
    #[arg(long)]
    dump: bool,
}

fn load_config(cli: &Cli) -> Result<EditorConfig> {
    let mut config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    if let Some(z) = cli.zoom {
        config.zoom.initial = z;
    }
    if let Some(z) = cli.min_zoom {
        config.zoom.min = z;
    }
    if let Some(z) = cli.max_zoom {
        config.zoom.max = z;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let mut state = EditorState::new(config);
    // Layout of unplaced nodes depends on the visible width; use the initial
    // window size until the canvas reports its own.
    state.set_view_size(Size::new(1200.0, 800.0));

    if cli.dump {
        let path = cli
            .file
            .clone()
            .or_else(|| store::autoload_candidate(Utf8Path::new(".")))
            .ok_or_else(|| anyhow::anyhow!("--dump needs a FILE or ./{}", store::AUTOLOAD_FILE))?;
        state.open(&path)?;
        println!("{}", state.document.to_json_string_pretty()?);
        return Ok(());
    }

    match &cli.file {
        Some(path) => state.open(path)?,
        None => {
            if let Some(path) = store::autoload_candidate(Utf8Path::new(".")) {
                if let Err(e) = state.open(&path) {
                    log::warn!("could not autoload {}: {:#}", path, e);
                    state.status = format!("Could not load {}: {:#}", path, e);
                }
            }
        }
    }

    run_window(state)
}

#[cfg(feature = "egui")]
fn run_window(state: EditorState) -> Result<()> {
    convedit::egui_app::run(state)
}

#[cfg(not(feature = "egui"))]
fn run_window(_state: EditorState) -> Result<()> {
    eprintln!("This build has no window. Rebuild with the 'egui' feature or use --dump.");
    Ok(())
}
