//! Slide deck server: renders slides with keyboard navigation and a URL per slide,
//! for one deck or for every deck under a slides root.

mod pages;
mod routes;
mod sse;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use deck::io::config::load_config;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "deck-server")]
#[command(about = "Serve a slide deck over HTTP")]
struct Args {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, default_value = "3000")]
    port: u16,

    /// Deck configuration file; relative paths inside it resolve against its directory
    #[arg(long, default_value = "deck.toml")]
    config: PathBuf,

    /// Directory of static assets (images, fonts) served for unmatched paths
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// Rebuild the deck and reload open pages when slide files change
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("deck_server=info".parse()?)
                .add_directive("deck=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let config = load_config(&args.config)?;
    let base_dir = match args.config.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let base_dir = base_dir.canonicalize().unwrap_or(base_dir);
    info!(config = %args.config.display(), "starting deck-server");

    let mut state = AppState::from_config(&config, &base_dir)?;
    if let Err(err) = state.library.preload() {
        warn!(error = %format!("{:#}", err), "slide deck unavailable, serving empty state");
    }
    if args.watch {
        state = state.with_watch_dir(config.resolve_slides_dir(&base_dir));
    }

    sse::start_file_watcher(state.clone());

    let mut app = routes::app(state);

    if let Some(assets_dir) = args.assets_dir {
        if assets_dir.exists() {
            info!(assets_dir = %assets_dir.display(), "serving static assets");
            app = app.fallback_service(ServeDir::new(assets_dir));
        } else {
            warn!(assets_dir = %assets_dir.display(), "assets directory not found");
        }
    }

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
