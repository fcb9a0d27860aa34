//! pinfetch - command line front-end for downloading a Pinterest board
//!
//! Plays the part of the extension popup: asks the coordinator for its
//! state, starts the download, prints every state change and turns Ctrl-C
//! into a cancel request.

use clap::Parser;
use color_eyre::eyre::{Result, bail, eyre};
use pinfetch::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pinfetch", version, about = "Download every image of a Pinterest board")]
struct Args {
    /// Board URL, e.g. https://www.pinterest.com/alice/garden/
    board_url: String,

    /// Directory the board folder is created in
    #[arg(short, long, default_value = "downloads")]
    out: PathBuf,

    /// Cookie header of a logged-in Pinterest session
    #[arg(long, env = "PINTEREST_COOKIE", hide_env_values = true)]
    cookie: Option<String>,

    /// Upper bound of the random pause between files, in milliseconds
    #[arg(long, default_value_t = 2000)]
    max_pause_ms: u64,

    /// Pins requested per feed page
    #[arg(long, default_value_t = 25)]
    page_size: u32,

    /// API origin, for testing against a mirror
    #[arg(long, hide = true, default_value = pinfetch::config::DEFAULT_API_BASE)]
    api_base: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pinfetch=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = ConfigBuilder::default()
        .api_base(args.api_base)
        .cookie(args.cookie)
        .pause_ceiling_ms(args.max_pause_ms)
        .page_size(args.page_size)
        .teardown_delay_ms(0u64)
        .build()?;

    let sink = Arc::new(FsSink::new(&args.out));
    tracing::info!(root = %sink.root().display(), "Saving board images");
    let coordinator = Coordinator::pinterest(config, sink);

    let view = PopupView::initial(
        &args.board_url,
        coordinator.handle(Request::PopupReady).as_ref(),
    );
    if view == PopupView::NotOnBoard {
        bail!("{}: {}", args.board_url, view);
    }

    let mut events = coordinator.subscribe();
    println!("{}", PopupView::Starting);
    coordinator.handle(Request::StartBoardDownload {
        board_url: args.board_url.clone(),
    });

    let mut view = PopupView::Starting;
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c(), if view.can_cancel() => {
                signal?;
                coordinator.handle(Request::CancelBoardDownload);
                view = PopupView::Canceling;
                println!("{}", view);
            }
            received = events.recv() => match received {
                Ok(event) => {
                    let terminal = event.is_terminal();
                    let next = PopupView::from_event(&event);
                    // Keep showing "Canceling…" until the session confirms.
                    if terminal || view != PopupView::Canceling {
                        view = next;
                        println!("{}", view);
                    }
                    if terminal {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Progress output lagging");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    match view {
        PopupView::Error { message } => Err(eyre!(message)),
        _ => {
            println!("Saved to {}", args.out.display());
            Ok(())
        }
    }
}
