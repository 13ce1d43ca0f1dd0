//! gameview - headless game review from the command line.
//!
//! Three ways in:
//!
//! - **`replay <pgn>`**: replays a local PGN file offline and prints every
//!   move with its comments, optionally revealed character by character.
//! - **`submit <pgn>`**: posts the game to the analysis backend over HTTP and
//!   prints the initial analysis it returns.
//! - **`attach <session>`**: joins a live backend session over the push
//!   channel and prints the review as analysis streams in.
//!
//! Logs go to a daily rolling file (see [`config::get_log_dir`]) so they never
//! mix with the printed review.

mod config;
mod report;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use analysis::OpeningBook;
use analysis_client::{AnalysisApi, TcpTransport};
use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use viewer::converters::records_from_pgn;
use viewer::prelude::*;
use viewer::{Navigator, RevealScheduler};

#[derive(Parser)]
#[command(name = "gameview", about = "Review analysed chess games", version)]
struct Cli {
    /// Extra JSON opening book, merged over the builtin one.
    #[arg(long, global = true)]
    book: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a PGN file offline.
    Replay {
        pgn: PathBuf,
        /// Reveal each comment one character per this many milliseconds.
        #[arg(long, default_value_t = 0)]
        animate_ms: u64,
    },
    /// Submit a PGN file for analysis over HTTP.
    Submit {
        pgn: PathBuf,
        /// Base URL of the backend; defaults to `GAMEVIEW_HTTP_URL`.
        #[arg(long)]
        http_url: Option<String>,
    },
    /// Follow a live analysis session.
    Attach {
        session_id: String,
        /// `host:port` of the push channel; defaults to `GAMEVIEW_SERVER_ADDR`.
        #[arg(long)]
        server: Option<String>,
        /// Ask the backend to analyse the whole game once the moves arrive.
        #[arg(long)]
        full: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_dir = config::get_log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "gameview");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let book = Arc::new(load_book(cli.book.or_else(config::get_opening_book_path))?);
    tracing::info!(entries = book.len(), "gameview starting");

    match cli.command {
        Commands::Replay { pgn, animate_ms } => replay(&pgn, book, animate_ms).await?,
        Commands::Submit { pgn, http_url } => {
            let url = http_url.unwrap_or_else(config::get_http_url);
            submit(&pgn, book, &url).await?
        }
        Commands::Attach {
            session_id,
            server,
            full,
        } => {
            let addr = server.unwrap_or_else(config::get_server_addr);
            attach(&session_id, book, &addr, full).await?
        }
    }

    tracing::info!("gameview exiting");
    Ok(())
}

fn load_book(extra: Option<PathBuf>) -> anyhow::Result<OpeningBook> {
    let mut book = OpeningBook::builtin();
    if let Some(path) = extra {
        let loaded = OpeningBook::load(&path)
            .with_context(|| format!("loading opening book {}", path.display()))?;
        tracing::info!(path = %path.display(), entries = loaded.len(), "Loaded opening book");
        book.extend(loaded);
    }
    Ok(book)
}

fn read_game(path: &Path) -> anyhow::Result<(String, chess::PgnGame)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let game = chess::parse_pgn(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok((text, game))
}

async fn replay(path: &Path, book: Arc<OpeningBook>, animate_ms: u64) -> anyhow::Result<()> {
    let (_, game) = read_game(path)?;
    let records = records_from_pgn(&game, 0)?;

    // Offline: the transport is never connected.
    let transport = TcpTransport::new(config::get_server_addr())?;
    let handle = spawn_review_session(Navigator::new(book), transport);
    let mut snapshot = handle.load_local(records, game.tags.clone()).await?;
    println!("{}\n", report::summary(&snapshot));

    let mut reveals = RevealScheduler::new();
    let tick = Duration::from_millis(animate_ms);
    for index in 0..snapshot.moves.len() {
        if index > 0 {
            snapshot = handle.move_next().await?;
        }
        let Some(record) = snapshot.current_move() else {
            break;
        };
        println!("{}", report::move_line(record));
        for (n, comment) in snapshot.commentary_at(index).into_iter().enumerate() {
            if animate_ms == 0 {
                println!("         {comment}");
                continue;
            }
            let id = format!("{}:{n}", record.id);
            print_revealed(&mut reveals, &id, comment, tick).await;
        }
    }

    println!("\nResult: {}", game.result.as_str());
    handle.shutdown().await;
    Ok(())
}

/// Print `text` as it is revealed, then finalize the reveal.
async fn print_revealed(reveals: &mut RevealScheduler, id: &str, text: String, tick: Duration) {
    use std::io::Write;

    let full_len = text.len();
    if full_len == 0 {
        return;
    }
    let mut rx = reveals.start(id, text, tick);
    let mut shown = 0;
    print!("         ");
    while rx.changed().await.is_ok() {
        let visible = rx.borrow_and_update().clone();
        print!("{}", &visible[shown..]);
        let _ = std::io::stdout().flush();
        shown = visible.len();
        if shown >= full_len {
            break;
        }
    }
    println!();
    reveals.finalize(id);
}

async fn submit(path: &Path, book: Arc<OpeningBook>, url: &str) -> anyhow::Result<()> {
    let (text, game) = read_game(path)?;
    let api = AnalysisApi::new(url)?;
    println!("Submitting {} moves to {}", game.moves.len(), api.analyze_url());

    let initial = api.submit_game(&text, &game.tags).await?;
    let session_id = initial.session_id.clone();

    let transport = TcpTransport::new(config::get_server_addr())?;
    let handle = spawn_review_session(Navigator::new(book), transport);
    let snapshot = handle.load_initial(initial).await?;
    println!("{}\n", report::summary(&snapshot));
    print!("{}", report::game_listing(&snapshot, true));

    if let Some(id) = session_id {
        println!("\nFollow live analysis with: gameview attach {id}");
    }
    handle.shutdown().await;
    Ok(())
}

async fn attach(
    session_id: &str,
    book: Arc<OpeningBook>,
    addr: &str,
    full: bool,
) -> anyhow::Result<()> {
    let transport = TcpTransport::new(addr)?;
    let handle = spawn_review_session(Navigator::new(book), transport);
    let (_, mut events) = handle.subscribe().await?;

    println!("Connecting to {addr}, session {session_id}");
    handle.connect(session_id).await?;

    let mut requested_full = !full;
    let mut last_progress = -1.0;
    let mut last_moves = 0;
    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                println!("\nInterrupted");
                break;
            }
        };
        let snapshot = match event {
            Ok(ReviewEvent::StateChanged(snapshot)) => snapshot,
            Ok(ReviewEvent::Error(message)) => {
                eprintln!("error: {message}");
                continue;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event stream lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match snapshot.state {
            NavState::Error => {
                println!("{}", report::summary(&snapshot));
                break;
            }
            NavState::MainlineBrowsing | NavState::PreviewBrowsing => {}
            _ => continue,
        }

        if snapshot.moves.len() != last_moves {
            last_moves = snapshot.moves.len();
            println!("{}", report::summary(&snapshot));
        }
        if !requested_full && !snapshot.moves.is_empty() {
            requested_full = true;
            handle.request_full_analysis().await?;
            println!("Full analysis requested");
            continue;
        }
        if snapshot.full_analysis_running && snapshot.progress != last_progress {
            last_progress = snapshot.progress;
            println!("Analysis {:.0}%", snapshot.progress);
        }
        if full && requested_full && !snapshot.full_analysis_running && last_progress >= 0.0 {
            print!("\n{}", report::game_listing(&snapshot, true));
            break;
        }
    }

    let snapshot = handle.disconnect().await?;
    tracing::info!(moves = snapshot.moves.len(), "Detached");
    handle.shutdown().await;
    Ok(())
}
