//! Praxis CLI - Streamed challenges and résumé analysis
//!
//! Opens the backend's SSE streams and renders them live in the terminal.

mod config;
mod render;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{Confirm, Password};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use praxis::{Board, LiveSession, ReplayTransport, SessionKind, StreamEvent, StreamRequest};
use praxis_client::PraxisClient;

use config::{Config, ENV_ACCESS_TOKEN};
use render::StreamPrinter;

#[derive(Parser)]
#[command(name = "praxis")]
#[command(about = "Praxis CLI - Streamed challenges and résumé analysis", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the access token
    Login {
        /// Access token (will prompt if not provided)
        #[arg(short, long)]
        token: Option<String>,
    },

    /// Show current configuration
    Config,

    /// Challenge operations
    Challenges {
        #[command(subcommand)]
        action: ChallengeAction,
    },

    /// Résumé operations
    Resume {
        #[command(subcommand)]
        action: ResumeAction,
    },

    /// Play back a captured SSE stream
    Replay {
        /// File holding a raw text/event-stream capture
        file: PathBuf,
        /// Which stream the capture came from: challenges, analysis
        #[arg(short, long, default_value = "analysis")]
        kind: SessionKind,
        /// Milliseconds to wait before each record (0 plays back at once)
        #[arg(short, long, default_value_t = 0)]
        pace: u64,
    },
}

#[derive(Subcommand)]
enum ChallengeAction {
    /// Generate a fresh batch, streamed
    Generate,
    /// List your most recent challenges
    Active {
        /// Max results (1-10)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show one challenge
    Show {
        /// Challenge ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum ResumeAction {
    /// Analyze a stored résumé, streamed
    Analyze {
        /// Résumé ID
        id: i64,
    },
    /// Upload a file and analyze it, streamed
    Upload {
        /// PDF, DOCX, TXT, MD, ...
        file: PathBuf,
        /// Title for the résumé
        #[arg(short, long)]
        title: Option<String>,
    },
    /// List your résumés
    List,
    /// Show a résumé with its analysis
    Show {
        /// Résumé ID
        id: i64,
    },
    /// Delete a résumé
    Delete {
        /// Résumé ID
        id: i64,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Login { token } => cmd_login(token).await,
        Commands::Config => cmd_config(),
        Commands::Challenges { action } => cmd_challenges(action).await,
        Commands::Resume { action } => cmd_resume(action).await,
        Commands::Replay { file, kind, pace } => cmd_replay(file, kind, pace).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn connect(config: &Config) -> Result<PraxisClient> {
    if config.access_token.is_none() {
        bail!("Not logged in. Run 'praxis login' or set {}.", ENV_ACCESS_TOKEN);
    }
    PraxisClient::new(config.client_config()).context("Failed to build HTTP client")
}

// ============================================
// Live rendering
// ============================================

/// Render a session until it ends. Ctrl-C cancels it.
async fn watch(mut live: LiveSession) -> Result<Board> {
    let handle = live.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    let typewriter = live.options().typewriter;
    let mut reveals = live.subscribe_reveals();
    let mut printer = StreamPrinter::stdout();

    enum Tick {
        Event(Option<StreamEvent>),
        Reveal,
    }

    loop {
        let tick = tokio::select! {
            event = live.step() => Tick::Event(event),
            Ok(()) = reveals.changed(), if typewriter => Tick::Reveal,
        };

        match tick {
            Tick::Reveal => printer.reveal(&reveals.borrow_and_update())?,
            Tick::Event(Some(event)) => {
                if matches!(event, StreamEvent::Complete(_)) && typewriter {
                    // flushed on completion; show whatever was still typing
                    printer.reveal(&reveals.borrow_and_update())?;
                }
                printer.event(&event, live.board(), typewriter)?;
            }
            Tick::Event(None) => break,
        }
    }

    interrupt.abort();
    let board = live.board().clone();
    Ok(board)
}

// ============================================
// Command Implementations
// ============================================

async fn cmd_login(token: Option<String>) -> Result<()> {
    let mut config = Config::load()?;

    let token = match token {
        Some(t) => t,
        None => Password::new()
            .with_prompt("Access token")
            .interact()
            .context("Failed to read access token")?,
    };

    // Test against the effective URL (env included) with the new token
    let target = Config::resolve()?.with_overrides(None, Some(token.clone()));
    let client = PraxisClient::new(target.client_config())?;
    print!("Testing connection... ");
    std::io::stdout().flush()?;

    match client.health().await {
        Ok(true) => println!("{}", "OK".green()),
        _ => {
            println!("{}", "Failed".red());
            bail!("Could not reach the Praxis API at {}", target.base_url);
        }
    }

    config.set_access_token(token);
    config.save()?;

    println!("{} Access token saved to {:?}", "✓".green(), Config::config_path()?);

    Ok(())
}

fn cmd_config() -> Result<()> {
    let file = Config::load()?;
    let config = Config::resolve()?;

    println!("{}", "Configuration:".bold());
    println!("  Path: {:?}", Config::config_path()?);
    let overridden = if file.base_url != config.base_url { " (env)".dimmed().to_string() } else { String::new() };
    println!("  Base URL: {}{}", config.base_url, overridden);
    println!(
        "  Access Token: {}",
        if config.access_token.is_some() { "Set".green() } else { "Not set".red() }
    );
    println!("  Typewriter: {}", if config.typewriter { "on" } else { "off" });
    println!("  Reveal speed: {} ms/char", config.reveal_speed_ms);

    Ok(())
}

async fn cmd_challenges(action: ChallengeAction) -> Result<()> {
    let config = Config::resolve()?;
    let client = connect(&config)?;

    match action {
        ChallengeAction::Generate => {
            let board = watch(client.generate_challenges().await).await?;
            render::print_summary(&board);
        }

        ChallengeAction::Active { limit } => {
            let challenges = client.active_challenges(limit).await?;

            if challenges.is_empty() {
                println!("No active challenges.");
                println!("\n{}", "Generate some with:".dimmed());
                println!("  praxis challenges generate");
                return Ok(());
            }

            println!("{}", "Active challenges:".bold());
            for challenge in &challenges {
                render::print_challenge_line(challenge);
            }
        }

        ChallengeAction::Show { id } => {
            let challenge = client.get_challenge(id).await?;
            render::print_challenge(&challenge);
        }
    }

    Ok(())
}

async fn cmd_resume(action: ResumeAction) -> Result<()> {
    let config = Config::resolve()?;
    let client = connect(&config)?;

    match action {
        ResumeAction::Analyze { id } => {
            let board = watch(client.analyze_resume(id).await).await?;
            render::print_summary(&board);
        }

        ResumeAction::Upload { file, title } => {
            let live = client
                .upload_path(&file, title.as_deref())
                .await
                .with_context(|| format!("Failed to read file: {}", file.display()))?;
            let board = watch(live).await?;
            render::print_summary(&board);
        }

        ResumeAction::List => {
            let resumes = client.list_resumes().await?;

            if resumes.is_empty() {
                println!("No résumés found.");
                return Ok(());
            }

            println!("{}", "Résumés:".bold());
            for resume in resumes {
                let marker = if resume.has_analysis { "analyzed".green() } else { "pending".yellow() };
                println!(
                    "  {} {} [{}] {}",
                    format!("#{}", resume.id).dimmed(),
                    resume.display_title().cyan().bold(),
                    marker,
                    resume.created_at.format("%Y-%m-%d").to_string().dimmed()
                );
            }
        }

        ResumeAction::Show { id } => {
            let detail = client.get_resume(id).await?;
            println!(
                "{} {}",
                format!("#{}", detail.resume.id).dimmed(),
                detail.resume.display_title().cyan().bold()
            );

            match detail.analysis.as_ref().and_then(|a| a.report()) {
                Some(report) => render::print_report(&report),
                None => {
                    println!("\n{}", "Not analyzed yet. Run:".dimmed());
                    println!("  praxis resume analyze {}", id);
                }
            }
        }

        ResumeAction::Delete { id, yes } => {
            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete résumé #{}?", id))
                    .default(false)
                    .interact()
                    .context("Failed to read confirmation")?;
                if !confirmed {
                    println!("Aborted.");
                    return Ok(());
                }
            }

            client.delete_resume(id).await?;
            println!("{} Résumé #{} deleted", "✓".green(), id);
        }
    }

    Ok(())
}

async fn cmd_replay(file: PathBuf, kind: SessionKind, pace: u64) -> Result<()> {
    let config = Config::resolve()?;
    let capture = std::fs::read(&file)
        .with_context(|| format!("Failed to read capture: {}", file.display()))?;
    let mut transport =
        ReplayTransport::from_sse(&capture).context("Capture is not a valid event stream")?;
    if pace > 0 {
        transport = transport.paced(Duration::from_millis(pace));
    }

    if transport.is_empty() {
        bail!("No records found in {}", file.display());
    }

    let live = LiveSession::open(
        &transport,
        StreamRequest::get(file.display().to_string()),
        kind,
        config.stream_options(),
    )
    .await;

    let board = watch(live).await?;
    render::print_summary(&board);

    Ok(())
}
