//! # Transcode Tasks - Main Entry Point
//!
//! Questo è il punto di ingresso della CLI, che fa da listener dei task.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Caricamento della configurazione e override dei percorsi dei tool
//! - Sottomissione del task a un `ThreadExecutor` e attesa del `TaskSignal`
//! - Controllo dei tool necessari, con istruzioni di installazione se mancano
//! - Stampa dei messaggi di log del task sopra lo spinner (o su stderr)
//! - Ctrl-C cancella la pipeline HDR10+; un secondo Ctrl-C esce con codice 130
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Carica `config.json` (o i default) e applica gli override
//! 4. Costruisce il task dal sottocomando e lo avvia su un worker thread
//! 5. Drena i messaggi fino al segnale terminale, poi esce con 0 o 1
//!
//! ## Esempio di utilizzo:
//! ```bash
//! transcode-tasks extract-hdr10 --source movie.mkv --track 0
//! transcode-tasks extract-subtitle --input in.mkv --output-video out.mkv --index 3
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use transcode_tasks::debug_report::{DebugReport, EncoderRegistry, ToolVersions};
use transcode_tasks::listener::{listen, ListenOutcome, INTERRUPTED_EXIT_CODE};
use transcode_tasks::progress::TaskSpinner;
use transcode_tasks::tasks::{Hdr10ExtractTask, SubtitleExtractTask, SubtitleFixTask, ThumbnailTask};
use transcode_tasks::tool_resolver::ToolResolver;
use transcode_tasks::{Config, LogSink, ProcessRunner, TaskExecutor, ThreadExecutor, ToolPaths, VideoSnapshot};

#[derive(Parser)]
#[command(name = "transcode-tasks")]
#[command(about = "Run media tool tasks: thumbnails, subtitle fixes and HDR10+ metadata extraction")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the ffmpeg path
    #[arg(long, global = true)]
    ffmpeg: Option<PathBuf>,

    /// Override the mkvpropedit path
    #[arg(long, global = true)]
    mkvpropedit: Option<PathBuf>,

    /// Override the hdr10plus_parser path
    #[arg(long, global = true)]
    hdr10plus_parser: Option<PathBuf>,

    /// Print the terminal signal as JSON instead of a spinner
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pre-built thumbnail command line
    Thumbnail {
        /// Shell command that produces the thumbnail
        #[arg(long)]
        command: String,
    },
    /// Clear the default flag of the first subtitle track
    FixSubtitles {
        /// Matroska file edited in place
        file: PathBuf,
    },
    /// Extract one subtitle stream to `<output-video>.<index>.srt`
    ExtractSubtitle {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output_video: PathBuf,
        /// Stream index of the subtitle track
        #[arg(long)]
        index: u32,
    },
    /// Extract HDR10+ dynamic metadata to `<work dir>/metadata.json`
    ExtractHdr10 {
        #[arg(long)]
        source: PathBuf,
        /// Stream index of the HEVC video track
        #[arg(long, default_value = "0")]
        track: u32,
        /// Work directory for this video (defaults to a directory under the configured work dir)
        #[arg(long)]
        work_dir: Option<PathBuf>,
    },
    /// Dump configuration, tool versions and encoders
    Debug {
        /// JSON array describing the current queue
        #[arg(long)]
        queue: Option<PathBuf>,
        /// Video to show as the current video
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// Show which configured tools are available
    Tools,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Task messages are printed by the listener; their tracing mirror is only shown when verbose
    let default_filter = if args.verbose { "debug" } else { "info,task=off" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&args).await?;
    debug!("Configuration: {:?}", config);

    if let Some(names) = required_tools(&args.command) {
        check_tools(&config.tools, names);
    }

    let (log, mut messages) = LogSink::channel();
    let executor = ThreadExecutor::new(log.clone());

    let (handle, cancel) = match args.command {
        Commands::Thumbnail { ref command } => (executor.submit(ThumbnailTask::new(command.clone())), None),
        Commands::FixSubtitles { ref file } => (
            executor.submit(SubtitleFixTask::new(&config.tools.mkvpropedit, file)),
            None,
        ),
        Commands::ExtractSubtitle {
            ref input,
            ref output_video,
            index,
        } => {
            let video = VideoSnapshot::in_work_dir(input, &config.work_dir).with_output(output_video);
            (
                executor.submit(SubtitleExtractTask::new(&config.tools, &video, index)),
                None,
            )
        }
        Commands::ExtractHdr10 {
            ref source,
            track,
            ref work_dir,
        } => {
            let video = match work_dir {
                Some(dir) => VideoSnapshot::new(source, dir),
                None => VideoSnapshot::in_work_dir(source, &config.work_dir),
            }
            .with_track(track);
            let task = Hdr10ExtractTask::new(&config.tools, video, log.clone());
            let cancel = task.cancel_handle();
            (executor.submit(task), Some(cancel))
        }
        Commands::Debug { ref queue, ref source } => {
            run_debug(&config, queue.as_ref(), source.as_ref()).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Tools => {
            print!("{}", ToolResolver::new().format_report(&config.tools));
            return Ok(ExitCode::SUCCESS);
        }
    };

    let spinner = if args.json {
        TaskSpinner::hidden()
    } else {
        TaskSpinner::new(handle.kind().name())
    };

    let mut interrupts = forward_interrupts();
    let signal = match listen(handle, &mut messages, &mut interrupts, &spinner, cancel.as_ref()).await {
        ListenOutcome::Finished(signal) => signal,
        ListenOutcome::Interrupted => {
            spinner.set_message("interrupted");
            return Ok(ExitCode::from(INTERRUPTED_EXIT_CODE));
        }
    };

    if args.json {
        println!("{}", serde_json::to_string(&signal)?);
    } else {
        spinner.finish(&signal);
        if let Some(status) = signal.hdr10_status() {
            println!("{}", status);
        }
    }

    Ok(if signal.result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn load_config(args: &Args) -> Result<Config> {
    let path = match args.config {
        Some(ref path) => path.clone(),
        None => Config::default_path()?,
    };

    let mut config = Config::from_file(&path).await?;
    if let Some(ref ffmpeg) = args.ffmpeg {
        config.tools.ffmpeg = ffmpeg.clone();
    }
    if let Some(ref mkvpropedit) = args.mkvpropedit {
        config.tools.mkvpropedit = mkvpropedit.clone();
    }
    if let Some(ref parser) = args.hdr10plus_parser {
        config.tools.hdr10plus_parser = parser.clone();
    }
    config.validate()?;

    Ok(config)
}

/// Every Ctrl-C becomes one message on the returned channel
fn forward_interrupts() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

/// External tools each task subcommand launches
fn required_tools(command: &Commands) -> Option<&'static [&'static str]> {
    match command {
        Commands::FixSubtitles { .. } => Some(&["mkvpropedit"]),
        Commands::ExtractSubtitle { .. } => Some(&["ffmpeg"]),
        Commands::ExtractHdr10 { .. } => Some(&["ffmpeg", "hdr10plus_parser"]),
        // the thumbnail command line names its own tools
        Commands::Thumbnail { .. } | Commands::Debug { .. } | Commands::Tools => None,
    }
}

/// Warn with install instructions; the task still runs and reports the launch failure itself
fn check_tools(tools: &ToolPaths, names: &[&str]) {
    let resolver = ToolResolver::new();
    for (name, path) in tools.entries() {
        if !names.contains(&name) {
            continue;
        }
        if let Err(err) = resolver.check_tool_with_instructions(name, path) {
            warn!("{}", err);
        }
    }
}

async fn run_debug(config: &Config, queue: Option<&PathBuf>, source: Option<&PathBuf>) -> Result<()> {
    let queue: Vec<serde_json::Value> = match queue {
        Some(path) => serde_json::from_str(&tokio::fs::read_to_string(path).await?)?,
        None => Vec::new(),
    };
    let current_video = source.map(|source| VideoSnapshot::in_work_dir(source, &config.work_dir));

    let tools = config.tools.clone();
    let (versions, encoders, tool_status) = tokio::task::spawn_blocking(move || {
        let runner = ProcessRunner::new();
        (
            ToolVersions::probe(&runner, &tools),
            EncoderRegistry::probe(&runner, &tools),
            ToolResolver::new().report(&tools),
        )
    })
    .await?;

    let report = DebugReport {
        config,
        tools: &tool_status,
        versions: &versions,
        queue: &queue,
        encoders: &encoders,
        current_video: current_video.as_ref(),
    };
    println!("{}", report.render()?);

    Ok(())
}
