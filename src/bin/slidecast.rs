use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use slidecast::{
    FfmpegMedia, FlushStrategy, JoinMode, Profile, ProgressSink, ProgressUpdate, RenderConfig,
    RunContext, RunIdentity, ScriptDocument, SessionLedger, WorkDirs,
};

#[derive(Parser, Debug)]
#[command(name = "slidecast", version, about = "Assemble a narrated slideshow video")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the final video from a script and its per-scene assets (requires `ffmpeg`).
    Render(RenderArgs),
    /// Start a task: decide whether existing assets can be reused and print the run id.
    Begin(BeginArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Shared work directory holding `audio_files/`, `image_files/` and `bgm_assets/`.
    #[arg(long)]
    work_dir: PathBuf,

    /// Scene script JSON.
    #[arg(long)]
    script: PathBuf,

    /// Run identity the assets were generated under. Defaults to the session ledger's.
    #[arg(long)]
    run_id: Option<String>,

    /// Render configuration JSON; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    profile: Option<Profile>,

    #[arg(long)]
    flush: Option<FlushStrategy>,

    #[arg(long)]
    join: Option<JoinMode>,

    /// Background music file; otherwise picked from `bgm_assets/` by the script's style.
    #[arg(long)]
    bgm: Option<PathBuf>,

    /// Output path (default `<work-dir>/final_output.mp4`).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct BeginArgs {
    #[arg(long)]
    work_dir: PathBuf,

    /// Source text the script will be generated from.
    #[arg(long)]
    input: PathBuf,

    /// Regenerate assets even if the input is unchanged.
    #[arg(long, default_value_t = false)]
    force: bool,
}

struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&mut self, update: ProgressUpdate) {
        tracing::info!(
            percent = (update.fraction * 100.0).round() as u32,
            stage = %update.stage,
            "{}",
            update.message
        );
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Begin(args) => cmd_begin(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = match &args.config {
        Some(path) => RenderConfig::from_path(path)?,
        None => RenderConfig::default(),
    };
    if let Some(profile) = args.profile {
        cfg.profile = profile;
    }
    if let Some(flush) = args.flush {
        cfg.flush = flush;
    }
    if let Some(join) = args.join {
        cfg.join = Some(join);
    }
    cfg.validate()?;

    let mut dirs = WorkDirs::under(&args.work_dir);
    if let Some(out) = args.out {
        dirs.output_path = out;
    }

    let identity = match args.run_id {
        Some(token) => RunIdentity::from_token(token)?,
        None => SessionLedger::load(&args.work_dir.join(SessionLedger::FILE_NAME))?
            .run_id
            .context("no --run-id given and no session ledger in the work dir")?,
    };

    let script = ScriptDocument::from_path(&args.script)?;
    let scenes = script.scenes();
    let background = slidecast::select_background(
        args.bgm.as_deref(),
        script.bgm_style.as_deref(),
        &dirs.bgm_dir,
    );

    let ctx = RunContext::new(identity, dirs, cfg);
    tracing::info!(
        run = %ctx.identity,
        profile = ?ctx.config.profile,
        flush = ?ctx.config.flush,
        join = ?ctx.config.join_mode(),
        scenes = scenes.len(),
        "starting render"
    );

    match slidecast::render_run(
        &ctx,
        &scenes,
        background.as_deref(),
        &FfmpegMedia,
        &mut LogProgress,
    ) {
        Ok(report) => {
            for failure in &report.failures {
                eprintln!("skipped {failure}");
            }
            eprintln!("{}", report.summary());
            Ok(())
        }
        Err(err) => Err(anyhow::Error::new(err).context("render failed")),
    }
}

fn cmd_begin(args: BeginArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read input '{}'", args.input.display()))?;
    let ledger_path = args.work_dir.join(SessionLedger::FILE_NAME);
    let mut ledger = SessionLedger::load(&ledger_path)?;
    let plan = ledger.begin(&text, args.force);
    ledger.save(&ledger_path)?;

    println!(
        "{} {}",
        plan.identity,
        if plan.reuse_assets { "reuse" } else { "regenerate" }
    );
    Ok(())
}
