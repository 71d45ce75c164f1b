use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mixwright::analysis::{FeatureExtractor, JsonFileCache};
use mixwright::library::{is_audio_file, load_pool, PoolEntry};
use mixwright::model::{MixJob, OutputFormat, Quality};
use mixwright::render::{CancelToken, FfmpegEngine, ProgressUpdate};
use mixwright::sequence::{EnergyCurve, MixConstraints};
use mixwright::{load_config, MixConfig, MixPipeline};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mixwright")]
#[command(about = "Plan and render continuous DJ mixes from a folder of tracks", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// TOML configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<String>,

    /// Directory for cached analysis results
    #[arg(long, global = true)]
    cache_dir: Option<String>,

    /// Analysis worker threads (0 = one per CPU core)
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze audio files (or directories of them) and print the results as JSON
    Analyze {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print a mix plan for a directory of tracks as JSON
    Plan {
        dir: String,

        #[command(flatten)]
        shape: ShapeArgs,
    },

    /// Plan and render a mix
    Render {
        dir: String,

        /// Output file; the format follows the extension unless --format is given
        #[arg(short = 'o', long)]
        output: String,

        #[command(flatten)]
        shape: ShapeArgs,

        /// Output format (mp3, wav, flac)
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Encoding quality (low, medium, high)
        #[arg(long, default_value = "high")]
        quality: Quality,

        /// Cap each ffmpeg run at this CPU percentage (needs cpulimit)
        #[arg(long)]
        cpu_limit: Option<u32>,
    },
}

/// Optional shaping of the track pool
#[derive(clap::Args, Debug)]
struct ShapeArgs {
    /// Energy curve: build, decline, wave, steady, double_peak, late_peak,
    /// rollercoaster, plateau_peak
    #[arg(long)]
    curve: Option<EnergyCurve>,

    #[arg(long)]
    min_bpm: Option<f64>,

    #[arg(long)]
    max_bpm: Option<f64>,

    /// Keep at most this many tracks
    #[arg(long)]
    tracks: Option<usize>,

    /// Artists always kept in the mix (can be specified multiple times)
    #[arg(long = "include-artist")]
    include_artists: Vec<String>,

    /// Genres preferred when trimming to --tracks (can be specified multiple times)
    #[arg(long = "genre")]
    genres: Vec<String>,
}

impl ShapeArgs {
    fn constraints(&self) -> Option<MixConstraints> {
        let shaped = self.curve.is_some()
            || self.min_bpm.is_some()
            || self.max_bpm.is_some()
            || self.tracks.is_some()
            || !self.include_artists.is_empty()
            || !self.genres.is_empty();
        if !shaped {
            return None;
        }

        let mut constraints = MixConstraints::new()
            .with_include_artists(self.include_artists.clone())
            .with_genres(self.genres.clone());
        if let Some(curve) = self.curve {
            constraints = constraints.with_curve(curve);
        }
        if self.min_bpm.is_some() || self.max_bpm.is_some() {
            constraints = constraints.with_bpm_range(
                self.min_bpm.unwrap_or(0.0),
                self.max_bpm.unwrap_or(f64::MAX),
            );
        }
        if let Some(count) = self.tracks {
            constraints = constraints.with_target_count(count);
        }
        Some(constraints)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

fn job_id() -> String {
    format!("mix-{}", chrono::Local::now().format("%Y%m%d-%H%M%S"))
}

fn build_pipeline(args: &Args, config: MixConfig) -> Result<MixPipeline<FeatureExtractor>> {
    let analyzer = FeatureExtractor::new(config.analysis.clone());
    let mut pipeline = MixPipeline::new(config, analyzer);
    if let Some(dir) = &args.cache_dir {
        let dir = expand(dir);
        let cache = JsonFileCache::new(&dir)
            .with_context(|| format!("Failed to open analysis cache at {:?}", dir))?;
        log::info!("Analysis cache: {:?}", dir);
        pipeline = pipeline.with_cache(Box::new(cache));
    }
    Ok(pipeline)
}

fn pool_from(dir: &str) -> Result<Vec<PoolEntry>> {
    let dir = expand(dir);
    load_pool(&dir).with_context(|| format!("Failed to scan {:?}", dir))
}

fn entries_from(paths: &[String]) -> Result<Vec<PoolEntry>> {
    let mut entries = Vec::new();
    for raw in paths {
        let path = expand(raw);
        if path.is_dir() {
            entries.extend(load_pool(&path).with_context(|| format!("Failed to scan {:?}", path))?);
        } else if is_audio_file(&path) {
            entries.push(PoolEntry::new(path));
        } else {
            log::warn!("Ignoring {:?}: not an audio file", path);
        }
    }
    Ok(entries)
}

fn load(args: &Args) -> Result<MixConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let path = expand(path);
            load_config(&path).with_context(|| format!("Failed to load config {:?}", path))?
        }
        None => MixConfig::default(),
    };
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = load(&args)?;

    match &args.command {
        Command::Analyze { paths } => {
            let entries = entries_from(paths)?;
            let pipeline = build_pipeline(&args, config)?;
            let tracks = pipeline.analyze_pool(&entries);
            print_json(&tracks)?;
        }

        Command::Plan { dir, shape } => {
            let pipeline = build_pipeline(&args, config)?;
            let tracks = pipeline.analyze_pool(&pool_from(dir)?);
            let plan = pipeline
                .plan(&job_id(), tracks, shape.constraints().as_ref())
                .context("Failed to build a mix plan")?;
            print_json(&plan)?;
        }

        Command::Render {
            dir,
            output,
            shape,
            format,
            quality,
            cpu_limit,
        } => {
            if cpu_limit.is_some() {
                config.render = config.render.with_cpu_limit(*cpu_limit);
            }
            let output = expand(output);
            let pipeline = build_pipeline(&args, config)?;
            let tracks = pipeline.analyze_pool(&pool_from(dir)?);
            let plan = pipeline
                .plan(&job_id(), tracks, shape.constraints().as_ref())
                .context("Failed to build a mix plan")?;

            let mut job = MixJob::from_plan(&plan, output).with_quality(*quality);
            if let Some(format) = format {
                job = job.with_format(*format);
            }

            let engine = FfmpegEngine::new(pipeline.config().render.clone());
            let renderer = pipeline.renderer(engine);
            let progress = |update: ProgressUpdate| {
                log::info!("[{:>3}%] {}: {}", update.percent, update.stage, update.message);
            };
            let result = renderer.render(&job, &progress, &CancelToken::new());
            print_json(&result)?;

            if !result.success {
                bail!(
                    "Render failed: {}",
                    result.error_message.as_deref().unwrap_or("unknown error")
                );
            }
            log::info!("Mix written to {:?}", job.output_path);
        }
    }

    Ok(())
}
