use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use subsync_rank::{
    conform_sample_rate, load_pcm, load_subtitle_dir, ActivityTimeline, ClassifierKind,
    RankingReport, ReferenceSource, SyncConfig, SyncRanker, SyncRankerBuilder,
};
use tracing_subscriber::EnvFilter;

#[path = "subsync_rank/json_report_formatter.rs"]
mod json_report_formatter;
#[path = "subsync_rank/media_extraction.rs"]
mod media_extraction;
#[path = "subsync_rank/ranked_output.rs"]
mod ranked_output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ClassifierChoice {
    #[value(name = "webrtc")]
    WebRtc,
    Energy,
}

impl ClassifierChoice {
    fn kind(self) -> ClassifierKind {
        match self {
            Self::WebRtc => ClassifierKind::WebRtc,
            Self::Energy => ClassifierKind::Energy,
        }
    }
}

fn default_classifier_choice() -> ClassifierChoice {
    match ClassifierKind::default() {
        ClassifierKind::WebRtc => ClassifierChoice::WebRtc,
        ClassifierKind::Energy => ClassifierChoice::Energy,
    }
}

#[derive(Debug, Parser)]
#[command(name = "subsync_rank")]
#[command(about = "Rank candidate subtitles by how well their dialogue lines up with detected speech")]
struct Args {
    /// Movie or media file to extract audio from with ffmpeg.
    media: Option<PathBuf>,
    /// Mono 16-bit WAV or FLAC to segment instead of extracting from media.
    #[arg(long, env = "SUBSYNC_AUDIO")]
    audio: Option<PathBuf>,
    /// Already-synced subtitle used as the reference instead of audio.
    #[arg(long, env = "SUBSYNC_SYNCED_SUBTITLE")]
    synced_subtitle: Option<PathBuf>,
    #[arg(long, env = "SUBSYNC_SUBTITLES_DIR", default_value = ".")]
    subtitles_dir: PathBuf,
    /// Reference timeline JSON; loaded when present, written after segmentation otherwise.
    #[arg(long, env = "SUBSYNC_TIMELINE_CACHE")]
    timeline_cache: Option<PathBuf>,
    /// JSON ranking report path.
    #[arg(long, env = "SUBSYNC_OUT")]
    out: Option<PathBuf>,
    /// Directory that receives ranked copies named 1.srt, 2.srt, ...
    #[arg(long, env = "SUBSYNC_RANKED_DIR")]
    ranked_dir: Option<PathBuf>,
    #[arg(long, env = "SUBSYNC_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "SUBSYNC_FRAME_MS")]
    frame_ms: Option<u32>,
    #[arg(long, env = "SUBSYNC_THRESHOLD")]
    threshold: Option<f64>,
    #[arg(long, env = "SUBSYNC_WORKERS")]
    workers: Option<usize>,
    #[arg(
        long,
        env = "SUBSYNC_CLASSIFIER",
        value_enum,
        default_value_t = default_classifier_choice()
    )]
    classifier: ClassifierChoice,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    let mut ranker = SyncRankerBuilder::new(config.clone())
        .with_classifier_kind(args.classifier.kind())
        .build()
        .map_err(|err| format!("Failed to build ranker: {err}"))?;

    let (reference, source) = resolve_reference(&args, &mut ranker)?;
    if reference.is_empty() {
        tracing::warn!("reference timeline holds no speech");
    }

    let batch = load_subtitle_dir(&args.subtitles_dir, ranker.worker_threads()).map_err(|err| {
        format!(
            "No subtitle in '{}' could be used: {err}",
            args.subtitles_dir.display()
        )
    })?;

    let spinner = spinner(format!("scoring {} subtitles", batch.candidates.len()));
    let result = ranker.rank(&reference, &batch.candidates);
    spinner.finish_and_clear();

    let report = RankingReport::new(
        source,
        ranker.classifier_label(),
        &config,
        ranker.worker_threads(),
        &result,
        &batch.skipped,
    );
    print!("{}", report.summary_table());

    if let Some(out) = args.out.as_ref() {
        json_report_formatter::write_report(out, &report)?;
        println!("{}", out.display());
    }

    let result = result
        .ensure_usable()
        .map_err(|err| format!("Ranking failed: {err}"))?;

    if let Some(ranked_dir) = args.ranked_dir.as_ref() {
        let written = ranked_output::copy_ranked(&result, &args.subtitles_dir, ranked_dir)?;
        println!(
            "copied {} ranked subtitles into {}",
            written.len(),
            ranked_dir.display()
        );
    }
    Ok(())
}

fn resolve_config(args: &Args) -> Result<SyncConfig, String> {
    let mut config = match args.config.as_ref() {
        Some(path) => SyncConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => SyncConfig::default(),
    };
    if let Some(frame_ms) = args.frame_ms {
        config.frame_duration_ms = frame_ms;
    }
    if let Some(threshold) = args.threshold {
        config.activity_threshold = threshold;
    }
    if args.workers.is_some() {
        config.worker_threads = args.workers;
    }
    config
        .validate()
        .map_err(|err| format!("Invalid settings: {err}"))?;
    Ok(config)
}

fn resolve_reference(
    args: &Args,
    ranker: &mut SyncRanker,
) -> Result<(ActivityTimeline, ReferenceSource), String> {
    if let Some(cache) = usable_timeline_cache(args) {
        let timeline = ActivityTimeline::load_json(cache)
            .map_err(|err| format!("Failed to load timeline cache '{}': {err}", cache.display()))?;
        return Ok((
            timeline,
            ReferenceSource::TimelineCache {
                path: cache.display().to_string(),
            },
        ));
    }

    let (timeline, source) = if let Some(synced) = args.synced_subtitle.as_ref() {
        let reference = subsync_rank::media::subtitles::load_subtitle_file(synced)
            .map_err(|err| format!("Failed to read synced subtitle '{}': {err}", synced.display()))?;
        let timeline = ActivityTimeline::from_reference_dialogue(&reference)
            .map_err(|err| format!("Synced subtitle '{}' is unusable: {err}", synced.display()))?;
        let source = ReferenceSource::SyncedSubtitle {
            path: synced.display().to_string(),
        };
        (timeline, source)
    } else {
        let audio_path = resolve_audio_path(args, ranker.config().fallback_sample_rate_hz)?;
        segment_audio_file(&audio_path, ranker)?
    };

    if let Some(cache) = args.timeline_cache.as_ref() {
        timeline
            .save_json(cache)
            .map_err(|err| format!("Failed to write timeline cache '{}': {err}", cache.display()))?;
    }
    Ok((timeline, source))
}

/// An existing cache stands in for the media, but never for an explicit reference.
fn usable_timeline_cache(args: &Args) -> Option<&Path> {
    let cache = args.timeline_cache.as_deref().filter(|path| path.is_file())?;
    if let Some(flag) = explicit_reference_flag(args) {
        tracing::warn!(
            cache = %cache.display(),
            flag,
            "explicit reference given; ignoring and rewriting the timeline cache"
        );
        return None;
    }
    Some(cache)
}

fn explicit_reference_flag(args: &Args) -> Option<&'static str> {
    if args.synced_subtitle.is_some() {
        Some("--synced-subtitle")
    } else if args.audio.is_some() {
        Some("--audio")
    } else {
        None
    }
}

fn resolve_audio_path(args: &Args, fallback_rate_hz: u32) -> Result<PathBuf, String> {
    if let Some(audio) = args.audio.as_ref() {
        return Ok(audio.clone());
    }
    let media = args
        .media
        .as_ref()
        .ok_or_else(|| "Give a media file, --audio, --synced-subtitle or an existing --timeline-cache.".to_string())?;
    if !media.exists() {
        return Err(format!("Media file '{}' does not exist.", media.display()));
    }

    let spinner = spinner(format!("extracting audio from {}", media.display()));
    let extracted = media_extraction::extract_audio(media, fallback_rate_hz);
    spinner.finish_and_clear();
    let (path, reused) = extracted?;
    if reused {
        println!("reusing extracted audio {}", path.display());
    }
    Ok(path)
}

fn segment_audio_file(
    path: &Path,
    ranker: &mut SyncRanker,
) -> Result<(ActivityTimeline, ReferenceSource), String> {
    let audio = load_pcm(path)
        .and_then(conform_sample_rate)
        .map_err(|err| format!("Failed to load audio '{}': {err}", path.display()))?;
    let sample_rate_hz = audio.sample_rate_hz;

    let progress = ProgressBar::new(audio.samples.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {percent}% ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    progress.set_message("detecting speech");

    let mut segmenter = ranker
        .segment_stream(sample_rate_hz)
        .map_err(|err| format!("Cannot segment '{}': {err}", path.display()))?;
    for chunk in audio.samples.chunks(sample_rate_hz as usize * 60) {
        segmenter
            .push(chunk)
            .map_err(|err| format!("Speech detection failed: {err}"))?;
        progress.inc(chunk.len() as u64);
    }
    let timeline = segmenter.finish();
    progress.finish_and_clear();

    Ok((
        timeline,
        ReferenceSource::Audio {
            path: path.display().to_string(),
            sample_rate_hz,
        },
    ))
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
