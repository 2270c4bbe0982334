mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;

use cli::Cli;
use neurosonic::aggregate::TrackAggregator;
use neurosonic::audio::analysis::{window_count, window_len};
use neurosonic::audio::decode_audio;
use neurosonic::config;
use neurosonic::report::{progress_percent, AnalysisStatus, MessageWriter, ServerMessage, SongAnalysis, TrackMetadata};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    if let Some(path) = config::find_config(cli.config.as_deref()) {
        if let Some(cfg) = config::load_config(&path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.sample_rate == config::default_sample_rate() { cli.sample_rate = cfg.analysis.sample_rate; }
            if cli.window == config::default_window_duration() { cli.window = cfg.analysis.window_duration; }
            if cli.max_duration == config::default_max_duration() { cli.max_duration = cfg.analysis.max_duration; }
            if cli.precision == config::default_precision() { cli.precision = cfg.output.precision; }
            if !cli.pretty { cli.pretty = cfg.output.pretty; }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    log::info!("neurosonic - audio brainwave analysis");
    log::info!("Input: {}", cli.input.display());
    log::info!("Window: {}s @ {}Hz", cli.window, cli.sample_rate);

    let mut relay = cli.stream.then(|| MessageWriter::new(std::io::stdout().lock()));

    // 1. Decode audio
    if let Some(ref mut relay) = relay {
        relay.send(&ServerMessage::progress(AnalysisStatus::Extracting, 0, "Decoding audio"))?;
    }
    let audio = match decode_audio(&cli.input, cli.sample_rate, cli.max_duration) {
        Ok(audio) => audio,
        Err(err) => {
            if let Some(ref mut relay) = relay {
                relay.send(&ServerMessage::Error {
                    code: "DECODE_FAILED",
                    message: err.to_string(),
                })?;
            }
            return Err(err).with_context(|| format!("Failed to decode {}", cli.input.display()));
        }
    };

    // 2. Analyze, one window at a time
    let total = window_count(audio.samples.len(), window_len(audio.sample_rate, cli.window)?);
    log::info!("Analyzing {} windows ({:.1}s)...", total, audio.duration());

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} windows ({eta} remaining)")?
            .progress_chars("=>-"),
    );

    let aggregator = TrackAggregator::new(cli.window, cli.precision);
    let mut relay_error = None;
    let mut done = 0;
    let analysis = aggregator.analyze_with(&audio.samples, audio.sample_rate, |segment| {
        done += 1;
        pb.inc(1);
        if let Some(ref mut relay) = relay {
            let sent = relay.send(&ServerMessage::chunk(segment)).and_then(|_| {
                relay.send(&ServerMessage::progress(
                    AnalysisStatus::Analyzing,
                    progress_percent(done, total),
                    format!("Analyzed {}/{} windows", done, total),
                ))
            });
            if let Err(err) = sent {
                relay_error.get_or_insert(err);
            }
        }
    })?;
    pb.finish_with_message("Analysis complete");

    if let Some(err) = relay_error {
        return Err(err).context("Failed to relay segment");
    }

    // 3. Report
    let id = cli.id.clone().unwrap_or_else(|| {
        cli.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "track".to_string())
    });
    let report = SongAnalysis::new(
        TrackMetadata {
            id,
            title: cli.title.clone(),
            duration: audio.duration(),
        },
        analysis,
    );

    if let Some(ref mut relay) = relay {
        relay.send(&ServerMessage::Complete { analysis: &report })?;
    }

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };

    if let Some(ref output) = cli.output {
        std::fs::write(output, json).with_context(|| format!("Failed to write report to {}", output.display()))?;
        log::info!("Done! Report: {}", output.display());
    } else if relay.is_none() {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", json)?;
    }

    log::info!(
        "Overall emotion: {} ({:.0}%), tempo {:.1} BPM",
        report.overall_emotion.primary,
        report.overall_emotion.confidence * 100.0,
        report.tempo
    );
    Ok(())
}
