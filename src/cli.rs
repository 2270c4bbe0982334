use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "neurosonic", about = "Per-second brainwave, brain region and emotion analysis of an audio track")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG, AAC)
    pub input: PathBuf,

    /// Write the final JSON report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Relay progress, chunk and completion messages to stdout as JSON lines
    #[arg(long)]
    pub stream: bool,

    /// Analysis window length in seconds
    #[arg(short, long, default_value_t = 1.0)]
    pub window: f32,

    /// Sample rate the audio is decoded to before analysis
    #[arg(long, default_value_t = 22050)]
    pub sample_rate: u32,

    /// Decimal places kept in reported values (0-9)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(0..=9))]
    pub precision: u32,

    /// Reject sources longer than this many seconds
    #[arg(long, default_value_t = 600.0)]
    pub max_duration: f32,

    /// Track id for the report (defaults to the file stem)
    #[arg(long)]
    pub id: Option<String>,

    /// Track title for the report
    #[arg(long)]
    pub title: Option<String>,

    /// Pretty-print the final report
    #[arg(long)]
    pub pretty: bool,

    /// Config file (default: ./neurosonic.toml or ~/.config/neurosonic/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
