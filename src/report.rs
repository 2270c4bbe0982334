use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};

use crate::aggregate::{Segment, TrackAnalysis};
use crate::mapping::EmotionClassification;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetadata {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Seconds
    pub duration: f32,
}

/// Final report for one track.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongAnalysis {
    pub id: String,
    pub track: TrackMetadata,
    pub tempo: f32,
    pub overall_emotion: EmotionClassification,
    pub segments: Vec<Segment>,
    pub analyzed_at: DateTime<Utc>,
}

impl SongAnalysis {
    pub fn new(track: TrackMetadata, analysis: TrackAnalysis) -> Self {
        Self {
            id: track.id.clone(),
            track,
            tempo: analysis.tempo,
            overall_emotion: analysis.overall_emotion,
            segments: analysis.segments,
            analyzed_at: Utc::now(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Extracting,
    Analyzing,
    Complete,
    Error,
}

/// Messages relayed to subscribers while a track is analysed.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage<'a> {
    Progress {
        status: AnalysisStatus,
        progress: u8,
        message: String,
    },
    Chunk {
        timestamp: f32,
        segment: &'a Segment,
    },
    Complete {
        analysis: &'a SongAnalysis,
    },
    Error {
        code: &'static str,
        message: String,
    },
}

impl<'a> ServerMessage<'a> {
    pub fn progress(status: AnalysisStatus, progress: u8, message: impl Into<String>) -> Self {
        ServerMessage::Progress {
            status,
            progress: progress.min(100),
            message: message.into(),
        }
    }

    pub fn chunk(segment: &'a Segment) -> Self {
        ServerMessage::Chunk {
            timestamp: segment.start_time,
            segment,
        }
    }
}

/// Percentage of `done` out of `total`, 100 when there is nothing to do.
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}

/// Writes one JSON message per line.
pub struct MessageWriter<W: Write> {
    out: W,
}

impl<W: Write> MessageWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn send(&mut self, message: &ServerMessage<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, message)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::TrackAggregator;
    use serde_json::Value;

    fn sample_analysis() -> SongAnalysis {
        let samples = vec![0.0f32; 22050 * 2];
        let analysis = TrackAggregator::default().analyze(&samples, 22050).unwrap();
        SongAnalysis::new(
            TrackMetadata {
                id: "abc123".into(),
                title: Some("Silence".into()),
                duration: 2.0,
            },
            analysis,
        )
    }

    #[test]
    fn report_uses_camel_case() {
        let json = serde_json::to_value(sample_analysis()).unwrap();
        assert_eq!(json["id"], "abc123");
        assert_eq!(json["overallEmotion"]["primary"], "calm");
        assert!(json["analyzedAt"].is_string());
        let segment = &json["segments"][1];
        assert_eq!(segment["startTime"], 1.0);
        assert_eq!(segment["endTime"], 2.0);
        assert!(segment["frequencies"]["lowMid"].is_number());
        assert!(segment["brainRegions"]["nucleusAccumbens"].is_number());
        assert!(segment["brainwaves"]["gamma"].is_number());
    }

    #[test]
    fn messages_are_tagged_lines() {
        let analysis = sample_analysis();
        let mut writer = MessageWriter::new(Vec::new());
        writer
            .send(&ServerMessage::progress(AnalysisStatus::Analyzing, 50, "halfway"))
            .unwrap();
        writer.send(&ServerMessage::chunk(&analysis.segments[0])).unwrap();
        writer.send(&ServerMessage::Complete { analysis: &analysis }).unwrap();
        writer
            .send(&ServerMessage::Error {
                code: "DECODE_FAILED",
                message: "bad file".into(),
            })
            .unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["type"], "progress");
        assert_eq!(lines[0]["status"], "analyzing");
        assert_eq!(lines[1]["type"], "chunk");
        assert_eq!(lines[1]["timestamp"], 0.0);
        assert_eq!(lines[2]["type"], "complete");
        assert_eq!(lines[2]["analysis"]["segments"].as_array().map(|s| s.len()), Some(2));
        assert_eq!(lines[3]["code"], "DECODE_FAILED");
    }

    #[test]
    fn progress_is_bounded() {
        assert_eq!(progress_percent(0, 0), 100);
        assert_eq!(progress_percent(1, 4), 25);
        assert_eq!(progress_percent(9, 4), 100);
        assert!(matches!(
            ServerMessage::progress(AnalysisStatus::Pending, 250, ""),
            ServerMessage::Progress { progress: 100, .. }
        ));
    }
}
