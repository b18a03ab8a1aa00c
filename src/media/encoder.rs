use std::io::Cursor;

use anyhow::{Context, Result};
use tracing::info;

use super::backend::AudioFrame;

/// Encodings probed in priority order. The first one the build supports wins;
/// when none match we fall back to the platform default (PCM WAV).
pub const PREFERRED_ENCODINGS: &[&str] = &[
    "audio/webm;codecs=opus",
    "audio/ogg;codecs=opus",
    "audio/mp4",
    "audio/wav",
];

/// Platform default used when no preferred encoding is supported.
pub const DEFAULT_ENCODING: &str = "audio/wav";

/// Whether this build can encode the given mime type.
pub fn is_encoding_supported(mime_type: &str) -> bool {
    // PCM WAV via hound is the only encoder compiled in.
    mime_type.eq_ignore_ascii_case("audio/wav")
}

/// Pick the first supported encoding from the priority list.
pub fn negotiate_encoding() -> &'static str {
    for candidate in PREFERRED_ENCODINGS {
        if is_encoding_supported(candidate) {
            info!("Negotiated recording encoding: {}", candidate);
            return candidate;
        }
    }
    info!(
        "No preferred encoding supported, using platform default: {}",
        DEFAULT_ENCODING
    );
    DEFAULT_ENCODING
}

/// Finalized recording: one encoded binary object tagged with its mime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingBlob {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl RecordingBlob {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Recorder lifecycle, mirroring the platform recorder states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Inactive,
    Recording,
    Stopped,
}

/// Accumulates gain-boosted frames into interval-sized encoded chunks.
///
/// Individual chunks are raw PCM fragments; `finalize` stitches them into a
/// single self-contained object with a header for the negotiated encoding,
/// the same way timesliced recorder chunks only become playable once merged.
pub struct ChunkAccumulator {
    sample_rate: u32,
    channels: u16,
    chunk_interval_ms: u64,
    chunks: Vec<Vec<u8>>,
    pending: Vec<u8>,
    pending_since_ms: Option<u64>,
}

impl ChunkAccumulator {
    pub fn new(sample_rate: u32, channels: u16, chunk_interval_ms: u64) -> Self {
        Self {
            sample_rate,
            channels,
            chunk_interval_ms,
            chunks: Vec::new(),
            pending: Vec::new(),
            pending_since_ms: None,
        }
    }

    /// Append one frame, sealing a chunk whenever the interval elapses.
    pub fn write_frame(&mut self, frame: &AudioFrame) {
        if self.pending_since_ms.is_none() {
            self.pending_since_ms = Some(frame.timestamp_ms);
        }

        for &sample in &frame.samples {
            self.pending.extend_from_slice(&sample.to_le_bytes());
        }

        let started = self.pending_since_ms.unwrap_or(frame.timestamp_ms);
        if frame.timestamp_ms.saturating_sub(started) >= self.chunk_interval_ms {
            self.seal_chunk();
        }
    }

    fn seal_chunk(&mut self) {
        if !self.pending.is_empty() {
            self.chunks.push(std::mem::take(&mut self.pending));
        }
        self.pending_since_ms = None;
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Stitch every accumulated chunk into one encoded object.
    pub fn finalize(mut self, mime_type: &str) -> Result<RecordingBlob> {
        self.seal_chunk();

        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .context("Failed to create WAV writer")?;

            for chunk in &self.chunks {
                for bytes in chunk.chunks_exact(2) {
                    let sample = i16::from_le_bytes([bytes[0], bytes[1]]);
                    writer
                        .write_sample(sample)
                        .context("Failed to write sample")?;
                }
            }

            writer.finalize().context("Failed to finalize recording")?;
        }

        Ok(RecordingBlob {
            data: cursor.into_inner(),
            mime_type: mime_type.to_string(),
        })
    }
}
