pub mod analyser;
pub mod backend;
pub mod device;
pub mod encoder;
pub mod graph;
pub mod synthetic;

pub use analyser::{SpectrumAnalyser, VolumeMeter, ANALYSER_WINDOW};
pub use backend::{
    AudioFrame, CaptureBackend, CaptureBackendFactory, CaptureConfig, CaptureError, CaptureSource,
    MediaTrack, TrackKind,
};
pub use encoder::{negotiate_encoding, RecorderState, RecordingBlob, DEFAULT_ENCODING, PREFERRED_ENCODINGS};
pub use graph::{CaptureSession, GAIN_BOOST, METER_INTERVAL_MS};
pub use synthetic::SyntheticBackend;
