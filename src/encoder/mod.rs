//! Encoder process lifecycle
//!
//! The external encoder (a gst-launch pipeline by default) is the single
//! producer feeding the ingest endpoints. It is started when the first
//! consumer registers, stopped when the last one leaves, and restarted when
//! its connection to the ingest loop is lost while consumers remain.
//!
//! The controller owns the process handle exclusively; nothing else in the
//! crate touches the subprocess.

pub mod command;
pub mod controller;

pub use command::{
    default_kill_sequence, detect_video_device, AudioSettings, EncoderCommand, GstPipeline,
    KillStep, VideoSettings,
};
pub use controller::{EncoderConfig, EncoderController, LifecycleStats};
