//! Encoder command assembly
//!
//! The lifecycle controller runs an arbitrary external command whose only
//! contract is to connect out to the configured loopback ingest endpoints
//! and stream raw encoded bytes until killed. [`GstPipeline`] builds the
//! default gst-launch-1.0 command: analog capture to MJPEG over one TCP
//! sink, and optionally ALSA capture to MP3 over a second one.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use nix::sys::signal::Signal;

use crate::error::{Error, Result};

/// Program and argument vector for the encoder subprocess
#[derive(Debug, Clone)]
pub struct EncoderCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EncoderCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl std::fmt::Display for EncoderCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// One step of the escalating stop sequence
#[derive(Debug, Clone, Copy)]
pub struct KillStep {
    /// Signal to deliver
    pub signal: Signal,
    /// How long to wait for the process to exit before the next step
    pub grace: Duration,
}

/// Default stop ladder: interrupt, terminate, kill
///
/// Every step tolerates the process being gone already; an encoder that
/// exits on SIGINT never sees the harder signals.
pub fn default_kill_sequence() -> Vec<KillStep> {
    vec![
        KillStep {
            signal: Signal::SIGINT,
            grace: Duration::from_millis(100),
        },
        KillStep {
            signal: Signal::SIGTERM,
            grace: Duration::from_millis(100),
        },
        KillStep {
            signal: Signal::SIGKILL,
            grace: Duration::from_millis(50),
        },
    ]
}

/// Video capture leg of the pipeline
#[derive(Debug, Clone)]
pub struct VideoSettings {
    /// Capture device, e.g. `/dev/video0`
    pub device: PathBuf,
    /// Analog video norm ("NTSC", "PAL")
    pub norm: String,
    pub width: u32,
    pub height: u32,
    /// Capture framerate fraction, e.g. "30000/1001"
    pub input_framerate: String,
    /// MJPEG output framerate fraction, e.g. "10/1"
    pub output_framerate: String,
    /// Multipart boundary token between MJPEG frames
    pub boundary: String,
    /// Loopback ingest endpoint for the video channel
    pub sink: SocketAddr,
}

/// Audio capture leg of the pipeline
#[derive(Debug, Clone)]
pub struct AudioSettings {
    /// ALSA device identifier, e.g. "hw:CARD=usbtv,DEV=0"
    pub device: String,
    pub channels: u8,
    /// Sample rate in Hz
    pub rate: u32,
    /// MP3 output bitrate in kbit/s
    pub mp3_bitrate: u32,
    /// Loopback ingest endpoint for the audio channel
    pub sink: SocketAddr,
}

/// gst-launch-1.0 pipeline builder
#[derive(Debug, Clone)]
pub struct GstPipeline {
    video: VideoSettings,
    audio: Option<AudioSettings>,
}

impl GstPipeline {
    pub fn new(video: VideoSettings) -> Self {
        Self { video, audio: None }
    }

    /// Add the MP3 audio leg
    pub fn with_audio(mut self, audio: AudioSettings) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Assemble the encoder command line
    pub fn command(&self) -> EncoderCommand {
        let v = &self.video;
        let mut cmd = EncoderCommand::new("gst-launch-1.0").args([
            format!("v4l2src device={} norm={}", v.device.display(), v.norm),
            "!".into(),
            format!(
                "video/x-raw, framerate={}, width={}, height={}",
                v.input_framerate, v.width, v.height
            ),
            "!".into(),
            "videorate".into(),
            "!".into(),
            format!("video/x-raw, framerate={}", v.output_framerate),
            "!".into(),
            "jpegenc".into(),
            "!".into(),
            format!("multipartmux boundary={}", v.boundary),
            "!".into(),
            format!("tcpclientsink host={} port={}", v.sink.ip(), v.sink.port()),
        ]);

        if let Some(a) = &self.audio {
            cmd = cmd.args([
                format!("alsasrc device={}", a.device),
                "!".into(),
                format!("audio/x-raw, channels={}, rate={}", a.channels, a.rate),
                "!".into(),
                format!(
                    "lamemp3enc target=bitrate bitrate={} mono=true",
                    a.mp3_bitrate
                ),
                "!".into(),
                format!("tcpclientsink host={} port={}", a.sink.ip(), a.sink.port()),
            ]);
        }

        cmd
    }
}

/// Pick the first `/dev/video*` capture device
///
/// Entries are sorted so the result is stable across scans.
pub fn detect_video_device() -> Result<PathBuf> {
    let mut devices: Vec<PathBuf> = std::fs::read_dir("/dev")?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("video"))
        })
        .collect();
    devices.sort();

    match devices.into_iter().next() {
        Some(device) => {
            tracing::info!(device = %device.display(), "selected video capture device");
            Ok(device)
        }
        None => Err(Error::NoVideoDevice),
    }
}
