//! Relay server wiring demo
//!
//! Run with: cargo run --example relay_server
//!
//! Wires the full relay together: encoder lifecycle controller, video
//! ingest acceptor, fan-out hub, a stand-in consumer (the role the HTTP
//! layer plays in production), and the tuner settings surface over a
//! simulated receiver chip.
//!
//! With a V4L2 capture device present the encoder is the real gst-launch
//! MJPEG pipeline; without one it falls back to a videotestsrc pipeline so
//! the demo runs on any machine with GStreamer installed.
//!
//! Stop with Ctrl+C.

use std::sync::Arc;
use std::time::Duration;

use rx5808_stream::encoder::{detect_video_device, VideoSettings};
use rx5808_stream::hub::DEFAULT_BOUNDARY;
use rx5808_stream::tuner::BenchTuner;
use rx5808_stream::{
    ChannelConfig, EncoderCommand, EncoderConfig, EncoderController, GstPipeline, IngestAcceptor,
    IngestConfig, Rx5808, SettingsCommand, StreamHub, TunerSettings,
};
use tokio::sync::watch;

fn encoder_command(sink: std::net::SocketAddr) -> EncoderCommand {
    match detect_video_device() {
        Ok(device) => GstPipeline::new(VideoSettings {
            device,
            norm: "NTSC".into(),
            width: 720,
            height: 480,
            input_framerate: "30000/1001".into(),
            output_framerate: "10/1".into(),
            boundary: DEFAULT_BOUNDARY.into(),
            sink,
        })
        .command(),
        Err(e) => {
            tracing::warn!(error = %e, "no capture device, using videotestsrc");
            EncoderCommand::new("gst-launch-1.0").args([
                "videotestsrc pattern=ball".to_string(),
                "!".into(),
                "video/x-raw, framerate=10/1, width=720, height=480".into(),
                "!".into(),
                "jpegenc".into(),
                "!".into(),
                format!("multipartmux boundary={DEFAULT_BOUNDARY}"),
                "!".into(),
                format!("tcpclientsink host={} port={}", sink.ip(), sink.port()),
            ])
        }
    }
}

#[tokio::main]
async fn main() -> rx5808_stream::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let sink: std::net::SocketAddr = "127.0.0.1:9999".parse().expect("static addr");

    let controller = Arc::new(EncoderController::new(EncoderConfig::new(encoder_command(
        sink,
    ))));
    let hub = StreamHub::new(
        [ChannelConfig::new("video", sink).boundary(DEFAULT_BOUNDARY)],
        Arc::clone(&controller),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let acceptor = IngestAcceptor::bind(
        hub.channel("video").expect("configured above"),
        Arc::clone(&controller),
        IngestConfig::default(),
        shutdown_rx,
    )
    .await?;
    let ingest = tokio::spawn(acceptor.run());

    // Tune the (simulated) receiver before streaming starts.
    let settings = TunerSettings::new(Rx5808::new(BenchTuner::new()), Arc::clone(&controller));
    let status = settings.execute(SettingsCommand::SetFrequency(5658)).await;
    tracing::info!(status = %status, "tuner configured");
    tracing::info!(frequency = %settings.current_frequency().await, "tuner readback");

    // Stand-in for one HTTP streaming client: registering starts the
    // encoder, dropping the handle deregisters and stops it again.
    let consumer_hub = Arc::clone(&hub);
    let consumer = tokio::spawn(async move {
        let mut stream = match consumer_hub.subscribe("video").await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(error = %e, "could not register consumer");
                return;
            }
        };

        let mut total: u64 = 0;
        let mut report = tokio::time::interval(Duration::from_secs(5));
        loop {
            tokio::select! {
                chunk = stream.recv() => match chunk {
                    Some(chunk) => total += chunk.len() as u64,
                    None => break,
                },
                _ = report.tick() => {
                    tracing::info!(bytes = total, "consumer progress");
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    consumer.abort();
    let _ = shutdown_tx.send(true);
    let _ = ingest.await;

    // Give the release worker a moment to stop the encoder.
    tokio::time::sleep(Duration::from_millis(500)).await;
    Ok(())
}
