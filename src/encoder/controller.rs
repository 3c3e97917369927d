//! Reference-counted encoder lifecycle controller

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use nix::sys::signal;
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::encoder::command::{default_kill_sequence, EncoderCommand, KillStep};
use crate::error::{Error, Result};

/// Controller configuration
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Command launched on the 0 -> 1 consumer transition
    pub command: EncoderCommand,
    /// Escalating stop sequence applied on the 1 -> 0 transition
    pub kill_sequence: Vec<KillStep>,
}

impl EncoderConfig {
    pub fn new(command: EncoderCommand) -> Self {
        Self {
            command,
            kill_sequence: default_kill_sequence(),
        }
    }

    /// Replace the stop sequence
    pub fn kill_sequence(mut self, steps: Vec<KillStep>) -> Self {
        self.kill_sequence = steps;
        self
    }
}

/// Lifecycle counters
///
/// Starts count 0 -> 1 launches only; restarts are tracked separately.
#[derive(Debug, Default)]
pub struct LifecycleStats {
    starts: AtomicU64,
    stops: AtomicU64,
    restarts: AtomicU64,
}

impl LifecycleStats {
    pub fn starts(&self) -> u64 {
        self.starts.load(Ordering::Relaxed)
    }

    pub fn stops(&self) -> u64 {
        self.stops.load(Ordering::Relaxed)
    }

    pub fn restarts(&self) -> u64 {
        self.restarts.load(Ordering::Relaxed)
    }
}

struct ControllerState {
    active: u32,
    child: Option<Child>,
}

/// Starts and stops the encoder subprocess around an active-consumer count
///
/// The count and the process handle live under one lock, so the 0 -> 1 and
/// 1 -> 0 transitions are atomic with the launch and stop they trigger.
pub struct EncoderController {
    config: EncoderConfig,
    state: Mutex<ControllerState>,
    stats: LifecycleStats,
}

impl EncoderController {
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ControllerState {
                active: 0,
                child: None,
            }),
            stats: LifecycleStats::default(),
        }
    }

    /// Register one consumer; launches the encoder on the 0 -> 1 transition
    ///
    /// The subprocess is spawned and its handle recorded before this
    /// returns. A spawn failure leaves the count untouched.
    pub async fn acquire(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        // A restart may have left a process running with no consumers; only
        // launch when there is no live handle.
        if state.active == 0 && state.child.is_none() {
            let child = self.spawn()?;
            tracing::info!(pid = child.id(), "first consumer, encoder started");
            state.child = Some(child);
            self.stats.starts.fetch_add(1, Ordering::Relaxed);
        }

        state.active += 1;
        tracing::debug!(active = state.active, "consumer acquired");
        Ok(())
    }

    /// Release one consumer; stops the encoder on the 1 -> 0 transition
    ///
    /// Releasing below zero is a programming error and fails fast.
    pub async fn release(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        if state.active == 0 {
            return Err(Error::ConsumerCountUnderflow);
        }

        state.active -= 1;
        tracing::debug!(active = state.active, "consumer released");

        if state.active == 0 {
            if let Some(child) = state.child.take() {
                tracing::info!("last consumer, stopping encoder");
                self.stop_child(child).await;
                self.stats.stops.fetch_add(1, Ordering::Relaxed);
            }
        }

        Ok(())
    }

    /// Stop-then-start regardless of the current count
    ///
    /// Recovery path for a lost producer connection, not for consumer churn.
    pub async fn restart(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        if let Some(child) = state.child.take() {
            self.stop_child(child).await;
        }

        let child = self.spawn()?;
        tracing::info!(pid = child.id(), "encoder restarted");
        state.child = Some(child);
        self.stats.restarts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Current active consumer count
    pub async fn active_consumers(&self) -> u32 {
        self.state.lock().await.active
    }

    /// Whether an encoder process handle is currently held
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.child.is_some()
    }

    pub fn stats(&self) -> &LifecycleStats {
        &self.stats
    }

    fn spawn(&self) -> Result<Child> {
        let command = &self.config.command;
        Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(Error::EncoderLaunch)
    }

    /// Walk the kill ladder, tolerating a process that is already gone
    async fn stop_child(&self, mut child: Child) {
        for step in &self.config.kill_sequence {
            if matches!(child.try_wait(), Ok(Some(_))) {
                break;
            }
            let Some(pid) = child.id() else {
                break;
            };
            match signal::kill(Pid::from_raw(pid as i32), step.signal) {
                Ok(()) => {
                    tracing::debug!(pid, signal = %step.signal, "signalled encoder");
                    tokio::time::sleep(step.grace).await;
                }
                Err(e) => {
                    // Usually ESRCH: the process exited between checks.
                    tracing::debug!(pid, error = %e, "encoder already gone");
                    break;
                }
            }
        }

        // Reap the process; a second kill on a dead child is a no-op.
        let _ = child.start_kill();
        match child.wait().await {
            Ok(status) => tracing::info!(%status, "encoder stopped"),
            Err(e) => tracing::warn!(error = %e, "failed to reap encoder"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sleep_controller() -> EncoderController {
        EncoderController::new(EncoderConfig::new(EncoderCommand::new("sleep").arg("30")))
    }

    #[tokio::test]
    async fn test_first_acquire_starts_encoder() {
        let controller = sleep_controller();
        assert!(!controller.is_running().await);

        controller.acquire().await.unwrap();
        assert!(controller.is_running().await);
        assert_eq!(controller.active_consumers().await, 1);
        assert_eq!(controller.stats().starts(), 1);

        // Second consumer does not start another process.
        controller.acquire().await.unwrap();
        assert_eq!(controller.stats().starts(), 1);
        assert_eq!(controller.active_consumers().await, 2);

        controller.release().await.unwrap();
        controller.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_last_release_stops_encoder() {
        let controller = sleep_controller();
        controller.acquire().await.unwrap();
        controller.acquire().await.unwrap();

        controller.release().await.unwrap();
        assert!(controller.is_running().await, "still one consumer left");
        assert_eq!(controller.stats().stops(), 0);

        controller.release().await.unwrap();
        assert!(!controller.is_running().await);
        assert_eq!(controller.stats().stops(), 1);
    }

    #[tokio::test]
    async fn test_release_underflow_fails_fast() {
        let controller = sleep_controller();
        let err = controller.release().await.unwrap_err();
        assert!(matches!(err, Error::ConsumerCountUnderflow));
        assert_eq!(controller.active_consumers().await, 0);
    }

    #[tokio::test]
    async fn test_launch_failure_leaves_count_unchanged() {
        let controller = EncoderController::new(EncoderConfig::new(EncoderCommand::new(
            "/nonexistent/encoder-binary",
        )));

        let err = controller.acquire().await.unwrap_err();
        assert!(matches!(err, Error::EncoderLaunch(_)));
        assert_eq!(controller.active_consumers().await, 0);
        assert!(!controller.is_running().await);
    }

    #[tokio::test]
    async fn test_stop_tolerates_exited_process() {
        // "true" exits immediately, so the ladder runs against a corpse.
        let controller =
            EncoderController::new(EncoderConfig::new(EncoderCommand::new("true")));
        controller.acquire().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        controller.release().await.unwrap();
        assert!(!controller.is_running().await);
        assert_eq!(controller.stats().stops(), 1);
    }

    #[tokio::test]
    async fn test_restart_is_unconditional() {
        let controller = sleep_controller();

        // Restart with no consumers still spawns a fresh process.
        controller.restart().await.unwrap();
        assert!(controller.is_running().await);
        assert_eq!(controller.stats().restarts(), 1);
        assert_eq!(controller.stats().starts(), 0);

        // An acquire after the restart adopts the running process instead of
        // spawning a second one.
        controller.acquire().await.unwrap();
        assert_eq!(controller.stats().starts(), 0);
        controller.release().await.unwrap();
        assert!(!controller.is_running().await);
    }
}
