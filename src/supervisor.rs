//! Main loop owning the display and both updaters.
//!
//! Starts the clock, alternates the wired and wireless status pages until
//! the shutdown future resolves, then stops the clock and blanks the panel.

use crate::clock::ClockUpdater;
use crate::config::Config;
use crate::display::{CharDisplay, DisplayError, DisplayGuard};
use crate::net::NetworkProbe;
use crate::status::NetworkStatusUpdater;
use std::future::Future;
use std::time::Duration;

/// How long shutdown waits for the clock task before clearing the panel
pub const CLOCK_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Supervisor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Owner of the display guard and both updaters
pub struct Supervisor<D, P> {
    guard: DisplayGuard<D>,
    clock: ClockUpdater<D>,
    network: NetworkStatusUpdater<D, P>,
    phase: Duration,
    state: SupervisorState,
}

impl<D: CharDisplay + 'static, P: NetworkProbe> Supervisor<D, P> {
    /// Blank the device, then share it between the updaters
    pub fn new(mut device: D, probe: P, config: &Config) -> Result<Self, DisplayError> {
        device.clear()?;

        let guard = DisplayGuard::new(device);
        let clock = ClockUpdater::new(guard.clone(), config.clock_interval());
        let network = NetworkStatusUpdater::new(guard.clone(), probe, config.interfaces());

        Ok(Self {
            guard,
            clock,
            network,
            phase: config.phase_duration(),
            state: SupervisorState::Idle,
        })
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Another handle to the shared display, for inspecting a fake device
    #[doc(hidden)]
    pub fn display(&self) -> DisplayGuard<D> {
        self.guard.clone()
    }

    /// Run until `shutdown` resolves or a display write fails.
    ///
    /// A failed write from either updater, including the clock task dying,
    /// ends the loop. The panel is blanked on every path and a write error
    /// is returned after the shutdown sequence.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) -> Result<(), DisplayError> {
        self.clock.start();
        self.set_state(SupervisorState::Running);

        tokio::pin!(shutdown);

        let outcome = loop {
            tokio::select! {
                result = cycle(&self.network, self.phase) => {
                    if let Err(e) = result {
                        tracing::error!("Display write failed: {}", e);
                        break Err(e);
                    }
                }
                result = self.clock.exited() => {
                    tracing::error!("Clock stopped while running");
                    break result;
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break Ok(());
                }
            }
        };

        let stopped = self.shutdown().await;
        outcome.and(stopped)
    }

    async fn shutdown(&mut self) -> Result<(), DisplayError> {
        self.set_state(SupervisorState::Stopping);

        self.clock.stop();
        let clock_result = self.clock.wait_stopped(CLOCK_JOIN_TIMEOUT).await;
        let cleared = self.guard.clear_raw().await;

        self.set_state(SupervisorState::Stopped);

        // Unconditional, in case the first clear raced an in-flight write
        let final_clear = self.guard.clear_raw().await;

        clock_result.and(cleared).and(final_clear)
    }

    fn set_state(&mut self, state: SupervisorState) {
        tracing::info!("Supervisor {:?} -> {:?}", self.state, state);
        self.state = state;
    }
}

/// One wired page followed by one wireless page
async fn cycle<D: CharDisplay, P: NetworkProbe>(
    network: &NetworkStatusUpdater<D, P>,
    phase: Duration,
) -> Result<(), DisplayError> {
    network.show_eth().await?;
    tokio::time::sleep(phase).await;

    network.show_wifi().await?;
    tokio::time::sleep(phase).await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::CLOCK_ROW;
    use crate::display::{DisplayOp, FakeDisplay, CMD_CLEAR};
    use crate::net::FakeProbe;

    #[test]
    fn new_clears_device_and_starts_idle() {
        let supervisor =
            Supervisor::new(FakeDisplay::new(), FakeProbe::new(), &Config::default()).unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Idle);
    }

    /// Records like `FakeDisplay` but rejects every clock row write
    #[derive(Default)]
    struct NoClockRow {
        inner: FakeDisplay,
    }

    impl CharDisplay for NoClockRow {
        fn clear(&mut self) -> Result<(), DisplayError> {
            self.inner.clear()
        }

        fn write_command(&mut self, code: u8) -> Result<(), DisplayError> {
            self.inner.write_command(code)
        }

        fn write_line(&mut self, text: &str, row: u8) -> Result<(), DisplayError> {
            if row == CLOCK_ROW {
                return Err(DisplayError::InvalidRow(row));
            }
            self.inner.write_line(text, row)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn clock_write_failure_ends_run() {
        let mut supervisor =
            Supervisor::new(NoClockRow::default(), FakeProbe::new(), &Config::default()).unwrap();
        let started = tokio::time::Instant::now();

        let err = supervisor
            .run(tokio::time::sleep(Duration::from_secs(60)))
            .await
            .unwrap_err();

        assert!(matches!(err, DisplayError::InvalidRow(CLOCK_ROW)));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(supervisor.state(), SupervisorState::Stopped);

        // At most the first page was drawn, and the panel ends blank
        let ops = supervisor.display().with_display(|d| d.inner.take_ops()).await;
        let pages = ops
            .iter()
            .filter(|op| matches!(op, DisplayOp::Line { row: 1, .. }))
            .count();
        assert!(pages <= 1, "{pages} pages drawn after the clock died");
        assert_eq!(
            &ops[ops.len() - 2..],
            &[DisplayOp::Command(CMD_CLEAR), DisplayOp::Command(CMD_CLEAR)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_shutdown_still_blanks_panel() {
        let mut supervisor =
            Supervisor::new(FakeDisplay::new(), FakeProbe::new(), &Config::default()).unwrap();

        supervisor.run(async {}).await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Stopped);

        let ops = supervisor.display().with_display(|d| d.take_ops()).await;
        assert_eq!(ops.first(), Some(&DisplayOp::Clear));
        assert_eq!(
            &ops[ops.len() - 2..],
            &[DisplayOp::Command(CMD_CLEAR), DisplayOp::Command(CMD_CLEAR)]
        );
    }
}
