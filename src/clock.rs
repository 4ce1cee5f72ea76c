//! Clock updater for the bottom row of the display.
//!
//! Runs as a background task that redraws the current local date and time
//! at a short fixed interval until it is told to stop.

use crate::display::{CharDisplay, DisplayError, DisplayGuard, COLUMNS};
use chrono::NaiveDateTime;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::task::{JoinError, JoinHandle};

/// Row the clock owns
pub const CLOCK_ROW: u8 = 4;

/// Default refresh interval
pub const DEFAULT_REFRESH: Duration = Duration::from_millis(100);

/// Character used to pad the clock line to the full panel width
pub const FILLER: char = ' ';

/// Render `now` as `"Mon DD  HH:MM:SS"` padded to the panel width.
///
/// Month names come from chrono's built-in English table, so the output
/// does not depend on the process locale. Padding overwrites whatever a
/// longer previous string left on the row.
pub fn render_clock_line(now: &NaiveDateTime) -> String {
    let mut line = now.format("%b %d  %H:%M:%S").to_string();
    let width = line.chars().count();
    line.extend(std::iter::repeat_n(FILLER, COLUMNS.saturating_sub(width)));
    line
}

/// Background clock task handle
pub struct ClockUpdater<D> {
    guard: DisplayGuard<D>,
    refresh: Duration,
    running: bool,
    stop_tx: Option<broadcast::Sender<()>>,
    task: Option<JoinHandle<Result<(), DisplayError>>>,
}

impl<D: CharDisplay + 'static> ClockUpdater<D> {
    /// Create a stopped clock updater
    pub fn new(guard: DisplayGuard<D>, refresh: Duration) -> Self {
        Self {
            guard,
            refresh,
            running: false,
            stop_tx: None,
            task: None,
        }
    }

    /// Spawn the refresh loop.
    ///
    /// Calling this while already running does nothing.
    pub fn start(&mut self) {
        if self.running {
            tracing::debug!("Clock already running");
            return;
        }

        let (stop_tx, stop_rx) = broadcast::channel(1);
        let guard = self.guard.clone();
        let refresh = self.refresh;

        self.task = Some(tokio::spawn(run_loop(guard, refresh, stop_rx)));
        self.stop_tx = Some(stop_tx);
        self.running = true;

        tracing::info!("Clock started (refresh every {:?})", refresh);
    }

    /// Signal the refresh loop to exit without waiting for it.
    ///
    /// Safe to call when the loop was never started or has already exited.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // No receiver means the loop is already gone
            let _ = stop_tx.send(());
            tracing::info!("Clock stop requested");
        }
        self.running = false;
    }

    /// Wait up to `timeout` for the last started loop to exit.
    ///
    /// Returns the loop's write error if it died on one.
    pub async fn wait_stopped(&mut self, timeout: Duration) -> Result<(), DisplayError> {
        let Some(mut task) = self.task.take() else {
            return Ok(());
        };

        tokio::select! {
            joined = &mut task => join_result(joined),
            _ = tokio::time::sleep(timeout) => {
                tracing::warn!("Clock shutdown timeout");
                Ok(())
            }
        }
    }

    /// Resolve when the running loop exits on its own.
    ///
    /// A loop only ends without a stop request when a write fails or the
    /// task panics, so the result is normally an error. Pending forever if
    /// no loop was started.
    pub async fn exited(&mut self) -> Result<(), DisplayError> {
        let Some(task) = self.task.as_mut() else {
            return std::future::pending().await;
        };

        let joined = task.await;
        self.task = None;
        self.stop_tx = None;
        self.running = false;
        join_result(joined)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Flatten the loop's join result; a panic becomes a display error
fn join_result(joined: Result<Result<(), DisplayError>, JoinError>) -> Result<(), DisplayError> {
    match joined {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Clock task failed: {}", e);
            Err(DisplayError::TaskFailed(e.to_string()))
        }
    }
}

/// Redraw the clock row until a stop signal arrives or the sender is dropped
async fn run_loop<D: CharDisplay>(
    guard: DisplayGuard<D>,
    refresh: Duration,
    mut stop: broadcast::Receiver<()>,
) -> Result<(), DisplayError> {
    tracing::debug!("Clock loop running");

    loop {
        if !matches!(stop.try_recv(), Err(TryRecvError::Empty)) {
            break;
        }

        let line = render_clock_line(&chrono::Local::now().naive_local());
        if let Err(e) = guard
            .with_display(|lcd| lcd.write_line(&line, CLOCK_ROW))
            .await
        {
            tracing::error!("Clock write failed: {}", e);
            return Err(e);
        }

        // Sleep outside the guard
        tokio::select! {
            _ = tokio::time::sleep(refresh) => {}
            _ = stop.recv() => break,
        }
    }

    tracing::debug!("Clock loop exited");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayOp, FakeDisplay};
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    async fn clock_writes(guard: &DisplayGuard<FakeDisplay>) -> usize {
        guard
            .with_display(|d| {
                d.ops()
                    .iter()
                    .filter(|op| matches!(op, DisplayOp::Line { row: CLOCK_ROW, .. }))
                    .count()
            })
            .await
    }

    #[test]
    fn clock_line_layout() {
        let line = render_clock_line(&at(2024, 1, 5, 9, 3, 7));
        assert_eq!(line, "Jan 05  09:03:07    ");
    }

    #[test]
    fn clock_line_always_full_width() {
        let samples = [
            at(2000, 1, 1, 0, 0, 0),
            at(2024, 2, 29, 12, 30, 45),
            at(2023, 5, 9, 1, 2, 3),
            at(2099, 9, 30, 23, 59, 59),
            at(1999, 12, 31, 23, 59, 59),
        ];
        for dt in samples {
            assert_eq!(render_clock_line(&dt).chars().count(), COLUMNS, "{dt}");
        }
        for month in 1..=12 {
            let line = render_clock_line(&at(2024, month, 28, 0, 0, 0));
            assert_eq!(line.chars().count(), COLUMNS);
            assert!(line.ends_with(FILLER));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_runs_one_loop() {
        let guard = DisplayGuard::new(FakeDisplay::new());
        let mut clock = ClockUpdater::new(guard.clone(), Duration::from_secs(1));

        clock.start();
        clock.start();
        assert!(clock.is_running());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(clock_writes(&guard).await, 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(clock_writes(&guard).await, 2);

        clock.stop();
        clock.wait_stopped(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_then_start_resumes() {
        let guard = DisplayGuard::new(FakeDisplay::new());
        let mut clock = ClockUpdater::new(guard.clone(), Duration::from_millis(100));

        clock.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        clock.stop();
        assert!(!clock.is_running());
        clock.wait_stopped(Duration::from_secs(1)).await.unwrap();

        guard.with_display(|d| d.take_ops()).await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(clock_writes(&guard).await, 0);

        clock.start();
        assert!(clock.is_running());
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(clock_writes(&guard).await, 3);

        clock.stop();
        clock.wait_stopped(Duration::from_secs(1)).await.unwrap();
    }

    /// Device whose clock row either errors or panics
    struct BrokenClockRow {
        panics: bool,
    }

    impl CharDisplay for BrokenClockRow {
        fn clear(&mut self) -> Result<(), DisplayError> {
            Ok(())
        }

        fn write_command(&mut self, _code: u8) -> Result<(), DisplayError> {
            Ok(())
        }

        fn write_line(&mut self, _text: &str, row: u8) -> Result<(), DisplayError> {
            match row {
                CLOCK_ROW if self.panics => panic!("bus fault"),
                CLOCK_ROW => Err(DisplayError::InvalidRow(row)),
                _ => Ok(()),
            }
        }
    }

    #[tokio::test]
    async fn write_failure_ends_loop_with_error() {
        let guard = DisplayGuard::new(BrokenClockRow { panics: false });
        let mut clock = ClockUpdater::new(guard, DEFAULT_REFRESH);

        clock.start();
        let err = clock.exited().await.unwrap_err();
        assert!(matches!(err, DisplayError::InvalidRow(CLOCK_ROW)));
        assert!(!clock.is_running());

        // Nothing left to wait for
        assert!(clock.wait_stopped(Duration::from_millis(10)).await.is_ok());
    }

    #[tokio::test]
    async fn panicked_loop_reported_as_error() {
        let guard = DisplayGuard::new(BrokenClockRow { panics: true });
        let mut clock = ClockUpdater::new(guard, DEFAULT_REFRESH);

        clock.start();
        let err = clock.exited().await.unwrap_err();
        assert!(matches!(err, DisplayError::TaskFailed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn exited_pends_when_never_started() {
        let guard = DisplayGuard::new(FakeDisplay::new());
        let mut clock = ClockUpdater::new(guard, DEFAULT_REFRESH);

        let waited = tokio::time::timeout(Duration::from_millis(50), clock.exited()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn stop_is_safe_without_a_running_loop() {
        let guard = DisplayGuard::new(FakeDisplay::new());
        let mut clock = ClockUpdater::new(guard, DEFAULT_REFRESH);

        clock.stop();
        clock.stop();
        assert!(clock.wait_stopped(Duration::from_millis(10)).await.is_ok());
        assert!(!clock.is_running());
    }
}
