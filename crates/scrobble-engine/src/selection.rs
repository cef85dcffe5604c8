//! The user-controlled time window and its change notifications.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use scrobble_common::{year_start, EventLog, Result, ScrobbleError, TimeWindow};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Capacity of the change notification channel.
pub const SELECTION_CHANNEL_CAPACITY: usize = 64;

/// Why the selection changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    /// First activation with the default window.
    Initial,
    /// A valid user selection.
    User,
    /// A degenerate or cleared selection was replaced by the default.
    ResetToDefault,
}

/// Notification sent for every accepted selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectionChanged {
    /// Monotonic sequence number, starting at 1.
    pub seq: u64,
    /// The window now in effect.
    pub window: TimeWindow,
    /// Cause of the change.
    pub reason: ChangeReason,
}

/// Lifecycle of the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    /// Not yet activated.
    Unset,
    /// A window is in effect.
    Active(TimeWindow),
}

/// The current `[start, end]` selection over a log's extent.
///
/// Every accepted change, including a reset to the default, is broadcast
/// exactly once to subscribers.
#[derive(Debug)]
pub struct SelectionWindow {
    extent: TimeWindow,
    default: TimeWindow,
    state: SelectionState,
    seq: u64,
    tx: broadcast::Sender<SelectionChanged>,
}

impl SelectionWindow {
    /// Selection over the extent of `log`.
    pub fn new(log: &EventLog) -> Self {
        Self::with_extent(log.extent(), log.last_instant())
    }

    /// Selection over `extent`, with the default derived from the last
    /// observed event instant.
    pub fn with_extent(extent: TimeWindow, last_observed: DateTime<Utc>) -> Self {
        let (tx, _) = broadcast::channel(SELECTION_CHANNEL_CAPACITY);
        let default = default_window(extent, last_observed);
        debug!(%extent, %default, "Selection window created");
        Self {
            extent,
            default,
            state: SelectionState::Unset,
            seq: 0,
            tx,
        }
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SelectionChanged> {
        self.tx.subscribe()
    }

    /// Full time range of the log.
    pub const fn extent(&self) -> TimeWindow {
        self.extent
    }

    /// Window used on activation and after resets.
    pub const fn default_window(&self) -> TimeWindow {
        self.default
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> SelectionState {
        self.state
    }

    /// The window in effect, if activated.
    pub const fn current(&self) -> Option<TimeWindow> {
        match self.state {
            SelectionState::Unset => None,
            SelectionState::Active(window) => Some(window),
        }
    }

    /// Activate with the default window.
    ///
    /// Returns `None` without notifying if already active.
    pub fn activate(&mut self) -> Option<SelectionChanged> {
        match self.state {
            SelectionState::Active(_) => None,
            SelectionState::Unset => Some(self.apply(self.default, ChangeReason::Initial)),
        }
    }

    /// Apply a user selection.
    ///
    /// The range is clamped into the extent. An empty or inverted range,
    /// before or after clamping, restores the default instead.
    pub fn select(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> SelectionChanged {
        match self.validate(start, end) {
            Ok(window) => self.apply(window, ChangeReason::User),
            Err(err) => {
                debug!(%err, "Degenerate selection, restoring default");
                self.apply(self.default, ChangeReason::ResetToDefault)
            }
        }
    }

    /// Clear the selection, restoring the default window.
    pub fn clear(&mut self) -> SelectionChanged {
        self.apply(self.default, ChangeReason::ResetToDefault)
    }

    fn validate(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<TimeWindow> {
        let requested = TimeWindow::new(start, end)?;
        self.extent
            .clamp(requested.start(), requested.end())
            .ok_or_else(|| {
                ScrobbleError::invalid_selection(format!(
                    "{requested} does not overlap {}",
                    self.extent
                ))
            })
    }

    fn apply(&mut self, window: TimeWindow, reason: ChangeReason) -> SelectionChanged {
        self.state = SelectionState::Active(window);
        self.seq += 1;
        let change = SelectionChanged {
            seq: self.seq,
            window,
            reason,
        };
        info!(seq = change.seq, %window, ?reason, "Selection changed");
        // No receivers is fine; nothing is listening yet.
        let _ = self.tx.send(change);
        change
    }
}

/// `[start of the last event's year, last event]`, limited to the extent.
///
/// Falls back to the whole extent when that range is empty.
pub fn default_window(extent: TimeWindow, last_observed: DateTime<Utc>) -> TimeWindow {
    let end = last_observed.clamp(extent.start(), extent.end());
    let start = year_start(end).max(extent.start());
    TimeWindow::new(start, end).unwrap_or(extent)
}

/// Shared, lockable handle to a [`SelectionWindow`].
#[derive(Debug, Clone)]
pub struct SelectionHandle {
    inner: Arc<Mutex<SelectionWindow>>,
}

impl SelectionHandle {
    /// Wrap a selection window.
    pub fn new(window: SelectionWindow) -> Self {
        Self {
            inner: Arc::new(Mutex::new(window)),
        }
    }

    /// See [`SelectionWindow::subscribe`].
    pub fn subscribe(&self) -> broadcast::Receiver<SelectionChanged> {
        self.inner.lock().subscribe()
    }

    /// See [`SelectionWindow::activate`].
    pub fn activate(&self) -> Option<SelectionChanged> {
        self.inner.lock().activate()
    }

    /// See [`SelectionWindow::select`].
    pub fn select(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> SelectionChanged {
        self.inner.lock().select(start, end)
    }

    /// See [`SelectionWindow::clear`].
    pub fn clear(&self) -> SelectionChanged {
        self.inner.lock().clear()
    }

    /// See [`SelectionWindow::current`].
    pub fn current(&self) -> Option<TimeWindow> {
        self.inner.lock().current()
    }

    /// See [`SelectionWindow::default_window`].
    pub fn default_window(&self) -> TimeWindow {
        self.inner.lock().default_window()
    }

    /// See [`SelectionWindow::extent`].
    pub fn extent(&self) -> TimeWindow {
        self.inner.lock().extent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrobble_common::test_utils::{mock_timestamp, sample_log};
    use tokio::sync::broadcast::error::TryRecvError;

    fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeWindow {
        TimeWindow::new(start, end).unwrap()
    }

    fn extent_2022_2023() -> SelectionWindow {
        SelectionWindow::with_extent(
            window(mock_timestamp(2022, 1, 1, 0, 0, 0), mock_timestamp(2023, 6, 30, 20, 0, 0)),
            mock_timestamp(2023, 6, 30, 20, 0, 0),
        )
    }

    #[test]
    fn test_default_covers_latest_calendar_year() {
        let selection = SelectionWindow::new(&sample_log());
        let default = selection.default_window();
        assert_eq!(default.start(), mock_timestamp(2023, 1, 1, 0, 0, 0));
        assert_eq!(default.end(), sample_log().last_instant());
    }

    #[test]
    fn test_default_limited_to_extent() {
        let extent = window(mock_timestamp(2023, 3, 1, 0, 0, 0), mock_timestamp(2023, 5, 1, 0, 0, 0));
        let default = default_window(extent, extent.end());
        assert_eq!(default, extent);
    }

    #[test]
    fn test_default_falls_back_to_extent_at_new_year() {
        let extent = window(mock_timestamp(2022, 3, 1, 0, 0, 0), mock_timestamp(2023, 1, 1, 0, 0, 0));
        assert_eq!(default_window(extent, extent.end()), extent);
    }

    #[test]
    fn test_activation_emits_initial_once() {
        let mut selection = extent_2022_2023();
        let mut rx = selection.subscribe();
        assert_eq!(selection.state(), SelectionState::Unset);

        let change = selection.activate().unwrap();
        assert_eq!(change.reason, ChangeReason::Initial);
        assert_eq!(change.seq, 1);
        assert!(selection.activate().is_none());

        assert_eq!(rx.try_recv().unwrap(), change);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_zero_width_selection_resets_once() {
        let mut selection = extent_2022_2023();
        selection.activate();
        let mut rx = selection.subscribe();

        let t = mock_timestamp(2022, 8, 1, 0, 0, 0);
        let change = selection.select(t, t);

        assert_eq!(change.reason, ChangeReason::ResetToDefault);
        assert_eq!(change.window, selection.default_window());
        assert_eq!(rx.try_recv().unwrap(), change);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_inverted_selection_resets() {
        let mut selection = extent_2022_2023();
        let change = selection.select(mock_timestamp(2022, 9, 1, 0, 0, 0), mock_timestamp(2022, 8, 1, 0, 0, 0));
        assert_eq!(change.reason, ChangeReason::ResetToDefault);
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut selection = extent_2022_2023();
        let change = selection.select(mock_timestamp(2021, 6, 1, 0, 0, 0), mock_timestamp(2022, 2, 1, 0, 0, 0));
        assert_eq!(change.reason, ChangeReason::User);
        assert_eq!(change.window.start(), selection.extent().start());
        assert_eq!(selection.current(), Some(change.window));
    }

    #[test]
    fn test_selection_outside_extent_resets() {
        let mut selection = extent_2022_2023();
        let change = selection.select(mock_timestamp(2024, 1, 1, 0, 0, 0), mock_timestamp(2024, 2, 1, 0, 0, 0));
        assert_eq!(change.reason, ChangeReason::ResetToDefault);
    }

    #[test]
    fn test_sequence_increases() {
        let handle = SelectionHandle::new(extent_2022_2023());
        let a = handle.activate().unwrap();
        let b = handle.select(mock_timestamp(2022, 2, 1, 0, 0, 0), mock_timestamp(2022, 3, 1, 0, 0, 0));
        let c = handle.clear();
        assert!(a.seq < b.seq && b.seq < c.seq);
        assert_eq!(handle.current(), Some(handle.default_window()));
    }
}
