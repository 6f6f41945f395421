//! Recording and failing transaction-end listeners.

use crate::failures::TestFailure;
use demarc_core::{CoreError, CoreResult, ExecutionContext, TransactionEventListener};
use parking_lot::Mutex;
use std::sync::Arc;

/// Which notification point fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerEvent {
    /// `on_normal_end`.
    NormalEnd,
    /// `on_abnormal_end`.
    AbnormalEnd,
}

/// One recorded listener notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Name of the listener that was notified.
    pub listener: String,
    /// Which notification point fired.
    pub event: ListenerEvent,
    /// Kind of the failure passed to `on_abnormal_end`, if any.
    pub failure_kind: Option<String>,
}

/// Shared journal of listener notifications, in call order.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl EventLog {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a notification.
    pub fn record(&self, listener: &str, event: ListenerEvent, failure_kind: Option<String>) {
        self.calls.lock().push(RecordedCall {
            listener: listener.to_owned(),
            event,
            failure_kind,
        });
    }

    /// All recorded notifications, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Names of the listeners notified at `event`, in call order.
    #[must_use]
    pub fn notified_at(&self, event: ListenerEvent) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.event == event)
            .map(|call| call.listener.clone())
            .collect()
    }
}

/// Listener that records every notification into a shared [`EventLog`].
#[derive(Debug)]
pub struct RecordingListener {
    name: String,
    log: EventLog,
}

impl RecordingListener {
    /// Creates a named recording listener.
    pub fn new(name: impl Into<String>, log: EventLog) -> Self {
        Self {
            name: name.into(),
            log,
        }
    }
}

impl<I> TransactionEventListener<I> for RecordingListener {
    fn on_normal_end(&self, _input: &I, _ctx: &mut ExecutionContext<I>) -> CoreResult<()> {
        self.log.record(&self.name, ListenerEvent::NormalEnd, None);
        Ok(())
    }

    fn on_abnormal_end(
        &self,
        failure: &CoreError,
        _input: &I,
        _ctx: &mut ExecutionContext<I>,
    ) -> CoreResult<()> {
        self.log.record(
            &self.name,
            ListenerEvent::AbnormalEnd,
            Some(failure.kind().to_owned()),
        );
        Ok(())
    }
}

/// Listener that records like [`RecordingListener`] but fails at one
/// notification point with a [`TestFailure`] of the given kind.
#[derive(Debug)]
pub struct FailingListener {
    name: String,
    log: EventLog,
    fail_at: ListenerEvent,
    kind: String,
}

impl FailingListener {
    /// Creates a listener failing at `fail_at` with a failure of `kind`.
    pub fn new(
        name: impl Into<String>,
        log: EventLog,
        fail_at: ListenerEvent,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            log,
            fail_at,
            kind: kind.into(),
        }
    }

    fn raise(&self) -> CoreError {
        TestFailure::new(self.kind.clone()).into_error()
    }
}

impl<I> TransactionEventListener<I> for FailingListener {
    fn on_normal_end(&self, _input: &I, _ctx: &mut ExecutionContext<I>) -> CoreResult<()> {
        self.log.record(&self.name, ListenerEvent::NormalEnd, None);
        if self.fail_at == ListenerEvent::NormalEnd {
            return Err(self.raise());
        }
        Ok(())
    }

    fn on_abnormal_end(
        &self,
        failure: &CoreError,
        _input: &I,
        _ctx: &mut ExecutionContext<I>,
    ) -> CoreResult<()> {
        self.log.record(
            &self.name,
            ListenerEvent::AbnormalEnd,
            Some(failure.kind().to_owned()),
        );
        if self.fail_at == ListenerEvent::AbnormalEnd {
            return Err(self.raise());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_listener_journals_events() {
        let log = EventLog::new();
        let listener = RecordingListener::new("audit", log.clone());
        let mut ctx: ExecutionContext<String> = ExecutionContext::new();
        let input = "req".to_owned();

        TransactionEventListener::on_normal_end(&listener, &input, &mut ctx).unwrap();

        let calls = log.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].listener, "audit");
        assert_eq!(calls[0].event, ListenerEvent::NormalEnd);
        assert!(calls[0].failure_kind.is_none());
    }

    #[test]
    fn abnormal_end_records_failure_kind() {
        let log = EventLog::new();
        let listener = RecordingListener::new("audit", log.clone());
        let mut ctx: ExecutionContext<String> = ExecutionContext::new();
        let input = "req".to_owned();
        let failure = TestFailure::new("app.error").into_error();

        TransactionEventListener::on_abnormal_end(&listener, &failure, &input, &mut ctx).unwrap();

        assert_eq!(
            log.calls()[0].failure_kind.as_deref(),
            Some("app.error")
        );
    }

    #[test]
    fn failing_listener_records_before_failing() {
        let log = EventLog::new();
        let listener =
            FailingListener::new("broken", log.clone(), ListenerEvent::NormalEnd, "app.listener");
        let mut ctx: ExecutionContext<String> = ExecutionContext::new();
        let input = "req".to_owned();

        let result = TransactionEventListener::on_normal_end(&listener, &input, &mut ctx);

        assert!(matches!(result, Err(failure) if failure.kind() == "app.listener"));
        assert_eq!(log.notified_at(ListenerEvent::NormalEnd), vec!["broken"]);
    }
}
