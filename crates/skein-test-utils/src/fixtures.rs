//! Reusable slice handlers for stream tests.
//!
//! - [`RecordingHandler`] logs every slice it sees, then applies an [`Action`].
//! - [`FailingHandler`] succeeds a fixed number of times, then fails.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use skein_stream::{HandlerError, Slice, SliceHandler};

/// What a [`RecordingHandler`] does to each slice after logging it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Leave the slice alone.
    Forward,
    /// Swap in this payload.
    Replace(Vec<u8>),
    /// Swap in this type id.
    Retype(u32),
    /// Drop the slice.
    Drop,
}

/// Shared log of `(type, payload)` pairs, in handling order.
pub type SliceLog = Arc<Mutex<Vec<(u32, Vec<u8>)>>>;

/// Records each slice's type and payload, then applies its action.
///
/// Clones share one log, so one recorder can be registered for several
/// types (or as the fallback) and inspected afterwards.
#[derive(Clone, Debug)]
pub struct RecordingHandler {
    pub log: SliceLog,
    pub action: Action,
}

impl RecordingHandler {
    pub fn new(action: Action) -> Self {
        Self {
            log: SliceLog::default(),
            action,
        }
    }

    /// A recorder sharing this one's log but applying `action`.
    pub fn with_action(&self, action: Action) -> Self {
        Self {
            log: Arc::clone(&self.log),
            action,
        }
    }

    /// Snapshot of everything recorded so far.
    pub fn seen(&self) -> Vec<(u32, Vec<u8>)> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

impl SliceHandler for RecordingHandler {
    fn on_slice(&mut self, mut slice: Slice) -> BoxFuture<'_, Result<Slice, HandlerError>> {
        Box::pin(async move {
            if let Ok(mut log) = self.log.lock() {
                log.push((slice.slice_type(), slice.payload().to_vec()));
            }
            match &self.action {
                Action::Forward => {}
                Action::Replace(payload) => slice.replace_payload(payload.clone()),
                Action::Retype(slice_type) => slice.set_type(*slice_type),
                Action::Drop => slice.drop_slice(),
            }
            Ok(slice)
        })
    }
}

/// Succeeds `succeed_count` times, then fails every call.
#[derive(Debug)]
pub struct FailingHandler {
    pub succeed_count: usize,
    pub calls: usize,
}

impl FailingHandler {
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            calls: 0,
        }
    }
}

impl SliceHandler for FailingHandler {
    fn on_slice(&mut self, slice: Slice) -> BoxFuture<'_, Result<Slice, HandlerError>> {
        self.calls += 1;
        let result = if self.calls > self.succeed_count {
            Err(HandlerError::new(format!(
                "deliberate failure on call {}",
                self.calls
            )))
        } else {
            Ok(slice)
        };
        Box::pin(futures::future::ready(result))
    }
}
