//! Slice handlers.
//!
//! A handler receives each fulfilled slice by value and hands it back,
//! possibly edited, through a boxed future. The stream awaits each handler
//! before it scans further, so slices are handled strictly in stream order.

use std::future::Future;

use futures::future::{self, BoxFuture};

use crate::error::HandlerError;
use crate::slice::Slice;

/// Consumer of fulfilled slices of one type (or of every unclaimed type,
/// when registered as the fallback).
pub trait SliceHandler: Send {
    /// Inspect or edit `slice` and return it. An error aborts the feed.
    fn on_slice(&mut self, slice: Slice) -> BoxFuture<'_, Result<Slice, HandlerError>>;
}

impl<H: SliceHandler + ?Sized> SliceHandler for Box<H> {
    fn on_slice(&mut self, slice: Slice) -> BoxFuture<'_, Result<Slice, HandlerError>> {
        (**self).on_slice(slice)
    }
}

// ── Closure adapters ───────────────────────────────────────────────

/// Handler wrapping a synchronous closure. See [`sync_handler`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> SliceHandler for FnHandler<F>
where
    F: FnMut(&mut Slice) -> Result<(), HandlerError> + Send,
{
    fn on_slice(&mut self, mut slice: Slice) -> BoxFuture<'_, Result<Slice, HandlerError>> {
        let result = (self.f)(&mut slice).map(|()| slice);
        Box::pin(future::ready(result))
    }
}

/// Wrap a closure that edits slices in place.
///
/// # Examples
///
/// ```
/// use skein_stream::{sync_handler, SliceStream};
///
/// let stream = SliceStream::builder()
///     .handler(1, sync_handler(|slice| {
///         slice.replace_payload(b"BB".to_vec());
///         Ok(())
///     }))
///     .build()
///     .unwrap();
/// # drop(stream);
/// ```
pub fn sync_handler<F>(f: F) -> FnHandler<F>
where
    F: FnMut(&mut Slice) -> Result<(), HandlerError> + Send,
{
    FnHandler { f }
}

/// Handler wrapping a closure that returns a future. See [`async_handler`].
pub struct AsyncFnHandler<F> {
    f: F,
}

impl<F, Fut> SliceHandler for AsyncFnHandler<F>
where
    F: FnMut(Slice) -> Fut + Send,
    Fut: Future<Output = Result<Slice, HandlerError>> + Send + 'static,
{
    fn on_slice(&mut self, slice: Slice) -> BoxFuture<'_, Result<Slice, HandlerError>> {
        Box::pin((self.f)(slice))
    }
}

/// Wrap a closure that takes each slice by value and resolves to it
/// asynchronously.
pub fn async_handler<F, Fut>(f: F) -> AsyncFnHandler<F>
where
    F: FnMut(Slice) -> Fut + Send,
    Fut: Future<Output = Result<Slice, HandlerError>> + Send + 'static,
{
    AsyncFnHandler { f }
}
