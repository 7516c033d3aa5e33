// Server-sent event streaming utilities
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::future::Future;
use tokio::sync::watch;
use tokio_stream::StreamExt;

/// Render once immediately, then again after every change published on `rx`.
/// Ends when the sender is dropped.
pub fn view_updates<T, V, F, Fut>(mut rx: watch::Receiver<T>, mut render: F) -> impl Stream<Item = V>
where
    T: Send + Sync + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = V> + Send,
    V: Send + 'static,
{
    async_stream::stream! {
        loop {
            let _ = rx.borrow_and_update();
            yield render().await;
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}

/// Wrap rendered views as `view` events with keep-alive comments.
pub fn sse_response<S, V>(views: S) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = V> + Send + 'static,
    V: Serialize,
{
    let events = views.filter_map(|view| match Event::default().event("view").json_data(&view) {
        Ok(event) => Some(Ok(event)),
        Err(e) => {
            tracing::warn!("Failed to encode view event: {}", e);
            None
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
