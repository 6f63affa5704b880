use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::{BatchItem, ItemResult, ProgressEvent};
use crate::refresh::{BatchError, PageSession, RefreshController};
use crate::store::Store;

/// Receiver of batch progress events.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Forwards events into an unbounded channel. A dropped receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelSink(mpsc::UnboundedSender<ProgressEvent>);

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self(tx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        if self.0.send(event).is_err() {
            debug!("Progress receiver dropped, event discarded");
        }
    }
}

/// Progress events of a spawned batch. Ends when the batch task finishes.
#[derive(Debug)]
pub struct ProgressStream {
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl ProgressStream {
    fn new(rx: mpsc::UnboundedReceiver<ProgressEvent>) -> Self {
        Self { rx }
    }
}

impl Stream for ProgressStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

pub type BatchOutcome = Result<Vec<ItemResult>, BatchError>;

/// A batch running on its own task.
///
/// The controller is handed back when the task finishes so a kept-open
/// session can be reused or closed by the caller.
pub struct RefreshRun<P: PageSession, S: Store> {
    pub events: ProgressStream,
    pub handle: JoinHandle<(RefreshController<P, S>, BatchOutcome)>,
}

/// Run `items` on a tokio task and stream its progress.
pub fn spawn_batch<P, S>(
    mut controller: RefreshController<P, S>,
    items: Vec<BatchItem>,
) -> RefreshRun<P, S>
where
    P: PageSession + 'static,
    S: Store + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let sink = ChannelSink::new(tx);

    let handle = tokio::spawn(async move {
        info!("Refresh batch started with {} items", items.len());
        let outcome = controller.run_batch(&items, &sink).await;
        (controller, outcome)
    });

    RefreshRun {
        events: ProgressStream::new(rx),
        handle,
    }
}
