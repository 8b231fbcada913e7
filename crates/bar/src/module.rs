//! Modules: stable slots holding the latest output of a producer.
//!
//! A [`ModuleSlot`] is the only thing the render loop looks at. Producers
//! fill slots on their own schedule, using one of the patterns below:
//!
//! - [`poll`]: re-run a compute function on a fixed interval.
//! - [`push`]: format every event of an external subscription.
//! - [`tick`]: re-render the latest external value on an internal clock,
//!   for displays that change with time alone (elapsed play time).
//! - [`once`]: a single read; the producer and anything it holds are dropped
//!   afterwards.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use futures_signals::signal::{Mutable, MutableSignalCloned, Signal};
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, Stream, StreamExt};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::output::{Output, Segment};

/// Stable identity of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(&'static str);

impl ModuleId {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Holder of one module's latest output.
#[derive(Debug, Clone)]
pub struct ModuleSlot {
    id: ModuleId,
    output: Mutable<Output>,
}

impl ModuleSlot {
    pub fn new(id: ModuleId) -> Self {
        Self {
            id,
            output: Mutable::new(Output::empty()),
        }
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Snapshot of the current output.
    pub fn get(&self) -> Output {
        self.output.get_cloned()
    }

    pub fn has_output(&self) -> bool {
        !self.output.lock_ref().is_empty()
    }

    /// Replace the output. Equal outputs do not wake the render loop.
    pub fn set(&self, output: Output) {
        self.output.set_neq(output);
    }

    pub fn clear(&self) {
        self.set(Output::empty());
    }

    /// A signal of the slot's output.
    pub fn subscribe(&self) -> MutableSignalCloned<Output> {
        self.output.signal_cloned()
    }

    pub(crate) fn changed(&self) -> impl Signal<Item = ()> + Send + 'static {
        self.output.signal_ref(|_| ())
    }
}

/// Values a compute function may return.
///
/// Errors and `None` become an empty output, so a failing data source shows
/// nothing instead of taking anything else down.
pub trait IntoOutput {
    fn into_output(self, id: ModuleId) -> Output;
}

impl IntoOutput for Output {
    fn into_output(self, _id: ModuleId) -> Output {
        self
    }
}

impl IntoOutput for Segment {
    fn into_output(self, _id: ModuleId) -> Output {
        Output::from(self)
    }
}

impl<T: IntoOutput> IntoOutput for Option<T> {
    fn into_output(self, id: ModuleId) -> Output {
        match self {
            Some(value) => value.into_output(id),
            None => Output::empty(),
        }
    }
}

impl<T: IntoOutput, E: fmt::Display> IntoOutput for Result<T, E> {
    fn into_output(self, id: ModuleId) -> Output {
        match self {
            Ok(value) => value.into_output(id),
            Err(err) => {
                warn!(module = %id, "{}", err);
                Output::empty()
            }
        }
    }
}

/// Something that fills a slot over time.
pub trait Producer: Send + 'static {
    fn run(self: Box<Self>, slot: ModuleSlot) -> BoxFuture<'static, ()>;
}

/// Polling producer, see [`poll`].
pub struct Poll<F> {
    interval: Duration,
    compute: F,
}

/// Re-run `compute` every `interval`, starting immediately.
pub fn poll<F, Fut>(interval: Duration, compute: F) -> Poll<F>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoOutput,
{
    Poll { interval, compute }
}

impl<F, Fut> Producer for Poll<F>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoOutput,
{
    fn run(self: Box<Self>, slot: ModuleSlot) -> BoxFuture<'static, ()> {
        let Poll {
            interval,
            mut compute,
        } = *self;
        async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let output = compute().await.into_output(slot.id());
                slot.set(output);
            }
        }
        .boxed()
    }
}

/// Event-driven producer, see [`push`].
pub struct Push<S, F> {
    stream: S,
    format: F,
}

/// Format every item of `stream` into the slot.
pub fn push<S, F, R>(stream: S, format: F) -> Push<S, F>
where
    S: Stream + Send + 'static,
    F: FnMut(S::Item) -> R + Send + 'static,
    R: IntoOutput,
{
    Push { stream, format }
}

impl<S, F, R> Producer for Push<S, F>
where
    S: Stream + Send + 'static,
    F: FnMut(S::Item) -> R + Send + 'static,
    R: IntoOutput,
{
    fn run(self: Box<Self>, slot: ModuleSlot) -> BoxFuture<'static, ()> {
        let Push { stream, mut format } = *self;
        async move {
            let mut stream = Box::pin(stream);
            while let Some(item) = stream.next().await {
                let output = format(item).into_output(slot.id());
                slot.set(output);
            }
            debug!(module = %slot.id(), "Push source ended");
        }
        .boxed()
    }
}

/// Clock-driven re-render of an external value, see [`tick`].
pub struct Tick<S, F> {
    period: Duration,
    stream: S,
    render: F,
}

/// Keep the latest item of `stream` and re-render it on every item and every
/// `period`. `render` receives the time of the render.
pub fn tick<S, F, R>(period: Duration, stream: S, render: F) -> Tick<S, F>
where
    S: Stream + Send + 'static,
    S::Item: Send,
    F: FnMut(&S::Item, Instant) -> R + Send + 'static,
    R: IntoOutput,
{
    Tick {
        period,
        stream,
        render,
    }
}

impl<S, F, R> Producer for Tick<S, F>
where
    S: Stream + Send + 'static,
    S::Item: Send,
    F: FnMut(&S::Item, Instant) -> R + Send + 'static,
    R: IntoOutput,
{
    fn run(self: Box<Self>, slot: ModuleSlot) -> BoxFuture<'static, ()> {
        let Tick {
            period,
            stream,
            mut render,
        } = *self;
        async move {
            let mut stream = Box::pin(stream);
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut latest = None;

            loop {
                tokio::select! {
                    item = stream.next() => match item {
                        Some(item) => latest = Some(item),
                        None => break,
                    },
                    _ = ticker.tick() => {}
                }

                if let Some(item) = &latest {
                    let output = render(item, Instant::now()).into_output(slot.id());
                    slot.set(output);
                }
            }
            debug!(module = %slot.id(), "Tick source ended");
        }
        .boxed()
    }
}

/// One-shot producer, see [`once`].
pub struct Once<Fut> {
    future: Fut,
}

/// Await `future` once and store its result.
pub fn once<Fut>(future: Fut) -> Once<Fut>
where
    Fut: Future + Send + 'static,
    Fut::Output: IntoOutput,
{
    Once { future }
}

impl<Fut> Producer for Once<Fut>
where
    Fut: Future + Send + 'static,
    Fut::Output: IntoOutput,
{
    fn run(self: Box<Self>, slot: ModuleSlot) -> BoxFuture<'static, ()> {
        let future = self.future;
        async move {
            let output = future.await.into_output(slot.id());
            slot.set(output);
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_signals::signal::SignalExt;
    use futures_util::stream;

    const CLOCK: ModuleId = ModuleId::new("clock");

    #[test]
    fn test_slot_starts_empty() {
        let slot = ModuleSlot::new(CLOCK);
        assert!(!slot.has_output());
        assert_eq!(slot.id().as_str(), "clock");
    }

    #[test]
    fn test_result_error_becomes_empty() {
        let failed: Result<Output, String> = Err("no data".into());
        assert!(failed.into_output(CLOCK).is_empty());

        let missing: Option<Segment> = None;
        assert!(missing.into_output(CLOCK).is_empty());

        let ok: Result<Segment, String> = Ok(Segment::text("12:00"));
        assert_eq!(ok.into_output(CLOCK).len(), 1);
    }

    #[tokio::test]
    async fn test_push_formats_every_item() {
        let slot = ModuleSlot::new(CLOCK);
        let producer = Box::new(push(stream::iter(["a", "b", "c"]), |s: &str| {
            Segment::text(s)
        }));
        producer.run(slot.clone()).await;
        assert_eq!(slot.get(), Output::from(Segment::text("c")));
    }

    #[tokio::test]
    async fn test_once_sets_output() {
        let slot = ModuleSlot::new(CLOCK);
        let producer = Box::new(once(async { Some(Segment::text("eth0")) }));
        producer.run(slot.clone()).await;
        assert_eq!(slot.get().segments()[0].text_str(), "eth0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_updates_slot() {
        let slot = ModuleSlot::new(CLOCK);
        let mut count = 0;
        let producer = Box::new(poll(Duration::from_secs(1), move || {
            count += 1;
            let text = count.to_string();
            async move { Segment::text(text) }
        }));
        let task = tokio::spawn(producer.run(slot.clone()));

        let mut changes = slot.subscribe().to_stream();
        let first = changes.next().await.unwrap();
        assert!(first.is_empty() || first.segments()[0].text_str() == "1");

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(slot.get().segments()[0].text_str(), "3");
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_rerenders_latest_value() {
        let slot = ModuleSlot::new(CLOCK);
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<u32>();
        let rx = tokio_stream_from(rx);
        let renders = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = renders.clone();
        let producer = Box::new(tick(Duration::from_secs(1), rx, move |value, _now| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Segment::text(value.to_string())
        }));
        let task = tokio::spawn(producer.run(slot.clone()));

        tx.send(7).unwrap();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(slot.get().segments()[0].text_str(), "7");
        assert!(renders.load(std::sync::atomic::Ordering::SeqCst) >= 3);
        task.abort();
    }

    fn tokio_stream_from<T: Send + 'static>(
        mut rx: tokio::sync::mpsc::UnboundedReceiver<T>,
    ) -> impl Stream<Item = T> + Send + 'static {
        stream::poll_fn(move |cx| rx.poll_recv(cx))
    }
}
