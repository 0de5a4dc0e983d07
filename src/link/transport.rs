//! Inbound message buffering.
//!
//! ```text
//!  server task ──on_event──▶ Channel<CriticalSectionRawMutex, Message, N> ──try_receive──▶ loop
//! ```

use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Deque;
use log::{debug, info, warn};

use super::{LinkEvent, Message};

/// Default number of payloads buffered between two loop passes.
pub const DEFAULT_QUEUE_DEPTH: usize = 16;

/// Non-blocking source of complete command payloads.
pub trait Transport {
    /// Next buffered payload, or `None` when nothing is pending.
    fn poll_message(&mut self) -> Option<Message>;
}

/// A link that never delivers anything (bench runs without Wi-Fi).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn poll_message(&mut self) -> Option<Message> {
        None
    }
}

/// Log a server event and return the payload if it carries a command.
fn accept(event: LinkEvent<'_>) -> Option<&[u8]> {
    match event {
        LinkEvent::Connected { client } => {
            info!("WebSocket client #{} connected", client);
            None
        }
        LinkEvent::Disconnected { client } => {
            info!("WebSocket client #{} disconnected", client);
            None
        }
        LinkEvent::Data {
            client,
            frame,
            payload,
        } => {
            if frame.carries_command(payload.len()) {
                Some(payload)
            } else {
                debug!("client #{}: ignored {:?} chunk", client, frame);
                None
            }
        }
        LinkEvent::Pong { .. } => None,
        LinkEvent::Error { client } => {
            warn!("WebSocket client #{} error", client);
            None
        }
    }
}

fn to_message(payload: &[u8]) -> Option<Message> {
    let msg = Message::from_slice(payload).ok();
    if msg.is_none() {
        warn!("link: {}-byte payload too long, dropped", payload.len());
    }
    msg
}

/// Fixed-capacity FIFO of payloads owned by the loop.  Overflow drops the
/// new payload.
#[derive(Debug, Default)]
pub struct QueuedTransport<const N: usize = DEFAULT_QUEUE_DEPTH> {
    queue: Deque<Message, N>,
    dropped: u32,
}

impl<const N: usize> QueuedTransport<N> {
    pub fn new() -> Self {
        Self {
            queue: Deque::new(),
            dropped: 0,
        }
    }

    /// Buffer one payload.  Returns `false` if it was dropped.
    pub fn push(&mut self, payload: &[u8]) -> bool {
        let Some(msg) = to_message(payload) else {
            self.dropped = self.dropped.saturating_add(1);
            return false;
        };
        if self.queue.push_back(msg).is_err() {
            warn!("link: queue full, dropped payload");
            self.dropped = self.dropped.saturating_add(1);
            return false;
        }
        true
    }

    /// Handle a server-side event.  Returns `true` if a payload was queued.
    pub fn on_event(&mut self, event: LinkEvent<'_>) -> bool {
        accept(event).is_some_and(|payload| self.push(payload))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Payloads lost to overflow since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl<const N: usize> Transport for QueuedTransport<N> {
    fn poll_message(&mut self) -> Option<Message> {
        self.queue.pop_front()
    }
}

struct Shared<const N: usize> {
    channel: Channel<CriticalSectionRawMutex, Message, N>,
    dropped: AtomicU32,
}

/// Bounded channel between the server task (producer) and the control
/// loop (consumer).  Both sides only ever `try_*`, so neither blocks.
pub struct SharedTransport<const N: usize = DEFAULT_QUEUE_DEPTH> {
    inner: Arc<Shared<N>>,
}

impl<const N: usize> Clone for SharedTransport<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<const N: usize> Default for SharedTransport<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SharedTransport<N> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Shared {
                channel: Channel::new(),
                dropped: AtomicU32::new(0),
            }),
        }
    }

    /// Producer side: forward a server event into the channel.  Returns
    /// `true` if a payload was queued.
    pub fn on_event(&self, event: LinkEvent<'_>) -> bool {
        let Some(payload) = accept(event) else {
            return false;
        };
        let queued = to_message(payload).is_some_and(|msg| {
            let sent = self.inner.channel.try_send(msg).is_ok();
            if !sent {
                warn!("link: command channel full, dropping frame");
            }
            sent
        });
        if !queued {
            self.inner.dropped.fetch_add(1, Ordering::Relaxed);
        }
        queued
    }

    /// Payloads waiting for the loop.
    pub fn len(&self) -> usize {
        self.inner.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.channel.is_empty()
    }

    /// Payloads lost to overflow since boot.
    pub fn dropped(&self) -> u32 {
        self.inner.dropped.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Transport for SharedTransport<N> {
    fn poll_message(&mut self) -> Option<Message> {
        self.inner.channel.try_receive().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{FrameInfo, MAX_MESSAGE_LEN};

    fn data(payload: &[u8]) -> LinkEvent<'_> {
        LinkEvent::Data {
            client: 1,
            frame: FrameInfo::text(payload.len()),
            payload,
        }
    }

    #[test]
    fn fifo_order() {
        let mut q: QueuedTransport<4> = QueuedTransport::new();
        assert!(q.on_event(data(b"move1")));
        assert!(q.on_event(data(b"move0")));
        assert_eq!(q.poll_message().as_deref(), Some(&b"move1"[..]));
        assert_eq!(q.poll_message().as_deref(), Some(&b"move0"[..]));
        assert!(q.poll_message().is_none());
    }

    #[test]
    fn overflow_drops_newest() {
        let mut q: QueuedTransport<2> = QueuedTransport::new();
        q.push(b"a");
        q.push(b"b");
        assert!(!q.push(b"c"));
        assert_eq!(q.dropped(), 1);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn fragmented_frames_never_reach_the_loop() {
        let mut q: QueuedTransport<4> = QueuedTransport::new();
        let ev = LinkEvent::Data {
            client: 3,
            frame: FrameInfo {
                fin: false,
                ..FrameInfo::text(5)
            },
            payload: b"move1",
        };
        assert!(!q.on_event(ev));
        assert!(!q.on_event(LinkEvent::Connected { client: 3 }));
        assert!(q.is_empty());
    }

    #[test]
    fn shared_clones_see_one_queue() {
        let producer: SharedTransport<4> = SharedTransport::new();
        let mut consumer = producer.clone();
        let handle = std::thread::spawn(move || producer.on_event(data(b"toggle2")));
        assert!(handle.join().unwrap());
        assert_eq!(consumer.poll_message().as_deref(), Some(&b"toggle2"[..]));
    }

    #[test]
    fn shared_channel_full_drops_and_counts() {
        let link: SharedTransport<2> = SharedTransport::new();
        assert!(link.on_event(data(b"move1")));
        assert!(link.on_event(data(b"move2")));
        assert!(!link.on_event(data(b"move3")));
        assert_eq!(link.len(), 2);
        assert_eq!(link.dropped(), 1);

        let mut consumer = link.clone();
        assert_eq!(consumer.poll_message().as_deref(), Some(&b"move1"[..]));
        assert!(link.on_event(data(b"move4")));
        assert_eq!(consumer.poll_message().as_deref(), Some(&b"move2"[..]));
        assert_eq!(consumer.poll_message().as_deref(), Some(&b"move4"[..]));
        assert!(consumer.poll_message().is_none());
    }

    #[test]
    fn shared_channel_filters_like_the_queue() {
        let link: SharedTransport<4> = SharedTransport::new();
        let long = [b'a'; MAX_MESSAGE_LEN + 1];
        assert!(!link.on_event(data(&long)));
        assert!(!link.on_event(LinkEvent::Pong { client: 1 }));
        assert!(!link.on_event(LinkEvent::Data {
            client: 1,
            frame: FrameInfo {
                offset: 3,
                ..FrameInfo::text(5)
            },
            payload: b"move1",
        }));
        assert!(link.is_empty());
        assert_eq!(link.dropped(), 1);
    }
}
