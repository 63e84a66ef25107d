//! Client adapter
//!
//! Wraps a `Dispatcher` with connection lifecycle notifications and dual
//! result delivery: every call returns its outcome synchronously and, when a
//! continuation is supplied, hands an identical copy to it on a later turn.
//! A "turn" ends when the host calls `run_pending`.

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::protocol::{Arg, Reply};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Capacity of the lifecycle event channel
const EVENT_CAPACITY: usize = 16;

/// Connection lifecycle notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    /// The client connected
    Connect,

    /// The client is ready to accept commands
    Ready,

    /// The client disconnected
    End,
}

type Task = Box<dyn FnOnce() + Send>;

/// In-process client for the emulated store
pub struct Client {
    dispatcher: Dispatcher,
    connected: bool,
    events: broadcast::Sender<ClientEvent>,
    pending: VecDeque<Task>,
}

impl Client {
    /// Create a disconnected client using the wall clock
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a disconnected client with a custom time source
    pub fn with_clock(config: &EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Client {
            dispatcher: Dispatcher::with_config(config, clock),
            connected: false,
            events,
            pending: VecDeque::new(),
        }
    }

    /// Connect the client
    ///
    /// `Connect` then `Ready` are emitted on the next turn, so a subscriber
    /// attached right after this call still sees both.
    pub fn create_client(&mut self) {
        self.connected = true;
        info!("Client connected");
        self.emit_later(ClientEvent::Connect);
        self.emit_later(ClientEvent::Ready);
    }

    /// Disconnect the client; `End` is emitted on the next turn
    pub fn quit(&mut self) -> Reply {
        self.connected = false;
        info!("Client disconnected");
        self.emit_later(ClientEvent::End);
        Reply::ok()
    }

    /// Whether the client is connected
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Receive lifecycle notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Run a command and return its outcome
    pub fn call(&mut self, name: &str, args: &[Arg]) -> Result<Reply> {
        if name.eq_ignore_ascii_case("quit") {
            return Ok(self.quit());
        }
        self.dispatcher.dispatch(name, args)
    }

    /// Run a command, return its outcome and queue `continuation` with a copy
    ///
    /// The mutation is complete before this returns; only the notification
    /// is deferred.
    pub fn call_with<F>(&mut self, name: &str, args: &[Arg], continuation: F) -> Result<Reply>
    where
        F: FnOnce(Result<Reply>) + Send + 'static,
    {
        let outcome = self.call(name, args);
        let delivered = outcome.clone();
        self.pending.push_back(Box::new(move || continuation(delivered)));
        outcome
    }

    /// Run every queued continuation and notification in order
    ///
    /// Returns how many ran. Work queued while draining runs in the same pass.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.pending.pop_front() {
            task();
            ran += 1;
        }
        ran
    }

    /// Number of queued continuations and notifications
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Get reference to the dispatcher
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Get mutable reference to the dispatcher
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    fn emit_later(&mut self, event: ClientEvent) {
        let events = self.events.clone();
        self.pending.push_back(Box::new(move || {
            // No subscribers is fine
            events.send(event).ok();
        }));
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::error::CacheError;
    use std::sync::Mutex;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_lifecycle_events() {
        let mut client = Client::default();
        let mut events = client.subscribe();
        assert!(!client.is_connected());

        client.create_client();
        assert!(client.is_connected());
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));

        client.run_pending();
        assert_eq!(events.try_recv(), Ok(ClientEvent::Connect));
        assert_eq!(events.try_recv(), Ok(ClientEvent::Ready));

        assert_eq!(client.call("QUIT", &[]).unwrap(), Reply::ok());
        assert!(!client.is_connected());
        client.run_pending();
        assert_eq!(events.try_recv(), Ok(ClientEvent::End));
    }

    #[test]
    fn test_subscriber_after_connect() {
        let mut client = Client::default();
        client.create_client();

        let mut events = client.subscribe();
        client.run_pending();
        assert_eq!(events.try_recv(), Ok(ClientEvent::Connect));
        assert_eq!(events.try_recv(), Ok(ClientEvent::Ready));
    }

    #[test]
    fn test_dual_delivery() {
        let mut client = Client::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let sync = client
            .call_with("hset", &args!["h", "f", 1], move |outcome| {
                sink.lock().unwrap().push(outcome);
            })
            .unwrap();
        assert_eq!(sync, Reply::integer(1));
        assert!(seen.lock().unwrap().is_empty());

        // The write is visible before the continuation runs
        assert_eq!(client.call("hget", &args!["h", "f"]).unwrap(), Reply::bulk("1"));

        assert_eq!(client.run_pending(), 1);
        assert_eq!(*seen.lock().unwrap(), vec![Ok(Reply::integer(1))]);
    }

    #[test]
    fn test_errors_delivered_both_ways() {
        let mut client = Client::default();
        client.call("set", &args!["s", "v"]).unwrap();

        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let sync = client.call_with("lpush", &args!["s", "x"], move |outcome| {
            *sink.lock().unwrap() = Some(outcome);
        });
        assert_eq!(sync, Err(CacheError::WrongType));

        client.run_pending();
        assert_eq!(*seen.lock().unwrap(), Some(Err(CacheError::WrongType)));
    }
}
