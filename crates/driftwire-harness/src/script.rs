//! Scripted inbound delivery.
//!
//! A [`Script`] models the transport delivery context: a sequence of
//! inbound frames (and at most one closure) replayed to a client from a
//! spawned thread, strictly in order, while the test's caller thread
//! blocks inside `call` / `subscribe`. Delivery steps can synchronize on
//! outbound traffic via [`Script::await_sent`] so scripts stay
//! deterministic under scheduler noise.

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use driftwire_client::{Client, Transport};

use crate::sim_transport::SimTransport;

/// Upper bound on one `await_sent` poll before the script gives up and
/// stops, leaving the test to fail on its own assertions.
const AWAIT_SENT_BAIL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
enum Step {
    Deliver(String),
    Pause(Duration),
    AwaitSent { transport: SimTransport, count: usize },
    Close,
}

/// Builder for a scripted delivery sequence.
#[derive(Debug, Clone, Default)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    /// Start an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one inbound frame of wire text.
    #[must_use]
    pub fn deliver(mut self, text: impl Into<String>) -> Self {
        self.steps.push(Step::Deliver(text.into()));
        self
    }

    /// Sleep before the next step.
    #[must_use]
    pub fn pause(mut self, duration: Duration) -> Self {
        self.steps.push(Step::Pause(duration));
        self
    }

    /// Block until `transport` has sent at least `count` frames. Keeps
    /// reply deliveries ordered after the request they answer.
    #[must_use]
    pub fn await_sent(mut self, transport: &SimTransport, count: usize) -> Self {
        self.steps.push(Step::AwaitSent { transport: transport.clone(), count });
        self
    }

    /// Close the transport.
    #[must_use]
    pub fn close(mut self) -> Self {
        self.steps.push(Step::Close);
        self
    }

    /// Replay the script against `client` on a spawned delivery thread.
    ///
    /// Join the returned handle after the blocking call under test has
    /// returned.
    pub fn spawn<T>(self, client: Arc<Client<T>>) -> thread::JoinHandle<()>
    where
        T: Transport + 'static,
    {
        thread::spawn(move || {
            for step in self.steps {
                match step {
                    Step::Deliver(text) => client.handle_message(&text),
                    Step::Pause(duration) => thread::sleep(duration),
                    Step::AwaitSent { transport, count } => {
                        let deadline = Instant::now() + AWAIT_SENT_BAIL;
                        while transport.sent_count() < count {
                            if Instant::now() > deadline {
                                return;
                            }
                            thread::sleep(Duration::from_millis(1));
                        }
                    },
                    Step::Close => client.handle_close(),
                }
            }
        })
    }
}
