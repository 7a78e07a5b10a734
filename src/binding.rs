use std::collections::VecDeque;
use std::net::{SocketAddr, SocketAddrV4};
use std::time::{Duration, Instant};

use crate::{make_binding_request, BindingRequest, Error, ParseError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Sans-IO Binding transaction against a single STUN server.
///
/// The caller owns the socket and the clock: it drains [`StunBinding::poll_transmit`],
/// feeds datagrams to [`StunBinding::handle_input`] and calls
/// [`StunBinding::handle_timeout`] once [`StunBinding::poll_timeout`] has passed.
pub struct StunBinding {
    server: SocketAddr,
    timeout: Duration,
    max_attempts: u32,
    state: State,
    buffered_transmits: VecDeque<Transmit>,
    pending_events: VecDeque<Event>,
}

#[derive(Debug)]
pub enum Event {
    Resolved(SocketAddrV4),
    Failed(Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmit {
    pub dst: SocketAddr,
    pub payload: Vec<u8>,
}

enum State {
    Sent {
        request: BindingRequest,
        sent_at: Instant,
        attempt: u32,
    },
    Received {
        address: SocketAddrV4,
    },
    Failed,
}

impl StunBinding {
    pub fn new(server: SocketAddr, now: Instant) -> Self {
        let request = make_binding_request();
        tracing::debug!(%server, transaction_id = %request.transaction_id(), "Sending binding request");

        Self {
            server,
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            state: State::Sent {
                request,
                sent_at: now,
                attempt: 1,
            },
            buffered_transmits: VecDeque::from([Transmit {
                dst: server,
                payload: request.to_bytes().to_vec(),
            }]),
            pending_events: VecDeque::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn handle_input(&mut self, from: SocketAddr, packet: &[u8]) {
        let State::Sent { request, .. } = self.state else {
            tracing::debug!(%from, "No binding request outstanding, dropping packet");
            return;
        };

        if from != self.server {
            tracing::debug!(%from, server = %self.server, "Dropping packet from unknown peer");
            return;
        }

        match request.parse_response(packet) {
            Ok(address) => {
                tracing::info!(%address, "Resolved public address");

                self.state = State::Received { address };
                self.pending_events.push_back(Event::Resolved(address));
            }
            Err(ParseError::TransactionMismatch) => {
                tracing::warn!(
                    transaction_id = %request.transaction_id(),
                    "Ignoring response for another transaction"
                );
            }
            Err(e) => {
                tracing::warn!("Invalid binding response: {e}");

                self.state = State::Failed;
                self.pending_events.push_back(Event::Failed(Error::Parse(e)));
            }
        }
    }

    pub fn poll_transmit(&mut self) -> Option<Transmit> {
        self.buffered_transmits.pop_front()
    }

    pub fn poll_event(&mut self) -> Option<Event> {
        self.pending_events.pop_front()
    }

    /// Notifies `StunBinding` that time has advanced to `now`.
    pub fn handle_timeout(&mut self, now: Instant) {
        let State::Sent {
            sent_at, attempt, ..
        } = self.state
        else {
            return;
        };

        if now < sent_at + self.timeout {
            return;
        }

        if attempt >= self.max_attempts {
            tracing::warn!(server = %self.server, attempts = attempt, "Binding request timed out");

            self.state = State::Failed;
            self.pending_events
                .push_back(Event::Failed(Error::TimedOut { attempts: attempt }));
            return;
        }

        let request = make_binding_request();
        tracing::debug!(
            attempt = attempt + 1,
            transaction_id = %request.transaction_id(),
            "Retrying binding request"
        );

        self.buffered_transmits.push_back(Transmit {
            dst: self.server,
            payload: request.to_bytes().to_vec(),
        });
        self.state = State::Sent {
            request,
            sent_at: now,
            attempt: attempt + 1,
        };
    }

    /// Returns the timestamp when we next expect `handle_timeout` to be called.
    pub fn poll_timeout(&self) -> Option<Instant> {
        match self.state {
            State::Sent { sent_at, .. } => Some(sent_at + self.timeout),
            State::Received { .. } | State::Failed => None,
        }
    }

    pub fn public_address(&self) -> Option<SocketAddrV4> {
        match self.state {
            State::Received { address } => Some(address),
            State::Sent { .. } | State::Failed => None,
        }
    }
}
