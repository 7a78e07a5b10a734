use futures::{Future, FutureExt};
use std::{
    pin::Pin,
    task::{ready, Poll, Waker},
    time::Instant,
};
use stun_public_addr::{Config, Event, StunBinding};
use tokio::net::UdpSocket;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let server = config.resolve_server()?;

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    let mut binding = StunBinding::new(server, Instant::now())
        .with_timeout(config.timeout)
        .with_max_attempts(config.max_attempts);
    let mut timer = Timer::default();

    let address = loop {
        if let Some(transmit) = binding.poll_transmit() {
            socket.send_to(&transmit.payload, transmit.dst).await?;
            continue;
        }

        match binding.poll_event() {
            Some(Event::Resolved(address)) => break address,
            Some(Event::Failed(e)) => return Err(e.into()),
            None => {}
        }

        timer.reset_to(binding.poll_timeout());

        let mut buf = vec![0u8; 1500];

        tokio::select! {
            Some(time) = &mut timer => {
                binding.handle_timeout(time);
            },
            res = socket.recv_from(&mut buf) => {
                let (num_read, from) = res?;
                binding.handle_input(from, &buf[..num_read]);
            }
        }
    };

    println!("Public IP: {}", address.ip());
    println!("Public Port: {}", address.port());

    Ok(())
}

/// Sleeps until the binding's next deadline, if it has one.
#[derive(Default)]
struct Timer {
    inner: Option<Pin<Box<tokio::time::Sleep>>>,
    waker: Option<Waker>,
}

impl Timer {
    fn reset_to(&mut self, next: Option<Instant>) {
        let next = match next {
            Some(next) => next,
            None => {
                self.inner = None;
                return;
            }
        };

        match self.inner.as_mut() {
            Some(timer) => timer.as_mut().reset(next.into()),
            None => {
                self.inner = Some(Box::pin(tokio::time::sleep_until(next.into())));
                if let Some(waker) = self.waker.take() {
                    waker.wake()
                }
            }
        }
    }
}

impl Future for Timer {
    type Output = Option<Instant>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        let mut this = self.as_mut();

        let Some(timer) = this.inner.as_mut() else {
            self.waker = Some(cx.waker().clone());
            return Poll::Pending;
        };

        ready!(timer.as_mut().poll_unpin(cx));

        Poll::Ready(Some(timer.as_ref().deadline().into()))
    }
}
