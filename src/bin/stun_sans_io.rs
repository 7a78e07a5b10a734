use std::io::ErrorKind;
use std::net::UdpSocket;
use std::time::{Duration, Instant};
use stun_public_addr::{Config, Event, StunBinding};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let server = config.resolve_server()?;

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    let mut binding = StunBinding::new(server, Instant::now())
        .with_timeout(config.timeout)
        .with_max_attempts(config.max_attempts);

    let address = loop {
        if let Some(transmit) = binding.poll_transmit() {
            socket.send_to(&transmit.payload, transmit.dst)?;
            continue;
        }

        match binding.poll_event() {
            Some(Event::Resolved(address)) => break address,
            Some(Event::Failed(e)) => return Err(e.into()),
            None => {}
        }

        let Some(deadline) = binding.poll_timeout() else {
            anyhow::bail!("Binding finished without a result");
        };
        let now = Instant::now();
        if deadline <= now {
            binding.handle_timeout(now);
            continue;
        }

        // A zero read timeout is rejected by the OS.
        socket.set_read_timeout(Some((deadline - now).max(Duration::from_millis(1))))?;

        let mut buf = vec![0u8; 1500];
        match socket.recv_from(&mut buf) {
            Ok((num_read, from)) => binding.handle_input(from, &buf[..num_read]),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                binding.handle_timeout(Instant::now());
            }
            Err(e) => return Err(e.into()),
        }
    };

    println!("Public IP: {}", address.ip());
    println!("Public Port: {}", address.port());

    Ok(())
}
