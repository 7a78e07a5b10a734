use anyhow::Context;
use std::io::ErrorKind;
use std::net::UdpSocket;
use stun_public_addr::{make_binding_request, Config, Error};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let server = config.resolve_server()?;
    tracing::debug!(max_attempts = config.max_attempts, "One-shot client, sending a single request");

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect(server)?;
    socket.set_read_timeout(Some(config.timeout))?;

    let request = make_binding_request();
    tracing::debug!(%server, transaction_id = %request.transaction_id(), "Sending binding request");
    socket.send(&request.to_bytes())?;

    let mut buf = vec![0u8; 1500];
    let num_read = socket.recv(&mut buf).map_err(|e| match e.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => Error::TimedOut { attempts: 1 },
        _ => Error::Transport(e),
    })?;
    let address = request
        .parse_response(&buf[..num_read])
        .with_context(|| format!("Bad response from {server}"))?;

    println!("Public IP: {}", address.ip());
    println!("Public Port: {}", address.port());

    Ok(())
}
