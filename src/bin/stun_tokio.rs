use anyhow::Context;
use stun_public_addr::{make_binding_request, Config, Error};
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
    tracing::debug!(max_attempts = config.max_attempts, "One-shot client, sending a single request");

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(server).await?;

    let request = make_binding_request();
    tracing::debug!(%server, transaction_id = %request.transaction_id(), "Sending binding request");
    socket.send(&request.to_bytes()).await?;

    let mut buf = vec![0u8; 1500];
    let num_read = tokio::time::timeout(config.timeout, socket.recv(&mut buf))
        .await
        .map_err(|_| Error::TimedOut { attempts: 1 })??;
    let address = request
        .parse_response(&buf[..num_read])
        .with_context(|| format!("Bad response from {server}"))?;

    println!("Public IP: {}", address.ip());
    println!("Public Port: {}", address.port());

    Ok(())
}
