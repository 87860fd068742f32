//! radgate test harness
//!
//! `endpoint` plays the upstream authority: it counts every datagram it
//! receives, writes the running total to a file and optionally answers.
//! `send` plays a NAS: it sends Access-Request (or Accounting-Request)
//! packets for a list of `user/station` pairs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use radgate_protocol::{AttributeType, Code, Packet};
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "radgate-harness")]
#[command(about = "Fake upstream endpoint and packet sender for radgate")]
struct Args {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Count datagrams as a fake upstream server
    Endpoint {
        /// Bind address
        #[arg(long, default_value = "0.0.0.0:1814")]
        bind: String,

        /// File receiving `count:<n>` after every datagram
        #[arg(long, default_value = "./bin/count")]
        count_file: PathBuf,

        /// Echo each datagram back to its sender
        #[arg(long)]
        echo: bool,
    },

    /// Send test packets to a relay
    Send {
        /// Relay address
        #[arg(long, default_value = "127.0.0.1:1812")]
        target: String,

        /// Shared secret
        #[arg(long, default_value = "secret")]
        secret: String,

        /// Send Accounting-Request packets
        #[arg(long)]
        accounting: bool,

        /// Delay between packets in milliseconds
        #[arg(long, default_value = "1000")]
        delay_ms: u64,

        /// `user/station` pairs to send
        #[arg(default_values_t = [
            "test/11-22-33-44-55-66".to_string(),
            "test/11-22-33-44-55-67".to_string(),
            "test/11-22-33-44-55-66".to_string(),
        ])]
        pairs: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Args::parse().mode {
        Mode::Endpoint {
            bind,
            count_file,
            echo,
        } => run_endpoint(&bind, count_file, echo).await,
        Mode::Send {
            target,
            secret,
            accounting,
            delay_ms,
            pairs,
        } => {
            let code = if accounting {
                Code::AccountingRequest
            } else {
                Code::AccessRequest
            };
            run_sender(&target, &secret, code, Duration::from_millis(delay_ms), &pairs).await
        }
    }
}

async fn run_endpoint(bind: &str, count_file: PathBuf, echo: bool) -> Result<()> {
    let socket = UdpSocket::bind(bind)
        .await
        .with_context(|| format!("unable to bind {bind}"))?;
    info!("Endpoint listening on {}", socket.local_addr()?);
    if let Some(parent) = count_file.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut buf = vec![0u8; 4096];
    let mut count: u64 = 0;
    loop {
        let (len, from) = match socket.recv_from(&mut buf).await {
            Ok(read) => read,
            Err(e) => {
                warn!("Read error: {}", e);
                continue;
            }
        };
        count += 1;
        info!(from = %from, bytes = len, count, "Received datagram");
        if let Err(e) = tokio::fs::write(&count_file, format!("count:{count}")).await {
            warn!("Unable to write {}: {}", count_file.display(), e);
        }
        if echo {
            if let Err(e) = socket.send_to(&buf[..len], from).await {
                warn!("Echo failed: {}", e);
            }
        }
    }
}

async fn run_sender(
    target: &str,
    secret: &str,
    code: Code,
    delay: Duration,
    pairs: &[String],
) -> Result<()> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket
        .connect(target)
        .await
        .with_context(|| format!("unable to dial {target}"))?;

    for (id, pair) in pairs.iter().enumerate() {
        let (user, station) = pair
            .split_once('/')
            .with_context(|| format!("expected user/station, got {pair:?}"))?;
        tokio::time::sleep(delay).await;

        let mut packet = Packet::new(code, id as u8, secret.to_string());
        packet.add(AttributeType::UserName, user.to_string())?;
        packet.add(AttributeType::CallingStationId, station.to_string())?;
        let bytes = packet.encode()?;
        socket.send(&bytes).await?;
        info!(user, station, code = ?code, "Sent packet");
    }
    Ok(())
}
