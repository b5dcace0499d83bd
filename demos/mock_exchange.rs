/// Mock exchange for local runs of the client
///
/// Serves `count` generated trades. A stream-all request gets every record
/// except a random subset, then the server closes. A resend request gets the
/// single requested record.
///
///   cargo run --example mock_exchange -- --port 3000 --count 14 --drop-rate 0.2

use std::collections::HashSet;
use std::sync::Arc;

use clap::Parser;
use rand::Rng;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};
use trade_feed_client::{encode_record, CallType, RequestFrame, Side, TradeRecord};

const SYMBOLS: [&str; 5] = ["AAPL", "AMZN", "MSFT", "META", "GE"];

#[derive(Parser, Debug)]
#[command(name = "mock-exchange")]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Number of records to serve (resend only reaches 1..=255)
    #[arg(short, long, default_value_t = 14)]
    count: i32,

    /// Fraction of records left out of every stream-all reply
    #[arg(long, default_value_t = 0.2)]
    drop_rate: f64,
}

fn generate(count: i32) -> Vec<TradeRecord> {
    let mut rng = rand::thread_rng();
    (1..=count)
        .map(|sequence| TradeRecord {
            symbol: SYMBOLS[rng.gen_range(0..SYMBOLS.len())].to_string(),
            side: if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell },
            quantity: rng.gen_range(1..500),
            price: rng.gen_range(50..200),
            sequence,
        })
        .collect()
}

async fn handle(mut socket: TcpStream, records: Arc<Vec<TradeRecord>>, drop_rate: f64) -> std::io::Result<()> {
    let mut request = [0u8; 2];
    socket.read_exact(&mut request).await?;
    let Some(frame) = RequestFrame::decode(&request) else {
        warn!(?request, "unknown request");
        return Ok(());
    };

    match frame.call_type {
        CallType::StreamAll => {
            let dropped: HashSet<i32> = {
                let mut rng = rand::thread_rng();
                records
                    .iter()
                    .filter(|_| rng.gen_bool(drop_rate))
                    .map(|r| r.sequence)
                    .collect()
            };
            info!(dropped = ?dropped, "streaming all records");
            for record in records.iter().filter(|r| !dropped.contains(&r.sequence)) {
                let bytes = encode_record(record)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                socket.write_all(&bytes).await?;
            }
        }
        CallType::Resend => {
            let sequence = i32::from(frame.param);
            info!(sequence, "resend");
            if let Some(record) = records.iter().find(|r| r.sequence == sequence) {
                let bytes = encode_record(record)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                socket.write_all(&bytes).await?;
            }
            let mut sink = [0u8; 16];
            let _ = socket.read(&mut sink).await;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let args = Args::parse();
    let records = Arc::new(generate(args.count));
    let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
    info!(addr = %listener.local_addr()?, count = args.count, "mock exchange listening");

    loop {
        let (socket, peer) = listener.accept().await?;
        let records = records.clone();
        let drop_rate = args.drop_rate.clamp(0.0, 1.0);
        tokio::spawn(async move {
            if let Err(e) = handle(socket, records, drop_rate).await {
                warn!(%peer, error = %e, "connection failed");
            }
        });
    }
}
