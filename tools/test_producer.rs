//! Test Transaction Producer
//!
//! Generates and publishes test transaction requests to NATS for pipeline
//! testing. Suspicious traffic uses fresh sender ids, extreme amounts, and
//! night-time timestamps so the pipeline has something to flag.

use chrono::{TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Request structure matching the pipeline's expected intake format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TransactionRequest {
    sender_id: String,
    sender_name: String,
    receiver_name: String,
    amount: f64,
    message: Option<String>,
    created_at: Option<chrono::DateTime<Utc>>,
}

/// Request generator for testing
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
    request_counter: u64,
}

const SENDER_NAMES: [&str; 6] = ["Alice", "Bob", "Carol", "Dave", "Erin", "Frank"];

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            request_counter: 0,
        }
    }

    /// Generate a request from an established sender at a normal hour
    fn generate_legitimate(&mut self) -> TransactionRequest {
        self.request_counter += 1;
        // Small pool of recurring senders so histories accumulate.
        let sender = self.rng.gen_range(0..SENDER_NAMES.len());

        TransactionRequest {
            sender_id: format!("acct_{:04}", sender),
            sender_name: SENDER_NAMES[sender].to_string(),
            receiver_name: SENDER_NAMES[self.rng.gen_range(0..SENDER_NAMES.len())].to_string(),
            amount: self.rng.gen_range(20.0..200.0),
            message: None,
            created_at: None,
        }
    }

    /// Generate a suspicious request: new sender, large amount, night time
    fn generate_suspicious(&mut self) -> TransactionRequest {
        self.request_counter += 1;
        let now = Utc::now();
        let night = Utc
            .with_ymd_and_hms(
                now.format("%Y").to_string().parse().unwrap_or(2025),
                now.format("%m").to_string().parse().unwrap_or(1),
                now.format("%d").to_string().parse().unwrap_or(1),
                self.rng.gen_range(0..6),
                self.rng.gen_range(0..60),
                0,
            )
            .single()
            .unwrap_or(now);

        TransactionRequest {
            sender_id: format!("acct_new_{:08x}", self.rng.gen::<u32>()),
            sender_name: "Unknown".to_string(),
            receiver_name: SENDER_NAMES[self.rng.gen_range(0..SENDER_NAMES.len())].to_string(),
            amount: self.rng.gen_range(500.0..2000.0),
            message: None,
            created_at: Some(night),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Transaction Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("nats://localhost:4222");
    let subject = args
        .get(2)
        .map(|s| s.as_str())
        .unwrap_or("transactions.submitted");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate, delay_ms).await;
        }
    };

    // Generate and publish requests
    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} transaction requests...", count);

    let mut legitimate_count = 0;
    let mut suspicious_count = 0;

    for i in 0..count {
        let request = if rng.gen_bool(fraud_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            legitimate_count += 1;
            generator.generate_legitimate()
        };

        let payload = serde_json::to_vec(&request)?;
        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} requests ({} legitimate, {} suspicious)",
                i + 1,
                count,
                legitimate_count,
                suspicious_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Published {} requests ({} legitimate, {} suspicious)",
        count, legitimate_count, suspicious_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, fraud_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let request = if rng.gen_bool(fraud_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };

        let json = serde_json::to_string_pretty(&request)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
