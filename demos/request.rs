//! Single-shot request - example of the resilient non-streaming path.
//!
//! This example demonstrates:
//! - Configuring the retry schedule with `RetryConfig`
//! - Issuing a JSON call through `Client::request`, which applies the
//!   timeout race and exponential backoff with jitter
//!
//! ```text
//! cargo run --example request -- https://producer.example/api
//! ```

use std::time::Duration;

use eventwire_client::{Client, EventwireError, RetryConfig};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct AnalysisSummary {
    summary: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventwire_client=debug".into()),
        )
        .init();

    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:8787/api".to_string());

    let client = Client::builder(base_url)
        .retry(RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter_fraction: 0.25,
        })
        .request_timeout(Duration::from_secs(10))
        .build();

    let body = serde_json::json!({ "input": "How was the last session?" });

    match client.request::<_, AnalysisSummary>("analyze", &body).await {
        Ok(analysis) => println!("analysis: {}", analysis.summary),
        Err(EventwireError::RetriesExhausted { attempts, last }) => {
            eprintln!("gave up after {attempts} attempts: {last}")
        }
        Err(error) => eprintln!("request failed: {error}"),
    }

    Ok(())
}
