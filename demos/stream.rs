//! Stream consumer - example of opening an envelope stream.
//!
//! This example demonstrates:
//! - Registering callback slots with `StreamCallbacks`
//! - Opening a stream with `Client::open_stream`
//! - Interrupting it from another task with an `InterruptHandle`
//!
//! Point it at a producer endpoint:
//!
//! ```text
//! cargo run --example stream -- https://producer.example/api
//! ```

use std::time::Duration;

use eventwire_client::{Client, StreamCallbacks, StreamRequest};

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

    let client = Client::builder(base_url).build();

    let callbacks = StreamCallbacks::new()
        .on_message_started(|update| println!("message started: {}", update.message_id))
        .on_chunk(|text| print!("{text}"))
        .on_response_started(|update| println!("response started {}", update.rendered))
        .on_confidence_changed(|value| println!("confidence changed: {value}"))
        .on_completed(|_| println!("\n[completed]"))
        .on_error(|message| eprintln!("\n[stream error] {message}"));

    let request = StreamRequest::new("Tell me about tide pools")
        .with_state(serde_json::json!({ "session": "demo" }));

    let handle = client.open_stream(&request, callbacks).await?;

    // Interrupt after ten seconds if the producer is still going.
    let interruptor = handle.interrupt_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(10)).await;
        interruptor.abort();
    });

    let outcome = handle.join().await;
    println!("stream finished: {outcome:?}");

    Ok(())
}
