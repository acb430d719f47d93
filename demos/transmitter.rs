// In demos/transmitter.rs
use dmxp_broadcast::Broadcast::ChannelBuilder;
use sha2::{Digest, Sha256};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const STATUS_MSG_TYPE_ID: i32 = 1;

fn main() -> std::io::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <num_messages> [interval_ms]", args[0]);
        std::process::exit(1);
    }

    let num_messages: usize = args[1].parse().expect("Invalid number of messages");
    let interval = Duration::from_millis(args.get(2).and_then(|s| s.parse().ok()).unwrap_or(1));

    let region = ChannelBuilder::new().build_shared()?;
    let mut transmitter = region.transmitter()?;
    println!(
        "Transmitter: Created broadcast region ({} byte capacity)",
        region.capacity()
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_for_handler = Arc::clone(&running);

    // Handle Ctrl+C to stop publishing
    ctrlc::set_handler(move || {
        running_for_handler.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let start = std::time::Instant::now();
    let mut sent = 0;
    for i in 0..num_messages {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        // Format: "message_number:sha256(message_number)"
        let digest = Sha256::digest(format!("message_{}", i).as_bytes());
        let message = format!("{}:{:x}", i, digest);

        if let Err(e) = transmitter.transmit(STATUS_MSG_TYPE_ID, message.as_bytes()) {
            eprintln!("Failed to transmit message {}: {}", i, e);
            break;
        }
        sent += 1;
        if sent % 100 == 0 {
            println!("Sent {} messages", sent);
        }
        std::thread::sleep(interval);
    }

    let elapsed = start.elapsed();
    println!("Transmitter: Sent {} messages in {:.2?}", sent, elapsed);
    println!("Transmitter: Shutting down");
    Ok(())
}
