// In demos/receiver.rs
use dmxp_broadcast::Broadcast::ChannelBuilder;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn main() -> std::io::Result<()> {
    println!("Receiver: Attaching to broadcast region...");

    let region = match ChannelBuilder::new().attach() {
        Ok(region) => region,
        Err(e) => {
            eprintln!("Failed to attach receiver: {}", e);
            return Ok(());
        }
    };
    let mut receiver = region.receiver();

    let running = Arc::new(AtomicBool::new(true));
    let running_for_handler = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_for_handler.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    println!("\n{:<10} {}", "Msg #", "Hash");
    println!("{}", "=".repeat(80));

    let start = std::time::Instant::now();
    let mut received = 0usize;
    let mut mismatched = 0usize;
    while running.load(Ordering::SeqCst) {
        received += receiver.receive_timeout(
            |_msg_type_id, buffer, offset, length| {
                let message = String::from_utf8_lossy(&buffer[offset..offset + length]);
                // Parse "message_number:hash" format
                match message.split_once(':') {
                    Some((num_str, hash)) => {
                        let expected = Sha256::digest(format!("message_{}", num_str).as_bytes());
                        if format!("{:x}", expected) != hash {
                            mismatched += 1;
                        }
                        println!("{:<10} {}", num_str, hash);
                    }
                    None => println!("Invalid format: {}", message),
                }
            },
            Duration::from_millis(100),
        );
    }

    let elapsed = start.elapsed();
    println!("\n{}", "=".repeat(80));
    println!("Receiver: Received {} messages in {:.2?}", received, elapsed);
    println!(
        "Receiver: lapped {} times, dropped {} records, {} digest mismatches",
        receiver.lapped_count(),
        receiver.dropped_count(),
        mismatched
    );
    Ok(())
}
