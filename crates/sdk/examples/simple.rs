//! Simple SDK Example
//!
//! Installs an administrator, creates a queue user, then posts to and
//! truncates that user's queue.
//!
//! # Usage
//!
//! 1. Start the daemon on a fresh database:
//!    ```bash
//!    QND_DB_PATH=/tmp/qnd-demo.db cargo run --package qnd-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --package qnd-sdk --example simple
//!    ```

use qnd_sdk::{AdminClient, Auth, QndClient};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("qnd SDK - Simple Example");
    println!("========================\n");

    // 1. Bootstrap the management surface
    println!("1. Installing administrator...");
    let admin = AdminClient::connect("http://127.0.0.1:8888")
        .await?
        .with_auth(Auth::password("root", "root-secret"));
    match admin.install("root", "root-secret").await {
        Ok(installed) => println!("   ✓ Administrator {} (id {})\n", installed.username, installed.id),
        Err(e) => println!("   ⚠ Skipped: {}\n", e),
    }

    // 2. Create a queue user
    println!("2. Creating user alice on queue orders...");
    match admin.create_user("alice", "alice-secret", "orders").await {
        Ok(user) => println!("   ✓ User {} bound to {}\n", user.username, user.queue),
        Err(e) => println!("   ⚠ Skipped: {}\n", e),
    }

    // 3. Exchange the password for a token
    println!("3. Requesting a token...");
    let issued = QndClient::connect("http://127.0.0.1:8080")
        .await?
        .with_auth(Auth::password("alice", "alice-secret"))
        .token()
        .await?;
    println!("   ✓ Token valid for {} seconds\n", issued.duration);

    let client = QndClient::connect("http://127.0.0.1:8080")
        .await?
        .with_auth(Auth::token(issued.token));

    // 4. Post a few messages
    println!("4. Posting messages...");
    client.post("orders", "plain text").await?;
    client.post("orders", json!({"sku": 42, "qty": 3})).await?;
    let last = client.post("orders", "latest").await?;
    println!("   ✓ Last message id {}\n", last.id);

    // 5. List, truncate, list again
    println!("5. Listing queue...");
    for message in client.list("orders").await?.messages {
        println!("     | {} {} {}", message.id, message.author, message.content);
    }

    let truncated = client.truncate("orders").await?;
    println!(
        "\n   ✓ Truncated: kept {:?}, removed {}",
        truncated.kept, truncated.removed
    );
    println!(
        "   ✓ {} message(s) left",
        client.list("orders").await?.messages.len()
    );

    println!("\n✓ Example completed successfully!");

    Ok(())
}
