//! qnd CLI - Command-line interface for the qnd message queue

mod rpc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rpc::{authed, call, Credentials};
use serde::Deserialize;
use serde_json::{json, Value};
use tabled::{Table, Tabled};

const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_ADMIN_URL: &str = "http://127.0.0.1:8888";

#[derive(Parser)]
#[command(name = "qnd")]
#[command(about = "qnd message queue CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data plane URL
    #[arg(long, env = "QND_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Management URL
    #[arg(long, env = "QND_ADMIN_URL", default_value = DEFAULT_ADMIN_URL)]
    admin_url: String,

    /// Username for password authentication
    #[arg(short, long, env = "QND_USERNAME")]
    username: Option<String>,

    /// Password for password authentication
    #[arg(short, long, env = "QND_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Token from `qnd token` (takes precedence over username/password)
    #[arg(long, env = "QND_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Get a short-lived token for the configured credentials
    Token,

    /// Append a message to your queue
    Post {
        queue: String,
        /// Message content (stored verbatim unless --json)
        content: String,
        /// Parse content as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the messages of your queue, oldest first
    List { queue: String },

    /// Delete one message by id
    Delete { id: i64 },

    /// Remove every message of your queue
    Clear { queue: String },

    /// Keep only the newest message of your queue
    Truncate { queue: String },

    /// Create the first administrator (empty installation only)
    Install {
        #[arg(long)]
        admin_username: String,
        #[arg(long)]
        admin_password: String,
    },

    /// List usernames
    Users,

    /// Show one user by id
    User { id: i64 },

    /// Create a user ("" queue creates an administrator)
    CreateUser {
        username: String,
        #[arg(long)]
        new_password: String,
        #[arg(short, long, default_value = "")]
        queue: String,
    },

    /// Rename, rebind or change the password of a user
    UpdateUser {
        username: String,
        #[arg(long)]
        new_username: Option<String>,
        #[arg(long)]
        new_password: Option<String>,
        #[arg(short, long)]
        queue: Option<String>,
    },

    /// Delete a user
    DeleteUser { username: String },

    /// Show queues, owners and message counts
    Queues,
}

#[derive(Deserialize, Tabled)]
struct MessageRow {
    id: i64,
    author: String,
    #[tabled(display_with = "display_millis")]
    created_at: i64,
    content: String,
}

#[derive(Deserialize)]
struct ListResult {
    queue: String,
    messages: Vec<MessageRow>,
}

#[derive(Deserialize, Tabled)]
struct UserRow {
    id: i64,
    username: String,
    queue: String,
    admin: bool,
}

#[derive(Deserialize, Tabled)]
struct QueueRow {
    queue: String,
    owner: String,
    messages: i64,
}

#[derive(Deserialize)]
struct QueuesResult {
    administrators: Vec<String>,
    queues: Vec<QueueRow>,
    orphaned: Vec<OrphanRow>,
}

#[derive(Deserialize, Tabled)]
struct OrphanRow {
    queue: String,
    messages: i64,
}

fn display_millis(ms: &i64) -> String {
    chrono::DateTime::from_timestamp_millis(*ms)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn print_user(user: UserRow) {
    println!("{}", Table::new(vec![user]));
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let creds = Credentials {
        token: cli.token.clone(),
        username: cli.username.clone(),
        password: cli.password.clone(),
    };
    let api = cli.api_url.as_str();
    let admin = cli.admin_url.as_str();

    match cli.command {
        Commands::Token => {
            let result = call(api, "api.token.v1", authed(&creds, Value::Null)?).await?;
            let token = result["token"].as_str().unwrap_or_default();
            eprintln!(
                "{}",
                format!("✓ Token valid for {} seconds", result["duration"])
                    .green()
                    .bold()
            );
            println!("{}", token);
        }

        Commands::Post {
            queue,
            content,
            json: as_json,
        } => {
            let content: Value = if as_json {
                serde_json::from_str(&content).context("Invalid JSON content")?
            } else {
                Value::String(content)
            };
            let params = authed(&creds, json!({ "queue": queue, "content": content }))?;
            let result = call(api, "queue.post.v1", params).await?;

            println!(
                "{}",
                format!("✓ Message {} posted to {}", result["id"], queue)
                    .green()
                    .bold()
            );
        }

        Commands::List { queue } => {
            let params = authed(&creds, json!({ "queue": queue }))?;
            let result: ListResult =
                serde_json::from_value(call(api, "queue.list.v1", params).await?)?;

            if result.messages.is_empty() {
                println!("{}", format!("Queue {} is empty", result.queue).yellow());
            } else {
                println!(
                    "{}",
                    format!("{} ({} messages)", result.queue, result.messages.len())
                        .cyan()
                        .bold()
                );
                println!("{}", Table::new(result.messages));
            }
        }

        Commands::Delete { id } => {
            let params = authed(&creds, json!({ "id": id }))?;
            let result = call(api, "message.delete.v1", params).await?;

            if result["deleted"].as_bool().unwrap_or(false) {
                println!("{}", format!("✓ Message {} deleted", id).green().bold());
            } else {
                println!("{}", format!("○ Message {} not found", id).yellow());
            }
        }

        Commands::Clear { queue } => {
            let params = authed(&creds, json!({ "queue": queue }))?;
            let result = call(api, "queue.clear.v1", params).await?;

            println!(
                "{}",
                format!("✓ {} messages removed from {}", result["removed"], queue)
                    .green()
                    .bold()
            );
        }

        Commands::Truncate { queue } => {
            let params = authed(&creds, json!({ "queue": queue }))?;
            let result = call(api, "queue.truncate.v1", params).await?;

            match result["kept"].as_i64() {
                Some(kept) => println!(
                    "{}",
                    format!(
                        "✓ Kept message {}, removed {} from {}",
                        kept, result["removed"], queue
                    )
                    .green()
                    .bold()
                ),
                None => println!("{}", format!("Queue {} is empty", queue).yellow()),
            }
        }

        Commands::Install {
            admin_username,
            admin_password,
        } => {
            let params = json!({ "username": admin_username, "password": admin_password });
            let result = call(admin, "admin.install.v1", params).await?;

            println!(
                "{}",
                format!(
                    "✓ Administrator {} created (id {})",
                    admin_username, result["id"]
                )
                .green()
                .bold()
            );
        }

        Commands::Users => {
            let result = call(admin, "admin.users.list.v1", authed(&creds, Value::Null)?).await?;
            let usernames: Vec<String> = serde_json::from_value(result["usernames"].clone())?;

            println!("{}", "Users".cyan().bold());
            for username in usernames {
                println!("  {} {}", "•".bold(), username);
            }
        }

        Commands::User { id } => {
            let params = authed(&creds, json!({ "id": id }))?;
            let user: UserRow =
                serde_json::from_value(call(admin, "admin.users.get.v1", params).await?)?;
            print_user(user);
        }

        Commands::CreateUser {
            username,
            new_password,
            queue,
        } => {
            let params = authed(
                &creds,
                json!({ "username": username, "password": new_password, "queue": queue }),
            )?;
            let user: UserRow =
                serde_json::from_value(call(admin, "admin.users.create.v1", params).await?)?;

            println!("{}", "✓ User created".green().bold());
            print_user(user);
        }

        Commands::UpdateUser {
            username,
            new_username,
            new_password,
            queue,
        } => {
            let mut fields = json!({ "username": username });
            if let Some(new_username) = new_username {
                fields["new_username"] = json!(new_username);
            }
            if let Some(password) = new_password {
                fields["password"] = json!(password);
            }
            if let Some(queue) = queue {
                fields["queue"] = json!(queue);
            }
            let user: UserRow = serde_json::from_value(
                call(admin, "admin.users.update.v1", authed(&creds, fields)?).await?,
            )?;

            println!("{}", "✓ User updated".green().bold());
            print_user(user);
        }

        Commands::DeleteUser { username } => {
            let params = authed(&creds, json!({ "username": username }))?;
            let result = call(admin, "admin.users.delete.v1", params).await?;

            if result["deleted"].as_bool().unwrap_or(false) {
                println!("{}", format!("✓ User {} deleted", username).green().bold());
            } else {
                println!("{}", format!("○ User {} not found", username).yellow());
            }
        }

        Commands::Queues => {
            let result: QueuesResult = serde_json::from_value(
                call(admin, "admin.queues.v1", authed(&creds, Value::Null)?).await?,
            )?;

            println!("{}", "Administrators".cyan().bold());
            for name in &result.administrators {
                println!("  {} {}", "•".bold(), name);
            }
            println!();

            println!("{}", "Queues".cyan().bold());
            if result.queues.is_empty() {
                println!("  {}", "none".yellow());
            } else {
                println!("{}", Table::new(result.queues));
            }

            if !result.orphaned.is_empty() {
                println!();
                println!("{}", "Orphaned queues".yellow().bold());
                println!("{}", Table::new(result.orphaned));
            }
        }
    }

    Ok(())
}
