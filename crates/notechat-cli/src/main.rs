mod console;
mod demo;
mod events;

use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use notechat_realtime::is_mentioned;

use events::{emit, EventMention};

#[derive(Parser)]
#[command(
    name = "notechat",
    about = "Drive the NoteChat realtime layer against an in-memory store"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scripted group-chat scenario and print JSONL events.
    Demo {
        /// Display name of the signed-in user.
        #[arg(short, long, default_value = "Ana")]
        name: String,
        /// Also record messages of groups whose chat is not open.
        #[arg(long)]
        record_unfocused: bool,
        /// Deny alert permission (alerts are dropped).
        #[arg(long)]
        deny_alerts: bool,
        /// Max wait for each scenario step, in ms.
        #[arg(long, default_value = "2000")]
        timeout: u64,
    },

    /// Check whether a message body mentions a user.
    Mention {
        /// Message body.
        #[arg(long)]
        body: String,
        /// Display name to look for.
        #[arg(long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let start = Instant::now();

    eprintln!("notechat v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Demo {
            name,
            record_unfocused,
            deny_alerts,
            timeout,
        } => {
            demo::run(
                demo::DemoConfig {
                    name,
                    record_unfocused,
                    allow_alerts: !deny_alerts,
                    settle_timeout: Duration::from_millis(timeout),
                },
                start,
            )
            .await?;
        }

        Command::Mention { body, name } => {
            emit(&EventMention {
                event: "mention",
                mentioned: is_mentioned(&body, &name),
                name,
            });
        }
    }

    Ok(())
}
