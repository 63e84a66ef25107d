use anyhow::{Context, Result};
use memcache_rs::{Arg, Client, EngineConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

/// Split a command line into arguments; double quotes group words
fn tokenize(line: &str) -> Vec<Arg> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    args.push(Arg::from(std::mem::take(&mut current)));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        args.push(Arg::from(current));
    }
    args
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (WARN by default, RUST_LOG overrides)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path)?,
        None => EngineConfig::default(),
    };

    info!("memcache-rs starting with {} databases...", config.databases);

    let mut client = Client::new(&config);
    let mut events = client.subscribe();
    let watcher = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            debug!("Client event: {:?}", event);
        }
    });

    client.create_client();
    client.run_pending();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while client.is_connected() {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            client.quit();
            break;
        };

        let mut args = tokenize(&line);
        if args.is_empty() {
            continue;
        }
        let name = args.remove(0);
        let name = name
            .as_bytes()
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default();

        let output = match client.call(&name, &args) {
            Ok(reply) => format!("{}\n", reply),
            Err(e) => format!("(error) {}\n", e),
        };
        stdout.write_all(output.as_bytes()).await?;
        client.run_pending();
    }

    client.run_pending();
    drop(client);
    watcher.await.ok();

    info!("memcache-rs stopped");
    Ok(())
}
