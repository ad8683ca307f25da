#![allow(missing_docs)]

//! Chainpipe harness — run one request through the pipe from a terminal the
//! way the host runtime would.
//!
//! Reads a request-body JSON document from a file or stdin, loads valves
//! (env > `chainpipe.toml` > defaults), and prints the resulting payload to
//! stdout. Status events are logged to stderr through `tracing`.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use chainpipe::body::RequestBody;
use chainpipe::config::Valves;
use chainpipe::events::{LogEmitter, NoopEventCall};
use chainpipe::logging;
use chainpipe::pipe::{ChainPipe, PipeFunction};

#[derive(Debug, Parser)]
#[command(
    name = "chainpipe",
    version,
    about = "Run one chat request through the chain pipe"
)]
struct Cli {
    /// Request body JSON file; reads stdin when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Pretty-print the resulting payload.
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();

    let valves = Valves::load().context("failed to load valves")?;

    let raw = match &cli.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read request body from stdin")?;
            buf
        }
    };
    // Malformed payloads are not the pipe's problem; they fail the call.
    let body: RequestBody = serde_json::from_str(&raw).context("invalid request body JSON")?;

    let pipe = ChainPipe::new(valves);
    let output = pipe
        .pipe(body, None, &LogEmitter, &NoopEventCall)
        .await
        .context("host callback failed")?;

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&output).context("failed to render output")?
    } else {
        serde_json::to_string(&output).context("failed to render output")?
    };
    println!("{rendered}");

    if output.is_error() {
        anyhow::bail!("pipe returned an error record");
    }
    Ok(())
}
