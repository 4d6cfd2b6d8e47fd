//! Relay Demo
//!
//! An editor and a status bar that never reference each other. The editor's
//! `saved` events reach the status bar through the broadcaster.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package herald-relay-demo -- --saves 3
//! HERALD_LOGGING__LEVEL=debug cargo run --package herald-relay-demo
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use clap::Parser;
use herald::prelude::*;
use herald::runtime::ConfigLoader;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "herald-relay-demo", about = "Relay events between emitters")]
struct Args {
    /// Configuration file (defaults to herald.toml in the current directory).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of saves to simulate.
    #[arg(short, long, default_value_t = 3)]
    saves: usize,

    /// Keep the broadcaster out of the process-wide slot.
    #[arg(long)]
    isolated: bool,
}

fn build_runtime(args: &Args) -> Result<HeraldRuntime> {
    let mut loader = ConfigLoader::new().with_current_dir();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let mut config = loader.load()?;
    if args.isolated {
        config.message.global = false;
    }
    Ok(HeraldRuntime::from_config(&config)?)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let runtime = build_runtime(&args)?;

    let editor = runtime.emitter(Props::new().with("file", "notes.txt").with("dirty", false));
    let status_bar = runtime.emitter(Props::new().with("saves", 0));

    runtime.watch("saved", &editor, Some("editor"))?;
    runtime.watch("closed", &editor, None)?;

    // Status bar: count every save.
    let saves = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&saves);
    let status = Arc::new(status_bar);
    let status_handle = Arc::clone(&status);
    runtime.message().on(
        "saved",
        &Listener::from_fn(move |payload| {
            let total = counter.fetch_add(1, Ordering::SeqCst) + 1;
            status_handle.set(Props::new().with("saves", json!(total)));
            info!(file = ?payload.as_str(), total, "Status bar updated");
        }),
        RemovalPolicy::Persistent,
    )?;

    // Only the first save gets a welcome toast.
    runtime.message().on(
        "saved",
        &Listener::from_fn(|_| info!("First save, autosave is now enabled")),
        RemovalPolicy::Once,
    )?;

    runtime.message().on(
        "closed",
        &Listener::from_fn(|_| info!("Editor closed")),
        RemovalPolicy::Once,
    )?;

    for n in 0..args.saves {
        editor.set(Props::new().with("dirty", "true"));
        editor.emit("saved", &Payload::new(format!("notes.txt@{n}")))?;
        editor.set(Props::new().with("dirty", "false"));
    }

    // Stop relaying saves, then drop everything the broadcaster knows about "saved".
    editor.off_tag("saved", "editor");
    editor.emit("saved", &Payload::new("ignored"))?;
    runtime
        .message()
        .emit(GARBAGE_COLLECT, &Payload::new("saved"))?;

    editor.emit("closed", &Payload::none())?;

    let stats = runtime.stats();
    info!(
        saves = saves.load(Ordering::SeqCst),
        status_saves = ?status.prop("saves"),
        editor_dirty = ?editor.prop("dirty"),
        topics = stats.topics,
        listeners = stats.listeners,
        "Demo finished"
    );

    runtime.shutdown();
    Ok(())
}
