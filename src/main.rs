// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

mod console;

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use console::{ConsoleDesktop, ConsoleDevice};
use songdesk::{
    ChangeAggregator, LogLinkOpener, PlaybackSettings, RoutingConfig, SessionConfig,
    SessionManager, Song, ViewRef,
};

fn print_usage() {
    println!("SONGDESK - Song editor session demo");
    println!();
    println!("Usage: songdesk [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <PATH>   Load session settings from a .toml or .yaml file");
    println!("  --delay <MS>      Override the change quiescence delay");
    println!("  --help            Show this help message");
}

fn init_logging(config: &SessionConfig) {
    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .with_target(false)
        .init();
}

async fn run_demo(config: SessionConfig) -> Result<()> {
    let (session, task) = SessionManager::spawn(
        &config,
        Box::new(ConsoleDesktop::new()),
        Box::new(ConsoleDevice::new()),
        Arc::new(LogLinkOpener),
    );

    let mut events = session.subscribe();
    let reporter = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("event     {} \"{}\"", event.name(), event.song().name());
        }
    });

    println!("Opening \"Autumn Leaves\"...");
    let autumn = Song::with_file("Autumn Leaves", "songs/autumn_leaves.sng");
    autumn.set_comments("Reference recording: https://example.com/autumn-leaves");
    session.open(autumn.clone(), true, false)?;
    session.settle().await?;

    println!("Opening \"Blue Bossa\"...");
    let bossa = Song::new("Blue Bossa");
    session.open(bossa.clone(), true, true)?;
    session.settle().await?;

    println!("Showing piano roll of \"Blue Bossa\"...");
    let first = session.show_tertiary(&bossa).await?;
    let second = session.show_tertiary(&bossa).await?;
    println!("  tertiary view {} (again: {})", first, second);

    println!("User focuses \"Autumn Leaves\"...");
    session.view_activated(ViewRef::Primary(autumn.clone()))?;
    session.settle().await?;
    if let Some(active) = session.active_song().await? {
        println!("  active song: \"{}\"", active.name());
    }

    println!(
        "Editing \"Autumn Leaves\" (quiescence {} ms)...",
        config.quiescence_delay_ms
    );
    let routing = Arc::new(RoutingConfig::new(autumn.id()));
    let settings = Arc::new(PlaybackSettings::new());
    let aggregator =
        ChangeAggregator::observe_with(&autumn, &routing, &settings, config.quiescence_delay_ms)?;
    let regenerations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&regenerations);
    aggregator.subscribe(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    for token in ["addChordSymbol", "setTempo", "setInstrument", "moveSection"] {
        autumn.notify_music_change(token);
    }
    routing.notify_music_change("setChannelVolume");
    tokio::time::sleep(aggregator.delay() + Duration::from_millis(20)).await;
    println!(
        "  5 changes -> {} regeneration(s)",
        regenerations.load(Ordering::SeqCst)
    );
    aggregator.cleanup();

    println!("Closing \"Autumn Leaves\"...");
    let closed = session.close(&autumn, true).await?;
    session.settle().await?;
    println!("  closed: {}", closed);
    match session.active_song().await? {
        Some(active) => println!("  active song: \"{}\"", active.name()),
        None => println!("  no active song"),
    }

    session.shutdown().await?;
    task.await.context("Session task failed")?;
    drop(session);
    let _ = reporter.await;

    println!("Demo complete!");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut config = SessionConfig::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                let path = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                config = SessionConfig::load(path)?;
                i += 2;
            }
            "--delay" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow!("--delay requires a value in milliseconds"))?;
                config.quiescence_delay_ms = value
                    .parse()
                    .map_err(|_| anyhow!("Invalid delay: {}", value))?;
                i += 2;
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                std::process::exit(1);
            }
        }
    }
    config.validate()?;

    init_logging(&config);
    run_demo(config).await
}
