//! Kitchen Notification Engine (kne-engine) - operator CLI
//!
//! Exercises the engine from a terminal: play one sound through the
//! configured backend, print the detected context, list output devices, or
//! run a short scripted service demo.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use kne_common::config::EngineConfig;
use kne_common::{Context, OrderData, OrderPriority, SoundType};
use kne_engine::accessibility::AccessibilityPlatform;
use kne_engine::audio::AudioOutput;
use kne_engine::NotificationEngine;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for kne-engine
#[derive(Parser, Debug)]
#[command(name = "kne-engine")]
#[command(about = "Context-aware kitchen notification engine")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "KNE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level, overrides the config file
    #[arg(long, env = "KNE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Sound asset directory, overrides the config file
    #[arg(long, env = "KNE_ASSETS_DIR")]
    assets_dir: Option<PathBuf>,

    /// Output device name, overrides the config file
    #[arg(long)]
    device: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play one sound at medium urgency
    Play {
        /// Sound type, e.g. new-order or urgent-alert
        sound: String,
    },
    /// Print the detected context and its profile
    Context {
        /// Print engine statistics as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Dispatch a scripted sequence of order notifications
    Demo,
    /// List audio output devices
    Devices,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging comes up before the config so load warnings are printed;
    // the configured level replaces the filter afterwards
    let env_filter = EnvFilter::try_from_default_env().ok();
    let explicit = env_filter.is_some() || args.log_level.is_some();
    let initial = env_filter.unwrap_or_else(|| {
        filter_for(args.log_level.as_deref().unwrap_or("info"))
    });
    let (filter, filter_handle) = reload::Layer::new(initial);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = EngineConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(dir) = &args.assets_dir {
        config.assets_dir = dir.clone();
    }
    if args.device.is_some() {
        config.audio.device = args.device.clone();
    }

    if !explicit {
        if let Err(e) = filter_handle.reload(filter_for(&config.logging.level)) {
            warn!("Failed to apply configured log level: {}", e);
        }
    }

    info!("Starting kne-engine {}", env!("CARGO_PKG_VERSION"));

    if let Command::Devices = args.command {
        return list_devices();
    }

    let engine = NotificationEngine::open(config, AccessibilityPlatform::headless()).await;
    engine.init().await;

    let outcome = match args.command {
        Command::Play { sound } => play(&engine, &sound).await,
        Command::Context { json } => print_context(&engine, json).await,
        Command::Demo => demo(&engine).await,
        Command::Devices => Ok(()),
    };

    engine.shutdown().await;
    outcome
}

/// `kne_engine` and `kne_common` at `level`, falling back to info
fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_new(format!("kne_engine={0},kne_common={0}", level))
        .unwrap_or_else(|_| EnvFilter::new("kne_engine=info,kne_common=info"))
}

fn list_devices() -> Result<()> {
    let devices = AudioOutput::list_devices().context("Failed to list output devices")?;
    if devices.is_empty() {
        println!("No output devices found");
    }
    for device in devices {
        println!("{}", device);
    }
    Ok(())
}

async fn play(engine: &NotificationEngine, sound: &str) -> Result<()> {
    let sound_type: SoundType = sound
        .parse()
        .with_context(|| format!("'{}' is not a sound type", sound))?;

    let outcome = engine
        .test_sound(sound_type)
        .await
        .with_context(|| format!("Failed to play {}", sound_type))?;

    println!(
        "{} on the {} backend ({} ms{})",
        sound_type,
        outcome.backend,
        outcome.duration.as_millis(),
        if outcome.synthesized { ", synthesized" } else { "" }
    );
    tokio::time::sleep(outcome.duration + Duration::from_millis(200)).await;
    Ok(())
}

async fn print_context(engine: &NotificationEngine, json: bool) -> Result<()> {
    let stats = engine.statistics().await;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialize statistics")?
        );
        return Ok(());
    }

    let context: Context = stats.current_context;
    let profile = kne_engine::context::profile(context);

    println!("context:           {}", context);
    println!("backend:           {}", stats.backend);
    println!("base volume:       {:.2}", profile.characteristics.base_volume);
    println!("urgency mult:      {:.2}", profile.characteristics.urgency_multiplier);
    println!("repeat behavior:   {:?}", profile.characteristics.repeat_behavior);
    println!("sound variation:   {}", profile.characteristics.sound_variation);
    Ok(())
}

async fn demo(engine: &NotificationEngine) -> Result<()> {
    engine.update_staff_count(4).await;
    engine.update_order_backlog(3).await;

    let orders = [
        OrderData::new("A1").with_table(4),
        OrderData::new("A2")
            .with_table(7)
            .with_priority(OrderPriority::High)
            .with_allergy_alert(),
        OrderData::new("A3")
            .with_priority(OrderPriority::Urgent)
            .with_wait_time(25.0),
    ];

    for order in orders {
        let notification = engine.notify_new_order(order).await;
        println!(
            "{:<14} {:<10} {:<14} vol {:.2} x{}  {}",
            notification.sound_type.as_str(),
            notification.urgency.as_str(),
            notification.context.as_str(),
            notification.adaptations.volume,
            notification.adaptations.repeat,
            notification.message
        );
        tokio::time::sleep(wait_time(engine)).await;
    }

    let notification = engine
        .notify_urgent_alert("Fryer temperature high", None)
        .await;
    println!(
        "{:<14} {:<10} {:<14} {}",
        notification.sound_type.as_str(),
        notification.urgency.as_str(),
        notification.context.as_str(),
        notification.message
    );
    tokio::time::sleep(wait_time(engine)).await;

    let stats = engine.statistics().await;
    println!(
        "{} notifications, {} sound events on the {} backend",
        stats.history_len, stats.sound_events, stats.backend
    );
    Ok(())
}

/// Time to let queued voices finish before moving on
fn wait_time(engine: &NotificationEngine) -> Duration {
    if engine.playback().active_voices() > 0 {
        Duration::from_millis(1500)
    } else {
        Duration::from_millis(200)
    }
}
