use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use retrace::{
    CancelToken, Classification, Config, Event, EventIdx, FrameAllocator, ObjectStore, Player,
    ReplayCursor, ScanOutcome, SceneSink, TickOutcome, TimeReference, Timeline, TraceScanner,
};

#[derive(Parser)]
#[command(
    name = "retrace",
    about = "Reconstruct and replay cognitive runtime execution traces"
)]
struct Cli {
    /// TOML config file; defaults apply when absent
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a trace and print the reconstructed timeline
    Scan { trace: PathBuf },

    /// Scan a trace, then play it back through a printing scene sink
    Replay {
        trace: PathBuf,

        /// Stop after this many play-clock ticks
        #[arg(long)]
        max_ticks: Option<u64>,
    },

    /// Scan a trace and write a timeline archive (JSONL)
    Export {
        trace: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path).context("loading config")?,
        None => Config::default(),
    };

    match cli.command {
        Command::Scan { trace } => scan(&trace, &config),
        Command::Replay { trace, max_ticks } => replay(&trace, &config, max_ticks),
        Command::Export { trace, output } => export(&trace, &output),
    }
}

fn scan_trace(trace: &Path) -> Result<(Timeline, ObjectStore)> {
    let scanner = TraceScanner::new(Classification::standard());
    let mut store = ObjectStore::new();
    let outcome = scanner
        .scan_path(trace, TimeReference::default(), &mut store, &CancelToken::new())
        .with_context(|| format!("scanning {}", trace.display()))?;
    match outcome {
        ScanOutcome::Complete(timeline) => Ok((timeline, store)),
        ScanOutcome::Cancelled => bail!("scan cancelled"),
    }
}

fn scan(trace: &Path, config: &Config) -> Result<()> {
    let (timeline, store) = scan_trace(trace)?;
    let frames = FrameAllocator::new(config.sample_period_us);

    println!(
        "{} events over {} objects",
        timeline.len(),
        store.len()
    );
    for (index, event) in timeline.iter().enumerate() {
        let name = store.name(event.subject).unwrap_or("?");
        println!(
            "{:>5}  {:<14} f{:<4} {:<22} obj {}",
            index,
            event.time.to_string(),
            frames.frame_for(event.time).index(),
            event.kind().name(),
            name,
        );
    }
    Ok(())
}

fn replay(trace: &Path, config: &Config, max_ticks: Option<u64>) -> Result<()> {
    let (timeline, mut store) = scan_trace(trace)?;
    let cursor = ReplayCursor::new(
        timeline,
        Classification::standard(),
        FrameAllocator::new(config.sample_period_us),
        config.filters,
    );
    let mut player = Player::new(cursor);
    let mut sink = ConsoleSink::new(&store, config);

    let mut ticks = 0u64;
    loop {
        if let Some(limit) = max_ticks {
            if ticks >= limit {
                break;
            }
        }
        if player.tick(&mut store, &mut sink) == TickOutcome::Finished {
            break;
        }
        ticks += 1;
    }
    println!(
        "played to {} in {} ticks",
        player.play_time(),
        ticks
    );
    Ok(())
}

fn export(trace: &Path, output: &Path) -> Result<()> {
    let (timeline, _) = scan_trace(trace)?;
    timeline
        .write_jsonl_to_path(output)
        .with_context(|| format!("writing {}", output.display()))?;
    println!("wrote {} events to {}", timeline.len(), output.display());
    Ok(())
}

/// Prints every scene notification, one line each, with frame/slot layout
/// the way a real scene would place items.
struct ConsoleSink {
    names: Vec<String>,
    classes: Classification,
    frames: FrameAllocator,
}

impl ConsoleSink {
    fn new(store: &ObjectStore, config: &Config) -> Self {
        Self {
            names: store.objects().iter().map(|o| o.name.clone()).collect(),
            classes: Classification::standard(),
            frames: FrameAllocator::new(config.sample_period_us),
        }
    }

    fn name(&self, event: &Event) -> &str {
        self.names
            .get(event.subject.index())
            .map(String::as_str)
            .unwrap_or("?")
    }
}

impl SceneSink for ConsoleSink {
    fn create(&mut self, index: EventIdx, event: &Event) {
        let frame = self.frames.frame_for(event.time);
        let slot = self.frames.next_layout_slot(frame, self.classes.lane(event.kind()));
        println!(
            "create  #{index} {} obj {} (frame {}, slot {})",
            event.kind().name(),
            self.name(event),
            frame.index(),
            slot,
        );
    }

    fn update(&mut self, index: EventIdx, event: &Event) {
        println!("update  #{index} {} obj {}", event.kind().name(), self.name(event));
    }

    fn remove(&mut self, index: EventIdx, event: &Event) {
        println!("remove  #{index} {} obj {}", event.kind().name(), self.name(event));
    }

    fn link(&mut self, from: EventIdx, to: EventIdx) {
        println!("link    #{from} -> #{to}");
    }

    fn set_visible(&mut self, index: EventIdx, visible: bool) {
        println!("visible #{index} = {visible}");
    }
}
