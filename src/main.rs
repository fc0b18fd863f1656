use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use bus::{Bus, CoreCommand};
use clap::Parser;
use net::HttpTransport;
use page::{LogHost, Page, Settings};
use runtime_net::start_net_runtime;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use url::Url;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "hypersplice", about = "Load a page through the in-place navigation runtime")]
struct Args {
    /// Absolute URL to navigate to
    url: String,
    /// TOML file with optional [page] and [net] tables
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
    /// Give up waiting for the page to settle after this long
    #[arg(long, default_value_t = 10_000)]
    wait_ms: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let _ = TermLogger::init(
        args.log_level,
        log_config,
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let location = Url::parse(&args.url).with_context(|| format!("invalid url {:?}", args.url))?;
    let transport = HttpTransport::new(&settings.net)?;

    let (bus, cmd_rx) = Bus::new();
    let net = start_net_runtime(cmd_rx, bus.evt_tx.clone(), Arc::new(transport));
    let mut page = Page::new(
        location.clone(),
        settings.page,
        bus.cmd_tx.clone(),
        Box::new(LogHost),
    );
    log::info!("hypersplice starting at {location}");

    let _ = page.navigate(location.as_str(), None);

    let started = Instant::now();
    let budget = Duration::from_millis(args.wait_ms);
    while !page.is_idle() {
        let elapsed = started.elapsed();
        if elapsed >= budget {
            log::warn!("page did not settle within {} ms", args.wait_ms);
            break;
        }
        // Wake for whichever comes first: a network event or the next timer.
        let mut wait = budget - elapsed;
        if let Some(deadline) = page.next_deadline() {
            wait = wait.min(deadline.saturating_sub(elapsed));
        }
        match bus.evt_rx.recv_timeout(wait) {
            Ok(event) => page.handle_event(event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        page.advance_to(started.elapsed());
    }

    println!("title: {}", page.title());
    for (i, entry) in page.history().entries().iter().enumerate() {
        let marker = if i == page.history().index() { '*' } else { ' ' };
        println!("{marker} {} ({})", entry.url, entry.title);
    }
    if let Some(body) = page.dom().body() {
        println!("{}", html::inner_html(page.dom(), body));
    }

    let _ = bus.cmd_tx.send(CoreCommand::Shutdown);
    if net.join().is_err() {
        log::warn!("net runtime panicked");
    }
    Ok(())
}
