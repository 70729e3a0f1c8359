//! evoview-watch - terminal consumer of an evolutionary search's dashboard payload.
//!
//! Examples:
//!   evoview-watch watch http://127.0.0.1:8080/api/data
//!   evoview-watch list run/data.json --sort score --limit 20
//!   evoview-watch show run/data.json 1f3c9a
//!   evoview-watch lineage run/data.json 1f3c9a
//!
//! Configuration comes from `--config <file.json>` (optional) and `EVOVIEW_*`
//! environment overrides.

use std::process;

use evoview::prelude::*;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

mod args;
mod render;
mod source;

use args::{parse_args, Args, Command, USAGE};
use source::{http_client, Source};

#[derive(Debug, thiserror::Error)]
enum WatchError {
    #[error(transparent)]
    Evoview(#[from] Error),

    #[error("program `{0}` is not in the snapshot")]
    NotFound(String),
}

fn usage(msg: &str) -> ! {
    if !msg.is_empty() {
        eprintln!("error: {msg}\n");
    }
    eprintln!("{USAGE}");
    process::exit(if msg.is_empty() { 0 } else { 2 });
}

async fn load_config(args: &Args) -> Result<DashboardConfig, WatchError> {
    let config = match &args.config {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path).await.map_err(Error::from)?;
            let config = DashboardConfig::from_json(&raw)?;
            info!("Loaded config from {}", path.display());
            config
        }
        None => DashboardConfig::default(),
    };
    let mut config = config.apply_env();
    if let Some(ms) = args.interval_ms {
        config = config.with_poll_interval_ms(ms);
    }
    config.validate()?;
    Ok(config)
}

/// Apply `--metric` / `--highlight` to a freshly loaded store.
fn apply_view_flags(store: &mut SnapshotStore, args: &Args) {
    if let Some(metric) = &args.metric {
        if let Err(e) = store.set_active_metric(metric) {
            warn!("{}; keeping `{}`", e, store.active_metric());
        }
    }
    store.set_highlight_filter(args.highlight);
}

async fn load_once(source: &Source, store: &mut SnapshotStore, args: &Args) -> Result<(), WatchError> {
    let raw = source.fetch(&http_client()?).await?;
    let snapshot = Snapshot::from_payload(&raw)?;
    if snapshot.skipped() > 0 {
        warn!("Skipped {} malformed programs", snapshot.skipped());
    }
    store.replace_snapshot(snapshot);
    apply_view_flags(store, args);
    Ok(())
}

async fn watch(source: Source, mut store: SnapshotStore, args: &Args) -> Result<(), WatchError> {
    let client = http_client()?;
    let mut poll = PollLoop::new(store.config().poll_interval());
    store.subscribe(|event, store| debug!("{:?} ({} programs)", event, store.snapshot().len()));

    let mut ticker = time::interval(poll.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("Watching {} every {:?}", source, poll.interval());

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C: stopping");
                return Ok(());
            }
        }

        let Some(ticket) = poll.begin() else {
            continue;
        };
        let result = source.fetch(&client).await;
        match poll.finish(ticket, result, &mut store) {
            PollOutcome::Replaced => {
                apply_view_flags(&mut store, args);
                println!("{}", render::summary(&store));
            }
            PollOutcome::Unchanged => debug!("No change"),
            PollOutcome::Failed(_) if poll.consecutive_failures() == 1 => {
                eprintln!("{source}: unavailable, retrying every {:?}", poll.interval());
            }
            PollOutcome::Failed(_) => {}
            PollOutcome::Rejected(msg) => eprintln!("{source}: {msg}"),
        }
    }
}

async fn run(args: Args) -> Result<(), WatchError> {
    let config = load_config(&args).await?;
    let mut store = SnapshotStore::new(config);

    match &args.command {
        Command::Watch { source } => {
            let source = Source::parse(source)?;
            watch(source, store, &args).await?;
        }
        Command::List { source } => {
            load_once(&Source::parse(source)?, &mut store, &args).await?;
            let query = ListQuery::new(args.search.clone(), args.sort);
            let model = ListModel::build(&store, &query);
            print!(
                "{}",
                render::list_table(&model, store.snapshot(), store.active_metric(), args.limit)
            );
        }
        Command::Show { source, id } => {
            load_once(&Source::parse(source)?, &mut store, &args).await?;
            let program = store
                .snapshot()
                .get(id)
                .ok_or_else(|| WatchError::NotFound(id.clone()))?;
            let model = SidebarModel::for_program(store.snapshot(), program, store.config());
            print!("{}", render::detail(&model));
        }
        Command::Lineage { source, id } => {
            load_once(&Source::parse(source)?, &mut store, &args).await?;
            let text = render::lineage(store.snapshot(), id, store.active_metric())
                .ok_or_else(|| WatchError::NotFound(id.clone()))?;
            print!("{text}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries the rendered views.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(msg) => usage(&msg),
    };

    if let Err(e) = run(args).await {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
