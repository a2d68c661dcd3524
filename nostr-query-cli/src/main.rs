use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use nostr_query_cli::config::Config;
use nostr_query_cli::filter::{FilterArgs, parse_authors};
use nostr_query_cli::output::{OutputFormat, SortOrder, format_event, format_relay, short_key};
use nostr_query_core::{
    ClientPool, EventQuery, EventQueryByAuthor, EventQueryOptions, EventQueryResult, NostrEvent,
    Relay, RelaysQuery, read_relays,
};
use nostr_sdk::Client;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "nostr-query")]
#[command(about = "Query Nostr relays and print deduplicated, ordered events", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Relay URL to read from (repeatable, overrides the config file)
    #[arg(short, long = "relay", global = true, value_name = "URL")]
    relays: Vec<String>,

    /// Seconds to wait for the end of stored events
    #[arg(short, long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Show detailed progress information
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable progress spinner
    #[arg(long, global = true)]
    no_progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Run one subscription and print the collected events
    Query {
        #[command(flatten)]
        filter: FilterArgs,

        /// Author public key, hex or npub (repeatable)
        #[arg(short, long = "author", value_name = "PUBKEY")]
        authors: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Print order
        #[arg(short, long, value_enum, default_value = "newest")]
        order: SortOrder,

        /// Keep printing new events after EOSE until interrupted
        #[arg(long)]
        follow: bool,
    },

    /// Run one subscription per author and print results grouped by author
    ByAuthor {
        #[command(flatten)]
        filter: FilterArgs,

        /// Author public key, hex or npub (repeatable)
        #[arg(short, long = "author", value_name = "PUBKEY", required = true)]
        authors: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Look up the relay list (NIP-65) of one or more authors
    Relays {
        /// Author public key, hex or npub (repeatable)
        #[arg(short, long = "author", value_name = "PUBKEY", required = true)]
        authors: Vec<String>,
    },
}

/// Settings every subcommand needs after merging flags and config
struct Session {
    client: Client,
    pool: Arc<ClientPool>,
    relays: Vec<Relay>,
    timeout: Duration,
    show_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(cli.config.as_deref())?;
    init_logging(cli.verbose, &config.logging.level);

    let relays = config.resolve_relays(&cli.relays)?;
    let timeout = Duration::from_secs(cli.timeout.unwrap_or(config.query.timeout_secs));
    let eose_timeout = Duration::from_millis(config.query.eose_timeout_ms);

    // Validate everything that can fail before touching the network
    match &cli.command {
        Commands::Query { filter, authors, .. } | Commands::ByAuthor { filter, authors, .. } => {
            filter.to_filter()?;
            parse_authors(authors)?;
        }
        Commands::Relays { authors } => {
            parse_authors(authors)?;
        }
    }

    info!("Starting nostr-query");
    info!("Relays: {}", relays.iter().map(|r| r.url.as_str()).collect::<Vec<_>>().join(", "));
    info!("Timeout: {}s", timeout.as_secs());

    let session = connect(relays, timeout, eose_timeout, !cli.no_progress).await?;

    let outcome = match cli.command {
        Commands::Query {
            filter,
            authors,
            format,
            order,
            follow,
        } => run_query(&session, &filter, &authors, format, order, follow).await,
        Commands::ByAuthor {
            filter,
            authors,
            format,
        } => run_by_author(&session, &filter, &authors, format).await,
        Commands::Relays { authors } => run_relays(&session, &authors).await,
    };

    if let Err(e) = session.client.disconnect().await {
        debug!("Disconnect failed: {}", e);
    }

    outcome
}

fn init_logging(verbose: bool, level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn connect(
    relays: Vec<Relay>,
    timeout: Duration,
    eose_timeout: Duration,
    show_progress: bool,
) -> Result<Session> {
    let client = Client::default();
    for relay in &relays {
        client
            .add_relay(relay.url.as_str())
            .await
            .with_context(|| format!("Failed to add relay: {}", relay.url))?;
    }
    client.connect().await;

    let pool = Arc::new(ClientPool::new(client.clone()).with_eose_timeout(eose_timeout));
    Ok(Session {
        client,
        pool,
        relays,
        timeout,
        show_progress,
    })
}

fn spinner(show: bool, message: &str) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Wait for `eose`, giving up after the session timeout
///
/// Returns `None` on timeout.
async fn wait_with_progress<F, T>(session: &Session, message: &str, eose: F) -> Option<T>
where
    F: Future<Output = T>,
{
    let progress = spinner(session.show_progress, message);
    let outcome = tokio::time::timeout(session.timeout, eose).await.ok();

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    if outcome.is_none() {
        warn!("Timed out after {}s waiting for EOSE", session.timeout.as_secs());
    }
    outcome
}

fn print_events<'a, I>(events: I, format: OutputFormat) -> Result<usize>
where
    I: IntoIterator<Item = &'a NostrEvent>,
{
    let mut count = 0;
    for event in events {
        println!("{}", format_event(event, format)?);
        count += 1;
    }
    Ok(count)
}

fn ordered(result: &EventQueryResult, order: SortOrder) -> Vec<NostrEvent> {
    match order {
        SortOrder::Newest => result.sorted_descending(),
        SortOrder::Oldest => result.sorted(),
        SortOrder::Arrival => result.iter().cloned().collect(),
    }
}

async fn run_query(
    session: &Session,
    filter: &FilterArgs,
    authors: &[String],
    format: OutputFormat,
    order: SortOrder,
    follow: bool,
) -> Result<()> {
    let mut filter = filter.to_filter()?;
    let authors = parse_authors(authors)?;
    if !authors.is_empty() {
        filter = filter.authors(authors);
    }

    let options = EventQueryOptions::default().read_from_relays(read_relays(&session.relays));
    let query = EventQuery::new(session.pool.clone(), vec![filter], options);

    let result = wait_with_progress(session, "Waiting for stored events...", query.wait_for_eose())
        .await
        .unwrap_or_else(|| query.result());

    let printed = print_events(&ordered(&result, order), format)?;
    eprintln!("\n📊 {} ({} printed)", result, printed);

    if !follow {
        return Ok(());
    }

    info!("Following new events, press Ctrl-C to stop");
    let mut changes = query.subscribe_changes();
    let mut seen = result.len();
    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = changes.borrow_and_update().clone();
                // Arrival order means new events are always at the end
                print_events(current.iter().skip(seen), format)?;
                seen = current.len();
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

async fn run_by_author(
    session: &Session,
    filter: &FilterArgs,
    authors: &[String],
    format: OutputFormat,
) -> Result<()> {
    let filter = filter.to_filter()?;
    let authors = parse_authors(authors)?;

    let options = EventQueryOptions::default().read_from_relays(read_relays(&session.relays));
    let query =
        EventQueryByAuthor::new(session.pool.clone(), vec![filter], authors.clone(), options);

    let results = wait_with_progress(session, "Waiting for every author...", query.wait_for_eose())
        .await
        .unwrap_or_else(|| query.result());

    for author in &authors {
        let hex = author.to_hex();
        match results.get(author) {
            Some(result) => {
                println!("# {} {}", short_key(&hex), result);
                print_events(&result.sorted_descending(), format)?;
            }
            None => println!("# {} no events", short_key(&hex)),
        }
    }

    eprintln!(
        "\n📊 {} of {} author(s) returned events",
        results.len(),
        authors.len()
    );
    Ok(())
}

async fn run_relays(session: &Session, authors: &[String]) -> Result<()> {
    let authors = parse_authors(authors)?;

    let query = RelaysQuery::new(session.pool.clone(), authors, true, session.relays.clone());

    let resolved = wait_with_progress(session, "Looking up relay lists...", query.wait_for_eose())
        .await
        .unwrap_or_else(|| query.relays());

    if !resolved.eose {
        warn!("Relay list lookup incomplete, showing starting relays");
    }
    for relay in &resolved.relays {
        println!("{}", format_relay(relay));
    }
    Ok(())
}
