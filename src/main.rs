use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use brandwatch::api::{ApiClient, KeywordService};
use brandwatch::args::{Command, ViewArgs};
use brandwatch::dashboard::{Dashboard, Outcome};
use brandwatch::domain::{clean_topics, normalize_brand_domain};
use brandwatch::render::render_dashboard;
use brandwatch::session::{SessionRecord, SqliteSessionStore};
use brandwatch::transform::transform_results;
use brandwatch::utils::{setup_logging, validate_args};
use brandwatch::view::{toggle_selection, DashboardView};
use brandwatch::{Args, Config};

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    validate_args(&args)?;

    let config = Config::from_args(&args)?;

    match run(&args, &config) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(action = "exit", component = "main", error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: &Args, config: &Config) -> Result<()> {
    let store = SqliteSessionStore::open(&config.store_path)
        .with_context(|| format!("Failed to open session store at {:?}", config.store_path))?;

    let client = ApiClient::new(config.api_url.clone(), config.timeout)
        .context("Failed to build HTTP client")?;
    let dashboard = Dashboard::new(KeywordService::new(client, config.endpoint.clone()), store);

    let (outcome, view_args) = match &args.command {
        Command::Submit { domain, topics, view } => {
            let domain = normalize_brand_domain(domain)?;
            let topics = clean_topics(topics)?;
            info!(action = "submit", component = "main", domain = %domain, topic_count = topics.len(), "Submitting topics");
            (Some(dashboard.submit(&domain, &topics)?), view)
        }
        Command::Refresh { view } => (Some(dashboard.refresh()?), view),
        Command::Show { view } => (None, view),
        Command::Reset => {
            dashboard.reset()?;
            println!("Session cleared.");
            return Ok(());
        }
    };

    match outcome {
        Some(Outcome::Failed(message)) => anyhow::bail!(message),
        Some(Outcome::Stale) => warn!(action = "discard", component = "main", "Response superseded, showing stored results"),
        Some(Outcome::Applied(_)) | None => {}
    }

    let record = dashboard
        .load()?
        .context("No saved session, run `brandwatch submit <domain> <topic>...` first")?;
    show(&record, view_args)
}

fn show(record: &SessionRecord, view_args: &ViewArgs) -> Result<()> {
    let items = transform_results(&record.results);

    let derived = DashboardView::derive(&items, &view_args.search, view_args.page, &[]);
    let view = if view_args.toggle.is_empty() {
        derived
    } else {
        let mut selection = derived.selection;
        for id in &view_args.toggle {
            if !items.iter().any(|item| &item.id == id) {
                warn!(action = "toggle", component = "main", id = %id, "No topic with this id");
                continue;
            }
            toggle_selection(&mut selection, id);
        }
        DashboardView::with_selection(&items, &view_args.search, view_args.page, selection)
    };

    if view_args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&view).context("Failed to serialize dashboard")?
        );
    } else {
        print!("{}", render_dashboard(record, &view));
    }
    Ok(())
}
