use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use indicatif::{ProgressBar, ProgressStyle};
use linkrot::handlers::{
    expand_path, load_batch_state, load_page_mapping, load_traffic_links, save_batch_state,
};
use linkrot_core::{
    AuditConfig, AuditContext, BatchOptions, DirectorySnapshotStore, KpiConfig, ReportFormat,
    detect_broken_links_from_crawl, detect_broken_links_from_crawl_batch, generate_audit_report,
    merge_and_deduplicate,
};
use linkrot_scanner::{LinkProber, ProbeConfig, allow_all, path_prefix_scope};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use url::Url;

mod commands;

#[tokio::main]
async fn main() {
    let chosen_command = command_argument_builder().get_matches();
    let quiet = chosen_command.get_flag("quiet");
    init_logging(chosen_command.get_flag("verbose"), quiet);

    let outcome = match chosen_command.subcommand() {
        Some(("audit", primary_command)) => handle_audit(primary_command, quiet).await,
        Some(("batch", primary_command)) => handle_batch(primary_command).await,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = outcome {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Wire the snapshot store, prober and scope from the shared arguments
fn build_context(args: &ArgMatches) -> Result<AuditContext> {
    let snapshots = expand_path(args.get_one::<String>("snapshots").unwrap());
    if !snapshots.is_dir() {
        return Err(anyhow!(
            "Snapshot directory {} does not exist",
            snapshots.display()
        ));
    }
    let bucket = args.get_one::<String>("bucket").unwrap();
    let site_id = args.get_one::<String>("site-id").unwrap();

    let probe_config = ProbeConfig {
        head_timeout: Duration::from_millis(*args.get_one::<u64>("head-timeout-ms").unwrap()),
        get_timeout: Duration::from_millis(*args.get_one::<u64>("get-timeout-ms").unwrap()),
        ..ProbeConfig::default()
    };
    let prober = LinkProber::with_config(probe_config).context("Failed to build HTTP client")?;

    let audit_config = AuditConfig {
        probe_group_size: *args.get_one::<usize>("group-size").unwrap(),
        probe_group_delay: Duration::from_millis(*args.get_one::<u64>("group-delay-ms").unwrap()),
        ..AuditConfig::default()
    };

    let scope = match args.get_one::<Url>("scope") {
        Some(base) => path_prefix_scope(base.as_str()),
        None => allow_all(),
    };

    Ok(AuditContext::new(
        site_id.as_str(),
        bucket.as_str(),
        Arc::new(DirectorySnapshotStore::new(snapshots)),
        Arc::new(prober),
    )
    .with_scope(scope)
    .with_config(audit_config))
}

async fn handle_audit(args: &ArgMatches, quiet: bool) -> Result<()> {
    let pages = expand_path(args.get_one::<String>("pages").unwrap());
    let page_mapping = load_page_mapping(&pages)?;
    let format = ReportFormat::from_str(args.get_one::<String>("format").unwrap())
        .ok_or_else(|| anyhow!("Unsupported report format"))?;

    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    };

    let progress_bar = spinner.clone();
    let ctx = build_context(args)?.with_progress_callback(Arc::new(
        move |position: usize, total: usize, url: &str| {
            progress_bar.set_message(format!("[{}/{}] {}", position, total, url));
        },
    ));

    let crawl_links = detect_broken_links_from_crawl(&page_mapping, &ctx).await;
    spinner.finish_and_clear();

    let links = match args.get_one::<String>("traffic") {
        Some(path) => {
            let traffic_links = load_traffic_links(&expand_path(path))?;
            merge_and_deduplicate(crawl_links, traffic_links)
        }
        None => crawl_links,
    };

    let kpi_config = KpiConfig {
        cost_per_click: *args.get_one::<f64>("cpc").unwrap(),
        ..KpiConfig::default()
    };
    let report = generate_audit_report(&links, &kpi_config, format)?;

    match args.get_one::<String>("output") {
        Some(path) => {
            let output_path = expand_path(path);
            fs::write(&output_path, &report)
                .with_context(|| format!("Failed to write report to {}", output_path.display()))?;
            println!(
                "{} Report saved to {} ({} broken links)",
                "✓".green(),
                output_path.display(),
                links.len()
            );
        }
        None => println!("{}", report),
    }

    Ok(())
}

async fn handle_batch(args: &ArgMatches) -> Result<()> {
    let pages = expand_path(args.get_one::<String>("pages").unwrap());
    let state_path = expand_path(args.get_one::<String>("state").unwrap());
    let batch_size = *args.get_one::<usize>("batch-size").unwrap();

    let page_mapping = load_page_mapping(&pages)?;
    let state = load_batch_state(&state_path)?;
    let ctx = build_context(args)?;

    let options = BatchOptions::resume(page_mapping, state, batch_size);
    let result = detect_broken_links_from_crawl_batch(options, &ctx).await?;

    save_batch_state(&state_path, &result.next_state())?;

    let summary = serde_json::json!({
        "results": result.results,
        "pagesProcessed": result.pages_processed,
        "pagesSkipped": result.pages_skipped,
        "hasMorePages": result.has_more_pages,
        "nextBatchStartIndex": result.next_batch_start_index,
        "stats": result.stats,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
