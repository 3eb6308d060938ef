//! Vitrine CLI - compose a storefront page model and print the render tree
//!
//! Usage:
//!   vitrine <page.json> --config <config.json>            Print the render tree
//!   vitrine <page.json> --config <config.json> --json     Output the tree as JSON
//!   vitrine <page.json> --config <config.json> --path main
//!
//! Logging goes to stderr and is filtered by `VITRINE_LOG`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use owo_colors::OwoColorize;
use vitrine_context::{Configuration, ConsentState, ContextPropagator, CookieSnapshot};
use vitrine_page::{RenderRequest, RenderedPage, load_page, render_page};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "VITRINE_LOG";

/// Vitrine - compose CMS page models into render trees
#[derive(Parser, Debug)]
#[command(name = "vitrine")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Print the render tree of a page
    vitrine page.json --config config.json

    # Only the "main" slot, as JSON
    vitrine page.json --config config.json --path main --json

    # With request cookies
    vitrine page.json --config config.json --cookies CookieConsent=true lang=en
"#)]
struct Cli {
    /// Page model JSON file
    #[arg(value_name = "PAGE")]
    page: PathBuf,

    /// Configuration JSON file
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Request cookies as name=value pairs
    #[arg(long, value_name = "NAME=VALUE", num_args = 1..)]
    cookies: Vec<String>,

    /// Compose only the component at this slot path (e.g. "main/banner")
    #[arg(short, long, value_name = "PATH")]
    path: Option<String>,

    /// Output the render tree as JSON
    #[arg(short, long)]
    json: bool,

    /// Log at debug level unless a log filter is set in the environment
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let configuration = Configuration::from_path(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    let snapshot = load_page(&path_str(&cli.page)?)?;
    let cookies = parse_cookies(&cli.cookies)?;

    let mut request = RenderRequest::new(snapshot, configuration).with_cookies(cookies);
    if let Some(path) = &cli.path {
        request = request.at_path(path.as_str());
    }

    let mut propagator = ContextPropagator::new();
    let page = render_page(request, &mut propagator).context("rendering page")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&page.tree)?);
    } else {
        print_page(&page, cli.path.as_deref());
    }
    Ok(())
}

/// Install the stderr subscriber. `VITRINE_LOG` wins over `--verbose`.
fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn path_str(path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("page path is not valid UTF-8: {}", path.display()))
}

/// Parse `name=value` arguments into a cookie snapshot.
fn parse_cookies(pairs: &[String]) -> Result<CookieSnapshot> {
    pairs
        .iter()
        .map(|pair| -> Result<(String, String)> {
            match pair.split_once('=') {
                Some((name, value)) if !name.is_empty() => {
                    Ok((name.to_string(), value.to_string()))
                }
                _ => bail!("cookie '{pair}' is not of the form name=value"),
            }
        })
        .collect()
}

/// Print the render tree and a short context summary to stdout.
fn print_page(page: &RenderedPage, path: Option<&str>) {
    println!("{}", "=== Render Tree ===".bold());
    match &page.tree {
        Some(tree) => tree.print_tree(),
        None => println!("{}", format!("(nothing at path '{}')", path.unwrap_or("")).yellow()),
    }

    let context = &page.context;
    println!("\n{}", "=== Context ===".bold());
    println!(
        "commerce: {} ({}, {})",
        context.commerce().service_url(),
        context.commerce().connector(),
        context.commerce().account_env_id()
    );
    println!("cookies: {}", context.cookies().len());
    let consent = match context.consent() {
        ConsentState::Accepted => "accepted".green().to_string(),
        ConsentState::Declined => "declined".red().to_string(),
        ConsentState::Unknown => "unknown".dimmed().to_string(),
    };
    println!("consent: {consent}");
    if context.tracking().is_enabled() {
        println!(
            "tracking: account {} / domain {}",
            context.tracking().account_id.as_deref().unwrap_or("-"),
            context.tracking().domain_key.as_deref().unwrap_or("-")
        );
    } else {
        println!("tracking: {}", "disabled".dimmed());
    }
}
