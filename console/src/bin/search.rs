//! Keyword search from the command line.
//!
//! Submits one search and prints the requested page of results with the
//! pagination strip underneath.

use clap::Parser;
use portal_client::{page_numbers, Category, Config, PageMarker, Portal, ResultPage};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portal-search", about = "Search news, articles and papers")]
struct Cli {
    /// Keyword or phrase; repeat for several
    #[arg(long = "keyword", short = 'k', required = true)]
    keywords: Vec<String>,
    /// All, News, Articles or Papers; repeat for several
    #[arg(long = "category", short = 'c', default_value = "All")]
    categories: Vec<Category>,
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Overrides PORTAL_PAGE_SIZE
    #[arg(long)]
    page_size: Option<u32>,
}

fn render(page: &ResultPage) {
    println!("Search Results ({} found)", page.total);
    if page.is_empty() {
        println!("No results found. Try another keyword.");
        return;
    }
    for hit in &page.items {
        println!("{:>3}. [{}] {}", hit.index, hit.category, hit.title);
        if !hit.description.is_empty() {
            println!("     {}", hit.description);
        }
        if !hit.link.is_empty() {
            println!("     {}", hit.link);
        }
    }
    println!();
    println!("{}", page.summary());

    let strip: Vec<String> = page_numbers(page.page, page.total_pages)
        .into_iter()
        .map(|marker| match marker {
            PageMarker::Page(n) if n == page.page => format!("[{}]", n),
            PageMarker::Page(n) => n.to_string(),
            PageMarker::Gap => "…".to_string(),
        })
        .collect();
    println!("Pages: {}", strip.join(" "));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let portal = Portal::from_config(Config::from_env()?)?;
    if portal.session().current_user().is_none() {
        anyhow::bail!("Not logged in; run portal-auth login first");
    }

    let mut keywords = portal.keywords();
    for keyword in &cli.keywords {
        keywords.add(keyword)?;
    }

    let mut search = match cli.page_size {
        Some(0) => anyhow::bail!("Page size must be at least 1"),
        Some(size) => portal.search_with_page_size(size),
        None => portal.search(),
    };
    search.search(&keywords, &cli.categories).await?;
    if cli.page > 1 {
        search.go_to_page(cli.page).await?;
    }

    if let Some(page) = search.results() {
        render(page);
    }
    Ok(())
}
