//! Report listing and download.
//!
//! Commands:
//! - list [--user ID] [--from YYYY-MM-DD] [--to YYYY-MM-DD] [--page N]
//! - mine
//! - user <ID>
//! - all-users
//! - download <REPORT_ID> [--dir PATH]

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use portal_client::{Config, Portal, Report, ReportQuery, UserFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portal-reports", about = "Browse and download generated reports")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Admin report table with counters
    List {
        /// User id; every user when omitted
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Reports generated by the logged-in user
    Mine,
    /// Reports for one user (admin)
    User { id: String },
    /// Reports for every user, skipping users that fail (admin)
    AllUsers,
    /// Save a report PDF
    Download {
        report_id: String,
        /// Overrides PORTAL_DOWNLOAD_DIR
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn print_reports(reports: &[Report]) {
    if reports.is_empty() {
        println!("No reports found");
        return;
    }
    for report in reports {
        let categories: Vec<&str> = report.categories.iter().map(|c| c.as_str()).collect();
        println!(
            "{}  {}  {:<16} {:<30} [{}] report={}",
            report.id,
            report.date,
            report.user,
            report.keywords.join(", "),
            categories.join(","),
            report.report_id.as_deref().unwrap_or("-"),
        );
    }
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
    let auth = portal.auth();
    let reports = portal.reports();

    match cli.command {
        Command::List { user, from, to, page } => {
            auth.require_admin()?;
            let query = ReportQuery {
                user: user.map(UserFilter::User).unwrap_or_default(),
                from,
                to,
                page,
                page_size: portal.config().reports_page_size,
            };
            let listing = reports.get_reports(&query).await?;
            println!(
                "Total users: {}  Reports generated: {}",
                listing.analytics.total_users, listing.analytics.total_reports
            );
            print_reports(&listing.reports);
            if listing.total_pages > 1 {
                println!("Page {} of {}", listing.page, listing.total_pages);
            }
        }
        Command::Mine => print_reports(&reports.my_reports().await?),
        Command::User { id } => {
            auth.require_admin()?;
            print_reports(&reports.user_reports(&id).await?);
        }
        Command::AllUsers => {
            auth.require_admin()?;
            let listed = portal.users().list_users().await;
            let Some(users) = listed.data else {
                anyhow::bail!(listed.message.unwrap_or_else(|| "Failed to load users".to_string()));
            };
            let collected = reports.reports_for_all_users(&users).await;
            print_reports(&collected.reports);
            if !collected.skipped.is_empty() {
                eprintln!("Skipped users: {}", collected.skipped.join(", "));
            }
        }
        Command::Download { report_id, dir } => {
            let dir = dir.unwrap_or_else(|| portal.config().download_dir.clone());
            let path = reports.download_report(&report_id, &dir).await?;
            println!("Saved {}", path.display());
        }
    }

    Ok(())
}
