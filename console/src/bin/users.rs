//! User management for admins.
//!
//! Commands:
//! - list
//! - add --username <name> --email <email> --password <password>
//! - update <ID> [--email] [--password] [--role]
//! - status <ID> <active|inactive>
//! - toggle <ID>

use clap::{Parser, Subcommand};
use portal_client::{ActionResult, Config, NewUser, Portal, UserRole, UserStatus, UserUpdate};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portal-users", about = "Manage portal accounts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    List,
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PORTAL_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Change email, password or role; the username is fixed
    Update {
        id: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        role: Option<UserRole>,
    },
    Status { id: String, status: UserStatus },
    /// Flip a user between active and inactive
    Toggle { id: String },
}

fn finish(result: ActionResult<()>) -> anyhow::Result<()> {
    let message = result.message.unwrap_or_default();
    if result.success {
        println!("{}", message);
        Ok(())
    } else {
        anyhow::bail!(message)
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
    portal.auth().require_admin()?;
    let users = portal.users();

    match cli.command {
        Command::List => {
            let listed = users.list_users().await;
            let Some(accounts) = listed.data else {
                anyhow::bail!(listed.message.unwrap_or_else(|| "Failed to load users".to_string()));
            };
            for account in accounts {
                let created = account
                    .created_at
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<8} {:<16} {:<30} {:<6} {:<9} reports={:<4} created={}",
                    account.id,
                    account.username,
                    account.email,
                    account.role,
                    account.status,
                    account.reports_count,
                    created
                );
            }
        }
        Command::Add { username, email, password } => {
            finish(users.add_user(&NewUser { username, email, password }).await)?;
        }
        Command::Update { id, email, password, role } => {
            finish(users.update_user(&id, &UserUpdate { email, password, role }).await)?;
        }
        Command::Status { id, status } => {
            finish(users.change_status(&id, status).await)?;
        }
        Command::Toggle { id } => {
            let listed = users.list_users().await;
            let account = listed
                .data
                .unwrap_or_default()
                .into_iter()
                .find(|a| a.id == id);
            match account {
                Some(account) => finish(users.toggle_status(&account).await)?,
                None => anyhow::bail!("User {} not found", id),
            }
        }
    }

    Ok(())
}
