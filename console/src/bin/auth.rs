//! Portal login session management.
//!
//! Commands:
//! - login --username <name|email> --password <password>
//! - logout
//! - whoami

use clap::{Parser, Subcommand};
use portal_client::{Config, Portal, View};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portal-auth", about = "Log in to the research portal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Exchange credentials for a stored session
    Login {
        #[arg(long, short)]
        username: String,
        /// Falls back to PORTAL_PASSWORD
        #[arg(long, short, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
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

    match cli.command {
        Command::Login { username, password } => {
            let outcome = auth.login(&username, &password).await;
            match (outcome.landing(), outcome.data) {
                (Some(view), Some(user)) => {
                    println!("Logged in as {} ({})", user.username, user.role);
                    match view {
                        View::Admin => println!("Next: portal-reports list | portal-users list"),
                        View::Search => println!("Next: portal-search --keyword <keyword>"),
                    }
                }
                _ => {
                    let message = outcome.message.unwrap_or_else(|| "Login failed".to_string());
                    anyhow::bail!(message);
                }
            }
        }
        Command::Logout => {
            auth.logout()?;
            println!("Logged out");
        }
        Command::Whoami => match auth.current_user() {
            Some(user) => println!(
                "{} <{}> role={} status={} id={}",
                user.username, user.email, user.role, user.status, user.id
            ),
            None => println!("Not logged in"),
        },
    }

    Ok(())
}
