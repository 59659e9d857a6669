//! Vaultgate Data Service
//!
//! A small HTTP backend for developing against the Vaultgate client. It holds
//! one seeded user account in memory and issues bearer tokens on login.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use vaultgate_dataservice::{ServiceState, SessionBook, User, UserDirectory};

/// Vaultgate Data Service
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to bind the HTTP listener to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8787")]
    port: u16,

    /// Session token lifetime in seconds
    #[arg(long, default_value = "3600")]
    session_ttl_secs: u64,

    /// Seed user id
    #[arg(long, default_value = "42")]
    user_id: u64,

    /// Seed user email
    #[arg(long, default_value = "thank.you@forthefish.com")]
    user_email: String,

    /// Seed user password
    #[arg(long, default_value = "towel")]
    user_password: String,

    /// Seed user first name
    #[arg(long, default_value = "Douglas")]
    first_name: String,

    /// Seed user last name
    #[arg(long, default_value = "Adams")]
    last_name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vaultgate_dataservice=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;

    let users = UserDirectory::new().with_user(
        User {
            id: args.user_id,
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.user_email.clone(),
        },
        &args.user_password,
    );
    let sessions = SessionBook::new(Duration::from_secs(args.session_ttl_secs));
    let state = Arc::new(ServiceState::new(users, sessions));

    info!("Starting Vaultgate data service");
    info!("Seed user: {}", args.user_email);

    let (_, server) = vaultgate_dataservice::spawn(addr, state)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    server.await.context("Data service task panicked")??;
    Ok(())
}
