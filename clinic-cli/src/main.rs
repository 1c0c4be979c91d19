//! Clinic CLI - main entry point.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use clinic_cli::{chat, client};
use clinic_common::config::Config;
use clinic_common::logging::init_logging;

/// Terminal client for the Clinic appointment-booking assistant.
#[derive(Parser, Debug)]
#[command(name = "clinic")]
#[command(author = "theonlyhennygod")]
#[command(version = "0.1.0")]
#[command(about = "Chat with the Clinic booking assistant from your terminal.", long_about = None)]
struct Cli {
    /// Path to the configuration file (default: ~/.clinic/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format override (pretty, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an interactive chat session with the assistant (default)
    Chat,

    /// List today's appointments
    Appointments {
        /// Confirm the appointment with the given id instead of listing
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Log in as a receptionist
    Login {
        /// Receptionist identifier (prompted for if omitted)
        #[arg(long)]
        receptionist_id: Option<String>,
    },

    /// Check collaborator API health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env_overrides();
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.observability.log_format = format.clone();
    }

    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => chat::run(&config).await,
        Commands::Appointments { confirm } => run_appointments(&config, confirm).await,
        Commands::Login { receptionist_id } => run_login(&config, receptionist_id).await,
        Commands::Health => run_health(&config).await,
    }
}

async fn run_appointments(config: &Config, confirm: Option<String>) -> Result<()> {
    let api = client::ClinicApi::new(&config.api)?;

    if let Some(id) = confirm {
        let appointment = api.confirm_appointment(&id).await?;
        println!("Confirmed appointment for {}", appointment.name);
        return Ok(());
    }

    let appointments = api.today_appointments().await?;
    if appointments.is_empty() {
        println!("No appointments today.");
        return Ok(());
    }
    for appointment in &appointments {
        println!(
            "{} | {} | {} | {} | visited: {} | confirmed: {}",
            appointment.name,
            appointment.doctor,
            appointment.phone_number,
            appointment.address,
            appointment.visited,
            appointment.confirmed
        );
    }
    Ok(())
}

async fn run_login(config: &Config, receptionist_id: Option<String>) -> Result<()> {
    let api = client::ClinicApi::new(&config.api)?;

    let id = match receptionist_id {
        Some(id) => id,
        None => prompt("Receptionist ID: ").await?,
    };
    let password = prompt("Password: ").await?;

    if api.login(&id, &password).await? {
        println!("Login successful.");
        Ok(())
    } else {
        bail!("Login failed: check receptionist id and password")
    }
}

async fn run_health(config: &Config) -> Result<()> {
    let api = client::ClinicApi::new(&config.api)?;
    let health = api.health().await?;
    println!("Collaborator API: {}", health.status);
    Ok(())
}

async fn prompt(label: &str) -> Result<String> {
    use std::io::Write;
    use tokio::io::{AsyncBufReadExt, BufReader};

    print!("{label}");
    std::io::stdout().flush()?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line.trim().to_string())
}
