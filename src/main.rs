use clap::Parser;
use env_logger::Builder;
use eyre::{eyre, Result};
use log::{debug, LevelFilter};

use gmail_thread_probe::cfg::client_secrets::ClientSecrets;
use gmail_thread_probe::cfg::config::load_config;
use gmail_thread_probe::cli::Cli;
use gmail_thread_probe::gmail::GmailClient;
use gmail_thread_probe::oauth2::{CredentialStore, GoogleAuthorizer};
use gmail_thread_probe::probe::ThreadingProbe;
use gmail_thread_probe::{RealClock, RealPacer};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still wins over the defaults below
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module(
            "gmail_thread_probe",
            if cli.debug { LevelFilter::Debug } else { LevelFilter::Info },
        )
        .parse_default_env()
        .try_init()
        .ok();

    let config = load_config(&cli.config)?.apply_cli(&cli);
    debug!("Effective configuration: {:?}", config);

    println!("Gmail Threading Test Script");
    println!("This script will test different Gmail API approaches to ensure emails thread correctly.");
    println!();

    if !config.credentials_path.exists() {
        println!("❌ {} not found!", config.credentials_path.display());
        println!(
            "Please download your OAuth2 credentials from Google Cloud Console and save as '{}'",
            config.credentials_path.display()
        );
        return Err(eyre!("missing OAuth client credentials"));
    }

    let secrets = ClientSecrets::load(&config.credentials_path)?;
    let store = CredentialStore::new(&config.token_path, GoogleAuthorizer::new(secrets), RealClock);
    let client = GmailClient::new(store);

    let mut probe = ThreadingProbe::new(client, RealPacer, config.probe_settings());
    probe.run()?;

    Ok(())
}
