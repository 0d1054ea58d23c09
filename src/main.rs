//! Vinsmoke Console
//!
//! Headless console entry point

use std::sync::Arc;

use tracing::{info, warn};

use vinsmoke_console::{
    config::Settings,
    link::{LinkMode, LinkState, Notice},
    services::ServiceFactory,
    storage::{FileStore, MemoryStore, StoragePort},
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    logging::init_logging(&settings.logging)?;

    info!("Starting Vinsmoke console...");

    // Initialize client-side storage
    let store: Arc<dyn StoragePort> = match &settings.cache.dir {
        Some(dir) => {
            info!(dir = %dir, "Opening file-backed storage");
            Arc::new(FileStore::open(std::path::Path::new(dir))?)
        }
        None => {
            info!("Using in-memory storage");
            Arc::new(MemoryStore::new())
        }
    };

    // Initialize services
    let services = ServiceFactory::new(settings, store)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("status");

    match command {
        "status" => run_status(&services).await?,
        "refresh" => run_refresh(&services).await?,
        "link" => match args.get(1).map(String::as_str) {
            Some("qr") => run_link_qr(&services).await?,
            Some("pairing") => {
                let phone = args.get(2).map(String::as_str).unwrap_or("");
                run_link_pairing(&services, phone).await?;
            }
            _ => {
                eprintln!("Usage: vinsmoke-console link <qr|pairing> [phone-number]");
                std::process::exit(2);
            }
        },
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Usage: vinsmoke-console [status|refresh|link qr|link pairing <phone>]");
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Print backend health and the cached public dataset counters
async fn run_status(services: &ServiceFactory) -> anyhow::Result<()> {
    let health = services.health_check().await;
    println!("API reachable: {}", health.api_reachable);
    for issue in health.get_issues() {
        println!("  issue: {}", issue);
    }

    let mut provider = services.public_data_provider();
    match provider.refresh(false).await {
        Ok(()) => {
            println!("FAQs:       {}", provider.faqs().len());
            println!("Plugins:    {}", provider.plugins().len());
            println!("Categories: {}", provider.categories().join(", "));
        }
        Err(e) => warn!(error = %e, "Public data unavailable"),
    }

    Ok(())
}

/// Force a network refresh of the public dataset
async fn run_refresh(services: &ServiceFactory) -> anyhow::Result<()> {
    let mut provider = services.public_data_provider();
    provider.refresh(true).await?;
    println!(
        "Refreshed: {} FAQs, {} plugins",
        provider.faqs().len(),
        provider.plugins().len()
    );
    Ok(())
}

/// Drive the QR linking flow until it connects or expires
async fn run_link_qr(services: &ServiceFactory) -> anyhow::Result<()> {
    let mut flow = services.link_flow(LinkMode::Qr);

    println!("Requesting QR linking session...");
    flow.generate_qr(&services.session_api).await?;

    drive_flow(&mut flow).await
}

/// Drive the pairing-code linking flow until it connects or expires
async fn run_link_pairing(services: &ServiceFactory, phone: &str) -> anyhow::Result<()> {
    let mut flow = services.link_flow(LinkMode::Pairing);

    println!("Requesting pairing code for {}...", phone);
    if let Err(e) = flow.generate_pairing(&services.session_api, phone).await {
        for notice in flow.take_notices() {
            print_notice(&notice);
        }
        return Err(e.into());
    }

    drive_flow(&mut flow).await
}

async fn drive_flow(
    flow: &mut vinsmoke_console::LinkFlow<vinsmoke_console::link::WsConnector>,
) -> anyhow::Result<()> {
    let mut shown_qr = 0u32;
    let mut shown_pairing = String::new();

    loop {
        match flow.state() {
            LinkState::AwaitingScan {
                qr_code,
                qr_count,
                seconds_left,
            } => {
                if *qr_count != shown_qr {
                    shown_qr = *qr_count;
                    println!("QR #{} (expires in {}s):", qr_count, seconds_left);
                    println!("{}", qr_code);
                    println!("Open WhatsApp > Linked Devices > Link a Device and scan.");
                }
            }
            LinkState::AwaitingEntry { pairing_code } => {
                if *pairing_code != shown_pairing {
                    shown_pairing = pairing_code.clone();
                    println!("Pairing code: {}", pairing_code);
                    println!("Enter this code in your WhatsApp app.");
                }
            }
            LinkState::Connected { session_id } => {
                println!("Connected! Session ID: {}", session_id);
                return Ok(());
            }
            LinkState::Idle => {
                println!("Flow ended without a connection. Run the command again to retry.");
                return Ok(());
            }
            _ => {}
        }

        flow.step().await?;
        for notice in flow.take_notices() {
            print_notice(&notice);
        }
    }
}

fn print_notice(notice: &Notice) {
    match notice {
        Notice::QrRotated { qr_count } => println!("Fresh QR code generated (#{})", qr_count),
        Notice::QrScanned => println!("QR Code scanned! Connecting..."),
        Notice::Expired { message } => println!("{}", message),
        Notice::Connected { session_id } => println!("Session connected: {}", session_id),
        Notice::Maintenance { message } => println!("Maintenance: {}", message),
    }
}
