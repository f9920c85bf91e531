#![warn(missing_docs)]
//! # consent-lens-app binary
//!
//! CLI entry point: prints runtime configuration, or runs the full
//! scan-and-analyze pipeline over one text file.

use std::sync::Arc;

use consent_lens_analysis::AnalysisCoordinator;
use consent_lens_app::logging::{initialize_logger, log_error, log_info};
use consent_lens_app::{
    AppError, ENV_SCAN_ENABLED, app_version, endpoints_from_env, redact_sensitive,
    run_popup_scan, scan_enabled_from_env,
};
use consent_lens_client::HttpAnalyzerTransport;
use consent_lens_scanner::StaticPageSource;
use consent_lens_store::JsonFileStore;

/// Env var overriding the store file path.
const ENV_STORE_PATH: &str = "CONSENT_LENS_STORE_PATH";

/// CLI entry point.
fn main() {
    if let Err(error) = run() {
        eprintln!("consent-lens failed: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        println!("consent-lens-app {}", app_version());
        println!(
            "scan_enabled={} ({ENV_SCAN_ENABLED})",
            scan_enabled_from_env()
        );
        return Ok(());
    };

    initialize_logger()?;
    log_info("bootstrap", "startup", &format!("version={}", app_version()));

    if !scan_enabled_from_env() {
        println!("scanning is disabled by {ENV_SCAN_ENABLED}");
        return Ok(());
    }

    let text = std::fs::read_to_string(&path)?;
    let store_path = std::env::var(ENV_STORE_PATH)
        .unwrap_or_else(|_| "consent-lens-store.json".to_string());
    let store = Arc::new(JsonFileStore::open(store_path)?);
    let transport = Arc::new(HttpAnalyzerTransport::new()?);
    let coordinator = AnalysisCoordinator::new(transport, store, endpoints_from_env()?);

    let source = StaticPageSource::new(format!("file://{path}"), text);
    let update = run_popup_scan(&coordinator, &source);

    log_info(
        "scan",
        "completed",
        &redact_sensitive(&format!("status={}", update.status)),
    );

    if let Some(notice) = &update.notice {
        println!("{notice}");
    }
    println!("{}", update.status);

    if let Some(card) = &update.card {
        println!("score: {} ({})", card.score, card.label);
        for bullet in &card.bullets {
            println!("- {bullet}");
        }
        if !card.summary.is_empty() {
            println!("{}", card.summary);
        }
        if let Some(link) = &card.full_link {
            println!("full result: {link}");
        }
    } else {
        log_error("scan", "no_result", &update.status);
    }

    Ok(())
}
