use std::sync::Arc;

use lead_sync::nav::MemoryNavigator;
use lead_sync::net::api::HttpLeadApi;
use lead_sync::{LeadEngine, SyncConfig};

/// `lead-sync [URL]`: load the inbox for a page URL such as
/// `/leads?status=new&minScore=80` and print it on every change until Ctrl-C.
#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = SyncConfig::from_env().expect("invalid configuration");
    let href = std::env::args().nth(1).unwrap_or_else(|| "/leads".into());

    let api = HttpLeadApi::new(&config.api_base_url, config.timeouts).expect("http client init failed");
    let navigator = Arc::new(MemoryNavigator::from_href(&href));
    tracing::info!(base_url = %config.api_base_url, policy = %config.policy, %href, "lead-sync starting");

    let engine = LeadEngine::new(Arc::new(api), navigator.clone(), config);
    let _ = engine.refresh().await;
    print_inbox(&engine, &navigator);
    engine.start_polling();

    let mut changes = engine.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                if !engine.is_loading() {
                    print_inbox(&engine, &navigator);
                }
            }
        }
    }
    engine.shutdown();
}

fn print_inbox(engine: &LeadEngine, navigator: &MemoryNavigator) {
    if let Some(message) = engine.error() {
        println!("{message}");
        return;
    }

    let view = engine.view();
    println!();
    println!("{} | {} active filters | {}", view.summary(), engine.active_filter_count(), navigator.href());
    for lead in &view.leads {
        let marker = if view.is_top(&lead.id) { '*' } else { ' ' };
        println!(
            "{marker} {:>3} {:<6} {:<10} {} ({}, {})",
            lead.score,
            lead.confidence.label(),
            lead.status.label(),
            lead.name,
            lead.industry,
            lead.location,
        );
    }

    if let Some(detail) = engine.detail() {
        let lead = &detail.lead;
        println!("-- {} --", lead.name);
        println!("   reason: {} | source: {} | product: {}", lead.reason, lead.source, lead.product);
        if let Some(email) = &lead.email {
            println!("   email: {email}");
        }
        if let Some(phone) = &lead.phone {
            println!("   phone: {phone}");
        }
    }
}
