use std::time::Duration;

use anyhow::Result;
use owo_colors::OwoColorize;

use weeksync_core::{delete_tracked_events, IdentityStore};

use crate::config::Config;
use crate::google::GoogleGateway;
use crate::render;

pub async fn run() -> Result<()> {
    let config = Config::load()?;
    let account = config.require_account()?;

    let store_path = config.store_path()?;
    let store = match IdentityStore::load(&store_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!(
                "{}",
                format!("Ignoring unreadable identity store: {}", e).yellow()
            );
            IdentityStore::new()
        }
    };

    if store.is_empty() {
        println!("No tracked events.");
        return Ok(());
    }

    let gateway = GoogleGateway::connect(account, &config.calendar_id).await?;

    let spinner = render::create_spinner(format!(
        "Wiping {} tracked event(s)...",
        store.len()
    ));
    // Nothing is recreated afterwards, so no settle delay
    let report = delete_tracked_events(&gateway, &store, Duration::ZERO).await;
    spinner.finish_and_clear();

    println!("{}", render::render_cleanup(&report));
    println!("\nRun `weeksync apply` to rebuild the schedule from scratch.");

    Ok(())
}
