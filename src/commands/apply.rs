use anyhow::Result;
use owo_colors::OwoColorize;

use weeksync_core::{delete_tracked_events, next_week_start, IdentityStore, Reconciler};

use crate::config::Config;
use crate::google::GoogleGateway;
use crate::render;
use crate::schedule;

pub async fn run(rebuild: bool) -> Result<()> {
    let config = Config::load()?;
    let account = config.require_account()?;
    let tz = config.tz()?;
    let templates = schedule::load(&config.schedule_path()?)?;

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

    let gateway = GoogleGateway::connect(account, &config.calendar_id).await?;

    let store = if rebuild && !store.is_empty() {
        let spinner = render::create_spinner(format!(
            "Wiping {} tracked event(s)...",
            store.len()
        ));
        let report = delete_tracked_events(&gateway, &store, config.settle()).await;
        spinner.finish_and_clear();

        println!("{}\n", render::render_cleanup(&report));

        // Rebuild from scratch: every template takes the create path
        IdentityStore::new()
    } else {
        store
    };

    let week_start = next_week_start(chrono::Local::now().date_naive());
    println!(
        "Materializing {} template(s) for the week of {}\n",
        templates.len(),
        week_start
    );

    let reconciler = Reconciler::new(&gateway, tz, week_start);
    let spinner = render::create_spinner("Reconciling...".to_string());
    let report = reconciler.run(&templates, &store).await;
    spinner.finish_and_clear();

    for outcome in &report.outcomes {
        println!("{}", render::render_outcome(outcome));
        for line in render::render_outcome_errors(outcome) {
            println!("   {}", line);
        }
    }

    // Remote changes stand even if the snapshot fails to persist; the next
    // run recreates whatever it can't find in the store.
    if let Err(e) = report.store.save(&store_path) {
        eprintln!(
            "{}",
            format!("Failed to save identity store: {}", e).red()
        );
    }

    println!("\n{}", render::render_reconcile_summary(&report));

    Ok(())
}
