use std::collections::HashSet;

use anyhow::Result;
use owo_colors::OwoColorize;

use weeksync_core::{next_week_start, IdentityStore};

use crate::config::Config;
use crate::schedule;

/// Purely local preview: which path each template would take on the next
/// apply, based on the identity store alone.
pub fn run() -> Result<()> {
    let config = Config::load()?;
    let templates = schedule::load(&config.schedule_path()?)?;

    let store = match IdentityStore::load(&config.store_path()?) {
        Ok(store) => store,
        Err(e) => {
            eprintln!(
                "{}",
                format!("Ignoring unreadable identity store: {}", e).yellow()
            );
            IdentityStore::new()
        }
    };

    let week_start = next_week_start(chrono::Local::now().date_naive());
    println!(
        "{} template(s), next apply targets the week of {}\n",
        templates.len(),
        week_start
    );

    for template in &templates {
        match store.get(&template.title) {
            Some(event_id) => println!(
                "   {} {} {}",
                "~".yellow(),
                template.title,
                format!("will update {}", event_id).dimmed()
            ),
            None => println!(
                "   {} {} {}",
                "+".green(),
                template.title,
                "will create".dimmed()
            ),
        }
    }

    let titles: HashSet<&str> = templates.iter().map(|t| t.title.as_str()).collect();
    let orphans: Vec<_> = store
        .entries()
        .filter(|(title, _)| !titles.contains(title))
        .collect();

    if !orphans.is_empty() {
        println!("\nTracked events with no matching template (untracked after next apply):");
        for (title, event_id) in orphans {
            println!("   {} {} {}", "-".red(), title, event_id.dimmed());
        }
    }

    Ok(())
}
