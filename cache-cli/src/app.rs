use clap::Subcommand;
use event_cache::{CacheOperations, EventCache, EventId, GroupId, Reconciler};
use shared::{Error, Result};
use std::io::Write;
use tracing::info;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Load a group's events (cache first, then server) and print them as JSON
    Show { group: String },
    /// Drop the group's cache entry and fetch everything again
    Refresh { group: String },
    /// Remove one event from a group's cache entry
    Evict { group: String, event: String },
    /// Remove a group's cache entry
    Clear { group: String },
    /// Remove every cached group
    SignOut,
    /// Delete expired or unreadable entries
    Purge,
}

/// Everything a command needs, built once at startup
pub struct App {
    cache: EventCache,
    reconciler: Reconciler,
}

impl App {
    pub fn new(cache: EventCache, reconciler: Reconciler) -> Self {
        Self { cache, reconciler }
    }

    pub async fn run(&self, command: Commands, out: &mut impl Write) -> Result<()> {
        match command {
            Commands::Show { group } => {
                let events = self.reconciler.load(&GroupId::from(group)).await?;
                print_json(out, &events)
            }
            Commands::Refresh { group } => {
                let events = self.reconciler.refresh(&GroupId::from(group)).await?;
                print_json(out, &events)
            }
            Commands::Evict { group, event } => {
                let event_id = parse_event_id(&event);
                let removed = self
                    .cache
                    .clear_event(&GroupId::from(group.clone()), &event_id)
                    .await;
                if removed {
                    info!("Evicted event '{}' from group '{}'", event_id, group);
                }
                print_line(out, if removed { "evicted" } else { "not cached" })
            }
            Commands::Clear { group } => {
                self.cache.clear_group(&GroupId::from(group)).await?;
                print_line(out, "cleared")
            }
            Commands::SignOut => {
                self.cache.clear_all().await?;
                info!("Cleared all cached groups");
                print_line(out, "signed out")
            }
            Commands::Purge => {
                let purged = self.cache.purge_expired().await?;
                print_line(out, &format!("purged {}", purged))
            }
        }
    }
}

/// Numeric ids address integer events, anything else a string id
pub fn parse_event_id(raw: &str) -> EventId {
    match raw.trim().parse::<i64>() {
        Ok(id) => EventId::Int(id),
        Err(_) => EventId::Text(raw.to_string()),
    }
}

fn print_json(out: &mut impl Write, value: &impl serde::Serialize) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    print_line(out, &rendered)
}

fn print_line(out: &mut impl Write, line: &str) -> Result<()> {
    writeln!(out, "{}", line).map_err(|e| Error::Internal(format!("Failed to write output: {}", e)))
}
