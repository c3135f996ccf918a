//! `vmbeacon browse`: list advertised debug sessions.

use std::time::Duration;

use vmbeacon_discover::{Browser, DiscoverError, DiscoveredSession};

pub async fn run(timeout_secs: u64, json: bool, first: bool) -> anyhow::Result<()> {
    let timeout = Duration::from_secs(timeout_secs);
    let sessions = tokio::task::spawn_blocking(
        move || -> Result<Vec<DiscoveredSession>, DiscoverError> {
            let browser = Browser::new()?;
            if first {
                Ok(browser.browse_one(timeout)?.into_iter().collect())
            } else {
                browser.browse(timeout)
            }
        },
    )
    .await??;

    if json {
        println!("{}", serde_json::to_string_pretty(&to_json(&sessions))?);
    } else if sessions.is_empty() {
        println!("No debug sessions found.");
    } else {
        for session in &sessions {
            println!("{session}");
        }
    }
    Ok(())
}

fn to_json(sessions: &[DiscoveredSession]) -> serde_json::Value {
    sessions
        .iter()
        .map(|session| {
            serde_json::json!({
                "name": session.name,
                "address": session.address.to_string(),
                "record": session.record.to_json(),
            })
        })
        .collect()
}
