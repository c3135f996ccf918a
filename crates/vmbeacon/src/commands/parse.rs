//! `vmbeacon parse`: decode a TXT record and print its JSON export.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use tracing::debug;
use vmbeacon_discover::ObservationRecord;

pub fn run(file: Option<&Path>) -> anyhow::Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            text
        }
    };

    debug!(bytes = text.len(), "Parsing observation record");
    println!("{}", render(&text)?);
    Ok(())
}

fn render(text: &str) -> anyhow::Result<String> {
    let Some(record) = ObservationRecord::parse(text) else {
        bail!("malformed observation record");
    };
    Ok(serde_json::to_string_pretty(&record.to_json())?)
}
