//! Discord webhook notifications
//!
//! The webhook has a message-size limit, so each result list is chunked into
//! groups of at most 20 entries and every chunk goes out as its own embed.
//! Notification failures are logged and never fail the run.

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error};

use crate::sync::engine::BatchReport;

const SUCCESS_COLOR: u32 = 2_605_644;
const FAILURE_COLOR: u32 = 16_753_920;
const CHUNK_SIZE: usize = 20;

pub struct DiscordNotifier {
    webhook_url: String,
    http: Client,
}

impl DiscordNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            http: Client::new(),
        }
    }

    /// Send the batched run summary.
    pub async fn send_report(&self, report: &BatchReport) {
        for chunk in chunks_of(&report.downloaded, CHUNK_SIZE) {
            if let Err(err) = self
                .send_embed("SpotiLoader Downloads", &download_message(&chunk), SUCCESS_COLOR)
                .await
            {
                error!("Failed to send download notification: {err:#}");
            }
        }

        for chunk in chunks_of(&report.errors, CHUNK_SIZE) {
            if let Err(err) = self
                .send_embed("SpotiLoader Errors", &error_message(&chunk), FAILURE_COLOR)
                .await
            {
                error!("Failed to send error notification: {err:#}");
            }
        }
    }

    async fn send_embed(&self, title: &str, description: &str, color: u32) -> Result<()> {
        let body = json!({
            "content": null,
            "embeds": [{
                "title": title,
                "description": description,
                "color": color,
            }],
        });

        self.http
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .context("Failed to POST webhook")?
            .error_for_status()
            .context("Webhook rejected the notification")?;

        debug!("Sent notification: {title}");
        Ok(())
    }
}

fn download_message(chunk: &[String]) -> String {
    let mut lines = vec![
        "@everyone".to_string(),
        "**Downloaded songs : **".to_string(),
        format!("{} tracks successfully downloaded", chunk.len()),
    ];
    lines.extend(chunk.iter().cloned());
    lines.join("\n")
}

fn error_message(chunk: &[String]) -> String {
    let mut lines = vec![
        "**Errors when downloading songs : **".to_string(),
        "@everyone".to_string(),
    ];
    lines.extend(chunk.iter().cloned());
    lines.join("\n")
}

/// Split entries into groups of at most `size`, dropping empty entries.
/// An empty input produces no groups at all.
fn chunks_of(entries: &[String], size: usize) -> Vec<Vec<String>> {
    entries
        .iter()
        .filter(|entry| !entry.trim().is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .chunks(size)
        .map(|chunk| chunk.to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("track {i}")).collect()
    }

    #[test]
    fn forty_five_entries_make_three_chunks() {
        let chunks = chunks_of(&entries(45), CHUNK_SIZE);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 20);
        assert_eq!(chunks[1].len(), 20);
        assert_eq!(chunks[2].len(), 5);
    }

    #[test]
    fn empty_entries_are_dropped() {
        let mut input = entries(3);
        input.push(String::new());
        input.push("   ".to_string());

        let chunks = chunks_of(&input, CHUNK_SIZE);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 3);
    }

    #[test]
    fn empty_list_sends_nothing() {
        assert!(chunks_of(&[], CHUNK_SIZE).is_empty());
    }

    #[test]
    fn download_message_leads_with_mention_and_count() {
        let msg = download_message(&entries(2));
        let lines: Vec<&str> = msg.lines().collect();
        assert_eq!(lines[0], "@everyone");
        assert_eq!(lines[1], "**Downloaded songs : **");
        assert_eq!(lines[2], "2 tracks successfully downloaded");
        assert_eq!(lines[3], "track 0");
        assert_eq!(lines[4], "track 1");
    }

    #[test]
    fn error_message_header_precedes_mention() {
        let msg = error_message(&entries(1));
        let lines: Vec<&str> = msg.lines().collect();
        assert_eq!(lines[0], "**Errors when downloading songs : **");
        assert_eq!(lines[1], "@everyone");
        assert_eq!(lines[2], "track 0");
    }
}
