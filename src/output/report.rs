//! Detection and history reporting.

use console::style;
use serde::Serialize;

use crate::error::Result;
use crate::model::{AlbumId, GroupSummary, MediaId, MediaItem};
use crate::similarity::DetectionReport;

/// Media entry as returned to gallery clients.
#[derive(Debug, Serialize)]
struct MediaEntry<'a> {
    id: MediaId,
    name: &'a str,
    album_id: AlbumId,
    file_size: u64,
}

/// Render similar media as a JSON array.
pub fn media_to_json(media: &[MediaItem]) -> Result<String> {
    let entries: Vec<MediaEntry> = media
        .iter()
        .map(|m| MediaEntry {
            id: m.id,
            name: &m.name,
            album_id: m.album_id,
            file_size: m.file_size,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

/// Print the outcome of one detection run.
pub fn print_detection_report(report: &DetectionReport) {
    println!();
    println!(
        "{}",
        style(format!(
            "Similarity group #{} for album {}:",
            report.group_id, report.album_id
        ))
        .bold()
    );
    println!("  Listed:  {}", report.listed);
    println!("  Hashed:  {}", report.hashed);
    if !report.skipped.is_empty() {
        println!("  Skipped: {}", style(report.skipped.len()).yellow());
        for skipped in &report.skipped {
            println!("    {} ({})", skipped.key, skipped.reason);
        }
    }
    println!("  Pairs:   {}", report.memberships.len() / 2);

    if report.media.is_empty() {
        println!("  No similar media found.");
        return;
    }

    println!("  Similar media:");
    for item in &report.media {
        let best = report
            .memberships
            .iter()
            .filter(|m| m.media_id == item.id)
            .map(|m| m.score)
            .max()
            .unwrap_or_default();
        println!(
            "    #{:<6} {:<40} best score {}",
            item.id,
            item.name,
            style(best).green()
        );
    }
}

/// Print an owner's similarity groups.
pub fn print_groups(groups: &[GroupSummary]) {
    if groups.is_empty() {
        println!("No similarity groups recorded.");
        return;
    }

    println!("{}", style("Similarity groups:").bold());
    for summary in groups {
        println!(
            "  #{:<6} {}  {} members",
            summary.group.id,
            summary.group.created_at.format("%Y-%m-%d %H:%M:%S"),
            summary.members
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_to_json() {
        let mut item = MediaItem::new(4, 2, "album-2", "a.jpg");
        item.file_size = 1024;

        let json = media_to_json(&[item]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["id"], 4);
        assert_eq!(value[0]["name"], "a.jpg");
        assert_eq!(value[0]["album_id"], 2);
        assert_eq!(value[0]["file_size"], 1024);
        assert!(value[0].get("path").is_none());
    }

    #[test]
    fn test_empty_media_to_json() {
        assert_eq!(media_to_json(&[]).unwrap(), "[]");
    }
}
