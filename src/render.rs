//! Terminal rendering of presented screens.
//!
//! Supports a plain-text layout and pretty-printed JSON.

use anyhow::Result;
use serde::Serialize;
use std::fmt::Write;

use crate::present::{DashboardScreen, DetailScreen, StatTriple};

/// How to set up a lot's parking coordinates; the backend owns that step.
pub const CONFIGURE_HINT: &str =
    "Configure coordinates: run `python core/parking_monitor.py` in the backend terminal";

/// Serializes any screen as pretty-printed JSON.
pub fn to_json<S: Serialize>(screen: &S) -> Result<String> {
    Ok(serde_json::to_string_pretty(screen)?)
}

fn write_stats(out: &mut String, indent: &str, stats: &StatTriple) {
    let _ = writeln!(
        out,
        "{indent}Total Slots: {:>4}   Available: {:>4}   Occupied: {:>4}",
        stats.total, stats.available, stats.occupied
    );
}

pub fn dashboard_text(screen: &DashboardScreen) -> String {
    let mut out = String::new();
    match screen {
        DashboardScreen::Loading => out.push_str("Loading parking data...\n"),
        DashboardScreen::Ready { notice, cards } => {
            out.push_str("Parking Monitoring System\n\n");
            if let Some(notice) = notice {
                let _ = writeln!(out, "! {notice}\n");
            }
            for card in cards {
                let _ = writeln!(out, "{}", card.title);
                write_stats(&mut out, "  ", &card.stats);
                let _ = writeln!(out, "  More info: {}", card.details);
            }
        }
    }
    out
}

pub fn detail_text(screen: &DetailScreen) -> String {
    let mut out = String::new();
    match screen {
        DetailScreen::Loading { lot_id } => {
            let _ = writeln!(out, "Loading parking details for lot {lot_id}...");
        }
        DetailScreen::Ready {
            title,
            stats,
            history,
            stream_url,
            notice,
        } => {
            let _ = writeln!(out, "{title}\n");
            if let Some(notice) = notice {
                let _ = writeln!(out, "! {notice}\n");
            }
            write_stats(&mut out, "", stats);
            let _ = writeln!(out, "Live video feed: {stream_url}");
            let _ = writeln!(out, "{CONFIGURE_HINT}");
            if !history.is_empty() {
                let _ = writeln!(out, "\n{:<10} {:>9} {:>9}", "Time", "Available", "Occupied");
                for row in history {
                    let _ = writeln!(
                        out,
                        "{:<10} {:>9} {:>9}",
                        row.time, row.available, row.occupied
                    );
                }
            }
        }
    }
    out
}
