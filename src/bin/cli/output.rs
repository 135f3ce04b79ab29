//! Output formatting for CLI operations.

use serde_json::json;
use std::path::Path;

use mscz_rename::{FieldKind, SaveReport, TrackEntry};

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats the track table of a score
    fn format_tracks(&self, path: &Path, tracks: &[TrackEntry]) -> String;

    /// Formats the names changed by an edit command
    fn format_changes(
        &self,
        field: FieldKind,
        changes: &[(usize, String)],
        report: Option<&SaveReport>,
    ) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_tracks(&self, path: &Path, tracks: &[TrackEntry]) -> String {
        let mut output = String::new();
        output.push_str(&format!("{}\n", path.display()));

        let cell = |track: &TrackEntry, field: FieldKind| track.name(field).unwrap_or("-").to_string();
        let width = |field: FieldKind, title: &str| {
            tracks
                .iter()
                .map(|t| cell(t, field).chars().count())
                .max()
                .unwrap_or(0)
                .max(title.len())
        };
        let mixer = width(FieldKind::Mixer, "Mixer");
        let midi = width(FieldKind::Midi, "MIDI");

        output.push_str(&format!(
            "{:>4}  {:<mixer$}  {:<midi$}  {}\n",
            "#", "Mixer", "MIDI", "Part"
        ));
        output.push_str(&"-".repeat(mixer + midi + 16));
        output.push('\n');

        for track in tracks {
            output.push_str(&format!(
                "{:>4}  {:<mixer$}  {:<midi$}  {}\n",
                track.index,
                cell(track, FieldKind::Mixer),
                cell(track, FieldKind::Midi),
                cell(track, FieldKind::Part)
            ));
        }

        output.push_str(&"-".repeat(mixer + midi + 16));
        output.push('\n');
        output.push_str(&format!("{} tracks\n", tracks.len()));
        output
    }

    fn format_changes(
        &self,
        field: FieldKind,
        changes: &[(usize, String)],
        report: Option<&SaveReport>,
    ) -> String {
        let mut output = String::new();

        let Some(report) = report else {
            output.push_str(&format!("No {} names changed\n", field));
            return output;
        };

        for (index, name) in changes {
            output.push_str(&format!("{:>4}  {} -> {}\n", index, field, name));
        }
        output.push_str(&format!(
            "Saved {} ({} field(s) changed",
            report.destination.display(),
            report.fields_changed
        ));
        if report.excerpts_updated > 0 {
            output.push_str(&format!(", {} excerpt(s) updated", report.excerpts_updated));
        }
        output.push_str(")\n");
        if let Some(backup) = &report.backup {
            output.push_str(&format!("Backup: {}\n", backup.display()));
        }
        output
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_tracks(&self, path: &Path, tracks: &[TrackEntry]) -> String {
        let items: Vec<_> = tracks
            .iter()
            .map(|t| {
                json!({
                    "index": t.index,
                    "part_id": t.part_id,
                    "mixer": t.name(FieldKind::Mixer),
                    "midi": t.name(FieldKind::Midi),
                    "part": t.name(FieldKind::Part),
                })
            })
            .collect();

        let obj = json!({
            "path": path.display().to_string(),
            "tracks": items,
        });
        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string()) + "\n"
    }

    fn format_changes(
        &self,
        field: FieldKind,
        changes: &[(usize, String)],
        report: Option<&SaveReport>,
    ) -> String {
        let obj = json!({
            "field": field.as_str(),
            "changes": changes.iter().map(|(i, n)| json!({"index": i, "name": n})).collect::<Vec<_>>(),
            "saved": report.is_some(),
            "destination": report.map(|r| r.destination.display().to_string()),
            "backup": report.and_then(|r| r.backup.as_ref()).map(|b| b.display().to_string()),
            "fields_changed": report.map_or(0, |r| r.fields_changed),
            "excerpts_updated": report.map_or(0, |r| r.excerpts_updated),
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string()) + "\n"
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}
