//! Command implementations for the CLI tool.

use std::io::Write;
use std::path::Path;

use mscz_rename::{ArchiveDocument, FieldKind, OpenOptions, SaveOptions};

use crate::OutputFormat;
use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::create_formatter;

/// Settings shared by the commands that modify a score.
pub struct EditConfig<'a> {
    pub archive: &'a Path,
    pub output: Option<&'a Path>,
    pub open: OpenOptions,
    pub save: &'a SaveOptions,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// List command implementation
pub fn list(archive_path: &Path, open: OpenOptions, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let doc = match open_document(archive_path, open) {
        Ok(doc) => doc,
        Err(code) => return code,
    };

    print_output(&formatter.format_tracks(archive_path, &doc.list_tracks()))
}

/// Rename command implementation
pub fn rename(
    config: &EditConfig<'_>,
    track: usize,
    field: FieldKind,
    name: &str,
    resolve: bool,
) -> ExitCode {
    edit(config, field, |doc| {
        if resolve {
            doc.rename_tracks(field, &[(track, name.to_string())])
        } else {
            doc.rename_track(track, field, name)?;
            Ok(doc
                .pending_changes()
                .into_iter()
                .filter(|edit| edit.field == field)
                .map(|edit| (edit.index, edit.name))
                .collect())
        }
    })
}

/// Dedupe command implementation
pub fn dedupe(config: &EditConfig<'_>, field: FieldKind) -> ExitCode {
    edit(config, field, |doc| Ok(doc.resolve_duplicates(field)))
}

/// Number command implementation
pub fn number(config: &EditConfig<'_>, field: FieldKind) -> ExitCode {
    edit(config, field, |doc| Ok(doc.number_duplicates(field)))
}

/// Opens the score, applies `stage`, and saves if anything changed.
fn edit<F>(config: &EditConfig<'_>, field: FieldKind, stage: F) -> ExitCode
where
    F: FnOnce(&mut ArchiveDocument) -> mscz_rename::Result<Vec<(usize, String)>>,
{
    let formatter = create_formatter(config.format);

    let mut doc = match open_document(config.archive, config.open.clone()) {
        Ok(doc) => doc,
        Err(code) => return code,
    };

    let changes = match stage(&mut doc) {
        Ok(changes) => changes,
        Err(e) => {
            eprintln!("Error: {}", e);
            return error_to_exit_code(&e);
        }
    };

    let report = if doc.is_modified() {
        let destination = config.output.unwrap_or(config.archive);
        match doc.save(destination, config.save) {
            Ok(report) => Some(report),
            Err(e) => {
                eprintln!("Error saving '{}': {}", destination.display(), e);
                return error_to_exit_code(&e);
            }
        }
    } else {
        None
    };

    if config.quiet {
        return ExitCode::Success;
    }
    print_output(&formatter.format_changes(field, &changes, report.as_ref()))
}

fn open_document(path: &Path, options: OpenOptions) -> Result<ArchiveDocument, ExitCode> {
    ArchiveDocument::open_with_options(path, options).map_err(|e| {
        eprintln!("Error opening '{}': {}", path.display(), e);
        error_to_exit_code(&e)
    })
}

fn print_output(text: &str) -> ExitCode {
    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("Error writing output: {}", e);
            ExitCode::FatalError
        }
    }
}
