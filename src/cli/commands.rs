//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::{Component, Path};

use rosetta_syntax::{Compilation, Severity};

use crate::backend::{EmissionPipeline, EmitResult};
use crate::cancel::CancellationToken;
use crate::config::{EmitConfig, TargetKind};
use crate::frontend::{Diagnostic, DiagnosticBag, LoadOutcome, load_json};

use super::{CliError, CliResult, ExitCode};

/// Maximum program model size (256 MB)
const MAX_PROGRAM_SIZE: u64 = 256 * 1024 * 1024;

/// Read a serialized program model.
///
/// ## Errors
///
/// Returns an error if the file cannot be read or exceeds `MAX_PROGRAM_SIZE`.
pub fn read_program(path: &Path) -> CliResult<String> {
    let shown = path.display();
    let metadata = fs::metadata(path).map_err(|e| CliError::failure(format!("Cannot access file '{shown}': {e}")))?;

    if metadata.len() > MAX_PROGRAM_SIZE {
        return Err(CliError::failure(format!(
            "Program file '{shown}' is too large ({} bytes, max {MAX_PROGRAM_SIZE} bytes)",
            metadata.len(),
        )));
    }

    fs::read_to_string(path).map_err(|e| CliError::failure(format!("Error reading file '{shown}': {e}")))
}

/// Deserialize and load a program for `target`, printing every visible diagnostic.
fn load_program(path: &Path, target: TargetKind) -> CliResult<(Compilation, LoadOutcome)> {
    let json = read_program(path)?;
    let (compilation, outcome) = load_json(&json, target.marker(), &CancellationToken::new())
        .map_err(|e| CliError::failure(format!("Error loading '{}': {e}", path.display())))?;
    print_diagnostics(&outcome.diagnostics);
    Ok((compilation, outcome))
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics.iter().filter(|d| d.severity != Severity::Hidden) {
        eprintln!("{:?}", miette::Report::new(diagnostic.clone()));
    }
}

fn summary(diagnostics: &[Diagnostic]) -> String {
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics.iter().filter(|d| d.severity == Severity::Warning).count();
    format!("{errors} error(s), {warnings} warning(s)")
}

/// `rosetta check`: load only.
pub fn check_program(path: &Path, target: TargetKind) -> CliResult<ExitCode> {
    let (compilation, outcome) = load_program(path, target)?;
    if !outcome.succeeded() {
        return Err(CliError::failure(format!(
            "check failed: {}",
            summary(&outcome.diagnostics)
        )));
    }
    println!(
        "✓ {} type(s) checked for {target}, {} annotation(s) registered ({})",
        compilation.source_types().len(),
        outcome.stats.registered,
        summary(&outcome.diagnostics)
    );
    Ok(ExitCode::SUCCESS)
}

/// `rosetta emit`: load, translate every emittable type and write the files under `out_dir`.
pub fn emit_program(path: &Path, out_dir: &Path, config: &EmitConfig) -> CliResult<ExitCode> {
    validate_output_dir(out_dir)?;
    let (compilation, outcome) = load_program(path, config.target)?;
    if !outcome.succeeded() {
        return Err(CliError::failure(format!(
            "load failed, nothing emitted: {}",
            summary(&outcome.diagnostics)
        )));
    }

    let diagnostics = DiagnosticBag::new();
    let pipeline = EmissionPipeline::new(&compilation, &outcome.registry, config, &diagnostics);
    let types = pipeline.emittable_types();
    let result = pipeline.emit(&types);

    let emitted = diagnostics.into_vec();
    print_diagnostics(&emitted);
    let result = result.map_err(|e| CliError::failure(format!("Emission failed: {e}")))?;

    let written = write_files(out_dir, &result)?;
    println!("✓ {written} file(s) written to {}", out_dir.display());
    Ok(ExitCode::SUCCESS)
}

fn write_files(out_dir: &Path, result: &EmitResult) -> CliResult<usize> {
    for file in result.by_path() {
        let relative = Path::new(&file.path);
        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(CliError::failure(format!(
                "Refusing to write '{}' for {}: path leaves the output directory",
                file.path, file.type_name
            )));
        }
        let target = out_dir.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CliError::failure(format!("Error creating '{}': {e}", parent.display())))?;
        }
        fs::write(&target, &file.text)
            .map_err(|e| CliError::failure(format!("Error writing '{}': {e}", target.display())))?;
        tracing::debug!(path = %target.display(), ty = %file.type_name, "wrote");
    }
    Ok(result.len())
}

/// Validate the output directory to prevent path traversal attacks.
fn validate_output_dir(out_dir: &Path) -> CliResult<()> {
    if out_dir.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(CliError::failure(format!(
            "Output directory '{}' contains path traversal (..)",
            out_dir.display()
        )));
    }

    // Warn about absolute paths (but allow them for flexibility)
    if out_dir.is_absolute() {
        tracing::warn!(
            "Using absolute output path: {}. Consider using a relative path.",
            out_dir.display()
        );
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::EmittedFile;
    use rosetta_syntax::SymbolId;

    #[test]
    fn test_validate_output_dir_rejects_parent_components() {
        assert!(validate_output_dir(Path::new("out/../../etc")).is_err());
        assert!(validate_output_dir(Path::new("out/generated")).is_ok());
    }

    #[test]
    fn test_write_files_rejects_escaping_paths() {
        let mut result = EmitResult::default();
        result.files.insert(
            SymbolId(0),
            EmittedFile {
                path: "../evil.ts".to_string(),
                text: String::new(),
                type_name: "Evil".to_string(),
            },
        );
        let err = write_files(Path::new("out"), &result).unwrap_err();
        assert!(err.message.contains("leaves the output directory"));
    }

    #[test]
    fn test_read_program_reports_missing_file() {
        let err = read_program(Path::new("does/not/exist.json")).unwrap_err();
        assert!(err.message.contains("Cannot access file"));
    }
}
