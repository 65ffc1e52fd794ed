//! Guard against overwriting playlist exports with generated output.

use anyhow::{bail, Result};
use std::path::Path;

/// Extensions of files this tool reads and must never write over
const INPUT_EXTENSIONS: [&str; 1] = ["csv"];

/// Validates that an output path is safe to overwrite.
///
/// Checks:
/// - Output filename must contain the required pattern (e.g., "failed_tracks")
/// - Output cannot be the same as any of the provided source paths
/// - Output cannot carry an input extension
pub fn validate_output_path(
    output: &Path,
    required_pattern: &str,
    source_paths: &[&Path],
) -> Result<()> {
    let output_name = output.file_name().and_then(|n| n.to_str()).unwrap_or("");

    if !output_name.contains(required_pattern) {
        bail!(
            "Safety check failed: output file '{}' must contain '{}' in the name",
            output.display(),
            required_pattern
        );
    }

    for source in source_paths {
        if output == *source {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    let extension = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    if let Some(extension) = extension {
        if INPUT_EXTENSIONS.contains(&extension.as_str()) {
            bail!(
                "Safety check failed: output '{}' has input extension '.{}'",
                output.display(),
                extension
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_report_path() {
        let output = PathBuf::from("/music/road_trip_failed_tracks.html");
        let source = PathBuf::from("/music/road_trip.csv");
        assert!(validate_output_path(&output, "failed_tracks", &[&source]).is_ok());
    }

    #[test]
    fn test_missing_pattern() {
        let output = PathBuf::from("/music/report.html");
        let source = PathBuf::from("/music/road_trip.csv");
        let result = validate_output_path(&output, "failed_tracks", &[&source]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must contain 'failed_tracks'"));
    }

    #[test]
    fn test_output_equals_source() {
        let path = PathBuf::from("/music/old_failed_tracks.html");
        let result = validate_output_path(&path, "failed_tracks", &[&path]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("cannot be the same as source"));
    }

    #[test]
    fn test_csv_output_blocked() {
        let output = PathBuf::from("/music/failed_tracks.CSV");
        let source = PathBuf::from("/music/road_trip.csv");
        assert!(validate_output_path(&output, "failed_tracks", &[&source]).is_err());
    }
}
