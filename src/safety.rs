//! Safety utilities to prevent accidental payload deletion.
//!
//! The batch driver writes one document per release next to real payload
//! captures; these checks validate that an output path can never clobber a
//! source payload file.

use anyhow::{bail, Result};
use std::path::Path;

/// Validates that an output path is safe to overwrite.
///
/// Checks:
/// - Output must have a `.json` extension
/// - Output cannot be the same as any of the provided source payload paths
/// - Output must not look like a raw payload capture
pub fn validate_output_path(output: &Path, source_paths: &[&Path]) -> Result<()> {
    let output_name = output.file_name().and_then(|n| n.to_str()).unwrap_or("");

    if output.extension().and_then(|e| e.to_str()) != Some("json") {
        bail!(
            "Safety check failed: output file '{}' must have a .json extension",
            output.display()
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

    // Raw payload captures use these fixed names; never write over them.
    let payload_names = ["tracker.json", "meta.json", "files.json"];
    if payload_names.contains(&output_name) {
        bail!(
            "Safety check failed: output '{}' matches a payload capture name",
            output.display()
        );
    }

    Ok(())
}
