use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

/// Expand scan inputs into the export files to read.
///
/// Behavior:
/// - a file input is used as-is
/// - a directory input contributes every `*.json` file below it, in sorted path order
/// - inputs keep their given order; duplicates are dropped after first use
pub fn discover_resource_files(inputs: &[Utf8PathBuf]) -> anyhow::Result<Vec<Utf8PathBuf>> {
    let mut out: Vec<Utf8PathBuf> = Vec::new();
    for input in inputs {
        let meta = std::fs::metadata(input).with_context(|| format!("read {input}"))?;
        if meta.is_dir() {
            let mut found = json_files_under(input)?;
            found.sort();
            if found.is_empty() {
                tracing::warn!(dir = %input, "no .json resource exports found");
            }
            for f in found {
                if !out.contains(&f) {
                    out.push(f);
                }
            }
        } else if !out.contains(input) {
            out.push(input.clone());
        }
    }
    Ok(out)
}

fn json_files_under(dir: &Utf8Path) -> anyhow::Result<Vec<Utf8PathBuf>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk {dir}"))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(path) = Utf8Path::from_path(entry.path()) else {
            tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 path");
            continue;
        };
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            out.push(path.to_path_buf());
        }
    }
    Ok(out)
}
