use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File stems of the `*.json` files directly inside `dir`, sorted.
pub fn list_json_stems(dir: &Path) -> Vec<String> {
    let mut stems: Vec<String> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("json"))
        })
        .filter_map(|entry| {
            entry
                .path()
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .collect();
    stems.sort();
    stems
}

/// Stages every file next to its target, then renames them into place.
/// Nothing is renamed unless every file was staged.
pub fn write_all_atomic(files: &[(PathBuf, String)]) -> io::Result<()> {
    let mut staged = Vec::with_capacity(files.len());

    for (path, content) in files {
        let tmp = staging_path(path);
        if let Err(err) = fs::write(&tmp, content) {
            for (tmp, _) in &staged {
                let _ = fs::remove_file(tmp);
            }
            return Err(err);
        }
        staged.push((tmp, path));
    }

    for (tmp, path) in staged {
        fs::rename(&tmp, path)?;
    }

    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
