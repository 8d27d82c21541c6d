//! File utility functions for listing and filtering files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Returns paths to all regular files in `dir` whose file name ends with `suffix`.
///
/// The result is sorted by file name. A missing directory yields an empty list,
/// any other read failure is returned.
pub fn files_with_suffix(dir: &Path, suffix: &str) -> io::Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .is_some_and(|name| name.ends_with(suffix))
        })
        .collect();
    files.sort();

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_with_suffix_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_000016spp.hdr.exr", "a_000004spp.hdr.exr", "a.var.exr", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("sub_spp.hdr.exr")).unwrap();

        let files = files_with_suffix(dir.path(), "spp.hdr.exr").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a_000004spp.hdr.exr", "b_000016spp.hdr.exr"]);
    }

    #[test]
    fn test_files_with_suffix_missing_dir() {
        let files = files_with_suffix(Path::new("/definitely/not/here"), ".exr").unwrap();
        assert!(files.is_empty());
    }
}
