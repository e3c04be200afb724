//! Standard-library path resolution.
//!
//! An import like `std/io` resolves against, in order: the system
//! install path, the per-user path, and `./std/` relative to the
//! working directory, each trying the `.lx` then `.luma` extension.
//! Anything unresolved is tried as a literal path.

use std::path::{Path, PathBuf};

const EXTENSIONS: [&str; 2] = ["lx", "luma"];

/// The `std/` search roots for this host, in priority order.
pub fn search_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    #[cfg(unix)]
    {
        roots.push(PathBuf::from("/usr/local/lib/lumac/std"));
        if let Ok(home) = std::env::var("HOME") {
            roots.push(Path::new(&home).join(".lumac/std"));
        }
    }
    #[cfg(windows)]
    {
        if let Ok(program_files) = std::env::var("ProgramFiles") {
            roots.push(Path::new(&program_files).join("lumac").join("std"));
        }
        if let Ok(profile) = std::env::var("USERPROFILE") {
            roots.push(Path::new(&profile).join(".lumac").join("std"));
        }
    }
    roots.push(PathBuf::from("./std"));
    roots
}

/// Resolve an import path to an existing file, or `None`.
pub fn resolve_import(import: &str) -> Option<PathBuf> {
    resolve_with_roots(import, &search_roots())
}

/// Resolution against explicit roots (testable without a real install).
pub fn resolve_with_roots(import: &str, roots: &[PathBuf]) -> Option<PathBuf> {
    if let Some(rest) = import.strip_prefix("std/") {
        for root in roots {
            for ext in EXTENSIONS {
                let candidate = root.join(format!("{rest}.{ext}"));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
    }
    // Fall back to the import path literally, absolute or relative.
    let literal = PathBuf::from(import);
    if literal.is_file() {
        return Some(literal);
    }
    for ext in EXTENSIONS {
        let candidate = PathBuf::from(format!("{import}.{ext}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn std_imports_try_lx_before_luma() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("io.lx"), "@module \"std/io\"\n").expect("write");
        std::fs::write(dir.path().join("io.luma"), "@module \"std/io\"\n").expect("write");
        let resolved = resolve_with_roots("std/io", &[dir.path().to_path_buf()]);
        assert_eq!(resolved, Some(dir.path().join("io.lx")));
    }

    #[test]
    fn falls_back_to_later_roots() {
        let empty = tempfile::tempdir().expect("tempdir");
        let full = tempfile::tempdir().expect("tempdir");
        std::fs::write(full.path().join("fs.luma"), "@module \"std/fs\"\n").expect("write");
        let resolved = resolve_with_roots(
            "std/fs",
            &[empty.path().to_path_buf(), full.path().to_path_buf()],
        );
        assert_eq!(resolved, Some(full.path().join("fs.luma")));
    }

    #[test]
    fn literal_paths_resolve_with_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("util.lx");
        std::fs::write(&file, "@module \"util\"\n").expect("write");
        let import = dir.path().join("util").display().to_string();
        assert_eq!(resolve_with_roots(&import, &[]), Some(PathBuf::from(format!("{import}.lx"))));
    }

    #[test]
    fn unresolved_imports_return_none() {
        assert_eq!(resolve_with_roots("std/definitely_missing", &[]), None);
    }
}
