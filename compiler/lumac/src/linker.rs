//! System linker invocation.
//!
//! On Linux the driver runs `ld` directly with the architecture flag,
//! the dynamic-linker path, and the C runtime objects discovered via
//! the host C compiler's `-print-file-name=`. Elsewhere the host C
//! compiler is the simpler fallback. Linker failure surfaces with its
//! stderr preserved.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("cannot spawn linker `{0}`: {1}")]
    Spawn(String, std::io::Error),
    #[error("linker exited with {code:?}:\n{stderr}")]
    Failed { code: Option<i32>, stderr: String },
}

/// C runtime objects needed for a bare `ld` link.
#[derive(Clone, Debug)]
pub struct CrtFiles {
    pub crt1: PathBuf,
    pub crti: PathBuf,
    pub crtn: PathBuf,
}

impl CrtFiles {
    /// Discover the CRT objects via `cc -print-file-name=`.
    pub fn discover() -> Option<CrtFiles> {
        Some(CrtFiles {
            crt1: find_crt_object("crt1.o")?,
            crti: find_crt_object("crti.o")?,
            crtn: find_crt_object("crtn.o")?,
        })
    }
}

/// Ask the host C compiler where a runtime object lives. The compiler
/// echoes the bare name back when it does not know.
pub fn find_crt_object(name: &str) -> Option<PathBuf> {
    let output = Command::new("cc")
        .arg(format!("-print-file-name={name}"))
        .output()
        .ok()?;
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if text.is_empty() || text == name {
        return None;
    }
    let path = PathBuf::from(text);
    path.is_file().then_some(path)
}

/// Argument list for a GNU `ld` invocation on x86-64 Linux.
pub fn ld_args(objects: &[PathBuf], output: &Path, crt: &CrtFiles) -> Vec<String> {
    let mut args = vec![
        "-m".to_string(),
        "elf_x86_64".to_string(),
        "-dynamic-linker".to_string(),
        "/lib64/ld-linux-x86-64.so.2".to_string(),
        crt.crt1.display().to_string(),
        crt.crti.display().to_string(),
    ];
    for object in objects {
        args.push(object.display().to_string());
    }
    args.push("-lc".to_string());
    args.push(crt.crtn.display().to_string());
    args.push("-o".to_string());
    args.push(output.display().to_string());
    args
}

/// Link object files into an executable.
pub fn link(objects: &[PathBuf], output: &Path) -> Result<(), LinkError> {
    if cfg!(target_os = "linux") {
        if let Some(crt) = CrtFiles::discover() {
            return run_linker("ld", &ld_args(objects, output, &crt));
        }
    }
    // Fallback: the host C compiler handles CRT and library ordering.
    let mut args: Vec<String> = objects.iter().map(|o| o.display().to_string()).collect();
    args.push("-o".to_string());
    args.push(output.display().to_string());
    run_linker("cc", &args)
}

fn run_linker(program: &str, args: &[String]) -> Result<(), LinkError> {
    tracing::debug!(linker = program, ?args, "linking");
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|err| LinkError::Spawn(program.to_string(), err))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(LinkError::Failed {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ld_command_shape() {
        let crt = CrtFiles {
            crt1: PathBuf::from("/usr/lib/crt1.o"),
            crti: PathBuf::from("/usr/lib/crti.o"),
            crtn: PathBuf::from("/usr/lib/crtn.o"),
        };
        let objects = vec![PathBuf::from("build/m.o"), PathBuf::from("build/main.o")];
        let args = ld_args(&objects, Path::new("app"), &crt);
        assert_eq!(args[0], "-m");
        assert_eq!(args[1], "elf_x86_64");
        assert_eq!(args[2], "-dynamic-linker");
        assert_eq!(args[3], "/lib64/ld-linux-x86-64.so.2");
        // crt1/crti precede the objects; -lc and crtn follow.
        assert_eq!(args[4], "/usr/lib/crt1.o");
        assert_eq!(args[5], "/usr/lib/crti.o");
        assert_eq!(args[6], "build/m.o");
        assert_eq!(args[7], "build/main.o");
        assert_eq!(args[8], "-lc");
        assert_eq!(args[9], "/usr/lib/crtn.o");
        assert_eq!(&args[10..], ["-o", "app"]);
    }
}
