//! Luma compiler CLI.

use std::path::PathBuf;

use lumac::{build, exit, BuildOptions};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();
    std::process::exit(run(&args));
}

fn run(args: &[String]) -> i32 {
    let mut source: Option<PathBuf> = None;
    let mut output_name: Option<String> = None;
    let mut save_intermediates = false;
    let mut clean = false;
    let mut sanitize = true;
    let mut opt_level: u8 = 2;
    let mut extra_objects: Vec<PathBuf> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-v" | "--version" => {
                println!("lumac {VERSION}");
                return exit::OK;
            }
            "-h" | "--help" => {
                print_usage();
                return exit::OK;
            }
            "-lc" | "--license" => {
                println!("lumac is dual-licensed under MIT OR Apache-2.0.");
                return exit::OK;
            }
            "-lsp" | "--lsp" => {
                eprintln!("lumac: language-server mode is not available in this build");
                return exit::USAGE;
            }
            "fmt" | "format" | "-fc" | "--format-check" | "-fi" | "--format-in-place" => {
                eprintln!("lumac: the formatter is not available in this build");
                return exit::USAGE;
            }
            "-name" => {
                let Some(name) = args.get(i + 1) else {
                    eprintln!("lumac: `-name` requires a value");
                    return exit::USAGE;
                };
                output_name = Some(name.clone());
                i += 1;
            }
            "-save" => save_intermediates = true,
            "-clean" => clean = true,
            "--no-sanitize" | "-no-sanitize" => sanitize = false,
            "-O0" => opt_level = 0,
            "-O1" => opt_level = 1,
            "-O2" => opt_level = 2,
            "-O3" => opt_level = 3,
            "-l" | "-link" => {
                // Object and archive files following the flag.
                while let Some(next) = args.get(i + 1) {
                    if next.starts_with('-') || !(next.ends_with(".o") || next.ends_with(".a")) {
                        break;
                    }
                    extra_objects.push(PathBuf::from(next));
                    i += 1;
                }
                if extra_objects.is_empty() {
                    eprintln!("lumac: `{arg}` requires at least one object file");
                    return exit::USAGE;
                }
            }
            _ if arg.starts_with('-') => {
                eprintln!("lumac: unknown option `{arg}`");
                print_usage();
                return exit::USAGE;
            }
            _ => {
                if source.is_some() {
                    eprintln!("lumac: exactly one source file may be given");
                    return exit::USAGE;
                }
                source = Some(PathBuf::from(arg));
            }
        }
        i += 1;
    }

    let Some(source) = source else {
        print_usage();
        return exit::USAGE;
    };

    let mut options = BuildOptions::new(source);
    options.output_name = output_name;
    options.save_intermediates = save_intermediates;
    options.clean = clean;
    options.sanitize = sanitize;
    options.opt_level = opt_level;
    options.extra_objects = extra_objects;
    build(&options)
}

fn print_usage() {
    println!("Usage: lumac [options] <file.lx>");
    println!();
    println!("Options:");
    println!("  -v, --version          Print version and exit");
    println!("  -h, --help             Print this help and exit");
    println!("  -lc, --license         Print license and exit");
    println!("  -lsp, --lsp            Enter language-server mode");
    println!("  -name <n>              Output executable name");
    println!("  -save                  Preserve intermediate object files");
    println!("  -clean                 Remove build artifacts before building");
    println!("  --no-sanitize          Disable the runtime sanitizer pass");
    println!("  fmt | format           Run the formatter instead of compiling");
    println!("  -fc, --format-check    Exit 1 if any input would be reformatted");
    println!("  -fi, --format-in-place Rewrite the input file");
    println!("  -l, -link <files...>   Additional object files for the linker");
    println!("  -O0 | -O1 | -O2 | -O3  Optimization level (default 2)");
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("LUMAC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
