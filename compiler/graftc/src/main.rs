//! graftc: apply overlays to classes from the command line.

use graftc::commands::{apply_file, explain_error, parse_apply_options};

fn main() {
    graftc::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "apply" => {
            if args.len() < 3 || args[2].starts_with('-') {
                eprintln!("Usage: graftc apply <bundle.json> [options]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  -o <path>             Output file (default: stdout)");
                eprintln!("  --priority=<n>        Priority for overlays that declare none");
                eprintln!("  --strict-overwrite    Missing overwrite targets are errors");
                eprintln!("  --no-parallel         Process classes on one thread");
                std::process::exit(1);
            }
            let options = parse_apply_options(&args[3..]);
            apply_file(&args[2], &options);
        }
        "explain" | "--explain" => {
            if args.len() < 3 {
                eprintln!("Usage: graftc explain <code>");
                std::process::exit(1);
            }
            explain_error(&args[2]);
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-V" => {
            println!("graftc {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("graftc: overlay merge driver");
    println!();
    println!("Usage: graftc <command> [options]");
    println!();
    println!("Commands:");
    println!("  apply <bundle.json>  Apply the bundle's overlays to its classes");
    println!("  explain <code>       Explain a diagnostic code (e.g., G2001)");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Apply options:");
    println!("  -o <path>             Output file (default: stdout)");
    println!("  --priority=<n>        Priority for overlays that declare none");
    println!("  --strict-overwrite    Missing overwrite targets are errors");
    println!("  --no-parallel         Process classes on one thread");
    println!();
    println!("Environment:");
    println!("  RUST_LOG              Enable tracing (e.g., graft_mixin=debug)");
    println!("  GRAFT_LOG_TREE        Render tracing as an indented span tree");
    println!("  GRAFT_*               Session defaults (see MixinConfig)");
}
