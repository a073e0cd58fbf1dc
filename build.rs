use std::fs;
use std::path::PathBuf;

/// Modules that must stay pure numerics: no file access, no serialization formats.
const NUMERIC_CORE: [&str; 5] = [
    "basis.rs",
    "construction.rs",
    "simplex.rs",
    "distribution.rs",
    "estimate.rs",
];

fn main() {
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src");

    enforce_numeric_core_boundary();
}

fn enforce_numeric_core_boundary() {
    // Lightweight guard: persistence belongs to `fixture` and `diagnostics`.
    let forbidden = ["std::fs", "File::", "csv::", "serde_json::", "println!"];

    let mut violations = Vec::new();
    let src_root = PathBuf::from("src");
    for name in NUMERIC_CORE {
        let path = src_root.join(name);
        let src = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(_) => continue,
        };
        for (line_no, line) in src.lines().enumerate() {
            for token in &forbidden {
                if line.contains(token) {
                    violations.push(format!(
                        "{}:{} contains forbidden token '{}'",
                        path.display(),
                        line_no + 1,
                        token
                    ));
                }
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\nerror: I/O leaked into numeric core modules:");
        for v in violations {
            eprintln!("  - {v}");
        }
        panic!("I/O in metalog numeric core modules");
    }
}
