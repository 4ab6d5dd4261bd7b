//! Build script for vmprint
//!
//! Compiles the C variadic shim that turns a printf-style `...` call into a
//! typed argument array for the Rust formatter.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=csrc/vmprint_variadic.c");
    println!("cargo:rerun-if-changed=include/vmprint.h");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => panic!("CARGO_MANIFEST_DIR not set: {}", e),
    };

    cc::Build::new()
        .file(manifest_dir.join("csrc").join("vmprint_variadic.c"))
        .include(manifest_dir.join("include"))
        .flag_if_supported("-std=c99")
        .warnings(true)
        .compile("vmprint_variadic");
}
