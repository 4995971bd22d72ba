//! Wraps the generated `src/grammar.json` into the bundled grammar artifact.

use std::path::{Path, PathBuf};

#[allow(dead_code)]
#[path = "src/artifact/header.rs"]
mod header;

fn main() {
    let grammar_path = Path::new("src").join("grammar.json");
    println!("cargo:rerun-if-changed={}", grammar_path.display());
    println!("cargo:rerun-if-changed=src/artifact/header.rs");

    let payload = match std::fs::read(&grammar_path) {
        Ok(payload) => payload,
        Err(e) => panic!("failed to read {}: {e}", grammar_path.display()),
    };
    let Some(header) = header::ArtifactHeader::for_payload(&payload, header::ABI_VERSION) else {
        panic!("{} is too large to bundle", grammar_path.display());
    };

    let mut artifact = Vec::with_capacity(header::HEADER_LEN + payload.len());
    artifact.extend_from_slice(&header.to_bytes());
    artifact.extend_from_slice(&payload);

    let Some(out_dir) = std::env::var_os("OUT_DIR").map(PathBuf::from) else {
        panic!("OUT_DIR is not set");
    };
    let out_path = out_dir.join("renpy.grammar");
    if let Err(e) = std::fs::write(&out_path, artifact) {
        panic!("failed to write {}: {e}", out_path.display());
    }
}
