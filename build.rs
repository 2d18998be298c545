//! Build script for complaint-tracker
//!
//! The schema migrations are embedded into the binary by `sqlx::migrate!`,
//! which does not track the directory on its own. This script makes Cargo
//! rebuild whenever a migration is added or edited.

use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=migrations");

    let migrations_dir = Path::new("migrations");
    if !migrations_dir.exists() {
        println!("cargo:warning=migrations directory not found, schema will be empty");
        return;
    }

    // Individual files too, so edits to an existing migration are picked up
    if let Ok(entries) = fs::read_dir(migrations_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|ext| ext == "sql").unwrap_or(false) {
                println!("cargo:rerun-if-changed={}", path.display());
            }
        }
    }
}
