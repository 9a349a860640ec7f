//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `recallnote_core` linkage without the Flutter runtime.
//! - With a database path argument, open (and migrate) that store and report
//!   its schema version.

use recallnote_core::db::migrations::{current_version, latest_version};
use recallnote_core::db::open_db;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("recallnote_core ping={}", recallnote_core::ping());
    println!("recallnote_core version={}", recallnote_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match open_db(&db_path).and_then(|conn| current_version(&conn)) {
        Ok(version) => {
            println!("recallnote_core schema={version}/{}", latest_version());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("recallnote_core store {db_path} failed: {err}");
            ExitCode::FAILURE
        }
    }
}
