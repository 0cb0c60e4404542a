//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `orgdir_core` wiring.
//! - Open (or create) a directory database, seed the demo dataset and
//!   report row counts.

use orgdir_core::{
    default_log_level, init_logging, open_db, open_db_in_memory, seed_demo_directory,
    ActivityService, BuildingService, OrganizationService, SeedOutcome, SqliteActivityRepository,
    SqliteBuildingRepository, SqliteOrganizationRepository,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("orgdir: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    println!("orgdir_core ping={}", orgdir_core::ping());
    println!("orgdir_core version={}", orgdir_core::core_version());

    if let Ok(log_dir) = std::env::var("ORGDIR_LOG_DIR") {
        init_logging(default_log_level(), &log_dir)?;
    }

    // First argument selects a database file; without it the probe runs on a
    // throwaway in-memory database.
    let conn = match std::env::args().nth(1) {
        Some(path) => open_db(&path).map_err(|err| format!("failed to open `{path}`: {err}"))?,
        None => open_db_in_memory()
            .map_err(|err| format!("failed to open in-memory database: {err}"))?,
    };

    let outcome = seed_demo_directory(&conn).map_err(|err| format!("seeding failed: {err}"))?;
    println!(
        "seed outcome={}",
        match outcome {
            SeedOutcome::Inserted => "inserted",
            SeedOutcome::AlreadyPresent => "already_present",
        }
    );

    let activities =
        ActivityService::new(SqliteActivityRepository::try_new(&conn).map_err(stringify_err)?);
    let buildings = BuildingService::new(SqliteBuildingRepository::new(&conn));
    let organizations = OrganizationService::new(
        SqliteOrganizationRepository::new(&conn),
        ActivityService::new(SqliteActivityRepository::try_new(&conn).map_err(stringify_err)?),
        SqliteBuildingRepository::new(&conn),
    );

    println!(
        "activities count={}",
        activities.list_activities().map_err(stringify_err)?.len()
    );
    println!(
        "buildings count={}",
        buildings.list_buildings().map_err(stringify_err)?.len()
    );
    println!(
        "organizations count={}",
        organizations
            .list_organizations()
            .map_err(stringify_err)?
            .len()
    );

    Ok(())
}

fn stringify_err(err: impl std::fmt::Display) -> String {
    err.to_string()
}
