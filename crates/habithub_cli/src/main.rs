//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `habithub_core` linkage.
//! - Build the service component from the environment and construct every
//!   shared service once.

use habithub_core::{
    default_log_level, init_logging, AppComponent, AppContext, HabitHubDatabase, ProvisionState,
    StorageLocation,
};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("habithub_core ping={}", habithub_core::ping());
    println!("habithub_core version={}", habithub_core::core_version());

    let context = AppContext::from_env();
    println!("habithub_core storage={:?}", context.storage());

    // Logging failures leave the probe usable; events are simply dropped.
    let log_dir = log_dir_for(&context);
    match init_logging(default_log_level(), &log_dir.to_string_lossy()) {
        Ok(()) => println!("habithub_core log_dir={}", log_dir.display()),
        Err(err) => eprintln!("habithub_core logging disabled: {err}"),
    }

    let component = match AppComponent::new(context) {
        Ok(component) => component,
        Err(err) => {
            eprintln!("habithub_core wiring error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = component.warm_up() {
        eprintln!("habithub_core warm_up error: {err}");
        return ExitCode::FAILURE;
    }

    let graph = component.graph();
    for name in graph.provided_types() {
        println!("habithub_core provided={name}");
    }
    let database_state = graph
        .state::<HabitHubDatabase>()
        .unwrap_or(ProvisionState::Unresolved);
    println!(
        "habithub_core database state={:?} constructions={}",
        database_state,
        graph.construction_count::<HabitHubDatabase>()
    );
    if let Ok(database) = component.database() {
        match database.path() {
            Some(path) => println!("habithub_core database path={}", path.display()),
            None => println!("habithub_core database path=<memory>"),
        }
    }
    ExitCode::SUCCESS
}

fn log_dir_for(context: &AppContext) -> PathBuf {
    match context.storage() {
        StorageLocation::File { data_dir } => data_dir.join("logs"),
        StorageLocation::InMemory => std::env::temp_dir().join("habithub").join("logs"),
    }
}
