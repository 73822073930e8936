//! Integration tests for the `validate` command.
use emroute::cli::handle_validate_command;
use emroute::settings::Settings;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

/// Get the path to a demo scenario.
fn get_scenario_dir(name: &str) -> PathBuf {
    PathBuf::from("demos").join(name)
}

/// An integration test for the `validate` command.
#[test]
fn test_handle_validate_command() {
    unsafe { std::env::set_var("EMROUTE_LOG_LEVEL", "off") };

    for name in ["diamond", "grid"] {
        handle_validate_command(&get_scenario_dir(name), Some(Settings::default())).unwrap();
    }
}

/// An edge with a negative capacity is rejected
#[test]
fn test_handle_validate_command_invalid() {
    unsafe { std::env::set_var("EMROUTE_LOG_LEVEL", "off") };

    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("edges.csv"),
        "from,to,distance,capacity\nO,A,1,10\nA,O,1,-5\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("commodities.csv"),
        "id,origin,destination,priority,desired_flow\nc1,O,A,mild,5\n",
    )
    .unwrap();

    let err = handle_validate_command(dir.path(), Some(Settings::default())).unwrap_err();
    assert_eq!(
        format!("{err:#}"),
        format!(
            "Failed to validate scenario.: Error reading {}: Invalid graph: Edge A -> O must \
             have a finite capacity greater than zero (got -5)",
            dir.path().join("edges.csv").display()
        )
    );
}
