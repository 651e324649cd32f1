//! `gc agent drain|undrain|drain-check|drain-ack|request-restart` — acting
//! directly on a session's metadata bag, independent of whether a
//! controller process is currently running for the city.

use crate::prelude::*;

#[test]
fn drain_cycle_via_explicit_name() {
    if !tmux_available() {
        eprintln!("skipping: tmux not available");
        return;
    }

    let city = City::new("drain-explicit");
    city.write_config(
        r#"
[workspace]
name = "{name}"

[[agents]]
name = "mayor"
start_command = "sh -c 'while true; do sleep 3600; done'"
"#,
    );

    let mut controller = city.start_and_wait();

    city.cli().args(&["agent", "drain-check", "mayor"]).fails().stdout_has("not draining");

    city.cli().args(&["agent", "drain", "mayor"]).passes();
    city.cli().args(&["agent", "drain-check", "mayor"]).passes().stdout_has("draining");

    city.cli().args(&["agent", "drain-ack", "mayor"]).passes();

    city.cli().args(&["agent", "undrain", "mayor"]).passes();
    city.cli().args(&["agent", "drain-check", "mayor"]).fails().stdout_has("not draining");

    city.cli().args(&["stop"]).passes();
    let _ = controller.kill();
}

#[test]
fn drain_check_defaults_to_gc_session_env_var() {
    if !tmux_available() {
        eprintln!("skipping: tmux not available");
        return;
    }

    let city = City::new("drain-implicit");
    city.write_config(
        r#"
[workspace]
name = "{name}"

[[agents]]
name = "mayor"
start_command = "sh -c 'while true; do sleep 3600; done'"
"#,
    );

    let mut controller = city.start_and_wait();
    let session = format!("{}--mayor", city.name());

    city.cli()
        .env("GC_SESSION", &session)
        .args(&["agent", "drain-check"])
        .fails()
        .stdout_has("not draining");

    city.cli().args(&["agent", "drain", "mayor"]).passes();

    city.cli()
        .env("GC_SESSION", &session)
        .args(&["agent", "drain-check"])
        .passes()
        .stdout_has("draining");

    city.cli().args(&["stop"]).passes();
    let _ = controller.kill();
}

#[test]
fn agent_commands_without_name_or_env_var_fail() {
    let city = City::new("drain-no-target");
    city.write_config(
        r#"
[workspace]
name = "{name}"
"#,
    );

    city.cli().args(&["agent", "drain-check"]).fails();
}

#[test]
fn request_restart_via_explicit_name() {
    if !tmux_available() {
        eprintln!("skipping: tmux not available");
        return;
    }

    let city = City::new("restart-request");
    city.write_config(
        r#"
[workspace]
name = "{name}"

[[agents]]
name = "mayor"
start_command = "sh -c 'while true; do sleep 3600; done'"
"#,
    );

    let mut controller = city.start_and_wait();
    city.cli().args(&["agent", "request-restart", "mayor"]).passes();

    city.cli().args(&["stop"]).passes();
    let _ = controller.kill();
}
