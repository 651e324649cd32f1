//! `gc events list` and `gc events watch` (S6: watch returns on a matching
//! payload, empty on timeout).

use crate::prelude::*;

#[test]
fn list_is_empty_before_any_events_are_recorded() {
    let city = City::new("events-empty");
    city.write_config(
        r#"
[workspace]
name = "{name}"
"#,
    );

    city.cli().args(&["events", "list"]).passes().stdout_has("");
}

#[test]
fn watch_times_out_with_no_match() {
    let city = City::new("events-timeout");
    city.write_config(
        r#"
[workspace]
name = "{name}"
"#,
    );

    let result = city
        .cli()
        .args(&["events", "watch", "--after-seq", "0", "--type", "controller.started", "--deadline", "1"])
        .fails();
    assert_eq!(result.stdout(), "");
}

#[test]
fn start_then_list_and_watch_see_the_startup_event() {
    if !tmux_available() {
        eprintln!("skipping: tmux not available");
        return;
    }

    let city = City::new("events-live");
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

    city.cli()
        .args(&["events", "list", "--type", "controller.started"])
        .passes()
        .stdout_has("controller.started");

    city.cli()
        .args(&["events", "watch", "--after-seq", "0", "--type", "controller.started", "--deadline", "5"])
        .passes()
        .stdout_has("controller.started");

    city.cli().args(&["stop"]).passes();
    let _ = controller.kill();
}
