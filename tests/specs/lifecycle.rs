//! S1 (start fresh) plus the `stop`/`status` control surface.

use std::time::Duration;

use crate::prelude::*;

#[test]
fn status_reports_not_running_before_start() {
    let city = City::new("status-idle");
    city.write_config(
        r#"
[workspace]
name = "{name}"
"#,
    );

    city.cli().args(&["status"]).fails().stdout_has("not running");
}

#[test]
fn status_cleans_up_a_stale_pid_file() {
    let city = City::new("status-stale");
    city.write_config(
        r#"
[workspace]
name = "{name}"
"#,
    );
    std::fs::create_dir_all(city.dot_dir()).unwrap();
    // A PID no real process will ever hold.
    std::fs::write(city.pid_path(), "999999999\n").unwrap();

    city.cli().args(&["status"]).fails().stdout_has("stale pid file removed");
    assert!(!city.pid_path().exists());
}

#[test]
fn start_then_stop_via_cli_cleans_up_city_files() {
    if !tmux_available() {
        eprintln!("skipping: tmux not available");
        return;
    }

    let city = City::new("lifecycle");
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

    city.cli().args(&["status"]).passes().stdout_has("running");

    city.cli().args(&["stop"]).passes();
    wait_for(|| !city.pid_path().exists() && !city.socket_path().exists());

    let events_text = std::fs::read_to_string(city.events_path()).unwrap();
    assert!(events_text.contains("controller.started"));
    assert!(events_text.contains("controller.stopped"));

    let _ = controller.wait_timeout_or_kill(Duration::from_secs(5));
}

trait WaitOrKill {
    fn wait_timeout_or_kill(&mut self, timeout: Duration) -> std::io::Result<()>;
}

impl WaitOrKill for std::process::Child {
    fn wait_timeout_or_kill(&mut self, timeout: Duration) -> std::io::Result<()> {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout {
            if self.try_wait()?.is_some() {
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        self.kill()
    }
}
