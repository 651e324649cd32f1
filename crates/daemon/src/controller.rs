// SPDX-License-Identifier: MIT

//! The controller: the long-lived process that owns one city, reconciling
//! its desired agent population against reality until told to stop.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gc_adapters::SessionAdapter;
use gc_config::CityConfig;
use gc_core::{event_type, Event, SessionName};
use gc_engine::{CrashTracker, IdleTracker, Reconciler, SessionDrainOps, SessionReconcileOps};
use gc_storage::EventRecorder;
use fs2::FileExt;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::error::LifecycleError;
use crate::paths::CityPaths;

/// Compiled-in restart policy: not configurable via `city.toml` — one of the
/// two acceptable process-wide defaults alongside the patrol interval.
const DEFAULT_MAX_RESTARTS: i64 = 5;
const DEFAULT_RESTART_WINDOW: Duration = Duration::from_secs(60);

const WATCHER_DEBOUNCE: Duration = Duration::from_millis(200);

fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Run the controller for the city rooted at `city_root` until a `stop`
/// command arrives on the control socket or the process receives
/// SIGINT/SIGTERM. Acquires the city lock for the duration of the call.
pub async fn run<S: SessionAdapter>(city_root: PathBuf, backend: S) -> Result<(), LifecycleError> {
    let cfg = CityConfig::load(&city_root)?;
    cfg.validate()?;
    let locked_name = cfg.workspace.name.clone();
    let paths = CityPaths::new(&city_root, &locked_name);

    std::fs::create_dir_all(&paths.dot_dir)?;
    let _log_guard = crate::logging::setup_logging(&paths.log_dir)?;

    // 1. Acquire the city lock first, non-blocking. Don't truncate before
    // locking: that would stomp a running controller's PID file.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&paths.lock)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let recorder = Arc::new(EventRecorder::new(paths.events.clone()));
    let city_prefix = format!("{}--", locked_name);

    // 2. Cancellable context: a signal handler and the control socket both
    // drive this same channel.
    let (cancel_tx, mut cancel_rx) = tokio::sync::watch::channel(false);
    spawn_signal_handler(cancel_tx.clone());

    // 3. Stale socket removal, then bind, then accept in a background task.
    if paths.socket.exists() {
        std::fs::remove_file(&paths.socket)?;
    }
    let listener =
        UnixListener::bind(&paths.socket).map_err(|e| LifecycleError::BindFailed(paths.socket.clone(), e))?;
    spawn_socket_acceptor(listener, cancel_tx.clone());

    // 4. PID file.
    std::fs::write(&paths.pid, format!("{}\n", std::process::id()))?;

    // 5. Announce.
    record(&recorder, Event::new(event_type::CONTROLLER_STARTED, "controller", now_unix() as i64).with_subject(locked_name.clone()));
    println!("Gas City controller started for '{locked_name}'");
    info!(city = %locked_name, "controller started");

    // 6-7. Initial derived state.
    let (mut desired, mut pool_sessions) = cfg.to_desired_agents();
    let mut suspended_names = cfg.suspended_names();
    let mut reconciler = build_reconciler(backend.clone(), Arc::clone(&recorder), city_prefix.clone());
    let mut cfg = cfg;

    let dirty = Arc::new(AtomicBool::new(false));
    let _watcher = spawn_watcher(&city_root, Arc::clone(&dirty));

    // Immediate reconcile pass before entering the ticker.
    apply_idle_timeouts(&reconciler, &desired);
    reconciler.tick(&desired, &pool_sessions, &suspended_names, now_unix()).await;

    // 8. controller_loop.
    let mut ticker = tokio::time::interval(cfg.daemon.patrol_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await; // first tick fires immediately; already reconciled above

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if dirty.swap(false, Ordering::SeqCst) {
                    match CityConfig::try_reload(&city_root, &locked_name) {
                        Ok(fresh) => {
                            cfg = fresh;
                            let (d, ps) = cfg.to_desired_agents();
                            desired = d;
                            pool_sessions = ps;
                            suspended_names = cfg.suspended_names();
                            reconciler = build_reconciler(backend.clone(), Arc::clone(&recorder), city_prefix.clone());
                            info!("Config reloaded for '{}'", locked_name);
                        }
                        Err(e) => {
                            warn!(error = %e, "config reload failed, keeping previous config");
                        }
                    }
                }
                apply_idle_timeouts(&reconciler, &desired);
                reconciler.tick(&desired, &pool_sessions, &suspended_names, now_unix()).await;
            }
            _ = cancel_rx.changed() => {
                if *cancel_rx.borrow() {
                    break;
                }
            }
        }
    }

    // 9. Graceful shutdown.
    let names: Vec<SessionName> = desired.iter().map(|a| a.session_name.clone()).collect();
    gc_engine::graceful_shutdown(&backend, recorder.as_ref(), &names, cfg.daemon.shutdown_timeout(), now_unix_i64).await;

    record(&recorder, Event::new(event_type::CONTROLLER_STOPPED, "controller", now_unix() as i64).with_subject(locked_name.clone()));
    let _ = std::fs::remove_file(&paths.socket);
    let _ = std::fs::remove_file(&paths.pid);
    // lock_file released on drop.
    drop(lock_file);

    Ok(())
}

fn now_unix_i64() -> i64 {
    now_unix() as i64
}

fn build_reconciler<S: SessionAdapter>(backend: S, recorder: Arc<EventRecorder>, city_prefix: String) -> Reconciler<S> {
    let reconcile_ops = Box::new(SessionReconcileOps::new(backend.clone()));
    let drain_ops = Box::new(SessionDrainOps::new(backend.clone()));
    let crash_tracker = CrashTracker::new(DEFAULT_MAX_RESTARTS, DEFAULT_RESTART_WINDOW);
    let idle_tracker = IdleTracker::new(backend.clone());
    Reconciler::new(
        backend,
        reconcile_ops,
        Some(drain_ops),
        Some(crash_tracker),
        Some(idle_tracker),
        recorder,
        city_prefix,
    )
}

/// Refresh the idle tracker's per-session timeouts from the current desired
/// population every tick — cheap, idempotent, and means a config reload's
/// `idle_timeout_secs` changes take effect without any special-casing.
fn apply_idle_timeouts<S: SessionAdapter>(reconciler: &Reconciler<S>, desired: &[gc_core::DesiredAgent]) {
    for agent in desired {
        reconciler.set_idle_timeout(&agent.session_name, agent.idle_timeout.unwrap_or(Duration::ZERO));
    }
}

fn record(recorder: &EventRecorder, event: Event) {
    if let Err(e) = recorder.record(event) {
        warn!(error = %e, "failed to record controller event");
    }
}

fn spawn_signal_handler(cancel_tx: tokio::sync::watch::Sender<bool>) {
    tokio::spawn(async move {
        let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        let mut int = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to install SIGINT handler");
                return;
            }
        };
        tokio::select! {
            _ = term.recv() => {}
            _ = int.recv() => {}
        }
        let _ = cancel_tx.send(true);
    });
}

fn spawn_socket_acceptor(listener: UnixListener, cancel_tx: tokio::sync::watch::Sender<bool>) {
    tokio::spawn(async move {
        let mut cancel_rx = cancel_tx.subscribe();
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let Ok((stream, _)) = accepted else { continue };
                    let cancel_tx = cancel_tx.clone();
                    tokio::spawn(handle_connection(stream, cancel_tx));
                }
                _ = cancel_rx.changed() => {
                    if *cancel_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });
}

async fn handle_connection(stream: tokio::net::UnixStream, cancel_tx: tokio::sync::watch::Sender<bool>) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();
    if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
        return;
    }
    if line.trim() == "stop" {
        let _ = cancel_tx.send(true);
        let _ = write_half.write_all(b"ok\n").await;
    }
}

/// Watch the city root (not `city.toml` directly — editors rename-swap on
/// save, which would orphan a watch on the old inode) for changes, setting
/// `dirty` after a debounce window collapses a burst of events into one.
fn spawn_watcher(city_root: &std::path::Path, dirty: Arc<AtomicBool>) -> Option<RecommendedWatcher> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<()>();

    let mut watcher = match notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if res.is_ok() {
            let _ = tx.send(());
        }
    }) {
        Ok(w) => w,
        Err(e) => {
            warn!(error = %e, "failed to create config watcher, reloading on tick boundary only");
            return None;
        }
    };

    if let Err(e) = watcher.watch(city_root, RecursiveMode::NonRecursive) {
        warn!(error = %e, "failed to watch city root, reloading on tick boundary only");
        return None;
    }

    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            loop {
                match tokio::time::timeout(WATCHER_DEBOUNCE, rx.recv()).await {
                    Ok(Some(())) => continue,
                    _ => break,
                }
            }
            dirty.store(true, Ordering::SeqCst);
        }
    });

    Some(watcher)
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
