#![allow(dead_code)]

pub mod scripted_transport;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use medq_core::progress::{Event, EventReceiver};
use medq_core::session::SessionPool;
use medq_core::{Engine, JobState, MedqConfig};

use scripted_transport::ScriptedTransport;

pub type TestEngine = Engine<SessionPool<String>, ScriptedTransport>;

const DEADLINE: Duration = Duration::from_secs(10);

/// Fast config: no pacing, no retry delay, small chunks.
pub fn fast_config(download_root: &Path) -> MedqConfig {
    MedqConfig {
        max_threads: 1,
        max_retries: 3,
        recoverable_fail_wait_delay: 0.0,
        chunk_size: 10,
        download_delay: 0.0,
        dl_end_padding_bytes: 0,
        cancel_threshold_percent: 95,
        download_root: download_root.to_path_buf(),
    }
}

pub fn sessions(ids: &[&str]) -> Arc<SessionPool<String>> {
    let pool = Arc::new(SessionPool::new());
    for id in ids {
        pool.insert(*id, format!("token-{id}"));
    }
    pool
}

pub fn engine(
    cfg: MedqConfig,
    pool: &Arc<SessionPool<String>>,
) -> (TestEngine, EventReceiver, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::new());
    let (engine, rx) = Engine::new(cfg, Arc::clone(pool), Arc::clone(&transport));
    (engine, rx, transport)
}

/// Poll `cond` until it holds or the deadline passes.
pub fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let start = Instant::now();
    while !cond() {
        assert!(start.elapsed() < DEADLINE, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(5));
    }
}

pub fn wait_for_state(engine: &TestEngine, media_id: &str, pred: impl Fn(&JobState) -> bool) -> JobState {
    let mut last = None;
    wait_until(&format!("state of {media_id}"), || {
        last = engine.status(media_id);
        last.as_ref().is_some_and(&pred)
    });
    last.unwrap()
}

/// Receive events until one matches; returns everything seen, matching one last.
pub fn collect_until(rx: &mut EventReceiver, mut pred: impl FnMut(&Event) -> bool) -> Vec<Event> {
    let start = Instant::now();
    let mut seen = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => {
                let hit = pred(&event);
                seen.push(event);
                if hit {
                    return seen;
                }
            }
            Err(tokio::sync::mpsc::error::TryRecvError::Empty) => {
                assert!(start.elapsed() < DEADLINE, "timed out waiting for event; saw {seen:?}");
                std::thread::sleep(Duration::from_millis(2));
            }
            Err(e) => panic!("event channel closed: {e:?}; saw {seen:?}"),
        }
    }
}

/// Everything currently buffered.
pub fn drain(rx: &mut EventReceiver) -> Vec<Event> {
    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event);
    }
    seen
}

pub fn progress_of(event: &Event, media_id: &str) -> Option<(u64, u64)> {
    match event {
        Event::Progress(p) if p.media_id == media_id && p.outcome.is_none() => p.progress,
        _ => None,
    }
}

/// Wait until `media_id` has failed and its descriptor is archived.
pub fn wait_archived(engine: &TestEngine, media_id: &str) {
    wait_until(&format!("{media_id} archived"), || {
        engine.failed_job(media_id).is_some()
    });
}
