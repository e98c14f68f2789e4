//! `medq fetch` – run the engine over a local source directory until every
//! requested id has finished.

use anyhow::{Context, Result};
use medq_core::progress::{Event, Outcome, ProgressView};
use medq_core::session::SessionPool;
use medq_core::transport::{LocalSession, LocalTransport};
use medq_core::{Engine, JobDescriptor, MediaType, MedqConfig, SubmitOutcome};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FetchArgs {
    pub ids: Vec<String>,
    pub source_dir: PathBuf,
    pub sessions: usize,
    pub threads: Option<usize>,
    pub download_dir: Option<PathBuf>,
    pub extra_paths: Vec<String>,
    pub extra_path_as_root: bool,
    pub media_type: MediaType,
    pub json: bool,
}

pub async fn run_fetch(mut cfg: MedqConfig, args: FetchArgs) -> Result<()> {
    anyhow::ensure!(args.sessions > 0, "--sessions must be at least 1");
    anyhow::ensure!(
        args.source_dir.is_dir(),
        "source directory {} does not exist",
        args.source_dir.display()
    );
    if let Some(threads) = args.threads {
        cfg.max_threads = threads;
    }
    if let Some(dir) = args.download_dir.clone() {
        cfg.download_root = dir;
    }
    cfg.validate()?;

    let pool = Arc::new(SessionPool::new());
    for i in 0..args.sessions {
        let id = format!("local-{i}");
        pool.insert(id.clone(), LocalSession::new(id));
    }
    let transport = Arc::new(LocalTransport::new(&args.source_dir));
    let (engine, mut events) = Engine::new(cfg, pool, transport);

    let mut view = ProgressView::new();
    for id in &args.ids {
        view.track(id.as_str());
        let mut job = args
            .extra_paths
            .iter()
            .fold(JobDescriptor::new(id.as_str(), args.media_type), |job, seg| {
                job.with_extra_path(seg.as_str())
            });
        if args.extra_path_as_root {
            job = job.with_extra_path_as_root();
        }
        if engine.submit(job)? == SubmitOutcome::AlreadyQueued {
            tracing::debug!(media_id = %id, "duplicate id on command line");
        }
    }
    let report = engine.rebuild_workers()?;
    tracing::info!(workers = report.workers, "fetch started");

    let json = args.json;
    let consumer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if json {
                println!("{}", serde_json::to_string(&event)?);
            } else if let Some(line) = format_event(&event) {
                println!("{line}");
            }
            if let Event::Progress(p) = &event {
                view.apply(p);
                if view.all_finished() {
                    break;
                }
            }
        }
        Ok::<_, anyhow::Error>(view)
    });
    let view = consumer.await.context("progress consumer task")??;
    tokio::task::block_in_place(|| engine.shutdown());

    let done = view.count(Outcome::Done);
    let failed = view.count(Outcome::Failed);
    let cancelled = view.count(Outcome::Cancelled);
    if !json {
        println!("{done} downloaded, {failed} failed, {cancelled} cancelled");
    }
    if failed > 0 {
        anyhow::bail!("{} of {} job(s) failed", failed, view.len());
    }
    Ok(())
}

/// One human-readable line per event; chunk progress without a status
/// change is folded into a percentage.
pub fn format_event(event: &Event) -> Option<String> {
    match event {
        Event::Progress(p) => {
            let status = p.status.as_deref().unwrap_or("");
            let line = match (p.percent(), &p.result_path) {
                (_, Some(path)) => format!("{:<24} {} -> {}", p.media_id, status, path.display()),
                (Some(pct), None) => format!("{:<24} {:>3}% {}", p.media_id, pct, status),
                (None, None) => format!("{:<24} {}", p.media_id, status),
            };
            Some(line)
        }
        Event::NoSessionAvailable => Some("no session available; jobs stay queued".to_string()),
        Event::WorkerStarted { session_id } => Some(format!("[{session_id}] worker started")),
        Event::WorkerExited { .. } => None,
        Event::SessionInvalid { session_id } => {
            Some(format!("[{session_id}] session expired; jobs re-queued"))
        }
    }
}
