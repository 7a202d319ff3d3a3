use std::path::Path;
use std::sync::Arc;

use cashbook_core::sync::{BackgroundSyncWorker, ConnectivityMonitor, HttpProbe, SyncCoordinator};
use cashbook_core::QueueConfig;
use tokio::sync::{broadcast, mpsc};

use crate::commands::common::{format_notice, http_submitter, open_queue};
use crate::error::CliError;

const SIGNAL_BUFFER: usize = 32;

pub async fn run_watch(config: &QueueConfig, db_path: &Path) -> Result<(), CliError> {
    let submitter = http_submitter(config)?;
    let (signals, signals_rx) = mpsc::channel(SIGNAL_BUFFER);

    // The worker gets its own store handle on the same file
    let (background, worker_task) =
        BackgroundSyncWorker::spawn(open_queue(db_path), submitter.clone(), signals.clone());

    let monitor = ConnectivityMonitor::new(HttpProbe::for_submitter(&submitter), config.probe_interval);
    let online = monitor.check().await;

    let coordinator = Arc::new(
        SyncCoordinator::new(open_queue(db_path), submitter, online)
            .with_settle_delay(config.settle_delay)
            .with_registrar(Arc::new(background)),
    );
    let mut notices = coordinator.subscribe();

    let monitor_task = tokio::spawn(monitor.run(online, signals.clone()));
    let coordinator_task = tokio::spawn(Arc::clone(&coordinator).run(signals_rx));
    // `cashbook add` writes straight to the file; poll so those records sync too
    let pending_task = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        let interval = config.probe_interval;
        async move { coordinator.poll_pending(interval).await }
    });

    let pending = coordinator.unsynced_count().await;
    println!(
        "Watching {} ({}, {pending} pending). Press Ctrl-C to stop.",
        db_path.display(),
        if online { "online" } else { "offline" }
    );

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
            notice = notices.recv() => match notice {
                Ok(notice) => {
                    if let Some(line) = format_notice(&notice) {
                        println!("{line}");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Dropped {skipped} sync notice(s)");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    drop(signals);
    monitor_task.abort();
    coordinator_task.abort();
    pending_task.abort();
    worker_task.abort();

    let status = coordinator.status();
    println!("Stopped with {} transaction(s) pending", status.unsynced_count);
    Ok(())
}
