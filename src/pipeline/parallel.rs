use crate::config::IngestConfig;
use crate::parser::ParseOptions;
use crate::pipeline::ingest::{Ingested, ingest};
use crate::registry::ParserRegistry;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

/// Ingest many files concurrently, returning outcomes in input order.
///
/// At most `2 * jobs` files are parsed at once; `jobs <= 1` parses serially
/// on the calling thread.
pub fn ingest_all(
    registry: &ParserRegistry,
    config: &IngestConfig,
    paths: Vec<PathBuf>,
    options: &ParseOptions,
    jobs: usize,
) -> Vec<Ingested> {
    process_parallel_with(paths, jobs, |path| {
        let result = ingest(registry, config, &path, options);
        Ingested { path, result }
    })
}

pub(crate) fn process_parallel_with<T, R, F>(items: Vec<T>, jobs: usize, process: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    let worker_count = jobs.max(1);
    let in_flight_limit = worker_count.saturating_mul(2).max(1);
    let mut ordered = Vec::with_capacity(items.len());
    let mut indexed = items.into_iter().enumerate();

    loop {
        let batch: Vec<(usize, T)> = indexed.by_ref().take(in_flight_limit).collect();
        if batch.is_empty() {
            break;
        }

        if worker_count == 1 {
            ordered.extend(batch.into_iter().map(|(_, item)| process(item)));
            continue;
        }

        let (result_tx, result_rx) = mpsc::channel::<(usize, R)>();
        thread::scope(|scope| {
            for (index, item) in batch {
                let result_tx = result_tx.clone();
                let process = &process;
                scope.spawn(move || {
                    let _ = result_tx.send((index, process(item)));
                });
            }
        });
        drop(result_tx);

        let pending: BTreeMap<usize, R> = result_rx.into_iter().collect();
        ordered.extend(pending.into_values());
    }

    ordered
}
