//! Bounded worker pool for per-file validation.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use tracing::{debug, warn};

use crate::result::LintResult;

pub const DEFAULT_CONCURRENCY: usize = 10;

pub(crate) const DEADLINE_MESSAGE: &str = "Lint deadline exceeded before this file was processed";

/// Scheduling knobs for [`run_all`].
#[derive(Debug, Clone, Copy)]
pub struct PoolOptions {
    pub parallel: bool,
    pub concurrency: usize,
    /// Files not yet claimed when this instant passes are reported, not processed.
    pub deadline: Option<Instant>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            concurrency: DEFAULT_CONCURRENCY,
            deadline: None,
        }
    }
}

/// Runs `processor` over `files` and returns the results sorted by file path.
///
/// The processor returns `None` for files that turn out not to be artifacts.
/// A panicking processor yields an error result for its file; other files
/// are unaffected.
pub fn run_all<F>(files: &[PathBuf], processor: F, options: PoolOptions) -> Vec<LintResult>
where
    F: Fn(&Path) -> Option<LintResult> + Sync,
{
    let mut results = if !options.parallel || files.len() <= 1 {
        run_sequential(files, &processor, options.deadline)
    } else {
        run_parallel(files, &processor, options)
    };

    results.sort_by(|a, b| a.file.cmp(&b.file));
    results
}

fn run_sequential<F>(files: &[PathBuf], processor: &F, deadline: Option<Instant>) -> Vec<LintResult>
where
    F: Fn(&Path) -> Option<LintResult> + Sync,
{
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        if deadline_passed(deadline) {
            results.push(deadline_result(path));
            continue;
        }
        results.extend(process_one(path, processor));
    }
    results
}

fn run_parallel<F>(files: &[PathBuf], processor: &F, options: PoolOptions) -> Vec<LintResult>
where
    F: Fn(&Path) -> Option<LintResult> + Sync,
{
    let workers = options.concurrency.clamp(1, files.len());
    let pool = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool,
        Err(e) => {
            warn!("Failed to start worker pool, linting sequentially: {}", e);
            return run_sequential(files, processor, options.deadline);
        }
    };

    let cursor = AtomicUsize::new(0);
    let (tx, rx) = crossbeam_channel::unbounded::<(usize, Option<LintResult>)>();

    pool.scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let cursor = &cursor;
            scope.spawn(move |_| {
                loop {
                    if deadline_passed(options.deadline) {
                        break;
                    }
                    let index = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some(path) = files.get(index) else {
                        break;
                    };
                    if tx.send((index, process_one(path, processor))).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(tx);

    let mut processed = vec![false; files.len()];
    let mut results = Vec::with_capacity(files.len());
    for (index, result) in rx {
        processed[index] = true;
        results.extend(result);
    }

    for (index, done) in processed.iter().enumerate() {
        if !done {
            results.push(deadline_result(&files[index]));
        }
    }

    debug!("Processed {} files with {} workers", files.len(), workers);
    results
}

fn process_one<F>(path: &Path, processor: &F) -> Option<LintResult>
where
    F: Fn(&Path) -> Option<LintResult> + Sync,
{
    match catch_unwind(AssertUnwindSafe(|| processor(path))) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!("Linting {} panicked: {}", path.display(), message);
            Some(LintResult::failed(path, message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

fn deadline_result(path: &Path) -> LintResult {
    let mut result = LintResult::new(path);
    result.add_error(DEADLINE_MESSAGE);
    result
}
