use std::sync::atomic::{AtomicUsize, Ordering};

use crate::api::error::{TensorError, TensorResult};

const DEFAULT_PAR_THRESHOLD: usize = 4096;

/// Element count at which row kernels (softmax, layer norm) go parallel.
static ROW_PAR: AtomicUsize = AtomicUsize::new(DEFAULT_PAR_THRESHOLD);

/// Output element count at which batched matmul splits batches over rayon.
static MATMUL_PAR: AtomicUsize = AtomicUsize::new(DEFAULT_PAR_THRESHOLD);

pub(crate) fn row_par_threshold() -> usize {
    ROW_PAR.load(Ordering::Relaxed)
}

pub(crate) fn matmul_par_threshold() -> usize {
    MATMUL_PAR.load(Ordering::Relaxed)
}

/// Process-wide kernel settings: worker threads and the sizes at which
/// kernels switch from a sequential loop to rayon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Worker threads for faer and rayon; 0 keeps rayon's default pool.
    pub num_threads: usize,
    pub row_par_threshold: usize,
    pub matmul_par_threshold: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            row_par_threshold: DEFAULT_PAR_THRESHOLD,
            matmul_par_threshold: DEFAULT_PAR_THRESHOLD,
        }
    }
}

impl RuntimeConfig {
    /// Thresholds currently in effect, with the live rayon thread count.
    pub fn current() -> Self {
        Self {
            num_threads: rayon::current_num_threads(),
            row_par_threshold: row_par_threshold(),
            matmul_par_threshold: matmul_par_threshold(),
        }
    }

    /// Install these settings for the whole process.
    ///
    /// Thresholds may be changed any number of times. An explicit thread
    /// count builds rayon's global pool, which only succeeds once.
    pub fn apply(&self) -> TensorResult<()> {
        use faer::{set_global_parallelism, Parallelism};

        set_global_parallelism(Parallelism::Rayon(self.num_threads));
        if self.num_threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.num_threads)
                .build_global()
                .map_err(|e| {
                    TensorError::InvalidOperation(format!("rayon pool already built: {}", e))
                })?;
        }

        ROW_PAR.store(self.row_par_threshold, Ordering::Relaxed);
        MATMUL_PAR.store(self.matmul_par_threshold, Ordering::Relaxed);

        log::info!(
            "[runtime] threads={} row_par>={} matmul_par>={}",
            rayon::current_num_threads(),
            self.row_par_threshold,
            self.matmul_par_threshold
        );
        Ok(())
    }
}
