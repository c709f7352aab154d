//! Fork-join dispatch of axis passes onto rayon workers.
//!
//! A pass's outer loop is dealt out round-robin: worker `w` of `t` visits
//! `w, w + t, w + 2t, …`. Each worker owns whole slices (inner and middle
//! passes) or whole row columns (outer pass), so workers never write the same
//! row. [`WorkerPool::dispatch`] returns only after every worker has finished.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::compose::AxisPass;
use crate::engine::WorkerPolicy;
use crate::{DctError, Result};

/// A raw pointer wrapper that is `Send` + `Sync`.
///
/// # Safety
/// The caller must guarantee that the pointed-to data is valid for the
/// lifetime of any parallel operation and that no data races occur
/// (threads write to disjoint rows).
pub(crate) struct SendPtr<T>(pub(crate) *mut T);

impl<T> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendPtr<T> {}

unsafe impl<T> Send for SendPtr<T> {}
unsafe impl<T> Sync for SendPtr<T> {}

impl<T> fmt::Debug for SendPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SendPtr").field(&self.0).finish()
    }
}

impl<T> SendPtr<T> {
    #[inline(always)]
    pub(crate) fn as_ptr(self) -> *mut T {
        self.0
    }
}

/// Share of one pass's outer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WorkItem {
    pub(crate) start: usize,
    pub(crate) stride: usize,
}

impl WorkItem {
    /// The whole loop on one thread.
    pub(crate) const SERIAL: WorkItem = WorkItem {
        start: 0,
        stride: 1,
    };

    /// `threads` interleaved items covering an outer loop.
    pub(crate) fn interleaved(threads: usize) -> Vec<WorkItem> {
        let stride = threads.max(1);
        (0..stride).map(|start| WorkItem { start, stride }).collect()
    }

    /// Outer indices below `extent` this item visits.
    #[inline]
    pub(crate) fn indices(&self, extent: usize) -> impl Iterator<Item = usize> {
        (self.start..extent).step_by(self.stride)
    }
}

/// Worker threads available to an engine.
#[derive(Debug)]
pub(crate) struct WorkerPool {
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    policy: WorkerPolicy,
    #[cfg(feature = "parallel")]
    dedicated: Option<rayon::ThreadPool>,
}

impl WorkerPool {
    /// Resolve `policy`, building a dedicated pool for [`WorkerPolicy::Exact`].
    pub(crate) fn new(policy: WorkerPolicy) -> Result<Self> {
        if matches!(policy, WorkerPolicy::Exact(0) | WorkerPolicy::Max(0)) {
            return Err(DctError::InvalidWorkers { requested: 0 });
        }

        #[cfg(feature = "parallel")]
        let dedicated = match policy {
            WorkerPolicy::Exact(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("dct3d-worker-{i}"))
                    .build()
                    .map_err(|e| DctError::ThreadPool(e.to_string()))?,
            ),
            _ => None,
        };

        Ok(Self {
            policy,
            #[cfg(feature = "parallel")]
            dedicated,
        })
    }

    /// Whether a dedicated pool backs this instance.
    pub(crate) fn is_dedicated(&self) -> bool {
        #[cfg(feature = "parallel")]
        {
            self.dedicated.is_some()
        }
        #[cfg(not(feature = "parallel"))]
        {
            false
        }
    }

    /// Number of workers a pass may use.
    pub(crate) fn workers(&self) -> usize {
        #[cfg(feature = "parallel")]
        {
            match self.policy {
                WorkerPolicy::Auto => rayon::current_num_threads(),
                WorkerPolicy::Exact(n) => n,
                WorkerPolicy::Max(n) => n.min(rayon::current_num_threads()),
            }
        }
        #[cfg(not(feature = "parallel"))]
        {
            1
        }
    }

    /// Run `task` once per work item and wait for all of them.
    ///
    /// A single item runs on the calling thread, several items run on the
    /// pool. Either way panics are caught per item and the first one is
    /// reported after all items have returned.
    pub(crate) fn dispatch<R, F>(&self, pass: AxisPass, work: Vec<(WorkItem, R)>, task: F) -> Result<()>
    where
        R: Send,
        F: Fn(WorkItem, R) + Sync,
    {
        let run_item = |(item, region): (WorkItem, R)| catch_unwind(AssertUnwindSafe(|| task(item, region)));

        #[cfg(feature = "parallel")]
        let outcomes: Vec<_> = if work.len() <= 1 {
            work.into_iter().map(run_item).collect()
        } else {
            use rayon::prelude::*;

            let run = || work.into_par_iter().map(run_item).collect::<Vec<_>>();
            match &self.dedicated {
                Some(pool) => pool.install(run),
                None => run(),
            }
        };

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<_> = work.into_iter().map(run_item).collect();

        match outcomes.into_iter().find_map(|outcome| outcome.err()) {
            Some(payload) => Err(DctError::WorkerPanicked {
                pass,
                message: panic_message(payload.as_ref()),
            }),
            None => Ok(()),
        }
    }
}

/// Text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
