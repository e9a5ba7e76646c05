//! Parallel tile dispatch with a barrier.
//!
//! One work item per tile goes into a shared queue drained by a bounded pool
//! of worker threads. The caller blocks until every tile has reported back,
//! or until the barrier timeout expires.
//!
//! ```text
//!   partition ──► work queue ──► tile-worker-0 ─┐
//!                      │    └──► tile-worker-1 ─┼──► result channel ──► barrier
//!                      └───────► tile-worker-N ─┘
//! ```
//!
//! Worker panics are caught and reported as failures of their tile. Workers
//! still running when the barrier times out are left detached.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::{CompositeError, DispatchError, TileCompositor};
use crate::domain::{SourceId, Tile, TileGrid, TileId};
use crate::partition::Partition;
use crate::raster::TileRaster;

/// Configuration for tile dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchConfig {
    /// Worker threads; 0 means one per tile
    pub workers: usize,
    /// Barrier timeout; `None` waits forever
    pub timeout: Option<Duration>,
    /// Composite tiles inline on the calling thread, in tile id order
    pub sequential: bool,
}

impl DispatchConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }

    /// Worker count for a cycle over `tiles` tiles.
    pub fn worker_count(&self, tiles: usize) -> usize {
        match self.workers {
            0 => tiles,
            n => n.min(tiles),
        }
    }
}

/// A tile whose compositing failed.
#[derive(Debug, Clone, PartialEq)]
pub struct TileFailure {
    pub tile_id: TileId,
    /// Sources assigned to the tile
    pub sources: Vec<SourceId>,
    pub error: CompositeError,
}

impl fmt::Display for TileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tile {} failed (sources: ", self.tile_id)?;
        if self.sources.is_empty() {
            f.write_str("none")?;
        }
        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", source)?;
        }
        write!(f, "): {}", self.error)
    }
}

/// Results of one dispatch, keyed by tile id.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub rasters: BTreeMap<TileId, TileRaster>,
    /// Failures ordered by tile id
    pub failures: Vec<TileFailure>,
}

impl DispatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn push(&mut self, result: TileResult) {
        match result.raster {
            Ok(raster) => {
                self.rasters.insert(result.tile_id, raster);
            }
            Err(error) => self.failures.push(TileFailure {
                tile_id: result.tile_id,
                sources: result.sources,
                error,
            }),
        }
    }
}

/// Work item for the pool.
struct WorkItem {
    tile: Tile,
    sources: Vec<SourceId>,
}

struct TileResult {
    tile_id: TileId,
    sources: Vec<SourceId>,
    raster: Result<TileRaster, CompositeError>,
}

/// Runs the tile compositor over every tile of a partition.
pub struct TileDispatcher {
    compositor: Arc<TileCompositor>,
    config: DispatchConfig,
}

impl TileDispatcher {
    pub fn new(compositor: Arc<TileCompositor>, config: DispatchConfig) -> Self {
        Self { compositor, config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Composite every tile of the grid and wait for all of them.
    ///
    /// Per-tile failures are collected in the outcome; only a barrier
    /// failure (timeout, lost workers, spawn error) is returned as an error.
    pub fn dispatch(
        &self,
        grid: &TileGrid,
        partition: &Partition,
    ) -> Result<DispatchOutcome, DispatchError> {
        let start = Instant::now();
        let mut items: Vec<WorkItem> = grid
            .tiles()
            .iter()
            .map(|tile| WorkItem {
                tile: tile.clone(),
                sources: partition.sources_for(tile.id()).to_vec(),
            })
            .collect();
        items.sort_by(|a, b| a.tile.id().cmp(b.tile.id()));

        let mut outcome = if self.config.sequential {
            self.run_sequential(items)
        } else {
            self.run_parallel(items)?
        };
        outcome.failures.sort_by(|a, b| a.tile_id.cmp(&b.tile_id));

        info!(
            tiles = grid.len(),
            failed = outcome.failures.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Dispatched tiles"
        );
        Ok(outcome)
    }

    fn run_sequential(&self, items: Vec<WorkItem>) -> DispatchOutcome {
        debug!(tiles = items.len(), "Compositing tiles sequentially");
        let mut outcome = DispatchOutcome::default();
        for item in items {
            outcome.push(composite_item(&self.compositor, item));
        }
        outcome
    }

    fn run_parallel(&self, items: Vec<WorkItem>) -> Result<DispatchOutcome, DispatchError> {
        let mut outcome = DispatchOutcome::default();
        if items.is_empty() {
            return Ok(outcome);
        }

        let workers = self.config.worker_count(items.len());
        let mut pending: BTreeSet<TileId> = items.iter().map(|i| i.tile.id().clone()).collect();

        let (work_sender, work_receiver) = mpsc::channel::<WorkItem>();
        let work_receiver = Arc::new(Mutex::new(work_receiver));
        let (result_sender, result_receiver) = mpsc::channel::<TileResult>();

        for item in items {
            if work_sender.send(item).is_err() {
                return Err(DispatchError::Disconnected {
                    pending: pending.into_iter().collect(),
                });
            }
        }
        // Closed before any worker starts: workers exit once it is drained.
        drop(work_sender);

        debug!(workers, tiles = pending.len(), "Starting tile workers");
        for i in 0..workers {
            let compositor = Arc::clone(&self.compositor);
            let worker_receiver = Arc::clone(&work_receiver);
            let result_sender = result_sender.clone();

            let spawned = thread::Builder::new()
                .name(format!("tile-worker-{}", i))
                .spawn(move || Self::worker_loop(compositor, worker_receiver, result_sender));
            if let Err(e) = spawned {
                let abandoned = abandon_queue(&work_receiver);
                error!(
                    started = i,
                    abandoned,
                    error = %e,
                    "Failed to start tile worker"
                );
                return Err(DispatchError::Spawn(e));
            }
        }
        drop(result_sender);

        let deadline = self.config.timeout.map(|t| Instant::now() + t);
        while !pending.is_empty() {
            let received = match deadline {
                Some(deadline) => {
                    result_receiver.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                }
                None => result_receiver
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(result) => {
                    pending.remove(&result.tile_id);
                    outcome.push(result);
                }
                Err(RecvTimeoutError::Timeout) => {
                    let pending: Vec<TileId> = pending.into_iter().collect();
                    error!(pending = pending.len(), "Tile barrier timed out");
                    return Err(DispatchError::Timeout {
                        timeout: self.config.timeout.unwrap_or_default(),
                        pending,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(DispatchError::Disconnected {
                        pending: pending.into_iter().collect(),
                    });
                }
            }
        }

        Ok(outcome)
    }

    /// Worker thread loop: drain the queue until it is closed and empty.
    fn worker_loop(
        compositor: Arc<TileCompositor>,
        work_receiver: Arc<Mutex<Receiver<WorkItem>>>,
        result_sender: Sender<TileResult>,
    ) {
        loop {
            let work = work_receiver.lock().recv();
            let item = match work {
                Ok(item) => item,
                Err(_) => break,
            };

            let result = composite_item(&compositor, item);
            if result_sender.send(result).is_err() {
                // Barrier gave up (timeout); nobody is listening anymore.
                break;
            }
        }
    }
}

fn composite_item(compositor: &TileCompositor, item: WorkItem) -> TileResult {
    let start = Instant::now();
    let tile_id = item.tile.id().clone();

    let raster = panic::catch_unwind(AssertUnwindSafe(|| {
        compositor.composite(&item.tile, &item.sources)
    }))
    .unwrap_or_else(|payload| {
        Err(CompositeError::Panicked {
            tile_id: tile_id.clone(),
            message: panic_message(payload.as_ref()),
        })
    });

    match &raster {
        Ok(_) => debug!(
            tile_id = %tile_id,
            sources = item.sources.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tile done"
        ),
        Err(e) => warn!(tile_id = %tile_id, error = %e, "Tile failed"),
    }

    TileResult {
        tile_id,
        sources: item.sources,
        raster,
    }
}

/// Empty a closed work queue so running workers exit after their current tile.
fn abandon_queue(work_receiver: &Mutex<Receiver<WorkItem>>) -> usize {
    work_receiver.lock().try_iter().count()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
