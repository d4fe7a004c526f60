use ndarray::{Array2, ArrayView2};

/// Hook called at every sweep boundary.
///
/// Rendering, pacing, and progress reporting live behind this trait so the
/// engine itself never sleeps or prints.
pub trait SweepObserver {
    fn on_sweep(&mut self, sweep: usize, values: ArrayView2<'_, f64>, biggest_change: f64);
}

/// Observer that ignores every sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SweepObserver for NoopObserver {
    fn on_sweep(&mut self, _sweep: usize, _values: ArrayView2<'_, f64>, _biggest_change: f64) {}
}

/// Keeps a copy of the values after each sweep.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRecorder {
    /// One entry per sweep, oldest first.
    pub snapshots: Vec<Snapshot>,
}

/// The state of the grid right after one sweep.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// 0-based sweep index.
    pub sweep: usize,
    /// Copy of the value matrix.
    pub values: Array2<f64>,
    /// Biggest change applied during the sweep.
    pub biggest_change: f64,
}

impl SweepObserver for SnapshotRecorder {
    fn on_sweep(&mut self, sweep: usize, values: ArrayView2<'_, f64>, biggest_change: f64) {
        self.snapshots.push(Snapshot {
            sweep,
            values: values.to_owned(),
            biggest_change,
        });
    }
}
