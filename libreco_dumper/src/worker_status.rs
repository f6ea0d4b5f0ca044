/// Progress report sent from a worker thread to the UI.
#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    pub progress: f32,
    pub run_number: i32,
    pub worker_id: usize,
    pub rejected_events: u64,
}

impl WorkerStatus {
    pub fn new(progress: f32, run_number: i32, worker_id: usize, rejected_events: u64) -> Self {
        Self {
            progress,
            run_number,
            worker_id,
            rejected_events,
        }
    }
}
