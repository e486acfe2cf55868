//! Ephemeral table of in-flight commands, rendered by `top`.
//!
//! Nothing else reads it. Records are created before a handler runs,
//! completed after it returns, and swept lazily on each request once they
//! outlive the retention window. There is no background task.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Default retention window.
pub const DEFAULT_RETENTION_SECS: u64 = 3600;

// Ten years; keeps the chrono duration in range.
const MAX_RETENTION_SECS: u64 = 10 * 365 * 24 * 3600;

/// Handle owned by exactly one invocation from `register` to `complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    Completed,
}

/// One row of the process table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
    pub id: ProcessId,
    /// Displayed pid. Random and allowed to collide; `id` is the key.
    pub pid: u32,
    pub command_line: String,
    pub owner: String,
    pub cpu_load: f32,
    pub mem_load: f32,
    pub status: ProcessStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Table {
    records: Vec<ProcessRecord>,
    next_id: u64,
}

/// Process-wide registry shared by every request.
#[derive(Debug)]
pub struct ProcessRegistry {
    table: Mutex<Table>,
    retention: Duration,
    started_at: DateTime<Utc>,
}

impl ProcessRegistry {
    /// Create a registry with the default one-hour retention.
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION_SECS)
    }

    pub fn with_retention(secs: u64) -> Self {
        Self {
            table: Mutex::new(Table::default()),
            retention: Duration::seconds(secs.min(MAX_RETENTION_SECS) as i64),
            started_at: Utc::now(),
        }
    }

    // A panic mid-update leaves at worst a stale row, so poisoning is
    // not worth propagating.
    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// When the registry was created; `top` reports it as uptime.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Insert a `running` record for a command about to execute.
    pub fn register(&self, command_line: &str, owner: &str) -> ProcessId {
        self.register_at(command_line, owner, Utc::now())
    }

    pub fn register_at(&self, command_line: &str, owner: &str, now: DateTime<Utc>) -> ProcessId {
        let mut rng = rand::thread_rng();
        let mut table = self.lock();
        let id = ProcessId(table.next_id);
        table.next_id += 1;
        table.records.push(ProcessRecord {
            id,
            pid: rng.gen_range(1000..31000),
            command_line: command_line.to_string(),
            owner: owner.to_string(),
            cpu_load: rng.gen_range(0.0..5.0),
            mem_load: rng.gen_range(0.0..3.0),
            status: ProcessStatus::Running,
            created_at: now,
        });
        log::debug!("process {id:?} registered for {owner}");
        id
    }

    /// Mark a record completed. Unknown ids (already swept) are ignored.
    pub fn complete(&self, id: ProcessId) {
        let mut table = self.lock();
        if let Some(record) = table.records.iter_mut().find(|r| r.id == id) {
            record.status = ProcessStatus::Completed;
        }
    }

    /// Lazy garbage collection. Returns how many stale `running` records
    /// were marked completed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// Running records older than the retention window are marked
    /// completed. Completed records are dropped after twice the window.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.retention;
        let expiry = cutoff - self.retention;
        let mut table = self.lock();
        let mut stale = 0;
        for record in table.records.iter_mut() {
            if record.status == ProcessStatus::Running && record.created_at < cutoff {
                record.status = ProcessStatus::Completed;
                stale += 1;
            }
        }
        table
            .records
            .retain(|r| !(r.status == ProcessStatus::Completed && r.created_at < expiry));
        if stale > 0 {
            log::debug!("swept {stale} stale process records");
        }
        stale
    }

    /// Running records, highest CPU first.
    pub fn running(&self) -> Vec<ProcessRecord> {
        let mut rows: Vec<ProcessRecord> = self
            .lock()
            .records
            .iter()
            .filter(|r| r.status == ProcessStatus::Running)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.cpu_load.total_cmp(&a.cpu_load));
        rows
    }

    /// Copy of every record regardless of status.
    pub fn snapshot(&self) -> Vec<ProcessRecord> {
        self.lock().records.clone()
    }

    /// Look up a single record.
    pub fn get(&self, id: ProcessId) -> Option<ProcessRecord> {
        self.lock().records.iter().find(|r| r.id == id).cloned()
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}
