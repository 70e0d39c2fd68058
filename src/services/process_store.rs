use crate::models::ProcessInfo;
use dashmap::DashMap;
use uuid::Uuid;

/// Records resolved by `GET /api/image/proxy/:process_id`.
#[derive(Debug, Default)]
pub struct ProcessStore {
    processes: DashMap<String, ProcessInfo>,
}

impl ProcessStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the record under a fresh id and returns the id.
    pub fn register(&self, info: ProcessInfo) -> String {
        let id = Uuid::new_v4().to_string();
        self.processes.insert(id.clone(), info);
        id
    }

    pub fn insert(&self, process_id: impl Into<String>, info: ProcessInfo) {
        self.processes.insert(process_id.into(), info);
    }

    pub fn get(&self, process_id: &str) -> Option<ProcessInfo> {
        self.processes.get(process_id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, process_id: &str) -> Option<ProcessInfo> {
        self.processes.remove(process_id).map(|(_, info)| info)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}
