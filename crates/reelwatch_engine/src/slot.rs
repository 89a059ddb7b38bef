use std::path::PathBuf;

use engine_logging::engine_warn;
use reelwatch_core::{SlotError, TaskId, TaskSlot};

use crate::persist::AtomicFileWriter;

pub const ACTIVE_TASK_FILENAME: &str = "active_task";

/// Task slot stored as a one-line file in the state directory.
#[derive(Debug, Clone)]
pub struct FileTaskSlot {
    writer: AtomicFileWriter,
}

impl FileTaskSlot {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(state_dir),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.writer.path(ACTIVE_TASK_FILENAME)
    }
}

impl TaskSlot for FileTaskSlot {
    fn get(&self) -> Option<TaskId> {
        match self.writer.read_to_string(ACTIVE_TASK_FILENAME) {
            Ok(Some(content)) => {
                let task_id = TaskId::new(content);
                if task_id.is_none() {
                    engine_warn!("Ignoring blank task slot at {:?}", self.path());
                }
                task_id
            }
            Ok(None) => None,
            Err(err) => {
                engine_warn!("Failed to read task slot at {:?}: {}", self.path(), err);
                None
            }
        }
    }

    fn set(&mut self, task_id: &TaskId) -> Result<(), SlotError> {
        self.writer
            .write(ACTIVE_TASK_FILENAME, task_id.as_str().as_bytes())
            .map(|_| ())
            .map_err(|err| SlotError::Write(err.to_string()))
    }

    fn clear(&mut self) -> Result<(), SlotError> {
        self.writer
            .remove(ACTIVE_TASK_FILENAME)
            .map(|_| ())
            .map_err(|err| SlotError::Remove(err.to_string()))
    }
}
