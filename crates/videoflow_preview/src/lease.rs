//! Scoped bindings of a file to the preview, the desktop analogue of an
//! object URL: acquired when a file is bound, released when the lease is
//! dropped.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use uuid::Uuid;
use videoflow_core::types::FileHandle;

#[derive(Debug, Default)]
struct Registry {
    next: u64,
    live: BTreeMap<u64, PathBuf>,
}

/// Hands out leases and tracks which are still alive.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    inner: Rc<RefCell<Registry>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, file: &FileHandle) -> SourceLease {
        let mut reg = self.inner.borrow_mut();
        reg.next += 1;
        let id = reg.next;
        reg.live.insert(id, file.path.clone());
        tracing::debug!(id, path = %file.path.display(), "Source lease acquired");
        SourceLease {
            id,
            file_id: file.id,
            path: file.path.clone(),
            registry: Rc::downgrade(&self.inner),
        }
    }

    /// Number of leases not yet released.
    pub fn live(&self) -> usize {
        self.inner.borrow().live.len()
    }
}

#[derive(Debug)]
pub struct SourceLease {
    id: u64,
    file_id: Uuid,
    path: PathBuf,
    registry: Weak<RefCell<Registry>>,
}

impl SourceLease {
    pub fn file_id(&self) -> Uuid {
        self.file_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `source:<n>`, the handle string given to the surface in logs.
    pub fn url(&self) -> String {
        format!("source:{}", self.id)
    }
}

impl Drop for SourceLease {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().live.remove(&self.id);
            tracing::debug!(id = self.id, "Source lease released");
        }
    }
}
