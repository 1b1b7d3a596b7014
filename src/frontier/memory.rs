//! In-memory frontier backed by a ring buffer

use crate::frontier::{Frontier, FrontierError, FrontierResult};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

struct Ring {
    queue: VecDeque<String>,
    pending: HashSet<String>,
}

/// Ring-buffer frontier living in process memory
///
/// Pending URLs are unique: enqueueing a URL that is still waiting fails with
/// `FrontierError::Duplicate`. Once dequeued, the URL may be enqueued again.
pub struct MemoryFrontier {
    name: String,
    capacity: usize,
    ring: Mutex<Ring>,
}

impl MemoryFrontier {
    /// Creates an empty frontier with room for `capacity` URLs before growing
    pub fn new(name: &str, capacity: usize) -> Self {
        Self {
            name: name.to_string(),
            capacity,
            ring: Mutex::new(Ring {
                queue: VecDeque::with_capacity(capacity),
                pending: HashSet::with_capacity(capacity),
            }),
        }
    }

    fn lock(&self) -> FrontierResult<MutexGuard<'_, Ring>> {
        self.ring
            .lock()
            .map_err(|_| FrontierError::Backend(format!("frontier '{}' lock poisoned", self.name)))
    }
}

impl Frontier for MemoryFrontier {
    fn spawn(&self, name: &str) -> FrontierResult<Arc<dyn Frontier>> {
        Ok(Arc::new(MemoryFrontier::new(name, self.capacity)))
    }

    fn enqueue(&self, url: &str) -> FrontierResult<()> {
        let mut ring = self.lock()?;
        if !ring.pending.insert(url.to_string()) {
            return Err(FrontierError::Duplicate(url.to_string()));
        }
        ring.queue.push_back(url.to_string());
        Ok(())
    }

    fn dequeue(&self) -> FrontierResult<String> {
        let mut ring = self.lock()?;
        let url = ring.queue.pop_front().ok_or(FrontierError::Empty)?;
        ring.pending.remove(&url);
        Ok(url)
    }

    fn len(&self) -> usize {
        self.lock().map(|ring| ring.queue.len()).unwrap_or(0)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
