use crate::error::{Error, Result};
use crate::executor::{Task, TaskId};
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::time::Instant;

/// Heap entry ordering tasks so that `BinaryHeap` pops the earliest deadline.
#[derive(Debug)]
struct DeadlineTask(Task);

impl PartialEq for DeadlineTask {
    fn eq(&self, other: &Self) -> bool {
        self.0.when == other.0.when && self.0.id == other.0.id
    }
}

impl Eq for DeadlineTask {}

impl PartialOrd for DeadlineTask {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeadlineTask {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // reversed: max-heap of "earliest"
        let deadline_cmp = other.0.when.cmp(&self.0.when);
        if deadline_cmp != CmpOrdering::Equal {
            return deadline_cmp;
        }

        // ties go to the task scheduled first
        other.0.id.cmp(&self.0.id)
    }
}

/// Min-heap of pending tasks keyed by deadline.
///
/// Not internally synchronized: the executor guards it together with its
/// termination flag under one mutex.
#[derive(Debug, Default)]
pub(crate) struct DeadlineQueue {
    heap: BinaryHeap<DeadlineTask>,
    capacity: Option<usize>,
}

impl DeadlineQueue {
    pub fn with_capacity_limit(capacity: Option<usize>) -> Self {
        Self {
            heap: BinaryHeap::new(),
            capacity,
        }
    }

    /// Insert a task. On error the queue is left untouched.
    pub fn push(&mut self, task: Task) -> Result<()> {
        if let Some(capacity) = self.capacity {
            if self.heap.len() >= capacity {
                return Err(Error::QueueFull { capacity });
            }
        }
        self.heap.try_reserve(1).map_err(|_| Error::OutOfMemory)?;
        self.heap.push(DeadlineTask(task));
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Task> {
        self.heap.pop().map(|dt| dt.0)
    }

    /// Pop the earliest task only if its deadline has passed.
    pub fn pop_due(&mut self, now: Instant) -> Option<Task> {
        match self.heap.peek() {
            Some(dt) if dt.0.is_due(now) => self.pop(),
            _ => None,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|dt| dt.0.when)
    }

    pub fn peek_id(&self) -> Option<TaskId> {
        self.heap.peek().map(|dt| dt.0.id)
    }

    /// Move every task out, leaving an empty queue with the same limit.
    pub fn take_all(&mut self) -> DeadlineQueue {
        DeadlineQueue {
            heap: std::mem::take(&mut self.heap),
            capacity: self.capacity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

/// Drains in deadline order.
impl Iterator for DeadlineQueue {
    type Item = Task;

    fn next(&mut self) -> Option<Task> {
        self.pop()
    }
}
