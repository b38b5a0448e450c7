//! Scheduling primitives.
//!
//! The delayed executor keeps its pending work in a [`deadline::DeadlineQueue`],
//! a min-heap that always yields the task with the earliest deadline.

pub(crate) mod deadline;

pub(crate) use deadline::DeadlineQueue;
