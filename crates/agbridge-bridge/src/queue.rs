//! Per-device command queues.
//!
//! Commands arrive asynchronously over the bus but can only be
//! delivered when the device polls, so each device gets a bounded FIFO
//! that favors command recency: when full, the oldest entry is dropped.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;

/// Maximum number of pending commands per device.
pub const MAX_QUEUE_LEN: usize = 10;

/// Bounded FIFO of pending command strings for one device.
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: VecDeque<String>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command. If the bound is exceeded, the oldest entry is
    /// dropped (never the new one). Always succeeds.
    pub fn enqueue(&mut self, command: impl Into<String>) {
        self.commands.push_back(command.into());

        if self.commands.len() > MAX_QUEUE_LEN {
            self.commands.pop_front();
        }
    }

    /// Remove and return the oldest pending command, if any.
    pub fn dequeue(&mut self) -> Option<String> {
        self.commands.pop_front()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Registry mapping device id to its command queue.
///
/// Queues are created on first reference and live for the process
/// lifetime; there is no removal path. The per-device mutex serializes
/// an enqueue from the bus handler against a dequeue from the poll
/// handler.
#[derive(Debug, Default)]
pub struct CommandQueueManager {
    queues: DashMap<String, Arc<Mutex<CommandQueue>>>,
}

impl CommandQueueManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the queue for `device_id`, creating it if needed. The
    /// get-or-create is atomic: concurrent callers for the same id
    /// observe a single shared queue instance.
    pub fn queue_for(&self, device_id: &str) -> Arc<Mutex<CommandQueue>> {
        self.queues
            .entry(device_id.to_string())
            .or_default()
            .clone()
    }

    /// Append a command to the device's queue.
    pub fn enqueue(&self, device_id: &str, command: impl Into<String>) {
        let queue = self.queue_for(device_id);
        let mut queue = queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.enqueue(command);
    }

    /// Remove and return the next pending command for the device.
    pub fn dequeue(&self, device_id: &str) -> Option<String> {
        let queue = self.queue_for(device_id);
        let mut queue = queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.dequeue()
    }
}
