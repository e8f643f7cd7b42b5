// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Bounded FIFO queue decoupling the serial receive path from the main loop.

use heapless::Deque;

use crate::protocol::commands::Command;

/// Fixed queue capacity. Overflow drops the newest command; the bound is a
/// deliberate memory/backpressure choice for this target.
pub const COMMAND_QUEUE_DEPTH: usize = 32;

/// Fixed-capacity command queue, single producer / single consumer.
///
/// The receive path enqueues and the main loop dequeues; neither end may have
/// more than one caller. If the producer ever moves into interrupt context,
/// wrap both ends in `cortex_m::interrupt::free` — a short critical section,
/// never a blocking mutex, to avoid priority inversion against the interrupt.
pub struct CommandQueue {
    commands: Deque<Command, COMMAND_QUEUE_DEPTH>,
}

impl CommandQueue {
    pub const fn new() -> Self {
        Self {
            commands: Deque::new(),
        }
    }

    /// Append a command. Returns `false` (command dropped) when full.
    pub fn enqueue(&mut self, command: Command) -> bool {
        self.commands.push_back(command).is_ok()
    }

    /// Remove the oldest command, if any.
    pub fn dequeue(&mut self) -> Option<Command> {
        self.commands.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.commands.is_full()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(channel: u8) -> Command {
        Command::Release {
            channel,
            duty_cycle: 0,
        }
    }

    #[test]
    fn test_queue_starts_empty() {
        let queue = CommandQueue::new();
        assert!(queue.is_empty());
        assert!(!queue.is_full());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_queue_fifo_order() {
        let mut queue = CommandQueue::new();
        assert!(queue.enqueue(release(1)));
        assert!(queue.enqueue(release(2)));
        assert!(queue.enqueue(release(3)));
        assert_eq!(queue.dequeue(), Some(release(1)));
        assert_eq!(queue.dequeue(), Some(release(2)));
        assert_eq!(queue.dequeue(), Some(release(3)));
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_queue_overflow_drops_newest_and_keeps_contents() {
        let mut queue = CommandQueue::new();
        for channel in 0..COMMAND_QUEUE_DEPTH as u8 {
            assert!(queue.enqueue(release(channel % 12)));
        }
        assert!(queue.is_full());

        // The 33rd enqueue fails and the original 32 stay, oldest first.
        assert!(!queue.enqueue(release(7)));
        assert_eq!(queue.len(), COMMAND_QUEUE_DEPTH);
        for channel in 0..COMMAND_QUEUE_DEPTH as u8 {
            assert_eq!(queue.dequeue(), Some(release(channel % 12)));
        }
    }
}
