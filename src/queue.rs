use std::collections::VecDeque;

use crate::command::PaintCommand;

/// Pending paint commands, oldest first. Unbounded.
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: VecDeque<PaintCommand>,
}

impl CommandQueue {
    pub fn append<I>(&mut self, commands: I)
    where
        I: IntoIterator<Item = PaintCommand>,
    {
        self.commands.extend(commands);
    }

    pub fn pop_front(&mut self) -> Option<PaintCommand> {
        self.commands.pop_front()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
