//! In-game message log shown to the player. Lines are word-wrapped to the panel width
//! and the oldest lines fall off once the visible line count is exceeded.

use std::collections::VecDeque;
use std::mem;

use serde::{Deserialize, Serialize};

use crate::types::Tint;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub tint: Tint,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLog {
    lines: VecDeque<Message>,
    capacity: usize,
    width: usize,
}

impl MessageLog {
    pub fn new(capacity: usize, width: usize) -> Self {
        Self { lines: VecDeque::with_capacity(capacity), capacity, width: width.max(1) }
    }

    pub fn push(&mut self, text: impl AsRef<str>, tint: Tint) {
        for line in wrap(text.as_ref(), self.width) {
            if self.lines.len() == self.capacity {
                self.lines.pop_front();
            }
            if self.capacity > 0 {
                self.lines.push_back(Message { text: line, tint });
            }
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &Message> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.lines.back()
    }

    /// True when any visible line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|message| message.text.contains(needle))
    }
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() { word.len() } else { current.len() + 1 + word.len() };
        if needed > width && !current.is_empty() {
            lines.push(mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
