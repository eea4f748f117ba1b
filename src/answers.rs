// Pending answers for puzzles that have been served but not yet revealed.

/// FIFO of answer texts. Appended one at a time, only ever emptied in full.
#[derive(Debug, Clone, Default)]
pub struct AnswerQueue {
    answers: Vec<String>,
}

impl AnswerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an answer to the back of the queue.
    pub fn append(&mut self, answer: impl Into<String>) {
        self.answers.push(answer.into());
    }

    /// Take every pending answer in append order, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.answers)
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}
