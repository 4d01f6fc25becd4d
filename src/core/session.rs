use super::model::Turn;

/// The ordered transcript of a single chat session.
///
/// The transcript is only ever appended to and is dropped together with the session.
/// It is used for display and never fed back into retrieval or generation.
#[derive(Debug, Default, Clone)]
pub struct SessionStore {
    turns: Vec<Turn>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Iterate the transcript in chronological order.
    pub fn enumerate(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
