use crate::types::{ConversationTurn, Role};

// Ordered turn log resent to the model each request. The system turn, once
// set, stays at index 0 forever; everything else evicts oldest-first past
// the cap.
pub struct ConversationContext {
    turns: Vec<ConversationTurn>,
    cap: usize,
}

impl ConversationContext {
    pub fn new(cap: usize) -> Self {
        Self {
            turns: Vec::new(),
            cap,
        }
    }

    pub fn set_system(&mut self, content: impl Into<String>) {
        let turn = ConversationTurn::new(Role::System, content);
        match self.turns.first() {
            Some(first) if first.role == Role::System => self.turns[0] = turn,
            _ => self.turns.insert(0, turn),
        }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(ConversationTurn::new(role, content));
        self.evict();
    }

    fn evict(&mut self) {
        let has_system = matches!(self.turns.first(), Some(t) if t.role == Role::System);
        let base = usize::from(has_system);
        while self.turns.len() > base + self.cap {
            self.turns.remove(base);
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }
}
