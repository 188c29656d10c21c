//! Conversation history sent by the client.

/// Past (question, answer) turns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatHistory {
    turns: Vec<(String, String)>,
}

impl ChatHistory {
    /// Pair a flat `[human, assistant, human, assistant, ...]` list into turns.
    ///
    /// A trailing message without a reply is ignored.
    pub fn from_flat(messages: &[String]) -> Self {
        let turns = messages
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();
        Self { turns }
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Render as `Human:`/`Assistant:` lines for prompt templates.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|(human, ai)| format!("\nHuman: {}\nAssistant: {}", human, ai))
            .collect()
    }
}
