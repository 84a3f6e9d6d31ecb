use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

// One extracted shell invocation. Danger is decided by the classifier at
// confirmation time, not carried here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandUnit {
    pub text: String,
    pub working_dir: Option<PathBuf>,
}

impl CommandUnit {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            working_dir: None,
        }
    }
}

// A multi-line script plus its intended save path. Whether to run it after
// saving is resolved interactively, never by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptUnit {
    pub target_path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    NoAction,
    Script(ScriptUnit),
    Commands(Vec<CommandUnit>),
}

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: String,
}
