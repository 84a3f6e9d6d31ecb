use crate::types::{CommandUnit, Extraction, ScriptUnit};
use regex::Regex;
use thiserror::Error;

// Convention strings the system prompt teaches the model. The extractor and
// the prompt template must agree on these exactly.
pub const COMMANDS_BEGIN: &str = "PROPOSED COMMANDS:";
pub const COMMANDS_END: &str = "CONFIRM EXECUTION";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    #[error("response opens a command section but never closes it")]
    UnterminatedSection,
}

// One implementation per prompt convention; the engine only sees the trait,
// so the textual convention can change without touching it.
pub trait IntentExtractor {
    fn extract(&self, response: &str) -> Result<Extraction, ExtractError>;
}

pub struct MarkerExtractor {
    heredoc_open: Regex,
    list_number: Regex,
}

impl MarkerExtractor {
    pub fn new() -> Self {
        Self {
            heredoc_open: Regex::new(
                r#"(?m)^[ \t]*cat[ \t]*<<-?[ \t]*['"]?(\w+)['"]?[ \t]*>[ \t]*(\S+)[ \t]*$"#,
            )
            .expect("heredoc pattern"),
            list_number: Regex::new(r"^\d+[.)]\s*").expect("list number pattern"),
        }
    }

    // A heredoc-style file write inside the section becomes a single script.
    // The body between the opening invocation and the matching delimiter line
    // is taken verbatim.
    fn match_script(&self, section: &str) -> Option<ScriptUnit> {
        let caps = self.heredoc_open.captures(section)?;
        let delimiter = caps.get(1)?.as_str();
        let target_path = caps.get(2)?.as_str().to_string();

        let rest = &section[caps.get(0)?.end()..];
        let rest = rest.strip_prefix('\n')?;

        let mut body = Vec::new();
        for line in rest.lines() {
            if line.trim() == delimiter {
                return Some(ScriptUnit {
                    target_path,
                    content: body.join("\n"),
                });
            }
            body.push(line);
        }
        None
    }

    fn clean_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("```") {
            return None;
        }
        let line = self.list_number.replace(line, "");
        let line = line.trim_matches('`').trim();
        if line.is_empty() {
            return None;
        }
        Some(line.to_string())
    }
}

impl Default for MarkerExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentExtractor for MarkerExtractor {
    fn extract(&self, response: &str) -> Result<Extraction, ExtractError> {
        let Some(start) = response.find(COMMANDS_BEGIN) else {
            return Ok(Extraction::NoAction);
        };
        let after = &response[start + COMMANDS_BEGIN.len()..];
        let Some(end) = after.find(COMMANDS_END) else {
            return Err(ExtractError::UnterminatedSection);
        };
        let section = &after[..end];

        if let Some(script) = self.match_script(section) {
            return Ok(Extraction::Script(script));
        }

        let commands: Vec<CommandUnit> = section
            .lines()
            .filter_map(|l| self.clean_line(l))
            .map(CommandUnit::new)
            .collect();

        if commands.is_empty() {
            return Ok(Extraction::NoAction);
        }
        Ok(Extraction::Commands(commands))
    }
}
