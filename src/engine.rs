use crate::config::Config;
use crate::context::ConversationContext;
use crate::error::Result;
use crate::executor;
use crate::extract::{IntentExtractor, MarkerExtractor, COMMANDS_BEGIN, COMMANDS_END};
use crate::history::SessionHistory;
use crate::mistral::MistralClient;
use crate::safety::is_dangerous;
use crate::types::{CommandUnit, ConversationTurn, Extraction, Role, ScriptUnit};
use crate::ui;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

// Confirmation prompts go through this seam so the turn flow can be driven
// without a terminal.
pub trait Prompter {
    fn confirm(&mut self, prompt: &str) -> bool;
}

pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm(&mut self, prompt: &str) -> bool {
        ui::confirm(prompt)
    }
}

fn system_prompt(scripts_dir: &Path) -> String {
    format!(
        "You are a terminal assistant for Linux administration and DevOps tasks.\n\
         Be concise and precise.\n\
         \n\
         When the request calls for shell commands, propose them between two\n\
         marker lines, one command per line, nothing else inside:\n\
         \n\
         {COMMANDS_BEGIN}\n\
         df -h\n\
         {COMMANDS_END}\n\
         \n\
         To create a script instead, put a single heredoc write inside the\n\
         section; the path is relative and the file lands under {dir}:\n\
         \n\
         {COMMANDS_BEGIN}\n\
         cat << 'EOF' > cleanup.sh\n\
         #!/bin/sh\n\
         echo cleaning\n\
         EOF\n\
         {COMMANDS_END}\n\
         \n\
         For a plain answer, use no markers at all. Warn the operator before\n\
         proposing destructive commands.",
        dir = scripts_dir.display()
    )
}

// Owns the per-session state and drives one operator turn at a time:
// model call, extraction, confirmation, execution, reporting.
pub struct ConfirmationEngine {
    config: Config,
    client: MistralClient,
    extractor: Box<dyn IntentExtractor>,
    prompter: Box<dyn Prompter>,
    context: ConversationContext,
    history: SessionHistory,
    current_dir: PathBuf,
}

impl ConfirmationEngine {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_parts(
            config,
            Box::new(MarkerExtractor::new()),
            Box::new(StdinPrompter),
        )
    }

    pub fn with_parts(
        config: Config,
        extractor: Box<dyn IntentExtractor>,
        prompter: Box<dyn Prompter>,
    ) -> Result<Self> {
        let client = MistralClient::new(&config.llm, config.api_key())?;
        let mut context = ConversationContext::new(config.behavior.context_turns);
        context.set_system(system_prompt(&config.paths.scripts_dir));
        let history = SessionHistory::load(
            config.paths.history_file.clone(),
            config.behavior.history_max,
        );
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Ok(Self {
            config,
            client,
            extractor,
            prompter,
            context,
            history,
            current_dir,
        })
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    pub fn history_entries(&self) -> &[String] {
        self.history.entries()
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.config.paths.scripts_dir
    }

    // Best-effort final write; every mutation already persisted.
    pub fn flush(&self) {
        if let Err(e) = self.history.save() {
            warn!("final history flush failed: {e}");
        }
    }

    // One full operator turn. The context only absorbs the exchange once the
    // model call succeeded; an aborted turn leaves it untouched.
    pub fn run_turn(&mut self, input: &str) -> Result<()> {
        let mut messages = self.context.turns().to_vec();
        messages.push(ConversationTurn::new(Role::User, input));

        let response = self.client.chat(&messages)?;

        self.process_response(&response);

        self.context.push(Role::User, input);
        self.context.push(Role::Assistant, response);
        Ok(())
    }

    pub fn process_response(&mut self, response: &str) {
        match self.extractor.extract(response) {
            Err(e) => {
                warn!("extraction failed: {e}");
                println!("could not parse the proposed commands; nothing will be executed.");
                ui::print_response(response);
            }
            Ok(Extraction::NoAction) => ui::print_response(response),
            Ok(Extraction::Script(script)) => self.handle_script(script),
            Ok(Extraction::Commands(commands)) => self.handle_commands(commands),
        }
    }

    // The script is written to disk before the operator answers; declining
    // leaves the saved file in place.
    fn handle_script(&mut self, script: ScriptUnit) {
        let path = match executor::save_script(&script, &self.config.paths.scripts_dir) {
            Ok(p) => p,
            Err(e) => {
                warn!("script not saved: {e}");
                println!("could not save the script: {e}");
                return;
            }
        };
        info!("script saved: {}", path.display());
        println!("\nscript saved: {}", path.display());
        ui::page_output(&script.content);

        if self.prompter.confirm("run this script now?") {
            let invocation = path.to_string_lossy().into_owned();
            self.history.record(invocation.clone());
            let result = executor::run(&invocation, Some(&self.current_dir), self.timeout());
            ui::print_result(&invocation, &result);
        } else {
            println!("not executed.");
        }
    }

    // One upfront confirmation gates the whole batch; dangerous commands get
    // a second, individual gate. Every command of a confirmed batch lands in
    // the session history, skipped or not.
    fn handle_commands(&mut self, commands: Vec<CommandUnit>) {
        ui::print_commands(&commands);
        if !self.prompter.confirm("run these commands?") {
            println!("cancelled.");
            return;
        }

        for unit in commands {
            if is_dangerous(&unit.text, &self.config.safety.dangerous_commands) {
                let prompt = format!("'{}' may be destructive. run it anyway?", unit.text);
                if !self.prompter.confirm(&prompt) {
                    self.history.record(unit.text.clone());
                    println!("  skipped: {}", unit.text);
                    continue;
                }
            }

            self.history.record(unit.text.clone());
            info!("executing: {}", unit.text);

            if let Some(target) = unit.text.trim().strip_prefix("cd ") {
                let message = self.change_dir(target);
                println!("  {message}");
                continue;
            }

            let dir = unit
                .working_dir
                .clone()
                .unwrap_or_else(|| self.current_dir.clone());
            let result = executor::run(&unit.text, Some(&dir), self.timeout());
            ui::print_result(&unit.text, &result);
        }
    }

    // cd moves the engine, not a subshell; later commands inherit it.
    pub fn change_dir(&mut self, target: &str) -> String {
        let target = target.trim();
        let candidate = if Path::new(target).is_absolute() {
            PathBuf::from(target)
        } else if let Some(rest) = target.strip_prefix('~') {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(rest.trim_start_matches('/'))
        } else {
            self.current_dir.join(target)
        };

        match candidate.canonicalize() {
            Ok(dir) if dir.is_dir() => {
                self.current_dir = dir.clone();
                format!("current directory: {}", dir.display())
            }
            _ => format!("no such directory: {}", candidate.display()),
        }
    }

    fn timeout(&self) -> Option<Duration> {
        self.config
            .behavior
            .command_timeout_secs
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::fs;

    struct ScriptedPrompter {
        answers: VecDeque<bool>,
    }

    impl Prompter for ScriptedPrompter {
        fn confirm(&mut self, _prompt: &str) -> bool {
            self.answers.pop_front().unwrap_or(false)
        }
    }

    fn test_engine(root: &Path, answers: &[bool]) -> ConfirmationEngine {
        let mut config = Config::default();
        config.paths.scripts_dir = root.join("scripts");
        config.paths.history_file = root.join("history.json");
        let mut engine = ConfirmationEngine::with_parts(
            config,
            Box::new(MarkerExtractor::new()),
            Box::new(ScriptedPrompter {
                answers: answers.iter().copied().collect(),
            }),
        )
        .unwrap();
        let moved = engine.change_dir(&root.to_string_lossy());
        assert!(moved.starts_with("current directory:"), "{moved}");
        engine
    }

    fn response_with(commands: &str) -> String {
        format!("{COMMANDS_BEGIN}\n{commands}\n{COMMANDS_END}")
    }

    #[test]
    fn prose_response_executes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = test_engine(dir.path(), &[]);
        engine.process_response("Disk usage is healthy, nothing to do.");
        assert!(engine.history_entries().is_empty());
    }

    #[test]
    fn declined_batch_leaves_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = test_engine(dir.path(), &[false]);
        engine.process_response(&response_with("touch a.txt\ntouch b.txt\ntouch c.txt"));

        assert!(engine.history_entries().is_empty());
        assert!(!dir.path().join("a.txt").exists());
        assert!(!dir.path().join("b.txt").exists());
        assert!(!dir.path().join("c.txt").exists());
    }

    #[test]
    fn declined_dangerous_command_is_skipped_but_recorded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("victim.txt"), "keep me").unwrap();

        // yes to the batch, no to the dangerous rm
        let mut engine = test_engine(dir.path(), &[true, false]);
        engine.process_response(&response_with("rm victim.txt\ntouch done.txt"));

        assert!(dir.path().join("victim.txt").exists());
        assert!(dir.path().join("done.txt").exists());
        assert_eq!(engine.history_entries(), &["rm victim.txt", "touch done.txt"]);
    }

    #[test]
    fn confirmed_dangerous_command_runs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("victim.txt"), "goodbye").unwrap();

        let mut engine = test_engine(dir.path(), &[true, true]);
        engine.process_response(&response_with("rm victim.txt"));

        assert!(!dir.path().join("victim.txt").exists());
        assert_eq!(engine.history_entries(), &["rm victim.txt"]);
    }

    #[test]
    fn declined_script_is_still_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = test_engine(dir.path(), &[false]);
        let response = format!(
            "{COMMANDS_BEGIN}\ncat << 'EOF' > probe.sh\n#!/bin/sh\ntouch ran.txt\nEOF\n{COMMANDS_END}"
        );
        engine.process_response(&response);

        let saved = dir.path().join("scripts").join("probe.sh");
        assert_eq!(
            fs::read_to_string(&saved).unwrap(),
            "#!/bin/sh\ntouch ran.txt"
        );
        assert!(!dir.path().join("ran.txt").exists());
        assert!(engine.history_entries().is_empty());
    }

    #[test]
    fn confirmed_script_runs_from_its_saved_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = test_engine(dir.path(), &[true]);
        let response = format!(
            "{COMMANDS_BEGIN}\ncat << 'EOF' > probe.sh\n#!/bin/sh\ntouch \"$(dirname \"$0\")/../ran.txt\"\nEOF\n{COMMANDS_END}"
        );
        engine.process_response(&response);

        assert!(dir.path().join("ran.txt").exists());
        assert_eq!(engine.history_entries().len(), 1);
        assert!(engine.history_entries()[0].ends_with("probe.sh"));
    }

    #[test]
    fn cd_moves_the_engine_not_a_subshell() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("inner")).unwrap();

        let mut engine = test_engine(dir.path(), &[true]);
        engine.process_response(&response_with("cd inner\ntouch here.txt"));

        assert!(dir.path().join("inner").join("here.txt").exists());
        assert!(engine.current_dir().ends_with("inner"));
    }

    #[test]
    fn change_dir_rejects_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = test_engine(dir.path(), &[]);
        let before = engine.current_dir().to_path_buf();
        let message = engine.change_dir("does-not-exist");
        assert!(message.starts_with("no such directory"));
        assert_eq!(engine.current_dir(), before);
    }

    #[test]
    fn unterminated_section_executes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = test_engine(dir.path(), &[true, true, true]);
        engine.process_response(&format!("{COMMANDS_BEGIN}\ntouch leak.txt\n"));
        assert!(!dir.path().join("leak.txt").exists());
        assert!(engine.history_entries().is_empty());
    }

    #[test]
    fn prompt_template_teaches_the_extraction_markers() {
        let prompt = system_prompt(Path::new("/tmp/scripts"));
        assert!(prompt.contains(COMMANDS_BEGIN));
        assert!(prompt.contains(COMMANDS_END));
    }
}
