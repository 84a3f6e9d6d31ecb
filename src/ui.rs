use crate::types::{CommandUnit, ExecutionResult};
use crossterm::{
    cursor,
    execute,
    terminal::{self, Clear, ClearType},
};
use std::io::{self, Write};

const PAGE_MARGIN: usize = 3;
const AFFIRMATIVE_TOKENS: [&str; 4] = ["y", "yes", "o", "oui"];

pub fn is_affirmative(input: &str) -> bool {
    AFFIRMATIVE_TOKENS.contains(&input.trim().to_lowercase().as_str())
}

// Line-oriented yes/no gate. EOF or an interrupted read counts as a refusal,
// never as a fault.
pub fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    io::stdout().flush().ok();

    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(0) => false,
        Ok(_) => is_affirmative(&input),
        Err(_) => false,
    }
}

pub fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    io::stdout().flush().ok();

    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(0) => None,
        Ok(_) => Some(input.trim().to_string()),
        Err(_) => Some(String::new()),
    }
}

pub fn print_response(text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        println!("\n{text}\n");
    }
}

pub fn print_commands(commands: &[CommandUnit]) {
    println!();
    for (i, cmd) in commands.iter().enumerate() {
        if commands.len() > 1 {
            println!("  {}. {}", i + 1, cmd.text);
        } else {
            println!("  {}", cmd.text);
        }
    }
    println!();
}

pub fn print_result(command: &str, result: &ExecutionResult) {
    println!();
    if result.success {
        println!("  {command}");
    } else {
        println!("  {command} (failed)");
    }
    page_output(&result.output);
}

pub fn print_history(entries: &[String]) {
    if entries.is_empty() {
        println!("no commands executed yet.");
        return;
    }
    println!();
    for (i, entry) in entries.iter().enumerate() {
        println!("  {}. {}", i + 1, entry);
    }
    println!();
}

fn page_size(rows: usize) -> usize {
    rows.saturating_sub(PAGE_MARGIN).max(1)
}

// Long outputs are shown one screenful at a time with an explicit pause; a
// short output prints in one go.
pub fn page_output(text: &str) {
    let text = text.trim_end();
    if text.is_empty() {
        return;
    }

    let rows = terminal::size().map(|(_, h)| h as usize).unwrap_or(24);
    let page = page_size(rows);
    let lines: Vec<&str> = text.lines().collect();

    if lines.len() <= page {
        println!("{text}");
        return;
    }

    let chunks: Vec<&[&str]> = lines.chunks(page).collect();
    let last = chunks.len() - 1;
    for (i, chunk) in chunks.into_iter().enumerate() {
        for line in chunk {
            println!("{line}");
        }
        if i < last {
            print!("-- press enter to continue --");
            io::stdout().flush().ok();
            let mut pause = String::new();
            if io::stdin().read_line(&mut pause).is_err() {
                break;
            }
        }
    }
}

pub fn clear_screen() {
    let mut stdout = io::stdout();
    execute!(stdout, Clear(ClearType::All), cursor::MoveTo(0, 0)).ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affirmative_tokens_are_case_insensitive() {
        for token in ["y", "Y", "yes", "YES", "o", "Oui", " oui "] {
            assert!(is_affirmative(token), "{token} should confirm");
        }
    }

    #[test]
    fn anything_else_declines() {
        for token in ["", "n", "no", "non", "maybe", "yep"] {
            assert!(!is_affirmative(token), "{token} should decline");
        }
    }

    #[test]
    fn page_size_keeps_a_margin_and_a_floor() {
        assert_eq!(page_size(24), 24 - PAGE_MARGIN);
        assert_eq!(page_size(2), 1);
        assert_eq!(page_size(0), 1);
    }
}
