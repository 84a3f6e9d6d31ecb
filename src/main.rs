mod config;
mod context;
mod engine;
mod error;
mod executor;
mod extract;
mod history;
mod mistral;
mod safety;
mod types;
mod ui;

use engine::ConfirmationEngine;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::{env, fs};
use tracing_subscriber::EnvFilter;

fn init_logging(path: &std::path::Path, debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    match fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        Err(_) => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

fn print_banner(engine: &ConfirmationEngine) {
    println!("====== oui - a confirm-first terminal assistant ======");
    println!("scripts directory: {}", engine.scripts_dir().display());
    println!("special commands:");
    println!("  exit | quit : leave the session");
    println!("  history     : show executed commands");
    println!("  clear       : clear the screen");
    println!("  cd <path>   : change directory");
    println!();
}

fn print_usage() {
    eprintln!("usage: oui [--scripts-dir <path>] [--start-dir <path>] [--debug]");
}

fn main() {
    let mut config = config::load_config();
    if !config::get_config_path().exists() {
        config::save_config(&config).ok();
    }

    let mut debug = false;
    let mut start_dir: Option<String> = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--scripts-dir" | "-s" => match args.next() {
                Some(dir) => config.paths.scripts_dir = PathBuf::from(dir),
                None => {
                    print_usage();
                    return;
                }
            },
            "--start-dir" => match args.next() {
                Some(dir) => start_dir = Some(dir),
                None => {
                    print_usage();
                    return;
                }
            },
            "--debug" | "-d" => debug = true,
            "-h" | "--help" | "help" => {
                print_usage();
                return;
            }
            _ => {
                print_usage();
                return;
            }
        }
    }

    init_logging(&config.paths.log_file, debug);

    if config.api_key().is_empty() {
        eprintln!("oui: no API key; set MISTRAL_API_KEY or [llm] api_key in the config");
        std::process::exit(1);
    }

    let mut engine = match ConfirmationEngine::new(config) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("oui: {e}");
            std::process::exit(1);
        }
    };

    if let Some(dir) = start_dir {
        println!("{}", engine.change_dir(&dir));
    }

    // SIGINT only aborts the prompt in flight; history is already durable.
    ctrlc::set_handler(|| {
        println!("\ninterrupted. type 'exit' to quit.");
    })
    .ok();

    print_banner(&engine);

    loop {
        let dir_name = engine
            .current_dir()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "/".to_string());

        let Some(input) = ui::read_line(&format!("oui@{dir_name} $ ")) else {
            break;
        };
        let input = input.trim().to_string();

        match input.to_lowercase().as_str() {
            "" => continue,
            "exit" | "quit" => break,
            "clear" => {
                ui::clear_screen();
                continue;
            }
            "history" => {
                ui::print_history(engine.history_entries());
                continue;
            }
            _ => {}
        }

        if let Some(target) = input.strip_prefix("cd ") {
            println!("{}", engine.change_dir(target));
            continue;
        }

        eprint!("thinking...");
        std::io::stderr().flush().ok();
        let outcome = engine.run_turn(&input);
        eprint!("\r           \r");
        std::io::stderr().flush().ok();

        if let Err(e) = outcome {
            tracing::error!("turn aborted: {e}");
            eprintln!("oui: {e}");
        }
    }

    engine.flush();
    println!("bye.");
}
