use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

const APP_NAME: &str = "oui";
const DEFAULT_MODEL: &str = "mistral-large-latest";
const DEFAULT_ENDPOINT: &str = "https://api.mistral.ai/v1/chat/completions";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    pub context_turns: usize,
    pub history_max: usize,
    // Off by default: the engine inherits the source behavior of letting
    // subprocesses run unbounded unless the operator opts in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    pub dangerous_commands: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub scripts_dir: PathBuf,
    pub history_file: PathBuf,
    pub log_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub behavior: BehaviorConfig,
    pub safety: SafetyConfig,
    pub paths: PathsConfig,
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                model: DEFAULT_MODEL.to_string(),
                api_key: String::new(),
                temperature: 0.7,
                max_tokens: 4000,
                request_timeout_secs: 60,
            },
            behavior: BehaviorConfig {
                context_turns: 4,
                history_max: 20,
                command_timeout_secs: None,
            },
            safety: SafetyConfig {
                dangerous_commands: vec![
                    "rm", "mv", "dd", "mkfs", "fdisk", ">", "2>", "truncate", "rmdir", "pkill",
                    "kill",
                ]
                .into_iter()
                .map(String::from)
                .collect(),
            },
            paths: PathsConfig {
                scripts_dir: data_dir().join("scripts"),
                history_file: data_dir().join("history.json"),
                log_file: data_dir().join("oui.log"),
            },
        }
    }
}

impl Config {
    // Environment wins over the config file so keys stay out of dotfiles.
    pub fn api_key(&self) -> String {
        env::var("MISTRAL_API_KEY").unwrap_or_else(|_| self.llm.api_key.clone())
    }
}

pub fn get_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("config.toml")
}

pub fn load_config() -> Config {
    let path = get_config_path();
    if path.exists() {
        if let Ok(content) = fs::read_to_string(&path) {
            if let Ok(config) = toml::from_str(&content) {
                return config;
            }
        }
    }
    Config::default()
}

pub fn save_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let path = get_config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
