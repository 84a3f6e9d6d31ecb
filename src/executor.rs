use crate::error::{AgentError, Result};
use crate::types::{ExecutionResult, ScriptUnit};
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use std::{fs, io};
use wait_timeout::ChildExt;

// Runs one command through the shell. Every failure mode, including a
// spawn-level fault, comes back as a failed ExecutionResult rather than an
// error: the batch must be able to continue past it.
pub fn run(command: &str, working_dir: Option<&Path>, timeout: Option<Duration>) -> ExecutionResult {
    let mut builder = Command::new("sh");
    builder
        .arg("-c")
        .arg(command)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = working_dir {
        builder.current_dir(dir);
    }

    let child = match builder.spawn() {
        Ok(c) => c,
        Err(e) => {
            return ExecutionResult {
                success: false,
                output: format!("failed to start command: {e}"),
            }
        }
    };

    match wait_for(child, timeout) {
        Ok(Some(output)) => {
            let success = output.status.success();
            let text = if success {
                String::from_utf8_lossy(&output.stdout).into_owned()
            } else {
                String::from_utf8_lossy(&output.stderr).into_owned()
            };
            ExecutionResult {
                success,
                output: text,
            }
        }
        Ok(None) => ExecutionResult {
            success: false,
            output: format!(
                "command exceeded the {}s timeout and was killed",
                timeout.map(|t| t.as_secs()).unwrap_or_default()
            ),
        },
        Err(e) => ExecutionResult {
            success: false,
            output: format!("failed to run command: {e}"),
        },
    }
}

fn wait_for(
    mut child: std::process::Child,
    timeout: Option<Duration>,
) -> io::Result<Option<std::process::Output>> {
    if let Some(limit) = timeout {
        if child.wait_timeout(limit)?.is_none() {
            child.kill().ok();
            child.wait().ok();
            return Ok(None);
        }
    }
    child.wait_with_output().map(Some)
}

// Materializes a script under the scripts directory and marks it executable.
// Saving always precedes any offer to run it.
pub fn save_script(script: &ScriptUnit, scripts_dir: &Path) -> Result<PathBuf> {
    let filename = if script.target_path.trim().is_empty() {
        chrono::Local::now()
            .format("script_%Y%m%d_%H%M%S.sh")
            .to_string()
    } else {
        script.target_path.trim().to_string()
    };

    let relative = Path::new(&filename);
    let escapes = relative.is_absolute()
        || relative
            .components()
            .any(|c| matches!(c, Component::ParentDir));
    if escapes {
        return Err(AgentError::ScriptPath(filename));
    }

    let full_path = scripts_dir.join(relative);
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&full_path, &script.content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&full_path)?.permissions();
        perms.set_mode(perms.mode() | 0o700);
        fs::set_permissions(&full_path, perms)?;
    }

    Ok(full_path)
}
