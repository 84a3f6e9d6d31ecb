// Risk classification for a single command string. Pure: same input and
// denylist, same verdict. Rules are checked in order, first match wins.

pub fn is_dangerous(command: &str, denylist: &[String]) -> bool {
    // Tokenization failure (unbalanced quotes etc.) fails closed.
    let tokens = match shlex::split(command) {
        Some(t) => t,
        None => return true,
    };

    let base = match tokens.first() {
        Some(t) => t.as_str(),
        None => return false,
    };

    if denylist.iter().any(|d| d == base) {
        return true;
    }

    // Redirections rewrite files; pipes feeding rm/mv hide a destructive tail.
    if command.contains('>') || (command.contains('|') && (command.contains("rm") || command.contains("mv"))) {
        return true;
    }

    // Redundant with the denylist entry for rm, kept for clarity of intent.
    if base == "rm" && tokens.iter().any(|t| t == "-rf") {
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn denylist() -> Vec<String> {
        Config::default().safety.dangerous_commands
    }

    #[test]
    fn classification_is_deterministic() {
        let list = denylist();
        for _ in 0..3 {
            assert!(is_dangerous("rm -rf /tmp/x", &list));
            assert!(!is_dangerous("ls -la", &list));
        }
    }

    #[test]
    fn denylisted_first_token_is_dangerous() {
        let list = denylist();
        assert!(is_dangerous("rm file.txt", &list));
        assert!(is_dangerous("mv a b", &list));
        assert!(is_dangerous("dd if=/dev/zero of=/dev/sda", &list));
        assert!(is_dangerous("kill -9 1234", &list));
    }

    #[test]
    fn redirection_is_dangerous() {
        let list = denylist();
        assert!(is_dangerous("echo hi > /etc/passwd", &list));
        assert!(is_dangerous("cat a 2> b", &list));
    }

    #[test]
    fn pipe_with_rm_or_mv_is_dangerous() {
        let list = denylist();
        assert!(is_dangerous("find . -name '*.log' | xargs rm", &list));
        assert!(!is_dangerous("ps aux | grep ssh", &list));
    }

    #[test]
    fn unbalanced_quotes_fail_closed() {
        assert!(is_dangerous("echo \"unterminated", &denylist()));
    }

    #[test]
    fn read_only_commands_pass() {
        let list = denylist();
        assert!(!is_dangerous("df -h", &list));
        assert!(!is_dangerous("uptime", &list));
        assert!(!is_dangerous("", &list));
    }
}
