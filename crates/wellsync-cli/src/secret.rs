//! Secret reference resolver.
//!
//! Credential values in `config.toml` may point at secrets kept elsewhere:
//!
//! - `pass::path/in/store`: first line of `pass show path/in/store`
//! - `env::VAR_NAME`: the value of `$VAR_NAME`
//! - anything else is used verbatim

/// Resolves a value that may carry a `pass::` or `env::` prefix.
pub fn resolve(value: &str) -> Result<String, String> {
    if let Some(path) = value.strip_prefix("pass::") {
        resolve_pass(path)
    } else if let Some(var) = value.strip_prefix("env::") {
        resolve_env(var)
    } else {
        Ok(value.to_string())
    }
}

fn resolve_pass(path: &str) -> Result<String, String> {
    let output = std::process::Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "`pass show {}` failed ({}): {}",
            path,
            output.status,
            stderr.trim()
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| format!("`pass show {}` produced no output", path))
}

fn resolve_env(var: &str) -> Result<String, String> {
    std::env::var(var).map_err(|_| format!("environment variable `{}` is not set", var))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_values_pass_through() {
        assert_eq!(resolve("plain-secret").unwrap(), "plain-secret");
        assert_eq!(resolve("").unwrap(), "");
    }

    #[test]
    fn env_reference() {
        unsafe {
            std::env::set_var("_WELLSYNC_TEST_SECRET", "from-env");
        }
        assert_eq!(resolve("env::_WELLSYNC_TEST_SECRET").unwrap(), "from-env");
        unsafe {
            std::env::remove_var("_WELLSYNC_TEST_SECRET");
        }
    }

    #[test]
    fn missing_env_reference_errors() {
        let err = resolve("env::_WELLSYNC_SURELY_UNSET_98765").unwrap_err();
        assert!(err.contains("not set"));
    }

    #[test]
    fn failing_pass_reference_errors() {
        assert!(resolve("pass::wellsync/does/not/exist/98765").is_err());
    }
}
