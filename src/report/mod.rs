//! Post-install guidance and the `--version` smoke test.

use log::{debug, warn};
use std::fmt::Write as _;
use std::path::Path;

use crate::install::{InstalledCompletion, InstalledLayout, Shell, executable_destination};
use crate::release::Alias;
use crate::runtime::Runtime;

/// Caveats text: alias suggestions per shell, then the installed files.
pub fn caveats(layout: &InstalledLayout, product: &str, aliases: &[Alias]) -> String {
    let mut out = String::new();

    if !aliases.is_empty() {
        out.push_str(
            "To enable command aliases, add the following to your shell configuration file:\n",
        );
        for shell in Shell::ALL {
            let _ = write!(out, "\nFor {} ({}):\n", shell, shell.rc_file());
            for alias in aliases {
                let _ = writeln!(out, "  alias {}='{} {}'", alias.name, product, alias.flag);
            }
        }
        out.push('\n');
    }

    out.push_str("Installed files:\n");
    for file in layout.files() {
        let _ = writeln!(out, "  {}", file.display());
    }
    out
}

/// Whatever of the standard layout currently exists under `prefix`.
///
/// `None` when the executable itself is missing.
pub fn existing_layout<R: Runtime>(
    runtime: &R,
    prefix: &Path,
    binary: &str,
) -> Option<InstalledLayout> {
    let executable = executable_destination(prefix, binary);
    if !runtime.exists(&executable) {
        return None;
    }
    let completions = Shell::ALL
        .into_iter()
        .map(|shell| InstalledCompletion {
            shell,
            path: shell.destination(prefix, binary),
        })
        .filter(|c| runtime.exists(&c.path))
        .collect();
    Some(InstalledLayout {
        executable,
        completions,
    })
}

/// Run `<prefix>/bin/<binary> --version` and look for `expected_version`
/// in its stdout. Never fails; problems are logged and yield `false`.
#[tracing::instrument(skip(runtime))]
pub fn verify<R: Runtime>(runtime: &R, prefix: &Path, binary: &str, expected_version: &str) -> bool {
    let executable = executable_destination(prefix, binary);
    let output = match runtime.run_command(&executable, &["--version".to_string()]) {
        Ok(output) => output,
        Err(e) => {
            warn!("Could not run {:?}: {:#}", executable, e);
            return false;
        }
    };

    if !output.success {
        warn!(
            "{:?} --version exited with {}: {}",
            executable,
            output
                .code
                .map_or_else(|| "a signal".to_string(), |c| format!("status {}", c)),
            output.stderr.trim()
        );
        return false;
    }

    if !output.stdout.contains(expected_version) {
        warn!(
            "{:?} --version printed {:?}, expected it to mention {}",
            executable,
            output.stdout.trim(),
            expected_version
        );
        return false;
    }

    debug!("Smoke test passed: {}", output.stdout.trim());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{CommandOutput, MockRuntime};
    use mockall::predicate::*;
    use std::path::PathBuf;

    fn default_aliases() -> Vec<Alias> {
        [("howto", "--how"), ("do", "--do"), ("explain", "--explain")]
            .into_iter()
            .map(|(name, flag)| Alias {
                name: name.into(),
                flag: flag.into(),
            })
            .collect()
    }

    fn full_layout() -> InstalledLayout {
        let prefix = Path::new("/p");
        InstalledLayout {
            executable: executable_destination(prefix, "toli"),
            completions: Shell::ALL
                .into_iter()
                .map(|shell| InstalledCompletion {
                    shell,
                    path: shell.destination(prefix, "toli"),
                })
                .collect(),
        }
    }

    fn output(success: bool, code: Option<i32>, stdout: &str) -> CommandOutput {
        CommandOutput {
            success,
            code,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_caveats_lists_aliases_per_shell() {
        let text = caveats(&full_layout(), "toli", &default_aliases());

        assert!(text.contains("For bash (~/.bashrc):"));
        assert!(text.contains("For zsh (~/.zshrc):"));
        assert!(text.contains("For fish (~/.config/fish/config.fish):"));
        assert_eq!(text.matches("alias howto='toli --how'").count(), 3);
        assert_eq!(text.matches("alias do='toli --do'").count(), 3);
        assert_eq!(text.matches("alias explain='toli --explain'").count(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_caveats_lists_installed_files() {
        let text = caveats(&full_layout(), "toli", &default_aliases());
        let files = text.split("Installed files:\n").nth(1).unwrap();
        assert_eq!(
            files.lines().collect::<Vec<_>>(),
            vec![
                "  /p/bin/toli",
                "  /p/etc/bash_completion.d/toli",
                "  /p/share/zsh/site-functions/_toli",
                "  /p/share/fish/vendor_completions.d/toli.fish",
            ]
        );
    }

    #[test]
    fn test_caveats_without_aliases() {
        let text = caveats(&full_layout(), "toli", &[]);
        assert!(!text.contains("alias"));
        assert!(text.starts_with("Installed files:"));
    }

    #[test]
    fn test_existing_layout() {
        let prefix = Path::new("/p");
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|path| {
            path == executable_destination(Path::new("/p"), "toli")
                || path == Shell::Zsh.destination(Path::new("/p"), "toli")
        });

        let layout = existing_layout(&runtime, prefix, "toli").unwrap();
        assert_eq!(layout.files().len(), 2);
        assert!(layout.completion_for(Shell::Zsh).is_some());
    }

    #[test]
    fn test_existing_layout_without_executable() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);
        assert!(existing_layout(&runtime, Path::new("/p"), "toli").is_none());
    }

    #[test]
    fn test_verify_passes_on_matching_version() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run_command()
            .with(
                eq(PathBuf::from("/p/bin/toli")),
                eq(vec!["--version".to_string()]),
            )
            .times(1)
            .returning(|_, _| Ok(output(true, Some(0), "toli 0.1.0\n")));

        assert!(verify(&runtime, Path::new("/p"), "toli", "0.1.0"));
    }

    #[test]
    fn test_verify_fails_on_other_version() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run_command()
            .returning(|_, _| Ok(output(true, Some(0), "toli 0.2.0\n")));

        assert!(!verify(&runtime, Path::new("/p"), "toli", "0.1.0"));
    }

    #[test]
    fn test_verify_fails_on_nonzero_exit() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run_command()
            .returning(|_, _| Ok(output(false, Some(2), "toli 0.1.0\n")));

        assert!(!verify(&runtime, Path::new("/p"), "toli", "0.1.0"));
    }

    #[test]
    fn test_verify_fails_when_binary_missing() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run_command()
            .returning(|_, _| Err(anyhow::anyhow!("No such file or directory")));

        assert!(!verify(&runtime, Path::new("/p"), "toli", "0.1.0"));
    }
}
