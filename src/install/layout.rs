use std::fmt;
use std::path::{Path, PathBuf};

/// Shells that receive completion scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

impl Shell {
    pub const ALL: [Shell; 3] = [Shell::Bash, Shell::Zsh, Shell::Fish];

    pub fn as_str(self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Fish => "fish",
        }
    }

    /// Script name inside the archive's `completions/` directory.
    pub fn source_file_name(self, name: &str) -> String {
        format!("{}.{}", name, self.as_str())
    }

    /// Completion directory relative to the prefix.
    pub fn completion_dir(self) -> &'static str {
        match self {
            Shell::Bash => "etc/bash_completion.d",
            Shell::Zsh => "share/zsh/site-functions",
            Shell::Fish => "share/fish/vendor_completions.d",
        }
    }

    /// Installed file name. Bash uses the bare binary name, zsh needs the
    /// leading underscore for autoload, fish keeps the `.fish` suffix.
    pub fn installed_file_name(self, binary: &str) -> String {
        match self {
            Shell::Bash => binary.to_string(),
            Shell::Zsh => format!("_{}", binary),
            Shell::Fish => format!("{}.fish", binary),
        }
    }

    pub fn destination(self, prefix: &Path, binary: &str) -> PathBuf {
        prefix
            .join(self.completion_dir())
            .join(self.installed_file_name(binary))
    }

    /// Shell startup file where aliases belong.
    pub fn rc_file(self) -> &'static str {
        match self {
            Shell::Bash => "~/.bashrc",
            Shell::Zsh => "~/.zshrc",
            Shell::Fish => "~/.config/fish/config.fish",
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `<prefix>/bin/<binary>`
pub fn executable_destination(prefix: &Path, binary: &str) -> PathBuf {
    prefix.join("bin").join(binary)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledCompletion {
    pub shell: Shell,
    pub path: PathBuf,
}

/// Files written by one successful install run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledLayout {
    pub executable: PathBuf,
    pub completions: Vec<InstalledCompletion>,
}

impl InstalledLayout {
    pub fn files(&self) -> Vec<&Path> {
        std::iter::once(self.executable.as_path())
            .chain(self.completions.iter().map(|c| c.path.as_path()))
            .collect()
    }

    pub fn completion_for(&self, shell: Shell) -> Option<&Path> {
        self.completions
            .iter()
            .find(|c| c.shell == shell)
            .map(|c| c.path.as_path())
    }
}
