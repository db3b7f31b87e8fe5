//! Test support: drives the compiled `sfo` binary in a hermetic environment.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

/// Captured output of one binary invocation.
pub struct RunOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    args: Vec<String>,
}

impl RunOutput {
    /// Diagnostic block for failed assertions.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "sfo {:?} exited {}\n--- stdout ---\n{}\n--- stderr ---\n{}",
            self.args, self.status, self.stdout, self.stderr
        )
    }
}

// Pinning HOME keeps a run from picking up an operator config at
// `~/.config/sfo/config.toml`.
fn hermetic_home() -> PathBuf {
    let home = std::env::temp_dir().join("sfo-test-home");
    fs::create_dir_all(&home).expect("create hermetic test home");
    home
}

/// Run the compiled binary with `args`, scrubbing any inherited `SFO_*`
/// overrides so cases only see the environment they set up themselves.
pub fn sfo(args: &[&str]) -> RunOutput {
    let mut command = Command::new(env!("CARGO_BIN_EXE_sfo"));
    command
        .args(args)
        .env("RUST_BACKTRACE", "1")
        .env("HOME", hermetic_home());
    for (name, _) in std::env::vars() {
        if name.starts_with("SFO_") {
            command.env_remove(name);
        }
    }

    let output = command.output().expect("spawn sfo binary");
    RunOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        args: args.iter().map(ToString::to_string).collect(),
    }
}
