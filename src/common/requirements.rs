//! Tool availability tests used by `guhwall doctor`.

use duct::cmd;
use std::path::Path;

/// Tests for determining whether an external tool is usable.
#[derive(Debug, Clone)]
pub enum InstallTest {
    /// Succeeds when `which <program>` resolves.
    WhichSucceeds(String),
    /// Succeeds when the given path exists.
    FileExists(String),
    /// Succeeds when the command exits with status 0.
    CommandSucceeds { program: String, args: Vec<String> },
}

impl InstallTest {
    /// Resolve a configured program: absolute paths must exist, bare names go through `$PATH`.
    pub fn for_program(program: &str) -> Self {
        if Path::new(program).is_absolute() {
            InstallTest::FileExists(program.to_string())
        } else {
            InstallTest::WhichSucceeds(program.to_string())
        }
    }

    pub fn run(&self) -> bool {
        match self {
            InstallTest::WhichSucceeds(program) => which::which(program).is_ok(),
            InstallTest::FileExists(path) => Path::new(path).exists(),
            InstallTest::CommandSucceeds { program, args } => cmd(program, args)
                .stdout_null()
                .stderr_null()
                .run()
                .is_ok(),
        }
    }
}
