use crate::paths::Paths;
use std::ffi::OsString;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{Command, ExitStatus};

/// Exit status reported when a child could not be spawned at all.
pub const SPAWN_FAILURE: i32 = 127;

/// Runs external programs on behalf of the controller.
pub trait Launcher {
    /// Invoke the supervisor entrypoint of `service` with `command`.
    fn run_service(&self, service: &str, command: &str) -> io::Result<i32>;
    fn run_program(&self, program: &Path, args: &[String]) -> io::Result<i32>;
}

/// Launcher for a runit tree: each service has an `init/<service>`
/// entrypoint accepting `sv` verbs.
pub struct Runit {
    paths: Paths,
}

impl Runit {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    fn command(&self, program: &Path) -> Command {
        let mut cmd = Command::new(program);
        if let Some(path) = search_path(&self.paths) {
            cmd.env("PATH", path);
        }
        cmd
    }
}

impl Launcher for Runit {
    fn run_service(&self, service: &str, command: &str) -> io::Result<i32> {
        let status = self
            .command(&self.paths.init_script(service))
            .arg(command)
            .status()?;
        Ok(exit_code(status))
    }

    fn run_program(&self, program: &Path, args: &[String]) -> io::Result<i32> {
        let status = self.command(program).args(args).status()?;
        Ok(exit_code(status))
    }
}

/// `PATH` with the product's own bin dirs in front.
pub fn search_path(paths: &Paths) -> Option<OsString> {
    let mut dirs: Vec<_> = paths.bin_dirs().to_vec();
    if let Some(existing) = std::env::var_os("PATH") {
        dirs.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(dirs).ok()
}

/// Shell-style status: the exit code, or 128 + signal for a killed child.
pub fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}
