use crate::commands;
use crate::config::{PackageAliases, RunningConfig};
use crate::dispatch;
use crate::filter::FilterPolicy;
use crate::paths::Paths;
use crate::registry::Registry;
use crate::services::ServiceDirectory;
use crate::supervisor::{Launcher, Runit};
use crate::sys::{NativeProcessTable, Pause, ProcessTable, ThreadPause};
use std::cell::RefCell;
use std::fmt::Display;
use std::io::{IsTerminal, Write};
use std::rc::Rc;

pub const DEFAULT_LOG_EXCLUDE: &str = "(config|lock|@|gzip|tgz|gz)";
pub const DEFAULT_LOG_PATH_EXCLUDE: &str = "*/sasl/*";
pub const DEFAULT_SINGLETON_SERVICES: &[&str] = &["keepalived"];

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Per-product knobs fixed for the life of one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub name: String,
    pub display_name: String,
    /// Name printed in help and hints.
    pub program: String,
    pub paths: Paths,
    /// OS accounts whose processes die during teardown.
    pub kill_users: Vec<String>,
    pub service_commands: bool,
    pub aliases: PackageAliases,
    /// Services that only answer broadcast `status`.
    pub singleton_services: Vec<String>,
    pub log_exclude: String,
    pub log_path_exclude: Vec<String>,
}

impl Settings {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: name.to_string(),
            program: format!("{name}-ctl"),
            paths: Paths::new(name),
            kill_users: Vec::new(),
            service_commands: true,
            aliases: PackageAliases::default(),
            singleton_services: DEFAULT_SINGLETON_SERVICES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            log_exclude: DEFAULT_LOG_EXCLUDE.to_string(),
            log_path_exclude: vec![DEFAULT_LOG_PATH_EXCLUDE.to_string()],
        }
    }
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

/// Line-oriented output sink. Stdout in production, a buffer in tests.
pub struct Console {
    sink: Box<dyn Write>,
    colored: bool,
}

#[derive(Clone, Default)]
pub struct Captured(Rc<RefCell<Vec<u8>>>);

impl Captured {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Console {
    pub fn stdout() -> Self {
        Self {
            colored: std::io::stdout().is_terminal(),
            sink: Box::new(std::io::stdout()),
        }
    }

    pub fn capture() -> (Self, Captured) {
        let captured = Captured::default();
        let console = Self {
            sink: Box::new(captured.clone()),
            colored: false,
        };
        (console, captured)
    }

    pub fn colored(&self) -> bool {
        self.colored
    }

    pub fn line(&mut self, msg: impl Display) {
        let _ = writeln!(self.sink, "{msg}");
        let _ = self.sink.flush();
    }
}

// ---------------------------------------------------------------------------
// Ctl
// ---------------------------------------------------------------------------

/// Everything a command handler can reach: settings, the service tree,
/// the filter policy derived from the running config, and the OS
/// collaborators.
pub struct Ctl {
    pub settings: Settings,
    pub services: ServiceDirectory,
    pub policy: FilterPolicy,
    pub verbose: bool,
    pub launcher: Box<dyn Launcher>,
    pub processes: Box<dyn ProcessTable>,
    pub pause: Box<dyn Pause>,
    pub console: Console,
    registry: Registry,
}

impl Ctl {
    pub fn new(settings: Settings, config: &RunningConfig) -> Self {
        let key = settings.aliases.config_key(&settings.name);
        let policy = FilterPolicy::new(
            config.service_lists(&key),
            settings.singleton_services.clone(),
        );
        Self {
            services: ServiceDirectory::new(&settings.paths),
            registry: commands::builtin(&settings),
            launcher: Box::new(Runit::new(settings.paths.clone())),
            processes: Box::new(NativeProcessTable::default()),
            pause: Box::new(ThreadPause),
            console: Console::stdout(),
            verbose: false,
            policy,
            settings,
        }
    }

    pub fn with_launcher(mut self, launcher: Box<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn with_process_table(mut self, processes: Box<dyn ProcessTable>) -> Self {
        self.processes = processes;
        self
    }

    pub fn with_pause(mut self, pause: Box<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn paths(&self) -> &Paths {
        &self.settings.paths
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn log(&mut self, msg: impl Display) {
        self.console.line(msg);
    }

    /// Dispatch one command line and return the process exit status.
    pub fn run(&mut self, args: &[String]) -> i32 {
        dispatch::run(self, args)
    }
}
