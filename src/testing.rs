//! Recording fakes for the OS collaborators and a scratch install tree.

use crate::config::RunningConfig;
use crate::ctl::{Captured, Console, Ctl, Settings};
use crate::paths::Paths;
use crate::supervisor::Launcher;
use crate::sys::{Pause, ProcessTable};
use nix::sys::signal::Signal;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Service(String, String),
    Program(String, Vec<String>),
    GroupLookup(i32),
    SignalGroup(i32, Signal),
    SignalPid(i32, Signal),
    SignalUsers(Vec<String>, Signal),
    SignalMatching(String, Signal),
    Pause(Duration),
}

/// Shared, ordered log of everything the fakes were asked to do.
#[derive(Clone, Default)]
pub struct Recorder(Rc<RefCell<Vec<Event>>>);

impl Recorder {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn service_calls(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Service(s, c) => Some((s, c)),
                _ => None,
            })
            .collect()
    }

    pub fn signals(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    Event::SignalGroup(..)
                        | Event::SignalPid(..)
                        | Event::SignalUsers(..)
                        | Event::SignalMatching(..)
                )
            })
            .collect()
    }
}

#[derive(Default)]
pub struct FakeLauncher {
    recorder: Recorder,
    statuses: HashMap<(String, String), i32>,
    unspawnable: BTreeSet<String>,
}

impl FakeLauncher {
    pub fn new(recorder: &Recorder) -> Self {
        Self {
            recorder: recorder.clone(),
            ..Self::default()
        }
    }

    pub fn status(mut self, service: &str, command: &str, status: i32) -> Self {
        self.statuses
            .insert((service.to_string(), command.to_string()), status);
        self
    }

    pub fn unspawnable(mut self, service: &str) -> Self {
        self.unspawnable.insert(service.to_string());
        self
    }
}

impl Launcher for FakeLauncher {
    fn run_service(&self, service: &str, command: &str) -> io::Result<i32> {
        self.recorder
            .push(Event::Service(service.to_string(), command.to_string()));
        if self.unspawnable.contains(service) {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        Ok(self
            .statuses
            .get(&(service.to_string(), command.to_string()))
            .copied()
            .unwrap_or(0))
    }

    fn run_program(&self, program: &Path, args: &[String]) -> io::Result<i32> {
        let program = program.to_string_lossy().into_owned();
        self.recorder
            .push(Event::Program(program.clone(), args.to_vec()));
        Ok(self
            .statuses
            .get(&(program, String::new()))
            .copied()
            .unwrap_or(0))
    }
}

#[derive(Default)]
pub struct FakeProcessTable {
    recorder: Recorder,
    groups: HashMap<i32, i32>,
    members: HashMap<i32, BTreeSet<i32>>,
}

impl FakeProcessTable {
    pub fn new(recorder: &Recorder) -> Self {
        Self {
            recorder: recorder.clone(),
            ..Self::default()
        }
    }

    /// `pid` leads group `pgid`, whose live members are `members`.
    pub fn group(mut self, pid: i32, pgid: i32, members: &[i32]) -> Self {
        self.groups.insert(pid, pgid);
        self.members
            .insert(pgid, members.iter().copied().collect());
        self
    }
}

impl ProcessTable for FakeProcessTable {
    fn process_group_of(&self, pid: i32) -> Option<i32> {
        self.recorder.push(Event::GroupLookup(pid));
        self.groups.get(&pid).copied()
    }

    fn pids_in_group(&self, pgid: i32) -> BTreeSet<i32> {
        self.members.get(&pgid).cloned().unwrap_or_default()
    }

    fn signal_group(&self, pgid: i32, signal: Signal) -> io::Result<()> {
        self.recorder.push(Event::SignalGroup(pgid, signal));
        Ok(())
    }

    fn signal_pid(&self, pid: i32, signal: Signal) -> io::Result<()> {
        self.recorder.push(Event::SignalPid(pid, signal));
        Ok(())
    }

    fn signal_users(&self, users: &[String], signal: Signal) -> io::Result<usize> {
        self.recorder.push(Event::SignalUsers(users.to_vec(), signal));
        Ok(users.len())
    }

    fn signal_matching(&self, pattern: &str, signal: Signal) -> io::Result<usize> {
        self.recorder
            .push(Event::SignalMatching(pattern.to_string(), signal));
        Ok(0)
    }
}

pub struct FakePause {
    recorder: Recorder,
}

impl FakePause {
    pub fn new(recorder: &Recorder) -> Self {
        Self {
            recorder: recorder.clone(),
        }
    }
}

impl Pause for FakePause {
    fn pause(&self, duration: Duration) {
        self.recorder.push(Event::Pause(duration));
    }
}

/// A product install rooted in a temp dir.
pub struct Fixture {
    pub dir: TempDir,
    pub paths: Paths,
    pub recorder: Recorder,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_root(dir.path().to_path_buf(), "demo");
        fs::create_dir_all(paths.sv_path()).unwrap();
        fs::create_dir_all(paths.service_path()).unwrap();
        Self {
            dir,
            paths,
            recorder: Recorder::default(),
        }
    }

    pub fn service(&self, name: &str, enabled: bool) -> &Self {
        let sv_dir = self.paths.sv_path().join(name);
        fs::create_dir_all(sv_dir.join("supervise")).unwrap();
        if enabled {
            symlink(&sv_dir, self.paths.service_link(name)).unwrap();
        }
        self
    }

    pub fn pid(&self, service: &str, content: &str) -> &Self {
        fs::write(self.paths.pid_file(service), content).unwrap();
        self
    }

    pub fn settings(&self) -> Settings {
        let mut settings = Settings::new("demo");
        settings.paths = self.paths.clone();
        settings
    }

    pub fn launcher(&self) -> FakeLauncher {
        FakeLauncher::new(&self.recorder)
    }

    pub fn processes(&self) -> FakeProcessTable {
        FakeProcessTable::new(&self.recorder)
    }

    pub fn ctl(&self) -> (Ctl, Captured) {
        self.build(
            self.settings(),
            &RunningConfig::empty(),
            self.launcher(),
            self.processes(),
        )
    }

    pub fn build(
        &self,
        settings: Settings,
        config: &RunningConfig,
        launcher: FakeLauncher,
        processes: FakeProcessTable,
    ) -> (Ctl, Captured) {
        let (console, captured) = Console::capture();
        let ctl = Ctl::new(settings, config)
            .with_launcher(Box::new(launcher))
            .with_process_table(Box::new(processes))
            .with_pause(Box::new(FakePause::new(&self.recorder)))
            .with_console(console);
        (ctl, captured)
    }
}

pub fn args(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}
