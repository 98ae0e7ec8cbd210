use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::{self, Pid, User};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// =========================================================================
// Collaborator interfaces
// =========================================================================

/// OS process-table queries and signal delivery.
pub trait ProcessTable {
    fn process_group_of(&self, pid: i32) -> Option<i32>;
    fn pids_in_group(&self, pgid: i32) -> BTreeSet<i32>;
    fn signal_group(&self, pgid: i32, signal: Signal) -> io::Result<()>;
    fn signal_pid(&self, pid: i32, signal: Signal) -> io::Result<()>;
    /// Signal every process owned by any of `users`. Returns how many were hit.
    fn signal_users(&self, users: &[String], signal: Signal) -> io::Result<usize>;
    /// Signal every process whose full command line contains `pattern`.
    fn signal_matching(&self, pattern: &str, signal: Signal) -> io::Result<usize>;
}

/// Blocking wait between escalation tiers.
pub trait Pause {
    fn pause(&self, duration: Duration);
}

pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

// =========================================================================
// procfs-backed implementation
// =========================================================================

pub struct NativeProcessTable {
    proc_root: PathBuf,
}

impl Default for NativeProcessTable {
    fn default() -> Self {
        Self::with_proc_root(PathBuf::from("/proc"))
    }
}

impl NativeProcessTable {
    pub fn with_proc_root(proc_root: PathBuf) -> Self {
        Self { proc_root }
    }

    fn pids(&self) -> Vec<i32> {
        let Ok(entries) = fs::read_dir(&self.proc_root) else {
            return Vec::new();
        };
        let mut pids: Vec<i32> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().and_then(|s| s.parse().ok()))
            .collect();
        pids.sort_unstable();
        pids
    }

    fn pgrp_of_entry(&self, pid: i32) -> Option<i32> {
        let stat = fs::read_to_string(proc_entry(&self.proc_root, pid).join("stat")).ok()?;
        parse_stat_pgrp(&stat)
    }

    fn cmdline(&self, pid: i32) -> Option<String> {
        let raw = fs::read(proc_entry(&self.proc_root, pid).join("cmdline")).ok()?;
        if raw.is_empty() {
            return None;
        }
        Some(render_cmdline(&raw))
    }

    fn owner(&self, pid: i32) -> Option<u32> {
        fs::metadata(proc_entry(&self.proc_root, pid))
            .ok()
            .map(|m| m.uid())
    }

    /// Pids (other than our own) whose command line contains `pattern`.
    pub fn matching_pids(&self, pattern: &str) -> Vec<i32> {
        let own = std::process::id() as i32;
        self.pids()
            .into_iter()
            .filter(|pid| *pid != own)
            .filter(|pid| {
                self.cmdline(*pid)
                    .is_some_and(|cmd| cmd.contains(pattern))
            })
            .collect()
    }

    /// Pids (other than our own) owned by any uid in `uids`.
    pub fn pids_owned_by(&self, uids: &[u32]) -> Vec<i32> {
        let own = std::process::id() as i32;
        self.pids()
            .into_iter()
            .filter(|pid| *pid != own)
            .filter(|pid| self.owner(*pid).is_some_and(|uid| uids.contains(&uid)))
            .collect()
    }
}

impl ProcessTable for NativeProcessTable {
    fn process_group_of(&self, pid: i32) -> Option<i32> {
        unistd::getpgid(Some(Pid::from_raw(pid)))
            .ok()
            .map(|pgid| pgid.as_raw())
    }

    fn pids_in_group(&self, pgid: i32) -> BTreeSet<i32> {
        self.pids()
            .into_iter()
            .filter(|pid| self.pgrp_of_entry(*pid) == Some(pgid))
            .collect()
    }

    fn signal_group(&self, pgid: i32, signal: Signal) -> io::Result<()> {
        ignore_vanished(signal::killpg(Pid::from_raw(pgid), signal))
    }

    fn signal_pid(&self, pid: i32, signal: Signal) -> io::Result<()> {
        ignore_vanished(signal::kill(Pid::from_raw(pid), signal))
    }

    fn signal_users(&self, users: &[String], signal: Signal) -> io::Result<usize> {
        let uids = resolve_uids(users);
        if uids.is_empty() {
            return Ok(0);
        }
        signal_all(&self.pids_owned_by(&uids), signal)
    }

    fn signal_matching(&self, pattern: &str, signal: Signal) -> io::Result<usize> {
        signal_all(&self.matching_pids(pattern), signal)
    }
}

fn signal_all(pids: &[i32], signal: Signal) -> io::Result<usize> {
    signal_each(pids, signal, |pid, signal| signal::kill(Pid::from_raw(pid), signal))
}

/// Deliver `signal` to every pid even when some deliveries fail. The
/// first failure is reported once the whole list has been tried.
fn signal_each<F>(pids: &[i32], signal: Signal, mut kill: F) -> io::Result<usize>
where
    F: FnMut(i32, Signal) -> nix::Result<()>,
{
    let mut hit = 0;
    let mut first_error = None;
    for &pid in pids {
        match kill(pid, signal) {
            Ok(()) => hit += 1,
            Err(Errno::ESRCH) => {}
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(io::Error::other(e)),
        None => Ok(hit),
    }
}

// A target that exited between lookup and delivery is not a failure.
fn ignore_vanished(result: nix::Result<()>) -> io::Result<()> {
    match result {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(io::Error::other(e)),
    }
}

fn resolve_uids(users: &[String]) -> Vec<u32> {
    users
        .iter()
        .filter_map(|name| User::from_name(name).ok().flatten())
        .map(|user| user.uid.as_raw())
        .collect()
}

/// Field 5 of `/proc/<pid>/stat`. The command name in field 2 may contain
/// spaces and parentheses, so parsing starts after the last `)`.
pub fn parse_stat_pgrp(stat: &str) -> Option<i32> {
    let rparen = stat.rfind(')')?;
    let rest = stat.get(rparen + 1..)?;
    // state, ppid, pgrp
    rest.split_whitespace().nth(2)?.parse().ok()
}

pub fn render_cmdline(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    text.split('\0')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn proc_entry(proc_root: &Path, pid: i32) -> PathBuf {
    proc_root.join(pid.to_string())
}
