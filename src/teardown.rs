use crate::ctl::Ctl;
use crate::graceful;
use crate::runner;
use chrono::{DateTime, Local};
use nix::sys::signal::Signal;
use owo_colors::OwoColorize;
use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const CLEANSE_GRACE: Duration = Duration::from_secs(60);
pub const ESCALATION_PAUSE: Duration = Duration::from_secs(3);
pub const ESCALATION: [Signal; 3] = [Signal::SIGHUP, Signal::SIGTERM, Signal::SIGKILL];

const CLEANSE_WARNING: &str = "This will delete *all* configuration, log, and variable data associated with this application.\n\n*** You have 60 seconds to hit CTRL-C ***\n";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Something the teardown deletes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// The path itself, file or directory.
    Path(PathBuf),
    /// Every entry inside the directory, keeping the directory.
    ContentsOf(PathBuf),
}

impl Removal {
    pub fn path(&self) -> &Path {
        match self {
            Removal::Path(path) | Removal::ContentsOf(path) => path,
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// `cleanse [yes]`: wipe the service links, data, config and logs.
/// Without `yes` the operator gets a 60 second window to interrupt.
pub fn cleanse(ctl: &mut Ctl, _command: &str, confirmation: Option<&str>) -> i32 {
    let warning = if ctl.console.colored() {
        CLEANSE_WARNING.yellow().bold().to_string()
    } else {
        CLEANSE_WARNING.to_string()
    };
    ctl.log(warning);
    if confirmation != Some("yes") {
        ctl.pause.pause(CLEANSE_GRACE);
    }

    let paths = ctl.paths();
    let targets = vec![
        Removal::ContentsOf(paths.service_path()),
        Removal::Path(paths.scratch_path()),
        Removal::Path(paths.data_path().to_path_buf()),
        Removal::Path(paths.etc_path().to_path_buf()),
        Removal::Path(paths.log_path().to_path_buf()),
    ];
    cleanup_procs_and_nuke(ctl, &targets)
}

/// `uninstall`: kill everything and remove the supervisor, keep data.
pub fn uninstall(ctl: &mut Ctl, _command: &str, _service: Option<&str>) -> i32 {
    let targets = vec![Removal::Path(ctl.paths().scratch_path())];
    cleanup_procs_and_nuke(ctl, &targets)
}

/// Best-effort teardown. Every step runs regardless of how the previous
/// one went, and the result is always 0.
pub fn cleanup_procs_and_nuke(ctl: &mut Ctl, targets: &[Removal]) -> i32 {
    let _ = runner::run_sv_command(ctl, "stop", None);

    if let Err(e) = remove_upstart_job(ctl) {
        ctl.log(format!("warning: could not remove upstart job: {e}"));
    }
    if let Err(e) = strip_inittab_entry(ctl) {
        ctl.log(format!("warning: could not rewrite inittab: {e}"));
    }
    if let Err(e) = ctl.processes.signal_pid(1, Signal::SIGHUP) {
        ctl.log(format!("warning: could not signal init to reload: {e}"));
    }

    let etc_path = ctl.paths().etc_path().to_path_buf();
    let backup_dir = backup_path(ctl, Local::now());
    if let Err(e) = backup_config(&etc_path, &backup_dir) {
        ctl.log(format!("warning: could not back up {}: {e}", etc_path.display()));
    }

    for target in targets {
        if let Err(e) = remove(target) {
            ctl.log(format!(
                "warning: could not remove {}: {e}",
                target.path().display()
            ));
        }
    }

    let _ = graceful::graceful_kill(ctl, "graceful-kill", None);

    escalate(ctl);

    for service in ctl.services.list_services() {
        let pattern = format!("runsv {service}");
        if let Err(e) = ctl.processes.signal_matching(&pattern, Signal::SIGKILL) {
            ctl.log(format!("warning: could not kill '{pattern}': {e}"));
        }
    }

    ctl.log(format!(
        "Your config files have been backed up to {}.",
        backup_dir.display()
    ));
    0
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Drop the upstart job that starts the supervision daemon at boot.
fn remove_upstart_job(ctl: &Ctl) -> io::Result<()> {
    let upstart = ctl.paths().upstart_conf();
    if upstart.exists() {
        fs::remove_file(&upstart)?;
    }
    Ok(())
}

/// Rewrite inittab without the line that respawns the supervision daemon.
fn strip_inittab_entry(ctl: &Ctl) -> io::Result<()> {
    let paths = ctl.paths();
    let inittab = paths.inittab();
    if !inittab.exists() {
        return Ok(());
    }
    let entrypoint = paths.runsvdir_start();
    let content = fs::read_to_string(&inittab)?;
    let rewritten = strip_entrypoint(&content, &entrypoint.to_string_lossy());
    let staged = inittab.with_extension("new");
    fs::write(&staged, rewritten)?;
    fs::rename(&staged, &inittab)
}

pub fn strip_entrypoint(inittab: &str, entrypoint: &str) -> String {
    inittab
        .lines()
        .filter(|line| !line.contains(entrypoint))
        .map(|line| format!("{line}\n"))
        .collect()
}

/// `<backup root>/<name>-cleanse-<YYYY-MM-DDTHH:MM>`
pub fn backup_path(ctl: &Ctl, now: DateTime<Local>) -> PathBuf {
    ctl.paths().backup_root().join(format!(
        "{}-cleanse-{}",
        ctl.settings.name,
        now.format("%Y-%m-%dT%H:%M")
    ))
}

/// Copy the config directory to `backup_dir`, replacing any backup
/// already sitting at that exact path.
pub fn backup_config(etc_path: &Path, backup_dir: &Path) -> io::Result<()> {
    if let Some(root) = backup_dir.parent() {
        fs::create_dir_all(root)?;
    }
    remove(&Removal::Path(backup_dir.to_path_buf()))?;
    if etc_path.exists() {
        copy_tree(etc_path, backup_dir)?;
    }
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(from) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(io::Error::other)?;
        let target = to.join(relative);
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            symlink(fs::read_link(entry.path())?, &target)?;
        } else if file_type.is_dir() {
            fs::create_dir_all(&target)?;
            dirs.push((target, entry.metadata()?.permissions()));
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    // deepest first, so a read-only directory is filled before it is locked
    for (dir, permissions) in dirs.into_iter().rev() {
        fs::set_permissions(dir, permissions)?;
    }
    Ok(())
}

/// Like `rm -rf`: a path that is already gone is not an error.
pub fn remove(target: &Removal) -> io::Result<()> {
    match target {
        Removal::Path(path) => remove_path(path),
        Removal::ContentsOf(dir) => {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
                Err(e) => return Err(e),
            };
            for entry in entries {
                remove_path(&entry?.path())?;
            }
            Ok(())
        }
    }
}

fn remove_path(path: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// HUP, TERM, then KILL, pausing between tiers. Each tier hits the kill
/// users first and the supervision daemon second.
fn escalate(ctl: &mut Ctl) {
    let daemon = format!("runsvdir -P {}", ctl.paths().service_path().display());
    let users = ctl.settings.kill_users.clone();

    for (tier, signal) in ESCALATION.into_iter().enumerate() {
        if tier > 0 {
            ctl.pause.pause(ESCALATION_PAUSE);
        }
        if !users.is_empty()
            && let Err(e) = ctl.processes.signal_users(&users, signal)
        {
            ctl.log(format!("warning: could not send {signal} to {}: {e}", users.join(",")));
        }
        if let Err(e) = ctl.processes.signal_matching(&daemon, signal) {
            ctl.log(format!("warning: could not send {signal} to '{daemon}': {e}"));
        }
    }
}
