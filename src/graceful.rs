use crate::ctl::Ctl;
use crate::pid::{self, PidFile};
use crate::runner;
use nix::sys::signal::Signal;

/// Stop each targeted service through its supervisor, then SIGKILL
/// whatever is left of the process group it was running in.
///
/// The exit status is 1 if a targeted service was disabled, otherwise
/// the first non-zero status of a fallback plain stop. Process-group
/// kills never contribute a status.
pub fn graceful_kill(ctl: &mut Ctl, _command: &str, service: Option<&str>) -> i32 {
    let mut exit_status = 0;

    for name in ctl.services.list_services() {
        if service.is_some_and(|s| s != name) {
            continue;
        }

        if !ctl.services.is_enabled(&name) {
            ctl.log(format!("{name} disabled, not stopping"));
            exit_status = 1;
            continue;
        }

        let pid = match pid::read_service_pid(ctl.paths(), &name) {
            PidFile::Running(pid) => pid,
            PidFile::Missing | PidFile::Malformed(_) => {
                ctl.log(format!(
                    "could not find {name} runit pidfile (service already stopped?), cannot attempt SIGKILL..."
                ));
                fallback_stop(ctl, &name, &mut exit_status);
                continue;
            }
        };

        let Some(pgrp) = ctl.processes.process_group_of(pid) else {
            ctl.log(format!(
                "could not find pgrp of pid {pid} (not running?), cannot attempt SIGKILL..."
            ));
            fallback_stop(ctl, &name, &mut exit_status);
            continue;
        };

        // best effort: whatever survives is handled by the group kill
        let _ = runner::supervise(ctl, &name, "stop");

        let stuck = ctl.processes.pids_in_group(pgrp);
        if !stuck.is_empty() {
            let listed: Vec<String> = stuck.iter().map(|p| p.to_string()).collect();
            ctl.log(format!(
                "found stuck pids still running in process group: {}, sending SIGKILL",
                listed.join(" ")
            ));
            if let Err(e) = ctl.processes.signal_group(pgrp, Signal::SIGKILL) {
                ctl.log(format!("could not SIGKILL process group {pgrp}: {e}"));
            }
        }
    }

    exit_status
}

fn fallback_stop(ctl: &mut Ctl, service: &str, exit_status: &mut i32) {
    let status = runner::supervise(ctl, service, "stop");
    if *exit_status == 0 && status != 0 {
        *exit_status = status;
    }
}
