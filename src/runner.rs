use crate::ctl::Ctl;
use crate::supervisor::SPAWN_FAILURE;

/// Run a supervisor verb against one named service, or broadcast it to
/// every permitted service when none is named.
pub fn run_sv_command(ctl: &mut Ctl, sv_command: &str, service: Option<&str>) -> i32 {
    match service {
        Some(service) => run_for_service(ctl, sv_command, service),
        None => run_broadcast(ctl, sv_command),
    }
}

/// Sum of every participating service's exit status. The sum is not
/// clamped: callers only rely on it being non-zero when anything failed.
pub fn run_broadcast(ctl: &mut Ctl, sv_command: &str) -> i32 {
    let mut exit_status = 0;
    for service in ctl.services.list_services() {
        if ctl.policy.permitted(sv_command, &service) {
            exit_status += run_for_service(ctl, sv_command, &service);
        }
    }
    exit_status
}

/// A disabled service is a no-op success for every verb.
pub fn run_for_service(ctl: &mut Ctl, sv_command: &str, service: &str) -> i32 {
    if !ctl.services.is_enabled(service) {
        if sv_command == "status" && ctl.verbose {
            ctl.log(format!("{service} disabled"));
        }
        return 0;
    }
    supervise(ctl, service, sv_command)
}

/// Invoke the supervisor entrypoint, mapping a spawn failure to 127.
pub fn supervise(ctl: &mut Ctl, service: &str, sv_command: &str) -> i32 {
    match ctl.launcher.run_service(service, sv_command) {
        Ok(status) => status,
        Err(e) => {
            ctl.log(format!("could not run {sv_command} for {service}: {e}"));
            SPAWN_FAILURE
        }
    }
}

/// `service-list`: every service, enabled ones marked with `*`.
pub fn service_list(ctl: &mut Ctl, _command: &str, _service: Option<&str>) -> i32 {
    for service in ctl.services.list_services() {
        let marker = if ctl.services.is_enabled(&service) {
            "*"
        } else {
            ""
        };
        ctl.log(format!("{service}{marker}"));
    }
    0
}
