use crate::config_tool;
use crate::ctl::{Ctl, Settings};
use crate::dispatch;
use crate::graceful;
use crate::registry::{Arity, Registry};
use crate::runner;
use crate::tail;
use crate::teardown;

/// Supervisor pass-through commands: name, verb sent to the supervisor,
/// description.
const SV_COMMANDS: &[(&str, &str, &str)] = &[
    ("status", "status", "Show the status of all the services."),
    (
        "start",
        "start",
        "Start services if they are down, and restart them if they stop.",
    ),
    ("stop", "stop", "Stop the services, and do not restart them."),
    (
        "restart",
        "restart",
        "Stop the services if they are running, then start them again.",
    ),
    (
        "once",
        "once",
        "Start the services if they are down. Do not restart them if they stop.",
    ),
    ("hup", "hup", "Send the services a HUP."),
    ("term", "term", "Send the services a TERM."),
    ("int", "interrupt", "Send the services an INT."),
    ("kill", "kill", "Send the services a KILL."),
];

/// The registry every controller starts with.
pub fn builtin(settings: &Settings) -> Registry {
    let mut registry = Registry::new();

    registry.register(
        "general",
        "show-config",
        "Show the configuration that would be generated by reconfigure.",
        Arity::NoArg,
        config_tool::show_config,
    );
    registry.register(
        "general",
        "reconfigure",
        "Reconfigure the application.",
        Arity::NoArg,
        config_tool::reconfigure,
    );
    registry.register(
        "general",
        "cleanse",
        &format!(
            "Delete *all* {} data, and start from scratch.",
            settings.display_name
        ),
        Arity::OptionalService,
        teardown::cleanse,
    );
    registry.register(
        "general",
        "uninstall",
        "Kill all processes and uninstall the process supervisor (data will be preserved).",
        Arity::NoArg,
        teardown::uninstall,
    );
    registry.register(
        "general",
        "help",
        "Print this help message.",
        Arity::NoArg,
        dispatch::help,
    );

    if settings.service_commands {
        register_service_management(&mut registry);
    }
    registry
}

fn register_service_management(registry: &mut Registry) {
    const CATEGORY: &str = "service-management";

    registry.register(
        CATEGORY,
        "service-list",
        "List all the services (enabled services appear with a *.)",
        Arity::NoArg,
        runner::service_list,
    );
    registry.register(
        CATEGORY,
        "tail",
        "Watch the service logs of all enabled services.",
        Arity::OptionalService,
        tail::tail,
    );
    for &(name, verb, description) in SV_COMMANDS {
        registry.register(
            CATEGORY,
            name,
            description,
            Arity::OptionalService,
            sv(verb),
        );
    }
    registry.register(
        CATEGORY,
        "graceful-kill",
        "Attempt a graceful stop, then SIGKILL the entire process group.",
        Arity::OptionalService,
        graceful::graceful_kill,
    );
}

fn sv(verb: &'static str) -> impl Fn(&mut Ctl, &str, Option<&str>) -> i32 {
    move |ctl, _command, service| runner::run_sv_command(ctl, verb, service)
}
