use crate::config::ServiceLists;

/// Decides which services take part in a broadcast command (one issued
/// without a service name).
#[derive(Debug, Clone, Default)]
pub struct FilterPolicy {
    lists: ServiceLists,
    singletons: Vec<String>,
}

impl FilterPolicy {
    pub fn new(lists: ServiceLists, singletons: Vec<String>) -> Self {
        Self { lists, singletons }
    }

    pub fn permitted(&self, command: &str, service: &str) -> bool {
        // Removed services linger on disk after an upgrade; they may only
        // be stopped, never started or reported.
        if self.lists.is_removed(service) {
            return command == "stop";
        }

        // A singleton role is managed out of band and only reports status.
        if self.singletons.iter().any(|s| s == service) {
            return command == "status";
        }

        if command == "status" {
            return !self.lists.is_hidden(service);
        }

        true
    }
}
