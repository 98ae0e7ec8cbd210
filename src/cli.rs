use crate::ctl::Settings;
use crate::paths::{DEFAULT_RUNNING_CONFIG, Paths};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "omnictl",
    about = "Control the services of an omnibus-packaged product",
    version,
    disable_help_subcommand = true,
    disable_help_flag = true
)]
pub struct Cli {
    /// Product name; drives every default path.
    #[arg(long, env = "OMNICTL_NAME")]
    pub name: String,

    /// Human-readable product name used in messages.
    #[arg(long, env = "OMNICTL_DISPLAY_NAME")]
    pub display_name: Option<String>,

    /// Program name shown in help and hints [default: <name>-ctl].
    #[arg(long, env = "OMNICTL_PROGRAM")]
    pub program_name: Option<String>,

    /// Rebase every default absolute path under this directory.
    #[arg(long, env = "OMNICTL_ROOT")]
    pub root: Option<PathBuf>,

    #[arg(long, env = "OMNICTL_BASE_PATH")]
    pub base_path: Option<PathBuf>,

    #[arg(long, env = "OMNICTL_LOG_PATH")]
    pub log_path: Option<PathBuf>,

    #[arg(long, env = "OMNICTL_DATA_PATH")]
    pub data_path: Option<PathBuf>,

    #[arg(long, env = "OMNICTL_ETC_PATH")]
    pub etc_path: Option<PathBuf>,

    #[arg(long, env = "OMNICTL_BACKUP_ROOT")]
    pub backup_root: Option<PathBuf>,

    /// OS account whose processes are killed during cleanse and uninstall.
    #[arg(long = "kill-user", env = "OMNICTL_KILL_USERS", value_delimiter = ',')]
    pub kill_users: Vec<String>,

    /// Directory of extension command files (*.toml).
    #[arg(long, env = "OMNICTL_EXTENSIONS")]
    pub extensions: Option<PathBuf>,

    /// Running config file name, relative to the etc path.
    #[arg(long, env = "OMNICTL_RUNNING_CONFIG", default_value = DEFAULT_RUNNING_CONFIG)]
    pub running_config: String,

    /// Leave out the service-management commands.
    #[arg(long)]
    pub no_service_commands: bool,

    /// Command, optional service and options, passed through untouched.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::new(&self.name);

        let mut paths = match &self.root {
            Some(root) => Paths::with_root(root.clone(), &self.name),
            None => Paths::new(&self.name),
        };
        if let Some(p) = &self.base_path {
            paths.set_base_path(p.clone());
        }
        if let Some(p) = &self.log_path {
            paths.set_log_path(p.clone());
        }
        if let Some(p) = &self.data_path {
            paths.set_data_path(p.clone());
        }
        if let Some(p) = &self.etc_path {
            paths.set_etc_path(p.clone());
        }
        if let Some(p) = &self.backup_root {
            paths.set_backup_root(p.clone());
        }
        paths.set_running_config(&self.running_config);
        settings.paths = paths;

        if let Some(display_name) = &self.display_name {
            settings.display_name = display_name.clone();
        }
        if let Some(program) = &self.program_name {
            settings.program = program.clone();
        }
        settings.kill_users = self.kill_users.clone();
        settings.service_commands = !self.no_service_commands;
        settings
    }
}
