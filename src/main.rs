use clap::Parser;
use color_eyre::eyre::WrapErr;
use nix::sys::stat::{Mode, umask};
use omnictl::cli::Cli;
use omnictl::config::RunningConfig;
use omnictl::ctl::Ctl;
use omnictl::extensions;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    umask(Mode::from_bits_truncate(0o022));

    let cli = Cli::parse();
    let settings = cli.settings();

    let config_path = settings.paths.running_config();
    let config = RunningConfig::load(&config_path)
        .wrap_err_with(|| format!("could not load {}", config_path.display()))?;

    let mut ctl = Ctl::new(settings, &config);
    if let Some(dir) = &cli.extensions {
        let commands = extensions::load_dir(dir)
            .wrap_err_with(|| format!("could not load extensions from {}", dir.display()))?;
        extensions::register_all(ctl.registry_mut(), &commands)
            .wrap_err("could not register extension commands")?;
    }

    let status = ctl.run(&cli.args);
    std::process::exit(status);
}
