use crate::ctl::Ctl;

/// `show-config`: print the configuration a reconfigure would generate.
pub fn show_config(ctl: &mut Ctl, _command: &str, _service: Option<&str>) -> i32 {
    if run_chef_client(ctl, "show-config.json", true) {
        0
    } else {
        1
    }
}

/// `reconfigure`: converge the install against its cookbooks.
pub fn reconfigure(ctl: &mut Ctl, _command: &str, _service: Option<&str>) -> i32 {
    if !run_chef_client(ctl, "dna.json", false) {
        return 1;
    }
    let display_name = ctl.settings.display_name.clone();
    ctl.log(format!("{display_name} Reconfigured!"));
    0
}

fn run_chef_client(ctl: &mut Ctl, attributes: &str, quiet: bool) -> bool {
    let paths = ctl.paths();
    let chef_client = paths.chef_client();
    let mut args = vec![
        "-z".to_string(),
        "-c".to_string(),
        paths.cookbook_file("solo.rb").to_string_lossy().into_owned(),
        "-j".to_string(),
        paths.cookbook_file(attributes).to_string_lossy().into_owned(),
    ];
    if quiet {
        args.extend(["-l".to_string(), "fatal".to_string()]);
    }

    match ctl.launcher.run_program(&chef_client, &args) {
        Ok(status) => status == 0,
        Err(e) => {
            ctl.log(format!("could not run {}: {e}", chef_client.display()));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunningConfig;
    use crate::testing::{Event, Fixture};

    fn expected_args(fx: &Fixture, attributes: &str) -> Vec<String> {
        let cookbooks = fx.paths.base_path().join("embedded/cookbooks");
        vec![
            "-z".to_string(),
            "-c".to_string(),
            cookbooks.join("solo.rb").to_string_lossy().into_owned(),
            "-j".to_string(),
            cookbooks.join(attributes).to_string_lossy().into_owned(),
        ]
    }

    #[test]
    fn test_reconfigure_runs_dna_and_announces() {
        let fx = Fixture::new();
        let mut settings = fx.settings();
        settings.display_name = "Demo Server".to_string();
        let (mut ctl, out) = fx.build(
            settings,
            &RunningConfig::empty(),
            fx.launcher(),
            fx.processes(),
        );

        assert_eq!(reconfigure(&mut ctl, "reconfigure", None), 0);
        assert_eq!(
            fx.recorder.events(),
            vec![Event::Program(
                fx.paths.chef_client().to_string_lossy().into_owned(),
                expected_args(&fx, "dna.json"),
            )]
        );
        assert_eq!(out.contents(), "Demo Server Reconfigured!\n");
    }

    #[test]
    fn test_show_config_is_quiet() {
        let fx = Fixture::new();
        let (mut ctl, out) = fx.ctl();

        assert_eq!(show_config(&mut ctl, "show-config", None), 0);
        let mut args = expected_args(&fx, "show-config.json");
        args.extend(["-l".to_string(), "fatal".to_string()]);
        assert_eq!(
            fx.recorder.events(),
            vec![Event::Program(
                fx.paths.chef_client().to_string_lossy().into_owned(),
                args,
            )]
        );
        assert!(out.contents().is_empty());
    }

    #[test]
    fn test_failed_converge_exits_one() {
        let fx = Fixture::new();
        let chef_client = fx.paths.chef_client().to_string_lossy().into_owned();
        let (mut ctl, out) = fx.build(
            fx.settings(),
            &RunningConfig::empty(),
            fx.launcher().status(&chef_client, "", 42),
            fx.processes(),
        );

        assert_eq!(reconfigure(&mut ctl, "reconfigure", None), 1);
        assert_eq!(show_config(&mut ctl, "show-config", None), 1);
        assert!(!out.contents().contains("Reconfigured!"));
    }
}
