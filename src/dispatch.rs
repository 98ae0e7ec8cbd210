use crate::ctl::Ctl;
use owo_colors::OwoColorize;

/// Exit status for a command given arguments it does not take.
pub const ARITY_VIOLATION: i32 = 2;

/// One command line split the way handlers see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation<'a> {
    pub command: Option<&'a str>,
    /// The second token, unless it looks like an option.
    pub service: Option<&'a str>,
    pub options: Vec<&'a str>,
}

pub fn is_option(arg: &str) -> bool {
    arg.starts_with('-')
}

pub fn parse(args: &[String]) -> Invocation<'_> {
    let mut options: Vec<&str> = args.iter().skip(2).map(String::as_str).collect();
    let service = match args.get(1) {
        Some(arg) if is_option(arg) => {
            options.insert(0, arg);
            None
        }
        Some(arg) => Some(arg.as_str()),
        None => None,
    };
    Invocation {
        command: args.first().map(String::as_str),
        service,
        options,
    }
}

/// Resolve and execute one command line, returning the exit status.
pub fn run(ctl: &mut Ctl, args: &[String]) -> i32 {
    let invocation = parse(args);
    let command = invocation.command.unwrap_or_default();

    let Some(entry) = ctl.registry().resolve(command).cloned() else {
        ctl.log("I don't know that command.");
        if args.len() == 2 {
            let program = ctl.settings.program.clone();
            let service = invocation.service.unwrap_or_default();
            ctl.log(format!("Did you mean: {program} {service} {command}?"));
        }
        return help(ctl, command, None);
    };

    if args.len() > 1 && !entry.spec.arity.accepts_service() {
        ctl.log(format!("The command {command} does not accept any arguments"));
        return ARITY_VIOLATION;
    }

    // unrecognised options are ignored
    for option in &invocation.options {
        if matches!(*option, "--verbose" | "-v") {
            ctl.verbose = true;
        }
    }

    entry.handler.execute(ctl, command, invocation.service)
}

/// `help`: every command grouped by category. Always exits 1.
pub fn help(ctl: &mut Ctl, _command: &str, _service: Option<&str>) -> i32 {
    let colored = ctl.console.colored();
    let mut lines = vec![format!("{}: command (subcommand)", ctl.settings.program)];

    for spec in ctl.registry().flat() {
        lines.push(spec.name.clone());
        lines.push(format!("  {}", spec.description));
    }

    for (category, specs) in ctl.registry().categories() {
        let header = format!("{} Commands:", title_case(category));
        if colored {
            lines.push(header.bold().to_string());
        } else {
            lines.push(header);
        }
        for spec in specs {
            lines.push(format!("  {}", spec.name));
            lines.push(format!("    {}", spec.description));
        }
    }

    for line in lines {
        ctl.log(line);
    }
    1
}

/// `service-management` becomes `Service Management`.
pub fn title_case(category: &str) -> String {
    category
        .split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
