use crate::ctl::Ctl;
use crate::registry::{Arity, CommandHandler, Registry};
use crate::supervisor::SPAWN_FAILURE;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    #[error("failed to read extension '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse extension '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("command '{name}' has an invalid run line: {source}")]
    Split {
        name: String,
        source: shell_words::ParseError,
    },
    #[error("command '{name}' has an empty run line")]
    EmptyRun { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionArity {
    #[default]
    None,
    OptionalService,
}

impl From<ExtensionArity> for Arity {
    fn from(arity: ExtensionArity) -> Self {
        match arity {
            ExtensionArity::None => Arity::NoArg,
            ExtensionArity::OptionalService => Arity::OptionalService,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionCommand {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    #[serde(default)]
    pub arity: ExtensionArity,
    pub run: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExtensionFile {
    #[serde(default)]
    command: Vec<ExtensionCommand>,
}

pub fn parse_extension(content: &str) -> Result<Vec<ExtensionCommand>, toml::de::Error> {
    let file: ExtensionFile = toml::from_str(content)?;
    Ok(file.command)
}

/// Every command declared in `dir/*.toml`, files taken in name order.
pub fn load_dir(dir: &Path) -> Result<Vec<ExtensionCommand>, ExtensionError> {
    let read_err = |source| ExtensionError::Read {
        path: dir.display().to_string(),
        source,
    };
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(read_err)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    files.sort();

    let mut commands = Vec::new();
    for path in files {
        let content = std::fs::read_to_string(&path).map_err(|source| ExtensionError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let parsed = parse_extension(&content).map_err(|source| ExtensionError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        commands.extend(parsed);
    }
    Ok(commands)
}

/// Add each command to `registry`, flat when it names no category.
pub fn register_all(
    registry: &mut Registry,
    commands: &[ExtensionCommand],
) -> Result<(), ExtensionError> {
    for command in commands {
        let handler = External::from_run_line(&command.name, &command.run)?;
        let arity = command.arity.into();
        match &command.category {
            Some(category) => registry.register(
                category,
                &command.name,
                &command.description,
                arity,
                handler,
            ),
            None => registry.register_flat(&command.name, &command.description, arity, handler),
        }
    }
    Ok(())
}

/// An extension command backed by an external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct External {
    program: String,
    args: Vec<String>,
}

impl External {
    pub fn from_run_line(name: &str, run: &str) -> Result<Self, ExtensionError> {
        let mut words = shell_words::split(run).map_err(|source| ExtensionError::Split {
            name: name.to_string(),
            source,
        })?;
        if words.is_empty() {
            return Err(ExtensionError::EmptyRun {
                name: name.to_string(),
            });
        }
        let program = words.remove(0);
        Ok(Self {
            program,
            args: words,
        })
    }
}

impl CommandHandler for External {
    fn execute(&self, ctl: &mut Ctl, command: &str, service: Option<&str>) -> i32 {
        let mut args = self.args.clone();
        args.extend(service.map(str::to_string));
        match ctl.launcher.run_program(Path::new(&self.program), &args) {
            Ok(status) => status,
            Err(e) => {
                ctl.log(format!("could not run {command}: {e}"));
                SPAWN_FAILURE
            }
        }
    }
}
