use crate::ctl::Ctl;
use std::collections::BTreeMap;
use std::rc::Rc;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Only the command name.
    NoArg,
    /// Command name plus an optional service token.
    OptionalService,
}

impl Arity {
    pub fn accepts_service(self) -> bool {
        matches!(self, Arity::OptionalService)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    /// `None` for commands in the uncategorised legacy table.
    pub category: Option<String>,
    pub description: String,
    pub arity: Arity,
}

/// Something a resolved command runs. The returned value is the process
/// exit status.
pub trait CommandHandler {
    fn execute(&self, ctl: &mut Ctl, command: &str, service: Option<&str>) -> i32;
}

impl<F> CommandHandler for F
where
    F: Fn(&mut Ctl, &str, Option<&str>) -> i32,
{
    fn execute(&self, ctl: &mut Ctl, command: &str, service: Option<&str>) -> i32 {
        self(ctl, command, service)
    }
}

#[derive(Clone)]
pub struct Entry {
    pub spec: CommandSpec,
    pub handler: Rc<dyn CommandHandler>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Command table: a flat legacy map plus categorised maps kept in the
/// order their categories were first created.
///
/// Lookups consult the flat map first. Among categories, the most
/// recently created one holding the name wins.
#[derive(Default)]
pub struct Registry {
    flat: BTreeMap<String, Entry>,
    categories: Vec<(String, BTreeMap<String, Entry>)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(
        &mut self,
        category: &str,
        name: &str,
        description: &str,
        arity: Arity,
        handler: H,
    ) where
        H: CommandHandler + 'static,
    {
        let entry = Entry {
            spec: CommandSpec {
                name: name.to_string(),
                category: Some(category.to_string()),
                description: description.to_string(),
                arity,
            },
            handler: Rc::new(handler),
        };
        let index = match self.categories.iter().position(|(c, _)| c == category) {
            Some(i) => i,
            None => {
                self.categories.push((category.to_string(), BTreeMap::new()));
                self.categories.len() - 1
            }
        };
        self.categories[index].1.insert(name.to_string(), entry);
    }

    pub fn register_flat<H>(&mut self, name: &str, description: &str, arity: Arity, handler: H)
    where
        H: CommandHandler + 'static,
    {
        let entry = Entry {
            spec: CommandSpec {
                name: name.to_string(),
                category: None,
                description: description.to_string(),
                arity,
            },
            handler: Rc::new(handler),
        };
        self.flat.insert(name.to_string(), entry);
    }

    pub fn resolve(&self, name: &str) -> Option<&Entry> {
        if let Some(entry) = self.flat.get(name) {
            return Some(entry);
        }
        self.categories
            .iter()
            .rev()
            .find_map(|(_, commands)| commands.get(name))
    }

    /// Every dispatchable command, with the same precedence as `resolve`.
    pub fn all(&self) -> BTreeMap<String, CommandSpec> {
        let mut merged = BTreeMap::new();
        for (_, commands) in &self.categories {
            for (name, entry) in commands {
                merged.insert(name.clone(), entry.spec.clone());
            }
        }
        for (name, entry) in &self.flat {
            merged.insert(name.clone(), entry.spec.clone());
        }
        merged
    }

    /// Uncategorised commands, sorted by name.
    pub fn flat(&self) -> impl Iterator<Item = &CommandSpec> {
        self.flat.values().map(|e| &e.spec)
    }

    /// Categories in creation order, each with its commands sorted by name.
    pub fn categories(&self) -> impl Iterator<Item = (&str, Vec<&CommandSpec>)> {
        self.categories.iter().map(|(category, commands)| {
            (
                category.as_str(),
                commands.values().map(|e| &e.spec).collect(),
            )
        })
    }
}
