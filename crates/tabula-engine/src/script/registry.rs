//! Procedure registry.
//!
//! Procedures live in a table sorted by the hash of their name and are found
//! by binary search. Entries compare on (hash, name), so two names that
//! share a hash still resolve to their own procedures.

use std::hash::BuildHasher;
use std::rc::Rc;

use super::{EvalResult, Interp, ScriptError};

/// Host callback implementing a procedure. `args[0]` is the procedure name.
pub type NativeFn<H> = Rc<dyn Fn(&mut Interp<H>, &[String]) -> EvalResult>;

/// A procedure defined with `proc`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedProc {
    pub params: Vec<String>,
    pub body: String,
    /// The last parameter is `args` and collects any remaining arguments.
    pub variadic: bool,
}

impl ScriptedProc {
    pub fn new(params: Vec<String>, body: String) -> Self {
        let variadic = params.last().is_some_and(|p| p == "args");
        ScriptedProc {
            params,
            body,
            variadic,
        }
    }

    fn usage(&self, name: &str) -> String {
        let mut usage = name.to_string();
        for param in &self.params {
            usage.push(' ');
            if self.variadic && param == "args" {
                usage.push_str("?arg ...?");
            } else {
                usage.push_str(param);
            }
        }
        usage
    }

    /// Pair parameters with call arguments.
    pub fn bind(&self, args: &[String]) -> Result<Vec<(String, String)>, ScriptError> {
        let name = args.first().map(String::as_str).unwrap_or_default();
        let given = args.get(1..).unwrap_or_default();
        let fixed = if self.variadic {
            self.params.len() - 1
        } else {
            self.params.len()
        };

        if given.len() < fixed || (!self.variadic && given.len() != fixed) {
            return Err(ScriptError::arity(&self.usage(name)));
        }

        let mut bindings: Vec<(String, String)> = self.params[..fixed]
            .iter()
            .cloned()
            .zip(given.iter().cloned())
            .collect();
        if self.variadic {
            bindings.push(("args".to_string(), super::format_list(&given[fixed..])));
        }
        Ok(bindings)
    }
}

/// Native host callback or scripted body.
pub enum Procedure<H> {
    Native(NativeFn<H>),
    Scripted(Rc<ScriptedProc>),
}

impl<H> Clone for Procedure<H> {
    fn clone(&self) -> Self {
        match self {
            Procedure::Native(f) => Procedure::Native(Rc::clone(f)),
            Procedure::Scripted(p) => Procedure::Scripted(Rc::clone(p)),
        }
    }
}

pub struct ProcedureInfo<H> {
    pub name: String,
    pub hash: u64,
    pub procedure: Procedure<H>,
}

pub struct Registry<H, S = ahash::RandomState> {
    table: Vec<ProcedureInfo<H>>,
    hasher: S,
}

impl<H> Registry<H> {
    pub fn new() -> Self {
        Self::with_hasher(ahash::RandomState::new())
    }
}

impl<H, S: BuildHasher> Registry<H, S> {
    /// Create a registry that hashes names with `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        Registry {
            table: Vec::new(),
            hasher,
        }
    }

    fn position(&self, name: &str) -> Result<usize, usize> {
        let hash = self.hasher.hash_one(name);
        self.table.binary_search_by(|info| {
            info.hash
                .cmp(&hash)
                .then_with(|| info.name.as_str().cmp(name))
        })
    }

    /// Register `procedure` under `name`. An existing entry with the same
    /// name is replaced in place. Returns true when an entry was replaced.
    pub fn register(&mut self, name: &str, procedure: Procedure<H>) -> bool {
        match self.position(name) {
            Ok(i) => {
                self.table[i].procedure = procedure;
                true
            }
            Err(_) => {
                let hash = self.hasher.hash_one(name);
                self.table.push(ProcedureInfo {
                    name: name.to_string(),
                    hash,
                    procedure,
                });
                self.table
                    .sort_unstable_by(|a, b| a.hash.cmp(&b.hash).then_with(|| a.name.cmp(&b.name)));
                false
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Procedure<H>> {
        self.position(name).ok().map(|i| &self.table[i].procedure)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_ok()
    }

    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Ok(i) => {
                self.table.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Registered names, sorted alphabetically.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Self::new()
    }
}
