//! Stable, collision-free names for declarations in the serialized model.
//!
//! Users may declare several things with the same name (the checker reports
//! them later), but the model needs every alias to be distinct. Each
//! declaration gets a base name built from its category and owner; repeated
//! bases get a numeric suffix in declaration order.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use pcc_ir::{AggregateProgram, DeclRef, MachineId};

/// Hands out distinct names for a single serialization pass.
#[derive(Debug, Default)]
pub struct AliasAllocator {
    occurrences: HashMap<String, u32>,
    assigned: HashSet<String>,
}

impl AliasAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a name for `base`.
    ///
    /// The first request for a base returns it unchanged; later requests
    /// return `base_1`, `base_2`, ... skipping any name already handed out.
    pub fn allocate(&mut self, base: &str) -> String {
        let count = self.occurrences.entry(base.to_string()).or_insert(0);
        loop {
            let candidate = if *count == 0 {
                base.to_string()
            } else {
                format!("{}_{}", base, count)
            };
            *count += 1;
            if self.assigned.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Forget every allocation.
    pub fn reset(&mut self) {
        self.occurrences.clear();
        self.assigned.clear();
    }
}

/// Aliases assigned to the declarations of one program.
#[derive(Debug, Default)]
pub struct AliasMap {
    aliases: IndexMap<DeclRef, String>,
}

impl AliasMap {
    /// Assign aliases to machines, events, variables, functions, anonymous
    /// functions and states, in that order.
    pub fn for_program(program: &AggregateProgram) -> Self {
        let mut allocator = AliasAllocator::new();
        let mut aliases = IndexMap::new();
        let machine_name = |id: &MachineId| {
            program
                .machines
                .get(id)
                .map_or("", |m| m.name.as_str())
        };

        for (id, machine) in &program.machines {
            let alias = allocator.allocate(&format!("machdecl__{}", machine.name));
            aliases.insert(DeclRef::Machine(*id), alias);
        }
        for (id, event) in &program.events {
            let alias = allocator.allocate(&format!("evdecl__{}", event.name));
            aliases.insert(DeclRef::Event(*id), alias);
        }
        for (id, var) in &program.variables {
            let base = format!("vardecl__{}__{}", machine_name(&var.owner), var.name);
            aliases.insert(DeclRef::Variable(*id), allocator.allocate(&base));
        }
        for (id, fun) in &program.functions {
            let base = match &fun.owner {
                Some(owner) => format!("fundecl__{}__{}", machine_name(owner), fun.name),
                None => format!("fundecl__{}", fun.name),
            };
            aliases.insert(DeclRef::Function(*id), allocator.allocate(&base));
        }
        for id in program.anon_functions.keys() {
            aliases.insert(DeclRef::AnonFunction(*id), allocator.allocate("afundecl__"));
        }
        for (id, state) in &program.states {
            let base = format!(
                "statedecl__{}__{}",
                machine_name(&state.owner),
                state.name.join("_")
            );
            aliases.insert(DeclRef::State(*id), allocator.allocate(&base));
        }

        Self { aliases }
    }

    pub fn get(&self, decl: DeclRef) -> Option<&str> {
        self.aliases.get(&decl).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeclRef, &str)> {
        self.aliases.iter().map(|(d, a)| (*d, a.as_str()))
    }
}
