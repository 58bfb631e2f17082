//! Registry of top-level names shared by every file of one compile.

use std::collections::HashSet;

/// Categories of top-level declarations whose names must be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopDecl {
    Event,
    EventSet,
    Interface,
    Module,
    Machine,
    Test,
    TypeDef,
    Enum,
}

/// Top-level names declared so far, one set per [`TopDecl`] category.
///
/// The parser consults this while reading each file so duplicates across
/// files are detected. It is only cleared at the start of a compile.
#[derive(Debug, Clone, Default)]
pub struct TopDeclNames {
    events: HashSet<String>,
    event_sets: HashSet<String>,
    interfaces: HashSet<String>,
    modules: HashSet<String>,
    machines: HashSet<String>,
    tests: HashSet<String>,
    type_defs: HashSet<String>,
    enums: HashSet<String>,
}

impl TopDeclNames {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, kind: TopDecl) -> &HashSet<String> {
        match kind {
            TopDecl::Event => &self.events,
            TopDecl::EventSet => &self.event_sets,
            TopDecl::Interface => &self.interfaces,
            TopDecl::Module => &self.modules,
            TopDecl::Machine => &self.machines,
            TopDecl::Test => &self.tests,
            TopDecl::TypeDef => &self.type_defs,
            TopDecl::Enum => &self.enums,
        }
    }

    fn set_mut(&mut self, kind: TopDecl) -> &mut HashSet<String> {
        match kind {
            TopDecl::Event => &mut self.events,
            TopDecl::EventSet => &mut self.event_sets,
            TopDecl::Interface => &mut self.interfaces,
            TopDecl::Module => &mut self.modules,
            TopDecl::Machine => &mut self.machines,
            TopDecl::Test => &mut self.tests,
            TopDecl::TypeDef => &mut self.type_defs,
            TopDecl::Enum => &mut self.enums,
        }
    }

    /// Record a name. Returns `false` if it was already declared in this
    /// category.
    pub fn insert(&mut self, kind: TopDecl, name: impl Into<String>) -> bool {
        self.set_mut(kind).insert(name.into())
    }

    pub fn contains(&self, kind: TopDecl, name: &str) -> bool {
        self.set(kind).contains(name)
    }

    /// Number of names recorded in a category.
    pub fn len(&self, kind: TopDecl) -> usize {
        self.set(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        [
            &self.events,
            &self.event_sets,
            &self.interfaces,
            &self.modules,
            &self.machines,
            &self.tests,
            &self.type_defs,
            &self.enums,
        ]
        .iter()
        .all(|s| s.is_empty())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_detected_per_category() {
        let mut names = TopDeclNames::new();
        assert!(names.insert(TopDecl::Machine, "Main"));
        assert!(!names.insert(TopDecl::Machine, "Main"));
        assert!(names.insert(TopDecl::Event, "Main"));
        assert_eq!(names.len(TopDecl::Machine), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut names = TopDeclNames::new();
        names.insert(TopDecl::Enum, "Color");
        names.insert(TopDecl::Test, "t1");
        assert!(!names.is_empty());

        names.reset();
        assert!(names.is_empty());
        assert!(!names.contains(TopDecl::Enum, "Color"));
    }
}
