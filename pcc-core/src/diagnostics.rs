//! Ordered, deduplicated diagnostic collection and its text formats.

use std::collections::{BTreeSet, btree_set};

use crate::{Flag, Severity};

/// Error number shown by the verbose format.
pub const ERROR_NUMBER: &str = "PC1001";

/// Diagnostics collected during one compile.
///
/// Iteration follows the structural order defined on [`Flag`], so the same
/// inputs always produce the same output order. Adding a flag that is
/// structurally equal to one already present is a no-op.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSet {
    flags: BTreeSet<Flag>,
}

impl DiagnosticSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flag. Returns false if an equal flag was already present.
    pub fn add(&mut self, flag: Flag) -> bool {
        self.flags.insert(flag)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, Flag> {
        self.flags.iter()
    }

    /// Check if any error diagnostics have been recorded.
    pub fn has_errors(&self) -> bool {
        self.flags.iter().any(|f| f.severity.is_error())
    }

    /// Count the number of error diagnostics.
    pub fn error_count(&self) -> usize {
        self.flags.iter().filter(|f| f.severity.is_error()).count()
    }

    /// Get all diagnostics of the given severity.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Flag> {
        self.flags.iter().filter(move |f| f.severity == severity)
    }

    pub fn clear(&mut self) {
        self.flags.clear();
    }
}

impl Extend<Flag> for DiagnosticSet {
    fn extend<T: IntoIterator<Item = Flag>>(&mut self, iter: T) {
        for flag in iter {
            self.add(flag);
        }
    }
}

impl<'a> IntoIterator for &'a DiagnosticSet {
    type Item = &'a Flag;
    type IntoIter = btree_set::Iter<'a, Flag>;

    fn into_iter(self) -> Self::IntoIter {
        self.flags.iter()
    }
}

/// Layout of a formatted diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagStyle {
    /// `{file} ({line}, {col}): {message}`, matching baseline test output.
    Compact,
    /// `{file}({line},{col},{end line},{end col}): error PC1001: {message}`.
    Verbose,
}

/// How the owning program is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileNames {
    Full,
    Short,
}

/// Renders flags to single-line messages.
#[derive(Debug, Clone, Copy)]
pub struct FlagFormatter {
    pub style: FlagStyle,
    pub file_names: FileNames,
}

impl FlagFormatter {
    pub fn new(style: FlagStyle, file_names: FileNames) -> Self {
        Self { style, file_names }
    }

    pub fn format(&self, flag: &Flag) -> String {
        let program = match (&flag.program, self.file_names) {
            (None, _) => "?".to_string(),
            (Some(p), FileNames::Short) => p.file_name(),
            (Some(p), FileNames::Full) => p.to_string(),
        };

        match self.style {
            FlagStyle::Compact => format!(
                "{} ({}, {}): {}",
                program, flag.span.start_line, flag.span.start_col, flag.message
            ),
            FlagStyle::Verbose => format!(
                "{}({},{},{},{}): error {}: {}",
                program,
                flag.span.start_line,
                flag.span.start_col,
                flag.span.end_line,
                flag.span.end_col,
                ERROR_NUMBER,
                flag.message
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProgramName, Span, codes};

    fn program(name: &str) -> ProgramName {
        ProgramName::new(std::env::temp_dir().join("diag").join(name)).unwrap()
    }

    fn located(severity: Severity, file: &str, line: u32, col: u32, msg: &str) -> Flag {
        let p = program(file);
        Flag::new(
            severity,
            Span::new(Some(p.clone()), line, col, line, col + 3),
            msg,
            codes::TYPE_ERROR,
        )
        .in_program(p)
    }

    #[test]
    fn test_duplicate_insert_is_noop() {
        let mut set = DiagnosticSet::new();
        assert!(set.add(located(Severity::Error, "a.p", 3, 4, "bad")));
        assert!(!set.add(located(Severity::Error, "a.p", 3, 4, "bad")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_iteration_order_is_stable() {
        let flags = vec![
            located(Severity::Error, "b.p", 1, 1, "x"),
            located(Severity::Info, "a.p", 9, 9, "y"),
            Flag::error("whole program", codes::TYPE_ERROR),
            located(Severity::Error, "a.p", 2, 7, "z"),
            located(Severity::Error, "a.p", 2, 3, "w"),
            located(Severity::Warning, "a.p", 1, 1, "v"),
        ];

        let mut forward = DiagnosticSet::new();
        forward.extend(flags.iter().cloned());
        let mut backward = DiagnosticSet::new();
        backward.extend(flags.iter().rev().cloned());

        let a: Vec<_> = forward.iter().map(|f| f.message.as_str()).collect();
        let b: Vec<_> = backward.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(a, b);
        assert_eq!(a, vec!["y", "v", "whole program", "w", "z", "x"]);
    }

    #[test]
    fn test_error_count() {
        let mut set = DiagnosticSet::new();
        set.add(located(Severity::Error, "a.p", 1, 1, "e1"));
        set.add(located(Severity::Warning, "a.p", 1, 1, "w1"));
        set.add(located(Severity::Error, "a.p", 2, 1, "e2"));
        assert!(set.has_errors());
        assert_eq!(set.error_count(), 2);
        assert_eq!(set.with_severity(Severity::Warning).count(), 1);
    }

    #[test]
    fn test_compact_format() {
        let flag = located(Severity::Error, "main.p", 12, 5, "undeclared variable");
        let formatter = FlagFormatter::new(FlagStyle::Compact, FileNames::Short);
        insta::assert_snapshot!(formatter.format(&flag), @"main.p (12, 5): undeclared variable");
    }

    #[test]
    fn test_verbose_format() {
        let flag = located(Severity::Error, "main.p", 12, 5, "undeclared variable");
        let formatter = FlagFormatter::new(FlagStyle::Verbose, FileNames::Short);
        insta::assert_snapshot!(
            formatter.format(&flag),
            @"main.p(12,5,12,8): error PC1001: undeclared variable"
        );
    }

    #[test]
    fn test_full_file_names() {
        let flag = located(Severity::Error, "main.p", 1, 2, "m");
        let formatter = FlagFormatter::new(FlagStyle::Compact, FileNames::Full);
        let expected = format!("{} (1, 2): m", program("main.p"));
        assert_eq!(formatter.format(&flag), expected);
    }

    #[test]
    fn test_missing_program_prints_placeholder() {
        let flag = Flag::error("lost", codes::FATAL);
        let formatter = FlagFormatter::new(FlagStyle::Compact, FileNames::Full);
        assert_eq!(formatter.format(&flag), "? (0, 0): lost");
    }
}
