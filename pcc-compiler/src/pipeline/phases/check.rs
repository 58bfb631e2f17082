//! Check phase - queries the engine and reports failed proofs.

use eyre::Result;
use pcc_core::{Flag, ProgramName, Severity, codes};
use pcc_engine::{Conclusion, ProofEnumeration, QueryResult};

use crate::{
    Error, StageFailed,
    pipeline::{CompilationContext, Phase, PipelineState},
};

/// A kind of checker error and where it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPattern {
    /// Query pattern matching the error's conclusions.
    pub pattern: &'static str,
    /// Argument whose source locations the error is reported at. Errors
    /// without one are reported against the root file.
    pub location: Option<usize>,
}

const fn at(pattern: &'static str, location: usize) -> ErrorPattern {
    ErrorPattern {
        pattern,
        location: Some(location),
    }
}

/// Checker errors, in reporting order.
///
/// `TypeOf(_, _, ERROR)` comes last so that more specific errors about the
/// same expression are reported first.
pub const ERROR_PATTERNS: &[ErrorPattern] = &[
    at("DupNmdSubE(_, _, _, _)", 1),
    at("PurityError(_, _)", 1),
    at("SpecError(_, _)", 1),
    at("LValueError(_, _)", 1),
    at("BadLabelError(_)", 0),
    at("PayloadError(_)", 0),
    at("TypeDefError(_)", 0),
    at("FunRetError(_)", 0),
    at("FunDeclQualifierError(_, _)", 1),
    at("FunCallQualifierError(_, _, _)", 2),
    at("SendQualifierError(_, _)", 1),
    at("UnavailableVarAccessError(_, _, _)", 1),
    at("UnavailableParameterError(_, _)", 0),
    at("OneDeclError(_)", 0),
    at("TwoDeclError(_, _)", 1),
    at("DeclFunError(_, _)", 1),
    at("ExportInterfaceError(_)", 0),
    at("TypeOf(_, _, ERROR)", 1),
];

/// Pattern of inferred-type conclusions reported with `print_types`.
const TYPE_PATTERN: &str = "TypeOf(_, _, _)";

const UNKNOWN_ERROR: &str = "Unknown error";

/// Phase that checks the installed root model.
///
/// The check passes when the engine concludes the root module's
/// requirements hold and no error diagnostic has been recorded.
pub struct CheckPhase;

impl Phase for CheckPhase {
    fn name(&self) -> &'static str {
        "check"
    }

    fn description(&self) -> &'static str {
        "Check the installed program and report errors"
    }

    fn run(&self, ctx: &mut CompilationContext<'_>) -> Result<()> {
        let root = ctx.root()?.clone();
        let goal = format!("{}.requires", ctx.root_module);
        let outcome = ctx
            .engine
            .query(&root, &ctx.root_module, &[goal.as_str()])
            .wait()
            .map_err(|e| Error::engine("query", e))?;
        ctx.add_flags(outcome.flags);

        let result = outcome.result.as_ref();
        for pattern in ERROR_PATTERNS {
            let flags = error_flags(result, pattern, &root)?;
            ctx.add_flags(flags);
        }
        if ctx.options.print_types {
            let flags = type_flags(result)?;
            ctx.add_flags(flags);
        }

        let conclusion = result.conclusion();
        tracing::debug!(?conclusion, errors = ctx.diagnostics.error_count(), "check finished");
        if conclusion != Conclusion::True || ctx.diagnostics.has_errors() {
            return Err(StageFailed::new("check").into());
        }
        ctx.advance(PipelineState::Checked)
    }
}

fn enumerate(result: &dyn QueryResult, pattern: &str) -> Result<ProofEnumeration> {
    result
        .enumerate_proofs(pattern, 1)
        .map_err(|e| Error::engine("query", e).into())
}

/// Flags for every error matching `pattern`.
fn error_flags(
    result: &dyn QueryResult,
    pattern: &ErrorPattern,
    root: &ProgramName,
) -> Result<Vec<Flag>> {
    let enumeration = enumerate(result, pattern.pattern)?;
    let mut flags = Vec::new();
    for proof in &enumeration.proofs {
        if !proof.has_rule_class("error") {
            continue;
        }
        let message = proof.rule_class_with_prefix("msg:").unwrap_or(UNKNOWN_ERROR);
        match pattern.location {
            Some(index) => flags.extend(proof.locators_for(index).map(|locator| {
                Flag::new(Severity::Error, locator.span.clone(), message, codes::TYPE_ERROR)
                    .in_program(locator.span.program.clone())
            })),
            None => flags.push(Flag::error(message, codes::TYPE_ERROR).in_program(root.clone())),
        }
    }
    flags.extend(enumeration.flags);
    Ok(flags)
}

/// Informational flags with the type inferred for each expression.
fn type_flags(result: &dyn QueryResult) -> Result<Vec<Flag>> {
    let enumeration = enumerate(result, TYPE_PATTERN)?;
    let mut flags = Vec::new();
    for proof in &enumeration.proofs {
        let Some(ty) = proof.conclusion.args().get(2) else {
            continue;
        };
        let message = format!("inferred type: {}", ty);
        flags.extend(proof.locators_for(1).map(|locator| {
            Flag::new(Severity::Info, locator.span.clone(), message.clone(), codes::NONE)
                .in_program(locator.span.program.clone())
        }));
    }
    flags.extend(enumeration.flags);
    Ok(flags)
}

#[cfg(test)]
mod tests {
    use pcc_core::Span;
    use pcc_engine::{EngineError, Locator, Proof};
    use pcc_ir::Term;

    use super::*;

    /// A query result that returns the same proofs for every pattern.
    struct FixedResult(Vec<Proof>);

    impl QueryResult for FixedResult {
        fn conclusion(&self) -> Conclusion {
            Conclusion::False
        }

        fn enumerate_proofs(
            &self,
            _pattern: &str,
            _max_per_goal: usize,
        ) -> std::result::Result<ProofEnumeration, EngineError> {
            Ok(ProofEnumeration {
                proofs: self.0.clone(),
                flags: Vec::new(),
            })
        }
    }

    fn root() -> ProgramName {
        ProgramName::new(std::env::temp_dir().join("main.p")).unwrap()
    }

    fn proof(classes: &[&str], spans: Vec<Span>) -> Proof {
        Proof {
            rule_classes: classes.iter().map(|c| c.to_string()).collect(),
            conclusion: Term::app("NoMainError", vec![]),
            locators: vec![spans.into_iter().map(Locator::new).collect()],
        }
    }

    #[test]
    fn test_error_without_location_reported_against_root() {
        let pattern = ErrorPattern {
            pattern: "NoMainError()",
            location: None,
        };
        let result = FixedResult(vec![proof(&["error", "msg: no main machine"], vec![])]);

        let flags = error_flags(&result, &pattern, &root()).unwrap();

        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].message, "no main machine");
        assert!(flags[0].span.is_unknown());
        assert_eq!(flags[0].program, Some(root()));
    }

    #[test]
    fn test_error_with_location_reported_at_each_locator() {
        let file = root();
        let at = |line| Span::point(Some(file.clone()), line, 3);
        let mut located = proof(&["error", "msg: bad label"], vec![at(4)]);
        located.locators.push(vec![Locator::new(at(9))]);
        let result = FixedResult(vec![located]);

        let flags = error_flags(&result, &at_pattern(), &file).unwrap();

        let lines: Vec<_> = flags.iter().map(|f| f.span.start_line).collect();
        assert_eq!(lines, vec![4, 9]);
        assert!(flags.iter().all(|f| f.program.as_ref() == Some(&file)));
    }

    #[test]
    fn test_proofs_outside_error_class_skipped() {
        let result = FixedResult(vec![proof(&["msg: not an error"], vec![])]);

        let flags = error_flags(&result, &at_pattern(), &root()).unwrap();

        assert!(flags.is_empty());
    }

    #[test]
    fn test_missing_message_is_unknown_error() {
        let pattern = ErrorPattern {
            pattern: "NoMainError()",
            location: None,
        };
        let result = FixedResult(vec![proof(&["error"], vec![])]);

        let flags = error_flags(&result, &pattern, &root()).unwrap();

        assert_eq!(flags[0].message, UNKNOWN_ERROR);
    }

    fn at_pattern() -> ErrorPattern {
        at("BadLabelError(_)", 0)
    }
}
