//! Test utilities for compiles without a real parser or engine.
//!
//! This module is only available when the `testing` feature is enabled
//! or during tests.

use std::{collections::HashMap, path::Path};

use pcc_core::{Flag, ProgramName, Span};
use pcc_engine::{
    Fact, Locator, Model, Proof, SupportModule,
    testing::{StubCheck, StubEngine},
};
use pcc_ir::{
    AggregateProgram, EventDecl, FunDecl, MachineDecl, MachineKind, StateDecl, Term, TopDecl,
    TopDeclNames, TypeDef, VarDecl,
};

use crate::{
    Toolchain,
    resolve::{ParseOutput, SourceParser},
    toolchain::RUNTIME_SUPPORT_FILES,
};

/// A line-oriented parser for fixture files.
///
/// One declaration per line; blank lines and `//` comments are skipped:
///
/// ```text
/// include "other.p"
/// type Pair
/// event eGo
/// machine Main            // also `model machine`, `spec machine`
/// state Main.Init         // nested: `state Main.Group.Init`
/// var Main.count
/// fun Main.step uses count
/// fun helper              // global function
/// ```
///
/// A function body `uses x` becomes `Use("x")` located at `x`. Duplicate
/// top-level names are reported as errors without failing the parse.
#[derive(Debug, Default)]
pub struct LineParser {
    parsed: Vec<ProgramName>,
}

impl LineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every file parsed so far, in order.
    pub fn parsed(&self) -> &[ProgramName] {
        &self.parsed
    }
}

struct Line<'a> {
    file: &'a ProgramName,
    number: u32,
    text: &'a str,
}

impl Line<'_> {
    /// Span of the first whole-word occurrence of `word`.
    fn span_of(&self, word: &str) -> Span {
        let is_ident = |c: char| c.is_alphanumeric() || c == '_';
        let col = self
            .text
            .match_indices(word)
            .find(|(i, _)| {
                let before = self.text[..*i].chars().next_back();
                let after = self.text[i + word.len()..].chars().next();
                !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
            })
            .map_or(1, |(i, _)| i as u32 + 1);
        Span::new(
            Some(self.file.clone()),
            self.number,
            col,
            self.number,
            col + word.len() as u32,
        )
    }

    fn error(&self, message: impl Into<String>) -> Flag {
        Flag::error(message, 0)
            .at(Span::point(Some(self.file.clone()), self.number, 1))
            .in_program(self.file.clone())
    }
}

fn split_owner(path: &str) -> Option<(&str, &str)> {
    path.split_once('.')
}

impl SourceParser for LineParser {
    fn parse_file(
        &mut self,
        file: &ProgramName,
        text: &str,
        names: &mut TopDeclNames,
        program: &mut AggregateProgram,
    ) -> ParseOutput {
        self.parsed.push(file.clone());
        let mut output = ParseOutput::success(Vec::new());

        for (index, raw) in text.lines().enumerate() {
            let code = raw.split("//").next().unwrap_or_default();
            let words: Vec<&str> = code.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }
            let line = Line {
                file,
                number: index as u32 + 1,
                text: raw,
            };
            let mut top_level = |kind: TopDecl, name: &str, output: &mut ParseOutput| {
                if !names.insert(kind, name) {
                    let flag = line.error(format!("'{}' is declared more than once", name));
                    output.flags.push(flag.at(line.span_of(name)));
                }
            };

            match words.as_slice() {
                ["include", path] => output.includes.push(path.trim_matches('"').to_string()),
                ["type", name] => {
                    top_level(TopDecl::TypeDef, *name, &mut output);
                    program.add_type_def(TypeDef {
                        name: name.to_string(),
                        ty: Term::id("ANY"),
                        span: line.span_of(name),
                    });
                }
                ["event", name] => {
                    top_level(TopDecl::Event, *name, &mut output);
                    program.add_event(EventDecl {
                        name: name.to_string(),
                        card: None,
                        payload: None,
                        span: line.span_of(name),
                    });
                }
                [kind @ .., "machine", name] if kind.len() <= 1 => {
                    let kind = match kind {
                        [] => MachineKind::Real,
                        ["model"] => MachineKind::Model,
                        ["spec"] => MachineKind::Spec,
                        _ => {
                            let flag = line.error(format!("unknown machine kind in '{}'", code.trim()));
                            return fail(output, flag);
                        }
                    };
                    top_level(TopDecl::Machine, *name, &mut output);
                    program.add_machine(MachineDecl {
                        name: name.to_string(),
                        kind,
                        card: None,
                        span: line.span_of(name),
                    });
                }
                ["state", path] | ["var", path] => {
                    let Some((machine, rest)) = split_owner(path) else {
                        return fail(output, line.error(format!("'{}' has no owner", path)));
                    };
                    let Some((owner, _)) = program.machine_named(machine) else {
                        return fail(output, line.error(format!("unknown machine '{}'", machine)));
                    };
                    if words[0] == "state" {
                        program.add_state(StateDecl {
                            name: rest.split('.').map(str::to_string).collect(),
                            owner,
                            entry: None,
                            exit: None,
                            span: line.span_of(path),
                        });
                    } else {
                        program.add_variable(VarDecl {
                            name: rest.to_string(),
                            owner,
                            ty: Term::id("INT"),
                            span: line.span_of(path),
                        });
                    }
                }
                ["fun", path, rest @ ..] => {
                    let body = match rest {
                        [] => Term::app("Skip", vec![]),
                        ["uses", var] => Term::app("Use", vec![Term::str(*var)]).at(line.span_of(var)),
                        _ => {
                            let flag = line.error(format!("bad function body '{}'", code.trim()));
                            return fail(output, flag);
                        }
                    };
                    let (owner, name) = match split_owner(path) {
                        Some((machine, name)) => match program.machine_named(machine) {
                            Some((owner, _)) => (Some(owner), name),
                            None => {
                                let flag = line.error(format!("unknown machine '{}'", machine));
                                return fail(output, flag);
                            }
                        },
                        None => (None, *path),
                    };
                    program.add_function(FunDecl {
                        name: name.to_string(),
                        owner,
                        params: Vec::new(),
                        ret: None,
                        body,
                        span: line.span_of(path),
                    });
                }
                _ => return fail(output, line.error(format!("unexpected '{}'", code.trim()))),
            }
        }
        output
    }
}

fn fail(mut output: ParseOutput, flag: Flag) -> ParseOutput {
    output.flags.push(flag);
    output.succeeded = false;
    output.includes.clear();
    output
}

/// Write every support module and runtime support file into `dir` and
/// return a toolchain pointing there.
///
/// The model compiler is not created.
pub fn fixture_toolchain(dir: &Path) -> std::io::Result<Toolchain> {
    for module in SupportModule::ALL {
        std::fs::write(
            module.location(dir),
            format!("domain {} {{ }}\n", module.module_name()),
        )?;
    }
    for (i, name) in RUNTIME_SUPPORT_FILES.iter().enumerate() {
        std::fs::write(dir.join(name), format!("// runtime {}\n", i))?;
    }
    Ok(Toolchain::in_dir(dir))
}

/// A stub engine with every support transform registered.
///
/// - `P2CProgram` emits `File("{base}.c", ...)` listing each function and a
///   link descriptor naming the base
/// - `PLink2C` emits `File("linker.c", ...)`
/// - `P2PWithInferredTypes` returns the root model unchanged
/// - `P2Zing` emits `File("{zing file}", ...)` listing each machine
///
/// Checks report every `Use(x)` of a variable the function's machine does
/// not declare as an `UnavailableVarAccessError` located at the use.
pub fn stub_engine() -> StubEngine {
    StubEngine::new()
        .with_check(undeclared_variables)
        .with_transform("P2CProgram", |models, constants| {
            let base = constants.first().and_then(Term::as_str).unwrap_or("out");
            let functions = models.first().map(|m| names_of(m, "FunDecl")).unwrap_or_default();

            let mut c_model = Model::new("CModel", pcc_engine::ModuleRef::new("C"));
            let body = format!("// functions: {}\n", functions.join(", "));
            c_model.push(Fact::aliased("file", file(&format!("{}.c", base), &body)));
            let mut link = Model::new("LinkModel", pcc_engine::ModuleRef::new("PLink"));
            link.push(Fact::new(Term::app("LinkUnit", vec![Term::str(base)])));
            vec![c_model, link]
        })
        .with_transform("PLink2C", |models, _| {
            let units = models.first().map(|m| m.facts.len()).unwrap_or_default();
            let mut linked = Model::new("CLinkModel", pcc_engine::ModuleRef::new("C"));
            linked.push(Fact::new(file("linker.c", &format!("// units: {}\n", units))));
            vec![linked]
        })
        .with_transform("P2PWithInferredTypes", |models, _| {
            models.first().cloned().into_iter().collect()
        })
        .with_transform("P2Zing", |models, constants| {
            let zing_file = constants.first().and_then(Term::as_str).unwrap_or("out.zing");
            let machines = models.first().map(|m| names_of(m, "MachineDecl")).unwrap_or_default();
            let mut zing = Model::new("ZingModel", pcc_engine::ModuleRef::new("Zing"));
            let body = format!("// machines: {}\n", machines.join(", "));
            zing.push(Fact::new(file(zing_file, &body)));
            vec![zing]
        })
}

fn file(name: &str, body: &str) -> Term {
    Term::app("File", vec![Term::str(name), Term::str(body)])
}

/// First-argument strings of every `functor` fact.
fn names_of(model: &Model, functor: &str) -> Vec<String> {
    model
        .facts_named(functor)
        .filter_map(|fact| fact.term.args().first().and_then(Term::as_str))
        .map(str::to_string)
        .collect()
}

fn undeclared_variables(model: &Model) -> StubCheck {
    let mut declared: HashMap<String, Vec<String>> = HashMap::new();
    for fact in model.facts_named("VarDecl") {
        if let [Term::Str(name), owner, ..] = fact.term.args() {
            declared.entry(owner.to_string()).or_default().push(name.clone());
        }
    }

    let mut proofs = Vec::new();
    for fact in model.facts_named("FunDecl") {
        let [Term::Str(fun), owner, _, _, body] = fact.term.args() else {
            continue;
        };
        let fun_span = fact.term.span().cloned().unwrap_or_default();
        body.walk(&mut |term| {
            if term.functor() != Some("Use") {
                return;
            }
            let Some(var) = term.args().first().and_then(Term::as_str) else {
                return;
            };
            let known = declared
                .get(&owner.to_string())
                .is_some_and(|vars| vars.iter().any(|v| v == var));
            if !known {
                let use_span = term.span().cloned().unwrap_or_default();
                proofs.push(Proof {
                    rule_classes: vec![
                        "error".to_string(),
                        format!("msg: variable {} is not declared", var),
                    ],
                    conclusion: Term::app(
                        "UnavailableVarAccessError",
                        vec![Term::str(fun.as_str()), Term::str(var), owner.clone()],
                    ),
                    locators: vec![vec![
                        Locator::new(fun_span.clone()),
                        Locator::new(use_span),
                        Locator::new(fun_span.clone()),
                    ]],
                });
            }
        });
    }

    if proofs.is_empty() {
        StubCheck::pass()
    } else {
        StubCheck::fail(proofs)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn parse(text: &str) -> (ParseOutput, AggregateProgram) {
        let dir = TempDir::new().unwrap();
        let file = ProgramName::new(dir.path().join("main.p")).unwrap();
        let mut program = AggregateProgram::new();
        let mut names = TopDeclNames::new();
        let output = LineParser::new().parse_file(&file, text, &mut names, &mut program);
        (output, program)
    }

    #[test]
    fn test_parses_machine_body() {
        let (output, program) = parse(
            "include \"lib.p\"\nevent eGo\nmachine Main\nstate Main.Init\nvar Main.x\nfun Main.f uses x\nfun helper\n",
        );

        assert!(output.succeeded);
        assert_eq!(output.includes, vec!["lib.p"]);
        assert_eq!(program.machines.len(), 1);
        assert_eq!(program.states.len(), 1);
        assert_eq!(program.variables.len(), 1);
        let owners: Vec<_> = program.functions.values().map(|f| f.owner.is_some()).collect();
        assert_eq!(owners, vec![true, false]);
    }

    #[test]
    fn test_use_located_at_variable() {
        let (_, program) = parse("machine Main\nfun Main.f uses count\n");

        let body = &program.functions.values().next().unwrap().body;
        let span = body.span().unwrap();
        assert_eq!((span.start_line, span.start_col), (2, 17));
    }

    #[test]
    fn test_duplicate_event_is_error_but_parse_succeeds() {
        let (output, program) = parse("event e\nevent e\n");

        assert!(output.succeeded);
        assert_eq!(program.events.len(), 2);
        assert_eq!(output.flags.len(), 1);
        assert_eq!(output.flags[0].span.start_line, 2);
    }

    #[test]
    fn test_span_skips_partial_matches() {
        let (output, _) = parse("event e\nevent e\n");
        assert_eq!(output.flags[0].span.start_col, 7);
    }

    #[test]
    fn test_unknown_line_fails() {
        let (output, _) = parse("machine Main\nwhile true\n");

        assert!(!output.succeeded);
        assert_eq!(output.flags[0].message, "unexpected 'while true'");
    }

    #[test]
    fn test_unknown_owner_fails() {
        let (output, _) = parse("var Ghost.x\n");
        assert!(!output.succeeded);
    }
}
