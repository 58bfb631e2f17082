//! End-to-end compiles against the stub engine and the line parser.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use pcc_compiler::{
    CompileOptions, Compiler, PipelineState,
    testing::{LineParser, fixture_toolchain, stub_engine},
};
use pcc_core::{CollectedOutput, Severity};
use pcc_engine::{
    Conclusion, Fact, Locator, Model, ModuleRef, Proof, SupportCache,
    testing::{EngineCall, StubCheck, StubEngine},
};
use pcc_ir::Term;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    compiler: Compiler<StubEngine, LineParser>,
}

impl Fixture {
    fn new(files: &[(&str, &str)]) -> Self {
        Self::with_engine(files, stub_engine())
    }

    fn with_engine(files: &[(&str, &str)], engine: StubEngine) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).expect("Failed to write source");
        }
        let toolchain_dir = dir.path().join("toolchain");
        std::fs::create_dir_all(&toolchain_dir).expect("Failed to create toolchain dir");
        let toolchain = fixture_toolchain(&toolchain_dir).expect("Failed to write toolchain");

        let compiler = Compiler::new(engine, LineParser::new(), toolchain)
            .with_support_cache(Arc::new(SupportCache::new()));
        Self { dir, compiler }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn out_dir(&self) -> PathBuf {
        self.path("out")
    }

    fn options(&self) -> CompileOptions {
        CompileOptions::new()
            .with_output_dir(self.out_dir())
            .short_names()
    }

    fn compile(&mut self, file: &str, options: &CompileOptions) -> (bool, CollectedOutput) {
        let mut output = CollectedOutput::new();
        let input = self.path(file);
        let ok = self.compiler.compile(&input, &mut output, options);
        (ok, output)
    }

    fn generated_names(&self) -> Vec<String> {
        file_names(self.compiler.generated_files())
    }

    /// Programs the compiler tracks as installed, sorted.
    fn tracked(&self) -> Vec<pcc_core::ProgramName> {
        let mut programs: Vec<_> = self.compiler.installed().programs().cloned().collect();
        programs.sort();
        programs
    }

    /// Non-support programs the engine holds, sorted.
    fn engine_products(&self) -> Vec<pcc_core::ProgramName> {
        let mut programs: Vec<_> = self
            .compiler
            .engine()
            .installed()
            .into_iter()
            .filter(|p| !p.file_name().ends_with(".4ml"))
            .cloned()
            .collect();
        programs.sort();
        programs
    }

    fn output_program(&self, file: &str) -> pcc_core::ProgramName {
        pcc_core::ProgramName::new(self.out_dir().join(file)).unwrap()
    }
}

fn render_error(module: &str, domain: &str, message: &str) -> Model {
    let mut model = Model::new(module, ModuleRef::new(domain));
    model.push(Fact::new(Term::app("RenderError", vec![Term::str(message)])));
    model
}

fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}

fn files_in(dir: &Path, extension: &str) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == extension))
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names
}

#[test]
fn test_single_function_generates_one_implementation_file() {
    let mut fixture = Fixture::new(&[("main.p", "machine Main\nvar Main.x\nfun Main.step uses x\n")]);
    let options = fixture.options();

    let (ok, output) = fixture.compile("main.p", &options);

    assert!(ok, "{:?}", output.messages());
    assert_eq!(fixture.compiler.state(), PipelineState::Done);
    assert_eq!(fixture.generated_names(), vec!["main.c", "linker.c"]);
    let implementation = std::fs::read_to_string(fixture.out_dir().join("main.c")).unwrap();
    assert_eq!(implementation, "// functions: step\n");
    assert!(fixture.out_dir().join("main_p_LinkModel.model").is_file());
    insta::assert_snapshot!(output.lines(Severity::Info).join("\n"), @r"
    Writing main.c ...
    Writing linker.c ...
    ");
    assert!(output.lines(Severity::Error).is_empty());
}

#[test]
fn test_output_name_sets_generated_base_name() {
    let mut fixture = Fixture::new(&[("main.p", "machine Main\nfun Main.step\n")]);
    let options = fixture.options().with_output_name("pingpong");

    let (ok, _) = fixture.compile("main.p", &options);

    assert!(ok);
    assert_eq!(fixture.generated_names(), vec!["pingpong.c", "linker.c"]);
}

#[test]
fn test_undeclared_variable_reported_at_reference() {
    let mut fixture = Fixture::new(&[("main.p", "machine Main\nfun Main.step uses y\n")]);
    let options = fixture.options();

    let (ok, output) = fixture.compile("main.p", &options);

    assert!(!ok);
    assert_eq!(fixture.compiler.state(), PipelineState::Failed);
    insta::assert_snapshot!(output.lines(Severity::Error).join("\n"), @r"
    main.p(2,20,2,21): error PC1001: variable y is not declared
    Compilation failed
    ");
    assert!(fixture.generated_names().is_empty());
    assert!(files_in(&fixture.out_dir(), "c").is_empty());
}

#[test]
fn test_mutual_includes_merge_into_one_program() {
    let mut fixture = Fixture::new(&[
        ("a.p", "include b.p\nmachine A\nvar A.x\n"),
        ("b.p", "include \"a.p\"\nevent eFromB\n"),
    ]);
    let options = fixture.options().analyze_only();

    let (ok, output) = fixture.compile("a.p", &options);

    assert!(ok, "{:?}", output.messages());
    assert_eq!(file_names_of(fixture.compiler.parsed_files()), vec!["a.p", "b.p"]);
    assert_eq!(fixture.compiler.parser().parsed().len(), 2);
    let program = fixture.compiler.parsed_program().unwrap();
    assert_eq!(program.machines.len(), 1);
    assert_eq!(program.events.len(), 1);
}

fn file_names_of(names: &[pcc_core::ProgramName]) -> Vec<String> {
    names.iter().map(|n| n.file_name()).collect()
}

#[test]
fn test_compiling_twice_is_idempotent() {
    let mut fixture = Fixture::new(&[
        ("ok.p", "machine Main\nvar Main.x\nfun Main.step uses x\n"),
        ("bad.p", "machine Main\nfun Main.step uses y\n"),
    ]);
    let options = fixture.options();

    let installed = |fixture: &Fixture| {
        let mut programs: Vec<_> = fixture
            .compiler
            .engine()
            .installed()
            .into_iter()
            .cloned()
            .collect();
        programs.sort();
        programs
    };

    let (first_ok, first) = fixture.compile("ok.p", &options);
    let installed_after_first = installed(&fixture);
    let (second_ok, second) = fixture.compile("ok.p", &options);
    let installed_after_second = installed(&fixture);

    assert!(first_ok && second_ok);
    assert_eq!(first.messages(), second.messages());
    assert_eq!(installed_after_first, installed_after_second);

    let (_, bad_first) = fixture.compile("bad.p", &options);
    let (_, bad_second) = fixture.compile("bad.p", &options);
    assert_eq!(bad_first.messages(), bad_second.messages());
    let ok_root = pcc_core::ProgramName::new(fixture.path("ok.p")).unwrap();
    assert!(!fixture.compiler.engine().is_installed(&ok_root));
    assert_eq!(fixture.compiler.installed().programs().count(), 1);
}

#[test]
fn test_reset_uninstalls_previous_root() {
    let mut fixture = Fixture::new(&[("main.p", "machine Main\n")]);
    let options = fixture.options().analyze_only();

    fixture.compile("main.p", &options);
    fixture.compiler.engine_mut().clear_calls();
    let (ok, _) = fixture.compile("main.p", &options);

    assert!(ok);
    let calls = fixture.compiler.engine().calls();
    let root = pcc_core::ProgramName::new(fixture.path("main.p")).unwrap();
    assert_eq!(calls[0], EngineCall::Uninstall(vec![root.clone()]));
    assert_eq!(calls[1], EngineCall::Install(root));
}

#[test]
fn test_support_modules_installed_once() {
    let mut fixture = Fixture::new(&[("main.p", "machine Main\n")]);
    let options = fixture.options();

    fixture.compile("main.p", &options);
    fixture.compile("main.p", &options);

    let support_installs = fixture
        .compiler
        .engine()
        .calls()
        .iter()
        .filter(|call| matches!(call, EngineCall::Install(p) if p.file_name().ends_with(".4ml")))
        .count();
    // source domain, target domain, link transform, target transform
    assert_eq!(support_installs, 4);
}

#[test]
fn test_analyze_only_stops_after_check() {
    let mut fixture = Fixture::new(&[("main.p", "machine Main\nfun Main.step\n")]);
    let options = fixture.options().analyze_only();

    let (ok, _) = fixture.compile("main.p", &options);

    assert!(ok);
    assert_eq!(fixture.compiler.state(), PipelineState::Done);
    assert!(fixture.generated_names().is_empty());
    assert!(
        !fixture
            .compiler
            .engine()
            .calls()
            .iter()
            .any(|call| matches!(call, EngineCall::Apply(_)))
    );
}

#[test]
fn test_spec_machines_kept_only_in_test_mode() {
    let source = "machine Main\nspec machine Safety\nvar Safety.seen\n";
    let mut fixture = Fixture::new(&[("main.p", source)]);

    fixture.compile("main.p", &fixture.options().analyze_only());
    let program = fixture.compiler.parsed_program().unwrap();
    assert_eq!(program.machines.len(), 1);
    assert!(program.variables.is_empty());

    fixture.compile("main.p", &fixture.options().analyze_only().test_mode());
    let program = fixture.compiler.parsed_program().unwrap();
    assert_eq!(program.machines.len(), 2);
    assert_eq!(program.variables.len(), 1);
}

#[test]
fn test_duplicate_declarations_fail_check() {
    let mut fixture = Fixture::new(&[("main.p", "event e\nevent e\nmachine Main\n")]);
    let options = fixture.options();

    let (ok, output) = fixture.compile("main.p", &options);

    assert!(!ok);
    insta::assert_snapshot!(output.lines(Severity::Error).join("\n"), @r"
    main.p(2,7,2,8): error PC1001: 'e' is declared more than once
    Compilation failed
    ");
    assert!(fixture.generated_names().is_empty());
}

#[test]
fn test_parse_error_stops_before_install() {
    let mut fixture = Fixture::new(&[("main.p", "machine Main\nwhile true\n")]);
    let options = fixture.options();

    let (ok, output) = fixture.compile("main.p", &options);

    assert!(!ok);
    assert!(fixture.compiler.engine().calls().is_empty());
    assert!(fixture.compiler.parsed_program().is_none());
    insta::assert_snapshot!(output.lines(Severity::Error).join("\n"), @r"
    main.p(2,1,2,1): error PC1001: unexpected 'while true'
    Compilation failed
    ");
}

#[test]
fn test_missing_root_file_is_bad_file() {
    let mut fixture = Fixture::new(&[]);
    let options = fixture.options();

    let (ok, output) = fixture.compile("nope.p", &options);

    assert!(!ok);
    let errors = output.lines(Severity::Error);
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("nope.p : "), "{}", errors[0]);
    assert_eq!(errors[1], "Compilation failed");
}

#[test]
fn test_missing_include_is_bad_file() {
    let mut fixture = Fixture::new(&[("main.p", "include gone.p\nmachine Main\n")]);
    let options = fixture.options();

    let (ok, output) = fixture.compile("main.p", &options);

    assert!(!ok);
    assert!(output.lines(Severity::Error)[0].contains("gone.p : "));
}

#[test]
fn test_print_types_reports_inferred_types() {
    let engine = stub_engine().with_check(|model| {
        let span = model
            .facts_named("FunDecl")
            .next()
            .and_then(|f| f.term.span().cloned())
            .unwrap_or_default();
        StubCheck {
            conclusion: Conclusion::True,
            proofs: vec![Proof {
                rule_classes: Vec::new(),
                conclusion: Term::app(
                    "TypeOf",
                    vec![Term::id("step"), Term::id("expr"), Term::id("INT")],
                ),
                locators: vec![vec![Locator::new(span.clone()), Locator::new(span)]],
            }],
            flags: Vec::new(),
        }
    });
    let mut fixture = Fixture::with_engine(&[("main.p", "machine Main\nfun Main.step\n")], engine);
    let options = fixture.options().analyze_only().test_mode().print_types();

    let (ok, output) = fixture.compile("main.p", &options);

    assert!(ok);
    insta::assert_snapshot!(output.lines(Severity::Info).join("\n"), @"main.p (2, 5): inferred type: INT");
}

#[test]
fn test_emit_model_writes_serialized_program() {
    let mut fixture = Fixture::new(&[("main.p", "machine Main\n")]);
    let options = fixture.options().analyze_only().emit_model();

    let (ok, _) = fixture.compile("main.p", &options);

    assert!(ok);
    let model = std::fs::read_to_string(fixture.out_dir().join("main_p.model")).unwrap();
    assert!(model.contains("model main_p of P"), "{}", model);
    assert!(model.contains("machdecl__Main is MachineDecl(\"Main\", REAL, NIL)."));
}

#[test]
fn test_profile_reports_phase_timings() {
    let mut fixture = Fixture::new(&[("main.p", "machine Main\n")]);
    let options = fixture.options().analyze_only().profile();

    let (ok, output) = fixture.compile("main.p", &options);

    assert!(ok);
    let phases: Vec<_> = output
        .lines(Severity::Info)
        .into_iter()
        .filter_map(|line| line.split_once(": ").map(|(phase, _)| phase))
        .collect();
    assert_eq!(phases, vec!["parse", "install", "check"]);
}

#[test]
fn test_engine_that_does_not_start_is_fatal() {
    let engine = stub_engine().refusing("install");
    let mut fixture = Fixture::with_engine(&[("main.p", "machine Main\n")], engine);
    let options = fixture.options();

    let (ok, output) = fixture.compile("main.p", &options);

    assert!(!ok);
    insta::assert_snapshot!(output.lines(Severity::Error).join("\n"), @r"
    main.p(0,0,0,0): error PC1001: engine install failed: the engine did not start `install`
    Compilation failed
    ");
}

#[test]
fn test_missing_model_compiler_is_fatal() {
    let mut fixture = Fixture::new(&[("main.p", "machine Main\n")]);
    let options = fixture.options().test_mode().without_c_output();

    let (ok, output) = fixture.compile("main.p", &options);

    assert!(!ok);
    let errors = output.lines(Severity::Error);
    assert!(errors[0].starts_with("main.p (0, 0): Cannot find the model compiler at"));
    // the verification model is rendered before the compiler is looked up
    assert_eq!(fixture.generated_names(), vec!["main.zing"]);
}

#[cfg(unix)]
#[test]
fn test_verification_target_runs_model_compiler() {
    use std::os::unix::fs::PermissionsExt;

    fn install_compiler(path: &Path, script: &str) {
        std::fs::write(path, script).unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    let mut fixture = Fixture::new(&[("main.p", "machine Main\nspec machine Safety\n")]);
    let compiler_path = fixture.compiler.toolchain().model_compiler.clone();
    let args_path = fixture.path("zc.args");
    install_compiler(
        &compiler_path,
        &format!("#!/bin/sh\necho \"$@\" > '{}'\n", args_path.display()),
    );
    let options = fixture.options().test_mode();

    let (ok, output) = fixture.compile("main.p", &options);

    assert!(ok, "{:?}", output.messages());
    assert_eq!(fixture.compiler.state(), PipelineState::Done);
    assert_eq!(fixture.generated_names(), vec!["main.c", "linker.c", "main.zing"]);
    let zing = std::fs::read_to_string(fixture.out_dir().join("main.zing")).unwrap();
    insta::assert_snapshot!(zing.trim_end(), @r"
    // machines: Main, Safety
    // runtime 0
    // runtime 1
    // runtime 2
    ");
    let out = fixture.out_dir();
    let args = std::fs::read_to_string(&args_path).unwrap();
    assert_eq!(
        args.trim_end(),
        format!(
            "/nowarn:292 /out:{} {}",
            out.join("main.dll").display(),
            out.join("main.zing").display()
        )
    );
    assert!(
        output
            .lines(Severity::Info)
            .contains(&"Compiling main.zing to main.dll ...")
    );

    // the typed model is replaced, not installed twice
    let (ok, _) = fixture.compile("main.p", &options);
    assert!(ok);

    install_compiler(&compiler_path, "#!/bin/sh\necho 'zc: bad input'\nexit 1\n");
    let (ok, output) = fixture.compile("main.p", &options);
    assert!(!ok);
    insta::assert_snapshot!(output.lines(Severity::Error).join("\n"), @r"
    main.p (0, 0): The model compiler failed to compile the generated code
    zc: bad input
    Compilation failed
    ");
}

#[test]
fn test_failed_reset_keeps_previous_programs_tracked() {
    let mut fixture = Fixture::new(&[("main.p", "machine Main\nfun Main.step\n")]);
    let options = fixture.options();

    let (ok, _) = fixture.compile("main.p", &options);
    assert!(ok);

    fixture.compiler.engine_mut().set_refusing(Some("uninstall"));
    let (ok, output) = fixture.compile("main.p", &options);

    assert!(!ok);
    assert_eq!(fixture.compiler.state(), PipelineState::Failed);
    assert!(output.lines(Severity::Error)[0].contains("engine uninstall failed"));
    assert_eq!(fixture.tracked().len(), 1);
    assert_eq!(fixture.tracked(), fixture.engine_products());

    fixture.compiler.engine_mut().set_refusing(None);
    let (ok, output) = fixture.compile("main.p", &options);

    assert!(ok, "{:?}", output.messages());
    assert_eq!(fixture.tracked(), fixture.engine_products());
}

#[test]
fn test_render_program_left_installed_is_removed_by_next_compile() {
    let mut fixture = Fixture::new(&[("main.p", "machine Main\nfun Main.step\n")]);
    let options = fixture.options();

    fixture.compiler.engine_mut().set_refusing(Some("uninstall"));
    let (ok, _) = fixture.compile("main.p", &options);

    assert!(!ok);
    let c_program = fixture.output_program("main_p_CModel.model");
    assert!(fixture.compiler.engine().is_installed(&c_program));
    assert!(fixture.compiler.installed().contains(&c_program));
    assert_eq!(fixture.tracked(), fixture.engine_products());

    fixture.compiler.engine_mut().set_refusing(None);
    let (ok, output) = fixture.compile("main.p", &options);

    assert!(ok, "{:?}", output.messages());
    assert_eq!(fixture.generated_names(), vec!["main.c", "linker.c"]);
    assert!(!fixture.compiler.engine().is_installed(&c_program));
}

#[test]
fn test_link_failure_fails_compile_and_uninstalls_descriptor() {
    let engine = stub_engine().with_transform("PLink2C", |_: &[Model], _: &[Term]| {
        vec![render_error("CLinkModel", "C", "unit main is never started")]
    });
    let mut fixture = Fixture::with_engine(&[("main.p", "machine Main\nfun Main.step\n")], engine);
    let options = fixture.options();

    let (ok, output) = fixture.compile("main.p", &options);

    assert!(!ok);
    assert_eq!(fixture.compiler.state(), PipelineState::Failed);
    insta::assert_snapshot!(output.lines(Severity::Error).join("\n"), @r"
    main_p_CLinkModel.model(0,0,0,0): error PC1001: unit main is never started
    Compilation failed
    ");
    // the implementation is still written
    assert_eq!(fixture.generated_names(), vec!["main.c"]);

    let descriptor = fixture.output_program("main_p_LinkModel.model");
    assert!(!fixture.compiler.engine().is_installed(&descriptor));
    assert!(
        fixture
            .compiler
            .engine()
            .calls()
            .contains(&EngineCall::Uninstall(vec![descriptor]))
    );
    assert_eq!(fixture.tracked(), fixture.engine_products());
}

#[test]
fn test_c_render_failure_fails_compile() {
    let engine = stub_engine().with_transform("P2CProgram", |_: &[Model], _: &[Term]| {
        let mut link = Model::new("LinkModel", ModuleRef::new("PLink"));
        link.push(Fact::new(Term::app("LinkUnit", vec![Term::str("main")])));
        vec![render_error("CModel", "C", "cannot emit step"), link]
    });
    let mut fixture = Fixture::with_engine(&[("main.p", "machine Main\nfun Main.step\n")], engine);
    let options = fixture.options();

    let (ok, output) = fixture.compile("main.p", &options);

    assert!(!ok);
    insta::assert_snapshot!(output.lines(Severity::Error).join("\n"), @r"
    main_p_CModel.model(0,0,0,0): error PC1001: cannot emit step
    Compilation failed
    ");
    // linking still runs after the implementation fails to render
    assert_eq!(fixture.generated_names(), vec!["linker.c"]);
    assert!(!fixture.out_dir().join("main.c").exists());
}

#[test]
fn test_typed_model_keeps_root_aliases() {
    let mut fixture = Fixture::new(&[("main.p", "machine Main\n")]);
    let options = fixture.options().test_mode().without_c_output();

    fixture.compile("main.p", &options);

    let typed = fixture.output_program("main_p_WithTypes.model");
    let program = fixture.compiler.engine().program(&typed).unwrap();
    let aliases: Vec<_> = program.models[0]
        .facts
        .iter()
        .filter_map(|fact| fact.alias.as_deref())
        .collect();
    assert_eq!(aliases, vec!["machdecl__Main"]);
    assert!(fixture.compiler.installed().contains(&typed));
}
