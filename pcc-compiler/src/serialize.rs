//! Serialization of the aggregate program into the engine's model form.

use pcc_ir::{AggregateProgram, DeclRef, Term};
use pcc_engine::{Fact, Model, ModuleRef};

use crate::alias::AliasMap;

const NIL: &str = "NIL";

fn opt(term: &Option<Term>) -> Term {
    term.clone().unwrap_or_else(|| Term::id(NIL))
}

fn list(functor: &str, items: impl IntoIterator<Item = Term>) -> Term {
    Term::app(functor, items.into_iter().collect())
}

/// Builds the root model of a program.
///
/// Machines, events, variables, functions, anonymous functions and states
/// are bound to their aliases; every other declaration refers to them
/// through those aliases.
pub struct ModelSerializer<'a> {
    program: &'a AggregateProgram,
    aliases: AliasMap,
}

impl<'a> ModelSerializer<'a> {
    pub fn new(program: &'a AggregateProgram) -> Self {
        Self {
            program,
            aliases: AliasMap::for_program(program),
        }
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    fn reference(&self, decl: DeclRef) -> Term {
        self.aliases
            .get(decl)
            .map_or_else(|| Term::id(NIL), Term::id)
    }

    fn bind(&self, decl: DeclRef, term: Term) -> Fact {
        match self.aliases.get(decl) {
            Some(alias) => Fact::aliased(alias, term),
            None => Fact::new(term),
        }
    }

    /// Serialize into a model called `name` over `domain`.
    pub fn to_model(&self, name: &str, domain: ModuleRef) -> Model {
        let program = self.program;
        let mut model = Model::new(name, domain);

        for decl in program.type_defs.values() {
            model.push(Fact::new(
                Term::app("TypeDef", vec![Term::str(&decl.name), decl.ty.clone()])
                    .at(decl.span.clone()),
            ));
        }
        for decl in program.enum_type_defs.values() {
            let names = list(
                "StringList",
                decl.elements.iter().map(|e| Term::str(&e.name)),
            );
            let values = list(
                "IntegerList",
                decl.elements
                    .iter()
                    .map(|e| e.value.map_or_else(|| Term::id(NIL), Term::Int)),
            );
            model.push(Fact::new(
                Term::app("EnumTypeDef", vec![Term::str(&decl.name), names, values])
                    .at(decl.span.clone()),
            ));
        }
        for decl in program.model_types.values() {
            model.push(Fact::new(
                Term::app("ModelType", vec![Term::str(&decl.name)]).at(decl.span.clone()),
            ));
        }
        for (id, decl) in &program.events {
            let term = Term::app(
                "EventDecl",
                vec![Term::str(&decl.name), opt(&decl.card), opt(&decl.payload)],
            );
            model.push(self.bind(DeclRef::Event(*id), term.at(decl.span.clone())));
        }
        for (id, decl) in &program.machines {
            let term = Term::app(
                "MachineDecl",
                vec![
                    Term::str(&decl.name),
                    Term::id(decl.kind.constant()),
                    opt(&decl.card),
                ],
            );
            model.push(self.bind(DeclRef::Machine(*id), term.at(decl.span.clone())));
        }
        for (id, decl) in &program.variables {
            let term = Term::app(
                "VarDecl",
                vec![
                    Term::str(&decl.name),
                    self.reference(DeclRef::Machine(decl.owner)),
                    decl.ty.clone(),
                ],
            );
            model.push(self.bind(DeclRef::Variable(*id), term.at(decl.span.clone())));
        }
        for (id, decl) in &program.functions {
            let params = list(
                "Params",
                decl.params
                    .iter()
                    .map(|(name, ty)| Term::app("Param", vec![Term::str(name), ty.clone()])),
            );
            let owner = decl
                .owner
                .map_or_else(|| Term::id(NIL), |m| self.reference(DeclRef::Machine(m)));
            let term = Term::app(
                "FunDecl",
                vec![
                    Term::str(&decl.name),
                    owner,
                    params,
                    opt(&decl.ret),
                    decl.body.clone(),
                ],
            );
            model.push(self.bind(DeclRef::Function(*id), term.at(decl.span.clone())));
        }
        for (id, decl) in &program.anon_functions {
            let owner = decl
                .owner
                .map_or_else(|| Term::id(NIL), |m| self.reference(DeclRef::Machine(m)));
            let term = Term::app("AnonFunDecl", vec![owner, decl.body.clone()]);
            model.push(self.bind(DeclRef::AnonFunction(*id), term.at(decl.span.clone())));
        }
        for (id, decl) in &program.states {
            let name = list("QualifiedName", decl.name.iter().map(Term::str));
            let term = Term::app(
                "StateDecl",
                vec![
                    name,
                    self.reference(DeclRef::Machine(decl.owner)),
                    opt(&decl.entry),
                    opt(&decl.exit),
                ],
            );
            model.push(self.bind(DeclRef::State(*id), term.at(decl.span.clone())));
        }
        for decl in program.transitions.values() {
            let term = Term::app(
                "TransDecl",
                vec![
                    self.reference(DeclRef::State(decl.src)),
                    Term::str(&decl.trigger),
                    self.reference(DeclRef::State(decl.dst)),
                    opt(&decl.action),
                ],
            );
            model.push(Fact::new(term.at(decl.span.clone())));
        }
        for decl in program.dos.values() {
            let term = Term::app(
                "DoDecl",
                vec![
                    self.reference(DeclRef::State(decl.src)),
                    Term::str(&decl.trigger),
                    decl.action.clone(),
                ],
            );
            model.push(Fact::new(term.at(decl.span.clone())));
        }
        for decl in program.annotations.values() {
            let term = Term::app(
                "Annotation",
                vec![
                    self.reference(decl.target),
                    Term::str(&decl.key),
                    decl.value.clone(),
                ],
            );
            model.push(Fact::new(term.at(decl.span.clone())));
        }

        model
    }
}
