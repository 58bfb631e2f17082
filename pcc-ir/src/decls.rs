//! Declaration types stored in the aggregate program.

use pcc_core::Span;

use crate::Term;

macro_rules! decl_ids {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
            pub struct $name(pub(crate) u32);

            impl $name {
                /// The raw id, unique across all declaration categories of one program.
                pub fn index(self) -> u32 {
                    self.0
                }
            }
        )*
    };
}

decl_ids!(
    /// Id of a [`TypeDef`].
    TypeDefId,
    /// Id of an [`EnumTypeDef`].
    EnumTypeDefId,
    /// Id of a [`ModelType`].
    ModelTypeId,
    /// Id of an [`EventDecl`].
    EventId,
    /// Id of a [`MachineDecl`].
    MachineId,
    /// Id of a [`StateDecl`].
    StateId,
    /// Id of a [`VarDecl`].
    VarId,
    /// Id of a [`TransDecl`].
    TransId,
    /// Id of a [`FunDecl`].
    FunId,
    /// Id of an [`AnonFunDecl`].
    AnonFunId,
    /// Id of a [`DoDecl`].
    DoId,
    /// Id of an [`AnnotationDecl`].
    AnnotationId,
);

/// A reference to any declaration in the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeclRef {
    TypeDef(TypeDefId),
    EnumTypeDef(EnumTypeDefId),
    ModelType(ModelTypeId),
    Event(EventId),
    Machine(MachineId),
    State(StateId),
    Variable(VarId),
    Transition(TransId),
    Function(FunId),
    AnonFunction(AnonFunId),
    Do(DoId),
    Annotation(AnnotationId),
}

/// How a machine participates in the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineKind {
    /// An implementation machine.
    Real,
    /// A model machine standing in for an environment component.
    Model,
    /// A specification/monitor machine, only meaningful to verification.
    Spec,
}

impl MachineKind {
    /// The constant used for this kind in the engine model.
    pub fn constant(self) -> &'static str {
        match self {
            MachineKind::Real => "REAL",
            MachineKind::Model => "MODEL",
            MachineKind::Spec => "SPEC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub ty: Term,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumElement {
    pub name: String,
    pub value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumTypeDef {
    pub name: String,
    pub elements: Vec<EnumElement>,
    pub span: Span,
}

/// A model-level (foreign) type declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelType {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDecl {
    pub name: String,
    /// Optional bound on queued instances.
    pub card: Option<Term>,
    pub payload: Option<Term>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MachineDecl {
    pub name: String,
    pub kind: MachineKind,
    pub card: Option<Term>,
    pub span: Span,
}

impl MachineDecl {
    pub fn is_spec(&self) -> bool {
        self.kind == MachineKind::Spec
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateDecl {
    /// Qualified state path, outermost group first (e.g. `["Group", "Init"]`).
    pub name: Vec<String>,
    pub owner: MachineId,
    pub entry: Option<Term>,
    pub exit: Option<Term>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub owner: MachineId,
    pub ty: Term,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransDecl {
    pub src: StateId,
    pub trigger: String,
    pub dst: StateId,
    pub action: Option<Term>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub name: String,
    /// The owning machine; `None` for global functions.
    pub owner: Option<MachineId>,
    pub params: Vec<(String, Term)>,
    pub ret: Option<Term>,
    pub body: Term,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnonFunDecl {
    pub owner: Option<MachineId>,
    pub body: Term,
    pub span: Span,
}

/// A `do` handler: an action run in a state when an event arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct DoDecl {
    pub src: StateId,
    pub trigger: String,
    pub action: Term,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDecl {
    pub target: DeclRef,
    pub key: String,
    pub value: Term,
    pub span: Span,
}
