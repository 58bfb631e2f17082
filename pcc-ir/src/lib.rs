//! Aggregate program representation for the pcc compiler driver.
//!
//! The parser for each source file appends its declarations to one shared
//! [`AggregateProgram`]. Every declaration is stored under a typed id, and
//! items that live inside a machine refer back to their owner through those
//! ids.
//!
//! # Architecture
//!
//! ```text
//! source files → parser → AggregateProgram → model serializer → engine
//! ```

mod decls;
mod names;
mod program;
mod term;

pub use decls::{
    AnnotationDecl, AnnotationId, AnonFunDecl, AnonFunId, DeclRef, DoDecl, DoId, EnumElement,
    EnumTypeDef, EnumTypeDefId, EventDecl, EventId, FunDecl, FunId, MachineDecl, MachineId,
    MachineKind, ModelType, ModelTypeId, StateDecl, StateId, TransDecl, TransId, TypeDef,
    TypeDefId, VarDecl, VarId,
};
pub use names::{TopDecl, TopDeclNames};
pub use program::AggregateProgram;
pub use term::Term;
