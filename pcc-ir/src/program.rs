//! The aggregate program built from all parsed files.

use indexmap::IndexMap;

use crate::{
    AnnotationDecl, AnnotationId, AnonFunDecl, AnonFunId, DeclRef, DoDecl, DoId, EnumTypeDef,
    EnumTypeDefId, EventDecl, EventId, FunDecl, FunId, MachineDecl, MachineId, ModelType,
    ModelTypeId, StateDecl, StateId, TransDecl, TransId, TypeDef, TypeDefId, VarDecl, VarId,
};

/// All declarations of a compile, one ordered collection per category.
///
/// Collections keep insertion order. Ids are allocated from a single counter,
/// so they stay valid when a filtered copy drops some declarations.
#[derive(Debug, Clone, Default)]
pub struct AggregateProgram {
    pub type_defs: IndexMap<TypeDefId, TypeDef>,
    pub enum_type_defs: IndexMap<EnumTypeDefId, EnumTypeDef>,
    pub model_types: IndexMap<ModelTypeId, ModelType>,
    pub events: IndexMap<EventId, EventDecl>,
    pub machines: IndexMap<MachineId, MachineDecl>,
    pub states: IndexMap<StateId, StateDecl>,
    pub variables: IndexMap<VarId, VarDecl>,
    pub transitions: IndexMap<TransId, TransDecl>,
    pub functions: IndexMap<FunId, FunDecl>,
    pub anon_functions: IndexMap<AnonFunId, AnonFunDecl>,
    pub dos: IndexMap<DoId, DoDecl>,
    pub annotations: IndexMap<AnnotationId, AnnotationDecl>,
    next_id: u32,
}

impl AggregateProgram {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_type_def(&mut self, decl: TypeDef) -> TypeDefId {
        let id = TypeDefId(self.allocate());
        self.type_defs.insert(id, decl);
        id
    }

    pub fn add_enum_type_def(&mut self, decl: EnumTypeDef) -> EnumTypeDefId {
        let id = EnumTypeDefId(self.allocate());
        self.enum_type_defs.insert(id, decl);
        id
    }

    pub fn add_model_type(&mut self, decl: ModelType) -> ModelTypeId {
        let id = ModelTypeId(self.allocate());
        self.model_types.insert(id, decl);
        id
    }

    pub fn add_event(&mut self, decl: EventDecl) -> EventId {
        let id = EventId(self.allocate());
        self.events.insert(id, decl);
        id
    }

    pub fn add_machine(&mut self, decl: MachineDecl) -> MachineId {
        let id = MachineId(self.allocate());
        self.machines.insert(id, decl);
        id
    }

    pub fn add_state(&mut self, decl: StateDecl) -> StateId {
        let id = StateId(self.allocate());
        self.states.insert(id, decl);
        id
    }

    pub fn add_variable(&mut self, decl: VarDecl) -> VarId {
        let id = VarId(self.allocate());
        self.variables.insert(id, decl);
        id
    }

    pub fn add_transition(&mut self, decl: TransDecl) -> TransId {
        let id = TransId(self.allocate());
        self.transitions.insert(id, decl);
        id
    }

    pub fn add_function(&mut self, decl: FunDecl) -> FunId {
        let id = FunId(self.allocate());
        self.functions.insert(id, decl);
        id
    }

    pub fn add_anon_function(&mut self, decl: AnonFunDecl) -> AnonFunId {
        let id = AnonFunId(self.allocate());
        self.anon_functions.insert(id, decl);
        id
    }

    pub fn add_do(&mut self, decl: DoDecl) -> DoId {
        let id = DoId(self.allocate());
        self.dos.insert(id, decl);
        id
    }

    pub fn add_annotation(&mut self, decl: AnnotationDecl) -> AnnotationId {
        let id = AnnotationId(self.allocate());
        self.annotations.insert(id, decl);
        id
    }

    /// An empty program that continues this program's id sequence.
    pub fn empty_like(&self) -> Self {
        Self {
            next_id: self.next_id,
            ..Self::default()
        }
    }

    /// Find a machine by name.
    pub fn machine_named(&self, name: &str) -> Option<(MachineId, &MachineDecl)> {
        self.machines
            .iter()
            .find(|(_, m)| m.name == name)
            .map(|(id, m)| (*id, m))
    }

    /// The machine that owns a declaration, directly or through its source
    /// state. Returns `None` for top-level declarations, global functions and
    /// declarations whose owner is not part of this program.
    pub fn owning_machine(&self, decl: DeclRef) -> Option<MachineId> {
        match decl {
            DeclRef::Machine(id) => Some(id),
            DeclRef::State(id) => self.states.get(&id).map(|s| s.owner),
            DeclRef::Variable(id) => self.variables.get(&id).map(|v| v.owner),
            DeclRef::Function(id) => self.functions.get(&id).and_then(|f| f.owner),
            DeclRef::AnonFunction(id) => self.anon_functions.get(&id).and_then(|f| f.owner),
            DeclRef::Transition(id) => self
                .transitions
                .get(&id)
                .and_then(|t| self.owning_machine(DeclRef::State(t.src))),
            DeclRef::Do(id) => self
                .dos
                .get(&id)
                .and_then(|d| self.owning_machine(DeclRef::State(d.src))),
            DeclRef::Annotation(id) => self
                .annotations
                .get(&id)
                .and_then(|a| self.owning_machine(a.target)),
            DeclRef::TypeDef(_)
            | DeclRef::EnumTypeDef(_)
            | DeclRef::ModelType(_)
            | DeclRef::Event(_) => None,
        }
    }

    /// Total number of declarations across all categories.
    pub fn decl_count(&self) -> usize {
        self.type_defs.len()
            + self.enum_type_defs.len()
            + self.model_types.len()
            + self.events.len()
            + self.machines.len()
            + self.states.len()
            + self.variables.len()
            + self.transitions.len()
            + self.functions.len()
            + self.anon_functions.len()
            + self.dos.len()
            + self.annotations.len()
    }
}
