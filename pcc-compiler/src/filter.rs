//! Removal of specification machines from programs compiled for execution.

use std::collections::HashSet;

use pcc_ir::{AggregateProgram, DeclRef, MachineId, StateId};

/// Drop every specification machine and everything it owns.
///
/// States, variables, machine functions, anonymous functions, transitions
/// and `do` handlers of a specification machine are removed along with it.
/// Annotations are removed when the annotated declaration belongs to a
/// specification machine. Types, enums, model types, events, global
/// functions and their annotations are kept. Declarations keep their ids
/// and relative order.
pub fn remove_spec_machines(program: AggregateProgram) -> AggregateProgram {
    let spec_machines: HashSet<MachineId> = program
        .machines
        .iter()
        .filter(|(_, m)| m.is_spec())
        .map(|(id, _)| *id)
        .collect();
    if spec_machines.is_empty() {
        return program;
    }

    let spec_states: HashSet<StateId> = program
        .states
        .iter()
        .filter(|(_, s)| spec_machines.contains(&s.owner))
        .map(|(id, _)| *id)
        .collect();
    let spec_owned = |decl: DeclRef| {
        program
            .owning_machine(decl)
            .is_some_and(|m| spec_machines.contains(&m))
    };
    let kept_annotations: HashSet<_> = program
        .annotations
        .iter()
        .filter(|(_, a)| !spec_owned(a.target))
        .map(|(id, _)| *id)
        .collect();

    let mut filtered = program.empty_like();
    let AggregateProgram {
        type_defs,
        enum_type_defs,
        model_types,
        events,
        machines,
        states,
        variables,
        transitions,
        functions,
        anon_functions,
        dos,
        annotations,
        ..
    } = program;

    filtered.type_defs = type_defs;
    filtered.enum_type_defs = enum_type_defs;
    filtered.model_types = model_types;
    filtered.events = events;
    filtered.machines = machines
        .into_iter()
        .filter(|(id, _)| !spec_machines.contains(id))
        .collect();
    filtered.states = states
        .into_iter()
        .filter(|(id, _)| !spec_states.contains(id))
        .collect();
    filtered.variables = variables
        .into_iter()
        .filter(|(_, v)| !spec_machines.contains(&v.owner))
        .collect();
    filtered.transitions = transitions
        .into_iter()
        .filter(|(_, t)| !spec_states.contains(&t.src))
        .collect();
    filtered.functions = functions
        .into_iter()
        .filter(|(_, f)| !f.owner.is_some_and(|m| spec_machines.contains(&m)))
        .collect();
    filtered.anon_functions = anon_functions
        .into_iter()
        .filter(|(_, f)| !f.owner.is_some_and(|m| spec_machines.contains(&m)))
        .collect();
    filtered.dos = dos
        .into_iter()
        .filter(|(_, d)| !spec_states.contains(&d.src))
        .collect();
    filtered.annotations = annotations
        .into_iter()
        .filter(|(id, _)| kept_annotations.contains(id))
        .collect();

    filtered
}
