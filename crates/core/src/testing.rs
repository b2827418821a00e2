//! Fixtures shared by unit tests: a three-hook layer and a handful of task
//! types exercising each attachment rule.

use crate::error::Result;
use crate::hooks::{Fragments, Hook};
use crate::task::{TaskContext, TaskRef, TaskSetup, TaskType};
use crate::types::{Binding, Parameter, ProcedureDescriptor, Scope, Variable, Version};
use crate::wrapper::Wrapper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestHook {
    Enter,
    Call,
    Exit,
}

impl Hook for TestHook {
    fn name(self) -> &'static str {
        match self {
            TestHook::Enter => "enter",
            TestHook::Call => "call",
            TestHook::Exit => "exit",
        }
    }

    fn all() -> &'static [Self] {
        &[TestHook::Enter, TestHook::Call, TestHook::Exit]
    }
}

pub fn procedure() -> ProcedureDescriptor {
    ProcedureDescriptor::new("MPI_Send", Version::new(1, 0))
        .with_return_type("int")
        .with_parameter(Parameter::new(Binding::new("dest", "int")))
        .with_parameter(Parameter::new(Binding::new("tag", "int")))
        .with_parameter(Parameter::new(Binding::new("comm", "MPI_Comm")))
}

pub fn wrapper() -> Wrapper<TestHook> {
    let locals = Scope::from_named([Variable::initialized(Binding::new("return_value", "int"), "0")]);
    Wrapper::new(procedure(), locals)
}

/// Runs the three hooks with `default_<hook>` bodies, one fragment each.
pub fn generate(wrapper: &Wrapper<TestHook>) -> Result<Vec<Vec<String>>> {
    let composer = wrapper.composer();
    let mut sections = Vec::new();
    for hook in TestHook::all() {
        let mut out = Fragments::new();
        composer.compose(*hook, &mut out, |out| {
            out.push(format!("default_{}", hook.name()));
            Ok(())
        })?;
        sections.push(out.iter().map(str::to_string).collect());
    }
    Ok(sections)
}

pub fn names(wrapper: &Wrapper<TestHook>) -> Vec<&'static str> {
    wrapper.attached_tasks().iter().map(|t| t.name()).collect()
}

pub struct TaskA;

impl TaskType<TestHook> for TaskA {
    fn name(&self) -> &'static str {
        "TaskA"
    }

    fn hooks(&self) -> &'static [TestHook] {
        &[TestHook::Enter]
    }

    fn emit(&self, _hook: TestHook, _cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push("A");
        Ok(())
    }
}

pub struct TaskB;

impl TaskType<TestHook> for TaskB {
    fn name(&self) -> &'static str {
        "TaskB"
    }

    fn dependencies(&self) -> &'static [TaskRef<TestHook>] {
        const DEPS: &[TaskRef<TestHook>] = &[&TaskA];
        DEPS
    }

    fn hooks(&self) -> &'static [TestHook] {
        &[TestHook::Enter, TestHook::Exit]
    }

    fn emit(&self, hook: TestHook, _cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        match hook {
            TestHook::Enter => out.push("B"),
            _ => out.push("B2"),
        }
        Ok(())
    }
}

/// Auxiliary, declares `local_comm_handle` from the `comm` parameter.
pub struct AuxComm;

impl TaskType<TestHook> for AuxComm {
    fn name(&self) -> &'static str {
        "AuxComm"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("comm")?.build())
    }

    fn needs_local_variables(&self, cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([Variable::initialized(
            Binding::new("local_comm_handle", "int"),
            format!("HANDLE({})", cx.param("comm")?),
        )]))
    }
}

/// Auxiliary, declares `local_bytes`.
pub struct AuxBytes;

impl TaskType<TestHook> for AuxBytes {
    fn name(&self) -> &'static str {
        "AuxBytes"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([Variable::initialized(
            Binding::new("local_bytes", "uint64_t"),
            "0",
        )]))
    }
}

/// Depends on both auxiliaries.
pub struct SendLike;

impl TaskType<TestHook> for SendLike {
    fn name(&self) -> &'static str {
        "SendLike"
    }

    fn dependencies(&self) -> &'static [TaskRef<TestHook>] {
        const DEPS: &[TaskRef<TestHook>] = &[&AuxComm, &AuxBytes];
        DEPS
    }

    fn hooks(&self) -> &'static [TestHook] {
        &[TestHook::Enter]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .param("dest")?
            .any_of("sendtag", &["sendtag", "tag"])?
            .build())
    }

    fn emit(&self, _hook: TestHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push(format!(
            "send({}, {}, {}, {})",
            cx.param("dest")?,
            cx.local("local_comm_handle")?,
            cx.param("sendtag")?,
            cx.local("local_bytes")?
        ));
        Ok(())
    }
}

/// Shares the `AuxComm` auxiliary with [`SendLike`].
pub struct RecvLike;

impl TaskType<TestHook> for RecvLike {
    fn name(&self) -> &'static str {
        "RecvLike"
    }

    fn dependencies(&self) -> &'static [TaskRef<TestHook>] {
        const DEPS: &[TaskRef<TestHook>] = &[&AuxComm];
        DEPS
    }
}

/// Conflicts with [`TaskA`], but not the other way round.
pub struct Exclusive;

impl TaskType<TestHook> for Exclusive {
    fn name(&self) -> &'static str {
        "Exclusive"
    }

    fn has_conflict_with(&self, other: &dyn TaskType<TestHook>) -> bool {
        other.name() == "TaskA"
    }
}

pub struct Note;

impl TaskType<TestHook> for Note {
    fn name(&self) -> &'static str {
        "Note"
    }

    fn allow_multiple_instances(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [TestHook] {
        &[TestHook::Call]
    }

    fn emit(&self, _hook: TestHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let text: String = cx.attributes().get_or("text", "note".to_string())?;
        out.push(text);
        Ok(())
    }
}

/// Auxiliary with a regular dependency, which is never allowed.
pub struct BrokenAux;

impl TaskType<TestHook> for BrokenAux {
    fn name(&self) -> &'static str {
        "BrokenAux"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn dependencies(&self) -> &'static [TaskRef<TestHook>] {
        const DEPS: &[TaskRef<TestHook>] = &[&TaskA];
        DEPS
    }
}

pub struct UsesBroken;

impl TaskType<TestHook> for UsesBroken {
    fn name(&self) -> &'static str {
        "UsesBroken"
    }

    fn dependencies(&self) -> &'static [TaskRef<TestHook>] {
        const DEPS: &[TaskRef<TestHook>] = &[&TaskA, &BrokenAux];
        DEPS
    }
}

/// Subtype of [`TaskA`].
pub struct TaskASub;

impl TaskType<TestHook> for TaskASub {
    fn name(&self) -> &'static str {
        "TaskASub"
    }

    fn parent(&self) -> Option<TaskRef<TestHook>> {
        Some(&TaskA)
    }
}

/// Requires a parameter the test procedure does not have.
pub struct NeedsSource;

impl TaskType<TestHook> for NeedsSource {
    fn name(&self) -> &'static str {
        "NeedsSource"
    }

    fn dependencies(&self) -> &'static [TaskRef<TestHook>] {
        const DEPS: &[TaskRef<TestHook>] = &[&AuxBytes];
        DEPS
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("source")?.build())
    }
}

/// Declares `local_bytes` without depending on [`AuxBytes`].
pub struct StealsBytes;

impl TaskType<TestHook> for StealsBytes {
    fn name(&self) -> &'static str {
        "StealsBytes"
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([Variable::new(Binding::new("local_bytes", "int"))]))
    }
}

/// Redeclares `local_bytes` of its dependency.
pub struct RefinesBytes;

impl TaskType<TestHook> for RefinesBytes {
    fn name(&self) -> &'static str {
        "RefinesBytes"
    }

    fn dependencies(&self) -> &'static [TaskRef<TestHook>] {
        const DEPS: &[TaskRef<TestHook>] = &[&AuxBytes];
        DEPS
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([Variable::initialized(
            Binding::new("local_bytes", "uint64_t"),
            "1",
        )]))
    }
}

/// Declares a local clashing with the wrapper's own `return_value`.
pub struct ShadowsReturn;

impl TaskType<TestHook> for ShadowsReturn {
    fn name(&self) -> &'static str {
        "ShadowsReturn"
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([Variable::new(Binding::new("return_value", "int"))]))
    }
}

fn handle_local() -> Result<Scope<Variable>> {
    Ok(Scope::from_named([Variable::new(Binding::new("local_handle", "int"))]))
}

/// Declares `local_handle`.
pub struct HandleBase;

impl TaskType<TestHook> for HandleBase {
    fn name(&self) -> &'static str {
        "HandleBase"
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        handle_local()
    }
}

/// Subtype of [`HandleBase`] declaring the same local.
pub struct HandleSub;

impl TaskType<TestHook> for HandleSub {
    fn name(&self) -> &'static str {
        "HandleSub"
    }

    fn parent(&self) -> Option<TaskRef<TestHook>> {
        Some(&HandleBase)
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        handle_local()
    }
}

/// Depends on [`HandleBase`] and redeclares its `local_handle`.
pub struct UsesHandle;

impl TaskType<TestHook> for UsesHandle {
    fn name(&self) -> &'static str {
        "UsesHandle"
    }

    fn dependencies(&self) -> &'static [TaskRef<TestHook>] {
        const DEPS: &[TaskRef<TestHook>] = &[&HandleBase];
        DEPS
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        handle_local()
    }
}
