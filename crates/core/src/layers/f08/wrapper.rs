use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use super::hooks::F08Hook;
use super::{render, tasks};
use crate::error::{Error, Result};
use crate::hooks::{Fragments, HookComposer};
use crate::layers::{BindingLayer, Template, WrapperOptions};
use crate::registry::TaskRegistry;
use crate::task::TaskRef;
use crate::types::{Binding, Layer, ProcedureDescriptor, Scope, Variable};
use crate::wrapper::Wrapper;

static MPI_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bP?MPI_\w+").expect("valid regex"));

/// Measurement wrapper of one procedure in the Fortran 2008 bindings.
#[derive(Debug)]
pub struct F08Wrapper {
    inner: Wrapper<F08Hook>,
    template: Template,
    guards: Vec<String>,
    group: String,
}

impl F08Wrapper {
    pub fn new(procedure: ProcedureDescriptor, options: &WrapperOptions) -> Result<Self> {
        let locals = Self::wrapper_locals(&procedure, &options.group);
        let mut inner = Wrapper::new(procedure, locals);
        if options.debug {
            inner.set_debug_formatter(render::debug_comment);
        }
        Ok(Self {
            inner,
            template: options.template,
            guards: options.guards.clone(),
            group: options.group.clone(),
        })
    }

    fn wrapper_locals(procedure: &ProcedureDescriptor, group: &str) -> Scope<Variable> {
        Scope::from_named([
            Variable::initialized(
                Binding::new("regionHandle", "integer(kind=SCOREP_InterimCommunicatorHandle)"),
                format!(
                    "scorep_mpi_regions(SCOREP_MPI_REGION__{})",
                    procedure.canonical_name.to_uppercase()
                ),
            ),
            Variable::initialized(
                Binding::new("event_gen_active", "logical"),
                "logical(scorep_mpi_is_event_gen_on())",
            ),
            Variable::initialized(
                Binding::new("event_gen_active_for_group", "logical"),
                render::event_gen_on_for(group),
            ),
            Variable::new(Binding::new("scorep_in_measurement_save", "integer(kind=c_int)")),
        ])
    }

    fn procedure(&self) -> &ProcedureDescriptor {
        self.inner.procedure()
    }

    fn generate_wrapper(&self) -> Result<Fragments> {
        let composer = self.inner.composer();
        let mut out = Fragments::new();

        composer.compose_with_post(
            F08Hook::Comment,
            &mut out,
            |out| {
                self.comment(out);
                Ok(())
            },
            Some(|out: &mut Fragments| {
                out.push("!>\n");
                Ok(())
            }),
        )?;
        self.guard_start(&mut out);
        self.procedure_start(&mut out);
        composer.compose(F08Hook::Use, &mut out, |out| {
            self.use_statements(out);
            Ok(())
        })?;
        out.push("\nimplicit none\n\n");
        self.declarations(&mut out);
        self.local_declarations(&mut out);
        out.push("call scorep_in_measurement_increment()\n");
        composer.compose(F08Hook::Initialization, &mut out, |out| {
            self.initialization(out);
            Ok(())
        })?;
        composer.compose(F08Hook::Body, &mut out, |out| self.body(&composer, out))?;
        composer.compose(F08Hook::Cleanup, &mut out, |out| {
            self.cleanup(out);
            Ok(())
        })?;
        out.push("call scorep_in_measurement_decrement()\n");
        out.push("end subroutine\n");
        out.push("#undef CHOICE_BUFFER_TYPE\n#endif\n");
        out.push("\n");
        Ok(out)
    }

    fn comment(&self, out: &mut Fragments) {
        let procedure = self.procedure();
        out.push(format!(
            "!>\n!> Measurement wrapper for {} in the Fortran 2008 bindings.\n!> @note Introduced in MPI {}\n",
            procedure.std_name, procedure.version
        ));
        if procedure.embiggened {
            out.push("!> @note Embiggened procedure\n");
        }
        out.push(format!("!> @ingroup {}\n", self.group));
    }

    fn guard_start(&self, out: &mut Fragments) {
        let procedure = self.procedure();
        out.push(format!("#if defined ({})", render::symbol_macro(procedure)));
        for guard in &self.guards {
            out.push(format!(" && !defined(SCOREP_MPI_NO_{})", guard.to_uppercase()));
        }
        out.push("\n");
        out.push(format!(
            "\n#if {}\n\
             #define CHOICE_BUFFER_TYPE type(*), dimension(..)\n\
             #else\n\
             #define CHOICE_BUFFER_TYPE type(*), dimension(*)\n\
             #endif\n",
            render::have(&render::choice_buffers_macro(procedure))
        ));
    }

    fn procedure_start(&self, out: &mut Fragments) {
        let procedure = self.procedure();
        let names: Vec<&str> = procedure.parameters.iter().map(|p| p.name()).collect();
        out.push(format!("subroutine {} (&\n", render::symbol_macro(procedure)));
        out.push(names.join(", &\n"));
        out.push(")\n\n");
    }

    /// Names imported from `mpi_f08`, deduplicated case-insensitively and
    /// sorted.
    fn mpi_f08_uses(&self) -> Vec<String> {
        let procedure = self.procedure();
        let mut uses: IndexMap<String, String> = IndexMap::new();
        let mut add = |name: &str| {
            uses.insert(name.to_lowercase(), name.to_string());
        };

        let mut sources: Vec<String> = Vec::new();
        sources.extend(procedure.parameters.iter().map(render::dummy_declaration));
        sources.extend(procedure.internal_parameters().map(render::internal_declaration));
        for local in self.inner.all_locals() {
            sources.push(render::variable_declaration(local));
            sources.extend(render::variable_initialization(local));
        }
        for source in &sources {
            for m in MPI_NAME.find_iter(source) {
                add(m.as_str());
            }
        }
        for task in self.inner.attached_tasks() {
            for name in task.ty.required_imports() {
                add(name);
            }
        }
        add(&format!("P{}", procedure.std_name));
        if self.template == Template::FakeFinalizationWrapper {
            for name in ["PMPI_Barrier", "MPI_COMM_WORLD", "MPI_SUCCESS"] {
                add(name);
            }
        }

        let mut names: Vec<String> = uses.into_values().collect();
        names.sort();
        names
    }

    fn use_statements(&self, out: &mut Fragments) {
        out.push("use :: scorep_mpi_f08\n");
        out.push("use :: mpi_f08, only: &\n");
        out.push(self.mpi_f08_uses().join(", &\n"));
        out.push("\n");
    }

    fn declarations(&self, out: &mut Fragments) {
        let procedure = self.procedure();
        out.push("! Dummy argument declarations\n");
        for parameter in &procedure.parameters {
            out.push(format!("{}\n", render::dummy_declaration(parameter)));
        }
        out.push("! Internal replacements for dummy arguments\n");
        for parameter in procedure.internal_parameters() {
            out.push(format!("{}\n", render::internal_declaration(parameter)));
        }
    }

    fn local_declarations(&self, out: &mut Fragments) {
        out.push("! Local variable declarations\n");
        for local in self.inner.all_locals() {
            out.push(format!("{}\n", render::variable_declaration(local)));
        }
        out.push("\n");
    }

    fn initialization(&self, out: &mut Fragments) {
        for local in self.inner.all_locals() {
            if let Some(init) = render::variable_initialization(local) {
                out.push(format!("{init}\n"));
            }
        }
        for parameter in &self.procedure().parameters {
            if let Some(init) = render::status_ignore_init(parameter) {
                out.push(init);
            }
        }
    }

    fn cleanup(&self, out: &mut Fragments) {
        for parameter in &self.procedure().parameters {
            if let Some(cleanup) = render::optional_out_cleanup(parameter) {
                out.push(cleanup);
            }
        }
    }

    fn body(&self, composer: &HookComposer<'_, F08Hook>, out: &mut Fragments) -> Result<()> {
        composer.compose(F08Hook::WrapperEnter, out, |out| self.wrapper_enter(composer, out))?;
        composer.compose(F08Hook::PrePmpiCall, out, |_| Ok(()))?;
        composer.compose(F08Hook::PmpiCall, out, |out| self.pmpi_call(out))?;
        composer.compose(F08Hook::PostPmpiCall, out, |_| Ok(()))?;
        composer.compose(F08Hook::WrapperExit, out, |out| self.wrapper_exit(composer, out))
    }

    fn wrapper_enter(&self, composer: &HookComposer<'_, F08Hook>, out: &mut Fragments) -> Result<()> {
        out.push("if (event_gen_active) then\n");
        composer.compose(F08Hook::EnterIfActive, out, |_| Ok(()))?;
        out.push("call scorep_mpi_event_gen_off()\nif (event_gen_active_for_group) then\n");
        composer.compose(F08Hook::EnterIfGroupActivePre, out, |_| Ok(()))?;
        out.push("call SCOREP_EnterWrappedRegion(regionHandle)\n");
        composer.compose(F08Hook::EnterIfGroupActive, out, |_| Ok(()))?;
        out.push("else if (scorep_is_unwinding_enabled) then\ncall SCOREP_EnterWrapper(regionHandle)\n");
        composer.compose(F08Hook::EnterIfUnwinding, out, |_| Ok(()))?;
        out.push("end if\nend if\n\n");
        Ok(())
    }

    fn pmpi_call(&self, out: &mut Fragments) -> Result<()> {
        let procedure = self.procedure();
        let save = "scorep_in_measurement_save";
        if self.template == Template::FakeFinalizationWrapper {
            let ierror = procedure.parameter("ierror").map_err(|_| {
                Error::Template(format!(
                    "The fake finalization of {} needs an 'ierror' parameter",
                    procedure.canonical_name
                ))
            })?;
            out.push(format!("call scorep_enter_wrapped_region( {save} )\n"));
            out.push("! Fake finalization\n");
            out.push(format!("call PMPI_Barrier(MPI_COMM_WORLD, {})\n", ierror.internal_name()));
            out.push(format!("call scorep_exit_wrapped_region( {save} )\n"));
            out.push(format!(
                "if ({} .eq. MPI_SUCCESS) then\nmpi_finalize_called = .true.\nend if\n",
                ierror.internal_name()
            ));
            return Ok(());
        }
        let args: Vec<String> = procedure.parameters.iter().map(|p| p.internal_name()).collect();
        out.push(format!("call scorep_enter_wrapped_region( {save} )\n"));
        out.push(format!("call P{}(&\n", procedure.std_name));
        out.push(args.join(",&\n"));
        out.push(")\n");
        out.push(format!("call scorep_exit_wrapped_region( {save} )\n\n"));
        Ok(())
    }

    fn wrapper_exit(&self, composer: &HookComposer<'_, F08Hook>, out: &mut Fragments) -> Result<()> {
        out.push("if (event_gen_active) then\n");
        composer.compose(F08Hook::ExitIfActive, out, |_| Ok(()))?;
        out.push("if (event_gen_active_for_group) then\n");
        composer.compose(F08Hook::ExitIfGroupActive, out, |_| Ok(()))?;
        out.push("call SCOREP_ExitRegion(regionHandle)\nelse if (scorep_is_unwinding_enabled) then\n");
        composer.compose(F08Hook::ExitIfUnwinding, out, |_| Ok(()))?;
        out.push("call SCOREP_ExitWrapper(regionHandle)\nend if\ncall scorep_mpi_event_gen_on()\nend if\n\n");
        Ok(())
    }
}

impl BindingLayer for F08Wrapper {
    type Hook = F08Hook;

    const LAYER: Layer = Layer::F08;

    fn registry() -> &'static TaskRegistry<F08Hook> {
        tasks::registry()
    }

    fn todo_task() -> TaskRef<F08Hook> {
        &tasks::TaskTodo
    }

    fn new_wrapper(procedure: ProcedureDescriptor, options: &WrapperOptions) -> Result<Self> {
        Self::new(procedure, options)
    }

    fn wrapper(&self) -> &Wrapper<F08Hook> {
        &self.inner
    }

    fn wrapper_mut(&mut self) -> &mut Wrapper<F08Hook> {
        &mut self.inner
    }

    fn generate(&self) -> Result<Fragments> {
        self.generate_wrapper()
    }

    fn placeholder(name: &str, reason: &str) -> String {
        render::comment_block(&format!("WARNING: No wrapper generated for {name}: {reason}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Attributes;
    use crate::types::{Direction, IgnoreHandling, Parameter, Version};
    use serde_json::json;

    fn param(name: &str, ty: &str) -> Parameter {
        Parameter::new(Binding::new(name, ty))
    }

    fn ierror() -> Parameter {
        let mut p = Parameter::new(Binding::new("ierror", "INTEGER").with_attribute("OPTIONAL"));
        p.direction = Direction::Out;
        p.internal_replacement = true;
        p
    }

    fn mpi_send() -> ProcedureDescriptor {
        let mut buf = Parameter::new(Binding::new("buf", "TYPE(*)").with_dim(".."));
        buf.buffer = true;
        ProcedureDescriptor::new("MPI_Send", Version::new(1, 0))
            .with_parameter(buf)
            .with_parameter(param("count", "INTEGER"))
            .with_parameter(param("datatype", "TYPE(MPI_Datatype)"))
            .with_parameter(param("dest", "INTEGER"))
            .with_parameter(param("tag", "INTEGER"))
            .with_parameter(param("comm", "TYPE(MPI_Comm)"))
            .with_parameter(ierror())
    }

    fn mpi_recv() -> ProcedureDescriptor {
        let mut buf = Parameter::new(Binding::new("buf", "TYPE(*)").with_dim(".."));
        buf.buffer = true;
        buf.direction = Direction::Out;
        let mut status = param("status", "TYPE(MPI_Status)");
        status.direction = Direction::Out;
        status.internal_replacement = true;
        status.ignore_handling = IgnoreHandling::Status;
        ProcedureDescriptor::new("MPI_Recv", Version::new(1, 0))
            .with_parameter(buf)
            .with_parameter(param("count", "INTEGER"))
            .with_parameter(param("datatype", "TYPE(MPI_Datatype)"))
            .with_parameter(param("source", "INTEGER"))
            .with_parameter(param("tag", "INTEGER"))
            .with_parameter(param("comm", "TYPE(MPI_Comm)"))
            .with_parameter(status)
            .with_parameter(ierror())
    }

    fn options() -> WrapperOptions {
        WrapperOptions {
            group: "p2p".to_string(),
            ..Default::default()
        }
    }

    fn generate(wrapper: &F08Wrapper) -> String {
        wrapper.generate().unwrap().concat()
    }

    #[test]
    fn test_default_wrapper_skeleton() {
        let mut w = F08Wrapper::new(mpi_send(), &options()).unwrap();
        w.attach(&tasks::TaskDefault, Attributes::new()).unwrap();
        let code = generate(&w);

        assert!(code.starts_with(
            "!>\n!> Measurement wrapper for MPI_Send in the Fortran 2008 bindings.\n\
             !> @note Introduced in MPI 1.0\n\
             !> @ingroup p2p\n\
             !> Default wrapper: Only enter and exit events are created.\n\
             !>\n\
             #if defined (SCOREP_F08_SYMBOL_NAME_MPI_SEND)\n\n\
             #if ( defined( HAVE_F08_TS_BUFFERS_MPI_SEND ) && HAVE_F08_TS_BUFFERS_MPI_SEND )\n"
        ));
        assert!(code.contains(
            "subroutine SCOREP_F08_SYMBOL_NAME_MPI_SEND (&\nbuf, &\ncount, &\ndatatype, &\ndest, &\ntag, &\ncomm, &\nierror)\n\n"
        ));
        assert!(code.contains(
            "use :: scorep_mpi_f08\nuse :: mpi_f08, only: &\nMPI_Comm, &\nMPI_Datatype, &\nPMPI_Send\n\nimplicit none\n\n"
        ));
        assert!(code.contains("CHOICE_BUFFER_TYPE, INTENT(IN) :: buf\n"));
        assert!(code.contains(
            "! Internal replacements for dummy arguments\nINTEGER :: internal_ierror\n! Local variable declarations\n"
        ));
        assert!(code.contains("regionHandle = scorep_mpi_regions(SCOREP_MPI_REGION__MPI_SEND)\n"));
        assert!(code.contains("integer(kind=c_int) :: scorep_in_measurement_save\n\ncall scorep_in_measurement_increment()\n"));
        assert!(code.contains(
            "call PMPI_Send(&\nbuf,&\ncount,&\ndatatype,&\ndest,&\ntag,&\ncomm,&\ninternal_ierror)\n"
        ));
        assert!(code.contains("if (present(ierror)) then\n    ierror = internal_ierror\nend if\n"));
        assert!(code.ends_with(
            "call scorep_in_measurement_decrement()\nend subroutine\n#undef CHOICE_BUFFER_TYPE\n#endif\n\n"
        ));
    }

    #[test]
    fn test_send_task_imports_and_emits() {
        let mut w = F08Wrapper::new(mpi_send(), &options()).unwrap();
        w.attach(&tasks::TaskSend, Attributes::new()).unwrap();
        let code = generate(&w);

        assert!(code.contains("MPI_PROC_NULL, &\n"));
        assert!(code.contains("PMPI_Send, &\nPMPI_Type_size\n"));
        assert!(code.contains("local_comm_handle = scorep_mpi_comm_handle(comm)\n"));
        let enter = code.find("call SCOREP_EnterWrappedRegion(regionHandle)\n").unwrap();
        let send = code
            .find("    call SCOREP_MpiSend(dest, local_comm_handle, tag, local_send_bytes)\n")
            .unwrap();
        assert!(enter < send);
    }

    #[test]
    fn test_recv_status_substitution() {
        let mut w = F08Wrapper::new(mpi_recv(), &options()).unwrap();
        w.attach(&tasks::TaskRecv, Attributes::new()).unwrap();
        let code = generate(&w);

        assert!(code.contains("TYPE(MPI_Status), INTENT(OUT), TARGET :: status\n"));
        assert!(code.contains("TYPE(MPI_Status), POINTER :: internal_status\n"));
        assert!(code.contains("if ( scorep_mpi_is_status_ignore(status) ) then\n"));
        assert!(code.contains("call pmpi_get_count(internal_status, datatype, local_recv_count)\n"));
        assert!(code.contains(
            "call SCOREP_MpiRecv(internal_status%MPI_SOURCE, local_comm_handle, internal_status%MPI_TAG, local_recv_bytes)\n"
        ));
        assert!(code.contains("internal_status,&\n"));
        assert!(code.contains("MPI_SOURCE, &\n"));
    }

    #[test]
    fn test_uses_are_deduplicated_case_insensitively() {
        let mut w = F08Wrapper::new(mpi_send(), &options()).unwrap();
        w.attach(&tasks::TaskSend, Attributes::new()).unwrap();
        let uses = w.mpi_f08_uses();
        let lowered: Vec<String> = uses.iter().map(|u| u.to_lowercase()).collect();
        let mut deduped = lowered.clone();
        deduped.dedup();
        assert_eq!(lowered.len(), deduped.len());
        let mut sorted = uses.clone();
        sorted.sort();
        assert_eq!(uses, sorted);
    }

    #[test]
    fn test_fake_finalization() {
        let finalize = ProcedureDescriptor::new("MPI_Finalize", Version::new(1, 0)).with_parameter(ierror());
        let opts = WrapperOptions {
            template: Template::FakeFinalizationWrapper,
            group: "env".to_string(),
            ..Default::default()
        };
        let w = F08Wrapper::new(finalize, &opts).unwrap();
        let code = generate(&w);
        assert!(code.contains(
            "! Fake finalization\ncall PMPI_Barrier(MPI_COMM_WORLD, internal_ierror)\n"
        ));
        assert!(code.contains("if (internal_ierror .eq. MPI_SUCCESS) then\nmpi_finalize_called = .true.\nend if\n"));
        assert!(code.contains("MPI_COMM_WORLD, &\nMPI_SUCCESS, &\nPMPI_Barrier, &\nPMPI_Finalize\n"));

        let bare = ProcedureDescriptor::new("MPI_Finalize", Version::new(1, 0));
        let w = F08Wrapper::new(bare, &opts).unwrap();
        assert!(matches!(w.generate().unwrap_err(), Error::Template(_)));
    }

    #[test]
    fn test_guards_and_embiggened() {
        let opts = WrapperOptions {
            guards: vec!["p2p".to_string()],
            ..options()
        };
        let mut p = mpi_send().embiggened();
        p.std_name = "MPI_Send_c".to_string();
        let w = F08Wrapper::new(p, &opts).unwrap();
        let code = generate(&w);
        assert!(code.contains("!> @note Embiggened procedure\n"));
        assert!(code.contains("#if defined (SCOREP_F08_SYMBOL_NAME_MPI_SEND_C) && !defined(SCOREP_MPI_NO_P2P)\n"));
        assert!(code.contains("call PMPI_Send_c(&\n"));
    }

    #[test]
    fn test_debug_comments() {
        let opts = WrapperOptions {
            debug: true,
            ..options()
        };
        let mut w = F08Wrapper::new(mpi_send(), &opts).unwrap();
        w.attach(&tasks::TaskTodo, Attributes::new().with("message", json!("check tags")))
            .unwrap();
        let code = generate(&w);
        assert!(code.contains("! Hook 'use' enter \n"));
        assert!(code.contains("!> TODO: check tags \n"));
    }

    #[test]
    fn test_placeholder() {
        assert_eq!(
            F08Wrapper::placeholder("MPI_Send", "no Fortran 2008 binding"),
            "! WARNING: No wrapper generated for MPI_Send: no Fortran 2008 binding\n"
        );
    }
}
