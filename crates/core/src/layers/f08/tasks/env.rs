//! Environment management: initialization and finalization of the library

use crate::error::Result;
use crate::hooks::Fragments;
use crate::layers::f08::{F08Hook, render};
use crate::task::{TaskContext, TaskRef, TaskSetup, TaskType};
use crate::types::{Binding, Scope, Variable};

/// Makes `mpi_finalize_called` visible to the wrapper.
pub struct TaskUseEnvGlobals;

impl TaskType<F08Hook> for TaskUseEnvGlobals {
    fn name(&self) -> &'static str {
        "TaskUseEnvGlobals"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::Use]
    }

    fn emit(&self, _hook: F08Hook, _cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push("use :: SCOREP_MPI_Env_globals, only : mpi_finalize_called\n");
        Ok(())
    }
}

fn world_and_self(action: &str, kind: &str) -> String {
    format!(
        "call SCOREP_{action}( SCOREP_MPI_COMM_HANDLE( MPI_COMM_WORLD ) )\n\
         call SCOREP_{action}( SCOREP_MPI_COMM_HANDLE( MPI_COMM_SELF ) )\n\
         call SCOREP_MpiCollectiveEnd( SCOREP_MPI_COMM_HANDLE( MPI_COMM_WORLD ), &\n\
         \x20                             SCOREP_INVALID_ROOT_RANK, &\n\
         \x20                             SCOREP_COLLECTIVE_{kind}_HANDLE, &\n\
         \x20                             0_c_int64_t, &\n\
         \x20                             0_c_int64_t )\n"
    )
}

pub struct TaskCommCreateWorldSelf;

impl TaskType<F08Hook> for TaskCommCreateWorldSelf {
    fn name(&self) -> &'static str {
        "TaskCommCreateWorldSelf"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::EnterIfGroupActive, F08Hook::ExitIfGroupActive]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_COMM_WORLD", "MPI_COMM_SELF"]
    }

    fn emit(&self, hook: F08Hook, _cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        match hook {
            F08Hook::EnterIfGroupActive => out.push("call SCOREP_MpiCollectiveBegin()\n"),
            _ => out.push(world_and_self("CommCreate", "CREATE")),
        }
        Ok(())
    }
}

pub struct TaskCommDestroyWorldSelf;

impl TaskType<F08Hook> for TaskCommDestroyWorldSelf {
    fn name(&self) -> &'static str {
        "TaskCommDestroyWorldSelf"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::EnterIfGroupActive, F08Hook::ExitIfGroupActive]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_COMM_WORLD", "MPI_COMM_SELF"]
    }

    fn emit(&self, hook: F08Hook, _cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        match hook {
            F08Hook::EnterIfGroupActive => out.push("call SCOREP_MpiCollectiveBegin()\n"),
            _ => out.push(world_and_self("CommDestroy", "DESTROY")),
        }
        Ok(())
    }
}

/// Initializes the measurement before the call and its MPI part after a
/// successful one.
pub struct TaskInitialize;

impl TaskInitialize {
    fn thread_level_checks(required: &str, provided: &str) -> String {
        format!(
            "if (({required} .gt. MPI_THREAD_FUNNELED) .and. ({provided} .gt. MPI_THREAD_FUNNELED)) then\n\
             {}\
             end if\n\
             if (({required} .eq. MPI_THREAD_FUNNELED) .and. ({provided} .ge. MPI_THREAD_FUNNELED) &\n\
             .and. (SCOREP_Location_GetId(SCOREP_Location_GetCurrentCPULocation()) .ne. 0)) then\n\
             {}\
             end if\n",
            render::warning(
                "MPI environment initialization request and provided level exceed MPI_THREAD_FUNNELED!"
            ),
            render::warning("MPI environment initialization with MPI_THREAD_FUNNELED not on master thread!"),
        )
    }
}

impl TaskType<F08Hook> for TaskInitialize {
    fn name(&self) -> &'static str {
        "TaskInitialize"
    }

    fn dependencies(&self) -> &'static [TaskRef<F08Hook>] {
        const DEPS: &[TaskRef<F08Hook>] = &[&TaskUseEnvGlobals, &TaskCommCreateWorldSelf];
        DEPS
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::Initialization, F08Hook::PostPmpiCall]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_SUCCESS", "MPI_THREAD_FUNNELED", "PMPI_Initialized", "PMPI_Finalized"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("ierror")?.build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([
            Variable::initialized(Binding::new("fflag", "logical"), ".false."),
            Variable::initialized(Binding::new("iflag", "logical"), ".false."),
            Variable::new(Binding::new("local_ierror", "integer")),
        ]))
    }

    fn emit(&self, hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        if hook == F08Hook::Initialization {
            out.push(format!(
                "mpi_finalize_called =.false.\nif {}  then\ncall SCOREP_InitMeasurement()\nend if\n",
                render::measurement_phase("PRE")
            ));
            return Ok(());
        }

        out.push(format!("if ({} .eq. MPI_SUCCESS) then\n", cx.param("ierror")?));
        let procedure = cx.procedure();
        if procedure.has_parameter("required") && procedure.has_parameter("provided") {
            out.push(Self::thread_level_checks(
                &cx.internal_name("required")?,
                &cx.internal_name("provided")?,
            ));
        }
        let (iflag, fflag, ierror) = (cx.local("iflag")?, cx.local("fflag")?, cx.local("local_ierror")?);
        out.push(format!(
            "call PMPI_Initialized({iflag}, {ierror})\n\
             if ( {iflag} .and. {ierror} .eq. MPI_SUCCESS ) then\n    \
             call PMPI_Finalized( {fflag}, {ierror} )\n    \
             if ( .not. {fflag} .and. {ierror} .eq. MPI_SUCCESS ) then\n        \
             call SCOREP_InitMppMeasurement()\n    \
             end if\n\
             end if\n"
        ));
        out.push("end if\n");
        Ok(())
    }
}

pub struct TaskFinalize;

impl TaskType<F08Hook> for TaskFinalize {
    fn name(&self) -> &'static str {
        "TaskFinalize"
    }

    fn dependencies(&self) -> &'static [TaskRef<F08Hook>] {
        const DEPS: &[TaskRef<F08Hook>] = &[&TaskUseEnvGlobals, &TaskCommDestroyWorldSelf];
        DEPS
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::PrePmpiCall]
    }

    fn emit(&self, _hook: F08Hook, _cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push(render::comment_block(
            "Be so kind and name the MPI_COMM_WORLD communicator\nif the user didn't do so already",
        ));
        out.push("call scorep_mpi_comm_set_default_names()\n");
        out.push(render::comment_block(
            "Finalize event handling\nWe need to make sure that our exit handler is called before the MPI handler",
        ));
        out.push("call SCOREP_RegisterExitHandler()\n");
        Ok(())
    }
}

/// Reports the library as finalized once the measurement finalized it.
pub struct TaskCheckFinalized;

impl TaskType<F08Hook> for TaskCheckFinalized {
    fn name(&self) -> &'static str {
        "TaskCheckFinalized"
    }

    fn dependencies(&self) -> &'static [TaskRef<F08Hook>] {
        const DEPS: &[TaskRef<F08Hook>] = &[&TaskUseEnvGlobals];
        DEPS
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::PostPmpiCall]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_SUCCESS"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("flag")?.param("ierror")?.build())
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push(format!(
            "if ( {} .eq. MPI_SUCCESS .and. mpi_finalize_called ) then\n    {} = .true.\nend if\n",
            cx.param("ierror")?,
            cx.param("flag")?
        ));
        Ok(())
    }
}

pub struct TaskDisableEventsOutsideMeasurement;

impl TaskType<F08Hook> for TaskDisableEventsOutsideMeasurement {
    fn name(&self) -> &'static str {
        "TaskDisableEventsOutsideMeasurement"
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::Comment, F08Hook::Initialization]
    }

    fn emit(&self, hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        match hook {
            F08Hook::Comment => out.push("!> Events are only recorded inside the measurement phase.\n"),
            _ => {
                let active = cx.local("event_gen_active")?;
                out.push(format!(
                    "{active} = {active} .and. {}\n",
                    render::measurement_phase("WITHIN")
                ));
            }
        }
        Ok(())
    }
}
