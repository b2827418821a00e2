//! Environment management: initialization and finalization of the library

use crate::error::Result;
use crate::hooks::Fragments;
use crate::layers::c::CHook;
use crate::task::{TaskContext, TaskRef, TaskSetup, TaskType};
use crate::types::{Binding, Scope, Variable};

/// Registers `MPI_COMM_WORLD` and `MPI_COMM_SELF` as a collective operation.
pub struct TaskCommCreateWorldSelf;

impl TaskType<CHook> for TaskCommCreateWorldSelf {
    fn name(&self) -> &'static str {
        "TaskCommCreateWorldSelf"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::EnterIfGroupActive, CHook::ExitIfGroupActive]
    }

    fn emit(&self, hook: CHook, _cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        match hook {
            CHook::EnterIfGroupActive => out.push("SCOREP_MpiCollectiveBegin();\n"),
            _ => out.push(
                "SCOREP_CommCreate( SCOREP_MPI_COMM_HANDLE( MPI_COMM_WORLD ) );\n\
                 SCOREP_CommCreate( SCOREP_MPI_COMM_HANDLE( MPI_COMM_SELF ) );\n\
                 SCOREP_MpiCollectiveEnd( SCOREP_MPI_COMM_HANDLE( MPI_COMM_WORLD ),\n\
                 \x20                        SCOREP_INVALID_ROOT_RANK,\n\
                 \x20                        SCOREP_COLLECTIVE_CREATE_HANDLE,\n\
                 \x20                        0,\n\
                 \x20                        0 );\n",
            ),
        }
        Ok(())
    }
}

/// Counterpart of [`TaskCommCreateWorldSelf`] for finalization.
pub struct TaskCommDestroyWorldSelf;

impl TaskType<CHook> for TaskCommDestroyWorldSelf {
    fn name(&self) -> &'static str {
        "TaskCommDestroyWorldSelf"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::EnterIfGroupActive, CHook::ExitIfGroupActive]
    }

    fn emit(&self, hook: CHook, _cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        match hook {
            CHook::EnterIfGroupActive => out.push("SCOREP_MpiCollectiveBegin();\n"),
            _ => out.push(
                "SCOREP_CommDestroy( SCOREP_MPI_COMM_HANDLE( MPI_COMM_WORLD ) );\n\
                 SCOREP_CommDestroy( SCOREP_MPI_COMM_HANDLE( MPI_COMM_SELF ) );\n\
                 SCOREP_MpiCollectiveEnd( SCOREP_MPI_COMM_HANDLE( MPI_COMM_WORLD ),\n\
                 \x20                        SCOREP_INVALID_ROOT_RANK,\n\
                 \x20                        SCOREP_COLLECTIVE_DESTROY_HANDLE,\n\
                 \x20                        0,\n\
                 \x20                        0 );\n",
            ),
        }
        Ok(())
    }
}

const THREAD_LEVEL_CHECKS: &str = "\
if ( ( {required} > MPI_THREAD_FUNNELED ) && ( *{provided} > MPI_THREAD_FUNNELED ) )
{
#if HAVE( THREAD_LOCAL_STORAGE )
    UTILS_WARNING( \"Support for MPI_THREAD_(SERIALIZED|MULTIPLE) is currently experimental!\\n\"
                   \"Please report bugs and give feedback to support@score-p.org.\" );
#else
    UTILS_WARNING( \"No thread-local storage specifier detected during configure, therefore\\n\"
                   \"MPI_THREAD_MULTIPLE is not supported!\\n\\n\"
                   \"Support for MPI_THREAD_SERIALIZED is currently experimental!\\n\"
                   \"Please report bugs and give feedback to support@score-p.org.\" );
#endif /* ! HAVE( THREAD_LOCAL_STORAGE ) */
}
if ( ( {required} == MPI_THREAD_FUNNELED ) && ( *{provided} >= MPI_THREAD_FUNNELED )
     && 0 != SCOREP_Location_GetId( SCOREP_Location_GetCurrentCPULocation() ) )
{
    UTILS_WARNING( \"MPI environment initialization with MPI_THREAD_FUNNELED not on master thread!\" );
}
";

/// Initializes the measurement before the call and its MPI part after a
/// successful one. Procedures with `required` and `provided` parameters
/// also get thread level warnings.
pub struct TaskInitialize;

impl TaskType<CHook> for TaskInitialize {
    fn name(&self) -> &'static str {
        "TaskInitialize"
    }

    fn dependencies(&self) -> &'static [TaskRef<CHook>] {
        const DEPS: &[TaskRef<CHook>] = &[&TaskCommCreateWorldSelf];
        DEPS
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::Initialization, CHook::PostPmpiCall]
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([
            Variable::initialized(Binding::new("fflag", "int"), "0"),
            Variable::initialized(Binding::new("iflag", "int"), "0"),
        ]))
    }

    fn emit(&self, hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        if hook == CHook::Initialization {
            out.push(
                "if ( SCOREP_IS_MEASUREMENT_PHASE( PRE ) )\n{\n    /* Initialize the measurement system */\n    SCOREP_InitMeasurement();\n}\n",
            );
            return Ok(());
        }

        out.push("if ( return_value == MPI_SUCCESS ) {\n");
        let procedure = cx.procedure();
        if procedure.has_parameter("required") && procedure.has_parameter("provided") {
            out.push(
                THREAD_LEVEL_CHECKS
                    .replace("{required}", &cx.internal_name("required")?)
                    .replace("{provided}", &cx.internal_name("provided")?),
            );
        }
        let iflag = cx.local("iflag")?;
        let fflag = cx.local("fflag")?;
        out.push(format!(
            "if ( ( PMPI_Initialized( &{iflag} ) == MPI_SUCCESS ) && ( {iflag} != 0 ) &&\n     \
             ( PMPI_Finalized( &{fflag} ) == MPI_SUCCESS ) && ( {fflag} == 0 ) )\n{{\n    \
             /* Complete initialization of measurement core and MPI event handling */\n    \
             SCOREP_InitMppMeasurement();\n}}\n"
        ));
        out.push("}\n");
        Ok(())
    }
}

/// Names the predefined communicators and registers the exit handler
/// before the library shuts down.
pub struct TaskFinalize;

impl TaskType<CHook> for TaskFinalize {
    fn name(&self) -> &'static str {
        "TaskFinalize"
    }

    fn dependencies(&self) -> &'static [TaskRef<CHook>] {
        const DEPS: &[TaskRef<CHook>] = &[&TaskCommDestroyWorldSelf];
        DEPS
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::PrePmpiCall]
    }

    fn emit(&self, _hook: CHook, _cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push(
            "/* Be so kind and name the MPI_COMM_WORLD, if the user didn't do so already */\n\
             scorep_mpi_comm_set_default_names();\n\
             \n\
             /* finalize MPI event handling */\n\
             /* We need to make sure that our exit handler is called before the MPI one. */\n\
             SCOREP_RegisterExitHandler();\n",
        );
        Ok(())
    }
}

/// Reports the library as finalized once the measurement finalized it,
/// even though the real finalization is deferred.
pub struct TaskCheckFinalized;

impl TaskType<CHook> for TaskCheckFinalized {
    fn name(&self) -> &'static str {
        "TaskCheckFinalized"
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::PostPmpiCall]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("flag")?.build())
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push(format!(
            "if ( MPI_SUCCESS == return_value && mpi_finalize_called )\n{{\n    *{} = 1;\n}}\n",
            cx.param("flag")?
        ));
        Ok(())
    }
}

pub struct TaskDisableEventsOutsideMeasurement;

impl TaskType<CHook> for TaskDisableEventsOutsideMeasurement {
    fn name(&self) -> &'static str {
        "TaskDisableEventsOutsideMeasurement"
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::Comment, CHook::Initialization]
    }

    fn emit(&self, hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        match hook {
            CHook::Comment => out.push("* Events are only recorded inside the measurement phase.\n"),
            _ => out.push(format!(
                "{} &= SCOREP_IS_MEASUREMENT_PHASE( WITHIN );\n",
                cx.local("event_gen_active")?
            )),
        }
        Ok(())
    }
}
