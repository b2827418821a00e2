//! Blocking and nonblocking collectives

use super::common::TaskGetRequestId;
use crate::error::Result;
use crate::hooks::Fragments;
use crate::layers::c::CHook;
use crate::layers::collectives::{lookup_collective, scorep_collective_type};
use crate::task::{TaskContext, TaskRef, TaskSetup, TaskType};
use crate::types::{Binding, Scope, Variable};

pub struct TaskCollectiveCommunication;

impl TaskType<CHook> for TaskCollectiveCommunication {
    fn name(&self) -> &'static str {
        "TaskCollectiveCommunication"
    }

    fn dependencies(&self) -> &'static [TaskRef<CHook>] {
        const DEPS: &[TaskRef<CHook>] = &[&TaskCollectiveCommunicationByteCalc];
        DEPS
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::EnterIfGroupActive, CHook::ExitIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("comm")?.build())
    }

    fn emit(&self, hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        if hook == CHook::EnterIfGroupActive {
            out.push("SCOREP_MpiCollectiveBegin();\n");
            return Ok(());
        }
        let root = if cx.procedure().has_parameter("root") {
            format!("scorep_mpi_get_scorep_mpi_rank({})", cx.internal_name("root")?)
        } else {
            "SCOREP_INVALID_ROOT_RANK".to_string()
        };
        out.push(format!(
            "SCOREP_MpiCollectiveEnd(SCOREP_MPI_COMM_HANDLE({}),\n\
             \x20                       {root},\n\
             \x20                       {},\n\
             \x20                       {},\n\
             \x20                       {});\n",
            cx.param("comm")?,
            scorep_collective_type(&cx.procedure().canonical_name),
            cx.local("local_send_bytes")?,
            cx.local("local_recv_bytes")?
        ));
        Ok(())
    }
}

pub struct TaskNonblockingCollectiveCommunication;

impl TaskType<CHook> for TaskNonblockingCollectiveCommunication {
    fn name(&self) -> &'static str {
        "TaskNonblockingCollectiveCommunication"
    }

    fn dependencies(&self) -> &'static [TaskRef<CHook>] {
        const DEPS: &[TaskRef<CHook>] = &[&TaskGetRequestId, &TaskCollectiveCommunicationByteCalc];
        DEPS
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::EnterIfGroupActive, CHook::ExitIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("comm")?.param("request")?.build())
    }

    fn emit(&self, hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let request_id = cx.local("local_request_id")?;
        if hook == CHook::EnterIfGroupActive {
            out.push(format!("SCOREP_MpiNonBlockingCollectiveRequest({request_id});\n"));
            return Ok(());
        }
        let root = if cx.procedure().has_parameter("root") {
            cx.internal_name("root")?
        } else {
            "SCOREP_INVALID_ROOT_RANK".to_string()
        };
        out.push(format!(
            "if ( {} == MPI_SUCCESS )\n\
             {{\n    scorep_mpi_request_icoll_create(*{},\n\
             \x20                                   SCOREP_MPI_REQUEST_FLAG_NONE,\n\
             \x20                                   {},\n\
             \x20                                   {root},\n\
             \x20                                   {},\n\
             \x20                                   {},\n\
             \x20                                   {},\n\
             \x20                                   {request_id});\n}}\n",
            cx.local("return_value")?,
            cx.param("request")?,
            scorep_collective_type(&cx.procedure().canonical_name),
            cx.local("local_send_bytes")?,
            cx.local("local_recv_bytes")?,
            cx.param("comm")?
        ));
        Ok(())
    }
}

/// Declares the byte counters of a collective and fills them through the
/// matching `scorep_mpi_coll_bytes_*` helper.
pub struct TaskCollectiveCommunicationByteCalc;

impl TaskType<CHook> for TaskCollectiveCommunicationByteCalc {
    fn name(&self) -> &'static str {
        "TaskCollectiveCommunicationByteCalc"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::EnterIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("comm")?.build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([
            Variable::initialized(Binding::new("local_send_bytes", "uint64_t"), "0"),
            Variable::initialized(Binding::new("local_recv_bytes", "uint64_t"), "0"),
        ]))
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let procedure = cx.procedure();
        let (mut base, coll) = lookup_collective(&procedure.canonical_name)?;

        let mut args = coll
            .args
            .iter()
            .map(|a| cx.internal_name(a))
            .collect::<Result<Vec<_>>>()?;
        if let Some(in_place) = coll.in_place {
            args.push(format!("({} == MPI_IN_PLACE)", cx.internal_name(in_place)?));
        }
        args.push(cx.param("comm")?.to_string());
        args.push(format!("&{}", cx.local("local_send_bytes")?));
        args.push(format!("&{}", cx.local("local_recv_bytes")?));

        if procedure.embiggened {
            base.push_str("_c");
        }
        out.push(format!("scorep_mpi_coll_bytes_{base}({});\n", args.join(", ")));
        Ok(())
    }
}
