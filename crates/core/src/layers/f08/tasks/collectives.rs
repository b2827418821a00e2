//! Blocking and nonblocking collectives

use super::common::TaskGetRequestId;
use crate::error::Result;
use crate::hooks::Fragments;
use crate::layers::collectives::{lookup_collective, scorep_collective_type};
use crate::layers::f08::{F08Hook, render};
use crate::task::{TaskContext, TaskRef, TaskSetup, TaskType};
use crate::types::{Binding, Scope, Variable};

pub struct TaskCollectiveCommunication;

impl TaskType<F08Hook> for TaskCollectiveCommunication {
    fn name(&self) -> &'static str {
        "TaskCollectiveCommunication"
    }

    fn dependencies(&self) -> &'static [TaskRef<F08Hook>] {
        const DEPS: &[TaskRef<F08Hook>] = &[&TaskCollectiveCommunicationByteCalc];
        DEPS
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::EnterIfGroupActive, F08Hook::ExitIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("comm")?.build())
    }

    fn emit(&self, hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        if hook == F08Hook::EnterIfGroupActive {
            out.push("call SCOREP_MpiCollectiveBegin()\n");
            return Ok(());
        }
        let root = if cx.procedure().has_parameter("root") {
            format!("scorep_mpi_get_scorep_mpi_rank({})", cx.internal_name("root")?)
        } else {
            "SCOREP_INVALID_ROOT_RANK".to_string()
        };
        out.push(format!(
            "call SCOREP_MpiCollectiveEnd(scorep_mpi_comm_handle({}), &\n\
             \x20                            {root}, &\n\
             \x20                            {}, &\n\
             \x20                            {}, &\n\
             \x20                            {})\n",
            cx.param("comm")?,
            scorep_collective_type(&cx.procedure().canonical_name),
            cx.local("local_send_bytes")?,
            cx.local("local_recv_bytes")?
        ));
        Ok(())
    }
}

pub struct TaskNonblockingCollectiveCommunication;

impl TaskType<F08Hook> for TaskNonblockingCollectiveCommunication {
    fn name(&self) -> &'static str {
        "TaskNonblockingCollectiveCommunication"
    }

    fn dependencies(&self) -> &'static [TaskRef<F08Hook>] {
        const DEPS: &[TaskRef<F08Hook>] = &[&TaskGetRequestId, &TaskCollectiveCommunicationByteCalc];
        DEPS
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::EnterIfGroupActive, F08Hook::ExitIfGroupActive]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_SUCCESS"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .param("comm")?
            .param("request")?
            .param("ierror")?
            .build())
    }

    fn emit(&self, hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let request_id = cx.local("local_request_id")?;
        if hook == F08Hook::EnterIfGroupActive {
            out.push(format!("call SCOREP_MpiNonBlockingCollectiveRequest({request_id})\n"));
            return Ok(());
        }
        let root = if cx.procedure().has_parameter("root") {
            cx.internal_name("root")?
        } else {
            "SCOREP_INVALID_ROOT_RANK".to_string()
        };
        out.push(format!(
            "if ( {} .eq. MPI_SUCCESS ) then\n\
             \x20   call scorep_mpi_request_icoll_create({}, &\n\
             \x20                                        SCOREP_MPI_REQUEST_FLAG_NONE, &\n\
             \x20                                        {}, &\n\
             \x20                                        {root}, &\n\
             \x20                                        {}, &\n\
             \x20                                        {}, &\n\
             \x20                                        {}, &\n\
             \x20                                        {request_id})\n\
             end if\n",
            cx.param("ierror")?,
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
///
/// The in-place test depends on whether the buffer is assumed-rank, which
/// is only known at configure time.
pub struct TaskCollectiveCommunicationByteCalc;

impl TaskType<F08Hook> for TaskCollectiveCommunicationByteCalc {
    fn name(&self) -> &'static str {
        "TaskCollectiveCommunicationByteCalc"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::EnterIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("comm")?.build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([
            Variable::initialized(Binding::new("local_send_bytes", "integer(c_int64_t)"), "0_c_int64_t"),
            Variable::initialized(Binding::new("local_recv_bytes", "integer(c_int64_t)"), "0_c_int64_t"),
            Variable::initialized(Binding::new("local_in_place", "logical(c_bool)"), ".false."),
        ]))
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let procedure = cx.procedure();
        let (base, coll) = lookup_collective(&procedure.canonical_name)?;

        let mut args = coll
            .args
            .iter()
            .map(|a| cx.internal_name(a))
            .collect::<Result<Vec<_>>>()?;
        if let Some(in_place) = coll.in_place {
            let in_place = cx.internal_name(in_place)?;
            let flag = cx.local("local_in_place")?;
            out.push(format!(
                "#if {}\n\
                 \x20   {flag} = scorep_mpi_is_in_place_ts({in_place})\n\
                 #else\n\
                 \x20   {flag} = scorep_mpi_is_in_place({in_place})\n\
                 #endif\n",
                render::have(&render::choice_buffers_macro(procedure))
            ));
            args.push(flag.to_string());
        }
        args.push(cx.param("comm")?.to_string());
        args.push(cx.local("local_send_bytes")?.to_string());
        args.push(cx.local("local_recv_bytes")?.to_string());

        out.push(format!("call scorep_mpi_coll_bytes_{base}({})\n", args.join(", ")));
        Ok(())
    }
}
