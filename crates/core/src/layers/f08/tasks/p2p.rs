//! Point-to-point communication

use super::common::TaskGetRequestId;
use crate::error::Result;
use crate::hooks::Fragments;
use crate::layers::f08::F08Hook;
use crate::task::{TaskContext, TaskRef, TaskSetup, TaskType};
use crate::types::{Binding, Scope, Variable};

const BYTES: &str = "integer(c_int64_t)";

fn integer(name: &str) -> Variable {
    Variable::new(Binding::new(name, "integer"))
}

pub struct TaskSend;

impl TaskType<F08Hook> for TaskSend {
    fn name(&self) -> &'static str {
        "TaskSend"
    }

    fn dependencies(&self) -> &'static [TaskRef<F08Hook>] {
        const DEPS: &[TaskRef<F08Hook>] = &[&TaskGetSendBytes, &TaskCommHandle];
        DEPS
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::EnterIfGroupActive]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_PROC_NULL"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .param("dest")?
            .param("comm")?
            .any_of("sendtag", &["sendtag", "tag"])?
            .build())
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let dest = cx.param("dest")?;
        out.push(format!(
            "if ( {dest} .ne. MPI_PROC_NULL ) then\n    call SCOREP_MpiSend({dest}, {}, {}, {})\nendif\n",
            cx.local("local_comm_handle")?,
            cx.param("sendtag")?,
            cx.local("local_send_bytes")?
        ));
        Ok(())
    }
}

pub struct TaskRecv;

impl TaskType<F08Hook> for TaskRecv {
    fn name(&self) -> &'static str {
        "TaskRecv"
    }

    fn dependencies(&self) -> &'static [TaskRef<F08Hook>] {
        const DEPS: &[TaskRef<F08Hook>] = &[&TaskGetRecvBytesFromStatus, &TaskCommHandle];
        DEPS
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::ExitIfGroupActive]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_PROC_NULL", "MPI_SUCCESS", "MPI_SOURCE", "MPI_TAG"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .param("source")?
            .param("comm")?
            .param("status")?
            .param("ierror")?
            .build())
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let status = cx.param("status")?;
        out.push(format!(
            "if ( {} .ne. MPI_PROC_NULL .and. {} .eq. MPI_SUCCESS ) then\n\
             \x20   call SCOREP_MpiRecv({status}%MPI_SOURCE, {}, {status}%MPI_TAG, {})\n\
             end if\n",
            cx.param("source")?,
            cx.param("ierror")?,
            cx.local("local_comm_handle")?,
            cx.local("local_recv_bytes")?
        ));
        Ok(())
    }
}

pub struct TaskIsend;

impl TaskType<F08Hook> for TaskIsend {
    fn name(&self) -> &'static str {
        "TaskIsend"
    }

    fn dependencies(&self) -> &'static [TaskRef<F08Hook>] {
        const DEPS: &[TaskRef<F08Hook>] = &[&TaskGetSendBytes, &TaskCommHandle, &TaskGetRequestId];
        DEPS
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::EnterIfGroupActive, F08Hook::ExitIfGroupActive]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_PROC_NULL", "MPI_SUCCESS"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .param("dest")?
            .param("comm")?
            .param("request")?
            .param("ierror")?
            .any_of("sendtag", &["sendtag", "tag"])?
            .any_of("sendtype", &["sendtype", "datatype"])?
            .build())
    }

    fn emit(&self, hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let dest = cx.param("dest")?;
        let sendtag = cx.param("sendtag")?;
        let send_bytes = cx.local("local_send_bytes")?;
        let request_id = cx.local("local_request_id")?;
        if hook == F08Hook::EnterIfGroupActive {
            out.push(format!(
                "if ( {dest} .ne. MPI_PROC_NULL ) then\n\
                 \x20   call SCOREP_MpiIsend( {dest}, {}, {sendtag}, {send_bytes}, {request_id} )\n\
                 end if\n",
                cx.local("local_comm_handle")?
            ));
        } else {
            out.push(format!(
                "if ( {dest} .ne. MPI_PROC_NULL .and.  {} .eq. MPI_SUCCESS ) then\n\
                 \x20   call scorep_mpi_request_p2p_create( {},&\n\
                 \x20                                       SCOREP_MPI_REQUEST_TYPE_SEND,&\n\
                 \x20                                       SCOREP_MPI_REQUEST_FLAG_NONE,&\n\
                 \x20                                       {sendtag},&\n\
                 \x20                                       {dest},&\n\
                 \x20                                       {send_bytes},&\n\
                 \x20                                       {},&\n\
                 \x20                                       {},&\n\
                 \x20                                       {request_id} )\n\
                 end if\n",
                cx.param("ierror")?,
                cx.param("request")?,
                cx.param("sendtype")?,
                cx.param("comm")?
            ));
        }
        Ok(())
    }
}

pub struct TaskIrecv;

impl TaskType<F08Hook> for TaskIrecv {
    fn name(&self) -> &'static str {
        "TaskIrecv"
    }

    fn dependencies(&self) -> &'static [TaskRef<F08Hook>] {
        const DEPS: &[TaskRef<F08Hook>] = &[&TaskGetRecvBytes, &TaskCommHandle, &TaskGetRequestId];
        DEPS
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::ExitIfGroupActive]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_PROC_NULL", "MPI_SUCCESS"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .param("source")?
            .param("comm")?
            .param("request")?
            .param("tag")?
            .param("ierror")?
            .any_of("recvtype", &["recvtype", "datatype"])?
            .build())
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let request_id = cx.local("local_request_id")?;
        out.push(format!(
            "if ( {} .ne. MPI_PROC_NULL .and. {} .eq. MPI_SUCCESS ) then\n\
             \x20   call SCOREP_MpiIrecvRequest( {request_id} )\n\
             \x20   call scorep_mpi_request_p2p_create( {}, &\n\
             \x20                                       SCOREP_MPI_REQUEST_TYPE_RECV, &\n\
             \x20                                       SCOREP_MPI_REQUEST_FLAG_NONE, &\n\
             \x20                                       {}, &\n\
             \x20                                       0, &\n\
             \x20                                       {}, &\n\
             \x20                                       {}, &\n\
             \x20                                       {}, &\n\
             \x20                                       {request_id} )\n\
             end if\n",
            cx.param("source")?,
            cx.param("ierror")?,
            cx.param("request")?,
            cx.param("tag")?,
            cx.local("local_recv_bytes")?,
            cx.param("recvtype")?,
            cx.param("comm")?
        ));
        Ok(())
    }
}

fn persistent_mapping(setup: &TaskSetup<'_>, peer: &str) -> Result<Scope<String>> {
    Ok(setup
        .mapping()
        .param(peer)?
        .param("comm")?
        .param("request")?
        .param("tag")?
        .param("datatype")?
        .param("ierror")?
        .build())
}

/// Persistent send: the request is created here and started later.
pub struct TaskSendInit;

impl TaskType<F08Hook> for TaskSendInit {
    fn name(&self) -> &'static str {
        "TaskSendInit"
    }

    fn dependencies(&self) -> &'static [TaskRef<F08Hook>] {
        const DEPS: &[TaskRef<F08Hook>] = &[&TaskGetSendBytes, &TaskGetRequestId];
        DEPS
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::ExitIfGroupActive]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_PROC_NULL", "MPI_SUCCESS"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        persistent_mapping(setup, "dest")
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let dest = cx.param("dest")?;
        out.push(format!(
            "if ( {dest} .ne. MPI_PROC_NULL .and. {} .eq. MPI_SUCCESS ) then\n\
             \x20   call scorep_mpi_request_p2p_create( {}, &\n\
             \x20                                       SCOREP_MPI_REQUEST_TYPE_SEND, &\n\
             \x20                                       SCOREP_MPI_REQUEST_FLAG_IS_PERSISTENT, &\n\
             \x20                                       {}, &\n\
             \x20                                       {dest}, &\n\
             \x20                                       {}, &\n\
             \x20                                       {}, &\n\
             \x20                                       {}, &\n\
             \x20                                       {} )\n\
             end if\n",
            cx.param("ierror")?,
            cx.param("request")?,
            cx.param("tag")?,
            cx.local("local_send_bytes")?,
            cx.param("datatype")?,
            cx.param("comm")?,
            cx.local("local_request_id")?
        ));
        Ok(())
    }
}

pub struct TaskRecvInit;

impl TaskType<F08Hook> for TaskRecvInit {
    fn name(&self) -> &'static str {
        "TaskRecvInit"
    }

    fn dependencies(&self) -> &'static [TaskRef<F08Hook>] {
        const DEPS: &[TaskRef<F08Hook>] = &[&TaskGetRecvBytes, &TaskGetRequestId];
        DEPS
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::ExitIfGroupActive]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_PROC_NULL", "MPI_SUCCESS"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        persistent_mapping(setup, "source")
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push(format!(
            "if ({} .ne. MPI_PROC_NULL .and. {} .eq. MPI_SUCCESS ) then\n\
             \x20   call scorep_mpi_request_p2p_create( &\n\
             \x20       {}, &\n\
             \x20       SCOREP_MPI_REQUEST_TYPE_RECV, &\n\
             \x20       SCOREP_MPI_REQUEST_FLAG_IS_PERSISTENT, &\n\
             \x20       {}, &\n\
             \x20       {}, &\n\
             \x20       {}, &\n\
             \x20       {}, &\n\
             \x20       {}, &\n\
             \x20       {} )\n\
             end if\n",
            cx.param("source")?,
            cx.param("ierror")?,
            cx.param("request")?,
            cx.param("tag")?,
            cx.param("source")?,
            cx.local("local_recv_bytes")?,
            cx.param("datatype")?,
            cx.param("comm")?,
            cx.local("local_request_id")?
        ));
        Ok(())
    }
}

/// Declares `local_comm_handle`, initialized from the `comm` parameter.
pub struct TaskCommHandle;

impl TaskType<F08Hook> for TaskCommHandle {
    fn name(&self) -> &'static str {
        "TaskCommHandle"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("comm")?.build())
    }

    fn needs_local_variables(&self, cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([Variable::initialized(
            Binding::new("local_comm_handle", "integer(SCOREP_InterimCommunicatorHandle)"),
            format!("scorep_mpi_comm_handle({})", cx.param("comm")?),
        )]))
    }
}

/// Computes `local_send_bytes` on enter.
pub struct TaskGetSendBytes;

impl TaskType<F08Hook> for TaskGetSendBytes {
    fn name(&self) -> &'static str {
        "TaskGetSendBytes"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::EnterIfGroupActive]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_PROC_NULL", "PMPI_Type_size"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .param("dest")?
            .any_of("sendtype", &["sendtype", "datatype"])?
            .any_of("sendcount", &["sendcount", "count"])?
            .build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([
            Variable::new(Binding::new("local_send_bytes", BYTES)),
            integer("local_send_type_size"),
        ]))
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let type_size = cx.local("local_send_type_size")?;
        out.push(format!(
            "if ( {} .ne. MPI_PROC_NULL ) then\n\
             \x20   call pmpi_type_size({}, {type_size})\n\
             \x20   {} = {} * {type_size}\n\
             endif\n",
            cx.param("dest")?,
            cx.param("sendtype")?,
            cx.local("local_send_bytes")?,
            cx.param("sendcount")?
        ));
        Ok(())
    }
}

/// Computes `local_recv_bytes` from the received status on exit.
pub struct TaskGetRecvBytesFromStatus;

impl TaskType<F08Hook> for TaskGetRecvBytesFromStatus {
    fn name(&self) -> &'static str {
        "TaskGetRecvBytesFromStatus"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::ExitIfGroupActive]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_PROC_NULL", "MPI_SUCCESS", "PMPI_Type_size", "PMPI_Get_count"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .param("source")?
            .param("ierror")?
            .param("status")?
            .any_of("recvtype", &["recvtype", "datatype"])?
            .build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([
            Variable::new(Binding::new("local_recv_bytes", BYTES)),
            integer("local_recv_type_size"),
            integer("local_recv_count"),
        ]))
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let recvtype = cx.param("recvtype")?;
        let type_size = cx.local("local_recv_type_size")?;
        let count = cx.local("local_recv_count")?;
        out.push(format!(
            "if ( {} .ne. MPI_PROC_NULL .and. {} .eq. MPI_SUCCESS ) then\n\
             \x20   call pmpi_type_size({recvtype}, {type_size})\n\
             \x20   call pmpi_get_count({}, {recvtype}, {count})\n\
             \x20   {} = {count} * {type_size}\n\
             end if\n",
            cx.param("source")?,
            cx.param("ierror")?,
            cx.param("status")?,
            cx.local("local_recv_bytes")?
        ));
        Ok(())
    }
}

/// Computes `local_recv_bytes` from the posted count on exit.
pub struct TaskGetRecvBytes;

impl TaskType<F08Hook> for TaskGetRecvBytes {
    fn name(&self) -> &'static str {
        "TaskGetRecvBytes"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::ExitIfGroupActive]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_PROC_NULL", "MPI_SUCCESS", "PMPI_Type_size"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .param("source")?
            .param("ierror")?
            .any_of("recvcount", &["recvcount", "count"])?
            .any_of("recvtype", &["recvtype", "datatype"])?
            .build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([
            Variable::new(Binding::new("local_recv_bytes", BYTES)),
            integer("local_recv_type_size"),
        ]))
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let type_size = cx.local("local_recv_type_size")?;
        out.push(format!(
            "if ( {} .ne. MPI_PROC_NULL .and. {} .eq. MPI_SUCCESS ) then\n\
             \x20   call pmpi_type_size({}, {type_size})\n\
             \x20   {} = {} * {type_size}\n\
             end if\n",
            cx.param("source")?,
            cx.param("ierror")?,
            cx.param("recvtype")?,
            cx.local("local_recv_bytes")?,
            cx.param("recvcount")?
        ));
        Ok(())
    }
}
