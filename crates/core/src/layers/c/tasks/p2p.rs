//! Point-to-point communication

use super::common::TaskGetRequestId;
use crate::error::Result;
use crate::hooks::Fragments;
use crate::layers::c::CHook;
use crate::task::{TaskContext, TaskRef, TaskSetup, TaskType};
use crate::types::{Binding, Scope, Variable};

fn counter(name: &str, ty: &str) -> Variable {
    Variable::initialized(Binding::new(name, ty), "0")
}

pub struct TaskSend;

impl TaskType<CHook> for TaskSend {
    fn name(&self) -> &'static str {
        "TaskSend"
    }

    fn dependencies(&self) -> &'static [TaskRef<CHook>] {
        const DEPS: &[TaskRef<CHook>] = &[&TaskGetSendBytes, &TaskCommHandle];
        DEPS
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::EnterIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .param("dest")?
            .param("comm")?
            .any_of("sendtag", &["sendtag", "tag"])?
            .build())
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let dest = cx.param("dest")?;
        out.push(format!(
            "if ( {dest} != MPI_PROC_NULL )\n{{\n    SCOREP_MpiSend( {dest}, {}, {}, {} );\n}}\n",
            cx.local("local_comm_handle")?,
            cx.param("sendtag")?,
            cx.local("local_send_bytes")?
        ));
        Ok(())
    }
}

pub struct TaskRecv;

impl TaskType<CHook> for TaskRecv {
    fn name(&self) -> &'static str {
        "TaskRecv"
    }

    fn dependencies(&self) -> &'static [TaskRef<CHook>] {
        const DEPS: &[TaskRef<CHook>] = &[&TaskGetRecvBytesFromStatus, &TaskCommHandle];
        DEPS
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::ExitIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("source")?.param("comm")?.param("status")?.build())
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let status = cx.param("status")?;
        out.push(format!(
            "if ( {} != MPI_PROC_NULL && return_value == MPI_SUCCESS )\n{{\n    SCOREP_MpiRecv( {status}->MPI_SOURCE, {}, {status}->MPI_TAG, {} );\n}}\n",
            cx.param("source")?,
            cx.local("local_comm_handle")?,
            cx.local("local_recv_bytes")?
        ));
        Ok(())
    }
}

pub struct TaskIsend;

impl TaskType<CHook> for TaskIsend {
    fn name(&self) -> &'static str {
        "TaskIsend"
    }

    fn dependencies(&self) -> &'static [TaskRef<CHook>] {
        const DEPS: &[TaskRef<CHook>] = &[&TaskGetSendBytes, &TaskCommHandle, &TaskGetRequestId];
        DEPS
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::EnterIfGroupActive, CHook::ExitIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .param("dest")?
            .param("comm")?
            .param("request")?
            .any_of("sendtag", &["sendtag", "tag"])?
            .any_of("sendtype", &["sendtype", "datatype"])?
            .build())
    }

    fn emit(&self, hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let dest = cx.param("dest")?;
        let sendtag = cx.param("sendtag")?;
        let send_bytes = cx.local("local_send_bytes")?;
        let request_id = cx.local("local_request_id")?;
        if hook == CHook::EnterIfGroupActive {
            out.push(format!(
                "if ( {dest} != MPI_PROC_NULL )\n{{\n    SCOREP_MpiIsend( {dest}, {},\n                     {sendtag}, {send_bytes}, {request_id} );\n}}\n",
                cx.local("local_comm_handle")?
            ));
        } else {
            out.push(format!(
                "if ( {dest} != MPI_PROC_NULL && {} == MPI_SUCCESS )\n\
                 {{\n    scorep_mpi_request_p2p_create( *{},\n\
                 \x20                                  SCOREP_MPI_REQUEST_TYPE_SEND,\n\
                 \x20                                  SCOREP_MPI_REQUEST_FLAG_NONE,\n\
                 \x20                                  {sendtag},\n\
                 \x20                                  {dest},\n\
                 \x20                                  {send_bytes},\n\
                 \x20                                  {},\n\
                 \x20                                  {},\n\
                 \x20                                  {request_id} );\n}}\n",
                cx.local("return_value")?,
                cx.param("request")?,
                cx.param("sendtype")?,
                cx.param("comm")?
            ));
        }
        Ok(())
    }
}

pub struct TaskIrecv;

impl TaskType<CHook> for TaskIrecv {
    fn name(&self) -> &'static str {
        "TaskIrecv"
    }

    fn dependencies(&self) -> &'static [TaskRef<CHook>] {
        const DEPS: &[TaskRef<CHook>] = &[&TaskGetRecvBytes, &TaskCommHandle, &TaskGetRequestId];
        DEPS
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::ExitIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .param("source")?
            .param("comm")?
            .param("request")?
            .param("tag")?
            .any_of("recvtype", &["recvtype", "datatype"])?
            .build())
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let request_id = cx.local("local_request_id")?;
        out.push(format!(
            "if ( {} != MPI_PROC_NULL && return_value == MPI_SUCCESS )\n\
             {{\n    SCOREP_MpiIrecvRequest( {request_id} );\n\
             \x20   scorep_mpi_request_p2p_create(*{},\n\
             \x20                                 SCOREP_MPI_REQUEST_TYPE_RECV,\n\
             \x20                                 SCOREP_MPI_REQUEST_FLAG_NONE,\n\
             \x20                                 {},\n\
             \x20                                 0,\n\
             \x20                                 {},\n\
             \x20                                 {},\n\
             \x20                                 {},\n\
             \x20                                 {request_id});\n}}\n",
            cx.param("source")?,
            cx.param("request")?,
            cx.param("tag")?,
            cx.local("local_recv_bytes")?,
            cx.param("recvtype")?,
            cx.param("comm")?
        ));
        Ok(())
    }
}

/// Persistent send request creation.
pub struct TaskSendInit;

impl TaskType<CHook> for TaskSendInit {
    fn name(&self) -> &'static str {
        "TaskSendInit"
    }

    fn dependencies(&self) -> &'static [TaskRef<CHook>] {
        const DEPS: &[TaskRef<CHook>] = &[&TaskGetSendBytes, &TaskGetRequestId];
        DEPS
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::ExitIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        persistent_mapping(setup, "dest")
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let dest = cx.param("dest")?;
        out.push(format!(
            "if ({dest} != MPI_PROC_NULL && {} == MPI_SUCCESS )\n\
             {{\n    scorep_mpi_request_p2p_create( *{},\n\
             \x20                                  SCOREP_MPI_REQUEST_TYPE_SEND,\n\
             \x20                                  SCOREP_MPI_REQUEST_FLAG_IS_PERSISTENT,\n\
             \x20                                  {},\n\
             \x20                                  {dest},\n\
             \x20                                  {},\n\
             \x20                                  {},\n\
             \x20                                  {},\n\
             \x20                                  {} );\n}}\n",
            cx.local("return_value")?,
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

/// Persistent receive request creation.
pub struct TaskRecvInit;

impl TaskType<CHook> for TaskRecvInit {
    fn name(&self) -> &'static str {
        "TaskRecvInit"
    }

    fn dependencies(&self) -> &'static [TaskRef<CHook>] {
        const DEPS: &[TaskRef<CHook>] = &[&TaskGetRecvBytes, &TaskGetRequestId];
        DEPS
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::ExitIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        persistent_mapping(setup, "source")
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let source = cx.param("source")?;
        out.push(format!(
            "if ( {source} != MPI_PROC_NULL && {} == MPI_SUCCESS )\n\
             {{\n    scorep_mpi_request_p2p_create(*{},\n\
             \x20                                 SCOREP_MPI_REQUEST_TYPE_RECV,\n\
             \x20                                 SCOREP_MPI_REQUEST_FLAG_IS_PERSISTENT,\n\
             \x20                                 {},\n\
             \x20                                 {source},\n\
             \x20                                 {},\n\
             \x20                                 {},\n\
             \x20                                 {},\n\
             \x20                                 {});\n}}\n",
            cx.local("return_value")?,
            cx.param("request")?,
            cx.param("tag")?,
            cx.local("local_recv_bytes")?,
            cx.param("datatype")?,
            cx.param("comm")?,
            cx.local("local_request_id")?
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
        .build())
}

/// Declares `local_comm_handle` for the `comm` parameter.
pub struct TaskCommHandle;

impl TaskType<CHook> for TaskCommHandle {
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
            Binding::new("local_comm_handle", "SCOREP_InterimCommunicatorHandle").constant(),
            format!("SCOREP_MPI_COMM_HANDLE({})", cx.param("comm")?),
        )]))
    }
}

/// Computes `local_send_bytes` on enter.
pub struct TaskGetSendBytes;

impl TaskType<CHook> for TaskGetSendBytes {
    fn name(&self) -> &'static str {
        "TaskGetSendBytes"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::EnterIfGroupActive]
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
            counter("local_send_bytes", "uint64_t"),
            counter("local_send_type_size", "int"),
        ]))
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let type_size = cx.local("local_send_type_size")?;
        out.push(format!(
            "if ({} != MPI_PROC_NULL)\n{{\n    PMPI_Type_size( {}, &{type_size} );\n    {} = (uint64_t) {} * {type_size};\n}}\n",
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

impl TaskType<CHook> for TaskGetRecvBytesFromStatus {
    fn name(&self) -> &'static str {
        "TaskGetRecvBytesFromStatus"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::ExitIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .param("source")?
            .param("status")?
            .any_of("recvtype", &["recvtype", "datatype"])?
            .build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([
            counter("local_recv_bytes", "uint64_t"),
            counter("local_recv_type_size", "int"),
            counter("local_recv_count", "int"),
        ]))
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let recvtype = cx.param("recvtype")?;
        let type_size = cx.local("local_recv_type_size")?;
        let count = cx.local("local_recv_count")?;
        out.push(format!(
            "if ( {} != MPI_PROC_NULL && return_value == MPI_SUCCESS )\n{{\n    PMPI_Type_size({recvtype}, &{type_size});\n    PMPI_Get_count({}, {recvtype}, &{count});\n    {} = (uint64_t) {count} * {type_size};\n}}\n",
            cx.param("source")?,
            cx.param("status")?,
            cx.local("local_recv_bytes")?
        ));
        Ok(())
    }
}

/// Computes `local_recv_bytes` from the posted receive count on exit.
pub struct TaskGetRecvBytes;

impl TaskType<CHook> for TaskGetRecvBytes {
    fn name(&self) -> &'static str {
        "TaskGetRecvBytes"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::ExitIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .param("source")?
            .any_of("recvcount", &["recvcount", "count"])?
            .any_of("recvtype", &["recvtype", "datatype"])?
            .build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([
            counter("local_recv_bytes", "uint64_t"),
            counter("local_recv_type_size", "int"),
        ]))
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let type_size = cx.local("local_recv_type_size")?;
        out.push(format!(
            "if ( {} != MPI_PROC_NULL && return_value == MPI_SUCCESS )\n{{\n    PMPI_Type_size({}, &{type_size});\n    {} = (uint64_t) {} * {type_size};\n}}\n",
            cx.param("source")?,
            cx.param("recvtype")?,
            cx.local("local_recv_bytes")?,
            cx.param("recvcount")?
        ));
        Ok(())
    }
}
