//! Communicator and group management

use super::common::TaskGetRequestId;
use crate::error::Result;
use crate::hooks::Fragments;
use crate::layers::collectives::CollectiveEndMode;
use crate::layers::f08::F08Hook;
use crate::task::{TaskContext, TaskRef, TaskSetup, TaskType};
use crate::types::{Binding, Scope, Variable};

const COMM_HANDLE: &str = "integer(SCOREP_InterimCommunicatorHandle)";

fn comm_new(cx: &TaskContext<'_>) -> Result<String> {
    let name: String = cx.attributes().get_as("new")?;
    cx.internal_name(&name)
}

fn has_comm_parent(cx: &TaskContext<'_>) -> bool {
    cx.attributes().is_set("parent")
}

fn comm_parent(cx: &TaskContext<'_>) -> Result<String> {
    let name: Option<String> = cx.attributes().get_as("parent")?;
    match name {
        Some(name) => cx.internal_name(&name),
        None => Ok("MPI_COMM_NULL".to_string()),
    }
}

/// Common supertype of communicator constructors.
pub struct TaskCommCreateBase;

impl TaskType<F08Hook> for TaskCommCreateBase {
    fn name(&self) -> &'static str {
        "TaskCommCreateBase"
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_COMM_NULL"]
    }
}

pub struct TaskCommCreate;

impl TaskCommCreate {
    fn locals() -> Scope<Variable> {
        Scope::from_named([
            Variable::new(Binding::new("local_comm_handle", COMM_HANDLE)),
            Variable::initialized(
                Binding::new("local_new_comm_handle", COMM_HANDLE),
                "SCOREP_INVALID_INTERIM_COMMUNICATOR",
            ),
        ])
    }

    const HOOKS: &'static [F08Hook] = &[
        F08Hook::Initialization,
        F08Hook::EnterIfGroupActive,
        F08Hook::PostPmpiCall,
        F08Hook::ExitIfGroupActive,
    ];

    fn emit_common(hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let comm_handle = cx.local("local_comm_handle")?;
        let new_handle = cx.local("local_new_comm_handle")?;
        match hook {
            F08Hook::Initialization => {
                if has_comm_parent(cx) {
                    out.push(format!(
                        "{comm_handle} = scorep_mpi_comm_handle({})\n",
                        comm_parent(cx)?
                    ));
                } else {
                    out.push(format!("{comm_handle} = SCOREP_INVALID_INTERIM_COMMUNICATOR\n"));
                }
            }
            F08Hook::EnterIfGroupActive => out.push("call SCOREP_MpiCollectiveBegin()\n"),
            F08Hook::PostPmpiCall => {
                let new = comm_new(cx)?;
                out.push(format!(
                    "if ({new} .ne. MPI_COMM_NULL) then\n    {new_handle} = scorep_mpi_comm_create({new}, {})\nend if\n",
                    comm_parent(cx)?
                ));
            }
            _ => {
                let mode: CollectiveEndMode = cx.attributes().get_as("collective_end_mode")?;
                out.push(format!(
                    "if ( {new_handle} .ne. SCOREP_INVALID_INTERIM_COMMUNICATOR ) then\n    call SCOREP_CommCreate({new_handle})\n"
                ));
                if mode == CollectiveEndMode::NewOrSelf {
                    out.push(format!(
                        "else\n    ! The communicator creation was a local operation, hence we use MPI_COMM_SELF for the collective\n    {new_handle} = scorep_mpi_comm_handle(MPI_COMM_SELF)\n"
                    ));
                }
                out.push("end if\n");
                let end_handle = match mode {
                    CollectiveEndMode::Parent => comm_handle,
                    CollectiveEndMode::NewOrSelf => new_handle,
                };
                out.push(format!(
                    "call SCOREP_MpiCollectiveEnd({end_handle}, &\n\
                     \x20                            SCOREP_INVALID_ROOT_RANK, &\n\
                     \x20                            SCOREP_COLLECTIVE_CREATE_HANDLE, &\n\
                     \x20                            0_c_int64_t, &\n\
                     \x20                            0_c_int64_t)\n"
                ));
            }
        }
        Ok(())
    }
}

impl TaskType<F08Hook> for TaskCommCreate {
    fn name(&self) -> &'static str {
        "TaskCommCreate"
    }

    fn parent(&self) -> Option<TaskRef<F08Hook>> {
        Some(&TaskCommCreateBase)
    }

    fn hooks(&self) -> &'static [F08Hook] {
        Self::HOOKS
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_COMM_NULL", "MPI_COMM_SELF"]
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Self::locals())
    }

    fn emit(&self, hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        Self::emit_common(hook, cx, out)
    }
}

/// Intercommunicator constructor. Only the local leader passes the peer
/// communicator as parent.
pub struct TaskIntercommCreate;

impl TaskType<F08Hook> for TaskIntercommCreate {
    fn name(&self) -> &'static str {
        "TaskIntercommCreate"
    }

    fn parent(&self) -> Option<TaskRef<F08Hook>> {
        Some(&TaskCommCreate)
    }

    fn hooks(&self) -> &'static [F08Hook] {
        TaskCommCreate::HOOKS
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_COMM_NULL", "MPI_COMM_SELF", "PMPI_Comm_rank"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("local_comm")?.param("local_leader")?.build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        let mut locals = TaskCommCreate::locals();
        locals.set("local_rank", Variable::new(Binding::new("local_rank", "integer")));
        Ok(locals)
    }

    fn emit(&self, hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        if hook != F08Hook::PostPmpiCall {
            return TaskCommCreate::emit_common(hook, cx, out);
        }
        let new = comm_new(cx)?;
        let new_handle = cx.local("local_new_comm_handle")?;
        let rank = cx.local("local_rank")?;
        out.push(format!(
            "if ({new} .ne. MPI_COMM_NULL) then\n\
             \x20   ! The semantic of the peer communicator only requires a useful\n\
             \x20   ! communicator on the respective local leader rank.\n\
             \x20   ! To avoid unnecessary duplicates use MPI_COMM_NULL for all other\n\
             \x20   ! ranks in the place of the parent/peer communicator.\n\
             \n\
             \x20   call PMPI_Comm_rank( {}, {rank} )\n\
             \x20   if ( {} .eq. {rank} ) then\n\
             \x20       {new_handle} = scorep_mpi_comm_create( {new}, {} )\n\
             \x20   else\n\
             \x20       {new_handle} = scorep_mpi_comm_create( {new}, MPI_COMM_NULL )\n\
             \x20   end if\n\
             end if\n",
            cx.param("local_comm")?,
            cx.param("local_leader")?,
            comm_parent(cx)?
        ));
        Ok(())
    }
}

/// Nonblocking communicator constructor, completed through its request.
pub struct TaskCommCreateRequest;

impl TaskType<F08Hook> for TaskCommCreateRequest {
    fn name(&self) -> &'static str {
        "TaskCommCreateRequest"
    }

    fn parent(&self) -> Option<TaskRef<F08Hook>> {
        Some(&TaskCommCreateBase)
    }

    fn dependencies(&self) -> &'static [TaskRef<F08Hook>] {
        const DEPS: &[TaskRef<F08Hook>] = &[&TaskGetRequestId];
        DEPS
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::EnterIfGroupActive, F08Hook::PostPmpiCall]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_COMM_NULL", "MPI_SUCCESS"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("request")?.param("ierror")?.build())
    }

    fn emit(&self, hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let request_id = cx.local("local_request_id")?;
        if hook == F08Hook::EnterIfGroupActive {
            out.push(format!(
                "call SCOREP_MpiNonBlockingCollectiveRequest( {request_id} )\n"
            ));
        } else {
            out.push(format!(
                "if ( {} .eq. MPI_SUCCESS ) then\n     call scorep_mpi_request_comm_idup_create( {}, {}, {}, {request_id})\nend if\n",
                cx.param("ierror")?,
                cx.param("request")?,
                comm_parent(cx)?,
                comm_new(cx)?
            ));
        }
        Ok(())
    }
}

pub struct TaskCommFree;

impl TaskType<F08Hook> for TaskCommFree {
    fn name(&self) -> &'static str {
        "TaskCommFree"
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[
            F08Hook::Initialization,
            F08Hook::EnterIfGroupActive,
            F08Hook::PrePmpiCall,
            F08Hook::ExitIfGroupActive,
        ]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("comm")?.build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([Variable::new(Binding::new("local_comm_handle", COMM_HANDLE))]))
    }

    fn emit(&self, hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let comm = cx.param("comm")?;
        let handle = cx.local("local_comm_handle")?;
        match hook {
            F08Hook::Initialization => out.push(format!("{handle} = scorep_mpi_comm_handle({comm})\n")),
            F08Hook::EnterIfGroupActive => out.push("call SCOREP_MpiCollectiveBegin()\n"),
            F08Hook::PrePmpiCall => out.push(format!("call scorep_mpi_comm_free({comm})\n")),
            _ => out.push(format!(
                "call SCOREP_CommDestroy({handle})\n\
                 call SCOREP_MpiCollectiveEnd({handle}, &\n\
                 \x20                            SCOREP_INVALID_ROOT_RANK, &\n\
                 \x20                            SCOREP_COLLECTIVE_DESTROY_HANDLE, &\n\
                 \x20                            0_c_int64_t, &\n\
                 \x20                            0_c_int64_t)\n"
            )),
        }
        Ok(())
    }
}

/// Registers the group named by the `new` attribute.
pub struct TaskGroupCreate;

impl TaskType<F08Hook> for TaskGroupCreate {
    fn name(&self) -> &'static str {
        "TaskGroupCreate"
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::PostPmpiCall]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_GROUP_NULL"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        let new: String = setup.attributes().get_as("new")?;
        Ok(setup.mapping().rename("group_new", &new)?.build())
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let group = cx.param("group_new")?;
        out.push(format!(
            "if ({group} .ne. MPI_GROUP_NULL) then\n    call scorep_mpi_group_create({group})\nend if\n"
        ));
        Ok(())
    }
}

pub struct TaskGroupFree;

impl TaskType<F08Hook> for TaskGroupFree {
    fn name(&self) -> &'static str {
        "TaskGroupFree"
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::PrePmpiCall]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("group")?.build())
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push(format!("call scorep_mpi_group_free({})\n", cx.param("group")?));
        Ok(())
    }
}

pub struct TaskCommSetName;

impl TaskType<F08Hook> for TaskCommSetName {
    fn name(&self) -> &'static str {
        "TaskCommSetName"
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::PostPmpiCall]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_SUCCESS"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .param("comm")?
            .param("comm_name")?
            .param("ierror")?
            .build())
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push(format!(
            "if ( {} .eq. MPI_SUCCESS ) then\n    call scorep_mpi_comm_set_name( {}, {} )\nend if\n",
            cx.param("ierror")?,
            cx.param("comm")?,
            cx.param("comm_name")?
        ));
        Ok(())
    }
}
