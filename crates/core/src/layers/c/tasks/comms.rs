//! Communicator and group management
//!
//! Constructors share the `new` and `parent` attributes through
//! [`TaskCommCreateBase`]. Both name procedure parameters; a `null` parent
//! stands for `MPI_COMM_NULL`.

use super::common::TaskGetRequestId;
use crate::error::Result;
use crate::hooks::Fragments;
use crate::layers::c::CHook;
use crate::layers::collectives::CollectiveEndMode;
use crate::task::{TaskContext, TaskRef, TaskSetup, TaskType};
use crate::types::{Binding, Scope, Variable};

/// Internal name of the parameter receiving the new communicator.
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

impl TaskType<CHook> for TaskCommCreateBase {
    fn name(&self) -> &'static str {
        "TaskCommCreateBase"
    }
}

/// Blocking communicator constructor.
pub struct TaskCommCreate;

impl TaskCommCreate {
    fn locals() -> Scope<Variable> {
        Scope::from_named([
            Variable::new(Binding::new("local_comm_handle", "SCOREP_InterimCommunicatorHandle")),
            Variable::initialized(
                Binding::new("local_new_comm_handle", "SCOREP_InterimCommunicatorHandle"),
                "SCOREP_INVALID_INTERIM_COMMUNICATOR",
            ),
        ])
    }

    const HOOKS: &'static [CHook] = &[
        CHook::Initialization,
        CHook::EnterIfGroupActive,
        CHook::PostPmpiCall,
        CHook::ExitIfGroupActive,
    ];

    fn emit_common(hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let comm_handle = cx.local("local_comm_handle")?;
        let new_handle = cx.local("local_new_comm_handle")?;
        match hook {
            CHook::Initialization => {
                if has_comm_parent(cx) {
                    out.push(format!(
                        "{comm_handle} = SCOREP_MPI_COMM_HANDLE({});\n",
                        comm_parent(cx)?
                    ));
                } else {
                    out.push(format!("{comm_handle} = SCOREP_INVALID_INTERIM_COMMUNICATOR;\n"));
                }
            }
            CHook::EnterIfGroupActive => out.push("SCOREP_MpiCollectiveBegin();\n"),
            CHook::PostPmpiCall => {
                let new = comm_new(cx)?;
                out.push(format!(
                    "if ( *{new} != MPI_COMM_NULL )\n{{\n    {new_handle} = scorep_mpi_comm_create(*{new}, {});\n}}\n",
                    comm_parent(cx)?
                ));
            }
            _ => {
                let mode: CollectiveEndMode = cx.attributes().get_as("collective_end_mode")?;
                out.push(format!(
                    "if ( {new_handle} != SCOREP_INVALID_INTERIM_COMMUNICATOR )\n{{\n    SCOREP_CommCreate({new_handle});\n}}\n"
                ));
                if mode == CollectiveEndMode::NewOrSelf {
                    out.push(format!(
                        "else\n{{\n    /* The communicator creation was a local operation, hence we use MPI_COMM_SELF for the collective */\n    {new_handle} = SCOREP_MPI_COMM_HANDLE(MPI_COMM_SELF);\n}}\n"
                    ));
                }
                let end_handle = match mode {
                    CollectiveEndMode::Parent => comm_handle,
                    CollectiveEndMode::NewOrSelf => new_handle,
                };
                out.push(format!(
                    "SCOREP_MpiCollectiveEnd({end_handle},\n\
                     \x20                       SCOREP_INVALID_ROOT_RANK,\n\
                     \x20                       SCOREP_COLLECTIVE_CREATE_HANDLE,\n\
                     \x20                       0,\n\
                     \x20                       0);\n"
                ));
            }
        }
        Ok(())
    }
}

impl TaskType<CHook> for TaskCommCreate {
    fn name(&self) -> &'static str {
        "TaskCommCreate"
    }

    fn parent(&self) -> Option<TaskRef<CHook>> {
        Some(&TaskCommCreateBase)
    }

    fn hooks(&self) -> &'static [CHook] {
        Self::HOOKS
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Self::locals())
    }

    fn emit(&self, hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        Self::emit_common(hook, cx, out)
    }
}

/// Intercommunicator constructor. Only the local leader passes the peer
/// communicator as parent.
pub struct TaskIntercommCreate;

impl TaskType<CHook> for TaskIntercommCreate {
    fn name(&self) -> &'static str {
        "TaskIntercommCreate"
    }

    fn parent(&self) -> Option<TaskRef<CHook>> {
        Some(&TaskCommCreate)
    }

    fn hooks(&self) -> &'static [CHook] {
        TaskCommCreate::HOOKS
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("local_comm")?.param("local_leader")?.build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        let mut locals = TaskCommCreate::locals();
        locals.set("local_rank", Variable::new(Binding::new("local_rank", "int")));
        Ok(locals)
    }

    fn emit(&self, hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        if hook != CHook::PostPmpiCall {
            return TaskCommCreate::emit_common(hook, cx, out);
        }
        let new = comm_new(cx)?;
        let new_handle = cx.local("local_new_comm_handle")?;
        let rank = cx.local("local_rank")?;
        out.push(format!(
            "if ( *{new} != MPI_COMM_NULL )\n\
             {{\n\
             \x20   /* The semantic of the peer communicator only requires a useful\n\
             \x20    * communicator on the respective local leader rank.\n\
             \x20    * To avoid unnecessary duplicates use MPI_COMM_NULL for all other\n\
             \x20    * ranks in the place of the parent/peer communicator.\n\
             \x20    */\n\
             \x20   PMPI_Comm_rank( {}, &{rank} );\n\
             \x20   if ( {} == {rank} )\n\
             \x20   {{\n\
             \x20       {new_handle} = scorep_mpi_comm_create( *{new}, {} );\n\
             \x20   }}\n\
             \x20   else\n\
             \x20   {{\n\
             \x20       {new_handle} = scorep_mpi_comm_create( *{new}, MPI_COMM_NULL );\n\
             \x20   }}\n\
             }}\n",
            cx.param("local_comm")?,
            cx.param("local_leader")?,
            comm_parent(cx)?
        ));
        Ok(())
    }
}

/// Nonblocking communicator constructor, completed through its request.
pub struct TaskCommCreateRequest;

impl TaskType<CHook> for TaskCommCreateRequest {
    fn name(&self) -> &'static str {
        "TaskCommCreateRequest"
    }

    fn parent(&self) -> Option<TaskRef<CHook>> {
        Some(&TaskCommCreateBase)
    }

    fn dependencies(&self) -> &'static [TaskRef<CHook>] {
        const DEPS: &[TaskRef<CHook>] = &[&TaskGetRequestId];
        DEPS
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::EnterIfGroupActive, CHook::PostPmpiCall]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("request")?.build())
    }

    fn emit(&self, hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let request_id = cx.local("local_request_id")?;
        if hook == CHook::EnterIfGroupActive {
            out.push(format!(
                "SCOREP_MpiNonBlockingCollectiveRequest( {request_id} );\n"
            ));
        } else {
            out.push(format!(
                "if ( return_value == MPI_SUCCESS )\n{{\n     scorep_mpi_request_comm_idup_create( *{}, {}, {}, {request_id});\n}}\n",
                cx.param("request")?,
                comm_parent(cx)?,
                comm_new(cx)?
            ));
        }
        Ok(())
    }
}

pub struct TaskCommFree;

impl TaskType<CHook> for TaskCommFree {
    fn name(&self) -> &'static str {
        "TaskCommFree"
    }

    fn hooks(&self) -> &'static [CHook] {
        &[
            CHook::Initialization,
            CHook::EnterIfGroupActive,
            CHook::PrePmpiCall,
            CHook::ExitIfGroupActive,
        ]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("comm")?.build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([Variable::new(Binding::new(
            "local_comm_handle",
            "SCOREP_InterimCommunicatorHandle",
        ))]))
    }

    fn emit(&self, hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let comm = cx.param("comm")?;
        let handle = cx.local("local_comm_handle")?;
        match hook {
            CHook::Initialization => {
                out.push(format!("{handle} = SCOREP_MPI_COMM_HANDLE(*{comm});\n"))
            }
            CHook::EnterIfGroupActive => out.push("SCOREP_MpiCollectiveBegin();\n"),
            CHook::PrePmpiCall => out.push(format!("scorep_mpi_comm_free(*{comm});\n")),
            _ => out.push(format!(
                "SCOREP_CommDestroy( {handle} );\n\
                 SCOREP_MpiCollectiveEnd( {handle},\n\
                 \x20                        SCOREP_INVALID_ROOT_RANK,\n\
                 \x20                        SCOREP_COLLECTIVE_DESTROY_HANDLE,\n\
                 \x20                        0,\n\
                 \x20                        0);\n"
            )),
        }
        Ok(())
    }
}

/// Registers the group named by the `new` attribute.
pub struct TaskGroupCreate;

impl TaskType<CHook> for TaskGroupCreate {
    fn name(&self) -> &'static str {
        "TaskGroupCreate"
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::PostPmpiCall]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        let new: String = setup.attributes().get_as("new")?;
        Ok(setup.mapping().rename("group_new", &new)?.build())
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let group = cx.param("group_new")?;
        out.push(format!(
            "if ( *{group} != MPI_GROUP_NULL )\n{{\n    scorep_mpi_group_create(*{group});\n}}\n"
        ));
        Ok(())
    }
}

pub struct TaskGroupFree;

impl TaskType<CHook> for TaskGroupFree {
    fn name(&self) -> &'static str {
        "TaskGroupFree"
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::PrePmpiCall]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("group")?.build())
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push(format!("scorep_mpi_group_free( *{} );\n", cx.param("group")?));
        Ok(())
    }
}

pub struct TaskCommSetName;

impl TaskType<CHook> for TaskCommSetName {
    fn name(&self) -> &'static str {
        "TaskCommSetName"
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::PostPmpiCall]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("comm")?.param("comm_name")?.build())
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push(format!(
            "if ( return_value == MPI_SUCCESS )\n{{\n    scorep_mpi_comm_set_name( {}, {} );\n}}\n",
            cx.param("comm")?,
            cx.param("comm_name")?
        ));
        Ok(())
    }
}
