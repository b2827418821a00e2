//! Process topologies

use crate::error::Result;
use crate::hooks::Fragments;
use crate::layers::c::CHook;
use crate::task::{TaskContext, TaskSetup, TaskType};
use crate::types::Scope;

/// Defines the cartesian topology of a new communicator. The `prefix`
/// attribute names the topology.
pub struct TaskCartCreate;

impl TaskType<CHook> for TaskCartCreate {
    fn name(&self) -> &'static str {
        "TaskCartCreate"
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::PostPmpiCall]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .any_of("comm_cart", &["comm_cart", "newcomm"])?
            .build())
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let prefix: String = cx.attributes().get_as("prefix")?;
        out.push(format!(
            "if ( *{comm} != MPI_COMM_NULL && scorep_mpi_enable_topologies )\n{{\n    \
             scorep_mpi_topo_create_cart_definition( \"{prefix}\", *{comm} );\n}}\n",
            comm = cx.param("comm_cart")?
        ));
        Ok(())
    }
}
