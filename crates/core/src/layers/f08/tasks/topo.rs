//! Process topologies

use crate::error::Result;
use crate::hooks::Fragments;
use crate::layers::f08::F08Hook;
use crate::task::{TaskContext, TaskSetup, TaskType};
use crate::types::Scope;

pub struct TaskCartCreate;

impl TaskType<F08Hook> for TaskCartCreate {
    fn name(&self) -> &'static str {
        "TaskCartCreate"
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::PostPmpiCall]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_COMM_NULL"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .any_of("comm_cart", &["comm_cart", "newcomm"])?
            .build())
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let prefix: String = cx.attributes().get_as("prefix")?;
        out.push(format!(
            "if ( {comm} .ne. MPI_COMM_NULL .and. scorep_mpi_enable_topologies ) then\n    \
             call scorep_mpi_topo_create_cart_definition(\"{prefix}\", {comm})\nend if\n",
            comm = cx.param("comm_cart")?
        ));
        Ok(())
    }
}
