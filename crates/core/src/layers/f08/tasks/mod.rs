//! Task types of the Fortran 2008 layer

pub mod collectives;
pub mod common;
pub mod comms;
pub mod env;
pub mod p2p;
pub mod requests;
pub mod topo;

use std::sync::LazyLock;

pub use collectives::*;
pub use common::*;
pub use comms::*;
pub use env::*;
pub use p2p::*;
pub use requests::*;
pub use topo::*;

use super::F08Hook;
use crate::registry::TaskRegistry;
use crate::task::TaskRef;
use crate::types::Layer;

const TASKS: &[TaskRef<F08Hook>] = &[
    &TaskDefault,
    &TaskTodo,
    &TaskFatal,
    &TaskGetRequestId,
    &TaskSend,
    &TaskRecv,
    &TaskIsend,
    &TaskIrecv,
    &TaskSendInit,
    &TaskRecvInit,
    &TaskCommHandle,
    &TaskGetSendBytes,
    &TaskGetRecvBytes,
    &TaskGetRecvBytesFromStatus,
    &TaskCollectiveCommunication,
    &TaskNonblockingCollectiveCommunication,
    &TaskCollectiveCommunicationByteCalc,
    &TaskCommCreateBase,
    &TaskCommCreate,
    &TaskIntercommCreate,
    &TaskCommCreateRequest,
    &TaskCommFree,
    &TaskGroupCreate,
    &TaskGroupFree,
    &TaskCommSetName,
    &TaskXreqtestEnabled,
    &TaskSaveRequestArray,
    &TaskWait,
    &TaskWaitall,
    &TaskWaitany,
    &TaskTest,
    &TaskTestall,
    &TaskTestany,
    &TaskTestWaitSome,
    &TaskStart,
    &TaskStartall,
    &TaskRequestGetStatus,
    &TaskCancel,
    &TaskRequestFree,
    &TaskUseEnvGlobals,
    &TaskCommCreateWorldSelf,
    &TaskCommDestroyWorldSelf,
    &TaskInitialize,
    &TaskFinalize,
    &TaskCheckFinalized,
    &TaskDisableEventsOutsideMeasurement,
    &TaskCartCreate,
];

static REGISTRY: LazyLock<TaskRegistry<F08Hook>> =
    LazyLock::new(|| TaskRegistry::builder(Layer::F08).with_tasks(TASKS).build());

pub fn registry() -> &'static TaskRegistry<F08Hook> {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DependencyErrorKind;
    use crate::layers::{BindingLayer, F08Wrapper, WrapperOptions};
    use crate::task::Attributes;
    use crate::types::{Binding, Direction, IgnoreHandling, Parameter, ProcedureDescriptor, Version};
    use serde_json::json;

    fn ierror() -> Parameter {
        let mut p = Parameter::new(Binding::new("ierror", "INTEGER").with_attribute("OPTIONAL"));
        p.direction = Direction::Out;
        p.internal_replacement = true;
        p
    }

    /// Procedure with the given `(name, type)` dummies plus a trailing
    /// optional `ierror`.
    fn procedure(name: &str, params: &[(&str, &str)]) -> ProcedureDescriptor {
        params
            .iter()
            .fold(ProcedureDescriptor::new(name, Version::new(3, 0)), |p, (n, ty)| {
                p.with_parameter(Parameter::new(Binding::new(*n, *ty)))
            })
            .with_parameter(ierror())
    }

    fn wrapper(p: ProcedureDescriptor) -> F08Wrapper {
        let options = WrapperOptions {
            group: "test".to_string(),
            ..Default::default()
        };
        F08Wrapper::new(p, &options).unwrap()
    }

    fn code(w: &F08Wrapper) -> String {
        w.generate().unwrap().concat()
    }

    fn isend() -> ProcedureDescriptor {
        procedure(
            "MPI_Isend",
            &[
                ("buf", "TYPE(*)"),
                ("count", "INTEGER"),
                ("datatype", "TYPE(MPI_Datatype)"),
                ("dest", "INTEGER"),
                ("tag", "INTEGER"),
                ("comm", "TYPE(MPI_Comm)"),
                ("request", "TYPE(MPI_Request)"),
            ],
        )
    }

    #[test]
    fn test_registry_matches_c_layer() {
        assert_eq!(registry().layer(), Layer::F08);
        let mut names = registry().list_tasks();
        assert_eq!(names.len(), TASKS.len());
        names.retain(|name| *name != "TaskUseEnvGlobals");
        assert_eq!(names, crate::layers::c::tasks::registry().list_tasks());
    }

    #[test]
    fn test_isend_uses_internal_ierror() {
        let mut w = wrapper(isend());
        w.attach(&TaskIsend, Attributes::new()).unwrap();
        let names: Vec<_> = w.wrapper().attached_tasks().iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec!["TaskCommHandle", "TaskGetRequestId", "TaskGetSendBytes", "TaskIsend"]
        );

        let code = code(&w);
        assert!(code.contains("integer(SCOREP_MpiRequestId) :: local_request_id\n"));
        assert!(code.contains(
            "    call SCOREP_MpiIsend( dest, local_comm_handle, tag, local_send_bytes, local_request_id )\n"
        ));
        assert!(code.contains("if ( dest .ne. MPI_PROC_NULL .and.  internal_ierror .eq. MPI_SUCCESS ) then\n"));
        assert!(code.contains("    call scorep_mpi_request_p2p_create( request,&\n"));
        assert!(code.contains("MPI_SUCCESS, &\n"));
    }

    #[test]
    fn test_recv_init_is_persistent() {
        let p = procedure(
            "MPI_Recv_init",
            &[
                ("buf", "TYPE(*)"),
                ("count", "INTEGER"),
                ("datatype", "TYPE(MPI_Datatype)"),
                ("source", "INTEGER"),
                ("tag", "INTEGER"),
                ("comm", "TYPE(MPI_Comm)"),
                ("request", "TYPE(MPI_Request)"),
            ],
        );
        let mut w = wrapper(p);
        w.attach(&TaskRecvInit, Attributes::new()).unwrap();
        let code = code(&w);
        assert!(code.contains("    local_recv_bytes = count * local_recv_type_size\n"));
        assert!(code.contains("        SCOREP_MPI_REQUEST_FLAG_IS_PERSISTENT, &\n"));
        assert!(code.contains("        source, &\n"));
        assert!(!code.contains("local_comm_handle"));
    }

    #[test]
    fn test_collective_in_place_check() {
        let mut sendbuf = Parameter::new(Binding::new("sendbuf", "TYPE(*)"));
        sendbuf.buffer = true;
        let p = ProcedureDescriptor::new("MPI_Reduce", Version::new(1, 0))
            .with_parameter(sendbuf)
            .with_parameter(Parameter::new(Binding::new("recvbuf", "TYPE(*)")))
            .with_parameter(Parameter::new(Binding::new("count", "INTEGER")))
            .with_parameter(Parameter::new(Binding::new("datatype", "TYPE(MPI_Datatype)")))
            .with_parameter(Parameter::new(Binding::new("op", "TYPE(MPI_Op)")))
            .with_parameter(Parameter::new(Binding::new("root", "INTEGER")))
            .with_parameter(Parameter::new(Binding::new("comm", "TYPE(MPI_Comm)")))
            .with_parameter(ierror());
        let mut w = wrapper(p);
        w.attach(&TaskCollectiveCommunication, Attributes::new()).unwrap();
        let code = code(&w);
        assert!(code.contains("logical(c_bool) :: local_in_place\n"));
        assert!(code.contains("local_send_bytes = 0_c_int64_t\n"));
        assert!(code.contains(
            "#if ( defined( HAVE_F08_TS_BUFFERS_MPI_REDUCE ) && HAVE_F08_TS_BUFFERS_MPI_REDUCE )\n\
             \x20   local_in_place = scorep_mpi_is_in_place_ts(sendbuf)\n#else\n"
        ));
        assert!(code.contains(
            "call scorep_mpi_coll_bytes_reduce(count, datatype, root, local_in_place, comm, local_send_bytes, local_recv_bytes)\n"
        ));
        assert!(code.contains("scorep_mpi_get_scorep_mpi_rank(root), &\n"));
        assert!(code.contains("SCOREP_COLLECTIVE_REDUCE, &\n"));
    }

    #[test]
    fn test_nonblocking_barrier() {
        let p = procedure("MPI_Ibarrier", &[("comm", "TYPE(MPI_Comm)"), ("request", "TYPE(MPI_Request)")]);
        let mut w = wrapper(p);
        w.attach(&TaskNonblockingCollectiveCommunication, Attributes::new())
            .unwrap();
        let code = code(&w);
        assert!(code.contains("call scorep_mpi_coll_bytes_barrier(comm, local_send_bytes, local_recv_bytes)\n"));
        assert!(code.contains("if ( internal_ierror .eq. MPI_SUCCESS ) then\n"));
        assert!(code.contains("SCOREP_INVALID_ROOT_RANK, &\n"));
    }

    fn comm_split() -> ProcedureDescriptor {
        procedure(
            "MPI_Comm_split",
            &[
                ("comm", "TYPE(MPI_Comm)"),
                ("color", "INTEGER"),
                ("key", "INTEGER"),
                ("newcomm", "TYPE(MPI_Comm)"),
            ],
        )
    }

    #[test]
    fn test_comm_create_new_or_self() {
        let attrs = Attributes::new()
            .with("new", json!("newcomm"))
            .with("parent", json!("comm"))
            .with("collective_end_mode", json!("new_or_self"));
        let mut w = wrapper(comm_split());
        w.attach(&TaskCommCreate, attrs).unwrap();
        let code = code(&w);
        assert!(code.contains("local_comm_handle = scorep_mpi_comm_handle(comm)\n"));
        assert!(code.contains("local_new_comm_handle = SCOREP_INVALID_INTERIM_COMMUNICATOR\n"));
        assert!(code.contains(
            "if (newcomm .ne. MPI_COMM_NULL) then\n    local_new_comm_handle = scorep_mpi_comm_create(newcomm, comm)\nend if\n"
        ));
        assert!(code.contains("    local_new_comm_handle = scorep_mpi_comm_handle(MPI_COMM_SELF)\nend if\n"));
        assert!(code.contains("call SCOREP_MpiCollectiveEnd(local_new_comm_handle, &\n"));
        assert!(code.contains("MPI_COMM_NULL, &\nMPI_COMM_SELF, &\n"));
    }

    #[test]
    fn test_comm_free_and_set_name() {
        let p = procedure("MPI_Comm_free", &[("comm", "TYPE(MPI_Comm)")]);
        let mut w = wrapper(p);
        w.attach(&TaskCommFree, Attributes::new()).unwrap();
        let free = code(&w);
        assert!(free.contains("local_comm_handle = scorep_mpi_comm_handle(comm)\n"));
        assert!(free.contains("call scorep_mpi_comm_free(comm)\n"));
        assert!(free.contains("call SCOREP_CommDestroy(local_comm_handle)\n"));

        let p = procedure(
            "MPI_Comm_set_name",
            &[("comm", "TYPE(MPI_Comm)"), ("comm_name", "CHARACTER(LEN=*)")],
        );
        let mut w = wrapper(p);
        w.attach(&TaskCommSetName, Attributes::new()).unwrap();
        assert!(code(&w).contains(
            "if ( internal_ierror .eq. MPI_SUCCESS ) then\n    call scorep_mpi_comm_set_name( comm, comm_name )\nend if\n"
        ));
    }

    #[test]
    fn test_waitall_with_ignorable_statuses() {
        let mut statuses = Parameter::new(Binding::new("array_of_statuses", "TYPE(MPI_Status)").with_dim("*"));
        statuses.direction = Direction::Out;
        statuses.internal_replacement = true;
        statuses.ignore_handling = IgnoreHandling::Statuses {
            length: "count".to_string(),
        };
        let p = ProcedureDescriptor::new("MPI_Waitall", Version::new(1, 0))
            .with_parameter(Parameter::new(Binding::new("count", "INTEGER")))
            .with_parameter(Parameter::new(
                Binding::new("array_of_requests", "TYPE(MPI_Request)").with_dim("count"),
            ))
            .with_parameter(statuses)
            .with_parameter(ierror());
        let mut w = wrapper(p);
        w.attach(&TaskWaitall, Attributes::new()).unwrap();
        let code = code(&w);
        assert!(code.contains("TYPE(MPI_Status), DIMENSION(:), POINTER :: internal_array_of_statuses\n"));
        assert!(code.contains("call scorep_mpi_save_request_array( array_of_requests ) \n"));
        assert!(code.contains(
            "xreqtest_enabled = (logical(scorep_mpi_is_event_gen_on()) .and. (iand(scorep_mpi_enabled, SCOREP_MPI_ENABLED_XREQTEST) .gt. 0))\n"
        ));
        assert!(code.contains("call scorep_mpi_check_all_or_none( count, .true., internal_array_of_statuses )\n"));
    }

    #[test]
    fn test_startall_loop() {
        let p = procedure(
            "MPI_Startall",
            &[("count", "INTEGER"), ("array_of_requests", "TYPE(MPI_Request)")],
        );
        let mut w = wrapper(p);
        w.attach(&TaskStartall, Attributes::new()).unwrap();
        assert!(code(&w).contains(
            "do local_i = 1, count\n    call scorep_mpi_request_start( array_of_requests(local_i) )\nend do\n"
        ));
    }

    #[test]
    fn test_request_free_conflicts_with_later_post_call_tasks() {
        let p = procedure("MPI_Request_free", &[("request", "TYPE(MPI_Request)")]);
        let mut w = wrapper(p);
        w.attach(&TaskRequestFree, Attributes::new()).unwrap();
        let code = code(&w);
        assert!(code.contains("local_got_null_request = (request .eq. MPI_REQUEST_NULL)\n"));
        assert!(code.contains(
            "call scorep_mpi_request_free_wrapper(request)\nif ( request .ne. MPI_REQUEST_NULL .or. local_got_null_request ) then \n"
        ));

        let p = procedure(
            "MPI_Wait",
            &[("request", "TYPE(MPI_Request)"), ("status", "TYPE(MPI_Status)")],
        );
        let mut w = wrapper(p);
        w.attach(&TaskWait, Attributes::new()).unwrap();
        let err = w.attach(&TaskRequestFree, Attributes::new()).unwrap_err();
        assert_eq!(err.dependency_kind(), Some(DependencyErrorKind::Conflict));
    }

    #[test]
    fn test_fatal_stops_the_program() {
        let mut w = wrapper(isend());
        w.attach(&TaskFatal, Attributes::new().with("message", json!("unsupported")))
            .unwrap();
        let code = code(&w);
        assert!(code.contains("!> Aborts the measurement.\n"));
        assert!(code.contains("print *, \"[Score-P] Fatal: \", &\n \"unsupported\"\nERROR STOP\n"));
    }

    fn init_thread() -> ProcedureDescriptor {
        procedure(
            "MPI_Init_thread",
            &[("required", "INTEGER"), ("provided", "INTEGER")],
        )
    }

    #[test]
    fn test_initialize_uses_env_globals() {
        let mut w = wrapper(init_thread());
        w.attach(&TaskInitialize, Attributes::new()).unwrap();
        let names: Vec<_> = w.wrapper().attached_tasks().iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec!["TaskCommCreateWorldSelf", "TaskUseEnvGlobals", "TaskInitialize"]
        );

        let code = code(&w);
        assert!(code.contains("use :: SCOREP_MPI_Env_globals, only : mpi_finalize_called\n"));
        assert!(code.contains("PMPI_Finalized, &\nPMPI_Init_thread, &\nPMPI_Initialized\n"));
        assert!(code.contains("logical :: fflag\n"));
        assert!(code.contains("iflag = .false.\n"));
        assert!(code.contains(
            "mpi_finalize_called =.false.\nif (logical(scorep_is_measurement_phase(SCOREP_MEASUREMENT_PHASE_PRE_C)))  then\n"
        ));
        assert!(code.contains("if (internal_ierror .eq. MPI_SUCCESS) then\n"));
        assert!(code.contains("if ((required .eq. MPI_THREAD_FUNNELED) .and. (provided .ge. MPI_THREAD_FUNNELED) &\n"));
        assert!(code.contains("print *, \"[Score-P] Warning: \", &\n"));
        assert!(code.contains("call PMPI_Initialized(iflag, local_ierror)\n"));
        assert!(code.contains("        call SCOREP_InitMppMeasurement()\n"));
        assert!(code.contains("                              SCOREP_COLLECTIVE_CREATE_HANDLE, &\n"));
    }

    #[test]
    fn test_finalize_and_check_finalized() {
        let mut w = wrapper(procedure("MPI_Finalize", &[]));
        w.attach(&TaskFinalize, Attributes::new()).unwrap();
        let finalize = code(&w);
        assert!(finalize.contains("! if the user didn't do so already\ncall scorep_mpi_comm_set_default_names()\n"));
        assert!(finalize.contains("call SCOREP_RegisterExitHandler()\n"));
        assert!(finalize.contains("call SCOREP_CommDestroy( SCOREP_MPI_COMM_HANDLE( MPI_COMM_SELF ) )\n"));

        let mut w = wrapper(procedure("MPI_Finalized", &[("flag", "LOGICAL")]));
        w.attach(&TaskCheckFinalized, Attributes::new()).unwrap();
        assert!(code(&w).contains(
            "if ( internal_ierror .eq. MPI_SUCCESS .and. mpi_finalize_called ) then\n    flag = .true.\nend if\n"
        ));
        assert!(w.wrapper().has_task("TaskUseEnvGlobals"));
    }

    #[test]
    fn test_events_disabled_outside_measurement() {
        let mut w = wrapper(procedure("MPI_Wtime", &[]));
        w.attach(&TaskDisableEventsOutsideMeasurement, Attributes::new())
            .unwrap();
        let code = code(&w);
        assert!(code.contains("!> Events are only recorded inside the measurement phase.\n"));
        assert!(code.contains(
            "event_gen_active = event_gen_active .and. (logical(scorep_is_measurement_phase(SCOREP_MEASUREMENT_PHASE_WITHIN_C)))\n"
        ));
    }

    #[test]
    fn test_cart_create_defines_topology() {
        let p = procedure(
            "MPI_Cart_create",
            &[
                ("comm_old", "TYPE(MPI_Comm)"),
                ("ndims", "INTEGER"),
                ("reorder", "LOGICAL"),
                ("comm_cart", "TYPE(MPI_Comm)"),
            ],
        );
        let mut w = wrapper(p);
        w.attach(&TaskCartCreate, Attributes::new().with("prefix", json!("MPI_Cartesian")))
            .unwrap();
        let code = code(&w);
        assert!(code.contains("MPI_COMM_NULL"));
        assert!(code.contains(
            "if ( comm_cart .ne. MPI_COMM_NULL .and. scorep_mpi_enable_topologies ) then\n    call scorep_mpi_topo_create_cart_definition(\"MPI_Cartesian\", comm_cart)\nend if\n"
        ));
    }
}
