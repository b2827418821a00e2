//! Task types of the C layer

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

use super::CHook;
use crate::registry::TaskRegistry;
use crate::task::TaskRef;
use crate::types::Layer;

const TASKS: &[TaskRef<CHook>] = &[
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
    &TaskCommCreateWorldSelf,
    &TaskCommDestroyWorldSelf,
    &TaskInitialize,
    &TaskFinalize,
    &TaskCheckFinalized,
    &TaskDisableEventsOutsideMeasurement,
    &TaskCartCreate,
];

static REGISTRY: LazyLock<TaskRegistry<CHook>> =
    LazyLock::new(|| TaskRegistry::builder(Layer::C).with_tasks(TASKS).build());

/// Every task type of the C layer, by name.
pub fn registry() -> &'static TaskRegistry<CHook> {
    &REGISTRY
}
