//! Collective operation metadata shared by both layers

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::impl_case_insensitive_deserialize;
use crate::types::names;

static INIT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_init$").expect("valid regex"));
static NONBLOCKING_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^i").expect("valid regex"));
static NEIGHBOR_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^neighbor_").expect("valid regex"));

/// Which communicator closes the collective of a communicator constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectiveEndMode {
    Parent,
    NewOrSelf,
}

impl_case_insensitive_deserialize!(
    CollectiveEndMode,
    Parent => "parent",
    NewOrSelf => "new_or_self"
);

/// Arguments of a `scorep_mpi_coll_bytes_*` byte count helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectiveArgs {
    pub args: &'static [&'static str],
    /// Buffer compared against `MPI_IN_PLACE`.
    pub in_place: Option<&'static str>,
}

const fn coll(args: &'static [&'static str], in_place: Option<&'static str>) -> CollectiveArgs {
    CollectiveArgs { args, in_place }
}

const ROOTED_GATHER: &[&str] = &["sendcount", "sendtype", "recvcount", "recvtype", "root"];
const PAIRWISE: &[&str] = &["sendcount", "sendtype", "recvcount", "recvtype"];
const PAIRWISE_V: &[&str] = &["sendcounts", "sendtype", "recvcounts", "recvtype"];
const PAIRWISE_W: &[&str] = &["sendcounts", "sendtypes", "recvcounts", "recvtypes"];
const GATHER_V: &[&str] = &["sendcount", "sendtype", "recvcounts", "recvtype"];
const REDUCTION: &[&str] = &["count", "datatype"];

/// Byte count helper arguments per collective base name.
pub fn collective_args(base_name: &str) -> Option<CollectiveArgs> {
    let args = match base_name {
        "barrier" => coll(&[], None),
        "gather" => coll(ROOTED_GATHER, Some("sendbuf")),
        "reduce" => coll(&["count", "datatype", "root"], Some("sendbuf")),
        "gatherv" => coll(
            &["sendcount", "sendtype", "recvcounts", "recvtype", "root"],
            Some("sendbuf"),
        ),
        "bcast" => coll(&["count", "datatype", "root"], None),
        "scatter" => coll(ROOTED_GATHER, Some("recvbuf")),
        "scatterv" => coll(
            &["sendcounts", "sendtype", "recvcount", "recvtype", "root"],
            Some("recvbuf"),
        ),
        "alltoall" | "allgather" => coll(PAIRWISE, Some("sendbuf")),
        "alltoallv" => coll(PAIRWISE_V, Some("sendbuf")),
        "alltoallw" => coll(PAIRWISE_W, Some("sendbuf")),
        "allgatherv" => coll(GATHER_V, Some("sendbuf")),
        "allreduce" | "scan" | "exscan" => coll(REDUCTION, Some("sendbuf")),
        "reduce_scatter_block" => coll(&["recvcount", "datatype"], Some("sendbuf")),
        "reduce_scatter" => coll(&["recvcounts", "datatype"], Some("sendbuf")),
        "neighbor_alltoall" | "neighbor_allgather" => coll(PAIRWISE, None),
        "neighbor_alltoallv" => coll(PAIRWISE_V, None),
        "neighbor_alltoallw" => coll(PAIRWISE_W, None),
        "neighbor_allgatherv" => coll(GATHER_V, None),
        _ => return None,
    };
    Some(args)
}

/// Like [`collective_args`], failing for procedures that are not collectives.
pub fn lookup_collective(procedure: &str) -> Result<(String, CollectiveArgs)> {
    let base = collective_base_name(procedure);
    match collective_args(&base) {
        Some(args) => Ok((base, args)),
        None => Err(Error::Template(format!(
            "Unsupported collective '{base}' in {procedure}"
        ))),
    }
}

/// Lower case name without prefix, large-count suffix, `_init` suffix and
/// nonblocking `i` prefix: `MPI_Ibcast_init_c` becomes `bcast`.
pub fn collective_base_name(procedure: &str) -> String {
    let base = names::bare(procedure).to_lowercase();
    let base = INIT_SUFFIX.replace(&base, "");
    NONBLOCKING_PREFIX.replace(&base, "").into_owned()
}

/// Measurement constant naming the collective type.
pub fn scorep_collective_type(procedure: &str) -> String {
    let mut base = collective_base_name(procedure);
    if base == "bcast" {
        base = "broadcast".to_string();
    }
    let base = NEIGHBOR_PREFIX.replace(&base, "");
    format!("SCOREP_COLLECTIVE_{}", base.to_uppercase())
}
