//! Naming conventions of library procedures.
//!
//! Canonical names are lower case with the `mpi_` prefix and without the
//! large-count `_c` suffix, e.g. `mpi_send` for both `MPI_Send` and
//! `MPI_Send_c`.

use regex::Regex;
use std::sync::LazyLock;

static PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^P?MPI_").expect("valid regex"));
static POSTFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)_C$").expect("valid regex"));

pub fn remove_prefix(name: &str) -> String {
    PREFIX.replace(name, "").into_owned()
}

pub fn remove_postfix(name: &str) -> String {
    POSTFIX.replace(name, "").into_owned()
}

/// Name without prefix and large-count suffix, case untouched.
pub fn bare(name: &str) -> String {
    remove_prefix(&remove_postfix(name))
}

pub fn canonical_name(name: &str) -> String {
    format!("mpi_{}", bare(name).to_lowercase())
}

pub fn is_canonical(name: &str) -> bool {
    canonical_name(name) == name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_strips_prefix_and_postfix() {
        assert_eq!(bare("MPI_Send_c"), "Send");
        assert_eq!(bare("PMPI_Allreduce"), "Allreduce");
        assert_eq!(bare("mpi_comm_create"), "comm_create");
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("MPI_Isend_c"), "mpi_isend");
        assert!(is_canonical("mpi_isend"));
        assert!(!is_canonical("MPI_Isend"));
    }
}
