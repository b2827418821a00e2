use std::collections::BTreeMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::types::Layer;

/// Outcome of one generated procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapperStatus {
    Done,
    /// A `TaskTodo` is attached, or the wrapper is a placeholder.
    Todo,
}

/// Statuses of the procedures generated for one layer, in generation order.
#[derive(Debug, Clone, Default)]
pub struct LayerReport {
    statuses: IndexMap<String, WrapperStatus>,
}

impl LayerReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails if `name` was already recorded.
    pub fn record(&mut self, name: &str, status: WrapperStatus) -> Result<()> {
        if self.statuses.contains_key(name) {
            return Err(Error::AlreadyGenerated(name.to_string()));
        }
        self.statuses.insert(name.to_string(), status);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.statuses.contains_key(name)
    }

    pub fn status(&self, name: &str) -> Option<WrapperStatus> {
        self.statuses.get(name).copied()
    }

    fn with_status(&self, status: WrapperStatus) -> Vec<String> {
        let mut names: Vec<String> = self
            .statuses
            .iter()
            .filter(|(_, s)| **s == status)
            .map(|(n, _)| n.clone())
            .collect();
        names.sort();
        names
    }

    pub fn done(&self) -> Vec<String> {
        self.with_status(WrapperStatus::Done)
    }

    pub fn todo(&self) -> Vec<String> {
        self.with_status(WrapperStatus::Todo)
    }

    /// Procedures of `catalog` expressible in `layer` that were not generated.
    pub fn not_seen(&self, catalog: &Catalog, layer: Layer) -> Vec<String> {
        let mut names: Vec<String> = catalog
            .procedures
            .iter()
            .filter(|p| p.signature(layer).is_some() && !self.contains(&p.canonical_name))
            .map(|p| p.canonical_name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

/// Serialized form of a [`LayerReport`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayerSummary {
    #[serde(rename = "not seen")]
    pub not_seen: Vec<String>,
    pub todo: Vec<String>,
    pub done: Vec<String>,
}

impl LayerSummary {
    pub fn total(&self) -> usize {
        self.not_seen.len() + self.todo.len() + self.done.len()
    }
}

/// Per-run report over all generated layers.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct GenerationReport {
    layers: BTreeMap<Layer, LayerSummary>,
}

impl GenerationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(&mut self, layer: Layer, report: &LayerReport, catalog: &Catalog) {
        self.layers.insert(
            layer,
            LayerSummary {
                not_seen: report.not_seen(catalog, layer),
                todo: report.todo(),
                done: report.done(),
            },
        );
    }

    pub fn layer(&self, layer: Layer) -> Option<&LayerSummary> {
        self.layers.get(&layer)
    }

    pub fn layers(&self) -> impl Iterator<Item = (Layer, &LayerSummary)> {
        self.layers.iter().map(|(l, s)| (*l, s))
    }

    /// One line per layer: `c: 3 done, 1 todo, 0 not seen (of 4)`.
    pub fn progress_lines(&self) -> Vec<String> {
        self.layers()
            .map(|(layer, s)| {
                format!(
                    "{layer}: {} done, {} todo, {} not seen (of {})",
                    s.done.len(),
                    s.todo.len(),
                    s.not_seen.len(),
                    s.total()
                )
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        info!("Wrote report to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json(
            r#"{ "procedures": [
                { "canonical_name": "mpi_send", "c": { "name": "MPI_Send" } },
                { "canonical_name": "mpi_recv", "c": { "name": "MPI_Recv" } },
                { "canonical_name": "mpi_wait", "c": { "name": "MPI_Wait" } },
                { "canonical_name": "mpi_sizeof", "f08": { "name": "MPI_Sizeof" } }
            ] }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_record_twice_fails() {
        let mut report = LayerReport::new();
        report.record("mpi_send", WrapperStatus::Done).unwrap();
        let err = report.record("mpi_send", WrapperStatus::Todo).unwrap_err();
        assert!(matches!(err, Error::AlreadyGenerated(name) if name == "mpi_send"));
        assert_eq!(report.status("mpi_send"), Some(WrapperStatus::Done));
    }

    #[test]
    fn test_summary_partitions_expressible_procedures() {
        let mut report = LayerReport::new();
        report.record("mpi_wait", WrapperStatus::Todo).unwrap();
        report.record("mpi_send", WrapperStatus::Done).unwrap();

        let mut run = GenerationReport::new();
        run.add_layer(Layer::C, &report, &catalog());
        let c = run.layer(Layer::C).unwrap();
        assert_eq!(c.done, vec!["mpi_send"]);
        assert_eq!(c.todo, vec!["mpi_wait"]);
        assert_eq!(c.not_seen, vec!["mpi_recv"]);
        assert_eq!(run.progress_lines(), vec!["c: 1 done, 1 todo, 1 not seen (of 3)"]);
        assert!(run.layer(Layer::F08).is_none());
    }

    #[test]
    fn test_report_json() {
        let mut report = LayerReport::new();
        report.record("mpi_sizeof", WrapperStatus::Done).unwrap();
        let mut run = GenerationReport::new();
        run.add_layer(Layer::F08, &report, &catalog());
        insta::assert_snapshot!(run.to_json().unwrap(), @r#"
        {
          "f08": {
            "not seen": [],
            "todo": [],
            "done": [
              "mpi_sizeof"
            ]
          }
        }
        "#);
    }
}
