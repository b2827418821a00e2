//! Generation driver
//!
//! Turns catalog records into wrapper text for one binding layer. In strict
//! mode every inconsistency is an error. In permissive mode the offending
//! procedure is replaced by a warning comment and reported as `todo`.

pub mod report;

use tracing::{debug, info, warn};

use crate::catalog::{Catalog, ProcedureRecord};
use crate::error::{Error, Result};
use crate::layers::{BindingLayer, CWrapper, F08Wrapper};
use crate::task::{Attributes, TaskRef};
use crate::types::{Layer, ProcedureDescriptor};

pub use report::{GenerationReport, LayerReport, LayerSummary, WrapperStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub strict: bool,
    /// Interleave hook trace comments with the output.
    pub debug: bool,
}

/// Text and statuses of one layer.
#[derive(Debug, Clone)]
pub struct LayerOutput {
    pub layer: Layer,
    pub text: String,
    pub report: LayerReport,
}

#[derive(Debug, Clone, Default)]
pub struct Generator {
    options: GeneratorOptions,
}

impl Generator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn strict() -> Self {
        Self::new(GeneratorOptions {
            strict: true,
            ..Default::default()
        })
    }

    pub fn permissive() -> Self {
        Self::new(GeneratorOptions::default())
    }

    pub fn options(&self) -> GeneratorOptions {
        self.options
    }

    /// Generates `selection` (or the whole catalog if empty) for `layer`.
    pub fn generate(&self, catalog: &Catalog, layer: Layer, selection: &[String]) -> Result<LayerOutput> {
        match layer {
            Layer::C => self.generate_layer::<CWrapper>(catalog, selection),
            Layer::F08 => self.generate_layer::<F08Wrapper>(catalog, selection),
        }
    }

    pub fn generate_layer<L: BindingLayer>(&self, catalog: &Catalog, selection: &[String]) -> Result<LayerOutput> {
        let mut report = LayerReport::new();
        let mut text = String::new();

        for record in self.select(catalog, selection)? {
            text.push_str(&self.generate_procedure::<L>(record, &mut report)?);
        }

        info!(
            "Generated {} wrappers for the {} layer ({} todo)",
            report.len(),
            L::LAYER,
            report.todo().len()
        );
        Ok(LayerOutput {
            layer: L::LAYER,
            text,
            report,
        })
    }

    fn select<'c>(&self, catalog: &'c Catalog, selection: &[String]) -> Result<Vec<&'c ProcedureRecord>> {
        if selection.is_empty() {
            return Ok(catalog.procedures.iter().collect());
        }
        let mut records = Vec::with_capacity(selection.len());
        for name in selection {
            match catalog.lookup(name) {
                Ok(record) => records.push(record),
                Err(e) if !self.options.strict => warn!("Skipping: {e}"),
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    fn generate_procedure<L: BindingLayer>(
        &self,
        record: &ProcedureRecord,
        report: &mut LayerReport,
    ) -> Result<String> {
        let name = record.canonical_name.as_str();
        if report.contains(name) {
            return Err(Error::AlreadyGenerated(name.to_string()));
        }
        debug!("Generating {name} for the {} layer", L::LAYER);

        let result = if record.signature(L::LAYER).is_none() {
            Err(record.not_expressible(L::LAYER))
        } else {
            self.generate_wrappers::<L>(record)
        };

        match result {
            Ok((text, status)) => {
                report.record(name, status)?;
                Ok(text)
            }
            Err(e) if !self.options.strict => {
                warn!("{e}");
                report.record(name, WrapperStatus::Todo)?;
                Ok(L::placeholder(name, &e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// The regular wrapper, followed by the large-count one if the record
    /// has it. The status is that of the regular wrapper.
    fn generate_wrappers<L: BindingLayer>(&self, record: &ProcedureRecord) -> Result<(String, WrapperStatus)> {
        let wrapper = self.make_wrapper::<L>(record, record.descriptor(L::LAYER)?)?;
        let mut text = wrapper.generate()?.concat();
        let status = if wrapper.wrapper().has_task(L::todo_task().name()) {
            WrapperStatus::Todo
        } else {
            WrapperStatus::Done
        };

        if let Some(embiggened) = record.embiggened_descriptor(L::LAYER)? {
            text.push('\n');
            text.push_str(&self.make_wrapper::<L>(record, embiggened)?.generate()?.concat());
        }
        Ok((text, status))
    }

    /// Builds a wrapper for `procedure` and attaches the record's tasks.
    pub fn make_wrapper<L: BindingLayer>(
        &self,
        record: &ProcedureRecord,
        procedure: ProcedureDescriptor,
    ) -> Result<L> {
        let options = record.options(self.options.debug, self.options.strict);
        let mut wrapper = L::new_wrapper(procedure, &options)?;

        for task in record.tasks_for(L::LAYER) {
            match public_task::<L>(&task.type_name) {
                Some(ty) => wrapper.attach(ty, task.attributes.clone())?,
                None => {
                    let err = Error::UnknownTask {
                        layer: L::LAYER.to_string(),
                        name: task.type_name.clone(),
                    };
                    if self.options.strict {
                        return Err(err);
                    }
                    warn!("{}: {err}", record.canonical_name);
                    let message = format!(
                        "The task {} is not implemented in the {} layer",
                        task.type_name,
                        L::LAYER
                    );
                    wrapper.attach(L::todo_task(), Attributes::new().with("message", message))?;
                }
            }
        }

        if wrapper.wrapper().attached_tasks().is_empty() {
            let message = format!(
                "Implement more than the default behavior for {}",
                record.canonical_name
            );
            wrapper.attach(L::todo_task(), Attributes::new().with("message", message))?;
        }
        Ok(wrapper)
    }
}

/// Task types a catalog may name. Auxiliaries are only attached implicitly.
fn public_task<L: BindingLayer>(name: &str) -> Option<TaskRef<L::Hook>> {
    L::registry().get(name).filter(|t| !t.is_auxiliary())
}
