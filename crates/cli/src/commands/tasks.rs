use anyhow::{Context, Result};
use tracing::debug;
use wrapgen_core::{Layer, TaskDescription, describe_layer, layers};

use crate::display::print_tasks;

pub fn describe(layer: Layer) -> Result<Vec<TaskDescription>> {
    let tasks = match layer {
        Layer::C => describe_layer(layers::c::tasks::registry()),
        Layer::F08 => describe_layer(layers::f08::tasks::registry()),
    }
    .with_context(|| format!("Failed to describe the tasks of the {layer} layer"))?;
    debug!("Described {} tasks of the {} layer", tasks.len(), layer);
    Ok(tasks)
}

pub fn tasks_command(layer: Layer, json: bool) -> Result<()> {
    let tasks = describe(layer)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
    } else {
        print_tasks(&tasks);
    }
    Ok(())
}
