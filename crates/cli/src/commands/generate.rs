use anyhow::{Context, Result};
use std::{env, fs, path::PathBuf};
use tracing::{debug, info};
use wrapgen_core::{Catalog, GenerationReport, Generator, GeneratorOptions, Layer, WrapgenConfig, names};

/// Command line settings of `generate`. Unset values fall back to the
/// configuration file.
#[derive(Debug, Clone, Default)]
pub struct GenerateArgs {
    pub catalog: Option<PathBuf>,
    pub layer: Option<Layer>,
    pub procedures: Vec<String>,
    pub output: Option<PathBuf>,
    pub report: Option<PathBuf>,
    /// `Some` when `--debug` or `--no-debug` was given.
    pub debug: Option<bool>,
    pub permissive: bool,
    pub sort: Option<bool>,
}

/// Settings after merging the command line over the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateSettings {
    pub catalog: PathBuf,
    pub layer: Layer,
    pub output: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub options: GeneratorOptions,
    pub sort: bool,
}

impl GenerateArgs {
    pub fn merge(self, config: WrapgenConfig) -> Result<(GenerateSettings, Vec<String>)> {
        let catalog = self
            .catalog
            .or(config.catalog)
            .context("No catalog given and none configured in .wrapgen.json")?;
        let settings = GenerateSettings {
            catalog,
            layer: self.layer.unwrap_or(config.layer),
            output: self.output.or(config.output),
            report: self.report.or(config.report),
            options: GeneratorOptions {
                strict: config.strict && !self.permissive,
                debug: self.debug.unwrap_or(config.debug),
            },
            sort: self.sort.unwrap_or(config.sort),
        };
        Ok((settings, self.procedures))
    }
}

pub fn generate_command(args: GenerateArgs) -> Result<()> {
    let cwd = env::current_dir().context("Failed to get current directory")?;
    let config = WrapgenConfig::discover(&cwd).context("Failed to load configuration")?;
    let (settings, mut selection) = args.merge(config)?;
    debug!("Generate settings: {:?}", settings);

    let mut catalog = Catalog::load_from_file(&settings.catalog)
        .with_context(|| format!("Failed to load catalog {}", settings.catalog.display()))?;
    if settings.sort {
        catalog
            .procedures
            .sort_by(|a, b| a.canonical_name.cmp(&b.canonical_name));
        selection.sort_by_key(|name| names::canonical_name(name));
    }

    let layer = settings.layer;
    let output = Generator::new(settings.options)
        .generate(&catalog, layer, &selection)
        .with_context(|| format!("Failed to generate the {layer} layer"))?;

    match &settings.output {
        Some(path) => {
            fs::write(path, &output.text)
                .with_context(|| format!("Failed to write wrappers to {}", path.display()))?;
            info!("Wrote {} wrappers to {}", output.report.len(), path.display());
        }
        None => print!("{}", output.text),
    }

    let mut report = GenerationReport::new();
    report.add_layer(layer, &output.report, &catalog);
    for line in report.progress_lines() {
        eprintln!("📊 {line}");
    }
    if let Some(path) = &settings.report {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_wins_over_config() {
        let config = WrapgenConfig {
            catalog: Some(PathBuf::from("/data/catalog.json")),
            layer: Layer::F08,
            report: Some(PathBuf::from("/data/report.json")),
            ..Default::default()
        };
        let args = GenerateArgs {
            layer: Some(Layer::C),
            permissive: true,
            procedures: vec!["mpi_send".to_string()],
            ..Default::default()
        };
        let (settings, selection) = args.merge(config).unwrap();
        assert_eq!(settings.catalog, PathBuf::from("/data/catalog.json"));
        assert_eq!(settings.layer, Layer::C);
        assert_eq!(settings.report, Some(PathBuf::from("/data/report.json")));
        assert!(!settings.options.strict);
        assert_eq!(selection, vec!["mpi_send"]);
    }

    #[test]
    fn test_no_debug_overrides_config() {
        let config = WrapgenConfig {
            catalog: Some(PathBuf::from("/data/catalog.json")),
            debug: true,
            sort: true,
            ..Default::default()
        };
        let (settings, _) = GenerateArgs::default().merge(config.clone()).unwrap();
        assert!(settings.options.debug);
        assert!(settings.sort);

        let args = GenerateArgs {
            debug: Some(false),
            sort: Some(false),
            ..Default::default()
        };
        let (settings, _) = args.merge(config).unwrap();
        assert!(!settings.options.debug);
        assert!(!settings.sort);
    }

    #[test]
    fn test_catalog_is_required() {
        let err = GenerateArgs::default()
            .merge(WrapgenConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("No catalog given"));
    }
}
