//! `useful load` - build a configuration document and print it.

use crate::config::{ConfigLoader, ConfigSource};
use crate::creator::{BuiltValue, GenericMarkers, TypeRegistry, find_placeholders, inject};
use crate::resource::ResourceLoader;
use crate::value::Scalar;
use anyhow::{Result, anyhow};
use clap::{Args, ValueEnum};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Output format of `load`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Load a configuration document, fill placeholders and print the result.
///
/// The CLI registers no types, so construction markers are printed as plain data.
/// With `--generic`, `{class, params}` markers are first rewritten into shorthand form.
#[derive(Args, Debug)]
pub struct LoadCommand {
    /// URI of the document, or the name of an environment variable holding it
    pub uri: String,

    /// Placeholder substitution, e.g. `--set port=8080`. Repeatable
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub assignments: Vec<(String, Scalar)>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,

    /// Parse as this mimetype instead of guessing from the extension
    #[arg(long)]
    pub mimetype: Option<String>,

    /// Fail when placeholders remain after substitution
    #[arg(long)]
    pub strict: bool,

    /// Rewrite `{class: {module, name}, params}` markers into shorthand form
    #[arg(long)]
    pub generic: bool,
}

/// Parse `name=value`; the value is typed the way plain YAML scalars are.
pub fn parse_assignment(text: &str) -> std::result::Result<(String, Scalar), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{text}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in '{text}'"));
    }
    Ok((name.to_string(), Scalar::resolve_plain(value)))
}

impl LoadCommand {
    pub async fn execute(self) -> Result<()> {
        let rendered = self.render().await?;
        println!("{rendered}");
        Ok(())
    }

    /// Load, substitute and render without printing.
    pub async fn render(&self) -> Result<String> {
        let mut resources = ResourceLoader::new();
        if let Some(mimetype) = &self.mimetype {
            resources = resources.with_mimetype(mimetype.clone());
        }
        let mut loader = ConfigLoader::new(resources, TypeRegistry::new());
        if self.generic {
            loader = loader.with_generic_markers(GenericMarkers::default());
        }

        let mut config: BuiltValue = (*loader.load(ConfigSource::detect(&self.uri)).await?).clone();

        let substitutions: HashMap<String, BuiltValue> = self
            .assignments
            .iter()
            .map(|(name, value)| (name.clone(), BuiltValue::from(value.clone())))
            .collect();
        let replaced = inject(&mut config, &substitutions);
        debug!(replaced, "Placeholders substituted");

        let remaining = find_placeholders(&config);
        if !remaining.is_empty() {
            if self.strict {
                return Err(anyhow!("unresolved placeholders: {}", remaining.join(", ")));
            }
            warn!(placeholders = ?remaining, "Unresolved placeholders left in output");
        }

        let json = config.to_json();
        Ok(match self.output {
            OutputFormat::Json => serde_json::to_string_pretty(&json)?,
            OutputFormat::Yaml => serde_yaml::to_string(&json)?.trim_end().to_string(),
        })
    }
}
