//! `useful flatten` - print a document as a single-level mapping.

use crate::dictionary::{DEFAULT_SEPARATOR, from_mapping, to_mapping};
use crate::resource::ResourceLoader;
use anyhow::{Result, bail};
use clap::Args;

/// Flatten a document into `path -> value` pairs, or rebuild one with `--reverse`.
#[derive(Args, Debug)]
pub struct FlattenCommand {
    /// URI of the document
    pub uri: String,

    /// Separator between path segments
    #[arg(short, long, default_value = DEFAULT_SEPARATOR)]
    pub separator: String,

    /// Treat the input as a flat mapping and rebuild the nested document
    #[arg(long)]
    pub reverse: bool,

    /// Parse as this mimetype instead of guessing from the extension
    #[arg(long)]
    pub mimetype: Option<String>,
}

impl FlattenCommand {
    pub async fn execute(self) -> Result<()> {
        println!("{}", self.render().await?);
        Ok(())
    }

    pub async fn render(&self) -> Result<String> {
        let loader = ResourceLoader::new();
        let fetched = loader.load_as(&self.uri, self.mimetype.as_deref()).await?;
        let document = fetched.value.root_json();

        let output = if self.reverse {
            let serde_json::Value::Object(mapping) = document else {
                bail!("'{}' is not a flat mapping", self.uri);
            };
            from_mapping(&mapping, &self.separator)
        } else {
            serde_json::Value::Object(to_mapping(&document, &self.separator))
        };
        Ok(serde_json::to_string_pretty(&output)?)
    }
}
