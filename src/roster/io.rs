use anyhow::{Context, Result};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::types::DataStore;
use super::xml;

/// On-disk layouts of a data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `family` / `person` / `history` elements with attributes.
    Xml,
    Yaml,
}

impl Format {
    /// `.xml` files are XML, anything else is YAML.
    pub fn from_path(path: &Path) -> Format {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xml") => Format::Xml,
            _ => Format::Yaml,
        }
    }

    /// XML documents open with a tag or a declaration.
    pub fn sniff(text: &str) -> Format {
        if text.trim_start().starts_with('<') {
            Format::Xml
        } else {
            Format::Yaml
        }
    }
}

pub fn parse_store(text: &str, format: Format) -> Result<DataStore> {
    let store = match format {
        Format::Xml => xml::from_xml(text),
        Format::Yaml => serde_yaml::from_str(text).map_err(anyhow::Error::from),
    }
    .with_context(|| format!("parse data store as {format:?}"))?;
    store.validate()?;
    Ok(store)
}

pub fn render_store(store: &DataStore, format: Format) -> Result<String> {
    match format {
        Format::Xml => xml::to_xml(store),
        Format::Yaml => serde_yaml::to_string(store).map_err(anyhow::Error::from),
    }
    .with_context(|| format!("serialize data store as {format:?}"))
}

/// Parse either layout, told apart by the first character.
pub fn store_from_str(text: &str) -> Result<DataStore> {
    parse_store(text, Format::sniff(text))
}

pub fn store_to_string(store: &DataStore) -> Result<String> {
    render_store(store, Format::Yaml)
}

pub fn load_store(path: &Path) -> Result<DataStore> {
    let text = fs::read_to_string(path).with_context(|| format!("open {}", path.display()))?;
    let format = Format::from_path(path);
    let store = parse_store(&text, format).with_context(|| format!("load {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        ?format,
        families = store.families.len(),
        people = store.population(),
        "loaded data store"
    );
    Ok(store)
}

/// Write `store` in the layout the file extension asks for.
pub fn save_store(path: &Path, store: &DataStore) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
    }
    let format = Format::from_path(path);
    let text = render_store(store, format)?;
    let f = fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    w.write_all(text.as_bytes())
        .with_context(|| format!("write {}", path.display()))?;
    w.flush().with_context(|| format!("flush {}", path.display()))?;
    tracing::info!(path = %path.display(), ?format, "saved data store");
    Ok(())
}
