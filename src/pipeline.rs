//! Load → convert → emit, as three explicit phases over immutable data.

use std::io::Write;
use std::path::Path;

use rayon::prelude::*;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::codegen::Codegen;
use crate::config::{EntryOrder, GeneratorConfig, OutputConfig};
use crate::descriptor::{convert, Descriptor};
use crate::error::{Error, Result};
use crate::ir::SchemaRegistry;
use crate::load::Source;

pub use crate::load::load_registry;

/// Convert every registry entry. Output order depends only on `order`.
pub fn convert_registry(registry: &SchemaRegistry, order: EntryOrder) -> Vec<(String, Descriptor)> {
    let mut entries: Vec<(String, Descriptor)> = registry
        .par_iter()
        .map(|(name, node)| (name.clone(), convert(node)))
        .collect();
    if order == EntryOrder::Sorted {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
    }
    debug!(entries = entries.len(), ?order, "converted registry");
    entries
}

/// Render converted entries in the configured output syntax.
pub fn render(entries: &[(String, Descriptor)], output: &OutputConfig, origin: &str) -> String {
    let mut cg = Codegen::new(output.format, &output.chain, origin);
    for (name, descriptor) in entries {
        cg.emit(name, descriptor);
    }
    info!(format = %output.format, entries = cg.entries(), "rendered descriptors");
    cg.into_string()
}

/// Full generation run for `config`, returning the rendered text.
pub fn generate(config: &GeneratorConfig) -> Result<String> {
    let source = config.document_source()?;
    let registry = load_registry(&source, &config.source)?;
    let entries = convert_registry(&registry, config.output.order);
    Ok(render(&entries, &config.output, &source.to_string()))
}

/// Descriptor of one named schema.
pub fn describe(config: &GeneratorConfig, name: &str) -> Result<Descriptor> {
    let registry = registry_for(config)?;
    registry
        .get(name)
        .map(convert)
        .ok_or_else(|| Error::UnknownSchema { name: name.to_owned() })
}

pub fn registry_for(config: &GeneratorConfig) -> Result<SchemaRegistry> {
    let source: Source = config.document_source()?;
    Ok(load_registry(&source, &config.source)?)
}

/// Write to `path` via a temp file in the same directory, persisted by rename.
/// The temp file is removed on every failure path. `None` prints to stdout.
pub fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    let Some(path) = path else {
        print!("{text}");
        return Ok(());
    };
    let wrap = |source| Error::Write { path: path.to_path_buf(), source };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(wrap)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(wrap)?;
    tmp.write_all(text.as_bytes()).map_err(wrap)?;
    tmp.persist(path).map_err(|err| wrap(err.error))?;
    info!(path = %path.display(), bytes = text.len(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::SchemaNode;

    fn registry() -> SchemaRegistry {
        let mut reg = SchemaRegistry::new();
        reg.insert("zeta".into(), SchemaNode::boolean());
        reg.insert("alpha".into(), SchemaNode::array(SchemaNode::integer(Some("int32"))));
        reg.insert("Mid".into(), SchemaNode::object());
        reg
    }

    #[test]
    fn sorted_order_is_by_name() {
        let entries = convert_registry(&registry(), EntryOrder::Sorted);
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["Mid", "alpha", "zeta"]);
        assert_eq!(entries[1].1.as_str(), r#"["INT32"]"#);
    }

    #[test]
    fn document_order_is_preserved() {
        let entries = convert_registry(&registry(), EntryOrder::Document);
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "Mid"]);
    }

    #[test]
    fn render_uses_output_format() {
        let entries = convert_registry(&registry(), EntryOrder::Sorted);
        let text = render(&entries, &OutputConfig::default(), "mem");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], r#"{"Mid","{}"},"#);
    }

    #[test]
    fn generate_without_source_fails() {
        let err = generate(&GeneratorConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(crate::error::ConfigError::MissingSource)));
    }

    #[test]
    fn failed_persist_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory in the way makes the final rename fail
        let out = dir.path().join("generated_types.cpp");
        std::fs::create_dir(&out).unwrap();
        std::fs::write(out.join("keep"), "x").unwrap();

        let err = write_output(Some(&out), "{}").unwrap_err();
        assert!(matches!(err, Error::Write { ref path, .. } if path == &out));

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, [std::ffi::OsString::from("generated_types.cpp")]);
    }
}
