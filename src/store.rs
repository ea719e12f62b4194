//! Whole-file JSON load and save.

use std::io::Write;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};

use crate::model::Document;

/// Loaded at startup when no file is given and it exists in the working
/// directory. Also the suggested name for "Save As".
pub const AUTOLOAD_FILE: &str = "conversation.json";

pub const APP_TITLE: &str = "Conversation Editor";

pub fn load_document(path: &Utf8Path) -> Result<Document> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Open {}", path))?;
    let doc = Document::from_json_str(&text).with_context(|| format!("Parse {}", path))?;
    log::info!("loaded {} node(s) from {}", doc.len(), path);
    Ok(doc)
}

pub fn save_document(path: &Utf8Path, doc: &Document) -> Result<()> {
    let json = doc.to_json_string_pretty()?;
    let file = std::fs::File::create(path).with_context(|| format!("Create {}", path))?;
    let mut writer = std::io::BufWriter::new(file);
    writer
        .write_all(json.as_bytes())
        .and_then(|_| writer.flush())
        .with_context(|| format!("Write {}", path))?;
    log::info!("saved {} node(s) to {}", doc.len(), path);
    Ok(())
}

/// The autoload file in `dir`, if present.
pub fn autoload_candidate(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let p = dir.join(AUTOLOAD_FILE);
    p.is_file().then_some(p)
}

/// Window title for the given file.
pub fn window_title(path: Option<&Utf8Path>) -> String {
    match path.and_then(|p| p.file_name()) {
        Some(name) => format!("{APP_TITLE} - {name}"),
        None => APP_TITLE.to_string(),
    }
}
