//! A `strings.xml` document that can be edited without disturbing its layout.
//!
//! The source text is split into managed `<string name="…">` elements and
//! everything else, which is kept byte for byte. Only elements that are added
//! or updated are re-serialized, so comments, plurals, attributes and
//! whitespace survive a load/flush cycle untouched.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};

use super::set::{Chunks, ResourceSet};
use crate::error::{Error, Result};
use crate::fs::atomic_write;

const STRING_TAG: &[u8] = b"string";
const DEFAULT_INDENT: &str = "    ";
const BOM: char = '\u{feff}';

#[derive(Debug, Clone)]
enum Node {
    Markup(String),
    Entry(StringEntry),
}

#[derive(Debug, Clone)]
struct StringEntry {
    name: String,
    open_tag: String,
    value: String,
    /// Original element text, dropped once the value changes.
    raw: Option<String>,
}

impl StringEntry {
    fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            open_tag: format!("<string name=\"{}\">", escape(name)),
            value: value.to_string(),
            raw: None,
        }
    }

    fn set_value(&mut self, value: &str) {
        value.clone_into(&mut self.value);
        self.raw = None;
    }

    fn render_into(&self, out: &mut String) {
        if let Some(raw) = &self.raw {
            out.push_str(raw);
        } else {
            out.push_str(&self.open_tag);
            out.push_str(&partial_escape(&self.value));
            out.push_str("</string>");
        }
    }
}

/// Result of [`Document::upsert_entry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Added,
    Updated,
}

/// An in-memory string resource document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    /// New entries are inserted before this node (the root's closing line).
    insert_at: usize,
    /// Line ending used for inserted lines, taken from the source.
    newline: &'static str,
    location: Option<PathBuf>,
}

impl Document {
    /// Reads and parses the document stored at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut document = Self::parse_labeled(&source, &path.display().to_string())?;
        document.location = Some(path.to_path_buf());
        Ok(document)
    }

    /// Parses a document from text. The result has no location until one is
    /// passed to [`Document::flush`].
    pub fn parse(source: &str) -> Result<Self> {
        Self::parse_labeled(source, "<memory>")
    }

    fn parse_labeled(source: &str, label: &str) -> Result<Self> {
        // The reader skips a byte order mark, which would shift every offset.
        let (bom, source) = match source.strip_prefix(BOM) {
            Some(rest) => (Some(BOM), rest),
            None => (None, source),
        };
        let newline = if source.contains("\r\n") { "\r\n" } else { "\n" };
        let mut reader = Reader::from_str(source);
        let mut nodes = Vec::new();
        let mut names = HashSet::new();
        let mut cursor = 0;
        let mut depth = 0usize;
        let mut root_seen = false;
        let mut insert_at = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::parse(label, format!("{e} (at byte {})", reader.error_position()))
            })?;
            let end = reader.buffer_position() as usize;

            match event {
                Event::Start(start) if depth > 0 && start.name().as_ref() == STRING_TAG => {
                    let tag_start = tag_start(source, end);
                    let open_tag = &source[tag_start..end];
                    let value = read_text_content(&mut reader, label)?;
                    let element_end = reader.buffer_position() as usize;

                    if let Some(name) = entry_name(&start, label)?
                        && names.insert(name.clone())
                    {
                        nodes.push(Node::Markup(source[cursor..tag_start].to_string()));
                        nodes.push(Node::Entry(StringEntry {
                            name,
                            open_tag: open_tag.to_string(),
                            value,
                            raw: Some(source[tag_start..element_end].to_string()),
                        }));
                        cursor = element_end;
                    }
                }
                Event::Empty(start) if depth > 0 && start.name().as_ref() == STRING_TAG => {
                    let tag_start = tag_start(source, end);
                    if let Some(name) = entry_name(&start, label)?
                        && names.insert(name.clone())
                    {
                        nodes.push(Node::Markup(source[cursor..tag_start].to_string()));
                        nodes.push(Node::Entry(StringEntry {
                            name,
                            open_tag: format!("<{}>", String::from_utf8_lossy(&start)),
                            value: String::new(),
                            raw: Some(source[tag_start..end].to_string()),
                        }));
                        cursor = end;
                    }
                }
                Event::Start(_) => {
                    depth += 1;
                    root_seen = true;
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 && insert_at.is_none() {
                        let close_start = source[..end].rfind("</").unwrap_or(end);
                        let split = closing_line_start(source, cursor, close_start);
                        nodes.push(Node::Markup(source[cursor..split].to_string()));
                        insert_at = Some(nodes.len());
                        cursor = split;
                    }
                }
                // `<resources/>`: expand so entries can be appended.
                Event::Empty(root) if depth == 0 && !root_seen => {
                    root_seen = true;
                    let tag_start = tag_start(source, end);
                    nodes.push(Node::Markup(source[cursor..tag_start].to_string()));
                    nodes.push(Node::Markup(format!(
                        "<{}>{newline}",
                        String::from_utf8_lossy(&root).trim_end()
                    )));
                    insert_at = Some(nodes.len());
                    nodes.push(Node::Markup(format!(
                        "</{}>",
                        String::from_utf8_lossy(root.name().as_ref())
                    )));
                    cursor = end;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !root_seen {
            return Err(Error::parse(label, "document has no root element"));
        }
        let Some(mut insert_at) = insert_at else {
            return Err(Error::parse(label, "root element is never closed"));
        };
        nodes.push(Node::Markup(source[cursor..].to_string()));
        if let Some(bom) = bom {
            nodes.insert(0, Node::Markup(bom.to_string()));
            insert_at += 1;
        }

        Ok(Self {
            nodes,
            insert_at,
            newline,
            location: None,
        })
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries()
            .find(|entry| entry.name == key)
            .map(|entry| entry.value.as_str())
    }

    /// All entries in document order.
    pub fn snapshot(&self) -> ResourceSet {
        self.entries()
            .map(|entry| (entry.name.as_str(), entry.value.as_str()))
            .collect()
    }

    /// The last `n` entries in document order, i.e. the most recently appended ones.
    pub fn snapshot_tail(&self, n: usize) -> ResourceSet {
        self.snapshot().tail(n)
    }

    /// All entries split into partitions of `chunk_size`, in document order.
    pub fn snapshot_in_chunks(&self, chunk_size: usize) -> Chunks {
        self.snapshot().chunks(chunk_size)
    }

    /// Appends a new entry as the last child of the root element.
    pub fn add_entry(&mut self, key: &str, value: &str) -> Result<()> {
        if self.contains(key) {
            return Err(Error::DuplicateKey(key.to_string()));
        }

        let at = self.insert_at;
        let indent = self.indent();
        let follows_newline = at
            .checked_sub(1)
            .and_then(|previous| self.nodes.get(previous))
            .is_some_and(|node| matches!(node, Node::Markup(text) if text.ends_with('\n')));
        let lead = if follows_newline {
            indent
        } else {
            format!("{}{indent}", self.newline)
        };

        self.nodes.splice(
            at..at,
            [
                Node::Markup(lead),
                Node::Entry(StringEntry::new(key, value)),
                Node::Markup(self.newline.to_string()),
            ],
        );
        self.insert_at += 3;
        Ok(())
    }

    /// Replaces the value of an existing entry, keeping its opening tag.
    pub fn update_entry(&mut self, key: &str, value: &str) -> Result<()> {
        let position = self
            .position(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))?;
        if let Node::Entry(entry) = &mut self.nodes[position] {
            entry.set_value(value);
        }
        Ok(())
    }

    /// Updates the entry if it exists, otherwise appends it.
    pub fn upsert_entry(&mut self, key: &str, value: &str) -> Upserted {
        match self.update_entry(key, value) {
            Ok(()) => Upserted::Updated,
            Err(_) => {
                // Cannot be a duplicate: the key was just looked up and not found.
                let _ = self.add_entry(key, value);
                Upserted::Added
            }
        }
    }

    /// Removes the entry and its line. Returns `false` if the key was absent.
    pub fn delete_entry(&mut self, key: &str) -> bool {
        let Some(position) = self.position(key) else {
            return false;
        };
        self.nodes.remove(position);
        if position < self.insert_at {
            self.insert_at -= 1;
        }
        self.remove_blank_line(position);
        true
    }

    /// Writes the document to `location`, or to the path it was loaded from.
    pub fn flush(&self, location: Option<&Path>) -> Result<()> {
        let path = location
            .or(self.location.as_deref())
            .ok_or(Error::NoLocation)?;
        atomic_write(path, &self.render()).map_err(|e| Error::io(path, e))
    }

    /// Serializes the whole document.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Markup(text) => out.push_str(text),
                Node::Entry(entry) => entry.render_into(&mut out),
            }
        }
        out
    }

    fn entries(&self) -> impl Iterator<Item = &StringEntry> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Entry(entry) => Some(entry),
            Node::Markup(_) => None,
        })
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| matches!(node, Node::Entry(entry) if entry.name == key))
    }

    /// Indentation used by the first existing entry.
    fn indent(&self) -> String {
        self.nodes
            .windows(2)
            .find_map(|pair| match pair {
                [Node::Markup(text), Node::Entry(_)] => {
                    let (_, tail) = text.rsplit_once('\n')?;
                    let blank = !tail.is_empty() && tail.chars().all(|c| c == ' ' || c == '\t');
                    blank.then(|| tail.to_string())
                }
                _ => None,
            })
            .unwrap_or_else(|| DEFAULT_INDENT.to_string())
    }

    /// After removing the node at `at`, drops the indentation before it and
    /// the newline after it when the removed element had a line of its own.
    fn remove_blank_line(&mut self, at: usize) {
        let next_is_newline = matches!(
            self.nodes.get(at),
            Some(Node::Markup(text)) if text.starts_with('\n') || text.starts_with("\r\n")
        );
        if !next_is_newline {
            return;
        }

        let mut touched = Vec::new();
        let mut index = at;
        let at_line_start = loop {
            if index == 0 {
                break true;
            }
            index -= 1;
            match &self.nodes[index] {
                Node::Entry(_) => break false,
                Node::Markup(text) => {
                    let tail = text.rsplit('\n').next().unwrap_or_default();
                    if !tail.chars().all(|c| c == ' ' || c == '\t') {
                        break false;
                    }
                    touched.push(index);
                    if text.contains('\n') {
                        break true;
                    }
                }
            }
        };
        if !at_line_start {
            return;
        }

        for index in touched {
            if let Node::Markup(text) = &mut self.nodes[index] {
                let kept = text.trim_end_matches([' ', '\t']).len();
                text.truncate(kept);
            }
        }
        if let Some(Node::Markup(next)) = self.nodes.get_mut(at) {
            let newline = if next.starts_with("\r\n") { 2 } else { 1 };
            next.drain(..newline);
        }
    }
}

/// Byte offset of the `<` opening the tag that ends at `end`.
///
/// `<` cannot appear unescaped inside a tag, so the last one before the end
/// is the tag's own.
fn tag_start(source: &str, end: usize) -> usize {
    source[..end].rfind('<').unwrap_or(end)
}

/// Where the root's closing line begins: right after the last newline if
/// only whitespace separates it from the closing tag.
fn closing_line_start(source: &str, cursor: usize, close_start: usize) -> usize {
    let between = &source[cursor..close_start];
    match between.rfind('\n') {
        Some(newline) if between[newline + 1..].trim().is_empty() => cursor + newline + 1,
        _ => close_start,
    }
}

fn entry_name(start: &BytesStart<'_>, label: &str) -> Result<Option<String>> {
    for attr in start.attributes().with_checks(false) {
        let attr = attr.map_err(|e| Error::parse(label, e))?;
        if attr.key.as_ref() == b"name" {
            let name = attr.unescape_value().map_err(|e| Error::parse(label, e))?;
            return Ok(Some(name.into_owned()));
        }
    }
    Ok(None)
}

/// Reads up to the end of the current element and returns its text content.
fn read_text_content(reader: &mut Reader<&[u8]>, label: &str) -> Result<String> {
    let mut value = String::new();
    let mut nested = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::parse(label, format!("{e} (at byte {})", reader.error_position()))
        })?;
        match event {
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| Error::parse(label, e))?;
                value.push_str(&text);
            }
            Event::CData(data) => value.push_str(&String::from_utf8_lossy(&data)),
            Event::Start(_) => nested += 1,
            Event::End(_) if nested == 0 => return Ok(value),
            Event::End(_) => nested -= 1,
            Event::Eof => {
                return Err(Error::parse(label, "unexpected end of file inside <string>"));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- Base strings -->
<resources>
    <string name="app_name" translatable="false">PipePipe</string>
    <string name="greeting">Hi</string>
    <plurals name="videos">
        <item quantity="one">%d video</item>
        <item quantity="other">%d videos</item>
    </plurals>
    <string name="farewell">Bye &amp; see you</string>
</resources>
"#;

    fn sample() -> Document {
        Document::parse(SAMPLE).unwrap()
    }

    #[test]
    fn test_parse_reads_string_entries() {
        let doc = sample();
        let snapshot = doc.snapshot();

        assert_eq!(
            snapshot.keys().collect::<Vec<_>>(),
            ["app_name", "greeting", "farewell"]
        );
        assert_eq!(snapshot.get("farewell"), Some("Bye & see you"));
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_render_unmodified_is_verbatim() {
        assert_eq!(sample().render(), SAMPLE);
    }

    #[test]
    fn test_add_entry_appends_before_root_close() {
        let mut doc = sample();
        doc.add_entry("new_key", "New <value>").unwrap();

        let rendered = doc.render();
        assert!(rendered.ends_with(
            "    <string name=\"farewell\">Bye &amp; see you</string>\n    \
             <string name=\"new_key\">New &lt;value&gt;</string>\n</resources>\n"
        ));
        assert_eq!(doc.snapshot_tail(1).get("new_key"), Some("New <value>"));
    }

    #[test]
    fn test_add_duplicate_fails() {
        let mut doc = sample();
        let err = doc.add_entry("greeting", "Hello").unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(key) if key == "greeting"));
    }

    #[test]
    fn test_update_keeps_attributes() {
        let mut doc = sample();
        doc.update_entry("app_name", "PipePipe X").unwrap();

        assert!(
            doc.render()
                .contains("<string name=\"app_name\" translatable=\"false\">PipePipe X</string>")
        );
    }

    #[test]
    fn test_update_missing_fails() {
        let mut doc = sample();
        let err = doc.update_entry("nope", "x").unwrap_err();
        assert!(matches!(err, Error::KeyNotFound(key) if key == "nope"));
    }

    #[test]
    fn test_upsert_updates_or_adds() {
        let mut doc = sample();
        assert_eq!(doc.upsert_entry("greeting", "Hello"), Upserted::Updated);
        assert_eq!(doc.upsert_entry("extra", "More"), Upserted::Added);

        let snapshot = doc.snapshot();
        assert_eq!(snapshot.get("greeting"), Some("Hello"));
        assert_eq!(snapshot.keys().last(), Some("extra"));
    }

    #[test]
    fn test_delete_removes_whole_line() {
        let mut doc = sample();
        assert!(doc.delete_entry("greeting"));
        assert!(!doc.delete_entry("greeting"));

        let expected = SAMPLE.replace("    <string name=\"greeting\">Hi</string>\n", "");
        assert_eq!(doc.render(), expected);
    }

    #[test]
    fn test_delete_then_add_keeps_layout() {
        let mut doc = sample();
        doc.add_entry("temp", "T").unwrap();
        assert!(doc.delete_entry("temp"));
        assert_eq!(doc.render(), SAMPLE);
    }

    #[test]
    fn test_self_closing_root_accepts_entries() {
        let mut doc = Document::parse("<?xml version=\"1.0\"?>\n<resources/>\n").unwrap();
        assert!(doc.is_empty());

        doc.add_entry("greeting", "Bonjour").unwrap();
        assert_eq!(
            doc.render(),
            "<?xml version=\"1.0\"?>\n<resources>\n    \
             <string name=\"greeting\">Bonjour</string>\n</resources>\n"
        );
    }

    #[test]
    fn test_single_line_document() {
        let mut doc =
            Document::parse("<resources><string name=\"a\">A</string></resources>").unwrap();
        doc.add_entry("b", "B").unwrap();

        let reparsed = Document::parse(&doc.render()).unwrap();
        assert_eq!(reparsed.snapshot(), doc.snapshot());
        assert_eq!(reparsed.len(), 2);
    }

    #[test]
    fn test_byte_order_mark_survives_edits() {
        let source = "\u{feff}<?xml version=\"1.0\"?>\n<resources>\n    \
                      <string name=\"a\">A</string>\n</resources>\n";
        let mut doc = Document::parse(source).unwrap();
        assert_eq!(doc.render(), source);

        doc.update_entry("a", "Z").unwrap();
        doc.add_entry("b", "B").unwrap();
        assert_eq!(
            doc.render(),
            "\u{feff}<?xml version=\"1.0\"?>\n<resources>\n    \
             <string name=\"a\">Z</string>\n    \
             <string name=\"b\">B</string>\n</resources>\n"
        );

        let reparsed = Document::parse(&doc.render()).unwrap();
        assert_eq!(reparsed.get("a"), Some("Z"));
        assert_eq!(reparsed.get("b"), Some("B"));
        assert_eq!(reparsed.render(), doc.render());
    }

    #[test]
    fn test_add_entry_keeps_crlf_line_endings() {
        let source = "<resources>\r\n    <string name=\"a\">A</string>\r\n</resources>\r\n";
        let mut doc = Document::parse(source).unwrap();
        doc.add_entry("b", "B").unwrap();

        assert_eq!(
            doc.render(),
            "<resources>\r\n    <string name=\"a\">A</string>\r\n    \
             <string name=\"b\">B</string>\r\n</resources>\r\n"
        );
        assert!(doc.delete_entry("b"));
        assert_eq!(doc.render(), source);
    }

    #[test]
    fn test_duplicate_names_first_wins() {
        let doc = Document::parse(
            "<resources>\n  <string name=\"a\">first</string>\n  <string name=\"a\">second</string>\n</resources>",
        )
        .unwrap();

        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get("a"), Some("first"));
        assert!(doc.render().contains("second"));
    }

    #[test]
    fn test_nested_markup_and_cdata_text() {
        let doc = Document::parse(
            "<resources>\n  <string name=\"rich\">Hello <b>bold</b> <![CDATA[<raw>]]></string>\n  <string name=\"blank\"/>\n</resources>",
        )
        .unwrap();

        assert_eq!(doc.get("rich"), Some("Hello bold <raw>"));
        assert_eq!(doc.get("blank"), Some(""));
    }

    #[test]
    fn test_nameless_string_is_preserved() {
        let source = "<resources>\n  <string>orphan</string>\n  <string name=\"a\">A</string>\n</resources>";
        let doc = Document::parse(source).unwrap();

        assert_eq!(doc.len(), 1);
        assert_eq!(doc.render(), source);
    }

    #[test]
    fn test_malformed_is_parse_error() {
        let err = Document::parse("<resources><string name=\"a\">A</resources>").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_missing_root_is_parse_error() {
        let err = Document::parse("<?xml version=\"1.0\"?>\n").unwrap_err();
        assert!(err.to_string().contains("no root element"));
    }

    #[test]
    fn test_flush_without_location_fails() {
        let err = sample().flush(None).unwrap_err();
        assert!(matches!(err, Error::NoLocation));
    }

    #[test]
    fn test_flush_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("strings.xml");

        let mut doc = sample();
        doc.add_entry("quote", "it\\'s \"fine\" & <ok>").unwrap();
        doc.update_entry("greeting", "Hello\\nthere").unwrap();
        doc.delete_entry("app_name");
        doc.flush(Some(path.as_path())).unwrap();

        let loaded = Document::load(&path).unwrap();
        assert_eq!(loaded.snapshot(), doc.snapshot());
        assert_eq!(loaded.location(), Some(path.as_path()));
        assert!(loaded.render().contains("<!-- Base strings -->"));
        assert!(loaded.render().contains("<item quantity=\"other\">%d videos</item>"));
    }

    #[test]
    fn test_flush_defaults_to_load_location() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("strings.xml");
        fs::write(&path, SAMPLE).unwrap();

        let mut doc = Document::load(&path).unwrap();
        doc.update_entry("greeting", "Salut").unwrap();
        doc.flush(None).unwrap();

        assert_eq!(Document::load(&path).unwrap().get("greeting"), Some("Salut"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Document::load("/nonexistent/values/strings.xml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_snapshot_in_chunks() {
        let mut doc = Document::parse("<resources>\n</resources>\n").unwrap();
        for i in 0..250 {
            doc.add_entry(&format!("key_{i}"), &format!("value {i}")).unwrap();
        }

        let sizes: Vec<_> = doc.snapshot_in_chunks(100).map(|c| c.len()).collect();
        assert_eq!(sizes, [100, 100, 50]);

        let rejoined: ResourceSet = doc.snapshot_in_chunks(100).flatten().collect();
        assert_eq!(rejoined, doc.snapshot());
    }
}
