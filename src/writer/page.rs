//! Pages under construction.
//!
//! A page owns three objects allocated together: its content stream, its
//! resources dictionary and the page dictionary itself. They stay open while
//! the page is buffered and are completed together on commit.

use super::object_table::ObjectTable;
use crate::error::Result;
use crate::object::{Dictionary, Object, ObjectRef};
use indexmap::IndexMap;

/// Notification sent to page observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEvent {
    /// Zero-based page number
    pub index: usize,
    /// The page dictionary
    pub page: ObjectRef,
}

/// A buffered page.
#[derive(Debug)]
pub struct Page {
    index: usize,
    width: f64,
    height: f64,
    content: ObjectRef,
    resources: ObjectRef,
    dictionary: ObjectRef,
    fonts: IndexMap<String, ObjectRef>,
    xobjects: IndexMap<String, ObjectRef>,
}

impl Page {
    /// Allocate the content stream, resources and page dictionary.
    pub fn create(table: &mut ObjectTable, parent: ObjectRef, index: usize, size: [f64; 2]) -> Self {
        let [width, height] = size;
        let content = table.create_stream(Object::dict(vec![]), b"");
        let resources = table.create(Object::dict(vec![]));
        let dictionary = table.create(Object::dict(vec![
            ("Type", Object::name("Page")),
            ("Parent", Object::Reference(parent)),
            ("MediaBox", Object::rect(0.0, 0.0, width, height)),
            ("Contents", Object::Reference(content)),
            ("Resources", Object::Reference(resources)),
        ]));
        Self {
            index,
            width,
            height,
            content,
            resources,
            dictionary,
            fonts: IndexMap::new(),
            xobjects: IndexMap::new(),
        }
    }

    /// Zero-based page number.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Page width in points.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Page height in points.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The page dictionary.
    pub fn dictionary(&self) -> ObjectRef {
        self.dictionary
    }

    /// The content stream.
    pub fn content(&self) -> ObjectRef {
        self.content
    }

    /// Append operators to the content stream.
    pub fn append(&self, table: &mut ObjectTable, data: &[u8]) -> Result<()> {
        table.get_mut(self.content)?.append(data)
    }

    /// Make a font available as `/name`.
    pub fn use_font(&mut self, name: &str, font: ObjectRef) {
        self.fonts.entry(name.to_string()).or_insert(font);
    }

    /// Make an XObject available as `/name`.
    pub fn use_xobject(&mut self, name: &str, xobject: ObjectRef) {
        self.xobjects.entry(name.to_string()).or_insert(xobject);
    }

    /// Fill the resources dictionary and complete all three objects.
    pub fn commit(self, table: &mut ObjectTable) -> Result<()> {
        let mut proc_set = vec![Object::name("PDF"), Object::name("Text")];
        if !self.xobjects.is_empty() {
            proc_set.extend([Object::name("ImageB"), Object::name("ImageC"), Object::name("ImageI")]);
        }

        let resources = table.dict_mut(self.resources)?;
        resources.insert("ProcSet".to_string(), Object::Array(proc_set));
        if !self.fonts.is_empty() {
            resources.insert("Font".to_string(), Object::Dictionary(to_dictionary(&self.fonts)));
        }
        if !self.xobjects.is_empty() {
            resources.insert(
                "XObject".to_string(),
                Object::Dictionary(to_dictionary(&self.xobjects)),
            );
        }

        table.end(self.content)?;
        table.end(self.resources)?;
        table.end(self.dictionary)?;
        log::debug!("Committed page {} as {}", self.index, self.dictionary);
        Ok(())
    }
}

fn to_dictionary(entries: &IndexMap<String, ObjectRef>) -> Dictionary {
    entries
        .iter()
        .map(|(name, r)| (name.clone(), Object::Reference(*r)))
        .collect()
}
