//! In-memory document used by tests, the CLI, and embedders that render the
//! shell's state somewhere other than a browser.
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use super::{Display, Dom, escape_html};

/// Matches a single markup tag.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex must compile"));

#[derive(Debug, Clone)]
enum Content {
    Text(String),
    Html(String),
}

impl Default for Content {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

#[derive(Debug, Clone, Default)]
struct Element {
    classes: BTreeSet<String>,
    attrs: BTreeMap<String, String>,
    content: Content,
    display: Option<Display>,
    parent: Option<String>,
    children: Vec<String>,
    /// Creation order, for stable class queries.
    order: u64,
}

/// A flat map of identified elements with parent/child links.
#[derive(Debug, Clone, Default)]
pub struct MemoryDom {
    elements: HashMap<String, Element>,
    next_order: u64,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) a top-level element with the given classes.
    pub fn insert(&mut self, id: &str, classes: &[&str]) -> &mut Self {
        self.remove(id);
        let element = Element {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            order: self.bump_order(),
            ..Element::default()
        };
        self.elements.insert(id.to_string(), element);
        self
    }

    /// Create (or replace) a top-level element holding plain text.
    pub fn insert_text(&mut self, id: &str, classes: &[&str], text: &str) -> &mut Self {
        self.insert(id, classes);
        self.set_text(id, text);
        self
    }

    /// Create (or replace) a top-level element holding markup.
    pub fn insert_html(&mut self, id: &str, classes: &[&str], html: &str) -> &mut Self {
        self.insert(id, classes);
        self.set_html(id, html);
        self
    }

    /// Number of elements currently attached.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn bump_order(&mut self) -> u64 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }
}

impl Dom for MemoryDom {
    fn exists(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    fn text(&self, id: &str) -> Option<String> {
        let element = self.elements.get(id)?;
        Some(match &element.content {
            Content::Text(text) => text.clone(),
            Content::Html(html) => unescape_entities(&TAG_RE.replace_all(html, "")),
        })
    }

    fn set_text(&mut self, id: &str, text: &str) -> bool {
        match self.elements.get_mut(id) {
            Some(element) => {
                element.content = Content::Text(text.to_string());
                true
            }
            None => false,
        }
    }

    fn html(&self, id: &str) -> Option<String> {
        let element = self.elements.get(id)?;
        Some(match &element.content {
            Content::Text(text) => escape_html(text),
            Content::Html(html) => html.clone(),
        })
    }

    fn set_html(&mut self, id: &str, html: &str) -> bool {
        match self.elements.get_mut(id) {
            Some(element) => {
                element.content = Content::Html(html.to_string());
                true
            }
            None => false,
        }
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.elements
            .get(id)
            .is_some_and(|element| element.classes.contains(class))
    }

    fn add_class(&mut self, id: &str, class: &str) -> bool {
        match self.elements.get_mut(id) {
            Some(element) => {
                element.classes.insert(class.to_string());
                true
            }
            None => false,
        }
    }

    fn remove_class(&mut self, id: &str, class: &str) -> bool {
        match self.elements.get_mut(id) {
            Some(element) => {
                element.classes.remove(class);
                true
            }
            None => false,
        }
    }

    fn attr(&self, id: &str, name: &str) -> Option<String> {
        self.elements.get(id)?.attrs.get(name).cloned()
    }

    fn set_attr(&mut self, id: &str, name: &str, value: &str) -> bool {
        match self.elements.get_mut(id) {
            Some(element) => {
                element.attrs.insert(name.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    fn display(&self, id: &str) -> Option<Display> {
        self.elements.get(id)?.display
    }

    fn set_display(&mut self, id: &str, display: Display) -> bool {
        match self.elements.get_mut(id) {
            Some(element) => {
                element.display = Some(display);
                true
            }
            None => false,
        }
    }

    fn append_child(&mut self, parent: &str, id: &str, classes: &[&str], html: &str) -> bool {
        if !self.elements.contains_key(parent) || self.elements.contains_key(id) {
            return false;
        }
        let element = Element {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            content: Content::Html(html.to_string()),
            parent: Some(parent.to_string()),
            order: self.bump_order(),
            ..Element::default()
        };
        self.elements.insert(id.to_string(), element);
        if let Some(parent) = self.elements.get_mut(parent) {
            parent.children.push(id.to_string());
        }
        true
    }

    fn remove(&mut self, id: &str) -> bool {
        let Some(element) = self.elements.remove(id) else {
            return false;
        };
        if let Some(parent) = element.parent.as_deref()
            && let Some(parent) = self.elements.get_mut(parent)
        {
            parent.children.retain(|child| child != id);
        }
        for child in element.children {
            self.remove(&child);
        }
        true
    }

    fn children(&self, parent: &str) -> Vec<String> {
        self.elements
            .get(parent)
            .map(|element| element.children.clone())
            .unwrap_or_default()
    }

    fn ids_with_class(&self, class: &str) -> Vec<String> {
        let mut matches: Vec<(&String, u64)> = self
            .elements
            .iter()
            .filter(|(_, element)| element.classes.contains(class))
            .map(|(id, element)| (id, element.order))
            .collect();
        matches.sort_by_key(|(_, order)| *order);
        matches.into_iter().map(|(id, _)| id.clone()).collect()
    }
}

/// Undo the escapes produced by [`escape_html`] plus the common named ones
/// emitted by the Markdown renderer.
fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
