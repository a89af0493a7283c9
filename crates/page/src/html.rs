use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;
use html5ever::interface::{Attribute, QualName};
use html5ever::parse_document;
use html5ever::serialize::{SerializeOpts, serialize};
use html5ever::tendril::{StrTendril, TendrilSink, format_tendril};
use html5ever::tree_builder::create_element;
use html5ever::{LocalName, namespace_url, ns};
use indoc::formatdoc;
use log::{debug, warn};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};

use super::host::{Document, Marker, ORIGINAL_TEXT_ATTR, TRANSLATED_CLASS, TRANSLATING_CLASS};
use super::selector::Selection;

pub const STYLE_ID: &str = "llm-translator-styles";

/// An HTML document held in memory and rewritten in place.
pub struct HtmlPage {
    dom: RcDom,
}

impl HtmlPage {
    pub fn parse(html: &str) -> Result<HtmlPage> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .with_context(|| "parse html")?;

        Ok(HtmlPage { dom })
    }

    /// Decodes raw bytes with a charset label such as `utf-8` or `iso-8859-1`.
    /// A byte order mark overrides the label.
    pub fn decode(data: &[u8], label: &str) -> Result<HtmlPage> {
        let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
            bail!("unknown encoding {label}");
        };
        let (html, used, had_errors) = encoding.decode(data);
        if had_errors {
            warn!("input is not valid {}, bad bytes replaced", used.name());
        }

        HtmlPage::parse(&html)
    }

    pub fn to_html(&self) -> Result<String> {
        let mut buf = Vec::new();
        let document: SerializableHandle = self.dom.document.clone().into();
        serialize(&mut buf, &document, SerializeOpts::default()).with_context(|| "serialize html")?;

        String::from_utf8(buf).with_context(|| "serialized html is not utf-8")
    }

    fn head(&self) -> Option<Handle> {
        let html = child_element(&self.dom.document, "html")?;

        child_element(&html, "head")
    }

    fn collect(node: &Handle, selection: &Selection, found: &mut Vec<Handle>) {
        for child in node.children.borrow().iter() {
            let Some(tag) = tag_name(child) else {
                continue;
            };
            if selection.is_excluded(tag) {
                continue;
            }
            if selection.is_candidate(tag)
                && is_leaf(child)
                && selection.accepts_text(&text_content(child))
            {
                found.push(child.clone());
            }
            HtmlPage::collect(child, selection, found);
        }
    }
}

impl Document for HtmlPage {
    type Element = Handle;

    fn prepare(&mut self) -> Result<()> {
        if find_by_id(&self.dom.document, STYLE_ID).is_some() {
            return Ok(());
        }
        let Some(head) = self.head() else {
            debug!("document has no head, styles skipped");
            return Ok(());
        };

        let style = create_element(
            &self.dom,
            QualName::new(None, ns!(), LocalName::from("style")),
            vec![Attribute {
                name: QualName::new(None, ns!(), LocalName::from("id")),
                value: format_tendril!("{}", STYLE_ID),
            }],
        );
        append(&style, text_node(&stylesheet()));
        append(&head, style);

        Ok(())
    }

    fn translatable_elements(&self, selection: &Selection) -> Result<Vec<Handle>> {
        let mut found = Vec::new();
        HtmlPage::collect(&self.dom.document, selection, &mut found);

        Ok(found)
    }

    fn text(&self, element: &Handle) -> String {
        text_content(element)
    }

    fn add_marker(&mut self, element: &Handle, marker: Marker) -> Result<()> {
        let mut classes = classes(element);
        if !classes.iter().any(|class| class == marker.class()) {
            classes.push(marker.class().to_string());
        }
        set_attr(element, "class", Some(&classes.join(" ")));

        Ok(())
    }

    fn remove_marker(&mut self, element: &Handle, marker: Marker) -> Result<()> {
        let classes: Vec<String> = classes(element)
            .into_iter()
            .filter(|class| class != marker.class())
            .collect();
        if classes.is_empty() {
            set_attr(element, "class", None);
        } else {
            set_attr(element, "class", Some(&classes.join(" ")));
        }

        Ok(())
    }

    fn retain_original(&mut self, element: &Handle, text: &str) -> Result<()> {
        set_attr(element, ORIGINAL_TEXT_ATTR, Some(text));

        Ok(())
    }

    fn replace_text(&mut self, element: &Handle, text: &str) -> Result<()> {
        let children = std::mem::take(&mut *element.children.borrow_mut());
        for child in children.iter() {
            child.parent.set(None);
        }
        append(element, text_node(text));

        Ok(())
    }
}

fn stylesheet() -> String {
    formatdoc!(
        "
        .{TRANSLATING_CLASS} {{
            opacity: 0.6;
            position: relative;
        }}
        .{TRANSLATING_CLASS}::after {{
            content: \"...\";
            animation: llm-translator-pulse 1s infinite;
        }}
        @keyframes llm-translator-pulse {{
            0%, 100% {{ opacity: 0.3; }}
            50% {{ opacity: 1; }}
        }}
        .{TRANSLATED_CLASS} {{
            background-color: rgba(200, 230, 255, 0.2);
        }}
        "
    )
}

fn tag_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}

fn child_element(parent: &Handle, tag: &str) -> Option<Handle> {
    parent
        .children
        .borrow()
        .iter()
        .find(|child| tag_name(child) == Some(tag))
        .cloned()
}

fn find_by_id(node: &Handle, id: &str) -> Option<Handle> {
    for child in node.children.borrow().iter() {
        if get_attr(child, "id").as_deref() == Some(id) {
            return Some(child.clone());
        }
        if let Some(found) = find_by_id(child, id) {
            return Some(found);
        }
    }

    None
}

fn is_leaf(node: &Handle) -> bool {
    !node
        .children
        .borrow()
        .iter()
        .any(|child| matches!(child.data, NodeData::Element { .. }))
}

/// Concatenated text children; comments are skipped.
fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    for child in node.children.borrow().iter() {
        if let NodeData::Text { contents } = &child.data {
            text.push_str(&contents.borrow());
        }
    }

    text
}

fn text_node(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    })
}

fn append(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

fn classes(node: &Handle) -> Vec<String> {
    get_attr(node, "class")
        .map(|value| value.split_whitespace().map(String::from).collect())
        .unwrap_or_default()
}

fn get_attr(node: &Handle, name: &str) -> Option<String> {
    let NodeData::Element { attrs, .. } = &node.data else {
        return None;
    };

    attrs
        .borrow()
        .iter()
        .find(|attr| &*attr.name.local == name)
        .map(|attr| attr.value.to_string())
}

/// Sets or, with `None`, removes an attribute.
fn set_attr(node: &Handle, name: &str, value: Option<&str>) {
    let NodeData::Element { attrs, .. } = &node.data else {
        return;
    };
    let mut attrs = attrs.borrow_mut();
    let position = attrs.iter().position(|attr| &*attr.name.local == name);
    match (position, value) {
        (Some(index), Some(value)) => attrs[index].value = StrTendril::from_slice(value),
        (Some(index), None) => {
            attrs.remove(index);
        }
        (None, Some(value)) => attrs.push(Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: StrTendril::from_slice(value),
        }),
        (None, None) => {}
    }
}
