//! Small helpers over the `markup5ever_rcdom` tree.
//!
//! rcdom only gives us nodes; these functions add the handful of queries and
//! mutations the renderer and page need (attribute access, class lookup,
//! subtree search, child swapping) while keeping parent links correct.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use html5ever::serialize::{SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{Attribute, LocalName, QualName, ns, serialize};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};

/// Inline style used for hidden elements.
pub const HIDDEN_STYLE: &str = "display: none;";
/// Inline style used for shown elements.
pub const SHOWN_STYLE: &str = "display: block;";

/// Parse a full HTML document.
pub fn parse_html(html: &str) -> RcDom {
    return html5ever::parse_document(RcDom::default(), Default::default()).one(html);
}

/// Create a detached element with attributes.
pub fn element(tag: &str, attrs: &[(&str, &str)]) -> Handle {
    let attributes = attrs
        .iter()
        .map(|(name, value)| {
            return Attribute {
                name: QualName::new(None, ns!(), LocalName::from(*name)),
                value: (*value).into(),
            };
        })
        .collect();

    return Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Element {
            name: QualName::new(None, ns!(html), LocalName::from(tag)),
            attrs: RefCell::new(attributes),
            template_contents: RefCell::default(),
            mathml_annotation_xml_integration_point: false,
        },
    });
}

/// Create a detached text node.
pub fn text(content: &str) -> Handle {
    return Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Text { contents: RefCell::new(content.into()) },
    });
}

/// Builder for element subtrees.
pub struct El {
    node: Handle,
}

impl El {
    pub fn new(tag: &str) -> Self {
        return Self { node: element(tag, &[]) };
    }

    /// Set the `class` attribute.
    #[must_use]
    pub fn class(self, class: &str) -> Self {
        set_attr(&self.node, "class", class);
        return self;
    }

    #[must_use]
    pub fn attr(self, name: &str, value: &str) -> Self {
        set_attr(&self.node, name, value);
        return self;
    }

    /// Append a child node.
    #[must_use]
    pub fn child(self, child: Handle) -> Self {
        append(&self.node, child);
        return self;
    }

    /// Append every node in `children`.
    #[must_use]
    pub fn children(self, children: impl IntoIterator<Item = Handle>) -> Self {
        for child in children {
            append(&self.node, child);
        }
        return self;
    }

    /// Append a text node.
    #[must_use]
    pub fn text(self, content: &str) -> Self {
        append(&self.node, text(content));
        return self;
    }

    pub fn build(self) -> Handle {
        return self.node;
    }
}

/// Append `child` to `parent`, detaching it from any previous parent first.
pub fn append(parent: &Handle, child: Handle) {
    detach(&child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// Replace all children of `parent` in one step.
pub fn replace_children(parent: &Handle, children: Vec<Handle>) {
    let old = std::mem::take(&mut *parent.children.borrow_mut());
    for node in &old {
        node.parent.set(None);
    }
    for child in children {
        append(parent, child);
    }
}

/// Remove `node` from its parent, if it has one.
pub fn detach(node: &Handle) {
    let Some(parent) = parent(node) else { return };
    parent.children.borrow_mut().retain(|c| return !Rc::ptr_eq(c, node));
    node.parent.set(None);
}

/// The parent of `node`, if attached.
pub fn parent(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(std::rc::Weak::upgrade);
    node.parent.set(weak);
    return parent;
}

/// Lowercase tag name for elements.
pub fn tag_name(node: &Handle) -> Option<&str> {
    return match &node.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    };
}

pub fn attr(node: &Handle, name: &str) -> Option<String> {
    let NodeData::Element { attrs, .. } = &node.data else { return None };
    return attrs
        .borrow()
        .iter()
        .find(|a| return &*a.name.local == name)
        .map(|a| return a.value.to_string());
}

/// Set or overwrite an attribute. No-op on non-elements.
pub fn set_attr(node: &Handle, name: &str, value: &str) {
    let NodeData::Element { attrs, .. } = &node.data else { return };
    let mut attrs = attrs.borrow_mut();
    if let Some(existing) = attrs.iter_mut().find(|a| return &*a.name.local == name) {
        existing.value = value.into();
        return;
    }
    attrs.push(Attribute { name: QualName::new(None, ns!(), LocalName::from(name)), value: value.into() });
}

/// True when the `class` attribute lists `class`.
pub fn has_class(node: &Handle, class: &str) -> bool {
    return attr(node, "class").is_some_and(|list| return list.split_whitespace().any(|c| return c == class));
}

/// Concatenated text of the subtree.
pub fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    return out;
}

fn collect_text(node: &Handle, out: &mut String) {
    if let NodeData::Text { contents } = &node.data {
        out.push_str(&contents.borrow());
    }
    for child in node.children.borrow().iter() {
        collect_text(child, out);
    }
}

/// Every node below `root` in document order, `root` excluded.
pub fn descendants(root: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    let mut stack: Vec<Handle> = root.children.borrow().iter().rev().cloned().collect();
    while let Some(node) = stack.pop() {
        stack.extend(node.children.borrow().iter().rev().cloned());
        out.push(node);
    }
    return out;
}

pub fn find_all(root: &Handle, pred: impl Fn(&Handle) -> bool) -> Vec<Handle> {
    return descendants(root).into_iter().filter(|n| return pred(n)).collect();
}

pub fn find_first(root: &Handle, pred: impl Fn(&Handle) -> bool) -> Option<Handle> {
    return descendants(root).into_iter().find(|n| return pred(n));
}

/// Elements below `root` carrying `class`.
pub fn by_class(root: &Handle, class: &str) -> Vec<Handle> {
    return find_all(root, |n| return has_class(n, class));
}

/// First element below `root` whose `id` is `id`.
pub fn by_id(root: &Handle, id: &str) -> Option<Handle> {
    return find_first(root, |n| return attr(n, "id").as_deref() == Some(id));
}

/// `node` itself or its nearest ancestor matching `pred`.
pub fn closest(node: &Handle, pred: impl Fn(&Handle) -> bool) -> Option<Handle> {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if pred(&n) {
            return Some(n);
        }
        current = parent(&n);
    }
    return None;
}

/// True when `node` is `ancestor` or lies inside it.
pub fn contains(ancestor: &Handle, node: &Handle) -> bool {
    return closest(node, |n| return Rc::ptr_eq(n, ancestor)).is_some();
}

pub fn set_hidden(node: &Handle, hidden: bool) {
    set_attr(node, "style", if hidden { HIDDEN_STYLE } else { SHOWN_STYLE });
}

/// True when the inline style hides the element.
pub fn is_hidden(node: &Handle) -> bool {
    return attr(node, "style").is_some_and(|s| return s.replace(' ', "").contains("display:none"));
}

/// Serialize `node` including its own tag.
pub fn outer_html(node: &Handle) -> String {
    return serialize_with(node, TraversalScope::IncludeNode);
}

/// Serialize the children of `node`.
pub fn inner_html(node: &Handle) -> String {
    return serialize_with(node, TraversalScope::ChildrenOnly(None));
}

fn serialize_with(node: &Handle, scope: TraversalScope) -> String {
    let mut out = Vec::new();
    let opts = SerializeOpts { traversal_scope: scope, ..Default::default() };
    // Writing into a Vec cannot fail.
    if serialize(&mut out, &SerializableHandle::from(node.clone()), opts).is_err() {
        return String::new();
    }
    return String::from_utf8_lossy(&out).into_owned();
}
