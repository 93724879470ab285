//! Fake DOM used by the mock browser.
//!
//! Pages are declared with the [`el`] builder and flattened into a [`Dom`]
//! arena in document order.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use super::MockState;

/// Index of a node inside its [`Dom`]
pub type NodeId = usize;

/// Click handler run against the whole browser state
pub type Action = Arc<dyn Fn(&mut MockState) + Send + Sync>;

/// Declarative element description
#[derive(Clone)]
pub struct El {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    text: String,
    value: Option<String>,
    displayed: bool,
    enabled: bool,
    on_click: Option<Action>,
    children: Vec<El>,
}

/// Start an element description
pub fn el(tag: &str) -> El {
    let tag = tag.to_lowercase();
    let value = matches!(tag.as_str(), "input" | "textarea").then(String::new);
    El {
        tag,
        id: None,
        classes: Vec::new(),
        attrs: BTreeMap::new(),
        text: String::new(),
        value,
        displayed: true,
        enabled: true,
        on_click: None,
        children: Vec::new(),
    }
}

impl El {
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.extend(class.split_whitespace().map(str::to_string));
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn on_click(mut self, action: impl Fn(&mut MockState) + Send + Sync + 'static) -> Self {
        self.on_click = Some(Arc::new(action));
        self
    }

    pub fn child(mut self, child: El) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = El>) -> Self {
        self.children.extend(children);
        self
    }
}

/// One node of the arena
#[derive(Clone)]
pub struct Node {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub value: Option<String>,
    pub displayed: bool,
    pub enabled: bool,
    pub on_click: Option<Action>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A page: nodes in document order, node 0 is the root
#[derive(Clone)]
pub struct Dom {
    nodes: Vec<Node>,
}

impl Dom {
    pub fn build(root: El) -> Self {
        let mut dom = Self { nodes: Vec::new() };
        dom.push(root, None);
        dom
    }

    /// A blank page
    pub fn empty() -> Self {
        Self::build(el("body"))
    }

    fn push(&mut self, el: El, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            tag: el.tag,
            id: el.id,
            classes: el.classes,
            attrs: el.attrs,
            text: el.text,
            value: el.value,
            displayed: el.displayed,
            enabled: el.enabled,
            on_click: el.on_click,
            parent,
            children: Vec::new(),
        });
        for child in el.children {
            let child_id = self.push(child, Some(id));
            self.nodes[id].children.push(child_id);
        }
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// 1-based position among the parent's children
    pub fn child_position(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.nodes[parent].children.iter().position(|&c| c == id).map(|p| p + 1)
    }

    /// Every node id in document order
    pub fn all(&self) -> impl Iterator<Item = NodeId> {
        0..self.nodes.len()
    }

    /// Strict descendants of `id` in document order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().rev().copied());
        }
        out
    }

    /// Displayed when the node and every ancestor are displayed
    pub fn is_displayed(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(n) = current {
            if !self.nodes[n].displayed {
                return false;
            }
            current = self.nodes[n].parent;
        }
        true
    }

    /// Rendered text: own text plus displayed descendants, one block per line
    pub fn rendered_text(&self, id: NodeId) -> String {
        if !self.is_displayed(id) {
            return String::new();
        }
        let mut parts = Vec::new();
        self.collect_text(id, &mut parts);
        parts.join("\n")
    }

    fn collect_text(&self, id: NodeId, parts: &mut Vec<String>) {
        let node = &self.nodes[id];
        if !node.displayed {
            return;
        }
        let own = node.text.trim();
        if !own.is_empty() {
            parts.push(own.to_string());
        }
        for &child in &node.children {
            self.collect_text(child, parts);
        }
    }

    /// Content attribute; `id` and `class` are synthesised from the node
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        let node = &self.nodes[id];
        match name {
            "id" => node.id.clone(),
            "class" => (!node.classes.is_empty()).then(|| node.classes.join(" ")),
            "disabled" => (!node.enabled).then(|| "true".to_string()),
            _ => node.attrs.get(name).cloned(),
        }
    }

    /// First node carrying this element id
    pub fn by_id(&self, element_id: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.id.as_deref() == Some(element_id))
    }

    /// Nearest node, starting at `id` and walking up, with a click handler
    pub fn click_target(&self, id: NodeId) -> Option<(NodeId, Action)> {
        let mut current = Some(id);
        while let Some(n) = current {
            if let Some(action) = &self.nodes[n].on_click {
                return Some((n, action.clone()));
            }
            current = self.nodes[n].parent;
        }
        None
    }

    /// Serialise as HTML-ish markup
    pub fn to_html(&self) -> String {
        let mut out = String::from("<html>");
        self.write_html(0, &mut out);
        out.push_str("</html>");
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id];
        let _ = write!(out, "<{}", node.tag);
        if let Some(element_id) = &node.id {
            let _ = write!(out, " id=\"{}\"", element_id);
        }
        if !node.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", node.classes.join(" "));
        }
        for (name, value) in &node.attrs {
            let _ = write!(out, " {}=\"{}\"", name, value);
        }
        if !node.displayed {
            out.push_str(" style=\"display: none;\"");
        }
        out.push('>');
        out.push_str(&node.text);
        for &child in &node.children {
            self.write_html(child, out);
        }
        let _ = write!(out, "</{}>", node.tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dom {
        Dom::build(
            el("body").child(
                el("div")
                    .class("panel")
                    .child(el("h1").text("Title"))
                    .child(el("p").text("hidden text").hidden())
                    .child(el("span").text(" Tail ")),
            ),
        )
    }

    #[test]
    fn test_document_order() {
        let dom = sample();
        assert_eq!(dom.len(), 5);
        assert_eq!(dom.node(1).tag, "div");
        assert_eq!(dom.descendants(1), vec![2, 3, 4]);
        assert_eq!(dom.child_position(3), Some(2));
    }

    #[test]
    fn test_rendered_text_skips_hidden() {
        let dom = sample();
        assert_eq!(dom.rendered_text(1), "Title\nTail");
        assert_eq!(dom.rendered_text(3), "");
        assert!(!dom.is_displayed(3));
    }

    #[test]
    fn test_synthesised_attributes() {
        let dom = Dom::build(el("button").id("send").class("btn btn-ladda").disabled());
        assert_eq!(dom.attribute(0, "id").as_deref(), Some("send"));
        assert_eq!(dom.attribute(0, "class").as_deref(), Some("btn btn-ladda"));
        assert_eq!(dom.attribute(0, "disabled").as_deref(), Some("true"));
        assert!(dom.to_html().contains("<button id=\"send\""));
    }

    #[test]
    fn test_inputs_start_with_empty_value() {
        let dom = Dom::build(el("body").child(el("textarea").id("t")).child(el("div")));
        assert_eq!(dom.node(1).value.as_deref(), Some(""));
        assert_eq!(dom.node(2).value, None);
    }
}
