//! Declarative vector scene.
//!
//! An [`Element`] is a tag with attributes, optional text content and children. Optional layers
//! are composed sparsely: [`Element::children`] takes `Option<Element>` items and drops the
//! `None`s. A [`Template`] instantiates one element per datum, with attributes, text and
//! children computed from `(datum, index)`. Materialising a scene to SVG has no side effects.

use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        let value = value.to_string();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Appends every present child, skipping `None` layers.
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = Option<Element>>,
    {
        self.children.extend(children.into_iter().flatten());
        self
    }

    pub fn extend(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Depth-first search, self included.
    pub fn find<'a>(&'a self, pred: &dyn Fn(&Element) -> bool) -> Option<&'a Element> {
        if pred(self) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(pred))
    }

    pub fn count(&self, pred: &dyn Fn(&Element) -> bool) -> usize {
        let own = usize::from(pred(self));
        own + self.children.iter().map(|child| child.count(pred)).sum::<usize>()
    }

    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        self.write_svg(&mut out);
        out
    }

    pub fn write_svg(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape_xml(value));
        }
        if self.text.is_none() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape_xml(text));
        }
        for child in &self.children {
            child.write_svg(out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

/// An attribute of a [`Template`]: fixed, or computed from `(datum, index)`.
pub enum Attr<'a, T> {
    Const(String),
    Bound(Box<dyn Fn(&T, usize) -> String + 'a>),
}

type ChildrenFn<'a, T> = Box<dyn Fn(&T, usize) -> Vec<Option<Element>> + 'a>;

/// One element per datum.
pub struct Template<'a, T> {
    tag: String,
    attrs: Vec<(String, Attr<'a, T>)>,
    text: Option<Attr<'a, T>>,
    children: Option<ChildrenFn<'a, T>>,
}

impl<'a, T> Template<'a, T> {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            text: None,
            children: None,
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.attrs
            .push((name.into(), Attr::Const(value.to_string())));
        self
    }

    pub fn bind(mut self, name: impl Into<String>, f: impl Fn(&T, usize) -> String + 'a) -> Self {
        self.attrs.push((name.into(), Attr::Bound(Box::new(f))));
        self
    }

    pub fn text_with(mut self, f: impl Fn(&T, usize) -> String + 'a) -> Self {
        self.text = Some(Attr::Bound(Box::new(f)));
        self
    }

    pub fn children_with(
        mut self,
        f: impl Fn(&T, usize) -> Vec<Option<Element>> + 'a,
    ) -> Self {
        self.children = Some(Box::new(f));
        self
    }

    pub fn render(&self, data: &[T]) -> Vec<Element> {
        data.iter()
            .enumerate()
            .map(|(index, datum)| self.instantiate(datum, index))
            .collect()
    }

    fn instantiate(&self, datum: &T, index: usize) -> Element {
        let mut element = Element::new(self.tag.clone());
        for (name, value) in &self.attrs {
            element.set_attr(name.clone(), resolve(value, datum, index));
        }
        element.text = self.text.as_ref().map(|text| resolve(text, datum, index));
        if let Some(children) = &self.children {
            element
                .children
                .extend(children(datum, index).into_iter().flatten());
        }
        element
    }
}

fn resolve<T>(attr: &Attr<'_, T>, datum: &T, index: usize) -> String {
    match attr {
        Attr::Const(value) => value.clone(),
        Attr::Bound(f) => f(datum, index),
    }
}

/// A root `<svg>` element ready for output.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn to_svg(&self) -> String {
        let mut root = self.root.clone();
        if root.get_attr("xmlns").is_none() {
            root.attrs
                .insert(0, ("xmlns".to_string(), "http://www.w3.org/2000/svg".to_string()));
        }
        root.to_svg()
    }
}

/// Formats a number the way a JavaScript engine prints it.
pub fn num(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let abs = value.abs();
    if !(1e-6..1e21).contains(&abs) {
        let formatted = format!("{value:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => formatted,
        };
    }
    format!("{value}")
}

pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_children_skip_missing_layers() {
        let show_grid = false;
        let svg = Element::new("svg")
            .children([
                show_grid.then(|| Element::new("rect")),
                Some(Element::new("path").attr("d", "M0,0L0,-1")),
                None,
            ])
            .to_svg();
        assert_eq!(svg, "<svg><path d=\"M0,0L0,-1\"/></svg>");
    }

    #[test]
    fn template_binds_per_datum() {
        let data = [3.0, 4.5];
        let nodes = Template::new("circle")
            .attr("fill", "black")
            .bind("r", |d: &f64, _| num(*d))
            .bind("data-index", |_, i| i.to_string())
            .render(&data);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].get_attr("r"), Some("4.5"));
        assert_eq!(nodes[1].get_attr("data-index"), Some("1"));
        assert_eq!(nodes[0].get_attr("fill"), Some("black"));
    }

    #[test]
    fn template_children_and_text() {
        let data = ["a", "b"];
        let nodes = Template::new("g")
            .children_with(|d: &&str, i| {
                vec![
                    Some(Element::new("text").text(*d)),
                    (i == 1).then(|| Element::new("rect")),
                ]
            })
            .render(&data);
        assert_eq!(nodes[0].children.len(), 1);
        assert_eq!(nodes[1].children.len(), 2);
        let labels = Template::new("text").text_with(|d: &&str, _| d.to_uppercase()).render(&data);
        assert_eq!(labels[1].to_svg(), "<text>B</text>");
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        let svg = Element::new("text").attr("title", "a\"b").text("<&>").to_svg();
        assert_eq!(svg, "<text title=\"a&quot;b\">&lt;&amp;&gt;</text>");
    }

    #[test]
    fn numbers_print_like_javascript() {
        assert_eq!(num(0.0), "0");
        assert_eq!(num(-0.0), "0");
        assert_eq!(num(140.0), "140");
        assert_eq!(num(-86.52), "-86.52");
        assert_eq!(num(1.5e-7), "1.5e-7");
        assert_eq!(num(1e21), "1e+21");
        assert_eq!(num(f64::from(0.1f32)), "0.10000000149011612");
    }

    #[test]
    fn document_adds_namespace() {
        let doc = Document::new(Element::new("svg").attr("width", 480));
        assert_eq!(
            doc.to_svg(),
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"480\"/>"
        );
    }
}
