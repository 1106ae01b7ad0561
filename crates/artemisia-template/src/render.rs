use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::dom::{self, Element, Node};
use crate::expr::{escape_html, evaluate, interpolate, to_text, truthy};
use crate::sfc::{kebab_to_camel, parse_blocks, parse_imports, resolve_virtual_path};

/// Components nested deeper than this abort the render.
const MAX_DEPTH: usize = 10;

#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),
    #[error("component not found: {path} (imported from {from})")]
    ComponentNotFound { path: String, from: String },
    #[error("component nesting exceeds 10 levels at {0}")]
    NestingTooDeep(String),
    #[error("no <template> block in {0}")]
    MissingTemplateBlock(String),
}

/// A collection of `.van` sources keyed by path relative to the views
/// directory, e.g. `pages/about.van` or `layouts/site.van`.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    files: HashMap<String, String>,
}

impl TemplateSet {
    pub fn from_files(files: HashMap<String, String>) -> Self {
        Self { files }
    }

    /// Whether a template id (`pages/about`) resolves to a file.
    pub fn contains(&self, id: &str) -> bool {
        self.files.contains_key(&id_to_path(id))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Render template `id` with `data` as its scope into a full HTML document.
    ///
    /// Styles from every component used are injected before `</head>`; output
    /// without an `<html>` element is wrapped in a default document shell.
    pub fn render(&self, id: &str, data: &Value) -> Result<String, RenderError> {
        let path = id_to_path(id);
        if !self.files.contains_key(&path) {
            return Err(RenderError::TemplateNotFound(id.to_string()));
        }

        let mut renderer = Renderer {
            set: self,
            components: HashMap::new(),
            styles: Vec::new(),
        };
        let page = renderer.component(&path)?;
        let no_slots = HashMap::new();
        let ctx = Ctx {
            scope: data,
            component: &page,
            slots: &no_slots,
            depth: 0,
        };
        let mut body = String::new();
        renderer.render_nodes(&page.nodes, &ctx, &mut body)?;

        let style_block = renderer
            .styles
            .iter()
            .map(|css| format!("<style>{css}</style>"))
            .collect::<Vec<_>>()
            .join("\n");

        if body.contains("<html") {
            inject_before_close(&mut body, "</head>", &style_block);
            Ok(body)
        } else {
            let title = escape_html(&to_text(&data["title"]));
            Ok(format!(
                r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<title>{title}</title>
{style_block}
</head>
<body>
{body}
</body>
</html>"#
            ))
        }
    }
}

fn id_to_path(id: &str) -> String {
    let id = id.trim_matches('/');
    if id.ends_with(".van") {
        id.to_string()
    } else {
        format!("{id}.van")
    }
}

/// Insert `content` on its own lines before `close_tag`, indented one level
/// deeper than the line holding the tag.
fn inject_before_close(html: &mut String, close_tag: &str, content: &str) {
    if content.is_empty() {
        return;
    }
    if let Some(pos) = html.find(close_tag) {
        let before = &html[..pos];
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line_prefix = &before[line_start..];
        if !line_prefix.trim().is_empty() {
            // Tag shares a line with other content; insert inline.
            html.insert_str(pos, content);
            return;
        }
        let child_indent = format!("{line_prefix}  ");
        let mut injection = String::new();
        for line in content.lines() {
            injection.push_str(&child_indent);
            injection.push_str(line);
            injection.push('\n');
        }
        html.insert_str(line_start, &injection);
    }
}

/// A parsed `.van` file.
struct Component {
    path: String,
    nodes: Vec<Node>,
    /// Kebab tag name → virtual path of the imported component.
    imports: HashMap<String, String>,
}

/// Per-level render state.
#[derive(Clone, Copy)]
struct Ctx<'c> {
    scope: &'c Value,
    component: &'c Component,
    /// Slot name → HTML already rendered in the caller's scope.
    slots: &'c HashMap<String, String>,
    depth: usize,
}

struct Renderer<'a> {
    set: &'a TemplateSet,
    components: HashMap<String, Rc<Component>>,
    /// Collected `<style>` bodies in first-use order, deduplicated.
    styles: Vec<String>,
}

impl Renderer<'_> {
    /// Parse (once per render) the component at `path`. The caller has
    /// already checked that the file exists.
    fn component(&mut self, path: &str) -> Result<Rc<Component>, RenderError> {
        if let Some(component) = self.components.get(path) {
            return Ok(Rc::clone(component));
        }
        let source = self
            .set
            .files
            .get(path)
            .ok_or_else(|| RenderError::TemplateNotFound(path.to_string()))?;

        let blocks = parse_blocks(source);
        let template = blocks
            .template
            .ok_or_else(|| RenderError::MissingTemplateBlock(path.to_string()))?;
        let imports = blocks
            .script_setup
            .as_deref()
            .map(parse_imports)
            .unwrap_or_default()
            .into_iter()
            .map(|imp| (imp.tag_name, resolve_virtual_path(path, &imp.path)))
            .collect();
        for css in blocks.styles {
            if !self.styles.contains(&css) {
                self.styles.push(css);
            }
        }

        let component = Rc::new(Component {
            path: path.to_string(),
            nodes: dom::parse(&template),
            imports,
        });
        self.components
            .insert(path.to_string(), Rc::clone(&component));
        Ok(component)
    }

    /// Render a sibling list, resolving `v-if` / `v-else-if` / `v-else` chains.
    fn render_nodes(
        &mut self,
        nodes: &[Node],
        ctx: &Ctx,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let mut i = 0;
        while i < nodes.len() {
            let Node::Element(el) = &nodes[i] else {
                self.render_node(&nodes[i], ctx, out)?;
                i += 1;
                continue;
            };

            if el.has_attr("v-else-if") || el.has_attr("v-else") {
                log::debug!("{}: v-else without v-if on <{}>", ctx.component.path, el.name);
                i += 1;
                continue;
            }
            let Some(cond) = el.attr("v-if") else {
                self.render_node(&nodes[i], ctx, out)?;
                i += 1;
                continue;
            };

            // Collect the chain; whitespace between branches is dropped.
            let mut branches: Vec<(Option<&str>, &Node)> = vec![(Some(cond), &nodes[i])];
            let mut last = i;
            let mut k = i + 1;
            while k < nodes.len() {
                match &nodes[k] {
                    Node::Text(t) if t.trim().is_empty() => k += 1,
                    Node::Element(next) if next.has_attr("v-else-if") => {
                        branches.push((next.attr("v-else-if"), &nodes[k]));
                        last = k;
                        k += 1;
                    }
                    Node::Element(next) if next.has_attr("v-else") => {
                        branches.push((None, &nodes[k]));
                        last = k;
                        break;
                    }
                    _ => break,
                }
            }

            let chosen = branches.into_iter().find(|(cond, _)| match cond {
                Some(expr) => truthy(&evaluate(expr, ctx.scope)),
                None => true,
            });
            if let Some((_, node)) = chosen {
                self.render_node(node, ctx, out)?;
            }
            i = last + 1;
        }
        Ok(())
    }

    fn render_node(&mut self, node: &Node, ctx: &Ctx, out: &mut String) -> Result<(), RenderError> {
        match node {
            Node::Text(text) => out.push_str(&interpolate(text, ctx.scope)),
            Node::Comment(body) => {
                out.push_str("<!--");
                out.push_str(body);
                out.push_str("-->");
            }
            Node::Doctype(body) => {
                out.push_str("<!");
                out.push_str(body);
                out.push('>');
            }
            Node::Element(el) => match el.attr("v-for") {
                Some(expr) => self.render_for(el, expr, ctx, out)?,
                None => self.render_element(el, ctx, out)?,
            },
        }
        Ok(())
    }

    /// `v-for="item in items"` or `v-for="(item, index) in items"`.
    /// Arrays bind the position as index; objects bind the key.
    fn render_for(
        &mut self,
        el: &Element,
        expr: &str,
        ctx: &Ctx,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let Some((item_name, index_name, source)) = parse_for(expr) else {
            log::debug!("{}: unparseable v-for \"{expr}\"", ctx.component.path);
            return Ok(());
        };

        let entries: Vec<(Value, Value)> = match evaluate(source, ctx.scope) {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (item, Value::from(i)))
                .collect(),
            Value::Object(map) => map
                .into_iter()
                .map(|(key, item)| (item, Value::String(key)))
                .collect(),
            _ => Vec::new(),
        };

        for (item, index) in entries {
            let mut scope = match ctx.scope {
                Value::Object(map) => map.clone(),
                _ => Map::new(),
            };
            scope.insert(item_name.to_string(), item);
            if let Some(index_name) = index_name {
                scope.insert(index_name.to_string(), index);
            }
            let scope = Value::Object(scope);
            let item_ctx = Ctx {
                scope: &scope,
                ..*ctx
            };
            self.render_element(el, &item_ctx, out)?;
        }
        Ok(())
    }

    fn render_element(&mut self, el: &Element, ctx: &Ctx, out: &mut String) -> Result<(), RenderError> {
        if el.is("slot") {
            let name = el.attr("name").unwrap_or("default");
            return match ctx.slots.get(name) {
                Some(html) => {
                    out.push_str(html);
                    Ok(())
                }
                None => self.render_nodes(&el.children, ctx, out),
            };
        }
        if el.is("template") {
            return self.render_nodes(&el.children, ctx, out);
        }
        if let Some(path) = ctx.component.imports.get(&el.name.to_ascii_lowercase()) {
            let path = path.clone();
            return self.render_component(el, &path, ctx, out);
        }

        out.push('<');
        out.push_str(&el.name);
        write_attrs(el, ctx.scope, out);

        let void = dom::is_void(&el.name);
        if void {
            out.push_str(if el.self_closing { " />" } else { ">" });
            return Ok(());
        }
        out.push('>');

        if let Some(expr) = el.attr("v-html") {
            out.push_str(&to_text(&evaluate(expr, ctx.scope)));
        } else if let Some(expr) = el.attr("v-text") {
            out.push_str(&escape_html(&to_text(&evaluate(expr, ctx.scope))));
        } else if dom::is_raw_text(&el.name) {
            out.push_str(&dom::serialize(&el.children));
        } else {
            self.render_nodes(&el.children, ctx, out)?;
        }

        out.push_str("</");
        out.push_str(&el.name);
        out.push('>');
        Ok(())
    }

    fn render_component(
        &mut self,
        el: &Element,
        path: &str,
        ctx: &Ctx,
        out: &mut String,
    ) -> Result<(), RenderError> {
        if ctx.depth + 1 > MAX_DEPTH {
            return Err(RenderError::NestingTooDeep(path.to_string()));
        }
        if !self.set.files.contains_key(path) {
            return Err(RenderError::ComponentNotFound {
                path: path.to_string(),
                from: ctx.component.path.clone(),
            });
        }

        let mut props = Map::new();
        for attr in &el.attrs {
            let name = attr.name.as_str();
            if let Some(bound) = name.strip_prefix(':').or_else(|| name.strip_prefix("v-bind:")) {
                let expr = attr.value.as_deref().unwrap_or("");
                props.insert(kebab_to_camel(bound), evaluate(expr, ctx.scope));
            } else if is_directive(name) {
                continue;
            } else {
                let value = match &attr.value {
                    Some(v) => Value::String(interpolate(v, ctx.scope)),
                    None => Value::Bool(true),
                };
                props.insert(kebab_to_camel(name), value);
            }
        }

        // Named slots come from `<template #name>`; everything else is the
        // default slot. All slot content renders in the caller's scope.
        let mut slots = HashMap::new();
        let mut default_nodes = Vec::new();
        for child in &el.children {
            match child {
                Node::Element(tpl) if tpl.is("template") && slot_name(tpl).is_some() => {
                    let name = slot_name(tpl).unwrap_or("default").to_string();
                    let mut html = String::new();
                    self.render_nodes(&tpl.children, ctx, &mut html)?;
                    slots.insert(name, html);
                }
                other => default_nodes.push(other.clone()),
            }
        }
        if !slots.contains_key("default") {
            let mut html = String::new();
            self.render_nodes(&default_nodes, ctx, &mut html)?;
            if !html.trim().is_empty() {
                slots.insert("default".to_string(), html);
            }
        }

        let child = self.component(path)?;
        let scope = Value::Object(props);
        let child_ctx = Ctx {
            scope: &scope,
            component: &child,
            slots: &slots,
            depth: ctx.depth + 1,
        };
        self.render_nodes(&child.nodes, &child_ctx, out)
    }
}

/// `#name`, `v-slot:name` or bare `v-slot` (default).
fn slot_name(tpl: &Element) -> Option<&str> {
    tpl.attrs.iter().find_map(|a| {
        if let Some(name) = a.name.strip_prefix('#') {
            Some(name)
        } else if let Some(name) = a.name.strip_prefix("v-slot:") {
            Some(name)
        } else if a.name == "v-slot" {
            Some("default")
        } else {
            None
        }
    })
}

fn is_directive(name: &str) -> bool {
    name.starts_with("v-") || name.starts_with('@') || name.starts_with('#')
}

fn parse_for(expr: &str) -> Option<(&str, Option<&str>, &str)> {
    let (lhs, source) = expr
        .split_once(" in ")
        .or_else(|| expr.split_once(" of "))?;
    let lhs = lhs.trim().trim_start_matches('(').trim_end_matches(')');
    let mut names = lhs.split(',').map(str::trim);
    let item = names.next().filter(|n| !n.is_empty())?;
    let index = names.next().filter(|n| !n.is_empty());
    Some((item, index, source.trim()))
}

/// Write the attributes of a plain element: directives are dropped, `:attr`
/// bindings are evaluated, static values are interpolated.
fn write_attrs(el: &Element, scope: &Value, out: &mut String) {
    let mut class_parts: Vec<String> = Vec::new();
    let mut class_pos: Option<usize> = None;
    let mut rendered: Vec<(String, Option<String>)> = Vec::new();

    for attr in &el.attrs {
        let name = attr.name.as_str();
        if let Some(bound) = name.strip_prefix(':').or_else(|| name.strip_prefix("v-bind:")) {
            if bound == "key" {
                continue;
            }
            let value = evaluate(attr.value.as_deref().unwrap_or(""), scope);
            if bound == "class" {
                class_pos.get_or_insert(rendered.len());
                class_parts.push(class_value(&value));
                continue;
            }
            match value {
                Value::Null | Value::Bool(false) => {}
                Value::Bool(true) => rendered.push((bound.to_string(), None)),
                other => rendered.push((bound.to_string(), Some(escape_html(&to_text(&other))))),
            }
        } else if is_directive(name) {
            continue;
        } else {
            let value = attr.value.as_deref().map(|v| interpolate(v, scope));
            if name.eq_ignore_ascii_case("class") {
                class_pos.get_or_insert(rendered.len());
                class_parts.insert(0, value.unwrap_or_default());
                continue;
            }
            rendered.push((name.to_string(), value));
        }
    }

    if let Some(pos) = class_pos {
        let class = class_parts
            .iter()
            .flat_map(|c| c.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ");
        if !class.is_empty() {
            rendered.insert(pos, ("class".to_string(), Some(class)));
        }
    }

    for (name, value) in rendered {
        out.push(' ');
        out.push_str(&name);
        if let Some(value) = value {
            out.push_str("=\"");
            out.push_str(&value.replace('"', "&quot;"));
            out.push('"');
        }
    }
}

/// Class binding value: a string, an array of strings, or an object whose
/// truthy keys are the class names.
fn class_value(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(class_value)
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(map) => map
            .iter()
            .filter(|(_, on)| truthy(on))
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        other => escape_html(&to_text(other)),
    }
}
