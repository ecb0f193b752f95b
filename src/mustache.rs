//! Mustache sections on top of handlebars.
//!
//! Handlebars treats `{{#name}}` as a call to a helper called `name` and
//! cannot parse `{{^name}}` at all. Templates written for mustache use both,
//! so before rendering, [`translate`] rewrites them into two helpers
//! registered by [`register`]:
//!
//! ```text
//! {{#posts}}…{{/posts}}    →  {{#mustache-section posts}}…{{/mustache-section}}
//! {{^posts}}…{{/posts}}    →  {{#mustache-inverted posts}}…{{/mustache-inverted}}
//! {{.}}                    →  {{this}}
//! ```
//!
//! Native handlebars blocks (`each`, `if`, `unless`, `with`, or any block
//! with arguments) pass through untouched.
//!
//! A section over a list renders once per item, a mapping renders once with
//! the mapping pushed onto the scope, and any other truthy value renders
//! once in place. Keys not found in a pushed item resolve from the enclosing
//! scope. Falsy values (null, false, zero, empty string, list or mapping)
//! skip the section and render its inverse.

use handlebars::{
    BlockContext, Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext,
    RenderError, RenderErrorReason, Renderable, Template,
};
use serde_json::{Map, Value};

pub const SECTION_HELPER: &str = "mustache-section";
pub const INVERTED_HELPER: &str = "mustache-inverted";

const NATIVE_BLOCKS: &[&str] = &["each", "if", "unless", "with"];

/// Install the section helpers and mustache's escape set on `registry`.
pub fn register(registry: &mut Handlebars<'_>) {
    registry.register_helper(SECTION_HELPER, Box::new(SectionHelper));
    registry.register_helper(INVERTED_HELPER, Box::new(InvertedHelper));
    registry.register_escape_fn(escape_html);
}

/// Escape `& < > " '` and nothing else.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Mustache truthiness: empty containers and strings are false, as is zero.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

enum Open {
    Native(String),
    Section(String),
    Inverted(String),
}

/// Rewrite mustache section tags into handlebars helper blocks.
///
/// Unbalanced or mismatched closing tags are left as written so handlebars
/// reports them.
pub fn translate(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut open: Vec<Open> = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tag = &rest[start..];

        if tag.starts_with("{{{") {
            let end = tag.find("}}}").map(|i| i + 3).unwrap_or(tag.len());
            out.push_str(&tag[..end]);
            rest = &tag[end..];
            continue;
        }

        let Some(close) = tag.find("}}") else {
            out.push_str(tag);
            rest = "";
            break;
        };
        let whole = &tag[..close + 2];
        match translate_tag(tag[2..close].trim(), &mut open) {
            Some(rewritten) => out.push_str(&rewritten),
            None => out.push_str(whole),
        }
        rest = &tag[close + 2..];
    }

    out.push_str(rest);
    out
}

fn translate_tag(inner: &str, open: &mut Vec<Open>) -> Option<String> {
    if inner == "." {
        return Some("{{this}}".to_string());
    }

    if let Some(name) = inner.strip_prefix('#') {
        let name = name.trim();
        let head = name.split_whitespace().next().unwrap_or_default();
        if NATIVE_BLOCKS.contains(&head) || head != name {
            open.push(Open::Native(head.to_string()));
            return None;
        }
        open.push(Open::Section(name.to_string()));
        return Some(format!("{{{{#{SECTION_HELPER} {name}}}}}"));
    }

    if let Some(name) = inner.strip_prefix('^') {
        let name = name.trim();
        // Bare `{{^}}` is handlebars' else.
        if name.is_empty() {
            return None;
        }
        open.push(Open::Inverted(name.to_string()));
        return Some(format!("{{{{#{INVERTED_HELPER} {name}}}}}"));
    }

    if let Some(name) = inner.strip_prefix('/') {
        let name = name.trim();
        let matches = match open.last() {
            Some(Open::Native(n) | Open::Section(n) | Open::Inverted(n)) => n == name,
            None => false,
        };
        if !matches {
            return None;
        }
        return match open.pop() {
            Some(Open::Section(_)) => Some(format!("{{{{/{SECTION_HELPER}}}}}")),
            Some(Open::Inverted(_)) => Some(format!("{{{{/{INVERTED_HELPER}}}}}")),
            _ => None,
        };
    }

    None
}

fn param_value(h: &Helper<'_>, helper: &'static str) -> Result<Value, RenderError> {
    h.param(0)
        .map(|p| p.value().clone())
        .ok_or_else(|| RenderErrorReason::ParamNotFoundForIndex(helper, 0).into())
}

/// The scope a section item renders against: the enclosing scope's keys
/// with the item's keys on top. Non-mapping items replace the scope.
fn frame(ctx: &Context, rc: &RenderContext<'_, '_>, item: Value) -> Value {
    let Value::Object(fields) = item else {
        return item;
    };
    let enclosing = rc
        .block()
        .and_then(|b| b.base_value())
        .unwrap_or(ctx.data());
    let mut merged = match enclosing {
        Value::Object(parent) => parent.clone(),
        _ => Map::new(),
    };
    merged.extend(fields);
    Value::Object(merged)
}

fn render_in<'reg: 'rc, 'rc>(
    template: &'rc Template,
    base: Value,
    r: &'reg Handlebars<'reg>,
    ctx: &'rc Context,
    rc: &mut RenderContext<'reg, 'rc>,
    out: &mut dyn Output,
) -> HelperResult {
    let mut block = BlockContext::new();
    block.set_base_value(base);
    rc.push_block(block);
    let result = template.render(r, ctx, rc, out);
    rc.pop_block();
    result
}

struct SectionHelper;

impl HelperDef for SectionHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let value = param_value(h, SECTION_HELPER)?;
        if !is_truthy(&value) {
            return match h.inverse() {
                Some(t) => t.render(r, ctx, rc, out),
                None => Ok(()),
            };
        }
        let Some(template) = h.template() else {
            return Ok(());
        };

        match value {
            Value::Array(items) => {
                for item in items {
                    let base = frame(ctx, rc, item);
                    render_in(template, base, r, ctx, rc, out)?;
                }
                Ok(())
            }
            Value::Object(_) => {
                let base = frame(ctx, rc, value);
                render_in(template, base, r, ctx, rc, out)
            }
            _ => template.render(r, ctx, rc, out),
        }
    }
}

struct InvertedHelper;

impl HelperDef for InvertedHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let value = param_value(h, INVERTED_HELPER)?;
        let branch = if is_truthy(&value) {
            h.inverse()
        } else {
            h.template()
        };
        match branch {
            Some(t) => t.render(r, ctx, rc, out),
            None => Ok(()),
        }
    }
}
