//! Template rendering seam.
//!
//! The [`TemplateRenderer`] trait is the only thing the rest of the crate
//! knows about templates: render a template string against a scope value.
//! The production implementation is [`HandlebarsRenderer`], which gives
//! mustache semantics:
//!
//! ```text
//! <title>{{site-name}}</title>          escaped substitution
//! {{{common.header}}}                   raw fragment inclusion
//! {{{post.content}}}                    raw rendered markdown
//! {{#post-snippets-date}}               section: once per list item
//!   <a href="{{url}}">{{title}}</a>
//! {{/post-snippets-date}}
//! {{^post-snippets-date}}No posts yet.{{/post-snippets-date}}
//! ```
//!
//! Missing variables render as empty strings, as they do in mustache.
//! Handlebars block helpers (`{{#each}}`, `{{#if}}`) keep working alongside
//! mustache sections; see [`crate::mustache`].

use crate::content::{self, ContentError};
use crate::mustache;
use handlebars::Handlebars;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Page templates are named `index.html.<engine-ext>`.
const PAGE_TEMPLATE_PREFIX: &str = "index.html.";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("Failed to render template {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
    #[error(
        "Expected exactly one index.html.* template in \"{}\", found {}",
        .dir.display(),
        .found.join(", ")
    )]
    AmbiguousTemplate { dir: PathBuf, found: Vec<String> },
}

/// Renders a template string against a variable scope.
///
/// `name` only identifies the template in diagnostics.
pub trait TemplateRenderer {
    fn render(&self, name: &str, template: &str, scope: &Value) -> Result<String, TemplateError>;
}

/// Mustache-compatible renderer backed by handlebars.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        mustache::register(&mut registry);
        Self { registry }
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(&self, name: &str, template: &str, scope: &Value) -> Result<String, TemplateError> {
        self.registry
            .render_template(&mustache::translate(template), scope)
            .map_err(|source| TemplateError::Render {
                name: name.to_string(),
                source: Box::new(source),
            })
    }
}

/// Read a template file, mapping absence to [`ContentError::MissingPath`].
pub fn read_template(path: &Path) -> Result<String, TemplateError> {
    if !path.is_file() {
        return Err(ContentError::MissingPath(path.to_path_buf()).into());
    }
    fs::read_to_string(path).map_err(|e| ContentError::Io(e).into())
}

/// Find the single `index.html.*` file in a page template directory.
pub fn find_page_template(dir: &Path) -> Result<PathBuf, TemplateError> {
    if !dir.is_dir() {
        return Err(ContentError::MissingPath(dir.to_path_buf()).into());
    }

    let mut found: Vec<PathBuf> = content::list_visible(dir)?
        .into_iter()
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .map(|n| n.to_string_lossy().starts_with(PAGE_TEMPLATE_PREFIX))
                    .unwrap_or(false)
        })
        .collect();

    match found.len() {
        0 => Err(ContentError::MissingPath(dir.join("index.html.*")).into()),
        1 => Ok(found.remove(0)),
        _ => Err(TemplateError::AmbiguousTemplate {
            dir: dir.to_path_buf(),
            found: found
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect(),
        }),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Renderer that records every call and returns the template name.
    #[derive(Default)]
    pub struct RecordingRenderer {
        pub calls: RefCell<Vec<(String, Value)>>,
    }

    impl TemplateRenderer for RecordingRenderer {
        fn render(&self, name: &str, _template: &str, scope: &Value) -> Result<String, TemplateError> {
            self.calls
                .borrow_mut()
                .push((name.to_string(), scope.clone()));
            Ok(format!("<{name}>"))
        }
    }

    fn render(template: &str, scope: Value) -> String {
        HandlebarsRenderer::new()
            .render("test", template, &scope)
            .unwrap()
    }

    #[test]
    fn substitutes_hyphenated_keys() {
        let out = render(
            "<a href=\"{{url-home}}\">{{site-name}}</a>",
            json!({"url-home": "/", "site-name": "Demo"}),
        );
        assert_eq!(out, "<a href=\"/\">Demo</a>");
    }

    #[test]
    fn double_braces_escape_html() {
        let out = render("{{title}}", json!({"title": "<b>&</b>"}));
        assert_eq!(out, "&lt;b&gt;&amp;&lt;/b&gt;");
    }

    #[test]
    fn triple_braces_are_raw() {
        let out = render(
            "{{{common.header}}}",
            json!({"common": {"header": "<header>x</header>"}}),
        );
        assert_eq!(out, "<header>x</header>");
    }

    #[test]
    fn missing_variable_renders_empty() {
        assert_eq!(render("[{{nope}}]", json!({})), "[]");
    }

    #[test]
    fn each_iterates_sequences() {
        let out = render(
            "{{#each post-snippets-date}}{{url}};{{/each}}",
            json!({"post-snippets-date": [{"url": "/a/"}, {"url": "/b/"}]}),
        );
        assert_eq!(out, "/a/;/b/;");
    }

    #[test]
    fn section_iterates_list() {
        let out = render(
            "{{#post-snippets-date}}{{title}};{{/post-snippets-date}}",
            json!({"post-snippets-date": [{"title": "A"}, {"title": "B"}]}),
        );
        assert_eq!(out, "A;B;");
    }

    #[test]
    fn section_pushes_mapping() {
        let out = render("{{#post}}{{title}}{{/post}}", json!({"post": {"title": "Hello"}}));
        assert_eq!(out, "Hello");
    }

    #[test]
    fn section_items_see_enclosing_keys() {
        let out = render(
            "{{#posts}}<a href=\"{{url-home}}{{slug}}\">{{/posts}}",
            json!({"url-home": "/", "posts": [{"slug": "a"}]}),
        );
        assert_eq!(out, "<a href=\"/a\">");
    }

    #[test]
    fn section_over_scalars_uses_dot() {
        let out = render("{{#tags}}[{{.}}]{{/tags}}", json!({"tags": ["x", "y"]}));
        assert_eq!(out, "[x][y]");
    }

    #[test]
    fn truthy_scalar_section_renders_once() {
        let out = render("{{#draft}}DRAFT {{title}}{{/draft}}", json!({"draft": true, "title": "T"}));
        assert_eq!(out, "DRAFT T");
    }

    #[test]
    fn inverted_section_renders_when_empty() {
        let template = "{{^posts}}none{{/posts}}{{#posts}}some{{/posts}}";
        assert_eq!(render(template, json!({"posts": []})), "none");
        assert_eq!(render(template, json!({})), "none");
        assert_eq!(render(template, json!({"posts": [1]})), "some");
    }

    #[test]
    fn escapes_like_mustache() {
        let out = render("{{v}}", json!({"v": "it's \"x\" a=b"}));
        assert_eq!(out, "it&#x27;s &quot;x&quot; a=b");
    }

    #[test]
    fn malformed_template_is_render_error() {
        let err = HandlebarsRenderer::new()
            .render("broken.html", "{{#each}}", &json!({}))
            .unwrap_err();
        assert!(matches!(err, TemplateError::Render { .. }));
        assert!(err.to_string().contains("broken.html"));
    }

    #[test]
    fn finds_single_page_template() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.html.mustache"), "x").unwrap();
        fs::write(tmp.path().join("notes.txt"), "x").unwrap();
        let found = find_page_template(tmp.path()).unwrap();
        assert!(found.ends_with("index.html.mustache"));
    }

    #[test]
    fn no_page_template_is_missing_path() {
        let tmp = TempDir::new().unwrap();
        let err = find_page_template(tmp.path()).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::Content(ContentError::MissingPath(_))
        ));
    }

    #[test]
    fn two_page_templates_is_ambiguous() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.html.mustache"), "x").unwrap();
        fs::write(tmp.path().join("index.html.hbs"), "x").unwrap();
        let err = find_page_template(tmp.path()).unwrap_err();
        assert!(matches!(err, TemplateError::AmbiguousTemplate { .. }));
    }

    #[test]
    fn missing_template_dir_is_missing_path() {
        let tmp = TempDir::new().unwrap();
        let err = find_page_template(&tmp.path().join("homepage")).unwrap_err();
        assert!(err.to_string().contains("homepage"));
    }
}
