//! Layered template variable scopes.
//!
//! Every render sees the same **ambient scope**, assembled once per build in
//! a fixed order, each layer shallow-merged over the previous one (a later key
//! replaces an earlier key wholesale; nested mappings are not merged):
//!
//! ```text
//! 1. base       url-home, url-about
//! 2. global     every key of site-src/global.yml
//! 3. common     { header: "<rendered>", footer: "<rendered>", ... }
//! ```
//!
//! Fragments in `common` are rendered against layers 1+2 only, so they never
//! see each other's output.
//!
//! A page then renders against a [`PageScope`]: a borrowed view of the frozen
//! [`AmbientScope`] plus exactly one page key (`post`, `about`, or
//! `post-snippets-date`). The ambient scope is never mutated, which is what
//! keeps one page's data out of every other page.

use crate::content::{self, Metadata};
use crate::template::{TemplateError, TemplateRenderer, read_template};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const URL_HOME_KEY: &str = "url-home";
pub const URL_ABOUT_KEY: &str = "url-about";
pub const URL_HOME: &str = "/";
pub const URL_ABOUT: &str = "/about/";

/// Reserved key holding the rendered shared fragments.
pub const COMMON_KEY: &str = "common";
pub const POST_KEY: &str = "post";
pub const ABOUT_KEY: &str = "about";
pub const POST_LIST_KEY: &str = "post-snippets-date";

#[derive(Error, Debug)]
pub enum ScopeError {
    #[error(transparent)]
    Content(#[from] content::ContentError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(
        "Shared fragments \"{}\" and \"{}\" both define `{name}`",
        .first.display(),
        .second.display()
    )]
    DuplicateFragment {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// A scope under construction. Layers are applied with [`ScopeBuilder::layer`]
/// and the result is frozen with [`ScopeBuilder::freeze`].
#[derive(Debug, Clone, Default)]
pub struct ScopeBuilder {
    vars: Metadata,
}

impl ScopeBuilder {
    /// Start from the built-in base values.
    pub fn base() -> Self {
        let mut vars = Metadata::new();
        vars.insert(URL_HOME_KEY.to_string(), Value::from(URL_HOME));
        vars.insert(URL_ABOUT_KEY.to_string(), Value::from(URL_ABOUT));
        Self { vars }
    }

    /// Shallow-merge `layer` on top: its keys replace existing keys.
    pub fn layer(mut self, layer: Metadata) -> Self {
        for (key, value) in layer {
            self.vars.insert(key, value);
        }
        self
    }

    /// Set a single key, replacing any earlier value.
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.vars.insert(key.to_string(), value);
        self
    }

    pub fn vars(&self) -> &Metadata {
        &self.vars
    }

    pub fn freeze(self) -> AmbientScope {
        AmbientScope {
            vars: Value::Object(self.vars),
        }
    }
}

/// The frozen scope shared by every page of a build.
#[derive(Debug, Clone, PartialEq)]
pub struct AmbientScope {
    vars: Value,
}

impl AmbientScope {
    pub fn value(&self) -> &Value {
        &self.vars
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    /// Top-level keys, in map order.
    pub fn keys(&self) -> Vec<&str> {
        self.vars
            .as_object()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// A fresh page view over this scope with one extra key.
    pub fn overlay(&self, key: &'static str, value: Value) -> PageScope<'_> {
        PageScope {
            ambient: self,
            key,
            value,
        }
    }
}

/// The ambient scope plus one page-specific key.
#[derive(Debug)]
pub struct PageScope<'a> {
    ambient: &'a AmbientScope,
    key: &'static str,
    value: Value,
}

impl PageScope<'_> {
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Materialize the merged value handed to the template renderer.
    ///
    /// The page key shadows an ambient key of the same name.
    pub fn to_value(&self) -> Value {
        let mut merged = self.ambient.vars.as_object().cloned().unwrap_or_default();
        merged.insert(self.key.to_string(), self.value.clone());
        Value::Object(merged)
    }
}

/// One rendered shared fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub name: String,
    pub source: PathBuf,
    pub html: String,
}

/// Short name of a fragment file: everything before the first `.`.
///
/// `header.html.mustache` → `header`.
pub fn fragment_name(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

/// Load the global layer from `global.yml`. The file is required.
pub fn load_globals(path: &Path) -> Result<Metadata, ScopeError> {
    Ok(content::load_metadata(path)?)
}

/// Render every file in `dir` against `scope`, in file-name order.
///
/// Dot-files and subdirectories are skipped. Two files deriving the same
/// short name are an error rather than a silent overwrite.
pub fn render_fragments(
    dir: &Path,
    scope: &ScopeBuilder,
    renderer: &dyn TemplateRenderer,
) -> Result<Vec<Fragment>, ScopeError> {
    if !dir.is_dir() {
        return Err(content::ContentError::MissingPath(dir.to_path_buf()).into());
    }

    let files: Vec<PathBuf> = content::list_visible(dir)?
        .into_iter()
        .filter(|p| p.is_file())
        .collect();

    // Fragments only ever see base + global.
    let visible = Value::Object(scope.vars().clone());

    let mut fragments: Vec<Fragment> = Vec::with_capacity(files.len());
    for path in files {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = fragment_name(&file_name).to_string();

        if let Some(existing) = fragments.iter().find(|f| f.name == name) {
            return Err(ScopeError::DuplicateFragment {
                name,
                first: existing.source.clone(),
                second: path,
            });
        }

        let template = read_template(&path)?;
        let html = renderer.render(&file_name, &template, &visible)?;
        fragments.push(Fragment {
            name,
            source: path,
            html,
        });
    }

    Ok(fragments)
}

/// The `common` mapping: fragment name → rendered HTML.
pub fn common_value(fragments: &[Fragment]) -> Value {
    let map: Metadata = fragments
        .iter()
        .map(|f| (f.name.clone(), Value::from(f.html.clone())))
        .collect();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::HandlebarsRenderer;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn meta(value: Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn base_has_url_constants() {
        let scope = ScopeBuilder::base().freeze();
        assert_eq!(scope.get("url-home"), Some(&json!("/")));
        assert_eq!(scope.get("url-about"), Some(&json!("/about/")));
    }

    #[test]
    fn later_layer_overwrites_earlier_key() {
        let scope = ScopeBuilder::base()
            .layer(meta(json!({"url-home": "/blog/", "site-name": "Demo"})))
            .freeze();
        assert_eq!(scope.get("url-home"), Some(&json!("/blog/")));
        assert_eq!(scope.get("site-name"), Some(&json!("Demo")));
    }

    #[test]
    fn layering_is_shallow() {
        let scope = ScopeBuilder::default()
            .layer(meta(json!({"author": {"name": "A", "email": "a@x"}})))
            .layer(meta(json!({"author": {"name": "B"}})))
            .freeze();
        assert_eq!(scope.get("author"), Some(&json!({"name": "B"})));
    }

    #[test]
    fn overlay_does_not_touch_ambient() {
        let ambient = ScopeBuilder::base().freeze();
        let before = ambient.clone();

        let page = ambient.overlay(POST_KEY, json!({"title": "Hello"}));
        let value = page.to_value();
        assert_eq!(value["post"]["title"], "Hello");
        assert_eq!(value["url-home"], "/");

        assert_eq!(ambient, before);
        assert!(ambient.get(POST_KEY).is_none());
    }

    #[test]
    fn sibling_overlays_are_independent() {
        let ambient = ScopeBuilder::base().freeze();
        let post = ambient.overlay(POST_KEY, json!({"title": "P"})).to_value();
        let about = ambient.overlay(ABOUT_KEY, json!({"title": "A"})).to_value();
        assert!(post.get(ABOUT_KEY).is_none());
        assert!(about.get(POST_KEY).is_none());
    }

    #[test]
    fn fragment_name_is_text_before_first_dot() {
        assert_eq!(fragment_name("header.html.mustache"), "header");
        assert_eq!(fragment_name("footer"), "footer");
        assert_eq!(fragment_name("nav.html"), "nav");
    }

    #[test]
    fn fragments_see_globals_but_not_each_other() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.html"), "A:{{site-name}}:{{common.b}}").unwrap();
        fs::write(tmp.path().join("b.html"), "B:{{url-home}}:{{common.a}}").unwrap();

        let scope = ScopeBuilder::base().layer(meta(json!({"site-name": "Demo"})));
        let fragments = render_fragments(tmp.path(), &scope, &HandlebarsRenderer::new()).unwrap();

        let names: Vec<&str> = fragments.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(fragments[0].html, "A:Demo:");
        assert_eq!(fragments[1].html, "B:/:");
    }

    #[test]
    fn duplicate_fragment_names_are_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("header.html"), "x").unwrap();
        fs::write(tmp.path().join("header.txt"), "y").unwrap();

        let err = render_fragments(tmp.path(), &ScopeBuilder::base(), &HandlebarsRenderer::new())
            .unwrap_err();
        assert!(matches!(err, ScopeError::DuplicateFragment { ref name, .. } if name == "header"));
    }

    #[test]
    fn hidden_fragment_files_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".gitkeep"), "").unwrap();
        fs::write(tmp.path().join("footer.html"), "f").unwrap();

        let fragments =
            render_fragments(tmp.path(), &ScopeBuilder::base(), &HandlebarsRenderer::new()).unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].name, "footer");
    }

    #[test]
    fn missing_common_dir_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = render_fragments(
            &tmp.path().join("common"),
            &ScopeBuilder::base(),
            &HandlebarsRenderer::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ScopeError::Content(content::ContentError::MissingPath(_))
        ));
    }

    #[test]
    fn common_value_maps_names_to_html() {
        let fragments = vec![Fragment {
            name: "header".to_string(),
            source: PathBuf::from("header.html"),
            html: "<h>".to_string(),
        }];
        assert_eq!(common_value(&fragments), json!({"header": "<h>"}));
    }

    #[test]
    fn missing_globals_file_is_missing_path() {
        let tmp = TempDir::new().unwrap();
        let err = load_globals(&tmp.path().join("global.yml")).unwrap_err();
        assert!(matches!(
            err,
            ScopeError::Content(content::ContentError::MissingPath(_))
        ));
    }
}
