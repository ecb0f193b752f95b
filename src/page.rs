//! Page rendering: posts, the about page, and the home page.
//!
//! Each page follows the same steps: discover its content directory, load the
//! metadata, render the markdown into `content`, overlay the result on the
//! ambient scope under the page key, render the page template, and write
//! `index.html` into the staging tree.
//!
//! | Page | Source | Page key | Output |
//! |------|--------|----------|--------|
//! | Post | `site-src/posts/<slug>/` | `post` | `posts/<slug>/index.html` |
//! | About | `site-src/about/` | `about` | `about/index.html` |
//! | Home | every post | `post-snippets-date` | `index.html` |
//!
//! Posts must carry `date` and `title`. The about page is not validated.
//!
//! The home page list is sorted ascending by the raw `date` text, compared
//! as plain strings: `2020-01-01` comes before `2021-06-01`, and a date
//! written as `5 May 2021` sorts wherever its characters put it.

use crate::content::{self, ContentError, Metadata};
use crate::layout::{self, PageKind, SiteLayout};
use crate::markdown::render_markdown;
use crate::output::{BuildEvent, Reporter};
use crate::scope::{ABOUT_KEY, AmbientScope, POST_KEY, POST_LIST_KEY};
use crate::template::{TemplateError, TemplateRenderer, find_page_template, read_template};
use crate::tree::{BuildTree, TreeError};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Metadata fields every post must define.
pub const REQUIRED_POST_FIELDS: &[&str] = &["date", "title"];

pub const CONTENT_FIELD: &str = "content";
pub const URL_FIELD: &str = "url";

#[derive(Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(
        "Post \"{}\" must have a {field} specified in its metadata file.",
        .dir.display()
    )]
    RequiredFieldMissing { dir: PathBuf, field: &'static str },
}

/// A post's metadata plus its rendered `content`.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub slug: String,
    pub fields: Metadata,
}

impl PostRecord {
    /// Sort key for the home page: the raw `date` text.
    ///
    /// Strings compare as written. A date YAML read as a number or other
    /// scalar compares by its textual form.
    pub fn date_key(&self) -> String {
        match self.fields.get("date") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    pub fn url(&self) -> String {
        layout::post_url(&self.slug)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Home page entry: the post fields plus `url`.
    pub fn into_snippet(self) -> Value {
        let url = self.url();
        let mut fields = self.fields;
        fields.insert(URL_FIELD.to_string(), Value::from(url));
        Value::Object(fields)
    }
}

/// Metadata plus rendered `content` for the about page.
#[derive(Debug, Clone, PartialEq)]
pub struct AboutRecord {
    pub fields: Metadata,
}

/// Load a content directory into a field map with `content` rendered.
fn load_record(dir: &Path) -> Result<Metadata, ContentError> {
    let (mut fields, markdown) = content::load_content(dir)?;
    fields.insert(
        CONTENT_FIELD.to_string(),
        Value::from(render_markdown(&markdown)),
    );
    Ok(fields)
}

/// Load and validate one post directory.
pub fn load_post(dir: &Path) -> Result<PostRecord, PageError> {
    let slug = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ContentError::MissingPath(dir.to_path_buf()))?;
    let fields = load_record(dir)?;

    for &field in REQUIRED_POST_FIELDS {
        if !fields.contains_key(field) {
            return Err(PageError::RequiredFieldMissing {
                dir: dir.to_path_buf(),
                field,
            });
        }
    }

    Ok(PostRecord { slug, fields })
}

/// Load the about page. No fields are required.
pub fn load_about(dir: &Path) -> Result<AboutRecord, PageError> {
    Ok(AboutRecord {
        fields: load_record(dir)?,
    })
}

/// Post directories under `posts_dir`, ordered by slug.
///
/// Plain files and dot-directories are ignored.
pub fn post_dirs(posts_dir: &Path) -> Result<Vec<PathBuf>, PageError> {
    if !posts_dir.is_dir() {
        return Err(ContentError::MissingPath(posts_dir.to_path_buf()).into());
    }
    let dirs: Vec<PathBuf> = content::list_visible(posts_dir)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect();
    Ok(dirs)
}

/// Load every post, failing on the first invalid one.
pub fn collect_posts(posts_dir: &Path) -> Result<Vec<PostRecord>, PageError> {
    post_dirs(posts_dir)?
        .iter()
        .map(|dir| load_post(dir))
        .collect()
}

/// Order posts for the home page: ascending by raw `date` text.
///
/// The sort is stable, so posts sharing a date keep slug order.
pub fn sort_by_date(posts: &mut [PostRecord]) {
    posts.sort_by_key(|p| p.date_key());
}

fn field_keys(fields: &Metadata) -> Vec<String> {
    fields.keys().cloned().collect()
}

/// Renders pages into a staging tree against a shared ambient scope.
pub struct PageBuilder<'a> {
    pub layout: &'a SiteLayout,
    pub ambient: &'a AmbientScope,
    pub renderer: &'a dyn TemplateRenderer,
    pub tree: &'a BuildTree,
    pub reporter: &'a Reporter,
}

impl PageBuilder<'_> {
    fn page_template(&self, kind: PageKind) -> Result<(String, String), PageError> {
        let path = find_page_template(&self.layout.page_template_dir(kind))?;
        let name = path
            .strip_prefix(self.layout.root())
            .unwrap_or(&path)
            .display()
            .to_string();
        Ok((name, read_template(&path)?))
    }

    fn write(
        &self,
        label: String,
        kind: PageKind,
        slug: Option<&str>,
        html: &str,
    ) -> Result<PathBuf, PageError> {
        let rel_dir = layout::page_output_dir(kind, slug);
        let path = self.tree.write_page(&rel_dir, html)?;
        self.reporter.report(&BuildEvent::PageWritten {
            label,
            path: path.clone(),
        });
        Ok(path)
    }

    /// Render every post, one at a time, in slug order.
    ///
    /// Returns the number of posts written. A failure leaves the posts
    /// written so far in place.
    pub fn render_posts(&self) -> Result<usize, PageError> {
        let (template_name, template) = self.page_template(PageKind::Post)?;
        let dirs = post_dirs(&self.layout.posts_source_dir())?;

        for dir in &dirs {
            let post = load_post(dir)?;
            let label = format!("Post {}", post.slug);
            self.reporter.report(&BuildEvent::PageResolved {
                label: label.clone(),
                keys: field_keys(&post.fields),
            });

            let scope = self.ambient.overlay(POST_KEY, post.to_value());
            let html = self
                .renderer
                .render(&template_name, &template, &scope.to_value())?;
            self.write(label, PageKind::Post, Some(&post.slug), &html)?;
        }

        Ok(dirs.len())
    }

    /// Render the about page.
    pub fn render_about(&self) -> Result<PathBuf, PageError> {
        let (template_name, template) = self.page_template(PageKind::About)?;
        let about = load_about(&self.layout.about_source_dir())?;
        self.reporter.report(&BuildEvent::PageResolved {
            label: "About".to_string(),
            keys: field_keys(&about.fields),
        });

        let scope = self.ambient.overlay(ABOUT_KEY, Value::Object(about.fields));
        let html = self
            .renderer
            .render(&template_name, &template, &scope.to_value())?;
        self.write("About".to_string(), PageKind::About, None, &html)
    }

    /// Render the home page with every post in date order.
    ///
    /// Posts are loaded afresh rather than reused from [`Self::render_posts`].
    pub fn render_home(&self) -> Result<PathBuf, PageError> {
        let (template_name, template) = self.page_template(PageKind::Home)?;
        let mut posts = collect_posts(&self.layout.posts_source_dir())?;
        sort_by_date(&mut posts);

        let snippets: Vec<Value> = posts.into_iter().map(PostRecord::into_snippet).collect();
        let scope = self.ambient.overlay(POST_LIST_KEY, Value::Array(snippets));
        let html = self
            .renderer
            .render(&template_name, &template, &scope.to_value())?;
        self.write("Home".to_string(), PageKind::Home, None, &html)
    }
}
