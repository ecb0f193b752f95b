//! Shared test utilities for the sage test suite.
//!
//! [`SiteFixture`] builds a throwaway site tree in a temp directory:
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let site = SiteFixture::minimal()
//!     .post("hello", "title: Hello\ndate: 2020-01-01\n", "# Hi");
//!
//! let layout = site.layout();
//! build(&layout, &BuildOptions::default()).unwrap();
//! assert!(site.output("posts/hello/index.html").contains("<h1>Hi</h1>"));
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::layout::{PageKind, SiteLayout};

pub const HOME_TEMPLATE: &str = "<title>{{site-name}}</title>{{{common.header}}}\
{{#each post-snippets-date}}<a href=\"{{url}}\">{{title}}|{{date}}</a>{{/each}}";
pub const POST_TEMPLATE: &str = "<title>{{post.title}} - {{site-name}}</title>{{{common.header}}}\
<article>{{{post.content}}}</article><a href=\"{{url-home}}\">home</a>";
pub const ABOUT_TEMPLATE: &str = "<title>About {{site-name}}</title>{{{common.header}}}\
<section>{{{about.content}}}</section>";
pub const HEADER_FRAGMENT: &str = "<header><a href=\"{{url-about}}\">{{site-name}}</a></header>";

/// A site tree rooted in a temp directory.
pub struct SiteFixture {
    tmp: TempDir,
}

impl SiteFixture {
    /// An empty root.
    pub fn new() -> Self {
        Self {
            tmp: TempDir::new().unwrap(),
        }
    }

    /// Globals, a header fragment, all three page templates, an about page,
    /// and an empty posts directory.
    pub fn minimal() -> Self {
        Self::new()
            .file("site-src/global.yml", "site-name: Demo\n")
            .dir("site-src/posts")
            .about("title: About\n", "About me.")
            .fragment("header.html.mustache", HEADER_FRAGMENT)
            .template(PageKind::Home, HOME_TEMPLATE)
            .template(PageKind::Post, POST_TEMPLATE)
            .template(PageKind::About, ABOUT_TEMPLATE)
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn layout(&self) -> SiteLayout {
        SiteLayout::new(self.root())
    }

    /// Write `content` at a root-relative path, creating parents.
    pub fn file(self, rel: &str, content: &str) -> Self {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    pub fn dir(self, rel: &str) -> Self {
        fs::create_dir_all(self.root().join(rel)).unwrap();
        self
    }

    /// A post directory with `meta.yml` and `<slug>.md`.
    pub fn post(self, slug: &str, meta: &str, markdown: &str) -> Self {
        self.file(&format!("site-src/posts/{slug}/meta.yml"), meta)
            .file(&format!("site-src/posts/{slug}/{slug}.md"), markdown)
    }

    pub fn about(self, meta: &str, markdown: &str) -> Self {
        self.file("site-src/about/meta.yml", meta)
            .file("site-src/about/about.md", markdown)
    }

    pub fn fragment(self, file_name: &str, content: &str) -> Self {
        self.file(&format!("sage/templates/common/{file_name}"), content)
    }

    pub fn template(self, kind: PageKind, content: &str) -> Self {
        let rel = format!(
            "sage/templates/{}/index.html.mustache",
            kind.template_dir_name()
        );
        self.file(&rel, content)
    }

    pub fn post_dir(&self, slug: &str) -> PathBuf {
        self.layout().posts_source_dir().join(slug)
    }

    pub fn about_dir(&self) -> PathBuf {
        self.layout().about_source_dir()
    }

    /// Read a file from the final output tree. Panics if missing.
    pub fn output(&self, rel: &str) -> String {
        let path = self.layout().final_dir().join(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("output '{}' not readable: {e}", path.display()))
    }
}
