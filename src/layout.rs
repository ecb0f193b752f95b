//! The fixed filesystem contract of a site.
//!
//! Every path sage reads or writes is derived from a single invocation root:
//!
//! ```text
//! <root>/
//! ├── site-src/
//! │   ├── global.yml               # Global template variables (required)
//! │   ├── about/                   # One .yml + one .md
//! │   └── posts/
//! │       └── <slug>/              # One .yml + one .md per post
//! ├── sage/
//! │   ├── assets/                  # Optional, copied to <output>/assets/
//! │   └── templates/
//! │       ├── common/              # Shared fragments (header.html.mustache, ...)
//! │       ├── homepage/index.html.*
//! │       ├── posts/index.html.*
//! │       └── about/index.html.*
//! ├── tmp-site-build/              # Staging tree, exists only during a build
//! └── site-build/                  # Final output, promoted from staging
//! ```

use std::path::{Path, PathBuf};

pub const SOURCE_DIR: &str = "site-src";
pub const GENERATOR_DIR: &str = "sage";
pub const STAGING_DIR: &str = "tmp-site-build";
pub const FINAL_DIR: &str = "site-build";

pub const GLOBAL_VARS_FILE: &str = "global.yml";
pub const POSTS_DIR: &str = "posts";
pub const ABOUT_DIR: &str = "about";
pub const ASSETS_DIR: &str = "assets";
pub const INDEX_PAGE: &str = "index.html";

/// The three page kinds, each with its own template directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Home,
    Post,
    About,
}

impl PageKind {
    /// Directory under `sage/templates/` holding this page's template.
    pub fn template_dir_name(self) -> &'static str {
        match self {
            PageKind::Home => "homepage",
            PageKind::Post => "posts",
            PageKind::About => "about",
        }
    }
}

/// Root-relative paths for one site.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    root: PathBuf,
}

impl SiteLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn global_vars_file(&self) -> PathBuf {
        self.root.join(SOURCE_DIR).join(GLOBAL_VARS_FILE)
    }

    pub fn posts_source_dir(&self) -> PathBuf {
        self.root.join(SOURCE_DIR).join(POSTS_DIR)
    }

    pub fn about_source_dir(&self) -> PathBuf {
        self.root.join(SOURCE_DIR).join(ABOUT_DIR)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join(GENERATOR_DIR).join(ASSETS_DIR)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join(GENERATOR_DIR).join("templates")
    }

    pub fn common_templates_dir(&self) -> PathBuf {
        self.templates_dir().join("common")
    }

    pub fn page_template_dir(&self, kind: PageKind) -> PathBuf {
        self.templates_dir().join(kind.template_dir_name())
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    pub fn final_dir(&self) -> PathBuf {
        self.root.join(FINAL_DIR)
    }
}

/// Output directory of a page, relative to the build tree root.
///
/// The home page lives at the root itself, so its relative dir is empty.
pub fn page_output_dir(kind: PageKind, slug: Option<&str>) -> PathBuf {
    match (kind, slug) {
        (PageKind::Home, _) => PathBuf::new(),
        (PageKind::About, _) => PathBuf::from(ABOUT_DIR),
        (PageKind::Post, Some(slug)) => Path::new(POSTS_DIR).join(slug),
        (PageKind::Post, None) => PathBuf::from(POSTS_DIR),
    }
}

/// Public URL of a post: `/posts/<slug>/`.
pub fn post_url(slug: &str) -> String {
    format!("/{POSTS_DIR}/{slug}/")
}
