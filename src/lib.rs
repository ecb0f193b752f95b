//! # Sage
//!
//! A small static site generator for a personal blog. A site is a fixed
//! directory convention: posts and an about page under `site-src/`, templates
//! and static assets under `sage/`. One invocation renders everything into a
//! fresh staging tree and promotes it to `site-build/` only once every page
//! succeeded.
//!
//! ```text
//! <root>/
//! ├── site-src/
//! │   ├── global.yml                 # Site-wide variables (required)
//! │   ├── posts/<slug>/              # One metadata file + one markdown file
//! │   └── about/                     # Same shape as a post
//! └── sage/
//!     ├── assets/                    # Copied verbatim (optional)
//!     └── templates/
//!         ├── common/                # Shared fragments → `common.<name>`
//!         ├── homepage/index.html.*
//!         ├── posts/index.html.*
//!         └── about/index.html.*
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Runs the build stages in order and owns the top-level error |
//! | [`layout`] | Fixed directory names and the paths derived from a site root |
//! | [`content`] | Locates and parses a content directory's metadata and markdown |
//! | [`markdown`] | Markdown → HTML |
//! | [`template`] | Mustache-style rendering behind the [`template::TemplateRenderer`] seam |
//! | [`mustache`] | Mustache sections, inverted sections and escaping on top of handlebars |
//! | [`scope`] | Layered variable scope: base, globals, shared fragments, one page key |
//! | [`page`] | Post and about records, validation, and page rendering |
//! | [`tree`] | Write-once staging tree and its promotion to the final output |
//! | [`output`] | Progress events and the summary line |
//!
//! # Design Decisions
//!
//! ## Ambient Scope Is Frozen
//!
//! Globals and rendered fragments are collected into a [`scope::ScopeBuilder`]
//! and frozen into an [`scope::AmbientScope`] before any page renders. Each page
//! renders against an overlay holding exactly one extra key (`post`, `about`, or
//! `post-snippets-date`), so nothing one page sees can leak into the next.
//!
//! ## Staged Output
//!
//! Nothing touches `site-build/` until the whole site is rendered. A failed
//! build leaves `tmp-site-build/` in place for inspection and the next build
//! refuses to start until it is removed (or `--clean` is passed).

pub mod content;
pub mod layout;
pub mod markdown;
pub mod mustache;
pub mod output;
pub mod page;
pub mod pipeline;
pub mod scope;
pub mod template;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_helpers;
