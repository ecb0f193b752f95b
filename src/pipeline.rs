//! Build orchestration.
//!
//! A build runs these stages strictly in order. Every stage is fatal on
//! error and nothing is retried:
//!
//! ```text
//! preflight           staging and final output must not exist
//! 1. stage assets     create tmp-site-build/, copy sage/assets/
//! 2. resolve globals  base constants + site-src/global.yml
//! 3. fragments        render sage/templates/common/* → common.*
//! 4. posts            posts/<slug>/index.html
//! 5. about            about/index.html
//! 6. home             index.html
//! 7. promote          tmp-site-build/ → site-build/
//! 8. cleanup          remove tmp-site-build/ if a copy left it behind
//! ```
//!
//! On failure the staging tree is left in place for inspection.

use crate::layout::{ASSETS_DIR, SiteLayout};
use crate::output::{BuildEvent, PromoteMethod, Reporter, Stage};
use crate::page::{PageBuilder, PageError};
use crate::scope::{self, COMMON_KEY, ScopeBuilder, ScopeError};
use crate::template::{HandlebarsRenderer, TemplateRenderer};
use crate::tree::{self, BuildTree, TreeError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error(transparent)]
    Page(#[from] PageError),
}

/// Options for a single build.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Print progress for every stage.
    pub debug: bool,
    /// Remove existing staging and final output before building.
    pub clean: bool,
}

/// What a successful build produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSummary {
    pub post_count: usize,
    pub fragments: Vec<String>,
    pub output: PathBuf,
    pub promote: PromoteMethod,
}

/// Build the site rooted at `layout` with the handlebars renderer.
pub fn build(layout: &SiteLayout, options: &BuildOptions) -> Result<BuildSummary, BuildError> {
    let reporter = Reporter::new(options.debug);
    if options.clean {
        for removed in tree::clean(&[layout.staging_dir(), layout.final_dir()])? {
            reporter.report(&BuildEvent::Cleaned(removed));
        }
    }
    build_with(layout, &HandlebarsRenderer::new(), &reporter)
}

/// Build the site with an explicit renderer and reporter.
pub fn build_with(
    layout: &SiteLayout,
    renderer: &dyn TemplateRenderer,
    reporter: &Reporter,
) -> Result<BuildSummary, BuildError> {
    let staging = layout.staging_dir();
    let final_dir = layout.final_dir();
    tree::ensure_absent(&staging)?;
    tree::ensure_absent(&final_dir)?;

    reporter.report(&BuildEvent::StageStarted(Stage::StageAssets));
    let build_tree = BuildTree::create(&staging)?;
    let assets = layout.assets_dir();
    if assets.is_dir() {
        let to = build_tree.copy_in(&assets, ASSETS_DIR)?;
        reporter.report(&BuildEvent::AssetsCopied { from: assets, to });
    } else {
        reporter.report(&BuildEvent::NoAssets);
    }

    reporter.report(&BuildEvent::StageStarted(Stage::ResolveGlobals));
    let globals = scope::load_globals(&layout.global_vars_file())?;
    let base = ScopeBuilder::base().layer(globals);
    reporter.report(&BuildEvent::GlobalsResolved {
        keys: base.vars().keys().cloned().collect(),
    });

    reporter.report(&BuildEvent::StageStarted(Stage::RenderFragments));
    let fragments = scope::render_fragments(&layout.common_templates_dir(), &base, renderer)?;
    for fragment in &fragments {
        reporter.report(&BuildEvent::FragmentRendered {
            name: fragment.name.clone(),
            source: fragment.source.clone(),
        });
    }
    let ambient = base
        .with(COMMON_KEY, scope::common_value(&fragments))
        .freeze();

    let pages = PageBuilder {
        layout,
        ambient: &ambient,
        renderer,
        tree: &build_tree,
        reporter,
    };

    reporter.report(&BuildEvent::StageStarted(Stage::RenderPosts));
    let post_count = pages.render_posts()?;

    reporter.report(&BuildEvent::StageStarted(Stage::RenderAbout));
    pages.render_about()?;

    reporter.report(&BuildEvent::StageStarted(Stage::RenderHome));
    pages.render_home()?;

    reporter.report(&BuildEvent::StageStarted(Stage::Promote));
    let method = build_tree.promote(&final_dir)?;
    reporter.report(&BuildEvent::Promoted {
        from: staging.clone(),
        to: final_dir.clone(),
        method,
    });

    reporter.report(&BuildEvent::StageStarted(Stage::Cleanup));
    if build_tree.discard()? {
        reporter.report(&BuildEvent::StagingRemoved(staging));
    }

    Ok(BuildSummary {
        post_count,
        fragments: fragments.into_iter().map(|f| f.name).collect(),
        output: final_dir,
        promote: method,
    })
}
