//! CLI output formatting for the build.
//!
//! # Architecture
//!
//! Every event the pipeline reports is a [`BuildEvent`]. [`format_build_event`]
//! turns one into display lines and is pure (no I/O) so it can be tested
//! directly; [`Reporter`] decides whether the lines reach stdout.
//!
//! # Output Format
//!
//! With `--debug`:
//!
//! ```text
//! ==> Stage assets
//!     Copied sage/assets/ → tmp-site-build/assets/
//! ==> Resolve globals
//!     Keys: url-home, url-about, site-name
//! ==> Render shared fragments
//!     header ← header.html.mustache
//! ==> Render posts
//!     Post hello: title, date, content
//!     Post hello → posts/hello/index.html
//! ...
//! ==> Promote
//!     tmp-site-build → site-build (rename)
//! Built 1 post → site-build
//! ```
//!
//! Without `--debug` only the final summary line is printed.

use std::fmt;
use std::path::{Path, PathBuf};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    StageAssets,
    ResolveGlobals,
    RenderFragments,
    RenderPosts,
    RenderAbout,
    RenderHome,
    Promote,
    Cleanup,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::StageAssets,
        Stage::ResolveGlobals,
        Stage::RenderFragments,
        Stage::RenderPosts,
        Stage::RenderAbout,
        Stage::RenderHome,
        Stage::Promote,
        Stage::Cleanup,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::StageAssets => "Stage assets",
            Stage::ResolveGlobals => "Resolve globals",
            Stage::RenderFragments => "Render shared fragments",
            Stage::RenderPosts => "Render posts",
            Stage::RenderAbout => "Render about",
            Stage::RenderHome => "Render home",
            Stage::Promote => "Promote",
            Stage::Cleanup => "Cleanup",
        };
        f.write_str(label)
    }
}

/// How the staging tree reached its final location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoteMethod {
    Rename,
    CopyThenDelete,
}

impl fmt::Display for PromoteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromoteMethod::Rename => f.write_str("rename"),
            PromoteMethod::CopyThenDelete => f.write_str("copy, then delete"),
        }
    }
}

/// Something worth telling the user about while building.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    StageStarted(Stage),
    Cleaned(PathBuf),
    AssetsCopied { from: PathBuf, to: PathBuf },
    NoAssets,
    GlobalsResolved { keys: Vec<String> },
    FragmentRendered { name: String, source: PathBuf },
    /// Page data resolved; `keys` are the page record's fields.
    PageResolved { label: String, keys: Vec<String> },
    PageWritten { label: String, path: PathBuf },
    Promoted {
        from: PathBuf,
        to: PathBuf,
        method: PromoteMethod,
    },
    StagingRemoved(PathBuf),
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Format one build event as display lines.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::StageStarted(stage) => vec![format!("==> {stage}")],
        BuildEvent::Cleaned(path) => vec![format!("    Removed {}", path.display())],
        BuildEvent::AssetsCopied { from, to } => {
            vec![format!(
                "    Copied {}/ \u{2192} {}/",
                from.display(),
                to.display()
            )]
        }
        BuildEvent::NoAssets => vec!["    No assets directory".to_string()],
        BuildEvent::GlobalsResolved { keys } => {
            vec![format!("    Keys: {}", keys.join(", "))]
        }
        BuildEvent::FragmentRendered { name, source } => {
            vec![format!("    {} \u{2190} {}", name, file_name(source))]
        }
        BuildEvent::PageResolved { label, keys } => {
            vec![format!("    {}: {}", label, keys.join(", "))]
        }
        BuildEvent::PageWritten { label, path } => {
            vec![format!("    {} \u{2192} {}", label, path.display())]
        }
        BuildEvent::Promoted { from, to, method } => vec![format!(
            "    {} \u{2192} {} ({})",
            from.display(),
            to.display(),
            method
        )],
        BuildEvent::StagingRemoved(path) => vec![format!("    Removed {}", path.display())],
    }
}

/// Final line printed after a successful build.
pub fn format_summary(post_count: usize, output: &Path) -> String {
    let noun = if post_count == 1 { "post" } else { "posts" };
    format!("Built {} {} \u{2192} {}", post_count, noun, output.display())
}

/// Prints build events to stdout when verbose.
///
/// Passed by reference into every component that reports progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    verbose: bool,
}

impl Reporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// A reporter that never prints.
    pub fn quiet() -> Self {
        Self::new(false)
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn report(&self, event: &BuildEvent) {
        if !self.verbose {
            return;
        }
        for line in format_build_event(event) {
            println!("{}", line);
        }
    }
}

/// Print the summary line to stdout.
pub fn print_summary(post_count: usize, output: &Path) {
    println!("{}", format_summary(post_count, output));
}
