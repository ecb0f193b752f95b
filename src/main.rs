use clap::Parser;
use sage::layout::SiteLayout;
use sage::output;
use sage::pipeline::{self, BuildOptions};
use std::process::ExitCode;

fn version_string() -> &'static str {
    let on_tag = env!("SAGE_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("SAGE_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "sage")]
#[command(about = "Static site generator for a markdown blog")]
#[command(long_about = "\
Static site generator for a markdown blog

Run from the site root. Sources are read from fixed locations and the
finished site is written to site-build/:

  site-src/
  ├── global.yml                 # Site-wide variables
  ├── posts/
  │   └── hello/
  │       ├── meta.yml           # Must set title and date
  │       └── hello.md
  └── about/
      ├── meta.yml
      └── about.md
  sage/
  ├── assets/                    # Copied to site-build/assets/
  └── templates/
      ├── common/                # Shared fragments, available as common.<name>
      ├── homepage/index.html.mustache
      ├── posts/index.html.mustache
      └── about/index.html.mustache

The build renders into tmp-site-build/ and moves it to site-build/ only
when every page succeeded. Neither directory may exist beforehand.")]
#[command(version = version_string())]
struct Cli {
    /// Print progress for every build stage
    #[arg(short, long)]
    debug: bool,

    /// Remove site-build/ and tmp-site-build/ before building
    #[arg(short, long)]
    clean: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let options = BuildOptions {
        debug: cli.debug,
        clean: cli.clean,
    };
    let layout = SiteLayout::new(".");

    match pipeline::build(&layout, &options) {
        Ok(summary) => {
            output::print_summary(summary.post_count, &summary.output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{e}");
            ExitCode::from(1)
        }
    }
}
