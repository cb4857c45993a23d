use clap::{ArgAction, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use stylegraft_lib::classes::ColorMapping;
use stylegraft_lib::installer;
use stylegraft_lib::source::RewriteScope;
use stylegraft_lib::{config, CssVarsOptions, GraftError, GraftResult, RegistryItem};

#[derive(Parser)]
#[command(name = "stylegraft")]
#[command(about = "Adapt component classes and styles to a Tailwind project")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Install the css variables and rules of a registry item into the
    /// project stylesheet.
    Css {
        /// Project file (components.json).
        #[arg(long)]
        config: PathBuf,

        /// Registry item JSON.
        #[arg(long)]
        item: PathBuf,

        /// Scope variables to [data-registry="NAME"] instead of :root.
        #[arg(long)]
        registry: Option<String>,

        /// Replace variables that already exist.
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        overwrite: bool,

        /// Remove the default colors and fonts of a new Next.js app.
        #[arg(long)]
        cleanup_next: bool,

        /// Stylesheet to update, overriding tailwind.css from the config.
        #[arg(long)]
        css: Option<PathBuf>,
    },

    /// Rewrite the class strings of component source files in place.
    Source {
        /// Project file (components.json).
        #[arg(long)]
        config: PathBuf,

        /// Custom palette JSON, used instead of tailwind.baseColor.
        #[arg(long)]
        palette: Option<PathBuf>,

        /// Only touch className/class values and cn()-style helper calls.
        #[arg(long)]
        class_attributes: bool,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() {
    env_logger::init();

    // parse the args given in terminal
    let args: Args = Args::parse();

    if let Err(e) = run(args.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> GraftResult<()> {
    match command {
        Command::Css {
            config: config_path,
            item,
            registry,
            overwrite,
            cleanup_next,
            css,
        } => {
            let mut project = config::load(&config_path)?;
            if css.is_some() {
                project.tailwind.css = css;
            }

            let text = fs::read_to_string(&item).map_err(|source| GraftError::Read {
                path: item.clone(),
                source,
            })?;
            let item: RegistryItem = serde_json::from_str(&text)?;
            let options = CssVarsOptions {
                registry_name: registry,
                overwrite,
                cleanup_default_next_styles: cleanup_next,
                tailwind_config: None,
            };

            if installer::install_registry_item_styles(&item, &project, &options)? {
                println!("Updated stylesheet.");
            } else {
                println!("Stylesheet already up to date.");
            }
        }
        Command::Source {
            config: config_path,
            palette,
            class_attributes,
            files,
        } => {
            let project = config::load(&config_path)?;
            let base_color = match palette {
                Some(path) => Some(ColorMapping::load(&path)?),
                None => project.base_color_mapping()?,
            };
            let scope = if class_attributes {
                RewriteScope::ClassAttributes
            } else {
                RewriteScope::AllStringLiterals
            };

            log::debug!("rewriting {} source files with {:?}", files.len(), scope);
            for file in &files {
                if installer::rewrite_source_file(file, &project, base_color.as_ref(), scope)? {
                    println!("Rewrote {}", file.display());
                }
            }
        }
    }
    Ok(())
}
