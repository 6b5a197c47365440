//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Recipe resolver - turn build option requests into build-tool flags
#[derive(Parser, Debug)]
#[command(name = "recipe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory holding `.recipe/` (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    pub project: Option<PathBuf>,

    /// Override the global config directory
    #[arg(long, global = true, env = "RECIPE_RESOLVER_CONFIG_DIR", hide = true)]
    pub config_dir: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List known recipes
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show a recipe's options, constraints and dependency rules
    Info {
        /// Recipe name
        recipe: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List a recipe's fetchable versions
    Versions {
        /// Recipe name
        recipe: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Validate a request without emitting flags
    ///
    /// Examples:
    ///   recipe check legion +cuda cuda_arch=60,75
    ///   recipe check legion +cuda_hijack      # fails: needs +cuda
    Check(RequestArgs),

    /// Show the dependencies a request pulls in
    Deps {
        #[command(flatten)]
        request: RequestArgs,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Resolve a request into build flags and environment
    ///
    /// Examples:
    ///   recipe resolve legion +cuda network=mpi
    ///   recipe resolve legion +kokkos --attr kokkos.kokkos_cxx=/opt/bin/nvcc_wrapper
    ///   recipe resolve legion --style plain --json
    Resolve {
        #[command(flatten)]
        request: RequestArgs,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,

        /// Flag rendering: cmake (-DKEY=VALUE) or plain (KEY=VALUE)
        #[arg(long)]
        style: Option<String>,

        /// Dependency attribute for environment values, as dep.attr=value
        #[arg(long = "attr")]
        attrs: Vec<String>,

        /// Version to build (defaults to the request's @version, then the
        /// newest tagged release)
        #[arg(long = "version")]
        version: Option<String>,
    },
}

/// A recipe name followed by request terms.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RequestArgs {
    /// Recipe name
    pub recipe: String,

    /// Request terms: +name, ~name, name=value, %compiler, @version
    pub terms: Vec<String>,

    /// Ignore per-recipe defaults from configuration
    #[arg(long)]
    pub no_defaults: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_resolve_with_terms() {
        let cli = Cli::try_parse_from([
            "recipe",
            "resolve",
            "legion",
            "+cuda",
            "~zlib",
            "cuda_arch=60,75",
            "--style",
            "plain",
            "--attr",
            "kokkos.kokkos_cxx=/bin/cxx",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Resolve {
                request,
                style,
                attrs,
                ..
            }) => {
                assert_eq!(request.recipe, "legion");
                assert_eq!(request.terms, vec!["+cuda", "~zlib", "cuda_arch=60,75"]);
                assert_eq!(style.as_deref(), Some("plain"));
                assert_eq!(attrs, vec!["kokkos.kokkos_cxx=/bin/cxx"]);
            }
            other => panic!("expected resolve, got {other:?}"),
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["recipe", "list", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}
