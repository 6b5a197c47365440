//! Built-in recipes.
//!
//! [`builtin_recipes`] is the only place built-ins are listed. Registry
//! lookup and the CLI's `list` command both derive from it.

use crate::constraint::Constraint;
use crate::dependency::{DependencyRule, DependencyType};
use crate::directive::{Flag, FlagStyle};
use crate::env::EnvValue;
use crate::error::Result;
use crate::predicate::Predicate;
use crate::projection::{Case, Projection};
use crate::recipe::{Recipe, VersionSource};
use crate::schema::{OptionSchema, OptionSpec};

/// Number of built-in recipes.
pub const BUILTIN_COUNT: usize = 1;

/// GPU architectures the Legion recipe can target: 60 Pascal, 70 Volta,
/// 75 Turing.
pub const LEGION_CUDA_ARCHS: [&str; 3] = ["60", "70", "75"];

/// Compiler flags added when `build_type=Debug`.
pub const LEGION_DEBUG_CXX_FLAGS: [&str; 3] = ["-DDEBUG_REALM", "-DDEBUG_LEGION", "-ggdb"];

/// All built-in recipes.
pub fn builtin_recipes() -> Result<Vec<Recipe>> {
    Ok(vec![legion()?])
}

/// The Legion data-centric parallel runtime.
pub fn legion() -> Result<Recipe> {
    let mut recipe = Recipe::new("legion", legion_schema()?);
    recipe.description = "Legion is a data-centric parallel programming system for writing \
        portable high performance programs targeted at distributed heterogeneous architectures."
        .to_string();
    recipe.homepage = Some("http://legion.stanford.edu/".to_string());
    recipe.url =
        Some("https://github.com/StanfordLegion/legion/tarball/legion-20.09.0".to_string());
    recipe.git = Some("https://github.com/StanfordLegion/legion.git".to_string());
    recipe.flag_style = FlagStyle::Cmake;

    let mut versions = vec![
        VersionSource::branch("master", "master"),
        VersionSource::branch("stable", "stable"),
    ];
    versions.extend(
        [
            "20.12.0", "20.09.0", "20.06.0", "20.03.0", "19.12.0", "19.09.1", "19.09.0",
            "19.06.0", "19.04.0", "18.12.0", "18.09.0", "18.02.0",
        ]
        .into_iter()
        .map(|v| VersionSource::tag(v, format!("legion-{v}"))),
    );
    versions.push(VersionSource::branch("ctrl-rep", "control_replication"));
    recipe.versions = versions;

    Ok(recipe)
}

fn toggle(name: &str, key: &str, description: &str) -> OptionSpec {
    OptionSpec::bool(name, false, description).project(Projection::toggle(key))
}

fn legion_schema() -> Result<OptionSchema> {
    let mut builder = OptionSchema::builder()
        .option(
            OptionSpec::bool("shared_libs", false, "Build shared libraries.")
                .project(Projection::switch("BUILD_SHARED_LIBS")),
        )
        .option(
            OptionSpec::choice(
                "network",
                ["gasnetex", "mpi", "none"],
                "none",
                "The network communications layer to use.",
            )
            .project(Projection::map(
                "Legion_NETWORKS",
                [("gasnetex", Some("gasnet1")), ("mpi", Some("mpi")), ("none", None)],
            )),
        )
        .option(toggle(
            "bounds_checks",
            "Legion_BOUNDS_CHECKS",
            "Enable bounds checking in Legion accessors.",
        ))
        .option(toggle(
            "privilege_checks",
            "Legion_PRIVILEGE_CHECKS",
            "Enable runtime privilege checks in Legion accessors.",
        ))
        .option(toggle(
            "enable_tls",
            "Legion_ENABLE_TLS",
            "Enable thread-local-storage of the Legion context.",
        ))
        .option(
            OptionSpec::choice(
                "output_level",
                ["spew", "debug", "info", "print", "warning", "error", "fatal", "none"],
                "warning",
                "Set the compile-time logging level.",
            )
            .project(Projection::assign("Legion_OUTPUT_LEVEL", Case::Upper)),
        )
        .option(toggle(
            "spy",
            "Legion_SPY",
            "Enable detailed logging for Legion Spy debugging.",
        ))
        .option(
            OptionSpec::bool("cuda", false, "Enable CUDA support.").project(
                Projection::toggle("Legion_USE_CUDA")
                    .with_also([Flag::on("Legion_GPU_REDUCTIONS")]),
            ),
        )
        .option(
            OptionSpec::multi(
                "cuda_arch",
                LEGION_CUDA_ARCHS,
                ["70"],
                "GPU/CUDA architecture to build for.",
            )
            .project(Projection::assign("Legion_CUDA_ARCH", Case::Preserve))
            .gated(Predicate::enabled("cuda")),
        )
        .option(
            OptionSpec::bool(
                "cuda_hijack",
                false,
                "Hijack application calls into the CUDA runtime (implies +cuda).",
            )
            .project(Projection::switch("Legion_HIJACK_CUDART"))
            .gated(Predicate::enabled("cuda")),
        )
        .option(toggle("fortran", "Legion_USE_Fortran", "Enable Fortran bindings."))
        .option(toggle("hdf5", "Legion_USE_HDF5", "Enable support for HDF5."))
        .option(toggle("hwloc", "Legion_USE_HWLOC", "Use hwloc for topology awareness."))
        .option(toggle(
            "kokkos",
            "Legion_USE_Kokkos",
            "Enable support for interoperability with Kokkos.",
        ))
        .option(
            OptionSpec::bool("libdl", true, "Enable support for dynamic loading (via libdl).")
                .project(Projection::switch("Legion_USE_LIBDL")),
        )
        .option(toggle(
            "llvm",
            "Legion_USE_LLVM",
            "Enable support for LLVM IR JIT within the Realm runtime.",
        ))
        .option(
            OptionSpec::bool(
                "link_llvm_libs",
                false,
                "Link LLVM libraries into the Realm runtime library.",
            )
            .project(
                Projection::toggle("Legion_LINK_LLVM_LIBS")
                    .with_also([Flag::off("Legion_ALLOW_MISSING_LLVM_LIBS")]),
            ),
        )
        .option(toggle(
            "openmp",
            "Legion_USE_OpenMP",
            "Enable support for OpenMP within Legion tasks.",
        ))
        .option(toggle("papi", "Legion_USE_PAPI", "Enable PAPI performance measurements."))
        .option(toggle("python", "Legion_USE_Python", "Enable Python support."))
        .option(
            OptionSpec::bool("zlib", true, "Enable zlib support.")
                .project(Projection::switch("Legion_USE_ZLIB")),
        )
        .option(toggle(
            "redop_complex",
            "Legion_REDOP_COMPLEX",
            "Use reduction operators for complex types.",
        ))
        .option(toggle(
            "build_all",
            "Legion_BUILD_ALL",
            "Build everything: all bindings, examples, tutorials, tests, apps, etc.",
        ))
        .option(toggle("build_apps", "Legion_BUILD_APPS", "Build the sample applications."))
        .option(toggle(
            "build_bindings",
            "Legion_BUILD_BINDINGS",
            "Build all the language bindings (C, Fortran, Python, etc.).",
        ))
        .option(toggle(
            "build_examples",
            "Legion_BUILD_EXAMPLES",
            "Build the (small'ish) examples.",
        ))
        .option(toggle("build_tests", "Legion_BUILD_TESTS", "Build the test suite."))
        .option(toggle(
            "build_tutorial",
            "Legion_BUILD_TUTORIAL",
            "Build the Legion tutorial examples.",
        ))
        .option(
            OptionSpec::int(
                "max_dims",
                3,
                "Set the maximum number of dimensions available in a logical region.",
            )
            .with_range(Some(1), None)
            .project(Projection::assign("Legion_MAX_DIM", Case::Preserve)),
        )
        .option(
            OptionSpec::int(
                "max_fields",
                512,
                "Maximum number of fields allowed in a logical region.",
            )
            .with_range(Some(1), None)
            .project(Projection::assign("Legion_MAX_FIELDS", Case::Preserve)),
        )
        .option(
            OptionSpec::choice(
                "build_type",
                ["Debug", "Release", "RelWithDebInfo", "MinSizeRel"],
                "RelWithDebInfo",
                "CMake build type.",
            )
            .project(Projection::derived(|selection| {
                let debug = selection
                    .get("build_type")
                    .is_some_and(|value| value.matches("Debug"));
                let cxx_flags = if debug {
                    LEGION_DEBUG_CXX_FLAGS.join(" ")
                } else {
                    String::new()
                };
                vec![Flag::new("CMAKE_CXX_FLAGS", cxx_flags)]
            })),
        )
        .constraint(
            Constraint::conflicts(Predicate::enabled("cuda_hijack"), Predicate::disabled("cuda"))
                .with_message("CUDA hijacking requires CUDA support"),
        )
        .depends_on(DependencyRule::new("cmake@3.1:", "")?.with_types([DependencyType::Build]))
        .depends_on(DependencyRule::new("mpi", "network=mpi")?)
        .depends_on(DependencyRule::new("gasnetex", "network=gasnetex")?)
        .depends_on(DependencyRule::new("hdf5", "+hdf5")?)
        .depends_on(DependencyRule::new("llvm@7.1.0", "+llvm")?)
        .depends_on(DependencyRule::new("llvm@7.1.0", "+link_llvm_libs")?)
        .depends_on(DependencyRule::new("cuda@10:", "+cuda")?)
        .depends_on(DependencyRule::new("zlib@1.2.11", "+zlib")?)
        .depends_on(
            DependencyRule::new("kokkos@3.1:", "+kokkos")?
                .with_env("KOKKOS_CXX_COMPILER", EnvValue::attribute("kokkos", "kokkos_cxx")),
        )
        .depends_on(DependencyRule::new("kokkos-nvcc-wrapper~mpi", "%gcc+kokkos+cuda")?)
        .depends_on(DependencyRule::new("kokkos+wrapper", "%gcc+kokkos+cuda")?);

    for arch in LEGION_CUDA_ARCHS {
        builder = builder.depends_on(DependencyRule::new(
            &format!("kokkos+cuda cuda_arch={arch}"),
            &format!("+kokkos+cuda cuda_arch={arch}"),
        )?);
    }

    builder.build()
}
