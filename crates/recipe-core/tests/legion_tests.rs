use pretty_assertions::assert_eq;
use recipe_core::builtin::legion;
use recipe_core::{Error, FlagStyle, Placeholders, Request, Resolution, Resolver, StaticAttributes};
use rstest::rstest;

fn resolve(text: &str) -> recipe_core::Result<Resolution> {
    let recipe = legion()?;
    Resolver::new(&recipe.schema).resolve(&Request::parse(text)?, &Placeholders)
}

#[test]
fn default_cmake_args() {
    let resolution = resolve("").unwrap();
    let args = resolution.directive.args(FlagStyle::Cmake).join("\n");

    insta::assert_snapshot!(args, @r###"
    -DBUILD_SHARED_LIBS=OFF
    -DLegion_OUTPUT_LEVEL=WARNING
    -DLegion_USE_LIBDL=ON
    -DLegion_USE_ZLIB=ON
    -DLegion_MAX_DIM=3
    -DLegion_MAX_FIELDS=512
    -DCMAKE_CXX_FLAGS=
    "###);
    assert_eq!(resolution.dependencies.names(), vec!["cmake", "zlib"]);
    assert!(resolution.directive.env.is_empty());
}

#[test]
fn cuda_build_args() {
    let resolution = resolve("+cuda cuda_arch=75,60 +cuda_hijack").unwrap();
    let args = resolution.directive.args(FlagStyle::Cmake).join("\n");

    insta::assert_snapshot!(args, @r###"
    -DBUILD_SHARED_LIBS=OFF
    -DLegion_OUTPUT_LEVEL=WARNING
    -DLegion_USE_CUDA=ON
    -DLegion_GPU_REDUCTIONS=ON
    -DLegion_CUDA_ARCH=60,75
    -DLegion_HIJACK_CUDART=ON
    -DLegion_USE_LIBDL=ON
    -DLegion_USE_ZLIB=ON
    -DLegion_MAX_DIM=3
    -DLegion_MAX_FIELDS=512
    -DCMAKE_CXX_FLAGS=
    "###);
    assert!(resolution.dependencies.contains("cuda"));
}

#[rstest]
#[case("network=gasnetex", "Legion_NETWORKS", Some("gasnet1"))]
#[case("network=mpi", "Legion_NETWORKS", Some("mpi"))]
#[case("network=none", "Legion_NETWORKS", None)]
#[case("output_level=debug", "Legion_OUTPUT_LEVEL", Some("DEBUG"))]
#[case("+shared_libs", "BUILD_SHARED_LIBS", Some("ON"))]
#[case("~zlib", "Legion_USE_ZLIB", Some("OFF"))]
#[case("~libdl", "Legion_USE_LIBDL", Some("OFF"))]
#[case("+spy", "Legion_SPY", Some("ON"))]
#[case("+kokkos", "Legion_USE_Kokkos", Some("ON"))]
#[case("+link_llvm_libs", "Legion_ALLOW_MISSING_LLVM_LIBS", Some("OFF"))]
#[case("max_dims=4", "Legion_MAX_DIM", Some("4"))]
#[case("max_fields=1024", "Legion_MAX_FIELDS", Some("1024"))]
#[case("build_type=Debug", "CMAKE_CXX_FLAGS", Some("-DDEBUG_REALM -DDEBUG_LEGION -ggdb"))]
#[case("build_type=Release", "CMAKE_CXX_FLAGS", Some(""))]
#[case("cuda_arch=60", "Legion_CUDA_ARCH", None)]
fn single_option_flags(#[case] text: &str, #[case] key: &str, #[case] expected: Option<&str>) {
    let resolution = resolve(text).unwrap();
    assert_eq!(resolution.directive.flag(key), expected, "request '{text}'");
}

#[rstest]
#[case("network=mpi", "mpi")]
#[case("network=gasnetex", "gasnetex")]
#[case("+hdf5", "hdf5")]
#[case("+llvm", "llvm")]
#[case("+link_llvm_libs", "llvm")]
#[case("+cuda", "cuda")]
#[case("+kokkos", "kokkos")]
fn option_pulls_dependency(#[case] text: &str, #[case] dependency: &str) {
    assert!(!resolve("").unwrap().dependencies.contains(dependency));
    assert!(resolve(text).unwrap().dependencies.contains(dependency));
}

#[test]
fn hijack_requires_cuda() {
    let err = resolve("+cuda_hijack").unwrap_err();
    assert!(matches!(err, Error::ConstraintViolation { .. }));
}

#[test]
fn llvm_rules_merge_into_one_entry() {
    let resolution = resolve("+llvm +link_llvm_libs").unwrap();
    let llvm = resolution.dependencies.get("llvm").unwrap();
    assert_eq!(llvm.spec.to_string(), "llvm ==7.1.0");
    assert_eq!(llvm.rules.len(), 2);
}

#[test]
fn cmake_is_build_only() {
    let resolution = resolve("").unwrap();
    let cmake = resolution.dependencies.get("cmake").unwrap();
    assert_eq!(cmake.spec.types.len(), 1);
    assert_eq!(cmake.spec.to_string(), "cmake >=3.1");
}

#[test]
fn kokkos_cuda_with_gcc_pulls_wrappers() {
    let resolution = resolve("+kokkos+cuda %gcc").unwrap();
    let deps = &resolution.dependencies;

    assert_eq!(
        deps.names(),
        vec!["cmake", "cuda", "kokkos", "kokkos-nvcc-wrapper", "zlib"]
    );
    assert_eq!(
        deps.get("kokkos").unwrap().spec.to_string(),
        "kokkos >=3.1 +cuda cuda_arch=70 +wrapper"
    );
    assert_eq!(
        deps.get("kokkos-nvcc-wrapper").unwrap().spec.to_string(),
        "kokkos-nvcc-wrapper ~mpi"
    );
}

#[test]
fn kokkos_cuda_without_gcc_skips_wrappers() {
    let resolution = resolve("+kokkos+cuda %clang").unwrap();
    assert!(!resolution.dependencies.contains("kokkos-nvcc-wrapper"));
    assert_eq!(
        resolution.dependencies.get("kokkos").unwrap().spec.to_string(),
        "kokkos >=3.1 +cuda cuda_arch=70"
    );
}

#[test]
fn kokkos_cannot_target_two_archs() {
    let err = resolve("+kokkos+cuda cuda_arch=60,75").unwrap_err();
    match err {
        Error::DependencyConflict { dependency, .. } => assert_eq!(dependency, "kokkos"),
        other => panic!("expected DependencyConflict, got {other:?}"),
    }
}

#[test]
fn kokkos_compiler_env_from_attributes() {
    let recipe = legion().unwrap();
    let resolver = Resolver::new(&recipe.schema);
    let request = Request::parse("+kokkos").unwrap();

    let placeholder = resolver.resolve(&request, &Placeholders).unwrap();
    assert_eq!(
        placeholder.directive.env.get("KOKKOS_CXX_COMPILER").map(String::as_str),
        Some("${kokkos.kokkos_cxx}")
    );

    let mut attributes = StaticAttributes::new();
    attributes
        .insert_parsed("kokkos.kokkos_cxx=/opt/kokkos/bin/nvcc_wrapper")
        .unwrap();
    let concrete = resolver.resolve(&request, &attributes).unwrap();
    assert_eq!(
        concrete.directive.env.get("KOKKOS_CXX_COMPILER").map(String::as_str),
        Some("/opt/kokkos/bin/nvcc_wrapper")
    );
}

#[test]
fn every_tag_is_prefixed() {
    let recipe = legion().unwrap();
    for version in &recipe.versions {
        if let recipe_core::SourceRef::Tag(tag) = &version.source {
            assert_eq!(tag, &format!("legion-{}", version.name));
        }
    }
}
