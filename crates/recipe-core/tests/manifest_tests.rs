//! The TOML fixture in test-fixtures/recipes must resolve exactly like the
//! built-in recipe, apart from the code-only CMAKE_CXX_FLAGS projection.

use pretty_assertions::assert_eq;
use recipe_core::builtin::legion;
use recipe_core::{Flag, Manifest, Placeholders, Recipe, Request, Resolution, Resolver};
use rstest::rstest;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    // crates/recipe-core -> ../../test-fixtures
    manifest_dir.join("../../test-fixtures")
}

fn fixture_recipe() -> Recipe {
    let path = fixtures_dir().join("recipes/legion.toml");
    Manifest::load(&path)
        .unwrap_or_else(|e| panic!("failed to load {}: {e}", path.display()))
        .into_recipe()
        .unwrap()
}

fn resolve(recipe: &Recipe, text: &str) -> Resolution {
    Resolver::new(&recipe.schema)
        .resolve(&Request::parse(text).unwrap(), &Placeholders)
        .unwrap()
}

fn without_cxx_flags(flags: &[Flag]) -> Vec<Flag> {
    flags
        .iter()
        .filter(|flag| flag.key != "CMAKE_CXX_FLAGS")
        .cloned()
        .collect()
}

#[test]
fn fixture_metadata_matches_builtin() {
    let fixture = fixture_recipe();
    let builtin = legion().unwrap();

    assert_eq!(fixture.name, builtin.name);
    assert_eq!(fixture.description, builtin.description);
    assert_eq!(fixture.homepage, builtin.homepage);
    assert_eq!(fixture.url, builtin.url);
    assert_eq!(fixture.git, builtin.git);
    assert_eq!(fixture.versions, builtin.versions);
    assert_eq!(fixture.flag_style, builtin.flag_style);

    let names = |recipe: &Recipe| {
        recipe
            .schema
            .options()
            .iter()
            .map(|spec| spec.name.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(names(&fixture), names(&builtin));
    assert_eq!(fixture.schema.constraints(), builtin.schema.constraints());
    assert_eq!(fixture.schema.rules(), builtin.schema.rules());
}

#[rstest]
#[case("")]
#[case("+cuda cuda_arch=60,75 +cuda_hijack")]
#[case("network=gasnetex output_level=spew +spy")]
#[case("+kokkos+cuda %gcc")]
#[case("+llvm +link_llvm_libs ~zlib ~libdl +shared_libs")]
#[case("+build_all +build_tests max_dims=4 max_fields=2048")]
#[case("build_type=Debug +hdf5 +hwloc")]
fn fixture_resolves_like_builtin(#[case] text: &str) {
    let fixture = resolve(&fixture_recipe(), text);
    let builtin = resolve(&legion().unwrap(), text);

    assert_eq!(fixture.selection, builtin.selection);
    assert_eq!(fixture.dependencies, builtin.dependencies);
    assert_eq!(fixture.directive.env, builtin.directive.env);
    assert_eq!(
        fixture.directive.flags,
        without_cxx_flags(&builtin.directive.flags)
    );
}
