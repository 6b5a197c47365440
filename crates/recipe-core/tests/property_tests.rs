use proptest::prelude::*;
use recipe_core::builtin::legion;
use recipe_core::{Placeholders, Recipe, Request, Resolver};

const BOOLS: [&str; 8] = [
    "shared_libs",
    "bounds_checks",
    "spy",
    "hdf5",
    "hwloc",
    "libdl",
    "zlib",
    "build_tests",
];
const NETWORKS: [&str; 3] = ["gasnetex", "mpi", "none"];
const LEVELS: [&str; 4] = ["spew", "debug", "warning", "fatal"];
const ARCHS: [&str; 3] = ["60", "70", "75"];

fn recipe() -> Recipe {
    legion().unwrap()
}

/// Ungated request text: toggles, a network, an output level and limits.
fn request_text() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(any::<bool>(), BOOLS.len()),
        0..NETWORKS.len(),
        0..LEVELS.len(),
        1i64..8,
        1i64..4096,
    )
        .prop_map(|(toggles, network, level, dims, fields)| {
            let mut terms: Vec<String> = BOOLS
                .iter()
                .zip(toggles)
                .map(|(name, on)| format!("{}{name}", if on { '+' } else { '~' }))
                .collect();
            terms.push(format!("network={}", NETWORKS[network]));
            terms.push(format!("output_level={}", LEVELS[level]));
            terms.push(format!("max_dims={dims}"));
            terms.push(format!("max_fields={fields}"));
            terms.join(" ")
        })
}

proptest! {
    #[test]
    fn resolution_is_deterministic(text in request_text()) {
        let recipe = recipe();
        let resolver = Resolver::new(&recipe.schema);
        let request = Request::parse(&text).unwrap();

        let first = resolver.resolve(&request, &Placeholders).unwrap();
        let second = resolver.resolve(&request, &Placeholders).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn reparse_round_trips_ungated_options(text in request_text()) {
        let recipe = recipe();
        let resolver = Resolver::new(&recipe.schema);
        let resolution = resolver
            .resolve(&Request::parse(&text).unwrap(), &Placeholders)
            .unwrap();

        let recovered = resolver.reparse(&resolution.directive.flags).unwrap();
        for spec in recipe.schema.options() {
            if spec.gate.is_none() && spec.projection.key().is_some() {
                prop_assert_eq!(
                    recovered.get(&spec.name),
                    resolution.selection.get(&spec.name),
                    "option {}", spec.name
                );
            }
        }
    }

    #[test]
    fn multi_choice_order_is_irrelevant(
        archs in prop::sample::subsequence(ARCHS.to_vec(), 1..=ARCHS.len()),
        seed in any::<u64>(),
    ) {
        let mut shuffled = archs.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        if seed % 2 == 0 {
            shuffled.reverse();
        }

        let recipe = recipe();
        let resolver = Resolver::new(&recipe.schema);
        let ordered = Request::parse(&format!("+cuda cuda_arch={}", archs.join(","))).unwrap();
        let permuted = Request::parse(&format!("+cuda cuda_arch={}", shuffled.join(","))).unwrap();

        let a = resolver.resolve(&ordered, &Placeholders).unwrap();
        let b = resolver.resolve(&permuted, &Placeholders).unwrap();
        prop_assert_eq!(&a.directive, &b.directive);
        let expected_arch = archs.join(",");
        prop_assert_eq!(a.directive.flag("Legion_CUDA_ARCH"), Some(expected_arch.as_str()));
    }
}
