use bayes_search::config::{CAPE_PYTHON_CORNERS, CAPE_PYTHON_PRIORS};
use bayes_search::outcome::cells_to_search;
use bayes_search::{
    revise, Corners, MapExtent, OutcomeModel, RegionGrid, RegionId, SearchConfig, SearchError,
    SearchSpace, SearchState,
};
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn normalised(weights: Vec<f64>) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

fn priors_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01f64..1.0, 2..7).prop_map(normalised)
}

proptest! {
    #[test]
    fn beliefs_sum_to_one_after_revision(
        priors in priors_strategy(),
        seed in any::<u64>(),
        rounds in 1usize..20,
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut beliefs = priors.clone();
        for _ in 0..rounds {
            let effectiveness: Vec<f64> = beliefs
                .iter()
                .map(|_| if rng.gen_bool(0.5) { rng.gen_range(0.0..0.95) } else { 0.0 })
                .collect();
            revise(&mut beliefs, &effectiveness).unwrap();
            let sum: f64 = beliefs.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-9, "sum = {}", sum);
        }
    }

    #[test]
    fn search_once_covers_floor_of_e_times_cells(
        width in 1u32..30,
        height in 1u32..30,
        e in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let grid = RegionGrid::new(width, height);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let pass = OutcomeModel::default().search_once(RegionId(1), &grid, e, None, &mut rng);

        let expected = (e * grid.cell_count() as f64).floor() as usize;
        prop_assert_eq!(pass.coverage.len(), expected);
        prop_assert_eq!(cells_to_search(e, grid.cell_count()), expected);

        let mut seen = std::collections::HashSet::new();
        for cell in pass.coverage.cells() {
            prop_assert!(cell.x < width && cell.y < height);
            prop_assert!(seen.insert(cell), "duplicate cell {:?}", cell);
        }
        prop_assert!(!pass.found);
    }

    #[test]
    fn searched_region_loses_mass_and_others_gain(
        priors in priors_strategy(),
        pick in any::<prop::sample::Index>(),
        e in 0.01f64..0.99,
    ) {
        let searched = pick.index(priors.len());
        let mut effectiveness = vec![0.0; priors.len()];
        effectiveness[searched] = e;

        let mut beliefs = priors.clone();
        revise(&mut beliefs, &effectiveness).unwrap();

        for (i, (before, after)) in priors.iter().zip(&beliefs).enumerate() {
            if i == searched {
                prop_assert!(after < before);
            } else {
                prop_assert!(after > before);
            }
        }
    }
}

#[test]
fn revision_rejects_all_mass_searched_away() {
    let mut beliefs = vec![1.0, 0.0];
    let err = revise(&mut beliefs, &[1.0, 0.5]).unwrap_err();
    assert!(matches!(err, SearchError::DegenerateBelief { .. }));
    assert_eq!(beliefs, vec![1.0, 0.0]);
}

#[test]
fn reference_regions_partition_the_map() {
    for (i, a) in CAPE_PYTHON_CORNERS.iter().enumerate() {
        assert_eq!((a.width(), a.height()), (50, 50));
        for b in &CAPE_PYTHON_CORNERS[i + 1..] {
            assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
        }
    }

    let mut cfg = SearchConfig::cape_python();
    cfg.map = Some(MapExtent::new(320, 320));
    cfg.validate().unwrap();

    // Shrinking the map below the regions' extent is rejected.
    cfg.map = Some(MapExtent::new(170, 320));
    assert!(cfg.validate().is_err());

    // Any overlap is rejected.
    let mut overlapping = SearchConfig::cape_python();
    overlapping.regions[0].corners = Corners::new(120, 265, 170, 315);
    assert!(matches!(
        overlapping.validate(),
        Err(SearchError::InvalidConfiguration { .. })
    ));
}

#[test]
fn region_two_searched_at_half_effectiveness() {
    let mut state = SearchState::from_priors(CAPE_PYTHON_PRIORS.to_vec()).unwrap();
    revise(state.beliefs_mut(), &[0.0, 0.5, 0.0]).unwrap();

    // 0.5 * (1 - 0.5) / (0.2 + 0.5 * 0.5 + 0.3)
    let p = state.beliefs();
    assert!((p[1] - 1.0 / 3.0).abs() < 1e-12);
    assert!((p[0] - 4.0 / 15.0).abs() < 1e-12);
    assert!((p[2] - 0.4).abs() < 1e-12);
    assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    assert_eq!(state.most_likely(), RegionId(3));
}

#[test]
fn initial_beliefs_match_priors() {
    let space = SearchSpace::new(SearchConfig::cape_python()).unwrap();
    let state = SearchState::initialize(&space);
    assert_eq!(state.beliefs(), &CAPE_PYTHON_PRIORS);
    assert!((state.beliefs().iter().sum::<f64>() - 1.0).abs() < 1e-9);
}
