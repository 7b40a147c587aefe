//! End-to-end cavity filling scenarios.

use std::collections::HashMap;

use rayon::prelude::*;

use quadpatch::algo::matcher::match_with_rotations;
use quadpatch::prelude::*;

fn edge_use(soup: &QuadSoup) -> HashMap<(usize, usize), usize> {
    let mut uses = HashMap::new();
    for q in &soup.quads {
        for k in 0..4 {
            let (a, b) = (q[k], q[(k + 1) % 4]);
            *uses.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }
    uses
}

#[test]
fn regular_cavity_gets_two_by_two_grid() {
    let catalog = PatternCatalog::global();
    let found = find_best_pattern(catalog, &[3, 3, 3, 3], &MatchOptions::default()).unwrap();
    assert_eq!(found.pattern, 0);
    assert_eq!(found.quantization, vec![2, 2]);

    let (mut soup, cavity) = circular_cavity(&[3, 3, 3, 3], 2.0).unwrap();
    let patch = remesh_cavity(catalog, &cavity, &found, &RemeshOptions::default()).unwrap();
    assert_eq!(patch.num_quads(), 4);
    assert_eq!(patch.num_new_vertices(), 1);
    patch.commit(&mut soup);

    // The center vertex is shared by all four quads.
    assert!(soup.quads.iter().all(|q| q.contains(&8)));
    let uses = edge_use(&soup);
    assert_eq!(uses.values().filter(|&&n| n == 1).count(), 8);
    assert_eq!(uses.values().filter(|&&n| n == 2).count(), 4);
}

#[test]
fn mismatched_opposite_sides_have_no_regular_fit() {
    let catalog = PatternCatalog::global();
    let regular = catalog.get(0).unwrap();
    assert!(match_with_rotations(regular, &[2, 3, 3, 2], &MatchOptions::default()).is_none());

    let (soup, cavity) = circular_cavity(&[2, 3, 3, 2], 1.0).unwrap();
    let result = fill_cavity(&cavity, &RemeshOptions::default()).unwrap();
    assert!(result.is_none());
    // Nothing was created.
    assert_eq!(soup.num_quads(), 0);
}

#[test]
fn malformed_library_record_is_skipped() {
    let text = "4 0 1 0 1 2 3\n\
                6 7 2 0 1 2\n\
                6 8 2 0 1 2 3 0 3 4 5\n";
    let library = DiskLibrary::parse(text);
    assert_eq!(library.len(), 2);
    let six = library.with_boundary_size(6);
    assert_eq!(six.len(), 1);
    assert_eq!(six[0].id, 8);

    let (mut soup, ring) = circular_loop(6, 1.0);
    let allowed = vec![1..=3; 6];
    let patch = remesh_small_cavity(
        &library,
        &ring,
        &[2, 1, 1, 2, 1, 1],
        &allowed,
        &SmallCavityOptions::default(),
    )
    .unwrap()
    .unwrap();
    assert_eq!(patch.num_quads(), 2);
    assert_eq!(patch.num_new_vertices(), 0);
    patch.commit(&mut soup);
    assert_eq!(soup.quads, vec![[0, 1, 2, 3], [0, 3, 4, 5]]);
}

#[test]
fn every_fixed_pattern_fills_a_scaled_cavity() {
    let catalog = PatternCatalog::global();
    for entry in catalog.entries() {
        let sizes: Vec<usize> = entry
            .topology
            .side_edge_counts()
            .iter()
            .map(|n| 3 * n + 1)
            .collect();
        let (mut soup, cavity) = circular_cavity(&sizes, 1.0).unwrap();
        let patch = fill_cavity(&cavity, &RemeshOptions::default())
            .unwrap()
            .unwrap_or_else(|| panic!("no fit for pattern {} sides {:?}", entry.id, sizes));
        patch.commit(&mut soup);

        // Manifold disk: interior edges shared by two quads, boundary edges
        // by one, and the boundary is exactly the cavity loop.
        let uses = edge_use(&soup);
        assert!(uses.values().all(|&n| n == 1 || n == 2));
        let boundary = uses.values().filter(|&&n| n == 1).count();
        assert_eq!(boundary, cavity.boundary_loop().len(), "sides {:?}", sizes);

        assert!(soup
            .positions
            .iter()
            .all(|p| p.coords.iter().all(|c| c.is_finite())));
    }
}

#[test]
fn disjoint_cavities_fill_concurrently() {
    let requests: Vec<Vec<usize>> = (2..12)
        .map(|k| vec![k + 1, k + 2, k + 1, k + 2])
        .collect();
    let fill = |sides: &Vec<usize>| {
        let (mut soup, cavity) = circular_cavity(sides, 1.0).unwrap();
        let patch = fill_cavity(&cavity, &RemeshOptions::default())
            .unwrap()
            .unwrap();
        patch.commit(&mut soup);
        soup
    };
    let parallel: Vec<QuadSoup> = requests.par_iter().map(fill).collect();
    let sequential: Vec<QuadSoup> = requests.iter().map(fill).collect();
    for (a, b) in parallel.iter().zip(&sequential) {
        assert!(a.num_quads() > 0);
        assert_eq!(a.quads, b.quads);
        assert_eq!(a.positions, b.positions);
    }
}
