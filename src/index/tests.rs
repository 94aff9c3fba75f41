use super::*;

fn index_with(vectors: &[[f32; 3]]) -> VectorIndex {
    let mut index = VectorIndex::new(3);
    for vector in vectors {
        index.append(vector).expect("should append vector");
    }
    index
}

#[test]
fn append_assigns_sequential_ordinals() {
    let mut index = VectorIndex::new(3);
    assert!(index.is_empty());

    assert_eq!(index.append(&[0.0, 0.0, 0.0]), Ok(0));
    assert_eq!(index.append(&[1.0, 0.0, 0.0]), Ok(1));
    assert_eq!(index.append(&[0.0, 1.0, 0.0]), Ok(2));

    assert_eq!(index.len(), 3);
    assert_eq!(index.get(1), Some(&[1.0, 0.0, 0.0][..]));
    assert_eq!(index.get(3), None);
}

#[test]
fn append_rejects_wrong_dimension() {
    let mut index = VectorIndex::new(3);
    let result = index.append(&[1.0, 2.0]);

    assert_eq!(
        result,
        Err(IndexError::DimensionMismatch {
            expected: 3,
            actual: 2
        })
    );
    assert!(index.is_empty());
}

#[test]
fn search_rejects_wrong_query_dimension() {
    let index = index_with(&[[0.0, 0.0, 0.0]]);
    let result = index.search(&[0.0; 4], 1);

    assert!(matches!(
        result,
        Err(IndexError::DimensionMismatch {
            expected: 3,
            actual: 4
        })
    ));
}

#[test]
fn search_orders_by_squared_distance() {
    let index = index_with(&[[3.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);

    let neighbors = index.search(&[0.0, 0.0, 0.0], 3).expect("should search");
    let found: Vec<(usize, f32)> = neighbors
        .iter()
        .map(|n| (n.ordinal, n.distance))
        .collect();

    assert_eq!(found, vec![(1, 1.0), (2, 4.0), (0, 9.0)]);
}

#[test]
fn search_truncates_to_k() {
    let index = index_with(&[[3.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);

    let neighbors = index.search(&[0.0, 0.0, 0.0], 1).expect("should search");

    assert_eq!(
        neighbors,
        vec![Neighbor {
            ordinal: 1,
            distance: 1.0
        }]
    );
}

#[test]
fn search_returns_every_vector_when_k_exceeds_len() {
    let index = index_with(&[[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]);

    let neighbors = index.search(&[1.0, 1.0, 1.0], 5).expect("should search");
    let ordinals: Vec<usize> = neighbors.iter().map(|n| n.ordinal).collect();

    assert_eq!(ordinals, vec![0, 1]);
}

#[test]
fn search_with_huge_k_does_not_allocate_k_entries() {
    let index = index_with(&[[1.0, 0.0, 0.0]]);

    let neighbors = index
        .search(&[0.0, 0.0, 0.0], 1_000_000_000_000_000_000)
        .expect("should search");

    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0].ordinal, 0);

    let empty = VectorIndex::new(3);
    assert!(
        empty
            .search(&[0.0, 0.0, 0.0], usize::MAX)
            .expect("should search")
            .is_empty()
    );
}

#[test]
fn search_on_empty_index_is_empty() {
    let index = VectorIndex::new(3);

    let neighbors = index.search(&[0.0, 0.0, 0.0], 3).expect("should search");

    assert!(neighbors.is_empty());
}

#[test]
fn search_with_zero_k_is_empty() {
    let index = index_with(&[[1.0, 1.0, 1.0]]);

    let neighbors = index.search(&[1.0, 1.0, 1.0], 0).expect("should search");

    assert!(neighbors.is_empty());
}

#[test]
fn ties_resolve_to_lowest_ordinal() {
    let index = index_with(&[
        [0.0, 5.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ]);

    let neighbors = index.search(&[0.0, 0.0, 0.0], 2).expect("should search");
    let ordinals: Vec<usize> = neighbors.iter().map(|n| n.ordinal).collect();

    assert_eq!(ordinals, vec![1, 2]);
}

#[test]
fn exact_match_has_zero_distance() {
    let index = index_with(&[[0.25, -0.5, 0.75], [0.1, 0.2, 0.3]]);

    let neighbors = index.search(&[0.25, -0.5, 0.75], 2).expect("should search");
    let first = neighbors[0];

    assert_eq!(first.ordinal, 0);
    assert_eq!(first.distance, 0.0);
}

#[test]
fn squared_l2_does_not_take_root() {
    assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
}
