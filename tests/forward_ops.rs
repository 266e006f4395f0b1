//! Integration tests for the batched forward pass
//!
//! Tests verify correctness across:
//! - Sum and mean pooling, weighted and unweighted
//! - Empty and singleton bags
//! - Multi-table batches against independent per-table calls
//! - Order independence within a bag

use embag::prelude::*;

// ============================================================================
// Helpers
// ============================================================================

/// One table: 3 rows, width 4, rows [[1,1,1,1],[2,2,2,2],[3,3,3,3]].
fn small_table() -> (Vec<f32>, BatchLayout) {
    let arena = vec![
        1.0, 1.0, 1.0, 1.0, //
        2.0, 2.0, 2.0, 2.0, //
        3.0, 3.0, 3.0, 3.0,
    ];
    let layout = BatchLayout::new(
        vec![TableLayout {
            rows: 3,
            dim: 4,
            arena_offset: 0,
        }],
        2,
        arena.len(),
    )
    .unwrap();
    (arena, layout)
}

fn run(
    arena: &[f32],
    layout: &BatchLayout,
    indices: &[i64],
    offsets: &[i64],
    weights: Option<&[f32]>,
    mode: PoolingMode,
) -> Vec<f32> {
    let mut out = vec![f32::NAN; layout.output_len()];
    let request = ForwardRequest {
        arena: EmbeddingArena::from_slice(arena),
        indices,
        offsets,
        weights,
        mode,
    };
    forward(&request, layout, &mut out).unwrap();
    out
}

fn assert_close(got: &[f32], want: &[f32], tol: f32) {
    assert_eq!(got.len(), want.len());
    for (i, (g, w)) in got.iter().zip(want).enumerate() {
        assert!(
            (g - w).abs() <= tol,
            "element {}: got {}, want {}",
            i,
            g,
            w
        );
    }
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn test_sum_unweighted_scenario() {
    let (arena, layout) = small_table();
    let out = run(&arena, &layout, &[0, 1, 2], &[0, 2, 3], None, PoolingMode::Sum);
    assert_eq!(out, vec![3.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0]);
}

#[test]
fn test_mean_unweighted_scenario() {
    let (arena, layout) = small_table();
    let out = run(
        &arena,
        &layout,
        &[0, 1, 2],
        &[0, 2, 3],
        None,
        PoolingMode::Mean,
    );
    assert_eq!(out, vec![1.5, 1.5, 1.5, 1.5, 3.0, 3.0, 3.0, 3.0]);
}

#[test]
fn test_sum_weighted_scenario() {
    let (arena, layout) = small_table();
    let weights = [2.0f32, 1.0, 1.0];
    let out = run(
        &arena,
        &layout,
        &[0, 1, 2],
        &[0, 2, 3],
        Some(&weights),
        PoolingMode::Sum,
    );
    // bag0 = 2*row0 + 1*row1, bag1 = 1*row2
    assert_eq!(out, vec![4.0, 4.0, 4.0, 4.0, 3.0, 3.0, 3.0, 3.0]);
}

#[test]
fn test_mean_weighted_scenario() {
    let (arena, layout) = small_table();
    let weights = [2.0f32, 1.0, 1.0];
    let out = run(
        &arena,
        &layout,
        &[0, 1, 2],
        &[0, 2, 3],
        Some(&weights),
        PoolingMode::Mean,
    );
    let third = 4.0 / 3.0;
    assert_close(
        &out,
        &[third, third, third, third, 3.0, 3.0, 3.0, 3.0],
        1e-6,
    );
}

// ============================================================================
// Empty and singleton bags
// ============================================================================

#[test]
fn test_empty_bags_zero_all_variants() {
    let (arena, layout) = small_table();
    // Both bags empty
    let offsets = [0i64, 0, 0];
    let weights: [f32; 0] = [];

    for mode in [PoolingMode::Sum, PoolingMode::Mean] {
        let out = run(&arena, &layout, &[], &offsets, None, mode);
        assert_eq!(out, vec![0.0; 8], "unweighted {:?}", mode);

        let out = run(&arena, &layout, &[], &offsets, Some(&weights), mode);
        assert_eq!(out, vec![0.0; 8], "weighted {:?}", mode);
    }
}

#[test]
fn test_singleton_bag_identity() {
    let (arena, layout) = small_table();
    // bag0 = {row 1}, bag1 = {row 0}
    let indices = [1i64, 0];
    let offsets = [0i64, 1, 2];

    let out = run(&arena, &layout, &indices, &offsets, None, PoolingMode::Sum);
    assert_eq!(out, vec![2.0, 2.0, 2.0, 2.0, 1.0, 1.0, 1.0, 1.0]);

    // Weighted singleton scales the stored row
    let weights = [0.5f32, 4.0];
    let out = run(
        &arena,
        &layout,
        &indices,
        &offsets,
        Some(&weights),
        PoolingMode::Sum,
    );
    assert_eq!(out, vec![1.0, 1.0, 1.0, 1.0, 4.0, 4.0, 4.0, 4.0]);
}

// ============================================================================
// Mean vs sum consistency
// ============================================================================

/// One table with deterministic pseudo-random rows.
fn filled_table(rows: usize, dim: usize, batch: usize) -> (Vec<f32>, BatchLayout) {
    let arena: Vec<f32> = (0..rows * dim)
        .map(|i| ((i * 37 + 11) % 100) as f32 / 10.0 - 5.0)
        .collect();
    let layout = BatchLayout::new(
        vec![TableLayout {
            rows,
            dim,
            arena_offset: 0,
        }],
        batch,
        arena.len(),
    )
    .unwrap();
    (arena, layout)
}

#[test]
fn test_mean_is_sum_divided_by_count() {
    for bag_len in [1usize, 2, 8] {
        let (arena, layout) = filled_table(16, 7, 1);
        let indices: Vec<i64> = (0..bag_len as i64).map(|i| (i * 3) % 16).collect();
        let offsets = [0i64, bag_len as i64];

        let sum = run(&arena, &layout, &indices, &offsets, None, PoolingMode::Sum);
        let mean = run(&arena, &layout, &indices, &offsets, None, PoolingMode::Mean);

        let want: Vec<f32> = sum.iter().map(|s| s / bag_len as f32).collect();
        assert_close(&mean, &want, 1e-5);
    }
}

#[test]
fn test_weighted_mean_is_sum_divided_by_weight_sum() {
    for bag_len in [1usize, 2, 8] {
        let (arena, layout) = filled_table(16, 7, 1);
        let indices: Vec<i64> = (0..bag_len as i64).map(|i| (i * 5) % 16).collect();
        let offsets = [0i64, bag_len as i64];
        let weights: Vec<f32> = (0..bag_len).map(|i| 0.5 + i as f32).collect();
        let weight_sum: f32 = weights.iter().sum();

        let sum = run(
            &arena,
            &layout,
            &indices,
            &offsets,
            Some(&weights),
            PoolingMode::Sum,
        );
        let mean = run(
            &arena,
            &layout,
            &indices,
            &offsets,
            Some(&weights),
            PoolingMode::Mean,
        );

        let want: Vec<f32> = sum.iter().map(|s| s / weight_sum).collect();
        assert_close(&mean, &want, 1e-5);
    }
}

// ============================================================================
// Order independence
// ============================================================================

#[test]
fn test_pooling_is_order_independent() {
    let (arena, layout) = filled_table(16, 5, 1);
    let indices = [3i64, 7, 1, 14, 9, 0];
    let permuted = [9i64, 0, 3, 14, 1, 7];
    let weights = [1.5f32, 0.25, 2.0, 0.75, 1.0, 3.0];
    let perm_weights = [1.0f32, 3.0, 1.5, 0.75, 2.0, 0.25];
    let offsets = [0i64, 6];

    for mode in [PoolingMode::Sum, PoolingMode::Mean] {
        let a = run(&arena, &layout, &indices, &offsets, None, mode);
        let b = run(&arena, &layout, &permuted, &offsets, None, mode);
        assert_close(&a, &b, 1e-5);

        let a = run(&arena, &layout, &indices, &offsets, Some(&weights), mode);
        let b = run(&arena, &layout, &permuted, &offsets, Some(&perm_weights), mode);
        assert_close(&a, &b, 1e-5);
    }
}

// ============================================================================
// Multi-table batches
// ============================================================================

#[test]
fn test_multi_table_matches_independent_calls() {
    // Table 0: 8 rows x 4; table 1: 6 rows x 10, packed after table 0.
    let t0 = TableLayout {
        rows: 8,
        dim: 4,
        arena_offset: 0,
    };
    let t1 = TableLayout {
        rows: 6,
        dim: 10,
        arena_offset: 32,
    };
    let arena: Vec<f32> = (0..32 + 60)
        .map(|i| ((i * 13 + 5) % 50) as f32 / 5.0)
        .collect();
    let batch = 3;

    let layout = BatchLayout::new(vec![t0, t1], batch, arena.len()).unwrap();

    // Table 0 bags: {0,1}, {2}, {}; table 1 bags: {5}, {0,1,2}, {3,4}
    let indices = [0i64, 1, 2, 5, 0, 1, 2, 3, 4];
    let offsets = [0i64, 2, 3, 3, 4, 7, 9];
    let weights: Vec<f32> = (0..indices.len()).map(|i| 0.1 + i as f32 * 0.3).collect();

    for (mode, use_weights) in [
        (PoolingMode::Sum, false),
        (PoolingMode::Mean, false),
        (PoolingMode::Sum, true),
        (PoolingMode::Mean, true),
    ] {
        let batched = run(
            &arena,
            &layout,
            &indices,
            &offsets,
            use_weights.then_some(weights.as_slice()),
            mode,
        );

        // Same slices, one table per call.
        let layout0 = BatchLayout::new(vec![t0], batch, arena.len()).unwrap();
        let solo0 = run(
            &arena,
            &layout0,
            &indices[..3],
            &[0, 2, 3, 3],
            use_weights.then_some(&weights[..3]),
            mode,
        );

        let layout1 = BatchLayout::new(vec![t1], batch, arena.len()).unwrap();
        let idx1: Vec<i64> = indices[3..].to_vec();
        let w1: Vec<f32> = weights[3..].to_vec();
        let solo1 = run(
            &arena,
            &layout1,
            &idx1,
            &[0, 1, 4, 6],
            use_weights.then_some(w1.as_slice()),
            mode,
        );

        for bag in 0..batch {
            let row = &batched[bag * 14..(bag + 1) * 14];
            assert_close(&row[..4], &solo0[bag * 4..(bag + 1) * 4], 1e-6);
            assert_close(&row[4..], &solo1[bag * 10..(bag + 1) * 10], 1e-6);
        }
    }
}

// ============================================================================
// Larger batch (exercises the parallel launch path)
// ============================================================================

#[test]
fn test_large_batch_sum_reference() {
    let rows = 64;
    let dim = 9;
    let batch = 33;
    let (arena, layout) = filled_table(rows, dim, batch);

    // Bag b holds indices {b % rows, (b*7+1) % rows}.
    let mut indices = Vec::new();
    let mut offsets = vec![0i64];
    for b in 0..batch {
        indices.push((b % rows) as i64);
        indices.push(((b * 7 + 1) % rows) as i64);
        offsets.push(indices.len() as i64);
    }

    let out = run(&arena, &layout, &indices, &offsets, None, PoolingMode::Sum);

    for b in 0..batch {
        let i0 = (b % rows) * dim;
        let i1 = ((b * 7 + 1) % rows) * dim;
        for d in 0..dim {
            let want = arena[i0 + d] + arena[i1 + d];
            assert!((out[b * dim + d] - want).abs() < 1e-5);
        }
    }
}

// ============================================================================
// Offset/index validators
// ============================================================================

#[test]
fn test_validators_accept_and_reject() {
    let offsets = [0i64, 2, 3, 3, 5];
    let indices = [0i64, 2, 1, 0, 1];
    assert!(embag::bags::validate_offsets(&offsets, 2, 2, 5).is_ok());
    assert!(embag::bags::validate_indices(&indices, &offsets, &[3, 2], 2).is_ok());

    let bad_offsets = [0i64, 3, 2, 3, 5];
    assert!(embag::bags::validate_offsets(&bad_offsets, 2, 2, 5).is_err());

    let bad_indices = [0i64, 2, 1, 0, 9];
    assert!(embag::bags::validate_indices(&bad_indices, &offsets, &[3, 2], 2).is_err());
}
