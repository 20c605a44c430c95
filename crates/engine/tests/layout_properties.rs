// Property-based tests for the test-item layout.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;
use testbook_engine::layout::{apply, apply_category_merges, plan, MergeKind};
use testbook_engine::{ColumnLayout, Field, LayoutOptions, MergedRegion, Sheet, TestItem};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Few distinct majors so runs and repeats are common.
fn arb_major() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => Just("Login".to_string()),
        2 => Just("Export".to_string()),
        1 => Just("Copy".to_string()),
        1 => Just(String::new()),
    ]
}

fn arb_lines() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z ]{1,12}", 0..5)
}

fn arb_item() -> impl Strategy<Value = TestItem> {
    (arb_major(), arb_lines(), arb_lines(), "[a-z]{0,6}").prop_map(|(major, steps, expected, medium)| {
        TestItem::new(major)
            .with(Field::Medium, medium)
            .with_steps(steps)
            .with_expected(expected)
    })
}

fn arb_items() -> impl Strategy<Value = Vec<TestItem>> {
    prop::collection::vec(arb_item(), 0..24)
}

fn arb_start_row() -> impl Strategy<Value = usize> {
    prop_oneof![3 => Just(4usize), 1 => 0usize..40]
}

fn options_at(start_row: usize) -> LayoutOptions {
    LayoutOptions {
        start_row,
        ..LayoutOptions::default()
    }
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn row_count_is_longest_sequence_or_one(items in arb_items(), start in arb_start_row()) {
        let plan = plan(&items, &options_at(start));
        prop_assert_eq!(plan.placements.len(), items.len());
        for (item, placement) in items.iter().zip(&plan.placements) {
            let expected = item.steps.len().max(item.expected.len()).max(1);
            prop_assert_eq!(placement.row_count, expected);
        }
    }

    #[test]
    fn cursor_advances_by_total_rows(items in arb_items(), start in arb_start_row()) {
        let plan = plan(&items, &options_at(start));
        let total: usize = plan.placements.iter().map(|p| p.row_count).sum();
        prop_assert_eq!(plan.next_row, start + total);

        let mut cursor = start;
        for placement in &plan.placements {
            prop_assert_eq!(placement.start_row, cursor);
            cursor += placement.row_count;
        }
    }

    #[test]
    fn plan_is_deterministic(items in arb_items()) {
        let options = LayoutOptions::default();
        prop_assert_eq!(plan(&items, &options), plan(&items, &options));
    }
}

// ---------------------------------------------------------------------------
// Item and line merges
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn line_fields_only_get_single_row_merges(items in arb_items()) {
        let plan = plan(&items, &LayoutOptions::default());
        for merge in &plan.item_merges {
            if merge.field.is_line() {
                prop_assert_eq!(merge.kind, MergeKind::Line);
                prop_assert_eq!(merge.rows.len(), 1);
            }
        }
        for placement in &plan.placements {
            for field in [Field::Steps, Field::Expected] {
                let rows: Vec<usize> = plan
                    .item_merges
                    .iter()
                    .filter(|m| m.field == field && placement.rows().iter().any(|r| r == m.rows.start))
                    .map(|m| m.rows.start)
                    .collect();
                prop_assert_eq!(rows, placement.rows().iter().collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn scalar_fields_get_one_merge_over_the_item(items in arb_items()) {
        let plan = plan(&items, &LayoutOptions::default());
        for placement in &plan.placements {
            for field in Field::ALL.into_iter().filter(|f| !f.is_line()) {
                let spans: Vec<_> = plan
                    .item_merges
                    .iter()
                    .filter(|m| m.field == field && m.rows.start >= placement.start_row && m.rows.end <= placement.end_row())
                    .collect();
                prop_assert_eq!(spans.len(), 1);
                prop_assert_eq!(spans[0].rows, placement.rows());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Category bands
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn bands_never_cross_a_category_change(items in arb_items()) {
        let plan = plan(&items, &LayoutOptions::default());
        for band in &plan.category_merges {
            let covered: Vec<&TestItem> = items
                .iter()
                .zip(&plan.placements)
                .filter(|(_, p)| p.start_row >= band.rows.start && p.end_row() <= band.rows.end)
                .map(|(item, _)| item)
                .collect();
            prop_assert!(!covered.is_empty());
            prop_assert!(covered.iter().all(|i| i.major == covered[0].major));
            prop_assert!(band.rows.len() > 1);
        }
    }

    #[test]
    fn consecutive_equal_majors_share_one_band(items in arb_items()) {
        let plan = plan(&items, &LayoutOptions::default());
        for pair in items.iter().zip(&plan.placements).collect::<Vec<_>>().windows(2) {
            let (a, pa) = pair[0];
            let (b, pb) = pair[1];
            if a.major == b.major {
                let bands: Vec<_> = plan
                    .category_merges
                    .iter()
                    .filter(|m| m.rows.start <= pa.start_row && m.rows.end >= pb.end_row())
                    .collect();
                prop_assert_eq!(bands.len(), 1);
            }
        }
    }

    #[test]
    fn rendered_merges_never_overlap_and_match_plan(items in arb_items()) {
        let options = LayoutOptions::default();
        let plan = plan(&items, &options);
        let mut sheet = Sheet::default();
        let report = apply(&plan, &options, &mut sheet);

        prop_assert!(report.diagnostics.is_empty());
        let merges: Vec<MergedRegion> = sheet.sorted_merges();
        for (i, a) in merges.iter().enumerate() {
            for b in &merges[i + 1..] {
                prop_assert!(!a.overlaps(b), "{} overlaps {}", a, b);
            }
        }
        prop_assert_eq!(merges, plan.expected_regions(&ColumnLayout::default()));
    }

    #[test]
    fn category_pass_is_idempotent(items in arb_items()) {
        let options = LayoutOptions::default();
        let plan = plan(&items, &options);
        let mut sheet = Sheet::default();
        let mut report = apply(&plan, &options, &mut sheet);
        let before = sheet.sorted_merges();
        let diagnostics = report.diagnostics.len();

        apply_category_merges(&plan, &options, &mut sheet, &mut report);

        prop_assert_eq!(sheet.sorted_merges(), before);
        prop_assert_eq!(report.diagnostics.len(), diagnostics);
    }
}
