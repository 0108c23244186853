//! Batch-level properties of the analytics bundle
//!
//! Concrete scenarios on a hand-written menu, then invariants checked over
//! seeded random call logs.

mod common;

use callpath::analysis::reducers::{entropy_bits, NO_WEEKDAY_KEY};
use callpath::{AnalyticsBundle, AnalyticsConfig, Pipeline, SourceFile, ViewLimits};
use common::{menu_file, source_file, LogGenerator};
use std::collections::HashSet;

const SEEDS: &[u64] = &[1, 7, 42, 1234, 99_999];

fn run(files: &[SourceFile]) -> AnalyticsBundle {
    Pipeline::default().run(files).unwrap()
}

/// Limits high enough that no ranked view is truncated
fn untruncated() -> AnalyticsConfig {
    let big = usize::MAX;
    AnalyticsConfig {
        limits: ViewLimits {
            top_intents: big,
            leaf_frequency: big,
            branch_children: big,
            entropy: big,
            top_paths: big,
            dead_ends: big,
            url_engagement: big,
            anomalies: big,
        },
        ..AnalyticsConfig::default()
    }
}

fn random_bundle(seed: u64) -> AnalyticsBundle {
    let file = LogGenerator::default().generate("random.csv", seed);
    Pipeline::new(untruncated()).run(&[file]).unwrap()
}

#[test]
fn test_menu_bundle() {
    let bundle = run(&[menu_file("menu.csv")]);

    assert_eq!(bundle.total_nodes, 5);
    assert_eq!(bundle.total_calls, 3);
    assert_eq!(bundle.files_processed, 1);

    let paths: Vec<Vec<u64>> = bundle.call_paths.values().map(|p| p.rule_ids()).collect();
    assert_eq!(paths, vec![vec![1, 2, 4], vec![1, 3], vec![1, 2]]);

    // "Legacy" collates before "Main menu"
    let roots: Vec<u64> = bundle.button_tree.iter().map(|n| n.rule_id).collect();
    assert_eq!(roots, vec![9, 1]);
    assert_eq!(bundle.tree_size(), 5);

    let views = &bundle.views;
    let intents: Vec<(u64, usize)> = views
        .top_intents_top10
        .iter()
        .map(|r| (r.rule_id, r.count))
        .collect();
    assert_eq!(intents, vec![(2, 2), (3, 1)]);
    assert_eq!(views.url_engagement_top20[0].url, "https://pay.example");
    assert_eq!(views.unreachable_nodes.len(), 1);
    assert_eq!(views.unreachable_nodes[0].rule_id, 9);
    assert!(views.anomalies_top20.is_empty());
}

#[test]
fn test_adjacent_duplicate_rows_collapse() {
    let bundle = run(&[source_file(
        "calls.csv",
        &["1,,10,0,A,", "1,,20,10,B,", "1,,20,10,B,"],
    )]);
    assert_eq!(bundle.call_paths["call::calls.csv::1"].rule_ids(), vec![10, 20]);
}

#[test]
fn test_first_file_wins_for_node_text() {
    let bundle = run(&[
        source_file("a.csv", &["1,,5,0,First,"]),
        source_file("b.csv", &["1,,5,0,Second,https://b"]),
    ]);
    assert_eq!(bundle.button_tree[0].text, "First");
    assert_eq!(bundle.button_tree[0].url, None);
    // Same raw call id in two files stays two calls
    assert_eq!(bundle.total_calls, 2);
}

#[test]
fn test_weekday_buckets() {
    let bundle = run(&[menu_file("menu.csv")]);
    let trends = &bundle.views.weekday_trends;

    // 2024-01-07 is a Sunday, 2024-01-08 a Monday
    assert_eq!(trends["7"], 1);
    assert_eq!(trends["1"], 1);
    assert_eq!(trends[NO_WEEKDAY_KEY], 1);
    assert_eq!(bundle.call_paths["call::menu.csv::102"].weekday, None);
}

#[test]
fn test_same_file_twice_doubles_counts() {
    let once = run(&[menu_file("menu.csv")]);
    let twice = run(&[menu_file("menu.csv"), menu_file("menu.csv")]);

    assert_eq!(twice.button_tree, once.button_tree);
    assert_eq!(twice.total_nodes, once.total_nodes);
    assert_eq!(twice.total_calls, 2 * once.total_calls);
    assert_eq!(twice.file_names, vec!["menu.csv", "menu.csv#2"]);
    assert_eq!(
        twice.views.lengths_summary.count,
        2 * once.views.lengths_summary.count
    );
    for (a, b) in once.views.top_paths_top20.iter().zip(&twice.views.top_paths_top20) {
        assert_eq!(a.path, b.path);
        assert_eq!(b.count, 2 * a.count);
    }
    for (id, entry) in &once.views.node_funnel {
        assert_eq!(twice.views.node_funnel[id].reach, 2 * entry.reach);
    }
}

#[test]
fn test_lengths_count_matches_non_empty_paths() {
    for &seed in SEEDS {
        let bundle = random_bundle(seed);
        let non_empty = bundle.call_paths.values().filter(|p| !p.is_empty()).count();
        assert_eq!(bundle.views.lengths_summary.count, non_empty, "seed {}", seed);
    }
}

#[test]
fn test_paths_have_no_adjacent_repeats() {
    for &seed in SEEDS {
        let bundle = random_bundle(seed);
        for path in bundle.call_paths.values() {
            let ids = path.rule_ids();
            assert!(ids.windows(2).all(|w| w[0] != w[1]), "seed {}: {:?}", seed, ids);
        }
    }
}

#[test]
fn test_funnel_balances() {
    for &seed in SEEDS {
        let bundle = random_bundle(seed);
        let views = &bundle.views;

        for (id, entry) in &views.node_funnel {
            assert!(entry.reach >= entry.transitions, "seed {} node {}", seed, id);
            assert_eq!(entry.drop_off, entry.reach - entry.transitions);
        }
        for (id, branches) in &views.branch_distribution {
            let total: usize = branches.iter().map(|b| b.count).sum();
            assert_eq!(total, views.node_funnel[id].transitions, "seed {} node {}", seed, id);
        }
    }
}

#[test]
fn test_entropy_and_coverage_bounds() {
    for &seed in SEEDS {
        let bundle = random_bundle(seed);
        let views = &bundle.views;

        for row in &views.entropy_complexity_top20 {
            assert!(row.entropy_bits >= 0.0);
            assert_eq!(row.entropy_bits == 0.0, row.branching_factor == 1);
            assert!((row.perplexity - row.entropy_bits.exp2()).abs() < 1e-9);

            let counts: Vec<usize> = views.branch_distribution[&row.rule_id]
                .iter()
                .map(|b| b.count)
                .collect();
            assert!((entropy_bits(&counts) - row.entropy_bits).abs() < 1e-9);
        }
        for row in &views.coverage_ratio {
            assert!(row.top1_coverage <= row.top2_coverage);
            assert!(row.top2_coverage <= 1.0 + 1e-12);
        }
        let sorted = views
            .entropy_complexity_top20
            .windows(2)
            .all(|w| w[0].entropy_bits >= w[1].entropy_bits);
        assert!(sorted, "seed {}", seed);
    }
}

#[test]
fn test_unreachable_nodes_have_no_reach() {
    for &seed in SEEDS {
        let bundle = random_bundle(seed);
        let views = &bundle.views;
        let visited: HashSet<u64> = bundle
            .call_paths
            .values()
            .flat_map(|p| p.rule_ids())
            .collect();

        for node in &views.unreachable_nodes {
            assert!(!visited.contains(&node.rule_id));
            assert!(!views.node_funnel.contains_key(&node.rule_id));
        }
        assert_eq!(views.unreachable_nodes.len() + visited.len(), bundle.total_nodes);
    }
}

#[test]
fn test_anomalies_are_off_tree() {
    for &seed in SEEDS {
        let bundle = random_bundle(seed);
        let mut edges = HashSet::new();
        let mut stack: Vec<&callpath::TreeNode> = bundle.button_tree.iter().collect();
        while let Some(node) = stack.pop() {
            for child in node.children.iter().flatten() {
                edges.insert((node.rule_id, child.rule_id));
                stack.push(child);
            }
        }
        for anomaly in &bundle.views.anomalies_top20 {
            assert!(!edges.contains(&(anomaly.from, anomaly.to)), "seed {}", seed);
        }
    }
}

#[test]
fn test_depth_funnel_is_monotonic() {
    for &seed in SEEDS {
        let bundle = random_bundle(seed);
        let funnel = &bundle.views.depth_funnel;
        assert_eq!(funnel.first().map(|d| d.count), Some(bundle.views.lengths_summary.count));
        assert!(funnel.windows(2).all(|w| w[0].count >= w[1].count));
        assert_eq!(funnel.len(), bundle.views.lengths_summary.max);
    }
}

#[test]
fn test_same_input_same_views() {
    let file = LogGenerator::default().generate("random.csv", 5);
    let a = Pipeline::default().run(std::slice::from_ref(&file)).unwrap();
    let b = Pipeline::default().run(&[file]).unwrap();
    assert_eq!(a.views, b.views);
    assert_eq!(a.button_tree, b.button_tree);
}
