use crate::analyzer::*;
use crate::dict::{ConnectionCosts, WordParam};
use crate::testutil::test_dictionaries;

fn analyze(text: &str, options: LatticeOptions) -> (Lattice, Vec<usize>) {
    let dict = test_dictionaries();
    let mut lattice = build_lattice(&dict, text, options);
    let path = search(&mut lattice, &ConnectionCostFunction::new(dict.connection()));
    (lattice, path)
}

fn surfaces<'a>(lattice: &'a Lattice, path: &[usize]) -> Vec<&'a str> {
    path.iter()
        .map(|&i| lattice.node(i).surface_form.as_str())
        .collect()
}

fn unknown_nodes(lattice: &Lattice) -> Vec<(usize, &str)> {
    lattice
        .nodes()
        .iter()
        .filter(|n| n.node_type == NodeType::Unknown)
        .map(|n| (n.start_pos, n.surface_form.as_str()))
        .collect()
}

fn node(start_pos: usize, surface: &str, cost: i16, left_id: i16, right_id: i16) -> LatticeNode {
    LatticeNode::new(
        NodeType::Known,
        0,
        WordParam {
            left_id,
            right_id,
            cost,
        },
        start_pos,
        surface,
    )
}

#[test]
fn test_sumomo_lattice_shape() {
    let (lattice, _) = analyze("すもももももももものうち", LatticeOptions::default());

    let bos = lattice.node(BOS_INDEX);
    assert_eq!(bos.node_type, NodeType::Bos);
    assert_eq!(bos.shortest_cost, 0);
    assert_eq!(lattice.nodes_end_at(0), &[BOS_INDEX]);

    let eos = lattice.node(lattice.eos().unwrap());
    assert_eq!(eos.node_type, NodeType::Eos);
    assert_eq!(eos.start_pos, 13);
    assert_eq!(lattice.eos_pos(), 13);

    let known = lattice
        .nodes()
        .iter()
        .filter(|n| n.node_type == NodeType::Known)
        .count();
    assert_eq!(known, 25);
    // Only ち lacks a dictionary word.
    assert_eq!(unknown_nodes(&lattice), vec![(12, "ち")]);
}

#[test]
fn test_sumomo_best_path() {
    let (lattice, path) = analyze("すもももももももものうち", LatticeOptions::default());
    assert_eq!(
        surfaces(&lattice, &path),
        vec!["すもも", "も", "もも", "も", "もも", "の", "うち"]
    );
    let starts: Vec<usize> = path.iter().map(|&i| lattice.node(i).start_pos).collect();
    assert_eq!(starts, vec![1, 4, 5, 7, 8, 10, 11]);

    let eos = lattice.node(lattice.eos().unwrap());
    assert_eq!(eos.shortest_cost, 38000);
    assert_eq!(eos.prev, path.last().copied());
}

#[test]
fn test_cheaper_homograph_wins() {
    let (lattice, path) = analyze("もも", LatticeOptions::default());
    assert_eq!(path.len(), 1);
    assert_eq!(lattice.node(path[0]).cost, 7000);
}

#[test]
fn test_empty_input() {
    let (lattice, path) = analyze("", LatticeOptions::default());
    assert!(path.is_empty());
    assert_eq!(lattice.nodes().len(), 2);
    let eos = lattice.node(lattice.eos().unwrap());
    assert_eq!(eos.start_pos, 1);
    assert_eq!(eos.prev, Some(BOS_INDEX));
    assert_eq!(eos.shortest_cost, 0);
}

#[test]
fn test_always_invoke_adds_unknown() {
    let (lattice, path) = analyze("、", LatticeOptions::default());
    assert_eq!(unknown_nodes(&lattice), vec![(1, "、")]);
    assert_eq!(path.len(), 1);
    assert_eq!(lattice.node(path[0]).node_type, NodeType::Known);
}

#[test]
fn test_grouping() {
    let (lattice, path) = analyze("ABC123", LatticeOptions::default());
    assert_eq!(
        unknown_nodes(&lattice),
        vec![(1, "ABC"), (2, "BC"), (3, "C"), (4, "123"), (5, "23"), (6, "3")]
    );
    assert_eq!(surfaces(&lattice, &path), vec!["ABC", "123"]);
}

#[test]
fn test_grouping_cap() {
    // No position has a known word, so every position gets a candidate.
    let (lattice, _) = analyze("ぬぬぬ", LatticeOptions::default());
    assert_eq!(
        unknown_nodes(&lattice),
        vec![(1, "ぬぬぬ"), (2, "ぬぬ"), (3, "ぬ")]
    );

    let capped = LatticeOptions {
        cap_group_at_max_length: true,
    };
    let (lattice, path) = analyze("ぬぬぬ", capped);
    assert_eq!(
        unknown_nodes(&lattice),
        vec![(1, "ぬぬ"), (2, "ぬぬ"), (3, "ぬ")]
    );
    assert_eq!(surfaces(&lattice, &path), vec!["ぬぬ", "ぬ"]);

    // max_length 0 means no cap
    let (lattice, _) = analyze("ABCD", capped);
    assert_eq!(unknown_nodes(&lattice)[0], (1, "ABCD"));
}

#[test]
fn test_non_grouping_class() {
    let (lattice, path) = analyze("漢字", LatticeOptions::default());
    assert_eq!(unknown_nodes(&lattice), vec![(1, "漢"), (2, "字")]);
    assert_eq!(surfaces(&lattice, &path), vec!["漢", "字"]);
}

#[test]
fn test_supplementary_plane() {
    let (lattice, path) = analyze("𠮷野屋", LatticeOptions::default());
    assert_eq!(unknown_nodes(&lattice), vec![(1, "𠮷")]);
    assert_eq!(surfaces(&lattice, &path), vec!["𠮷", "野", "屋"]);
    let starts: Vec<usize> = path.iter().map(|&i| lattice.node(i).start_pos).collect();
    assert_eq!(starts, vec![1, 2, 3]);
    assert_eq!(lattice.node(path[0]).length, 1);
}

#[test]
fn test_first_predecessor_wins_ties() {
    let conn = ConnectionCosts::new(2, 2, vec![0; 4]);
    let mut lattice = Lattice::new();
    let a = lattice.append(node(1, "a", 10, 1, 1));
    let _b = lattice.append(node(1, "b", 10, 1, 1));
    let c = lattice.append(node(2, "c", 10, 1, 1));
    let path = search(&mut lattice, &ConnectionCostFunction::new(&conn));
    assert_eq!(path, vec![a, c]);
}

#[test]
fn test_unreachable_eos() {
    let conn = ConnectionCosts::new(1, 1, vec![0]);
    let mut lattice = Lattice::new();
    lattice.append(node(1, "a", 10, 0, 0));
    let gap = lattice.append(node(3, "c", 10, 0, 0));
    let path = search(&mut lattice, &ConnectionCostFunction::new(&conn));
    assert!(path.is_empty());
    assert!(!lattice.node(gap).is_reachable());
    assert!(!lattice.node(lattice.eos().unwrap()).is_reachable());
    assert_eq!(lattice.node(lattice.eos().unwrap()).shortest_cost, UNREACHABLE);
}

#[test]
fn test_connection_cost_applied() {
    // 2→2 costs 5000: two particles in a row lose to the alternative.
    let conn = ConnectionCosts::from_text("3 3\n2 2 5000\n").unwrap();
    let mut lattice = Lattice::new();
    let x = lattice.append(node(1, "x", 100, 2, 2));
    lattice.append(node(2, "y", 100, 2, 2));
    let long = lattice.append(node(1, "xy", 1000, 1, 1));
    let path = search(&mut lattice, &ConnectionCostFunction::new(&conn));
    assert_eq!(path, vec![long]);
    assert_eq!(lattice.node(x).shortest_cost, 100);
}
