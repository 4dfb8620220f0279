use narwhal_graphlib::{Error, Graph};

fn assert_dense<N, E>(g: &Graph<N, E>) {
    for (pos, (ix, id, _)) in g.nodes().enumerate() {
        assert_eq!(ix, pos, "node {id} has index {ix} at position {pos}");
        assert_eq!(g.index_of(id), Some(pos));
    }
    for (pos, e) in g.edges().enumerate() {
        assert_eq!(e.index, pos);
        assert_eq!(g.edge_index_of(&e.key.v, &e.key.w), Some(pos));
        assert_eq!(g.node_id(e.source).unwrap(), e.key.v);
        assert_eq!(g.node_id(e.target).unwrap(), e.key.w);
    }
}

fn path_graph(ids: &[&str]) -> Graph<u32, f64> {
    let mut g: Graph<u32, f64> = Graph::new();
    for pair in ids.windows(2) {
        g.add_edge(pair[0], pair[1], 1.0, false);
    }
    g
}

#[test]
fn indices_stay_dense_across_mixed_mutations() {
    let mut g: Graph<u32, f64> = Graph::new();
    for (i, id) in ["a", "b", "c", "d", "e"].iter().enumerate() {
        assert!(g.add_node(*id, i as u32));
    }
    g.add_edge("a", "b", 1.0, false);
    g.add_edge("b", "c", 1.0, false);
    g.add_edge("c", "d", 1.0, false);
    g.add_edge("d", "e", 1.0, false);
    g.add_edge("e", "a", 1.0, false);
    assert_dense(&g);

    assert!(g.insert_node(1, "x", 99).unwrap());
    assert_dense(&g);
    assert_eq!(g.node_id(1).unwrap(), "x");
    assert_eq!(g.node_id(2).unwrap(), "b");

    assert!(g.remove_node("c", false));
    assert_dense(&g);
    assert_eq!(g.node_count(), 5);
    assert_eq!(g.edge_count(), 3);

    assert!(g.insert_edge(0, "x", "d", 2.0).unwrap());
    assert_dense(&g);
    assert_eq!(g.edge_at(0).unwrap().key.v, "x");

    assert!(g.remove_edge("e", "a", false));
    assert_dense(&g);

    g.remove_node_at(0, false).unwrap();
    assert_dense(&g);
    assert!(!g.has_node("a"));
}

#[test]
fn duplicate_nodes_are_rejected() {
    let mut g: Graph<u32, ()> = Graph::new();
    assert!(g.add_node("a", 1));
    let version = g.node_version();
    assert!(!g.add_node("a", 2));
    assert_eq!(g.node("a"), Some(&1));
    assert_eq!(g.node_version(), version);
    assert_eq!(g.insert_node(0, "a", 3), Ok(false));
}

#[test]
fn add_edge_creates_endpoints_and_honors_replace() {
    let mut g: Graph<u32, f64> = Graph::with_default_node_label(|| 7);
    assert!(g.add_edge("a", "b", 1.0, false));
    assert_eq!(g.node("a"), Some(&7));
    assert_eq!(g.node("b"), Some(&7));

    assert!(!g.add_edge("a", "b", 5.0, false));
    assert_eq!(g.edge("a", "b"), Some(&1.0));

    assert!(g.add_edge("a", "b", 5.0, true));
    assert_eq!(g.edge("a", "b"), Some(&5.0));
    assert_eq!(g.edge_count(), 1);

    // The reverse pair is a distinct edge.
    assert!(g.add_edge("b", "a", 2.0, false));
    assert_eq!(g.edge_count(), 2);
}

#[test]
fn degree_counts_track_edges() {
    let mut g: Graph<(), ()> = Graph::new();
    g.add_edge("a", "b", (), false);
    g.add_edge("a", "c", (), false);
    g.add_edge("c", "a", (), false);
    g.add_edge("a", "a", (), false);

    let a = g.node_info(g.index_of("a").unwrap()).unwrap();
    assert_eq!((a.out_edges, a.in_edges, a.self_loops), (2, 1, 1));

    g.remove_edge("a", "a", false);
    g.remove_node("c", false);
    let a = g.node_info(g.index_of("a").unwrap()).unwrap();
    assert_eq!((a.out_edges, a.in_edges, a.self_loops), (1, 0, 0));
}

#[test]
fn versions_increase_on_structural_changes_only() {
    let mut g: Graph<(), ()> = Graph::new();
    let (n0, e0) = (g.node_version(), g.edge_version());

    g.add_node("a", ());
    assert!(g.node_version() > n0);
    let n1 = g.node_version();

    g.add_edge("a", "b", (), false);
    assert!(g.node_version() > n1, "auto-created endpoint bumps nodes");
    assert!(g.edge_version() > e0);

    let (n2, e2) = (g.node_version(), g.edge_version());
    assert!(g.hide_node("a"));
    assert!(g.node_version() > n2);
    assert_eq!(g.edge_version(), e2);

    assert!(g.hide_edge("a", "b"));
    assert!(g.edge_version() > e2);

    let (n3, e3) = (g.node_version(), g.edge_version());
    assert!(g.unhide_node("a"));
    assert!(g.unhide_edge("a", "b"));
    assert!(g.node_version() > n3);
    assert!(g.edge_version() > e3);

    let (n4, e4) = (g.node_version(), g.edge_version());
    assert!(!g.add_edge("a", "b", (), false));
    assert!(!g.remove_node("missing", true));
    assert_eq!((g.node_version(), g.edge_version()), (n4, e4));

    g.remove_node("b", false);
    assert!(g.node_version() > n4);
    assert!(g.edge_version() > e4);
}

#[test]
fn hiding_twice_is_idempotent() {
    let mut g = path_graph(&["a", "b", "c"]);
    assert!(g.hide_node("b"));
    let (nv, ev) = (g.node_version(), g.edge_version());
    let (nc, ec) = (g.node_count(), g.edge_count());

    assert!(!g.hide_node("b"));
    assert_eq!((g.node_version(), g.edge_version()), (nv, ev));
    assert_eq!((g.node_count(), g.edge_count()), (nc, ec));
    assert_eq!(g.visible_node_count(), 2);
    assert_eq!(g.visible_edge_count(), 0);

    assert!(g.unhide_node("b"));
    assert!(!g.unhide_node("b"));
    assert_eq!(g.visible_edge_count(), 2);
}

#[test]
fn hidden_entries_are_skipped_by_traversal() {
    let mut g = path_graph(&["a", "b", "c"]);
    g.add_edge("a", "c", 1.0, false);
    let a = g.index_of("a").unwrap();
    let b = g.index_of("b").unwrap();
    let c = g.index_of("c").unwrap();

    assert_eq!(g.successors(a), vec![b, c]);
    g.hide_edge("a", "c");
    assert_eq!(g.successors(a), vec![b]);

    g.hide_node("b");
    assert_eq!(g.successors(a), Vec::<usize>::new());
    assert_eq!(g.predecessors(c), Vec::<usize>::new());
    assert_eq!(g.successors(b), Vec::<usize>::new());
    // Hidden nodes keep their index.
    assert_eq!(g.index_of("b"), Some(b));
    assert_eq!(g.node_id(b).unwrap(), "b");
}

#[test]
fn remove_node_with_orphans_removes_exactly_the_new_orphans() {
    // hub -> {x, y}; y -> z; w is isolated from the start.
    let mut g: Graph<(), ()> = Graph::new();
    g.add_edge("hub", "x", (), false);
    g.add_edge("hub", "y", (), false);
    g.add_edge("y", "z", (), false);
    g.add_node("w", ());

    assert!(g.remove_node("hub", true));
    let mut ids = g.node_ids();
    ids.sort();
    // `x` lost its only edge; `y` still has `y -> z`; `w` was already isolated.
    assert_eq!(ids, vec!["w", "y", "z"]);
    assert_eq!(g.edge_count(), 1);
}

#[test]
fn remove_edge_with_orphans_drops_isolated_endpoints() {
    let mut g = path_graph(&["a", "b", "c"]);
    assert!(g.remove_edge("a", "b", true));
    assert!(!g.has_node("a"));
    assert!(g.has_node("b"));
    assert!(g.has_node("c"));

    assert!(g.remove_edge("b", "c", true));
    assert!(g.is_empty());
}

#[test]
fn orphan_node_keeps_the_node() {
    let mut g = path_graph(&["a", "b", "c"]);
    let version = g.edge_version();
    assert!(g.orphan_node("b"));
    assert!(g.has_node("b"));
    assert_eq!(g.edge_count(), 0);
    assert!(g.edge_version() > version);
    assert!(!g.orphan_node("missing"));
}

#[test]
fn replace_node_rewrites_incident_edges() {
    let mut g = path_graph(&["a", "b", "c"]);
    let b = g.index_of("b").unwrap();
    assert_eq!(g.replace_node("b", "beta", 42), Ok(true));
    assert_eq!(g.index_of("beta"), Some(b));
    assert_eq!(g.node("beta"), Some(&42));
    assert!(!g.has_node("b"));
    assert!(g.has_edge("a", "beta"));
    assert!(g.has_edge("beta", "c"));
    assert!(!g.has_edge("a", "b"));
    assert_dense(&g);

    assert_eq!(
        g.replace_node("beta", "a", 0),
        Err(Error::DuplicateNode { id: "a".to_string() })
    );
    assert_eq!(g.replace_node("missing", "m", 0), Ok(false));
}

#[test]
fn out_of_range_access_is_an_error() {
    let mut g = path_graph(&["a", "b"]);
    assert_eq!(
        g.node_at(5).err(),
        Some(Error::NodeIndexOutOfRange { index: 5, len: 2 })
    );
    assert_eq!(
        g.edge_at(1).err(),
        Some(Error::EdgeIndexOutOfRange { index: 1, len: 1 })
    );
    assert!(g.insert_node(3, "z", 0).is_err());
    assert!(g.insert_edge(2, "a", "z", 0.0).is_err());
    assert!(g.remove_node_at(2, false).is_err());
    assert!(g.color(9).is_err());
}

#[test]
fn snapshots_are_independent_copies() {
    let mut g = path_graph(&["a", "b", "c"]);
    let ids = g.node_ids();
    let keys = g.edge_keys();
    let version = g.node_version();

    g.remove_node("a", false);
    assert_eq!(ids.len(), 3);
    assert_eq!(keys.len(), 2);
    assert_ne!(g.node_version(), version, "stale snapshots are detectable");
}

#[test]
fn clear_empties_and_bumps_versions() {
    let mut g = path_graph(&["a", "b"]);
    let (nv, ev) = (g.node_version(), g.edge_version());
    g.clear();
    assert!(g.is_empty());
    assert_eq!(g.edge_count(), 0);
    assert!(g.node_version() > nv);
    assert!(g.edge_version() > ev);
    assert!(g.successors(0).is_empty());
}
