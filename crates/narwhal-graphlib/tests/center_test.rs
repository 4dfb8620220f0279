use narwhal_graphlib::Graph;
use narwhal_graphlib::alg::{TreeView, find_center, find_path_center, find_weighted_center};

fn graph(edges: &[(&str, &str)]) -> Graph<(), ()> {
    let mut g: Graph<(), ()> = Graph::new();
    for (v, w) in edges {
        g.add_edge(*v, *w, (), false);
    }
    g
}

fn id_of(g: &Graph<(), ()>, ix: Option<usize>) -> Option<String> {
    ix.and_then(|ix| g.node_id(ix).ok().map(str::to_string))
}

#[test]
fn empty_graph_has_no_center() {
    let g: Graph<(), ()> = Graph::new();
    assert_eq!(find_center(&g, TreeView::Undirected), None);
    assert_eq!(find_path_center(&g), None);
    assert_eq!(find_weighted_center(&g, TreeView::Directed), None);
}

#[test]
fn single_node_is_its_own_center() {
    let mut g: Graph<(), ()> = Graph::new();
    g.add_node("solo", ());
    assert_eq!(find_center(&g, TreeView::Undirected), Some(0));
    assert_eq!(find_path_center(&g), Some(0));
    assert_eq!(find_weighted_center(&g, TreeView::Reversed), Some(0));
}

#[test]
fn undirected_center_of_a_path_is_its_middle() {
    let g = graph(&[("a", "b"), ("b", "c"), ("c", "d"), ("d", "e")]);
    assert_eq!(
        id_of(&g, find_center(&g, TreeView::Undirected)).as_deref(),
        Some("c")
    );
    assert_eq!(id_of(&g, find_path_center(&g)).as_deref(), Some("c"));
}

#[test]
fn even_path_breaks_ties_towards_lower_index() {
    let g = graph(&[("a", "b"), ("b", "c"), ("c", "d")]);
    assert_eq!(
        id_of(&g, find_center(&g, TreeView::Undirected)).as_deref(),
        Some("b")
    );
    assert_eq!(id_of(&g, find_path_center(&g)).as_deref(), Some("b"));
}

#[test]
fn directed_view_finds_the_root_of_an_out_tree() {
    let g = graph(&[
        ("branch", "x"),
        ("root", "mid"),
        ("mid", "branch"),
        ("mid", "leaf2"),
        ("root", "leaf3"),
    ]);
    // Directed peeling removes sinks until only the source remains.
    let center = find_center(&g, TreeView::Directed);
    assert_eq!(id_of(&g, center).as_deref(), Some("root"));
}

#[test]
fn reversed_view_peels_sources() {
    let g = graph(&[("a", "sink"), ("b", "sink"), ("c", "b")]);
    let center = find_center(&g, TreeView::Reversed);
    assert_eq!(id_of(&g, center).as_deref(), Some("sink"));
}

#[test]
fn star_hub_wins_every_heuristic() {
    let g = graph(&[("s1", "hub"), ("hub", "s2"), ("hub", "s3"), ("s4", "hub")]);
    let hub = g.index_of("hub");
    assert_eq!(find_center(&g, TreeView::Undirected), hub);
    assert_eq!(find_path_center(&g), hub);
    assert_eq!(find_weighted_center(&g, TreeView::Directed), hub);
    assert_eq!(find_weighted_center(&g, TreeView::Reversed), hub);
}

#[test]
fn cycles_fall_back_to_highest_degree() {
    // Triangle with a pendant on `b`: once the pendant is peeled, the triangle cannot shrink.
    let g = graph(&[("a", "b"), ("b", "c"), ("c", "a"), ("b", "p")]);
    assert_eq!(
        id_of(&g, find_center(&g, TreeView::Undirected)).as_deref(),
        Some("a")
    );
    // Directed cycles terminate as well.
    assert!(find_weighted_center(&g, TreeView::Directed).is_some());
}

#[test]
fn hidden_nodes_are_ignored() {
    let mut g = graph(&[("a", "b"), ("b", "c"), ("c", "d"), ("d", "e")]);
    g.hide_node("a");
    g.hide_node("b");
    assert_eq!(
        id_of(&g, find_center(&g, TreeView::Undirected)).as_deref(),
        Some("d")
    );
    assert_eq!(id_of(&g, find_path_center(&g)).as_deref(), Some("d"));
}

#[test]
fn deep_chains_do_not_overflow_the_path_center() {
    let mut g: Graph<(), ()> = Graph::new();
    let n = 50_000;
    for i in 1..n {
        g.add_edge(format!("n{}", i - 1), format!("n{i}"), (), false);
    }
    let center = find_path_center(&g);
    assert_eq!(center, g.index_of(&format!("n{}", (n - 1) / 2)));
}

#[test]
fn deep_chains_do_not_overflow_the_weighted_center() {
    let mut g: Graph<(), ()> = Graph::new();
    let n = 50_000;
    for i in 1..n {
        g.add_edge(format!("n{}", i - 1), format!("n{i}"), (), false);
    }
    // (v + 1) * (n - v) peaks at v = 24999 and v = 25000; the lower index wins.
    let middle = g.index_of("n24999");
    assert_eq!(find_weighted_center(&g, TreeView::Directed), middle);
    assert_eq!(find_weighted_center(&g, TreeView::Reversed), middle);
}
