use narwhal::{CommonParameters, ComputeState, IsomLayout, IsomParameters, Link, Vector, Vertex};
use narwhal_graphlib::Graph;

fn wheel() -> Graph<Vertex, Link> {
    let mut g = Graph::new();
    g.add_node("hub", Vertex::at(120.0, 880.0));
    for i in 0..6 {
        let angle = i as f64 * std::f64::consts::TAU / 6.0;
        let id = format!("r{i}");
        g.add_node(
            id.clone(),
            Vertex::at(500.0 + 300.0 * angle.cos(), 500.0 + 300.0 * angle.sin()),
        );
        g.add_edge("hub", id.clone(), Link::default(), false);
        g.add_edge(id, format!("r{}", (i + 1) % 6), Link::default(), false);
    }
    g
}

fn params(seed: u64) -> IsomParameters {
    IsomParameters {
        common: CommonParameters {
            seed,
            ..CommonParameters::default()
        },
        max_iterations: 300,
        ..IsomParameters::default()
    }
}

#[test]
fn nodes_stay_inside_the_box() {
    let mut layout = IsomLayout::new(wheel(), params(7)).unwrap();
    assert_eq!(layout.compute().unwrap(), ComputeState::Finished);
    let bbox = layout.params().common.bounding_box;
    assert!(layout.positions().values().all(|p| bbox.contains(*p)));
}

#[test]
fn runs_are_reproducible_per_seed() {
    let run = |seed| {
        let mut layout = IsomLayout::new(wheel(), params(seed)).unwrap();
        layout.compute().unwrap();
        layout.positions()
    };
    assert_eq!(run(42), run(42));
    assert_ne!(run(42), run(43));
}

#[test]
fn rooted_layout_pulls_the_root_to_the_center() {
    let mut layout = IsomLayout::new(wheel(), params(1)).unwrap();
    assert_eq!(layout.compute_rooted("hub").unwrap(), ComputeState::Finished);
    let center = Vector::new(500.0, 500.0);
    assert!((layout.positions()["hub"] - center).norm() < 1.0);
}

#[test]
fn root_without_outgoing_edges_falls_back_to_random_stimuli() {
    let mut g = wheel();
    g.add_edge("r0", "sink", Link::default(), false);
    g.node_mut("sink").unwrap().position = Vector::new(10.0, 10.0);
    let mut layout = IsomLayout::new(g, params(5)).unwrap();
    layout.compute_rooted("sink").unwrap();
    assert!((layout.positions()["sink"] - Vector::new(500.0, 500.0)).norm() > 1.0);
}

#[test]
fn schedule_rejects_inverted_radius_bounds() {
    let bad = IsomParameters {
        initial_radius: 1,
        min_radius: 3,
        ..IsomParameters::default()
    };
    assert!(IsomLayout::new(wheel(), bad).is_err());
}
