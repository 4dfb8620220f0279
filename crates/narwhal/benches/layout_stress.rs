use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use narwhal::{
    CommonParameters, FruchtermanReingoldLayout, FruchtermanReingoldParameters, IsomLayout,
    IsomParameters, KamadaKawaiLayout, KamadaKawaiParameters, LinLogLayout, LinLogParameters, Link,
    Rect, Vertex,
};
use narwhal_graphlib::Graph;
use std::hint::black_box;
use std::time::Duration;

#[derive(Debug, Clone)]
struct GridSpec {
    side: usize,
}

impl GridSpec {
    fn node_count(&self) -> usize {
        self.side * self.side
    }

    /// A `side x side` grid with every node starting on a scrambled lattice point.
    fn build(&self) -> Graph<Vertex, Link> {
        let n = self.node_count();
        let mut g: Graph<Vertex, Link> = Graph::new();
        for i in 0..n {
            // Multiplying by a prime coprime with `n` permutes the lattice slots.
            let slot = (i * 7919) % n;
            let (x, y) = (slot % self.side, slot / self.side);
            g.add_node(
                format!("n{i}"),
                Vertex::at(10.0 + x as f64 * 37.0, 10.0 + y as f64 * 37.0),
            );
        }
        for r in 0..self.side {
            for c in 0..self.side {
                let i = r * self.side + c;
                if c + 1 < self.side {
                    g.add_edge(format!("n{i}"), format!("n{}", i + 1), Link::default(), false);
                }
                if r + 1 < self.side {
                    g.add_edge(
                        format!("n{i}"),
                        format!("n{}", i + self.side),
                        Link::default(),
                        false,
                    );
                }
            }
        }
        g
    }
}

fn common() -> CommonParameters {
    CommonParameters {
        bounding_box: Rect::new(0.0, 0.0, 1200.0, 1200.0),
        ..CommonParameters::default()
    }
}

fn bench_layouts(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_stress");
    group.measurement_time(Duration::from_secs(10));

    for side in [6usize, 12, 20] {
        let spec = GridSpec { side };
        let name = format!("grid_{side}x{side}");

        group.bench_with_input(
            BenchmarkId::new("fruchterman_reingold", &name),
            &spec,
            |b, spec| {
                b.iter_batched(
                    || spec.build(),
                    |g| {
                        let params = FruchtermanReingoldParameters {
                            common: common(),
                            max_iterations: 50,
                            ..FruchtermanReingoldParameters::default()
                        };
                        let mut layout = FruchtermanReingoldLayout::new(g, params).unwrap();
                        black_box(layout.compute().unwrap());
                    },
                    BatchSize::LargeInput,
                )
            },
        );

        group.bench_with_input(BenchmarkId::new("linlog", &name), &spec, |b, spec| {
            b.iter_batched(
                || spec.build(),
                |g| {
                    let params = LinLogParameters {
                        common: common(),
                        max_iterations: 50,
                        ..LinLogParameters::default()
                    };
                    let mut layout = LinLogLayout::new(g, params).unwrap();
                    black_box(layout.compute().unwrap());
                },
                BatchSize::LargeInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("isom", &name), &spec, |b, spec| {
            b.iter_batched(
                || spec.build(),
                |g| {
                    let params = IsomParameters {
                        common: common(),
                        max_iterations: 500,
                        ..IsomParameters::default()
                    };
                    let mut layout = IsomLayout::new(g, params).unwrap();
                    black_box(layout.compute().unwrap());
                },
                BatchSize::LargeInput,
            )
        });

        // All-pairs distances make larger grids dominate the whole group.
        if spec.node_count() <= 144 {
            group.bench_with_input(BenchmarkId::new("kamada_kawai", &name), &spec, |b, spec| {
                b.iter_batched(
                    || spec.build(),
                    |g| {
                        let params = KamadaKawaiParameters {
                            common: common(),
                            max_iterations: 200,
                            ..KamadaKawaiParameters::default()
                        };
                        let mut layout = KamadaKawaiLayout::new(g, params).unwrap();
                        black_box(layout.compute().unwrap());
                    },
                    BatchSize::LargeInput,
                )
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_layouts);
criterion_main!(benches);
