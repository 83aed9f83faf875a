use abcview_flatten::{FlatBuffers, Flattener};
use abcview_scene::Archive;

fn example() -> Archive {
    Archive::open(concat!(env!("CARGO_MANIFEST_DIR"), "/data/example.ron")).unwrap()
}

#[test]
fn example_archive_flattens_cleanly() {
    let archive = example();
    let mut buffers = FlatBuffers::default();
    let report = Flattener::default().flatten(&archive, 0.0, &mut buffers);

    assert!(report.is_clean(), "{:?}", report.conditions);
    // Cube: 8 vertices, 6 quads. Pyramid: 5 vertices, 1 quad + 4 triangles.
    assert_eq!(buffers.vertex_count(), 13);
    assert_eq!(buffers.index_count(), (12 + 6) * 3);
}

#[test]
fn example_archive_loops_over_three_seconds() {
    assert_eq!(example().time_range(), Some((0.0, 3.0)));
}

#[test]
fn example_cube_bounces() {
    let archive = example();
    let flattener = Flattener::default();
    let mut buffers = FlatBuffers::default();

    flattener.flatten(&archive, 0.0, &mut buffers);
    let rest = buffers.vertices()[0];
    flattener.flatten(&archive, 2.0, &mut buffers);
    let peak = buffers.vertices()[0];

    assert_eq!(rest, [-0.5, -0.5, -0.5]);
    assert_eq!(peak, [-0.5, 1.0, -0.5]);
}

#[test]
fn example_outline_lists_every_object() {
    let outline = example().outline();
    assert_eq!(outline.lines().count(), 7);
    assert!(outline.starts_with("ABC\n\tcube (IXformSchema)\n"));
    assert!(outline.contains("\t\tcameraShape (ICameraSchema)\n"));
}
