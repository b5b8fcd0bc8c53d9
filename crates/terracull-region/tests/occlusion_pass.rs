//! End-to-end occlusion passes over a small synthetic scene.

use glam::{DVec3, IVec3, Vec3};
use terracull_core::{FaceFlags, RegionOrigin};
use terracull_occlusion::{FrustumSnapshot, Occluder, PackedBox, TerrainCamera};
use terracull_region::{
    MutualFaceFlags, OcclusionPass, RegionOccluders, RegionStorage, RegionStorageConfig,
    VisibilityOutcome,
};

fn origin(cx: i32, cy: i32, cz: i32) -> RegionOrigin {
    RegionOrigin::from_chunk(IVec3::new(cx, cy, cz))
}

fn empty_scene() -> RegionStorage {
    RegionStorage::new(RegionStorageConfig::new().with_vertical_bounds(-64, 96))
}

/// Solid wall one region thick at chunk x = 3 that traversal may pass through.
fn build_wall(storage: &mut RegionStorage) {
    for cy in -4..=4 {
        for cz in -8..=8 {
            let occluders =
                RegionOccluders::new(PackedBox::FULL_BOX, vec![PackedBox::FULL_BOX], MutualFaceFlags::ALL);
            storage.set_occluders(origin(3, cy, cz), Some(occluders));
        }
    }
}

fn scene_with_wall() -> RegionStorage {
    let mut storage = empty_scene();
    build_wall(&mut storage);
    storage
}

fn occluder_at(pos: DVec3) -> Occluder {
    let mut occluder = Occluder::default();
    let camera = TerrainCamera::new(pos, Vec3::X);
    occluder.update_frustum(&FrustumSnapshot::capture(&camera));
    occluder
}

fn outcome(storage: &RegionStorage, origin: RegionOrigin) -> Option<VisibilityOutcome> {
    storage
        .get(origin)
        .and_then(|id| storage.region(id))
        .map(|r| r.visibility.outcome())
}

fn is_listed_visible(pass: &OcclusionPass, storage: &RegionStorage, origin: RegionOrigin) -> bool {
    pass.visible_regions()
        .iter()
        .any(|&id| storage.region(id).map(|r| r.origin()) == Some(origin))
}

#[test]
fn wall_hides_regions_behind_it() {
    let mut storage = scene_with_wall();
    let mut occluder = occluder_at(DVec3::splat(8.0));
    let mut pass = OcclusionPass::new(12);

    let stats = pass.run(&mut storage, &mut occluder);
    assert!(stats.redrawn);
    assert!(stats.drawn > 0);

    for cx in 0..=3 {
        assert!(is_listed_visible(&pass, &storage, origin(cx, 0, 0)), "chunk {cx} should be visible");
    }

    assert_eq!(outcome(&storage, origin(4, 0, 0)), Some(VisibilityOutcome::Occluded));
    assert!(!is_listed_visible(&pass, &storage, origin(4, 0, 0)));
    // occluded regions do not spread the traversal
    assert_eq!(outcome(&storage, origin(6, 0, 0)), None);
}

#[test]
fn unchanged_view_reuses_results() {
    let mut storage = scene_with_wall();
    let mut occluder = occluder_at(DVec3::splat(8.0));
    let mut pass = OcclusionPass::new(12);

    let first = pass.run(&mut storage, &mut occluder);
    let first_visible = pass.visible_regions().to_vec();
    let version = occluder.version();

    let second = pass.run(&mut storage, &mut occluder);
    assert!(!second.redrawn);
    assert_eq!(occluder.version(), version);
    assert_eq!(second.visited, first.visited);
    assert_eq!(second.reused, second.visited);
    assert_eq!(second.drawn, 0);
    assert_eq!(pass.visible_regions(), first_visible.as_slice());
}

#[test]
fn hole_in_wall_after_invalidate() {
    let mut storage = scene_with_wall();
    let mut occluder = occluder_at(DVec3::splat(8.0));
    let mut pass = OcclusionPass::new(12);

    pass.run(&mut storage, &mut occluder);
    assert_eq!(outcome(&storage, origin(4, 0, 0)), Some(VisibilityOutcome::Occluded));

    storage.set_occluders(origin(3, 0, 0), None);
    occluder.invalidate();

    let stats = pass.run(&mut storage, &mut occluder);
    assert!(stats.redrawn);
    assert!(is_listed_visible(&pass, &storage, origin(4, 0, 0)));
}

#[test]
fn wall_added_without_redraw_retests_regions_behind_it() {
    let mut storage = empty_scene();
    let mut occluder = occluder_at(DVec3::splat(8.0));
    let mut pass = OcclusionPass::new(12);

    pass.run(&mut storage, &mut occluder);
    assert_eq!(outcome(&storage, origin(4, 0, 0)), Some(VisibilityOutcome::Visible));

    build_wall(&mut storage);
    let stats = pass.run(&mut storage, &mut occluder);

    assert!(!stats.redrawn);
    assert!(stats.stale > 0);
    assert_eq!(outcome(&storage, origin(4, 0, 0)), Some(VisibilityOutcome::Occluded));
    assert!(!is_listed_visible(&pass, &storage, origin(4, 0, 0)));
}

#[test]
fn widening_view_distance_reuses_inner_results() {
    let mut storage = scene_with_wall();
    let mut occluder = occluder_at(DVec3::splat(8.0));
    let mut pass = OcclusionPass::new(3);

    let first = pass.run(&mut storage, &mut occluder);
    assert!(is_listed_visible(&pass, &storage, origin(3, 0, 0)));
    assert_eq!(outcome(&storage, origin(4, 0, 0)), None);

    pass.set_view_distance(12);
    let second = pass.run(&mut storage, &mut occluder);

    assert!(!second.redrawn);
    assert_eq!(second.stale, 0);
    assert_eq!(second.reused, first.visited);
    assert_eq!(outcome(&storage, origin(4, 0, 0)), Some(VisibilityOutcome::Occluded));
}

#[test]
fn visible_regions_carry_backface_flags() {
    let mut storage = scene_with_wall();
    let mut occluder = occluder_at(DVec3::splat(8.0));
    let mut pass = OcclusionPass::new(12);
    pass.run(&mut storage, &mut occluder);

    assert_eq!(pass.backface_flags().len(), pass.visible_regions().len());

    // camera sits in the middle of the first region
    let first = pass.visible_regions()[0];
    assert_eq!(storage.region(first).map(|r| r.origin()), Some(origin(0, 0, 0)));
    assert_eq!(
        pass.backface_flags()[0],
        FaceFlags::UP | FaceFlags::EAST | FaceFlags::SOUTH
    );

    let flags = pass.backface_flags().to_vec();
    let stats = pass.run(&mut storage, &mut occluder);
    assert_eq!(stats.reused, stats.visited);
    assert_eq!(pass.backface_flags(), flags.as_slice());
}

#[test]
fn camera_move_redraws() {
    let mut storage = scene_with_wall();
    let mut occluder = occluder_at(DVec3::splat(8.0));
    let mut pass = OcclusionPass::new(12);
    pass.run(&mut storage, &mut occluder);

    // step past the wall
    let mut camera = TerrainCamera::new(DVec3::splat(8.0), Vec3::X);
    camera.set_position(DVec3::new(72.0, 8.0, 8.0));
    occluder.update_frustum(&FrustumSnapshot::capture(&camera));

    let stats = pass.run(&mut storage, &mut occluder);
    assert!(stats.redrawn);
    assert!(is_listed_visible(&pass, &storage, origin(5, 0, 0)));
    assert_eq!(outcome(&storage, origin(5, 0, 0)), Some(VisibilityOutcome::Visible));
}

#[test]
fn view_distance_limits_traversal() {
    let mut storage = scene_with_wall();
    let mut occluder = occluder_at(DVec3::splat(8.0));
    let mut pass = OcclusionPass::new(2);

    pass.run(&mut storage, &mut occluder);
    assert!(is_listed_visible(&pass, &storage, origin(2, 0, 0)));
    assert!(!is_listed_visible(&pass, &storage, origin(3, 0, 0)));
}

#[test]
fn traversal_only_moves_outward() {
    let mut storage = scene_with_wall();
    let mut occluder = occluder_at(DVec3::splat(8.0));
    let mut pass = OcclusionPass::new(12);
    pass.run(&mut storage, &mut occluder);

    let dists: Vec<i32> = pass
        .visible_regions()
        .iter()
        .filter_map(|&id| storage.region(id))
        .map(|r| r.squared_chunk_distance())
        .collect();
    assert!(dists.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn shadow_traversal_reaches_each_region_once() {
    let config = RegionStorageConfig::new().with_vertical_bounds(0, 32);
    let mut storage = RegionStorage::new(config);
    let start = storage.get_or_create(origin(0, 0, 0));
    if let Some(region) = storage.region_mut(start) {
        region.shadow_visibility.start(1);
    }

    let mut frontier = vec![start];
    let mut reached = 1;
    for _ in 0..2 {
        let mut next = Vec::new();
        for id in frontier {
            storage.enqueue_unvisited_shadow_neighbors(id, 1, &mut next);
        }
        reached += next.len();
        frontier = next;
    }

    // start, its 5 neighbors, then 4 straight, 4 diagonal and 4 upper regions
    assert_eq!(reached, storage.len());
    assert_eq!(storage.len(), 1 + 5 + 12);
}
