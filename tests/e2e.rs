mod common;

use common::synthetic_cloud::{
    centered_intrinsics, cloud_from_depth, plane_depth, ripple, uniform_noise,
};
use plane_extract::{ExtractorParams, PlaneExtractor};

#[test]
fn single_plane_fills_the_frame() {
    let (h, w) = (48usize, 48usize);
    let k = centered_intrinsics(h, w);
    let cloud = cloud_from_depth(h, w, &k, |_, _| 1000.0);

    let mut extractor = PlaneExtractor::new(h, w, ExtractorParams::default()).unwrap();
    let seg = extractor.process(&cloud.as_view()).unwrap();

    assert_eq!(seg.nr_planes, 1);
    assert!(
        seg.labels.iter().all(|&l| l == 1),
        "expected every pixel labelled 1"
    );
}

#[test]
fn two_depth_planes_get_distinct_labels() {
    let (h, w) = (48usize, 48usize);
    let k = centered_intrinsics(h, w);
    let cloud = cloud_from_depth(h, w, &k, |_, c| if c < w / 2 { 1000.0 } else { 2000.0 });

    let params = ExtractorParams {
        do_refinement: false,
        ..Default::default()
    };
    let mut extractor = PlaneExtractor::new(h, w, params).unwrap();
    let (seg, diag) = extractor.process_with_diagnostics(&cloud.as_view()).unwrap();

    assert_eq!(seg.nr_planes, 2);
    assert_eq!(diag.segments_raw, 2);
    let left = seg.labels[0];
    let right = seg.labels[w - 1];
    assert_ne!(left, right);
    assert!(left >= 1 && left <= 2 && right >= 1 && right <= 2);
    for r in 0..h {
        for c in 0..w {
            let expected = if c < w / 2 { left } else { right };
            assert_eq!(seg.labels[r * w + c], expected, "pixel ({r}, {c})");
        }
    }
}

#[test]
fn merger_joins_regions_split_by_growth_tolerance() {
    // A 21 mm step is outside the clamped per-cell growing tolerance
    // (20 mm -> 400 mm^2) but inside the merge threshold (500 mm^2), so the
    // two halves grow separately and the merger joins them.
    let (h, w) = (48usize, 48usize);
    let k = centered_intrinsics(h, w);
    let cloud = cloud_from_depth(h, w, &k, |_, c| if c < w / 2 { 1000.0 } else { 1021.0 });

    let params = ExtractorParams {
        do_refinement: false,
        ..Default::default()
    };
    let mut extractor = PlaneExtractor::new(h, w, params).unwrap();
    let (seg, diag) = extractor.process_with_diagnostics(&cloud.as_view()).unwrap();

    assert_eq!(diag.segments_raw, 2, "growth must not cross the step");
    assert_eq!(diag.planes_merged, 1);
    assert_eq!(seg.nr_planes, 1);
    assert!(seg.labels.iter().all(|&l| l == 1));
}

#[test]
fn noise_frame_produces_no_planes() {
    let (h, w) = (48usize, 48usize);
    let k = centered_intrinsics(h, w);
    let cloud = cloud_from_depth(h, w, &k, |r, c| uniform_noise(r, c, 500.0, 1500.0));

    let mut extractor = PlaneExtractor::new(h, w, ExtractorParams::default()).unwrap();
    let seg = extractor.process(&cloud.as_view()).unwrap();

    assert_eq!(seg.nr_planes, 0);
    assert!(seg.labels.iter().all(|&l| l == 0));
}

#[test]
fn wedge_splits_at_the_crease() {
    // Two planes meeting at the image centre with a 30 degree dihedral; the
    // normal agreement threshold (0.93 ~ 21.6 degrees) keeps them apart.
    let (h, w) = (48usize, 48usize);
    let k = centered_intrinsics(h, w);
    let slope = 0.268f32; // tan 15 deg
    let cloud = cloud_from_depth(h, w, &k, |r, c| {
        let s = if c < w / 2 { slope } else { -slope };
        plane_depth(1000.0, s, 0.0, r, c, &k) + ripple(r, c)
    });

    let mut extractor = PlaneExtractor::new(h, w, ExtractorParams::default()).unwrap();
    let seg = extractor.process(&cloud.as_view()).unwrap();

    assert_eq!(seg.nr_planes, 2);
    let left = seg.labels[0];
    let right = seg.labels[w - 1];
    assert_ne!(left, right);
    assert!(left >= 1 && right >= 1);
    for r in 0..h {
        for c in 0..w {
            let label = seg.labels[r * w + c];
            if c < w / 2 {
                assert_eq!(label, left, "pixel ({r}, {c})");
            } else if c > w / 2 {
                assert_eq!(label, right, "pixel ({r}, {c})");
            } else {
                // The crease column lies on both planes; refinement assigns
                // whichever plane recorded the smaller distance.
                assert!(label == left || label == right, "pixel ({r}, {c})");
            }
        }
    }
}

#[test]
fn thin_plane_is_eroded_away_by_refinement() {
    let (h, w) = (72usize, 72usize);
    let k = centered_intrinsics(h, w);
    let patch = ExtractorParams::default().patch_size;
    // One cell-wide vertical strip of valid depth.
    let strip = move |_, c: usize| {
        if (2 * patch..3 * patch).contains(&c) {
            1000.0
        } else {
            0.0
        }
    };
    let cloud = cloud_from_depth(h, w, &k, strip);

    let mut refined = PlaneExtractor::new(h, w, ExtractorParams::default()).unwrap();
    let seg = refined.process(&cloud.as_view()).unwrap();
    assert_eq!(seg.nr_planes, 0);
    assert!(seg.labels.iter().all(|&l| l == 0));

    let coarse_params = ExtractorParams {
        do_refinement: false,
        ..Default::default()
    };
    let mut coarse = PlaneExtractor::new(h, w, coarse_params).unwrap();
    let seg = coarse.process(&cloud.as_view()).unwrap();
    assert_eq!(seg.nr_planes, 1);
    for r in 0..h {
        for c in 0..w {
            let expected = u8::from((2 * patch..3 * patch).contains(&c));
            assert_eq!(seg.labels[r * w + c], expected, "pixel ({r}, {c})");
        }
    }
}

#[test]
fn identical_frames_give_identical_labels_across_reuse() {
    let (h, w) = (48usize, 48usize);
    let k = centered_intrinsics(h, w);
    let slope = 0.268f32;
    let wedge = cloud_from_depth(h, w, &k, |r, c| {
        let s = if c < w / 2 { slope } else { -slope };
        plane_depth(1000.0, s, 0.0, r, c, &k) + ripple(r, c)
    });
    let flat = cloud_from_depth(h, w, &k, |_, _| 1200.0);

    let mut extractor = PlaneExtractor::new(h, w, ExtractorParams::default()).unwrap();
    let first = extractor.process(&wedge.as_view()).unwrap();
    // An unrelated frame in between must not leak state into the next one.
    let _ = extractor.process(&flat.as_view()).unwrap();
    let second = extractor.process(&wedge.as_view()).unwrap();
    assert_eq!(first.labels, second.labels);

    let mut fresh = PlaneExtractor::new(h, w, ExtractorParams::default()).unwrap();
    let third = fresh.process(&wedge.as_view()).unwrap();
    assert_eq!(first.labels, third.labels);
    assert_eq!(first.nr_planes, third.nr_planes);
}
