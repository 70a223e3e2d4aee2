use dual_text_engine::font::BlockFont;
use dual_text_engine::geom::TriangleMesh;
use dual_text_engine::pipeline::{IllusionError, IllusionRequest, generate_illusion};
use dual_text_engine::text::{
    ExtrusionParams, InputValidationError, compose, extrude_word, merge, validate_word_pair,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EPS: f64 = 1e-5;

fn params(padding: f64, fillet: f64) -> ExtrusionParams {
    ExtrusionParams {
        glyph_size: 10.0,
        depth: 4.0,
        padding_offset: padding,
        fillet_fraction: fillet,
    }
}

fn extrude_pair(a: &str, b: &str, params: &ExtrusionParams) -> (TriangleMesh, TriangleMesh) {
    let (word_a, word_b) = validate_word_pair(a, b).expect("valid words");
    let font = BlockFont::new();
    (
        extrude_word(&word_a, &font, params).expect("extrude A"),
        extrude_word(&word_b, &font, params).expect("extrude B"),
    )
}

/// Triangles as position triples, rotated so the smallest vertex leads
/// (winding preserved), then sorted.
fn triangle_multiset(mesh: &TriangleMesh) -> Vec<[[u64; 3]; 3]> {
    let mut tris: Vec<[[u64; 3]; 3]> = mesh
        .triangles()
        .map(|tri| {
            let bits = tri.map(|v| v.map(f64::to_bits));
            let lead = (0..3).min_by_key(|&i| bits[i]).unwrap_or(0);
            [bits[lead], bits[(lead + 1) % 3], bits[(lead + 2) % 3]]
        })
        .collect();
    tris.sort_unstable();
    tris
}

#[test]
fn triangle_count_is_conserved_through_the_chain() {
    let p = params(2.5, 0.5);
    let (a, b) = extrude_pair("WORD", "TEXT", &p);
    let (ta, tb) = (a.triangle_count(), b.triangle_count());
    let solid = compose(a, b, p.padding_offset);
    assert_eq!(solid.triangle_count(), ta + tb);
    let merged = merge(vec![solid.mesh_a, solid.mesh_b], false).unwrap();
    assert_eq!(merged.triangle_count(), ta + tb);
    assert!(merged.validate().is_ok());
}

#[test]
fn word_b_is_quarter_turned_then_padded() {
    let padding = 1.75;
    let (a, b) = extrude_pair("AB", "CD", &params(padding, 0.0));
    let solid = compose(a.clone(), b.clone(), padding);

    assert_eq!(solid.mesh_a, a);
    assert_eq!(solid.mesh_b.positions.len(), b.positions.len());
    for (before, after) in b.positions.iter().zip(&solid.mesh_b.positions) {
        assert!((after[0] - (before[2] + padding)).abs() < EPS);
        assert!((after[1] - before[1]).abs() < EPS);
        assert!((after[2] + before[0]).abs() < EPS);
    }
    for (before, after) in b.normals.iter().zip(&solid.mesh_b.normals) {
        assert!((after[0] - before[2]).abs() < EPS);
        assert!((after[2] + before[0]).abs() < EPS);
    }

    let bounds = solid.mesh_b.bounds().unwrap();
    assert!((bounds.min.x - (padding - 2.0)).abs() < EPS);
    assert!((bounds.max.x - (padding + 2.0)).abs() < EPS);
}

#[test]
fn extruded_words_are_centered_with_exact_depth() {
    for fillet in [0.0, 0.5, 1.0] {
        let (a, _) = extrude_pair("HELLO", "WORLD", &params(0.0, fillet));
        let bounds = a.bounds().unwrap();
        let center = bounds.center();
        assert!(center.x.abs() < 1e-9 && center.y.abs() < 1e-9 && center.z.abs() < 1e-9);
        assert!((bounds.min.z + 2.0).abs() < 1e-9, "fillet {fillet}");
        assert!((bounds.max.z - 2.0).abs() < 1e-9, "fillet {fillet}");
    }
}

#[test]
fn merge_order_does_not_change_the_solid() {
    let p = params(1.0, 0.5);
    let (a, b) = extrude_pair("CAT", "DOG", &p);
    let solid = compose(a, b, p.padding_offset);

    let ab = merge(vec![solid.mesh_a.clone(), solid.mesh_b.clone()], true).unwrap();
    let ba = merge(vec![solid.mesh_b, solid.mesh_a], true).unwrap();

    assert_eq!(ab.triangle_count(), ba.triangle_count());
    assert_eq!(ab.bounds(), ba.bounds());
    assert_eq!(triangle_multiset(&ab), triangle_multiset(&ba));
}

#[test]
fn single_letter_words_are_rejected() {
    let err = IllusionRequest::new("A", "B", params(1.0, 0.0), true).unwrap_err();
    assert_eq!(
        err,
        InputValidationError::WordTooShort {
            label: "A".into(),
            len: 1,
            min: 2
        }
    );
    assert!(matches!(
        validate_word_pair("  x ", "yy"),
        Err(InputValidationError::WordTooShort { len: 1, .. })
    ));
}

#[test]
fn fillet_adds_bevel_geometry() {
    let sharp = IllusionRequest::new("CAT", "DOG", params(1.0, 0.0), true).unwrap();
    let round = IllusionRequest::new("CAT", "DOG", params(1.0, 1.0), true).unwrap();
    let font = BlockFont::new();
    let sharp = generate_illusion(&sharp, &font).unwrap();
    let round = generate_illusion(&round, &font).unwrap();
    assert!(round.report.triangles_merged > sharp.report.triangles_merged);
}

#[test]
fn unsupported_characters_fail_with_the_missing_glyph() {
    let request = IllusionRequest::new("AB", "A@", params(1.0, 0.0), true).unwrap();
    match generate_illusion(&request, &BlockFont::new()) {
        Err(IllusionError::Glyph(err)) => assert!(err.to_string().contains("'@'")),
        other => panic!("expected a font error, got {other:?}"),
    }
}

#[test]
fn random_word_pairs_produce_valid_solids() {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let font = BlockFont::new();

    for _ in 0..12 {
        let len = rng.random_range(2..=5);
        let mut word = || -> String {
            (0..len)
                .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
                .collect()
        };
        let (a, b) = (word(), word());
        let fillet = f64::from(rng.random_range(0..=4u8)) / 4.0;
        let padding = rng.random_range(0.0..5.0);

        let request = IllusionRequest::new(&a, &b, params(padding, fillet), false).unwrap();
        let solid = generate_illusion(&request, &font).unwrap();
        let report = &solid.report;

        assert!(solid.mesh.validate().is_ok(), "{a}/{b}");
        assert_eq!(report.triangles_merged, report.triangles_a + report.triangles_b);
        assert_eq!(solid.mesh.groups.len(), 2);
        assert_eq!(solid.mesh.groups[0].index_count, report.triangles_a * 3);
        // B is turned onto Z and spans more than A's depth there.
        assert!(report.bounds_min[2] < -2.0 && report.bounds_max[2] > 2.0);
        assert!(report.bounds_max[0] >= padding + 2.0 - EPS);
    }
}
