use dual_text_engine::export::{
    CHUNK_BIN, CHUNK_JSON, GLB_MAGIC, GlbDocument, GlbOptions, encode_ascii_stl, encode_binary_stl,
    encode_glb, facets_to_mesh, parse_ascii_stl, parse_binary_stl,
};
use dual_text_engine::font::BlockFont;
use dual_text_engine::pipeline::{ExportFormat, IllusionRequest, IllusionSolid, export_mesh, generate_illusion};
use dual_text_engine::text::ExtrusionParams;

fn cat_dog(merge_groups: bool) -> IllusionSolid {
    let params = ExtrusionParams {
        glyph_size: 10.0,
        depth: 4.0,
        padding_offset: 1.0,
        fillet_fraction: 0.0,
    };
    let request = IllusionRequest::new("cat", "dog", params, merge_groups).unwrap();
    generate_illusion(&request, &BlockFont::new()).unwrap()
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

#[test]
fn cat_dog_glb_is_a_valid_container() {
    let solid = cat_dog(true);
    assert!(solid.report.triangles_merged > 0);

    let bytes = encode_glb(&solid.mesh, &GlbOptions::default()).unwrap();
    assert_eq!(u32_at(&bytes, 0), GLB_MAGIC);
    assert_eq!(u32_at(&bytes, 4), 2);
    assert_eq!(u32_at(&bytes, 8) as usize, bytes.len());
    assert_eq!(u32_at(&bytes, 16), CHUNK_JSON);
    let json_len = u32_at(&bytes, 12) as usize;
    assert_eq!(u32_at(&bytes, 20 + json_len + 4), CHUNK_BIN);

    let doc = GlbDocument::from_bytes(&bytes).unwrap();
    assert_eq!(doc.primitive_count(), 1);
    assert_eq!(doc.triangle_count(), solid.report.triangles_merged);
    assert_eq!(doc.vertex_count(), solid.mesh.vertex_count());
    assert_eq!(doc.json["asset"]["version"], "2.0");

    let max = &doc.json["accessors"][0]["max"];
    for (k, bound) in solid.report.bounds_max.iter().enumerate() {
        let written = max[k].as_f64().unwrap();
        assert!((written - bound).abs() < 1e-5);
    }
}

#[test]
fn separate_groups_become_separate_primitives() {
    let solid = cat_dog(false);
    let doc = GlbDocument::from_bytes(&encode_glb(&solid.mesh, &GlbOptions::default()).unwrap()).unwrap();
    assert_eq!(doc.primitive_count(), 2);
    assert_eq!(
        doc.triangle_count(),
        solid.report.triangles_a + solid.report.triangles_b
    );
}

#[test]
fn cat_dog_stl_round_trips() {
    let solid = cat_dog(true);
    let text = encode_ascii_stl(&solid.mesh, "CAT_DOG");
    assert!(text.starts_with("solid CAT_DOG\n"));
    assert!(text.ends_with("endsolid CAT_DOG\n"));
    assert_eq!(encode_ascii_stl(&solid.mesh, "CAT_DOG"), text);

    let facets = parse_ascii_stl(&text).unwrap();
    assert_eq!(facets.len(), solid.report.triangles_merged);
    let parsed = facets_to_mesh(&facets);
    let (a, b) = (parsed.bounds().unwrap(), solid.mesh.bounds().unwrap());
    assert!(a.min.distance_to(b.min) < 1e-4);
    assert!(a.max.distance_to(b.max) < 1e-4);

    let binary = encode_binary_stl(&solid.mesh);
    assert_eq!(binary.len(), 84 + 50 * solid.report.triangles_merged);
    assert_eq!(parse_binary_stl(&binary).unwrap().len(), facets.len());
}

#[test]
fn export_mesh_dispatches_on_format() {
    let solid = cat_dog(true);
    let options = GlbOptions::default();

    let glb = export_mesh(&solid.mesh, ExportFormat::Glb, "CAT_DOG", &options).unwrap();
    let doc = GlbDocument::from_bytes(&glb).unwrap();
    assert_eq!(doc.json["meshes"][0]["name"], "CAT_DOG");

    let stl = export_mesh(&solid.mesh, ExportFormat::StlAscii, "CAT_DOG", &options).unwrap();
    assert!(stl.starts_with(b"solid CAT_DOG"));

    let bin = export_mesh(&solid.mesh, ExportFormat::StlBinary, "CAT_DOG", &options).unwrap();
    assert_eq!(u32_at(&bin, 80) as usize, solid.report.triangles_merged);
}
