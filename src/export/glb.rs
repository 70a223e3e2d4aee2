//! Binary glTF 2.0 (GLB) container.
//!
//! Layout: 12-byte header (magic, version, total length), a JSON chunk padded
//! with spaces, then a BIN chunk padded with zeros. Every chunk length is a
//! multiple of four.

use serde::Serialize;
use serde_json::{Value, json};

use super::EncodingError;
use crate::geom::TriangleMesh;

/// `b"glTF"` read as a little-endian `u32`.
pub const GLB_MAGIC: u32 = 0x4654_6C67;
pub const GLB_VERSION: u32 = 2;
/// `b"JSON"` chunk type.
pub const CHUNK_JSON: u32 = 0x4E4F_534A;
/// `b"BIN\0"` chunk type.
pub const CHUNK_BIN: u32 = 0x004E_4942;

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

const COMPONENT_FLOAT: u32 = 5126;
const COMPONENT_UNSIGNED_INT: u32 = 5125;
const TARGET_ARRAY_BUFFER: u32 = 34962;
const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;
const MODE_TRIANGLES: u32 = 4;

/// Scene and material settings for [`encode_glb`].
#[derive(Debug, Clone, PartialEq)]
pub struct GlbOptions {
    /// Name given to the node and the mesh.
    pub mesh_name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    /// Tag the material with `KHR_materials_unlit`.
    pub unlit: bool,
}

impl Default for GlbOptions {
    fn default() -> Self {
        Self {
            mesh_name: "dual-text".to_string(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            metallic: 0.0,
            roughness: 0.6,
            unlit: false,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Gltf {
    asset: Asset,
    scene: usize,
    scenes: Vec<Scene>,
    nodes: Vec<Node>,
    meshes: Vec<MeshDef>,
    materials: Vec<Material>,
    accessors: Vec<Accessor>,
    buffer_views: Vec<BufferView>,
    buffers: Vec<Buffer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    extensions_used: Vec<&'static str>,
}

#[derive(Serialize)]
struct Asset {
    version: &'static str,
    generator: &'static str,
}

#[derive(Serialize)]
struct Scene {
    nodes: Vec<usize>,
}

#[derive(Serialize)]
struct Node {
    name: String,
    mesh: usize,
}

#[derive(Serialize)]
struct MeshDef {
    name: String,
    primitives: Vec<Primitive>,
}

#[derive(Serialize)]
struct Primitive {
    attributes: Attributes,
    indices: usize,
    material: usize,
    mode: u32,
}

#[derive(Serialize)]
struct Attributes {
    #[serde(rename = "POSITION")]
    position: usize,
    #[serde(rename = "NORMAL")]
    normal: usize,
    #[serde(rename = "TEXCOORD_0", skip_serializing_if = "Option::is_none")]
    texcoord_0: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Material {
    name: &'static str,
    pbr_metallic_roughness: PbrMetallicRoughness,
    double_sided: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    extensions: Option<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PbrMetallicRoughness {
    base_color_factor: [f32; 4],
    metallic_factor: f32,
    roughness_factor: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Accessor {
    buffer_view: usize,
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<[f32; 3]>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BufferView {
    buffer: usize,
    byte_offset: usize,
    byte_length: usize,
    target: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Buffer {
    byte_length: usize,
}

/// Appends a tightly packed section to the BIN buffer and returns its view.
fn push_view(bin: &mut Vec<u8>, views: &mut Vec<BufferView>, bytes: &[u8], target: u32) -> usize {
    let byte_offset = bin.len();
    bin.extend_from_slice(bytes);
    views.push(BufferView {
        buffer: 0,
        byte_offset,
        byte_length: bytes.len(),
        target,
    });
    views.len() - 1
}

fn f32_bytes<const N: usize>(data: &[[f64; N]]) -> Vec<u8> {
    data.iter()
        .flatten()
        .flat_map(|&v| (v as f32).to_le_bytes())
        .collect()
}

/// Package the mesh as a single-node GLB scene.
///
/// One primitive is written per mesh group, all sharing one material and the
/// same position / normal (/ UV) accessors; indices are always `u32`.
pub fn encode_glb(mesh: &TriangleMesh, options: &GlbOptions) -> Result<Vec<u8>, EncodingError> {
    mesh.validate().map_err(EncodingError::InvalidMesh)?;
    if mesh.is_empty() {
        return Err(EncodingError::EmptyMesh);
    }

    let computed;
    let normals = if mesh.normals.len() == mesh.positions.len() {
        &mesh.normals
    } else {
        let mut with_normals = mesh.clone();
        with_normals.compute_vertex_normals();
        computed = with_normals.normals;
        &computed
    };

    let vertex_count = mesh.positions.len();
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for p in &mesh.positions {
        for k in 0..3 {
            let v = p[k] as f32;
            min[k] = min[k].min(v);
            max[k] = max[k].max(v);
        }
    }

    let mut bin: Vec<u8> = Vec::new();
    let mut views: Vec<BufferView> = Vec::new();
    let mut accessors: Vec<Accessor> = Vec::new();

    let position_view = push_view(&mut bin, &mut views, &f32_bytes(&mesh.positions), TARGET_ARRAY_BUFFER);
    accessors.push(Accessor {
        buffer_view: position_view,
        byte_offset: 0,
        component_type: COMPONENT_FLOAT,
        count: vertex_count,
        kind: "VEC3",
        min: Some(min),
        max: Some(max),
    });
    let position_accessor = accessors.len() - 1;

    let normal_view = push_view(&mut bin, &mut views, &f32_bytes(normals), TARGET_ARRAY_BUFFER);
    accessors.push(Accessor {
        buffer_view: normal_view,
        byte_offset: 0,
        component_type: COMPONENT_FLOAT,
        count: vertex_count,
        kind: "VEC3",
        min: None,
        max: None,
    });
    let normal_accessor = accessors.len() - 1;

    let uv_accessor = mesh.uvs.as_ref().map(|uvs| {
        let view = push_view(&mut bin, &mut views, &f32_bytes(uvs), TARGET_ARRAY_BUFFER);
        accessors.push(Accessor {
            buffer_view: view,
            byte_offset: 0,
            component_type: COMPONENT_FLOAT,
            count: vertex_count,
            kind: "VEC2",
            min: None,
            max: None,
        });
        accessors.len() - 1
    });

    let index_bytes: Vec<u8> = mesh.indices.iter().flat_map(|i| i.to_le_bytes()).collect();
    let index_view = push_view(&mut bin, &mut views, &index_bytes, TARGET_ELEMENT_ARRAY_BUFFER);

    let mut primitives = Vec::new();
    for group in mesh.effective_groups().iter().filter(|g| g.index_count > 0) {
        accessors.push(Accessor {
            buffer_view: index_view,
            byte_offset: group.first_index * 4,
            component_type: COMPONENT_UNSIGNED_INT,
            count: group.index_count,
            kind: "SCALAR",
            min: None,
            max: None,
        });
        primitives.push(Primitive {
            attributes: Attributes {
                position: position_accessor,
                normal: normal_accessor,
                texcoord_0: uv_accessor,
            },
            indices: accessors.len() - 1,
            material: 0,
            mode: MODE_TRIANGLES,
        });
    }

    let gltf = Gltf {
        asset: Asset {
            version: "2.0",
            generator: concat!("dual-text-engine ", env!("CARGO_PKG_VERSION")),
        },
        scene: 0,
        scenes: vec![Scene { nodes: vec![0] }],
        nodes: vec![Node {
            name: options.mesh_name.clone(),
            mesh: 0,
        }],
        meshes: vec![MeshDef {
            name: options.mesh_name.clone(),
            primitives,
        }],
        materials: vec![Material {
            name: "default",
            pbr_metallic_roughness: PbrMetallicRoughness {
                base_color_factor: options.base_color,
                metallic_factor: options.metallic,
                roughness_factor: options.roughness,
            },
            double_sided: false,
            extensions: options.unlit.then(|| json!({ "KHR_materials_unlit": {} })),
        }],
        accessors,
        buffer_views: views,
        buffers: vec![Buffer {
            byte_length: bin.len(),
        }],
        extensions_used: if options.unlit { vec!["KHR_materials_unlit"] } else { Vec::new() },
    };

    let mut json_bytes = serde_json::to_vec(&gltf)?;
    pad_to_four(&mut json_bytes, b' ');
    pad_to_four(&mut bin, 0);

    let total = HEADER_LEN + CHUNK_HEADER_LEN + json_bytes.len() + CHUNK_HEADER_LEN + bin.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json_bytes);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    out.extend_from_slice(&bin);

    log::debug!(
        "encoded GLB: {} bytes, {} vertices, {} triangles",
        out.len(),
        vertex_count,
        mesh.triangle_count()
    );
    Ok(out)
}

fn pad_to_four(bytes: &mut Vec<u8>, fill: u8) {
    while bytes.len() % 4 != 0 {
        bytes.push(fill);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GlbParseError {
    #[error("GLB is {0} bytes, shorter than its 12-byte header")]
    TooShort(usize),
    #[error("bad GLB magic 0x{0:08X}")]
    BadMagic(u32),
    #[error("unsupported glTF container version {0}")]
    UnsupportedVersion(u32),
    #[error("header declares {declared} bytes but the file has {actual}")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("malformed chunk: {0}")]
    BadChunk(&'static str),
    #[error("invalid JSON chunk: {0}")]
    Json(#[from] serde_json::Error),
}

/// A parsed GLB container: the scene descriptor and the raw binary buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct GlbDocument {
    pub version: u32,
    pub total_length: usize,
    pub json: Value,
    pub bin: Vec<u8>,
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let slice = bytes.get(offset..offset + 4)?;
    let mut buf = [0u8; 4];
    buf.copy_from_slice(slice);
    Some(u32::from_le_bytes(buf))
}

impl GlbDocument {
    /// Validate header, declared length and chunk framing, then split out the
    /// JSON and BIN chunks.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GlbParseError> {
        if bytes.len() < HEADER_LEN {
            return Err(GlbParseError::TooShort(bytes.len()));
        }
        let magic = read_u32(bytes, 0).ok_or(GlbParseError::TooShort(bytes.len()))?;
        if magic != GLB_MAGIC {
            return Err(GlbParseError::BadMagic(magic));
        }
        let version = read_u32(bytes, 4).ok_or(GlbParseError::TooShort(bytes.len()))?;
        if version != GLB_VERSION {
            return Err(GlbParseError::UnsupportedVersion(version));
        }
        let declared = read_u32(bytes, 8).ok_or(GlbParseError::TooShort(bytes.len()))? as usize;
        if declared != bytes.len() {
            return Err(GlbParseError::LengthMismatch {
                declared,
                actual: bytes.len(),
            });
        }

        let mut offset = HEADER_LEN;
        let mut json = None;
        let mut bin = Vec::new();
        while offset < bytes.len() {
            let (Some(len), Some(kind)) = (read_u32(bytes, offset), read_u32(bytes, offset + 4)) else {
                return Err(GlbParseError::BadChunk("truncated chunk header"));
            };
            let len = len as usize;
            if len % 4 != 0 {
                return Err(GlbParseError::BadChunk("chunk length is not 4-byte aligned"));
            }
            let start = offset + CHUNK_HEADER_LEN;
            let data = bytes
                .get(start..start + len)
                .ok_or(GlbParseError::BadChunk("chunk runs past the end of the file"))?;

            match kind {
                CHUNK_JSON if json.is_none() => json = Some(serde_json::from_slice(data)?),
                CHUNK_JSON => return Err(GlbParseError::BadChunk("duplicate JSON chunk")),
                CHUNK_BIN if json.is_none() => {
                    return Err(GlbParseError::BadChunk("BIN chunk before JSON chunk"));
                }
                CHUNK_BIN => bin = data.to_vec(),
                // Unknown chunk types must be ignored.
                _ => {}
            }
            offset = start + len;
        }

        let json = json.ok_or(GlbParseError::BadChunk("missing JSON chunk"))?;
        Ok(Self {
            version,
            total_length: declared,
            json,
            bin,
        })
    }

    /// Triangles across every primitive of every mesh.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        let accessors = self.json["accessors"].as_array();
        self.primitives()
            .filter_map(|p| p["indices"].as_u64())
            .filter_map(|idx| accessors?.get(idx as usize)?["count"].as_u64())
            .map(|count| count as usize / 3)
            .sum()
    }

    /// Vertex count of the first primitive's `POSITION` accessor.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.primitives()
            .next()
            .and_then(|p| p["attributes"]["POSITION"].as_u64())
            .and_then(|idx| self.json["accessors"].get(idx as usize)?["count"].as_u64())
            .map_or(0, |c| c as usize)
    }

    #[must_use]
    pub fn primitive_count(&self) -> usize {
        self.primitives().count()
    }

    fn primitives(&self) -> impl Iterator<Item = &Value> {
        self.json["meshes"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|m| m["primitives"].as_array())
            .flatten()
    }
}
