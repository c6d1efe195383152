//! STL import for the geometry viewer (binary and ASCII).

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

#[derive(Debug, Error)]
pub enum StlError {
    #[error("failed to read STL file: {0}")]
    Io(#[from] std::io::Error),
    #[error("binary STL truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("ASCII STL line {line}: {reason}")]
    Syntax { line: usize, reason: String },
    #[error("STL contains no triangles")]
    Empty,
}

pub type Triangle = [[f32; 3]; 3];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StlMesh {
    pub triangles: Vec<Triangle>,
}

impl StlMesh {
    pub fn from_file(path: &Path) -> Result<Self, StlError> {
        let bytes = std::fs::read(path)?;
        let mesh = Self::parse(&bytes)?;
        tracing::info!(
            path = %path.display(),
            faces = mesh.face_count(),
            "imported STL"
        );
        Ok(mesh)
    }

    /// Binary when the byte length matches the triangle count in the header,
    /// ASCII when the data starts with `solid`.
    pub fn parse(bytes: &[u8]) -> Result<Self, StlError> {
        let mesh = if looks_binary(bytes) || !bytes.trim_ascii_start().starts_with(b"solid") {
            parse_binary(bytes)?
        } else {
            parse_ascii(&String::from_utf8_lossy(bytes))?
        };
        if mesh.triangles.is_empty() {
            return Err(StlError::Empty);
        }
        Ok(mesh)
    }

    /// Non-indexed vertex count, three per face
    pub fn vertex_count(&self) -> usize {
        self.triangles.len() * 3
    }

    pub fn face_count(&self) -> usize {
        self.triangles.len()
    }

    /// Axis-aligned (min, max)
    pub fn bounds(&self) -> ([f32; 3], [f32; 3]) {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for v in self.triangles.iter().flatten() {
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
        }
        (min, max)
    }

    pub fn max_extent(&self) -> f32 {
        let (min, max) = self.bounds();
        (0..3).map(|a| max[a] - min[a]).fold(0.0, f32::max)
    }

    /// Move the bounding-box center to the origin and turn Z-up into Y-up
    pub fn normalized(mut self) -> Self {
        let (min, max) = self.bounds();
        let center = [
            (min[0] + max[0]) * 0.5,
            (min[1] + max[1]) * 0.5,
            (min[2] + max[2]) * 0.5,
        ];
        for v in self.triangles.iter_mut().flatten() {
            let [x, y, z] = [v[0] - center[0], v[1] - center[1], v[2] - center[2]];
            *v = [x, z, -y];
        }
        self
    }
}

/// Edge usage counts; a closed 2-manifold uses every edge exactly twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeReport {
    pub edges: usize,
    /// Used by a single triangle
    pub open: usize,
    /// Shared by more than two triangles
    pub non_manifold: usize,
}

impl EdgeReport {
    pub fn is_closed(&self) -> bool {
        self.edges > 0 && self.open == 0 && self.non_manifold == 0
    }
}

/// Count edge usage, welding vertices that are bit-identical
pub fn edge_report(triangles: &[Triangle]) -> EdgeReport {
    let key = |v: &[f32; 3]| v.map(|c| (c + 0.0).to_bits());
    let mut uses: HashMap<([u32; 3], [u32; 3]), usize> = HashMap::new();
    for tri in triangles {
        for i in 0..3 {
            let (a, b) = (key(&tri[i]), key(&tri[(i + 1) % 3]));
            let edge = if a <= b { (a, b) } else { (b, a) };
            *uses.entry(edge).or_default() += 1;
        }
    }
    EdgeReport {
        edges: uses.len(),
        open: uses.values().filter(|&&n| n == 1).count(),
        non_manifold: uses.values().filter(|&&n| n > 2).count(),
    }
}

fn looks_binary(bytes: &[u8]) -> bool {
    if bytes.len() < HEADER_LEN + 4 {
        return false;
    }
    let count = read_u32(bytes, HEADER_LEN) as usize;
    bytes.len() == HEADER_LEN + 4 + count * TRIANGLE_LEN
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_f32(bytes: &[u8], at: usize) -> f32 {
    f32::from_bits(read_u32(bytes, at))
}

fn parse_binary(bytes: &[u8]) -> Result<StlMesh, StlError> {
    if bytes.len() < HEADER_LEN + 4 {
        return Err(StlError::Truncated {
            expected: HEADER_LEN + 4,
            found: bytes.len(),
        });
    }
    let count = read_u32(bytes, HEADER_LEN) as usize;
    let expected = HEADER_LEN + 4 + count * TRIANGLE_LEN;
    if bytes.len() < expected {
        return Err(StlError::Truncated {
            expected,
            found: bytes.len(),
        });
    }

    let triangles = (0..count)
        .map(|i| {
            // skip the 12-byte facet normal; normals are recomputed for shading
            let base = HEADER_LEN + 4 + i * TRIANGLE_LEN + 12;
            let vertex = |k: usize| {
                let at = base + k * 12;
                [read_f32(bytes, at), read_f32(bytes, at + 4), read_f32(bytes, at + 8)]
            };
            [vertex(0), vertex(1), vertex(2)]
        })
        .collect();
    Ok(StlMesh { triangles })
}

fn parse_ascii(text: &str) -> Result<StlMesh, StlError> {
    let mut triangles = Vec::new();
    let mut current: Vec<[f32; 3]> = Vec::with_capacity(3);

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("vertex") => {
                let coords: Vec<f32> = parts
                    .map(|p| p.parse::<f32>())
                    .collect::<Result<_, _>>()
                    .map_err(|e| StlError::Syntax {
                        line: line_no,
                        reason: format!("bad coordinate: {e}"),
                    })?;
                if coords.len() != 3 {
                    return Err(StlError::Syntax {
                        line: line_no,
                        reason: format!("expected 3 coordinates, found {}", coords.len()),
                    });
                }
                current.push([coords[0], coords[1], coords[2]]);
            }
            Some("endloop") => {
                if current.len() != 3 {
                    return Err(StlError::Syntax {
                        line: line_no,
                        reason: format!("facet has {} vertices", current.len()),
                    });
                }
                triangles.push([current[0], current[1], current[2]]);
                current.clear();
            }
            _ => {}
        }
    }
    Ok(StlMesh { triangles })
}
