//! Design catalog records and dashboard projects.
//!
//! All of this is reference data: records are loaded once and never
//! mutated while the app runs.

use serde::{Deserialize, Serialize};

/// Catalog identifier, e.g. `design-001`
pub type DesignId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleType {
    Estateback,
    Sedan,
    #[serde(rename = "SUV")]
    Suv,
    Sports,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Estateback => "Estateback",
            VehicleType::Sedan => "Sedan",
            VehicleType::Suv => "SUV",
            VehicleType::Sports => "Sports",
        }
    }
}

/// Parameters the styling agent used to produce the concept image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleParams {
    pub vibe: String,
    pub color: String,
    pub seed: u64,
    pub cfg: f32,
    pub steps: u32,
}

/// Overall vehicle size in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            length: 4500.0,
            width: 1800.0,
            height: 1400.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadData {
    pub vertices: u32,
    pub faces: u32,
    pub latent_code: Vec<f32>,
    pub dimensions: Dimensions,
    pub parts: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshQuality {
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub cells: u64,
    pub quality: MeshQuality,
    pub non_orthogonality: f32,
    pub skewness: f32,
    pub aspect_ratio: f32,
    pub generated_at: String,
}

impl MeshData {
    /// Cell count in millions, two decimals
    pub fn cells_millions(&self) -> String {
        format!("{:.2}M", self.cells as f64 / 1_000_000.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergencePoint {
    pub iteration: u32,
    pub residual: f64,
    pub continuity: f64,
}

/// Shape of a canned solver history: two exponential decays with a floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceProfile {
    pub residual_decay: f64,
    pub residual_scale: f64,
    pub continuity_decay: f64,
    pub continuity_scale: f64,
}

impl ConvergenceProfile {
    pub const POINTS: u32 = 100;
    pub const ITERATION_STRIDE: u32 = 5;

    pub fn series(&self) -> Vec<ConvergencePoint> {
        (0..Self::POINTS)
            .map(|i| {
                let step = i as f64;
                ConvergencePoint {
                    iteration: i * Self::ITERATION_STRIDE,
                    residual: (-step * self.residual_decay).exp() * self.residual_scale + 1e-5,
                    continuity: (-step * self.continuity_decay).exp() * self.continuity_scale
                        + 1e-4,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfdData {
    pub drag_coefficient: f32,
    pub lift_coefficient: f32,
    /// m/s
    pub inlet_velocity: f32,
    /// m²
    pub frontal_area: f32,
    pub convergence: Vec<ConvergencePoint>,
}

/// A single catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignRecord {
    pub id: DesignId,
    pub name: String,
    pub vehicle_type: VehicleType,
    pub description: String,
    pub image_url: String,
    pub style: StyleParams,
    #[serde(default)]
    pub cad: Option<CadData>,
    #[serde(default)]
    pub mesh: Option<MeshData>,
    #[serde(default)]
    pub cfd: Option<CfdData>,
}

impl DesignRecord {
    pub fn dimensions(&self) -> Dimensions {
        self.cad.as_ref().map(|c| c.dimensions).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    Active,
    Queued,
    Completed,
    Error,
}

impl ProjectStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "进行中",
            ProjectStatus::Completed => "已完成",
            ProjectStatus::Queued => "排队中",
            ProjectStatus::Error => "错误",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Concept,
    Geometry,
    Meshing,
    Simulation,
}

impl PipelineStage {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Concept => "概念设计",
            PipelineStage::Geometry => "几何建模",
            PipelineStage::Meshing => "网格划分",
            PipelineStage::Simulation => "仿真计算",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub status: ProjectStatus,
    pub last_modified: String,
    pub owner: String,
    /// 0..=100
    pub progress: u8,
    pub stage: PipelineStage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convergence_series_shape() {
        let profile = ConvergenceProfile {
            residual_decay: 0.05,
            residual_scale: 0.1,
            continuity_decay: 0.04,
            continuity_scale: 0.5,
        };
        let series = profile.series();
        assert_eq!(series.len(), 100);
        assert_eq!(series[0].iteration, 0);
        assert_eq!(series[99].iteration, 495);
        assert!((series[0].residual - 0.10001).abs() < 1e-9);
        assert!(series.windows(2).all(|w| w[1].residual < w[0].residual));
        assert!(series.iter().all(|p| p.continuity > 1e-4));
    }

    #[test]
    fn test_cells_millions() {
        let mesh = MeshData {
            cells: 1_250_000,
            quality: MeshQuality::Pass,
            non_orthogonality: 45.2,
            skewness: 2.1,
            aspect_ratio: 12.4,
            generated_at: "10:45:22".into(),
        };
        assert_eq!(mesh.cells_millions(), "1.25M");
    }

    #[test]
    fn test_vehicle_type_json_names() {
        assert_eq!(serde_json::to_string(&VehicleType::Suv).unwrap(), "\"SUV\"");
        let parsed: VehicleType = serde_json::from_str("\"Estateback\"").unwrap();
        assert_eq!(parsed, VehicleType::Estateback);
    }
}
