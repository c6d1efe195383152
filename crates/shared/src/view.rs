//! The five workspace panels.

use serde::{Deserialize, Serialize};

/// Active panel in the main workspace. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewMode {
    /// Dashboard with projects and the workflow board
    #[default]
    Overview,
    /// Styling agent gallery
    Styling,
    /// CAD / geometry viewer
    Geometry,
    /// Meshing log viewer
    Meshing,
    /// CFD visualization
    Simulation,
}

impl ViewMode {
    pub const ALL: [ViewMode; 5] = [
        ViewMode::Overview,
        ViewMode::Styling,
        ViewMode::Geometry,
        ViewMode::Meshing,
        ViewMode::Simulation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Overview => "overview",
            ViewMode::Styling => "styling",
            ViewMode::Geometry => "geometry",
            ViewMode::Meshing => "meshing",
            ViewMode::Simulation => "simulation",
        }
    }

    /// Sidebar label
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Overview => "总览仪表盘",
            ViewMode::Styling => "造型设计",
            ViewMode::Geometry => "几何建模",
            ViewMode::Meshing => "网格划分",
            ViewMode::Simulation => "CFD 仿真",
        }
    }
}
