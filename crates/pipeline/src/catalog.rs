//! Design catalog, dashboard projects and the seeded console log.

use serde::Deserialize;
use shared::design::{
    CadData, CfdData, ConvergenceProfile, Dimensions, MeshData, MeshQuality, PipelineStage,
    Project, ProjectStatus, StyleParams, VehicleType,
};
use shared::{DesignRecord, LogEntry, LogLevel};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog contains no designs")]
    Empty,
    #[error("duplicate design id '{0}' in catalog")]
    DuplicateId(String),
}

/// On-disk catalog layout
#[derive(Debug, Deserialize)]
struct CatalogFile {
    designs: Vec<DesignRecord>,
    #[serde(default)]
    projects: Option<Vec<Project>>,
}

/// Read-only set of designs and projects. Never empty.
#[derive(Debug, Clone)]
pub struct DesignCatalog {
    designs: Vec<DesignRecord>,
    projects: Vec<Project>,
}

impl DesignCatalog {
    pub fn new(designs: Vec<DesignRecord>, projects: Vec<Project>) -> Result<Self, CatalogError> {
        if designs.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for design in &designs {
            if !seen.insert(design.id.as_str()) {
                return Err(CatalogError::DuplicateId(design.id.clone()));
            }
        }
        Ok(Self { designs, projects })
    }

    /// The demo catalog shipped with the app
    pub fn builtin() -> Self {
        Self {
            designs: builtin_designs(),
            projects: builtin_projects(),
        }
    }

    /// Load a JSON catalog. Projects fall back to the built-in list when absent.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let bytes = fs::read(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CatalogFile =
            serde_json::from_slice(&bytes).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let projects = file.projects.unwrap_or_else(builtin_projects);
        let catalog = Self::new(file.designs, projects)?;
        tracing::info!(
            path = %path.display(),
            designs = catalog.designs.len(),
            "loaded design catalog"
        );
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&DesignRecord> {
        self.designs.iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Default pick when a command needs a design and none is selected
    pub fn first(&self) -> &DesignRecord {
        &self.designs[0]
    }

    pub fn designs(&self) -> &[DesignRecord] {
        &self.designs
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// First active project, else the first one
    pub fn active_project(&self) -> Option<&Project> {
        self.projects
            .iter()
            .find(|p| p.status == ProjectStatus::Active)
            .or_else(|| self.projects.first())
    }
}

/// Console contents before any command runs
pub fn initial_logs() -> Vec<LogEntry> {
    vec![
        LogEntry::new("10:00:01", LogLevel::Info, "系统初始化完成。AutoGen 调度器就绪。", "SYSTEM"),
        LogEntry::new("10:00:02", LogLevel::Info, "已连接 DrivAerNet++ 数据库 (v2.4.1)。", "DB"),
        LogEntry::new(
            "10:00:02",
            LogLevel::Info,
            "模块加载: 造型[SDXL], 建模[DeepSDF], 网格[OF], 仿真[TripNet]。",
            "ORCHESTRATOR",
        ),
        LogEntry::new(
            "10:00:05",
            LogLevel::Debug,
            "GPU 集群 [Node-01] 分配: 已预留 12GB 显存。",
            "RESOURCE_MGR",
        ),
    ]
}

fn project(
    id: &str,
    name: &str,
    status: ProjectStatus,
    last_modified: &str,
    owner: &str,
    progress: u8,
    stage: PipelineStage,
) -> Project {
    Project {
        id: id.into(),
        name: name.into(),
        status,
        last_modified: last_modified.into(),
        owner: owner.into(),
        progress,
        stage,
    }
}

fn builtin_projects() -> Vec<Project> {
    use PipelineStage::*;
    use ProjectStatus::*;
    vec![
        project("PRJ-2024-884", "Aero-Estate 旅行车项目", Active, "2024-03-10 14:30", "陈工程师", 75, Simulation),
        project("PRJ-2024-883", "Hyper-Luxe GT 概念研究", Completed, "2024-03-09 09:15", "史密斯工程师", 100, Simulation),
        project("PRJ-2024-882", "Eco-Hauler 电动商用车", Queued, "2024-03-08 16:45", "王工程师", 45, Meshing),
        project("PRJ-2024-881", "复古运动融合设计", Error, "2024-03-08 11:20", "陈工程师", 60, Geometry),
    ]
}

struct Seed {
    id: &'static str,
    name: &'static str,
    vehicle_type: VehicleType,
    description: &'static str,
    image_id: u32,
    style: (&'static str, &'static str, u64, f32, u32),
    cad: (u32, u32, [f32; 4], [f32; 3], &'static [&'static str]),
    mesh: (u64, f32, f32, f32, &'static str),
    cfd: (f32, f32, f32, f32),
    convergence: [f64; 4],
}

impl Seed {
    fn into_record(self) -> DesignRecord {
        let (vibe, color, seed, cfg, steps) = self.style;
        let (vertices, faces, latent, [length, width, height], parts) = self.cad;
        let (cells, non_orthogonality, skewness, aspect_ratio, generated_at) = self.mesh;
        let (drag, lift, inlet, area) = self.cfd;
        let [rd, rs, cd, cs] = self.convergence;
        DesignRecord {
            id: self.id.into(),
            name: self.name.into(),
            vehicle_type: self.vehicle_type,
            description: self.description.into(),
            image_url: format!("https://picsum.photos/id/{}/800/600", self.image_id),
            style: StyleParams {
                vibe: vibe.into(),
                color: color.into(),
                seed,
                cfg,
                steps,
            },
            cad: Some(CadData {
                vertices,
                faces,
                latent_code: latent.to_vec(),
                dimensions: Dimensions {
                    length,
                    width,
                    height,
                },
                parts: parts.iter().map(|p| p.to_string()).collect(),
            }),
            mesh: Some(MeshData {
                cells,
                quality: MeshQuality::Pass,
                non_orthogonality,
                skewness,
                aspect_ratio,
                generated_at: generated_at.into(),
            }),
            cfd: Some(CfdData {
                drag_coefficient: drag,
                lift_coefficient: lift,
                inlet_velocity: inlet,
                frontal_area: area,
                convergence: ConvergenceProfile {
                    residual_decay: rd,
                    residual_scale: rs,
                    continuity_decay: cd,
                    continuity_scale: cs,
                }
                .series(),
            }),
        }
    }
}

fn builtin_designs() -> Vec<DesignRecord> {
    let seeds = [
        Seed {
            id: "design-001",
            name: "Aero-Estate 概念 A",
            vehicle_type: VehicleType::Estateback,
            description: "一款具有激进空气动力学轮廓和赛博朋克美学的流畅旅行轿跑。",
            image_id: 111,
            style: ("Cyberpunk", "Neon Blue", 482910, 7.5, 50),
            cad: (
                45200,
                89500,
                [0.12, -0.5, 0.88, 0.02],
                [4850.0, 1950.0, 1420.0],
                &["主底盘", "左前轮", "右前轮", "左后轮", "右后轮", "后扰流板"],
            ),
            mesh: (1_250_000, 45.2, 2.1, 12.4, "10:45:22"),
            cfd: (0.28, -0.05, 30.0, 2.34),
            convergence: [0.05, 0.1, 0.04, 0.5],
        },
        Seed {
            id: "design-002",
            name: "复古运动融合",
            vehicle_type: VehicleType::Sports,
            description: "融合了60年代经典跑车线条与现代减阻特性的设计。",
            image_id: 133,
            style: ("Vintage", "Metallic Red", 129384, 8.0, 45),
            cad: (
                52100,
                102000,
                [-0.8, 0.2, 0.1, -0.4],
                [4400.0, 1880.0, 1250.0],
                &["车身外壳", "驾驶舱玻璃", "排气管", "前保险杠"],
            ),
            mesh: (1_450_000, 48.5, 2.4, 15.1, "09:12:15"),
            cfd: (0.31, 0.02, 30.0, 2.10),
            convergence: [0.04, 0.2, 0.03, 0.6],
        },
        Seed {
            id: "design-003",
            name: "Eco-Hauler 通用平台",
            vehicle_type: VehicleType::Suv,
            description: "极简主义电动 SUV 设计，专注于通过低风阻最大化续航里程。",
            image_id: 183,
            style: ("Minimalist", "Matte White", 992831, 6.5, 40),
            cad: (
                61000,
                120000,
                [0.5, 0.5, -0.5, 0.9],
                [5100.0, 2050.0, 1750.0],
                &["单体壳", "电池包外壳", "低风阻轮毂"],
            ),
            mesh: (1_800_000, 42.1, 1.8, 10.5, "11:20:05"),
            cfd: (0.35, 0.01, 30.0, 2.85),
            convergence: [0.06, 0.15, 0.05, 0.4],
        },
        Seed {
            id: "design-004",
            name: "Hyper-Luxe GT",
            vehicle_type: VehicleType::Sedan,
            description: "配备主动空气动力学表面和流畅线条的豪华大型旅行车。",
            image_id: 234,
            style: ("Luxury", "Deep Black", 772819, 9.0, 60),
            cad: (
                49000,
                98000,
                [0.2, -0.2, 0.9, -0.1],
                [5050.0, 1980.0, 1380.0],
                &["车身主体", "主动尾翼", "后扩散器", "前铲"],
            ),
            mesh: (1_320_000, 44.0, 2.0, 11.2, "14:05:33"),
            cfd: (0.26, -0.08, 35.0, 2.25),
            convergence: [0.07, 0.12, 0.06, 0.3],
        },
    ];
    seeds.into_iter().map(Seed::into_record).collect()
}
