//! OSRM dataset preparation (download + preprocess through docker).
//!
//! Used by the integration tests to stand up a local routing backend for the
//! fleet's service area.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::error::DatasetError;

const OSRM_IMAGE: &str = "osrm/osrm-backend";

#[derive(Debug, Clone)]
pub struct GeofabrikRegion {
    /// Geofabrik region path, e.g. "asia/gcc-states".
    pub path: String,
}

impl GeofabrikRegion {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Extract covering Riyadh and the other Gulf states.
    pub fn gcc_states() -> Self {
        Self::new("asia/gcc-states")
    }

    pub fn name(&self) -> &str {
        self.path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("region")
    }

    pub fn url(&self) -> String {
        format!("https://download.geofabrik.de/{}-latest.osm.pbf", self.path)
    }
}

#[derive(Debug, Clone)]
pub struct OsrmDatasetConfig {
    pub region: GeofabrikRegion,
    pub data_root: PathBuf,
    /// Lua profile shipped in the image, e.g. "car".
    pub profile: String,
}

impl OsrmDatasetConfig {
    pub fn new(region: GeofabrikRegion, data_root: impl Into<PathBuf>) -> Self {
        Self {
            region,
            data_root: data_root.into(),
            profile: "car".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmDataset {
    pub data_dir: PathBuf,
    pub osrm_base: PathBuf,
    pub pbf_path: PathBuf,
}

impl OsrmDataset {
    /// Downloads and preprocesses the region for the MLD algorithm, skipping
    /// steps whose outputs already exist.
    pub fn ensure(config: &OsrmDatasetConfig) -> Result<Self, DatasetError> {
        let region = config.region.name();
        let data_root = if config.data_root.is_absolute() {
            config.data_root.clone()
        } else {
            std::env::current_dir()?.join(&config.data_root)
        };
        let data_dir = data_root.join(region);
        fs::create_dir_all(&data_dir)?;

        let pbf_path = data_dir.join(format!("{}-latest.osm.pbf", region));
        if !pbf_path.exists() {
            info!(url = %config.region.url(), "downloading extract");
            download(&config.region.url(), &pbf_path)?;
        }

        let osrm_base = data_dir.join(format!("{}-latest.osrm", region));
        let dataset = Self {
            data_dir,
            osrm_base,
            pbf_path,
        };

        if !dataset.osrm_base.exists() {
            let profile = format!("/opt/{}.lua", config.profile);
            let pbf = dataset.container_path(&dataset.pbf_path);
            dataset.run_step(&["osrm-extract", "-p", &profile, &pbf])?;
        }

        if !dataset.mld_ready() {
            let base = dataset.container_path(&dataset.osrm_base);
            dataset.run_step(&["osrm-partition", &base])?;
            dataset.run_step(&["osrm-customize", &base])?;
        }

        Ok(dataset)
    }

    /// File name of the `.osrm` base as seen inside the container.
    pub fn container_base(&self) -> String {
        self.container_path(&self.osrm_base)
    }

    fn container_path(&self, path: &Path) -> String {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        format!("/data/{}", name)
    }

    fn mld_ready(&self) -> bool {
        ["osrm.partition", "osrm.mldgr", "osrm.cells"]
            .iter()
            .all(|extension| self.osrm_base.with_extension(extension).exists())
            && self.osrm_base.exists()
    }

    fn run_step(&self, args: &[&str]) -> Result<(), DatasetError> {
        info!(step = args[0], "preparing OSRM dataset");
        let status = Command::new("docker")
            .args(["run", "--rm", "-t", "-v"])
            .arg(format!("{}:/data", self.data_dir.display()))
            .arg(OSRM_IMAGE)
            .args(args)
            .status()?;

        if status.success() {
            Ok(())
        } else {
            Err(DatasetError::ProcessFailure(format!(
                "{} exited with status {}",
                args[0], status
            )))
        }
    }
}

fn download(url: &str, dest: &Path) -> Result<(), DatasetError> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let tmp_path = dest.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    writer.write_all(&response.bytes()?)?;
    writer.flush()?;
    fs::rename(tmp_path, dest)?;
    Ok(())
}
