use std::path::PathBuf;

/// Where the tool looks for things. Production always uses
/// [`Config::default`]; nothing here is user-configurable.
#[derive(Debug, Clone)]
pub struct Config {
    /// DRM device class, one `cardN` entry per GPU
    pub drm_class_dir: PathBuf,
    /// `amdgpu.ppfeaturemask` module parameter
    pub feature_mask_path: PathBuf,
    /// Process name of the companion daemon
    pub daemon_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drm_class_dir: PathBuf::from("/sys/class/drm"),
            feature_mask_path: PathBuf::from("/sys/module/amdgpu/parameters/ppfeaturemask"),
            daemon_name: "corectrl_helper".to_string(),
        }
    }
}
