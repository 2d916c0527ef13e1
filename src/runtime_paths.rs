use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

fn platform_app_root() -> PathBuf {
    if let Some(project_dirs) = ProjectDirs::from("", "", "chat-relay") {
        return project_dirs.data_dir().to_path_buf();
    }

    if let Some(base_dirs) = BaseDirs::new() {
        return base_dirs.data_local_dir().join("chat-relay");
    }

    std::env::temp_dir().join("chat-relay")
}

pub fn app_root() -> PathBuf {
    platform_app_root()
}

/// Default location of the persisted daily prompt quota.
pub fn default_quota_path() -> PathBuf {
    app_root().join("data").join("quota.json")
}
