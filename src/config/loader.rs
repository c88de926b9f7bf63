use std::path::Path;

use anyhow::Context;

use super::types::Config;

/// Load configuration from a `.dockhand` YAML file in the given directory.
///
/// Returns `Ok(None)` when no file exists; malformed YAML is an error.
pub fn load(dir: &Path) -> anyhow::Result<Option<Config>> {
    let path = dir.join(".dockhand");
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(config))
}
