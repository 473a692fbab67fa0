use crate::tracker::TrackerParams;
use std::fs;
use std::path::Path;

/// Read [`TrackerParams`] from a JSON file; missing fields keep their defaults.
pub fn load_tracker_params(path: &Path) -> Result<TrackerParams, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let params: TrackerParams = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(params)
}
