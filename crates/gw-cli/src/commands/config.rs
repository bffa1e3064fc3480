use std::path::Path;

use gw_simulation::SimConfig;

pub fn print_default() -> Result<(), String> {
    let json = serde_json::to_string_pretty(&SimConfig::default())
        .map_err(|e| format!("cannot serialize config: {e}"))?;
    println!("{json}");
    Ok(())
}

/// Read a config file; fields it omits keep their defaults.
pub fn load(path: &Path) -> Result<SimConfig, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid config {}: {e}", path.display()))
}
