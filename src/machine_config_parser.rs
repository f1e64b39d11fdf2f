use crate::error::Result;
use crate::machine_config::MachineConfig;
use std::fs::File;
use std::io::BufReader;
use tracing::debug;

/// Reads a JSON machine description. Missing keys keep their defaults.
pub fn read_config(file_name: &str) -> Result<MachineConfig>
{
    let file = File::open(file_name)?;
    let reader = BufReader::new(file);
    let config: MachineConfig = serde_json::from_reader(reader)?;
    config.validate()?;
    debug!("Loaded machine config from {}", file_name);
    Ok(config)
}

pub fn parse_config(json: &str) -> Result<MachineConfig>
{
    let config: MachineConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}
