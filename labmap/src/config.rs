use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, Clone)]
pub struct HostsConfig {
    pub format: Option<String>,
    pub within: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct RoleConfig {
    pub format: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    pub topology: Option<PathBuf>,
    pub hosts: Option<HostsConfig>,
    pub role: Option<RoleConfig>,
}

pub fn load_config(path: Option<&Path>) -> Option<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new("labmap.yaml");
            if p.exists() { p.to_path_buf() } else { return None; }
        }
    };
    let s = fs::read_to_string(path).ok()?;
    serde_yaml::from_str(&s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let cfg: Config = serde_yaml::from_str(
            "topology: lab/topology.csv\nhosts:\n  format: json\n  within: 10.0.17.0/24\nrole:\n  format: jsonl\n",
        )
        .unwrap();
        assert_eq!(cfg.topology.as_deref(), Some(Path::new("lab/topology.csv")));
        assert_eq!(cfg.hosts.as_ref().unwrap().format.as_deref(), Some("json"));
        assert_eq!(cfg.hosts.as_ref().unwrap().within.as_deref(), Some("10.0.17.0/24"));
        assert_eq!(cfg.role.as_ref().unwrap().format.as_deref(), Some("jsonl"));
    }

    #[test]
    fn sections_are_optional() {
        let cfg: Config = serde_yaml::from_str("topology: topology.csv\n").unwrap();
        assert!(cfg.hosts.is_none());
        assert!(cfg.role.is_none());
    }
}
