//! Immutable lookup views over a loaded topology table.

use std::collections::HashMap;
use std::io::Read;
use std::net::Ipv4Addr;
use std::path::Path;

use labmap_core::HostId;
use regex::Regex;

use crate::error::TopologyError;
use crate::load;
use crate::model::{HostTopologyRecord, Role};

/// The loaded table. Records keep their source-row order; lookups by id go
/// through an index built at load time. There are no write operations.
#[derive(Debug, Clone)]
pub struct TopologyRegistry {
    records: Vec<HostTopologyRecord>,
    index: HashMap<String, usize>,
}

impl TopologyRegistry {
    /// Load and validate a table from a CSV file.
    pub fn load_path(path: impl AsRef<Path>) -> Result<Self, TopologyError> {
        Self::from_records(load::from_path(path.as_ref())?)
    }

    /// Load and validate a table from any reader.
    pub fn load_reader<R: Read>(reader: R) -> Result<Self, TopologyError> {
        Self::from_records(load::from_reader(reader)?)
    }

    fn from_records(records: Vec<HostTopologyRecord>) -> Result<Self, TopologyError> {
        let mut index = HashMap::with_capacity(records.len());
        for (i, rec) in records.iter().enumerate() {
            if index.insert(rec.host_id.0.clone(), i).is_some() {
                return Err(TopologyError::DuplicateKey {
                    host_id: rec.host_id.0.clone(),
                });
            }
        }
        Ok(TopologyRegistry { records, index })
    }

    pub fn get(&self, host_id: &str) -> Result<&HostTopologyRecord, TopologyError> {
        self.index
            .get(host_id)
            .map(|&i| &self.records[i])
            .ok_or_else(|| TopologyError::NotFound {
                host_id: host_id.to_string(),
            })
    }

    /// Hosts that define `role`, as `(host_id, address)` pairs in source-row
    /// order. The iterator borrows the registry; call again to restart.
    pub fn list_by_role(&self, role: Role) -> impl Iterator<Item = (&HostId, Ipv4Addr)> + '_ {
        self.records
            .iter()
            .filter_map(move |rec| rec.address(role).map(|addr| (&rec.host_id, addr)))
    }

    /// All records in source-row order.
    pub fn hosts(&self) -> impl Iterator<Item = &HostTopologyRecord> {
        self.records.iter()
    }

    /// Records whose host id matches `pattern`, in source-row order.
    pub fn search<'a>(&'a self, pattern: &'a Regex) -> impl Iterator<Item = &'a HostTopologyRecord> + 'a {
        self.records
            .iter()
            .filter(move |rec| pattern.is_match(rec.host_id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SAMPLE_TABLE;

    fn sample() -> TopologyRegistry {
        TopologyRegistry::load_reader(SAMPLE_TABLE.as_bytes()).unwrap()
    }

    #[test]
    fn get_returns_the_source_row() {
        let reg = sample();
        let rec = reg.get("super27").unwrap();
        assert_eq!(rec.host_id.as_str(), "super27");
        assert_eq!(
            rec.address(Role::DirectoryController),
            Some("10.0.17.4".parse().unwrap())
        );
    }

    #[test]
    fn get_unknown_host_is_not_found() {
        let reg = sample();
        match reg.get("nonexistent") {
            Err(TopologyError::NotFound { host_id }) => assert_eq!(host_id, "nonexistent"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn list_by_role_yields_the_single_ipmi_pair() {
        let reg = sample();
        let pairs: Vec<_> = reg
            .list_by_role(Role::Ipmi)
            .map(|(id, addr)| (id.to_string(), addr.to_string()))
            .collect();
        assert_eq!(pairs, vec![("super27".to_string(), "192.168.3.177".to_string())]);
    }

    #[test]
    fn list_by_role_is_restartable() {
        let reg = sample();
        assert_eq!(reg.list_by_role(Role::Ipmi).count(), 1);
        assert_eq!(reg.list_by_role(Role::Ipmi).count(), 1);
    }

    #[test]
    fn list_by_role_skips_hosts_without_the_role() {
        let table = "host_id, ipmi, vcenter\n\
                     super27, 192.168.3.177, 10.0.17.3\n\
                     super28, , 10.0.17.5\n";
        let reg = TopologyRegistry::load_reader(table.as_bytes()).unwrap();
        let ids: Vec<_> = reg.list_by_role(Role::Ipmi).map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids, vec!["super27"]);
        let ids: Vec<_> = reg
            .list_by_role(Role::VirtualizationManager)
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(ids, vec!["super27", "super28"]);
    }

    #[test]
    fn duplicate_host_id_fails_regardless_of_order() {
        for table in [
            "host_id, ipmi\nsuper27, 10.0.0.1\nsuper28, 10.0.0.2\nsuper27, 10.0.0.3\n",
            "host_id, ipmi\nsuper27, 10.0.0.3\nsuper27, 10.0.0.1\nsuper28, 10.0.0.2\n",
        ] {
            match TopologyRegistry::load_reader(table.as_bytes()) {
                Err(TopologyError::DuplicateKey { host_id }) => assert_eq!(host_id, "super27"),
                other => panic!("expected DuplicateKey, got {other:?}"),
            }
        }
    }

    #[test]
    fn load_failure_leaves_no_registry() {
        let res = TopologyRegistry::load_reader("host_id, ipmi\nsuper27, bad\n".as_bytes());
        assert!(res.is_err());
    }

    #[test]
    fn hosts_preserve_source_order() {
        let table = "host_id, ipmi\nzeta, 10.0.0.1\nalpha, 10.0.0.2\n";
        let reg = TopologyRegistry::load_reader(table.as_bytes()).unwrap();
        let ids: Vec<_> = reg.hosts().map(|r| r.host_id.to_string()).collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
    }

    #[test]
    fn search_matches_case_insensitively_when_asked() {
        let table = "host_id, ipmi\nsuper27, 10.0.0.1\nblade01, 10.0.0.2\n";
        let reg = TopologyRegistry::load_reader(table.as_bytes()).unwrap();
        let re = Regex::new("(?i)SUPER").unwrap();
        let ids: Vec<_> = reg.search(&re).map(|r| r.host_id.to_string()).collect();
        assert_eq!(ids, vec!["super27"]);
    }

    #[test]
    fn missing_file_surfaces_io_error() {
        assert!(matches!(
            TopologyRegistry::load_path("/nonexistent/topology.csv"),
            Err(TopologyError::Io(_))
        ));
    }
}
