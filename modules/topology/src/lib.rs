//! Static lab-topology registry: hosts and their network-role addresses.
//!
//! The table is authored by hand, loaded once, and read-only afterwards.
//! Loading either fully succeeds or fails without leaving a registry behind.

mod error;
mod load;
mod model;
mod registry;

pub use error::{ParseRoleError, TopologyError};
pub use model::{HostTopologyRecord, Role};
pub use registry::TopologyRegistry;

/// Canonical sample table in the on-disk CSV encoding.
pub const SAMPLE_TABLE: &str = "\
host_id, ipmi, hypervisor_host, fw_eth0, fw_eth1, mgmt_wan, vcenter, dc, fw_bluex_wan, fw_bluex_lan
super27, 192.168.3.177, 192.168.3.227, 192.168.3.37, 10.0.17.2, 10.0.17.100, 10.0.17.3, 10.0.17.4, 10.0.17.200, 10.0.5.2
";
