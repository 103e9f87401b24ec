//! Data model: network roles and per-host address records.

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnet::Ipv4Net;
use labmap_core::HostId;

use crate::error::ParseRoleError;

/// Network roles a lab host can expose, one per address column of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Ipmi,
    HypervisorHost,
    FirewallWan,
    FirewallLan,
    ManagementWorkstation,
    VirtualizationManager,
    DirectoryController,
    SecondaryFirewallWan,
    SecondaryFirewallLan,
}

impl Role {
    /// All roles, in canonical column order.
    pub const ALL: [Role; 9] = [
        Role::Ipmi,
        Role::HypervisorHost,
        Role::FirewallWan,
        Role::FirewallLan,
        Role::ManagementWorkstation,
        Role::VirtualizationManager,
        Role::DirectoryController,
        Role::SecondaryFirewallWan,
        Role::SecondaryFirewallLan,
    ];

    /// Canonical header token in the CSV encoding.
    pub const fn column(self) -> &'static str {
        match self {
            Role::Ipmi => "ipmi",
            Role::HypervisorHost => "hypervisor_host",
            Role::FirewallWan => "fw_eth0",
            Role::FirewallLan => "fw_eth1",
            Role::ManagementWorkstation => "mgmt_wan",
            Role::VirtualizationManager => "vcenter",
            Role::DirectoryController => "dc",
            Role::SecondaryFirewallWan => "fw_bluex_wan",
            Role::SecondaryFirewallLan => "fw_bluex_lan",
        }
    }

    /// Human-readable role name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Ipmi => "ipmi",
            Role::HypervisorHost => "hypervisor-host",
            Role::FirewallWan => "firewall-wan",
            Role::FirewallLan => "firewall-lan",
            Role::ManagementWorkstation => "management-workstation",
            Role::VirtualizationManager => "virtualization-manager",
            Role::DirectoryController => "directory-controller",
            Role::SecondaryFirewallWan => "secondary-firewall-wan",
            Role::SecondaryFirewallLan => "secondary-firewall-lan",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    /// Accepts the canonical column token, the human-readable name, and the
    /// display aliases used in hand-authored tables (e.g. `dc1`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ipmi" => Ok(Role::Ipmi),
            "hypervisor_host" | "hypervisor-host" => Ok(Role::HypervisorHost),
            "fw_eth0" | "firewall-wan" | "fw-wan" => Ok(Role::FirewallWan),
            "fw_eth1" | "firewall-lan" | "fw-lan" => Ok(Role::FirewallLan),
            "mgmt_wan" | "management-workstation" | "mgmt" => Ok(Role::ManagementWorkstation),
            "vcenter" | "virtualization-manager" => Ok(Role::VirtualizationManager),
            "dc" | "dc1" | "directory-controller" => Ok(Role::DirectoryController),
            "fw_bluex_wan" | "secondary-firewall-wan" => Ok(Role::SecondaryFirewallWan),
            "fw_bluex_lan" | "secondary-firewall-lan" => Ok(Role::SecondaryFirewallLan),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// One row of the topology table: a host and the addresses it holds per role.
/// Roles the host does not define are absent from the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTopologyRecord {
    pub host_id: HostId,
    pub role_addresses: BTreeMap<Role, Ipv4Addr>,
}

impl HostTopologyRecord {
    pub fn address(&self, role: Role) -> Option<Ipv4Addr> {
        self.role_addresses.get(&role).copied()
    }

    /// True when at least one of the host's addresses falls inside `net`.
    pub fn within(&self, net: &Ipv4Net) -> bool {
        self.role_addresses.values().any(|ip| net.contains(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_canonical_tokens() {
        for role in Role::ALL {
            assert_eq!(role.column().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn role_parses_display_names_and_aliases() {
        assert_eq!("directory-controller".parse::<Role>().unwrap(), Role::DirectoryController);
        assert_eq!("dc1".parse::<Role>().unwrap(), Role::DirectoryController);
        assert_eq!("DC1".parse::<Role>().unwrap(), Role::DirectoryController);
        assert_eq!(" mgmt ".parse::<Role>().unwrap(), Role::ManagementWorkstation);
    }

    #[test]
    fn role_rejects_unknown_tokens() {
        let err = "uplink".parse::<Role>().unwrap_err();
        assert_eq!(err, ParseRoleError("uplink".to_string()));
    }

    #[test]
    fn record_within_checks_any_address() {
        let mut role_addresses = BTreeMap::new();
        role_addresses.insert(Role::Ipmi, "192.168.3.177".parse().unwrap());
        role_addresses.insert(Role::DirectoryController, "10.0.17.4".parse().unwrap());
        let rec = HostTopologyRecord { host_id: "super27".into(), role_addresses };

        let mgmt: Ipv4Net = "10.0.17.0/24".parse().unwrap();
        let other: Ipv4Net = "172.16.0.0/12".parse().unwrap();
        assert!(rec.within(&mgmt));
        assert!(!rec.within(&other));
    }
}
