//! CSV loader for the topology table.
//!
//! Input is a header row naming the roles, then one row per host. `#` lines
//! are comments, cells are trimmed, and an empty cell leaves that role
//! undefined for the host.

use std::collections::BTreeMap;
use std::io::Read;
use std::net::Ipv4Addr;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::error::TopologyError;
use crate::model::{HostTopologyRecord, Role};

const KEY_COLUMN: &str = "host_id";

pub(crate) fn from_path(path: &Path) -> Result<Vec<HostTopologyRecord>, TopologyError> {
    let file = std::fs::File::open(path)?;
    let records = from_reader(file)?;
    debug!(hosts = records.len(), path = %path.display(), "loaded topology table");
    Ok(records)
}

pub(crate) fn from_reader<R: Read>(reader: R) -> Result<Vec<HostTopologyRecord>, TopologyError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(reader);

    let roles = parse_header(rdr.headers()?)?;
    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        records.push(parse_row(&row, &roles)?);
    }
    Ok(records)
}

/// The first column must be the host id; every other column names a role,
/// each at most once. Column order is not significant.
fn parse_header(header: &StringRecord) -> Result<Vec<Role>, TopologyError> {
    let malformed = |reason: String| TopologyError::MalformedRecord { line: 1, reason };

    let mut fields = header.iter();
    match fields.next() {
        Some(first) if first.eq_ignore_ascii_case(KEY_COLUMN) || first.eq_ignore_ascii_case("host") => {}
        Some(first) => {
            return Err(malformed(format!(
                "first column must be {KEY_COLUMN}, got {first:?}"
            )))
        }
        None => return Err(malformed("empty header".to_string())),
    }

    let mut roles = Vec::new();
    for field in fields {
        let role: Role = field
            .parse()
            .map_err(|e| malformed(format!("unknown role column: {e}")))?;
        if roles.contains(&role) {
            return Err(malformed(format!("role column repeated: {role}")));
        }
        roles.push(role);
    }
    Ok(roles)
}

fn parse_row(row: &StringRecord, roles: &[Role]) -> Result<HostTopologyRecord, TopologyError> {
    let line = row.position().map(|p| p.line()).unwrap_or(0);
    let malformed = |reason: String| TopologyError::MalformedRecord { line, reason };

    if row.len() != roles.len() + 1 {
        return Err(malformed(format!(
            "expected {} fields, got {}",
            roles.len() + 1,
            row.len()
        )));
    }

    let host_id = row.get(0).unwrap_or_default();
    if host_id.is_empty() {
        return Err(malformed("missing host id".to_string()));
    }

    let mut role_addresses = BTreeMap::new();
    for (role, cell) in roles.iter().zip(row.iter().skip(1)) {
        if cell.is_empty() {
            continue;
        }
        let addr: Ipv4Addr = cell
            .parse()
            .map_err(|_| malformed(format!("{cell:?} is not an IPv4 address ({role} column)")))?;
        role_addresses.insert(*role, addr);
    }

    Ok(HostTopologyRecord {
        host_id: host_id.into(),
        role_addresses,
    })
}
