use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ipnet::Ipv4Net;
use regex::Regex;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use topology::{HostTopologyRecord, Role, TopologyRegistry};
use tracing::debug;

mod config;

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| String::new())
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat { Text, Json, Jsonl }

fn format_from_name(name: &str) -> OutputFormat {
    match name {
        "json" => OutputFormat::Json,
        "jsonl" => OutputFormat::Jsonl,
        _ => OutputFormat::Text,
    }
}

#[derive(Debug, Parser)]
#[command(name = "labmap", version, about = "Lab topology registry: host and role address lookups")]
struct Cli {
    /// Optional config file (YAML). If omitted, loads ./labmap.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Topology table (CSV). Overrides the config file; defaults to ./topology.csv.
    #[arg(long, global = true, value_name = "FILE")]
    topology: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// List every host in the table
    Hosts {
        /// Keep hosts with at least one address inside this network (e.g., 10.0.17.0/24)
        #[arg(long, value_name = "CIDR")]
        within: Option<Ipv4Net>,
        /// Output format: text, json, or jsonl
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Output file (overwrites). Stdout if omitted.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Write the canonical CSV encoding when --out is provided
        #[arg(long, default_value_t = false)]
        csv: bool,
    },
    /// Show one host record
    Get {
        host_id: String,
        /// Output format: text or json
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List (host, address) pairs for a network role
    Role {
        /// Role name or column token (e.g., ipmi, vcenter, directory-controller)
        role: String,
        /// Output format: text, json, or jsonl
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Output file (overwrites). Stdout if omitted.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Case-insensitive regex search over host ids
    Search {
        pattern: String,
        /// Output format: text, json, or jsonl
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Validate the table and report the record count
    Check,
    /// Print the canonical sample table
    Sample,
}

fn load_registry(path: &Path) -> Result<TopologyRegistry> {
    TopologyRegistry::load_path(path).map_err(|e| anyhow!("{}: {}", path.display(), e))
}

fn host_json(rec: &HostTopologyRecord) -> serde_json::Value {
    let roles: serde_json::Map<String, serde_json::Value> = rec
        .role_addresses
        .iter()
        .map(|(role, addr)| (role.as_str().to_string(), serde_json::Value::String(addr.to_string())))
        .collect();
    serde_json::json!({ "host_id": rec.host_id.to_string(), "roles": roles })
}

fn print_host_table(records: &[&HostTopologyRecord]) {
    if records.is_empty() {
        println!("no hosts");
        return;
    }
    println!("{:<14} {:<24} {}", "HOST", "ROLE", "ADDRESS");
    for rec in records {
        for (role, addr) in &rec.role_addresses {
            println!("{:<14} {:<24} {}", rec.host_id, role.as_str(), addr);
        }
    }
    println!("Total: {} hosts", records.len());
}

fn write_line(out: Option<&Path>, line: &str) -> Result<()> {
    if let Some(path) = out {
        let file = OpenOptions::new().create(true).truncate(true).write(true).open(path)?;
        let mut w = BufWriter::new(file);
        writeln!(w, "{}", line)?;
    } else {
        println!("{}", line);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let loaded_cfg = config::load_config(cli.config.as_deref());

    let topology_path: PathBuf = cli
        .topology
        .clone()
        .or_else(|| loaded_cfg.as_ref().and_then(|c| c.topology.clone()))
        .unwrap_or_else(|| PathBuf::from("topology.csv"));

    match cli.command {
        Commands::Version => {
            println!("labmap {} (core {})", env!("CARGO_PKG_VERSION"), labmap_core::version());
        }
        Commands::Sample => {
            print!("{}", topology::SAMPLE_TABLE);
        }
        Commands::Check => {
            let reg = load_registry(&topology_path)?;
            println!("ok: {} hosts ({})", reg.len(), topology_path.display());
        }
        Commands::Hosts { mut within, mut format, out, csv } => {
            if let Some(cfg) = &loaded_cfg { if let Some(h) = &cfg.hosts {
                if within.is_none() {
                    if let Some(w) = &h.within {
                        within = Some(w.parse().map_err(|e| anyhow!("config hosts.within: {}", e))?);
                    }
                }
                if let Some(f) = &h.format { format = format_from_name(f); }
            }}
            debug!(path = %topology_path.display(), "loading topology table");
            let reg = load_registry(&topology_path)?;
            let records: Vec<&HostTopologyRecord> = match &within {
                Some(net) => reg.hosts().filter(|r| r.within(net)).collect(),
                None => reg.hosts().collect(),
            };

            if csv {
                if let Some(path) = out {
                    let mut wtr = csv::Writer::from_writer(std::fs::File::create(&path)?);
                    let mut header = vec!["host_id".to_string()];
                    header.extend(Role::ALL.iter().map(|r| r.column().to_string()));
                    wtr.write_record(&header)?;
                    for rec in &records {
                        let mut row = vec![rec.host_id.to_string()];
                        row.extend(Role::ALL.iter().map(|r| {
                            rec.address(*r).map(|a| a.to_string()).unwrap_or_default()
                        }));
                        wtr.write_record(&row)?;
                    }
                    wtr.flush()?;
                    return Ok(());
                } else {
                    println!("--csv requires --out <file>");
                }
            }

            match format {
                OutputFormat::Text => print_host_table(&records),
                OutputFormat::Json => {
                    let obj = serde_json::json!({
                        "generated_at": now_rfc3339(),
                        "source": topology_path.display().to_string(),
                        "hosts": records.iter().map(|r| host_json(r)).collect::<Vec<_>>(),
                    });
                    write_line(out.as_deref(), &serde_json::to_string(&obj)?)?;
                }
                OutputFormat::Jsonl => {
                    if let Some(path) = out {
                        let file = OpenOptions::new().create(true).truncate(true).write(true).open(&path)?;
                        let mut w = BufWriter::new(file);
                        for rec in &records {
                            writeln!(w, "{}", serde_json::to_string(&host_json(rec))?)?;
                        }
                    } else {
                        for rec in &records {
                            println!("{}", serde_json::to_string(&host_json(rec))?);
                        }
                    }
                }
            }
        }
        Commands::Get { host_id, format } => {
            let reg = load_registry(&topology_path)?;
            let rec = reg.get(&host_id)?;
            match format {
                OutputFormat::Text => {
                    println!("{:<24}: {}", "host", rec.host_id);
                    for (role, addr) in &rec.role_addresses {
                        println!("{:<24}: {}", role.as_str(), addr);
                    }
                }
                OutputFormat::Json | OutputFormat::Jsonl => {
                    println!("{}", serde_json::to_string(&host_json(rec))?);
                }
            }
        }
        Commands::Role { role, mut format, out } => {
            if let Some(cfg) = &loaded_cfg { if let Some(r) = &cfg.role {
                if let Some(f) = &r.format { format = format_from_name(f); }
            }}
            let role: Role = role.parse()?;
            let reg = load_registry(&topology_path)?;
            let pairs: Vec<(String, String)> = reg
                .list_by_role(role)
                .map(|(id, addr)| (id.to_string(), addr.to_string()))
                .collect();
            match format {
                OutputFormat::Text => {
                    println!("hosts with role {} ({}):", role.as_str(), pairs.len());
                    for (id, addr) in &pairs {
                        println!("{:<14} {}", id, addr);
                    }
                }
                OutputFormat::Json => {
                    let obj = serde_json::json!({
                        "role": role.as_str(),
                        "hosts": pairs
                            .iter()
                            .map(|(id, addr)| serde_json::json!({ "host_id": id, "address": addr }))
                            .collect::<Vec<_>>(),
                    });
                    write_line(out.as_deref(), &serde_json::to_string(&obj)?)?;
                }
                OutputFormat::Jsonl => {
                    if let Some(path) = out {
                        let file = OpenOptions::new().create(true).truncate(true).write(true).open(&path)?;
                        let mut w = BufWriter::new(file);
                        for (id, addr) in &pairs {
                            let obj = serde_json::json!({ "host_id": id, "address": addr, "role": role.as_str() });
                            writeln!(w, "{}", serde_json::to_string(&obj)?)?;
                        }
                    } else {
                        for (id, addr) in &pairs {
                            let obj = serde_json::json!({ "host_id": id, "address": addr, "role": role.as_str() });
                            println!("{}", serde_json::to_string(&obj)?);
                        }
                    }
                }
            }
        }
        Commands::Search { pattern, format } => {
            let re = Regex::new(&format!("(?i){}", pattern))
                .map_err(|e| anyhow!("invalid pattern: {}", e))?;
            let reg = load_registry(&topology_path)?;
            let matches: Vec<&HostTopologyRecord> = reg.search(&re).collect();
            match format {
                OutputFormat::Text => print_host_table(&matches),
                OutputFormat::Json => {
                    let obj = serde_json::json!({
                        "pattern": pattern,
                        "hosts": matches.iter().map(|r| host_json(r)).collect::<Vec<_>>(),
                    });
                    println!("{}", serde_json::to_string(&obj)?);
                }
                OutputFormat::Jsonl => {
                    for rec in &matches {
                        println!("{}", serde_json::to_string(&host_json(rec))?);
                    }
                }
            }
        }
    }
    Ok(())
}
