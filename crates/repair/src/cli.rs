use casting_core::mapping::{parse_mapping, RoleMapping};
use clap::Parser;

/// Find and repair submissions and bookings that reference deleted roles.
///
/// Without arguments the tool scans, proposes mappings by role name, lets
/// you confirm or override each one, and asks before writing anything.
#[derive(Debug, Parser)]
#[command(name = "role-repair", version, about)]
pub struct RepairArgs {
    /// Apply a single mapping without prompting, e.g. `--quick old123:new456`.
    #[arg(long, value_name = "OLD:NEW", value_parser = parse_quick)]
    pub quick: Option<RoleMapping>,
}

fn parse_quick(raw: &str) -> Result<RoleMapping, String> {
    parse_mapping(raw).map_err(|e| e.to_string())
}
