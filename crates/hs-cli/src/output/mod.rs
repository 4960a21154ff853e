//! Output formatting utilities for the CLI
//!
//! Tables for step status and WireGuard peers, plus colored status lines.

use tabled::{settings::Style, Table, Tabled};

use hs_orchestrator::{StepDescriptor, StepState};
use hs_wireguard::WireGuardInterface;

/// Format step states as a table
pub fn format_steps(steps: &[(&StepDescriptor, StepState)]) -> String {
    #[derive(Tabled)]
    struct StepRow {
        #[tabled(rename = "STEP")]
        id: &'static str,
        #[tabled(rename = "NAME")]
        name: &'static str,
        #[tabled(rename = "STATE")]
        state: String,
        #[tabled(rename = "OPTIONAL")]
        optional: &'static str,
    }

    let rows: Vec<StepRow> = steps
        .iter()
        .map(|(step, state)| StepRow {
            id: step.id,
            name: step.name,
            state: state.to_string(),
            optional: if step.optional { "yes" } else { "" },
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format an interface and its peers
///
/// Only public material is shown; keys stay in the store and exported files.
pub fn format_interface(iface: &WireGuardInterface) -> String {
    let mut output = format!(
        "{}  address {}  port {}  endpoint {}\n",
        iface.name,
        iface.address,
        iface.listen_port,
        iface.endpoint_host.as_deref().unwrap_or("-"),
    );

    if iface.peers.is_empty() {
        output.push_str("No peers");
        return output;
    }

    #[derive(Tabled)]
    struct PeerRow {
        #[tabled(rename = "PEER")]
        name: String,
        #[tabled(rename = "ADDRESS")]
        address: String,
        #[tabled(rename = "ALLOWED IPS")]
        allowed_ips: String,
        #[tabled(rename = "PSK")]
        psk: &'static str,
        #[tabled(rename = "KEEPALIVE")]
        keepalive: String,
        #[tabled(rename = "PUBLIC KEY")]
        public_key: String,
    }

    let rows: Vec<PeerRow> = iface
        .peers
        .iter()
        .map(|p| PeerRow {
            name: p.name.clone(),
            address: p.address.to_string(),
            allowed_ips: p
                .allowed_ips
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            psk: if p.preshared_key.is_some() { "yes" } else { "no" },
            keepalive: p
                .keepalive
                .map(|k| format!("{}s", k))
                .unwrap_or_else(|| "-".to_string()),
            public_key: p.public_key.as_str().to_string(),
        })
        .collect();

    output.push_str(&Table::new(rows).with(Style::rounded()).to_string());
    output
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix to stderr
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow to stderr
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_orchestrator::StepRegistry;

    #[test]
    fn test_format_steps() {
        let registry = StepRegistry::standard();
        let rows: Vec<_> = registry
            .steps()
            .iter()
            .map(|s| (s, if s.id == "preflight" { StepState::Completed } else { StepState::Pending }))
            .collect();

        let table = format_steps(&rows);
        assert!(table.contains("STEP"));
        assert!(table.contains("Preflight checks"));
        assert!(table.contains("completed"));
        assert!(table.contains("wireguard"));
    }
}
