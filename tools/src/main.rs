//! escalation-runner: headless command-line front end for the escalation engine.
//!
//! Usage:
//!   escalation-runner file       --db cases.db --json complaint.json
//!   escalation-runner trigger    --db cases.db --complaint CMP-1 [--only golden_hour]
//!   escalation-runner status     --db cases.db --complaint CMP-1
//!   escalation-runner alert      --db cases.db --complaint CMP-1 --authority DGP_OFFICE --message "..."
//!   escalation-runner respond    --db cases.db --action 7 --result SUCCESS [--reference REF]
//!   escalation-runner transition --db cases.db --complaint CMP-1 --to IN_PROCESS
//!
//! Common flags:
//!   --config escalation.json     thresholds and contact directory (defaults built in)
//!   --gateway-email URL          deliver through an HTTP gateway instead of the log
//!   --gateway-sms URL            (both gateway URLs are required together)
//!
//! The gateway bearer token is read from ESCALATION_GATEWAY_TOKEN.

use anyhow::{anyhow, bail, Context, Result};
use escalation_core::{
    case::Complaint,
    clock::SystemClock,
    config::EscalationConfig,
    store::CaseStore,
    transport::{HttpGatewayTransport, LogTransport, NotificationTransport},
    types::{BankActionId, BankActionStatus, CaseStatus},
    AlertKind, EscalationEngine,
};
use serde_json::json;
use std::env;
use std::sync::Arc;

const TOKEN_VAR: &str = "ESCALATION_GATEWAY_TOKEN";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");
    if matches!(command, "help" | "--help" | "-h") {
        print_usage();
        return Ok(());
    }

    let db = flag(&args, "--db").unwrap_or("cases.db");
    let config = match flag(&args, "--config") {
        Some(path) => EscalationConfig::load(path)?,
        None => EscalationConfig::default(),
    };

    let store = Arc::new(CaseStore::open(db).with_context(|| format!("opening {db}"))?);
    store.migrate()?;
    let transport = build_transport(&args, &config)?;
    log::info!("escalation-runner: db={db} transport={}", transport.name());

    let engine = EscalationEngine::new(store, transport, Arc::new(SystemClock), config);

    let output = match command {
        "file" => {
            let path = required(&args, "--json")?;
            let content =
                std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            let complaint: Complaint = serde_json::from_str(&content)?;
            engine.store().insert_complaint(&complaint)?;
            json!({ "filed": complaint.complaint_id })
        }
        "trigger" => {
            let complaint_id = required(&args, "--complaint")?;
            match flag(&args, "--only") {
                Some(name) => {
                    let kind = AlertKind::parse(name)
                        .ok_or_else(|| anyhow!("unknown alert kind '{name}'"))?;
                    let outcome = engine.trigger_single(complaint_id, kind)?;
                    json!({ "complaint_id": complaint_id, "alert": kind, "outcome": outcome })
                }
                None => {
                    let report = engine.trigger_alerts(complaint_id)?;
                    json!({
                        "complaint_id": complaint_id,
                        "alerts": report.as_map(),
                        "summary": report.summary(),
                        "cancelled": report.cancelled,
                    })
                }
            }
        }
        "status" => {
            let complaint_id = required(&args, "--complaint")?;
            json!({
                "alert_status": engine.alert_status(complaint_id)?,
                "bank_actions": engine.store().bank_actions_for(complaint_id)?,
                "activities": engine.store().activities_for(complaint_id)?,
            })
        }
        "alert" => {
            let complaint_id = required(&args, "--complaint")?;
            let delivery = engine.send_manual_alert(
                complaint_id,
                required(&args, "--authority")?,
                required(&args, "--message")?,
            )?;
            serde_json::to_value(delivery)?
        }
        "respond" => {
            let action_id: BankActionId = required(&args, "--action")?
                .parse()
                .context("--action must be a bank action id")?;
            let status: BankActionStatus = required(&args, "--result")?.parse()?;
            let action =
                engine.record_bank_response(action_id, status, flag(&args, "--reference"))?;
            serde_json::to_value(action)?
        }
        "transition" => {
            let complaint_id = required(&args, "--complaint")?;
            let to: CaseStatus = required(&args, "--to")?.parse()?;
            let from = engine.transition_status(complaint_id, to)?;
            json!({ "complaint_id": complaint_id, "from": from, "to": to })
        }
        other => {
            print_usage();
            bail!("unknown command '{other}'");
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn build_transport(
    args: &[String],
    config: &EscalationConfig,
) -> Result<Arc<dyn NotificationTransport>> {
    match (flag(args, "--gateway-email"), flag(args, "--gateway-sms")) {
        (Some(email), Some(sms)) => {
            let mut gateway = HttpGatewayTransport::new(email, sms, config.transport.timeout())?;
            if let Ok(token) = env::var(TOKEN_VAR) {
                gateway = gateway.with_bearer_token(token);
            }
            Ok(Arc::new(gateway))
        }
        (None, None) => Ok(Arc::new(LogTransport)),
        _ => bail!("--gateway-email and --gateway-sms must be given together"),
    }
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

fn required<'a>(args: &'a [String], name: &str) -> Result<&'a str> {
    flag(args, name).ok_or_else(|| anyhow!("missing {name}"))
}

fn print_usage() {
    println!("escalation-runner <file|trigger|status|alert|respond|transition> [flags]");
    println!("  --db PATH               case database (default cases.db)");
    println!("  --config PATH           JSON configuration");
    println!("  --gateway-email URL     HTTP gateway endpoint for email");
    println!("  --gateway-sms URL       HTTP gateway endpoint for SMS");
    println!("  --complaint ID          complaint to act on");
    println!("  --only KIND             trigger a single rule (e.g. golden_hour, bank_freeze)");
    println!("  --json PATH             complaint record to file");
    println!("  --authority NAME        CYBER_CELL | I4C_NATIONAL | DGP_OFFICE | RBI_NODAL");
    println!("  --message TEXT          manual alert body");
    println!("  --action ID             bank action id");
    println!("  --result STATUS         SUCCESS | FAILED");
    println!("  --reference REF         bank reference number");
    println!("  --to STATUS             target case status");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flag_takes_the_following_argument() {
        let a = args(&["escalation-runner", "status", "--db", "x.db", "--complaint", "CMP-1"]);
        assert_eq!(flag(&a, "--db"), Some("x.db"));
        assert_eq!(flag(&a, "--complaint"), Some("CMP-1"));
        assert_eq!(flag(&a, "--config"), None);
    }

    #[test]
    fn trailing_flag_without_value_is_absent() {
        let a = args(&["escalation-runner", "trigger", "--complaint"]);
        assert_eq!(flag(&a, "--complaint"), None);
        let err = required(&a, "--complaint").unwrap_err();
        assert_eq!(err.to_string(), "missing --complaint");
    }

    #[test]
    fn no_gateway_logs_messages() {
        let a = args(&["escalation-runner", "status"]);
        let transport = build_transport(&a, &EscalationConfig::default()).unwrap();
        assert_eq!(transport.name(), "log");
    }

    #[test]
    fn both_gateway_urls_select_http() {
        let a = args(&[
            "escalation-runner",
            "trigger",
            "--gateway-email",
            "http://127.0.0.1:9/email",
            "--gateway-sms",
            "http://127.0.0.1:9/sms",
        ]);
        let transport = build_transport(&a, &EscalationConfig::default()).unwrap();
        assert_eq!(transport.name(), "http-gateway");
    }

    #[test]
    fn one_gateway_url_is_rejected() {
        for only in ["--gateway-email", "--gateway-sms"] {
            let a = args(&["escalation-runner", "trigger", only, "http://127.0.0.1:9/x"]);
            let err = build_transport(&a, &EscalationConfig::default()).err().unwrap();
            assert!(err.to_string().contains("must be given together"), "{only}: {err}");
        }
    }
}
