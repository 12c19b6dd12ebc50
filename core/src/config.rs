//! Escalation configuration: thresholds and contact directories.
//!
//! Injected into the engine at construction. `EscalationConfig::default()`
//! carries the built-in Odisha directory; deployments override any section
//! from a JSON file via [`EscalationConfig::load`].

use crate::error::{EscalationError, EscalationResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Amount at or above which senior officials are alerted.
pub const HIGH_AMOUNT_THRESHOLD: f64 = 100_000.0;
pub const GOLDEN_HOUR_MINUTES: i64 = 60;
pub const PATTERN_WINDOW_DAYS: i64 = 7;
/// Other complaints (excluding the current one) needed to call it a pattern.
/// Two others means three complaints in total against the same account.
pub const PATTERN_MIN_PRIOR_COMPLAINTS: u32 = 2;
pub const TRANSPORT_TIMEOUT_MS: u64 = 5_000;
/// Upper bounds accepted from configuration files.
pub const MAX_GOLDEN_HOUR_MINUTES: i64 = 24 * 60;
pub const MAX_PATTERN_WINDOW_DAYS: i64 = 366;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    pub thresholds: AlertThresholds,
    pub authorities: AuthorityDirectory,
    pub banks: BankDirectory,
    pub routing: DistrictRouting,
    pub identity: SenderIdentity,
    pub transport: TransportConfig,
}

impl EscalationConfig {
    /// Load a JSON config file. Missing sections keep their defaults.
    pub fn load(path: &str) -> EscalationResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EscalationError::Config(format!("Cannot read {path}: {e}")))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> EscalationResult<Self> {
        let config: EscalationConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> EscalationResult<()> {
        let t = &self.thresholds;
        if !(t.high_amount.is_finite() && t.high_amount >= 0.0) {
            return Err(EscalationError::Config(format!(
                "high_amount must be a non-negative amount, got {}",
                t.high_amount
            )));
        }
        if !(1..=MAX_GOLDEN_HOUR_MINUTES).contains(&t.golden_hour_minutes) {
            return Err(EscalationError::Config(format!(
                "golden_hour_minutes must be between 1 and {MAX_GOLDEN_HOUR_MINUTES}, got {}",
                t.golden_hour_minutes
            )));
        }
        if !(1..=MAX_PATTERN_WINDOW_DAYS).contains(&t.pattern_window_days) {
            return Err(EscalationError::Config(format!(
                "pattern_window_days must be between 1 and {MAX_PATTERN_WINDOW_DAYS}, got {}",
                t.pattern_window_days
            )));
        }
        if t.pattern_min_prior == 0 {
            return Err(EscalationError::Config(
                "pattern_min_prior must be at least 1".to_string(),
            ));
        }
        if self.transport.timeout_ms == 0 {
            return Err(EscalationError::Config("transport timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub high_amount: f64,
    pub golden_hour_minutes: i64,
    pub pattern_window_days: i64,
    pub pattern_min_prior: u32,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            high_amount: HIGH_AMOUNT_THRESHOLD,
            golden_hour_minutes: GOLDEN_HOUR_MINUTES,
            pattern_window_days: PATTERN_WINDOW_DAYS,
            pattern_min_prior: PATTERN_MIN_PRIOR_COMPLAINTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorityContact {
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub sms_number: Option<String>,
    #[serde(default)]
    pub api_endpoint: Option<String>,
}

impl AuthorityContact {
    fn new(email: &str, phone: &str) -> Self {
        Self {
            email: email.to_string(),
            phone: phone.to_string(),
            sms_number: None,
            api_endpoint: None,
        }
    }

    /// Where SMS alerts go: the short code when one exists, else the phone.
    pub fn sms_destination(&self) -> &str {
        self.sms_number.as_deref().unwrap_or(&self.phone)
    }
}

/// Named authorities a manual alert may be addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Authority {
    CyberCell,
    #[serde(rename = "I4C_NATIONAL")]
    National,
    #[serde(rename = "DGP_OFFICE")]
    SeniorOffice,
    #[serde(rename = "RBI_NODAL")]
    Regulator,
}

impl Authority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Authority::CyberCell => "CYBER_CELL",
            Authority::National => "I4C_NATIONAL",
            Authority::SeniorOffice => "DGP_OFFICE",
            Authority::Regulator => "RBI_NODAL",
        }
    }

    pub fn parse(name: &str) -> EscalationResult<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "CYBER_CELL" => Ok(Authority::CyberCell),
            "I4C_NATIONAL" => Ok(Authority::National),
            "DGP_OFFICE" => Ok(Authority::SeniorOffice),
            "RBI_NODAL" => Ok(Authority::Regulator),
            _ => Err(EscalationError::UnknownAuthority { name: name.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityDirectory {
    /// State cyber cell; also receives golden-hour SMS on its short code.
    pub cyber_cell: AuthorityContact,
    /// National cybercrime coordination centre.
    pub national: AuthorityContact,
    /// Senior officials (DGP office).
    pub senior_office: AuthorityContact,
    /// Banking regulator; fallback for banks with no nodal officer on file.
    pub regulator: AuthorityContact,
}

impl AuthorityDirectory {
    pub fn contact(&self, authority: Authority) -> &AuthorityContact {
        match authority {
            Authority::CyberCell => &self.cyber_cell,
            Authority::National => &self.national,
            Authority::SeniorOffice => &self.senior_office,
            Authority::Regulator => &self.regulator,
        }
    }
}

impl Default for AuthorityDirectory {
    fn default() -> Self {
        let mut cyber_cell = AuthorityContact::new("cybercell.odisha@police.gov.in", "+91-674-2536672");
        cyber_cell.sms_number = Some("9437001930".to_string());
        let mut national = AuthorityContact::new("complaints@cybercrime.gov.in", "1930");
        national.api_endpoint = Some("https://api.cybercrime.gov.in/v1/alerts".to_string());
        Self {
            cyber_cell,
            national,
            senior_office: AuthorityContact::new("dgp.odisha@police.gov.in", "+91-674-2393999"),
            regulator: AuthorityContact::new("cybersecurity@rbi.org.in", "1800-111-333"),
        }
    }
}

/// Bank nodal-officer directory, keyed by upper-cased bank name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BankDirectory {
    pub nodal_officers: HashMap<String, String>,
}

impl BankDirectory {
    /// Nodal officer for `bank`, or `fallback` when the bank is unknown or absent.
    pub fn nodal_email<'a>(&'a self, bank: Option<&str>, fallback: &'a str) -> &'a str {
        bank.map(|b| b.trim().to_uppercase())
            .and_then(|key| self.nodal_officers.get(&key))
            .map(String::as_str)
            .unwrap_or(fallback)
    }
}

impl Default for BankDirectory {
    fn default() -> Self {
        let nodal_officers = [
            ("STATE BANK OF INDIA", "cyberfraud.nodal@sbi.co.in"),
            ("HDFC BANK", "cybersecurity@hdfcbank.com"),
            ("ICICI BANK", "cybercell@icicibank.com"),
            ("AXIS BANK", "fraudmonitoring@axisbank.com"),
            ("PNB", "cyberfraud@pnb.co.in"),
        ]
        .into_iter()
        .map(|(bank, email)| (bank.to_string(), email.to_string()))
        .collect();
        Self { nodal_officers }
    }
}

/// District-derived mailboxes: `ps.<district>@<police_station_domain>` and
/// `cybercell.<district>@<cyber_cell_domain>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistrictRouting {
    pub police_station_domain: String,
    pub cyber_cell_domain: String,
    pub case_portal_url: String,
}

impl DistrictRouting {
    pub fn police_station_email(&self, district: &str) -> Option<String> {
        district_slug(district).map(|d| format!("ps.{d}@{}", self.police_station_domain))
    }

    pub fn district_cyber_cell_email(&self, district: &str) -> Option<String> {
        district_slug(district).map(|d| format!("cybercell.{d}@{}", self.cyber_cell_domain))
    }

    pub fn case_url(&self, complaint_id: &str) -> String {
        format!("{}/case/{complaint_id}", self.case_portal_url.trim_end_matches('/'))
    }
}

impl Default for DistrictRouting {
    fn default() -> Self {
        Self {
            police_station_domain: "odisha.gov.in".to_string(),
            cyber_cell_domain: "police.gov.in".to_string(),
            case_portal_url: "https://cyberfraud.odisha.gov.in".to_string(),
        }
    }
}

/// Lower-cased district with inner whitespace collapsed to `_`. None for a blank district.
fn district_slug(district: &str) -> Option<String> {
    let slug = district
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_");
    (!slug.is_empty()).then_some(slug)
}

/// Who the engine speaks as.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderIdentity {
    pub from_address: String,
    pub requesting_authority: String,
    pub state: String,
}

impl Default for SenderIdentity {
    fn default() -> Self {
        Self {
            from_address: "cyberfraud@odisha.gov.in".to_string(),
            requesting_authority: "Odisha Police Cyber Cell".to_string(),
            state: "ODISHA".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Upper bound on a single email/SMS send before it counts as failed.
    pub timeout_ms: u64,
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { timeout_ms: TRANSPORT_TIMEOUT_MS }
    }
}
