use std::env;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use chrono::{FixedOffset, NaiveTime};
use dotenvy::dotenv;

use crate::ledger::engine::DEFAULT_MAX_LEAVE_DAYS;
use crate::ledger::rules::{StatusRules, WeekendPolicy};
use crate::model::attendance::parse_civil_time;

/// Upper bound for `QR_TOKEN_TTL_SECS`: one day.
pub const MAX_QR_TOKEN_TTL_SECS: i64 = 86_400;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    /// MySQL backend; when unset the ledger lives in process memory.
    pub database_url: Option<String>,
    /// JSON file with `{"employees": [...]}` loaded into the directory sheet.
    pub seed_file: Option<String>,
    pub jwt_secret: String,
    pub api_prefix: String,

    pub ledger_table: String,
    pub directory_table: String,

    pub utc_offset: FixedOffset,
    pub status_rules: StatusRules,
    pub weekend: WeekendPolicy,
    pub max_leave_days: u32,

    pub qr_token_ttl_secs: i64,
    pub snapshot_ttl_secs: u64,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_scan_per_min: u32,
}

/// Named settings, read through a lookup function so tests can supply a map.
struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&self, key: &str) -> anyhow::Result<String> {
        (self.0)(key).with_context(|| format!("{key} must be set"))
    }

    fn or(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn parse<T>(&self, key: &str, default: &str) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.or(key, default);
        raw.trim()
            .parse()
            .map_err(|e| anyhow!("{key}={raw:?}: {e}"))
    }

    fn time(&self, key: &str, default: NaiveTime) -> anyhow::Result<NaiveTime> {
        match self.optional(key) {
            Some(raw) => parse_civil_time(&raw).with_context(|| format!("{key} must be HH:MM[:SS]")),
            None => Ok(default),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let vars = Vars(lookup);

        let defaults = StatusRules::default();
        let status_rules = StatusRules {
            half_day_from: vars.time("HALF_DAY_FROM", defaults.half_day_from)?,
            mini_half_day_from: vars.time("MINI_HALF_DAY_FROM", defaults.mini_half_day_from)?,
            full_day_until: vars.time("FULL_DAY_UNTIL", defaults.full_day_until)?,
            late_check_in_cutoff: vars
                .optional("LATE_CHECK_IN_CUTOFF")
                .map(|raw| parse_civil_time(&raw))
                .transpose()
                .context("LATE_CHECK_IN_CUTOFF must be HH:MM[:SS]")?,
        };
        if status_rules.mini_half_day_from > status_rules.half_day_from {
            return Err(anyhow!("MINI_HALF_DAY_FROM must not be later than HALF_DAY_FROM"));
        }

        let offset_minutes: i32 = vars.parse("UTC_OFFSET_MINUTES", "330")?; // IST
        let utc_offset = FixedOffset::east_opt(offset_minutes * 60)
            .ok_or_else(|| anyhow!("UTC_OFFSET_MINUTES out of range: {offset_minutes}"))?;

        let weekend = WeekendPolicy::parse(&vars.or("WEEKEND_DAYS", "Sat,Sun"))
            .map_err(|e| anyhow!("WEEKEND_DAYS: {e}"))?;

        let max_leave_days: u32 =
            vars.parse("MAX_LEAVE_DAYS", &DEFAULT_MAX_LEAVE_DAYS.to_string())?;
        if max_leave_days == 0 {
            return Err(anyhow!("MAX_LEAVE_DAYS must be at least 1"));
        }

        let qr_token_ttl_secs: i64 = vars.parse("QR_TOKEN_TTL_SECS", "300")?; // 5 min
        if !(1..=MAX_QR_TOKEN_TTL_SECS).contains(&qr_token_ttl_secs) {
            return Err(anyhow!(
                "QR_TOKEN_TTL_SECS must be between 1 and {MAX_QR_TOKEN_TTL_SECS}, got {qr_token_ttl_secs}"
            ));
        }

        Ok(Self {
            server_addr: vars.required("SERVER_ADDR")?,
            database_url: vars.optional("DATABASE_URL"),
            seed_file: vars.optional("SEED_FILE"),
            jwt_secret: vars.required("JWT_SECRET")?,
            api_prefix: vars.or("API_PREFIX", "/api"),

            ledger_table: vars.or("LEDGER_TABLE", "Attendance"),
            directory_table: vars.or("DIRECTORY_TABLE", "Person"),

            utc_offset,
            status_rules,
            weekend,
            max_leave_days,

            qr_token_ttl_secs,
            snapshot_ttl_secs: vars.parse("SNAPSHOT_TTL_SECS", "5")?,

            rate_protected_per_min: vars.parse("RATE_PROTECTED_PER_MIN", "1000")?,
            rate_scan_per_min: vars.parse("RATE_SCAN_PER_MIN", "60")?,
        })
    }
}
