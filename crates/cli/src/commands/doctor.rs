//! Doctor command - report what the server would start with

use anyhow::Result;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::args::DoctorArgs;
use crate::config::{AppConfig, VendorAppConfig, env_secret, env_value};

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    llm: CheckResult,
    database: CheckResult,
    oauth: CheckResult,
    instagram: CheckResult,
    overall: Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Ok,
    Warn,
    Error,
}

impl Status {
    fn symbol(self) -> &'static str {
        match self {
            Status::Ok => "✓",
            Status::Warn => "⚠",
            Status::Error => "✗",
        }
    }
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: Status,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    fn ok(message: impl Into<String>) -> Self {
        Self::new(Status::Ok, message)
    }

    fn warn(message: impl Into<String>) -> Self {
        Self::new(Status::Warn, message)
    }

    fn error(message: impl Into<String>) -> Self {
        Self::new(Status::Error, message)
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let not_checked = || CheckResult::error("Not checked");
    let mut report = DoctorReport {
        config: not_checked(),
        llm: not_checked(),
        database: not_checked(),
        oauth: not_checked(),
        instagram: not_checked(),
        overall: Status::Error,
    };

    match AppConfig::load(config_path.as_deref()) {
        Ok(config) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            report.llm = check_llm(&config);
            report.database = check_database(&config.general.database_path);
            report.oauth = check_oauth(&config);
            report.instagram = check_instagram(&config);
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
        }
    }

    let checks = [
        &report.config,
        &report.llm,
        &report.database,
        &report.oauth,
        &report.instagram,
    ];
    report.overall = if checks.iter().any(|c| c.status == Status::Error) {
        Status::Error
    } else if checks.iter().all(|c| c.status == Status::Ok) {
        Status::Ok
    } else {
        Status::Warn
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == Status::Error {
        std::process::exit(1);
    }

    Ok(())
}

fn check_llm(config: &AppConfig) -> CheckResult {
    let llm = &config.llm;
    let api_key_env = match llm.provider.as_str() {
        "openai" => &llm.openai.api_key_env,
        "groq" => &llm.groq.api_key_env,
        "stub" => return CheckResult::ok("Provider: stub (offline)"),
        "none" => return CheckResult::warn("No LLM provider; AI endpoints will return errors"),
        other => return CheckResult::error(format!("Unknown provider: {}", other)),
    };
    let model = llm.model_for(&llm.provider);

    if env_secret(api_key_env).is_some() {
        CheckResult::ok(format!(
            "Provider: {}, Model: {}, API key: {} (set)",
            llm.provider, model, api_key_env
        ))
    } else {
        CheckResult::warn(format!(
            "Provider: {}, Model: {}, API key: {} (not set)",
            llm.provider, model, api_key_env
        ))
    }
}

fn check_database(path: &Path) -> CheckResult {
    if path.is_file() {
        return CheckResult::ok(format!("Database: {}", path.display()));
    }
    if path.is_dir() {
        return CheckResult::error(format!("Database path is a directory: {}", path.display()));
    }
    CheckResult::warn(format!(
        "Database {} does not exist yet; run 'social-autopilot migrate' or start the server",
        path.display()
    ))
}

fn vendor_ready(vendor: &VendorAppConfig) -> bool {
    env_value(&vendor.client_id_env).is_some() && env_secret(&vendor.client_secret_env).is_some()
}

fn check_oauth(config: &AppConfig) -> CheckResult {
    let oauth = &config.oauth;
    let vendors = [
        ("facebook", &oauth.facebook),
        ("instagram", &oauth.instagram),
        ("tiktok", &oauth.tiktok),
        ("twitter", &oauth.twitter),
        ("youtube", &oauth.youtube),
    ];
    let (ready, missing): (Vec<_>, Vec<_>) = vendors.iter().partition(|(_, v)| vendor_ready(v));
    let ready: Vec<&str> = ready.iter().map(|(name, _)| *name).collect();
    let missing: Vec<&str> = missing.iter().map(|(name, _)| *name).collect();

    let details = json!({ "configured": ready, "missing": missing });
    if ready.is_empty() {
        CheckResult::warn("No OAuth app credentials set").with_details(details)
    } else {
        CheckResult::ok(format!("OAuth ready for: {}", ready.join(", "))).with_details(details)
    }
}

fn check_instagram(config: &AppConfig) -> CheckResult {
    let ig = &config.instagram;
    let account = env_value(&ig.account_id_env).is_some();
    let token = env_secret(&ig.page_token_env).is_some();

    match (account, token) {
        (true, true) => CheckResult::ok(format!("Graph proxy enabled ({})", ig.graph_url)),
        _ => CheckResult::warn(format!(
            "Graph proxy disabled: {} ({}), {} ({})",
            ig.account_id_env,
            if account { "set" } else { "not set" },
            ig.page_token_env,
            if token { "set" } else { "not set" },
        )),
    }
}

fn print_report(report: &DoctorReport) {
    println!("social-autopilot Doctor Report");
    println!("==============================");
    println!();

    print_check("Config", &report.config);
    print_check("LLM Provider", &report.llm);
    print_check("Database", &report.database);
    print_check("OAuth", &report.oauth);
    print_check("Instagram Graph", &report.instagram);

    println!();
    let overall = format!("{:?}", report.overall).to_uppercase();
    println!("{} Overall: {}", report.overall.symbol(), overall);

    if report.overall == Status::Ok {
        println!();
        println!("Ready to serve! Try: social-autopilot serve");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    println!("{} {}: {}", result.status.symbol(), name, result.message);
}
