//! Doctor command - verify configuration and knowledge sources.

use crate::cli::output::mask_secret;
use crate::cli::Output;
use crate::config::Settings;
use crate::knowledge::{parse_products, read_document_text, read_narrative_text};
use console::style;
use std::fs::File;
use std::path::PathBuf;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Print a titled group of checks.
fn section(title: &str, checks: &[CheckResult]) {
    println!("{}", style(title).bold());
    for check in checks {
        check.print();
    }
    println!();
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Luch Doctor");
    println!();
    println!("Checking configuration and knowledge sources...\n");

    let mut checks = Vec::new();

    let model_checks = check_model(settings);
    section("Model", &model_checks);
    checks.extend(model_checks);

    let notify_checks = check_notifications(settings);
    section("Notifications", &notify_checks);
    checks.extend(notify_checks);

    let source_checks = check_sources(settings);
    section("Knowledge Sources", &source_checks);
    checks.extend(source_checks);

    let config_checks = vec![check_config_file(), check_prompt_file(settings)];
    section("Configuration", &config_checks);
    checks.extend(config_checks);

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Luch.",
            errors
        ));
        anyhow::bail!("{} doctor check(s) failed", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Luch is ready to use.");
    }

    Ok(())
}

/// Check model credentials and endpoint.
fn check_model(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    match settings.model.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => results.push(CheckResult::ok(
            "AI_API_KEY",
            &format!("configured ({})", mask_secret(key)),
        )),
        _ => results.push(CheckResult::error(
            "AI_API_KEY",
            "not set",
            "Set with: export AI_API_KEY='...' (or add it to .env)",
        )),
    }

    match settings.model.base_url.as_deref() {
        Some(base_url) => match url::Url::parse(base_url) {
            Ok(_) => results.push(CheckResult::ok(
                "Model",
                &format!("{} at {}", settings.model.model, base_url),
            )),
            Err(e) => results.push(CheckResult::error(
                "Model",
                &format!("invalid base URL '{}': {}", base_url, e),
                "Set model.base_url or AI_BASE_URL to a full URL",
            )),
        },
        None => results.push(CheckResult::ok(
            "Model",
            &format!("{} (provider default endpoint)", settings.model.model),
        )),
    }

    if settings.model.max_rounds == 0 {
        results.push(CheckResult::error(
            "Tool rounds",
            "model.max_rounds is 0",
            "Set model.max_rounds to at least 1",
        ));
    }

    if settings.model.round_timeout_secs == 0 {
        results.push(CheckResult::error(
            "Round timeout",
            "model.round_timeout_secs is 0",
            "Set model.round_timeout_secs to at least 1",
        ));
    }

    results
}

/// Check the notification server and topic.
fn check_notifications(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    match url::Url::parse(&settings.notify.server) {
        Ok(_) => results.push(CheckResult::ok("Server", &settings.notify.server)),
        Err(e) => results.push(CheckResult::error(
            "Server",
            &format!("invalid URL '{}': {}", settings.notify.server, e),
            "Set notify.server or NTFY_SERVER to a full URL",
        )),
    }

    match settings.notify.topic.as_deref() {
        Some(topic) if !topic.trim().is_empty() => {
            results.push(CheckResult::ok("NTFY_TOPIC", topic))
        }
        _ => results.push(CheckResult::error(
            "NTFY_TOPIC",
            "not set",
            "Set with: export NTFY_TOPIC='my-topic'",
        )),
    }

    results
}

/// Check each configured knowledge source by actually reading it.
fn check_sources(settings: &Settings) -> Vec<CheckResult> {
    let sources = &settings.sources;
    vec![
        check_source("Products", sources.products_path(), |path| {
            let products = parse_products(File::open(path)?)?;
            Ok(format!("{} products", products.len()))
        }),
        check_source("Document", sources.document_path(), |path| {
            Ok(format!("{} chars of text", read_document_text(path)?.chars().count()))
        }),
        check_source("Company text", sources.text_path(), |path| {
            Ok(format!("{} chars of text", read_narrative_text(path)?.chars().count()))
        }),
    ]
}

fn check_source<F>(name: &str, path: Option<PathBuf>, read: F) -> CheckResult
where
    F: FnOnce(&std::path::Path) -> crate::Result<String>,
{
    let Some(path) = path else {
        return CheckResult::warning(
            name,
            "not configured",
            "The agent will answer without this source",
        );
    };

    if !path.is_file() {
        return CheckResult::warning(
            name,
            &format!("{} not found", path.display()),
            "The agent will answer without it. Fix the path under [sources] in the config file",
        );
    }

    match read(&path) {
        Ok(summary) => CheckResult::ok(name, &format!("{} ({})", path.display(), summary)),
        Err(e) => CheckResult::error(
            name,
            &format!("{}: {}", path.display(), e),
            "The file exists but could not be read",
        ),
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: luch config init",
        )
    }
}

/// Check the custom system prompt file, if any.
fn check_prompt_file(settings: &Settings) -> CheckResult {
    match settings.system_prompt_path() {
        Some(path) if path.is_file() => {
            CheckResult::ok("System prompt", &format!("{}", path.display()))
        }
        Some(path) => CheckResult::error(
            "System prompt",
            &format!("{} not found", path.display()),
            "Fix prompts.system_prompt_file or remove it to use the built-in prompt",
        ),
        None => CheckResult::ok("System prompt", "built-in"),
    }
}
