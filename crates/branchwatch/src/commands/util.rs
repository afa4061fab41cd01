//! Shared helpers for command handlers.

use std::io::{self, BufRead, IsTerminal};

use dialoguer::{Confirm, Input, Password};

use branchwatch_core::{BranchFields, CoreError, FormField};

use crate::cli::{BranchFieldArgs, GlobalOpts};
use crate::error::CliError;

/// `map_err` adapter that knows the configured timeout.
pub fn core(global: &GlobalOpts) -> impl Fn(CoreError) -> CliError + '_ {
    move |e| CliError::from_core(e, global.timeout)
}

/// Whether prompts can be shown.
pub fn interactive() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal and without `--yes` the action is refused.
pub fn confirm(action: &str, message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !interactive() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Free-text prompt. Empty answers are allowed for optional fields.
pub fn prompt_text(label: &str, required: bool) -> Result<String, CliError> {
    Input::<String>::new()
        .with_prompt(label)
        .allow_empty(!required)
        .interact_text()
        .map_err(prompt_err)
}

/// Hidden prompt, optionally asking twice.
pub fn prompt_secret(
    label: &str,
    confirm_label: Option<&str>,
    required: bool,
) -> Result<String, CliError> {
    let mut prompt = Password::new()
        .with_prompt(label)
        .allow_empty_password(!required);
    if let Some(again) = confirm_label {
        prompt = prompt.with_confirmation(again, "Passwords do not match");
    }
    prompt.interact().map_err(prompt_err)
}

/// First line of stdin, without its line ending.
pub fn read_stdin_line() -> Result<String, CliError> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

/// Collect branch fields from flags, prompting for the rest when a
/// terminal is attached.
///
/// Without a terminal, missing fields stay empty and validation reports
/// them.
pub fn branch_fields(args: BranchFieldArgs) -> Result<BranchFields, CliError> {
    let ask = interactive();
    let fill = |value: Option<String>, field: FormField| -> Result<String, CliError> {
        match value {
            Some(v) => Ok(v),
            None if !ask => Ok(String::new()),
            None if field.is_secret() => prompt_secret(field.label(), None, false),
            None => prompt_text(field.label(), field.is_required()),
        }
    };

    Ok(BranchFields {
        name: fill(args.branch_name, FormField::BranchName)?,
        address: fill(args.address, FormField::Address)?,
        notification_email: fill(args.notification_email, FormField::NotificationEmail)?,
        telegram_username: fill(args.telegram_username, FormField::TelegramUsername)?,
        yemeksepeti_url: fill(args.yemeksepeti_url, FormField::YemeksepetiUrl)?,
        getir_url: fill(args.getir_url, FormField::GetirUrl)?,
        migros_api_key: fill(args.migros_api_key, FormField::MigrosApiKey)?,
        migros_restaurant_id: fill(args.migros_restaurant_id, FormField::MigrosRestaurantId)?,
        trendyol_supplier_id: fill(args.trendyol_supplier_id, FormField::TrendyolSupplierId)?,
        trendyol_api_key: fill(args.trendyol_api_key, FormField::TrendyolApiKey)?,
        trendyol_api_secret: fill(args.trendyol_api_secret, FormField::TrendyolApiSecret)?,
    })
}
