//! Session commands: login, logout, whoami, register.

use std::fmt::Write as _;

use secrecy::ExposeSecret;

use branchwatch_config::ConfigError;
use branchwatch_core::{Dashboard, LoginForm, RegisterForm, Role, User};

use super::util;
use crate::cli::{GlobalOpts, LoginArgs, RegisterArgs, RoleArg};
use crate::config;
use crate::error::CliError;
use crate::output;

fn detail(user: &User) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Name:  {}", user.display_name());
    let _ = writeln!(out, "Email: {}", user.email);
    if let Some(ref role) = user.role {
        let _ = writeln!(out, "Role:  {role}");
    }
    out.trim_end().to_owned()
}

// ── Login ───────────────────────────────────────────────────────────

pub async fn login(
    dashboard: &Dashboard,
    args: LoginArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let (profile_name, profile) = config::active_profile(global, &cfg)?;

    let email = match args.email.or(profile.email.clone()) {
        Some(email) => email,
        None if util::interactive() => util::prompt_text("Email", true)?,
        None => {
            return Err(CliError::Validation {
                field: "email".into(),
                reason: "pass --email or set one on the profile".into(),
            });
        }
    };

    let password = if args.password_stdin {
        util::read_stdin_line()?
    } else {
        match branchwatch_config::resolve_password(&profile, &profile_name) {
            Ok(secret) => secret.expose_secret().to_owned(),
            Err(ConfigError::NoCredentials { .. }) if util::interactive() => {
                rpassword::prompt_password("Password: ").map_err(util::prompt_err)?
            }
            Err(e) => return Err(e.into()),
        }
    };

    let user = dashboard
        .login(&LoginForm::new(email, password))
        .await
        .map_err(util::core(global))?;

    if !global.quiet {
        eprintln!("Logged in as {} ({profile_name})", user.display_name());
    }
    Ok(())
}

// ── Logout ──────────────────────────────────────────────────────────

pub async fn logout(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    if !dashboard.is_logged_in() {
        if !global.quiet {
            eprintln!("Not logged in");
        }
        return Ok(());
    }
    dashboard.logout().await.map_err(util::core(global))?;
    if !global.quiet {
        eprintln!("Logged out");
    }
    Ok(())
}

// ── Whoami ──────────────────────────────────────────────────────────

pub fn whoami(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    if !dashboard.is_logged_in() {
        return Err(CliError::NotLoggedIn);
    }
    let user = dashboard.current_user().unwrap_or_default();
    let out = output::render_single(&global.output, &user, detail, |u| u.email.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Register ────────────────────────────────────────────────────────

fn role(arg: RoleArg) -> Role {
    match arg {
        RoleArg::Admin => Role::Admin,
        RoleArg::RestaurantOwner => Role::RestaurantOwner,
        RoleArg::BranchManager => Role::BranchManager,
    }
}

pub async fn register(
    dashboard: &Dashboard,
    args: RegisterArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let ask = util::interactive();
    let field = |value: Option<String>, label: &str| -> Result<String, CliError> {
        match value {
            Some(v) => Ok(v),
            None if ask => util::prompt_text(label, true),
            None => Ok(String::new()),
        }
    };

    let mut form = RegisterForm {
        email: field(args.email, "Email")?,
        first_name: field(args.first_name, "First name")?,
        last_name: field(args.last_name, "Last name")?,
        role: role(args.role),
        ..RegisterForm::default()
    };

    if args.password_stdin {
        form.password = util::read_stdin_line()?;
        form.password2.clone_from(&form.password);
    } else if ask {
        form.password = util::prompt_secret("Password", Some("Repeat password"), true)?;
        form.password2.clone_from(&form.password);
    }

    let user = dashboard
        .register(&form)
        .await
        .map_err(util::core(global))?;

    let out = output::render_single(&global.output, &user, detail, |u| u.email.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
