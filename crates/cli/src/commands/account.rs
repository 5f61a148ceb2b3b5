//! Account commands.
//!
//! # Usage
//!
//! ```bash
//! bazaar register --username anna --email anna@example.com --password 's3cret-pass' --password2 's3cret-pass'
//! bazaar login -u anna -p 's3cret-pass'
//! bazaar whoami
//! bazaar profile --phone '+7 900 000-00-00' --address 'Lenina 1'
//! bazaar logout
//! ```

use std::io::Write;

use bazaar_core::{Email, KeyValueStore};
use bazaar_storefront::models::{Credentials, ProfileUpdate, Registration, User};
use bazaar_storefront::services::auth::AuthError;
use bazaar_storefront::state::AppState;
use clap::Args;
use secrecy::SecretString;

use super::CliError;

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(short, long)]
    pub username: String,

    #[arg(short, long)]
    pub email: String,

    #[arg(long, default_value = "")]
    pub first_name: String,

    #[arg(long, default_value = "")]
    pub last_name: String,

    #[arg(short, long)]
    pub password: String,

    /// Password confirmation
    #[arg(long)]
    pub password2: String,
}

#[derive(Args, Default)]
pub struct ProfileArgs {
    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub address: Option<String>,
}

impl ProfileArgs {
    fn into_update(self) -> Result<ProfileUpdate, AuthError> {
        Ok(ProfileUpdate {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email.as_deref().map(Email::parse).transpose()?,
            phone_number: self.phone,
            address: self.address,
        })
    }
}

pub async fn login<S: KeyValueStore + Clone>(
    state: &mut AppState<S>,
    out: &mut impl Write,
    username: String,
    password: String,
) -> Result<(), CliError> {
    let credentials = Credentials::new(username, password);
    let user = state.session_mut().login(&credentials).await?;

    writeln!(out, "Signed in as {}.", user.full_name())?;
    Ok(())
}

pub fn logout<S: KeyValueStore + Clone>(
    state: &mut AppState<S>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    state.session_mut().logout();
    writeln!(out, "Signed out.")?;
    Ok(())
}

pub async fn register<S: KeyValueStore + Clone>(
    state: &AppState<S>,
    out: &mut impl Write,
    args: RegisterArgs,
) -> Result<(), CliError> {
    let registration = Registration {
        username: args.username,
        email: Email::parse(&args.email).map_err(AuthError::from)?,
        first_name: args.first_name,
        last_name: args.last_name,
        password: SecretString::from(args.password),
        password2: SecretString::from(args.password2),
    };

    state.session().register(&registration).await?;

    writeln!(
        out,
        "Account {} created. Sign in with `bazaar login -u {}`.",
        registration.username, registration.username
    )?;
    Ok(())
}

pub async fn whoami<S: KeyValueStore + Clone>(
    state: &mut AppState<S>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if !state.session().is_authenticated() {
        writeln!(out, "Not signed in.")?;
        return Ok(());
    }

    let user = state.session_mut().load_user().await?;
    write_user(out, user)?;
    Ok(())
}

pub async fn profile<S: KeyValueStore + Clone>(
    state: &mut AppState<S>,
    out: &mut impl Write,
    args: ProfileArgs,
) -> Result<(), CliError> {
    let update = args.into_update()?;
    if update.is_empty() {
        writeln!(out, "Nothing to update.")?;
        return Ok(());
    }

    let user = state.session_mut().update_profile(&update).await?;

    writeln!(out, "Profile updated.")?;
    write_user(out, user)?;
    Ok(())
}

fn write_user(out: &mut impl Write, user: &User) -> std::io::Result<()> {
    writeln!(out, "{} ({})", user.full_name(), user.username)?;
    if !user.email.is_empty() {
        writeln!(out, "Email: {}", user.email)?;
    }

    if let Some(profile) = &user.profile {
        if let Some(phone) = profile.phone_number.as_deref().filter(|p| !p.is_empty()) {
            writeln!(out, "Phone: {phone}")?;
        }
        if let Some(address) = profile.address.as_deref().filter(|a| !a.is_empty()) {
            writeln!(out, "Address: {address}")?;
        }
    }

    Ok(())
}
