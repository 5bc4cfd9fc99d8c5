//! Mints development tokens signed with the configured secret.
//!
//! ```bash
//! cargo run -p scoop-api --bin issue-token -- --sub s-centro --role seller --branch centro
//! cargo run -p scoop-api --bin issue-token -- --sub root --role admin
//! ```

use std::env;

use anyhow::{bail, Context};

use scoop_api::{ApiConfig, JwtManager};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut sub = None;
    let mut role = None;
    let mut branch = None;

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match args[i].as_str() {
            "--sub" | "-s" => sub = value,
            "--role" | "-r" => role = value,
            "--branch" | "-b" => branch = value,
            "--help" | "-h" => {
                println!("Usage: issue-token --sub <STAFF_ID> --role <ROLE> [--branch <BRANCH_ID>]");
                println!();
                println!("Roles: admin, branch_manager, seller");
                return Ok(());
            }
            other => bail!("unknown argument: {}", other),
        }
        i += 2;
    }

    let sub = sub.context("--sub is required")?;
    let role = role.context("--role is required")?;
    if role != "admin" && branch.is_none() {
        bail!("--branch is required for role {}", role);
    }

    let config = ApiConfig::load().context("loading configuration")?;
    let jwt = JwtManager::new(&config.jwt_secret, config.token_lifetime_secs);
    let token = jwt.issue(&sub, &role, branch.as_deref())?;

    println!("{}", token);
    Ok(())
}
