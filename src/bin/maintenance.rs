use std::env;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use signflow::{
    config::AppConfig,
    db,
    domain::normalize_api_token,
    store::{CompanyChanges, CompanyStore, PgStore},
};

const USAGE: &str = "Usage: maintenance <command>\n\
    \n\
    Commands:\n  \
      list-companies\n  \
      rotate-token <company-id> <token>\n  \
      clear-token <company-id>";

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("list-companies") => list_companies(),
        Some("rotate-token") => {
            let company_id = args.next().context(USAGE)?;
            let token = args.next().context(USAGE)?;
            let token = normalize_api_token(&token).map_err(|err| anyhow::anyhow!("{err}"))?;
            set_token(&company_id, Some(token))
        }
        Some("clear-token") => {
            let company_id = args.next().context(USAGE)?;
            set_token(&company_id, None)
        }
        Some(cmd) => {
            eprintln!("Unknown command: {cmd}\n{USAGE}");
            std::process::exit(1);
        }
        None => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }
}

fn open_store() -> Result<PgStore> {
    let config = AppConfig::from_env()?;
    let pool = db::init_pool_with_size(&config.database_url, 1)?;
    Ok(PgStore::new(pool))
}

fn list_companies() -> Result<()> {
    let store = open_store()?;
    let companies = store.list().context("failed to load companies")?;
    if companies.is_empty() {
        println!("No companies found.");
        return Ok(());
    }
    for company in companies {
        let token = if company.provider_token().is_some() {
            "token set"
        } else {
            "no token"
        };
        println!("{}  {}  <{}>  {token}", company.id, company.name, company.email);
    }
    Ok(())
}

fn set_token(raw_id: &str, token: Option<String>) -> Result<()> {
    let company_id = Uuid::parse_str(raw_id).context("company id must be a UUID")?;
    let store = open_store()?;
    let cleared = token.is_none();
    let changes = CompanyChanges {
        api_token: Some(token),
        ..CompanyChanges::default()
    };
    let Some(company) = store
        .update_partial(company_id, changes)
        .context("failed to update company")?
    else {
        bail!("company {company_id} not found");
    };
    if cleared {
        println!("Provider token cleared for {}.", company.name);
    } else {
        println!("Provider token rotated for {}.", company.name);
    }
    Ok(())
}
