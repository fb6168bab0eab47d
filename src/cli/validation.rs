use crate::catalog::SortKey;
use crate::cli::args::{CliArgs, Command};
use crate::client::UpdateMode;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.update_mode.as_deref() {
        if UpdateMode::parse(raw).is_none() {
            return Err(format!(
                "invalid --update-mode '{raw}', expected patch or replace"
            ));
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid --timeout, expected a positive number of seconds".to_string());
        }
    }
    if let Some(url) = args.api_url.as_deref() {
        if url.trim().is_empty() {
            return Err("invalid --api, URL is empty".to_string());
        }
    }
    if let Command::Catalog(catalog) = &args.command {
        if let Some(raw) = catalog.sort.as_deref() {
            if SortKey::parse(raw).is_none() {
                return Err(format!(
                    "invalid --sort '{raw}', expected default, price-asc, price-desc, title-asc or title-desc"
                ));
            }
        }
        if catalog.page_size == Some(0) {
            return Err("invalid --page-size, expected positive integer".to_string());
        }
    }
    Ok(())
}
