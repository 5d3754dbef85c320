use anyhow::Result;

use screenmem::api::responder::{DEFAULT_LIMIT, MAX_LIMIT};
use screenmem::config::DataPaths;
use screenmem::records::types::format_timestamp;

/// Full-text search from the terminal.
pub fn search(paths: &DataPaths, query: &str, limit: Option<usize>, app: Option<&str>) -> Result<()> {
    let store = super::open_store(paths)?;
    let limit = limit.map_or(DEFAULT_LIMIT, |l| l.clamp(1, MAX_LIMIT));
    let results = store.search(query, limit, app)?;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for result in &results {
        let window = result.window_title.as_deref().unwrap_or("(no window)");
        println!(
            "[{}] {} | {} | {}",
            format_timestamp(&result.timestamp),
            result.app_name,
            window,
            result.source
        );
        println!("{}", result.snippet);
        println!("---");
    }

    Ok(())
}
