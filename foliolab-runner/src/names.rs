//! Display names for symbols.

use foliolab_core::data::DataProvider;
use tracing::warn;

/// Shown when the provider lookup fails.
pub const NAME_NOT_FOUND: &str = "Name not found";

const MAX_NAME_CHARS: usize = 30;

/// Cut names longer than 30 characters to 27 plus `"..."`.
pub fn truncate_name(name: &str) -> String {
    if name.chars().count() > MAX_NAME_CHARS {
        let head: String = name.chars().take(MAX_NAME_CHARS - 3).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

/// Provider name for `symbol`, else the symbol itself.
///
/// Lookup errors degrade to [`NAME_NOT_FOUND`].
pub fn display_name(provider: &dyn DataProvider, symbol: &str) -> String {
    match provider.display_name(symbol) {
        Ok(name) => truncate_name(name.as_deref().unwrap_or(symbol)),
        Err(err) => {
            warn!(%symbol, error = %err, "company name lookup failed");
            NAME_NOT_FOUND.to_string()
        }
    }
}

pub fn display_names(provider: &dyn DataProvider, symbols: &[String]) -> Vec<(String, String)> {
    symbols
        .iter()
        .map(|s| (s.clone(), display_name(provider, s)))
        .collect()
}
