use pdfseek_core::types::SearchResult;

/// Human-readable listing, one numbered entry per result.
pub fn format_results(query: &str, results: &[SearchResult]) -> String {
    let mut out = format!("🔍 Found {} results for: \"{}\"\n", results.len(), query);
    for (i, r) in results.iter().enumerate() {
        out.push_str(&format!("\n  {}. score={:.4}  file={}\n", i + 1, r.score, r.filename));
        out.push_str(&format!("     📝 {}\n", r.snippet));
    }
    out
}

pub fn to_json(results: &[SearchResult]) -> serde_json::Result<String> { serde_json::to_string_pretty(results) }
