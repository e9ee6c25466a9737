use serde::Serialize;

use crate::data::Database;

/// One source domain linking into the queried target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboundLink {
    pub source: String,
    pub count: i64,
}

/// Aggregate every stored edge pointing at `target`: the distinct
/// source domains with their occurrence counts, heaviest first, ties
/// broken by source name ascending. An unknown target yields an empty
/// list, not an error.
pub fn links_to(db: &Database, target: &str) -> rusqlite::Result<Vec<InboundLink>> {
    Ok(db
        .incoming_edges(target)?
        .into_iter()
        .map(|(source, count)| InboundLink { source, count })
        .collect())
}

/// Render the aggregation as the two-column table the query command
/// prints.
pub fn render_links_table(target: &str, links: &[InboundLink]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Breakdown of connections from different root domains for {target}\n\n"
    ));

    if links.is_empty() {
        out.push_str("No inbound links recorded.\n");
        return out;
    }

    let from_header = "From Domain";
    let count_header = "Number of links to this domain";
    let width = links
        .iter()
        .map(|link| link.source.len())
        .chain([from_header.len()])
        .max()
        .unwrap_or(from_header.len());

    out.push_str(&format!("{from_header:<width$}  {count_header}\n"));
    out.push_str(&format!(
        "{:-<width$}  {:-<count_width$}\n",
        "",
        "",
        count_width = count_header.len()
    ));
    for link in links {
        out.push_str(&format!("{:<width$}  {}\n", link.source, link.count));
    }
    out
}

/// JSON rendering of the same aggregation, for piping into other tools.
pub fn render_links_json(target: &str, links: &[InboundLink]) -> String {
    serde_json::json!({
        "domain": target,
        "inbound": links,
    })
    .to_string()
}
