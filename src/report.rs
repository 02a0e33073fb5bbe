use lookalike_engine::RankedMatch;
use serde::Serialize;

/// What presentation receives for one ranked match.
#[derive(Debug, Serialize)]
pub struct ReportRow<'a> {
    pub rank: usize,
    pub id: &'a str,
    pub name: &'a str,
    pub group: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub score: u8,
}

pub fn rows<'a>(ranked: &[RankedMatch<'a>]) -> Vec<ReportRow<'a>> {
    ranked
        .iter()
        .enumerate()
        .map(|(i, m)| ReportRow {
            rank: i + 1,
            id: &m.entry.id,
            name: &m.entry.metadata.name,
            group: m.entry.metadata.group.as_deref(),
            image_url: m.entry.metadata.image_url.as_deref(),
            score: m.percent,
        })
        .collect()
}

pub fn render_text(rows: &[ReportRow<'_>]) -> String {
    if rows.is_empty() {
        return "No similar entries found.".to_string();
    }
    rows.iter()
        .map(|r| match r.group {
            Some(group) => format!("{}. {} ({}) - {}%", r.rank, r.name, group, r.score),
            None => format!("{}. {} - {}%", r.rank, r.name, r.score),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
