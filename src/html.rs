//! Parser for the site's rendered results table.
//!
//! The first generation of this tool scraped the results page markup
//! directly instead of calling the gated API; that path survives as
//! `scrape --mode html`. The page renders one `<tr>` per business with
//! seven cells in a fixed order: name, registration id, status, filing
//! date, agent name, agent address, agent email.

use crate::records::BusinessRecord;
use scraper::{Html, Selector};

/// Parse rendered results-page HTML into records.
///
/// Prefers the `results-table` class; falls back to any table so minor
/// markup changes don't zero out the scrape. Header rows use `<th>` and
/// produce no cells, so they drop out naturally. Missing trailing cells
/// become empty strings, matching the API mode's output schema.
pub fn parse_results(html: &str) -> Vec<BusinessRecord> {
    let doc = Html::parse_document(html);

    let preferred =
        Selector::parse("table.results-table tbody tr").expect("results selector is valid");
    let fallback = Selector::parse("table tbody tr").expect("fallback selector is valid");
    let cell_selector = Selector::parse("td").expect("cell selector is valid");

    let mut rows: Vec<_> = doc.select(&preferred).collect();
    if rows.is_empty() {
        rows = doc.select(&fallback).collect();
    }

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();

        if cells.is_empty() {
            continue;
        }

        records.push(BusinessRecord {
            business_name: cell(&cells, 0),
            registration_id: cell(&cells, 1),
            status: cell(&cells, 2),
            filing_date: cell(&cells, 3),
            agent_name: cell(&cells, 4),
            agent_address: cell(&cells, 5),
            agent_email: cell(&cells, 6),
        });
    }

    records
}

fn cell(cells: &[String], index: usize) -> String {
    cells.get(index).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
    <html><body>
      <table class="results-table">
        <thead><tr><th>Name</th><th>ID</th><th>Status</th><th>Filed</th>
          <th>Agent</th><th>Address</th><th>Email</th></tr></thead>
        <tbody>
          <tr>
            <td>Silver Tech LLC</td><td>C-4412907</td><td>Active</td>
            <td>2019-03-22</td><td>Dana Reeve</td>
            <td>310 Pine St</td><td>dana@silvertech.example</td>
          </tr>
          <tr>
            <td>Quarry Holdings</td><td>C-0098121</td><td>Dissolved</td>
            <td>2007-11-02</td><td>M. Ortiz</td>
          </tr>
        </tbody>
      </table>
    </body></html>
    "#;

    #[test]
    fn test_parse_results_table() {
        let records = parse_results(RESULTS_PAGE);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].business_name, "Silver Tech LLC");
        assert_eq!(records[0].registration_id, "C-4412907");
        assert_eq!(records[0].agent_email, "dana@silvertech.example");

        // Short row: trailing cells become empty strings.
        assert_eq!(records[1].business_name, "Quarry Holdings");
        assert_eq!(records[1].agent_name, "M. Ortiz");
        assert_eq!(records[1].agent_address, "");
        assert_eq!(records[1].agent_email, "");
    }

    #[test]
    fn test_fallback_to_any_table() {
        let html = r#"
        <table><tbody>
          <tr><td>Plain Co</td><td>C-1</td><td>Active</td><td>2020-01-01</td>
              <td>A</td><td>B</td><td>c@d.example</td></tr>
        </tbody></table>
        "#;

        let records = parse_results(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].business_name, "Plain Co");
        assert_eq!(records[0].agent_email, "c@d.example");
    }

    #[test]
    fn test_no_table_yields_nothing() {
        let records = parse_results("<html><body><p>No matches.</p></body></html>");
        assert!(records.is_empty());
    }

    #[test]
    fn test_nested_markup_in_cells() {
        let html = r#"
        <table class="results-table"><tbody>
          <tr><td><strong>Bold Name</strong> Inc</td><td>C-9</td></tr>
        </tbody></table>
        "#;

        let records = parse_results(html);
        assert_eq!(records[0].business_name, "Bold Name Inc");
        assert_eq!(records[0].registration_id, "C-9");
        assert_eq!(records[0].status, "");
    }
}
