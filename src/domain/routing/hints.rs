//! Deterministic hints - regex-detected signals fed into the router prompt.
//!
//! Hints never bypass the router. When a rule and the model disagree the
//! model decides, but it sees the rule's reading first.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::domain::tools::DATE_FORMAT;

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("static pattern"));

// "2010 to 2012", "2010-2012", "between 2010 and 2012"
static YEAR_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b((?:19|20)\d{2})\s*(?:-|to|through|until|and)\s*((?:19|20)\d{2})\b")
        .expect("static pattern")
});

static YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").expect("static pattern"));

// "DOC-1234", "INV-00017", "P-2012-044"
static DOCUMENT_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z]{1,6}-\d{2,}(?:-\d+)*)\b").expect("static pattern")
});

/// A signal detected without the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Hint {
    /// Calendar years; a single year has `start_year == end_year`.
    YearRange { start_year: i32, end_year: i32 },
    Date { date: NaiveDate },
    DocumentId { id: String },
}

impl Hint {
    /// One prompt line describing the hint.
    pub fn render(&self) -> String {
        match self {
            Self::YearRange {
                start_year,
                end_year,
            } if start_year == end_year => format!(
                "the year {} is mentioned; as a date range that is {}-01-01 to {}-12-31",
                start_year, start_year, end_year
            ),
            Self::YearRange {
                start_year,
                end_year,
            } => format!(
                "the years {} to {} are mentioned; as a date range that is {}-01-01 to {}-12-31",
                start_year, end_year, start_year, end_year
            ),
            Self::Date { date } => {
                format!("the date {} is mentioned", date.format(DATE_FORMAT))
            }
            Self::DocumentId { id } => {
                format!("'{}' looks like a document identifier", id)
            }
        }
    }
}

/// Scans a query for deterministic signals.
///
/// ```
/// use rag_router::domain::routing::{detect_hints, Hint};
///
/// let hints = detect_hints("Find blueprints for city hall from 2010");
/// assert_eq!(hints, vec![Hint::YearRange { start_year: 2010, end_year: 2010 }]);
/// ```
pub fn detect_hints(query: &str) -> Vec<Hint> {
    let mut hints = Vec::new();
    // Digits inside identifiers are not dates.
    let without_ids = DOCUMENT_ID.replace_all(query, " ");

    for cap in ISO_DATE.captures_iter(&without_ids) {
        if let Ok(date) = NaiveDate::parse_from_str(&cap[1], DATE_FORMAT) {
            push_unique(&mut hints, Hint::Date { date });
        }
    }
    let without_dates = ISO_DATE.replace_all(&without_ids, " ");

    for cap in YEAR_RANGE.captures_iter(&without_dates) {
        if let (Ok(a), Ok(b)) = (cap[1].parse::<i32>(), cap[2].parse::<i32>()) {
            push_unique(
                &mut hints,
                Hint::YearRange {
                    start_year: a.min(b),
                    end_year: a.max(b),
                },
            );
        }
    }
    let without_ranges = YEAR_RANGE.replace_all(&without_dates, " ");

    for cap in YEAR.captures_iter(&without_ranges) {
        if let Ok(year) = cap[1].parse::<i32>() {
            push_unique(
                &mut hints,
                Hint::YearRange {
                    start_year: year,
                    end_year: year,
                },
            );
        }
    }

    for cap in DOCUMENT_ID.captures_iter(query) {
        push_unique(
            &mut hints,
            Hint::DocumentId {
                id: cap[1].to_string(),
            },
        );
    }

    hints
}

/// Renders hints as a prompt block, or `None` when there are none.
pub fn render_hints(hints: &[Hint]) -> Option<String> {
    if hints.is_empty() {
        return None;
    }
    let mut out = String::from("Deterministic hints (verify against the query before using):\n");
    for hint in hints {
        out.push_str("- ");
        out.push_str(&hint.render());
        out.push('\n');
    }
    Some(out)
}

fn push_unique(hints: &mut Vec<Hint>, hint: Hint) {
    if !hints.contains(&hint) {
        hints.push(hint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_year_becomes_full_year_range() {
        let hints = detect_hints("blueprints from 2010");
        assert_eq!(
            hints,
            vec![Hint::YearRange {
                start_year: 2010,
                end_year: 2010
            }]
        );
        assert!(hints[0].render().contains("2010-01-01 to 2010-12-31"));
    }

    #[test]
    fn year_ranges_are_ordered() {
        let hints = detect_hints("contracts between 2014 and 2012");
        assert_eq!(
            hints,
            vec![Hint::YearRange {
                start_year: 2012,
                end_year: 2014
            }]
        );
    }

    #[test]
    fn years_inside_identifiers_are_ignored() {
        let hints = detect_hints("Who holds permit P-2012-044?");
        assert_eq!(
            hints,
            vec![Hint::DocumentId {
                id: "P-2012-044".to_string()
            }]
        );

        let hints = detect_hints("permit P-2012-044 renewed in 2015");
        assert!(hints.contains(&Hint::YearRange {
            start_year: 2015,
            end_year: 2015
        }));
        assert!(!hints.contains(&Hint::YearRange {
            start_year: 2012,
            end_year: 2012
        }));
    }

    #[test]
    fn iso_dates_are_not_counted_as_years() {
        let hints = detect_hints("permits issued on 2019-03-04");
        assert_eq!(
            hints,
            vec![Hint::Date {
                date: NaiveDate::from_ymd_opt(2019, 3, 4).unwrap()
            }]
        );
    }

    #[test]
    fn invalid_dates_are_ignored() {
        assert!(detect_hints("version 2019-13-45").is_empty());
    }

    #[test]
    fn detects_document_ids() {
        let hints = detect_hints("What does DOC-1234 say about zoning?");
        assert_eq!(hints, vec![Hint::DocumentId { id: "DOC-1234".into() }]);
    }

    #[test]
    fn plain_numbers_are_not_hints() {
        assert!(detect_hints("show me 25 results about 3000 units").is_empty());
    }

    #[test]
    fn render_hints_is_none_when_empty() {
        assert!(render_hints(&[]).is_none());
        let text = render_hints(&detect_hints("from 2010")).unwrap();
        assert!(text.starts_with("Deterministic hints"));
    }
}
