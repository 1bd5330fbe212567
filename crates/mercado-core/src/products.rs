use serde::{Deserialize, Serialize};

/// A tentative catalog match pulled out of noisy search output.
///
/// At least one of `identifier` / `name` is always present; use
/// [`Candidate::new`] to enforce that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Numeric catalog code (EAN/GTIN style), e.g. `"7891149103300"`.
    pub identifier: Option<String>,
    /// Display name as the search service spelled it, e.g. `"ARROZ BRANCO 1KG"`.
    pub name: Option<String>,
}

impl Candidate {
    /// Builds a candidate from optional parts, trimming whitespace.
    ///
    /// Returns `None` when both parts are absent or blank.
    #[must_use]
    pub fn new(identifier: Option<String>, name: Option<String>) -> Option<Self> {
        let identifier = identifier
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        let name = name.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());
        if identifier.is_none() && name.is_none() {
            return None;
        }
        Some(Self { identifier, name })
    }
}

/// A [`Candidate`] with its relevance score against a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    /// Always `>= 0.0`.
    pub score: f64,
}

/// A normalized price/availability record.
///
/// Serialized names follow the price service's own vocabulary so that feeding
/// a serialized record back through normalization yields the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    #[serde(rename = "nome", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "ean", default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Unit price. Never zero or negative; an unusable price is `None`.
    #[serde(rename = "preco", default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(
        rename = "quantidade",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity_on_hand: Option<f64>,
    #[serde(rename = "disponibilidade")]
    pub available: bool,
}

/// Why a single query did not resolve to a priced record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    UpstreamError { status: u16, body: String },
    /// The search service reported no hit for the query.
    NotFound,
    /// The search reported hits, but no identifier could be parsed from them.
    ExtractionFailed,
    /// The chosen identifier has no in-stock record.
    PriceNotFound,
    InvalidIdentifier,
    InternalError { detail: String },
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::UpstreamError { status, .. } => write!(f, "upstream error ({status})"),
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::ExtractionFailed => write!(f, "extraction failed"),
            FailureKind::PriceNotFound => write!(f, "price not found"),
            FailureKind::InvalidIdentifier => write!(f, "invalid identifier"),
            FailureKind::InternalError { detail } => write!(f, "internal error: {detail}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Found(PriceRecord),
    Failed(FailureKind),
}

/// Terminal result of resolving one free-text query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResolution {
    pub query: String,
    /// Identifier chosen for the query, when resolution got that far.
    pub identifier: Option<String>,
    pub outcome: ItemOutcome,
}

impl ItemResolution {
    #[must_use]
    pub fn found(query: &str, identifier: Option<String>, record: PriceRecord) -> Self {
        Self {
            query: query.to_owned(),
            identifier,
            outcome: ItemOutcome::Found(record),
        }
    }

    #[must_use]
    pub fn failed(query: &str, identifier: Option<String>, kind: FailureKind) -> Self {
        Self {
            query: query.to_owned(),
            identifier,
            outcome: ItemOutcome::Failed(kind),
        }
    }

    #[must_use]
    pub fn record(&self) -> Option<&PriceRecord> {
        match &self.outcome {
            ItemOutcome::Found(record) => Some(record),
            ItemOutcome::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&FailureKind> {
        match &self.outcome {
            ItemOutcome::Found(_) => None,
            ItemOutcome::Failed(kind) => Some(kind),
        }
    }

    /// Returns the display name and price when the query resolved to a
    /// record carrying a price. The name falls back to the query text.
    #[must_use]
    pub fn priced(&self) -> Option<(&str, f64)> {
        let record = self.record()?;
        let price = record.price?;
        let name = record.name.as_deref().unwrap_or(&self.query);
        Some((name, price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: Option<&str>, price: Option<f64>) -> PriceRecord {
        PriceRecord {
            name: name.map(str::to_owned),
            identifier: Some("111".to_owned()),
            price,
            quantity_on_hand: Some(10.0),
            available: true,
        }
    }

    #[test]
    fn candidate_requires_at_least_one_part() {
        assert!(Candidate::new(None, None).is_none());
        assert!(Candidate::new(Some("  ".to_owned()), Some(String::new())).is_none());
        let c = Candidate::new(Some(" 789 ".to_owned()), None).unwrap();
        assert_eq!(c.identifier.as_deref(), Some("789"));
        assert!(c.name.is_none());
    }

    #[test]
    fn price_record_serializes_with_upstream_field_names() {
        let value = serde_json::to_value(record(Some("ARROZ"), Some(5.5))).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "nome": "ARROZ",
                "ean": "111",
                "preco": 5.5,
                "quantidade": 10.0,
                "disponibilidade": true
            })
        );
    }

    #[test]
    fn resolution_exposes_exactly_one_side() {
        let ok = ItemResolution::found("arroz", Some("111".to_owned()), record(None, Some(5.5)));
        assert!(ok.record().is_some());
        assert!(ok.failure().is_none());

        let err = ItemResolution::failed("xyz", None, FailureKind::NotFound);
        assert!(err.record().is_none());
        assert_eq!(err.failure(), Some(&FailureKind::NotFound));
    }

    #[test]
    fn priced_falls_back_to_query_for_name() {
        let res = ItemResolution::found("arroz", None, record(None, Some(5.5)));
        assert_eq!(res.priced(), Some(("arroz", 5.5)));
    }

    #[test]
    fn priced_is_none_without_price() {
        let res = ItemResolution::found("arroz", None, record(Some("ARROZ"), None));
        assert!(res.priced().is_none());
    }

    #[test]
    fn failure_kind_serializes_with_tag() {
        let value = serde_json::to_value(FailureKind::UpstreamError {
            status: 502,
            body: "bad gateway".to_owned(),
        })
        .unwrap();
        assert_eq!(value["kind"], "upstream_error");
        assert_eq!(value["status"], 502);
    }
}
