//! Normalization of raw price-service records into [`PriceRecord`]s.
//!
//! The price service has no fixed schema: the same fact shows up under
//! different keys depending on which backend answered. Each fact is probed
//! through an ordered alias list and the first usable value wins.

use mercado_core::PriceRecord;
use serde_json::{Map, Value};

/// Unit-price keys, in probe order.
pub const PRICE_KEYS: &[&str] = &[
    "vl_produto",
    "vl_produto_normal",
    "preco",
    "preco_venda",
    "valor",
    "valor_unitario",
    "preco_unitario",
    "atacadoPreco",
];

/// On-hand quantity keys, in probe order.
pub const STOCK_QTY_KEYS: &[&str] = &[
    "qtd_produto",
    "estoque",
    "qtd",
    "qtde",
    "qtd_estoque",
    "quantidade",
    "quantidade_disponivel",
    "quantidadeDisponivel",
    "qtdDisponivel",
    "qtdEstoque",
    "estoqueAtual",
    "saldo",
    "qty",
    "quantity",
    "stock",
    "amount",
];

/// Movement volume reported next to stock. It is not an on-hand quantity and
/// never counts toward availability.
pub const MOVEMENT_QTY_KEY: &str = "qtd_movimentacao";

pub const NAME_KEYS: &[&str] = &["produto", "nome", "descricao"];

pub const IDENTIFIER_KEYS: &[&str] = &["ean", "cod_barra", "id"];

/// Keys kept verbatim by [`filter_catalog_fields`].
const CATALOG_KEEP_KEYS: &[&str] = &[
    "id",
    "produto",
    "nome",
    "descricao",
    "preco",
    "preco_venda",
    "valor",
    "valor_unitario",
    "estoque",
    "quantidade",
    "saldo",
    "disponivel",
];

const CATALOG_KEEP_FRAGMENTS: &[&str] = &["preco", "valor", "estoque"];

const CATALOG_DROP_FRAGMENTS: &[&str] = &["trib", "ncm", "fiscal", "custo", "margem"];

/// Parses a number from a JSON number or a numeric string.
///
/// Strings accept both `"1234.56"` and Brazilian `"1.234,56"` / `"5,50"`.
/// Anything else, and any non-finite result, is `None`.
#[must_use]
pub fn parse_decimal(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_decimal_str(s)?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn parse_decimal_str(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let normalized = match (s.rfind(','), s.rfind('.')) {
        // "1.234,56"
        (Some(comma), Some(dot)) if comma > dot => s.replace('.', "").replace(',', "."),
        // "1,234.56"
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) if s.matches(',').count() == 1 => s.replace(',', "."),
        (Some(_), None) => return None,
        _ => s.to_owned(),
    };
    normalized.parse().ok()
}

fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        _ => None,
    })
}

/// Like [`first_text`] but also accepts integer codes (`"ean": 789...`).
fn first_code(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Normalizes one raw record.
///
/// Returns `None` for non-objects and for records with no positive stock
/// quantity under any [`STOCK_QTY_KEYS`] alias. A returned record is always
/// `available`; its price is the first parseable [`PRICE_KEYS`] value, kept
/// only when positive.
#[must_use]
pub fn normalize_record(value: &Value) -> Option<PriceRecord> {
    let obj = value.as_object()?;

    let quantity = STOCK_QTY_KEYS
        .iter()
        .filter_map(|key| obj.get(*key))
        .filter_map(parse_decimal)
        .find(|q| *q > 0.0)?;

    let price = PRICE_KEYS
        .iter()
        .filter_map(|key| obj.get(*key))
        .find_map(parse_decimal)
        .filter(|p| *p > 0.0);

    Some(PriceRecord {
        name: first_text(obj, NAME_KEYS),
        identifier: first_code(obj, IDENTIFIER_KEYS),
        price,
        quantity_on_hand: Some(quantity),
        available: true,
    })
}

/// Normalizes a whole response payload: an array of records, or a single
/// object treated as a one-element array. Unavailable records are dropped;
/// input order is preserved.
#[must_use]
pub fn normalize_payload(payload: &Value) -> Vec<PriceRecord> {
    match payload {
        Value::Array(items) => items.iter().filter_map(normalize_record).collect(),
        Value::Object(_) => normalize_record(payload).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn keep_catalog_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    if CATALOG_DROP_FRAGMENTS.iter().any(|f| lower.contains(f)) {
        return false;
    }
    CATALOG_KEEP_KEYS.contains(&lower.as_str())
        || CATALOG_KEEP_FRAGMENTS.iter().any(|f| lower.contains(f))
}

fn filter_object(obj: Map<String, Value>) -> Map<String, Value> {
    obj.into_iter().filter(|(k, _)| keep_catalog_key(k)).collect()
}

/// Strips fiscal and cost columns from a raw stock payload, keeping the
/// identity, price and stock fields a shopper-facing answer needs.
///
/// Non-object array items and scalar payloads pass through untouched.
#[must_use]
pub fn filter_catalog_fields(payload: Value) -> Value {
    match payload {
        Value::Object(obj) => Value::Object(filter_object(obj)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Value::Object(obj) => Value::Object(filter_object(obj)),
                    other => other,
                })
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
