use super::*;

fn pair(c: &Candidate) -> (Option<&str>, Option<&str>) {
    (c.identifier.as_deref(), c.name.as_deref())
}

// -----------------------------------------------------------------------
// extract_candidates
// -----------------------------------------------------------------------

#[test]
fn extracts_summary_lines_in_order() {
    let text = "EANS_ENCONTRADOS:\n1) 7891149103300 - ARROZ BRANCO 1KG\n2) 243 - COXA SOBRECOXA MQ kg";
    let got = extract_candidates(text);
    assert_eq!(got.len(), 2);
    assert_eq!(pair(&got[0]), (Some("7891149103300"), Some("ARROZ BRANCO 1KG")));
    assert_eq!(pair(&got[1]), (Some("243"), Some("COXA SOBRECOXA MQ kg")));
}

#[test]
fn tolerates_irregular_spacing_and_crlf() {
    let text = "  3)550-FRANGO ABATIDO kg\r\n4)   12   -   LEITE  ";
    let got = extract_candidates(text);
    assert_eq!(got.len(), 2);
    assert_eq!(pair(&got[0]), (Some("550"), Some("FRANGO ABATIDO kg")));
    assert_eq!(pair(&got[1]), (Some("12"), Some("LEITE")));
}

#[test]
fn skips_lines_without_identifier() {
    let text = "1) ARROZ BRANCO\n2) 789\nsome prose - here";
    assert!(extract_candidates(text).is_empty());
}

#[test]
fn empty_and_garbage_inputs_yield_nothing() {
    assert!(extract_candidates("").is_empty());
    assert!(extract_candidates("\u{0}\u{1}\u{fffd}\u{7f}))) - -").is_empty());
    assert!(extract_candidates(r#"{"codigo_ean": 123, "produto": "x"}"#).is_empty());
    assert!(extract_candidates("\n\n\n").is_empty());
}

// -----------------------------------------------------------------------
// scan_json_fragments
// -----------------------------------------------------------------------

#[test]
fn pairs_fragments_by_appearance() {
    let text = r#"[{"codigo_ean": 111, "produto": "ARROZ"}, {"codigo_ean":222,"produto":"FEIJAO"}]"#;
    let got = scan_json_fragments(text);
    assert_eq!(got.len(), 2);
    assert_eq!(pair(&got[0]), (Some("111"), Some("ARROZ")));
    assert_eq!(pair(&got[1]), (Some("222"), Some("FEIJAO")));
}

#[test]
fn zips_to_shorter_list_when_both_present() {
    let text = r#""codigo_ean": 1 "codigo_ean": 2 "produto": "A""#;
    let got = scan_json_fragments(text);
    assert_eq!(got.len(), 1);
    assert_eq!(pair(&got[0]), (Some("1"), Some("A")));
}

#[test]
fn keeps_names_when_no_identifiers() {
    let text = r#""produto": "A", "produto": "B""#;
    let got = scan_json_fragments(text);
    assert_eq!(got.len(), 2);
    assert_eq!(pair(&got[1]), (None, Some("B")));
}

#[test]
fn caps_fragments_at_max_candidates() {
    let text: String = (0..80)
        .map(|i| format!(r#"{{"codigo_ean": {i}, "produto": "P{i}"}}"#))
        .collect();
    assert_eq!(scan_json_fragments(&text).len(), MAX_CANDIDATES);
}

// -----------------------------------------------------------------------
// scan_text
// -----------------------------------------------------------------------

#[test]
fn scan_text_falls_back_to_summary_lines() {
    let got = scan_text("1) 789 - CAFE 500G");
    assert_eq!(got.len(), 1);
    assert_eq!(pair(&got[0]), (Some("789"), Some("CAFE 500G")));
}

#[test]
fn scan_text_caps_summary_lines() {
    let text: String = (0..70).map(|i| format!("{i}) {i} - P{i}\n")).collect();
    assert_eq!(scan_text(&text).len(), MAX_CANDIDATES);
}
