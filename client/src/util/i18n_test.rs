use super::*;

#[test]
fn translate_uses_requested_locale() {
    assert_eq!(translate(Locale::Fr, "chat.title"), "Chat Communautaire");
    assert_eq!(translate(Locale::En, "chat.title"), "Community Chat");
    assert_eq!(translate(Locale::Ar, "chat.title"), "الدردشة المجتمعية");
}

#[test]
fn missing_arabic_key_falls_back_to_english() {
    assert_eq!(translate(Locale::Ar, "reports.empty"), "No results found");
    assert_eq!(translate(Locale::Ar, "chat.connecting"), "Connecting to chat...");
}

#[test]
fn unknown_key_falls_back_to_itself() {
    assert_eq!(translate(Locale::Fr, "does.not.exist"), "does.not.exist");
}

#[test]
fn every_english_key_exists_in_french() {
    for (key, _) in EN {
        assert!(lookup(Locale::Fr, key).is_some(), "missing fr translation for {key}");
    }
}

#[test]
fn locale_parse_and_direction() {
    assert_eq!(Locale::parse(" AR "), Some(Locale::Ar));
    assert_eq!(Locale::parse("de"), None);
    assert!(Locale::Ar.is_rtl());
    assert!(!Locale::Fr.is_rtl());
    assert_eq!(Locale::default(), Locale::Fr);
}

#[test]
fn locale_serializes_lowercase() {
    let json = serde_json::to_string(&Locale::En).expect("serialize");
    assert_eq!(json, "\"en\"");
}
