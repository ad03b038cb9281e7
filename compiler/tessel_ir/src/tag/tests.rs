use super::*;

#[test]
fn unknown_tag_is_not_known() {
    assert!(!SourceTag::UNKNOWN.is_known());
    assert_eq!(SourceTag::default(), SourceTag::UNKNOWN);
}

#[test]
fn display_formats() {
    assert_eq!(SourceTag::new(3, 14).to_string(), "3:14");
    assert_eq!(SourceTag::line(7).to_string(), "7");
    assert_eq!(SourceTag::UNKNOWN.to_string(), "<unknown>");
}
