//! Parser Properties
//!
//! Checks that hold for every entry of the keyword table rather than single examples.

use pgmeta::command::is_extended;
use pgmeta::{parse, MetaError, KEYWORDS};
use pretty_assertions::assert_eq;

/// A usable argument for commands that require one
fn with_required_argument(keyword: &str, requires_argument: bool) -> String {
    if requires_argument {
        format!("{keyword} postgres")
    } else {
        keyword.to_string()
    }
}

#[test]
fn test_every_keyword_parses_to_its_kind() {
    for spec in KEYWORDS {
        for keyword in spec.keywords {
            let input = with_required_argument(keyword, spec.requires_argument);
            let cmd = parse(&input).unwrap_or_else(|e| panic!("{input} failed: {e}"));

            assert_eq!(cmd.kind, spec.kind, "{input}");
            assert_eq!(cmd.raw, input);
        }
    }
}

#[test]
fn test_suffix_combinations_are_accepted() {
    for spec in KEYWORDS.iter().filter(|spec| !spec.requires_argument) {
        for keyword in spec.keywords {
            for (suffix, extended) in [
                ("", false),
                ("+", true),
                (";", false),
                ("+;", true),
                (";;", false),
                ("+ ;", false),
                ("+;;", false),
            ] {
                let input = format!("{keyword}{suffix}");
                let cmd = parse(&input).unwrap_or_else(|e| panic!("{input} failed: {e}"));

                assert_eq!(cmd.is_extended(), extended, "{input}");
                assert_eq!(cmd.is_extended(), is_extended(&input));
            }
        }
    }
}

#[test]
fn test_is_extended_strips_one_terminator() {
    for (raw, expected) in [
        ("\\dt", false),
        ("\\dt+", true),
        ("\\dt+;", true),
        ("\\dt+;;", false),
        ("\\dt+ ;", false),
        ("\\dt;", false),
        ("  \\dn+  ", true),
        ("\\dt public.*", false),
    ] {
        assert_eq!(is_extended(raw), expected, "{raw}");
    }
}

#[test]
fn test_input_without_marker_is_rejected() {
    for raw in ["", "   ", "dt", "SELECT 1;", "/dt", "d\\t", "+\\dt"] {
        assert!(matches!(parse(raw), Err(MetaError::NotAPsqlCommand(_))), "{raw:?}");
    }
}

#[test]
fn test_marker_alone_is_empty() {
    for raw in ["\\", " \\ ", "\\;", "\\ dt"] {
        assert!(matches!(parse(raw), Err(MetaError::EmptyCommand)), "{raw:?}");
    }
}

#[test]
fn test_unknown_keywords() {
    for raw in ["\\zz", "\\dtx", "\\DT", "\\d++"] {
        match parse(raw) {
            Err(MetaError::UnknownCommand(token)) => assert!(raw.starts_with(&token)),
            other => panic!("{raw}: expected UnknownCommand, got {other:?}"),
        }
    }
}

#[test]
fn test_connect_requires_argument() {
    for raw in ["\\c", "\\connect", "\\c;", "\\connect+"] {
        assert!(matches!(parse(raw), Err(MetaError::MissingArgument(_))), "{raw}");
    }
}

#[test]
fn test_arguments_keep_order() {
    let cmd = parse("\\dt  public.*   extra ;").unwrap();
    assert_eq!(cmd.arguments, vec!["public.*".to_string(), "extra".to_string()]);
    assert_eq!(cmd.first_argument(), Some("public.*"));
}
