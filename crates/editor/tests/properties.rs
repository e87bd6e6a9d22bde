use quill_editor::search::replace_all;
use quill_editor::{scan, Command, CommandStack, Document, Language, ScanIssue, SearchEngine, Selection};

fn is_bracket_issue(issue: &ScanIssue) -> bool {
    matches!(
        issue,
        ScanIssue::UnmatchedClosing(_) | ScanIssue::MismatchedClosing { .. } | ScanIssue::UnclosedBracket(_)
    )
}

#[test]
fn offset_position_round_trip() {
    let samples = ["", "a", "abc\n", "\n\n", "fn main() {\n    héllo();\n}", "x\r\ny\tz\n\nend"];
    for content in samples {
        let doc = Document::from_str(content);
        for offset in 0..=doc.len() {
            let pos = doc.offset_to_position(offset);
            assert_eq!(
                doc.position_to_offset(pos.line, pos.column),
                offset,
                "content {:?} offset {}",
                content,
                offset
            );
        }
    }
}

#[test]
fn redo_after_undo_restores_the_edit() {
    let cases: Vec<(&str, Selection, Command)> = vec![
        ("hello", Selection::caret(5), Command::InsertText(" world".into())),
        ("hello", Selection::new(1, 4), Command::Paste("ipp".into())),
        ("hello", Selection::new(0, 2), Command::Cut),
        ("    indented", Selection::caret(12), Command::Enter),
        ("abc", Selection::caret(2), Command::Backspace),
        ("a\nb\nc", Selection::new(0, 5), Command::Indent),
        ("    a\n\tb", Selection::new(0, 8), Command::Outdent),
        ("x    ", Selection::caret(5), Command::Outdent),
    ];

    for (content, selection, command) in cases {
        let mut doc = Document::from_str(content);
        let mut sel = selection;
        let mut stack = CommandStack::new();

        let result = stack.execute(command.clone(), &mut doc, &mut sel);
        assert!(result.changed, "{:?} on {:?} changed nothing", command, content);
        let after = (doc.text().to_string(), sel);

        stack.execute(Command::Undo, &mut doc, &mut sel);
        assert_eq!(doc.text(), content);
        assert_eq!(sel, selection);

        stack.execute(Command::Redo, &mut doc, &mut sel);
        assert_eq!((doc.text().to_string(), sel), after, "{:?}", command);
    }
}

#[test]
fn balanced_brackets_have_no_bracket_diagnostics() {
    let inputs = [
        (Language::JavaScript, "function f(a) {\n  return [a, { b: (1) }];\n}\n"),
        (Language::Python, "def f(x):\n    return [x, {'k': (1, 2)}]\n"),
        (Language::Rust, "fn main() {\n    let v = vec![(1, [2])];\n}\n"),
        (Language::Json, "{\"a\": [1, {\"b\": []}]}"),
        (Language::JavaScript, "const s = \"(]\"; // )]}\n/* [ */ f();"),
        (Language::Rust, "fn open(c: char) -> bool {\n    matches!(c, '{' | '(')\n}\n"),
        (Language::Python, "def f():\n    \"\"\"Close ) here.\n    \"\"\"\n    return r'[\\d'\n"),
    ];
    for (language, input) in inputs {
        let output = scan(input, language.descriptor());
        let bracket_issues: Vec<_> = output.diagnostics.iter().filter(|d| is_bracket_issue(&d.issue)).collect();
        assert!(bracket_issues.is_empty(), "{:?}: {:?}", language, bracket_issues);
    }
}

#[test]
fn lone_closer_is_unmatched() {
    for language in Language::ALL {
        let desc = language.descriptor();
        if !desc.is_closer(')') {
            continue;
        }
        let output = scan(")", desc);
        assert_eq!(output.diagnostics.len(), 1, "{:?}", language);
        assert_eq!(output.diagnostics[0].message, "Unmatched closing ')'");
        assert_eq!(output.diagnostics[0].line, 1);
    }
}

#[test]
fn unterminated_string_at_eof() {
    for language in [Language::JavaScript, Language::Python] {
        let output = scan("let s = 'abc", language.descriptor());
        let unclosed: Vec<_> = output
            .diagnostics
            .iter()
            .filter(|d| d.message == "Unclosed string literal")
            .collect();
        assert_eq!(unclosed.len(), 1, "{:?}", language);
        assert_eq!(output.diagnostics.len(), 1, "{:?}", language);
    }
}

#[test]
fn tab_then_shift_tab_restores_text() {
    let original = "a\n  b\n\tc\n\nd";
    let mut doc = Document::from_str(original);
    let mut sel = Selection::new(0, doc.len());
    let mut stack = CommandStack::new();

    stack.execute(Command::Indent, &mut doc, &mut sel);
    assert_eq!(doc.text(), "    a\n      b\n    \tc\n    \n    d");

    stack.execute(Command::Outdent, &mut doc, &mut sel);
    assert_eq!(doc.text(), original);
}

#[test]
fn search_cycles_through_lines() {
    let mut engine = SearchEngine::new();
    engine.search("ab\nab\nab", "ab", true);
    assert_eq!(engine.matches().len(), 3);
    assert_eq!(engine.cursor(), Some(0));

    engine.next();
    assert_eq!(engine.cursor(), Some(1));
    engine.next();
    assert_eq!(engine.cursor(), Some(2));
    engine.next();
    assert_eq!(engine.cursor(), Some(0));

    engine.search("ababab", "ab", true);
    assert_eq!(engine.matches().len(), 1);
}

#[test]
fn replace_all_does_not_overlap() {
    let (result, count) = replace_all("aaa", "a", "bb", true);
    assert_eq!(result, "bbbbbb");
    assert_eq!(count, 3);

    let mut engine = SearchEngine::new();
    engine.search(&result, "bb", true);
    assert_eq!(engine.matches().len(), 1);
}
