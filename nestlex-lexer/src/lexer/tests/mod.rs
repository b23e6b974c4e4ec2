
use super::{LexerStream, Token, Tokenizer};
use crate::{Grammar, Rule, TokenizerError, WHITESPACE};

macro_rules! rule_names {
    ($tokens:expr) => {
        $tokens.iter().map(|token| token.rule()).collect::<Vec<_>>()
    };
}

fn sub_state_tokenizer() -> Tokenizer {
    let grammar = Grammar::builder()
        .with_context(
            "main",
            [
                Rule::new("T_ENTER", "::enterState").enters("sub"),
                Rule::new("T_STRING", r"\w+"),
                Rule::new(WHITESPACE, r"\s+"),
            ],
        )
        .with_context(
            "sub",
            [
                Rule::new("T_EXIT", "::exitState").exit(),
                Rule::new("T_PERCENT", "%%%"),
                Rule::new("T_STRING", r"\w+"),
                Rule::new(WHITESPACE, r"\s+"),
            ],
        )
        .build();

    Tokenizer::new(&grammar).expect("valid grammar")
}

/// `<` enters `a`. In `a`, `(` enters `b` plainly while `[` enters `b` and
/// cascades the exit. `{` enters `b` from the root and cascades as well.
fn cascade_tokenizer() -> Tokenizer {
    let b = || {
        [
            Rule::new("T_CLOSE", r"[)\]]").exit(),
            Rule::new("T_WORD", r"\w+"),
        ]
    };
    let grammar = Grammar::builder()
        .with_context(
            "root",
            [
                Rule::new("T_OPEN", "<").enters("a"),
                Rule::new("T_BRACE", r"\{").enters("b").exit(),
                Rule::new("T_BANG", "!").exit(),
                Rule::new("T_WORD", r"\w+"),
            ],
        )
        .with_context(
            "a",
            [
                Rule::new("T_PAREN", r"\(").enters("b"),
                Rule::new("T_BRACKET", r"\[").enters("b").exit(),
                Rule::new("T_CLOSE", ">").exit(),
                Rule::new("T_WORD", r"\w+"),
            ],
        )
        .with_context("b", b())
        .build();

    Tokenizer::new(&grammar).expect("valid grammar")
}

fn simple_tokenizer() -> Tokenizer {
    Tokenizer::from_rules([
        Rule::new("T_TEST_1", "test_1"),
        Rule::new("T_TEST_2", "test_2"),
        Rule::new("T_NUMBER", r"\d+"),
        Rule::new("T_DOUBLE_QUOTED_STRING", r#""(?:[^"\\]|\\.)*""#),
        Rule::new("T_SINGLE_QUOTED_STRING", r"'(?:[^'\\]|\\.)*'"),
        Rule::new("T_STRING", r"\w+"),
        Rule::new(WHITESPACE, r"\s+"),
    ])
    .expect("valid rules")
}

/// Drains the stream, recording the depth after every token.
fn depths(stream: &mut LexerStream) -> Vec<(String, usize)> {
    let mut depths = Vec::new();
    while let Some(token) = stream.next(false).expect("token") {
        depths.push((token.value().to_string(), stream.depth()));
    }
    depths
}

#[test]
fn nested_context_sequence() {
    let mut stream =
        sub_state_tokenizer().tokenize("first then ::enterState %%%body%%% ::exitState\n");
    let tokens = stream.to_vec(false).expect("tokens");

    assert_eq!(
        rule_names!(tokens),
        [
            "T_STRING",
            "T_WHITESPACE",
            "T_STRING",
            "T_WHITESPACE",
            "T_ENTER",
            "T_WHITESPACE",
            "T_PERCENT",
            "T_STRING",
            "T_PERCENT",
            "T_WHITESPACE",
            "T_EXIT",
            "T_WHITESPACE",
        ]
    );
    assert_eq!(stream.depth(), 1);
}

#[test]
fn nested_context_with_spaced_body() {
    let mut stream =
        sub_state_tokenizer().tokenize("first then ::enterState %%% body %%% ::exitState");
    let tokens = stream.to_vec(false).expect("tokens");

    assert_eq!(
        rule_names!(tokens),
        [
            "T_STRING",
            "T_WHITESPACE",
            "T_STRING",
            "T_WHITESPACE",
            "T_ENTER",
            "T_WHITESPACE",
            "T_PERCENT",
            "T_WHITESPACE",
            "T_STRING",
            "T_WHITESPACE",
            "T_PERCENT",
            "T_WHITESPACE",
            "T_EXIT",
        ]
    );
    assert_eq!(
        tokens.iter().map(Token::value).collect::<String>(),
        stream.source()
    );
}

#[test]
fn rules_only_apply_in_their_context() {
    let mut stream = sub_state_tokenizer().tokenize("first %%%");

    assert_eq!(
        stream.next(true).expect("token").map(|t| t.rule().to_string()),
        Some("T_STRING".to_string())
    );
    let err = stream.next(true).unwrap_err();
    match err {
        TokenizerError::NoMatch { snapshot } => {
            assert_eq!(snapshot.context, "main");
            assert_eq!(snapshot.depth, 1);
            assert_eq!(snapshot.preview, "%%%");
        }
        err => panic!("unexpected error: {err}"),
    }
}

#[test]
fn nested_frame_counts_positions_from_its_start() {
    let mut stream = sub_state_tokenizer().tokenize("ab ::enterState cd ::exitState ef");
    let tokens = stream.to_vec(true).expect("tokens");

    assert_eq!(
        tokens,
        [
            Token::new("T_STRING", "ab", 1, 1),
            Token::new("T_ENTER", "::enterState", 1, 4),
            // first token of the nested frame
            Token::new("T_STRING", "cd", 1, 2),
            Token::new("T_EXIT", "::exitState", 1, 5),
            // continues after the last token of the root frame
            Token::new("T_STRING", "ef", 1, 17),
        ]
    );
}

#[test]
fn exit_hands_cursor_to_parent() {
    let mut stream = cascade_tokenizer().tokenize("<(x)y>z");

    assert_eq!(
        depths(&mut stream),
        [
            ("<".to_string(), 2),
            ("(".to_string(), 3),
            ("x".to_string(), 3),
            (")".to_string(), 2),
            ("y".to_string(), 2),
            (">".to_string(), 1),
            ("z".to_string(), 1),
        ]
    );
}

#[test]
fn cascade_exit_pops_parent() {
    let mut stream = cascade_tokenizer().tokenize("<[x]z");

    assert_eq!(
        depths(&mut stream),
        [
            ("<".to_string(), 2),
            ("[".to_string(), 3),
            ("x".to_string(), 3),
            // the popped frame cascades, its parent is popped as well
            ("]".to_string(), 1),
            ("z".to_string(), 1),
        ]
    );
}

#[test]
fn cascade_exit_stops_at_root() {
    let mut stream = cascade_tokenizer().tokenize("{x]y");

    assert_eq!(
        depths(&mut stream),
        [
            ("{".to_string(), 2),
            ("x".to_string(), 2),
            ("]".to_string(), 1),
            ("y".to_string(), 1),
        ]
    );
    assert_eq!(stream.context_name(), "root");
}

#[test]
fn exit_in_root_is_ignored() {
    let mut stream = cascade_tokenizer().tokenize("!a!");

    assert_eq!(
        depths(&mut stream),
        [
            ("!".to_string(), 1),
            ("a".to_string(), 1),
            ("!".to_string(), 1)
        ]
    );
}

#[test]
fn running_dry_does_not_unwind() {
    let mut stream = cascade_tokenizer().tokenize("<(x");

    assert_eq!(depths(&mut stream).len(), 3);
    assert_eq!(stream.depth(), 3);
    assert_eq!(stream.context_name(), "b");
    assert_eq!(stream.next(false), Ok(None));
    assert_eq!(stream.depth(), 3);
}

#[test]
fn simple_scan() {
    let mut stream = simple_tokenizer().tokenize(
        "first\ntest_1 then\ttest_2 anotherT_STRING 'single-\\'quoted\\'-string' \"double-\\\"quoted\\\"-string\"",
    );

    let tokens = stream.to_vec(false).expect("tokens");
    assert!(!tokens.is_empty());
    assert_eq!(stream.next(true), Ok(None));
    assert_eq!(stream.forecast(true), Ok(None));

    stream.rewind();
    assert!(stream.current().is_none());

    let t = stream.next(false).expect("token").expect("first");
    assert_eq!(t.value(), "first");
    assert!(t.matches(&["T_STRING"]));
    assert_eq!(stream.current(), Some(&t));

    let t = stream.next(false).expect("token").expect("newline");
    assert_eq!(t.value(), "\n");
    assert!(t.matches(&[WHITESPACE]));

    let t = stream.next(false).expect("token").expect("test_1");
    assert_eq!(t.value(), "test_1");
    assert!(t.matches(&["T_TEST_1"]));
    assert_eq!((t.line(), t.column()), (2, 1));

    let t = stream.next(false).expect("token").expect("space");
    assert!(t.matches(&[WHITESPACE]));

    let t = stream.next(true).expect("token").expect("then");
    assert_eq!(t.value(), "then");

    let t = stream.next(true).expect("token").expect("test_2");
    assert!(t.matches(&["T_TEST_2"]));
    assert_eq!((t.line(), t.column()), (2, 13));

    let t = stream.next(true).expect("token").expect("word");
    assert_eq!(t.value(), "anotherT_STRING");
    assert!(t.matches(&["T_STRING"]));

    let t = stream.next(true).expect("token").expect("single quoted");
    assert_eq!(t.value(), "'single-\\'quoted\\'-string'");
    assert!(t.matches(&["T_SINGLE_QUOTED_STRING"]));

    let t = stream.next(true).expect("token").expect("double quoted");
    assert_eq!(t.value(), "\"double-\\\"quoted\\\"-string\"");
    assert!(t.matches(&["T_DOUBLE_QUOTED_STRING"]));

    assert_eq!(stream.next(true), Ok(None));
    assert!(stream.current().is_none());
}

#[test]
fn next_of() {
    let tokenizer = simple_tokenizer();

    let mut stream = tokenizer.tokenize("first\ntest_1");
    let forecast = stream.forecast(true).expect("forecast");
    assert_eq!(stream.next_of(&["T_STRING"], true), Ok(forecast));

    match stream.next_of(&["T_STRING"], false) {
        Err(TokenizerError::UnexpectedToken {
            token, expected, ..
        }) => {
            assert_eq!(token.rule(), WHITESPACE);
            assert_eq!(expected, ["T_STRING"]);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let t = stream.next_of(&["T_TEST_1"], true).expect("token");
    assert!(t.is_some_and(|t| t.matches(&["T_TEST_1"])));

    assert_eq!(stream.forecast(false), Ok(None));
    assert_eq!(stream.forecast_of(&["T_STRING"], false), Ok(None));
    assert_eq!(stream.next(false), Ok(None));
    assert_eq!(stream.next_of(&["T_STRING"], false), Ok(None));
}

#[test]
fn next_of_rejects_number_after_whitespace() {
    let mut stream = simple_tokenizer().tokenize("   42 first");

    assert!(matches!(
        stream.next_of(&["T_STRING"], false),
        Err(TokenizerError::UnexpectedToken { .. })
    ));
    let err = stream.next_of(&["T_STRING"], false).unwrap_err();
    match err {
        TokenizerError::UnexpectedToken { token, .. } => assert_eq!(token.rule(), "T_NUMBER"),
        err => panic!("unexpected error: {err}"),
    }
}

#[test]
fn forecast_of_does_not_consume() {
    let stream = simple_tokenizer().tokenize("42");

    assert!(stream.forecast_of(&["T_STRING"], true).is_err());
    assert_eq!(
        stream.forecast_of(&["T_NUMBER", "T_STRING"], true),
        Ok(Some(Token::new("T_NUMBER", "42", 1, 1)))
    );
    assert_eq!(stream.remaining(), "42");
}

#[test]
fn forecast_is_pure() {
    let mut stream = sub_state_tokenizer().tokenize("a ::enterState b");
    stream.next(true).expect("a");

    let first = stream.forecast(true).expect("forecast");
    let second = stream.forecast(true).expect("forecast");
    assert_eq!(first, second);
    assert_eq!(stream.remaining(), " ::enterState b");
    assert_eq!(stream.depth(), 1);

    assert_eq!(stream.next(true).expect("enter"), first);
    assert_eq!(stream.depth(), 2);
}

#[test]
fn exhaustion_is_idempotent() {
    let mut stream = simple_tokenizer().tokenize("a b  ");

    while stream.next(true).expect("token").is_some() {}
    for _ in 0..3 {
        assert_eq!(stream.next(true), Ok(None));
    }

    // trailing whitespace is still there when it is not skipped
    assert_eq!(
        stream.next(false),
        Ok(Some(Token::new(WHITESPACE, "  ", 1, 4)))
    );
    assert_eq!(stream.next(false), Ok(None));
}

#[test]
fn rewind_discards_frames() {
    let mut stream = sub_state_tokenizer().tokenize("::enterState %%%");
    stream.next(true).expect("enter");
    stream.next(true).expect("percent");
    assert_eq!(stream.depth(), 2);

    stream.rewind();
    assert_eq!(stream.depth(), 1);
    assert_eq!(stream.remaining(), stream.source());
    assert_eq!(
        stream.next(true),
        Ok(Some(Token::new("T_ENTER", "::enterState", 1, 1)))
    );
}

#[test]
fn unmatchable_input() {
    let mut stream = simple_tokenizer().tokenize("first $");

    assert!(stream.next(true).expect("first").is_some());
    assert!(matches!(
        stream.next(true),
        Err(TokenizerError::NoMatch { .. })
    ));
    // the position is not skipped
    assert!(matches!(
        stream.next(true),
        Err(TokenizerError::NoMatch { .. })
    ));
}

#[test]
fn tokens_stop_after_error() {
    let mut stream = simple_tokenizer().tokenize("a $ b");
    let items = stream.tokens(true).collect::<Vec<_>>();

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(items[1].is_err());
}

#[test]
fn multiline_token_positions() {
    let tokenizer = Tokenizer::from_rules([
        Rule::new("T_COMMENT", r"/\*(?s:.)*?\*/"),
        Rule::new("T_STRING", r"\w+"),
        Rule::new(WHITESPACE, r"\s+"),
    ])
    .expect("valid rules");

    let mut stream = tokenizer.tokenize("a /* one\n two\n  */ b");
    let tokens = stream.to_vec(true).expect("tokens");

    assert_eq!(
        tokens,
        [
            Token::new("T_STRING", "a", 1, 1),
            Token::new("T_COMMENT", "/* one\n two\n  */", 1, 3),
            Token::new("T_STRING", "b", 3, 6),
        ]
    );
    assert_eq!(tokens[1].end_line(), 3);
    assert_eq!(tokens[1].end_column(), 4);
}
