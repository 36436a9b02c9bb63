use canary_core::fingerprint::compute;

#[test]
fn test_fingerprint_is_stable_for_equal_triples() {
    let a = compute("What is 2+2?", "Answers 4", "The answer is 4.");
    let b = compute(
        &String::from("What is 2+2?"),
        &"Answers 4".to_string(),
        "The answer is 4.",
    );
    assert_eq!(a, b, "Fingerprint must be stable for identical input");
}

#[test]
fn test_fingerprint_field_boundaries_do_not_collide() {
    assert_ne!(compute("ab", "c", "x"), compute("a", "bc", "x"));
    assert_ne!(compute("p", "ab", "c"), compute("p", "a", "bc"));

    // a naive "{p}|{e}|{a}" join collides on both of these
    assert_ne!(compute("a|b", "c", "d"), compute("a", "b|c", "d"));
    assert_ne!(compute("a", "b", "c|d"), compute("a", "b|c", "d"));
}

#[test]
fn test_fingerprint_sensitive_to_each_field() {
    let base = compute("prompt", "expected", "actual");
    assert_ne!(base, compute("prompt!", "expected", "actual"));
    assert_ne!(base, compute("prompt", "expected!", "actual"));
    assert_ne!(base, compute("prompt", "expected", "actual!"));
    assert_ne!(base, compute("prompt", "expected", "Actual"));
}

#[test]
fn test_fingerprint_handles_empty_and_unicode() {
    assert_ne!(compute("", "", ""), compute("", "", " "));
    let fp = compute("Quelle est la capitale ?", "Paris", "Paris est la capitale 🇫🇷");
    assert_eq!(fp.as_str().len(), 64);
}
