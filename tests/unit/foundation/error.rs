use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ScenepixError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(ScenepixError::load("x").to_string().contains("load error:"));
    assert!(
        ScenepixError::compose("x")
            .to_string()
            .contains("composition error:")
    );
    assert!(
        ScenepixError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        ScenepixError::export("x")
            .to_string()
            .contains("export error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ScenepixError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
