//! Validates contract fixtures against frozen JSON schemas.

use jsonschema::JSONSchema;
use serde_json::Value;

fn load_json(path: &str) -> Value {
    let raw = std::fs::read_to_string(path).expect("json file should be readable");
    serde_json::from_str(&raw).expect("json file should be valid")
}

fn compile_validator(schema_path: &str) -> JSONSchema {
    let schema = load_json(schema_path);
    JSONSchema::compile(&schema).expect("schema should compile")
}

#[test]
fn analyze_request_fixture_matches_schema() {
    let validator = compile_validator(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/analyze-request.schema.json"
    ));
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/analyze-request.valid.json"
    ));
    assert!(
        validator.is_valid(&fixture),
        "analyze request fixture should validate against schema"
    );
}

#[test]
fn analysis_result_fixture_matches_schema() {
    let validator = compile_validator(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/analysis-result.schema.json"
    ));
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/analysis-result.valid.json"
    ));
    assert!(
        validator.is_valid(&fixture),
        "analysis result fixture should validate against schema"
    );
}

#[test]
fn analysis_result_schema_rejects_out_of_range_score() {
    let validator = compile_validator(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/analysis-result.schema.json"
    ));
    let mut fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/analysis-result.valid.json"
    ));
    fixture["score"] = Value::from(150);
    assert!(
        !validator.is_valid(&fixture),
        "scores above 100 must not validate"
    );
}
