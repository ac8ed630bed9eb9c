use std::fs;
use swaggerize::scaffold::{scaffold, ScaffoldOptions};
use swaggerize::spec::{load_document, parse_document};

mod common;
use common::petstore;

#[test]
fn test_scaffold_from_yaml_document() {
    let dir = tempfile::tempdir().unwrap();
    let api_path = dir.path().join("petstore.yaml");
    fs::write(&api_path, serde_yaml::to_string(&petstore()).unwrap()).unwrap();

    let document = parse_document(&load_document(&api_path).unwrap()).unwrap();
    let out = dir.path().join("src");
    let report = scaffold(&document, &ScaffoldOptions::new(&out)).unwrap();

    // Pet model, pets.rs for /pets and /pets/{id}, notes.rs
    assert_eq!(report.written.len(), 3);
    let pets = fs::read_to_string(out.join("handlers/pets.rs")).unwrap();
    for function in ["list_pets", "add_pet", "get_pet", "delete_pet"] {
        assert!(pets.contains(&format!("pub fn {function}(")), "{function}");
    }
    assert!(pets.contains("// header `X-Request-Token`: string (required)"));
    assert!(out.join("handlers/notes.rs").exists());

    let model = fs::read_to_string(out.join("models/pet.rs")).unwrap();
    assert!(model.contains("pub name: String,"));
    assert!(model.contains("pub id: Option<i64>,"));
}

#[test]
fn test_existing_files_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let options = ScaffoldOptions::new(dir.path());
    fs::create_dir_all(&options.handlers_dir).unwrap();
    fs::write(options.handlers_dir.join("pets.rs"), "// mine\n").unwrap();

    let document = parse_document(&petstore()).unwrap();
    let report = scaffold(&document, &options).unwrap();

    assert_eq!(report.skipped, vec![options.handlers_dir.join("pets.rs")]);
    assert_eq!(
        fs::read_to_string(options.handlers_dir.join("pets.rs")).unwrap(),
        "// mine\n"
    );
}

#[test]
fn test_custom_handler_template() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("handler.jinja");
    fs::write(
        &template,
        "{% for op in operations %}{{ op.method }} {{ op.function }}\n{% endfor %}",
    )
    .unwrap();

    let mut options = ScaffoldOptions::new(&dir.path().join("out"));
    options.handler_template = Some(template);
    let document = parse_document(&petstore()).unwrap();
    scaffold(&document, &options).unwrap();

    let notes = fs::read_to_string(options.handlers_dir.join("notes.rs")).unwrap();
    assert_eq!(notes, "GET read_note\nPUT write_note\n");
}
