use std::process::Command;

const SOURCE: &str = "\
import os
# entry point
def main(argv):
    \"\"\"Run the tool.\"\"\"
    return run(argv)

main(os.environ)
";

fn quarry(dir: &tempfile::TempDir) -> Command {
    let config = dir.path().join("quarry.toml");
    std::fs::write(&config, "[observability]\nlog_level = \"warn\"\n").unwrap();

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_quarry"));
    cmd.arg("--config").arg(config).env_remove("RUST_LOG");
    for key in ["QUARRY_INDEX_TOP_K", "QUARRY_LLM_PROVIDER", "QUARRY_CONFIG"] {
        cmd.env_remove(key);
    }
    cmd
}

#[test]
fn inspect_prints_canonical_text_and_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("tool.py");
    std::fs::write(&file, SOURCE).unwrap();

    let output = quarry(&dir).arg("inspect").arg(&file).output().unwrap();
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("import os\ndef main(argv):\n    return run(argv)\nmain(os.environ)"));
    assert!(stdout.contains("== function definitions (1) ==\n- main\n"));
    assert!(stdout.contains("== function calls (2) ==\n- run: run(argv)\n- main: main(os.environ)"));
    assert!(stdout.contains("== imports (1) ==\n- import os"));
    assert!(!stdout.contains("entry point"));
    assert!(!stdout.contains("Run the tool"));
}

#[test]
fn inspect_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("tool.py");
    std::fs::write(&file, SOURCE).unwrap();

    let output = quarry(&dir)
        .args(["inspect", "--json"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["artifacts"]["function_definitions"][0]["name"], "main");
    assert_eq!(value["artifacts"]["imports"][0]["source_text"], "import os");
    assert!(value["canonical"].as_str().unwrap().starts_with("import os\n"));
}

#[test]
fn inspect_reports_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("broken.py");
    std::fs::write(&file, "def broken(:\n    pass\n").unwrap();

    let output = quarry(&dir).arg("inspect").arg(&file).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("parse error at 1:"), "{stderr}");
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("tool.py");
    std::fs::write(&file, SOURCE).unwrap();

    let output = quarry(&dir)
        .env("QUARRY_INDEX_TOP_K", "0")
        .arg("inspect")
        .arg(&file)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("top_k"), "{stderr}");
}
