use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::{tempdir, TempDir};

const PYTHON_SOURCE: &str = "import os\n\ndef foo():\n    return 1\n\ndef bar():\n    return 2\n";

#[allow(deprecated)]
fn code_embed(workdir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("code-embed").expect("binary");
    cmd.current_dir(workdir).env_remove("RUST_LOG");
    cmd
}

fn setup_vault() -> TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("notes")).unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/app.py"), PYTHON_SOURCE).unwrap();
    fs::write(
        root.join("notes/today.md"),
        "# Today\n\n```embed-python\nPATH: vault://src/app.py\nFUNCTION: foo\n```\n\n\
         ```embed-python\nTITLE: broken\n```\n\n```python\nprint('untouched')\n```\n",
    )
    .unwrap();
    temp
}

#[test]
fn render_expands_embed_blocks_in_place() {
    let vault = setup_vault();

    let output = code_embed(vault.path())
        .args(["--quiet", "render", "notes/today.md", "--vault", "."])
        .output()
        .expect("command run");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let expected = "# Today\n\n**app.py**\n```python\n...\ndef foo():\n    return 1\n```\n\n\
                    `ERROR: invalid source path`\n\n```python\nprint('untouched')\n```\n";
    pretty_assertions::assert_eq!(stdout, expected);
}

#[test]
fn render_clamps_unbounded_ranges_and_keeps_going() {
    let vault = setup_vault();
    fs::write(
        vault.path().join("notes/big.md"),
        "```embed-python\nPATH: vault://src/app.py\nLINES: \"1-18446744073709551615\"\n```\n\n\
         ```embed-python\nPATH: vault://src/app.py\nFUNCTION: bar\n```\n",
    )
    .unwrap();

    code_embed(vault.path())
        .args(["--quiet", "render", "notes/big.md", "--vault", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("import os\n\ndef foo():"))
        .stdout(predicate::str::contains("...\ndef bar():\n    return 2\n```"));
}

#[test]
fn render_json_reports_each_embed() {
    let vault = setup_vault();

    let output = code_embed(vault.path())
        .args(["render", "notes/today.md", "--vault", ".", "--json"])
        .output()
        .expect("command run");
    assert!(output.status.success());

    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(body["document"], "notes/today.md");
    assert_eq!(body["embeds"][0]["status"], "code");
    assert_eq!(body["embeds"][0]["source_path"], "src/app.py");
    assert_eq!(body["embeds"][1]["status"], "error");
    assert_eq!(body["embeds"][1]["message"], "ERROR: invalid source path");
}

#[test]
fn render_rejects_documents_outside_the_vault() {
    let vault = setup_vault();
    let elsewhere = tempdir().unwrap();
    fs::write(elsewhere.path().join("x.md"), "hello\n").unwrap();

    code_embed(vault.path())
        .arg("render")
        .arg(elsewhere.path().join("x.md"))
        .args(["--vault", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not inside the vault"));
}

#[test]
fn extract_by_lines_and_functions() {
    let vault = setup_vault();

    code_embed(vault.path())
        .args(["extract", "src/app.py", "--lines", "3-4"])
        .assert()
        .success()
        .stdout("...\ndef foo():\n    return 1\n");

    code_embed(vault.path())
        .args(["extract", "src/app.py", "--function", "bar, foo"])
        .assert()
        .success()
        .stdout("...\ndef foo():\n    return 1\n...\ndef bar():\n    return 2\n");
}

#[test]
fn locate_prints_span_or_json() {
    let vault = setup_vault();

    code_embed(vault.path())
        .args(["locate", "src/app.py", "--function", "bar"])
        .assert()
        .success()
        .stdout("6-7\n");

    let output = code_embed(vault.path())
        .args(["locate", "src/app.py", "--lang", "py", "--function", "foo", "--json"])
        .output()
        .expect("command run");
    assert!(output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(body["language"], "python");
    assert_eq!(body["start_line"], 3);
    assert_eq!(body["end_line"], 4);
    assert_eq!(body["line_count"], 2);
}

#[test]
fn locate_missing_function_fails() {
    let vault = setup_vault();

    code_embed(vault.path())
        .args(["locate", "src/app.py", "--function", "baz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot locate baz"));
}

#[test]
fn templates_file_adds_languages() {
    let vault = setup_vault();
    fs::write(
        vault.path().join("templates.toml"),
        "[languages.nim]\nstart = 'proc\\s+{name}\\s*\\('\nend = \"indent\"\n",
    )
    .unwrap();
    fs::write(
        vault.path().join("src/hello.nim"),
        "proc greet(name: string) =\n  echo name\n\ngreet(\"x\")\n",
    )
    .unwrap();

    code_embed(vault.path())
        .args(["--templates", "templates.toml", "locate", "src/hello.nim"])
        .args(["--function", "greet"])
        .assert()
        .success()
        .stdout("1-2\n");

    code_embed(vault.path())
        .args(["--templates", "templates.toml", "languages"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nim"));
}

#[test]
fn languages_json_lists_builtins() {
    let vault = setup_vault();

    let output = code_embed(vault.path())
        .args(["languages", "--json"])
        .output()
        .expect("command run");
    assert!(output.status.success());

    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let ids: Vec<&str> = body["languages"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|entry| entry["id"].as_str())
        .collect();
    for id in ["bash", "c", "csharp", "javascript", "python", "ruby"] {
        assert!(ids.contains(&id), "missing {id}");
    }
    assert_eq!(body["aliases"]["py"], "python");
}
