//! End-to-end tests for the ct binary

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const QWEN_REQUEST: &str = r#"{
    "model": "Qwen/Qwen2.5-VL-7B-Instruct",
    "messages": [
        {"role": "user", "content": [
            {"type": "text", "text": "describe this image"},
            {"type": "image_url", "image_url": {"url": "https://example.com/cat.png"}}
        ]}
    ]
}"#;

fn ct(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ct").unwrap();
    // Keep user/project config out of the picture
    cmd.current_dir(temp.path()).env("HOME", temp.path()).env("XDG_CONFIG_HOME", temp.path());
    cmd
}

#[test]
fn test_render_matches_model() {
    let temp = TempDir::new().unwrap();
    let request = temp.path().join("request.json");
    fs::write(&request, QWEN_REQUEST).unwrap();

    ct(&temp)
        .arg("render")
        .arg(&request)
        .assert()
        .success()
        .stdout(
            "<|im_start|>system\nYou are a helpful assistant.<|im_end|>\n<|im_start|>user\ndescribe this image<|vision_start|><|image_pad|><|vision_end|><|im_end|>\n<|im_start|>assistant\n",
        )
        .stderr(predicate::str::contains("https://example.com/cat.png"));
}

#[test]
fn test_render_from_stdin_with_template_and_system() {
    let temp = TempDir::new().unwrap();

    ct(&temp)
        .args(["render", "-", "--template", "chatml", "--system", "Be brief."])
        .write_stdin(r#"{"messages": [{"role": "user", "content": "hello"}]}"#)
        .assert()
        .success()
        .stdout("<|im_start|>system\nBe brief.<|im_end|>\n<|im_start|>user\nhello<|im_end|>\n<|im_start|>assistant\n");
}

#[test]
fn test_render_json_output() {
    let temp = TempDir::new().unwrap();
    let request = temp.path().join("request.json");
    fs::write(&request, QWEN_REQUEST).unwrap();

    let output = ct(&temp).args(["render", "--json"]).arg(&request).output().unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["media"][0]["kind"], "image");
    assert_eq!(value["media"][0]["url"], "https://example.com/cat.png");
    assert_eq!(value["stop"][0], "<|im_end|>");
    assert!(value["prompt"].as_str().unwrap().ends_with("<|im_start|>assistant\n"));
}

#[test]
fn test_render_continue() {
    let temp = TempDir::new().unwrap();

    ct(&temp)
        .args(["render", "-", "--template", "chatml", "--continue"])
        .write_stdin(r#"{"messages": [{"role": "user", "content": "hi"}, {"role": "assistant", "content": "Hel"}]}"#)
        .assert()
        .success()
        .stdout("<|im_start|>user\nhi<|im_end|>\n<|im_start|>assistant\nHel");
}

#[test]
fn test_render_unknown_role_fails() {
    let temp = TempDir::new().unwrap();

    ct(&temp)
        .args(["render", "-", "--template", "chatml"])
        .write_stdin(r#"{"messages": [{"role": "tool", "content": "x"}]}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported message role"));
}

#[test]
fn test_render_unmatched_model_fails() {
    let temp = TempDir::new().unwrap();

    ct(&temp)
        .args(["render", "-"])
        .write_stdin(r#"{"model": "gpt2", "messages": [{"role": "user", "content": "x"}]}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--template"));
}

#[test]
fn test_list_and_show() {
    let temp = TempDir::new().unwrap();

    ct(&temp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("qwen2-vl").and(predicate::str::contains("llama-3-instruct")));

    ct(&temp)
        .args(["show", "qwen2-vl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("style: no_colon_two"));
}

#[test]
fn test_config_registers_template_files() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("extra.yml"),
        "name: plain-qa\nroles:\n  user: \"Q\"\n  assistant: \"A\"\nstyle: add_colon_single\nsep: \"\\n\"\n",
    )
    .unwrap();
    fs::write(
        temp.path().join("chattemplate.yml"),
        "default-template: plain-qa\ntemplate-files:\n  - extra.yml\n",
    )
    .unwrap();

    ct(&temp)
        .args(["render", "-"])
        .write_stdin(r#"{"messages": [{"role": "user", "content": "2+2?"}]}"#)
        .assert()
        .success()
        .stdout("Q: 2+2?\nA:");
}

#[test]
fn test_model_match_beats_config_default() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("chattemplate.yml"), "default-template: chatml\n").unwrap();

    ct(&temp)
        .args(["render", "-"])
        .write_stdin(r#"{"model": "Qwen/Qwen2.5-VL-7B-Instruct", "messages": [{"role": "user", "content": "hi"}]}"#)
        .assert()
        .success()
        .stdout("<|im_start|>system\nYou are a helpful assistant.<|im_end|>\n<|im_start|>user\nhi<|im_end|>\n<|im_start|>assistant\n");

    ct(&temp)
        .args(["render", "-"])
        .write_stdin(r#"{"model": "gpt2", "messages": [{"role": "user", "content": "hi"}]}"#)
        .assert()
        .success()
        .stdout("<|im_start|>user\nhi<|im_end|>\n<|im_start|>assistant\n");
}
