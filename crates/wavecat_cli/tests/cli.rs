use std::io::Write;
use std::process::{Command, Output, Stdio};

const REQUEST: &str =
    r#"{"name":"Bsub3","params":{"l1":[-1,1,4],"l2":[-1,1,3]},"vars":{"k":1},"mode":"module"}"#;

fn run_cli(args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_wavecat"))
        .args(args)
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn wavecat");
    {
        let mut pipe = child.stdin.take().expect("stdin");
        if let Some(input) = stdin {
            pipe.write_all(input.as_bytes()).expect("write stdin");
        }
    }
    child.wait_with_output().expect("wait for wavecat")
}

fn grid(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn sequential_and_parallel_runs_print_the_same_grid() {
    let sequential = grid(&run_cli(&["--sequential", REQUEST], None));
    let parallel = grid(&run_cli(&["--workers", "2", "--no-cache", REQUEST], None));
    assert_eq!(sequential["data"].as_array().expect("rows").len(), 4);
    let (a, b) = (
        sequential["data"][1][2].as_f64().expect("cell"),
        parallel["data"][1][2].as_f64().expect("cell"),
    );
    assert!((a - b).abs() < 1e-9);
}

#[test]
fn request_is_read_from_stdin_and_mode_can_be_overridden() {
    let value = grid(&run_cli(&["--mode", "phase"], Some(REQUEST)));
    assert!(value["maxZ"].as_f64().expect("maxZ") <= 180.0);
    assert!(value["minZ"].as_f64().expect("minZ") >= -180.0);
}

#[test]
fn unknown_model_fails_with_message() {
    let output = run_cli(&[r#"{"name":"Zsub9","params":{}}"#], None);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not registered"), "stderr: {stderr}");
}

#[test]
fn list_prints_builtin_models() {
    let output = run_cli(&["--list"], None);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let names: Vec<_> = stdout.lines().collect();
    assert_eq!(names, vec!["Asub3", "Bsub3", "Csub3", "Asub3_re"]);
}
