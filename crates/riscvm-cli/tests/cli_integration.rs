//! Integration tests for the riscvm CLI.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use clap as _;
use riscvm_core::{
    assemble_i, assemble_j, assemble_s, assemble_u, Image, Opcode, CONSOLE_READ_SIGNED_INT,
    CONSOLE_WRITE_SIGNED_INT, HALT,
};

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_riscvm"))
}

fn port(addr: u32) -> i32 {
    i32::try_from(addr).expect("port fits") - 0x1000
}

fn print_ten() -> Vec<u32> {
    vec![
        assemble_i(Opcode::OpImm, 5, 0, 0, 10),
        assemble_u(Opcode::Lui, 6, 0x1000),
        assemble_s(Opcode::Store, 2, 6, 5, port(CONSOLE_WRITE_SIGNED_INT)),
        assemble_s(Opcode::Store, 2, 6, 0, port(HALT)),
    ]
}

fn write_image(dir: &Path, name: &str, words: &[u32]) -> PathBuf {
    let image = Image::from_program(words).expect("program fits");
    let path = dir.join(name);
    fs::write(&path, image.as_bytes()).expect("write image");
    path
}

fn run_cli(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(binary_path())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run riscvm");
    child
        .stdin
        .take()
        .expect("piped stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait for riscvm")
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[test]
fn runs_image_until_halt() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let image = write_image(temp_dir.path(), "ten.bin", &print_ten());

    let output = run_cli(&[image.to_str().expect("utf-8 path")], "");

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(text(&output.stdout), "10");
    assert!(text(&output.stderr).contains("CPU Halt Requested"));
}

#[test]
fn echoes_integer_read_from_stdin() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let words = [
        assemble_u(Opcode::Lui, 6, 0x1000),
        assemble_i(Opcode::Load, 1, 2, 6, port(CONSOLE_READ_SIGNED_INT)),
        assemble_i(Opcode::OpImm, 1, 0, 1, 1),
        assemble_s(Opcode::Store, 2, 6, 1, port(CONSOLE_WRITE_SIGNED_INT)),
        assemble_s(Opcode::Store, 2, 6, 0, port(HALT)),
    ];
    let image = write_image(temp_dir.path(), "echo.bin", &words);

    let output = run_cli(&[image.to_str().expect("utf-8 path")], "41\n");

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(text(&output.stdout), "42");
}

#[test]
fn rejects_image_of_wrong_size() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let path = temp_dir.path().join("short.bin");
    fs::write(&path, [0_u8; 12]).expect("write image");

    let output = run_cli(&[path.to_str().expect("utf-8 path")], "");

    assert_eq!(output.status.code(), Some(1));
    assert!(text(&output.stderr).contains("error: image is 12 bytes, expected exactly 2048"));
    assert!(output.stdout.is_empty());
}

#[test]
fn reports_missing_image() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let path = temp_dir.path().join("absent.bin");

    let output = run_cli(&[path.to_str().expect("utf-8 path")], "");

    assert_eq!(output.status.code(), Some(1));
    assert!(text(&output.stderr).contains("error: cannot open image"));
}

#[test]
fn unsupported_opcode_is_fatal() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let image = write_image(temp_dir.path(), "zero.bin", &[]);

    let output = run_cli(&[image.to_str().expect("utf-8 path")], "");

    assert_eq!(output.status.code(), Some(1));
    assert!(text(&output.stderr).contains("error: unsupported opcode 0x00"));
    assert!(!text(&output.stderr).contains("CPU Halt Requested"));
}

#[test]
fn step_limit_stops_runaway_program() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let image = write_image(
        temp_dir.path(),
        "spin.bin",
        &[assemble_j(Opcode::Jal, 0, 0)],
    );

    let output = run_cli(
        &["--max-steps", "10", image.to_str().expect("utf-8 path")],
        "",
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(text(&output.stderr).contains("step limit of 10 instructions exceeded"));
}

#[test]
fn trace_writes_json_lines_to_stderr() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let image = write_image(temp_dir.path(), "ten.bin", &print_ten());

    let output = run_cli(&["--trace", image.to_str().expect("utf-8 path")], "");

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(text(&output.stdout), "10");
    let stderr = text(&output.stderr);
    let events: Vec<serde_json::Value> = stderr
        .lines()
        .filter(|line| line.starts_with('{'))
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(events[0]["disasm"], "addi x5, x0, 10");
    assert_eq!(events[0]["event"]["InstructionStart"]["pc"], 0);
    assert_eq!(
        events.last().expect("events")["event"]["Halted"]["pc"],
        12
    );
}

#[test]
fn disassemble_lists_image_without_running() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let image = write_image(temp_dir.path(), "ten.bin", &print_ten());

    let output = run_cli(
        &["--disassemble", image.to_str().expect("utf-8 path")],
        "",
    );

    assert_eq!(output.status.code(), Some(0));
    let stdout = text(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 512);
    assert_eq!(lines[0], "00000000: 00a00293  addi x5, x0, 10");
    assert_eq!(lines[2], "00000008: 80532223  sw x5, -2044(x6)");
    assert_eq!(lines[4], "00000010: 00000000  .word 0x00000000");
    assert!(text(&output.stderr).is_empty());
}
