use std::fs;
use std::path::Path;
use std::process::Command;

const REGULAR_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";
const BOLD_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf";

fn cargo_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_report-pdf"))
}

fn output_dir() -> &'static Path {
    Path::new("tests/output")
}

fn setup() {
    fs::create_dir_all(output_dir()).expect("Failed to create output directory");
}

fn cleanup_file(name: &str) {
    let path = output_dir().join(name);
    if path.exists() {
        fs::remove_file(&path).ok();
    }
}

fn output_path(name: &str) -> String {
    format!("tests/output/{}", name)
}

fn local_fonts_available() -> bool {
    Path::new(REGULAR_FONT).exists() && Path::new(BOLD_FONT).exists()
}

#[test]
fn test_renders_report_with_local_fonts() {
    if !local_fonts_available() {
        eprintln!("skipping: DejaVu fonts not installed");
        return;
    }
    setup();
    let output_file = "test-report.pdf";
    cleanup_file(output_file);

    let output = cargo_bin()
        .args([
            "-i", "tests/fixtures/report.json",
            "-d", "2025-02-01",
            "--regular-font", REGULAR_FONT,
            "--bold-font", BOLD_FONT,
            "-o", &output_path(output_file),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command failed: {:?}", output);

    let path = output_dir().join(output_file);
    assert!(path.exists(), "PDF file was not created");

    let bytes = fs::read(&path).expect("Failed to read PDF");
    assert!(bytes.starts_with(b"%PDF"), "Output is not a PDF");
    assert!(bytes.len() > 1000, "PDF file is too small, likely empty or corrupt");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Generated"));
    assert!(stdout.contains("01.02.2025"));
}

#[test]
fn test_font_fallback_skips_missing_source() {
    if !local_fonts_available() {
        eprintln!("skipping: DejaVu fonts not installed");
        return;
    }
    setup();
    let output_file = "test-fallback.pdf";
    cleanup_file(output_file);

    let output = cargo_bin()
        .args([
            "-i", "tests/fixtures/report.json",
            "-d", "2025-02-01",
            "--regular-font", "/nonexistent/regular.ttf",
            "--regular-font", REGULAR_FONT,
            "--bold-font", BOLD_FONT,
            "-c", "tests/fixtures/config.json",
            "-o", &output_path(output_file),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(output_dir().join(output_file).exists(), "PDF file was not created");
}

#[test]
fn test_unavailable_fonts_produce_no_output() {
    setup();
    let output_file = "test-no-fonts.pdf";
    cleanup_file(output_file);

    let output = cargo_bin()
        .args([
            "-i", "tests/fixtures/report.json",
            "--regular-font", "/nonexistent/regular.ttf",
            "--bold-font", "/nonexistent/bold.ttf",
            "-o", &output_path(output_file),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Command should have failed");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "Unexpected stderr: {}", stderr);
    assert!(stderr.contains("unavailable"), "Unexpected stderr: {}", stderr);
    assert!(!output_dir().join(output_file).exists(), "No file should be written");
}

#[test]
fn test_invalid_json_fails() {
    setup();
    let output_file = "test-invalid-json.pdf";
    cleanup_file(output_file);

    let output = cargo_bin()
        .args([
            "-i", "tests/fixtures/invalid.json",
            "-o", &output_path(output_file),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Command should have failed");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read document"), "Unexpected stderr: {}", stderr);
    assert!(!output_dir().join(output_file).exists());
}

#[test]
fn test_schema_violation_fails() {
    setup();
    let output_file = "test-schema.pdf";
    cleanup_file(output_file);

    let output = cargo_bin()
        .args([
            "-i", "tests/fixtures/wrong_columns.json",
            "-o", &output_path(output_file),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Command should have failed");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("report schema"), "Unexpected stderr: {}", stderr);
    assert!(stderr.contains("expected 13 columns"), "Unexpected stderr: {}", stderr);
    assert!(!output_dir().join(output_file).exists());
}

#[test]
fn test_missing_input_fails() {
    let output = cargo_bin()
        .args(["-i", "tests/fixtures/does-not-exist.json"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Command should have failed");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does-not-exist.json"), "Unexpected stderr: {}", stderr);
}

#[test]
fn test_invalid_date_format() {
    let output = cargo_bin()
        .args(["-i", "tests/fixtures/report.json", "-d", "01/02/2025"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Command should have failed with invalid date");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid date format"), "Unexpected stderr: {}", stderr);
}

#[test]
fn test_input_is_required() {
    let output = cargo_bin()
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Command should require --input");
}
