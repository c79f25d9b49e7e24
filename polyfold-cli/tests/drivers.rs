mod common;

use assert_cmd::Command;
use tempfile::TempDir;

use crate::common::{write_fasta, write_param_dir, write_structure_file};

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(sequence: &str) -> Self {
        let dir = TempDir::new().unwrap();
        write_param_dir(&dir.path().join("params"));
        write_fasta(&dir.path().join("input.fasta"), sequence);
        Self { dir }
    }

    fn paramdir(&self) -> String {
        self.dir.path().join("params").display().to_string()
    }

    fn sequence(&self) -> String {
        self.dir.path().join("input.fasta").display().to_string()
    }
}

#[test]
fn findmfe_reports_the_triple_helix() {
    let fixture = Fixture::new("GGGAAACCC");
    let output = Command::cargo_bin("findmfe")
        .unwrap()
        .args([
            "--sequence",
            &fixture.sequence(),
            "--paramdir",
            &fixture.paramdir(),
            "--dangle-model",
            "0",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("GGGAAACCC"));
    assert!(text.contains("(((...)))"));
    assert!(text.contains("-6/5"));
}

#[test]
fn findmfe_writes_the_requested_outfile() {
    let fixture = Fixture::new("GGGAAACCC");
    let outfile = fixture.dir.path().join("result.txt");
    Command::cargo_bin("findmfe")
        .unwrap()
        .args([
            "--sequence",
            &fixture.sequence(),
            "--paramdir",
            &fixture.paramdir(),
            "--dangle-model",
            "0",
            "--outfile",
            outfile.to_str().unwrap(),
        ])
        .assert()
        .success();
    let text = std::fs::read_to_string(outfile).unwrap();
    assert!(text.contains("(((...)))"));
}

#[test]
fn findmfe_transform_output_shifts_by_the_classical_weights() {
    // With a favorable initiation term, GGAAACGAAACC folds into the
    // two-branch multiloop with score vector (1, 0, 3, 54/5): two size-3
    // hairpins at 5.4 under a GC closing pair. Under (-20, 0, 0.4, 1)
    // its energy is -20 + 3 * 0.4 + 54/5 = -8; re-expressed as
    // deviations from the classical weights it shifts by exactly
    // a + 3c = 23/5, to -63/5.
    let fixture = Fixture::new("GGAAACGAAACC");
    let base = [
        "--sequence".to_string(),
        fixture.sequence(),
        "--paramdir".to_string(),
        fixture.paramdir(),
        "--dangle-model".to_string(),
        "0".to_string(),
        "-a".to_string(),
        "-20".to_string(),
        "-c".to_string(),
        "0.4".to_string(),
        "-d".to_string(),
        "1".to_string(),
    ];

    let plain = Command::cargo_bin("findmfe")
        .unwrap()
        .args(&base)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let plain = String::from_utf8(plain).unwrap();
    assert!(plain.contains("((...)(...))"), "got {plain}");
    assert!(plain.contains("\t-8\t"), "got {plain}");

    let transformed = Command::cargo_bin("findmfe")
        .unwrap()
        .args(&base)
        .arg("--transform-output")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let transformed = String::from_utf8(transformed).unwrap();
    assert!(transformed.contains("((...)(...))"), "got {transformed}");
    assert!(transformed.contains("\t-63/5\t"), "got {transformed}");
}

#[test]
fn usage_errors_exit_one() {
    let fixture = Fixture::new("GGGAAACCC");

    // missing required --sequence
    Command::cargo_bin("findmfe")
        .unwrap()
        .assert()
        .failure()
        .code(1);

    // bad dangle model is a validation failure after parsing
    Command::cargo_bin("findmfe")
        .unwrap()
        .args([
            "--sequence",
            &fixture.sequence(),
            "--paramdir",
            &fixture.paramdir(),
            "--dangle-model",
            "9",
        ])
        .assert()
        .failure();
}

#[test]
fn missing_parameter_tables_fail_cleanly() {
    let fixture = Fixture::new("GGGAAACCC");
    Command::cargo_bin("findmfe")
        .unwrap()
        .args([
            "--sequence",
            &fixture.sequence(),
            "--paramdir",
            "/nonexistent/params",
            "--dangle-model",
            "0",
        ])
        .assert()
        .failure();
}

#[test]
fn subopt_counts_every_structure_in_a_wide_window() {
    let fixture = Fixture::new("GGGAAACCC");
    // Nine admissible pairs between the G run and the C run; the
    // non-crossing matchings number sum_k C(3,k)^2 = 20.
    let output = Command::cargo_bin("subopt")
        .unwrap()
        .args([
            "--sequence",
            &fixture.sequence(),
            "--paramdir",
            &fixture.paramdir(),
            "--dangle-model",
            "0",
            "--delta",
            "1000",
            "--consoleout",
            "--sorted",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("Found 20 suboptimal structures."));
    assert!(text.contains("#\tCoefficients:"));
    // sorted: the MFE structure is row 0
    assert!(text.lines().any(|line| line.starts_with("0\t(((...)))")));
}

#[test]
fn subopt_defaults_to_a_listing_file() {
    let fixture = Fixture::new("GGGAAACCC");
    Command::cargo_bin("subopt")
        .unwrap()
        .args([
            "--sequence",
            &fixture.sequence(),
            "--paramdir",
            &fixture.paramdir(),
            "--dangle-model",
            "0",
            "--delta",
            "2",
        ])
        .assert()
        .success();
    let listing = fixture.dir.path().join("input.rnasubopt");
    assert!(listing.exists());
}

#[test]
fn rnascorer_matches_findmfe_on_the_same_structure() {
    let fixture = Fixture::new("GGGAAACCC");
    let structure_file = fixture.dir.path().join("helix.txt");
    write_structure_file(&structure_file, "GGGAAACCC", "(((...)))");

    let output = Command::cargo_bin("rnascorer")
        .unwrap()
        .args([
            "--structure",
            structure_file.to_str().unwrap(),
            "--paramdir",
            &fixture.paramdir(),
            "--dangle-model",
            "0",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("Computed energy -6/5"), "got {text}");
}

#[test]
fn rnascorer_rejects_incompatible_structures() {
    let fixture = Fixture::new("GGGAAACCC");
    let structure_file = fixture.dir.path().join("bad.txt");
    write_structure_file(&structure_file, "AAAAAAAAA", "(((...)))");

    Command::cargo_bin("rnascorer")
        .unwrap()
        .args([
            "--structure",
            structure_file.to_str().unwrap(),
            "--paramdir",
            &fixture.paramdir(),
        ])
        .assert()
        .failure();
}

#[test]
fn parametrizer_writes_the_polytope_file() {
    let fixture = Fixture::new("GGGAAACCC");
    let outfile = fixture.dir.path().join("out.rnapoly");
    let output = Command::cargo_bin("parametrizer")
        .unwrap()
        .args([
            "--sequence",
            &fixture.sequence(),
            "--paramdir",
            &fixture.paramdir(),
            "--dangle-model",
            "0",
            "--outfile",
            outfile.to_str().unwrap(),
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("Polytope has"));

    let written = std::fs::read_to_string(outfile).unwrap();
    assert!(written.starts_with("# Points: "));
    assert!(written.contains("# Facets: "));
    assert!(written.contains("GGGAAACCC"));
    assert!(written.contains("(((...)))"));
}

#[test]
fn rectangle_sweep_dedups_structures_across_the_grid() {
    let fixture = Fixture::new("GGGAAACCC");
    // No multiloops are possible, so every grid point folds identically
    // and exactly one structure is reported.
    let output = Command::cargo_bin("findmfe-rectangle")
        .unwrap()
        .args([
            "--sequence",
            &fixture.sequence(),
            "--paramdir",
            &fixture.paramdir(),
            "--dangle-model",
            "0",
            "-a",
            "0",
            "-A",
            "2",
            "-c",
            "0",
            "-C",
            "2",
            "--step-size",
            "1",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().filter(|line| !line.is_empty()).collect();
    assert_eq!(lines.len(), 1, "got {text}");
    assert!(lines[0].starts_with("(((...)))"));
}

#[test]
fn rectangle_sweep_honors_the_transform_flags() {
    // The single transformed grid point (-20, 0) untransforms to
    // (-83/5, 0, 2/5, 1), which favors the multiloop at -4.6; with
    // --transform-output its energy reads -20 * 1 + 54/5 = -46/5.
    let fixture = Fixture::new("GGAAACGAAACC");
    let output = Command::cargo_bin("findmfe-rectangle")
        .unwrap()
        .args([
            "--sequence",
            &fixture.sequence(),
            "--paramdir",
            &fixture.paramdir(),
            "--dangle-model",
            "0",
            "-a",
            "-20",
            "-A",
            "-20",
            "-c",
            "0",
            "-C",
            "0",
            "--step-size",
            "1",
            "--transformed-input",
            "--transform-output",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().filter(|line| !line.is_empty()).collect();
    assert_eq!(lines.len(), 1, "got {text}");
    assert!(lines[0].starts_with("((...)(...))"), "got {text}");
    assert!(lines[0].ends_with("\t-46/5"), "got {text}");
}

#[test]
fn rectangle_sweep_rejects_nonpositive_steps() {
    let fixture = Fixture::new("GGGAAACCC");
    Command::cargo_bin("findmfe-rectangle")
        .unwrap()
        .args([
            "--sequence",
            &fixture.sequence(),
            "--paramdir",
            &fixture.paramdir(),
            "-a",
            "0",
            "-A",
            "1",
            "-c",
            "0",
            "-C",
            "1",
            "--step-size",
            "0",
        ])
        .assert()
        .failure();
}
