//! Integration tests for CLI commands

use std::process::Command;
use tempfile::TempDir;

/// Helper to run stackshift with the neutral test config
fn stackshift(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_stackshift"))
        .arg("--config")
        .arg(format!("{}/config.yaml", fixtures_path()))
        .args(args)
        .env_remove("STACKSHIFT_CATALOG")
        .env_remove("STACKSHIFT_OUTPUT_DIR")
        .env_remove("STACKSHIFT_MATCH_CUTOFF")
        .env_remove("STACKSHIFT_SECTION_CUTOFF")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute stackshift")
}

/// Get the fixtures path
fn fixtures_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures")
}

fn template(name: &str) -> String {
    format!("{}/templates/{}", fixtures_path(), name)
}

fn catalog() -> String {
    format!("{}/catalog.yaml", fixtures_path())
}

mod convert_command {
    use super::*;

    #[test]
    fn test_convert_to_stdout() {
        let output = stackshift(&[
            "convert",
            &template("queue.yaml"),
            "--catalog",
            &catalog(),
        ]);

        assert!(output.status.success(), "Expected success for a simple template");
        let stdout = String::from_utf8_lossy(&output.stdout);
        insta::assert_snapshot!(stdout, @r###"
        variable "env" {
          type = string
        }

        resource "aws_sqs_queue" "queue" {
          name = var.env
        }
        "###);

        // The report goes to stderr so stdout stays valid HCL
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("A single queue named after the environment"));
        assert!(stderr.contains("Converted Blocks"));
        assert!(stderr.contains("resource.aws_sqs_queue.queue"));
    }

    #[test]
    fn test_convert_quiet() {
        let output = stackshift(&[
            "convert",
            &template("queue.yaml"),
            "--catalog",
            &catalog(),
            "--quiet",
        ]);

        assert!(output.status.success());
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn test_convert_json_template() {
        let output = stackshift(&["convert", &template("stack.json"), "-c", &catalog(), "-q"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("variable \"stack_name\""));
        assert!(stdout.contains("variable \"queue_delay\""));
        assert!(stdout.contains("name = join(\"-\", [var.stack_name, \"jobs\"])"));
        assert!(stdout.contains("delay_seconds = var.queue_delay"));
        assert!(stdout.contains("value = aws_sqs_queue.jobs.arn"));
    }

    #[test]
    fn test_convert_short_form_tags() {
        let output = stackshift(&["convert", &template("web-stack.yaml"), "-c", &catalog(), "-q"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);

        // Auxiliary blocks come first
        let data = stdout.find("data \"aws_caller_identity\" \"current\"").unwrap();
        let bucket = stdout.find("resource \"aws_s3_bucket\" \"log_bucket\"").unwrap();
        assert!(data < bucket);

        assert!(stdout.contains("IsProd = var.env == \"prod\""));
        assert!(stdout.contains(
            "bucket = \"${var.env}-logs-${data.aws_caller_identity.current.account_id}\""
        ));
        assert!(stdout.contains("acl = \"public-read\""));
        assert!(stdout.contains("versioning {"));
        assert!(stdout.contains("target_bucket = aws_s3_bucket.log_bucket.id"));
        assert!(stdout.contains("depends_on = [\n    aws_s3_bucket.log_bucket\n  ]"));
        assert!(stdout.contains("count = local.IsProd ? 1 : 0"));
        assert!(stdout.contains("value = aws_s3_bucket.site_bucket.arn"));
        assert!(stdout.contains("// CF DeletionPolicy = \"Retain\""));
    }

    #[test]
    fn test_convert_report_lists_warnings() {
        let output = stackshift(&["convert", &template("web-stack.yaml"), "-c", &catalog()]);

        assert!(output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Conversion Notes"));
        assert!(stderr.contains("VersioningConfiguration.Status"));
        assert!(stderr.contains("Next Steps"));
    }

    #[test]
    fn test_convert_to_output_dir() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("terraform");

        let output = stackshift(&[
            "convert",
            &template("stack.json"),
            "--catalog",
            &catalog(),
            "--output-dir",
            out.to_str().unwrap(),
        ]);

        assert!(output.status.success());
        assert!(out.join("variable.tf").exists());
        assert!(out.join("resource.tf").exists());
        assert!(out.join("output.tf").exists());
        assert!(!out.join("locals.tf").exists());

        let resource = std::fs::read_to_string(out.join("resource.tf")).unwrap();
        assert!(resource.starts_with("resource \"aws_sqs_queue\" \"jobs\""));

        // The report moves to stdout when files are written
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Written Files"));
        assert!(stdout.contains("variable.tf"));
    }

    #[test]
    fn test_convert_output_dir_from_env() {
        let dir = TempDir::new().unwrap();

        let output = Command::new(env!("CARGO_BIN_EXE_stackshift"))
            .arg("--config")
            .arg(format!("{}/config.yaml", fixtures_path()))
            .args(["convert", template("queue.yaml").as_str(), "-q"])
            .env("STACKSHIFT_CATALOG", catalog())
            .env("STACKSHIFT_OUTPUT_DIR", dir.path())
            .output()
            .expect("Failed to execute stackshift");

        assert!(output.status.success());
        assert!(dir.path().join("resource.tf").exists());
        assert!(output.stdout.is_empty());
    }

    #[test]
    fn test_convert_catalog_from_config() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.yaml");
        std::fs::write(&config, format!("catalog: {}\n", catalog())).unwrap();

        let output = Command::new(env!("CARGO_BIN_EXE_stackshift"))
            .args(["--config", config.to_str().unwrap()])
            .args(["convert", template("queue.yaml").as_str(), "-q"])
            .env_remove("STACKSHIFT_CATALOG")
            .env_remove("STACKSHIFT_OUTPUT_DIR")
            .output()
            .expect("Failed to execute stackshift");

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("resource \"aws_sqs_queue\" \"queue\""));
    }

    #[test]
    fn test_unsupported_construct_kept_as_comment() {
        let output = stackshift(&["convert", &template("macro.yaml"), "-c", &catalog()]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("// CF Property(TopicName)"));

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Unsupported"));
        assert!(stderr.contains("Fn::Transform"));
    }
}

mod exit_codes {
    use super::*;

    #[test]
    fn test_strict_mode_fails() {
        let output = stackshift(&[
            "convert",
            &template("macro.yaml"),
            "--catalog",
            &catalog(),
            "--strict",
        ]);

        assert_eq!(output.status.code(), Some(2));
        assert!(output.stdout.is_empty());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("could not be converted"));
    }

    #[test]
    fn test_missing_catalog_is_usage_error() {
        let output = stackshift(&["convert", &template("queue.yaml")]);

        assert_eq!(output.status.code(), Some(64));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("No schema catalog given"));
    }

    #[test]
    fn test_template_without_resources() {
        let output = stackshift(&["convert", &template("no-resources.yaml"), "-c", &catalog()]);

        assert_eq!(output.status.code(), Some(3));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Resources"));
    }

    #[test]
    fn test_missing_template() {
        let output = stackshift(&["convert", &template("missing.yaml"), "-c", &catalog()]);

        assert_eq!(output.status.code(), Some(3));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Template not found"));
    }

    #[test]
    fn test_invalid_catalog() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("catalog.yaml");
        std::fs::write(&bad, "{}\n").unwrap();

        let output = stackshift(&[
            "convert",
            &template("queue.yaml"),
            "--catalog",
            bad.to_str().unwrap(),
        ]);

        assert_eq!(output.status.code(), Some(4));
    }

    #[test]
    fn test_invalid_config() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.yaml");
        std::fs::write(&config, "matchCutoff: high\n").unwrap();

        let output = Command::new(env!("CARGO_BIN_EXE_stackshift"))
            .args(["--config", config.to_str().unwrap()])
            .args(["convert", template("queue.yaml").as_str(), "-c", catalog().as_str()])
            .output()
            .expect("Failed to execute stackshift");

        assert_eq!(output.status.code(), Some(78));
    }

    #[test]
    fn test_cutoff_out_of_range() {
        let output = stackshift(&[
            "convert",
            &template("queue.yaml"),
            "-c",
            &catalog(),
            "--match-cutoff",
            "150",
        ]);

        assert_eq!(output.status.code(), Some(64));
    }
}

mod lookup_command {
    use super::*;

    #[test]
    fn test_lookup_fuzzy_type() {
        let output = stackshift(&["lookup", "AWS::SQS::Queue", "--catalog", &catalog()]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("aws_sqs_queue"));
        assert!(stdout.contains("delay_seconds"));
        assert!(stdout.contains("Attributes:"));
    }

    #[test]
    fn test_lookup_pinned_type_with_sections() {
        let output = stackshift(&["lookup", "AWS::S3::Bucket", "-c", &catalog()]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("aws_s3_bucket"));
        assert!(stdout.contains("Sections:"));
        assert!(stdout.contains("versioning [enabled, mfa_delete]"));
    }

    #[test]
    fn test_lookup_unknown_type() {
        let output = stackshift(&["lookup", "AWS::Kinesis::Stream", "-c", &catalog()]);

        assert_eq!(output.status.code(), Some(4));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("AWS::Kinesis::Stream"));
    }
}
