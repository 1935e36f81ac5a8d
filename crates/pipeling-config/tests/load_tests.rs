//! Table-driven tests for multi-directory configuration loading.

mod common;

use common::*;

use pipeling_config::resource::{ConnectionConfig, CredentialConfig};
use pipeling_config::{ConfigError, LoadOptions, Loader};

/// Files to write before loading: `(directory, filename, content)`.
type Files = Vec<(&'static str, &'static str, String)>;

/// Expected outcome of a successful load.
enum Expect {
    /// Credential `name` exists with AWS profile `profile`.
    AwsCredential(&'static str, &'static str),
    /// Connection `name` exists with AWS profile `profile`.
    AwsConnection(&'static str, &'static str),
    Notifier(&'static str),
    Missing(&'static str),
}

struct LoadTestCase {
    name: &'static str,
    files: fn() -> Files,
    dirs: &'static [&'static str],
    expect: &'static [Expect],
}

const LOAD_TESTS: &[LoadTestCase] = &[
    LoadTestCase {
        name: "credential_derives_connection",
        files: || vec![("a", "creds.yaml", aws_credential("prod_conn", "prod1"))],
        dirs: &["a", "b"],
        expect: &[
            Expect::AwsCredential("aws.prod_conn", "prod1"),
            Expect::AwsConnection("aws.prod_conn", "prod1"),
        ],
    },
    LoadTestCase {
        name: "first_directory_wins",
        files: || {
            vec![
                ("a", "creds.yaml", aws_credential("shared", "from_a")),
                ("b", "creds.yaml", aws_credential("shared", "from_b")),
            ]
        },
        dirs: &["a", "b"],
        expect: &[
            Expect::AwsCredential("aws.shared", "from_a"),
            Expect::AwsConnection("aws.shared", "from_a"),
        ],
    },
    LoadTestCase {
        name: "first_directory_wins_for_connections",
        files: || {
            vec![
                ("a", "conns.yaml", connection("aws", "prod").attr("profile", "from_a").build()),
                ("b", "conns.yaml", connection("aws", "prod").attr("profile", "from_b").build()),
            ]
        },
        dirs: &["a", "b"],
        expect: &[Expect::AwsConnection("aws.prod", "from_a")],
    },
    LoadTestCase {
        name: "later_directory_fills_gaps",
        files: || {
            vec![
                ("a", "creds.yaml", aws_credential("one", "p1")),
                ("b", "creds.yaml", aws_credential("two", "p2")),
            ]
        },
        dirs: &["a", "b"],
        expect: &[
            Expect::AwsCredential("aws.one", "p1"),
            Expect::AwsCredential("aws.two", "p2"),
        ],
    },
    LoadTestCase {
        name: "declared_connection_not_overridden",
        files: || {
            vec![(
                "a",
                "main.yaml",
                [
                    aws_credential("prod", "from_credential"),
                    connection("aws", "prod")
                        .attr("profile", "from_connection")
                        .build(),
                ]
                .join("---\n"),
            )]
        },
        dirs: &["a"],
        expect: &[
            Expect::AwsCredential("aws.prod", "from_credential"),
            Expect::AwsConnection("aws.prod", "from_connection"),
        ],
    },
    LoadTestCase {
        name: "defaults_present",
        files: Vec::new,
        dirs: &["a"],
        expect: &[
            Expect::Notifier("default"),
            Expect::AwsCredential("aws.default", ""),
        ],
    },
    LoadTestCase {
        name: "notifier_in_later_dir_references_earlier_integration",
        files: || {
            vec![
                ("a", "integrations.yaml", slack_integration("ops", "https://hooks.example/ops")),
                ("b", "notifiers.yaml", notifier("oncall", &[("integration.slack.ops", "#alerts")])),
            ]
        },
        dirs: &["a", "b"],
        expect: &[Expect::Notifier("oncall")],
    },
    LoadTestCase {
        name: "unknown_kinds_ignored",
        files: || {
            vec![(
                "a",
                "mixed.yaml",
                [
                    BlockBuilder::new("Pipeline", "deploy").attr("steps", "[]").build(),
                    aws_credential("kept", "p"),
                ]
                .join("---\n"),
            )]
        },
        dirs: &["a"],
        expect: &[Expect::AwsCredential("aws.kept", "p"), Expect::Missing("aws.deploy")],
    },
    LoadTestCase {
        name: "lock_file_and_other_extensions_skipped",
        files: || {
            vec![
                ("a", "pipeling.lock.yaml", aws_credential("locked", "p")),
                ("a", "notes.txt", aws_credential("text", "p")),
                ("a", "real.yml", aws_credential("real", "p")),
            ]
        },
        dirs: &["a"],
        expect: &[
            Expect::AwsCredential("aws.real", "p"),
            Expect::Missing("aws.locked"),
            Expect::Missing("aws.text"),
        ],
    },
];

fn aws_profile(config: &CredentialConfig) -> Option<&str> {
    match config {
        CredentialConfig::Aws(aws) => aws.profile.as_deref(),
        _ => None,
    }
}

#[test]
fn test_load_cases() {
    for case in LOAD_TESTS {
        let harness = ConfigHarness::new();
        for (dir, file, content) in (case.files)() {
            harness.write(dir, file, &content);
        }
        let outcome = match harness.load(case.dirs) {
            Ok(o) => o,
            Err(e) => panic!("[{}] load failed: {}", case.name, e),
        };
        let snapshot = &outcome.snapshot;

        for expect in case.expect {
            match expect {
                Expect::AwsCredential(name, profile) => {
                    let credential = snapshot
                        .credentials
                        .get(*name)
                        .unwrap_or_else(|| panic!("[{}] missing credential {}", case.name, name));
                    let expected = (!profile.is_empty()).then_some(*profile);
                    assert_eq!(aws_profile(&credential.config), expected, "[{}] {}", case.name, name);
                }
                Expect::AwsConnection(name, profile) => {
                    let connection = snapshot
                        .pipeling_connections
                        .get(*name)
                        .unwrap_or_else(|| panic!("[{}] missing connection {}", case.name, name));
                    match &connection.config {
                        ConnectionConfig::Aws(aws) => {
                            assert_eq!(aws.profile.as_deref(), Some(*profile), "[{}] {}", case.name, name)
                        }
                        other => panic!("[{}] {} is not aws: {:?}", case.name, name, other),
                    }
                }
                Expect::Notifier(name) => {
                    assert!(
                        snapshot.notifiers.contains_key(*name),
                        "[{}] missing notifier {}",
                        case.name,
                        name
                    );
                }
                Expect::Missing(name) => {
                    assert!(
                        !snapshot.credentials.contains_key(*name),
                        "[{}] unexpected credential {}",
                        case.name,
                        name
                    );
                }
            }
        }
    }
}

struct FailureTestCase {
    name: &'static str,
    content: fn() -> String,
    expected_error: &'static str,
}

const FAILURE_TESTS: &[FailureTestCase] = &[
    FailureTestCase {
        name: "invalid_yaml",
        content: || "apiVersion: pipeling.io/v1\nkind: [unclosed\n".to_string(),
        expected_error: "",
    },
    FailureTestCase {
        name: "wrong_api_version",
        content: || "apiVersion: v0\nkind: Credential\nmetadata:\n  name: a\n  type: aws\n".to_string(),
        expected_error: "v0",
    },
    FailureTestCase {
        name: "unknown_metadata_field",
        content: || {
            "apiVersion: pipeling.io/v1\nkind: Credential\nmetadata:\n  name: a\n  type: aws\n  owner: me\n"
                .to_string()
        },
        expected_error: "owner",
    },
    FailureTestCase {
        name: "incomplete_aws_keys",
        content: || credential("aws", "half").attr("access_key", "AKIA").build(),
        expected_error: "half",
    },
    FailureTestCase {
        name: "unsupported_credential_type",
        content: || credential("mainframe", "old").build(),
        expected_error: "mainframe",
    },
    FailureTestCase {
        name: "invalid_name",
        content: || aws_credential("bad.name", "p"),
        expected_error: "bad.name",
    },
    FailureTestCase {
        name: "unresolved_integration_reference",
        content: || notifier("lost", &[("integration.slack.nowhere", "#x")]),
        expected_error: "lost",
    },
];

#[test]
fn test_load_failures() {
    for case in FAILURE_TESTS {
        let harness = ConfigHarness::new();
        harness.write("a", "main.yaml", &(case.content)());

        let err = harness.load_err(&["a"]);
        assert!(
            matches!(err, ConfigError::Diagnostics { .. }),
            "[{}] unexpected error kind: {:?}",
            case.name,
            err
        );
        let message = err.to_string();
        assert!(
            message.contains(case.expected_error),
            "[{}] expected '{}' in: {}",
            case.name,
            case.expected_error,
            message
        );
    }
}

#[test]
fn test_missing_directory_is_fatal() {
    let harness = ConfigHarness::new();
    let missing = harness.temp_path().join("absent");
    let err = Loader::new().load(&[missing]).unwrap_err();
    assert!(matches!(err, ConfigError::ReadDirectory { .. }));
}

#[test]
fn test_pass_limit_reports_not_converged() {
    let harness = ConfigHarness::new();
    harness.write("a", "main.yaml", &credential("aws", "half").attr("access_key", "AKIA").build());

    let loader = Loader::new().options(LoadOptions {
        max_decode_passes: 1,
        ..Default::default()
    });
    let err = loader.load(&harness.paths(&["a"])).unwrap_err();
    match err {
        ConfigError::NotConverged { passes, diagnostics } => {
            assert_eq!(passes, 1);
            assert!(diagnostics.has_errors());
        }
        other => panic!("expected NotConverged, got {:?}", other),
    }
}

#[test]
fn test_load_is_idempotent() {
    let harness = ConfigHarness::new();
    harness.write("a", "creds.yaml", &aws_credential("prod", "p1"));
    harness.write("a", "integrations.yaml", &slack_integration("ops", "https://hooks.example/ops"));
    harness.write("b", "notifiers.yaml", &notifier("oncall", &[("integration.slack.ops", "#alerts")]));

    let first = harness.load_ok(&["a", "b"]);
    let second = harness.load_ok(&["a", "b"]);
    assert!(first.snapshot.equals(&second.snapshot));
    assert!(second.snapshot.equals(&first.snapshot));
}

#[test]
fn test_notifier_value_carries_integration() {
    let harness = ConfigHarness::new();
    harness.write("a", "integrations.yaml", &slack_integration("ops", "https://hooks.example/ops"));
    harness.write("b", "notifiers.yaml", &notifier("oncall", &[("integration.slack.ops", "#alerts")]));

    let outcome = harness.load_ok(&["a", "b"]);
    let values = outcome.snapshot.notifier_value_map();
    let oncall = &values["oncall"];
    assert_eq!(oncall["resource_type"], "notifier");
    assert_eq!(oncall["notifies"][0]["channel"], "#alerts");
    assert_eq!(
        oncall["notifies"][0]["integration"]["webhook_url"],
        "https://hooks.example/ops"
    );
}

#[test]
fn test_multi_document_errors_point_at_lines() {
    let harness = ConfigHarness::new();
    harness.write_documents(
        "a",
        "main.yaml",
        &[
            aws_credential("good", "p"),
            credential("aws", "bad").attr("access_key", "AKIA").build(),
        ],
    );

    let message = harness.load_err(&["a"]).to_string();
    assert!(message.contains("main.yaml"), "{}", message);
    assert!(message.contains("bad"), "{}", message);
}

#[cfg(unix)]
#[test]
fn test_symlinked_file_is_loaded() {
    let harness = ConfigHarness::new();
    let target = harness.write("shared", "creds.yaml", &aws_credential("linked", "p1"));
    std::os::unix::fs::symlink(&target, harness.dir("a").join("creds.yaml")).unwrap();

    let outcome = harness.load_ok(&["a"]);
    let credential = &outcome.snapshot.credentials["aws.linked"];
    assert_eq!(aws_profile(&credential.config), Some("p1"));
    assert!(outcome.snapshot.pipeling_connections.contains_key("aws.linked"));
}

#[test]
fn test_separator_with_trailing_comment() {
    let harness = ConfigHarness::new();
    harness.write(
        "a",
        "main.yaml",
        &format!(
            "{}--- # ops integrations\n{}...\n",
            aws_credential("first", "p1"),
            slack_integration("ops", "https://hooks.example/ops")
        ),
    );

    let outcome = harness.load_ok(&["a"]);
    assert!(outcome.snapshot.credentials.contains_key("aws.first"));
    assert!(outcome.snapshot.integrations.contains_key("slack.ops"));
}
