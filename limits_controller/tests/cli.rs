//! Command line behaviour that does not need a cluster.
use assert_cmd::Command;
use predicates::prelude::*;

const ENV: [&str; 11] = [
    "LIMITS_CONFIGMAP_NAME",
    "LIMITS_CONFIGMAP_LIMITS_PATH",
    "LIMITS_CONFIGMAP_GENERATED_NAME",
    "LIMITS_STATEFULSET_LABEL",
    "LIMITS_ACTIVE_SERIES_MAX",
    "LIMITS_INTERVAL",
    "NAMESPACE",
    "LOG_LEVEL",
    "LOG_FORMAT",
    "LOG_DESTINATION",
    "KUBECONFIG",
];

fn controller() -> Command {
    let mut cmd = Command::cargo_bin("thanos-limits-controller").unwrap();
    for var in ENV {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn help() {
    controller()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--configmap-name")
                .and(predicate::str::contains("--configmap-generated-name"))
                .and(predicate::str::contains("--active-series-max"))
                .and(predicate::str::contains("--interval"))
                .and(predicate::str::contains("--log-level")),
        );
}

#[test]
fn missing_required_flags() {
    controller()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--configmap-name"));

    controller()
        .args(["--configmap-name", "thanos-limits"])
        .args(["--configmap-generated-name", "thanos-limits-generated"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--active-series-max"));
}

#[test]
fn zero_capacity() {
    controller()
        .args(["--configmap-name", "thanos-limits"])
        .args(["--configmap-generated-name", "thanos-limits-generated"])
        .args(["--active-series-max", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--active-series-max"));
}

#[test]
fn bad_interval() {
    controller()
        .args(["--configmap-name", "thanos-limits"])
        .args(["--configmap-generated-name", "thanos-limits-generated"])
        .args(["--active-series-max", "1000"])
        .args(["--interval", "every now and then"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--interval"));
}

#[test]
fn generated_name_must_differ_from_source() {
    controller()
        .args(["--configmap-name", "thanos-limits"])
        .args(["--configmap-generated-name", "thanos-limits"])
        .args(["--active-series-max", "1000"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid configuration").and(
            predicate::str::contains("must differ from --configmap-name"),
        ));
}

#[test]
fn flags_from_environment() {
    controller()
        .env("LIMITS_CONFIGMAP_NAME", "thanos-limits")
        .env("LIMITS_CONFIGMAP_GENERATED_NAME", "thanos-limits")
        .env("LIMITS_ACTIVE_SERIES_MAX", "1000")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid configuration"));
}
