use std::{
    io::Write,
    path::PathBuf,
    process::{Command, Output, Stdio},
};

use pretty_assertions::assert_eq;

const SMALLSH: &str = env!("CARGO_BIN_EXE_smallsh");

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "smallsh_it_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .subsec_nanos()
    ))
}

fn run_script(script: &str) -> Output {
    let mut child = Command::new(SMALLSH)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_bytes())
        .unwrap();

    child.wait_with_output().unwrap()
}

fn stdout_of(script: &str) -> String {
    let output = run_script(script);
    assert!(output.status.success(), "{output:?}");
    String::from_utf8(output.stdout).unwrap()
}

/// Output lines with the prompts removed.
fn lines(stdout: &str) -> Vec<String> {
    stdout
        .split('\n')
        .map(|line| line.trim_start_matches(": ").to_string())
        .filter(|line| !line.is_empty() && line != ":")
        .collect()
}

#[test]
fn status_follows_foreground_commands() {
    let stdout = stdout_of("status\nfalse\nstatus\ntrue\nstatus\n");
    assert_eq!(
        lines(&stdout),
        ["exit value 0", "exit value 1", "exit value 0"]
    );
}

#[test]
fn comments_and_blank_lines_only_prompt() {
    let stdout = stdout_of("# echo hidden\n\n   \necho shown\n");
    assert_eq!(stdout, ": : : : shown\n: ");
}

#[test]
fn exit_ends_the_session() {
    let stdout = stdout_of("echo before\nexit\necho after\n");
    assert_eq!(lines(&stdout), ["before"]);
}

#[test]
fn redirections_round_trip_through_a_file() {
    let path = scratch_path("roundtrip");
    let stdout = stdout_of(&format!(
        "echo one two > {0}\nwc -w < {0}\n",
        path.display()
    ));
    assert_eq!(lines(&stdout).last().unwrap().trim(), "2");

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn missing_program_is_reported_and_recorded() {
    let stdout = stdout_of("smallsh-no-such-program\nstatus\n");
    assert_eq!(
        lines(&stdout),
        [
            "smallsh-no-such-program: no such file or directory",
            "exit value 1"
        ]
    );
}

#[test]
fn unopenable_input_is_reported_by_the_child() {
    let missing = scratch_path("missing_input");
    let stdout = stdout_of(&format!("cat < {}\nstatus\n", missing.display()));
    assert_eq!(
        lines(&stdout),
        [
            format!("smallsh: cannot open {} for input", missing.display()),
            "exit value 1".to_string()
        ]
    );
}

#[test]
fn signal_termination_is_printed_and_kept() {
    let script = scratch_path("self_kill.sh");
    std::fs::write(&script, "kill -TERM $$\n").unwrap();

    let stdout = stdout_of(&format!("sh {}\nstatus\nstatus\n", script.display()));
    let expected = format!("terminated by signal {}", libc::SIGTERM);
    assert_eq!(lines(&stdout), [expected.clone(), expected.clone(), expected]);

    std::fs::remove_file(&script).unwrap();
}

fn background_pids(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.trim_start_matches(": ").strip_prefix("background pid "))
        .filter(|rest| !rest.contains(' '))
        .map(str::to_string)
        .collect()
}

#[test]
fn every_background_job_is_reported_once() {
    let stdout = stdout_of("sleep 0.2 &\nsleep 0.4 &\nsleep 1\n");

    let pids = background_pids(&stdout);
    assert_eq!(pids.len(), 2, "{stdout}");
    for pid in pids {
        let notice = format!("background pid {pid} is done: exit value 0\n");
        assert_eq!(stdout.matches(&notice).count(), 1, "{stdout}");
    }
}

#[test]
fn background_jobs_read_from_the_null_device() {
    // `cat` would otherwise wait for the rest of the shell's input
    let stdout = stdout_of("cat &\nsleep 0.5\n");

    let pids = background_pids(&stdout);
    assert_eq!(pids.len(), 1, "{stdout}");
    assert!(stdout.contains(&format!("background pid {} is done: exit value 0\n", pids[0])));
}

#[test]
fn background_launch_resets_status() {
    let stdout = stdout_of("false\nstatus\ntrue &\nstatus\nsleep 0.3\n");
    // the completion notice may land anywhere
    let lines: Vec<_> = lines(&stdout)
        .into_iter()
        .filter(|line| !line.contains(" is done: "))
        .collect();
    assert_eq!(lines[0], "exit value 1");
    assert!(lines[1].starts_with("background pid "));
    assert_eq!(lines[2], "exit value 0");
}

#[test]
fn cd_changes_the_working_directory() {
    let directory = scratch_path("cd_target");
    std::fs::create_dir(&directory).unwrap();

    let stdout = stdout_of(&format!("cd {}\npwd\n", directory.display()));
    assert_eq!(
        lines(&stdout),
        [directory.canonicalize().unwrap().display().to_string()]
    );

    std::fs::remove_dir(&directory).unwrap();
}

#[test]
fn cd_without_argument_goes_home() {
    let home = scratch_path("home");
    std::fs::create_dir(&home).unwrap();

    let mut child = Command::new(SMALLSH)
        .env("HOME", &home)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"cd\npwd\n").unwrap();
    let output = child.wait_with_output().unwrap();

    assert_eq!(
        lines(&String::from_utf8(output.stdout).unwrap()),
        [home.canonicalize().unwrap().display().to_string()]
    );

    std::fs::remove_dir(&home).unwrap();
}

#[test]
fn cd_failure_goes_to_stderr() {
    let missing = scratch_path("no_such_dir");
    let output = run_script(&format!("cd {}\nstatus\n", missing.display()));

    assert!(output.status.success());
    assert_eq!(
        lines(&String::from_utf8(output.stdout).unwrap()),
        ["exit value 0"]
    );
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(
        stderr.starts_with(&format!("smallsh: cd: {}: ", missing.display())),
        "{stderr}"
    );
}

#[test]
fn command_line_options() {
    let output = Command::new(SMALLSH).arg("--version").output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        format!("smallsh {}\n", env!("CARGO_PKG_VERSION"))
    );

    let output = Command::new(SMALLSH).arg("-h").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)
        .unwrap()
        .starts_with("usage: smallsh"));

    let output = Command::new(SMALLSH).arg("--bogus").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8(output.stderr)
        .unwrap()
        .contains("unrecognized option '--bogus'"));
}

#[test]
fn background_completion_is_reported_during_a_foreground_wait() {
    let script = scratch_path("slow_fg.sh");
    std::fs::write(&script, "sleep 1.5\necho FOREGROUND_DONE\n").unwrap();

    let stdout = stdout_of(&format!("sleep 0.1 &\nsh {}\n", script.display()));
    let pids = background_pids(&stdout);
    assert_eq!(pids.len(), 1, "{stdout}");

    let notice = stdout
        .find(&format!("background pid {} is done: exit value 0\n", pids[0]))
        .unwrap_or_else(|| panic!("no notice in {stdout:?}"));
    let foreground = stdout.find("FOREGROUND_DONE").unwrap();
    assert!(notice < foreground, "{stdout:?}");
    assert_eq!(stdout.matches(" is done: ").count(), 1, "{stdout:?}");

    std::fs::remove_file(&script).unwrap();
}

#[test]
fn interrupt_reaches_foreground_jobs_only() {
    let script = scratch_path("self_interrupt.sh");
    std::fs::write(&script, "kill -INT $$\nexit 5\n").unwrap();

    let stdout = stdout_of(&format!(
        "sh {0}\nsh {0} &\nsleep 0.5\n",
        script.display()
    ));

    assert!(
        stdout.contains(&format!("terminated by signal {}\n", libc::SIGINT)),
        "{stdout:?}"
    );
    let pids = background_pids(&stdout);
    assert_eq!(pids.len(), 1, "{stdout}");
    assert!(
        stdout.contains(&format!("background pid {} is done: exit value 5\n", pids[0])),
        "{stdout:?}"
    );

    std::fs::remove_file(&script).unwrap();
}
