#[cfg(test)]
mod tests {
    use super::super::*;
    use std::time::Duration;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_production_runner_success() {
        let runner = runner::TokioProcessRunner;
        let command = ProcessCommandBuilder::new("echo")
            .arg("hello world")
            .build();

        let output = runner.run(command).await.unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout.trim(), "hello world");
        assert!(output.stderr.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_production_runner_failure() {
        let runner = runner::TokioProcessRunner;
        let command = ProcessCommandBuilder::new("false").build();

        let output = runner.run(command).await.unwrap();
        assert!(!output.status.success());
        assert_eq!(output.status.code(), Some(1));
    }

    #[tokio::test]
    async fn test_production_runner_command_not_found() {
        let runner = runner::TokioProcessRunner;
        let command = ProcessCommandBuilder::new("nonexistent-command-12345").build();

        let result = runner.run(command).await;
        assert!(matches!(
            result.unwrap_err(),
            ProcessError::CommandNotFound(_)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_production_runner_timeout() {
        let runner = runner::TokioProcessRunner;
        let command = ProcessCommandBuilder::new("sleep")
            .arg("5")
            .timeout(Some(Duration::from_millis(100)))
            .build();

        let result = runner.run(command).await;
        assert!(matches!(result.unwrap_err(), ProcessError::Timeout(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_production_runner_env_and_working_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let runner = runner::TokioProcessRunner;
        let command = ProcessCommandBuilder::new("sh")
            .args(["-c", "echo $REALIGN_TEST_VAR; pwd"])
            .env("REALIGN_TEST_VAR", "hello")
            .current_dir(temp.path())
            .build();

        let output = runner.run(command).await.unwrap();
        let lines: Vec<&str> = output.stdout.lines().collect();
        assert_eq!(lines[0], "hello");
        assert!(lines[1].ends_with(
            temp.path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .as_ref()
        ));
    }

    #[tokio::test]
    async fn test_mock_runner_basic() {
        let mut mock = MockProcessRunner::new();

        mock.expect_command("mcflirt")
            .with_args(|args| args == ["--version"])
            .returns_stdout("6.0\n")
            .returns_exit_code(0)
            .finish();

        let output = mock
            .run(ProcessCommandBuilder::new("mcflirt").arg("--version").build())
            .await
            .unwrap();

        assert!(output.status.success());
        assert_eq!(output.stdout, "6.0\n");
        assert!(mock.verify_called("mcflirt", 1));
    }

    #[tokio::test]
    async fn test_mock_runner_times_limit() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("fetch").times(1).finish();

        mock.run(ProcessCommandBuilder::new("fetch").build())
            .await
            .unwrap();
        let second = mock.run(ProcessCommandBuilder::new("fetch").build()).await;

        assert!(matches!(
            second.unwrap_err(),
            ProcessError::MockExpectationNotMet(_)
        ));
        assert_eq!(mock.get_call_history().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_runner_not_found_and_unexpected() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("missing").returns_not_found().finish();

        let missing = mock.run(ProcessCommandBuilder::new("missing").build()).await;
        assert!(matches!(
            missing.unwrap_err(),
            ProcessError::CommandNotFound(_)
        ));

        let unexpected = mock.run(ProcessCommandBuilder::new("other").build()).await;
        assert!(matches!(
            unexpected.unwrap_err(),
            ProcessError::MockExpectationNotMet(_)
        ));
    }

    #[tokio::test]
    async fn test_mock_runner_effect_runs_on_match() {
        let temp = tempfile::TempDir::new().unwrap();
        let marker = temp.path().join("fetched");
        let mut mock = MockProcessRunner::new();
        let target = marker.clone();
        mock.expect_command("fetch")
            .with_args(|args| args.first().map(String::as_str) == Some("nyu-rest"))
            .with_effect(move |_| std::fs::write(&target, b"ok").unwrap())
            .finish();

        let unmatched = mock
            .run(ProcessCommandBuilder::new("fetch").arg("fsl-feeds").build())
            .await;
        assert!(unmatched.is_err());
        assert!(!marker.exists());

        mock.run(ProcessCommandBuilder::new("fetch").arg("nyu-rest").build())
            .await
            .unwrap();
        assert!(marker.exists());
    }

    #[tokio::test]
    async fn test_mock_runner_signal() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("realign").returns_signal(9).finish();

        let output = mock
            .run(ProcessCommandBuilder::new("realign").build())
            .await
            .unwrap();
        assert!(!output.status.success());
        assert_eq!(output.status.code(), None);
    }

    #[test]
    fn test_stdout_lines_skips_blanks() {
        let output = ProcessOutput {
            status: ExitStatus::Success,
            stdout: "rp_a.txt\n\n  rp_b.txt  \n".into(),
            stderr: String::new(),
            duration: Duration::ZERO,
        };
        assert_eq!(output.stdout_lines().collect::<Vec<_>>(), ["rp_a.txt", "rp_b.txt"]);
    }

    #[test]
    fn test_command_display() {
        let command = ProcessCommandBuilder::new("realign")
            .args(["--reslice", "--concat"])
            .build();
        assert_eq!(command.display(), "realign --reslice --concat");
        assert_eq!(ProcessCommandBuilder::new("realign").build().display(), "realign");
    }
}
