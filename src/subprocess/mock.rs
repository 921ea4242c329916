use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::error::ProcessError;
use super::runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner};

type ArgsMatcher = Box<dyn Fn(&[String]) -> bool + Send + Sync>;
type Effect = Box<dyn Fn(&ProcessCommand) + Send + Sync>;

/// Scripted stand-in for external programs
///
/// Expectations are matched in registration order by program name and an
/// optional argument predicate. Every call is recorded, matched or not.
#[derive(Clone, Default)]
pub struct MockProcessRunner {
    expectations: Arc<Mutex<Vec<Expectation>>>,
    history: Arc<Mutex<Vec<ProcessCommand>>>,
}

struct Expectation {
    program: String,
    matcher: Option<ArgsMatcher>,
    effect: Option<Effect>,
    outcome: Outcome,
    calls: usize,
    limit: Option<usize>,
}

enum Outcome {
    Output(ProcessOutput),
    NotFound,
}

/// Builder returned by [`MockProcessRunner::expect_command`]
pub struct MockCommandConfig {
    runner: MockProcessRunner,
    expectation: Expectation,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_command(&mut self, program: &str) -> MockCommandConfig {
        MockCommandConfig {
            runner: self.clone(),
            expectation: Expectation {
                program: program.to_string(),
                matcher: None,
                effect: None,
                outcome: Outcome::Output(ProcessOutput {
                    status: ExitStatus::Success,
                    stdout: String::new(),
                    stderr: String::new(),
                    duration: Duration::ZERO,
                }),
                calls: 0,
                limit: None,
            },
        }
    }

    /// Whether `program` was invoked exactly `times` times
    pub fn verify_called(&self, program: &str, times: usize) -> bool {
        lock(&self.history)
            .iter()
            .filter(|cmd| cmd.program == program)
            .count()
            == times
    }

    pub fn get_call_history(&self) -> Vec<ProcessCommand> {
        lock(&self.history).clone()
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        lock(&self.history).push(command.clone());

        let mut expectations = lock(&self.expectations);
        let expectation = expectations
            .iter_mut()
            .find(|e| {
                e.program == command.program
                    && e.matcher.as_ref().map_or(true, |matches| matches(&command.args))
            })
            .ok_or_else(|| {
                ProcessError::MockExpectationNotMet(format!(
                    "no expectation for {}",
                    command.display()
                ))
            })?;

        expectation.calls += 1;
        if let Some(limit) = expectation.limit {
            if expectation.calls > limit {
                return Err(ProcessError::MockExpectationNotMet(format!(
                    "{} called {} times, expected {}",
                    command.program, expectation.calls, limit
                )));
            }
        }

        if let Some(effect) = &expectation.effect {
            effect(&command);
        }

        match &expectation.outcome {
            Outcome::Output(output) => Ok(output.clone()),
            Outcome::NotFound => Err(ProcessError::CommandNotFound(command.program.clone())),
        }
    }
}

impl MockCommandConfig {
    /// Only match calls whose arguments satisfy `matcher`
    pub fn with_args<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.expectation.matcher = Some(Box::new(matcher));
        self
    }

    /// Run `effect` on every matched call, e.g. to create files a real
    /// program would have written
    pub fn with_effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&ProcessCommand) + Send + Sync + 'static,
    {
        self.expectation.effect = Some(Box::new(effect));
        self
    }

    pub fn returns_stdout(mut self, stdout: &str) -> Self {
        if let Outcome::Output(output) = &mut self.expectation.outcome {
            output.stdout = stdout.to_string();
        }
        self
    }

    pub fn returns_stderr(mut self, stderr: &str) -> Self {
        if let Outcome::Output(output) = &mut self.expectation.outcome {
            output.stderr = stderr.to_string();
        }
        self
    }

    pub fn returns_exit_code(self, code: i32) -> Self {
        let status = if code == 0 {
            ExitStatus::Success
        } else {
            ExitStatus::Error(code)
        };
        self.returns_status(status)
    }

    pub fn returns_signal(self, signal: i32) -> Self {
        self.returns_status(ExitStatus::Signal(signal))
    }

    fn returns_status(mut self, status: ExitStatus) -> Self {
        if let Outcome::Output(output) = &mut self.expectation.outcome {
            output.status = status;
        }
        self
    }

    /// Simulate a program missing from PATH
    pub fn returns_not_found(mut self) -> Self {
        self.expectation.outcome = Outcome::NotFound;
        self
    }

    pub fn times(mut self, n: usize) -> Self {
        self.expectation.limit = Some(n);
        self
    }

    pub fn finish(self) {
        lock(&self.runner.expectations).push(self.expectation);
    }
}
