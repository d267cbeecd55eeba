//! Subprocess plumbing for command-line engines.

use doctools_core::EngineError;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Run `command` to completion and return its stdout.
///
/// A missing executable maps to [`EngineError::Unavailable`]; a non-zero
/// exit maps to [`EngineError::Failed`] carrying the trimmed stderr.
pub(crate) async fn run(mut command: Command, stdin: Option<&[u8]>) -> Result<Vec<u8>, EngineError> {
    let program = command
        .as_std()
        .get_program()
        .to_string_lossy()
        .into_owned();
    debug!("Running {}", program);

    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|e| spawn_error(&program, e))?;

    let input = child.stdin.take();
    let write = async move {
        match (input, stdin) {
            (Some(mut pipe), Some(bytes)) => {
                let result = pipe.write_all(bytes).await;
                drop(pipe);
                result
            }
            _ => Ok(()),
        }
    };
    let (written, output) = tokio::join!(write, child.wait_with_output());
    let output = output?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(EngineError::Failed(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    // A broken pipe is fine once the process has exited cleanly.
    if let Err(e) = written {
        debug!("{} closed stdin early: {}", program, e);
    }

    Ok(output.stdout)
}

fn spawn_error(program: &str, err: std::io::Error) -> EngineError {
    if err.kind() == std::io::ErrorKind::NotFound {
        EngineError::Unavailable(format!("{program} not found"))
    } else {
        EngineError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let command = Command::new("doctools-no-such-binary");
        let err = run(command, None).await.unwrap_err();
        assert!(matches!(err, EngineError::Unavailable(ref m) if m.contains("doctools-no-such-binary")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_and_stdin() {
        let command = Command::new("cat");
        let out = run(command, Some(b"piped bytes")).await.unwrap();
        assert_eq!(out, b"piped bytes");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo oops >&2; exit 3"]);
        let err = run(command, None).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("oops"), "{message}");
    }
}
