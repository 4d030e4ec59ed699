//! Stopping the renderer.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

/// Ask `child` to terminate (SIGTERM on unix), wait up to `grace`, then
/// kill it.
pub async fn stop_gracefully(child: &mut Child, grace: Duration) -> std::io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        return Ok(status);
    }
    request_termination(child)?;

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            tracing::warn!(
                pid = ?child.id(),
                grace_ms = grace.as_millis() as u64,
                "renderer ignored termination request, killing"
            );
            child.kill().await?;
            child.wait().await
        }
    }
}

#[cfg(unix)]
fn request_termination(child: &mut Child) -> std::io::Result<()> {
    let Some(pid) = child.id() else {
        return Ok(());
    };
    // SAFETY: plain kill(2) on a pid we spawned and have not reaped yet.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            Ok(())
        } else {
            Err(err)
        }
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use tokio::process::Command;

    #[tokio::test]
    async fn sigterm_stops_cooperative_child() {
        let mut child = Command::new("sleep").arg("30").spawn().expect("spawn sleep");
        let status = stop_gracefully(&mut child, Duration::from_secs(5))
            .await
            .expect("stop");
        assert_eq!(status.signal(), Some(libc::SIGTERM));
    }

    #[tokio::test]
    async fn stubborn_child_is_killed_after_grace() {
        let mut child = Command::new("sh")
            .args(["-c", "trap '' TERM; sleep 30"])
            .spawn()
            .expect("spawn sh");
        // Give the shell time to install its trap.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let status = stop_gracefully(&mut child, Duration::from_millis(200))
            .await
            .expect("stop");
        assert_eq!(status.signal(), Some(libc::SIGKILL));
    }

    #[tokio::test]
    async fn exited_child_reports_its_status() {
        let mut child = Command::new("true").spawn().expect("spawn true");
        let _ = child.wait().await;
        let status = stop_gracefully(&mut child, Duration::from_millis(50))
            .await
            .expect("stop");
        assert!(status.success());
    }
}
