use hoptrace_trace::{Platform, RunId, SystemLauncher, TraceEvent, TraceLauncher, TraceSettings};
use std::sync::mpsc;
use std::time::Duration;

#[test]
fn missing_binary_is_a_launch_error() {
    let launcher = SystemLauncher::new(TraceSettings {
        platform: Platform::current(),
        program: Some("hoptrace-definitely-missing-binary".to_string()),
        extra_args: Vec::new(),
    });
    let (tx, _rx) = mpsc::channel();

    let err = launcher
        .launch("8.8.8.8", RunId(1), tx)
        .err()
        .expect("spawn should fail");
    assert!(err.to_string().contains("failed to spawn"));
}

#[cfg(unix)]
#[test]
fn streams_lines_then_closes_once() {
    let launcher = SystemLauncher::new(TraceSettings {
        platform: Platform::Posix,
        program: Some("sh".to_string()),
        extra_args: vec![
            "-c".to_string(),
            "printf ' 1  gw (10.0.0.1)  1.0 ms\\n 2 * * *'".to_string(),
        ],
    });
    let (tx, rx) = mpsc::channel();
    let _process = launcher.launch("8.8.8.8", RunId(7), tx).unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.recv_timeout(Duration::from_secs(10)) {
        let closed = matches!(event, TraceEvent::Closed { .. });
        events.push(event);
        if closed {
            break;
        }
    }

    assert_eq!(
        events,
        vec![
            TraceEvent::Line {
                run: RunId(7),
                line: " 1  gw (10.0.0.1)  1.0 ms".to_string()
            },
            TraceEvent::Line {
                run: RunId(7),
                line: " 2 * * *".to_string()
            },
            TraceEvent::Closed {
                run: RunId(7),
                status: Some(0)
            },
        ]
    );
}

#[cfg(unix)]
#[test]
fn kill_still_reports_close() {
    let launcher = SystemLauncher::new(TraceSettings {
        platform: Platform::Posix,
        program: Some("sh".to_string()),
        extra_args: vec!["-c".to_string(), "exec sleep 30".to_string()],
    });
    let (tx, rx) = mpsc::channel();
    let mut process = launcher.launch("8.8.8.8", RunId(2), tx).unwrap();

    process.kill().unwrap();

    let event = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(matches!(event, TraceEvent::Closed { run: RunId(2), status: None }));
}
