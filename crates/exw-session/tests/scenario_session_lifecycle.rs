use exw_schemas::{Capabilities, Identity};
use exw_session::*;

fn student() -> Identity {
    Identity::new("Ada Lovelace", "S-1815")
}

#[test]
fn boot_state_is_setup_and_rejects_events() {
    let m = SessionMachine::new(SessionConfig::defaults());
    assert_eq!(m.state(), SessionState::Setup);
    assert!(!m.accepts_events());
}

#[test]
fn begin_requires_capabilities_and_identity() {
    let mut m = SessionMachine::new(SessionConfig::defaults());
    let caps = Capabilities {
        camera: true,
        microphone: false,
        face: true,
        fullscreen: false,
    };

    let err = m
        .begin(Identity::new("  ", "S-1"), &caps, 0)
        .unwrap_err();
    assert_eq!(
        err,
        TransitionError::PreconditionsFailed {
            missing: vec![
                Precondition::Microphone,
                Precondition::Fullscreen,
                Precondition::StudentName
            ]
        }
    );
    // Refused gate leaves state untouched.
    assert_eq!(m.state(), SessionState::Setup);

    m.begin(student(), &Capabilities::all_ready(), 1_000).unwrap();
    assert_eq!(m.state(), SessionState::InProgress);
    assert!(m.accepts_events());
    assert_eq!(m.started_at_ms(), Some(1_000));
}

#[test]
fn relaxed_config_skips_capability_checks() {
    let cfg = SessionConfig {
        require_camera: false,
        require_microphone: false,
        require_face: false,
        require_fullscreen: false,
    };
    let mut m = SessionMachine::new(cfg);
    m.begin(student(), &Capabilities::default(), 0).unwrap();
    assert_eq!(m.state(), SessionState::InProgress);
}

#[test]
fn submission_path_completes_without_termination_flag() {
    let mut m = SessionMachine::new(SessionConfig::defaults());
    m.begin(student(), &Capabilities::all_ready(), 0).unwrap();
    m.end_exam(EndCause::Submitted, 60_000).unwrap();
    assert_eq!(m.state(), SessionState::Verification);
    assert!(!m.accepts_events());

    let was_terminated = m.complete_verification(90_000).unwrap();
    assert!(!was_terminated);
    assert_eq!(
        m.state(),
        SessionState::Completed {
            was_terminated: false
        }
    );
    assert_eq!(m.state().as_str(), "COMPLETED");
}

#[test]
fn forced_termination_travels_same_path_with_flag() {
    let mut m = SessionMachine::new(SessionConfig::defaults());
    m.begin(student(), &Capabilities::all_ready(), 0).unwrap();
    m.end_exam(EndCause::Terminated, 10_000).unwrap();
    assert!(m.complete_verification(12_000).unwrap());
    assert_eq!(m.state().as_str(), "TERMINATED");
    assert!(m.state().is_terminal());
    assert_eq!(m.end_cause(), Some(EndCause::Terminated));
}

#[test]
fn no_state_is_revisited() {
    let mut m = SessionMachine::new(SessionConfig::defaults());

    assert!(matches!(
        m.end_exam(EndCause::Submitted, 0),
        Err(TransitionError::IllegalTransition { .. })
    ));

    m.begin(student(), &Capabilities::all_ready(), 0).unwrap();
    assert!(m.begin(student(), &Capabilities::all_ready(), 1).is_err());
    assert!(m.complete_verification(1).is_err());

    m.end_exam(EndCause::TimeExpired, 5).unwrap();
    // Second end signal (e.g. timer racing a submit) is refused.
    let err = m.end_exam(EndCause::Submitted, 6).unwrap_err();
    assert_eq!(
        err.to_string(),
        "illegal session transition: VERIFICATION + submit"
    );
    assert_eq!(m.end_cause(), Some(EndCause::TimeExpired));

    m.complete_verification(7).unwrap();
    assert!(m.complete_verification(8).is_err());
    assert_eq!(m.completed_at_ms(), Some(7));
}
