//! Request gate driven by configuration.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::json;

use xdental::{AppConfig, GateDecision, RequestGate};

const NOW_MS: u64 = 1_750_000_000_000;

fn token(exp_seconds: u64) -> String {
    format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#),
        URL_SAFE_NO_PAD.encode(json!({ "sub": "u1", "exp": exp_seconds }).to_string())
    )
}

#[test]
fn default_rules_route_users_and_admins() {
    let gate = RequestGate::new(AppConfig::default().gate);
    let fresh = token(NOW_MS / 1000 + 60);
    let both = format!("access_token={fresh}; access_token_admin={fresh}");

    assert_eq!(gate.evaluate("/", Some(&both), NOW_MS), GateDecision::Next);
    assert_eq!(gate.evaluate("/admin/stats", Some(&both), NOW_MS), GateDecision::Next);
    assert_eq!(
        gate.evaluate("/admin/login", Some(&both), NOW_MS),
        GateDecision::Redirect("/admin/dashboard".into())
    );
    assert_eq!(
        gate.evaluate("/login", Some(&both), NOW_MS),
        GateDecision::Redirect("/".into())
    );
    assert_eq!(gate.evaluate("/forgot-password", None, NOW_MS), GateDecision::Next);
    assert_eq!(gate.evaluate("/images/tooth.svg", None, NOW_MS), GateDecision::Next);
}

#[test]
fn token_that_just_expired_redirects() {
    let gate = RequestGate::default();
    let cookie = format!("access_token={}", token(NOW_MS / 1000 - 1));
    assert_eq!(
        gate.evaluate("/reports", Some(&cookie), NOW_MS),
        GateDecision::Redirect("/login?redirect=%2Freports".into())
    );
}

#[test]
fn configured_rules_are_used() {
    let config = AppConfig::from_json(
        r#"{
            "version": 1,
            "gate": {
                "public_routes": ["/welcome"],
                "user_login": "/sign-in",
                "user_cookie": "session"
            }
        }"#,
    )
    .unwrap();
    let gate = RequestGate::new(config.gate);

    assert_eq!(gate.evaluate("/welcome", None, NOW_MS), GateDecision::Next);
    assert_eq!(
        gate.evaluate("/about", None, NOW_MS),
        GateDecision::Redirect("/sign-in?redirect=%2Fabout".into())
    );
    let cookie = format!("session={}", token(NOW_MS / 1000 + 1));
    assert_eq!(gate.evaluate("/about", Some(&cookie), NOW_MS), GateDecision::Next);
}

#[test]
fn evaluate_now_rejects_long_expired_tokens() {
    let gate = RequestGate::default();
    let cookie = format!("access_token={}", token(1));
    assert!(matches!(
        gate.evaluate_now("/home", Some(&cookie)),
        GateDecision::Redirect(_)
    ));
}
