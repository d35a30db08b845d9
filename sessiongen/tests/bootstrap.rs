//! The login sequence against scripted prompts and a fake client.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use sessiongen::bootstrap::session_message;
use sessiongen::{
    Bootstrapper, ConfigError, Connector, Credentials, LoginClient, Prompter, SessionString,
    SetupError, SignInOutcome,
};
use sessiongen_client::{InvocationError, RpcError, SignInError};

type Log = Rc<RefCell<Vec<String>>>;

const SESSION: &str = "1BQANOTrEAbCdEf==";

// ─── Mocks ────────────────────────────────────────────────────────────────────

struct ScriptedPrompter {
    answers: VecDeque<&'static str>,
    log:     Log,
}

impl ScriptedPrompter {
    fn answer(&mut self, kind: &str, label: &str) -> io::Result<String> {
        self.log.borrow_mut().push(format!("{kind}:{label}"));
        self.answers
            .pop_front()
            .map(str::to_string)
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
    }
}

impl Prompter for ScriptedPrompter {
    fn text(&mut self, label: &str) -> io::Result<String> { self.answer("text", label) }

    fn secret(&mut self, label: &str) -> io::Result<String> { self.answer("secret", label) }

    fn confirm(&mut self, label: &str) -> io::Result<bool> {
        self.log.borrow_mut().push(format!("confirm:{label}"));
        Ok(true)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Step { Connect, RequestCode, SignIn, CheckPassword, Send }

fn rpc(code: i32, name: &str) -> SetupError {
    InvocationError::Rpc(RpcError::from_telegram(code, name)).into()
}

struct FakeConnector {
    log:     Log,
    two_fa:  bool,
    fail_at: Option<Step>,
}

struct FakeClient {
    log:     Log,
    two_fa:  bool,
    fail_at: Option<Step>,
}

impl FakeClient {
    fn record(&self, step: Step, entry: String) -> Result<(), SetupError> {
        self.log.borrow_mut().push(entry);
        if self.fail_at == Some(step) {
            return Err(match step {
                Step::SignIn => SignInError::InvalidCode.into(),
                _            => rpc(400, "PHONE_NUMBER_INVALID"),
            });
        }
        Ok(())
    }
}

impl Connector for FakeConnector {
    type Client = FakeClient;

    async fn connect(&self, credentials: &Credentials) -> Result<FakeClient, SetupError> {
        self.log.borrow_mut().push(format!("connect:{}", credentials.api_id));
        if self.fail_at == Some(Step::Connect) {
            return Err(InvocationError::Transport(-404).into());
        }
        Ok(FakeClient { log: self.log.clone(), two_fa: self.two_fa, fail_at: self.fail_at })
    }
}

impl LoginClient for FakeClient {
    type LoginToken = String;
    type PasswordToken = u32;

    async fn request_login_code(&self, phone: &str) -> Result<String, SetupError> {
        self.record(Step::RequestCode, format!("request_code:{phone}"))?;
        Ok(format!("hash-for-{phone}"))
    }

    async fn sign_in(&self, token: &String, code: &str) -> Result<SignInOutcome<u32>, SetupError> {
        self.record(Step::SignIn, format!("sign_in:{token}:{code}"))?;
        Ok(if self.two_fa { SignInOutcome::PasswordRequired(7) } else { SignInOutcome::SignedIn })
    }

    async fn check_password(&self, token: u32, password: &str) -> Result<(), SetupError> {
        self.record(Step::CheckPassword, format!("check_password:{token}:{password}"))
    }

    async fn session_string(&self) -> Result<SessionString, SetupError> {
        self.log.borrow_mut().push("session".into());
        Ok(SessionString::new(SESSION))
    }

    async fn send_html_to_self(&self, html: &str) -> Result<(), SetupError> {
        self.record(Step::Send, format!("send:{html}"))
    }
}

fn bootstrapper(
    answers: &[&'static str],
    two_fa:  bool,
    fail_at: Option<Step>,
) -> (Bootstrapper<FakeConnector, ScriptedPrompter, Vec<u8>>, Log) {
    let log: Log = Rc::default();
    let boot = Bootstrapper::new(
        FakeConnector { log: log.clone(), two_fa, fail_at },
        ScriptedPrompter { answers: answers.iter().copied().collect(), log: log.clone() },
        Vec::new(),
    );
    (boot, log)
}

fn printed(boot: &Bootstrapper<FakeConnector, ScriptedPrompter, Vec<u8>>) -> String {
    String::from_utf8(boot.out().clone()).unwrap()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_prints_and_sends_the_same_session() {
    let (mut boot, log) = bootstrapper(&["+15550001111", "", " 12345 "], false, None);

    let session = boot.run("12345", "0123abcd").await.unwrap();
    assert_eq!(session.as_str(), SESSION);
    assert_eq!(printed(&boot), format!("{SESSION}\n"));

    let html = session_message(&session);
    assert_eq!(html, format!("<b> ➜ Your session:</b>\n<code>{SESSION}</code>"));
    assert_eq!(*log.borrow(), vec![
        "connect:12345".to_string(),
        "text:Phone number".into(),
        "request_code:+15550001111".into(),
        "secret:Password".into(),
        "text:Received code".into(),
        "sign_in:hash-for-+15550001111:12345".into(),
        "session".into(),
        format!("send:{html}"),
    ]);
}

#[tokio::test]
async fn two_step_verification_uses_the_earlier_password() {
    let (mut boot, log) = bootstrapper(&["+1555", "hunter2", "999"], true, None);

    boot.run("1", "h").await.unwrap();

    let log = log.borrow();
    let sign_in = log.iter().position(|e| e.starts_with("sign_in:")).unwrap();
    assert_eq!(log[sign_in + 1], "check_password:7:hunter2");
    assert_eq!(log.iter().filter(|e| e.starts_with("send:")).count(), 1);
}

#[tokio::test]
async fn malformed_credentials_fail_before_anything_else() {
    for (id, hash) in [("abc", "hash"), ("0", "hash"), ("-3", "hash"), ("12", "  ")] {
        let (mut boot, log) = bootstrapper(&["+1555", "", "1"], false, None);
        let err = boot.run(id, hash).await.unwrap_err();
        assert!(matches!(err, SetupError::Config(ConfigError::InvalidApiId(_) | ConfigError::EmptyApiHash)));
        assert!(log.borrow().is_empty(), "{id:?}/{hash:?} touched {:?}", log.borrow());
        assert!(printed(&boot).is_empty());
    }
}

#[tokio::test]
async fn any_failing_step_stops_without_a_session() {
    for step in [Step::Connect, Step::RequestCode, Step::SignIn, Step::CheckPassword] {
        let (mut boot, log) = bootstrapper(&["+1555", "pw", "111"], true, Some(step));

        assert!(boot.run("1", "h").await.is_err(), "{step:?}");
        assert!(printed(&boot).is_empty(), "{step:?}");
        let log = log.borrow();
        assert!(!log.iter().any(|e| e == "session" || e.starts_with("send:")), "{step:?}: {log:?}");
    }
}

#[tokio::test]
async fn wrong_code_is_not_retried() {
    let (mut boot, log) = bootstrapper(&["+1555", "", "000", "111"], false, Some(Step::SignIn));

    let err = boot.run("1", "h").await.unwrap_err();
    assert!(matches!(err, SetupError::SignIn(SignInError::InvalidCode)));
    assert_eq!(log.borrow().iter().filter(|e| e.starts_with("sign_in:")).count(), 1);
}

#[tokio::test]
async fn closed_terminal_is_an_error() {
    let (mut boot, log) = bootstrapper(&["+1555"], false, None);

    assert!(matches!(boot.run("1", "h").await, Err(SetupError::Io(_))));
    assert!(!log.borrow().iter().any(|e| e.starts_with("sign_in:")));
}

#[test]
fn failure_is_shown_and_confirmed() {
    let (mut boot, log) = bootstrapper(&[], false, None);

    boot.acknowledge_failure(&rpc(400, "PHONE_NUMBER_INVALID"));

    assert!(printed(&boot).contains("PHONE_NUMBER_INVALID"));
    assert_eq!(log.borrow().last().map(String::as_str), Some("confirm:(confirm to close console)"));
}
