//! Drives `Client` against a loopback server that speaks the encrypted
//! protocol with a pre-shared auth key.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use sessiongen_client::{Client, Config, DcOption, InvocationError, SessionData, SignInError, StringSession};
use sessiongen_crypto::{AuthKey, Side, decrypt_data_v2_as, encrypt_data_v2_as};
use sessiongen_tl::mtproto::{
    BadServerSalt, ContainedMessage, MsgContainer, NewSessionCreated, RpcError, RpcResult, ids,
};
use sessiongen_tl::{Cursor, Deserializable, Serializable};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const INVOKE_WITH_LAYER: u32 = 0xda9b0d0d;
const SEND_CODE:         u32 = 0xa677244f;
const SIGN_IN:           u32 = 0x8d52a951;
const GET_PASSWORD:      u32 = 0x548a30f5;
const CHECK_PASSWORD:    u32 = 0xd18b4d16;
const SEND_MESSAGE:      u32 = 0x520c3870;

fn auth_key() -> [u8; 256] {
    let mut key = [0u8; 256];
    for (i, b) in key.iter_mut().enumerate() { *b = (i * 7 + 3) as u8; }
    key
}

/// A request as the server saw it.
struct Request {
    ctor:   u32,
    msg_id: i64,
    salt:   i64,
    body:   Vec<u8>,
}

struct ServerConn {
    stream:     TcpStream,
    key:        AuthKey,
    session_id: i64,
    next_id:    i64,
}

impl ServerConn {
    async fn accept(listener: &TcpListener) -> Self {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut init = [0u8; 1];
        stream.read_exact(&mut init).await.unwrap();
        assert_eq!(init[0], 0xef);
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
        Self { stream, key: AuthKey::from_bytes(auth_key()), session_id: 0, next_id: (now << 32) | 1 }
    }

    /// Next client request, skipping acks. `None` once the client hangs up.
    async fn next_request(&mut self) -> Option<Request> {
        loop {
            let mut h = [0u8; 1];
            self.stream.read_exact(&mut h).await.ok()?;
            let words = if h[0] < 0x7f {
                h[0] as usize
            } else {
                let mut b = [0u8; 3];
                self.stream.read_exact(&mut b).await.ok()?;
                b[0] as usize | (b[1] as usize) << 8 | (b[2] as usize) << 16
            };
            let mut frame = vec![0u8; words * 4];
            self.stream.read_exact(&mut frame).await.ok()?;

            let plain = decrypt_data_v2_as(&frame, &self.key, Side::Client).unwrap();
            let salt   = i64::from_le_bytes(plain[0..8].try_into().unwrap());
            self.session_id = i64::from_le_bytes(plain[8..16].try_into().unwrap());
            let msg_id = i64::from_le_bytes(plain[16..24].try_into().unwrap());
            let len    = u32::from_le_bytes(plain[28..32].try_into().unwrap()) as usize;
            let body   = plain[32..32 + len].to_vec();
            let ctor   = u32::from_le_bytes(body[..4].try_into().unwrap());
            if ctor == ids::MSGS_ACK {
                continue;
            }
            return Some(Request { ctor, msg_id, salt, body });
        }
    }

    async fn send(&mut self, body: &[u8]) {
        let msg_id = self.next_id;
        self.next_id += 4;

        let mut plain = Vec::new();
        plain.extend(0x1234_i64.to_le_bytes());
        plain.extend(self.session_id.to_le_bytes());
        plain.extend(msg_id.to_le_bytes());
        plain.extend(1_i32.to_le_bytes());
        plain.extend((body.len() as u32).to_le_bytes());
        plain.extend_from_slice(body);
        let frame = encrypt_data_v2_as(&plain, &self.key, Side::Server, &[0u8; 32]);

        let words = frame.len() / 4;
        let mut out = Vec::new();
        if words < 0x7f {
            out.push(words as u8);
        } else {
            out.push(0x7f);
            out.extend_from_slice(&(words as u32).to_le_bytes()[..3]);
        }
        out.extend_from_slice(&frame);
        self.stream.write_all(&out).await.unwrap();
    }

    async fn reply(&mut self, req: &Request, result: Vec<u8>) {
        self.send(&RpcResult { req_msg_id: req.msg_id, result }.to_bytes()).await;
    }

    async fn reply_error(&mut self, req: &Request, code: i32, message: &str) {
        let err = RpcError { error_code: code, error_message: message.into() }.to_bytes();
        self.reply(req, err).await;
    }
}

fn nearest_dc() -> Vec<u8> {
    let mut b = Vec::new();
    0x8e1a1775_u32.serialize(&mut b);
    "NL".serialize(&mut b);
    2_i32.serialize(&mut b);
    2_i32.serialize(&mut b);
    b
}

fn sent_code() -> Vec<u8> {
    let mut b = Vec::new();
    0x5e002502_u32.serialize(&mut b);
    0_u32.serialize(&mut b);
    0x3dbb5986_u32.serialize(&mut b);
    5_i32.serialize(&mut b);
    "hash123".serialize(&mut b);
    b
}

fn password_with_srp() -> Vec<u8> {
    let mut p = vec![0xffu8; 256];
    p[255] = 0xc7;
    let mut b = Vec::new();
    0x957b50fb_u32.serialize(&mut b);
    ((1u32 << 2) | (1 << 3)).serialize(&mut b);
    0x3a912d4a_u32.serialize(&mut b);
    vec![1u8; 8].serialize(&mut b);
    vec![2u8; 16].serialize(&mut b);
    3_i32.serialize(&mut b);
    p.serialize(&mut b);
    vec![0x55u8; 256].serialize(&mut b);
    77_i64.serialize(&mut b);
    "my hint".serialize(&mut b);
    b
}

fn authorization() -> Vec<u8> {
    let mut b = Vec::new();
    0x2ea2c0d4_u32.serialize(&mut b);
    b.extend_from_slice(&[0u8; 16]);
    b
}

fn config(addr: SocketAddr) -> Config {
    Config {
        api_id:   12345,
        api_hash: "0123456789abcdef".into(),
        session:  StringSession::new(SessionData { dc_id: 2, addr, auth_key: auth_key() }),
        dc_options: Vec::new(),
    }
}

/// Answers `initConnection`, first with `bad_server_salt`, then with the
/// result inside a container next to `new_session_created`.
async fn handshake(server: &mut ServerConn) {
    let first = server.next_request().await.unwrap();
    assert_eq!(first.ctor, INVOKE_WITH_LAYER);
    assert_eq!(first.salt, 0);
    server.send(&BadServerSalt {
        bad_msg_id:      first.msg_id,
        bad_msg_seqno:   1,
        error_code:      48,
        new_server_salt: 0x0abc,
    }.to_bytes()).await;

    let retry = server.next_request().await.unwrap();
    assert_eq!(retry.ctor, INVOKE_WITH_LAYER);
    assert_eq!(retry.salt, 0x0abc);
    assert_ne!(retry.msg_id, first.msg_id);

    let created = NewSessionCreated { first_msg_id: retry.msg_id, unique_id: 9, server_salt: 0x0abd };
    let result = RpcResult { req_msg_id: retry.msg_id, result: nearest_dc() };
    let container = MsgContainer {
        messages: vec![
            ContainedMessage { msg_id: server.next_id + 8, seq_no: 2, body: created.to_bytes() },
            ContainedMessage { msg_id: server.next_id + 12, seq_no: 3, body: result.to_bytes() },
        ],
    };
    server.send(&container.to_bytes()).await;
}

#[tokio::test]
async fn login_with_password_and_self_message() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let sent_text = Arc::new(Mutex::new(None::<String>));
    let sent_text_srv = sent_text.clone();

    let server = tokio::spawn(async move {
        let mut srv = ServerConn::accept(&listener).await;
        handshake(&mut srv).await;

        let req = srv.next_request().await.unwrap();
        assert_eq!(req.ctor, SEND_CODE);
        assert_eq!(req.salt, 0x0abd);
        srv.reply(&req, sent_code()).await;

        let req = srv.next_request().await.unwrap();
        assert_eq!(req.ctor, SIGN_IN);
        srv.reply_error(&req, 401, "SESSION_PASSWORD_NEEDED").await;

        let req = srv.next_request().await.unwrap();
        assert_eq!(req.ctor, GET_PASSWORD);
        srv.reply(&req, password_with_srp()).await;

        let req = srv.next_request().await.unwrap();
        assert_eq!(req.ctor, CHECK_PASSWORD);
        assert_eq!(&req.body[8..16], &77_i64.to_le_bytes());
        srv.reply(&req, authorization()).await;

        let req = srv.next_request().await.unwrap();
        assert_eq!(req.ctor, SEND_MESSAGE);
        let mut cur = Cursor::from_slice(&req.body[12..]);
        *sent_text_srv.lock().unwrap() = Some(String::deserialize(&mut cur).unwrap());
        srv.reply(&req, vec![0x40, 0x42, 0xae, 0x74, 0, 0, 0, 0]).await;

        assert!(srv.next_request().await.is_none());
    });

    let client = Client::connect(config(addr)).await.unwrap();
    let token = client.request_login_code("+15550000000").await.unwrap();
    let pw_token = match client.sign_in(&token, "12345").await {
        Err(SignInError::PasswordRequired(t)) => t,
        other => panic!("expected PasswordRequired, got {other:?}"),
    };
    assert_eq!(pw_token.hint(), Some("my hint"));
    client.check_password(pw_token, "secret").await.unwrap();

    let session = client.session_string().await.unwrap();
    let decoded = StringSession::decode(&session).unwrap();
    let data = decoded.data().unwrap();
    assert_eq!(data.dc_id, 2);
    assert_eq!(data.addr, addr);
    assert_eq!(data.auth_key, auth_key());

    client.send_html_to_self(&format!("<b> ➜ Your session:</b>\n<code>{session}</code>")).await.unwrap();
    drop(client);
    server.await.unwrap();

    let text = sent_text.lock().unwrap().clone().unwrap();
    assert_eq!(text, format!(" ➜ Your session:\n{session}"));
}

#[tokio::test]
async fn wrong_code_and_other_errors() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut srv = ServerConn::accept(&listener).await;
        handshake(&mut srv).await;

        let req = srv.next_request().await.unwrap();
        srv.reply(&req, sent_code()).await;

        let req = srv.next_request().await.unwrap();
        assert_eq!(req.ctor, SIGN_IN);
        srv.reply_error(&req, 400, "PHONE_CODE_INVALID").await;

        let req = srv.next_request().await.unwrap();
        assert_eq!(req.ctor, SIGN_IN);
        srv.reply_error(&req, 420, "FLOOD_WAIT_30").await;

        assert!(srv.next_request().await.is_none());
    });

    let client = Client::connect(config(addr)).await.unwrap();
    let token = client.request_login_code("+15550000000").await.unwrap();

    assert!(matches!(client.sign_in(&token, "00000").await, Err(SignInError::InvalidCode)));
    match client.sign_in(&token, "00000").await {
        Err(SignInError::Other(e)) => assert!(e.is("FLOOD_WAIT")),
        other => panic!("expected Other, got {other:?}"),
    }

    drop(client);
    server.await.unwrap();
}

#[tokio::test]
async fn phone_migrate_moves_to_the_listed_dc() {
    let home = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let home_addr = home.local_addr().unwrap();
    let dc4 = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dc4_addr = dc4.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut srv = ServerConn::accept(&home).await;
        handshake(&mut srv).await;
        let req = srv.next_request().await.unwrap();
        assert_eq!(req.ctor, SEND_CODE);
        srv.reply_error(&req, 303, "PHONE_MIGRATE_4").await;

        let mut srv4 = ServerConn::accept(&dc4).await;
        handshake(&mut srv4).await;
        let req = srv4.next_request().await.unwrap();
        assert_eq!(req.ctor, SEND_CODE);
        srv4.reply(&req, sent_code()).await;

        assert!(srv4.next_request().await.is_none());
    });

    let mut cfg = config(home_addr);
    cfg.dc_options.push(DcOption { id: 4, addr: dc4_addr, auth_key: Some(auth_key()) });
    let client = Client::connect(cfg).await.unwrap();
    client.request_login_code("+15550000000").await.unwrap();

    let session = StringSession::decode(&client.session_string().await.unwrap()).unwrap();
    let data = session.data().unwrap();
    assert_eq!(data.dc_id, 4);
    assert_eq!(data.addr, dc4_addr);

    drop(client);
    server.await.unwrap();
}

#[tokio::test]
async fn migrate_to_unlisted_dc_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut srv = ServerConn::accept(&listener).await;
        handshake(&mut srv).await;
        let req = srv.next_request().await.unwrap();
        srv.reply_error(&req, 303, "PHONE_MIGRATE_9").await;
        assert!(srv.next_request().await.is_none());
    });

    let client = Client::connect(config(addr)).await.unwrap();
    let err = client.request_login_code("+15550000000").await.unwrap_err();
    assert!(matches!(err, InvocationError::UnknownDc(9)), "{err:?}");

    drop(client);
    server.await.unwrap();
}
