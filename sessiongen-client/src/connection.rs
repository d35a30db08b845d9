//! One TCP connection to one DC: abridged framing, the plaintext handshake
//! and the encrypted request/response loop.

use std::io::Read;
use std::net::SocketAddr;
use std::time::Duration;

use sessiongen_mtproto::authentication;
use sessiongen_mtproto::message::{pack_plain, unpack_plain};
use sessiongen_mtproto::transport::{UnpackError, Unpacked};
use sessiongen_mtproto::{AbridgedTransport, EncryptedSession, MsgIdGenerator};
use sessiongen_tl::mtproto::{
    BadMsgNotification, BadServerSalt, GzipPacked, MsgContainer, MsgsAck, NewSessionCreated,
    ResPq, RpcError as TlRpcError, RpcResult, ServerDhParams, SetClientDhParamsAnswer, ids,
};
use sessiongen_tl::{Deserializable, Serializable};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::errors::{InvocationError, RpcError};

/// Budget for TCP connect plus the whole auth key handshake.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
/// Budget for a single request/response exchange.
pub(crate) const RPC_TIMEOUT: Duration = Duration::from_secs(10);
/// How many times a request is re-sent after salt or clock corrections.
const MAX_RESENDS: usize = 5;

// ─── Link ─────────────────────────────────────────────────────────────────────

/// A TCP stream speaking the abridged transport.
struct Link {
    stream:    TcpStream,
    transport: AbridgedTransport,
    rx_buf:    Vec<u8>,
}

impl Link {
    async fn open(addr: SocketAddr) -> Result<Self, InvocationError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self { stream, transport: AbridgedTransport::new(), rx_buf: Vec::new() })
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), InvocationError> {
        let mut out = Vec::with_capacity(payload.len() + 5);
        self.transport.pack(payload, &mut out);
        self.stream.write_all(&out).await?;
        Ok(())
    }

    async fn recv_frame(&mut self) -> Result<Vec<u8>, InvocationError> {
        loop {
            match self.transport.unpack(&self.rx_buf) {
                Ok(Unpacked { consumed, payload }) => {
                    self.rx_buf.drain(..consumed);
                    return Ok(payload);
                }
                Err(UnpackError::Transport(code)) => return Err(InvocationError::Transport(code)),
                Err(UnpackError::Incomplete { .. }) => {
                    let mut chunk = [0u8; 4096];
                    let n = self.stream.read(&mut chunk).await?;
                    if n == 0 {
                        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
                    }
                    self.rx_buf.extend_from_slice(&chunk[..n]);
                }
            }
        }
    }

    /// Send a plaintext request and read the plaintext answer (handshake only).
    async fn plain_call<S: Serializable, R: Deserializable>(
        &mut self,
        ids: &mut MsgIdGenerator,
        req: &S,
    ) -> Result<R, InvocationError> {
        self.send(&pack_plain(ids.next_id(), &req.to_bytes())).await?;
        let frame = self.recv_frame().await?;
        let (_, body) = unpack_plain(&frame)
            .map_err(|e| InvocationError::Deserialize(e.to_string()))?;
        Ok(R::from_bytes(body)?)
    }
}

// ─── Connection ───────────────────────────────────────────────────────────────

/// What the envelope handler decided about one incoming message.
enum Reply {
    /// The awaited `rpc_result`, unwrapped.
    Done(Vec<u8>),
    /// The request must be sent again (`bad_server_salt`, clock skew).
    Resend(i32),
}

pub(crate) struct Connection {
    link:         Link,
    enc:          EncryptedSession,
    pending_acks: Vec<i64>,
    pub(crate) dc_id: i32,
    pub(crate) addr:  SocketAddr,
}

impl Connection {
    /// Connect and create a fresh auth key.
    pub(crate) async fn connect_raw(dc_id: i32, addr: SocketAddr) -> Result<Self, InvocationError> {
        log::info!("[sessiongen] Connecting to DC{dc_id} {addr} (DH) …");

        let fut = async move {
            let mut link = Link::open(addr).await?;
            let mut ids = MsgIdGenerator::new(0);

            let (req1, s1) = authentication::step1();
            let res_pq: ResPq = link.plain_call(&mut ids, &req1).await?;

            let (req2, s2) = authentication::step2(s1, res_pq, dc_id)?;
            let dh: ServerDhParams = link.plain_call(&mut ids, &req2).await?;

            let (req3, s3) = authentication::step3(s2, dh)?;
            let ans: SetClientDhParamsAnswer = link.plain_call(&mut ids, &req3).await?;

            let done = authentication::finish(s3, ans)?;
            log::info!("[sessiongen] DH complete ✓");

            Ok::<Self, InvocationError>(Self {
                link,
                enc: EncryptedSession::new(done.auth_key, done.first_salt, done.time_offset),
                pending_acks: Vec::new(),
                dc_id,
                addr,
            })
        };

        tokio::time::timeout(CONNECT_TIMEOUT, fut)
            .await
            .map_err(|_| InvocationError::Timeout(CONNECT_TIMEOUT))?
    }

    /// Connect reusing an existing auth key. The salt starts at zero and is
    /// corrected by the server's first `bad_server_salt`.
    pub(crate) async fn connect_with_key(
        dc_id:    i32,
        addr:     SocketAddr,
        auth_key: [u8; 256],
    ) -> Result<Self, InvocationError> {
        log::info!("[sessiongen] Connecting to DC{dc_id} {addr} (stored key) …");
        let link = tokio::time::timeout(CONNECT_TIMEOUT, Link::open(addr))
            .await
            .map_err(|_| InvocationError::Timeout(CONNECT_TIMEOUT))??;
        Ok(Self {
            link,
            enc: EncryptedSession::new(auth_key, 0, 0),
            pending_acks: Vec::new(),
            dc_id,
            addr,
        })
    }

    pub(crate) fn auth_key_bytes(&self) -> [u8; 256] { self.enc.auth_key_bytes() }

    /// Send `req` and return the raw bytes of its `rpc_result`.
    pub(crate) async fn rpc_call_raw<S: Serializable>(&mut self, req: &S) -> Result<Vec<u8>, InvocationError> {
        let mut last_code = 0;
        for _ in 0..MAX_RESENDS {
            let (wire, msg_id) = self.enc.pack(req);
            self.link.send(&wire).await?;
            let reply = tokio::time::timeout(RPC_TIMEOUT, self.recv_reply(msg_id))
                .await
                .map_err(|_| InvocationError::Timeout(RPC_TIMEOUT))??;
            match reply {
                Reply::Done(body) => return Ok(body),
                Reply::Resend(code) => {
                    log::debug!("[sessiongen] re-sending request (code {code})");
                    last_code = code;
                }
            }
        }
        Err(InvocationError::BadMessage(last_code))
    }

    async fn recv_reply(&mut self, req_msg_id: i64) -> Result<Reply, InvocationError> {
        loop {
            let frame = self.link.recv_frame().await?;
            let msg = self.enc.unpack(&frame)?;
            let outcome = self.handle(msg.msg_id, msg.seq_no, &msg.body, req_msg_id);
            self.flush_acks().await?;
            if let Some(reply) = outcome? {
                return Ok(reply);
            }
        }
    }

    async fn flush_acks(&mut self) -> Result<(), InvocationError> {
        if self.pending_acks.is_empty() {
            return Ok(());
        }
        let ack = MsgsAck { msg_ids: std::mem::take(&mut self.pending_acks) };
        let wire = self.enc.pack_unrelated(&ack);
        self.link.send(&wire).await
    }

    /// Process one (possibly nested) server message.
    fn handle(
        &mut self,
        msg_id:     i64,
        seq_no:     i32,
        body:       &[u8],
        req_msg_id: i64,
    ) -> Result<Option<Reply>, InvocationError> {
        if seq_no & 1 == 1 {
            self.pending_acks.push(msg_id);
        }
        let Some(id) = body.get(..4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]])) else {
            return Err(InvocationError::Deserialize("message body shorter than 4 bytes".into()));
        };

        match id {
            ids::RPC_RESULT => {
                let res = RpcResult::from_bytes(body)?;
                if res.req_msg_id != req_msg_id {
                    log::debug!("[sessiongen] ignoring result for stale msg_id {}", res.req_msg_id);
                    return Ok(None);
                }
                unwrap_result(res.result).map(|b| Some(Reply::Done(b)))
            }
            ids::MSG_CONTAINER => {
                let container = MsgContainer::from_bytes(body)?;
                let mut reply = None;
                for m in container.messages {
                    let r = self.handle(m.msg_id, m.seq_no, &m.body, req_msg_id)?;
                    reply = reply.or(r);
                }
                Ok(reply)
            }
            ids::GZIP_PACKED => {
                let packed = GzipPacked::from_bytes(body)?;
                self.handle(msg_id, 0, &gz_inflate(&packed.packed_data)?, req_msg_id)
            }
            ids::BAD_SERVER_SALT => {
                let bad = BadServerSalt::from_bytes(body)?;
                log::debug!("[sessiongen] server salt updated");
                self.enc.salt = bad.new_server_salt;
                Ok((bad.bad_msg_id == req_msg_id).then_some(Reply::Resend(bad.error_code)))
            }
            ids::BAD_MSG_NOTIFICATION => {
                let bad = BadMsgNotification::from_bytes(body)?;
                if bad.bad_msg_id != req_msg_id {
                    return Ok(None);
                }
                match bad.error_code {
                    16 | 17 => {
                        self.enc.correct_time_offset(msg_id);
                        Ok(Some(Reply::Resend(bad.error_code)))
                    }
                    code => Err(InvocationError::BadMessage(code)),
                }
            }
            ids::NEW_SESSION_CREATED => {
                let created = NewSessionCreated::from_bytes(body)?;
                self.enc.salt = created.server_salt;
                Ok(None)
            }
            other => {
                log::trace!("[sessiongen] skipping message {other:#010x}");
                Ok(None)
            }
        }
    }
}

/// Turn the payload of an `rpc_result` into the response bytes.
fn unwrap_result(result: Vec<u8>) -> Result<Vec<u8>, InvocationError> {
    match result.get(..4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]])) {
        Some(ids::RPC_ERROR) => {
            let e = TlRpcError::from_bytes(&result)?;
            Err(InvocationError::Rpc(RpcError::from_telegram(e.error_code, &e.error_message)))
        }
        Some(ids::GZIP_PACKED) => {
            let packed = GzipPacked::from_bytes(&result)?;
            unwrap_result(gz_inflate(&packed.packed_data)?)
        }
        _ => Ok(result),
    }
}

fn gz_inflate(data: &[u8]) -> Result<Vec<u8>, InvocationError> {
    let mut out = Vec::new();
    if flate2::read::GzDecoder::new(data).read_to_end(&mut out).is_ok() && !out.is_empty() {
        return Ok(out);
    }
    out.clear();
    flate2::read::ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|_| InvocationError::Deserialize("decompression failed".into()))?;
    Ok(out)
}
