//! MTProto-level constructors: the auth key handshake and the service
//! messages a client has to understand to read RPC replies.
//!
//! See <https://core.telegram.org/mtproto/auth_key> and
//! <https://core.telegram.org/mtproto/service_messages>.

use crate::deserialize::{Buffer, Error, Result};
use crate::serialize::BoxedVec;
use crate::{Deserializable, Identifiable, RemoteCall, Serializable, expect_id};

// ─── Handshake functions ─────────────────────────────────────────────────────

/// `req_pq_multi#be7e8ef1 nonce:int128 = ResPQ`
#[derive(Clone, Debug, PartialEq)]
pub struct ReqPqMulti {
    pub nonce: [u8; 16],
}

impl Identifiable for ReqPqMulti { const CONSTRUCTOR_ID: u32 = 0xbe7e8ef1; }

impl Serializable for ReqPqMulti {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.nonce.serialize(buf);
    }
}

impl RemoteCall for ReqPqMulti { type Return = ResPq; }

/// `req_DH_params#d712e4be`
#[derive(Clone, Debug, PartialEq)]
pub struct ReqDhParams {
    pub nonce:                  [u8; 16],
    pub server_nonce:           [u8; 16],
    pub p:                      Vec<u8>,
    pub q:                      Vec<u8>,
    pub public_key_fingerprint: i64,
    pub encrypted_data:         Vec<u8>,
}

impl Identifiable for ReqDhParams { const CONSTRUCTOR_ID: u32 = 0xd712e4be; }

impl Serializable for ReqDhParams {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.p.serialize(buf);
        self.q.serialize(buf);
        self.public_key_fingerprint.serialize(buf);
        self.encrypted_data.serialize(buf);
    }
}

impl RemoteCall for ReqDhParams { type Return = ServerDhParams; }

/// `set_client_DH_params#f5045f1f`
#[derive(Clone, Debug, PartialEq)]
pub struct SetClientDhParams {
    pub nonce:          [u8; 16],
    pub server_nonce:   [u8; 16],
    pub encrypted_data: Vec<u8>,
}

impl Identifiable for SetClientDhParams { const CONSTRUCTOR_ID: u32 = 0xf5045f1f; }

impl Serializable for SetClientDhParams {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.encrypted_data.serialize(buf);
    }
}

impl RemoteCall for SetClientDhParams { type Return = SetClientDhParamsAnswer; }

// ─── Handshake types ─────────────────────────────────────────────────────────

/// `resPQ#05162463`
#[derive(Clone, Debug, PartialEq)]
pub struct ResPq {
    pub nonce:                          [u8; 16],
    pub server_nonce:                   [u8; 16],
    pub pq:                             Vec<u8>,
    pub server_public_key_fingerprints: Vec<i64>,
}

impl Identifiable for ResPq { const CONSTRUCTOR_ID: u32 = 0x05162463; }

impl Serializable for ResPq {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.pq.serialize(buf);
        BoxedVec(self.server_public_key_fingerprints.clone()).serialize(buf);
    }
}

impl Deserializable for ResPq {
    fn deserialize(buf: Buffer) -> Result<Self> {
        expect_id(buf, Self::CONSTRUCTOR_ID)?;
        Ok(Self {
            nonce:        <[u8; 16]>::deserialize(buf)?,
            server_nonce: <[u8; 16]>::deserialize(buf)?,
            pq:           Vec::<u8>::deserialize(buf)?,
            server_public_key_fingerprints: BoxedVec::<i64>::deserialize(buf)?.0,
        })
    }
}

/// `p_q_inner_data_dc#a9f55f95`, the payload RSA-encrypted in `req_DH_params`.
#[derive(Clone, Debug, PartialEq)]
pub struct PQInnerDataDc {
    pub pq:           Vec<u8>,
    pub p:            Vec<u8>,
    pub q:            Vec<u8>,
    pub nonce:        [u8; 16],
    pub server_nonce: [u8; 16],
    pub new_nonce:    [u8; 32],
    pub dc:           i32,
}

impl Identifiable for PQInnerDataDc { const CONSTRUCTOR_ID: u32 = 0xa9f55f95; }

impl Serializable for PQInnerDataDc {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.pq.serialize(buf);
        self.p.serialize(buf);
        self.q.serialize(buf);
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.new_nonce.serialize(buf);
        self.dc.serialize(buf);
    }
}

/// `server_DH_params_ok#d0e8075c`
#[derive(Clone, Debug, PartialEq)]
pub struct ServerDhParamsOk {
    pub nonce:            [u8; 16],
    pub server_nonce:     [u8; 16],
    pub encrypted_answer: Vec<u8>,
}

/// `server_DH_params_fail#79cb045d`
#[derive(Clone, Debug, PartialEq)]
pub struct ServerDhParamsFail {
    pub nonce:          [u8; 16],
    pub server_nonce:   [u8; 16],
    pub new_nonce_hash: [u8; 16],
}

/// Boxed `Server_DH_Params`.
#[derive(Clone, Debug, PartialEq)]
pub enum ServerDhParams {
    Ok(ServerDhParamsOk),
    Fail(ServerDhParamsFail),
}

impl ServerDhParams {
    pub const OK_ID:   u32 = 0xd0e8075c;
    pub const FAIL_ID: u32 = 0x79cb045d;
}

impl Serializable for ServerDhParams {
    fn serialize(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Ok(x) => {
                Self::OK_ID.serialize(buf);
                x.nonce.serialize(buf);
                x.server_nonce.serialize(buf);
                x.encrypted_answer.serialize(buf);
            }
            Self::Fail(x) => {
                Self::FAIL_ID.serialize(buf);
                x.nonce.serialize(buf);
                x.server_nonce.serialize(buf);
                x.new_nonce_hash.serialize(buf);
            }
        }
    }
}

impl Deserializable for ServerDhParams {
    fn deserialize(buf: Buffer) -> Result<Self> {
        match u32::deserialize(buf)? {
            Self::OK_ID => Ok(Self::Ok(ServerDhParamsOk {
                nonce:            <[u8; 16]>::deserialize(buf)?,
                server_nonce:     <[u8; 16]>::deserialize(buf)?,
                encrypted_answer: Vec::<u8>::deserialize(buf)?,
            })),
            Self::FAIL_ID => Ok(Self::Fail(ServerDhParamsFail {
                nonce:          <[u8; 16]>::deserialize(buf)?,
                server_nonce:   <[u8; 16]>::deserialize(buf)?,
                new_nonce_hash: <[u8; 16]>::deserialize(buf)?,
            })),
            id => Err(Error::UnexpectedConstructor { id }),
        }
    }
}

/// `server_DH_inner_data#b5890dba`, found inside the decrypted answer.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerDhInnerData {
    pub nonce:        [u8; 16],
    pub server_nonce: [u8; 16],
    pub g:            i32,
    pub dh_prime:     Vec<u8>,
    pub g_a:          Vec<u8>,
    pub server_time:  i32,
}

impl Identifiable for ServerDhInnerData { const CONSTRUCTOR_ID: u32 = 0xb5890dba; }

impl Serializable for ServerDhInnerData {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.g.serialize(buf);
        self.dh_prime.serialize(buf);
        self.g_a.serialize(buf);
        self.server_time.serialize(buf);
    }
}

impl Deserializable for ServerDhInnerData {
    fn deserialize(buf: Buffer) -> Result<Self> {
        expect_id(buf, Self::CONSTRUCTOR_ID)?;
        Ok(Self {
            nonce:        <[u8; 16]>::deserialize(buf)?,
            server_nonce: <[u8; 16]>::deserialize(buf)?,
            g:            i32::deserialize(buf)?,
            dh_prime:     Vec::<u8>::deserialize(buf)?,
            g_a:          Vec::<u8>::deserialize(buf)?,
            server_time:  i32::deserialize(buf)?,
        })
    }
}

/// `client_DH_inner_data#6643b654`
#[derive(Clone, Debug, PartialEq)]
pub struct ClientDhInnerData {
    pub nonce:        [u8; 16],
    pub server_nonce: [u8; 16],
    pub retry_id:     i64,
    pub g_b:          Vec<u8>,
}

impl Identifiable for ClientDhInnerData { const CONSTRUCTOR_ID: u32 = 0x6643b654; }

impl Serializable for ClientDhInnerData {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.retry_id.serialize(buf);
        self.g_b.serialize(buf);
    }
}

/// Body shared by `dh_gen_ok`, `dh_gen_retry` and `dh_gen_fail`.
#[derive(Clone, Debug, PartialEq)]
pub struct DhGen {
    pub nonce:          [u8; 16],
    pub server_nonce:   [u8; 16],
    pub new_nonce_hash: [u8; 16],
}

/// Boxed `Set_client_DH_params_answer`.
#[derive(Clone, Debug, PartialEq)]
pub enum SetClientDhParamsAnswer {
    DhGenOk(DhGen),
    DhGenRetry(DhGen),
    DhGenFail(DhGen),
}

impl SetClientDhParamsAnswer {
    pub const OK_ID:    u32 = 0x3bcbf734;
    pub const RETRY_ID: u32 = 0x46dc1fb9;
    pub const FAIL_ID:  u32 = 0xa69dae02;
}

impl Serializable for SetClientDhParamsAnswer {
    fn serialize(&self, buf: &mut Vec<u8>) {
        let (id, body) = match self {
            Self::DhGenOk(x)    => (Self::OK_ID, x),
            Self::DhGenRetry(x) => (Self::RETRY_ID, x),
            Self::DhGenFail(x)  => (Self::FAIL_ID, x),
        };
        id.serialize(buf);
        body.nonce.serialize(buf);
        body.server_nonce.serialize(buf);
        body.new_nonce_hash.serialize(buf);
    }
}

impl Deserializable for SetClientDhParamsAnswer {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let id = u32::deserialize(buf)?;
        let wrap: fn(DhGen) -> Self = match id {
            Self::OK_ID    => Self::DhGenOk,
            Self::RETRY_ID => Self::DhGenRetry,
            Self::FAIL_ID  => Self::DhGenFail,
            _ => return Err(Error::UnexpectedConstructor { id }),
        };
        Ok(wrap(DhGen {
            nonce:          <[u8; 16]>::deserialize(buf)?,
            server_nonce:   <[u8; 16]>::deserialize(buf)?,
            new_nonce_hash: <[u8; 16]>::deserialize(buf)?,
        }))
    }
}

// ─── Service messages ────────────────────────────────────────────────────────

/// Constructor IDs of the envelopes wrapped around encrypted RPC replies.
pub mod ids {
    pub const RPC_RESULT:           u32 = 0xf35c6d01;
    pub const RPC_ERROR:            u32 = 0x2144ca19;
    pub const MSG_CONTAINER:        u32 = 0x73f1f8dc;
    pub const GZIP_PACKED:          u32 = 0x3072cfa1;
    pub const PONG:                 u32 = 0x347773c5;
    pub const MSGS_ACK:             u32 = 0x62d6b459;
    pub const BAD_SERVER_SALT:      u32 = 0xedab447b;
    pub const BAD_MSG_NOTIFICATION: u32 = 0xa7eff811;
    pub const NEW_SESSION_CREATED:  u32 = 0x9ec20908;
    pub const MSG_DETAILED_INFO:    u32 = 0x276d3ec6;
    pub const MSG_NEW_DETAILED_INFO: u32 = 0x809db6df;
    pub const FUTURE_SALTS:         u32 = 0xae500895;
}

/// `rpc_error#2144ca19 error_code:int error_message:string`
#[derive(Clone, Debug, PartialEq)]
pub struct RpcError {
    pub error_code:    i32,
    pub error_message: String,
}

impl Identifiable for RpcError { const CONSTRUCTOR_ID: u32 = ids::RPC_ERROR; }

impl Serializable for RpcError {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.error_code.serialize(buf);
        self.error_message.serialize(buf);
    }
}

impl Deserializable for RpcError {
    fn deserialize(buf: Buffer) -> Result<Self> {
        expect_id(buf, Self::CONSTRUCTOR_ID)?;
        Ok(Self {
            error_code:    i32::deserialize(buf)?,
            error_message: String::deserialize(buf)?,
        })
    }
}

/// `bad_server_salt#edab447b`
#[derive(Clone, Debug, PartialEq)]
pub struct BadServerSalt {
    pub bad_msg_id:      i64,
    pub bad_msg_seqno:   i32,
    pub error_code:      i32,
    pub new_server_salt: i64,
}

impl Identifiable for BadServerSalt { const CONSTRUCTOR_ID: u32 = ids::BAD_SERVER_SALT; }

impl Serializable for BadServerSalt {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.bad_msg_id.serialize(buf);
        self.bad_msg_seqno.serialize(buf);
        self.error_code.serialize(buf);
        self.new_server_salt.serialize(buf);
    }
}

impl Deserializable for BadServerSalt {
    fn deserialize(buf: Buffer) -> Result<Self> {
        expect_id(buf, Self::CONSTRUCTOR_ID)?;
        Ok(Self {
            bad_msg_id:      i64::deserialize(buf)?,
            bad_msg_seqno:   i32::deserialize(buf)?,
            error_code:      i32::deserialize(buf)?,
            new_server_salt: i64::deserialize(buf)?,
        })
    }
}

/// `bad_msg_notification#a7eff811`
#[derive(Clone, Debug, PartialEq)]
pub struct BadMsgNotification {
    pub bad_msg_id:    i64,
    pub bad_msg_seqno: i32,
    pub error_code:    i32,
}

impl Identifiable for BadMsgNotification { const CONSTRUCTOR_ID: u32 = ids::BAD_MSG_NOTIFICATION; }

impl Serializable for BadMsgNotification {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.bad_msg_id.serialize(buf);
        self.bad_msg_seqno.serialize(buf);
        self.error_code.serialize(buf);
    }
}

impl Deserializable for BadMsgNotification {
    fn deserialize(buf: Buffer) -> Result<Self> {
        expect_id(buf, Self::CONSTRUCTOR_ID)?;
        Ok(Self {
            bad_msg_id:    i64::deserialize(buf)?,
            bad_msg_seqno: i32::deserialize(buf)?,
            error_code:    i32::deserialize(buf)?,
        })
    }
}

/// `new_session_created#9ec20908`
#[derive(Clone, Debug, PartialEq)]
pub struct NewSessionCreated {
    pub first_msg_id: i64,
    pub unique_id:    i64,
    pub server_salt:  i64,
}

impl Identifiable for NewSessionCreated { const CONSTRUCTOR_ID: u32 = ids::NEW_SESSION_CREATED; }

impl Serializable for NewSessionCreated {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.first_msg_id.serialize(buf);
        self.unique_id.serialize(buf);
        self.server_salt.serialize(buf);
    }
}

impl Deserializable for NewSessionCreated {
    fn deserialize(buf: Buffer) -> Result<Self> {
        expect_id(buf, Self::CONSTRUCTOR_ID)?;
        Ok(Self {
            first_msg_id: i64::deserialize(buf)?,
            unique_id:    i64::deserialize(buf)?,
            server_salt:  i64::deserialize(buf)?,
        })
    }
}

/// `msgs_ack#62d6b459 msg_ids:Vector<long>`
#[derive(Clone, Debug, PartialEq)]
pub struct MsgsAck {
    pub msg_ids: Vec<i64>,
}

impl Identifiable for MsgsAck { const CONSTRUCTOR_ID: u32 = ids::MSGS_ACK; }

impl Serializable for MsgsAck {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        BoxedVec(self.msg_ids.clone()).serialize(buf);
    }
}

/// One entry of a `msg_container#73f1f8dc`.
#[derive(Clone, Debug, PartialEq)]
pub struct ContainedMessage {
    pub msg_id: i64,
    pub seq_no: i32,
    pub body:   Vec<u8>,
}

/// `msg_container#73f1f8dc messages:vector<%Message>`
#[derive(Clone, Debug, PartialEq)]
pub struct MsgContainer {
    pub messages: Vec<ContainedMessage>,
}

impl Identifiable for MsgContainer { const CONSTRUCTOR_ID: u32 = ids::MSG_CONTAINER; }

impl Serializable for MsgContainer {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        (self.messages.len() as i32).serialize(buf);
        for m in &self.messages {
            m.msg_id.serialize(buf);
            m.seq_no.serialize(buf);
            (m.body.len() as i32).serialize(buf);
            buf.extend_from_slice(&m.body);
        }
    }
}

impl Deserializable for MsgContainer {
    fn deserialize(buf: Buffer) -> Result<Self> {
        expect_id(buf, Self::CONSTRUCTOR_ID)?;
        let count = i32::deserialize(buf)?;
        let mut messages = Vec::with_capacity(count.clamp(0, 1024) as usize);
        for _ in 0..count {
            let msg_id = i64::deserialize(buf)?;
            let seq_no = i32::deserialize(buf)?;
            let len    = i32::deserialize(buf)?;
            if len < 0 {
                return Err(Error::UnexpectedEof);
            }
            let body = buf.take(len as usize)?.to_vec();
            messages.push(ContainedMessage { msg_id, seq_no, body });
        }
        Ok(Self { messages })
    }
}

/// `rpc_result#f35c6d01 req_msg_id:long result:Object`
///
/// The result is kept as raw bytes; its type depends on the request.
#[derive(Clone, Debug, PartialEq)]
pub struct RpcResult {
    pub req_msg_id: i64,
    pub result:     Vec<u8>,
}

impl Identifiable for RpcResult { const CONSTRUCTOR_ID: u32 = ids::RPC_RESULT; }

impl Serializable for RpcResult {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.req_msg_id.serialize(buf);
        buf.extend_from_slice(&self.result);
    }
}

impl Deserializable for RpcResult {
    fn deserialize(buf: Buffer) -> Result<Self> {
        expect_id(buf, Self::CONSTRUCTOR_ID)?;
        let req_msg_id = i64::deserialize(buf)?;
        let mut result = Vec::new();
        buf.read_to_end(&mut result);
        Ok(Self { req_msg_id, result })
    }
}

/// `gzip_packed#3072cfa1 packed_data:bytes`
#[derive(Clone, Debug, PartialEq)]
pub struct GzipPacked {
    pub packed_data: Vec<u8>,
}

impl Identifiable for GzipPacked { const CONSTRUCTOR_ID: u32 = ids::GZIP_PACKED; }

impl Serializable for GzipPacked {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.packed_data.serialize(buf);
    }
}

impl Deserializable for GzipPacked {
    fn deserialize(buf: Buffer) -> Result<Self> {
        expect_id(buf, Self::CONSTRUCTOR_ID)?;
        Ok(Self { packed_data: Vec::<u8>::deserialize(buf)? })
    }
}
