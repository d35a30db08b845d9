use sessiongen_crypto::{AuthKey, Side, decrypt_data_v2_as, encrypt_data_v2_as};
use sessiongen_mtproto::message::{PlainError, pack_plain, unpack_plain};
use sessiongen_mtproto::transport::{UnpackError, Unpacked};
use sessiongen_mtproto::{AbridgedTransport, DecryptError, EncryptedSession};
use sessiongen_tl::api::help::GetNearestDc;

/// Non-uniform so the client and server slices of the key differ.
fn key() -> [u8; 256] {
    std::array::from_fn(|i| (i * 31 % 251) as u8)
}
const SESSION_ID: i64 = 0x1122_3344_5566_7788;

fn session() -> EncryptedSession {
    EncryptedSession::with_session_id(key(), 99, 0, SESSION_ID)
}

/// Builds what a server would send for `body` in our session.
fn server_frame(session_id: i64, msg_id: i64, body: &[u8]) -> Vec<u8> {
    let mut plain = Vec::new();
    plain.extend(7i64.to_le_bytes());
    plain.extend(session_id.to_le_bytes());
    plain.extend(msg_id.to_le_bytes());
    plain.extend(1i32.to_le_bytes());
    plain.extend((body.len() as u32).to_le_bytes());
    plain.extend_from_slice(body);
    encrypt_data_v2_as(&plain, &AuthKey::from_bytes(key()), Side::Server, &[0; 32])
}

// ── EncryptedSession ──────────────────────────────────────────────────────────

#[test]
fn pack_layout_and_counters() {
    let mut s = session();
    let (first, id1) = s.pack(&GetNearestDc);
    let (_, id2) = s.pack(&GetNearestDc);
    assert!(id2 > id1);
    assert_eq!(id1 % 4, 0);

    let plain = decrypt_data_v2_as(&first, &AuthKey::from_bytes(key()), Side::Client).unwrap();
    assert_eq!(i64::from_le_bytes(plain[..8].try_into().unwrap()), 99);
    assert_eq!(i64::from_le_bytes(plain[8..16].try_into().unwrap()), SESSION_ID);
    assert_eq!(i64::from_le_bytes(plain[16..24].try_into().unwrap()), id1);
    assert_eq!(i32::from_le_bytes(plain[24..28].try_into().unwrap()), 1, "first seq_no is 1");
    assert_eq!(u32::from_le_bytes(plain[28..32].try_into().unwrap()), 4);
    assert_eq!(plain[32..36], 0x1fb33026u32.to_le_bytes());
}

#[test]
fn seq_no_stays_odd_for_requests() {
    let mut s = session();
    let key = AuthKey::from_bytes(key());
    let seq: Vec<i32> = (0..3)
        .map(|_| {
            let (frame, _) = s.pack(&GetNearestDc);
            let plain = decrypt_data_v2_as(&frame, &key, Side::Client).unwrap();
            i32::from_le_bytes(plain[24..28].try_into().unwrap())
        })
        .collect();
    assert_eq!(seq, vec![1, 3, 5]);
}

#[test]
fn unpack_reads_server_frame() {
    let s = session();
    let msg = s.unpack(&server_frame(SESSION_ID, 1234, &[1, 2, 3, 4])).unwrap();
    assert_eq!(msg.salt, 7);
    assert_eq!(msg.msg_id, 1234);
    assert_eq!(msg.seq_no, 1);
    assert_eq!(msg.body, vec![1, 2, 3, 4]);
}

#[test]
fn unpack_rejects_other_session() {
    let s = session();
    let err = s.unpack(&server_frame(SESSION_ID + 1, 1, &[0; 4])).unwrap_err();
    assert_eq!(err, DecryptError::SessionMismatch);
}

#[test]
fn unpack_rejects_own_frames() {
    let mut s = session();
    let (frame, _) = s.pack(&GetNearestDc);
    assert!(matches!(s.unpack(&frame), Err(DecryptError::Crypto(_))));
}

#[test]
fn uniform_key_slices_coincide() {
    // A key of one repeated byte derives the same AES key in both directions.
    let uniform = AuthKey::from_bytes([0x42; 256]);
    let plain = [0u8; 48];
    let frame = encrypt_data_v2_as(&plain, &uniform, Side::Client, &[0; 32]);
    assert!(decrypt_data_v2_as(&frame, &uniform, Side::Server).is_ok());

    let mixed = AuthKey::from_bytes(key());
    let frame = encrypt_data_v2_as(&plain, &mixed, Side::Client, &[0; 32]);
    assert!(decrypt_data_v2_as(&frame, &mixed, Side::Server).is_err());
}

// ── Plaintext framing ─────────────────────────────────────────────────────────

#[test]
fn plaintext_layout() {
    let wire = pack_plain(0x10, &[0xAA, 0xBB, 0xCC, 0xDD]);
    assert_eq!(wire.len(), 8 + 8 + 4 + 4);
    assert_eq!(&wire[..8], &[0u8; 8]);
    assert_eq!(unpack_plain(&wire).unwrap(), (0x10, &[0xAA, 0xBB, 0xCC, 0xDD][..]));
}

#[test]
fn plaintext_errors() {
    assert_eq!(unpack_plain(&[0; 10]), Err(PlainError::TooShort { len: 10 }));

    let mut wire = pack_plain(1, &[0; 8]);
    wire[0] = 1;
    assert_eq!(unpack_plain(&wire), Err(PlainError::NotPlaintext { auth_key_id: 1 }));

    let wire = pack_plain(1, &[0; 8]);
    assert!(matches!(unpack_plain(&wire[..24]), Err(PlainError::TooShort { .. })));
}

// ── AbridgedTransport ─────────────────────────────────────────────────────────

#[test]
fn abridged_sends_init_byte_once() {
    let mut t = AbridgedTransport::new();
    let mut out = Vec::new();
    t.pack(&[0u8; 4], &mut out);
    assert_eq!(out, vec![0xef, 1, 0, 0, 0, 0]);

    out.clear();
    t.pack(&[0u8; 4], &mut out);
    assert_eq!(out[0], 1, "init byte must only be sent once");
}

#[test]
fn abridged_long_header() {
    let mut t = AbridgedTransport::new();
    let payload = vec![7u8; 0x7f * 4];
    let mut out = Vec::new();
    t.pack(&payload, &mut out);
    assert_eq!(&out[..5], &[0xef, 0x7f, 0x7f, 0, 0]);

    let got = t.unpack(&out[1..]).unwrap();
    assert_eq!(got, Unpacked { consumed: 4 + payload.len(), payload });
}

#[test]
fn abridged_needs_whole_frame() {
    let t = AbridgedTransport::new();
    assert_eq!(t.unpack(&[]), Err(UnpackError::Incomplete { needed: None }));
    assert_eq!(t.unpack(&[0x7f, 1]), Err(UnpackError::Incomplete { needed: None }));
    assert_eq!(t.unpack(&[2, 0, 0, 0]), Err(UnpackError::Incomplete { needed: Some(9) }));

    let frame = [2, 1, 2, 3, 4, 5, 6, 7, 8, 0xff];
    let got = t.unpack(&frame).unwrap();
    assert_eq!(got.consumed, 9);
    assert_eq!(got.payload, vec![1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn abridged_surfaces_transport_errors() {
    let t = AbridgedTransport::new();
    let mut frame = vec![1];
    frame.extend((-404i32).to_le_bytes());
    assert_eq!(t.unpack(&frame), Err(UnpackError::Transport(-404)));
}
