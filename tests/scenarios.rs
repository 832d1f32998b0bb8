//! End-to-end scenarios (`spec.md` §8) driven through the public
//! `Engine` API only, the way a transport layer would call it.
#![allow(clippy::unwrap_used)]

use se_security_core::engine::Command;
use se_security_core::flash::{BlockKind, FlashDevice, RamFlash};
use se_security_core::{key, Engine, StatusCode};

type Flash = RamFlash<64, 128>;

fn engine() -> Engine<Flash> {
    Engine::new(Flash::new())
}

fn algo_init_req(algo: u16, mode: u16, key_id: u32) -> [u8; 8] {
    let mut req = [0u8; 8];
    req[0..2].copy_from_slice(&algo.to_le_bytes());
    req[2..4].copy_from_slice(&mode.to_le_bytes());
    req[4..8].copy_from_slice(&key_id.to_le_bytes());
    req
}

fn update_req(sid: u32, flags: u16, datain1: &[u8]) -> Vec<u8> {
    let mut req = Vec::new();
    req.extend_from_slice(&sid.to_le_bytes());
    req.extend_from_slice(&flags.to_le_bytes());
    req.extend_from_slice(&(datain1.len() as u16).to_le_bytes());
    req.extend_from_slice(&0u16.to_le_bytes());
    req.extend_from_slice(&[0u8; 6]);
    let padded = (datain1.len() + 15) / 16 * 16;
    req.extend_from_slice(datain1);
    req.extend_from_slice(&vec![0u8; padded - datain1.len()]);
    req
}

const AES_ALGO: u16 = 0;
const MODE_ENCRYPT: u16 = 0;
const FINIT: u16 = 0b0000_0100;

#[test]
fn scenario_1_crypto_list_on_a_fresh_device() {
    let mut engine = engine();
    let mut resp = [0u8; 256];
    let n = engine.dispatch(Command::CryptoList, &[], &mut resp).unwrap();
    assert!(n > 2);

    let count = u16::from_le_bytes([resp[0], resp[1]]);
    assert_eq!(count, 5);

    let first_name = &resp[2..2 + 16];
    let trimmed: &[u8] = first_name.split(|&b| b == 0).next().unwrap();
    assert_eq!(trimmed, b"Aes");

    let ty = u16::from_le_bytes([resp[2 + 16], resp[2 + 17]]);
    let block_size = u16::from_le_bytes([resp[2 + 18], resp[2 + 19]]);
    let key_size = u16::from_le_bytes([resp[2 + 20], resp[2 + 21]]);
    assert_eq!(ty, 0); // BlockCipher
    assert_eq!(block_size, 16);
    assert_eq!(key_size, 32);
}

#[test]
fn scenario_2_record_round_trip_and_replace() {
    let mut flash = Flash::new();
    let data_a = [0x11u8; 64];
    let data_b = [0xffu8; 64];
    assert!(se_security_core::record::set(&mut flash, 7, &data_a, 32));
    let mut out = [0u8; 64];
    assert!(se_security_core::record::get(&flash, 7, 32, &mut out));
    assert_eq!(out, data_a);

    assert!(se_security_core::record::set(&mut flash, 7, &data_b, 32));
    assert!(se_security_core::record::get(&flash, 7, 32, &mut out));
    assert_eq!(out, data_b);

    let mut live_type_7 = 0;
    let mut it = flash.iter();
    while it.advance() {
        if it.kind() == BlockKind::Record {
            let mut ty = [0u8; 2];
            if flash.read(it.addr(), 0, &mut ty) && u16::from_le_bytes(ty) == 7 {
                live_type_7 += 1;
            }
        }
    }
    assert_eq!(live_type_7, 1);
}

#[test]
fn scenario_3_expired_key_is_rejected() {
    let mut engine = engine();
    key::provision(engine.flash_mut(), 1, 500, &[0x42; 32]).unwrap();

    let set_time_req = 1000u32.to_le_bytes();
    engine.dispatch(Command::CryptoSetTime, &set_time_req, &mut []).unwrap();

    let req = algo_init_req(AES_ALGO, MODE_ENCRYPT, 1);
    let mut resp = [0u8; 16];
    let err = engine.dispatch(Command::CryptoInit, &req, &mut resp).unwrap_err();
    assert_eq!(err, StatusCode::ErrExpired);
}

#[test]
fn scenario_3b_key_before_set_time_fails_closed() {
    let mut engine = engine();
    key::provision(engine.flash_mut(), 1, 0, &[0x42; 32]).unwrap();
    let req = algo_init_req(AES_ALGO, MODE_ENCRYPT, 1);
    let mut resp = [0u8; 16];
    let err = engine.dispatch(Command::CryptoInit, &req, &mut resp).unwrap_err();
    assert_eq!(err, StatusCode::ErrExpired);
}

#[test]
fn scenario_4_session_lifecycle() {
    let mut engine = engine();
    key::provision(engine.flash_mut(), 1, 10_000, &[0x42; 32]).unwrap();
    let set_time_req = 1000u32.to_le_bytes();
    engine.dispatch(Command::CryptoSetTime, &set_time_req, &mut []).unwrap();

    let init_req = algo_init_req(AES_ALGO, MODE_ENCRYPT, 1);
    let mut init_resp = [0u8; 16];
    let n = engine.dispatch(Command::CryptoInit, &init_req, &mut init_resp).unwrap();
    let sid = u32::from_le_bytes([init_resp[0], init_resp[1], init_resp[2], init_resp[3]]);
    assert_eq!(n, 4);

    let plaintext = [0xABu8; 32];
    let req = update_req(sid, 0, &plaintext);
    let mut resp = [0u8; 64];
    let n = engine.dispatch(Command::CryptoUpdate, &req, &mut resp).unwrap();
    let dataout_len = u16::from_le_bytes([resp[0], resp[1]]) as usize;
    assert_eq!(dataout_len, 32);
    assert_eq!(n, 16 + 32);

    let finit_req = update_req(sid, FINIT, &[]);
    engine.dispatch(Command::CryptoUpdate, &finit_req, &mut resp).unwrap();

    let retry_req = update_req(sid, 0, &plaintext);
    let err = engine.dispatch(Command::CryptoUpdate, &retry_req, &mut resp).unwrap_err();
    assert_eq!(err, StatusCode::ErrResource);
}

#[test]
fn scenario_5_payload_envelope_round_trip_and_bit_flip() {
    let mut engine = engine();
    engine.payload_crypto_init(b"a base key of exactly 32 bytes!");
    let payload = engine.payload().unwrap();

    use se_security_core::flags::CmdFlags;
    use se_security_core::payload::PayloadAlgo;

    let iv = [0u8; 16];
    let mut data = [0x41u8; 32];
    let mut tag = [0u8; 16];
    payload
        .encrypt(PayloadAlgo::Aes256, CmdFlags::ENCRYPT | CmdFlags::SIGN, &iv, &mut data, &mut tag)
        .unwrap();

    let mut roundtrip = data;
    payload
        .decrypt(PayloadAlgo::Aes256, CmdFlags::ENCRYPT | CmdFlags::SIGN, &iv, &mut roundtrip, &tag)
        .unwrap();
    assert_eq!(roundtrip, [0x41u8; 32]);

    let mut flipped = data;
    flipped[0] ^= 1;
    let before = flipped;
    let err = payload
        .decrypt(PayloadAlgo::Aes256, CmdFlags::ENCRYPT | CmdFlags::SIGN, &iv, &mut flipped, &tag)
        .unwrap_err();
    assert_eq!(err, se_security_core::payload::PayloadError::TagMismatch);
    assert_eq!(flipped, before);
}

#[test]
fn scenario_6_arena_exhaustion_and_recovery() {
    let mut engine = engine();
    key::provision(engine.flash_mut(), 1, 10_000, &[0x42; 32]).unwrap();
    engine
        .dispatch(Command::CryptoSetTime, &1000u32.to_le_bytes(), &mut [])
        .unwrap();

    let mut sids = vec![];
    for _ in 0..16 {
        let req = algo_init_req(AES_ALGO, MODE_ENCRYPT, 1);
        let mut resp = [0u8; 16];
        engine.dispatch(Command::CryptoInit, &req, &mut resp).unwrap();
        sids.push(u32::from_le_bytes([resp[0], resp[1], resp[2], resp[3]]));
    }

    let req = algo_init_req(AES_ALGO, MODE_ENCRYPT, 1);
    let mut resp = [0u8; 16];
    let err = engine.dispatch(Command::CryptoInit, &req, &mut resp).unwrap_err();
    assert_eq!(err, StatusCode::ErrMemory);

    let finit_req = update_req(sids[0], FINIT, &[]);
    let mut update_resp = [0u8; 16];
    engine.dispatch(Command::CryptoUpdate, &finit_req, &mut update_resp).unwrap();

    let n = engine.dispatch(Command::CryptoInit, &req, &mut resp).unwrap();
    assert_eq!(n, 4);
}
