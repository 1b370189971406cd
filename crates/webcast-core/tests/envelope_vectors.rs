//! Push frame vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use webcast_core::protocol::{decode_envelope, decode_response, decompress_payload};

use vector_loader::load;

const VECTORS: [&str; 6] = [
    "data_need_ack.json",
    "data_no_ack.json",
    "heartbeat.json",
    "unknown_payload_type.json",
    "truncated.json",
    "corrupt_gzip.json",
];

#[test]
fn envelope_vectors() {
    for f in VECTORS {
        let v = load(f);
        let raw = v.frame.decode();
        let res = decode_envelope(&raw);

        if let Some(err) = &v.expect_error {
            if err.stage == "envelope" {
                let e = res.expect_err("expected envelope error");
                assert_eq!(e.kind().as_str(), err.code, "vector={}", v.description);
                continue;
            }
        }

        let env = res.expect("expected ok envelope");

        if let Some(err) = &v.expect_error {
            assert_eq!(err.stage, "inflate", "vector={}", v.description);
            let e = decompress_payload(&env).expect_err("expected inflate error");
            assert_eq!(e.kind().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let ex = v.expect.expect("missing expect block");
        assert_eq!(env.kind.as_str(), ex["kind"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(env.seq_id, ex["seq_id"].as_u64().unwrap(), "vector={}", v.description);
        assert_eq!(env.log_id, ex["log_id"].as_u64().unwrap(), "vector={}", v.description);

        if ex.get("need_ack").is_none() {
            continue;
        }

        let inflated = decompress_payload(&env).unwrap();
        let resp = decode_response(&inflated).unwrap();
        assert_eq!(resp.need_ack, ex["need_ack"].as_bool().unwrap(), "vector={}", v.description);
        assert_eq!(resp.internal_ext, ex["internal_ext"].as_str().unwrap(), "vector={}", v.description);

        let methods: Vec<&str> = resp.messages.iter().map(|m| m.method.as_str()).collect();
        let expected: Vec<&str> = ex["methods"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m.as_str().unwrap())
            .collect();
        assert_eq!(methods, expected, "vector={}", v.description);
    }
}

#[test]
fn decoding_twice_yields_equal_envelopes() {
    for f in ["data_need_ack.json", "data_no_ack.json", "heartbeat.json"] {
        let raw = load(f).frame.decode();
        let a = decode_envelope(&raw).unwrap();
        let b = decode_envelope(&raw).unwrap();
        assert_eq!(a, b, "vector={f}");
    }
}

#[test]
fn data_frame_headers_are_kept_in_order() {
    let raw = load("data_need_ack.json").frame.decode();
    let env = decode_envelope(&raw).unwrap();
    assert_eq!(env.header("compress_type"), Some("gzip"));
    assert_eq!(env.headers[1].0, "im-cursor");
}
