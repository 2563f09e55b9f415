use std::sync::Arc;

use leafgate_sig::packet::{PacketReader, Tag};
use leafgate_sig::{
    DetachedSignature, Encoding, Error, HashAlgorithm, KeyRing, PublicKeyAlgorithm, SignatureType, SignatureVerifier,
    SignatureVersion, armor, classify_signature, read_key_ring,
};

macro_rules! testdata {
    ($name:literal) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../testdata/", $name)).as_slice()
    };
}

fn verify(key: &[u8], signature: &[u8], chunks: &[&[u8]]) -> leafgate_sig::Result<()> {
    let (ring, _) = read_key_ring(key)?;
    let (signature, _) = classify_signature(signature)?;
    let mut verifier = SignatureVerifier::new(&ring, Arc::new(signature));
    for chunk in chunks {
        verifier.update(chunk);
    }
    verifier.finish()
}

/// Binary packets of a fixture, armored or not.
fn packets(raw: &[u8]) -> Vec<(Tag, Vec<u8>)> {
    let data = match armor::decode(raw) {
        Ok(armored) => armored.data,
        Err(_) => raw.to_vec(),
    };
    PacketReader::new(&data)
        .map(|packet| packet.map(|p| (p.tag, p.body.into_owned())))
        .collect::<leafgate_sig::Result<_>>()
        .unwrap()
}

/// New format packet header for `body`.
fn frame(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![0xC0 | tag];
    match body.len() {
        len @ 0..=191 => out.push(len as u8),
        len @ 192..=8383 => {
            let len = len - 192;
            out.extend([(len >> 8) as u8 + 192, len as u8]);
        }
        len => {
            out.push(0xFF);
            out.extend((len as u32).to_be_bytes());
        }
    }
    out.extend_from_slice(body);
    out
}

fn reframe(packets: &[(Tag, Vec<u8>)]) -> Vec<u8> {
    packets.iter().flat_map(|(tag, body)| frame(tag.value(), body)).collect()
}

#[test]
fn rsa_armored_signature_verifies() {
    verify(testdata!("rsa.pub.asc"), testdata!("hello.rsa.sig.asc"), &[b"hello"]).unwrap();
}

#[test]
fn rsa_binary_material_verifies() {
    verify(testdata!("rsa.pub.gpg"), testdata!("hello.rsa.sig"), &[b"hello"]).unwrap();
}

#[test]
fn chunking_does_not_change_the_result() {
    verify(testdata!("rsa.pub.asc"), testdata!("hello.rsa.sig.asc"), &[b"he", b"", b"l", b"lo"]).unwrap();
}

#[test]
fn ed25519_signature_verifies() {
    verify(testdata!("ed25519.pub.asc"), testdata!("hello.ed25519.sig.asc"), &[b"hello"]).unwrap();
}

#[test]
fn subkey_signature_verifies() {
    let (ring, _) = read_key_ring(testdata!("rsa-with-subkey.pub.asc")).unwrap();
    let entity = &ring.entities()[0];
    assert_eq!(entity.primary.key_id().to_string(), "A2C527039324B5D9");
    assert_eq!(entity.subkeys.len(), 1);
    assert_eq!(entity.subkeys[0].key_id().to_string(), "651927A4C78A3F3E");

    verify(testdata!("rsa-with-subkey.pub.asc"), testdata!("hello.subkey.sig.asc"), &[b"hello"]).unwrap();
}

#[test]
fn legacy_v3_signature_verifies() {
    let (signature, encoding) = classify_signature(testdata!("hello.legacy.sig")).unwrap();
    assert_eq!(encoding, Encoding::Binary);
    assert_eq!(signature.version(), SignatureVersion::V3);
    assert_eq!(signature.hash_algorithm(), HashAlgorithm::Sha256);

    verify(testdata!("legacy.pub.asc"), testdata!("hello.legacy.sig"), &[b"hello"]).unwrap();
}

#[test]
fn text_signature_canonicalizes_line_endings() {
    let (signature, _) = classify_signature(testdata!("lines.ed25519.textsig.asc")).unwrap();
    assert_eq!(signature.sig_type(), SignatureType::Text);

    let key = testdata!("ed25519.pub.asc");
    let sig = testdata!("lines.ed25519.textsig.asc");
    verify(key, sig, &[b"hello\nworld\n"]).unwrap();
    verify(key, sig, &[b"hello\r\nworld\r\n"]).unwrap();
    verify(key, sig, &[b"hello\r", b"\nworld", b"\n"]).unwrap();
}

#[test]
fn altered_content_is_rejected() {
    let result = verify(testdata!("rsa.pub.asc"), testdata!("hello.rsa.sig.asc"), &[b"hellp"]);
    assert!(matches!(result, Err(Error::BadSignature)));

    let result = verify(testdata!("ed25519.pub.asc"), testdata!("hello.ed25519.sig.asc"), &[b"hello\n"]);
    assert!(matches!(result, Err(Error::BadSignature)));
}

#[test]
fn signature_from_unrelated_key_is_rejected() {
    let result = verify(testdata!("other.pub.asc"), testdata!("hello.rsa.sig.asc"), &[b"hello"]);
    assert!(matches!(result, Err(Error::UnknownIssuer(issuer)) if issuer == "A2C527039324B5D9"));
}

#[test]
fn signature_metadata() {
    let (signature, encoding) = classify_signature(testdata!("hello.rsa.sig.asc")).unwrap();
    assert_eq!(encoding, Encoding::Armored);
    assert_eq!(signature.version(), SignatureVersion::V4);
    assert_eq!(signature.algorithm(), PublicKeyAlgorithm::Rsa);
    assert_eq!(signature.hash_algorithm(), HashAlgorithm::Sha512);
    assert_eq!(signature.sig_type(), SignatureType::Binary);
    assert!(signature.created().is_some());
    assert_eq!(signature.issuers()[0].to_string(), "A2C527039324B5D9");

    let (binary, encoding) = classify_signature(testdata!("hello.rsa.sig")).unwrap();
    assert_eq!(encoding, Encoding::Binary);
    assert_eq!(binary.issuers(), signature.issuers());
}

#[test]
fn key_ring_metadata() {
    let (ring, encoding) = read_key_ring(testdata!("ed25519.pub.asc")).unwrap();
    assert_eq!(encoding, Encoding::Armored);
    let key = &ring.entities()[0].primary;
    assert_eq!(key.algorithm, PublicKeyAlgorithm::EdDsaLegacy);
    assert_eq!(key.key_id().to_string(), "76FE01C3A1FC8B35");
    assert_eq!(key.fingerprint().len(), 20);

    let (binary, encoding) = read_key_ring(testdata!("rsa.pub.gpg")).unwrap();
    assert_eq!(encoding, Encoding::Binary);
    assert_eq!(binary.keys().count(), ring.keys().count());
}

#[test]
fn armor_with_wrong_block_type_is_refused() {
    let result = classify_signature(testdata!("hello.rsa.sig-as-message.asc"));
    assert!(matches!(result, Err(Error::WrongBlockType { .. })));

    let result = classify_signature(testdata!("key-as-signature.asc"));
    assert!(matches!(result, Err(Error::NotASignature(6))));

    let result = read_key_ring(testdata!("hello.rsa.sig.asc"));
    assert!(matches!(result, Err(Error::WrongBlockType { .. })));
}

#[test]
fn key_material_is_not_a_signature() {
    let result = DetachedSignature::from_bytes(testdata!("rsa.pub.gpg"));
    assert!(matches!(result, Err(Error::NotASignature(6))));
}

#[test]
fn garbage_is_rejected() {
    assert!(read_key_ring(b"not a key").is_err());
    assert!(classify_signature(b"not a signature").is_err());
    assert!(KeyRing::from_bytes(&[]).is_err());
}

#[test]
fn grafted_subkey_without_binding_is_refused() {
    // the Ed25519 signer's key appended to the RSA key as if it were a subkey
    let mut ring = testdata!("rsa.pub.gpg").to_vec();
    let (_, ed25519_primary) = packets(testdata!("ed25519.pub.asc")).remove(0);
    ring.extend(frame(14, &ed25519_primary));

    let result = verify(&ring, testdata!("hello.ed25519.sig.asc"), &[b"hello"]);
    match result {
        Err(Error::UnboundSubkey { primary, subkey }) => {
            assert_eq!(primary.to_string(), "A2C527039324B5D9");
            assert_eq!(subkey.to_string(), "76FE01C3A1FC8B35");
        }
        other => panic!("expected an unbound subkey, got {other:?}"),
    }
}

#[test]
fn binding_from_another_key_is_refused() {
    // move the subkey and its binding under an unrelated primary key
    let with_subkey = packets(testdata!("rsa-with-subkey.pub.asc"));
    let mut ring = packets(testdata!("other.pub.asc"));
    ring.extend(with_subkey.into_iter().skip_while(|(tag, _)| *tag != Tag::PublicSubkey));

    let result = read_key_ring(&reframe(&ring));
    assert!(matches!(result, Err(Error::UnboundSubkey { .. })));
}

#[test]
fn user_id_without_self_signature_is_refused() {
    let mut stripped = packets(testdata!("rsa.pub.gpg"));
    stripped.retain(|(tag, _)| *tag != Tag::Signature);

    let result = read_key_ring(&reframe(&stripped));
    assert!(matches!(result, Err(Error::MissingIdentity(id)) if id.to_string() == "A2C527039324B5D9"));
}

#[test]
fn altered_user_id_is_refused() {
    let mut altered = packets(testdata!("rsa.pub.gpg"));
    let (_, uid) = altered.iter_mut().find(|(tag, _)| *tag == Tag::UserId).unwrap();
    uid[0] ^= 0x20;

    let result = read_key_ring(&reframe(&altered));
    assert!(matches!(result, Err(Error::InvalidSelfSignature(_))));
}

#[test]
fn user_id_certification_is_not_a_detached_signature() {
    let (_, certification) = packets(testdata!("rsa.pub.gpg"))
        .into_iter()
        .find(|(tag, _)| *tag == Tag::Signature)
        .unwrap();

    let result = classify_signature(&frame(2, &certification));
    assert!(matches!(result, Err(Error::UnsupportedSignatureType(0x13))));
}

#[test]
fn signature_without_issuer_is_not_verified() {
    // v4 binary signature by RSA over SHA-256 with only a creation time
    let mut body = vec![4, 0x00, 1, 8, 0, 6, 5, 2, 0x65, 0, 0, 1, 0, 0, 0xBE, 0xEF];
    body.extend([0x00, 0x08, 0x7F]);
    let signature = DetachedSignature::from_packet_body(&body).unwrap();
    assert!(signature.issuers().is_empty());

    let (ring, _) = read_key_ring(testdata!("rsa.pub.asc")).unwrap();
    let mut verifier = SignatureVerifier::new(&ring, Arc::new(signature));
    verifier.update(b"hello");
    assert!(matches!(verifier.finish(), Err(Error::MissingIssuer)));
}
