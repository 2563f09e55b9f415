use std::fmt;

use sha1::{Digest, Sha1};

use crate::error::{Error, Result};
use crate::packet::{ByteReader, PacketReader, Tag};
use crate::signature::{DetachedSignature, SignatureType, SignatureVersion};
use crate::verify::verify_certification;

/// OID for Ed25519 in legacy EdDSA keys (RFC 4880bis §9.2).
const ED25519_OID: &[u8] = &[0x2B, 0x06, 0x01, 0x04, 0x01, 0xDA, 0x47, 0x0F, 0x01];

/// Low 64 bits of a key fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyId(pub [u8; 8]);

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "KeyId({self})") }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicKeyAlgorithm {
    Rsa,
    EdDsaLegacy,
    Other(u8),
}

impl PublicKeyAlgorithm {
    pub fn from_u8(id: u8) -> Self {
        match id {
            1..=3 => PublicKeyAlgorithm::Rsa,
            22 => PublicKeyAlgorithm::EdDsaLegacy,
            other => PublicKeyAlgorithm::Other(other),
        }
    }

    pub fn id(self) -> u8 {
        match self {
            PublicKeyAlgorithm::Rsa => 1,
            PublicKeyAlgorithm::EdDsaLegacy => 22,
            PublicKeyAlgorithm::Other(id) => id,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    Rsa { n: Vec<u8>, e: Vec<u8> },
    Ed25519([u8; 32]),
    /// Parsed but cannot verify.
    Unsupported,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Rsa { n, .. } => write!(f, "Rsa({} bits)", n.len() * 8),
            KeyMaterial::Ed25519(_) => f.write_str("Ed25519"),
            KeyMaterial::Unsupported => f.write_str("Unsupported"),
        }
    }
}

/// A primary key or subkey packet.
#[derive(Debug, Clone)]
pub struct PublicKey {
    pub version:   u8,
    pub created:   u32,
    pub algorithm: PublicKeyAlgorithm,
    pub material:  KeyMaterial,
    key_id:        KeyId,
    fingerprint:   Vec<u8>,
    /// `0x99`, two-octet length, packet body: the form hashed by key
    /// signatures.
    hashed_form:   Vec<u8>,
}

impl PublicKey {
    /// Parse the body of a public key or public subkey packet.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let len = u16::try_from(body.len()).map_err(|_| Error::Malformed("key packet too long"))?;
        let mut hashed_form = Vec::with_capacity(body.len() + 3);
        hashed_form.push(0x99);
        hashed_form.extend_from_slice(&len.to_be_bytes());
        hashed_form.extend_from_slice(body);

        let mut r = ByteReader::new(body);
        let version = r.u8()?;
        match version {
            4 => {
                let created = r.u32()?;
                let algorithm = PublicKeyAlgorithm::from_u8(r.u8()?);
                let material = read_material(algorithm, &mut r)?;

                let fingerprint = Sha1::digest(&hashed_form).to_vec();

                let mut id = [0u8; 8];
                id.copy_from_slice(&fingerprint[12..]);
                Ok(Self {
                    version,
                    created,
                    algorithm,
                    material,
                    key_id: KeyId(id),
                    fingerprint,
                    hashed_form,
                })
            }
            2 | 3 => {
                let created = r.u32()?;
                let _validity_days = r.u16()?;
                let algorithm = PublicKeyAlgorithm::from_u8(r.u8()?);
                if algorithm != PublicKeyAlgorithm::Rsa {
                    return Err(Error::UnsupportedAlgorithm(algorithm.id()));
                }
                let n = r.mpi()?;
                let e = r.mpi()?;
                let Some(low) = n.len().checked_sub(8).map(|start| &n[start..]) else {
                    return Err(Error::InvalidKey("RSA modulus shorter than 64 bits".into()));
                };
                let mut id = [0u8; 8];
                id.copy_from_slice(low);
                Ok(Self {
                    version,
                    created,
                    algorithm,
                    material: KeyMaterial::Rsa {
                        n: n.to_vec(),
                        e: e.to_vec(),
                    },
                    key_id: KeyId(id),
                    fingerprint: Vec::new(),
                    hashed_form,
                })
            }
            other => Err(Error::UnsupportedKeyVersion(other)),
        }
    }

    pub fn key_id(&self) -> KeyId { self.key_id }

    /// v4 fingerprint; empty for legacy v3 keys.
    pub fn fingerprint(&self) -> &[u8] { &self.fingerprint }

    pub fn can_verify(&self) -> bool { !matches!(self.material, KeyMaterial::Unsupported) }

    pub(crate) fn hashed_form(&self) -> &[u8] { &self.hashed_form }
}

fn read_material(algorithm: PublicKeyAlgorithm, r: &mut ByteReader<'_>) -> Result<KeyMaterial> {
    match algorithm {
        PublicKeyAlgorithm::Rsa => {
            let n = r.mpi()?.to_vec();
            let e = r.mpi()?.to_vec();
            Ok(KeyMaterial::Rsa { n, e })
        }
        PublicKeyAlgorithm::EdDsaLegacy => {
            let oid_len = usize::from(r.u8()?);
            let oid = r.take(oid_len)?;
            if oid != ED25519_OID {
                return Ok(KeyMaterial::Unsupported);
            }
            match r.mpi()? {
                [0x40, point @ ..] if point.len() == 32 => {
                    let mut raw = [0u8; 32];
                    raw.copy_from_slice(point);
                    Ok(KeyMaterial::Ed25519(raw))
                }
                _ => Err(Error::InvalidKey("Ed25519 point must be 0x40 followed by 32 octets".into())),
            }
        }
        PublicKeyAlgorithm::Other(_) => Ok(KeyMaterial::Unsupported),
    }
}

/// A primary key with its self-certified user ids and bound subkeys.
#[derive(Debug, Clone)]
pub struct Entity {
    pub primary:  PublicKey,
    pub subkeys:  Vec<PublicKey>,
    pub user_ids: Vec<String>,
}

impl Entity {
    pub fn keys(&self) -> impl Iterator<Item = &PublicKey> {
        std::iter::once(&self.primary).chain(&self.subkeys)
    }
}

/// Packets of one transferable public key, before its signatures are
/// checked.
struct PendingEntity {
    primary:  PublicKey,
    user_ids: Vec<(Vec<u8>, Vec<DetachedSignature>)>,
    subkeys:  Vec<(PublicKey, Vec<DetachedSignature>)>,
    current:  Component,
}

/// Component the next signature packets belong to.
enum Component {
    Primary,
    UserId,
    Subkey,
    Ignored,
}

impl PendingEntity {
    fn new(primary: PublicKey) -> Self {
        Self {
            primary,
            user_ids: Vec::new(),
            subkeys: Vec::new(),
            current: Component::Primary,
        }
    }

    fn add_signature(&mut self, body: &[u8]) {
        let signature = match DetachedSignature::parse(body) {
            Ok(signature) => signature,
            Err(e) => {
                tracing::trace!(error = %e, "skipping unreadable key signature");
                return;
            }
        };
        let sigs = match self.current {
            Component::UserId => self.user_ids.last_mut().map(|(_, sigs)| sigs),
            Component::Subkey => self.subkeys.last_mut().map(|(_, sigs)| sigs),
            Component::Primary | Component::Ignored => None,
        };
        if let Some(sigs) = sigs {
            sigs.push(signature);
        }
    }

    /// Signatures claiming to be made by the primary key.
    fn is_self_signed(&self, signature: &DetachedSignature) -> bool {
        signature.issuers().is_empty() || signature.issuers().contains(&self.primary.key_id())
    }

    /// Keep user ids with a valid self-certification and require every
    /// subkey to carry a valid binding signature from the primary key.
    fn validate(self) -> Result<Entity> {
        let primary_id = self.primary.key_id();

        let mut user_ids = Vec::new();
        for (uid, sigs) in &self.user_ids {
            let mut certified = false;
            for signature in sigs {
                if !matches!(signature.sig_type(), SignatureType::UserIdCertification(_))
                    || !self.is_self_signed(signature)
                {
                    continue;
                }
                let len = u32::try_from(uid.len()).map_err(|_| Error::Malformed("user id too long"))?;
                let mut header = vec![0xB4];
                header.extend_from_slice(&len.to_be_bytes());
                // v3 certifications hash the user id without a header
                let prefix: &[u8] = match signature.version() {
                    SignatureVersion::V3 => &[],
                    SignatureVersion::V4 => &header,
                };
                let preimage = [self.primary.hashed_form(), prefix, uid.as_slice()];
                verify_certification(&self.primary, signature, &preimage).map_err(|e| {
                    tracing::warn!(key_id = %primary_id, error = %e, "user id self-signature does not verify");
                    Error::InvalidSelfSignature(primary_id)
                })?;
                certified = true;
            }
            if certified {
                user_ids.push(String::from_utf8_lossy(uid).into_owned());
            }
        }
        if user_ids.is_empty() {
            return Err(Error::MissingIdentity(primary_id));
        }

        let mut subkeys = Vec::new();
        for (subkey, sigs) in self.subkeys.iter() {
            let bound = sigs
                .iter()
                .filter(|sig| sig.sig_type() == SignatureType::SubkeyBinding && self.is_self_signed(sig))
                .any(|sig| {
                    verify_certification(&self.primary, sig, &[self.primary.hashed_form(), subkey.hashed_form()])
                        .is_ok()
                });
            if !bound {
                tracing::warn!(
                    key_id = %primary_id,
                    subkey = %subkey.key_id(),
                    "subkey is not bound to its primary key"
                );
                return Err(Error::UnboundSubkey {
                    primary: primary_id,
                    subkey:  subkey.key_id(),
                });
            }
            subkeys.push(subkey.clone());
        }

        Ok(Entity {
            primary: self.primary,
            subkeys,
            user_ids,
        })
    }
}

/// One or more transferable public keys.
///
/// Only keys vouched for by their primary key enter the ring: each entity
/// needs at least one user id with a valid self-certification, and every
/// subkey needs a valid binding signature.
#[derive(Debug, Clone)]
pub struct KeyRing {
    entities: Vec<Entity>,
}

impl KeyRing {
    /// Parse binary key packets. The first packet must be a public key.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut pending: Vec<PendingEntity> = Vec::new();
        for packet in PacketReader::new(data) {
            let packet = packet?;
            if packet.tag == Tag::PublicKey {
                pending.push(PendingEntity::new(PublicKey::parse(&packet.body)?));
                continue;
            }

            let Some(entity) = pending.last_mut() else {
                return Err(Error::NotAPublicKey(packet.tag.value()));
            };
            match packet.tag {
                Tag::Signature => entity.add_signature(&packet.body),
                Tag::UserId => {
                    entity.user_ids.push((packet.body.into_owned(), Vec::new()));
                    entity.current = Component::UserId;
                }
                Tag::PublicSubkey => {
                    entity.subkeys.push((PublicKey::parse(&packet.body)?, Vec::new()));
                    entity.current = Component::Subkey;
                }
                // trust packets keep the current component
                Tag::Other(12) => {}
                _ => entity.current = Component::Ignored,
            }
        }

        if pending.is_empty() {
            return Err(Error::EmptyKeyRing);
        }
        let entities = pending.into_iter().map(PendingEntity::validate).collect::<Result<Vec<_>>>()?;
        tracing::trace!(entities = entities.len(), "parsed key ring");
        Ok(Self { entities })
    }

    pub fn entities(&self) -> &[Entity] { &self.entities }

    pub fn keys(&self) -> impl Iterator<Item = &PublicKey> { self.entities.iter().flat_map(Entity::keys) }

    pub fn find(&self, id: &KeyId) -> Option<&PublicKey> { self.keys().find(|key| key.key_id() == *id) }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signer, SigningKey};
    use sha2::Sha256;

    use super::*;

    fn v4_rsa_body() -> Vec<u8> {
        let mut body = vec![4, 0x65, 0x53, 0xF1, 0x00, 1];
        body.extend([0x00, 0x41, 0x01]);
        body.extend([0xAB; 8]);
        body.extend([0x00, 0x11, 0x01, 0x00, 0x01]);
        body
    }

    fn packet(tag: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![0xC0 | tag, body.len() as u8];
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn v4_key_id_is_fingerprint_tail() {
        let body = v4_rsa_body();
        let key = PublicKey::parse(&body).unwrap();

        let mut hasher = Sha1::new();
        hasher.update([0x99, 0x00, body.len() as u8]);
        hasher.update(&body);
        let fingerprint = hasher.finalize();

        assert_eq!(key.fingerprint(), fingerprint.as_slice());
        assert_eq!(key.key_id().0, fingerprint[12..]);
        assert_eq!(key.algorithm, PublicKeyAlgorithm::Rsa);
        assert!(key.can_verify());
    }

    #[test]
    fn v3_key_id_is_modulus_tail() {
        let mut body = vec![3, 0, 0, 0, 0, 0, 0, 1];
        body.extend([0x00, 0x48, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        body.extend([0x00, 0x02, 0x03]);
        let key = PublicKey::parse(&body).unwrap();
        assert_eq!(key.key_id(), KeyId([2, 3, 4, 5, 6, 7, 8, 9]));
        assert!(key.fingerprint().is_empty());
    }

    #[test]
    fn unknown_algorithm_parses_but_cannot_verify() {
        let body = [4, 0, 0, 0, 0, 17, 0x00, 0x08, 0xFF];
        let key = PublicKey::parse(&body).unwrap();
        assert_eq!(key.algorithm, PublicKeyAlgorithm::Other(17));
        assert!(!key.can_verify());
    }

    #[test]
    fn unsupported_version() {
        assert!(matches!(PublicKey::parse(&[6, 0, 0]), Err(Error::UnsupportedKeyVersion(6))));
    }

    const USER_ID: &[u8] = b"Alice <alice@example.org>";

    fn mpi(bytes: &[u8]) -> Vec<u8> {
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        let magnitude = &bytes[start..];
        let bits = magnitude
            .first()
            .map_or(0, |&top| magnitude.len() * 8 - top.leading_zeros() as usize);
        let mut out = (bits as u16).to_be_bytes().to_vec();
        out.extend_from_slice(magnitude);
        out
    }

    fn ed25519_body(key: &SigningKey) -> Vec<u8> {
        let mut body = vec![4, 0x65, 0x00, 0x00, 0x00, 22, ED25519_OID.len() as u8];
        body.extend_from_slice(ED25519_OID);
        let mut point = vec![0x40];
        point.extend_from_slice(key.verifying_key().as_bytes());
        body.extend(mpi(&point));
        body
    }

    fn public(key: &SigningKey) -> PublicKey { PublicKey::parse(&ed25519_body(key)).unwrap() }

    fn user_id_header(uid: &[u8]) -> Vec<u8> {
        let mut header = vec![0xB4];
        header.extend((uid.len() as u32).to_be_bytes());
        header
    }

    /// v4 key signature of `sig_type` made by `signer` over `preimage`,
    /// claiming `issuer`.
    fn certify(signer: &SigningKey, issuer: KeyId, sig_type: u8, preimage: &[&[u8]]) -> Vec<u8> {
        let mut hashed = vec![5, 2, 0x65, 0x00, 0x00, 0x01, 9, 16];
        hashed.extend(issuer.0);
        let mut body = vec![4, sig_type, 22, 8];
        body.extend((hashed.len() as u16).to_be_bytes());
        body.extend(&hashed);

        let mut hasher = Sha256::new();
        for part in preimage {
            hasher.update(part);
        }
        hasher.update(&body);
        hasher.update([0x04, 0xFF]);
        hasher.update((body.len() as u32).to_be_bytes());
        let digest = hasher.finalize();
        let value = signer.sign(&digest).to_bytes();

        body.extend([0, 0]);
        body.extend_from_slice(&digest[..2]);
        body.extend(mpi(&value[..32]));
        body.extend(mpi(&value[32..]));
        body
    }

    fn certified_user_id(primary: &SigningKey, uid: &[u8]) -> Vec<u8> {
        let key = public(primary);
        certify(primary, key.key_id(), 0x13, &[key.hashed_form(), &user_id_header(uid), uid])
    }

    fn binding(signer: &SigningKey, primary: &SigningKey, subkey: &SigningKey) -> Vec<u8> {
        let key = public(primary);
        certify(signer, key.key_id(), 0x18, &[key.hashed_form(), public(subkey).hashed_form()])
    }

    /// Primary key with a certified user id, ready for subkeys.
    fn identity(primary: &SigningKey) -> Vec<u8> {
        let mut data = packet(6, &ed25519_body(primary));
        data.extend(packet(13, USER_ID));
        data.extend(packet(2, &certified_user_id(primary, USER_ID)));
        data
    }

    #[test]
    fn ring_keeps_certified_user_ids_and_bound_subkeys() {
        let (primary, subkey) = (SigningKey::from_bytes(&[1; 32]), SigningKey::from_bytes(&[2; 32]));
        let mut data = identity(&primary);
        data.extend(packet(14, &ed25519_body(&subkey)));
        data.extend(packet(2, &binding(&primary, &primary, &subkey)));

        let ring = KeyRing::from_bytes(&data).unwrap();
        assert_eq!(ring.entities().len(), 1);
        let entity = &ring.entities()[0];
        assert_eq!(entity.user_ids, vec!["Alice <alice@example.org>".to_string()]);
        assert_eq!(entity.subkeys.len(), 1);
        assert_eq!(ring.keys().count(), 2);
        assert!(ring.find(&public(&subkey).key_id()).is_some());
        assert!(ring.find(&KeyId([0; 8])).is_none());
    }

    #[test]
    fn subkey_without_binding_is_rejected() {
        let (primary, subkey) = (SigningKey::from_bytes(&[1; 32]), SigningKey::from_bytes(&[2; 32]));
        let mut data = identity(&primary);
        data.extend(packet(14, &ed25519_body(&subkey)));

        match KeyRing::from_bytes(&data) {
            Err(Error::UnboundSubkey { primary: p, subkey: s }) => {
                assert_eq!(p, public(&primary).key_id());
                assert_eq!(s, public(&subkey).key_id());
            }
            other => panic!("expected an unbound subkey, got {other:?}"),
        }
    }

    #[test]
    fn binding_made_by_another_key_is_rejected() {
        let primary = SigningKey::from_bytes(&[1; 32]);
        let subkey = SigningKey::from_bytes(&[2; 32]);
        let intruder = SigningKey::from_bytes(&[3; 32]);
        let mut data = identity(&primary);
        data.extend(packet(14, &ed25519_body(&subkey)));
        data.extend(packet(2, &binding(&intruder, &primary, &subkey)));

        assert!(matches!(KeyRing::from_bytes(&data), Err(Error::UnboundSubkey { .. })));
    }

    #[test]
    fn binding_for_another_subkey_does_not_transfer() {
        let primary = SigningKey::from_bytes(&[1; 32]);
        let bound = SigningKey::from_bytes(&[2; 32]);
        let grafted = SigningKey::from_bytes(&[3; 32]);
        let mut data = identity(&primary);
        data.extend(packet(14, &ed25519_body(&grafted)));
        data.extend(packet(2, &binding(&primary, &primary, &bound)));

        assert!(matches!(KeyRing::from_bytes(&data), Err(Error::UnboundSubkey { .. })));
    }

    #[test]
    fn altered_user_id_is_rejected() {
        let primary = SigningKey::from_bytes(&[1; 32]);
        let mut data = packet(6, &ed25519_body(&primary));
        data.extend(packet(13, b"Mallory <mallory@example.org>"));
        data.extend(packet(2, &certified_user_id(&primary, USER_ID)));

        assert!(matches!(KeyRing::from_bytes(&data), Err(Error::InvalidSelfSignature(_))));
    }

    #[test]
    fn user_id_needs_a_self_signature() {
        let primary = SigningKey::from_bytes(&[1; 32]);
        let mut data = packet(6, &ed25519_body(&primary));
        data.extend(packet(13, USER_ID));
        assert!(matches!(KeyRing::from_bytes(&data), Err(Error::MissingIdentity(_))));

        // a certification by someone else does not count
        let other = SigningKey::from_bytes(&[4; 32]);
        let other_key = public(&other);
        let key = public(&primary);
        data.extend(packet(
            2,
            &certify(&other, other_key.key_id(), 0x10, &[key.hashed_form(), &user_id_header(USER_ID), USER_ID]),
        ));
        assert!(matches!(KeyRing::from_bytes(&data), Err(Error::MissingIdentity(_))));
    }

    #[test]
    fn trust_packets_do_not_detach_signatures() {
        let (primary, subkey) = (SigningKey::from_bytes(&[1; 32]), SigningKey::from_bytes(&[2; 32]));
        let mut data = identity(&primary);
        data.extend(packet(14, &ed25519_body(&subkey)));
        data.extend(packet(12, &[0, 0]));
        data.extend(packet(2, &binding(&primary, &primary, &subkey)));

        assert_eq!(KeyRing::from_bytes(&data).unwrap().keys().count(), 2);
    }

    #[test]
    fn ring_must_start_with_public_key() {
        let data = packet(13, b"orphan");
        assert!(matches!(KeyRing::from_bytes(&data), Err(Error::NotAPublicKey(13))));
    }

    #[test]
    fn empty_ring_is_an_error() {
        assert!(matches!(KeyRing::from_bytes(&[]), Err(Error::EmptyKeyRing)));
    }

    #[test]
    fn key_id_formats_as_upper_hex() {
        let id = KeyId([0xA2, 0xC5, 0x27, 0x03, 0x93, 0x24, 0xB5, 0xD9]);
        assert_eq!(id.to_string(), "A2C527039324B5D9");
    }
}
