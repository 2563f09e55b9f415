use rsa::Pkcs1v15Sign;
use sha2::digest::DynDigest;

use crate::error::{Error, Result};
use crate::key::{KeyId, PublicKeyAlgorithm};
use crate::packet::{ByteReader, PacketReader, Tag};

const SUBPACKET_CREATED: u8 = 2;
const SUBPACKET_ISSUER: u8 = 16;
const SUBPACKET_ISSUER_FINGERPRINT: u8 = 33;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn from_u8(id: u8) -> Result<Self> {
        match id {
            2 => Ok(HashAlgorithm::Sha1),
            8 => Ok(HashAlgorithm::Sha256),
            9 => Ok(HashAlgorithm::Sha384),
            10 => Ok(HashAlgorithm::Sha512),
            11 => Ok(HashAlgorithm::Sha224),
            other => Err(Error::UnsupportedHash(other)),
        }
    }

    pub(crate) fn hasher(self) -> Box<dyn DynDigest + Send> {
        match self {
            HashAlgorithm::Sha1 => Box::new(sha1::Sha1::default()),
            HashAlgorithm::Sha224 => Box::new(sha2::Sha224::default()),
            HashAlgorithm::Sha256 => Box::new(sha2::Sha256::default()),
            HashAlgorithm::Sha384 => Box::new(sha2::Sha384::default()),
            HashAlgorithm::Sha512 => Box::new(sha2::Sha512::default()),
        }
    }

    pub(crate) fn pkcs1v15(self) -> Pkcs1v15Sign {
        match self {
            HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<sha1::Sha1>(),
            HashAlgorithm::Sha224 => Pkcs1v15Sign::new::<sha2::Sha224>(),
            HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
            HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
            HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureVersion {
    /// Legacy v3 packet.
    V3,
    V4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureType {
    /// Signature over the bytes as given (0x00).
    Binary,
    /// Signature over canonical CRLF text (0x01).
    Text,
    /// Certification of a user id by a key (0x10 to 0x13).
    UserIdCertification(u8),
    /// Binding of a subkey by its primary key (0x18).
    SubkeyBinding,
    Other(u8),
}

impl SignatureType {
    fn from_u8(value: u8) -> Self {
        match value {
            0x00 => SignatureType::Binary,
            0x01 => SignatureType::Text,
            0x10..=0x13 => SignatureType::UserIdCertification(value),
            0x18 => SignatureType::SubkeyBinding,
            other => SignatureType::Other(other),
        }
    }

    pub fn value(self) -> u8 {
        match self {
            SignatureType::Binary => 0x00,
            SignatureType::Text => 0x01,
            SignatureType::UserIdCertification(value) | SignatureType::Other(value) => value,
            SignatureType::SubkeyBinding => 0x18,
        }
    }

    /// Whether this type signs a document rather than key material.
    pub fn is_document(self) -> bool { matches!(self, SignatureType::Binary | SignatureType::Text) }
}

/// A parsed detached signature packet, ready to be checked against a
/// content stream by [`SignatureVerifier`](crate::SignatureVerifier).
#[derive(Debug, Clone)]
pub struct DetachedSignature {
    version:   SignatureVersion,
    sig_type:  SignatureType,
    algorithm: PublicKeyAlgorithm,
    hash:      HashAlgorithm,
    created:   Option<u32>,
    issuers:   Vec<KeyId>,
    trailer:   Vec<u8>,
    left16:    [u8; 2],
    mpis:      Vec<Vec<u8>>,
}

impl DetachedSignature {
    /// Read the first packet of `data`, which must be a signature.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let packet = PacketReader::new(data).next().ok_or(Error::Truncated)??;
        if packet.tag != Tag::Signature {
            return Err(Error::NotASignature(packet.tag.value()));
        }
        Self::from_packet_body(&packet.body)
    }

    /// Parse a signature packet body. Only binary and text document
    /// signatures are accepted; certifications and other key signatures are
    /// refused so they cannot stand in for a signature over content.
    pub fn from_packet_body(body: &[u8]) -> Result<Self> {
        let signature = Self::parse(body)?;
        if !signature.sig_type.is_document() {
            return Err(Error::UnsupportedSignatureType(signature.sig_type.value()));
        }
        Ok(signature)
    }

    /// Parse a signature packet of any type.
    pub(crate) fn parse(body: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(body);
        match r.u8()? {
            3 => Self::parse_v3(&mut r),
            4 => Self::parse_v4(body, &mut r),
            other => Err(Error::UnsupportedSignatureVersion(other)),
        }
    }

    fn parse_v3(r: &mut ByteReader<'_>) -> Result<Self> {
        if r.u8()? != 5 {
            return Err(Error::Malformed("v3 hashed material must be 5 octets"));
        }
        let sig_type = r.u8()?;
        let created = r.u32()?;
        let issuer = KeyId(r.array()?);
        let algorithm = PublicKeyAlgorithm::from_u8(r.u8()?);
        let hash = HashAlgorithm::from_u8(r.u8()?)?;
        let left16 = r.array()?;

        let mut trailer = vec![sig_type];
        trailer.extend_from_slice(&created.to_be_bytes());

        Ok(Self {
            version: SignatureVersion::V3,
            sig_type: SignatureType::from_u8(sig_type),
            algorithm,
            hash,
            created: Some(created),
            issuers: vec![issuer],
            trailer,
            left16,
            mpis: read_mpis(r)?,
        })
    }

    fn parse_v4(body: &[u8], r: &mut ByteReader<'_>) -> Result<Self> {
        let sig_type = SignatureType::from_u8(r.u8()?);
        let algorithm = PublicKeyAlgorithm::from_u8(r.u8()?);
        let hash = HashAlgorithm::from_u8(r.u8()?)?;

        let hashed_len = usize::from(r.u16()?);
        let hashed = r.take(hashed_len)?;
        let unhashed_len = usize::from(r.u16()?);
        let unhashed = r.take(unhashed_len)?;
        let left16 = r.array()?;
        let mpis = read_mpis(r)?;

        // version, type, algorithms, length and the hashed subpackets
        let hashed_end = 6 + hashed_len;
        let mut trailer = body[..hashed_end].to_vec();
        trailer.extend_from_slice(&[0x04, 0xFF]);
        trailer.extend_from_slice(&(hashed_end as u32).to_be_bytes());

        let mut created = None;
        let mut issuers = Vec::new();
        for (area, hashed_area) in [(hashed, true), (unhashed, false)] {
            for (kind, data) in subpackets(area)? {
                match kind {
                    SUBPACKET_CREATED if hashed_area => {
                        let bytes: [u8; 4] = data
                            .try_into()
                            .map_err(|_| Error::Malformed("creation time must be 4 octets"))?;
                        created = Some(u32::from_be_bytes(bytes));
                    }
                    SUBPACKET_ISSUER => {
                        let bytes: [u8; 8] = data
                            .try_into()
                            .map_err(|_| Error::Malformed("issuer must be 8 octets"))?;
                        push_unique(&mut issuers, KeyId(bytes));
                    }
                    SUBPACKET_ISSUER_FINGERPRINT => {
                        if let Some(id) = issuer_from_fingerprint(data) {
                            push_unique(&mut issuers, id);
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(Self {
            version: SignatureVersion::V4,
            sig_type,
            algorithm,
            hash,
            created,
            issuers,
            trailer,
            left16,
            mpis,
        })
    }

    pub fn version(&self) -> SignatureVersion { self.version }

    pub fn sig_type(&self) -> SignatureType { self.sig_type }

    pub fn algorithm(&self) -> PublicKeyAlgorithm { self.algorithm }

    pub fn hash_algorithm(&self) -> HashAlgorithm { self.hash }

    /// Creation time in seconds since the epoch.
    pub fn created(&self) -> Option<u32> { self.created }

    /// Key ids named by issuer and issuer fingerprint subpackets.
    pub fn issuers(&self) -> &[KeyId] { &self.issuers }

    /// Bytes hashed after the content.
    pub(crate) fn trailer(&self) -> &[u8] { &self.trailer }

    pub(crate) fn left16(&self) -> [u8; 2] { self.left16 }

    pub(crate) fn mpis(&self) -> &[Vec<u8>] { &self.mpis }
}

fn read_mpis(r: &mut ByteReader<'_>) -> Result<Vec<Vec<u8>>> {
    let mut mpis = Vec::new();
    while !r.is_empty() {
        mpis.push(r.mpi()?.to_vec());
    }
    if mpis.is_empty() {
        return Err(Error::Malformed("signature has no value"));
    }
    Ok(mpis)
}

fn subpackets(mut area: &[u8]) -> Result<Vec<(u8, &[u8])>> {
    let mut out = Vec::new();
    while !area.is_empty() {
        let mut r = ByteReader::new(area);
        let len = r.subpacket_len()?;
        if len == 0 {
            return Err(Error::Malformed("empty subpacket"));
        }
        let data = r.take(len)?;
        out.push((data[0] & 0x7F, &data[1..]));
        area = r.rest();
    }
    Ok(out)
}

fn issuer_from_fingerprint(data: &[u8]) -> Option<KeyId> {
    let (&version, fingerprint) = data.split_first()?;
    let id: &[u8] = match (version, fingerprint.len()) {
        (4, 20) => &fingerprint[12..],
        (5 | 6, 32) => &fingerprint[..8],
        _ => return None,
    };
    id.try_into().ok().map(KeyId)
}

fn push_unique(ids: &mut Vec<KeyId>, id: KeyId) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}
